use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("{0}")] Conflict(String),
    #[error("insufficient points")] InsufficientPoints,
    #[error("storage error: {0}")] Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// New users start with this balance; bounties only ever spend it.
pub const STARTING_POINTS: i64 = 100;

/// Urgency restriction for unanswered-question listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionFilter {
    All,
    Urgent,
    General,
}

use async_trait::async_trait;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, new: NewUser) -> RepoResult<User>;
    async fn get_user(&self, id: Id) -> RepoResult<User>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// All users, newest registration first.
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    async fn recent_users(&self, limit: i64) -> RepoResult<Vec<User>>;
    /// Users with a mentor-side role (alumni or mentor), oldest first.
    async fn list_mentors(&self, limit: Option<i64>) -> RepoResult<Vec<User>>;
    async fn count_users(&self) -> RepoResult<i64>;
    async fn count_mentor_side(&self) -> RepoResult<i64>;
    async fn verify_user(&self, id: Id) -> RepoResult<User>;
}

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get_profile(&self, user_id: Id) -> RepoResult<Option<Profile>>;
    /// Merge-update: only fields present in the patch overwrite.
    async fn update_profile(&self, user_id: Id, patch: ProfilePatch) -> RepoResult<Profile>;
    async fn list_skills(&self, user_id: Id) -> RepoResult<Vec<Skill>>;
    /// Delete-then-reinsert replacement of the whole skill set.
    async fn replace_skills(&self, user_id: Id, names: Vec<String>) -> RepoResult<Vec<Skill>>;
    async fn add_experience(&self, new: NewExperience) -> RepoResult<Experience>;
    async fn list_experiences(&self, user_id: Id) -> RepoResult<Vec<Experience>>;
    /// The "current" experience is the one with the highest id, i.e. the
    /// last one inserted. Dates are never consulted.
    async fn latest_experience(&self, user_id: Id) -> RepoResult<Option<Experience>>;
}

#[async_trait]
pub trait CompanyRepo: Send + Sync {
    async fn create_company(&self, new: NewCompany) -> RepoResult<Company>;
    async fn list_companies(&self) -> RepoResult<Vec<Company>>;
    async fn get_company(&self, id: Id) -> RepoResult<Company>;
    async fn count_companies(&self) -> RepoResult<i64>;
}

#[async_trait]
pub trait CareerRepo: Send + Sync {
    async fn create_career_path(&self, title: String, description: Option<String>) -> RepoResult<CareerPath>;
    async fn list_career_paths(&self) -> RepoResult<Vec<CareerPath>>;
    async fn count_career_paths(&self) -> RepoResult<i64>;
    async fn create_roadmap(&self, new: NewRoadmap) -> RepoResult<Roadmap>;
    async fn list_roadmaps(&self) -> RepoResult<Vec<Roadmap>>;
    async fn get_roadmap(&self, id: Id) -> RepoResult<Roadmap>;
    async fn count_roadmaps(&self) -> RepoResult<i64>;
}

#[async_trait]
pub trait DiscussionRepo: Send + Sync {
    async fn create_thread(&self, user_id: Id, title: String, category: Option<String>) -> RepoResult<DiscussionThread>;
    /// Newest first.
    async fn list_threads(&self) -> RepoResult<Vec<DiscussionThread>>;
    async fn count_threads(&self) -> RepoResult<i64>;
    async fn count_threads_by(&self, user_id: Id) -> RepoResult<i64>;
}

#[async_trait]
pub trait QuestionRepo: Send + Sync {
    /// Deducts the bounty from the author's balance and inserts the
    /// question as one atomic step; a short balance leaves the row
    /// uncreated and the balance untouched. Returns the question and the
    /// remaining balance.
    async fn create_question(&self, new: NewQuestion) -> RepoResult<(Question, i64)>;
    async fn get_question(&self, id: Id) -> RepoResult<Question>;
    /// Urgent first, then bounty, then recency.
    async fn question_feed(&self) -> RepoResult<Vec<Question>>;
    async fn recent_questions(&self, limit: i64) -> RepoResult<Vec<Question>>;
    /// Questions with zero replies. Urgent-only listings order by
    /// (bounty desc, created desc); everything else by created desc.
    async fn unanswered_questions(&self, filter: QuestionFilter, limit: Option<i64>) -> RepoResult<Vec<Question>>;
    async fn count_unanswered(&self) -> RepoResult<i64>;
    async fn count_questions_by(&self, user_id: Id) -> RepoResult<i64>;
    async fn create_reply(&self, question_id: Id, user_id: Id, content: String) -> RepoResult<Reply>;
    async fn list_replies(&self, question_id: Id) -> RepoResult<Vec<Reply>>;
}

#[async_trait]
pub trait MentorshipRepo: Send + Sync {
    /// The duplicate-pending check and the insert are one atomic step.
    async fn create_request(&self, student_id: Id, mentor_id: Id, message: String) -> RepoResult<MentorshipRequest>;
    async fn get_request(&self, id: Id) -> RepoResult<MentorshipRequest>;
    /// Overwrites the status unconditionally; terminal states are not
    /// re-validated.
    async fn set_request_status(&self, id: Id, status: RequestStatus) -> RepoResult<MentorshipRequest>;
    async fn requests_for_mentor(&self, mentor_id: Id, status: RequestStatus) -> RepoResult<Vec<MentorshipRequest>>;
    async fn count_for_mentor(&self, mentor_id: Id, status: RequestStatus) -> RepoResult<i64>;
    async fn accepted_for_student(&self, student_id: Id) -> RepoResult<Vec<MentorshipRequest>>;
}

pub trait Repo:
    UserRepo + ProfileRepo + CompanyRepo + CareerRepo + DiscussionRepo + QuestionRepo + MentorshipRepo
{
}

impl<T> Repo for T where
    T: UserRepo + ProfileRepo + CompanyRepo + CareerRepo + DiscussionRepo + QuestionRepo + MentorshipRepo
{
}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::path::{Path, PathBuf};

    const SNAPSHOT_PATH: &str = "data/state.json";

    #[derive(Default, Serialize, Deserialize)]
    struct State {
        users: HashMap<Id, User>,
        profiles: HashMap<Id, Profile>, // keyed by user id
        skills: HashMap<Id, Skill>,
        companies: HashMap<Id, Company>,
        experiences: HashMap<Id, Experience>,
        career_paths: HashMap<Id, CareerPath>,
        roadmaps: HashMap<Id, Roadmap>,
        threads: HashMap<Id, DiscussionThread>,
        questions: HashMap<Id, Question>,
        replies: HashMap<Id, Reply>,
        requests: HashMap<Id, MentorshipRequest>,
        next_id: Id,
    }

    impl State {
        fn has_reply(&self, question_id: Id) -> bool {
            self.replies.values().any(|r| r.question_id == question_id)
        }
    }

    #[derive(Clone)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Arc<PathBuf>,
    }

    impl InMemRepo {
        fn data_dir() -> PathBuf {
            std::env::var("ASCEND_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data"))
        }

        fn snapshot_path() -> PathBuf {
            if std::env::var("ASCEND_DATA_DIR").is_ok() {
                let mut p = Self::data_dir();
                p.push("state.json");
                p
            } else {
                PathBuf::from(SNAPSHOT_PATH)
            }
        }

        fn load_state_from(path: &Path) -> State {
            match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<State>(&bytes) {
                    Ok(s) => {
                        log::info!("loaded snapshot '{}'", path.display());
                        s
                    }
                    Err(e) => {
                        log::warn!("failed to parse snapshot '{}': {e}; starting empty", path.display());
                        State::default()
                    }
                },
                Err(_) => State::default(),
            }
        }

        fn persist(&self) {
            let path = self.snapshot_path.clone();
            if let Ok(s) = serde_json::to_vec_pretty(&*self.state.read().unwrap()) {
                if let Some(dir) = path.parent() {
                    let _ = std::fs::create_dir_all(dir);
                }
                if let Err(e) = std::fs::write(&*path, s) {
                    log::warn!("failed to write snapshot '{}': {e}", path.display());
                }
            }
        }

        pub fn new() -> Self {
            let snapshot_path = Self::snapshot_path();
            let state = Self::load_state_from(&snapshot_path);
            Self {
                state: Arc::new(RwLock::new(state)),
                snapshot_path: Arc::new(snapshot_path),
            }
        }

        fn next_id(state: &mut State) -> Id {
            state.next_id += 1;
            state.next_id
        }
    }

    impl Default for InMemRepo {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl UserRepo for InMemRepo {
        async fn create_user(&self, new: NewUser) -> RepoResult<User> {
            let mut s = self.state.write().unwrap();
            if s.users.values().any(|u| u.email == new.email) {
                return Err(RepoError::Conflict("Email already registered".into()));
            }
            if s.users.values().any(|u| u.username == new.username) {
                return Err(RepoError::Conflict("Username already taken".into()));
            }
            let id = Self::next_id(&mut s);
            let user = User {
                id,
                username: new.username,
                email: new.email,
                password_hash: new.password_hash,
                role: new.role,
                is_verified: false,
                points: STARTING_POINTS,
                created_at: Utc::now(),
            };
            s.users.insert(id, user.clone());
            drop(s); // release lock before persisting
            self.persist();
            Ok(user)
        }

        async fn get_user(&self, id: Id) -> RepoResult<User> {
            let s = self.state.read().unwrap();
            s.users.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
            let s = self.state.read().unwrap();
            Ok(s.users.values().find(|u| u.email == email).cloned())
        }

        async fn list_users(&self) -> RepoResult<Vec<User>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s.users.values().cloned().collect();
            v.sort_by(|a, b| b.id.cmp(&a.id));
            Ok(v)
        }

        async fn recent_users(&self, limit: i64) -> RepoResult<Vec<User>> {
            let mut v = self.list_users().await?;
            v.truncate(limit as usize);
            Ok(v)
        }

        async fn list_mentors(&self, limit: Option<i64>) -> RepoResult<Vec<User>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .users
                .values()
                .filter(|u| u.role.is_mentor_side())
                .cloned()
                .collect();
            v.sort_by(|a, b| a.id.cmp(&b.id));
            if let Some(limit) = limit {
                v.truncate(limit as usize);
            }
            Ok(v)
        }

        async fn count_users(&self) -> RepoResult<i64> {
            let s = self.state.read().unwrap();
            Ok(s.users.len() as i64)
        }

        async fn count_mentor_side(&self) -> RepoResult<i64> {
            let s = self.state.read().unwrap();
            Ok(s.users.values().filter(|u| u.role.is_mentor_side()).count() as i64)
        }

        async fn verify_user(&self, id: Id) -> RepoResult<User> {
            let mut s = self.state.write().unwrap();
            let user = s.users.get_mut(&id).ok_or(RepoError::NotFound)?;
            user.is_verified = true;
            let updated = user.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }
    }

    #[async_trait]
    impl ProfileRepo for InMemRepo {
        async fn get_profile(&self, user_id: Id) -> RepoResult<Option<Profile>> {
            let s = self.state.read().unwrap();
            Ok(s.profiles.get(&user_id).cloned())
        }

        async fn update_profile(&self, user_id: Id, patch: ProfilePatch) -> RepoResult<Profile> {
            let mut s = self.state.write().unwrap();
            if !s.users.contains_key(&user_id) {
                return Err(RepoError::NotFound);
            }
            if !s.profiles.contains_key(&user_id) {
                let id = Self::next_id(&mut s);
                s.profiles.insert(
                    user_id,
                    Profile {
                        id,
                        user_id,
                        bio: None,
                        university: None,
                        full_name: None,
                        degree: None,
                        graduation_year: None,
                        current_goal: None,
                        company: None,
                        job_title: None,
                    },
                );
            }
            let profile = s.profiles.get_mut(&user_id).expect("inserted above");
            if let Some(bio) = patch.bio { profile.bio = Some(bio); }
            if let Some(university) = patch.university { profile.university = Some(university); }
            if let Some(full_name) = patch.full_name { profile.full_name = Some(full_name); }
            if let Some(degree) = patch.degree { profile.degree = Some(degree); }
            if let Some(year) = patch.graduation_year { profile.graduation_year = Some(year); }
            if let Some(goal) = patch.current_goal { profile.current_goal = Some(goal); }
            let updated = profile.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn list_skills(&self, user_id: Id) -> RepoResult<Vec<Skill>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .skills
                .values()
                .filter(|sk| sk.user_id == user_id)
                .cloned()
                .collect();
            v.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(v)
        }

        async fn replace_skills(&self, user_id: Id, names: Vec<String>) -> RepoResult<Vec<Skill>> {
            let mut s = self.state.write().unwrap();
            if !s.users.contains_key(&user_id) {
                return Err(RepoError::NotFound);
            }
            s.skills.retain(|_, sk| sk.user_id != user_id);
            let mut inserted = Vec::new();
            for name in names {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let id = Self::next_id(&mut s);
                let skill = Skill { id, user_id, name: trimmed.to_string() };
                s.skills.insert(id, skill.clone());
                inserted.push(skill);
            }
            drop(s);
            self.persist();
            Ok(inserted)
        }

        async fn add_experience(&self, new: NewExperience) -> RepoResult<Experience> {
            let mut s = self.state.write().unwrap();
            if !s.users.contains_key(&new.user_id) {
                return Err(RepoError::NotFound);
            }
            let id = Self::next_id(&mut s);
            let exp = Experience {
                id,
                user_id: new.user_id,
                company_id: new.company_id,
                role: new.role,
                start_date: new.start_date,
                end_date: new.end_date,
                description: new.description,
            };
            s.experiences.insert(id, exp.clone());
            drop(s);
            self.persist();
            Ok(exp)
        }

        async fn list_experiences(&self, user_id: Id) -> RepoResult<Vec<Experience>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .experiences
                .values()
                .filter(|e| e.user_id == user_id)
                .cloned()
                .collect();
            v.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(v)
        }

        async fn latest_experience(&self, user_id: Id) -> RepoResult<Option<Experience>> {
            let s = self.state.read().unwrap();
            Ok(s.experiences
                .values()
                .filter(|e| e.user_id == user_id)
                .max_by_key(|e| e.id)
                .cloned())
        }
    }

    #[async_trait]
    impl CompanyRepo for InMemRepo {
        async fn create_company(&self, new: NewCompany) -> RepoResult<Company> {
            let mut s = self.state.write().unwrap();
            if s.companies.values().any(|c| c.name == new.name) {
                return Err(RepoError::Conflict("Company already exists".into()));
            }
            let id = Self::next_id(&mut s);
            let company = Company {
                id,
                name: new.name,
                logo_url: new.logo_url,
                description: new.description,
            };
            s.companies.insert(id, company.clone());
            drop(s);
            self.persist();
            Ok(company)
        }

        async fn list_companies(&self) -> RepoResult<Vec<Company>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s.companies.values().cloned().collect();
            v.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(v)
        }

        async fn get_company(&self, id: Id) -> RepoResult<Company> {
            let s = self.state.read().unwrap();
            s.companies.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn count_companies(&self) -> RepoResult<i64> {
            let s = self.state.read().unwrap();
            Ok(s.companies.len() as i64)
        }
    }

    #[async_trait]
    impl CareerRepo for InMemRepo {
        async fn create_career_path(&self, title: String, description: Option<String>) -> RepoResult<CareerPath> {
            let mut s = self.state.write().unwrap();
            let id = Self::next_id(&mut s);
            let path = CareerPath { id, title, description };
            s.career_paths.insert(id, path.clone());
            drop(s);
            self.persist();
            Ok(path)
        }

        async fn list_career_paths(&self) -> RepoResult<Vec<CareerPath>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s.career_paths.values().cloned().collect();
            v.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(v)
        }

        async fn count_career_paths(&self) -> RepoResult<i64> {
            let s = self.state.read().unwrap();
            Ok(s.career_paths.len() as i64)
        }

        async fn create_roadmap(&self, new: NewRoadmap) -> RepoResult<Roadmap> {
            let mut s = self.state.write().unwrap();
            if !s.users.contains_key(&new.creator_id) {
                return Err(RepoError::NotFound);
            }
            let id = Self::next_id(&mut s);
            let roadmap = Roadmap {
                id,
                title: new.title,
                description: new.description,
                steps: new.steps,
                career_path_id: new.career_path_id,
                creator_id: new.creator_id,
            };
            s.roadmaps.insert(id, roadmap.clone());
            drop(s);
            self.persist();
            Ok(roadmap)
        }

        async fn list_roadmaps(&self) -> RepoResult<Vec<Roadmap>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s.roadmaps.values().cloned().collect();
            v.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(v)
        }

        async fn get_roadmap(&self, id: Id) -> RepoResult<Roadmap> {
            let s = self.state.read().unwrap();
            s.roadmaps.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn count_roadmaps(&self) -> RepoResult<i64> {
            let s = self.state.read().unwrap();
            Ok(s.roadmaps.len() as i64)
        }
    }

    #[async_trait]
    impl DiscussionRepo for InMemRepo {
        async fn create_thread(&self, user_id: Id, title: String, category: Option<String>) -> RepoResult<DiscussionThread> {
            let mut s = self.state.write().unwrap();
            if !s.users.contains_key(&user_id) {
                return Err(RepoError::NotFound);
            }
            let id = Self::next_id(&mut s);
            let thread = DiscussionThread {
                id,
                title,
                category,
                user_id,
                created_at: Utc::now(),
            };
            s.threads.insert(id, thread.clone());
            drop(s);
            self.persist();
            Ok(thread)
        }

        async fn list_threads(&self) -> RepoResult<Vec<DiscussionThread>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s.threads.values().cloned().collect();
            v.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(v)
        }

        async fn count_threads(&self) -> RepoResult<i64> {
            let s = self.state.read().unwrap();
            Ok(s.threads.len() as i64)
        }

        async fn count_threads_by(&self, user_id: Id) -> RepoResult<i64> {
            let s = self.state.read().unwrap();
            Ok(s.threads.values().filter(|t| t.user_id == user_id).count() as i64)
        }
    }

    #[async_trait]
    impl QuestionRepo for InMemRepo {
        async fn create_question(&self, new: NewQuestion) -> RepoResult<(Question, i64)> {
            // Balance check, deduction, and insert all happen under one
            // write lock: concurrent requests cannot drive the balance
            // negative.
            let mut s = self.state.write().unwrap();
            let points = {
                let user = s.users.get_mut(&new.user_id).ok_or(RepoError::NotFound)?;
                if new.bounty > user.points {
                    return Err(RepoError::InsufficientPoints);
                }
                user.points -= new.bounty;
                user.points
            };
            let id = Self::next_id(&mut s);
            let question = Question {
                id,
                title: new.title,
                content: new.content,
                user_id: new.user_id,
                is_urgent: new.is_urgent,
                bounty: new.bounty,
                created_at: Utc::now(),
            };
            s.questions.insert(id, question.clone());
            drop(s);
            self.persist();
            Ok((question, points))
        }

        async fn get_question(&self, id: Id) -> RepoResult<Question> {
            let s = self.state.read().unwrap();
            s.questions.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn question_feed(&self) -> RepoResult<Vec<Question>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s.questions.values().cloned().collect();
            v.sort_by(|a, b| {
                b.is_urgent
                    .cmp(&a.is_urgent)
                    .then(b.bounty.cmp(&a.bounty))
                    .then(b.created_at.cmp(&a.created_at))
                    .then(b.id.cmp(&a.id))
            });
            Ok(v)
        }

        async fn recent_questions(&self, limit: i64) -> RepoResult<Vec<Question>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s.questions.values().cloned().collect();
            v.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            v.truncate(limit as usize);
            Ok(v)
        }

        async fn unanswered_questions(&self, filter: QuestionFilter, limit: Option<i64>) -> RepoResult<Vec<Question>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .questions
                .values()
                .filter(|q| !s.has_reply(q.id))
                .filter(|q| match filter {
                    QuestionFilter::All => true,
                    QuestionFilter::Urgent => q.is_urgent,
                    QuestionFilter::General => !q.is_urgent,
                })
                .cloned()
                .collect();
            match filter {
                QuestionFilter::Urgent => v.sort_by(|a, b| {
                    b.bounty
                        .cmp(&a.bounty)
                        .then(b.created_at.cmp(&a.created_at))
                        .then(b.id.cmp(&a.id))
                }),
                _ => v.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))),
            }
            if let Some(limit) = limit {
                v.truncate(limit as usize);
            }
            Ok(v)
        }

        async fn count_unanswered(&self) -> RepoResult<i64> {
            let s = self.state.read().unwrap();
            Ok(s.questions.values().filter(|q| !s.has_reply(q.id)).count() as i64)
        }

        async fn count_questions_by(&self, user_id: Id) -> RepoResult<i64> {
            let s = self.state.read().unwrap();
            Ok(s.questions.values().filter(|q| q.user_id == user_id).count() as i64)
        }

        async fn create_reply(&self, question_id: Id, user_id: Id, content: String) -> RepoResult<Reply> {
            let mut s = self.state.write().unwrap();
            if !s.questions.contains_key(&question_id) {
                return Err(RepoError::NotFound);
            }
            let id = Self::next_id(&mut s);
            let reply = Reply {
                id,
                content,
                user_id,
                question_id,
                created_at: Utc::now(),
            };
            s.replies.insert(id, reply.clone());
            drop(s);
            self.persist();
            Ok(reply)
        }

        async fn list_replies(&self, question_id: Id) -> RepoResult<Vec<Reply>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .replies
                .values()
                .filter(|r| r.question_id == question_id)
                .cloned()
                .collect();
            v.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(v)
        }
    }

    #[async_trait]
    impl MentorshipRepo for InMemRepo {
        async fn create_request(&self, student_id: Id, mentor_id: Id, message: String) -> RepoResult<MentorshipRequest> {
            // Existence check and insert share the write lock, so two
            // identical requests cannot both pass the check.
            let mut s = self.state.write().unwrap();
            if !s.users.contains_key(&mentor_id) {
                return Err(RepoError::NotFound);
            }
            let duplicate = s.requests.values().any(|r| {
                r.student_id == student_id
                    && r.mentor_id == mentor_id
                    && r.status == RequestStatus::Pending
            });
            if duplicate {
                return Err(RepoError::Conflict("Request already pending".into()));
            }
            let id = Self::next_id(&mut s);
            let request = MentorshipRequest {
                id,
                student_id,
                mentor_id,
                status: RequestStatus::Pending,
                message,
                created_at: Utc::now(),
            };
            s.requests.insert(id, request.clone());
            drop(s);
            self.persist();
            Ok(request)
        }

        async fn get_request(&self, id: Id) -> RepoResult<MentorshipRequest> {
            let s = self.state.read().unwrap();
            s.requests.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn set_request_status(&self, id: Id, status: RequestStatus) -> RepoResult<MentorshipRequest> {
            let mut s = self.state.write().unwrap();
            let request = s.requests.get_mut(&id).ok_or(RepoError::NotFound)?;
            request.status = status;
            let updated = request.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn requests_for_mentor(&self, mentor_id: Id, status: RequestStatus) -> RepoResult<Vec<MentorshipRequest>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .requests
                .values()
                .filter(|r| r.mentor_id == mentor_id && r.status == status)
                .cloned()
                .collect();
            v.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(v)
        }

        async fn count_for_mentor(&self, mentor_id: Id, status: RequestStatus) -> RepoResult<i64> {
            let s = self.state.read().unwrap();
            Ok(s.requests
                .values()
                .filter(|r| r.mentor_id == mentor_id && r.status == status)
                .count() as i64)
        }

        async fn accepted_for_student(&self, student_id: Id) -> RepoResult<Vec<MentorshipRequest>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .requests
                .values()
                .filter(|r| r.student_id == student_id && r.status == RequestStatus::Accepted)
                .cloned()
                .collect();
            v.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(v)
        }
    }
}

// Postgres implementation (feature = "postgres-store")
#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use sqlx::{Pool, Postgres};

    const USER_COLS: &str = "id, username, email, password_hash, role, is_verified, points, created_at";
    const QUESTION_COLS: &str = "id, title, content, user_id, is_urgent, bounty, created_at";
    const REQUEST_COLS: &str = "id, student_id, mentor_id, status, message, created_at";
    const PROFILE_COLS: &str = "id, user_id, bio, university, full_name, degree, graduation_year, current_goal, company, job_title";
    const EXPERIENCE_COLS: &str = "id, user_id, company_id, role, start_date, end_date, description";

    #[derive(Clone)]
    pub struct PgRepo {
        pool: Pool<Postgres>,
    }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self {
            Self { pool }
        }

        pub async fn migrate(&self) -> RepoResult<()> {
            sqlx::migrate!("./migrations")
                .run(&self.pool)
                .await
                .map_err(internal)
        }
    }

    fn internal<E: std::fmt::Display>(e: E) -> RepoError {
        RepoError::Internal(e.to_string())
    }

    async fn count(pool: &Pool<Postgres>, sql: &str) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(pool)
            .await
            .map_err(internal)
    }

    #[async_trait]
    impl UserRepo for PgRepo {
        async fn create_user(&self, new: NewUser) -> RepoResult<User> {
            let mut tx = self.pool.begin().await.map_err(internal)?;
            let email_taken: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                    .bind(&new.email)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(internal)?;
            if email_taken {
                return Err(RepoError::Conflict("Email already registered".into()));
            }
            let username_taken: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                    .bind(&new.username)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(internal)?;
            if username_taken {
                return Err(RepoError::Conflict("Username already taken".into()));
            }
            let user = sqlx::query_as::<_, User>(&format!(
                "INSERT INTO users (username, email, password_hash, role, points) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLS}"
            ))
            .bind(&new.username)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(new.role)
            .bind(STARTING_POINTS)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                // unique constraints back the pre-checks under concurrency
                if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
                    RepoError::Conflict("Email already registered".into())
                } else {
                    internal(e)
                }
            })?;
            tx.commit().await.map_err(internal)?;
            Ok(user)
        }

        async fn get_user(&self, id: Id) -> RepoResult<User> {
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(internal)?
                .ok_or(RepoError::NotFound)
        }

        async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(internal)
        }

        async fn list_users(&self) -> RepoResult<Vec<User>> {
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLS} FROM users ORDER BY id DESC"))
                .fetch_all(&self.pool)
                .await
                .map_err(internal)
        }

        async fn recent_users(&self, limit: i64) -> RepoResult<Vec<User>> {
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLS} FROM users ORDER BY id DESC LIMIT $1"
            ))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }

        async fn list_mentors(&self, limit: Option<i64>) -> RepoResult<Vec<User>> {
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLS} FROM users WHERE role IN ('alumni', 'mentor') ORDER BY id LIMIT $1"
            ))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }

        async fn count_users(&self) -> RepoResult<i64> {
            count(&self.pool, "SELECT COUNT(*) FROM users").await
        }

        async fn count_mentor_side(&self) -> RepoResult<i64> {
            count(&self.pool, "SELECT COUNT(*) FROM users WHERE role IN ('alumni', 'mentor')").await
        }

        async fn verify_user(&self, id: Id) -> RepoResult<User> {
            sqlx::query_as::<_, User>(&format!(
                "UPDATE users SET is_verified = TRUE WHERE id = $1 RETURNING {USER_COLS}"
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?
            .ok_or(RepoError::NotFound)
        }
    }

    #[async_trait]
    impl ProfileRepo for PgRepo {
        async fn get_profile(&self, user_id: Id) -> RepoResult<Option<Profile>> {
            sqlx::query_as::<_, Profile>(&format!(
                "SELECT {PROFILE_COLS} FROM profiles WHERE user_id = $1"
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)
        }

        async fn update_profile(&self, user_id: Id, patch: ProfilePatch) -> RepoResult<Profile> {
            sqlx::query_as::<_, Profile>(&format!(
                "INSERT INTO profiles (user_id, bio, university, full_name, degree, graduation_year, current_goal) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 ON CONFLICT (user_id) DO UPDATE SET \
                   bio = COALESCE(EXCLUDED.bio, profiles.bio), \
                   university = COALESCE(EXCLUDED.university, profiles.university), \
                   full_name = COALESCE(EXCLUDED.full_name, profiles.full_name), \
                   degree = COALESCE(EXCLUDED.degree, profiles.degree), \
                   graduation_year = COALESCE(EXCLUDED.graduation_year, profiles.graduation_year), \
                   current_goal = COALESCE(EXCLUDED.current_goal, profiles.current_goal) \
                 RETURNING {PROFILE_COLS}"
            ))
            .bind(user_id)
            .bind(&patch.bio)
            .bind(&patch.university)
            .bind(&patch.full_name)
            .bind(&patch.degree)
            .bind(patch.graduation_year)
            .bind(&patch.current_goal)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
        }

        async fn list_skills(&self, user_id: Id) -> RepoResult<Vec<Skill>> {
            sqlx::query_as::<_, Skill>(
                "SELECT id, user_id, name FROM skills WHERE user_id = $1 ORDER BY id",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }

        async fn replace_skills(&self, user_id: Id, names: Vec<String>) -> RepoResult<Vec<Skill>> {
            let mut tx = self.pool.begin().await.map_err(internal)?;
            sqlx::query("DELETE FROM skills WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(internal)?;
            let mut inserted = Vec::new();
            for name in names {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let skill = sqlx::query_as::<_, Skill>(
                    "INSERT INTO skills (user_id, name) VALUES ($1, $2) RETURNING id, user_id, name",
                )
                .bind(user_id)
                .bind(trimmed)
                .fetch_one(&mut *tx)
                .await
                .map_err(internal)?;
                inserted.push(skill);
            }
            tx.commit().await.map_err(internal)?;
            Ok(inserted)
        }

        async fn add_experience(&self, new: NewExperience) -> RepoResult<Experience> {
            sqlx::query_as::<_, Experience>(&format!(
                "INSERT INTO experiences (user_id, company_id, role, start_date, end_date, description) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING {EXPERIENCE_COLS}"
            ))
            .bind(new.user_id)
            .bind(new.company_id)
            .bind(&new.role)
            .bind(new.start_date)
            .bind(new.end_date)
            .bind(&new.description)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
        }

        async fn list_experiences(&self, user_id: Id) -> RepoResult<Vec<Experience>> {
            sqlx::query_as::<_, Experience>(&format!(
                "SELECT {EXPERIENCE_COLS} FROM experiences WHERE user_id = $1 ORDER BY id"
            ))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }

        async fn latest_experience(&self, user_id: Id) -> RepoResult<Option<Experience>> {
            // "Latest" is insertion order by design, not date order.
            sqlx::query_as::<_, Experience>(&format!(
                "SELECT {EXPERIENCE_COLS} FROM experiences WHERE user_id = $1 ORDER BY id DESC LIMIT 1"
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)
        }
    }

    #[async_trait]
    impl CompanyRepo for PgRepo {
        async fn create_company(&self, new: NewCompany) -> RepoResult<Company> {
            sqlx::query_as::<_, Company>(
                "INSERT INTO companies (name, logo_url, description) VALUES ($1, $2, $3) \
                 RETURNING id, name, logo_url, description",
            )
            .bind(&new.name)
            .bind(&new.logo_url)
            .bind(&new.description)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
                    RepoError::Conflict("Company already exists".into())
                } else {
                    internal(e)
                }
            })
        }

        async fn list_companies(&self) -> RepoResult<Vec<Company>> {
            sqlx::query_as::<_, Company>(
                "SELECT id, name, logo_url, description FROM companies ORDER BY id",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }

        async fn get_company(&self, id: Id) -> RepoResult<Company> {
            sqlx::query_as::<_, Company>(
                "SELECT id, name, logo_url, description FROM companies WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?
            .ok_or(RepoError::NotFound)
        }

        async fn count_companies(&self) -> RepoResult<i64> {
            count(&self.pool, "SELECT COUNT(*) FROM companies").await
        }
    }

    #[async_trait]
    impl CareerRepo for PgRepo {
        async fn create_career_path(&self, title: String, description: Option<String>) -> RepoResult<CareerPath> {
            sqlx::query_as::<_, CareerPath>(
                "INSERT INTO career_paths (title, description) VALUES ($1, $2) \
                 RETURNING id, title, description",
            )
            .bind(&title)
            .bind(&description)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
        }

        async fn list_career_paths(&self) -> RepoResult<Vec<CareerPath>> {
            sqlx::query_as::<_, CareerPath>(
                "SELECT id, title, description FROM career_paths ORDER BY id",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }

        async fn count_career_paths(&self) -> RepoResult<i64> {
            count(&self.pool, "SELECT COUNT(*) FROM career_paths").await
        }

        async fn create_roadmap(&self, new: NewRoadmap) -> RepoResult<Roadmap> {
            sqlx::query_as::<_, Roadmap>(
                "INSERT INTO roadmaps (title, description, steps, career_path_id, creator_id) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, title, description, steps, career_path_id, creator_id",
            )
            .bind(&new.title)
            .bind(&new.description)
            .bind(&new.steps)
            .bind(new.career_path_id)
            .bind(new.creator_id)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
        }

        async fn list_roadmaps(&self) -> RepoResult<Vec<Roadmap>> {
            sqlx::query_as::<_, Roadmap>(
                "SELECT id, title, description, steps, career_path_id, creator_id FROM roadmaps ORDER BY id",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }

        async fn get_roadmap(&self, id: Id) -> RepoResult<Roadmap> {
            sqlx::query_as::<_, Roadmap>(
                "SELECT id, title, description, steps, career_path_id, creator_id FROM roadmaps WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?
            .ok_or(RepoError::NotFound)
        }

        async fn count_roadmaps(&self) -> RepoResult<i64> {
            count(&self.pool, "SELECT COUNT(*) FROM roadmaps").await
        }
    }

    #[async_trait]
    impl DiscussionRepo for PgRepo {
        async fn create_thread(&self, user_id: Id, title: String, category: Option<String>) -> RepoResult<DiscussionThread> {
            sqlx::query_as::<_, DiscussionThread>(
                "INSERT INTO discussion_threads (title, category, user_id) VALUES ($1, $2, $3) \
                 RETURNING id, title, category, user_id, created_at",
            )
            .bind(&title)
            .bind(&category)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
        }

        async fn list_threads(&self) -> RepoResult<Vec<DiscussionThread>> {
            sqlx::query_as::<_, DiscussionThread>(
                "SELECT id, title, category, user_id, created_at FROM discussion_threads \
                 ORDER BY created_at DESC, id DESC",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }

        async fn count_threads(&self) -> RepoResult<i64> {
            count(&self.pool, "SELECT COUNT(*) FROM discussion_threads").await
        }

        async fn count_threads_by(&self, user_id: Id) -> RepoResult<i64> {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM discussion_threads WHERE user_id = $1",
            )
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
        }
    }

    #[async_trait]
    impl QuestionRepo for PgRepo {
        async fn create_question(&self, new: NewQuestion) -> RepoResult<(Question, i64)> {
            let mut tx = self.pool.begin().await.map_err(internal)?;
            if new.bounty > 0 {
                // Conditional decrement: the balance check and the
                // deduction are a single statement, so concurrent bounty
                // questions cannot overdraw the account.
                let updated = sqlx::query(
                    "UPDATE users SET points = points - $1 WHERE id = $2 AND points >= $1",
                )
                .bind(new.bounty)
                .bind(new.user_id)
                .execute(&mut *tx)
                .await
                .map_err(internal)?;
                if updated.rows_affected() == 0 {
                    let exists: bool =
                        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                            .bind(new.user_id)
                            .fetch_one(&mut *tx)
                            .await
                            .map_err(internal)?;
                    return Err(if exists {
                        RepoError::InsufficientPoints
                    } else {
                        RepoError::NotFound
                    });
                }
            }
            let question = sqlx::query_as::<_, Question>(&format!(
                "INSERT INTO questions (title, content, user_id, is_urgent, bounty) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING {QUESTION_COLS}"
            ))
            .bind(&new.title)
            .bind(&new.content)
            .bind(new.user_id)
            .bind(new.is_urgent)
            .bind(new.bounty)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if e.as_database_error().is_some_and(|d| d.is_foreign_key_violation()) {
                    RepoError::NotFound
                } else {
                    internal(e)
                }
            })?;
            let points: i64 = sqlx::query_scalar("SELECT points FROM users WHERE id = $1")
                .bind(new.user_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(internal)?;
            tx.commit().await.map_err(internal)?;
            Ok((question, points))
        }

        async fn get_question(&self, id: Id) -> RepoResult<Question> {
            sqlx::query_as::<_, Question>(&format!(
                "SELECT {QUESTION_COLS} FROM questions WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?
            .ok_or(RepoError::NotFound)
        }

        async fn question_feed(&self) -> RepoResult<Vec<Question>> {
            sqlx::query_as::<_, Question>(&format!(
                "SELECT {QUESTION_COLS} FROM questions \
                 ORDER BY is_urgent DESC, bounty DESC, created_at DESC, id DESC"
            ))
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }

        async fn recent_questions(&self, limit: i64) -> RepoResult<Vec<Question>> {
            sqlx::query_as::<_, Question>(&format!(
                "SELECT {QUESTION_COLS} FROM questions ORDER BY created_at DESC, id DESC LIMIT $1"
            ))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }

        async fn unanswered_questions(&self, filter: QuestionFilter, limit: Option<i64>) -> RepoResult<Vec<Question>> {
            // Zero-reply detection is an outer join against replies.
            let tail = match filter {
                QuestionFilter::Urgent => {
                    "AND q.is_urgent ORDER BY q.bounty DESC, q.created_at DESC, q.id DESC"
                }
                QuestionFilter::General => {
                    "AND NOT q.is_urgent ORDER BY q.created_at DESC, q.id DESC"
                }
                QuestionFilter::All => "ORDER BY q.created_at DESC, q.id DESC",
            };
            sqlx::query_as::<_, Question>(&format!(
                "SELECT q.id, q.title, q.content, q.user_id, q.is_urgent, q.bounty, q.created_at \
                 FROM questions q \
                 LEFT JOIN replies r ON r.question_id = q.id \
                 WHERE r.id IS NULL {tail} LIMIT $1"
            ))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }

        async fn count_unanswered(&self) -> RepoResult<i64> {
            count(
                &self.pool,
                "SELECT COUNT(*) FROM questions q \
                 LEFT JOIN replies r ON r.question_id = q.id WHERE r.id IS NULL",
            )
            .await
        }

        async fn count_questions_by(&self, user_id: Id) -> RepoResult<i64> {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(internal)
        }

        async fn create_reply(&self, question_id: Id, user_id: Id, content: String) -> RepoResult<Reply> {
            sqlx::query_as::<_, Reply>(
                "INSERT INTO replies (content, user_id, question_id) VALUES ($1, $2, $3) \
                 RETURNING id, content, user_id, question_id, created_at",
            )
            .bind(&content)
            .bind(user_id)
            .bind(question_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if e.as_database_error().is_some_and(|d| d.is_foreign_key_violation()) {
                    RepoError::NotFound
                } else {
                    internal(e)
                }
            })
        }

        async fn list_replies(&self, question_id: Id) -> RepoResult<Vec<Reply>> {
            sqlx::query_as::<_, Reply>(
                "SELECT id, content, user_id, question_id, created_at FROM replies \
                 WHERE question_id = $1 ORDER BY created_at, id",
            )
            .bind(question_id)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }
    }

    #[async_trait]
    impl MentorshipRepo for PgRepo {
        async fn create_request(&self, student_id: Id, mentor_id: Id, message: String) -> RepoResult<MentorshipRequest> {
            // Single-statement check-and-insert; the partial unique index
            // on pending rows backs it up under concurrency.
            sqlx::query_as::<_, MentorshipRequest>(&format!(
                "INSERT INTO mentorship_requests (student_id, mentor_id, status, message) \
                 SELECT $1, $2, 'pending', $3 \
                 WHERE NOT EXISTS (SELECT 1 FROM mentorship_requests \
                   WHERE student_id = $1 AND mentor_id = $2 AND status = 'pending') \
                 RETURNING {REQUEST_COLS}"
            ))
            .bind(student_id)
            .bind(mentor_id)
            .bind(&message)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
                    RepoError::Conflict("Request already pending".into())
                } else {
                    internal(e)
                }
            })?
            .ok_or_else(|| RepoError::Conflict("Request already pending".into()))
        }

        async fn get_request(&self, id: Id) -> RepoResult<MentorshipRequest> {
            sqlx::query_as::<_, MentorshipRequest>(&format!(
                "SELECT {REQUEST_COLS} FROM mentorship_requests WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?
            .ok_or(RepoError::NotFound)
        }

        async fn set_request_status(&self, id: Id, status: RequestStatus) -> RepoResult<MentorshipRequest> {
            sqlx::query_as::<_, MentorshipRequest>(&format!(
                "UPDATE mentorship_requests SET status = $2 WHERE id = $1 RETURNING {REQUEST_COLS}"
            ))
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?
            .ok_or(RepoError::NotFound)
        }

        async fn requests_for_mentor(&self, mentor_id: Id, status: RequestStatus) -> RepoResult<Vec<MentorshipRequest>> {
            sqlx::query_as::<_, MentorshipRequest>(&format!(
                "SELECT {REQUEST_COLS} FROM mentorship_requests \
                 WHERE mentor_id = $1 AND status = $2 ORDER BY id"
            ))
            .bind(mentor_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }

        async fn count_for_mentor(&self, mentor_id: Id, status: RequestStatus) -> RepoResult<i64> {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM mentorship_requests WHERE mentor_id = $1 AND status = $2",
            )
            .bind(mentor_id)
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
        }

        async fn accepted_for_student(&self, student_id: Id) -> RepoResult<Vec<MentorshipRequest>> {
            sqlx::query_as::<_, MentorshipRequest>(&format!(
                "SELECT {REQUEST_COLS} FROM mentorship_requests \
                 WHERE student_id = $1 AND status = 'accepted' ORDER BY id"
            ))
            .bind(student_id)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }
    }
}
