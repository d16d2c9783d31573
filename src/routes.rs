use std::sync::Arc;

use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::auth::{self, CurrentUser, Role, SESSION_USER_KEY};
use crate::error::ApiError;
use crate::models::*;
use crate::rate_limit::RateLimiterFacade;
use crate::repo::{QuestionFilter, Repo};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(web::resource("/register").route(web::post().to(register)))
            .service(web::resource("/login").route(web::post().to(login)))
            .service(web::resource("/logout").route(web::post().to(logout)))
            .service(web::resource("/status").route(web::get().to(auth_status))),
    );
    cfg.service(
        web::scope("/api")
            .service(
                web::resource("/user/profile")
                    .route(web::get().to(get_profile))
                    .route(web::post().to(update_profile)),
            )
            .service(web::resource("/dashboard").route(web::get().to(student_dashboard)))
            .service(web::resource("/mentors").route(web::get().to(list_mentors)))
            .service(web::resource("/student/mentors").route(web::get().to(connected_mentors)))
            .service(web::resource("/messages").route(web::post().to(send_message)))
            .service(web::resource("/companies").route(web::get().to(list_companies)))
            .service(web::resource("/career/paths").route(web::get().to(list_career_paths)))
            .service(web::resource("/career/roadmaps").route(web::get().to(list_roadmaps)))
            .service(web::resource("/career/roadmaps/{id}").route(web::get().to(roadmap_detail)))
            .service(
                web::resource("/discussions")
                    .route(web::get().to(list_discussions))
                    .route(web::post().to(create_discussion)),
            )
            .service(
                web::resource("/questions")
                    .route(web::get().to(list_questions))
                    .route(web::post().to(create_question)),
            )
            .service(web::resource("/questions/{id}/reply").route(web::post().to(create_reply)))
            .service(web::resource("/roadmaps").route(web::post().to(create_roadmap)))
            .service(web::resource("/mentor/dashboard").route(web::get().to(mentor_dashboard)))
            .service(web::resource("/mentor/questions").route(web::get().to(mentor_questions)))
            .service(web::resource("/mentor/mentees").route(web::get().to(mentor_mentees)))
            .service(web::resource("/mentor/requests").route(web::get().to(mentor_requests)))
            .service(
                web::resource("/mentorship/request").route(web::post().to(create_mentorship_request)),
            )
            .service(
                web::resource("/mentorship/request/{id}/respond")
                    .route(web::post().to(respond_mentorship_request)),
            )
            .service(web::resource("/admin/dashboard").route(web::get().to(admin_dashboard)))
            .service(web::resource("/admin/users").route(web::get().to(admin_users)))
            .service(web::resource("/admin/verify_user/{id}").route(web::post().to(admin_verify_user)))
            .service(web::resource("/admin/content").route(web::get().to(admin_content))),
    );
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
    pub limits: RateLimiterFacade,
}

// ---------------- role guards -----------------------------------------
macro_rules! ensure_admin {
    ($user:expr) => {
        if !$user.role.is_admin() {
            return Err(ApiError::Forbidden("Unauthorized".into()));
        }
    };
}

macro_rules! ensure_mentor_side {
    ($user:expr) => {
        if !$user.role.is_mentor_side() {
            return Err(ApiError::Forbidden("Unauthorized".into()));
        }
    };
}
// -----------------------------------------------------------------------

fn fmt_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// Profile full name when present and non-empty, else the username.
fn display_name(user: &User, profile: Option<&Profile>) -> String {
    profile
        .and_then(|p| p.full_name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| user.username.clone())
}

fn initials(name: &str) -> String {
    name.chars().take(2).collect::<String>().to_uppercase()
}

async fn author_display_name(repo: &dyn Repo, user_id: Id) -> Result<(User, String), ApiError> {
    let user = repo.get_user(user_id).await?;
    let profile = repo.get_profile(user_id).await?;
    let name = display_name(&user, profile.as_ref());
    Ok((user, name))
}

/// Display identity of a mentor card: (name, job title, company). The job
/// title and company come from the mentor's most recently added
/// experience, falling back to "Mentor" at "Unknown".
async fn mentor_identity(repo: &dyn Repo, mentor: &User) -> Result<(String, String, String), ApiError> {
    let profile = repo.get_profile(mentor.id).await?;
    let name = display_name(mentor, profile.as_ref());
    let mut job_role = "Mentor".to_string();
    let mut company_name = "Unknown".to_string();
    if let Some(exp) = repo.latest_experience(mentor.id).await? {
        job_role = exp.role.clone();
        if let Some(company_id) = exp.company_id {
            if let Ok(company) = repo.get_company(company_id).await {
                company_name = company.name;
            }
        }
    }
    Ok((name, job_role, company_name))
}

// ---------------- auth -------------------------------------------------

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Missing fields or duplicate email/username")
    )
)]
pub async fn register(
    data: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let (username, email, password) = match (
        payload.username.filter(|s| !s.is_empty()),
        payload.email.filter(|s| !s.is_empty()),
        payload.password.filter(|s| !s.is_empty()),
    ) {
        (Some(u), Some(e), Some(p)) => (u, e, p),
        _ => return Err(ApiError::BadRequest("Missing required fields".into())),
    };
    let role = match payload.role.as_deref() {
        None => Role::Student,
        Some(raw) => Role::parse(raw).ok_or_else(|| ApiError::BadRequest("Invalid role".into()))?,
    };
    let password_hash = auth::hash_password(&password).map_err(|_| ApiError::Internal)?;
    data.repo
        .create_user(NewUser { username, email, password_hash, role })
        .await?;
    Ok(HttpResponse::Created().json(json!({ "message": "User registered successfully" })))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session established, bearer token issued"),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    session: Session,
    data: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let (email, password) = match (
        payload.email.filter(|s| !s.is_empty()),
        payload.password.filter(|s| !s.is_empty()),
    ) {
        (Some(e), Some(p)) => (e, p),
        _ => return Err(ApiError::BadRequest("Missing email or password".into())),
    };
    let user = match data.repo.find_user_by_email(&email).await? {
        Some(user) if auth::verify_password(&password, &user.password_hash) => user,
        _ => return Err(ApiError::Unauthorized("Invalid email or password".into())),
    };
    session
        .insert(SESSION_USER_KEY, user.id)
        .map_err(|_| ApiError::Internal)?;
    let token = auth::create_token(user.id).map_err(|_| ApiError::Internal)?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Login successful",
        "token": token,
        "user": UserSummary::from(&user),
    })))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session invalidated"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(_user: CurrentUser, session: Session) -> Result<HttpResponse, ApiError> {
    // Only the cookie session dies here; outstanding bearer tokens run
    // until their natural expiry.
    session.purge();
    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out successfully" })))
}

#[utoipa::path(
    get,
    path = "/auth/status",
    responses((status = 200, description = "Authentication state of the caller"))
)]
pub async fn auth_status(user: Option<CurrentUser>) -> Result<HttpResponse, ApiError> {
    match user {
        Some(CurrentUser(user)) => Ok(HttpResponse::Ok().json(json!({
            "authenticated": true,
            "user": UserSummary::from(&user),
        }))),
        None => Ok(HttpResponse::Ok().json(json!({ "authenticated": false }))),
    }
}

// ---------------- profile ----------------------------------------------

pub async fn get_profile(
    user: CurrentUser,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = user.0;
    let profile = data.repo.get_profile(user.id).await?;
    let profile_data = match &profile {
        Some(p) => json!({
            "bio": p.bio,
            "university": p.university,
            "full_name": p.full_name,
            "degree": p.degree,
            "graduation_year": p.graduation_year,
            "current_goal": p.current_goal,
        }),
        None => json!({}),
    };
    let skills: Vec<String> = data
        .repo
        .list_skills(user.id)
        .await?
        .into_iter()
        .map(|s| s.name)
        .collect();
    let mut experiences = Vec::new();
    for exp in data.repo.list_experiences(user.id).await? {
        let company = match exp.company_id {
            Some(id) => data
                .repo
                .get_company(id)
                .await
                .map(|c| c.name)
                .unwrap_or_else(|_| "Unknown".into()),
            None => "Unknown".into(),
        };
        experiences.push(json!({
            "role": exp.role,
            "company": company,
            "start_date": exp.start_date.map(|d| d.to_string()),
            "end_date": exp.end_date.map(|d| d.to_string()),
            "description": exp.description,
        }));
    }
    Ok(HttpResponse::Ok().json(json!({
        "username": user.username,
        "email": user.email,
        "role": user.role,
        "profile": profile_data,
        "skills": skills,
        "experiences": experiences,
    })))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub university: Option<String>,
    pub full_name: Option<String>,
    pub degree: Option<String>,
    pub graduation_year: Option<i32>,
    pub current_goal: Option<String>,
    pub skills: Option<SkillsInput>,
}

/// Skills arrive either as a list or as a comma-separated string.
#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum SkillsInput {
    List(Vec<String>),
    Csv(String),
}

impl SkillsInput {
    fn into_names(self) -> Vec<String> {
        match self {
            SkillsInput::List(v) => v,
            SkillsInput::Csv(s) => s.split(',').map(|p| p.to_string()).collect(),
        }
    }
}

pub async fn update_profile(
    user: CurrentUser,
    data: web::Data<AppState>,
    payload: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = user.0;
    let payload = payload.into_inner();
    let patch = ProfilePatch {
        bio: payload.bio,
        university: payload.university,
        full_name: payload.full_name,
        degree: payload.degree,
        graduation_year: payload.graduation_year,
        current_goal: payload.current_goal,
    };
    data.repo.update_profile(user.id, patch).await?;
    if let Some(skills) = payload.skills {
        data.repo.replace_skills(user.id, skills.into_names()).await?;
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Profile updated successfully" })))
}

// ---------------- dashboards -------------------------------------------

pub async fn student_dashboard(
    user: CurrentUser,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = user.0;
    let repo = data.repo.as_ref();
    let profile = repo.get_profile(user.id).await?;
    let user_name = display_name(&user, profile.as_ref());

    let question_count = repo.count_questions_by(user.id).await?;
    let thread_count = repo.count_threads_by(user.id).await?;

    let mut mentors_data = Vec::new();
    for mentor in repo.list_mentors(Some(3)).await? {
        let (name, job_role, company_name) = mentor_identity(repo, &mentor).await?;
        mentors_data.push(json!({
            "id": mentor.id,
            "name": name,
            "role": job_role,
            "company": company_name,
            "trust_score": 95, // placeholder until a real trust model exists
        }));
    }

    let mut activity_feed = Vec::new();
    for q in repo.recent_questions(3).await? {
        let (_, author_name) = author_display_name(repo, q.user_id).await?;
        activity_feed.push(json!({
            "text": format!("<strong>{}</strong> asked: {}", author_name, q.title),
            "time": fmt_date(&q.created_at),
        }));
    }

    // the fallback applies only when no profile row exists at all
    let current_goal = match profile {
        Some(p) => json!(p.current_goal),
        None => json!("Set a goal!"),
    };

    Ok(HttpResponse::Ok().json(json!({
        "user_name": user_name,
        "points": user.points,
        "stats": {
            "questions": question_count,
            // responses and saved roadmaps are not tracked yet
            "responses": 0,
            "roadmaps": 0,
        },
        "current_goal": current_goal,
        "mentors": mentors_data,
        "activity": activity_feed,
    })))
}

#[utoipa::path(
    get,
    path = "/api/mentor/dashboard",
    responses(
        (status = 200, description = "Mentor stats and unanswered-question queues"),
        (status = 403, description = "Caller is not a mentor or alumni")
    )
)]
pub async fn mentor_dashboard(
    user: CurrentUser,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = user.0;
    ensure_mentor_side!(user);
    let repo = data.repo.as_ref();
    let profile = repo.get_profile(user.id).await?;
    let user_name = display_name(&user, profile.as_ref());

    let mentees_count = repo.count_for_mentor(user.id, RequestStatus::Accepted).await?;
    let requests_count = repo.count_for_mentor(user.id, RequestStatus::Pending).await?;

    let mut questions_data = Vec::new();
    for q in repo.unanswered_questions(QuestionFilter::General, Some(5)).await? {
        let (_, author_name) = author_display_name(repo, q.user_id).await?;
        questions_data.push(json!({
            "id": q.id,
            "title": q.title,
            "content": q.content,
            "author": author_name,
            "author_initials": initials(&author_name),
            "time": fmt_date(&q.created_at),
        }));
    }

    let mut urgent_data = Vec::new();
    for q in repo.unanswered_questions(QuestionFilter::Urgent, Some(5)).await? {
        let (_, author_name) = author_display_name(repo, q.user_id).await?;
        urgent_data.push(json!({
            "id": q.id,
            "title": q.title,
            "content": q.content,
            "author": author_name,
            "author_initials": initials(&author_name),
            "time": fmt_date(&q.created_at),
            "bounty": q.bounty,
        }));
    }

    let total_unanswered = repo.count_unanswered().await?;

    Ok(HttpResponse::Ok().json(json!({
        "user_name": user_name,
        "stats": {
            "mentees": mentees_count,
            "requests": requests_count,
            // no session tracking yet
            "sessions": 0,
            "unanswered_questions": total_unanswered,
        },
        "questions": questions_data,
        "urgent_questions": urgent_data,
    })))
}

pub async fn admin_dashboard(
    user: CurrentUser,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = user.0;
    ensure_admin!(user);
    let repo = data.repo.as_ref();

    let total_users = repo.count_users().await?;
    let total_mentors = repo.count_mentor_side().await?;
    let total_discussions = repo.count_threads().await?;

    let users_data: Vec<_> = repo
        .recent_users(5)
        .await?
        .iter()
        .map(|u| {
            json!({
                "username": u.username,
                "email": u.email,
                "role": u.role,
                "joined": fmt_date(&u.created_at),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "user_name": user.username,
        "stats": {
            "users": total_users,
            "mentors": total_mentors,
            "discussions": total_discussions,
        },
        "users": users_data,
    })))
}

// ---------------- mentors ----------------------------------------------

pub async fn list_mentors(
    _user: CurrentUser,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let repo = data.repo.as_ref();
    let mut mentors_data = Vec::new();
    for mentor in repo.list_mentors(None).await? {
        let (name, job_role, company_name) = mentor_identity(repo, &mentor).await?;
        let bio = match repo.get_profile(mentor.id).await? {
            Some(p) => json!(p.bio),
            None => json!("No bio available."),
        };
        mentors_data.push(json!({
            "id": mentor.id,
            "name": name,
            "role": job_role,
            "company": company_name,
            "bio": bio,
            "initials": initials(&name),
        }));
    }
    Ok(HttpResponse::Ok().json(mentors_data))
}

pub async fn connected_mentors(
    user: CurrentUser,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let repo = data.repo.as_ref();
    let mut mentors_data = Vec::new();
    for req in repo.accepted_for_student(user.0.id).await? {
        let mentor = repo.get_user(req.mentor_id).await?;
        let (name, job_role, company_name) = mentor_identity(repo, &mentor).await?;
        let bio = match repo.get_profile(mentor.id).await? {
            Some(p) => json!(p.bio),
            None => json!("No bio available."),
        };
        mentors_data.push(json!({
            "id": mentor.id,
            "name": name,
            "role": job_role,
            "company": company_name,
            "bio": bio,
            "initials": initials(&name),
        }));
    }
    Ok(HttpResponse::Ok().json(mentors_data))
}

// ---------------- messages (stub) ---------------------------------------

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct MessageRequest {
    pub recipient_id: Option<Id>,
    pub content: Option<String>,
}

pub async fn send_message(
    _user: CurrentUser,
    payload: web::Json<MessageRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    if payload.recipient_id.is_none() || payload.content.as_deref().unwrap_or("").is_empty() {
        return Err(ApiError::BadRequest("Recipient and content are required".into()));
    }
    // Accepted but not persisted: there is no message model yet.
    Ok(HttpResponse::Ok().json(json!({ "message": "Message sent successfully" })))
}

// ---------------- career exploration ------------------------------------

pub async fn list_companies(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let companies: Vec<_> = data
        .repo
        .list_companies()
        .await?
        .iter()
        .map(|c| {
            json!({
                "name": c.name,
                "description": c.description,
                "logo_url": c.logo_url,
            })
        })
        .collect();
    Ok(HttpResponse::Ok().json(companies))
}

pub async fn list_career_paths(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let paths: Vec<_> = data
        .repo
        .list_career_paths()
        .await?
        .iter()
        .map(|p| json!({ "title": p.title, "description": p.description }))
        .collect();
    Ok(HttpResponse::Ok().json(paths))
}

pub async fn list_roadmaps(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let repo = data.repo.as_ref();
    let mut result = Vec::new();
    for r in repo.list_roadmaps().await? {
        let (_, creator_name) = author_display_name(repo, r.creator_id).await?;
        result.push(json!({
            "id": r.id,
            "title": r.title,
            "description": r.description,
            "creator": creator_name,
            "saves": 120, // placeholder until saves are tracked
        }));
    }
    Ok(HttpResponse::Ok().json(result))
}

pub async fn roadmap_detail(
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let repo = data.repo.as_ref();
    let r = repo.get_roadmap(path.into_inner()).await?;
    let (creator, creator_name) = author_display_name(repo, r.creator_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "id": r.id,
        "title": r.title,
        "description": r.description,
        "steps": r.steps,
        "creator": creator_name,
        "creator_role": creator.role,
        "saves": 120,
    })))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct NewRoadmapRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub steps: Option<serde_json::Value>,
}

pub async fn create_roadmap(
    user: CurrentUser,
    data: web::Data<AppState>,
    payload: web::Json<NewRoadmapRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = user.0;
    if !user.role.can_publish_roadmaps() {
        return Err(ApiError::Forbidden("Unauthorized".into()));
    }
    let payload = payload.into_inner();
    let (title, description) = match (
        payload.title.filter(|s| !s.is_empty()),
        payload.description.filter(|s| !s.is_empty()),
    ) {
        (Some(t), Some(d)) => (t, d),
        _ => return Err(ApiError::BadRequest("Title and description are required".into())),
    };
    let steps = payload.steps.map(|v| match v {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    });
    let roadmap = data
        .repo
        .create_roadmap(NewRoadmap {
            title,
            description: Some(description),
            steps,
            career_path_id: None,
            creator_id: user.id,
        })
        .await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Roadmap created successfully",
        "id": roadmap.id,
    })))
}

// ---------------- discussions -------------------------------------------

pub async fn list_discussions(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let repo = data.repo.as_ref();
    let mut result = Vec::new();
    for t in repo.list_threads().await? {
        let (author, author_name) = author_display_name(repo, t.user_id).await?;
        result.push(json!({
            "id": t.id,
            "title": t.title,
            "category": t.category,
            "author": author_name,
            "author_role": author.role,
            "created_at": fmt_date(&t.created_at),
            // engagement counters are not modeled yet
            "likes": 42 + t.id * 2,
            "replies": 5 + t.id,
        }));
    }
    Ok(HttpResponse::Ok().json(result))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct NewThreadRequest {
    pub title: Option<String>,
    pub category: Option<String>,
}

pub async fn create_discussion(
    user: CurrentUser,
    data: web::Data<AppState>,
    payload: web::Json<NewThreadRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let title = payload
        .title
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Title is required".into()))?;
    let thread = data
        .repo
        .create_thread(user.0.id, title, payload.category)
        .await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Thread created successfully",
        "id": thread.id,
    })))
}

// ---------------- questions ---------------------------------------------

#[utoipa::path(
    get,
    path = "/api/questions",
    responses((status = 200, description = "Question feed: urgent first, then bounty, then recency"))
)]
pub async fn list_questions(
    _user: CurrentUser,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let repo = data.repo.as_ref();
    let mut output = Vec::new();
    for q in repo.question_feed().await? {
        let (author, author_name) = author_display_name(repo, q.user_id).await?;
        let mut replies = Vec::new();
        for r in repo.list_replies(q.id).await? {
            let (reply_author, reply_author_name) = author_display_name(repo, r.user_id).await?;
            replies.push(json!({
                "id": r.id,
                "content": r.content,
                "author_name": reply_author_name,
                "author_role": reply_author.role,
                "created_at": fmt_date(&r.created_at),
            }));
        }
        output.push(json!({
            "id": q.id,
            "title": q.title,
            "content": q.content,
            "is_urgent": q.is_urgent,
            "bounty": q.bounty,
            "author_name": author_name,
            "author_initials": initials(&author.username),
            "created_at": fmt_date(&q.created_at),
            "replies": replies,
        }));
    }
    Ok(HttpResponse::Ok().json(output))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct NewQuestionRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_urgent: Option<bool>,
    pub bounty: Option<i64>,
}

#[utoipa::path(
    post,
    path = "/api/questions",
    request_body = NewQuestionRequest,
    responses(
        (status = 201, description = "Question created; bounty deducted from the author"),
        (status = 400, description = "Missing fields or insufficient points")
    )
)]
pub async fn create_question(
    user: CurrentUser,
    data: web::Data<AppState>,
    payload: web::Json<NewQuestionRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = user.0;
    if !data.limits.allow_question(&user.id.to_string()) {
        return Err(ApiError::TooManyRequests);
    }
    let payload = payload.into_inner();
    let (title, content) = match (
        payload.title.filter(|s| !s.is_empty()),
        payload.content.filter(|s| !s.is_empty()),
    ) {
        (Some(t), Some(c)) => (t, c),
        _ => return Err(ApiError::BadRequest("Title and content are required".into())),
    };
    let is_urgent = payload.is_urgent.unwrap_or(false);
    let bounty = if is_urgent { payload.bounty.unwrap_or(0) } else { 0 };
    if bounty < 0 {
        return Err(ApiError::BadRequest("Bounty must be non-negative".into()));
    }
    let (question, points_remaining) = data
        .repo
        .create_question(NewQuestion {
            title,
            content,
            user_id: user.id,
            is_urgent,
            bounty,
        })
        .await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Question created successfully",
        "id": question.id,
        "points_remaining": points_remaining,
    })))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct ReplyRequest {
    pub content: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/questions/{id}/reply",
    request_body = ReplyRequest,
    params(("id" = Id, Path, description = "Question id")),
    responses(
        (status = 201, description = "Reply added"),
        (status = 403, description = "Role cannot answer, or account not verified"),
        (status = 404, description = "Question not found")
    )
)]
pub async fn create_reply(
    user: CurrentUser,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<ReplyRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = user.0;
    if !user.role.can_answer_questions() {
        return Err(ApiError::Forbidden("Unauthorized role".into()));
    }
    if user.role.is_mentor_side() && !user.is_verified {
        return Err(ApiError::Forbidden("Account not verified by admin".into()));
    }
    if !data.limits.allow_reply(&user.id.to_string()) {
        return Err(ApiError::TooManyRequests);
    }
    let content = payload
        .into_inner()
        .content
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Content is required".into()))?;
    let question = data.repo.get_question(path.into_inner()).await?;
    data.repo.create_reply(question.id, user.id, content).await?;
    Ok(HttpResponse::Created().json(json!({ "message": "Reply added successfully" })))
}

// ---------------- mentor views ------------------------------------------

pub async fn mentor_questions(
    user: CurrentUser,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = user.0;
    ensure_mentor_side!(user);
    let repo = data.repo.as_ref();
    let mut questions_data = Vec::new();
    for q in repo.unanswered_questions(QuestionFilter::All, None).await? {
        let (_, author_name) = author_display_name(repo, q.user_id).await?;
        questions_data.push(json!({
            "id": q.id,
            "title": q.title,
            "content": q.content,
            "author": author_name,
            "author_initials": initials(&author_name),
            "time": fmt_date(&q.created_at),
            "is_urgent": q.is_urgent,
            "bounty": q.bounty,
        }));
    }
    Ok(HttpResponse::Ok().json(questions_data))
}

pub async fn mentor_mentees(
    user: CurrentUser,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = user.0;
    ensure_mentor_side!(user);
    let repo = data.repo.as_ref();
    let mut mentees = Vec::new();
    for req in repo.requests_for_mentor(user.id, RequestStatus::Accepted).await? {
        let student = repo.get_user(req.student_id).await?;
        let profile = repo.get_profile(student.id).await?;
        let name = display_name(&student, profile.as_ref());
        let goal = match profile {
            Some(p) => json!(p.current_goal),
            None => json!("No goal set"),
        };
        mentees.push(json!({
            "id": student.id,
            "name": name,
            "initials": initials(&name),
            "goal": goal,
        }));
    }
    Ok(HttpResponse::Ok().json(mentees))
}

pub async fn mentor_requests(
    user: CurrentUser,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = user.0;
    ensure_mentor_side!(user);
    let repo = data.repo.as_ref();
    let mut requests_data = Vec::new();
    for req in repo.requests_for_mentor(user.id, RequestStatus::Pending).await? {
        let (_, name) = author_display_name(repo, req.student_id).await?;
        requests_data.push(json!({
            "id": req.id,
            "name": name,
            "initials": initials(&name),
            "date": fmt_date(&req.created_at),
            "message": req.message,
        }));
    }
    Ok(HttpResponse::Ok().json(requests_data))
}

// ---------------- mentorship requests -----------------------------------

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct MentorshipRequestPayload {
    pub mentor_id: Option<Id>,
    pub message: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/mentorship/request",
    request_body = MentorshipRequestPayload,
    responses(
        (status = 201, description = "Request created"),
        (status = 400, description = "Missing fields or a request is already pending"),
        (status = 403, description = "Only students can request mentorship")
    )
)]
pub async fn create_mentorship_request(
    user: CurrentUser,
    data: web::Data<AppState>,
    payload: web::Json<MentorshipRequestPayload>,
) -> Result<HttpResponse, ApiError> {
    let user = user.0;
    if user.role != Role::Student {
        return Err(ApiError::Forbidden("Only students can request mentorship".into()));
    }
    if !data.limits.allow_request(&user.id.to_string()) {
        return Err(ApiError::TooManyRequests);
    }
    let payload = payload.into_inner();
    let (mentor_id, message) = match (
        payload.mentor_id,
        payload.message.filter(|s| !s.is_empty()),
    ) {
        (Some(m), Some(msg)) => (m, msg),
        _ => return Err(ApiError::BadRequest("Mentor ID and message are required".into())),
    };
    data.repo.create_request(user.id, mentor_id, message).await?;
    Ok(HttpResponse::Created().json(json!({ "message": "Request sent successfully" })))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct RespondRequest {
    pub action: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/mentorship/request/{id}/respond",
    request_body = RespondRequest,
    params(("id" = Id, Path, description = "Mentorship request id")),
    responses(
        (status = 200, description = "Status overwritten with the requested action"),
        (status = 400, description = "Invalid action"),
        (status = 403, description = "Caller does not own the request"),
        (status = 404, description = "Request not found")
    )
)]
pub async fn respond_mentorship_request(
    user: CurrentUser,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<RespondRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = user.0;
    ensure_mentor_side!(user);
    let request = data.repo.get_request(path.into_inner()).await?;
    if request.mentor_id != user.id {
        return Err(ApiError::Forbidden("Unauthorized".into()));
    }
    let action = payload.into_inner().action.unwrap_or_default();
    let status = match action.as_str() {
        "accept" => RequestStatus::Accepted,
        "reject" => RequestStatus::Rejected,
        _ => return Err(ApiError::BadRequest("Invalid action".into())),
    };
    // No terminal-state re-validation: a second respond overwrites the
    // first.
    data.repo.set_request_status(request.id, status).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": format!("Request {}ed", action) })))
}

// ---------------- admin -------------------------------------------------

pub async fn admin_users(
    user: CurrentUser,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    ensure_admin!(user.0);
    let users_data: Vec<_> = data
        .repo
        .list_users()
        .await?
        .iter()
        .map(|u| {
            json!({
                "id": u.id,
                "username": u.username,
                "email": u.email,
                "role": u.role,
                "is_verified": u.is_verified,
                "joined": fmt_date(&u.created_at),
            })
        })
        .collect();
    Ok(HttpResponse::Ok().json(users_data))
}

#[utoipa::path(
    post,
    path = "/api/admin/verify_user/{id}",
    params(("id" = Id, Path, description = "User id")),
    responses(
        (status = 200, description = "User marked verified"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn admin_verify_user(
    user: CurrentUser,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    ensure_admin!(user.0);
    let verified = data.repo.verify_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("User {} verified successfully", verified.username),
    })))
}

pub async fn admin_content(
    user: CurrentUser,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    ensure_admin!(user.0);
    let repo = data.repo.as_ref();
    Ok(HttpResponse::Ok().json(json!({
        "companies_count": repo.count_companies().await?,
        "paths_count": repo.count_career_paths().await?,
        "roadmaps_count": repo.count_roadmaps().await?,
    })))
}
