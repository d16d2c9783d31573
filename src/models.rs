use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;

pub type Id = i64;

/// Lifecycle of a mentorship request. `Pending` is the only non-terminal
/// state; the owning mentor moves a request to `Accepted` or `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "postgres-store", derive(sqlx::Type), sqlx(rename_all = "lowercase"))]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_verified: bool,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a user returned by login/status. The full `User`
/// row never goes on the wire.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub points: i64,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            role: u.role,
            points: u.points,
        }
    }
}

/// Insert payload for users; the password is already hashed by the time it
/// reaches the repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct Profile {
    pub id: Id,
    pub user_id: Id,
    pub bio: Option<String>,
    pub university: Option<String>,
    pub full_name: Option<String>,
    pub degree: Option<String>,
    pub graduation_year: Option<i32>,
    pub current_goal: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
}

/// Merge-patch for profile updates: only provided fields overwrite.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProfilePatch {
    pub bio: Option<String>,
    pub university: Option<String>,
    pub full_name: Option<String>,
    pub degree: Option<String>,
    pub graduation_year: Option<i32>,
    pub current_goal: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct Skill {
    pub id: Id,
    pub user_id: Id,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct Company {
    pub id: Id,
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct Experience {
    pub id: Id,
    pub user_id: Id,
    pub company_id: Option<Id>,
    pub role: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewExperience {
    pub user_id: Id,
    pub company_id: Option<Id>,
    pub role: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct CareerPath {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct Roadmap {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub steps: Option<String>, // opaque serialized step list
    pub career_path_id: Option<Id>,
    pub creator_id: Id,
}

#[derive(Debug, Clone)]
pub struct NewRoadmap {
    pub title: String,
    pub description: Option<String>,
    pub steps: Option<String>,
    pub career_path_id: Option<Id>,
    pub creator_id: Id,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct DiscussionThread {
    pub id: Id,
    pub title: String,
    pub category: Option<String>,
    pub user_id: Id,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct Question {
    pub id: Id,
    pub title: String,
    pub content: String,
    pub user_id: Id,
    pub is_urgent: bool,
    pub bounty: i64,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for questions. The bounty is already normalized by the
/// handler: zero unless the question is urgent.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub title: String,
    pub content: String,
    pub user_id: Id,
    pub is_urgent: bool,
    pub bounty: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct Reply {
    pub id: Id,
    pub content: String,
    pub user_id: Id,
    pub question_id: Id,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct MentorshipRequest {
    pub id: Id,
    pub student_id: Id,
    pub mentor_id: Id,
    pub status: RequestStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
