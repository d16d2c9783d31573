use actix_session::Session;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::{Id, User};
use crate::repo::Repo as _;
use crate::routes::AppState;

/// Closed role set. Authorization decisions go through the capability
/// methods below rather than string comparisons in handlers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "postgres-store", derive(sqlx::Type), sqlx(rename_all = "lowercase"))]
pub enum Role {
    Student,
    Alumni,
    Mentor,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "student" => Some(Role::Student),
            "alumni" => Some(Role::Alumni),
            "mentor" => Some(Role::Mentor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Alumni => "alumni",
            Role::Mentor => "mentor",
            Role::Admin => "admin",
        }
    }

    /// Mentor-side roles see the mentor dashboard and its queues.
    pub fn is_mentor_side(self) -> bool {
        matches!(self, Role::Mentor | Role::Alumni)
    }

    pub fn can_answer_questions(self) -> bool {
        matches!(self, Role::Mentor | Role::Alumni | Role::Admin)
    }

    pub fn can_publish_roadmaps(self) -> bool {
        matches!(self, Role::Mentor | Role::Alumni | Role::Admin)
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Bearer token claim set: the referenced user and an expiry instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Id,
    pub exp: usize,
}

pub const TOKEN_TTL_HOURS: i64 = 24;

/// Session cookie key holding the logged-in user id.
pub const SESSION_USER_KEY: &str = "user_id";

/// Create a signed bearer token for a user, valid for [`TOKEN_TTL_HOURS`].
pub fn create_token(user_id: Id) -> Result<String, jsonwebtoken::errors::Error> {
    let secret = env::var("JWT_SECRET").expect("JWT_SECRET not set");
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(TOKEN_TTL_HOURS))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims { id: user_id, exp: expiration };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Result of bearer-token verification. The HTTP contract treats anything
/// but `Valid` as anonymous; the distinction exists for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOutcome {
    Valid(Id),
    Expired,
    Malformed,
}

/// Validate a bearer token and classify the failure mode.
pub fn verify_token(token: &str) -> TokenOutcome {
    let secret = env::var("JWT_SECRET").expect("JWT_SECRET not set");
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => TokenOutcome::Valid(data.claims.id),
        Err(e) => match e.kind() {
            ErrorKind::ExpiredSignature => TokenOutcome::Expired,
            _ => TokenOutcome::Malformed,
        },
    }
}

/// Hash a password into a salted PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verify a password against a stored PHC string. An unparsable stored
/// hash counts as a mismatch.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Extractor resolving the calling user over either auth channel: bearer
/// token first, cookie session second. A request is authenticated if
/// either resolves to a live user row.
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, pl: &mut Payload) -> Self::Future {
        let bearer = BearerAuth::from_request(req, pl)
            .into_inner()
            .ok()
            .map(|b| b.token().to_string());
        let session = Session::from_request(req, pl).into_inner();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                actix_web::error::ErrorInternalServerError("application state missing")
            })?;
            if let Some(token) = bearer {
                match verify_token(&token) {
                    TokenOutcome::Valid(id) => {
                        if let Ok(user) = state.repo.get_user(id).await {
                            return Ok(CurrentUser(user));
                        }
                    }
                    // Invalid bearer credentials degrade to the session
                    // channel rather than failing the request outright.
                    outcome => tracing::debug!(?outcome, "bearer token rejected"),
                }
            }
            if let Ok(session) = &session {
                if let Ok(Some(id)) = session.get::<Id>(SESSION_USER_KEY) {
                    if let Ok(user) = state.repo.get_user(id).await {
                        return Ok(CurrentUser(user));
                    }
                }
            }
            Err(ApiError::Unauthorized("Authentication required".into()).into())
        })
    }
}
