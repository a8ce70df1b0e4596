use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String, // argon2 PHC string
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}

/// Public projection of a user. Has no password field at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<UserRow> for UserResponse {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            username: r.username,
            email: r.email,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Insert payload handed to the repository. `password` must already be hashed
/// by the time it gets there.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Partial update. `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username must not be blank")]
    EmptyUsername,
    #[error("email must not be blank")]
    EmptyEmail,
    #[error("email is not a valid email address")]
    InvalidEmail,
    #[error("password is required")]
    EmptyPassword,
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::EmptyEmail);
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }
        if self.password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        Ok(())
    }
}

impl UserPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(ValidationError::EmptyUsername);
        }
        match self.email.as_deref() {
            Some(email) if !is_valid_email(email) => Err(ValidationError::InvalidEmail),
            _ => Ok(()),
        }
    }
}
