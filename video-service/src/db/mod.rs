mod memory;
mod postgres;
mod schema;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Unknown role stored for user: {0}")]
    InvalidRole(String),

    #[error("Error connecting to database: {0}")]
    Connection(String),

    #[error("Database query failed: {0}")]
    Query(String),

    #[error("Database task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Creator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Creator => "CREATOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "USER" => Ok(Role::User),
            "CREATOR" => Ok(Role::Creator),
            "ADMIN" => Ok(Role::Admin),
            other => Err(StoreError::InvalidRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password: String,
    pub username: String,
    pub role: Role,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    /// Already hashed.
    pub password: String,
    pub username: String,
    pub role: Role,
}

/// Partial update of a user. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub secure_url: String,
    pub allowed: bool,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub secure_url: String,
    pub allowed: bool,
    pub creator_id: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Applies `changes` to the user with the given email and returns the updated record.
    /// `updated_at` is always bumped.
    async fn update_user_by_email(&self, email: &str, changes: UserChanges) -> Result<User, StoreError>;
}

#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn find_video_by_id(&self, id: &str) -> Result<Option<Video>, StoreError>;

    async fn create_video(&self, new_video: NewVideo) -> Result<Video, StoreError>;
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_stored_form() {
        for role in [Role::User, Role::Creator, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(matches!("superuser".parse::<Role>(), Err(StoreError::InvalidRole(role)) if role == "superuser"));
    }

    #[test]
    fn role_serializes_as_plain_string() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
    }
}
