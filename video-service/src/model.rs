use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{self, Role};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUserResponse {
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

impl LoginResponse {
    pub fn bearer(access_token: String) -> Self {
        LoginResponse {
            access_token,
            token_type: "bearer".to_string(),
        }
    }

    /// What clients receive on the wire when the credentials do not match.
    /// An empty `access_token` is the failure marker.
    pub fn rejected() -> Self {
        LoginResponse {
            access_token: String::new(),
            token_type: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<db::User> for UserProfileResponse {
    fn from(user: db::User) -> Self {
        UserProfileResponse {
            id: user.id,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUserProfileRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUserProfileResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<db::User> for UpdateUserProfileResponse {
    fn from(user: db::User) -> Self {
        UpdateUserProfileResponse {
            id: user.id,
            email: user.email,
            username: user.username,
            bio: user.bio,
            avatar_url: user.avatar_url,
        }
    }
}

/// A file received from a multipart upload. The bytes are consumed while reading the
/// request, only what is needed to describe the file is kept.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct UploadVideoRequest {
    pub title: String,
    pub description: Option<String>,
    pub file: UploadedFile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadVideoResponse {
    pub video_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamVideoResponse {
    pub video_id: String,
    pub signed_url: String,
    pub expires_in: u64,
}
