use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{new_id, NewUser, NewVideo, StoreError, User, UserChanges, UserStore, Video, VideoStore};

/// In-process store with the same semantics as [`super::PgStore`].
///
/// Used when no database is configured, and by the tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    videos: RwLock<HashMap<String, Video>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        if users.values().any(|user| user.email == new_user.email) {
            return Err(StoreError::UniqueViolation(format!("email {} already exists", new_user.email)));
        }

        let now = Utc::now();
        let user = User {
            id: new_id(),
            email: new_user.email,
            password: new_user.password,
            username: new_user.username,
            role: new_user.role,
            bio: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id.clone(), user.clone());

        Ok(user)
    }

    async fn update_user_by_email(&self, email: &str, changes: UserChanges) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let user = users.values_mut()
            .find(|user| user.email == email)
            .ok_or(StoreError::NotFound)?;

        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(bio) = changes.bio {
            user.bio = Some(bio);
        }
        if let Some(avatar_url) = changes.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn find_video_by_id(&self, id: &str) -> Result<Option<Video>, StoreError> {
        Ok(self.videos.read().await.get(id).cloned())
    }

    async fn create_video(&self, new_video: NewVideo) -> Result<Video, StoreError> {
        let video = Video {
            id: new_id(),
            title: new_video.title,
            description: new_video.description,
            url: new_video.url,
            secure_url: new_video.secure_url,
            allowed: new_video.allowed,
            creator_id: new_video.creator_id,
            created_at: Utc::now(),
        };
        self.videos.write().await.insert(video.id.clone(), video.clone());

        Ok(video)
    }
}
