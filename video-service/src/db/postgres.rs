use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use super::schema::{users, videos};
use super::{new_id, NewUser, NewVideo, StoreError, User, UserChanges, UserStore, Video, VideoStore};

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct UserRow {
    id: String,
    email: String,
    password: String,
    username: String,
    role: String,
    bio: Option<String>,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// role is stored as text, decoded here once so the rest of the service only sees Role
impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            role: row.role.parse()?,
            id: row.id,
            email: row.email,
            password: row.password,
            username: row.username,
            bio: row.bio,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = users)]
struct NewUserRow {
    id: String,
    email: String,
    password: String,
    username: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// None fields are skipped by diesel, so only the provided values end up in the UPDATE
#[derive(AsChangeset)]
#[diesel(table_name = users)]
struct UserChangeset {
    username: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = videos)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct VideoRow {
    id: String,
    title: String,
    description: Option<String>,
    url: String,
    secure_url: String,
    allowed: bool,
    creator_id: String,
    created_at: DateTime<Utc>,
}

impl From<VideoRow> for Video {
    fn from(row: VideoRow) -> Self {
        Video {
            id: row.id,
            title: row.title,
            description: row.description,
            url: row.url,
            secure_url: row.secure_url,
            allowed: row.allowed,
            creator_id: row.creator_id,
            created_at: row.created_at,
        }
    }
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => StoreError::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::UniqueViolation(info.message().to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// PostgreSQL backed store. Every operation opens its own connection on the blocking pool.
#[derive(Clone)]
pub struct PgStore {
    database_url: Arc<str>,
}

impl PgStore {
    pub fn new(database_url: &str) -> Self {
        PgStore {
            database_url: Arc::from(database_url),
        }
    }

    async fn run<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let database_url = Arc::clone(&self.database_url);

        tokio::task::spawn_blocking(move || {
            let mut conn = PgConnection::establish(&database_url)
                .map_err(|err| StoreError::Connection(err.to_string()))?;
            operation(&mut conn)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let id = id.to_string();
        self.run(move |conn| {
            users::table
                .find(id)
                .select(UserRow::as_select())
                .first::<UserRow>(conn)
                .optional()?
                .map(User::try_from)
                .transpose()
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = email.to_string();
        self.run(move |conn| {
            users::table
                .filter(users::email.eq(email))
                .select(UserRow::as_select())
                .first::<UserRow>(conn)
                .optional()?
                .map(User::try_from)
                .transpose()
        })
        .await
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let now = Utc::now();
        let row = NewUserRow {
            id: new_id(),
            email: new_user.email,
            password: new_user.password,
            username: new_user.username,
            role: new_user.role.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        self.run(move |conn| {
            diesel::insert_into(users::table)
                .values(&row)
                .returning(UserRow::as_returning())
                .get_result::<UserRow>(conn)
                .map_err(StoreError::from)
                .and_then(User::try_from)
        })
        .await
    }

    async fn update_user_by_email(&self, email: &str, changes: UserChanges) -> Result<User, StoreError> {
        let email = email.to_string();
        let changeset = UserChangeset {
            username: changes.username,
            bio: changes.bio,
            avatar_url: changes.avatar_url,
            updated_at: Utc::now(),
        };

        self.run(move |conn| {
            diesel::update(users::table.filter(users::email.eq(email)))
                .set(&changeset)
                .returning(UserRow::as_returning())
                .get_result::<UserRow>(conn)
                .map_err(StoreError::from)
                .and_then(User::try_from)
        })
        .await
    }
}

#[async_trait]
impl VideoStore for PgStore {
    async fn find_video_by_id(&self, id: &str) -> Result<Option<Video>, StoreError> {
        let id = id.to_string();
        self.run(move |conn| {
            Ok(videos::table
                .find(id)
                .select(VideoRow::as_select())
                .first::<VideoRow>(conn)
                .optional()?
                .map(Video::from))
        })
        .await
    }

    async fn create_video(&self, new_video: NewVideo) -> Result<Video, StoreError> {
        let row = VideoRow {
            id: new_id(),
            title: new_video.title,
            description: new_video.description,
            url: new_video.url,
            secure_url: new_video.secure_url,
            allowed: new_video.allowed,
            creator_id: new_video.creator_id,
            created_at: Utc::now(),
        };

        self.run(move |conn| {
            let created = diesel::insert_into(videos::table)
                .values(&row)
                .returning(VideoRow::as_returning())
                .get_result::<VideoRow>(conn)?;
            Ok(Video::from(created))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Role;

    fn row(role: &str) -> UserRow {
        let now = Utc::now();
        UserRow {
            id: "user-1".to_string(),
            email: "a@x.com".to_string(),
            password: "$scrypt$...".to_string(),
            username: "alice".to_string(),
            role: role.to_string(),
            bio: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn stored_role_text_becomes_enum() {
        let user = User::try_from(row("ADMIN")).unwrap();

        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn unknown_stored_role_is_a_store_error() {
        assert!(matches!(User::try_from(row("OWNER")), Err(StoreError::InvalidRole(_))));
    }

    #[test]
    fn unique_violation_is_recognised() {
        let err = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint \"users_email_key\"".to_string()),
        );

        assert!(matches!(StoreError::from(err), StoreError::UniqueViolation(msg) if msg.contains("users_email_key")));
    }

    #[test]
    fn missing_row_maps_to_not_found() {
        assert!(matches!(StoreError::from(DieselError::NotFound), StoreError::NotFound));
    }
}
