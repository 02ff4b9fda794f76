use auth_check::IdentityResolver;

use crate::db::{NewVideo, VideoStore};
use crate::error::ServiceError;
use crate::model::{StreamVideoResponse, UploadVideoRequest, UploadVideoResponse};

const SIGNED_URL_TOKEN: &str = "signed-token-example";
const STREAM_EXPIRES_IN_SECONDS: u64 = 3600;

/// Storage path of an uploaded file, derived from its declared name only.
pub fn storage_path(file_name: &str) -> String {
    format!("videos/{}", file_name)
}

pub fn secure_url(cdn_base_url: &str, file_name: &str) -> String {
    format!("{}/{}", cdn_base_url, file_name)
}

/// Records a newly uploaded video, owned by the current user.
///
/// Uploaded videos are streamable straight away. Storage failures are returned as is,
/// nothing else has been mutated at that point.
pub async fn upload_video(
    videos: &dyn VideoStore,
    identity: &impl IdentityResolver,
    cdn_base_url: &str,
    request: UploadVideoRequest,
) -> Result<UploadVideoResponse, ServiceError> {
    if request.title.trim().is_empty() {
        return Err(ServiceError::Validation("Title is required.".to_string()));
    }

    let Some(file_name) = request.file.file_name.filter(|name| !name.is_empty()) else {
        return Err(ServiceError::Validation("Uploaded file must have a file name.".to_string()));
    };

    let video = videos.create_video(NewVideo {
        title: request.title,
        description: request.description,
        url: storage_path(&file_name),
        secure_url: secure_url(cdn_base_url, &file_name),
        allowed: true,
        creator_id: identity.resolve_current_user(),
    })
    .await?;

    tracing::info!(
        "Video {} uploaded: file_name={}, content_type={:?}, size={}",
        video.id, file_name, request.file.content_type, request.file.size
    );

    Ok(UploadVideoResponse {
        video_id: video.id,
        message: "Video successfully uploaded.".to_string(),
    })
}

/// Returns a signed URL for a video.
///
/// A video that does not exist and one that is not allowed to be streamed look the same to the caller.
pub async fn stream_video(videos: &dyn VideoStore, video_id: &str) -> Result<StreamVideoResponse, ServiceError> {
    let video = match videos.find_video_by_id(video_id).await? {
        Some(video) if video.allowed => video,
        _ => return Err(ServiceError::NotFound("Video not found or not available for streaming.")),
    };

    // TODO: sign with the CDN key and an expiry once the CDN integration exists
    let signed_url = format!("{}?token={}", video.secure_url, SIGNED_URL_TOKEN);

    Ok(StreamVideoResponse {
        video_id: video.id,
        signed_url,
        expires_in: STREAM_EXPIRES_IN_SECONDS,
    })
}

#[cfg(test)]
mod tests {
    use auth_check::UserInfo;

    use super::*;
    use crate::db::MemoryStore;
    use crate::model::UploadedFile;

    fn creator() -> UserInfo {
        UserInfo {
            user_id: "creator-1".to_string(),
            email: "a@x.com".to_string(),
        }
    }

    fn upload(title: &str, file_name: Option<&str>) -> UploadVideoRequest {
        UploadVideoRequest {
            title: title.to_string(),
            description: Some("a cat".to_string()),
            file: UploadedFile {
                file_name: file_name.map(str::to_string),
                content_type: Some("video/mp4".to_string()),
                size: 1024,
            },
        }
    }

    async fn insert(store: &MemoryStore, allowed: bool) -> String {
        store.create_video(NewVideo {
            title: "x".to_string(),
            description: None,
            url: "videos/x.mp4".to_string(),
            secure_url: "https://cdn/x".to_string(),
            allowed,
            creator_id: "creator-1".to_string(),
        }).await.unwrap().id
    }

    #[tokio::test]
    async fn upload_persists_allowed_video_under_derived_paths() {
        let store = MemoryStore::new();

        let response = upload_video(&store, &creator(), "https://videos.example.com", upload("Cats", Some("cat.mp4"))).await.unwrap();

        assert_eq!(response.message, "Video successfully uploaded.");
        let stored = store.find_video_by_id(&response.video_id).await.unwrap().unwrap();
        assert_eq!(stored.id, response.video_id);
        assert!(stored.allowed);
        assert_eq!(stored.url, "videos/cat.mp4");
        assert_eq!(stored.secure_url, "https://videos.example.com/cat.mp4");
        assert_eq!(stored.creator_id, "creator-1");
        assert_eq!(stored.description.as_deref(), Some("a cat"));
    }

    #[tokio::test]
    async fn upload_without_title_fails_validation() {
        let store = MemoryStore::new();

        let result = upload_video(&store, &creator(), "https://videos.example.com", upload("  ", Some("cat.mp4"))).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn upload_without_file_name_fails_validation() {
        let store = MemoryStore::new();

        let result = upload_video(&store, &creator(), "https://videos.example.com", upload("Cats", None)).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn allowed_video_gets_signed_url() {
        let store = MemoryStore::new();
        let id = insert(&store, true).await;

        let response = stream_video(&store, &id).await.unwrap();

        assert_eq!(response, StreamVideoResponse {
            video_id: id,
            signed_url: "https://cdn/x?token=signed-token-example".to_string(),
            expires_in: 3600,
        });
    }

    #[tokio::test]
    async fn disallowed_and_missing_videos_fail_the_same_way() {
        let store = MemoryStore::new();
        let disallowed = insert(&store, false).await;

        let disallowed = stream_video(&store, &disallowed).await.unwrap_err();
        let missing = stream_video(&store, "missing-id").await.unwrap_err();

        assert!(matches!(disallowed, ServiceError::NotFound("Video not found or not available for streaming.")));
        assert_eq!(disallowed.to_string(), missing.to_string());
    }

    #[test]
    fn paths_come_from_the_file_name() {
        assert_eq!(storage_path("a b.mp4"), "videos/a b.mp4");
        assert_eq!(secure_url("https://cdn", "a.mp4"), "https://cdn/a.mp4");
    }
}
