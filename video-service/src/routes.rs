use axum::{
    extract::{
        DefaultBodyLimit,
        Extension,
        Json,
        Multipart,
        Path,
        State,
    },
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use tower::ServiceBuilder;

use auth_check::{auth_middleware, UserInfo};

use crate::error::ServiceError;
use crate::model::*;
use crate::services::{users, videos};
use crate::AppState;

const UPLOAD_BODY_LIMIT: usize = 4096 * 1024 * 1024; // 4gb

pub fn router(state: AppState) -> Router {
    let require_auth = from_fn_with_state(state.tokens.clone(), auth_middleware);

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
        // route_layer only wraps the methods registered before it, so PATCH stays public
        .route("/api/users/profile", get(get_profile).route_layer(require_auth.clone()).patch(update_profile))
        .route(
            "/api/videos",
            post(upload_video).route_layer(
                ServiceBuilder::new()
                    .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
                    .layer(require_auth)
            ),
        )
        .route("/api/videos/{video_id}/stream", get(stream_video))
        .with_state(state)
}

async fn register(State(state): State<AppState>, Json(request): Json<RegisterUserRequest>) -> Result<Json<RegisterUserResponse>, ServiceError> {
    users::register_user(state.users.as_ref(), state.hash_params, request).await.map(Json)
}

/// Logs a user in.
///
/// Wrong credentials are answered with `200 OK` and an empty token, which is what
/// existing clients check for.
async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>, ServiceError> {
    match users::login_user(state.users.as_ref(), &state.tokens, request).await {
        Ok(response) => Ok(Json(response)),
        Err(ServiceError::InvalidCredentials) => Ok(Json(LoginResponse::rejected())),
        Err(err) => Err(err),
    }
}

async fn get_profile(State(state): State<AppState>, Extension(user_info): Extension<UserInfo>) -> Result<Json<UserProfileResponse>, ServiceError> {
    users::get_user_profile(state.users.as_ref(), &user_info).await.map(Json)
}

async fn update_profile(State(state): State<AppState>, Json(request): Json<UpdateUserProfileRequest>) -> Result<Json<UpdateUserProfileResponse>, ServiceError> {
    users::update_user_profile(state.users.as_ref(), request).await.map(Json)
}

/// Accepts a multipart form with `title`, optional `description` and `file` fields.
///
/// The file body is read chunk by chunk and only its size is kept.
async fn upload_video(
    State(state): State<AppState>,
    Extension(user_info): Extension<UserInfo>,
    mut multipart: Multipart,
) -> Result<Json<UploadVideoResponse>, ServiceError> {
    let mut title = None;
    let mut description = None;
    let mut file = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(field.text().await.map_err(multipart_error)?),
            "description" => description = Some(field.text().await.map_err(multipart_error)?),
            "file" => {
                let mut uploaded = UploadedFile {
                    file_name: field.file_name().map(str::to_string),
                    content_type: field.content_type().map(str::to_string),
                    size: 0,
                };
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    uploaded.size += chunk.len();
                }
                file = Some(uploaded);
            }
            other => tracing::debug!("Ignoring unexpected multipart field: {}", other),
        }
    }

    let Some(file) = file else {
        return Err(ServiceError::Validation("A video file is required.".to_string()));
    };

    let request = UploadVideoRequest {
        title: title.unwrap_or_default(),
        description: description.filter(|text| !text.is_empty()),
        file,
    };

    videos::upload_video(state.videos.as_ref(), &user_info, &state.cdn_base_url, request).await.map(Json)
}

async fn stream_video(State(state): State<AppState>, Path(video_id): Path<String>) -> Result<Json<StreamVideoResponse>, ServiceError> {
    videos::stream_video(state.videos.as_ref(), &video_id).await.map(Json)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ServiceError {
    ServiceError::Validation(err.body_text())
}
