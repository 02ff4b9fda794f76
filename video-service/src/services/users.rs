use auth_check::IdentityResolver;
use credentials::{HashParams, TokenIssuer};

use crate::db::{NewUser, Role, StoreError, UserChanges, UserStore};
use crate::error::ServiceError;
use crate::model::{
    LoginRequest, LoginResponse, RegisterUserRequest, RegisterUserResponse, UpdateUserProfileRequest,
    UpdateUserProfileResponse, UserProfileResponse,
};

/// Registers a new user with the default role.
///
/// The password is hashed before it leaves this function, the plain text is never stored.
pub async fn register_user(
    users: &dyn UserStore,
    hash_params: HashParams,
    request: RegisterUserRequest,
) -> Result<RegisterUserResponse, ServiceError> {
    let RegisterUserRequest { email, password, username } = request;

    // scrypt is deliberately expensive, keep it off the async workers
    let password_hash = tokio::task::spawn_blocking(move || credentials::hash_password(&password, hash_params))
        .await
        .map_err(|err| ServiceError::Internal(err.to_string()))??;

    let user = users.create_user(NewUser {
        email,
        password: password_hash,
        username,
        role: Role::User,
    })
    .await
    .map_err(|err| match err {
        StoreError::UniqueViolation(_) => ServiceError::Conflict("A user with this email already exists.".to_string()),
        other => ServiceError::Store(other),
    })?;

    tracing::info!("Registered user {}", user.id);

    Ok(RegisterUserResponse {
        user_id: user.id,
        message: "User registered successfully.".to_string(),
    })
}

/// Authenticates a user and issues an access token.
///
/// # Returns
/// * `Ok(LoginResponse)` with a bearer token if the credentials match.
/// * `Err(ServiceError::InvalidCredentials)` for an unknown email or a wrong password.
pub async fn login_user(
    users: &dyn UserStore,
    tokens: &TokenIssuer,
    request: LoginRequest,
) -> Result<LoginResponse, ServiceError> {
    let Some(user) = users.find_user_by_email(&request.email).await? else {
        tracing::debug!("User not found: {}", request.email);
        return Err(ServiceError::InvalidCredentials);
    };

    let stored_hash = user.password.clone();
    let password = request.password;
    let verified = tokio::task::spawn_blocking(move || credentials::verify_password(&password, &stored_hash))
        .await
        .map_err(|err| ServiceError::Internal(err.to_string()))?;

    match verified {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!("Invalid password for user: {}", user.id);
            return Err(ServiceError::InvalidCredentials);
        }
        Err(err) => {
            tracing::warn!("Stored password hash for user {} is unusable: {}", user.id, err);
            return Err(ServiceError::InvalidCredentials);
        }
    }

    let access_token = tokens.issue(&user.email, &user.id)?;
    tracing::debug!("User {} logged in successfully", user.id);

    Ok(LoginResponse::bearer(access_token))
}

/// Retrieves the profile of the user the request is made on behalf of.
pub async fn get_user_profile(
    users: &dyn UserStore,
    identity: &impl IdentityResolver,
) -> Result<UserProfileResponse, ServiceError> {
    let user_id = identity.resolve_current_user();

    users.find_user_by_id(&user_id).await?
        .map(UserProfileResponse::from)
        .ok_or(ServiceError::NotFound("User not found."))
}

/// Updates the profile of the user identified by `email`.
///
/// Only the fields present in the request are changed. The email is the lookup key
/// and is never itself modified.
pub async fn update_user_profile(
    users: &dyn UserStore,
    request: UpdateUserProfileRequest,
) -> Result<UpdateUserProfileResponse, ServiceError> {
    let Some(email) = request.email else {
        return Err(ServiceError::Validation("Email is required for identifying the user to update.".to_string()));
    };

    if users.find_user_by_email(&email).await?.is_none() {
        return Err(ServiceError::Validation("User not found with the provided email.".to_string()));
    }

    let changes = UserChanges {
        username: request.username,
        bio: request.bio,
        avatar_url: request.avatar_url,
    };

    let updated = users.update_user_by_email(&email, changes).await?;
    Ok(UpdateUserProfileResponse::from(updated))
}
