use axum_extra::extract::CookieJar;

use axum::{
    extract::{
        Request,
        State,
    },
    http::{
        header::AUTHORIZATION,
        HeaderMap,
        StatusCode,
    },
    middleware::Next,
    response::Response
};

use credentials::TokenIssuer;

pub type UserId = String;

/// Supplies the identity of the user a request is made on behalf of.
pub trait IdentityResolver {
    fn resolve_current_user(&self) -> UserId;
}

/// The authenticated user, inserted into request extensions by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub user_id: UserId,
    pub email: String,
}

impl IdentityResolver for UserInfo {
    fn resolve_current_user(&self) -> UserId {
        self.user_id.clone()
    }
}

// tower middleware that fetches the auth token from the Authorization header or the session cookie,
// verifies it and hands the resolved user to the handler as an extension

pub async fn auth_middleware(State(tokens): State<TokenIssuer>, mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let Some(token) = extract_token(req.headers()) else {
        tracing::debug!("No bearer token or session cookie found");
        return Err(StatusCode::UNAUTHORIZED);
    };

    match tokens.verify(&token) {
        Ok(claims) => {
            req.extensions_mut().insert(UserInfo {
                user_id: claims.user_id,
                email: claims.subject,
            });
            Ok(next.run(req).await)
        }
        Err(err) => {
            tracing::debug!("Token verification failed: {}", err);
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers.get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    if bearer.is_some() {
        return bearer;
    }

    CookieJar::from_headers(headers)
        .get("session")
        .map(|cookie| cookie.value().to_string())
}
