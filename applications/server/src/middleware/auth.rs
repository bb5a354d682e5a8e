/// Identity middleware
use crate::{error::ServerError, services::Claims, state::AppState};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tattmap_core::UserId;

/// Verified token claims stored in request extensions.
/// Can be used as an extractor in handlers that require a caller.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl AuthenticatedUser {
    pub fn user_id(&self) -> UserId {
        self.0.user_id()
    }

    pub fn claims(&self) -> &Claims {
        &self.0
    }
}

/// Resolve the caller from the access-token cookie, falling back to a
/// bearer token. Requests without a valid token continue anonymously.
pub async fn identity_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = jar
        .get(&state.config.auth.cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| bearer.map(|TypedHeader(auth)| auth.token().to_string()));

    if let Some(token) = token {
        match state.auth_service.verify_token(&token) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthenticatedUser(claims));
            }
            Err(e) => {
                tracing::debug!("Token verification failed: {}", e);
            }
        }
    }

    next.run(request).await
}

/// Implement FromRequestParts so AuthenticatedUser can be used as an extractor
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ServerError::Auth("Not authenticated".to_string()))
    }
}
