use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Query},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::convert::Infallible;

use crate::{
    auth::provider::IdentityProvider,
    core::{ClaimError, Identity},
    state::AppState,
};

/// Cookie holding the signed identity token
pub const SESSION_COOKIE: &str = "grid_session";

/// Raw, unverified credential attached to a request
///
/// Looked up in order: `Authorization: Bearer`, the session cookie, then a
/// `token` query parameter (browsers cannot set headers on WebSocket upgrades).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential(pub Option<String>);

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl Credential {
    pub fn from_parts(parts: &Parts) -> Self {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        let token = bearer
            .or_else(|| {
                CookieJar::from_headers(&parts.headers)
                    .get(SESSION_COOKIE)
                    .map(|cookie| cookie.value().to_string())
            })
            .or_else(|| {
                Query::<TokenQuery>::try_from_uri(&parts.uri)
                    .ok()
                    .and_then(|Query(query)| query.token)
            })
            .filter(|token| !token.is_empty());

        Self(token)
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Credential
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Credential::from_parts(parts))
    }
}

/// Verified caller identity extracted from the request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub identity: Identity,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ClaimError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let credential = Credential::from_parts(parts);

        let identity = app_state.identity.verify(credential.as_deref())?;
        Ok(AuthenticatedUser { identity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    #[test]
    fn test_bearer_header() {
        let parts = parts(
            Request::builder()
                .header(header::AUTHORIZATION, "Bearer abc.def")
                .body(())
                .unwrap(),
        );
        assert_eq!(Credential::from_parts(&parts).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_session_cookie() {
        let parts = parts(
            Request::builder()
                .header(header::COOKIE, "other=1; grid_session=tok.sig")
                .body(())
                .unwrap(),
        );
        assert_eq!(Credential::from_parts(&parts).as_deref(), Some("tok.sig"));
    }

    #[test]
    fn test_query_token() {
        let parts = parts(
            Request::builder()
                .uri("/ws?token=q.sig")
                .body(())
                .unwrap(),
        );
        assert_eq!(Credential::from_parts(&parts).as_deref(), Some("q.sig"));
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let parts = parts(
            Request::builder()
                .header(header::AUTHORIZATION, "Bearer from-header")
                .header(header::COOKIE, "grid_session=from-cookie")
                .body(())
                .unwrap(),
        );
        assert_eq!(
            Credential::from_parts(&parts).as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn test_no_credential() {
        let parts = parts(
            Request::builder()
                .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                .body(())
                .unwrap(),
        );
        assert_eq!(Credential::from_parts(&parts), Credential(None));
    }
}
