use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};
use uuid::Uuid;

use crate::{
    auth::{AuthenticatedUser, IdentityProvider, SESSION_COOKIE},
    models::{SessionResponse, SignInRequest},
    state::AppState,
};

/// Start a guest session
///
/// Issues a signed identity token for a fresh `guest|<uuid>` subject, sets it
/// as the session cookie and returns it for bearer use.
///
/// # Returns
///
/// `{token, ownerId, ownerName, ownerAvatar?}` with the session cookie set
pub async fn create_session(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let Json(request) = payload.map_err(|rejection| (StatusCode::BAD_REQUEST, rejection.body_text()))?;
    let profile = request
        .into_profile()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let subject = format!("guest|{}", Uuid::new_v4());
    let token = state
        .identity
        .issue(&subject, &profile)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))?;

    let identity = state
        .identity
        .verify(Some(&token))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(24))
        .build();

    tracing::info!(
        "Session started for {} ({})",
        identity.id,
        identity.display_name
    );

    Ok((
        jar.add(cookie),
        Json(SessionResponse::from_identity(&identity, Some(token))),
    ))
}

/// Identity behind the current credential
pub async fn current_session(user: AuthenticatedUser) -> Json<SessionResponse> {
    Json(SessionResponse::from_identity(&user.identity, None))
}

/// Clear the session cookie
pub async fn end_session(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}
