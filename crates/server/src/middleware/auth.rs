//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a logged-in user (or admin) in route
//! handlers. The session stores only a [`CurrentUser`] pointer; both
//! `RequireUser` and `RequireAdmin` re-read the user row from the database,
//! so privilege and profile changes take effect on the next request rather
//! than living in a stale session copy.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::{CurrentUser, User, session_keys};
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// Rejects with 401 when no session user is present or the user row is gone.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(user): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireUser(pub User);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let current = session_user(parts)
            .await
            .ok_or_else(|| AppError::Unauthorized("not logged in".to_owned()))?;

        let app = AppState::from_ref(state);
        let user = UserRepository::new(app.pool())
            .get_by_id(current.id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("not logged in".to_owned()))?;

        Ok(Self(user))
    }
}

/// Extractor that requires an authenticated admin.
///
/// Rejects with 401 when no session is present and 403 when the user's
/// database row does not carry the admin flag.
pub struct RequireAdmin(pub User);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;

        if !user.is_admin {
            return Err(AppError::Forbidden("access denied".to_owned()));
        }

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current session user.
///
/// Unlike `RequireUser`, this does not reject the request and does not hit
/// the database; it is for flows that only need the session email (e.g.
/// resolving the checkout recipient).
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Read the current user record out of the request's session, if any.
async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
