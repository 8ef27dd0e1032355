//! Authentication route handlers.
//!
//! Login, registration, logout, current-user fetch, and account updates.
//! The session stores a minimal [`CurrentUser`] record; `/me` and the
//! privileged extractors re-read the user row from the database so the
//! session never serves stale profile or privilege data.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::middleware::auth::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::AuthService;
use crate::state::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Account update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
}

/// The user profile shape returned to the frontend.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id.as_i32(),
            name: user.name,
            email: user.email.into_inner(),
            is_admin: user.is_admin,
            street: user.street,
            city: user.city,
            state: user.state,
            zip: user.zip,
        }
    }
}

/// Response carrying a message and the fresh profile.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: &'static str,
    pub user: UserProfile,
}

/// Bare message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle a login request.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&req.email, &req.password).await?;

    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        is_admin: user.is_admin,
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("failed to persist session: {e}")))?;

    Ok(Json(SessionResponse {
        message: "Login successful",
        user: user.into(),
    }))
}

/// Handle a registration request.
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_owned()));
    }

    let auth = AuthService::new(state.pool());
    auth.register(&req.email, &req.password, req.name.trim())
        .await?;

    Ok(Json(MessageResponse {
        message: "Registration successful",
    }))
}

/// Destroy the session.
///
/// POST /api/auth/logout
pub async fn logout(session: Session) -> Result<Json<MessageResponse>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to clear session: {e}")))?;
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("failed to destroy session: {e}")))?;

    Ok(Json(MessageResponse {
        message: "Logged out",
    }))
}

/// Return the current user, freshly read from the database.
///
/// GET /api/auth/me
pub async fn me(RequireUser(user): RequireUser) -> Json<UserProfile> {
    Json(user.into())
}

/// Update the current user's display name and profile address.
///
/// The database row is updated first, then the session record is rewritten
/// from the fresh row so the change is visible immediately.
///
/// POST /api/auth/account/update
pub async fn update_account(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<SessionResponse>> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_owned()));
    }

    let auth = AuthService::new(state.pool());
    let updated = auth
        .update_account(
            user.id,
            req.name.trim(),
            req.street.trim(),
            req.city.trim(),
            req.state.trim(),
            req.zip.trim(),
        )
        .await?;

    let current = CurrentUser {
        id: updated.id,
        email: updated.email.clone(),
        is_admin: updated.is_admin,
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("failed to refresh session: {e}")))?;

    Ok(Json(SessionResponse {
        message: "Account updated successfully",
        user: updated.into(),
    }))
}
