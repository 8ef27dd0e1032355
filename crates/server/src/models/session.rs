//! Session-related types.
//!
//! Types stored in the session for authentication state.
//!
//! The session record is a pointer to the user, not a cache of them: every
//! privileged read re-derives the user row from the database, so a profile
//! edit or an admin-flag change takes effect on the next request.

use serde::{Deserialize, Serialize};

use farmstand_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Admin flag at login time; re-checked against the database by the
    /// admin extractor before it grants anything.
    pub is_admin: bool,
}

/// Session keys for authentication data.
pub mod session_keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
