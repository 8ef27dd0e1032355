//! User model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use farmstand_core::{Email, UserId};

/// A registered user.
///
/// The password hash never leaves the repository layer; this struct is the
/// shape handlers and extractors work with.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub is_admin: bool,
    /// Profile address, kept as empty strings when unset so account forms
    /// round-trip without null handling.
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub created_at: DateTime<Utc>,
}
