//! User accounts.

use chrono::{DateTime, Utc};

use tokoku_core::{Email, RecordState, UserId, UserRole, UserStatus};

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub google_id: Option<String>,
    pub username: String,
    pub email: Email,
    /// Relative path under the upload directory.
    pub avatar: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub record_state: RecordState,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account may sign in.
    #[must_use]
    pub fn can_sign_in(&self) -> bool {
        self.status == UserStatus::Active && !self.record_state.is_deleted()
    }
}

/// The identifying slice of a user embedded in related resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

/// Validated data for a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub google_id: Option<String>,
    pub username: String,
    pub email: Email,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
}

/// Validated changes to an existing user.
///
/// `password_hash` and `avatar` keep their stored values when `None`.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub google_id: Option<String>,
    pub username: String,
    pub email: Email,
    pub password_hash: Option<String>,
    pub avatar: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
}
