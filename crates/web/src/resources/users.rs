//! User serialization.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tokoku_core::{RecordState, UserId, UserRole, UserStatus};

use super::storage_url;
use crate::models::{User, UserSummary};

#[derive(Debug, Clone, Serialize)]
pub struct UserResource {
    pub id: UserId,
    pub google_id: Option<String>,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub record_state: RecordState,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResource {
    /// Two-letter initials shown when there is no avatar.
    #[must_use]
    pub fn initials(&self) -> String {
        self.username
            .split(|c: char| c == '_' || c == '.' || c.is_whitespace())
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.record_state.is_deleted()
    }
}

impl From<&User> for UserResource {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            google_id: user.google_id.clone(),
            username: user.username.clone(),
            email: user.email.as_str().to_string(),
            avatar: user.avatar.clone(),
            avatar_url: user.avatar.as_deref().map(storage_url),
            role: user.role,
            status: user.status,
            record_state: user.record_state,
            email_verified_at: user.email_verified_at,
            deleted_at: user.deleted_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// The user embedded in contacts and addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummaryResource {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<&UserSummary> for UserSummaryResource {
    fn from(user: &UserSummary) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokoku_core::Email;

    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(7),
            google_id: None,
            username: "budi_santoso".to_string(),
            email: Email::parse("budi@tokoku.id").unwrap(),
            avatar: Some("img/avatars/b.png".to_string()),
            role: UserRole::Courier,
            status: UserStatus::Active,
            record_state: RecordState::Active,
            email_verified_at: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_serializes_wire_names_without_secrets() {
        let json = serde_json::to_value(UserResource::from(&user())).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["email"], "budi@tokoku.id");
        assert_eq!(json["role"], "COURIER");
        assert_eq!(json["status"], "active");
        assert_eq!(json["record_state"], "active");
        assert_eq!(json["avatar_url"], "/storage/img/avatars/b.png");
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_initials() {
        assert_eq!(UserResource::from(&user()).initials(), "BS");
    }
}
