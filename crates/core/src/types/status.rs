//! Enumerated entity attributes.
//!
//! Each enum maps to a PostgreSQL enum type (with the `postgres` feature) and
//! round-trips through the same string used on the wire, in forms and in
//! query-string filters.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct UnknownVariant {
    /// Name of the enumeration being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Full access to the admin panel.
    Admin,
    /// Delivery staff.
    Courier,
    /// Storefront customer.
    #[default]
    Client,
}

impl UserRole {
    /// Every role, in display order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Courier, Self::Client];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Courier => "COURIER",
            Self::Client => "CLIENT",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Courier => "Courier",
            Self::Client => "Client",
        }
    }
}

/// Whether a user account may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    pub const ALL: [Self; 2] = [Self::Active, Self::Inactive];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

/// Gender recorded on a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "gender", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Man,
    Woman,
}

impl Gender {
    pub const ALL: [Self; 2] = [Self::Man, Self::Woman];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Man => "MAN",
            Self::Woman => "WOMAN",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Man => "Man",
            Self::Woman => "Woman",
        }
    }
}

/// Soft-delete state of a record.
///
/// Deleted records are hidden from default listings and come back through an
/// explicit restore transition. The database keeps `deleted_at` set exactly
/// when the state is [`RecordState::Deleted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "record_state", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    #[default]
    Active,
    Deleted,
}

impl RecordState {
    pub const ALL: [Self; 2] = [Self::Active, Self::Deleted];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deleted => "deleted",
        }
    }

    #[must_use]
    pub const fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

macro_rules! impl_str_conversions {
    ($ty:ident, $kind:literal) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: s.to_owned(),
                    })
            }
        }
    };
}

impl_str_conversions!(UserRole, "role");
impl_str_conversions!(UserStatus, "status");
impl_str_conversions!(Gender, "gender");
impl_str_conversions!(RecordState, "record state");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_wire_names() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert_eq!(
            serde_json::to_string(&UserRole::Courier).unwrap(),
            "\"COURIER\""
        );
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        let err = "admin".parse::<UserRole>().unwrap_err();
        assert_eq!(err.kind, "role");
        assert_eq!(err.to_string(), "invalid role: admin");
    }

    #[test]
    fn test_status_and_gender() {
        assert_eq!("inactive".parse::<UserStatus>().unwrap(), UserStatus::Inactive);
        assert_eq!("WOMAN".parse::<Gender>().unwrap(), Gender::Woman);
        assert!("other".parse::<Gender>().is_err());
    }

    #[test]
    fn test_record_state() {
        assert!("deleted".parse::<RecordState>().unwrap().is_deleted());
        assert!(!RecordState::default().is_deleted());
        assert_eq!(
            serde_json::to_string(&RecordState::Deleted).unwrap(),
            "\"deleted\""
        );
    }
}
