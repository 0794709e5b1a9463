//! Contacts: personal details attached to a user.

use chrono::{DateTime, NaiveDate, Utc};

use tokoku_core::{ContactId, Gender, RecordState, UserId};

use super::{Relation, UserSummary};

/// Relations a contact query can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactRelation {
    /// The owning user.
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: ContactId,
    pub user_id: UserId,
    pub name: String,
    pub phone: String,
    pub profile: Option<String>,
    pub gender: Gender,
    pub birthday: Option<NaiveDate>,
    pub record_state: RecordState,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: Relation<Option<UserSummary>>,
}

/// The identifying slice of a contact embedded in addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSummary {
    pub id: ContactId,
    pub name: String,
    pub user_id: UserId,
    pub user: Option<UserSummary>,
}

/// Validated contact fields for create and update.
#[derive(Debug, Clone)]
pub struct ContactInput {
    pub user_id: UserId,
    pub name: String,
    pub phone: String,
    pub profile: Option<String>,
    pub gender: Gender,
    pub birthday: Option<NaiveDate>,
}
