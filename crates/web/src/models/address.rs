//! Postal addresses attached to a contact.

use chrono::{DateTime, Utc};

use tokoku_core::{AddressId, ContactId, RecordState};

use super::{ContactSummary, Relation};

/// Relations an address query can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRelation {
    /// The owning contact, together with its user.
    Contact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub id: AddressId,
    pub contact_id: ContactId,
    pub post_code: String,
    pub country: String,
    pub province: String,
    pub city: String,
    pub street: String,
    pub more: Option<String>,
    pub record_state: RecordState,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub contact: Relation<Option<ContactSummary>>,
}

/// Validated address fields for create and update.
#[derive(Debug, Clone)]
pub struct AddressInput {
    pub contact_id: ContactId,
    pub post_code: String,
    pub country: String,
    pub province: String,
    pub city: String,
    pub street: String,
    pub more: Option<String>,
}
