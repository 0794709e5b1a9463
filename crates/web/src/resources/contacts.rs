//! Contact serialization.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use tokoku_core::{ContactId, Gender, RecordState, UserId};

use super::UserSummaryResource;
use crate::models::{Contact, ContactSummary, Relation};

#[derive(Debug, Clone, Serialize)]
pub struct ContactResource {
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
    #[serde(skip_serializing_if = "Relation::is_not_loaded")]
    pub user: Relation<Option<UserSummaryResource>>,
}

impl ContactResource {
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.record_state.is_deleted()
    }

    /// The loaded owner, if any.
    #[must_use]
    pub fn owner(&self) -> Option<&UserSummaryResource> {
        self.user.as_loaded().and_then(Option::as_ref)
    }
}

impl From<&Contact> for ContactResource {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id,
            user_id: contact.user_id,
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            profile: contact.profile.clone(),
            gender: contact.gender,
            birthday: contact.birthday,
            record_state: contact.record_state,
            deleted_at: contact.deleted_at,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
            user: contact
                .user
                .clone()
                .map(|user| user.as_ref().map(UserSummaryResource::from)),
        }
    }
}

/// The contact embedded in addresses, with its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactSummaryResource {
    pub id: ContactId,
    pub name: String,
    pub user_id: UserId,
    pub user: Option<UserSummaryResource>,
}

impl From<&ContactSummary> for ContactSummaryResource {
    fn from(contact: &ContactSummary) -> Self {
        Self {
            id: contact.id,
            name: contact.name.clone(),
            user_id: contact.user_id,
            user: contact.user.as_ref().map(UserSummaryResource::from),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::UserSummary;

    fn contact(user: Relation<Option<UserSummary>>) -> Contact {
        let now = Utc::now();
        Contact {
            id: ContactId::new(3),
            user_id: UserId::new(9),
            name: "Siti Aminah".to_string(),
            phone: "081234567890".to_string(),
            profile: None,
            gender: Gender::Woman,
            birthday: NaiveDate::from_ymd_opt(1995, 8, 17),
            record_state: RecordState::Active,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            user,
        }
    }

    #[test]
    fn test_user_omitted_unless_loaded() {
        let json = serde_json::to_value(ContactResource::from(&contact(Relation::NotLoaded))).unwrap();
        assert!(json.get("user").is_none());
        assert_eq!(json["gender"], "WOMAN");
        assert_eq!(json["birthday"], "1995-08-17");
    }

    #[test]
    fn test_loaded_user_is_embedded() {
        let owner = UserSummary {
            id: UserId::new(9),
            username: "siti".to_string(),
            email: "siti@tokoku.id".to_string(),
        };
        let resource = ContactResource::from(&contact(Relation::Loaded(Some(owner))));
        assert_eq!(resource.owner().map(|u| u.username.as_str()), Some("siti"));

        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["user"]["email"], "siti@tokoku.id");
    }

    #[test]
    fn test_loaded_missing_user_is_null() {
        let json = serde_json::to_value(ContactResource::from(&contact(Relation::Loaded(None)))).unwrap();
        assert!(json["user"].is_null());
    }
}
