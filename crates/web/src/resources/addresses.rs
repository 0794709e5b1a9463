//! Address serialization.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tokoku_core::{AddressId, ContactId, RecordState};

use super::ContactSummaryResource;
use crate::models::{Address, Relation};

#[derive(Debug, Clone, Serialize)]
pub struct AddressResource {
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
    #[serde(skip_serializing_if = "Relation::is_not_loaded")]
    pub contact: Relation<Option<ContactSummaryResource>>,
}

impl AddressResource {
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.record_state.is_deleted()
    }

    /// The loaded contact, if any.
    #[must_use]
    pub fn owner(&self) -> Option<&ContactSummaryResource> {
        self.contact.as_loaded().and_then(Option::as_ref)
    }
}

impl From<&Address> for AddressResource {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id,
            contact_id: address.contact_id,
            post_code: address.post_code.clone(),
            country: address.country.clone(),
            province: address.province.clone(),
            city: address.city.clone(),
            street: address.street.clone(),
            more: address.more.clone(),
            record_state: address.record_state,
            deleted_at: address.deleted_at,
            created_at: address.created_at,
            updated_at: address.updated_at,
            contact: address
                .contact
                .clone()
                .map(|contact| contact.as_ref().map(ContactSummaryResource::from)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokoku_core::UserId;

    use super::*;
    use crate::models::ContactSummary;

    #[test]
    fn test_contact_chain_is_embedded() {
        let now = Utc::now();
        let address = Address {
            id: AddressId::new(1),
            contact_id: ContactId::new(2),
            post_code: "40115".to_string(),
            country: "Indonesia".to_string(),
            province: "Jawa Barat".to_string(),
            city: "Bandung".to_string(),
            street: "Jl. Braga No. 10".to_string(),
            more: None,
            record_state: RecordState::Deleted,
            deleted_at: Some(now),
            created_at: now,
            updated_at: now,
            contact: Relation::Loaded(Some(ContactSummary {
                id: ContactId::new(2),
                name: "Andi".to_string(),
                user_id: UserId::new(5),
                user: None,
            })),
        };

        let resource = AddressResource::from(&address);
        assert!(resource.is_deleted());
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["contact"]["name"], "Andi");
        assert_eq!(json["contact"]["user_id"], 5);
        assert!(json["contact"]["user"].is_null());
        assert_eq!(json["record_state"], "deleted");
    }
}
