//! Address validation.

use tokoku_core::ContactId;

use super::{FormData, Rules, Validated};
use crate::db::{ContactRepository, RepositoryError};
use crate::models::AddressInput;

/// Validated address fields.
pub type AddressForm = AddressInput;

/// Validate address fields. The owning contact must exist and not be deleted.
///
/// # Errors
///
/// Returns `RepositoryError` if the contact lookup fails.
pub async fn validate_address(
    form: &FormData,
    contacts: &ContactRepository<'_>,
) -> Result<Validated<AddressForm>, RepositoryError> {
    let mut rules = Rules::new(form);

    let contact_id: Option<i32> = rules.parse_required(
        "contact_id",
        "The contact field is required.",
        "The selected contact is invalid.",
    );
    let contact_id = contact_id.map(ContactId::new);

    let post_code = rules.required("post_code", "The post code field is required.");
    rules.max_chars(
        "post_code",
        post_code.as_deref(),
        10,
        "The post code may not be greater than 10 characters.",
    );

    let mut place = |field: &str, label: &str, max: usize| {
        let value = rules.required(field, &format!("The {label} field is required."));
        rules.max_chars(
            field,
            value.as_deref(),
            max,
            &format!("The {label} may not be greater than {max} characters."),
        );
        value
    };
    let country = place("country", "country", 100);
    let province = place("province", "province", 100);
    let city = place("city", "city", 100);
    let street = place("street", "street", 255);

    let more = rules.optional("more");

    if let Some(id) = contact_id
        && !contacts.is_active(id).await?
    {
        rules.fail("contact_id", "The selected contact is invalid.");
    }

    Ok(rules.finish(|| {
        Some(AddressInput {
            contact_id: contact_id?,
            post_code: post_code?,
            country: country?,
            province: province?,
            city: city?,
            street: street?,
            more,
        })
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::tests::form;
    use super::*;

    #[tokio::test]
    async fn test_required_and_length_messages() {
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/tokoku_unreachable").unwrap();
        let contacts = ContactRepository::new(&pool);
        let long_street = "Jl. ".repeat(70);
        let data = form(&[
            ("contact_id", "abc"),
            ("post_code", "12345678901"),
            ("country", "Indonesia"),
            ("street", &long_street),
        ]);

        let errors = validate_address(&data, &contacts).await.unwrap().unwrap_err();
        assert_eq!(errors.first("contact_id"), Some("The selected contact is invalid."));
        assert_eq!(
            errors.first("post_code"),
            Some("The post code may not be greater than 10 characters.")
        );
        assert_eq!(errors.first("province"), Some("The province field is required."));
        assert_eq!(errors.first("city"), Some("The city field is required."));
        assert_eq!(
            errors.first("street"),
            Some("The street may not be greater than 255 characters.")
        );
        assert!(!errors.has("country"));
        assert!(!errors.has("more"));
    }
}
