//! Contact validation.

use chrono::{NaiveDate, Utc};

use tokoku_core::{Gender, UserId};

use super::{FormData, Rules, Validated};
use crate::db::{RepositoryError, UserRepository};
use crate::models::ContactInput;

/// Validated contact fields.
pub type ContactForm = ContactInput;

/// Validate contact fields. The owning user must exist and not be deleted.
///
/// # Errors
///
/// Returns `RepositoryError` if the user lookup fails.
pub async fn validate_contact(
    form: &FormData,
    users: &UserRepository<'_>,
) -> Result<Validated<ContactForm>, RepositoryError> {
    let mut rules = Rules::new(form);

    let user_id: Option<i32> = rules.parse_required(
        "user_id",
        "The user field is required.",
        "The selected user is invalid.",
    );
    let user_id = user_id.map(UserId::new);

    let name = rules.required("name", "The name field is required.");
    rules.max_chars(
        "name",
        name.as_deref(),
        100,
        "The name may not be greater than 100 characters.",
    );

    let phone = rules.required("phone", "The phone field is required.");
    rules.max_chars(
        "phone",
        phone.as_deref(),
        20,
        "The phone may not be greater than 20 characters.",
    );

    let profile = rules.optional("profile");

    let gender: Option<Gender> = rules.parse_required(
        "gender",
        "The gender field is required.",
        "The selected gender is invalid.",
    );

    let birthday: Option<NaiveDate> =
        rules.parse("birthday", "The birthday is not a valid date.");
    if birthday.is_some_and(|day| day > Utc::now().date_naive()) {
        rules.fail("birthday", "The birthday must be a date before today.");
    }

    if let Some(id) = user_id
        && !users.is_active(id).await?
    {
        rules.fail("user_id", "The selected user is invalid.");
    }

    Ok(rules.finish(|| {
        Some(ContactInput {
            user_id: user_id?,
            name: name?,
            phone: phone?,
            profile,
            gender: gender?,
            birthday,
        })
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::tests::form;
    use super::*;

    fn lazy_pool() -> sqlx::PgPool {
        sqlx::PgPool::connect_lazy("postgres://localhost/tokoku_unreachable").unwrap()
    }

    #[tokio::test]
    async fn test_reports_each_invalid_field() {
        let pool = lazy_pool();
        let users = UserRepository::new(&pool);
        let tomorrow = (Utc::now().date_naive() + chrono::Days::new(1)).to_string();
        let data = form(&[
            ("name", "Siti"),
            ("phone", "081234567890123456789"),
            ("gender", "OTHER"),
            ("birthday", &tomorrow),
        ]);

        let errors = validate_contact(&data, &users).await.unwrap().unwrap_err();
        assert_eq!(errors.first("user_id"), Some("The user field is required."));
        assert_eq!(
            errors.first("phone"),
            Some("The phone may not be greater than 20 characters.")
        );
        assert_eq!(errors.first("gender"), Some("The selected gender is invalid."));
        assert_eq!(
            errors.first("birthday"),
            Some("The birthday must be a date before today.")
        );
        assert!(!errors.has("name"));
    }

    #[tokio::test]
    async fn test_malformed_birthday() {
        let pool = lazy_pool();
        let users = UserRepository::new(&pool);
        let data = form(&[("birthday", "17/08/1990")]);

        let errors = validate_contact(&data, &users).await.unwrap().unwrap_err();
        assert_eq!(errors.first("birthday"), Some("The birthday is not a valid date."));
    }
}
