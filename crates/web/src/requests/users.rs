//! User create and update validation.

use tokoku_core::{Email, EmailError, UserId, UserRole, UserStatus};

use super::{FormData, Rules, Validated};
use crate::db::{RepositoryError, UserRepository};
use crate::services::UploadedFile;

const AVATAR_TYPES: &str = "The avatar must be a file of type: jpg, jpeg, png.";

/// Validated user fields. The password is plain text until the handler hashes
/// it; on update `None` keeps the stored hash.
#[derive(Debug, Clone)]
pub struct UserForm {
    pub google_id: Option<String>,
    pub username: String,
    pub email: Email,
    pub password: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub avatar: Option<UploadedFile>,
}

/// Validate a new user. Uniqueness is checked against every user, deleted
/// ones included.
///
/// # Errors
///
/// Returns `RepositoryError` if a uniqueness lookup fails.
pub async fn validate_store_user(
    form: &FormData,
    users: &UserRepository<'_>,
) -> Result<Validated<UserForm>, RepositoryError> {
    let mut rules = Rules::new(form);
    let fields = common_fields(&mut rules);

    let password = rules.required("password", "The password field is required.");
    check_password(&mut rules, form, password.as_deref());

    let avatar = rules.image(
        "avatar",
        5120,
        AVATAR_TYPES,
        "The avatar image may not be larger than 5MB.",
    );

    check_unique(
        &mut rules,
        users,
        &fields,
        None,
        UniqueMessages {
            username: "This username is already taken. Please choose a different one.",
            email: "This email is already registered.",
        },
    )
    .await?;

    Ok(rules.finish(|| {
        Some(UserForm {
            google_id: fields.google_id,
            username: fields.username?,
            email: fields.email?,
            password: Some(password?),
            role: fields.role?,
            status: fields.status?,
            avatar,
        })
    }))
}

/// Validate changes to user `id`. A blank password keeps the current one;
/// uniqueness ignores the user being edited.
///
/// # Errors
///
/// Returns `RepositoryError` if a uniqueness lookup fails.
pub async fn validate_update_user(
    id: UserId,
    form: &FormData,
    users: &UserRepository<'_>,
) -> Result<Validated<UserForm>, RepositoryError> {
    let mut rules = Rules::new(form);
    let fields = common_fields(&mut rules);

    let password = rules.optional("password");
    check_password(&mut rules, form, password.as_deref());

    let avatar = rules.image(
        "avatar",
        2048,
        AVATAR_TYPES,
        "The avatar must not be larger than 2MB.",
    );

    check_unique(
        &mut rules,
        users,
        &fields,
        Some(id),
        UniqueMessages {
            username: "This username is already taken.",
            email: "This email address is already in use.",
        },
    )
    .await?;

    Ok(rules.finish(|| {
        Some(UserForm {
            google_id: fields.google_id,
            username: fields.username?,
            email: fields.email?,
            password,
            role: fields.role?,
            status: fields.status?,
            avatar,
        })
    }))
}

struct CommonFields {
    google_id: Option<String>,
    username: Option<String>,
    email: Option<Email>,
    role: Option<UserRole>,
    status: Option<UserStatus>,
}

fn common_fields(rules: &mut Rules<'_>) -> CommonFields {
    let google_id = rules.optional("google_id");

    let username = rules.required("username", "The username field is required.");
    rules.max_chars(
        "username",
        username.as_deref(),
        25,
        "The username may not be greater than 25 characters.",
    );

    let email = rules
        .required("email", "The email address is required.")
        .and_then(|raw| match Email::parse(&raw) {
            Ok(email) => Some(email),
            Err(EmailError::TooLong { .. }) => {
                rules.fail("email", "The email address must not exceed 40 characters.");
                None
            }
            Err(_) => {
                rules.fail("email", "Please provide a valid email address.");
                None
            }
        });
    if let Some(ref email) = email
        && email.as_str().chars().count() > 40
    {
        rules.fail("email", "The email address must not exceed 40 characters.");
    }

    let role = rules.parse_required(
        "role",
        "The role field is required.",
        "The selected role is invalid.",
    );
    let status = rules.parse_required(
        "status",
        "The status field is required.",
        "The selected status is invalid.",
    );

    CommonFields {
        google_id,
        username,
        email,
        role,
        status,
    }
}

fn check_password(rules: &mut Rules<'_>, form: &FormData, password: Option<&str>) {
    let Some(password) = password else {
        return;
    };
    if password.chars().count() > 64 {
        rules.fail("password", "The password must not exceed 64 characters.");
    }
    if form.text("password_confirmation") != Some(password) {
        rules.fail("password", "The password confirmation does not match.");
    }
}

struct UniqueMessages {
    username: &'static str,
    email: &'static str,
}

async fn check_unique(
    rules: &mut Rules<'_>,
    users: &UserRepository<'_>,
    fields: &CommonFields,
    except: Option<UserId>,
    messages: UniqueMessages,
) -> Result<(), RepositoryError> {
    if let Some(username) = fields.username.as_deref()
        && !rules.has_error("username")
        && users.username_taken(username, except).await?
    {
        rules.fail("username", messages.username);
    }

    if let Some(email) = fields.email.as_ref()
        && !rules.has_error("email")
        && users.email_taken(email, except).await?
    {
        rules.fail("email", messages.email);
    }

    if let Some(google_id) = fields.google_id.as_deref()
        && users.google_id_taken(google_id, except).await?
    {
        rules.fail(
            "google_id",
            "This Google ID is already associated with another user.",
        );
    }

    Ok(())
}
