//! User management commands.
//!
//! ```bash
//! tokoku-cli user create -u admin -e admin@tokoku.test -p secret123 -r ADMIN
//! ```

use thiserror::Error;

use tokoku_core::{Email, UserRole, UserStatus};
use tokoku_web::db::{RepositoryError, UserRepository};
use tokoku_web::models::NewUser;
use tokoku_web::services::{AuthError, hash_password};

use super::{ConnectError, connect};

const MAX_USERNAME_CHARS: usize = 25;
const MAX_PASSWORD_CHARS: usize = 64;

/// Errors that can occur while creating a user.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid role: {0}. Valid roles: ADMIN, COURIER, CLIENT")]
    InvalidRole(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(&'static str),

    #[error("Invalid password: {0}")]
    InvalidPassword(&'static str),

    #[error("A user already exists with {0}")]
    UserExists(String),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] AuthError),
}

/// Arguments checked before anything touches the database.
#[derive(Debug)]
struct ValidatedUser {
    username: String,
    email: Email,
    role: UserRole,
}

fn validate(
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<ValidatedUser, UserError> {
    let role: UserRole = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;

    let email = Email::parse(email).map_err(|e| UserError::InvalidEmail(e.to_string()))?;

    let username = username.trim();
    if username.is_empty() {
        return Err(UserError::InvalidUsername("must not be empty"));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(UserError::InvalidUsername("must be at most 25 characters"));
    }

    if password.is_empty() {
        return Err(UserError::InvalidPassword("must not be empty"));
    }
    if password.chars().count() > MAX_PASSWORD_CHARS {
        return Err(UserError::InvalidPassword("must be at most 64 characters"));
    }

    Ok(ValidatedUser {
        username: username.to_owned(),
        email,
        role,
    })
}

/// Create an active user with a hashed password.
///
/// # Errors
///
/// Returns `UserError` if an argument is invalid, the username or email is
/// taken, or a database operation fails.
pub async fn create(
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<(), UserError> {
    let user = validate(username, email, password, role)?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    if users.username_taken(&user.username, None).await? {
        return Err(UserError::UserExists(format!("username {}", user.username)));
    }
    if users.email_taken(&user.email, None).await? {
        return Err(UserError::UserExists(format!("email {}", user.email.as_str())));
    }

    tracing::info!("Creating user: {} ({})", user.username, user.role.as_str());

    let created = users
        .create(&NewUser {
            google_id: None,
            username: user.username,
            email: user.email,
            password_hash: hash_password(password)?,
            avatar: None,
            role: user.role,
            status: UserStatus::Active,
        })
        .await?;

    tracing::info!(id = %created.id, "User created");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_defaults() {
        let user = validate(" admin ", "admin@tokoku.test", "secret123", "ADMIN").unwrap();
        assert_eq!(user.username, "admin");
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn test_validate_rejects_unknown_role() {
        let err = validate("admin", "admin@tokoku.test", "secret123", "OWNER").unwrap_err();
        assert!(matches!(err, UserError::InvalidRole(role) if role == "OWNER"));
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(matches!(
            validate("admin", "not-an-email", "secret123", "ADMIN"),
            Err(UserError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate(&"a".repeat(26), "admin@tokoku.test", "secret123", "ADMIN"),
            Err(UserError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate("admin", "admin@tokoku.test", "", "ADMIN"),
            Err(UserError::InvalidPassword(_))
        ));
    }
}
