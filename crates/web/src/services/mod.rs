//! Business logic services.
//!
//! - `auth` - Password sign-in and hashing
//! - `uploads` - Image files for avatars, categories and items

pub mod auth;
pub mod uploads;

pub use auth::{AuthError, AuthService, hash_password};
pub use uploads::{ImageKind, ImageStore, UploadError, UploadedFile};
