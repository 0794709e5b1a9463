//! Core types for Tokoku.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod listing;
pub mod price;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use listing::{DeletedStatus, SortOrder};
pub use price::Price;
pub use slug::slugify;
pub use status::*;
