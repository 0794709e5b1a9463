//! Tokoku Core - Shared domain types.
//!
//! This crate provides the types used across the Tokoku components:
//! - `web` - Admin panel and storefront
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no database
//! access, no HTTP. Database mappings are compiled in with the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, prices, enumerations and listing vocabulary

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
