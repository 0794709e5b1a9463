//! Domain models.
//!
//! Entities as the application sees them after leaving the database layer.
//! Password hashes never appear here; login goes through
//! [`crate::db::UserRepository::find_credentials`].

pub mod address;
pub mod category;
pub mod contact;
pub mod favorite;
pub mod item;
pub mod relation;
pub mod session;
pub mod user;

pub use address::{Address, AddressInput, AddressRelation};
pub use category::{Category, CategoryInput, CategoryRelation, CategorySummary};
pub use contact::{Contact, ContactInput, ContactRelation, ContactSummary};
pub use favorite::FavoriteToggle;
pub use item::{CatalogItem, Item, ItemInput, ItemRelation};
pub use relation::Relation;
pub use session::{CurrentUser, FlashMessage, FlashKind, keys as session_keys};
pub use user::{NewUser, User, UserChanges, UserSummary};
