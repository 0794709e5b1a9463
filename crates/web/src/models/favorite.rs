//! Favorites: (user, item) membership.

use serde::Serialize;

/// Outcome of flipping a favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteToggle {
    Added,
    Removed,
}

impl FavoriteToggle {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Added => "Item added to favorites",
            Self::Removed => "Item removed from favorites",
        }
    }
}
