//! Favorite toggle responses.

use serde::Serialize;

use crate::models::FavoriteToggle;

/// Body of every `POST /favorites/toggle` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FavoriteToggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    pub message: &'static str,
}

impl FavoriteResponse {
    #[must_use]
    pub const fn toggled(outcome: FavoriteToggle) -> Self {
        Self {
            success: true,
            status: Some(outcome),
            error: None,
            message: outcome.message(),
        }
    }

    #[must_use]
    pub const fn missing_item() -> Self {
        Self::failure(
            "The item_id field is required.",
            "Please choose an item to favorite.",
        )
    }

    #[must_use]
    pub const fn item_not_found() -> Self {
        Self::failure("Item not found", "The item is no longer available.")
    }

    #[must_use]
    pub const fn failed() -> Self {
        Self::failure("Failed to update favorite status", "Please try again later.")
    }

    const fn failure(error: &'static str, message: &'static str) -> Self {
        Self {
            success: false,
            status: None,
            error: Some(error),
            message,
        }
    }
}
