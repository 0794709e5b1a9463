//! One-shot messages carried across a redirect.

use tower_sessions::Session;

use crate::models::{FlashMessage, session_keys};

/// Queue `message` for the next rendered page.
///
/// A failure is logged and otherwise ignored; the redirect still happens.
pub async fn set_flash(session: &Session, message: FlashMessage) {
    if let Err(e) = session.insert(session_keys::FLASH, message).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Remove and return the pending message, if any.
pub async fn take_flash(session: &Session) -> Option<FlashMessage> {
    session
        .remove::<FlashMessage>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}
