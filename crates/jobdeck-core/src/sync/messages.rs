//! Message read-marking.
//!
//! The smallest of the optimistic toggles: a boolean per message id,
//! flipped when the user opens a conversation.

use super::optimistic::ToggleCoordinator;
use crate::api::types::Message;
use crate::api::{ApiClient, ApiResult};

/// Locally tracked read flags for the current user's messages.
#[derive(Default)]
pub struct MessageReadSet {
    toggles: ToggleCoordinator<i64, bool>,
}

impl MessageReadSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a message is currently shown as read.
    pub fn is_read(&self, message_id: i64) -> bool {
        self.toggles.observed(&message_id).unwrap_or(false)
    }

    /// Seeds read flags from freshly fetched messages.
    pub fn seed_from(&self, messages: &[Message]) {
        for message in messages {
            self.toggles.seed(message.id, message.read);
        }
    }

    /// Marks a message read (or unread) optimistically.
    ///
    /// # Errors
    /// Propagates the request's error after reverting the flag.
    pub async fn mark_read(
        &self,
        api: &ApiClient,
        message_id: i64,
        read: bool,
    ) -> ApiResult<bool> {
        let current = self.is_read(message_id);
        self.toggles
            .run(message_id, current, read, || async move {
                api.mark_message_read(message_id, read)
                    .await
                    .map(|response| response.read)
            })
            .await
    }
}
