//! Single-slot broadcast of the error currently interrupting the user.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::domain::errors::ClassifiedError;

/// Holds at most one globally displayable error and notifies subscribers.
#[derive(Clone)]
pub struct GlobalErrorChannel {
    slot: Arc<watch::Sender<Option<ClassifiedError>>>,
}

impl GlobalErrorChannel {
    /// Creates an empty channel.
    #[must_use]
    pub fn create() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
        }
    }

    /// Replaces the slot contents. Validation errors are refused and return `false`.
    pub fn publish(&self, error: ClassifiedError) -> bool {
        if !error.status_class().is_globally_displayable() {
            debug!(class = %error.status_class(), "Refusing to publish field-scoped error");
            return false;
        }

        debug!(
            class = %error.status_class(),
            key = error.translation_key(),
            "Publishing global error"
        );
        self.slot.send_replace(Some(error));
        true
    }

    /// Empties the slot.
    pub fn clear(&self) {
        self.slot.send_if_modified(|current| current.take().is_some());
    }

    /// Returns the error occupying the slot.
    #[must_use]
    pub fn current(&self) -> Option<ClassifiedError> {
        self.slot.borrow().clone()
    }

    /// Receiver notified on every publish and clear.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<ClassifiedError>> {
        self.slot.subscribe()
    }

    /// Clears the slot at end of life.
    pub fn dispose(&self) {
        self.clear();
    }
}

impl Default for GlobalErrorChannel {
    fn default() -> Self {
        Self::create()
    }
}
