//! Runtime-switchable locale.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::ports::LocalePort;

/// Locale shared between the settings layer and outbound requests.
#[derive(Debug, Clone)]
pub struct SharedLocale {
    tag: Arc<RwLock<String>>,
}

impl SharedLocale {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Arc::new(RwLock::new(tag.into())),
        }
    }

    /// Switches the locale for subsequent requests.
    pub fn set(&self, tag: impl Into<String>) {
        *self.tag.write() = tag.into();
    }
}

impl Default for SharedLocale {
    fn default() -> Self {
        Self::new("en")
    }
}

impl LocalePort for SharedLocale {
    fn current_locale(&self) -> String {
        self.tag.read().clone()
    }
}
