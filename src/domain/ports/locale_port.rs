//! Locale port definition.

/// Read-only view of the user's current locale.
pub trait LocalePort: Send + Sync {
    /// BCP 47 tag sent as `Accept-Language`.
    fn current_locale(&self) -> String;
}
