#![forbid(unsafe_code)]

//! Binder configuration.

/// Tunables for a [`crate::Binder`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BinderConfig {
    /// UI event used by bidirectional bindings declared without one.
    pub default_event: String,
    /// Warn when a trigger field is absent from the record at bind time.
    pub warn_missing_triggers: bool,
    /// Default `auto_render` for declarative attachment.
    pub auto_render: bool,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            default_event: "change".to_string(),
            warn_missing_triggers: true,
            auto_render: true,
        }
    }
}

impl BinderConfig {
    /// Set the default bidirectional event.
    #[must_use]
    pub fn with_default_event(mut self, event: impl Into<String>) -> Self {
        self.default_event = event.into();
        self
    }

    #[must_use]
    pub fn with_warn_missing_triggers(mut self, enabled: bool) -> Self {
        self.warn_missing_triggers = enabled;
        self
    }

    #[must_use]
    pub fn with_auto_render(mut self, enabled: bool) -> Self {
        self.auto_render = enabled;
        self
    }

    /// Decode from JSON. Missing keys keep their defaults.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, crate::BindError> {
        serde_json::from_str(json).map_err(|err| crate::BindError::Config(err.to_string()))
    }
}
