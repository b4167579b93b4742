//! Per-binding resolver configuration

/// Configuration for an `AsyncResolver`.
#[derive(Debug, Clone)]
pub struct ResolverConfig<T> {
    /// Value an empty source resolves to, and the no-value fallback when a
    /// read omits it. `None` unless configured.
    pub default_value: Option<T>,
    /// Name of the binding in log output
    pub label: Option<String>,
}

impl<T> Default for ResolverConfig<T> {
    fn default() -> Self {
        Self {
            default_value: None,
            label: None,
        }
    }
}

impl<T> ResolverConfig<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_value(mut self, value: T) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("anonymous")
    }
}
