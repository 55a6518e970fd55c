//! Redaction wrapper for secrets handed through the `system` capability
//! (API keys, tokens). Debug and Display never print the inner value.

use std::fmt;

const REDACTED: &str = "***REDACTED***";

/// A value that must never reach a log line
///
/// ```
/// use cmdflow_core_types::Sensitive;
///
/// let key = Sensitive::new(String::from("sk-live-123"));
/// assert_eq!(format!("{key:?}"), "***REDACTED***");
/// assert_eq!(key.expose(), "sk-live-123");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the secret. Callers own the responsibility of not logging it.
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Sensitive<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_are_redacted() {
        let key = Sensitive::new("sk-abc");
        assert_eq!(format!("{key:?}"), REDACTED);
        assert_eq!(format!("{key}"), REDACTED);
    }

    #[test]
    fn test_redaction_inside_derived_debug() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct ModelSettings {
            model: String,
            api_key: Sensitive<String>,
        }

        let settings = ModelSettings {
            model: "small".to_string(),
            api_key: Sensitive::new("sk-secret".to_string()),
        };
        let rendered = format!("{settings:?}");
        assert!(rendered.contains("small"));
        assert!(!rendered.contains("sk-secret"));
    }

    #[test]
    fn test_into_inner_returns_secret() {
        let key: Sensitive<String> = String::from("k").into();
        assert_eq!(key.into_inner(), "k");
    }
}
