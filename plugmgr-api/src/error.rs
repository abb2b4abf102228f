//! Error types for plugin authors

use thiserror::Error;

/// Errors that plugins and their hooks can return
#[derive(Error, Debug)]
pub enum PluginError {
    /// A lifecycle hook failed
    #[error("{hook} hook failed: {message}")]
    Hook { hook: &'static str, message: String },

    /// Key not declared by the plugin definition
    #[error("Unknown parameter '{key}' for plugin '{plugin}'")]
    UnknownParameter { plugin: String, key: String },

    /// Value outside the declared choices of a parameter
    #[error("Invalid value {value} for parameter '{key}': expected one of [{allowed}]")]
    InvalidChoice {
        key: String,
        value: String,
        allowed: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Custom error with message
    #[error("{0}")]
    Custom(String),
}

impl PluginError {
    /// Create a custom error with a message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Create a hook failure for the named lifecycle hook
    pub fn hook(hook: &'static str, message: impl Into<String>) -> Self {
        Self::Hook {
            hook,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PluginError::hook("install", "disk full");
        assert_eq!(err.to_string(), "install hook failed: disk full");

        let err = PluginError::UnknownParameter {
            plugin: "demo".into(),
            key: "retries".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown parameter 'retries' for plugin 'demo'"
        );

        let custom_err = PluginError::custom("something happened");
        assert_eq!(custom_err.to_string(), "something happened");
    }

    #[test]
    fn test_invalid_choice_lists_allowed_values() {
        let err = PluginError::InvalidChoice {
            key: "mode".into(),
            value: "\"warp\"".into(),
            allowed: "\"fast\", \"slow\"".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("mode"));
        assert!(msg.contains("warp"));
        assert!(msg.contains("\"fast\", \"slow\""));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let plugin_err: PluginError = io_err.into();

        assert!(matches!(plugin_err, PluginError::Io(_)));
        assert!(plugin_err.to_string().contains("file not found"));
    }
}
