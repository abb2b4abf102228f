//! Plugin definitions - the declared shape and defaults of a plugin kind

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::PluginError;

/// Value of a configurable parameter.
///
/// Plugins use the same value model as host-side TOML configuration.
pub type ParamValue = toml::Value;

/// One legal value of a parameter, with a display label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterChoice {
    pub label: String,
    pub value: ParamValue,
}

/// Descriptor for a single configurable parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginParameter {
    /// Display label
    pub label: String,
    /// Longer human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Default value, used to seed a fresh config
    pub value: ParamValue,
    /// Enumerated legal values. Empty means unconstrained.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ParameterChoice>,
}

impl PluginParameter {
    pub fn new(label: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            label: label.into(),
            description: None,
            value: value.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_choice(mut self, label: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.choices.push(ParameterChoice {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    /// Whether `value` is acceptable under the declared choices
    pub fn allows(&self, value: &ParamValue) -> bool {
        self.choices.is_empty() || self.choices.iter().any(|choice| &choice.value == value)
    }
}

/// Immutable definition of a plugin kind.
///
/// Authored once, either in code with the builder methods or as TOML:
///
/// ```
/// use plugmgr_api::PluginDefinition;
///
/// let def = PluginDefinition::from_toml_str(r#"
///     name = "greeter"
///     author = "someone"
///
///     [parameters.greeting]
///     label = "Greeting"
///     value = "hello"
/// "#).unwrap();
/// assert!(def.parameter("greeting").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDefinition {
    pub name: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "parameters")]
    pub configurable_parameters: BTreeMap<String, PluginParameter>,
}

impl PluginDefinition {
    pub fn new(name: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
            description: None,
            configurable_parameters: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, parameter: PluginParameter) -> Self {
        self.configurable_parameters.insert(key.into(), parameter);
        self
    }

    /// Parse a definition from TOML
    pub fn from_toml_str(content: &str) -> Result<Self, PluginError> {
        toml::from_str(content).map_err(|e| PluginError::Serialization(e.to_string()))
    }

    pub fn parameter(&self, key: &str) -> Option<&PluginParameter> {
        self.configurable_parameters.get(key)
    }

    /// Check a value against the declared choices of `key`.
    ///
    /// Parameters without choices accept any value.
    pub fn check_choice(&self, key: &str, value: &ParamValue) -> Result<(), PluginError> {
        let parameter = self
            .parameter(key)
            .ok_or_else(|| PluginError::UnknownParameter {
                plugin: self.name.clone(),
                key: key.to_string(),
            })?;

        if parameter.allows(value) {
            return Ok(());
        }

        let allowed = parameter
            .choices
            .iter()
            .map(|choice| choice.value.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(PluginError::InvalidChoice {
            key: key.to_string(),
            value: value.to_string(),
            allowed,
        })
    }
}
