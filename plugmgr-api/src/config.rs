//! Per-instance plugin configuration derived from a definition

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use crate::definition::{ParamValue, PluginDefinition};
use crate::error::PluginError;

/// Partial set of parameter values applied on top of a config
pub type ParameterOverrides = BTreeMap<String, ParamValue>;

/// Current parameter values of one plugin instance.
///
/// The parameter key set always equals the key set of the originating
/// definition: configs can only be created from a definition, and [`set`]
/// refuses keys the definition never declared.
///
/// [`set`]: PluginConfig::set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginConfig {
    pub name: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    configurable_parameters: BTreeMap<String, ParamValue>,
}

impl PluginConfig {
    /// Seed a config with the default value of every declared parameter
    pub fn from_definition(definition: &PluginDefinition) -> Self {
        let configurable_parameters = definition
            .configurable_parameters
            .iter()
            .map(|(key, parameter)| (key.clone(), parameter.value.clone()))
            .collect();

        Self {
            name: definition.name.clone(),
            author: definition.author.clone(),
            description: definition.description.clone(),
            configurable_parameters,
        }
    }

    /// All current parameter values
    pub fn parameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.configurable_parameters
    }

    /// Raw value of a parameter
    pub fn value(&self, key: &str) -> Option<&ParamValue> {
        self.configurable_parameters.get(key)
    }

    /// Typed value of a parameter
    ///
    /// # Example
    /// ```ignore
    /// let retries: Option<u32> = config.get("retries");
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.configurable_parameters
            .get(key)
            .and_then(|v| v.clone().try_into().ok())
    }

    /// Replace the value of a declared parameter, returning the previous one
    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<ParamValue>,
    ) -> Result<ParamValue, PluginError> {
        match self.configurable_parameters.get_mut(key) {
            Some(slot) => Ok(std::mem::replace(slot, value.into())),
            None => Err(PluginError::UnknownParameter {
                plugin: self.name.clone(),
                key: key.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::PluginParameter;

    fn definition() -> PluginDefinition {
        PluginDefinition::new("demo", "tests")
            .with_description("demo plugin")
            .with_parameter("retries", PluginParameter::new("Retries", 3_i64))
            .with_parameter("mode", PluginParameter::new("Mode", "fast"))
    }

    #[test]
    fn test_default_config_matches_definition_exactly() {
        let config = PluginConfig::from_definition(&definition());

        let expected: BTreeMap<String, ParamValue> = [
            ("retries".to_string(), ParamValue::Integer(3)),
            ("mode".to_string(), ParamValue::String("fast".into())),
        ]
        .into_iter()
        .collect();
        assert_eq!(config.parameters(), &expected);
        assert_eq!(config.name, "demo");
        assert_eq!(config.author, "tests");
        assert_eq!(config.description.as_deref(), Some("demo plugin"));
    }

    #[test]
    fn test_definition_without_parameters() {
        let config = PluginConfig::from_definition(&PluginDefinition::new("bare", "tests"));
        assert!(config.parameters().is_empty());
    }

    #[test]
    fn test_typed_get() {
        let config = PluginConfig::from_definition(&definition());
        assert_eq!(config.get::<u32>("retries"), Some(3));
        assert_eq!(config.get::<String>("mode"), Some("fast".to_string()));
        assert_eq!(config.get::<String>("missing"), None);
        assert_eq!(config.get::<bool>("mode"), None);
    }

    #[test]
    fn test_set_replaces_declared_value() {
        let mut config = PluginConfig::from_definition(&definition());
        let previous = config.set("mode", "slow").unwrap();
        assert_eq!(previous, ParamValue::String("fast".into()));
        assert_eq!(config.get::<String>("mode"), Some("slow".to_string()));
    }

    #[test]
    fn test_set_keeps_key_set_fixed() {
        let mut config = PluginConfig::from_definition(&definition());
        let err = config.set("colour", "red").unwrap_err();
        assert!(matches!(err, PluginError::UnknownParameter { .. }));
        assert_eq!(config.parameters().len(), 2);
        assert!(config.value("colour").is_none());
    }

    #[test]
    fn test_set_does_not_check_choices() {
        let def = PluginDefinition::new("demo", "tests").with_parameter(
            "mode",
            PluginParameter::new("Mode", "fast").with_choice("Fast", "fast"),
        );
        let mut config = PluginConfig::from_definition(&def);
        assert!(config.set("mode", "warp").is_ok());
    }
}
