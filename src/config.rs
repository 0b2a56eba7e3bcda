// MetaClass Runtime Configuration
//
// Supplied by the embedding environment, usually as a JSON document.

use serde::Deserialize;

use crate::error::MetaResult;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name of the root abstract type every ancestor chain ends at
    pub root_type_name: String,
    /// Name of the standard meta-type that builds types
    pub class_meta_name: String,
    /// Name of the standard meta-type that builds interfaces
    pub interface_meta_name: String,
    /// Nested invocation limit before dispatch fails instead of overflowing
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_type_name: "Object".to_string(),
            class_meta_name: "Class".to_string(),
            interface_meta_name: "Interface".to_string(),
            max_call_depth: 128,
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> MetaResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
