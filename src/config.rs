//! Configuration for XFA field mapping.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Field mapper configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Ignore `xfa:dataNode="dataGroup"` subtrees when deriving a skeleton from data.
    pub skip_data_groups: bool,

    /// Data leaves whose name contains one of these are left out of derived skeletons.
    pub excluded_leaf_names: Vec<String>,

    /// Mark values written into a `form` packet with `override="1"`.
    pub form_value_override: bool,

    /// Emit repeat occurrences beyond what the skeleton declares.
    pub extend_repeats: bool,

    /// Strip surrounding whitespace from extracted values.
    pub trim_values: bool,

    /// Turn stored radio and select codes back into option captions when
    /// extracting with a template.
    pub decode_choice_values: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MapperConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            skip_data_groups: true,
            excluded_leaf_names: vec![
                "SaveButton".to_string(),
                "ResetButton".to_string(),
                "PrintButton".to_string(),
            ],
            form_value_override: true,
            extend_repeats: true,
            trim_values: true,
            decode_choice_values: true,
        }
    }

    /// Load configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Skip data groups when deriving skeletons.
    pub fn with_skip_data_groups(mut self, enable: bool) -> Self {
        self.skip_data_groups = enable;
        self
    }

    /// Replace the excluded leaf name list.
    pub fn with_excluded_leaf_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_leaf_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set `override="1"` on form packet values.
    pub fn with_form_value_override(mut self, enable: bool) -> Self {
        self.form_value_override = enable;
        self
    }

    /// Extend repeating groups past the skeleton count during extraction.
    pub fn with_extend_repeats(mut self, enable: bool) -> Self {
        self.extend_repeats = enable;
        self
    }

    /// Trim extracted values.
    pub fn with_trim_values(mut self, enable: bool) -> Self {
        self.trim_values = enable;
        self
    }

    /// Map stored choice codes to captions during extraction.
    pub fn with_decode_choice_values(mut self, enable: bool) -> Self {
        self.decode_choice_values = enable;
        self
    }

    /// Whether a data leaf name is excluded from derived skeletons.
    pub fn is_excluded_leaf(&self, name: &str) -> bool {
        self.excluded_leaf_names
            .iter()
            .any(|marker| name.contains(marker.as_str()))
    }
}
