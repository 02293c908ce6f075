//! Configuration for a single lookup table.
//!
//! A component's lookup tables are configured under its own name:
//!
//! ```yaml
//! disease_model:
//!   incidence_rate:
//!     value: 0.05                # a constant
//!   mortality_rate:
//!     value: data                # load external data...
//!     key_name: cause.mortality  # ...under this key
//!     categorical_columns: [sex]
//!     continuous_columns: [age]
//! ```

use serde::Deserialize;

use crate::{LookupError, LookupResult};

/// Marker value meaning "load this table from a data source".
pub const DATA_VALUE: &str = "data";

/// Either a constant or the keyword `data`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LookupValue {
    Constant(f64),
    Keyword(String),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LookupConfig {
    pub value: LookupValue,

    /// Population columns matched exactly against the data.
    #[serde(default)]
    pub categorical_columns: Vec<String>,

    /// Population columns interpolated over.  At most one.
    #[serde(default)]
    pub continuous_columns: Vec<String>,

    /// Data-source key, required when `value` is `data`.
    #[serde(default)]
    pub key_name: Option<String>,
}

impl LookupConfig {
    /// A config for a constant table.
    pub fn constant(value: f64) -> Self {
        Self {
            value: LookupValue::Constant(value),
            categorical_columns: Vec::new(),
            continuous_columns: Vec::new(),
            key_name: None,
        }
    }

    /// A config for a table loaded from `key_name`.
    pub fn data(key_name: &str, categorical: &[&str], continuous: &[&str]) -> Self {
        Self {
            value: LookupValue::Keyword(DATA_VALUE.to_string()),
            categorical_columns: categorical.iter().map(|s| s.to_string()).collect(),
            continuous_columns: continuous.iter().map(|s| s.to_string()).collect(),
            key_name: Some(key_name.to_string()),
        }
    }

    /// The data key to load, or `None` for a constant table.
    pub fn data_key(&self) -> LookupResult<Option<&str>> {
        match &self.value {
            LookupValue::Constant(_) => Ok(None),
            LookupValue::Keyword(word) if word == DATA_VALUE => self
                .key_name
                .as_deref()
                .map(Some)
                .ok_or_else(|| LookupError::Config("value `data` requires a key_name".into())),
            LookupValue::Keyword(word) => Err(LookupError::Config(format!(
                "value must be a number or {DATA_VALUE:?}, got {word:?}"
            ))),
        }
    }
}
