// ⚙️ Document Configuration
// Which columns of the price table carry the record name, value, and kind.

use serde::{Deserialize, Serialize};

/// Layout of a price document.
///
/// Defaults match the tables produced by the market data export:
/// `name,value,tag` separated by commas, kind `PX_LAST`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Attribute holding the unique record name
    pub name_key: String,

    /// Attribute holding the numeric value
    pub value_key: String,

    /// Attribute holding the unit/kind label (optional in the document)
    pub kind_key: String,

    /// Kind used by `stage_set` when the caller does not pass one
    pub default_kind: String,

    /// Field delimiter byte
    pub delimiter: u8,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        DocumentConfig {
            name_key: "name".to_string(),
            value_key: "value".to_string(),
            kind_key: "tag".to_string(),
            default_kind: "PX_LAST".to_string(),
            delimiter: b',',
        }
    }
}

impl DocumentConfig {
    pub fn new() -> Self {
        DocumentConfig::default()
    }

    /// Builder pattern: override the name attribute
    pub fn with_name_key(mut self, key: impl Into<String>) -> Self {
        self.name_key = key.into();
        self
    }

    /// Builder pattern: override the value attribute
    pub fn with_value_key(mut self, key: impl Into<String>) -> Self {
        self.value_key = key.into();
        self
    }

    /// Builder pattern: override the kind attribute
    pub fn with_kind_key(mut self, key: impl Into<String>) -> Self {
        self.kind_key = key.into();
        self
    }

    /// Builder pattern: override the default kind label
    pub fn with_default_kind(mut self, kind: impl Into<String>) -> Self {
        self.default_kind = kind.into();
        self
    }

    /// Builder pattern: override the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}
