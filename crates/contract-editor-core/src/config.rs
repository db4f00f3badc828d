//! Editor configuration
//!
//! Class and attribute names used in the rendered HTML, plus the heading of
//! the additional clauses section. The host stylesheet keys off these, so
//! they are configurable rather than hard-coded.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::EditorError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Class present on every placeholder element
    pub field_class: String,
    /// Class for a placeholder holding a non-blank value
    pub filled_class: String,
    /// Class for a placeholder showing its label
    pub empty_class: String,
    /// Highlight class for the field being edited
    pub active_class: String,
    /// Attribute carrying the variable name
    pub variable_attribute: String,
    /// Attribute carrying the field index on the surface
    pub index_attribute: String,
    /// Wrapper class of the additional clauses section
    pub clauses_class: String,
    /// Heading shown above the additional clauses
    pub clauses_heading: String,
    /// Emit `contenteditable="true"` on placeholder elements
    pub editable: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            field_class: "variable-field".to_string(),
            filled_class: "filled".to_string(),
            empty_class: "empty".to_string(),
            active_class: "active".to_string(),
            variable_attribute: "data-variable".to_string(),
            index_attribute: "data-field".to_string(),
            clauses_class: "additional-clauses".to_string(),
            clauses_heading: "CLÁUSULAS ADICIONAIS".to_string(),
            editable: true,
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file (native builds only; the browser passes JSON)
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read editor config: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid editor config: {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), EditorError> {
        let classes = [
            ("field_class", &self.field_class),
            ("filled_class", &self.filled_class),
            ("empty_class", &self.empty_class),
            ("active_class", &self.active_class),
            ("clauses_class", &self.clauses_class),
        ];
        for (key, value) in classes {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(EditorError::InvalidConfig(format!(
                    "{} must be a single non-empty class name, got {:?}",
                    key, value
                )));
            }
        }

        for (key, value) in [
            ("variable_attribute", &self.variable_attribute),
            ("index_attribute", &self.index_attribute),
        ] {
            let valid_tail = value
                .strip_prefix("data-")
                .map(|tail| {
                    !tail.is_empty()
                        && tail
                            .chars()
                            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
                })
                .unwrap_or(false);
            if !valid_tail {
                return Err(EditorError::InvalidConfig(format!(
                    "{} must be a data-* attribute, got {:?}",
                    key, value
                )));
            }
        }

        if self.variable_attribute == self.index_attribute {
            return Err(EditorError::InvalidConfig(
                "variable_attribute and index_attribute must differ".to_string(),
            ));
        }

        Ok(())
    }

    /// Class list for a placeholder in the given state
    pub fn field_class_list(&self, filled: bool, active: bool) -> String {
        let state = if filled {
            &self.filled_class
        } else {
            &self.empty_class
        };
        if active {
            format!("{} {} {}", self.field_class, state, self.active_class)
        } else {
            format!("{} {}", self.field_class, state)
        }
    }
}
