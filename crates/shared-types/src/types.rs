use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A contract template as served by the templates API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractTemplate {
    pub id: String,
    pub title: String,
    /// Template text with `{{ variable }}` placeholders
    pub content: String,
    /// Variable names in presentation order
    #[serde(default)]
    pub variables: Vec<String>,
    /// Base price before optional clauses
    #[serde(default)]
    pub base_price: f64,
}

/// An optional clause the buyer can add to a contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub id: u32,
    pub title: String,
    pub price: f64,
    /// Clause text, same placeholder syntax as the main template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_text: Option<String>,
}

/// Variable name -> value map entered by the user.
///
/// A missing key reads as the empty string. The map is never edited in
/// place by the editor: every commit produces a whole new map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(BTreeMap<String, String>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `name`, empty if absent
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }

    /// True when the trimmed value is non-empty
    pub fn is_filled(&self, name: &str) -> bool {
        !self.get(name).trim().is_empty()
    }

    /// Copy of this map with `name` set to `value`
    pub fn with_value(&self, name: &str, value: impl Into<String>) -> Self {
        let mut next = self.0.clone();
        next.insert(name.to_string(), value.into());
        Self(next)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Ids of the capsules currently selected, in the order they were picked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapsuleSelection(Vec<u32>);

impl CapsuleSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.0.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> &[u32] {
        &self.0
    }

    /// Next selection after a checkbox toggle: removes `id` if present,
    /// appends it otherwise.
    pub fn toggled(&self, id: u32) -> Self {
        let mut next = self.0.clone();
        if let Some(pos) = next.iter().position(|&existing| existing == id) {
            next.remove(pos);
        } else {
            next.push(id);
        }
        Self(next)
    }
}

impl From<Vec<u32>> for CapsuleSelection {
    fn from(ids: Vec<u32>) -> Self {
        let mut unique = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Self(unique)
    }
}
