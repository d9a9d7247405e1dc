//! Animal roster identity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimal animal identity used to label report columns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnimalRef {
    pub id: Uuid,
    pub tag: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl AnimalRef {
    /// "Name (TAG)", or the tag alone when unnamed
    pub fn label(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("{} ({})", name, self.tag),
            _ => self.tag.clone(),
        }
    }
}
