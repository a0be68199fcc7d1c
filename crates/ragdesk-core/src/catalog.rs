//! Models offered for selection, with short descriptions.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "llama3:70b";

/// A backend model the client offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub description: String,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// The built-in catalogue used when the configuration lists no models.
pub fn default_catalog() -> Vec<ModelInfo> {
    vec![
        ModelInfo::new("llama3:70b", "High performance general model"),
        ModelInfo::new("mixtral:8x7b", "Efficient analytical model"),
        ModelInfo::new("llama3.1:70b", "Enhanced reasoning model"),
        ModelInfo::new("mistral-nemo", "Business analytics specialist"),
    ]
}

/// Looks up a model by id.
pub fn find_model<'a>(catalog: &'a [ModelInfo], id: &str) -> Option<&'a ModelInfo> {
    catalog.iter().find(|model| model.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_is_in_catalog() {
        let catalog = default_catalog();
        let model = find_model(&catalog, DEFAULT_MODEL).unwrap();
        assert_eq!(model.description, "High performance general model");
        assert!(find_model(&catalog, "gpt-4o").is_none());
    }
}
