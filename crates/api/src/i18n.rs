//! Message catalog
//!
//! Catalog file layout: `{ "<domain>": { "<message id>": "<text>" } }`.
//! Messages missing from the catalog are returned untranslated.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Cannot read translation catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed translation catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

type Catalog = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Clone, Default)]
pub struct Translator {
    catalog: Arc<Catalog>,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        Ok(Self {
            catalog: Arc::new(catalog),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn trans(&self, id: &str, domain: &str) -> String {
        self.catalog
            .get(domain)
            .and_then(|messages| messages.get(id))
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translates_known_messages_only() {
        let translator = Translator::from_json(
            r#"{"Admin.Notifications.Success": {"Successful deletion": "Suppression réussie"}}"#,
        )
        .unwrap();

        assert_eq!(
            translator.trans("Successful deletion", "Admin.Notifications.Success"),
            "Suppression réussie"
        );
        assert_eq!(
            translator.trans("Successful deletion", "Admin.Notifications.Error"),
            "Successful deletion"
        );
        assert_eq!(
            Translator::new().trans("Update successful", "Admin.Notifications.Success"),
            "Update successful"
        );
    }

    #[test]
    fn test_malformed_catalog_is_rejected() {
        assert!(matches!(
            Translator::from_json("[1, 2]"),
            Err(CatalogError::Parse(_))
        ));
    }
}
