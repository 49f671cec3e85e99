//! Settings forms
//!
//! A [`SettingsForm`] binds `name[field]=value` pairs from an url-encoded body.
//! What the values mean is left to the [`FormHandler`] that built the form.

pub mod general;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::store::StoreError;

pub use general::GeneralSettingsFormHandler;

/// Validation failure reported by [`FormHandler::save`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormError {
    pub field: String,
    pub message: String,
}

impl FormError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Field values bound from a request, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsFormData(BTreeMap<String, String>);

impl SettingsFormData {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SettingsFormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Serializable state of a form for page rendering
#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub name: &'static str,
    pub submitted: bool,
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct SettingsForm {
    name: &'static str,
    checkboxes: &'static [&'static str],
    initial: SettingsFormData,
    submitted: Option<SettingsFormData>,
}

impl SettingsForm {
    pub fn new(
        name: &'static str,
        checkboxes: &'static [&'static str],
        initial: SettingsFormData,
    ) -> Self {
        Self {
            name,
            checkboxes,
            initial,
            submitted: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Bind an url-encoded body.
    ///
    /// The form counts as submitted when at least one `name[...]` key is
    /// present. Unknown keys are ignored.
    pub fn handle_request(&mut self, body: &[u8]) {
        let prefix = format!("{}[", self.name);
        let fields: Vec<(String, String)> = url::form_urlencoded::parse(body)
            .filter_map(|(key, value)| {
                let field = key.strip_prefix(prefix.as_str())?.strip_suffix(']')?;
                (!field.is_empty() && !field.contains('['))
                    .then(|| (field.to_string(), value.into_owned()))
            })
            .collect();

        if fields.is_empty() {
            self.submitted = None;
            return;
        }

        let mut data = self.initial.clone();
        // An unchecked checkbox is simply absent from the body
        for checkbox in self.checkboxes {
            data.insert(*checkbox, "0");
        }
        for (field, value) in fields {
            data.insert(field, value);
        }
        self.submitted = Some(data);
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }

    /// Submitted values, or the initial ones when nothing was bound
    pub fn data(&self) -> SettingsFormData {
        self.submitted.clone().unwrap_or_else(|| self.initial.clone())
    }

    pub fn view(&self) -> FormView {
        FormView {
            name: self.name,
            submitted: self.is_submitted(),
            fields: self
                .data()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Builds a form from persisted state and saves bound data back
#[async_trait]
pub trait FormHandler: Send + Sync {
    async fn get_form(&self) -> Result<SettingsForm, StoreError>;

    /// Validation failures are returned, never raised; nothing is persisted
    /// unless the list is empty.
    async fn save(&self, data: SettingsFormData) -> Result<Vec<FormError>, StoreError>;
}
