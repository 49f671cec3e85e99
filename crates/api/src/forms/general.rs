//! General security settings form

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use backoffice_shared::{CookieSameSite, SecuritySettings};

use super::{FormError, FormHandler, SettingsForm, SettingsFormData};
use crate::store::{SettingsStore, StoreError};

pub const FORM_NAME: &str = "general";

pub const FIELD_CHECK_IP: &str = "check_cookie_ip_address";
pub const FIELD_FRONT_LIFETIME: &str = "front_cookie_lifetime";
pub const FIELD_BACK_LIFETIME: &str = "back_cookie_lifetime";
pub const FIELD_SAMESITE: &str = "cookie_samesite";
pub const FIELD_PASSWORD_MIN_LENGTH: &str = "password_minimum_length";
pub const FIELD_PASSWORD_MAX_LENGTH: &str = "password_maximum_length";
pub const FIELD_PASSWORD_MIN_SCORE: &str = "password_minimum_score";

const CHECKBOXES: &[&str] = &[FIELD_CHECK_IP];

const MAX_COOKIE_LIFETIME_HOURS: u32 = 65535;
/// bcrypt ignores anything past 72 bytes
const MAX_PASSWORD_LENGTH: u32 = 72;
const MAX_PASSWORD_SCORE: u8 = 4;

pub struct GeneralSettingsFormHandler {
    store: Arc<dyn SettingsStore>,
    ssl_enabled: bool,
}

impl GeneralSettingsFormHandler {
    pub fn new(store: Arc<dyn SettingsStore>, ssl_enabled: bool) -> Self {
        Self { store, ssl_enabled }
    }

    fn to_data(settings: &SecuritySettings) -> SettingsFormData {
        [
            (
                FIELD_CHECK_IP,
                if settings.check_cookie_ip_address { "1" } else { "0" }.to_string(),
            ),
            (
                FIELD_FRONT_LIFETIME,
                settings.front_office_cookie_lifetime_hours.to_string(),
            ),
            (
                FIELD_BACK_LIFETIME,
                settings.back_office_cookie_lifetime_hours.to_string(),
            ),
            (FIELD_SAMESITE, settings.cookie_samesite.as_str().to_string()),
            (
                FIELD_PASSWORD_MIN_LENGTH,
                settings.password_minimum_length.to_string(),
            ),
            (
                FIELD_PASSWORD_MAX_LENGTH,
                settings.password_maximum_length.to_string(),
            ),
            (
                FIELD_PASSWORD_MIN_SCORE,
                settings.password_minimum_score.to_string(),
            ),
        ]
        .into_iter()
        .collect()
    }

    /// Parse and validate every field, collecting all failures
    fn validate(&self, data: &SettingsFormData) -> Result<SecuritySettings, Vec<FormError>> {
        let mut errors = Vec::new();

        let check_ip = matches!(data.get(FIELD_CHECK_IP), Some("1" | "true" | "on"));

        let front = integer::<u32>(data, FIELD_FRONT_LIFETIME, &mut errors)
            .and_then(|hours| lifetime(FIELD_FRONT_LIFETIME, hours, &mut errors));
        let back = integer::<u32>(data, FIELD_BACK_LIFETIME, &mut errors)
            .and_then(|hours| lifetime(FIELD_BACK_LIFETIME, hours, &mut errors));

        let samesite = match data.get(FIELD_SAMESITE).map(CookieSameSite::from_str) {
            Some(Ok(CookieSameSite::None)) if !self.ssl_enabled => {
                errors.push(FormError::new(
                    FIELD_SAMESITE,
                    "The SameSite=None attribute is only available in secure mode.",
                ));
                None
            }
            Some(Ok(value)) => Some(value),
            _ => {
                errors.push(FormError::new(
                    FIELD_SAMESITE,
                    "The cookie SameSite value must be Strict, Lax or None.",
                ));
                None
            }
        };

        let min_length = integer::<u32>(data, FIELD_PASSWORD_MIN_LENGTH, &mut errors).and_then(
            |length| {
                if (1..=MAX_PASSWORD_LENGTH).contains(&length) {
                    Some(length)
                } else {
                    errors.push(FormError::new(
                        FIELD_PASSWORD_MIN_LENGTH,
                        format!(
                            "The minimum password length must be between 1 and {}.",
                            MAX_PASSWORD_LENGTH
                        ),
                    ));
                    None
                }
            },
        );

        let max_length = integer::<u32>(data, FIELD_PASSWORD_MAX_LENGTH, &mut errors).and_then(
            |length| {
                let floor = min_length.unwrap_or(1);
                if (floor..=MAX_PASSWORD_LENGTH).contains(&length) {
                    Some(length)
                } else {
                    errors.push(FormError::new(
                        FIELD_PASSWORD_MAX_LENGTH,
                        format!(
                            "The maximum password length must be between {} and {}.",
                            floor, MAX_PASSWORD_LENGTH
                        ),
                    ));
                    None
                }
            },
        );

        let min_score = integer::<u8>(data, FIELD_PASSWORD_MIN_SCORE, &mut errors).and_then(
            |score| {
                if score <= MAX_PASSWORD_SCORE {
                    Some(score)
                } else {
                    errors.push(FormError::new(
                        FIELD_PASSWORD_MIN_SCORE,
                        format!(
                            "The minimum password score must be between 0 and {}.",
                            MAX_PASSWORD_SCORE
                        ),
                    ));
                    None
                }
            },
        );

        match (front, back, samesite, min_length, max_length, min_score) {
            (Some(front), Some(back), Some(samesite), Some(min), Some(max), Some(score))
                if errors.is_empty() =>
            {
                Ok(SecuritySettings {
                    check_cookie_ip_address: check_ip,
                    front_office_cookie_lifetime_hours: front,
                    back_office_cookie_lifetime_hours: back,
                    cookie_samesite: samesite,
                    password_minimum_length: min,
                    password_maximum_length: max,
                    password_minimum_score: score,
                })
            }
            _ => Err(errors),
        }
    }
}

fn integer<T: FromStr>(
    data: &SettingsFormData,
    field: &str,
    errors: &mut Vec<FormError>,
) -> Option<T> {
    match data.get(field).map(|v| v.trim().parse::<T>()) {
        Some(Ok(value)) => Some(value),
        _ => {
            errors.push(FormError::new(
                field,
                format!("The {} field must be a valid integer.", field),
            ));
            None
        }
    }
}

fn lifetime(field: &str, hours: u32, errors: &mut Vec<FormError>) -> Option<u32> {
    if (1..=MAX_COOKIE_LIFETIME_HOURS).contains(&hours) {
        return Some(hours);
    }
    errors.push(FormError::new(
        field,
        format!(
            "The cookie lifetime must be between 1 and {} hours.",
            MAX_COOKIE_LIFETIME_HOURS
        ),
    ));
    None
}

#[async_trait]
impl FormHandler for GeneralSettingsFormHandler {
    async fn get_form(&self) -> Result<SettingsForm, StoreError> {
        let settings = self.store.load_settings().await?;
        Ok(SettingsForm::new(
            FORM_NAME,
            CHECKBOXES,
            Self::to_data(&settings),
        ))
    }

    async fn save(&self, data: SettingsFormData) -> Result<Vec<FormError>, StoreError> {
        match self.validate(&data) {
            Ok(settings) => {
                self.store.save_settings(&settings).await?;
                tracing::info!(
                    samesite = %settings.cookie_samesite.as_str(),
                    back_office_lifetime = settings.back_office_cookie_lifetime_hours,
                    "Security settings updated"
                );
                Ok(Vec::new())
            }
            Err(errors) => {
                tracing::debug!(errors = errors.len(), "Security settings rejected");
                Ok(errors)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn handler(store: &MemoryStore, ssl_enabled: bool) -> GeneralSettingsFormHandler {
        GeneralSettingsFormHandler::new(Arc::new(store.clone()), ssl_enabled)
    }

    async fn submit(handler: &GeneralSettingsFormHandler, body: &str) -> Vec<FormError> {
        let mut form = handler.get_form().await.unwrap();
        form.handle_request(body.as_bytes());
        assert!(form.is_submitted());
        handler.save(form.data()).await.unwrap()
    }

    #[tokio::test]
    async fn test_form_is_populated_from_store() {
        let store = MemoryStore::new();
        let form = handler(&store, true).get_form().await.unwrap();
        let data = form.data();
        assert_eq!(data.get(FIELD_FRONT_LIFETIME), Some("480"));
        assert_eq!(data.get(FIELD_SAMESITE), Some("Lax"));
        assert_eq!(data.get(FIELD_CHECK_IP), Some("0"));
    }

    #[tokio::test]
    async fn test_valid_submission_is_persisted() {
        let store = MemoryStore::new();
        let handler = handler(&store, true);

        let errors = submit(
            &handler,
            "general[check_cookie_ip_address]=1&general[back_cookie_lifetime]=2\
             &general[cookie_samesite]=Strict&general[password_minimum_length]=10",
        )
        .await;
        assert!(errors.is_empty(), "{:?}", errors);

        let saved = store.load_settings().await.unwrap();
        assert!(saved.check_cookie_ip_address);
        assert_eq!(saved.back_office_cookie_lifetime_hours, 2);
        assert_eq!(saved.cookie_samesite, CookieSameSite::Strict);
        assert_eq!(saved.password_minimum_length, 10);
    }

    #[tokio::test]
    async fn test_every_invalid_field_is_reported_and_nothing_saved() {
        let store = MemoryStore::new();
        let handler = handler(&store, true);

        let errors = submit(
            &handler,
            "general[front_cookie_lifetime]=0&general[back_cookie_lifetime]=abc\
             &general[cookie_samesite]=Sometimes&general[password_minimum_score]=9",
        )
        .await;

        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                FIELD_FRONT_LIFETIME,
                FIELD_BACK_LIFETIME,
                FIELD_SAMESITE,
                FIELD_PASSWORD_MIN_SCORE
            ]
        );
        assert_eq!(
            store.load_settings().await.unwrap(),
            SecuritySettings::default()
        );
    }

    #[tokio::test]
    async fn test_maximum_length_below_minimum_is_rejected() {
        let store = MemoryStore::new();
        let errors = submit(
            &handler(&store, true),
            "general[password_minimum_length]=20&general[password_maximum_length]=12",
        )
        .await;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, FIELD_PASSWORD_MAX_LENGTH);
    }

    #[tokio::test]
    async fn test_samesite_none_requires_ssl() {
        let store = MemoryStore::new();

        let errors = submit(&handler(&store, false), "general[cookie_samesite]=None").await;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, FIELD_SAMESITE);

        let errors = submit(&handler(&store, true), "general[cookie_samesite]=None").await;
        assert!(errors.is_empty());
        assert_eq!(
            store.load_settings().await.unwrap().cookie_samesite,
            CookieSameSite::None
        );
    }

    #[tokio::test]
    async fn test_unchecked_checkbox_clears_the_flag() {
        let store = MemoryStore::new();
        store
            .save_settings(&SecuritySettings {
                check_cookie_ip_address: true,
                ..SecuritySettings::default()
            })
            .await
            .unwrap();

        let errors = submit(&handler(&store, true), "general[back_cookie_lifetime]=1").await;
        assert!(errors.is_empty());
        assert!(!store.load_settings().await.unwrap().check_cookie_ip_address);
    }
}
