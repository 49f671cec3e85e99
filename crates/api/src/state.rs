//! Shared application state

use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use backoffice_shared::{create_pool, run_migrations, SessionKind};

use crate::auth::{JwtManager, ResourceTag};
use crate::bus::CommandBus;
use crate::config::{Config, StorageBackend};
use crate::flash::FlashCodec;
use crate::forms::{FormHandler, GeneralSettingsFormHandler};
use crate::grid::SessionGridFactory;
use crate::hooks::HookDispatcher;
use crate::i18n::Translator;
use crate::store::{MemoryStore, PgStore, SessionStore, SettingsStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<dyn SessionStore>,
    pub bus: CommandBus,
    pub general_form: Arc<dyn FormHandler>,
    pub employee_grid: SessionGridFactory,
    pub customer_grid: SessionGridFactory,
    pub hooks: HookDispatcher,
    pub translator: Translator,
    pub flash: FlashCodec,
    pub jwt: JwtManager,
    pub resource_tag: ResourceTag,
}

impl AppState {
    /// Connect the configured storage backend and wire every collaborator
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let translator = match &config.translations_path {
            Some(path) => Translator::from_file(path)
                .with_context(|| format!("Loading translations from {}", path))?,
            None => Translator::new(),
        };

        let state = match config.storage_backend {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required for the postgres backend")?;
                let pool = create_pool(url, config.database_max_connections)
                    .await
                    .context("Connecting to the database")?;
                run_migrations(&pool)
                    .await
                    .context("Running database migrations")?;
                tracing::info!("Database ready");

                Self::with_stores(config, Arc::new(PgStore::new(pool)))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Self::with_stores(config, Arc::new(MemoryStore::new()))
            }
        };

        Ok(state.with_translator(translator))
    }

    /// State backed by one store serving both sessions and settings
    pub fn with_stores<S>(config: Config, store: Arc<S>) -> Self
    where
        S: SessionStore + SettingsStore + 'static,
    {
        let sessions: Arc<dyn SessionStore> = store.clone();
        let settings: Arc<dyn SettingsStore> = store;

        Self {
            bus: CommandBus::for_sessions(sessions.clone()),
            general_form: Arc::new(GeneralSettingsFormHandler::new(
                settings,
                config.ssl_enabled,
            )),
            employee_grid: SessionGridFactory::new(SessionKind::Employee, sessions.clone()),
            customer_grid: SessionGridFactory::new(SessionKind::Customer, sessions.clone()),
            sessions,
            hooks: HookDispatcher::new(),
            translator: Translator::new(),
            flash: FlashCodec::new(&config.flash_secret, config.ssl_enabled),
            jwt: JwtManager::new(&config.jwt_secret, config.jwt_expiry_hours),
            resource_tag: ResourceTag::new(&config.resource_tag),
            config: Arc::new(config),
        }
    }

    pub fn with_bus(mut self, bus: CommandBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_hooks(mut self, hooks: HookDispatcher) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.translator = translator;
        self
    }
}

impl FromRef<AppState> for ResourceTag {
    fn from_ref(state: &AppState) -> Self {
        state.resource_tag.clone()
    }
}

impl FromRef<AppState> for FlashCodec {
    fn from_ref(state: &AppState) -> Self {
        state.flash.clone()
    }
}

impl FromRef<AppState> for JwtManager {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
