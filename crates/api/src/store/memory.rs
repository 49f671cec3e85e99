//! In-memory store backend
//!
//! Keeps sessions in ordered maps behind tokio locks. Used by the `memory`
//! storage backend and by tests.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use backoffice_shared::{SecuritySettings, SessionId, SessionKind, SessionRecord};
use tokio::sync::RwLock;

use super::{
    SessionColumn, SessionPage, SessionSearch, SessionStore, SettingsStore, SortOrder, StoreError,
};

type SessionTable = Arc<RwLock<BTreeMap<SessionId, SessionRecord>>>;

#[derive(Clone, Default)]
pub struct MemoryStore {
    employee_sessions: SessionTable,
    customer_sessions: SessionTable,
    settings: Arc<RwLock<SecuritySettings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: SessionKind) -> &SessionTable {
        match kind {
            SessionKind::Employee => &self.employee_sessions,
            SessionKind::Customer => &self.customer_sessions,
        }
    }

    /// Insert or replace a session record
    pub async fn insert_session(&self, kind: SessionKind, record: SessionRecord) {
        self.table(kind)
            .write()
            .await
            .insert(record.session_id, record);
    }

    pub async fn contains_session(&self, kind: SessionKind, id: SessionId) -> bool {
        self.table(kind).read().await.contains_key(&id)
    }

    pub async fn session_count(&self, kind: SessionKind) -> usize {
        self.table(kind).read().await.len()
    }
}

fn contains_ignore_case(haystack: &str, needle: &Option<String>) -> bool {
    match needle {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

fn matches(record: &SessionRecord, search: &SessionSearch) -> bool {
    search.session_id.map_or(true, |id| record.session_id == id)
        && search.owner_id.map_or(true, |id| record.owner_id == id)
        && contains_ignore_case(&record.firstname, &search.firstname)
        && contains_ignore_case(&record.lastname, &search.lastname)
        && contains_ignore_case(&record.email, &search.email)
}

fn compare(a: &SessionRecord, b: &SessionRecord, column: SessionColumn) -> Ordering {
    match column {
        SessionColumn::SessionId => a.session_id.cmp(&b.session_id),
        SessionColumn::OwnerId => a.owner_id.cmp(&b.owner_id),
        SessionColumn::Firstname => a.firstname.cmp(&b.firstname),
        SessionColumn::Lastname => a.lastname.cmp(&b.lastname),
        SessionColumn::Email => a.email.cmp(&b.email),
        SessionColumn::LastActivity => a.last_activity.cmp(&b.last_activity),
    }
    .then_with(|| a.session_id.cmp(&b.session_id))
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn search_sessions(
        &self,
        kind: SessionKind,
        search: &SessionSearch,
    ) -> Result<SessionPage, StoreError> {
        let table = self.table(kind).read().await;

        let mut records: Vec<SessionRecord> = table
            .values()
            .filter(|record| matches(record, search))
            .cloned()
            .collect();

        records.sort_by(|a, b| {
            let ordering = compare(a, b, search.order_by);
            match search.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = records.len() as u64;
        let records = records
            .into_iter()
            .skip(search.offset as usize)
            .take(search.limit as usize)
            .collect();

        Ok(SessionPage { records, total })
    }

    async fn delete_session(&self, kind: SessionKind, id: SessionId) -> Result<bool, StoreError> {
        Ok(self.table(kind).write().await.remove(&id).is_some())
    }

    async fn delete_sessions(
        &self,
        kind: SessionKind,
        ids: &[SessionId],
    ) -> Result<Vec<SessionId>, StoreError> {
        let mut table = self.table(kind).write().await;

        let missing: Vec<SessionId> = ids
            .iter()
            .copied()
            .filter(|id| !table.contains_key(id))
            .collect();

        if missing.is_empty() {
            for id in ids {
                table.remove(id);
            }
        }

        Ok(missing)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load_settings(&self) -> Result<SecuritySettings, StoreError> {
        Ok(self.settings.read().await.clone())
    }

    async fn save_settings(&self, settings: &SecuritySettings) -> Result<(), StoreError> {
        *self.settings.write().await = settings.clone();
        Ok(())
    }
}
