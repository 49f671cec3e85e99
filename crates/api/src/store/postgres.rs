//! Postgres store backend

use async_trait::async_trait;
use backoffice_shared::{SecuritySettings, SessionId, SessionKind, SessionRecord};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{
    settings_from_entries, settings_to_entries, SessionColumn, SessionPage, SessionSearch,
    SessionStore, SettingsStore, SortOrder, StoreError, SETTINGS_KEYS,
};

/// Table and column names for one session population
struct SessionTables {
    sessions: &'static str,
    session_id: &'static str,
    owners: &'static str,
    owner_id: &'static str,
}

fn tables(kind: SessionKind) -> SessionTables {
    match kind {
        SessionKind::Employee => SessionTables {
            sessions: "employee_sessions",
            session_id: "id_employee_session",
            owners: "employees",
            owner_id: "id_employee",
        },
        SessionKind::Customer => SessionTables {
            sessions: "customer_sessions",
            session_id: "id_customer_session",
            owners: "customers",
            owner_id: "id_customer",
        },
    }
}

fn order_expression(t: &SessionTables, column: SessionColumn) -> String {
    match column {
        SessionColumn::SessionId => format!("s.{}", t.session_id),
        SessionColumn::OwnerId => format!("s.{}", t.owner_id),
        SessionColumn::Firstname => "o.firstname".to_string(),
        SessionColumn::Lastname => "o.lastname".to_string(),
        SessionColumn::Email => "o.email".to_string(),
        SessionColumn::LastActivity => "s.date_upd".to_string(),
    }
}

/// Escape LIKE wildcards in user input
fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, t: &SessionTables, search: &SessionSearch) {
    if let Some(id) = search.session_id {
        qb.push(format!(" AND s.{} = ", t.session_id)).push_bind(id.get());
    }
    if let Some(owner_id) = search.owner_id {
        qb.push(format!(" AND s.{} = ", t.owner_id)).push_bind(owner_id);
    }
    if let Some(firstname) = &search.firstname {
        qb.push(" AND o.firstname ILIKE ").push_bind(like_pattern(firstname));
    }
    if let Some(lastname) = &search.lastname {
        qb.push(" AND o.lastname ILIKE ").push_bind(like_pattern(lastname));
    }
    if let Some(email) = &search.email {
        qb.push(" AND o.email ILIKE ").push_bind(like_pattern(email));
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn search_sessions(
        &self,
        kind: SessionKind,
        search: &SessionSearch,
    ) -> Result<SessionPage, StoreError> {
        let t = tables(kind);
        let from = format!(
            " FROM {sessions} s JOIN {owners} o ON o.{owner_id} = s.{owner_id} WHERE TRUE",
            sessions = t.sessions,
            owners = t.owners,
            owner_id = t.owner_id,
        );

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count_qb.push(&from);
        push_filters(&mut count_qb, &t, search);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT s.{} AS session_id, s.{} AS owner_id, o.firstname, o.lastname, o.email, \
             s.date_upd AS last_activity",
            t.session_id, t.owner_id
        ));
        qb.push(&from);
        push_filters(&mut qb, &t, search);
        // Order column comes from a fixed whitelist, never from user input
        qb.push(format!(
            " ORDER BY {} {}, s.{} ASC",
            order_expression(&t, search.order_by),
            match search.sort_order {
                SortOrder::Asc => "ASC",
                SortOrder::Desc => "DESC",
            },
            t.session_id
        ));
        qb.push(" LIMIT ").push_bind(i64::from(search.limit));
        qb.push(" OFFSET ").push_bind(i64::from(search.offset));

        let records: Vec<SessionRecord> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(SessionPage {
            records,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn delete_session(&self, kind: SessionKind, id: SessionId) -> Result<bool, StoreError> {
        let t = tables(kind);
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE {} = $1",
            t.sessions, t.session_id
        ))
        .bind(id.get())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_sessions(
        &self,
        kind: SessionKind,
        ids: &[SessionId],
    ) -> Result<Vec<SessionId>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let t = tables(kind);
        let raw_ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();

        let mut tx = self.pool.begin().await?;
        let deleted: Vec<i64> = sqlx::query_scalar(&format!(
            "DELETE FROM {sessions} WHERE {id} = ANY($1) RETURNING {id}",
            sessions = t.sessions,
            id = t.session_id,
        ))
        .bind(&raw_ids)
        .fetch_all(&mut *tx)
        .await?;

        let missing: Vec<SessionId> = ids
            .iter()
            .copied()
            .filter(|id| !deleted.contains(&id.get()))
            .collect();

        if missing.is_empty() {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }

        Ok(missing)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn load_settings(&self) -> Result<SecuritySettings, StoreError> {
        let keys: Vec<String> = SETTINGS_KEYS.iter().map(|k| k.to_string()).collect();
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT name, value FROM configuration WHERE name = ANY($1)")
                .bind(&keys)
                .fetch_all(&self.pool)
                .await?;

        settings_from_entries(rows)
    }

    async fn save_settings(&self, settings: &SecuritySettings) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for (name, value) in settings_to_entries(settings) {
            sqlx::query(
                r#"
                INSERT INTO configuration (name, value, date_upd)
                VALUES ($1, $2, NOW())
                ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value, date_upd = NOW()
                "#,
            )
            .bind(name)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
