//! Session command handlers

use std::sync::Arc;

use async_trait::async_trait;
use backoffice_shared::{SessionCommand, SessionError, SessionId, SessionKind};

use super::{CommandError, CommandHandler};
use crate::store::SessionStore;

async fn delete_one(
    store: &dyn SessionStore,
    kind: SessionKind,
    session_id: SessionId,
) -> Result<(), CommandError> {
    if !store.delete_session(kind, session_id).await? {
        return Err(SessionError::NotFound(session_id).into());
    }
    tracing::info!(%session_id, kind = %kind, "Session deleted");
    Ok(())
}

pub struct DeleteEmployeeSessionHandler {
    store: Arc<dyn SessionStore>,
}

impl DeleteEmployeeSessionHandler {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CommandHandler for DeleteEmployeeSessionHandler {
    async fn handle(&self, command: SessionCommand) -> Result<(), CommandError> {
        match command {
            SessionCommand::DeleteEmployeeSession(cmd) => {
                delete_one(self.store.as_ref(), SessionKind::Employee, cmd.session_id).await
            }
            other => Err(CommandError::UnexpectedCommand(other.kind())),
        }
    }
}

pub struct DeleteCustomerSessionHandler {
    store: Arc<dyn SessionStore>,
}

impl DeleteCustomerSessionHandler {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CommandHandler for DeleteCustomerSessionHandler {
    async fn handle(&self, command: SessionCommand) -> Result<(), CommandError> {
        match command {
            SessionCommand::DeleteCustomerSession(cmd) => {
                delete_one(self.store.as_ref(), SessionKind::Customer, cmd.session_id).await
            }
            other => Err(CommandError::UnexpectedCommand(other.kind())),
        }
    }
}

pub struct BulkDeleteCustomerSessionsHandler {
    store: Arc<dyn SessionStore>,
}

impl BulkDeleteCustomerSessionsHandler {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CommandHandler for BulkDeleteCustomerSessionsHandler {
    async fn handle(&self, command: SessionCommand) -> Result<(), CommandError> {
        let cmd = match command {
            SessionCommand::BulkDeleteCustomerSessions(cmd) => cmd,
            other => return Err(CommandError::UnexpectedCommand(other.kind())),
        };

        let ids = cmd.session_ids();
        if ids.is_empty() {
            tracing::debug!("Empty bulk delete, nothing to do");
            return Ok(());
        }

        let missing = self.store.delete_sessions(SessionKind::Customer, ids).await?;
        if !missing.is_empty() {
            return Err(SessionError::CannotBulkDelete(missing).into());
        }

        tracing::info!(count = ids.len(), "Customer sessions deleted");
        Ok(())
    }
}
