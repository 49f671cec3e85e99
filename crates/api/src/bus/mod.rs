//! Command bus
//!
//! Routes each [`SessionCommand`] to the handler registered for its
//! [`CommandKind`] and runs it to completion. Failures come back as values:
//! the session error family is kept apart from everything else so callers can
//! catch the former and let the rest propagate.

mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use backoffice_shared::{CommandKind, SessionCommand, SessionError};

use crate::store::{SessionStore, StoreError};

pub use handlers::{
    BulkDeleteCustomerSessionsHandler, DeleteCustomerSessionHandler, DeleteEmployeeSessionHandler,
};

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("No handler registered for command {0}")]
    NoHandler(CommandKind),
    #[error("Handler received unexpected command {0}")]
    UnexpectedCommand(CommandKind),
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, command: SessionCommand) -> Result<(), CommandError>;
}

/// Registry of command handlers keyed by command kind
#[derive(Clone, Default)]
pub struct CommandBus {
    handlers: HashMap<CommandKind, Arc<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus wired with the session handlers backed by `store`
    pub fn for_sessions(store: Arc<dyn SessionStore>) -> Self {
        Self::new()
            .register(
                CommandKind::DeleteEmployeeSession,
                Arc::new(DeleteEmployeeSessionHandler::new(store.clone())),
            )
            .register(
                CommandKind::DeleteCustomerSession,
                Arc::new(DeleteCustomerSessionHandler::new(store.clone())),
            )
            .register(
                CommandKind::BulkDeleteCustomerSessions,
                Arc::new(BulkDeleteCustomerSessionsHandler::new(store)),
            )
    }

    /// Register (or replace) the handler for a command kind
    pub fn register(mut self, kind: CommandKind, handler: Arc<dyn CommandHandler>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub async fn handle(&self, command: SessionCommand) -> Result<(), CommandError> {
        let kind = command.kind();
        let handler = self
            .handlers
            .get(&kind)
            .ok_or(CommandError::NoHandler(kind))?;

        tracing::debug!(command = %kind, "Dispatching command");
        let result = handler.handle(command).await;
        match &result {
            Ok(()) => tracing::info!(command = %kind, "Command handled"),
            Err(CommandError::Session(err)) => {
                tracing::warn!(command = %kind, error = %err, "Command rejected")
            }
            Err(err) => tracing::error!(command = %kind, error = %err, "Command failed"),
        }
        result
    }
}
