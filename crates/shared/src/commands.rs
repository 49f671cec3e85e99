//! Commands accepted by the session command bus

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::SessionId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteEmployeeSessionCommand {
    pub session_id: SessionId,
}

impl DeleteEmployeeSessionCommand {
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCustomerSessionCommand {
    pub session_id: SessionId,
}

impl DeleteCustomerSessionCommand {
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id }
    }
}

/// Ordered batch of customer sessions to delete. May be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeleteCustomerSessionsCommand {
    session_ids: Vec<SessionId>,
}

impl BulkDeleteCustomerSessionsCommand {
    /// Builds the batch, keeping the first occurrence of repeated ids.
    pub fn new(session_ids: impl IntoIterator<Item = SessionId>) -> Self {
        let mut seen = HashSet::new();
        let session_ids = session_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();
        Self { session_ids }
    }

    pub fn session_ids(&self) -> &[SessionId] {
        &self.session_ids
    }
}

/// Closed set of commands the bus can dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionCommand {
    DeleteEmployeeSession(DeleteEmployeeSessionCommand),
    DeleteCustomerSession(DeleteCustomerSessionCommand),
    BulkDeleteCustomerSessions(BulkDeleteCustomerSessionsCommand),
}

impl SessionCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            SessionCommand::DeleteEmployeeSession(_) => CommandKind::DeleteEmployeeSession,
            SessionCommand::DeleteCustomerSession(_) => CommandKind::DeleteCustomerSession,
            SessionCommand::BulkDeleteCustomerSessions(_) => {
                CommandKind::BulkDeleteCustomerSessions
            }
        }
    }
}

impl From<DeleteEmployeeSessionCommand> for SessionCommand {
    fn from(command: DeleteEmployeeSessionCommand) -> Self {
        SessionCommand::DeleteEmployeeSession(command)
    }
}

impl From<DeleteCustomerSessionCommand> for SessionCommand {
    fn from(command: DeleteCustomerSessionCommand) -> Self {
        SessionCommand::DeleteCustomerSession(command)
    }
}

impl From<BulkDeleteCustomerSessionsCommand> for SessionCommand {
    fn from(command: BulkDeleteCustomerSessionsCommand) -> Self {
        SessionCommand::BulkDeleteCustomerSessions(command)
    }
}

/// Tag identifying a command variant; the key of the handler registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    DeleteEmployeeSession,
    DeleteCustomerSession,
    BulkDeleteCustomerSessions,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::DeleteEmployeeSession => "delete_employee_session",
            CommandKind::DeleteCustomerSession => "delete_customer_session",
            CommandKind::BulkDeleteCustomerSessions => "bulk_delete_customer_sessions",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i64]) -> Vec<SessionId> {
        raw.iter().map(|r| SessionId::new(*r).unwrap()).collect()
    }

    #[test]
    fn test_bulk_command_keeps_order_and_drops_repeats() {
        let command = BulkDeleteCustomerSessionsCommand::new(ids(&[5, 2, 5, 9, 2]));
        assert_eq!(command.session_ids(), ids(&[5, 2, 9]).as_slice());
    }

    #[test]
    fn test_bulk_command_accepts_empty_batch() {
        let command = BulkDeleteCustomerSessionsCommand::new(Vec::new());
        assert!(command.session_ids().is_empty());
    }

    #[test]
    fn test_command_kind_matches_variant() {
        let id = SessionId::new(1).unwrap();
        assert_eq!(
            SessionCommand::from(DeleteEmployeeSessionCommand::new(id)).kind(),
            CommandKind::DeleteEmployeeSession
        );
        assert_eq!(
            SessionCommand::from(DeleteCustomerSessionCommand::new(id)).kind(),
            CommandKind::DeleteCustomerSession
        );
        assert_eq!(
            SessionCommand::from(BulkDeleteCustomerSessionsCommand::new(vec![id])).kind(),
            CommandKind::BulkDeleteCustomerSessions
        );
    }
}
