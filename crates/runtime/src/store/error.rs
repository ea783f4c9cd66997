//! Error types raised by store implementations.

use combat_core::{CombatError, ErrorSeverity, ItemId, LocationId, PlayerId};
use thiserror::Error;

use super::types::LockKey;

/// Errors surfaced by store implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("timed out waiting for the lock on {0}")]
    LockTimeout(LockKey),

    #[error("combatant {0} does not exist")]
    CombatantNotFound(PlayerId),

    #[error("item {0} does not exist")]
    ItemNotFound(ItemId),

    #[error("no NPC is spawned at {0}")]
    NpcNotFound(LocationId),

    #[error("store lock was poisoned")]
    LockPoisoned,

    #[error("transaction was already committed or rolled back")]
    TransactionFinished,
}

impl StoreError {
    /// Another operation held the row longer than the lock timeout.
    pub fn is_contention(&self) -> bool {
        matches!(self, StoreError::LockTimeout(_))
    }
}

impl CombatError for StoreError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            StoreError::LockTimeout(_) => ErrorSeverity::Recoverable,
            StoreError::ItemNotFound(_) => ErrorSeverity::Validation,
            StoreError::CombatantNotFound(_)
            | StoreError::NpcNotFound(_)
            | StoreError::TransactionFinished => ErrorSeverity::Internal,
            StoreError::LockPoisoned => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            StoreError::LockTimeout(_) => "STORE_LOCK_TIMEOUT",
            StoreError::CombatantNotFound(_) => "STORE_COMBATANT_NOT_FOUND",
            StoreError::ItemNotFound(_) => "STORE_ITEM_NOT_FOUND",
            StoreError::NpcNotFound(_) => "STORE_NPC_NOT_FOUND",
            StoreError::LockPoisoned => "STORE_LOCK_POISONED",
            StoreError::TransactionFinished => "STORE_TRANSACTION_FINISHED",
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
