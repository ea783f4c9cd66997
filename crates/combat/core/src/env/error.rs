//! Catalog access errors.

use crate::error::{CombatError, ErrorSeverity};
use crate::state::{ItemKey, NpcKey};

/// Errors raised when a key cannot be resolved against the catalogs.
///
/// A dangling key means content and persisted data disagree, which the rules
/// cannot work around.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("item template '{0}' not found")]
    ItemNotFound(ItemKey),

    #[error("npc template '{0}' not found")]
    NpcNotFound(NpcKey),

    #[error("item template '{key}' is not a {expected}")]
    WrongKind { key: ItemKey, expected: &'static str },
}

impl CombatError for CatalogError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ItemNotFound(_) => "CATALOG_ITEM_NOT_FOUND",
            Self::NpcNotFound(_) => "CATALOG_NPC_NOT_FOUND",
            Self::WrongKind { .. } => "CATALOG_WRONG_KIND",
        }
    }
}
