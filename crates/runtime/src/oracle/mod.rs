//! Runtime wrappers around static combat content.
//!
//! These implementations expose the `combat-core` oracle traits and bundle
//! them, with the balance tables, into an [`OracleManager`] that duels and
//! open-world actions share. The data is immutable at runtime; dynamic state
//! lives in the [`Store`](crate::store::Store).
mod items;
mod npc;

use std::sync::Arc;

use combat_content::LoadedContent;
use combat_core::{Catalog, CombatConfig};

pub use items::ItemOracleImpl;
pub use npc::NpcOracleImpl;

/// Manages all oracle implementations and provides unified access
#[derive(Clone)]
pub struct OracleManager {
    pub(crate) items: Arc<ItemOracleImpl>,
    pub(crate) npcs: Arc<NpcOracleImpl>,
    pub(crate) config: Arc<CombatConfig>,
}

impl OracleManager {
    pub fn new(items: Arc<ItemOracleImpl>, npcs: Arc<NpcOracleImpl>, config: Arc<CombatConfig>) -> Self {
        Self { items, npcs, config }
    }

    /// Build oracles from content loaded by `combat-content`.
    pub fn from_content(content: LoadedContent) -> Self {
        Self::new(
            Arc::new(content.items.into_iter().collect()),
            Arc::new(content.npcs.into_iter().collect()),
            Arc::new(content.config),
        )
    }

    /// Borrow both oracles as a core [`Catalog`].
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self.items.as_ref(), self.npcs.as_ref())
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }
}
