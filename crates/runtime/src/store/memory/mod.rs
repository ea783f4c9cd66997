//! In-memory [`Store`](super::Store) implementation for tests and local runs.
//!
//! Rows live in plain maps behind a `std::sync::Mutex` that is only held for
//! the duration of a copy. Exclusive access across `await` points comes from
//! per-row `tokio::sync::Mutex` locks owned by the transaction.

mod transaction;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use combat_core::{
    CombatantState, ItemId, ItemInstance, ItemKey, ItemLocation, LocationId, NpcKey, PlayerId,
};
use tokio::time::Instant;

use super::error::{Result, StoreError};
use super::traits::{Store, StoreTransaction};
use super::types::{LockKey, NpcRow};

pub use transaction::MemoryTransaction;

#[derive(Debug, Clone)]
pub(crate) struct ItemRecord {
    pub(crate) instance: ItemInstance,
    /// `None` until a freshly created item is placed somewhere.
    pub(crate) location: Option<ItemLocation>,
}

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) combatants: HashMap<PlayerId, CombatantState>,
    pub(crate) items: HashMap<ItemId, ItemRecord>,
    pub(crate) cooldowns: HashMap<(PlayerId, String), Instant>,
    pub(crate) npcs: HashMap<LocationId, NpcRow>,
}

pub(crate) struct Shared {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<LockKey, Arc<tokio::sync::Mutex<()>>>>,
    next_item: AtomicU64,
    pub(crate) lock_timeout: Duration,
}

impl Shared {
    pub(crate) fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::LockPoisoned)
    }

    pub(crate) fn row_lock(&self, key: LockKey) -> Result<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self.row_locks.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(Arc::clone(locks.entry(key).or_default()))
    }

    /// Forget the given row locks once nobody holds or waits on them.
    ///
    /// A waiter that timed out leaves its entry behind until the row is
    /// next released.
    pub(crate) fn release_row_locks(&self, keys: impl IntoIterator<Item = LockKey>) {
        let Ok(mut locks) = self.row_locks.lock() else {
            return;
        };
        for key in keys {
            if locks.get(&key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
                locks.remove(&key);
            }
        }
    }

    pub(crate) fn allocate_item_id(&self) -> ItemId {
        ItemId(self.next_item.fetch_add(1, Ordering::Relaxed))
    }
}

/// Cloneable handle to a shared in-memory store.
#[derive(Clone)]
pub struct InMemoryStore {
    shared: Arc<Shared>,
}

impl InMemoryStore {
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new() -> Self {
        Self::with_lock_timeout(Self::DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: Mutex::new(Tables::default()),
                row_locks: Mutex::new(HashMap::new()),
                next_item: AtomicU64::new(1),
                lock_timeout,
            }),
        }
    }

    /// Insert or replace a combatant row.
    pub fn insert_combatant(&self, row: CombatantState) -> Result<()> {
        self.shared.tables()?.combatants.insert(row.id, row);
        Ok(())
    }

    /// Put a new item straight into a player's inventory.
    pub fn give_item(
        &self,
        owner: PlayerId,
        template: impl Into<ItemKey>,
        durability: Option<u32>,
        equipped: bool,
    ) -> Result<ItemId> {
        let id = self.shared.allocate_item_id();
        let mut instance = ItemInstance::new(id, template.into(), durability);
        instance.equipped = equipped;

        let mut tables = self.shared.tables()?;
        if !tables.combatants.contains_key(&owner) {
            return Err(StoreError::CombatantNotFound(owner));
        }
        tables.items.insert(
            id,
            ItemRecord {
                instance,
                location: Some(ItemLocation::Inventory(owner)),
            },
        );
        Ok(id)
    }

    /// Spawn an open-world NPC outside any transaction.
    pub fn spawn(&self, location: LocationId, npc: impl Into<NpcKey>, health: u32) -> Result<()> {
        self.shared.tables()?.npcs.insert(
            location,
            NpcRow {
                location,
                npc: npc.into(),
                health,
                max_health: health,
            },
        );
        Ok(())
    }

    pub fn combatant_row(&self, id: PlayerId) -> Result<Option<CombatantState>> {
        Ok(self.shared.tables()?.combatants.get(&id).cloned())
    }

    pub fn inventory_of(&self, owner: PlayerId) -> Result<Vec<ItemInstance>> {
        self.items_at(ItemLocation::Inventory(owner))
    }

    pub fn ground_items(&self, location: LocationId) -> Result<Vec<ItemInstance>> {
        self.items_at(ItemLocation::Ground(location))
    }

    pub fn npc_row(&self, location: LocationId) -> Result<Option<NpcRow>> {
        Ok(self.shared.tables()?.npcs.get(&location).cloned())
    }

    pub fn cooldown_remaining(&self, id: PlayerId, key: &str) -> Result<Option<Duration>> {
        let tables = self.shared.tables()?;
        Ok(tables
            .cooldowns
            .get(&(id, key.to_owned()))
            .and_then(|expires| remaining(*expires)))
    }

    #[cfg(test)]
    fn row_lock_count(&self) -> usize {
        self.shared.row_locks.lock().map_or(0, |locks| locks.len())
    }

    fn items_at(&self, location: ItemLocation) -> Result<Vec<ItemInstance>> {
        let tables = self.shared.tables()?;
        let mut items: Vec<ItemInstance> = tables
            .items
            .values()
            .filter(|r| r.location == Some(location))
            .map(|r| r.instance.clone())
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        Ok(Box::new(MemoryTransaction::new(Arc::clone(&self.shared))))
    }
}

/// Time left before `expires`, `None` once it has passed.
pub(crate) fn remaining(expires: Instant) -> Option<Duration> {
    let left = expires.saturating_duration_since(Instant::now());
    (!left.is_zero()).then_some(left)
}
