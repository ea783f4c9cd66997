//! Store contracts for reading and mutating persisted combat state.

use std::time::Duration;

use async_trait::async_trait;
use combat_core::{
    CombatantState, ItemId, ItemInstance, ItemKey, LocationId, NpcKey, PlayerId,
};

use super::error::Result;
use super::types::{LockKey, NpcRow};

/// Source of transactions over persisted combatants, items, cooldowns and
/// open-world NPC rows.
#[async_trait]
pub trait Store: Send + Sync {
    /// Start a transaction. No locks are taken until the transaction asks.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// One atomic unit of work.
///
/// Writes are invisible to other transactions until [`commit`]. Dropping a
/// transaction without committing discards its writes and releases its locks.
///
/// Every mutation locks the row it touches (items lock their owner's row), so
/// a transaction never writes a row another transaction holds.
///
/// [`commit`]: StoreTransaction::commit
#[async_trait]
pub trait StoreTransaction: Send {
    /// Acquire the exclusive lock on `key` for the rest of this transaction.
    ///
    /// Re-locking a key already held is a no-op. Waiting longer than the
    /// store's lock timeout fails with [`StoreError::LockTimeout`].
    ///
    /// [`StoreError::LockTimeout`]: super::StoreError::LockTimeout
    async fn lock(&mut self, key: LockKey) -> Result<()>;

    /// Read a combatant row, optionally locking it first.
    async fn combatant(&mut self, id: PlayerId, lock_for_update: bool) -> Result<CombatantState>;

    /// List the items in a combatant's inventory, optionally locking the owner first.
    async fn inventory(&mut self, id: PlayerId, lock_for_update: bool) -> Result<Vec<ItemInstance>>;

    /// Add `delta` to the combatant's health, clamped to `[0, max_health]`.
    ///
    /// Returns the new health.
    async fn mutate_health(&mut self, id: PlayerId, delta: i64) -> Result<u32>;

    /// Lower an item's durability by `n`.
    ///
    /// Returns the remaining durability, or `None` for items that never wear.
    async fn decrement_durability(&mut self, item: ItemId, n: u32) -> Result<Option<u32>>;

    async fn delete_item(&mut self, item: ItemId) -> Result<()>;

    /// Create an unowned item instance.
    async fn create_item(&mut self, template: &ItemKey, durability: Option<u32>) -> Result<ItemInstance>;

    async fn add_item_to_inventory(&mut self, owner: PlayerId, item: ItemId) -> Result<()>;

    /// Move an item out of any inventory onto the ground at `location`.
    async fn drop_to_ground(&mut self, location: LocationId, item: ItemId) -> Result<()>;

    async fn set_in_combat(&mut self, id: PlayerId, in_combat: bool) -> Result<()>;

    /// Remaining time on a cooldown, `None` when it is not active.
    async fn cooldown(&mut self, id: PlayerId, key: &str) -> Result<Option<Duration>>;

    /// Start (or restart) a cooldown that expires after `duration`.
    async fn set_cooldown(&mut self, id: PlayerId, key: &str, duration: Duration) -> Result<()>;

    async fn clear_cooldown(&mut self, id: PlayerId, key: &str) -> Result<()>;

    /// Increment the kill counter (or boss kill counter) and award XP.
    async fn credit_kill(&mut self, id: PlayerId, xp: u32, boss: bool) -> Result<()>;

    async fn record_death(&mut self, id: PlayerId) -> Result<()>;

    /// Read the NPC spawned at a location, optionally locking its row.
    async fn spawned_npc(&mut self, location: LocationId, lock_for_update: bool) -> Result<Option<NpcRow>>;

    /// Spawn an NPC at full health, replacing any NPC already there.
    async fn spawn_npc(&mut self, location: LocationId, npc: &NpcKey, health: u32) -> Result<NpcRow>;

    /// Subtract `amount` from the spawned NPC's health. Returns the remaining health.
    async fn damage_npc(&mut self, location: LocationId, amount: u32) -> Result<u32>;

    async fn despawn_npc(&mut self, location: LocationId) -> Result<()>;

    /// Apply every staged write atomically and release all locks.
    async fn commit(&mut self) -> Result<()>;

    /// Discard staged writes and release all locks.
    async fn rollback(&mut self) -> Result<()>;
}
