use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use combat_core::{
    CombatantState, ItemId, ItemInstance, ItemKey, ItemLocation, LocationId, NpcKey, PlayerId,
};
use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;
use tracing::trace;

use super::{ItemRecord, Shared, remaining};
use crate::store::error::{Result, StoreError};
use crate::store::traits::StoreTransaction;
use crate::store::types::{LockKey, NpcRow};

/// Transaction over an [`InMemoryStore`](super::InMemoryStore).
///
/// Writes are staged in overlays keyed like the shared tables. A `None`
/// overlay entry marks a deleted row.
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    held: HashMap<LockKey, OwnedMutexGuard<()>>,
    combatants: HashMap<PlayerId, CombatantState>,
    items: HashMap<ItemId, Option<ItemRecord>>,
    cooldowns: HashMap<(PlayerId, String), Option<Instant>>,
    npcs: HashMap<LocationId, Option<NpcRow>>,
    finished: bool,
}

impl MemoryTransaction {
    pub(super) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            held: HashMap::new(),
            combatants: HashMap::new(),
            items: HashMap::new(),
            cooldowns: HashMap::new(),
            npcs: HashMap::new(),
            finished: false,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.finished {
            return Err(StoreError::TransactionFinished);
        }
        Ok(())
    }

    fn read_combatant(&self, id: PlayerId) -> Result<CombatantState> {
        if let Some(row) = self.combatants.get(&id) {
            return Ok(row.clone());
        }
        self.shared
            .tables()?
            .combatants
            .get(&id)
            .cloned()
            .ok_or(StoreError::CombatantNotFound(id))
    }

    /// Staged copy of a combatant row. The caller must hold its lock.
    fn stage_combatant(&mut self, id: PlayerId) -> Result<&mut CombatantState> {
        if !self.combatants.contains_key(&id) {
            let row = self.read_combatant(id)?;
            self.combatants.insert(id, row);
        }
        self.combatants
            .get_mut(&id)
            .ok_or(StoreError::CombatantNotFound(id))
    }

    fn read_item(&self, id: ItemId) -> Result<Option<ItemRecord>> {
        if let Some(staged) = self.items.get(&id) {
            return Ok(staged.clone());
        }
        Ok(self.shared.tables()?.items.get(&id).cloned())
    }

    /// Owner recorded for an item outside this transaction's overlay.
    fn committed_owner(&self, id: ItemId) -> Result<Option<PlayerId>> {
        Ok(self
            .shared
            .tables()?
            .items
            .get(&id)
            .and_then(|r| r.location)
            .and_then(|l| l.owner()))
    }

    /// Lock whoever owns `item` so its row can be changed safely.
    ///
    /// Ownership may change while we wait, so the owner is re-read after each
    /// acquisition until it is one we already hold.
    async fn lock_item_owner(&mut self, item: ItemId) -> Result<()> {
        if self.items.contains_key(&item) {
            return Ok(());
        }
        loop {
            let Some(owner) = self.committed_owner(item)? else {
                return Ok(());
            };
            let key = LockKey::Combatant(owner);
            if self.held.contains_key(&key) {
                return Ok(());
            }
            self.lock(key).await?;
        }
    }

    /// Staged copy of an item record. The caller must hold its owner's lock.
    fn stage_item(&mut self, id: ItemId) -> Result<&mut ItemRecord> {
        if !self.items.contains_key(&id) {
            let record = self
                .shared
                .tables()?
                .items
                .get(&id)
                .cloned()
                .ok_or(StoreError::ItemNotFound(id))?;
            self.items.insert(id, Some(record));
        }
        self.items
            .get_mut(&id)
            .and_then(Option::as_mut)
            .ok_or(StoreError::ItemNotFound(id))
    }

    fn read_npc(&self, location: LocationId) -> Result<Option<NpcRow>> {
        if let Some(staged) = self.npcs.get(&location) {
            return Ok(staged.clone());
        }
        Ok(self.shared.tables()?.npcs.get(&location).cloned())
    }

    fn read_cooldown(&self, id: PlayerId, key: &str) -> Result<Option<Instant>> {
        let slot = (id, key.to_owned());
        if let Some(staged) = self.cooldowns.get(&slot) {
            return Ok(*staged);
        }
        Ok(self.shared.tables()?.cooldowns.get(&slot).copied())
    }

    fn inventory_snapshot(&self, owner: PlayerId) -> Result<Vec<ItemInstance>> {
        let location = Some(ItemLocation::Inventory(owner));
        let tables = self.shared.tables()?;
        let mut items: Vec<ItemInstance> = tables
            .items
            .iter()
            .filter(|(id, _)| !self.items.contains_key(id))
            .map(|(_, r)| r)
            .chain(self.items.values().flatten())
            .filter(|r| r.location == location)
            .map(|r| r.instance.clone())
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    fn apply(&mut self) -> Result<()> {
        let mut tables = self.shared.tables()?;
        for (id, row) in self.combatants.drain() {
            tables.combatants.insert(id, row);
        }
        for (id, record) in self.items.drain() {
            match record {
                // Items created but never placed anywhere are discarded.
                Some(record) if record.location.is_some() => {
                    tables.items.insert(id, record);
                }
                _ => {
                    tables.items.remove(&id);
                }
            }
        }
        for (slot, expires) in self.cooldowns.drain() {
            match expires {
                Some(expires) => tables.cooldowns.insert(slot, expires),
                None => tables.cooldowns.remove(&slot),
            };
        }
        for (location, row) in self.npcs.drain() {
            match row {
                Some(row) => tables.npcs.insert(location, row),
                None => tables.npcs.remove(&location),
            };
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.finished = true;
        self.combatants.clear();
        self.items.clear();
        self.cooldowns.clear();
        self.npcs.clear();
        self.release_locks();
    }

    fn release_locks(&mut self) {
        let keys: Vec<LockKey> = self.held.keys().copied().collect();
        self.held.clear();
        self.shared.release_row_locks(keys);
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        self.release_locks();
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn lock(&mut self, key: LockKey) -> Result<()> {
        self.ensure_open()?;
        if self.held.contains_key(&key) {
            return Ok(());
        }
        let row = self.shared.row_lock(key)?;
        let guard = tokio::time::timeout(self.shared.lock_timeout, row.lock_owned())
            .await
            .map_err(|_| StoreError::LockTimeout(key))?;
        trace!(target: "runtime::store", %key, "row locked");
        self.held.insert(key, guard);
        Ok(())
    }

    async fn combatant(&mut self, id: PlayerId, lock_for_update: bool) -> Result<CombatantState> {
        self.ensure_open()?;
        if lock_for_update {
            self.lock(LockKey::Combatant(id)).await?;
        }
        self.read_combatant(id)
    }

    async fn inventory(&mut self, id: PlayerId, lock_for_update: bool) -> Result<Vec<ItemInstance>> {
        self.ensure_open()?;
        if lock_for_update {
            self.lock(LockKey::Combatant(id)).await?;
        }
        self.inventory_snapshot(id)
    }

    async fn mutate_health(&mut self, id: PlayerId, delta: i64) -> Result<u32> {
        self.lock(LockKey::Combatant(id)).await?;
        Ok(self.stage_combatant(id)?.apply_health_delta(delta))
    }

    async fn decrement_durability(&mut self, item: ItemId, n: u32) -> Result<Option<u32>> {
        self.ensure_open()?;
        self.lock_item_owner(item).await?;
        let record = self.stage_item(item)?;
        Ok(record.instance.durability.as_mut().map(|d| {
            *d = d.saturating_sub(n);
            *d
        }))
    }

    async fn delete_item(&mut self, item: ItemId) -> Result<()> {
        self.ensure_open()?;
        self.lock_item_owner(item).await?;
        if self.read_item(item)?.is_none() {
            return Err(StoreError::ItemNotFound(item));
        }
        self.items.insert(item, None);
        Ok(())
    }

    async fn create_item(&mut self, template: &ItemKey, durability: Option<u32>) -> Result<ItemInstance> {
        self.ensure_open()?;
        let id = self.shared.allocate_item_id();
        let instance = ItemInstance::new(id, template.clone(), durability);
        self.items.insert(
            id,
            Some(ItemRecord {
                instance: instance.clone(),
                location: None,
            }),
        );
        Ok(instance)
    }

    async fn add_item_to_inventory(&mut self, owner: PlayerId, item: ItemId) -> Result<()> {
        self.lock(LockKey::Combatant(owner)).await?;
        self.read_combatant(owner)?;
        self.lock_item_owner(item).await?;
        let record = self.stage_item(item)?;
        record.location = Some(ItemLocation::Inventory(owner));
        record.instance.equipped = false;
        Ok(())
    }

    async fn drop_to_ground(&mut self, location: LocationId, item: ItemId) -> Result<()> {
        self.ensure_open()?;
        self.lock_item_owner(item).await?;
        let record = self.stage_item(item)?;
        record.location = Some(ItemLocation::Ground(location));
        record.instance.equipped = false;
        Ok(())
    }

    async fn set_in_combat(&mut self, id: PlayerId, in_combat: bool) -> Result<()> {
        self.lock(LockKey::Combatant(id)).await?;
        self.stage_combatant(id)?.in_combat = in_combat;
        Ok(())
    }

    async fn cooldown(&mut self, id: PlayerId, key: &str) -> Result<Option<Duration>> {
        self.ensure_open()?;
        Ok(self.read_cooldown(id, key)?.and_then(remaining))
    }

    async fn set_cooldown(&mut self, id: PlayerId, key: &str, duration: Duration) -> Result<()> {
        self.lock(LockKey::Combatant(id)).await?;
        self.cooldowns
            .insert((id, key.to_owned()), Some(Instant::now() + duration));
        Ok(())
    }

    async fn clear_cooldown(&mut self, id: PlayerId, key: &str) -> Result<()> {
        self.lock(LockKey::Combatant(id)).await?;
        self.cooldowns.insert((id, key.to_owned()), None);
        Ok(())
    }

    async fn credit_kill(&mut self, id: PlayerId, xp: u32, boss: bool) -> Result<()> {
        self.lock(LockKey::Combatant(id)).await?;
        let row = self.stage_combatant(id)?;
        if boss {
            row.boss_kills += 1;
        } else {
            row.kills += 1;
        }
        row.xp += u64::from(xp);
        Ok(())
    }

    async fn record_death(&mut self, id: PlayerId) -> Result<()> {
        self.lock(LockKey::Combatant(id)).await?;
        self.stage_combatant(id)?.deaths += 1;
        Ok(())
    }

    async fn spawned_npc(&mut self, location: LocationId, lock_for_update: bool) -> Result<Option<NpcRow>> {
        self.ensure_open()?;
        if lock_for_update {
            self.lock(LockKey::Npc(location)).await?;
        }
        self.read_npc(location)
    }

    async fn spawn_npc(&mut self, location: LocationId, npc: &NpcKey, health: u32) -> Result<NpcRow> {
        self.lock(LockKey::Npc(location)).await?;
        let row = NpcRow {
            location,
            npc: npc.clone(),
            health,
            max_health: health,
        };
        self.npcs.insert(location, Some(row.clone()));
        Ok(row)
    }

    async fn damage_npc(&mut self, location: LocationId, amount: u32) -> Result<u32> {
        self.lock(LockKey::Npc(location)).await?;
        let mut row = self
            .read_npc(location)?
            .ok_or(StoreError::NpcNotFound(location))?;
        row.health = row.health.saturating_sub(amount);
        let health = row.health;
        self.npcs.insert(location, Some(row));
        Ok(health)
    }

    async fn despawn_npc(&mut self, location: LocationId) -> Result<()> {
        self.lock(LockKey::Npc(location)).await?;
        self.npcs.insert(location, None);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        let applied = self.apply();
        self.finish();
        applied?;
        trace!(target: "runtime::store", "transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.finish();
        trace!(target: "runtime::store", "transaction rolled back");
        Ok(())
    }
}
