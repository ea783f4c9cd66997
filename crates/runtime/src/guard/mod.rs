//! Resource transaction guard.
//!
//! Every resolution step runs as `begin(scope)` → validate → mutate →
//! `settle(step, result)`. Locks are taken for one step only and are never
//! held while waiting on player input.

mod error;

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use combat_core::{ItemId, ItemInstance, LocationId, PlayerId};
use tracing::{debug, error, warn};

use crate::store::{LockKey, Store, StoreTransaction};

pub use error::{StepError, StepOutcome};

/// Rows a step needs exclusive access to.
///
/// Keys are kept sorted so every step acquires them in the same global order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockScope {
    keys: BTreeSet<LockKey>,
}

impl LockScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn combatant(mut self, id: PlayerId) -> Self {
        self.keys.insert(LockKey::Combatant(id));
        self
    }

    pub fn combatants(mut self, ids: impl IntoIterator<Item = PlayerId>) -> Self {
        self.keys.extend(ids.into_iter().map(LockKey::Combatant));
        self
    }

    pub fn npc(mut self, location: LocationId) -> Self {
        self.keys.insert(LockKey::Npc(location));
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &LockKey> {
        self.keys.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Opens locked transactions and classifies how they end.
#[derive(Clone)]
pub struct TransactionGuard {
    store: Arc<dyn Store>,
}

impl TransactionGuard {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Begin a step holding every lock in `scope`.
    ///
    /// Locks are acquired in sorted order. A lock wait that exceeds the store
    /// timeout surfaces as [`StepError::Contention`].
    pub async fn begin(&self, scope: &LockScope) -> Result<GuardedStep, StepError> {
        let mut tx = self.store.begin().await?;
        for key in scope.keys() {
            tx.lock(*key).await?;
        }
        debug!(target: "runtime::guard", locks = scope.keys.len(), "step started");
        Ok(GuardedStep { tx })
    }

    /// Commit on `Ok`, roll back on `Err`, and classify the result.
    pub async fn settle<T>(&self, mut step: GuardedStep, result: Result<T, StepError>) -> StepOutcome<T> {
        match result {
            Ok(value) => match step.tx.commit().await {
                Ok(()) => StepOutcome::Applied(value),
                Err(err) => StepOutcome::from_error(err.into()),
            },
            Err(err) => {
                if let Err(rollback) = step.tx.rollback().await {
                    error!(target: "runtime::guard", error = %rollback, "rollback failed");
                }
                StepOutcome::from_error(err)
            }
        }
    }
}

/// An open, locked transaction for one resolution step.
///
/// Dropping a step without settling it rolls back.
pub struct GuardedStep {
    tx: Box<dyn StoreTransaction>,
}

impl GuardedStep {
    /// Re-check that `owner` still holds `item`.
    ///
    /// The player may have traded, dropped or used the item while choosing.
    pub async fn require_item(&mut self, owner: PlayerId, item: ItemId) -> Result<ItemInstance, StepError> {
        let inventory = self.tx.inventory(owner, true).await?;
        inventory.into_iter().find(|i| i.id == item).ok_or_else(|| {
            warn!(target: "runtime::guard", player = owner.0, item = item.0, "selected item is gone");
            StepError::Validation(format!("{owner} did not have the item"))
        })
    }
}

impl Deref for GuardedStep {
    type Target = dyn StoreTransaction;

    fn deref(&self) -> &Self::Target {
        self.tx.as_ref()
    }
}

impl DerefMut for GuardedStep {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.tx.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use combat_core::CombatantState;

    use super::*;
    use crate::store::InMemoryStore;

    fn store() -> Arc<InMemoryStore> {
        let store = InMemoryStore::with_lock_timeout(Duration::from_millis(50));
        store
            .insert_combatant(CombatantState::new(PlayerId(1), 100))
            .unwrap();
        store
            .insert_combatant(CombatantState::new(PlayerId(2), 100))
            .unwrap();
        Arc::new(store)
    }

    #[test]
    fn scope_orders_and_dedups_keys() {
        let scope = LockScope::new()
            .npc(LocationId(1))
            .combatant(PlayerId(9))
            .combatant(PlayerId(2))
            .combatant(PlayerId(9));
        let keys: Vec<_> = scope.keys().copied().collect();
        assert_eq!(
            keys,
            [
                LockKey::Combatant(PlayerId(2)),
                LockKey::Combatant(PlayerId(9)),
                LockKey::Npc(LocationId(1)),
            ]
        );
    }

    #[tokio::test]
    async fn failed_step_rolls_back() {
        let store = store();
        let guard = TransactionGuard::new(store.clone());
        let scope = LockScope::new().combatant(PlayerId(1));

        let mut step = guard.begin(&scope).await.unwrap();
        step.mutate_health(PlayerId(1), -40).await.unwrap();
        let outcome: StepOutcome<()> = guard
            .settle(step, Err(StepError::Validation("nope".into())))
            .await;

        assert_eq!(outcome, StepOutcome::Skipped("nope".into()));
        assert_eq!(store.combatant_row(PlayerId(1)).unwrap().unwrap().health, 100);
    }

    #[tokio::test]
    async fn stale_item_is_a_validation_skip() {
        let store = store();
        let guard = TransactionGuard::new(store.clone());
        let scope = LockScope::new().combatant(PlayerId(1));

        let mut step = guard.begin(&scope).await.unwrap();
        let result = step.require_item(PlayerId(1), ItemId(404)).await;
        let outcome = guard.settle(step, result).await;
        assert!(matches!(outcome, StepOutcome::Skipped(reason) if reason.contains("did not have")));
    }

    #[tokio::test]
    async fn held_row_is_contention() {
        let store = store();
        let guard = TransactionGuard::new(store.clone());
        let scope = LockScope::new().combatant(PlayerId(2));

        let _held = guard.begin(&scope).await.unwrap();
        let err = guard.begin(&scope).await.err().unwrap();
        assert_eq!(err, StepError::Contention);
        let outcome: StepOutcome<()> = StepOutcome::from_error(err);
        assert_eq!(outcome, StepOutcome::Skipped("could not act (resources busy)".into()));
    }
}
