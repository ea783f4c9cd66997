//! Active-duel registry.
//!
//! At most one duel runs per location. [`DuelRegistry::acquire`] hands out a
//! [`DuelLease`] that keeps the location marked until it is released or
//! dropped. Registries are plain values, so tests can run isolated ones side
//! by side.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use combat_core::LocationId;
use tracing::{debug, warn};

use super::{Result, RuntimeError};
use crate::duel::DuelId;

#[derive(Clone, Default)]
pub struct DuelRegistry {
    active: Arc<Mutex<HashMap<LocationId, DuelId>>>,
}

impl DuelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `location` as hosting `duel_id`.
    pub fn acquire(&self, location: LocationId, duel_id: DuelId) -> Result<DuelLease> {
        let mut active = self.active.lock().map_err(|_| RuntimeError::RegistryPoisoned)?;
        if let Some(existing) = active.get(&location) {
            return Err(RuntimeError::DuelAlreadyActive {
                location,
                duel_id: *existing,
            });
        }
        active.insert(location, duel_id);
        debug!(target: "runtime::registry", %location, %duel_id, "location acquired");
        Ok(DuelLease {
            registry: self.clone(),
            location,
            duel_id,
            released: false,
        })
    }

    pub fn is_active(&self, location: LocationId) -> bool {
        self.active
            .lock()
            .map(|active| active.contains_key(&location))
            .unwrap_or(false)
    }

    /// Duel currently holding `location`.
    pub fn active_duel(&self, location: LocationId) -> Option<DuelId> {
        self.active
            .lock()
            .ok()
            .and_then(|active| active.get(&location).copied())
    }

    fn release(&self, location: LocationId, duel_id: DuelId) {
        match self.active.lock() {
            Ok(mut active) => {
                if active.get(&location) == Some(&duel_id) {
                    active.remove(&location);
                    debug!(target: "runtime::registry", %location, %duel_id, "location released");
                }
            }
            Err(_) => {
                warn!(target: "runtime::registry", %location, %duel_id, "registry poisoned; lease not released")
            }
        }
    }
}

/// Exclusive claim on a location. Released exactly once.
pub struct DuelLease {
    registry: DuelRegistry,
    location: LocationId,
    duel_id: DuelId,
    released: bool,
}

impl DuelLease {
    pub fn location(&self) -> LocationId {
        self.location
    }

    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.registry.release(self.location, self.duel_id);
        }
    }
}

impl Drop for DuelLease {
    fn drop(&mut self) {
        self.release_once();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let registry = DuelRegistry::new();
        let lease = registry.acquire(LocationId(7), DuelId(1)).unwrap();
        assert!(registry.is_active(LocationId(7)));

        let err = registry.acquire(LocationId(7), DuelId(2)).err().unwrap();
        assert!(matches!(
            err,
            RuntimeError::DuelAlreadyActive {
                duel_id: DuelId(1),
                ..
            }
        ));

        lease.release();
        assert!(!registry.is_active(LocationId(7)));
        registry.acquire(LocationId(7), DuelId(2)).unwrap();
    }

    #[test]
    fn dropping_a_lease_releases_it() {
        let registry = DuelRegistry::new();
        {
            let _lease = registry.acquire(LocationId(1), DuelId(1)).unwrap();
            assert_eq!(registry.active_duel(LocationId(1)), Some(DuelId(1)));
        }
        assert_eq!(registry.active_duel(LocationId(1)), None);
    }

    #[test]
    fn registries_are_isolated() {
        let a = DuelRegistry::new();
        let b = DuelRegistry::new();
        let _lease = a.acquire(LocationId(1), DuelId(1)).unwrap();
        assert!(b.acquire(LocationId(1), DuelId(2)).is_ok());
    }
}
