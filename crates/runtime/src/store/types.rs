//! Row shapes and lock keys shared by store implementations.

use std::fmt;

use combat_core::{LocationId, NpcKey, PlayerId};
use serde::{Deserialize, Serialize};

/// Unit of mutual exclusion in the store.
///
/// Keys order combatants before NPC rows so multi-row scopes can always be
/// locked in one global order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LockKey {
    Combatant(PlayerId),
    Npc(LocationId),
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKey::Combatant(id) => write!(f, "combatant {}", id.0),
            LockKey::Npc(location) => write!(f, "npc at {}", location),
        }
    }
}

/// An NPC roaming a location outside any duel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcRow {
    pub location: LocationId,
    pub npc: NpcKey,
    pub health: u32,
    pub max_health: u32,
}

impl NpcRow {
    pub fn is_dead(&self) -> bool {
        self.health == 0
    }
}

/// Well-known cooldown keys. Afflictions and stimulants use the keys their
/// core types produce.
pub mod cooldowns {
    /// Open-world attack cooldown of the attacker.
    pub const ATTACK: &str = "attack";
    /// Protection from player attacks after being killed by a player.
    pub const ATTACK_SHIELD: &str = "attack-shield";
}
