//! NPC template definitions and oracle interface.
//!
//! NPC templates are immutable records loaded from content files. A duel
//! combines a template with a mutable health counter; nothing on the template
//! itself changes during an exchange.

use crate::state::{ItemKey, NpcKey};

/// Read-only access to NPC templates.
pub trait NpcOracle: Send + Sync {
    fn template(&self, key: &NpcKey) -> Option<&NpcTemplate>;

    fn all_templates(&self) -> Vec<&NpcTemplate>;
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NpcTemplate {
    pub key: NpcKey,
    pub display: String,
    pub health: u32,
    /// Base damage of the NPC's attacks.
    pub damage: u32,
    /// XP credited to the killer.
    pub xp: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub boss: bool,
    pub kind: NpcKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub armor: Option<ItemKey>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub helmet: Option<ItemKey>,
    pub drops: DropTable,
    #[cfg_attr(feature = "serde", serde(default))]
    pub uses_heals: Vec<ItemKey>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub uses_stimulants: Vec<ItemKey>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub quotes: Vec<String>,
}

impl NpcTemplate {
    pub fn is_raider(&self) -> bool {
        matches!(self.kind, NpcKind::Raider { .. })
    }

    /// Weapon the NPC fights with, if it carries one.
    pub fn weapon(&self) -> Option<&ItemKey> {
        match &self.kind {
            NpcKind::Raider { weapon, .. } => Some(weapon),
            NpcKind::Walker { .. } => None,
        }
    }

    pub fn ammo(&self) -> Option<&ItemKey> {
        match &self.kind {
            NpcKind::Raider { ammo, .. } => ammo.as_ref(),
            NpcKind::Walker { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NpcKind {
    /// Unarmed infected. Attacks with a fixed penetration and may bite.
    Walker {
        penetration: f64,
        /// Percent chance per landed attack to inflict Bitten.
        chance_to_bite: u32,
    },
    /// Armed human. Penetration comes from the ammo, or the weapon if melee.
    Raider {
        weapon: ItemKey,
        #[cfg_attr(feature = "serde", serde(default))]
        ammo: Option<ItemKey>,
    },
}

/// Tiered loot pools rolled when the NPC is killed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DropTable {
    pub common: Vec<ItemKey>,
    pub uncommon: Vec<ItemKey>,
    pub rare: Vec<ItemKey>,
    pub rarest: Vec<ItemKey>,
    /// How many times the pools are rolled.
    pub rolls: u32,
}
