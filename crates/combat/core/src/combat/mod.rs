//! Combat resolution system.
//!
//! This module provides pure functions for resolving a single attack. All
//! randomness is drawn from the `rand::Rng` passed in, so a seeded generator
//! reproduces an attack exactly.
//!
//! # Core Functions
//!
//! - `resolve_hit`: precise/imprecise roll and limb selection
//! - `compute_damage`: armor mitigation for one limb
//! - `resolve_attack`: complete attack (hit + spread + damage + afflictions)

pub mod damage;
pub mod hit;
pub mod profile;
pub mod result;

pub use damage::{DamageRoll, armor_reduction_pct, armor_wears, compute_damage};
pub use hit::{HitRoll, draw_limb, resolve_hit};
pub use profile::{AttackError, AttackProfile, DefenderProfile};
pub use result::{AttackResolution, LimbHit, resolve_attack};

use strum::{Display, EnumIter};

use crate::env::ArmorSlot;

/// Body regions an attack can land on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase")]
pub enum Limb {
    Head,
    Chest,
    Arm,
    Leg,
}

impl Limb {
    pub const COUNT: usize = 4;

    /// Armor slot covering this limb, if any.
    pub const fn protected_by(self) -> Option<ArmorSlot> {
        match self {
            Limb::Head => Some(ArmorSlot::Helmet),
            Limb::Chest => Some(ArmorSlot::BodyArmor),
            Limb::Arm | Limb::Leg => None,
        }
    }
}
