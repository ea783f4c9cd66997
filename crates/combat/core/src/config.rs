//! Tunable combat tables.
//!
//! Every balance number the rules consume lives here with a `DEFAULT_*`
//! constant. The whole [`CombatConfig`] can be deserialized from a partial
//! TOML document; missing tables and fields fall back to the defaults.

use std::time::Duration;

use crate::combat::Limb;
use crate::effects::AfflictionKind;

/// Aggregate of all balance tables.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    pub hit: HitTable,
    pub armor: ArmorTable,
    pub afflictions: AfflictionTable,
    pub flee: FleeTable,
    pub npc: NpcPolicyTable,
    pub loot: LootTable,
    pub duel: DuelTable,
}

impl CombatConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Hit selection
// ============================================================================

/// Default limb distribution used when no limb is requested or a roll is imprecise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HitTable {
    pub head_weight: u32,
    pub chest_weight: u32,
    pub arm_weight: u32,
    pub leg_weight: u32,
}

impl HitTable {
    pub const DEFAULT_HEAD_WEIGHT: u32 = 10;
    pub const DEFAULT_CHEST_WEIGHT: u32 = 40;
    pub const DEFAULT_ARM_WEIGHT: u32 = 25;
    pub const DEFAULT_LEG_WEIGHT: u32 = 25;

    pub fn weight(&self, limb: Limb) -> u32 {
        match limb {
            Limb::Head => self.head_weight,
            Limb::Chest => self.chest_weight,
            Limb::Arm => self.arm_weight,
            Limb::Leg => self.leg_weight,
        }
    }
}

impl Default for HitTable {
    fn default() -> Self {
        Self {
            head_weight: Self::DEFAULT_HEAD_WEIGHT,
            chest_weight: Self::DEFAULT_CHEST_WEIGHT,
            arm_weight: Self::DEFAULT_ARM_WEIGHT,
            leg_weight: Self::DEFAULT_LEG_WEIGHT,
        }
    }
}

// ============================================================================
// Armor mitigation
// ============================================================================

/// Armor absorption tiers keyed on `armor level - penetration`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArmorTable {
    /// Reduction when penetration meets or exceeds the armor level.
    pub defeated_reduction_pct: u32,
    /// Reduction when the armor level exceeds penetration by less than one.
    pub partial_reduction_pct: u32,
    /// Reduction when the armor level exceeds penetration by one or more.
    pub blocked_reduction_pct: u32,
    /// Armor wears only when `penetration >= level / wear_divisor`.
    pub wear_divisor: f64,
}

impl ArmorTable {
    pub const DEFAULT_DEFEATED_REDUCTION_PCT: u32 = 0;
    pub const DEFAULT_PARTIAL_REDUCTION_PCT: u32 = 40;
    pub const DEFAULT_BLOCKED_REDUCTION_PCT: u32 = 75;
    pub const DEFAULT_WEAR_DIVISOR: f64 = 2.0;
}

impl Default for ArmorTable {
    fn default() -> Self {
        Self {
            defeated_reduction_pct: Self::DEFAULT_DEFEATED_REDUCTION_PCT,
            partial_reduction_pct: Self::DEFAULT_PARTIAL_REDUCTION_PCT,
            blocked_reduction_pct: Self::DEFAULT_BLOCKED_REDUCTION_PCT,
            wear_divisor: Self::DEFAULT_WEAR_DIVISOR,
        }
    }
}

// ============================================================================
// Afflictions
// ============================================================================

/// Fixed penalties, trigger chances and durations of afflictions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AfflictionTable {
    pub bitten_damage_pct: i32,
    pub broken_arm_fire_rate_pct: i32,
    pub burning_damage_reduction_pct: i32,
    /// Chance per arm hit to break the defender's arm.
    pub broken_arm_chance_pct: u32,
    pub bitten_secs: u64,
    pub broken_arm_secs: u64,
    pub burning_secs: u64,
}

impl AfflictionTable {
    pub const DEFAULT_BITTEN_DAMAGE_PCT: i32 = -15;
    pub const DEFAULT_BROKEN_ARM_FIRE_RATE_PCT: i32 = -15;
    pub const DEFAULT_BURNING_DAMAGE_REDUCTION_PCT: i32 = -20;
    pub const DEFAULT_BROKEN_ARM_CHANCE_PCT: u32 = 20;
    pub const DEFAULT_BITTEN_SECS: u64 = 300;
    pub const DEFAULT_BROKEN_ARM_SECS: u64 = 240;
    pub const DEFAULT_BURNING_SECS: u64 = 120;

    /// How long a freshly applied affliction stays active.
    pub fn duration(&self, kind: AfflictionKind) -> Duration {
        let secs = match kind {
            AfflictionKind::Bitten => self.bitten_secs,
            AfflictionKind::BrokenArm => self.broken_arm_secs,
            AfflictionKind::Burning => self.burning_secs,
        };
        Duration::from_secs(secs)
    }
}

impl Default for AfflictionTable {
    fn default() -> Self {
        Self {
            bitten_damage_pct: Self::DEFAULT_BITTEN_DAMAGE_PCT,
            broken_arm_fire_rate_pct: Self::DEFAULT_BROKEN_ARM_FIRE_RATE_PCT,
            burning_damage_reduction_pct: Self::DEFAULT_BURNING_DAMAGE_REDUCTION_PCT,
            broken_arm_chance_pct: Self::DEFAULT_BROKEN_ARM_CHANCE_PCT,
            bitten_secs: Self::DEFAULT_BITTEN_SECS,
            broken_arm_secs: Self::DEFAULT_BROKEN_ARM_SECS,
            burning_secs: Self::DEFAULT_BURNING_SECS,
        }
    }
}

// ============================================================================
// Flee
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FleeTable {
    pub scavenge_pct: u32,
    pub boss_pct: u32,
}

impl FleeTable {
    pub const DEFAULT_SCAVENGE_PCT: u32 = 10;
    pub const DEFAULT_BOSS_PCT: u32 = 15;
}

impl Default for FleeTable {
    fn default() -> Self {
        Self {
            scavenge_pct: Self::DEFAULT_SCAVENGE_PCT,
            boss_pct: Self::DEFAULT_BOSS_PCT,
        }
    }
}

// ============================================================================
// NPC policy
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NpcPolicyTable {
    /// NPCs at or below this share of max health consider healing.
    pub heal_threshold_pct: u32,
    pub heal_chance_pct: u32,
    pub stimulant_chance_pct: u32,
    /// Speed of NPC attacks that have no weapon to derive it from.
    pub fallback_speed: u32,
    /// Accuracy of weaponless NPC attacks.
    pub unarmed_accuracy: u32,
}

impl NpcPolicyTable {
    pub const DEFAULT_HEAL_THRESHOLD_PCT: u32 = 50;
    pub const DEFAULT_HEAL_CHANCE_PCT: u32 = 60;
    pub const DEFAULT_STIMULANT_CHANCE_PCT: u32 = 50;
    pub const DEFAULT_FALLBACK_SPEED: u32 = 5;
    pub const DEFAULT_UNARMED_ACCURACY: u32 = 60;
}

impl Default for NpcPolicyTable {
    fn default() -> Self {
        Self {
            heal_threshold_pct: Self::DEFAULT_HEAL_THRESHOLD_PCT,
            heal_chance_pct: Self::DEFAULT_HEAL_CHANCE_PCT,
            stimulant_chance_pct: Self::DEFAULT_STIMULANT_CHANCE_PCT,
            fallback_speed: Self::DEFAULT_FALLBACK_SPEED,
            unarmed_accuracy: Self::DEFAULT_UNARMED_ACCURACY,
        }
    }
}

// ============================================================================
// Loot
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LootTable {
    pub common_weight: u32,
    pub uncommon_weight: u32,
    pub rare_weight: u32,
    pub rarest_weight: u32,
    /// Used loot durability is sampled from `[max(1, max / divisor), max]`.
    pub durability_divisor: u32,
    pub boss_durability_divisor: u32,
    /// Inclusive range of ammo instances dropped by ranged raiders.
    pub ammo_drop_min: u32,
    pub ammo_drop_max: u32,
    pub boss_ammo_drop_max: u32,
}

impl LootTable {
    pub const DEFAULT_COMMON_WEIGHT: u32 = 60;
    pub const DEFAULT_UNCOMMON_WEIGHT: u32 = 25;
    pub const DEFAULT_RARE_WEIGHT: u32 = 10;
    pub const DEFAULT_RAREST_WEIGHT: u32 = 5;
    pub const DEFAULT_DURABILITY_DIVISOR: u32 = 4;
    pub const DEFAULT_BOSS_DURABILITY_DIVISOR: u32 = 2;
    pub const DEFAULT_AMMO_DROP_MIN: u32 = 1;
    pub const DEFAULT_AMMO_DROP_MAX: u32 = 3;
    pub const DEFAULT_BOSS_AMMO_DROP_MAX: u32 = 2;
}

impl Default for LootTable {
    fn default() -> Self {
        Self {
            common_weight: Self::DEFAULT_COMMON_WEIGHT,
            uncommon_weight: Self::DEFAULT_UNCOMMON_WEIGHT,
            rare_weight: Self::DEFAULT_RARE_WEIGHT,
            rarest_weight: Self::DEFAULT_RAREST_WEIGHT,
            durability_divisor: Self::DEFAULT_DURABILITY_DIVISOR,
            boss_durability_divisor: Self::DEFAULT_BOSS_DURABILITY_DIVISOR,
            ammo_drop_min: Self::DEFAULT_AMMO_DROP_MIN,
            ammo_drop_max: Self::DEFAULT_AMMO_DROP_MAX,
            boss_ammo_drop_max: Self::DEFAULT_BOSS_AMMO_DROP_MAX,
        }
    }
}

// ============================================================================
// Duel
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DuelTable {
    /// The duel is declared a tie once this turn has been resolved.
    pub max_turns: u32,
    /// Ordering speed of a flee attempt.
    pub flee_speed: u32,
}

impl DuelTable {
    pub const DEFAULT_MAX_TURNS: u32 = 20;
    pub const DEFAULT_FLEE_SPEED: u32 = 0;
}

impl Default for DuelTable {
    fn default() -> Self {
        Self {
            max_turns: Self::DEFAULT_MAX_TURNS,
            flee_speed: Self::DEFAULT_FLEE_SPEED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CombatConfig::default();
        assert_eq!(config.duel.max_turns, 20);
        assert_eq!(config.afflictions.broken_arm_chance_pct, 20);
        assert_eq!(config.flee.scavenge_pct, 10);
        assert_eq!(config.flee.boss_pct, 15);
        assert_eq!(config.hit.weight(Limb::Chest), 40);
        assert_eq!(
            config.afflictions.duration(AfflictionKind::BrokenArm),
            Duration::from_secs(240)
        );
    }
}
