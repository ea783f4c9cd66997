//! Damage calculation and armor mitigation.

use crate::config::ArmorTable;

use super::Limb;

/// Damage landing on one limb after armor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DamageRoll {
    /// Damage that gets through.
    pub total: u32,
    /// Damage absorbed by armor, reported for messaging.
    pub reduced: u32,
}

/// Percentage of damage absorbed by armor of `level` against `penetration`.
///
/// # Formula
///
/// ```text
/// gap = level - penetration
/// gap <= 0      => defeated_reduction_pct
/// 0 < gap < 1   => partial_reduction_pct
/// gap >= 1      => blocked_reduction_pct
/// ```
pub fn armor_reduction_pct(penetration: f64, level: f64, table: &ArmorTable) -> u32 {
    let gap = level - penetration;
    let pct = if gap <= 0.0 {
        table.defeated_reduction_pct
    } else if gap < 1.0 {
        table.partial_reduction_pct
    } else {
        table.blocked_reduction_pct
    };
    pct.min(100)
}

/// Whether a hit with `penetration` wears down armor of `level`.
///
/// Armor only loses durability when `penetration >= level / wear_divisor`,
/// so weak weapons can never grind down high-tier armor.
pub fn armor_wears(penetration: f64, level: f64, table: &ArmorTable) -> bool {
    penetration >= level / table.wear_divisor
}

/// Calculate damage landing on a limb.
///
/// Armor only applies when the limb is covered: head by the helmet, chest by
/// body armor. Other limbs take the full damage.
///
/// # Arguments
///
/// * `base_damage` - Damage after the attacker's multiplier, split across limbs
/// * `penetration` - Attacker's ammo/weapon penetration
/// * `limb` - Limb that was hit
/// * `armor` - Defender's body armor level, if worn
/// * `helmet` - Defender's helmet level, if worn
/// * `table` - Armor mitigation parameters
///
/// # Returns
///
/// Non-negative total and reduced damage.
pub fn compute_damage(
    base_damage: f64,
    penetration: f64,
    limb: Limb,
    armor: Option<f64>,
    helmet: Option<f64>,
    table: &ArmorTable,
) -> DamageRoll {
    let raw = base_damage.max(0.0).round() as u32;

    let level = match limb {
        Limb::Head => helmet,
        Limb::Chest => armor,
        Limb::Arm | Limb::Leg => None,
    };

    let Some(level) = level else {
        return DamageRoll {
            total: raw,
            reduced: 0,
        };
    };

    let pct = armor_reduction_pct(penetration, level, table);
    let reduced = ((f64::from(raw) * f64::from(pct)) / 100.0).round() as u32;

    DamageRoll {
        total: raw.saturating_sub(reduced),
        reduced: reduced.min(raw),
    }
}
