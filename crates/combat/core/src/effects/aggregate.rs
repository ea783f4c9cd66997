//! Effect aggregation.

use std::time::Duration;

use crate::config::AfflictionTable;

use super::AfflictionKind;

/// Per-field effects declared by a stimulant template.
///
/// All values are percentages except `weight_bonus_slots`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StimulantEffects {
    pub damage_bonus_pct: i32,
    pub accuracy_bonus_pct: i32,
    pub weight_bonus_slots: i32,
    pub fire_rate_pct: i32,
    pub damage_reduction_pct: i32,
}

/// Combined modifiers of everything active on a combatant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectSet {
    /// Outgoing damage bonus (10 = +10% damage).
    pub damage_bonus_pct: i32,
    /// Added to the weapon's accuracy before the hit roll.
    pub accuracy_bonus_pct: i32,
    /// Extra inventory slots.
    pub weight_bonus_slots: i32,
    /// Attack cooldown reduction (10 = 10% shorter cooldown).
    pub fire_rate_pct: i32,
    /// Incoming damage reduction (10 = 10% less damage taken).
    pub damage_reduction_pct: i32,
}

impl EffectSet {
    /// Multiplier applied to the attacker's base damage. Never negative.
    pub fn damage_multiplier(&self) -> f64 {
        (1.0 + f64::from(self.damage_bonus_pct) / 100.0).max(0.0)
    }

    /// Multiplier applied to damage this combatant receives. Never negative.
    pub fn damage_taken_multiplier(&self) -> f64 {
        (1.0 - f64::from(self.damage_reduction_pct) / 100.0).max(0.0)
    }

    /// Cooldown between open-world attacks with a weapon of the given fire rate.
    ///
    /// # Formula
    ///
    /// ```text
    /// cooldown = max(1, round(fire_rate * (1 - fire_rate_pct / 100))) seconds
    /// ```
    pub fn attack_cooldown(&self, fire_rate_secs: u32) -> Duration {
        let scaled = f64::from(fire_rate_secs) * (1.0 - f64::from(self.fire_rate_pct) / 100.0);
        Duration::from_secs(scaled.round().max(1.0) as u64)
    }

    fn add(&mut self, other: &StimulantEffects) {
        self.damage_bonus_pct += other.damage_bonus_pct;
        self.accuracy_bonus_pct += other.accuracy_bonus_pct;
        self.weight_bonus_slots += other.weight_bonus_slots;
        self.fire_rate_pct += other.fire_rate_pct;
        self.damage_reduction_pct += other.damage_reduction_pct;
    }
}

/// Anything that contributes to an [`EffectSet`].
///
/// Sources stack additively; the order in which they are applied does not
/// change the result.
pub trait EffectSource {
    fn apply(&self, effects: &mut EffectSet, table: &AfflictionTable);
}

impl EffectSource for StimulantEffects {
    fn apply(&self, effects: &mut EffectSet, _table: &AfflictionTable) {
        effects.add(self);
    }
}

impl EffectSource for AfflictionKind {
    fn apply(&self, effects: &mut EffectSet, table: &AfflictionTable) {
        match self {
            AfflictionKind::Bitten => effects.damage_bonus_pct += table.bitten_damage_pct,
            AfflictionKind::BrokenArm => effects.fire_rate_pct += table.broken_arm_fire_rate_pct,
            AfflictionKind::Burning => {
                effects.damage_reduction_pct += table.burning_damage_reduction_pct
            }
        }
    }
}

/// Combines active stimulants and afflictions into one modifier set.
///
/// Stimulant fields are summed. Each distinct affliction applies its fixed
/// penalty once, even if it appears more than once in the input.
pub fn aggregate<'a>(
    stimulants: impl IntoIterator<Item = &'a StimulantEffects>,
    afflictions: &[AfflictionKind],
    table: &AfflictionTable,
) -> EffectSet {
    let mut effects = EffectSet::default();

    for stimulant in stimulants {
        stimulant.apply(&mut effects, table);
    }

    let mut seen: Vec<AfflictionKind> = Vec::with_capacity(afflictions.len());
    for affliction in afflictions {
        if seen.contains(affliction) {
            continue;
        }
        seen.push(*affliction);
        affliction.apply(&mut effects, table);
    }

    effects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adrenaline() -> StimulantEffects {
        StimulantEffects {
            damage_bonus_pct: 20,
            damage_reduction_pct: -20,
            ..Default::default()
        }
    }

    #[test]
    fn empty_input_is_neutral() {
        let effects = aggregate([], &[], &AfflictionTable::default());
        assert_eq!(effects, EffectSet::default());
        assert_eq!(effects.damage_multiplier(), 1.0);
        assert_eq!(effects.damage_taken_multiplier(), 1.0);
    }

    #[test]
    fn stimulants_sum_and_afflictions_penalize() {
        let focus = StimulantEffects {
            accuracy_bonus_pct: 10,
            fire_rate_pct: 25,
            ..Default::default()
        };
        let stims = [adrenaline(), focus];
        let effects = aggregate(
            stims.iter(),
            &[AfflictionKind::Bitten, AfflictionKind::BrokenArm],
            &AfflictionTable::default(),
        );

        assert_eq!(effects.damage_bonus_pct, 5);
        assert_eq!(effects.accuracy_bonus_pct, 10);
        assert_eq!(effects.fire_rate_pct, 10);
        assert_eq!(effects.damage_reduction_pct, -20);
    }

    #[test]
    fn duplicate_afflictions_apply_once() {
        let effects = aggregate(
            [],
            &[AfflictionKind::Bitten, AfflictionKind::Bitten],
            &AfflictionTable::default(),
        );
        assert_eq!(effects.damage_bonus_pct, -15);
    }

    #[test]
    fn burning_increases_damage_taken() {
        let effects = aggregate([], &[AfflictionKind::Burning], &AfflictionTable::default());
        assert!((effects.damage_taken_multiplier() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn attack_cooldown_never_below_one_second() {
        let effects = EffectSet {
            fire_rate_pct: 100,
            ..Default::default()
        };
        assert_eq!(effects.attack_cooldown(30), Duration::from_secs(1));

        let broken = aggregate([], &[AfflictionKind::BrokenArm], &AfflictionTable::default());
        // 20 * 1.15 = 23
        assert_eq!(broken.attack_cooldown(20), Duration::from_secs(23));
    }
}
