//! Attack resolution records.

use arrayvec::ArrayVec;
use rand::Rng;

use crate::config::CombatConfig;
use crate::effects::{AfflictionKind, EffectSet};
use crate::env::ArmorSlot;

use super::damage::{armor_wears, compute_damage};
use super::hit::{draw_limb, resolve_hit};
use super::profile::{AttackProfile, DefenderProfile};
use super::Limb;

/// Damage dealt to one limb.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LimbHit {
    pub limb: Limb,
    /// This limb's share of the attacker's damage, before armor.
    pub base_damage: f64,
    pub armor_reduction: u32,
    pub total_damage: u32,
    /// Armor slot that absorbed part of the hit, if the defender wore one there.
    pub armor_struck: Option<ArmorSlot>,
    /// Whether the struck armor loses a point of durability.
    pub armor_worn: bool,
}

/// Result of one attack action.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackResolution {
    /// One entry per limb hit; empty when a called shot missed.
    pub hits: ArrayVec<LimbHit, { Limb::COUNT }>,
    pub requested_limb: Option<Limb>,
    pub requested_limb_hit: bool,
    /// Limb selected by the hit roll, whether or not damage landed there.
    pub rolled_limb: Limb,
    /// Afflictions newly inflicted on the defender.
    pub inflicted: ArrayVec<AfflictionKind, 3>,
}

impl AttackResolution {
    pub fn total_damage(&self) -> u32 {
        self.hits.iter().map(|h| h.total_damage).sum()
    }

    pub fn total_reduced(&self) -> u32 {
        self.hits.iter().map(|h| h.armor_reduction).sum()
    }

    /// A limb was requested but the roll did not land on it; no damage was dealt.
    pub fn called_shot_missed(&self) -> bool {
        self.requested_limb.is_some() && !self.requested_limb_hit
    }

    /// Armor slots that lose durability from this attack (at most once per slot).
    pub fn worn_armor(&self) -> impl Iterator<Item = ArmorSlot> + '_ {
        let mut seen: ArrayVec<ArmorSlot, 2> = ArrayVec::new();
        self.hits.iter().filter_map(move |hit| {
            let slot = hit.armor_struck.filter(|_| hit.armor_worn)?;
            if seen.contains(&slot) {
                return None;
            }
            seen.push(slot);
            Some(slot)
        })
    }
}

/// Resolve a complete attack (hit roll, spread, armor, afflictions).
///
/// # Steps
///
/// 1. Hit roll with `profile.accuracy + attacker.accuracy_bonus_pct`
/// 2. A requested limb that was not hit ends the attack with no damage
/// 3. Spread: `profile.spread` distinct limbs, extras drawn from the default
///    table restricted to limbs not yet hit
/// 4. Per-limb damage `damage * multiplier / spread`, mitigated by armor and
///    scaled by the defender's damage-taken multiplier
/// 5. Affliction triggers against afflictions the defender does not have yet
///
/// # Arguments
///
/// * `profile` - Attacking weapon/NPC numbers
/// * `attacker` - Attacker's aggregated effects
/// * `defender` - Defender's armor, effects and current afflictions
/// * `requested` - Limb the attacker aimed at, if any
/// * `config` - Balance tables
/// * `rng` - Random source
pub fn resolve_attack<R: Rng + ?Sized>(
    profile: &AttackProfile,
    attacker: &EffectSet,
    defender: &DefenderProfile,
    requested: Option<Limb>,
    config: &CombatConfig,
    rng: &mut R,
) -> AttackResolution {
    let accuracy = profile.accuracy as i32 + attacker.accuracy_bonus_pct;
    let first = resolve_hit(accuracy, requested, &config.hit, rng);

    let mut resolution = AttackResolution {
        hits: ArrayVec::new(),
        requested_limb: requested,
        requested_limb_hit: first.requested_limb_hit,
        rolled_limb: first.limb,
        inflicted: ArrayVec::new(),
    };

    if resolution.called_shot_missed() {
        return resolution;
    }

    let spread = usize::from(profile.spread).clamp(1, Limb::COUNT);
    let mut limbs: ArrayVec<Limb, { Limb::COUNT }> = ArrayVec::new();
    limbs.push(first.limb);
    while limbs.len() < spread {
        match draw_limb(&config.hit, &limbs, rng) {
            Some(limb) => limbs.push(limb),
            None => break,
        }
    }

    let per_limb = f64::from(profile.damage) * attacker.damage_multiplier() / spread as f64;
    let taken = defender.effects.damage_taken_multiplier();

    for limb in limbs {
        let roll = compute_damage(
            per_limb,
            profile.penetration,
            limb,
            defender.armor,
            defender.helmet,
            &config.armor,
        );
        let armor_struck = limb
            .protected_by()
            .filter(|slot| defender.level(*slot).is_some());
        let armor_worn = armor_struck
            .and_then(|slot| defender.level(slot))
            .is_some_and(|level| armor_wears(profile.penetration, level, &config.armor));

        resolution.hits.push(LimbHit {
            limb,
            base_damage: per_limb,
            armor_reduction: roll.reduced,
            total_damage: (f64::from(roll.total) * taken).round() as u32,
            armor_struck,
            armor_worn,
        });
    }

    roll_afflictions(profile, defender, config, &mut resolution, rng);
    resolution
}

fn roll_afflictions<R: Rng + ?Sized>(
    profile: &AttackProfile,
    defender: &DefenderProfile,
    config: &CombatConfig,
    resolution: &mut AttackResolution,
    rng: &mut R,
) {
    let inflict = |kind: AfflictionKind, resolution: &mut AttackResolution| {
        if !defender.is_afflicted(kind) && !resolution.inflicted.contains(&kind) {
            resolution.inflicted.push(kind);
        }
    };

    let arm_hits = resolution.hits.iter().filter(|h| h.limb == Limb::Arm).count();
    for _ in 0..arm_hits {
        if rng.gen_range(0..100) < config.afflictions.broken_arm_chance_pct {
            inflict(AfflictionKind::BrokenArm, resolution);
        }
    }

    if profile.bite_chance_pct > 0 && rng.gen_range(0..100) < profile.bite_chance_pct {
        inflict(AfflictionKind::Bitten, resolution);
    }

    if let Some(kind) = profile.inflicts {
        inflict(kind, resolution);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn bat() -> AttackProfile {
        AttackProfile {
            damage: 10,
            penetration: 0.5,
            accuracy: 75,
            spread: 1,
            inflicts: None,
            bite_chance_pct: 0,
        }
    }

    fn buckshot() -> AttackProfile {
        AttackProfile {
            damage: 24,
            penetration: 1.0,
            accuracy: 100,
            spread: 3,
            inflicts: None,
            bite_chance_pct: 0,
        }
    }

    #[test]
    fn unarmored_chest_hit_deals_full_damage() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let profile = AttackProfile {
            accuracy: 100,
            ..bat()
        };
        let result = resolve_attack(
            &profile,
            &EffectSet::default(),
            &DefenderProfile::default(),
            Some(Limb::Chest),
            &CombatConfig::default(),
            &mut rng,
        );
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].limb, Limb::Chest);
        assert_eq!(result.total_damage(), 10);
        assert_eq!(result.total_reduced(), 0);
    }

    #[test]
    fn helmet_absorbs_low_penetration_without_wearing() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let profile = AttackProfile {
            accuracy: 100,
            ..bat()
        };
        let defender = DefenderProfile {
            helmet: Some(2.0),
            ..Default::default()
        };
        let result = resolve_attack(
            &profile,
            &EffectSet::default(),
            &defender,
            Some(Limb::Head),
            &CombatConfig::default(),
            &mut rng,
        );
        assert_eq!(result.hits[0].armor_struck, Some(ArmorSlot::Helmet));
        assert!(result.hits[0].armor_reduction >= 5);
        assert!(!result.hits[0].armor_worn);
        assert_eq!(result.worn_armor().count(), 0);
    }

    #[test]
    fn spread_ammo_hits_three_distinct_limbs() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let result = resolve_attack(
            &buckshot(),
            &EffectSet::default(),
            &DefenderProfile::default(),
            None,
            &CombatConfig::default(),
            &mut rng,
        );
        assert_eq!(result.hits.len(), 3);
        for hit in &result.hits {
            assert!((hit.base_damage - 8.0).abs() < 1e-9);
        }
        let mut limbs: Vec<_> = result.hits.iter().map(|h| h.limb).collect();
        limbs.sort();
        limbs.dedup();
        assert_eq!(limbs.len(), 3);
    }

    #[test]
    fn missed_called_shot_deals_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let profile = AttackProfile {
            accuracy: 0,
            ..bat()
        };
        let result = resolve_attack(
            &profile,
            &EffectSet::default(),
            &DefenderProfile::default(),
            Some(Limb::Head),
            &CombatConfig::default(),
            &mut rng,
        );
        assert!(result.called_shot_missed());
        assert!(result.hits.is_empty());
        assert_eq!(result.total_damage(), 0);
        assert!(result.inflicted.is_empty());
    }

    #[test]
    fn existing_affliction_is_not_inflicted_again() {
        let mut config = CombatConfig::default();
        config.afflictions.broken_arm_chance_pct = 100;
        let profile = AttackProfile {
            accuracy: 100,
            bite_chance_pct: 100,
            ..bat()
        };
        let defender = DefenderProfile {
            afflictions: vec![AfflictionKind::BrokenArm],
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let result = resolve_attack(
            &profile,
            &EffectSet::default(),
            &defender,
            Some(Limb::Arm),
            &config,
            &mut rng,
        );
        assert_eq!(result.inflicted.as_slice(), &[AfflictionKind::Bitten]);
    }

    #[test]
    fn certain_arm_break_is_inflicted_once() {
        let mut config = CombatConfig::default();
        config.afflictions.broken_arm_chance_pct = 100;
        let profile = AttackProfile {
            accuracy: 100,
            ..bat()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let result = resolve_attack(
            &profile,
            &EffectSet::default(),
            &DefenderProfile::default(),
            Some(Limb::Arm),
            &config,
            &mut rng,
        );
        assert_eq!(result.inflicted.as_slice(), &[AfflictionKind::BrokenArm]);
    }

    proptest! {
        #[test]
        fn spread_never_repeats_a_limb_and_conserves_damage(
            seed in any::<u64>(),
            damage in 1u32..200,
            spread in 1u8..=4,
        ) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let profile = AttackProfile { damage, spread, ..buckshot() };
            let result = resolve_attack(
                &profile,
                &EffectSet::default(),
                &DefenderProfile::default(),
                None,
                &CombatConfig::default(),
                &mut rng,
            );
            prop_assert_eq!(result.hits.len(), usize::from(spread));
            let mut limbs: Vec<_> = result.hits.iter().map(|h| h.limb).collect();
            limbs.sort();
            limbs.dedup();
            prop_assert_eq!(limbs.len(), usize::from(spread));

            let base_sum: f64 = result.hits.iter().map(|h| h.base_damage).sum();
            prop_assert!((base_sum - f64::from(damage)).abs() < 1e-6);
        }
    }
}
