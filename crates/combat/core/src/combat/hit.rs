//! Hit selection.

use rand::Rng;
use strum::IntoEnumIterator;

use crate::config::HitTable;

use super::Limb;

/// Outcome of a hit roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitRoll {
    /// Limb the attack landed on.
    pub limb: Limb,
    /// Whether the roll was precise.
    pub accurate: bool,
    /// True only if a limb was requested and this precise roll landed on it.
    pub requested_limb_hit: bool,
}

/// Roll whether an attack lands precisely and pick the limb it hits.
///
/// # Formula
///
/// ```text
/// roll     = uniform(1..=100)
/// accurate = roll <= clamp(accuracy, 0, 100)
///
/// accurate && requested      => requested limb
/// accurate && !requested     => weighted draw from the default table
/// !accurate                  => weighted draw, requested_limb_hit = false
/// ```
///
/// # Arguments
///
/// * `accuracy` - Weapon accuracy plus the attacker's accuracy bonus
/// * `requested` - Limb the attacker aimed at, if any
/// * `table` - Default limb distribution
/// * `rng` - Random source
pub fn resolve_hit<R: Rng + ?Sized>(
    accuracy: i32,
    requested: Option<Limb>,
    table: &HitTable,
    rng: &mut R,
) -> HitRoll {
    let roll: i32 = rng.gen_range(1..=100);
    let accurate = roll <= accuracy.clamp(0, 100);

    match (accurate, requested) {
        (true, Some(limb)) => HitRoll {
            limb,
            accurate,
            requested_limb_hit: true,
        },
        _ => HitRoll {
            limb: draw_limb(table, &[], rng).unwrap_or(Limb::Chest),
            accurate,
            requested_limb_hit: false,
        },
    }
}

/// Weighted draw of a limb from the default table, skipping `exclude`.
///
/// Falls back to a uniform draw if every remaining limb has zero weight.
/// Returns `None` only when every limb is excluded.
pub fn draw_limb<R: Rng + ?Sized>(table: &HitTable, exclude: &[Limb], rng: &mut R) -> Option<Limb> {
    let candidates: Vec<Limb> = Limb::iter().filter(|l| !exclude.contains(l)).collect();
    if candidates.is_empty() {
        return None;
    }

    let total: u32 = candidates.iter().map(|l| table.weight(*l)).sum();
    if total == 0 {
        return Some(candidates[rng.gen_range(0..candidates.len())]);
    }

    let mut pick = rng.gen_range(0..total);
    for limb in &candidates {
        let weight = table.weight(*limb);
        if pick < weight {
            return Some(*limb);
        }
        pick -= weight;
    }

    candidates.last().copied()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn perfect_accuracy_always_hits_requested_limb() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let roll = resolve_hit(100, Some(Limb::Head), &HitTable::default(), &mut rng);
            assert_eq!(roll.limb, Limb::Head);
            assert!(roll.requested_limb_hit);
        }
    }

    #[test]
    fn zero_accuracy_never_reports_requested_hit() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..200 {
            let roll = resolve_hit(0, Some(Limb::Chest), &HitTable::default(), &mut rng);
            assert!(!roll.accurate);
            assert!(!roll.requested_limb_hit);
        }
    }

    #[test]
    fn untargeted_hit_never_reports_requested_hit() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let roll = resolve_hit(100, None, &HitTable::default(), &mut rng);
        assert!(roll.accurate);
        assert!(!roll.requested_limb_hit);
    }

    #[test]
    fn draw_respects_exclusions_and_zero_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let only_legs = HitTable {
            head_weight: 0,
            chest_weight: 0,
            arm_weight: 0,
            leg_weight: 1,
        };
        for _ in 0..50 {
            assert_eq!(draw_limb(&only_legs, &[], &mut rng), Some(Limb::Leg));
        }

        let remaining = draw_limb(&only_legs, &[Limb::Leg], &mut rng);
        assert!(matches!(remaining, Some(Limb::Head | Limb::Chest | Limb::Arm)));

        let all = [Limb::Head, Limb::Chest, Limb::Arm, Limb::Leg];
        assert_eq!(draw_limb(&HitTable::default(), &all, &mut rng), None);
    }
}
