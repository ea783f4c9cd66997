//! Per-turn NPC action policy.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::NpcPolicyTable;
use crate::env::{Catalog, NpcTemplate};
use crate::state::ItemKey;

/// What an NPC does this turn.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NpcAction {
    Attack,
    Heal { item: ItemKey },
    Stimulant { item: ItemKey },
    Idle,
}

/// An NPC's decision together with its turn-order speed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NpcChoice {
    pub action: NpcAction,
    pub speed: u32,
}

/// Decide an NPC's action for this turn.
///
/// # Policy
///
/// 1. At or below `heal_threshold_pct` of max health, holding a usable
///    medical item and passing a `heal_chance_pct` roll: heal
/// 2. A stimulant from `uses_stimulants` that is not active yet and a
///    passing `stimulant_chance_pct` roll: apply it
/// 3. Able to deal damage: attack
/// 4. Otherwise: idle
///
/// Pure: no state is touched. The caller resolves the returned choice.
pub fn decide<R: Rng + ?Sized>(
    npc: &NpcTemplate,
    active_stimulants: &[ItemKey],
    current_health: u32,
    catalog: Catalog<'_>,
    table: &NpcPolicyTable,
    rng: &mut R,
) -> NpcChoice {
    let health_pct = if npc.health == 0 {
        0
    } else {
        u64::from(current_health) * 100 / u64::from(npc.health)
    };

    if health_pct <= u64::from(table.heal_threshold_pct) && current_health < npc.health {
        let heals: Vec<(&ItemKey, u32)> = npc
            .uses_heals
            .iter()
            .filter_map(|key| {
                let template = catalog.items.template(key)?;
                template.medical().map(|m| (key, m.speed))
            })
            .collect();

        if !heals.is_empty() && rng.gen_range(0..100) < table.heal_chance_pct {
            if let Some((item, speed)) = heals.choose(rng) {
                return NpcChoice {
                    action: NpcAction::Heal {
                        item: (*item).clone(),
                    },
                    speed: *speed,
                };
            }
        }
    }

    let inactive: Vec<(&ItemKey, u32)> = npc
        .uses_stimulants
        .iter()
        .filter(|key| !active_stimulants.contains(*key))
        .filter_map(|key| {
            let template = catalog.items.template(key)?;
            template.stimulant().map(|s| (key, s.speed))
        })
        .collect();

    if !inactive.is_empty() && rng.gen_range(0..100) < table.stimulant_chance_pct {
        if let Some((item, speed)) = inactive.choose(rng) {
            return NpcChoice {
                action: NpcAction::Stimulant {
                    item: (*item).clone(),
                },
                speed: *speed,
            };
        }
    }

    if npc.damage > 0 {
        return NpcChoice {
            action: NpcAction::Attack,
            speed: attack_speed(npc, catalog, table),
        };
    }

    NpcChoice {
        action: NpcAction::Idle,
        speed: 0,
    }
}

fn attack_speed(npc: &NpcTemplate, catalog: Catalog<'_>, table: &NpcPolicyTable) -> u32 {
    npc.weapon()
        .and_then(|key| catalog.items.template(key))
        .filter(|t| t.is_weapon())
        .map(|t| t.speed())
        .unwrap_or(table.fallback_speed)
}
