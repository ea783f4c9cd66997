//! Loot rolled when an NPC is killed.
//!
//! Drops are produced by [`DropRolls`], a consuming iterator: guaranteed
//! equipment first, then one draw per configured roll. Rolls that land on an
//! empty tier yield nothing, so a kill produces at most `rolls` rolled items.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;
use strum::Display;

use crate::config::LootTable;
use crate::env::{Catalog, NpcTemplate};
use crate::state::ItemKey;

/// Loot tier of a rolled drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Rarest,
}

/// Why an item dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DropSource {
    /// The NPC was wearing or wielding it.
    Equipment,
    Roll(Rarity),
}

/// One item to create for the killer(s).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemDrop {
    pub item: ItemKey,
    pub durability: Option<u32>,
    pub source: DropSource,
}

/// Sample a "used" durability in `[max(1, max / divisor), max]`.
pub fn used_durability<R: Rng + ?Sized>(max: Option<u32>, divisor: u32, rng: &mut R) -> Option<u32> {
    let max = max?;
    if max == 0 {
        return Some(0);
    }
    let low = (max / divisor.max(1)).max(1);
    Some(rng.gen_range(low..=max))
}

/// Finite, non-restartable sequence of drops for one kill.
pub struct DropRolls<'a, R: Rng + ?Sized> {
    pending: VecDeque<ItemDrop>,
    rolls_left: u32,
    npc: &'a NpcTemplate,
    catalog: Catalog<'a>,
    table: &'a LootTable,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> DropRolls<'a, R> {
    fn new(
        npc: &'a NpcTemplate,
        catalog: Catalog<'a>,
        table: &'a LootTable,
        rng: &'a mut R,
        with_equipment: bool,
        with_rolls: bool,
    ) -> Self {
        let mut rolls = Self {
            pending: VecDeque::new(),
            rolls_left: if with_rolls { npc.drops.rolls } else { 0 },
            npc,
            catalog,
            table,
            rng,
        };
        if with_equipment {
            rolls.queue_equipment();
        }
        rolls
    }

    fn queue_equipment(&mut self) {
        let divisor = if self.npc.boss {
            self.table.boss_durability_divisor
        } else {
            self.table.durability_divisor
        };

        let worn = [self.npc.armor.as_ref(), self.npc.helmet.as_ref(), self.npc.weapon()];
        for key in worn.into_iter().flatten() {
            let Some(template) = self.catalog.items.template(key) else {
                continue;
            };
            let durability = used_durability(template.durability, divisor, self.rng);
            self.pending.push_back(ItemDrop {
                item: key.clone(),
                durability,
                source: DropSource::Equipment,
            });
        }

        if let Some(ammo) = self.npc.ammo() {
            let max = if self.npc.boss {
                self.table.boss_ammo_drop_max
            } else {
                self.table.ammo_drop_max
            };
            let min = self.table.ammo_drop_min.min(max);
            let count = self.rng.gen_range(min..=max);
            for _ in 0..count {
                self.pending.push_back(ItemDrop {
                    item: ammo.clone(),
                    durability: None,
                    source: DropSource::Equipment,
                });
            }
        }
    }

    fn roll_once(&mut self) -> Option<ItemDrop> {
        let tiers = [
            (Rarity::Common, self.table.common_weight, &self.npc.drops.common),
            (Rarity::Uncommon, self.table.uncommon_weight, &self.npc.drops.uncommon),
            (Rarity::Rare, self.table.rare_weight, &self.npc.drops.rare),
            (Rarity::Rarest, self.table.rarest_weight, &self.npc.drops.rarest),
        ];
        let total: u32 = tiers.iter().map(|(_, w, _)| *w).sum();
        if total == 0 {
            return None;
        }

        let mut pick = self.rng.gen_range(0..total);
        let (rarity, pool) = tiers.iter().find_map(|(rarity, weight, pool)| {
            if pick < *weight {
                Some((*rarity, *pool))
            } else {
                pick -= *weight;
                None
            }
        })?;

        let key = pool.choose(self.rng)?;
        let durability = self
            .catalog
            .items
            .template(key)
            .and_then(|t| used_durability(t.durability, self.table.durability_divisor, self.rng));

        Some(ItemDrop {
            item: key.clone(),
            durability,
            source: DropSource::Roll(rarity),
        })
    }
}

impl<R: Rng + ?Sized> Iterator for DropRolls<'_, R> {
    type Item = ItemDrop;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(drop) = self.pending.pop_front() {
            return Some(drop);
        }
        while self.rolls_left > 0 {
            self.rolls_left -= 1;
            if let Some(drop) = self.roll_once() {
                return Some(drop);
            }
        }
        None
    }
}

/// All drops for a kill: worn equipment followed by tier rolls.
pub fn roll_drops<'a, R: Rng + ?Sized>(
    npc: &'a NpcTemplate,
    catalog: Catalog<'a>,
    table: &'a LootTable,
    rng: &'a mut R,
) -> DropRolls<'a, R> {
    DropRolls::new(npc, catalog, table, rng, true, true)
}

/// Only the NPC's worn armor, helmet, weapon and ammunition.
pub fn guaranteed_drops<'a, R: Rng + ?Sized>(
    npc: &'a NpcTemplate,
    catalog: Catalog<'a>,
    table: &'a LootTable,
    rng: &'a mut R,
) -> DropRolls<'a, R> {
    DropRolls::new(npc, catalog, table, rng, true, false)
}

/// Only the tier rolls.
pub fn rolled_drops<'a, R: Rng + ?Sized>(
    npc: &'a NpcTemplate,
    catalog: Catalog<'a>,
    table: &'a LootTable,
    rng: &'a mut R,
) -> DropRolls<'a, R> {
    DropRolls::new(npc, catalog, table, rng, false, true)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::env::{
        Ammunition, ArmorItem, DropTable, ItemKind, ItemOracle, ItemTemplate, NpcKind, NpcOracle,
        RangedWeapon,
    };
    use crate::state::NpcKey;

    struct Items(HashMap<ItemKey, ItemTemplate>);

    impl ItemOracle for Items {
        fn template(&self, key: &ItemKey) -> Option<&ItemTemplate> {
            self.0.get(key)
        }

        fn all_templates(&self) -> Vec<&ItemTemplate> {
            self.0.values().collect()
        }
    }

    struct NoNpcs;

    impl NpcOracle for NoNpcs {
        fn template(&self, _key: &NpcKey) -> Option<&NpcTemplate> {
            None
        }

        fn all_templates(&self) -> Vec<&NpcTemplate> {
            Vec::new()
        }
    }

    fn template(key: &str, durability: Option<u32>, kind: ItemKind) -> ItemTemplate {
        ItemTemplate {
            key: key.into(),
            display: key.into(),
            durability,
            kind,
        }
    }

    fn items() -> Items {
        let list = [
            template("cloth_armor", Some(12), ItemKind::Armor(ArmorItem { level: 1.0 })),
            template("cloth_helmet", Some(8), ItemKind::Helmet(ArmorItem { level: 1.0 })),
            template(
                "luger",
                Some(10),
                ItemKind::Ranged(RangedWeapon {
                    accuracy: 50,
                    speed: 15,
                    fire_rate: 30,
                }),
            ),
            template(
                ".22LR_bullet",
                None,
                ItemKind::Ammunition(Ammunition {
                    damage: 12,
                    penetration: 0.8,
                    ammo_for: vec!["luger".into()],
                    spreads_damage_to_limbs: None,
                }),
            ),
            template("bandage", Some(1), ItemKind::Misc),
        ];
        Items(list.into_iter().map(|t| (t.key.clone(), t)).collect())
    }

    fn raider(rolls: u32) -> NpcTemplate {
        NpcTemplate {
            key: "raider_weak".into(),
            display: "Raider".into(),
            health: 30,
            damage: 25,
            xp: 40,
            boss: false,
            kind: NpcKind::Raider {
                weapon: "luger".into(),
                ammo: Some(".22LR_bullet".into()),
            },
            armor: Some("cloth_armor".into()),
            helmet: Some("cloth_helmet".into()),
            drops: DropTable {
                common: vec!["bandage".into()],
                rolls,
                ..Default::default()
            },
            uses_heals: vec![],
            uses_stimulants: vec![],
            quotes: vec![],
        }
    }

    #[test]
    fn raider_guarantees_its_equipment_with_used_durability() {
        let items = items();
        let catalog = Catalog::new(&items, &NoNpcs);
        let npc = raider(0);
        let table = LootTable::default();

        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let drops: Vec<_> = guaranteed_drops(&npc, catalog, &table, &mut rng).collect();

            let armor = drops.iter().find(|d| d.item.as_str() == "cloth_armor").unwrap();
            let dura = armor.durability.unwrap();
            assert!((3..=12).contains(&dura));

            let ammo = drops.iter().filter(|d| d.item.as_str() == ".22LR_bullet").count();
            assert!((1..=3).contains(&ammo));
            assert!(drops.iter().all(|d| d.source == DropSource::Equipment));
        }
    }

    #[test]
    fn rolls_yield_at_most_one_item_each() {
        let items = items();
        let catalog = Catalog::new(&items, &NoNpcs);
        let npc = raider(5);
        let table = LootTable::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let drops: Vec<_> = rolled_drops(&npc, catalog, &table, &mut rng).collect();
        assert!(drops.len() <= 5);
        for drop in &drops {
            assert_eq!(drop.item.as_str(), "bandage");
            assert_eq!(drop.source, DropSource::Roll(Rarity::Common));
        }
    }

    #[test]
    fn only_common_weight_always_drops() {
        let items = items();
        let catalog = Catalog::new(&items, &NoNpcs);
        let npc = raider(4);
        let table = LootTable {
            uncommon_weight: 0,
            rare_weight: 0,
            rarest_weight: 0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let rolled = rolled_drops(&npc, catalog, &table, &mut rng).count();
        assert_eq!(rolled, 4);

        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let all = roll_drops(&npc, catalog, &table, &mut rng).count();
        assert!(all >= 4 + 3 + 1);
    }

    #[test]
    fn used_durability_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(used_durability(None, 4, &mut rng), None);
        assert_eq!(used_durability(Some(1), 4, &mut rng), Some(1));
        for _ in 0..100 {
            let d = used_durability(Some(20), 2, &mut rng).unwrap();
            assert!((10..=20).contains(&d));
        }
    }
}
