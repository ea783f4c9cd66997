//! Transactional building blocks shared by duel turns and open-world attacks.
//!
//! Every function here runs inside an open [`GuardedStep`] and only stages
//! writes. The caller decides whether the step settles as applied or skipped.

use combat_core::{
    AfflictionKind, ArmorSlot, AttackProfile, AttackResolution, Catalog, CombatConfig,
    DefenderProfile, EffectSet, ItemDrop, ItemId, ItemInstance, ItemKey, ItemKind, ItemTemplate,
    Limb, LocationId, NpcTemplate, PlayerId, StimulantItem, aggregate, guaranteed_drops,
    resolve_attack, roll_drops, rolled_drops,
};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::duel::{Actor, EncounterKind, LimbReport, LootAward, NpcState, TurnMessage};
use crate::guard::{GuardedStep, StepError};
use crate::oracle::OracleManager;

/// Weapon, ammunition and aim picked for one attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponChoice {
    pub weapon: ItemId,
    pub ammo: Option<ItemId>,
    pub limb: Option<Limb>,
}

impl WeaponChoice {
    pub fn new(weapon: ItemId) -> Self {
        Self {
            weapon,
            ammo: None,
            limb: None,
        }
    }

    pub fn with_ammo(mut self, ammo: ItemId) -> Self {
        self.ammo = Some(ammo);
        self
    }

    pub fn aimed_at(mut self, limb: Limb) -> Self {
        self.limb = Some(limb);
        self
    }
}

/// Content lookups and balance tables for one step.
#[derive(Clone, Copy)]
pub(crate) struct Rules<'a> {
    pub catalog: Catalog<'a>,
    pub config: &'a CombatConfig,
}

impl<'a> Rules<'a> {
    pub fn new(oracles: &'a OracleManager) -> Self {
        Self {
            catalog: oracles.catalog(),
            config: oracles.config(),
        }
    }
}

/// What happens to a dead player's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Remains {
    /// Destroyed along with the body (died in a duel).
    Lost,
    /// Left on the ground for anyone to pick up (died in the open world).
    Dropped(LocationId),
}

/// Equipped protection, kept so worn armor can be written back.
#[derive(Debug, Clone, Default)]
pub(crate) struct Loadout {
    armor: Option<ItemInstance>,
    helmet: Option<ItemInstance>,
}

impl Loadout {
    fn slot(&self, slot: ArmorSlot) -> Option<&ItemInstance> {
        match slot {
            ArmorSlot::BodyArmor => self.armor.as_ref(),
            ArmorSlot::Helmet => self.helmet.as_ref(),
        }
    }
}

/// A player attack, resolved, with the weapon and ammunition already spent.
pub(crate) struct Strike<'a> {
    pub weapon: &'a ItemTemplate,
    pub effects: EffectSet,
    pub resolution: AttackResolution,
    pub messages: Vec<TurnMessage>,
}

/// An NPC attack on a player, resolved and written.
pub(crate) struct NpcStrike {
    pub messages: Vec<TurnMessage>,
    pub damage: u32,
    pub killed: bool,
}

struct ArmedAttack<'a> {
    weapon: ItemInstance,
    template: &'a ItemTemplate,
    ammo: Option<ItemInstance>,
    profile: AttackProfile,
}

/// Afflictions whose cooldown is still running on `player`.
pub(crate) async fn active_afflictions(step: &mut GuardedStep, player: PlayerId) -> Result<Vec<AfflictionKind>, StepError> {
    let mut active = Vec::new();
    for kind in AfflictionKind::ALL {
        if step.cooldown(player, kind.cooldown_key()).await?.is_some() {
            active.push(kind);
        }
    }
    Ok(active)
}

/// Aggregate the player's running stimulants and afflictions.
pub(crate) async fn player_effects(
    step: &mut GuardedStep,
    rules: Rules<'_>,
    player: PlayerId,
) -> Result<(EffectSet, Vec<AfflictionKind>), StepError> {
    let afflictions = active_afflictions(step, player).await?;
    let mut stimulants = Vec::new();
    for template in rules.catalog.items.stimulants() {
        let Some(stimulant) = template.stimulant() else {
            continue;
        };
        let key = StimulantItem::cooldown_key(&template.key);
        if step.cooldown(player, &key).await?.is_some() {
            stimulants.push(&stimulant.effects);
        }
    }
    let effects = aggregate(stimulants, &afflictions, &rules.config.afflictions);
    Ok((effects, afflictions))
}

/// The player as a defender: equipped armor plus current effects.
pub(crate) async fn player_defense(
    step: &mut GuardedStep,
    rules: Rules<'_>,
    player: PlayerId,
) -> Result<(DefenderProfile, Loadout), StepError> {
    let mut profile = DefenderProfile::default();
    let mut loadout = Loadout::default();

    for item in step.inventory(player, true).await? {
        if !item.equipped {
            continue;
        }
        let template = rules.catalog.item(&item.template)?;
        if let Some(level) = template.armor_level(ArmorSlot::BodyArmor) {
            profile.armor = Some(level);
            loadout.armor = Some(item);
        } else if let Some(level) = template.armor_level(ArmorSlot::Helmet) {
            profile.helmet = Some(level);
            loadout.helmet = Some(item);
        }
    }

    let (effects, afflictions) = player_effects(step, rules, player).await?;
    profile.effects = effects;
    profile.afflictions = afflictions;
    Ok((profile, loadout))
}

/// Effects of the stimulants and afflictions a duel NPC carries.
pub(crate) fn npc_effects(npc: &NpcState, rules: Rules<'_>) -> EffectSet {
    let stimulants = npc
        .stimulants
        .iter()
        .filter_map(|key| rules.catalog.items.template(key))
        .filter_map(ItemTemplate::stimulant)
        .map(|s| &s.effects);
    aggregate(stimulants, &npc.afflictions, &rules.config.afflictions)
}

/// The NPC as a defender. NPC armor never wears.
///
/// Open-world NPCs carry no session state, so they defend with armor only.
pub(crate) fn npc_defense(
    npc: &NpcTemplate,
    rules: Rules<'_>,
    state: Option<&NpcState>,
) -> Result<DefenderProfile, StepError> {
    let level = |key: Option<&ItemKey>, slot: ArmorSlot| -> Result<Option<f64>, StepError> {
        match key {
            Some(key) => Ok(rules.catalog.item(key)?.armor_level(slot)),
            None => Ok(None),
        }
    };
    Ok(DefenderProfile {
        armor: level(npc.armor.as_ref(), ArmorSlot::BodyArmor)?,
        helmet: level(npc.helmet.as_ref(), ArmorSlot::Helmet)?,
        effects: state.map(|s| npc_effects(s, rules)).unwrap_or_default(),
        afflictions: state.map(|s| s.afflictions.clone()).unwrap_or_default(),
    })
}

async fn ready_weapon<'a>(
    step: &mut GuardedStep,
    rules: Rules<'a>,
    player: PlayerId,
    choice: WeaponChoice,
) -> Result<ArmedAttack<'a>, StepError> {
    let weapon = step.require_item(player, choice.weapon).await?;
    let template = rules.catalog.item(&weapon.template)?;

    // Only ranged weapons load ammunition; anything else ignores it.
    let ammo = match (&template.kind, choice.ammo) {
        (ItemKind::Ranged(_), Some(ammo)) => Some(step.require_item(player, ammo).await?),
        _ => None,
    };
    let ammo_template = ammo.as_ref().map(|a| rules.catalog.item(&a.template)).transpose()?;
    let profile = AttackProfile::for_weapon(template, ammo_template)?;

    Ok(ArmedAttack {
        weapon,
        template,
        ammo,
        profile,
    })
}

/// Wear the weapon by one use and consume one round.
async fn spend_weapon(step: &mut GuardedStep, player: PlayerId, armed: &ArmedAttack<'_>) -> Result<Vec<TurnMessage>, StepError> {
    let mut messages = Vec::new();
    if step.decrement_durability(armed.weapon.id, 1).await? == Some(0) {
        step.delete_item(armed.weapon.id).await?;
        messages.push(TurnMessage::WeaponBroke {
            player,
            item: armed.template.key.clone(),
        });
    }
    if let Some(ammo) = &armed.ammo {
        step.delete_item(ammo.id).await?;
    }
    Ok(messages)
}

/// Resolve a player attack against `defender`.
///
/// The weapon wears and the round is spent even when a called shot misses.
pub(crate) async fn strike<'a, R: Rng + Send + ?Sized>(
    step: &mut GuardedStep,
    rules: Rules<'a>,
    attacker: PlayerId,
    choice: WeaponChoice,
    target: (Actor, &DefenderProfile),
    rng: &mut R,
) -> Result<Strike<'a>, StepError> {
    let (target, defender) = target;
    let armed = ready_weapon(step, rules, attacker, choice).await?;
    let (effects, _) = player_effects(step, rules, attacker).await?;
    let resolution = resolve_attack(&armed.profile, &effects, defender, choice.limb, rules.config, rng);

    debug!(
        target: "runtime::duel",
        player = attacker.0,
        weapon = %armed.template.key,
        damage = resolution.total_damage(),
        missed = resolution.called_shot_missed(),
        "player attack resolved"
    );

    let mut messages = vec![attack_message(
        Actor::Player(attacker),
        target.clone(),
        &armed.template.display,
        &resolution,
    )];
    messages.extend(spend_weapon(step, attacker, &armed).await?);
    messages.extend(afflicted_messages(&target, &resolution.inflicted));

    Ok(Strike {
        weapon: armed.template,
        effects,
        resolution,
        messages,
    })
}

/// Resolve an NPC's attack on `target` and write its consequences.
///
/// A killed target leaves its inventory as `remains` says.
pub(crate) async fn npc_strike<R: Rng + Send + ?Sized>(
    step: &mut GuardedStep,
    rules: Rules<'_>,
    npc: &NpcState,
    (target, remains): (PlayerId, Remains),
    rng: &mut R,
) -> Result<NpcStrike, StepError> {
    let template = rules.catalog.npc(&npc.key)?;
    let profile = AttackProfile::for_npc(template, rules.catalog, &rules.config.npc)?;
    let (defender, loadout) = player_defense(step, rules, target).await?;
    let resolution = resolve_attack(&profile, &npc_effects(npc, rules), &defender, None, rules.config, rng);

    let weapon = template
        .weapon()
        .and_then(|key| rules.catalog.items.template(key))
        .map_or("bare hands", |t| t.display.as_str());
    let npc_actor = Actor::Npc(npc.display.clone());
    let mut messages = vec![attack_message(npc_actor.clone(), Actor::Player(target), weapon, &resolution)];
    messages.extend(wear_player_armor(step, target, &resolution, &loadout).await?);

    afflict_player(step, rules, target, &resolution.inflicted).await?;
    messages.extend(afflicted_messages(&Actor::Player(target), &resolution.inflicted));

    let damage = resolution.total_damage();
    let health = step.mutate_health(target, -i64::from(damage)).await?;
    let killed = health == 0;
    if killed {
        kill_player(step, target, remains).await?;
        messages.push(TurnMessage::Died {
            player: target,
            killer: npc_actor,
        });
    }

    Ok(NpcStrike {
        messages,
        damage,
        killed,
    })
}

/// Lower durability on every armor piece the attack wore down.
pub(crate) async fn wear_player_armor(
    step: &mut GuardedStep,
    player: PlayerId,
    resolution: &AttackResolution,
    loadout: &Loadout,
) -> Result<Vec<TurnMessage>, StepError> {
    let slots: Vec<ArmorSlot> = resolution.worn_armor().collect();
    let mut messages = Vec::new();
    for slot in slots {
        let Some(item) = loadout.slot(slot) else {
            continue;
        };
        match step.decrement_durability(item.id, 1).await? {
            Some(0) => {
                step.delete_item(item.id).await?;
                messages.push(TurnMessage::ArmorBroke {
                    player,
                    item: item.template.clone(),
                });
            }
            Some(remaining) => messages.push(TurnMessage::ArmorWorn {
                player,
                item: item.template.clone(),
                remaining,
            }),
            None => {}
        }
    }
    Ok(messages)
}

/// Start the cooldown of every newly inflicted affliction.
pub(crate) async fn afflict_player(
    step: &mut GuardedStep,
    rules: Rules<'_>,
    player: PlayerId,
    inflicted: &[AfflictionKind],
) -> Result<(), StepError> {
    for kind in inflicted {
        let duration = rules.config.afflictions.duration(*kind);
        step.set_cooldown(player, kind.cooldown_key(), duration).await?;
    }
    Ok(())
}

/// Death bookkeeping: inventory, death counter, respawn at full health.
pub(crate) async fn kill_player(step: &mut GuardedStep, player: PlayerId, remains: Remains) -> Result<(), StepError> {
    for item in step.inventory(player, true).await? {
        match remains {
            Remains::Lost => step.delete_item(item.id).await?,
            Remains::Dropped(location) => step.drop_to_ground(location, item.id).await?,
        }
    }
    step.record_death(player).await?;
    let row = step.combatant(player, true).await?;
    step.mutate_health(player, i64::from(row.max_health)).await?;
    step.set_in_combat(player, false).await?;
    for kind in AfflictionKind::ALL {
        step.clear_cooldown(player, kind.cooldown_key()).await?;
    }
    Ok(())
}

/// Credit the kill and hand out the NPC's drops.
///
/// Scavenge kills go to the killer. Boss kills credit every survivor, split
/// the worn equipment among them at random, and give each their own rolls.
pub(crate) async fn award_kill<R: Rng + Send + ?Sized>(
    step: &mut GuardedStep,
    rules: Rules<'_>,
    npc: &NpcTemplate,
    kind: EncounterKind,
    killer: PlayerId,
    survivors: &[PlayerId],
    rng: &mut R,
) -> Result<Vec<LootAward>, StepError> {
    let table = &rules.config.loot;
    match kind {
        EncounterKind::Scavenge => {
            step.credit_kill(killer, npc.xp, npc.boss).await?;
            let drops: Vec<ItemDrop> = roll_drops(npc, rules.catalog, table, rng).collect();
            grant_drops(step, killer, drops).await
        }
        EncounterKind::Boss => {
            let survivors = if survivors.is_empty() {
                std::slice::from_ref(&killer)
            } else {
                survivors
            };
            for player in survivors {
                step.credit_kill(*player, npc.xp, true).await?;
            }

            let mut awards = Vec::new();
            let equipment: Vec<ItemDrop> = guaranteed_drops(npc, rules.catalog, table, rng).collect();
            for drop in equipment {
                let Some(player) = survivors.choose(rng).copied() else {
                    continue;
                };
                awards.extend(grant_drops(step, player, vec![drop]).await?);
            }
            for player in survivors {
                let rolled: Vec<ItemDrop> = rolled_drops(npc, rules.catalog, table, rng).collect();
                awards.extend(grant_drops(step, *player, rolled).await?);
            }
            Ok(awards)
        }
    }
}

/// Credit an open-world kill and leave the NPC's drops on the ground.
pub(crate) async fn drop_kill<R: Rng + Send + ?Sized>(
    step: &mut GuardedStep,
    rules: Rules<'_>,
    npc: &NpcTemplate,
    killer: PlayerId,
    location: LocationId,
    rng: &mut R,
) -> Result<Vec<LootAward>, StepError> {
    step.credit_kill(killer, npc.xp, npc.boss).await?;
    let drops: Vec<ItemDrop> = roll_drops(npc, rules.catalog, &rules.config.loot, rng).collect();
    place_drops(step, killer, drops, Some(location)).await
}

async fn grant_drops(step: &mut GuardedStep, player: PlayerId, drops: Vec<ItemDrop>) -> Result<Vec<LootAward>, StepError> {
    place_drops(step, player, drops, None).await
}

/// Create each drop in `player`'s inventory, or on the ground at `ground`.
async fn place_drops(
    step: &mut GuardedStep,
    player: PlayerId,
    drops: Vec<ItemDrop>,
    ground: Option<LocationId>,
) -> Result<Vec<LootAward>, StepError> {
    let mut awards = Vec::with_capacity(drops.len());
    for drop in drops {
        let item = step.create_item(&drop.item, drop.durability).await?;
        match ground {
            Some(location) => step.drop_to_ground(location, item.id).await?,
            None => step.add_item_to_inventory(player, item.id).await?,
        }
        awards.push(LootAward {
            player,
            item: item.id,
            template: item.template,
            durability: item.durability,
        });
    }
    Ok(awards)
}

/// Use up one charge of a consumable, deleting it on its last use.
async fn consume(step: &mut GuardedStep, item: &ItemInstance) -> Result<(), StepError> {
    if item.is_last_use() || step.decrement_durability(item.id, 1).await? == Some(0) {
        step.delete_item(item.id).await?;
    }
    Ok(())
}

/// Apply a medical item: restore health and cure the afflictions it treats.
pub(crate) async fn heal(step: &mut GuardedStep, rules: Rules<'_>, player: PlayerId, item: ItemId) -> Result<TurnMessage, StepError> {
    let instance = step.require_item(player, item).await?;
    let template = rules.catalog.item(&instance.template)?;
    let Some(medical) = template.medical() else {
        return Err(StepError::Validation(format!("{} is not a medical item", template.display)));
    };

    let row = step.combatant(player, true).await?;
    let active = active_afflictions(step, player).await?;
    let cured: Vec<AfflictionKind> = medical.cures.iter().copied().filter(|k| active.contains(k)).collect();
    let amount = row.missing_health().min(medical.heals_for);
    if amount == 0 && cured.is_empty() {
        return Err(StepError::Validation(format!(
            "{player} has nothing for the {} to treat",
            template.display
        )));
    }

    if amount > 0 {
        step.mutate_health(player, i64::from(amount)).await?;
    }
    for kind in &cured {
        step.clear_cooldown(player, kind.cooldown_key()).await?;
    }
    consume(step, &instance).await?;

    Ok(TurnMessage::Healed {
        actor: Actor::Player(player),
        item: template.key.clone(),
        amount,
        cured,
    })
}

/// Start a stimulant's timed effects.
pub(crate) async fn stimulate(step: &mut GuardedStep, rules: Rules<'_>, player: PlayerId, item: ItemId) -> Result<TurnMessage, StepError> {
    let instance = step.require_item(player, item).await?;
    let template = rules.catalog.item(&instance.template)?;
    let Some(stimulant) = template.stimulant() else {
        return Err(StepError::Validation(format!("{} is not a stimulant", template.display)));
    };

    // Re-applying restarts the timer; effects never stack.
    let key = StimulantItem::cooldown_key(&template.key);
    step.set_cooldown(player, &key, std::time::Duration::from_secs(stimulant.duration_secs))
        .await?;
    consume(step, &instance).await?;

    Ok(TurnMessage::Stimulated {
        actor: Actor::Player(player),
        item: template.key.clone(),
    })
}

pub(crate) fn attack_message(attacker: Actor, defender: Actor, weapon: &str, resolution: &AttackResolution) -> TurnMessage {
    TurnMessage::Attack {
        attacker,
        defender,
        weapon: weapon.to_string(),
        requested: resolution.requested_limb,
        missed: resolution.called_shot_missed(),
        hits: resolution
            .hits
            .iter()
            .map(|hit| LimbReport {
                limb: hit.limb,
                damage: hit.total_damage,
                reduced: hit.armor_reduction,
            })
            .collect(),
    }
}

fn afflicted_messages(target: &Actor, inflicted: &[AfflictionKind]) -> Vec<TurnMessage> {
    inflicted
        .iter()
        .map(|affliction| TurnMessage::Afflicted {
            target: target.clone(),
            affliction: *affliction,
        })
        .collect()
}

/// One loot line per player, in award order.
pub(crate) fn dropped_message(location: LocationId, awards: &[LootAward]) -> Option<TurnMessage> {
    (!awards.is_empty()).then(|| TurnMessage::LootDropped {
        location,
        items: awards.iter().map(|a| a.template.clone()).collect(),
    })
}

pub(crate) fn loot_messages(awards: &[LootAward]) -> Vec<TurnMessage> {
    let mut messages: Vec<TurnMessage> = Vec::new();
    for award in awards {
        let existing = messages.iter_mut().find_map(|message| match message {
            TurnMessage::Loot { player, items } if *player == award.player => Some(items),
            _ => None,
        });
        match existing {
            Some(items) => items.push(award.template.clone()),
            None => messages.push(TurnMessage::Loot {
                player: award.player,
                items: vec![award.template.clone()],
            }),
        }
    }
    messages
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use combat_content::{ContentFactory, LoadedContent};
    use combat_core::{CombatantState, HitTable};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::guard::{LockScope, StepOutcome, TransactionGuard};
    use crate::store::InMemoryStore;

    fn fixture() -> (InMemoryStore, TransactionGuard, OracleManager) {
        fixture_with(ContentFactory::sample().load_all().unwrap())
    }

    fn fixture_with(content: LoadedContent) -> (InMemoryStore, TransactionGuard, OracleManager) {
        let store = InMemoryStore::new();
        store.insert_combatant(CombatantState::new(PlayerId(1), 100)).unwrap();
        let guard = TransactionGuard::new(Arc::new(store.clone()));
        (store, guard, OracleManager::from_content(content))
    }

    #[tokio::test]
    async fn bandage_is_used_up_by_a_heal() {
        let (store, guard, oracles) = fixture();
        store
            .insert_combatant(CombatantState::new(PlayerId(1), 100).with_health(50))
            .unwrap();
        let bandage = store.give_item(PlayerId(1), "bandage", Some(1), false).unwrap();

        let scope = LockScope::new().combatant(PlayerId(1));
        let mut step = guard.begin(&scope).await.unwrap();
        let result = heal(&mut step, Rules::new(&oracles), PlayerId(1), bandage).await;
        let outcome = guard.settle(step, result).await;

        assert!(matches!(outcome, StepOutcome::Applied(TurnMessage::Healed { .. })));
        let row = store.combatant_row(PlayerId(1)).unwrap().unwrap();
        assert!(row.health > 50);
        assert!(store.inventory_of(PlayerId(1)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn healing_at_full_health_is_skipped() {
        let (store, guard, oracles) = fixture();
        let bandage = store.give_item(PlayerId(1), "bandage", Some(1), false).unwrap();

        let scope = LockScope::new().combatant(PlayerId(1));
        let mut step = guard.begin(&scope).await.unwrap();
        let result = heal(&mut step, Rules::new(&oracles), PlayerId(1), bandage).await;
        let outcome = guard.settle(step, result).await;

        assert!(matches!(outcome, StepOutcome::Skipped(_)));
        assert_eq!(store.inventory_of(PlayerId(1)).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_stimulant_refreshes_instead_of_stacking() {
        let (store, guard, oracles) = fixture();
        let first = store.give_item(PlayerId(1), "adrenaline_stimulant", Some(1), false).unwrap();
        let second = store.give_item(PlayerId(1), "adrenaline_stimulant", Some(1), false).unwrap();
        let scope = LockScope::new().combatant(PlayerId(1));

        for item in [first, second] {
            let mut step = guard.begin(&scope).await.unwrap();
            let result = stimulate(&mut step, Rules::new(&oracles), PlayerId(1), item).await;
            assert!(guard.settle(step, result).await.applied().is_some());
        }

        assert!(store.inventory_of(PlayerId(1)).unwrap().is_empty());
        let key = StimulantItem::cooldown_key(&ItemKey::from("adrenaline_stimulant"));
        assert!(store.cooldown_remaining(PlayerId(1), &key).unwrap().is_some());
        let mut step = guard.begin(&scope).await.unwrap();
        let (effects, _) = player_effects(&mut step, Rules::new(&oracles), PlayerId(1)).await.unwrap();
        assert_eq!(effects.damage_bonus_pct, 20);
    }

    async fn strike_walker(
        guard: &TransactionGuard,
        oracles: &OracleManager,
        choice: WeaponChoice,
    ) -> Vec<TurnMessage> {
        let rules = Rules::new(oracles);
        let walker = rules.catalog.npc(&"walker_weak".into()).unwrap();
        let defender = npc_defense(walker, rules, None).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let scope = LockScope::new().combatant(PlayerId(1));
        let mut step = guard.begin(&scope).await.unwrap();
        let target = (Actor::Npc(walker.display.clone()), &defender);
        let result = strike(&mut step, rules, PlayerId(1), choice, target, &mut rng)
            .await
            .map(|strike| strike.messages);
        guard.settle(step, result).await.applied().unwrap()
    }

    #[tokio::test]
    async fn last_swing_breaks_the_weapon() {
        let (store, guard, oracles) = fixture();
        let knife = store.give_item(PlayerId(1), "knife", Some(1), true).unwrap();

        let messages = strike_walker(&guard, &oracles, WeaponChoice::new(knife)).await;

        assert!(messages.contains(&TurnMessage::WeaponBroke {
            player: PlayerId(1),
            item: "knife".into(),
        }));
        assert!(store.inventory_of(PlayerId(1)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn firing_spends_one_round_and_wears_the_gun() {
        let (store, guard, oracles) = fixture();
        let luger = store.give_item(PlayerId(1), "luger", Some(10), true).unwrap();
        let round = store.give_item(PlayerId(1), ".22LR_bullet", None, false).unwrap();
        let spare = store.give_item(PlayerId(1), ".22LR_bullet", None, false).unwrap();

        let messages = strike_walker(&guard, &oracles, WeaponChoice::new(luger).with_ammo(round)).await;

        assert!(!messages.iter().any(|m| matches!(m, TurnMessage::WeaponBroke { .. })));
        let inventory = store.inventory_of(PlayerId(1)).unwrap();
        let gun = inventory.iter().find(|item| item.id == luger).unwrap();
        assert_eq!(gun.durability, Some(9));
        assert!(inventory.iter().all(|item| item.id != round));
        assert!(inventory.iter().any(|item| item.id == spare));
    }

    #[tokio::test]
    async fn npc_hits_wear_body_armor_until_it_breaks() {
        let mut content = ContentFactory::sample().load_all().unwrap();
        content.config.hit = HitTable {
            head_weight: 0,
            chest_weight: 1,
            arm_weight: 0,
            leg_weight: 0,
        };
        let (store, guard, oracles) = fixture_with(content);
        store.insert_combatant(CombatantState::new(PlayerId(1), 10_000)).unwrap();
        let armor = store.give_item(PlayerId(1), "cloth_armor", Some(2), true).unwrap();
        let rules = Rules::new(&oracles);
        let walker = NpcState::spawn(rules.catalog.npc(&"walker_weak".into()).unwrap());
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let scope = LockScope::new().combatant(PlayerId(1));

        let mut strikes = Vec::new();
        for _ in 0..2 {
            let mut step = guard.begin(&scope).await.unwrap();
            let result = npc_strike(&mut step, rules, &walker, (PlayerId(1), Remains::Lost), &mut rng).await;
            strikes.push(guard.settle(step, result).await.applied().unwrap());
        }

        assert!(strikes[0].messages.contains(&TurnMessage::ArmorWorn {
            player: PlayerId(1),
            item: "cloth_armor".into(),
            remaining: 1,
        }));
        assert!(strikes[1].messages.contains(&TurnMessage::ArmorBroke {
            player: PlayerId(1),
            item: "cloth_armor".into(),
        }));
        // Cloth absorbs part of the walker's 20 damage while it lasts.
        assert!(strikes[0].damage < 20);
        assert!(store.inventory_of(PlayerId(1)).unwrap().iter().all(|item| item.id != armor));
    }

    #[tokio::test]
    async fn open_world_kill_leaves_drops_on_the_ground() {
        let (store, guard, oracles) = fixture();
        let rules = Rules::new(&oracles);
        let raider = rules.catalog.npc(&"raider_weak".into()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let scope = LockScope::new().combatant(PlayerId(1));
        let mut step = guard.begin(&scope).await.unwrap();
        let result = drop_kill(&mut step, rules, raider, PlayerId(1), LocationId(3), &mut rng).await;
        let awards = guard.settle(step, result).await.applied().unwrap();

        // Worn armor, helmet and the luger always drop.
        for key in ["cloth_armor", "cloth_helmet", "luger"] {
            assert!(awards.iter().any(|a| a.template.as_str() == key));
        }
        let ground = store.ground_items(LocationId(3)).unwrap();
        assert_eq!(ground.len(), awards.len());
        assert!(store.inventory_of(PlayerId(1)).unwrap().is_empty());
        let row = store.combatant_row(PlayerId(1)).unwrap().unwrap();
        assert_eq!((row.kills, row.xp), (1, u64::from(raider.xp)));
        assert!(matches!(
            dropped_message(LocationId(3), &awards),
            Some(TurnMessage::LootDropped { items, .. }) if items.len() == awards.len()
        ));
    }

    #[tokio::test]
    async fn pvp_death_leaves_items_on_the_ground() {
        let (store, guard, _) = fixture();
        store.give_item(PlayerId(1), "knife", Some(2), true).unwrap();
        store.give_item(PlayerId(1), "bandage", Some(1), false).unwrap();
        store
            .insert_combatant(CombatantState::new(PlayerId(1), 100).with_health(0))
            .unwrap();

        let scope = LockScope::new().combatant(PlayerId(1));
        let mut step = guard.begin(&scope).await.unwrap();
        let result = kill_player(&mut step, PlayerId(1), Remains::Dropped(LocationId(3))).await;
        assert!(guard.settle(step, result).await.applied().is_some());

        assert!(store.inventory_of(PlayerId(1)).unwrap().is_empty());
        assert_eq!(store.ground_items(LocationId(3)).unwrap().len(), 2);
        let row = store.combatant_row(PlayerId(1)).unwrap().unwrap();
        assert_eq!(row.deaths, 1);
        assert_eq!(row.health, row.max_health);
    }

    #[tokio::test]
    async fn boss_kill_credits_every_survivor() {
        let (store, guard, oracles) = fixture();
        store.insert_combatant(CombatantState::new(PlayerId(2), 100)).unwrap();
        let rules = Rules::new(&oracles);
        let cain = rules.catalog.npc(&"cain".into()).unwrap();
        let survivors = [PlayerId(1), PlayerId(2)];
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let scope = LockScope::new().combatants(survivors);
        let mut step = guard.begin(&scope).await.unwrap();
        let result = award_kill(&mut step, rules, cain, EncounterKind::Boss, PlayerId(2), &survivors, &mut rng).await;
        let awards = guard.settle(step, result).await.applied().unwrap();

        for player in survivors {
            let row = store.combatant_row(player).unwrap().unwrap();
            assert_eq!(row.boss_kills, 1);
            assert_eq!(row.xp, u64::from(cain.xp));
        }
        // Armor, helmet and pistol are always split among the survivors.
        let equipment = ["wooden_armor", "wooden_helmet", "glock-17"];
        for key in equipment {
            assert!(awards.iter().any(|a| a.template.as_str() == key));
        }
        let held = store.inventory_of(PlayerId(1)).unwrap().len() + store.inventory_of(PlayerId(2)).unwrap().len();
        assert_eq!(held, awards.len());
    }

    #[test]
    fn loot_lines_group_by_player() {
        let award = |player: u64, item: u64, key: &str| LootAward {
            player: PlayerId(player),
            item: ItemId(item),
            template: key.into(),
            durability: None,
        };
        let lines = loot_messages(&[award(1, 1, "bandage"), award(2, 2, "knife"), award(1, 3, "luger")]);
        assert_eq!(
            lines,
            vec![
                TurnMessage::Loot {
                    player: PlayerId(1),
                    items: vec!["bandage".into(), "luger".into()],
                },
                TurnMessage::Loot {
                    player: PlayerId(2),
                    items: vec!["knife".into()],
                },
            ]
        );
    }
}
