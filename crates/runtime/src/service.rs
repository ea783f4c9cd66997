//! Entry points for starting duels and for one-shot open-world attacks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use combat_core::{LocationId, NpcKey, PlayerId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::api::{
    ActionCollector, DuelHandle, DuelRegistry, KillFeedEntry, Notifier, NullNotifier, Result,
    RuntimeError,
};
use crate::config::RuntimeConfig;
use crate::context::RuntimeContext;
use crate::duel::{
    Actor, CancelSignal, Duel, DuelId, DuelSession, EncounterKind, LootAward, NpcState, TurnMessage,
};
use crate::events::{EventBus, WorldEvent};
use crate::guard::{GuardedStep, LockScope, StepError, StepOutcome, TransactionGuard};
use crate::oracle::OracleManager;
use crate::steps::{self, Remains, Rules, WeaponChoice};
use crate::store::{Store, cooldowns};

/// What a one-shot attack did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    pub target: Actor,
    pub messages: Vec<TurnMessage>,
    pub damage: u32,
    /// Target health after the hit; zero when it died.
    pub remaining: u32,
    pub killed: bool,
    /// Damage the target dealt back to the attacker.
    pub counter_damage: u32,
    /// The attacker died to the counter-attack.
    pub attacker_killed: bool,
    /// Drops left on the ground at the attack's location.
    pub loot: Vec<LootAward>,
}

/// Starts duels and resolves open-world attacks against a shared store.
///
/// At most one duel runs per location. Cloning is cheap; clones share the
/// registry and the seed source.
#[derive(Clone)]
pub struct DuelService {
    ctx: RuntimeContext,
    registry: DuelRegistry,
    next_duel: Arc<AtomicU64>,
    seeds: Arc<Mutex<ChaCha8Rng>>,
}

impl DuelService {
    pub fn builder() -> DuelServiceBuilder {
        DuelServiceBuilder::default()
    }

    pub fn registry(&self) -> &DuelRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventBus {
        &self.ctx.events
    }

    pub fn oracles(&self) -> &OracleManager {
        &self.ctx.oracles
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.ctx.config
    }

    /// Start a one-on-one duel with an NPC found while scavenging.
    pub async fn start_scavenge(&self, location: LocationId, player: PlayerId, npc: &NpcKey) -> Result<DuelHandle> {
        self.start(EncounterKind::Scavenge, location, vec![player], npc).await
    }

    /// Start a boss fight. It begins once every invited player confirms.
    pub async fn start_boss(&self, location: LocationId, players: Vec<PlayerId>, npc: &NpcKey) -> Result<DuelHandle> {
        let template = self.ctx.oracles.catalog().npc(npc)?;
        if !template.boss {
            return Err(RuntimeError::Rejected(format!("{} is not a boss", template.display)));
        }
        self.start(EncounterKind::Boss, location, players, npc).await
    }

    async fn start(
        &self,
        kind: EncounterKind,
        location: LocationId,
        mut players: Vec<PlayerId>,
        npc: &NpcKey,
    ) -> Result<DuelHandle> {
        let mut seen = Vec::with_capacity(players.len());
        players.retain(|p| {
            let fresh = !seen.contains(p);
            seen.push(*p);
            fresh
        });
        if players.is_empty() {
            return Err(RuntimeError::NoPlayers);
        }

        let template = self.ctx.oracles.catalog().npc(npc)?;
        let mut tx = self.ctx.store.begin().await?;
        for player in &players {
            if tx.combatant(*player, false).await?.in_combat {
                return Err(RuntimeError::AlreadyInCombat(*player));
            }
        }
        drop(tx);

        let duel_id = DuelId(self.next_duel.fetch_add(1, Ordering::Relaxed));
        let lease = self.registry.acquire(location, duel_id)?;
        let session = DuelSession::new(duel_id, location, kind, NpcState::spawn(template), players);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let duel = Duel::new(
            self.ctx.clone(),
            session,
            self.fork_rng(),
            CancelSignal::new(cancel_rx),
            lease,
        );

        debug!(target: "runtime::duel", duel_id = %duel_id, %location, kind = kind.as_str(), "spawning duel task");
        let task = tokio::spawn(duel.run());
        Ok(DuelHandle::new(duel_id, location, cancel_tx, self.ctx.events.clone(), task))
    }

    /// Attack the NPC roaming `location` outside any duel.
    ///
    /// A surviving NPC strikes back in the same transaction; an attacker it
    /// kills leaves their inventory at `location`. A killed NPC drops its loot
    /// there too. The attacker's weapon cooldown starts whether or not the
    /// hit lands.
    /// Refusals (busy, on cooldown, nothing there, item gone) come back as
    /// [`RuntimeError::Rejected`] with nothing written.
    pub async fn attack_npc(&self, attacker: PlayerId, location: LocationId, choice: WeaponChoice) -> Result<AttackReport> {
        let rules = Rules::new(&self.ctx.oracles);
        let mut rng = self.fork_rng();
        let scope = LockScope::new().combatant(attacker).npc(location);
        let outcome = match self.ctx.guard.begin(&scope).await {
            Ok(mut step) => {
                let result = attack_npc_step(&mut step, rules, attacker, location, choice, &mut rng).await;
                self.ctx.guard.settle(step, result).await
            }
            Err(err) => StepOutcome::from_error(err),
        };
        let report = settled(outcome)?;

        info!(
            target: "runtime::world",
            player = attacker.0,
            %location,
            damage = report.damage,
            remaining = report.remaining,
            killed = report.killed,
            counter_damage = report.counter_damage,
            "npc attacked"
        );
        self.ctx.events.publish(WorldEvent::NpcAttacked {
            attacker,
            location,
            damage: report.damage,
            remaining: report.remaining,
            killed: report.killed,
        });
        if report.killed {
            self.ctx
                .notify(KillFeedEntry::NpcKilled {
                    npc: report.target.to_string(),
                    killers: vec![attacker],
                    location,
                    loot: report.loot.clone(),
                })
                .await;
        }
        if report.attacker_killed {
            self.ctx
                .notify(KillFeedEntry::PlayerKilledByNpc {
                    player: attacker,
                    npc: report.target.to_string(),
                    location,
                })
                .await;
        }
        Ok(report)
    }

    /// Attack another player outside any duel.
    ///
    /// A killed victim drops everything at `location`, respawns, and is
    /// shielded from player attacks for a while. PvP kills award no XP.
    pub async fn attack_player(
        &self,
        attacker: PlayerId,
        victim: PlayerId,
        location: LocationId,
        choice: WeaponChoice,
    ) -> Result<AttackReport> {
        if attacker == victim {
            return Err(RuntimeError::Rejected("you cannot attack yourself".to_string()));
        }

        let rules = Rules::new(&self.ctx.oracles);
        let mut rng = self.fork_rng();
        let shield = self.ctx.config.attack_shield;
        let scope = LockScope::new().combatants([attacker, victim]);
        let outcome = match self.ctx.guard.begin(&scope).await {
            Ok(mut step) => {
                let target = PvpTarget {
                    victim,
                    location,
                    shield,
                };
                let result = attack_player_step(&mut step, rules, attacker, target, choice, &mut rng).await;
                self.ctx.guard.settle(step, result).await
            }
            Err(err) => StepOutcome::from_error(err),
        };
        let report = settled(outcome)?;

        info!(
            target: "runtime::world",
            player = attacker.0,
            victim = victim.0,
            %location,
            damage = report.damage,
            killed = report.killed,
            "player attacked"
        );
        self.ctx.events.publish(WorldEvent::PlayerAttacked {
            attacker,
            victim,
            location,
            damage: report.damage,
            killed: report.killed,
        });
        if report.killed {
            self.ctx
                .notify(KillFeedEntry::PlayerKilledByPlayer {
                    victim,
                    killer: attacker,
                    location,
                })
                .await;
        }
        Ok(report)
    }

    fn fork_rng(&self) -> ChaCha8Rng {
        let seed = self
            .seeds
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .r#gen::<u64>();
        ChaCha8Rng::seed_from_u64(seed)
    }
}

fn settled(outcome: StepOutcome<AttackReport>) -> Result<AttackReport> {
    match outcome {
        StepOutcome::Applied(report) => Ok(report),
        StepOutcome::Skipped(reason) => Err(RuntimeError::Rejected(reason)),
        StepOutcome::Fatal(err) => Err(err.into()),
    }
}

/// The attacker must be out of combat and off their attack cooldown.
async fn ensure_ready(step: &mut GuardedStep, attacker: PlayerId) -> std::result::Result<(), StepError> {
    if step.combatant(attacker, true).await?.in_combat {
        return Err(StepError::Validation(format!("{attacker} is busy fighting")));
    }
    if let Some(left) = step.cooldown(attacker, cooldowns::ATTACK).await? {
        return Err(StepError::Validation(format!(
            "{attacker} can attack again in {}s",
            left.as_secs().max(1)
        )));
    }
    Ok(())
}

async fn attack_npc_step<R: Rng + Send + ?Sized>(
    step: &mut GuardedStep,
    rules: Rules<'_>,
    attacker: PlayerId,
    location: LocationId,
    choice: WeaponChoice,
    rng: &mut R,
) -> std::result::Result<AttackReport, StepError> {
    ensure_ready(step, attacker).await?;
    let row = match step.spawned_npc(location, true).await? {
        Some(row) if !row.is_dead() => row,
        _ => return Err(StepError::Validation(format!("there is nothing to attack at {location}"))),
    };

    let template = rules.catalog.npc(&row.npc)?;
    let defender = steps::npc_defense(template, rules, None)?;
    let target = Actor::Npc(template.display.clone());
    let strike = steps::strike(step, rules, attacker, choice, (target.clone(), &defender), rng).await?;

    let damage = strike.resolution.total_damage();
    let remaining = step.damage_npc(location, damage).await?;
    let mut messages = strike.messages;
    let mut loot = Vec::new();
    let mut counter = None;
    if remaining == 0 {
        step.despawn_npc(location).await?;
        messages.push(TurnMessage::NpcKilled {
            npc: template.display.clone(),
            by: attacker,
        });
        loot = steps::drop_kill(step, rules, template, attacker, location, rng).await?;
        messages.extend(steps::dropped_message(location, &loot));
    } else {
        let mut npc = NpcState::spawn(template);
        npc.health = remaining;
        let struck = steps::npc_strike(step, rules, &npc, (attacker, Remains::Dropped(location)), rng).await?;
        messages.extend(struck.messages);
        counter = Some((struck.damage, struck.killed));
    }

    let fire_rate = strike.weapon.fire_rate().unwrap_or(0);
    step.set_cooldown(attacker, cooldowns::ATTACK, strike.effects.attack_cooldown(fire_rate))
        .await?;
    let (counter_damage, attacker_killed) = counter.unwrap_or((0, false));

    Ok(AttackReport {
        target,
        messages,
        damage,
        remaining,
        killed: remaining == 0,
        counter_damage,
        attacker_killed,
        loot,
    })
}

struct PvpTarget {
    victim: PlayerId,
    location: LocationId,
    shield: Duration,
}

async fn attack_player_step<R: Rng + Send + ?Sized>(
    step: &mut GuardedStep,
    rules: Rules<'_>,
    attacker: PlayerId,
    target: PvpTarget,
    choice: WeaponChoice,
    rng: &mut R,
) -> std::result::Result<AttackReport, StepError> {
    let PvpTarget {
        victim,
        location,
        shield,
    } = target;

    ensure_ready(step, attacker).await?;
    if step.combatant(victim, true).await?.in_combat {
        return Err(StepError::Validation(format!("{victim} is in the middle of a fight")));
    }
    if step.cooldown(victim, cooldowns::ATTACK_SHIELD).await?.is_some() {
        return Err(StepError::Validation(format!("{victim} cannot be attacked yet")));
    }

    let (defender, loadout) = steps::player_defense(step, rules, victim).await?;
    let strike = steps::strike(step, rules, attacker, choice, (Actor::Player(victim), &defender), rng).await?;
    let mut messages = strike.messages;
    messages.extend(steps::wear_player_armor(step, victim, &strike.resolution, &loadout).await?);
    steps::afflict_player(step, rules, victim, &strike.resolution.inflicted).await?;

    let damage = strike.resolution.total_damage();
    let remaining = step.mutate_health(victim, -i64::from(damage)).await?;
    let killed = remaining == 0;
    if killed {
        steps::kill_player(step, victim, Remains::Dropped(location)).await?;
        step.set_cooldown(victim, cooldowns::ATTACK_SHIELD, shield).await?;
        step.credit_kill(attacker, 0, false).await?;
        messages.push(TurnMessage::Died {
            player: victim,
            killer: Actor::Player(attacker),
        });
    }

    let fire_rate = strike.weapon.fire_rate().unwrap_or(0);
    step.set_cooldown(attacker, cooldowns::ATTACK, strike.effects.attack_cooldown(fire_rate))
        .await?;

    Ok(AttackReport {
        target: Actor::Player(victim),
        messages,
        damage,
        remaining,
        killed,
        counter_damage: 0,
        attacker_killed: false,
        loot: Vec::new(),
    })
}

/// Builder for [`DuelService`].
#[derive(Default)]
pub struct DuelServiceBuilder {
    config: RuntimeConfig,
    store: Option<Arc<dyn Store>>,
    oracles: Option<OracleManager>,
    collector: Option<Arc<dyn ActionCollector>>,
    notifier: Option<Arc<dyn Notifier>>,
    registry: Option<DuelRegistry>,
}

impl DuelServiceBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(mut self, store: impl Store + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn oracles(mut self, oracles: OracleManager) -> Self {
        self.oracles = Some(oracles);
        self
    }

    pub fn collector(mut self, collector: impl ActionCollector + 'static) -> Self {
        self.collector = Some(Arc::new(collector));
        self
    }

    /// Defaults to [`NullNotifier`].
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Share a registry with another service so both respect the same
    /// one-duel-per-location rule.
    pub fn registry(mut self, registry: DuelRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<DuelService> {
        let store = self.store.ok_or(RuntimeError::MissingStore)?;
        let oracles = self.oracles.ok_or(RuntimeError::MissingOracles)?;
        let collector = self.collector.ok_or(RuntimeError::MissingCollector)?;
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(NullNotifier));

        let seeds = match self.config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let ctx = RuntimeContext {
            guard: TransactionGuard::new(Arc::clone(&store)),
            store,
            oracles,
            events: EventBus::with_capacity(self.config.event_buffer_size),
            config: self.config,
            collector,
            notifier,
        };

        Ok(DuelService {
            ctx,
            registry: self.registry.unwrap_or_default(),
            next_duel: Arc::new(AtomicU64::new(1)),
            seeds: Arc::new(Mutex::new(seeds)),
        })
    }
}

#[cfg(test)]
mod tests {
    use combat_content::ContentFactory;

    use super::*;
    use crate::api::IdleCollector;
    use crate::store::InMemoryStore;

    fn oracles() -> OracleManager {
        OracleManager::from_content(ContentFactory::sample().load_all().unwrap())
    }

    #[test]
    fn build_requires_store_oracles_and_collector() {
        let missing_store = DuelService::builder().build().err().unwrap();
        assert!(matches!(missing_store, RuntimeError::MissingStore));

        let missing_collector = DuelService::builder()
            .store(InMemoryStore::new())
            .oracles(oracles())
            .build()
            .err()
            .unwrap();
        assert!(matches!(missing_collector, RuntimeError::MissingCollector));

        assert!(
            DuelService::builder()
                .store(InMemoryStore::new())
                .oracles(oracles())
                .collector(IdleCollector)
                .build()
                .is_ok()
        );
    }

    #[test]
    fn seeded_services_fork_the_same_streams() {
        let build = || {
            DuelService::builder()
                .config(RuntimeConfig {
                    rng_seed: Some(7),
                    ..RuntimeConfig::default()
                })
                .store(InMemoryStore::new())
                .oracles(oracles())
                .collector(IdleCollector)
                .build()
                .unwrap()
        };
        let (a, b) = (build(), build());
        assert_eq!(a.fork_rng().r#gen::<u64>(), b.fork_rng().r#gen::<u64>());
    }
}
