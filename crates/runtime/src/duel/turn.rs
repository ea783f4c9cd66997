//! Resolution of a single turn.
//!
//! The NPC decides first, then everyone is ordered by speed. Each actor's
//! action is its own guarded step; a skipped step leaves state untouched and
//! only the session changes of applied steps are kept.

use std::collections::HashMap;

use combat_core::{ActionChoice, ItemId, ItemKey, ItemTemplate, NpcAction, NpcChoice, PlayerId, decide, order_turn};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use super::orchestrator::Duel;
use super::session::EncounterKind;
use super::summary::{Actor, TurnMessage, TurnSummary};
use crate::api::KillFeedEntry;
use crate::guard::{LockScope, StepError, StepOutcome};
use crate::steps::{self, Remains, Rules, WeaponChoice};

#[derive(Debug, Clone, Copy)]
enum TurnActor {
    Npc,
    Player(PlayerId, Option<ActionChoice>),
}

#[derive(Debug, Clone, Copy)]
enum ItemUse {
    Medical,
    Stimulant,
}

/// Messages of a settled step; a skipped step becomes a single skip line.
fn into_messages(actor: Actor, outcome: StepOutcome<Vec<TurnMessage>>) -> Result<Vec<TurnMessage>, StepError> {
    match outcome {
        StepOutcome::Applied(messages) => Ok(messages),
        StepOutcome::Skipped(reason) => Ok(vec![TurnMessage::Skipped { actor, reason }]),
        StepOutcome::Fatal(err) => Err(err),
    }
}

impl Duel {
    /// Resolve one turn. A fatal step error stops the turn where it happened.
    pub(super) async fn resolve_turn(&mut self, choices: HashMap<PlayerId, ActionChoice>) -> (TurnSummary, Option<StepError>) {
        let mut summary = TurnSummary::new(self.session.turn);
        let npc_choice = match self.decide_npc() {
            Ok(choice) => choice,
            Err(err) => return (summary, Some(err)),
        };

        let mut entries = vec![(TurnActor::Npc, npc_choice.speed)];
        for player in self.session.active.clone() {
            let choice = choices.get(&player).copied();
            let speed = match choice {
                Some(choice) => self.choice_speed(player, choice).await,
                None => 0,
            };
            entries.push((TurnActor::Player(player, choice), speed));
        }
        let order = order_turn(entries, &mut self.rng);
        debug!(
            target: "runtime::duel",
            duel_id = %self.session.id,
            turn = self.session.turn,
            npc_action = ?npc_choice.action,
            actors = order.len(),
            "turn order fixed"
        );

        for entry in order {
            if self.session.npc.is_dead() || self.session.active.is_empty() {
                break;
            }
            let result = match entry.actor {
                TurnActor::Npc => self.npc_turn(&npc_choice.action).await,
                TurnActor::Player(player, _) if !self.session.is_active(player) => {
                    Ok(vec![TurnMessage::AlreadyOut {
                        actor: Actor::Player(player),
                    }])
                }
                TurnActor::Player(player, None) => Ok(vec![TurnMessage::NoAction { player }]),
                TurnActor::Player(player, Some(choice)) => self.player_turn(player, choice).await,
            };
            match result {
                Ok(messages) => summary.messages.extend(messages),
                Err(err) => return (summary, Some(err)),
            }
        }
        (summary, None)
    }

    fn decide_npc(&mut self) -> Result<NpcChoice, StepError> {
        let rules = Rules::new(&self.ctx.oracles);
        let template = rules.catalog.npc(&self.session.npc.key)?;
        Ok(decide(
            template,
            &self.session.npc.stimulants,
            self.session.npc.health,
            rules.catalog,
            &rules.config.npc,
            &mut self.rng,
        ))
    }

    /// Turn-order speed of a choice, read without locks.
    ///
    /// An item that is already gone counts as speed 0; the step itself will
    /// report the missing item.
    async fn choice_speed(&self, player: PlayerId, choice: ActionChoice) -> u32 {
        let Some(item) = choice.speed_item() else {
            return self.ctx.oracles.config().duel.flee_speed;
        };
        let inventory = match self.ctx.store.begin().await {
            Ok(mut tx) => tx.inventory(player, false).await,
            Err(err) => Err(err),
        };
        match inventory {
            Ok(items) => items
                .iter()
                .find(|i| i.id == item)
                .and_then(|i| self.ctx.oracles.catalog().items.template(&i.template))
                .map_or(0, ItemTemplate::speed),
            Err(err) => {
                warn!(target: "runtime::duel", player = player.0, error = %err, "could not read inventory for turn order");
                0
            }
        }
    }

    fn npc_actor(&self) -> Actor {
        Actor::Npc(self.session.npc.display.clone())
    }

    async fn npc_turn(&mut self, action: &NpcAction) -> Result<Vec<TurnMessage>, StepError> {
        match action {
            NpcAction::Attack => self.npc_attack().await,
            NpcAction::Heal { item } => self.npc_heal(item),
            NpcAction::Stimulant { item } => Ok(self.npc_stimulant(item)),
            NpcAction::Idle => Ok(vec![TurnMessage::NpcIdle {
                npc: self.session.npc.display.clone(),
            }]),
        }
    }

    async fn npc_attack(&mut self) -> Result<Vec<TurnMessage>, StepError> {
        let Some(target) = self.session.active.choose(&mut self.rng).copied() else {
            return Ok(Vec::new());
        };
        let rules = Rules::new(&self.ctx.oracles);
        let scope = LockScope::new().combatant(target);
        let outcome = match self.ctx.guard.begin(&scope).await {
            Ok(mut step) => {
                let result = steps::npc_strike(&mut step, rules, &self.session.npc, (target, Remains::Lost), &mut self.rng).await;
                self.ctx.guard.settle(step, result).await
            }
            Err(err) => StepOutcome::from_error(err),
        };

        let strike = match outcome {
            StepOutcome::Applied(strike) => strike,
            StepOutcome::Skipped(reason) => {
                return Ok(vec![TurnMessage::Skipped {
                    actor: self.npc_actor(),
                    reason,
                }]);
            }
            StepOutcome::Fatal(err) => return Err(err),
        };

        debug!(target: "runtime::duel", duel_id = %self.session.id, player = target.0, damage = strike.damage, "npc attacked");
        if strike.killed {
            self.session.mark_dead(target);
            info!(
                target: "runtime::duel",
                duel_id = %self.session.id,
                player = target.0,
                npc = %self.session.npc.key,
                "player killed"
            );
            self.ctx
                .notify(KillFeedEntry::PlayerKilledByNpc {
                    player: target,
                    npc: self.session.npc.display.clone(),
                    location: self.session.location,
                })
                .await;
        }
        Ok(strike.messages)
    }

    fn npc_heal(&mut self, item: &ItemKey) -> Result<Vec<TurnMessage>, StepError> {
        let rules = Rules::new(&self.ctx.oracles);
        let Some(medical) = rules.catalog.item(item)?.medical() else {
            return Ok(vec![TurnMessage::NpcIdle {
                npc: self.session.npc.display.clone(),
            }]);
        };

        let npc = &mut self.session.npc;
        let amount = npc.max_health.saturating_sub(npc.health).min(medical.heals_for);
        let cured: Vec<_> = medical.cures.iter().copied().filter(|k| npc.afflictions.contains(k)).collect();
        npc.health += amount;
        npc.afflictions.retain(|k| !cured.contains(k));

        Ok(vec![TurnMessage::Healed {
            actor: Actor::Npc(npc.display.clone()),
            item: item.clone(),
            amount,
            cured,
        }])
    }

    fn npc_stimulant(&mut self, item: &ItemKey) -> Vec<TurnMessage> {
        let npc = &mut self.session.npc;
        if !npc.stimulants.contains(item) {
            npc.stimulants.push(item.clone());
        }
        vec![TurnMessage::Stimulated {
            actor: Actor::Npc(npc.display.clone()),
            item: item.clone(),
        }]
    }

    async fn player_turn(&mut self, player: PlayerId, choice: ActionChoice) -> Result<Vec<TurnMessage>, StepError> {
        match choice {
            ActionChoice::Attack { weapon, ammo, limb } => {
                self.player_attack(player, WeaponChoice { weapon, ammo, limb }).await
            }
            ActionChoice::UseMedical(item) => self.player_item(player, item, ItemUse::Medical).await,
            ActionChoice::UseStimulant(item) => self.player_item(player, item, ItemUse::Stimulant).await,
            ActionChoice::Flee => self.player_flee(player).await,
        }
    }

    async fn player_attack(&mut self, player: PlayerId, choice: WeaponChoice) -> Result<Vec<TurnMessage>, StepError> {
        let rules = Rules::new(&self.ctx.oracles);
        let template = rules.catalog.npc(&self.session.npc.key)?;
        let defender = steps::npc_defense(template, rules, Some(&self.session.npc))?;
        let target = self.npc_actor();

        let scope = LockScope::new().combatant(player);
        let outcome = match self.ctx.guard.begin(&scope).await {
            Ok(mut step) => {
                let result = steps::strike(&mut step, rules, player, choice, (target, &defender), &mut self.rng)
                    .await
                    .map(|strike| (strike.resolution, strike.messages));
                self.ctx.guard.settle(step, result).await
            }
            Err(err) => StepOutcome::from_error(err),
        };

        let (resolution, mut messages) = match outcome {
            StepOutcome::Applied(applied) => applied,
            StepOutcome::Skipped(reason) => {
                return Ok(vec![TurnMessage::Skipped {
                    actor: Actor::Player(player),
                    reason,
                }]);
            }
            StepOutcome::Fatal(err) => return Err(err),
        };

        let npc = &mut self.session.npc;
        npc.health = npc.health.saturating_sub(resolution.total_damage());
        for kind in &resolution.inflicted {
            npc.afflict(*kind);
        }

        if npc.is_dead() {
            self.last_hit = Some(player);
            messages.push(TurnMessage::NpcKilled {
                npc: npc.display.clone(),
                by: player,
            });
            messages.extend(self.award(player).await?);
        }
        Ok(messages)
    }

    async fn award(&mut self, killer: PlayerId) -> Result<Vec<TurnMessage>, StepError> {
        let rules = Rules::new(&self.ctx.oracles);
        let template = rules.catalog.npc(&self.session.npc.key)?;
        let survivors = self.session.active.clone();
        let scope = LockScope::new().combatants(survivors.iter().copied()).combatant(killer);

        let outcome = match self.ctx.guard.begin(&scope).await {
            Ok(mut step) => {
                let result = steps::award_kill(
                    &mut step,
                    rules,
                    template,
                    self.session.kind,
                    killer,
                    &survivors,
                    &mut self.rng,
                )
                .await;
                self.ctx.guard.settle(step, result).await
            }
            Err(err) => StepOutcome::from_error(err),
        };

        let awards = match outcome {
            StepOutcome::Applied(awards) => awards,
            StepOutcome::Skipped(reason) => {
                warn!(target: "runtime::duel", duel_id = %self.session.id, player = killer.0, %reason, "kill could not be credited");
                return Ok(vec![TurnMessage::Skipped {
                    actor: Actor::Player(killer),
                    reason,
                }]);
            }
            StepOutcome::Fatal(err) => return Err(err),
        };

        info!(
            target: "runtime::duel",
            duel_id = %self.session.id,
            npc = %self.session.npc.key,
            killer = killer.0,
            items = awards.len(),
            "npc killed"
        );
        let killers = match self.session.kind {
            EncounterKind::Scavenge => vec![killer],
            EncounterKind::Boss => survivors,
        };
        self.ctx
            .notify(KillFeedEntry::NpcKilled {
                npc: self.session.npc.display.clone(),
                killers,
                location: self.session.location,
                loot: awards.clone(),
            })
            .await;

        let messages = steps::loot_messages(&awards);
        self.loot.extend(awards);
        Ok(messages)
    }

    async fn player_item(&mut self, player: PlayerId, item: ItemId, kind: ItemUse) -> Result<Vec<TurnMessage>, StepError> {
        let rules = Rules::new(&self.ctx.oracles);
        let scope = LockScope::new().combatant(player);
        let outcome = match self.ctx.guard.begin(&scope).await {
            Ok(mut step) => {
                let result = match kind {
                    ItemUse::Medical => steps::heal(&mut step, rules, player, item).await,
                    ItemUse::Stimulant => steps::stimulate(&mut step, rules, player, item).await,
                };
                self.ctx.guard.settle(step, result).await
            }
            Err(err) => StepOutcome::from_error(err),
        };
        into_messages(Actor::Player(player), outcome.map(|message| vec![message]))
    }

    async fn player_flee(&mut self, player: PlayerId) -> Result<Vec<TurnMessage>, StepError> {
        let flee = &self.ctx.oracles.config().flee;
        let chance = match self.session.kind {
            EncounterKind::Scavenge => flee.scavenge_pct,
            EncounterKind::Boss => flee.boss_pct,
        };
        if self.rng.gen_range(0..100) >= chance {
            return Ok(vec![TurnMessage::FleeFailed { player }]);
        }

        let scope = LockScope::new().combatant(player);
        let outcome = match self.ctx.guard.begin(&scope).await {
            Ok(mut step) => {
                let result = step.set_in_combat(player, false).await.map_err(StepError::from);
                self.ctx.guard.settle(step, result).await
            }
            Err(err) => StepOutcome::from_error(err),
        };

        let outcome = outcome.map(|()| {
            self.session.mark_fled(player);
            info!(target: "runtime::duel", duel_id = %self.session.id, player = player.0, "player fled");
            vec![TurnMessage::Fled { player }]
        });
        into_messages(Actor::Player(player), outcome)
    }
}
