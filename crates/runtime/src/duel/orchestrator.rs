//! The duel task: ready-check, turn loop and cleanup.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use combat_core::{ActionChoice, PlayerId};
use rand_chacha::ChaCha8Rng;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::session::{DuelOutcome, DuelPhase, DuelSession, EncounterKind};
use super::summary::{DuelReport, LootAward, TurnSummary};
use crate::api::{ActionPrompt, DuelLease, ReadyPrompt};
use crate::context::RuntimeContext;
use crate::events::DuelEvent;
use crate::guard::{GuardedStep, LockScope, StepError, StepOutcome};

/// Cancellation requested through a [`DuelHandle`](crate::api::DuelHandle).
///
/// A dropped handle detaches the duel; it then runs until it settles.
pub(crate) struct CancelSignal {
    rx: watch::Receiver<bool>,
    attached: bool,
}

impl CancelSignal {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx, attached: true }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; never resolves once detached.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if !self.attached || self.rx.changed().await.is_err() {
                self.attached = false;
                std::future::pending::<()>().await;
            }
        }
    }
}

pub(crate) struct Duel {
    pub(super) ctx: RuntimeContext,
    pub(super) session: DuelSession,
    pub(super) rng: ChaCha8Rng,
    pub(super) cancel: CancelSignal,
    pub(super) lease: Option<DuelLease>,
    pub(super) turns: Vec<TurnSummary>,
    pub(super) loot: Vec<LootAward>,
    /// Player who landed the killing blow.
    pub(super) last_hit: Option<PlayerId>,
}

impl Duel {
    pub fn new(
        ctx: RuntimeContext,
        session: DuelSession,
        rng: ChaCha8Rng,
        cancel: CancelSignal,
        lease: DuelLease,
    ) -> Self {
        Self {
            ctx,
            session,
            rng,
            cancel,
            lease: Some(lease),
            turns: Vec::new(),
            loot: Vec::new(),
            last_hit: None,
        }
    }

    /// Drive the duel to its end and report what happened.
    pub async fn run(mut self) -> DuelReport {
        info!(
            target: "runtime::duel",
            duel_id = %self.session.id,
            location = %self.session.location,
            kind = self.session.kind.as_str(),
            npc = %self.session.npc.key,
            players = self.session.participants.len(),
            "duel started"
        );
        self.ctx.events.publish(DuelEvent::Started {
            duel_id: self.session.id,
            location: self.session.location,
            kind: self.session.kind,
            npc: self.session.npc.key.clone(),
            players: self.session.participants.clone(),
        });

        let outcome = self.play().await;
        self.finish(outcome).await
    }

    async fn play(&mut self) -> DuelOutcome {
        if self.session.kind == EncounterKind::Boss {
            let ready = self.ready_check().await;
            if ready != Some(true) {
                self.session.active.clear();
                return match ready {
                    None => DuelOutcome::Cancelled,
                    Some(_) => DuelOutcome::NotReady,
                };
            }
        }

        if let Err(outcome) = self.enter().await {
            self.session.active.clear();
            return outcome;
        }

        let max_turns = self.ctx.oracles.config().duel.max_turns;
        loop {
            if self.cancel.is_cancelled() {
                return DuelOutcome::Cancelled;
            }
            self.session.turn += 1;
            self.session.phase = DuelPhase::AwaitingActions;

            let Some(choices) = self.collect_actions().await else {
                return DuelOutcome::Cancelled;
            };

            self.session.phase = DuelPhase::Resolving;
            let (summary, fatal) = self.resolve_turn(choices).await;
            debug!(
                target: "runtime::duel",
                duel_id = %self.session.id,
                turn = summary.turn,
                messages = summary.messages.len(),
                npc_health = self.session.npc.health,
                "turn resolved"
            );
            self.ctx.events.publish(DuelEvent::TurnResolved {
                duel_id: self.session.id,
                summary: summary.clone(),
            });
            self.turns.push(summary);

            if let Some(err) = fatal {
                error!(target: "runtime::duel", duel_id = %self.session.id, error = %err, "duel aborted");
                return DuelOutcome::Aborted {
                    reason: err.to_string(),
                };
            }
            if let Some(outcome) = self.session.settled_outcome(self.last_hit) {
                return outcome;
            }
            if self.session.turn >= max_turns {
                return DuelOutcome::TurnLimit;
            }
        }
    }

    /// Ask every boss participant to confirm. `None` when cancelled.
    async fn ready_check(&mut self) -> Option<bool> {
        let prompt = ReadyPrompt {
            duel_id: self.session.id,
            location: self.session.location,
            npc: self.session.npc.display.clone(),
            players: self.session.participants.clone(),
            timeout: self.ctx.config.ready_timeout,
        };
        let (tx, rx) = mpsc::channel(prompt.players.len().max(1));
        let collector = Arc::clone(&self.ctx.collector);
        let confirmed = gather(
            &prompt.players,
            prompt.timeout,
            &mut self.cancel,
            collector.ready_check(&prompt, tx),
            rx,
            |player| (player, ()),
        )
        .await?;

        let ready = confirmed.len() == prompt.players.len();
        if !ready {
            info!(
                target: "runtime::duel",
                duel_id = %self.session.id,
                confirmed = confirmed.len(),
                invited = prompt.players.len(),
                "ready check failed"
            );
        }
        Some(ready)
    }

    /// Flag every participant as in combat; players already fighting elsewhere are left out.
    async fn enter(&mut self) -> Result<(), DuelOutcome> {
        let players = self.session.participants.clone();
        let scope = LockScope::new().combatants(players.iter().copied());
        let outcome = match self.ctx.guard.begin(&scope).await {
            Ok(mut step) => {
                let result = enter_players(&mut step, &players).await;
                self.ctx.guard.settle(step, result).await
            }
            Err(err) => StepOutcome::from_error(err),
        };

        let joined = match outcome {
            StepOutcome::Applied(joined) => joined,
            StepOutcome::Skipped(reason) => return Err(DuelOutcome::Aborted { reason }),
            StepOutcome::Fatal(err) => {
                return Err(DuelOutcome::Aborted {
                    reason: err.to_string(),
                });
            }
        };

        for player in players.iter().filter(|p| !joined.contains(p)) {
            warn!(target: "runtime::duel", duel_id = %self.session.id, player = player.0, "player already in combat");
        }
        self.session.active.retain(|p| joined.contains(p));
        self.session.participants.retain(|p| joined.contains(p));
        if joined.is_empty() {
            return Err(DuelOutcome::Aborted {
                reason: "every player was already in combat".to_string(),
            });
        }
        Ok(())
    }

    /// Collect this turn's choices. `None` when cancelled.
    async fn collect_actions(&mut self) -> Option<HashMap<PlayerId, ActionChoice>> {
        let prompt = ActionPrompt {
            duel_id: self.session.id,
            location: self.session.location,
            turn: self.session.turn,
            players: self.session.active.clone(),
            npc: self.session.npc.display.clone(),
            npc_health: self.session.npc.health,
            npc_max_health: self.session.npc.max_health,
            timeout: self.ctx.config.action_timeout,
        };
        let (tx, rx) = mpsc::channel(prompt.players.len().max(1));
        let collector = Arc::clone(&self.ctx.collector);
        gather(
            &prompt.players,
            prompt.timeout,
            &mut self.cancel,
            collector.collect(&prompt, tx),
            rx,
            |choice| choice,
        )
        .await
    }

    async fn finish(mut self, outcome: DuelOutcome) -> DuelReport {
        self.session.phase = DuelPhase::Ended(outcome.clone());

        for player in self.session.active.clone() {
            self.leave_combat(player).await;
        }
        if let Some(lease) = self.lease.take() {
            lease.release();
        }

        info!(
            target: "runtime::duel",
            duel_id = %self.session.id,
            outcome = %outcome,
            turns = self.session.turn,
            loot = self.loot.len(),
            "duel ended"
        );
        self.ctx.events.publish(DuelEvent::Ended {
            duel_id: self.session.id,
            outcome: outcome.clone(),
            turns: self.session.turn,
        });

        DuelReport {
            duel_id: self.session.id,
            location: self.session.location,
            kind: self.session.kind,
            outcome,
            turns: self.turns,
            loot: self.loot,
        }
    }

    async fn leave_combat(&self, player: PlayerId) {
        let scope = LockScope::new().combatant(player);
        let outcome = match self.ctx.guard.begin(&scope).await {
            Ok(mut step) => {
                let result = step.set_in_combat(player, false).await.map_err(StepError::from);
                self.ctx.guard.settle(step, result).await
            }
            Err(err) => StepOutcome::from_error(err),
        };
        if outcome.applied().is_none() {
            error!(target: "runtime::duel", duel_id = %self.session.id, player = player.0, "could not clear the in-combat flag");
        }
    }
}

async fn enter_players(step: &mut GuardedStep, players: &[PlayerId]) -> Result<Vec<PlayerId>, StepError> {
    let mut joined = Vec::with_capacity(players.len());
    for player in players {
        if step.combatant(*player, true).await?.in_combat {
            continue;
        }
        step.set_in_combat(*player, true).await?;
        joined.push(*player);
    }
    Ok(joined)
}

/// Receive one answer per expected player until all arrive, the source hangs
/// up, or `timeout` passes. Late and duplicate answers are ignored.
///
/// Returns `None` if the duel was cancelled while waiting.
async fn gather<M, T>(
    expected: &[PlayerId],
    timeout: Duration,
    cancel: &mut CancelSignal,
    source: impl Future<Output = ()>,
    mut rx: mpsc::Receiver<M>,
    split: impl Fn(M) -> (PlayerId, T),
) -> Option<HashMap<PlayerId, T>> {
    let mut gathered = HashMap::with_capacity(expected.len());
    if expected.is_empty() {
        return Some(gathered);
    }

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);
    tokio::pin!(source);
    let mut source_done = false;

    loop {
        tokio::select! {
            _ = &mut deadline => {
                warn!(
                    target: "runtime::duel",
                    answered = gathered.len(),
                    expected = expected.len(),
                    timeout_ms = timeout.as_millis() as u64,
                    "collector timed out"
                );
                break;
            }
            _ = cancel.cancelled() => return None,
            _ = &mut source, if !source_done => source_done = true,
            message = rx.recv() => {
                let Some(message) = message else {
                    break;
                };
                let (player, value) = split(message);
                if !expected.contains(&player) {
                    debug!(target: "runtime::duel", player = player.0, "ignored answer from a player outside the duel");
                    continue;
                }
                gathered.entry(player).or_insert(value);
                if gathered.len() == expected.len() {
                    break;
                }
            }
        }
    }
    Some(gathered)
}
