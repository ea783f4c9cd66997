//! Asynchronous collaborators the runtime depends on.
//!
//! [`ActionCollector`] sources player choices (chat buttons, a CLI, scripted
//! fixtures). [`Notifier`] delivers kill and loot summaries. Both are
//! injected so duels run without a real UI in tests.
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use combat_core::{ActionChoice, LocationId, PlayerId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

use crate::duel::{Actor, DuelId, LootAward};

/// A player's submitted choice.
pub type PlayerChoice = (PlayerId, ActionChoice);

/// State shown to players while they pick an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPrompt {
    pub duel_id: DuelId,
    pub location: LocationId,
    pub turn: u32,
    /// Players expected to answer.
    pub players: Vec<PlayerId>,
    pub npc: String,
    pub npc_health: u32,
    pub npc_max_health: u32,
    pub timeout: Duration,
}

/// Invitation to confirm a boss fight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyPrompt {
    pub duel_id: DuelId,
    pub location: LocationId,
    pub npc: String,
    pub players: Vec<PlayerId>,
    pub timeout: Duration,
}

/// Source of player input during a duel.
///
/// Implementations send choices as they arrive and may return early. The
/// orchestrator stops listening at the prompt's timeout and keeps whatever
/// arrived; players without a choice take no action.
#[async_trait]
pub trait ActionCollector: Send + Sync {
    async fn collect(&self, prompt: &ActionPrompt, choices: mpsc::Sender<PlayerChoice>);

    /// Ask every invited player to confirm a boss fight.
    ///
    /// Confirms everyone by default.
    async fn ready_check(&self, prompt: &ReadyPrompt, confirmations: mpsc::Sender<PlayerId>) {
        for player in &prompt.players {
            if confirmations.send(*player).await.is_err() {
                break;
            }
        }
    }
}

/// Collector that never picks anything.
pub struct IdleCollector;

#[async_trait]
impl ActionCollector for IdleCollector {
    async fn collect(&self, _prompt: &ActionPrompt, _choices: mpsc::Sender<PlayerChoice>) {}
}

/// Collector replaying fixed choices per turn.
///
/// Turns without a script fall back to the repeated choices, if any.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCollector {
    turns: HashMap<u32, Vec<PlayerChoice>>,
    repeat: Vec<PlayerChoice>,
    declines: Vec<PlayerId>,
}

impl ScriptedCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_turn(mut self, turn: u32, choices: Vec<PlayerChoice>) -> Self {
        self.turns.insert(turn, choices);
        self
    }

    pub fn every_turn(mut self, choices: Vec<PlayerChoice>) -> Self {
        self.repeat = choices;
        self
    }

    /// Players that will not confirm a ready-check.
    pub fn declining(mut self, players: Vec<PlayerId>) -> Self {
        self.declines = players;
        self
    }
}

#[async_trait]
impl ActionCollector for ScriptedCollector {
    async fn collect(&self, prompt: &ActionPrompt, choices: mpsc::Sender<PlayerChoice>) {
        let script = self.turns.get(&prompt.turn).unwrap_or(&self.repeat);
        for choice in script {
            if choices.send(*choice).await.is_err() {
                break;
            }
        }
    }

    async fn ready_check(&self, prompt: &ReadyPrompt, confirmations: mpsc::Sender<PlayerId>) {
        for player in prompt.players.iter().filter(|p| !self.declines.contains(p)) {
            if confirmations.send(*player).await.is_err() {
                break;
            }
        }
    }
}

/// Kill feed entry delivered after a committed death.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillFeedEntry {
    PlayerKilledByNpc {
        player: PlayerId,
        npc: String,
        location: LocationId,
    },
    NpcKilled {
        npc: String,
        killers: Vec<PlayerId>,
        location: LocationId,
        loot: Vec<LootAward>,
    },
    PlayerKilledByPlayer {
        victim: PlayerId,
        killer: PlayerId,
        location: LocationId,
    },
}

impl KillFeedEntry {
    pub fn killer(&self) -> Actor {
        match self {
            KillFeedEntry::PlayerKilledByNpc { npc, .. } => Actor::Npc(npc.clone()),
            KillFeedEntry::NpcKilled { killers, npc, .. } => killers
                .first()
                .map(|p| Actor::Player(*p))
                .unwrap_or_else(|| Actor::Npc(npc.clone())),
            KillFeedEntry::PlayerKilledByPlayer { killer, .. } => Actor::Player(*killer),
        }
    }
}

#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Fire-and-forget delivery of kill summaries.
///
/// Failures are logged by the caller and never affect resolution.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, entry: KillFeedEntry) -> Result<(), NotifyError>;
}

/// Discards every entry.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _entry: KillFeedEntry) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Logs every entry at `info`.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, entry: KillFeedEntry) -> Result<(), NotifyError> {
        match &entry {
            KillFeedEntry::PlayerKilledByNpc { player, npc, location } => {
                info!(target: "runtime::notify", player = player.0, %npc, %location, "player killed by npc")
            }
            KillFeedEntry::NpcKilled {
                npc,
                killers,
                location,
                loot,
            } => {
                info!(target: "runtime::notify", %npc, killers = killers.len(), %location, loot = loot.len(), "npc killed")
            }
            KillFeedEntry::PlayerKilledByPlayer {
                victim,
                killer,
                location,
            } => {
                info!(target: "runtime::notify", victim = victim.0, killer = killer.0, %location, "player killed by player")
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(turn: u32) -> ActionPrompt {
        ActionPrompt {
            duel_id: DuelId(1),
            location: LocationId(1),
            turn,
            players: vec![PlayerId(1)],
            npc: "Walker".into(),
            npc_health: 10,
            npc_max_health: 10,
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn scripted_collector_prefers_turn_scripts() {
        let collector = ScriptedCollector::new()
            .every_turn(vec![(PlayerId(1), ActionChoice::Flee)])
            .on_turn(
                2,
                vec![(PlayerId(1), ActionChoice::UseMedical(combat_core::ItemId(4)))],
            );

        let (tx, mut rx) = mpsc::channel(4);
        collector.collect(&prompt(1), tx).await;
        assert_eq!(rx.recv().await, Some((PlayerId(1), ActionChoice::Flee)));

        let (tx, mut rx) = mpsc::channel(4);
        collector.collect(&prompt(2), tx).await;
        assert!(matches!(rx.recv().await, Some((_, ActionChoice::UseMedical(_)))));
    }

    #[tokio::test]
    async fn declined_players_do_not_confirm() {
        let collector = ScriptedCollector::new().declining(vec![PlayerId(2)]);
        let ready = ReadyPrompt {
            duel_id: DuelId(1),
            location: LocationId(1),
            npc: "Cain".into(),
            players: vec![PlayerId(1), PlayerId(2)],
            timeout: Duration::from_secs(1),
        };
        let (tx, mut rx) = mpsc::channel(4);
        collector.ready_check(&ready, tx).await;
        assert_eq!(rx.recv().await, Some(PlayerId(1)));
        assert_eq!(rx.recv().await, None);
    }
}
