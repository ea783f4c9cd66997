//! Event payloads published on the bus.

use combat_core::{LocationId, NpcKey, PlayerId};
use serde::{Deserialize, Serialize};

use crate::duel::{DuelId, DuelOutcome, EncounterKind, TurnSummary};

/// Lifecycle of a duel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DuelEvent {
    Started {
        duel_id: DuelId,
        location: LocationId,
        kind: EncounterKind,
        npc: NpcKey,
        players: Vec<PlayerId>,
    },
    TurnResolved {
        duel_id: DuelId,
        summary: TurnSummary,
    },
    Ended {
        duel_id: DuelId,
        outcome: DuelOutcome,
        turns: u32,
    },
}

/// One-shot attacks outside a duel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorldEvent {
    NpcAttacked {
        attacker: PlayerId,
        location: LocationId,
        damage: u32,
        remaining: u32,
        killed: bool,
    },
    PlayerAttacked {
        attacker: PlayerId,
        victim: PlayerId,
        location: LocationId,
        damage: u32,
        killed: bool,
    },
}
