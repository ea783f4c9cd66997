//! In-memory state of one duel.

use std::fmt;

use combat_core::{AfflictionKind, ItemKey, LocationId, NpcKey, NpcTemplate, PlayerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DuelId(pub u64);

impl fmt::Display for DuelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "duel-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncounterKind {
    /// One player against an NPC found while scavenging.
    Scavenge,
    /// One or more players against a boss, after a ready-check.
    Boss,
}

impl EncounterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncounterKind::Scavenge => "scavenge",
            EncounterKind::Boss => "boss",
        }
    }
}

/// How a duel ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuelOutcome {
    NpcKilled { by: PlayerId },
    /// Every player died, or died and fled.
    PlayersDefeated,
    /// Every player escaped without anyone dying.
    AllFled,
    /// The turn cap was reached with both sides standing.
    TurnLimit,
    Cancelled,
    /// A boss ready-check was not confirmed in time.
    NotReady,
    /// A step failed in a way that left the duel unable to continue.
    Aborted { reason: String },
}

impl fmt::Display for DuelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuelOutcome::NpcKilled { by } => write!(f, "{by} landed the killing blow"),
            DuelOutcome::PlayersDefeated => f.write_str("the players were defeated"),
            DuelOutcome::AllFled => f.write_str("everyone fled"),
            DuelOutcome::TurnLimit => f.write_str("the fight dragged on and ended in a tie"),
            DuelOutcome::Cancelled => f.write_str("the duel was cancelled"),
            DuelOutcome::NotReady => f.write_str("not everyone was ready"),
            DuelOutcome::Aborted { reason } => write!(f, "something went wrong: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuelPhase {
    AwaitingActions,
    Resolving,
    Ended(DuelOutcome),
}

/// The duel's NPC. Its health and effects live only for the duel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpcState {
    pub key: NpcKey,
    pub display: String,
    pub boss: bool,
    pub health: u32,
    pub max_health: u32,
    pub afflictions: Vec<AfflictionKind>,
    pub stimulants: Vec<ItemKey>,
}

impl NpcState {
    pub fn spawn(template: &NpcTemplate) -> Self {
        Self {
            key: template.key.clone(),
            display: template.display.clone(),
            boss: template.boss,
            health: template.health,
            max_health: template.health,
            afflictions: Vec::new(),
            stimulants: Vec::new(),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    pub fn afflict(&mut self, kind: AfflictionKind) {
        if !self.afflictions.contains(&kind) {
            self.afflictions.push(kind);
        }
    }
}

#[derive(Debug, Clone)]
pub struct DuelSession {
    pub id: DuelId,
    pub location: LocationId,
    pub kind: EncounterKind,
    pub npc: NpcState,
    /// Players still fighting.
    pub active: Vec<PlayerId>,
    /// Everyone who entered the fight.
    pub participants: Vec<PlayerId>,
    pub fled: Vec<PlayerId>,
    pub dead: Vec<PlayerId>,
    pub turn: u32,
    pub phase: DuelPhase,
}

impl DuelSession {
    pub fn new(id: DuelId, location: LocationId, kind: EncounterKind, npc: NpcState, players: Vec<PlayerId>) -> Self {
        Self {
            id,
            location,
            kind,
            npc,
            active: players.clone(),
            participants: players,
            fled: Vec::new(),
            dead: Vec::new(),
            turn: 0,
            phase: DuelPhase::AwaitingActions,
        }
    }

    pub fn is_active(&self, player: PlayerId) -> bool {
        self.active.contains(&player)
    }

    pub fn mark_fled(&mut self, player: PlayerId) {
        if self.leave(player) {
            self.fled.push(player);
        }
    }

    pub fn mark_dead(&mut self, player: PlayerId) {
        if self.leave(player) {
            self.dead.push(player);
        }
    }

    fn leave(&mut self, player: PlayerId) -> bool {
        let before = self.active.len();
        self.active.retain(|p| *p != player);
        self.active.len() != before
    }

    /// Terminal outcome implied by the current state, if any.
    pub fn settled_outcome(&self, last_hit: Option<PlayerId>) -> Option<DuelOutcome> {
        if self.npc.is_dead() {
            let by = last_hit.or_else(|| self.active.first().copied())?;
            return Some(DuelOutcome::NpcKilled { by });
        }
        if self.active.is_empty() {
            return Some(if self.dead.is_empty() {
                DuelOutcome::AllFled
            } else {
                DuelOutcome::PlayersDefeated
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(players: &[u64]) -> DuelSession {
        let npc = NpcState {
            key: "walker_weak".into(),
            display: "Walker".into(),
            boss: false,
            health: 20,
            max_health: 20,
            afflictions: vec![],
            stimulants: vec![],
        };
        DuelSession::new(
            DuelId(1),
            LocationId(1),
            EncounterKind::Scavenge,
            npc,
            players.iter().map(|p| PlayerId(*p)).collect(),
        )
    }

    #[test]
    fn leaving_players_settle_the_duel() {
        let mut s = session(&[1, 2]);
        assert_eq!(s.settled_outcome(None), None);

        s.mark_fled(PlayerId(1));
        s.mark_fled(PlayerId(1));
        assert_eq!(s.fled, [PlayerId(1)]);
        assert_eq!(s.settled_outcome(None), None);

        s.mark_dead(PlayerId(2));
        assert_eq!(s.settled_outcome(None), Some(DuelOutcome::PlayersDefeated));
    }

    #[test]
    fn all_fled_without_deaths() {
        let mut s = session(&[1]);
        s.mark_fled(PlayerId(1));
        assert_eq!(s.settled_outcome(None), Some(DuelOutcome::AllFled));
    }

    #[test]
    fn npc_death_credits_the_last_hit() {
        let mut s = session(&[1, 2]);
        s.npc.health = 0;
        assert_eq!(
            s.settled_outcome(Some(PlayerId(2))),
            Some(DuelOutcome::NpcKilled { by: PlayerId(2) })
        );
    }
}
