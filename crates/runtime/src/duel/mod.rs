//! Turn-based duels between players and one NPC.
//!
//! Each duel runs as its own task. A turn collects choices from every active
//! player, orders the NPC and the players by speed, and resolves each actor
//! as one guarded step. Session state (NPC health, who fled or died) lives in
//! memory; anything persistent goes through the store.
mod orchestrator;
mod session;
mod summary;
mod turn;

pub(crate) use orchestrator::{CancelSignal, Duel};
pub use session::{DuelId, DuelOutcome, DuelPhase, DuelSession, EncounterKind, NpcState};
pub use summary::{Actor, DuelReport, LimbReport, LootAward, TurnMessage, TurnSummary};
