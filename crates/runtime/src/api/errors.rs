//! Unified error types surfaced by the runtime API.
//!
//! Wraps store, catalog and step failures so clients can bubble them up with
//! consistent context.
use combat_core::{CatalogError, LocationId, PlayerId};
use thiserror::Error;

use crate::duel::DuelId;
use crate::guard::StepError;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{duel_id} is already running at {location}")]
    DuelAlreadyActive { location: LocationId, duel_id: DuelId },

    #[error("{0} is already in combat")]
    AlreadyInCombat(PlayerId),

    #[error("a duel needs at least one player")]
    NoPlayers,

    /// An open-world action was refused; the message is meant for the player.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Step(#[from] StepError),

    #[error("runtime requires a store to be configured before building")]
    MissingStore,

    #[error("runtime requires oracles to be configured before building")]
    MissingOracles,

    #[error("runtime requires an action collector to be configured before building")]
    MissingCollector,

    #[error("duel registry lock was poisoned")]
    RegistryPoisoned,

    #[error("duel task join failed")]
    DuelTask(#[source] tokio::task::JoinError),
}
