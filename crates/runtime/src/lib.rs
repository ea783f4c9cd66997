//! Async runtime for duels and open-world combat.
//!
//! [`DuelService`] is the entry point. It starts duels as background tasks,
//! resolves one-shot attacks, and routes every write through a
//! [`TransactionGuard`] so concurrent actors never see half-applied turns.
//!
//! Modules are organized by responsibility:
//! - [`duel`] runs the turn loop and reports what happened
//! - [`guard`] wraps each step in a locked store transaction
//! - [`store`] is the persistence seam, with an in-memory implementation
//! - [`api`] holds the handles, providers and errors clients interact with
//! - [`events`] is the topic-based event bus
//! - [`oracle`] adapts loaded content to the core catalog
pub mod api;
pub mod config;
pub mod duel;
pub mod events;
pub mod guard;
pub mod oracle;
pub mod store;

mod context;
mod service;
mod steps;

pub use api::{
    ActionCollector, ActionPrompt, DuelHandle, DuelLease, DuelRegistry, IdleCollector,
    KillFeedEntry, Notifier, NotifyError, NullNotifier, PlayerChoice, ReadyPrompt, Result,
    RuntimeError, ScriptedCollector, TracingNotifier,
};
pub use config::RuntimeConfig;
pub use duel::{
    Actor, DuelId, DuelOutcome, DuelReport, EncounterKind, LimbReport, LootAward, TurnMessage,
    TurnSummary,
};
pub use events::{DuelEvent, Event, EventBus, Topic, WorldEvent};
pub use guard::{LockScope, StepError, StepOutcome, TransactionGuard};
pub use oracle::{ItemOracleImpl, NpcOracleImpl, OracleManager};
pub use service::{AttackReport, DuelService, DuelServiceBuilder};
pub use steps::WeaponChoice;
pub use store::{InMemoryStore, Store, StoreError, StoreTransaction};
