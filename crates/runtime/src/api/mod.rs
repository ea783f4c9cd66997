//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! the duel and guard modules can stay focused on resolution.

pub mod errors;
pub mod handle;
pub mod providers;
pub mod registry;

pub use errors::{Result, RuntimeError};
pub use handle::DuelHandle;
pub use providers::{
    ActionCollector, ActionPrompt, IdleCollector, KillFeedEntry, Notifier, NotifyError,
    NullNotifier, PlayerChoice, ReadyPrompt, ScriptedCollector, TracingNotifier,
};
pub use registry::{DuelLease, DuelRegistry};
