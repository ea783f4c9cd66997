//! Persisted combat state behind a transactional store contract.
//!
//! The runtime only talks to [`Store`]; [`InMemoryStore`] is the bundled
//! adapter used by tests and the simulator.
mod error;
pub mod memory;
mod traits;
mod types;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use traits::{Store, StoreTransaction};
pub use types::{LockKey, NpcRow, cooldowns};
