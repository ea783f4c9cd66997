//! Identifiers and persisted row shapes shared by the runtime and the store.
//!
//! Nothing here is mutated by the rules themselves; resolution functions read
//! these values and return descriptions of the changes to apply.
mod combatant;
mod ids;
mod item;

pub use combatant::{CombatantState, clamp_health};
pub use ids::{ItemId, ItemKey, LocationId, NpcKey, PlayerId};
pub use item::{ItemInstance, ItemLocation};
