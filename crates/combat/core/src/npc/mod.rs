//! NPC decision making.
mod policy;

pub use policy::{NpcAction, NpcChoice, decide};
