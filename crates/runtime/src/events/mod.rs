//! Topic-based event bus for runtime events.
//!
//! Duels publish their lifecycle and every turn summary; open-world attacks
//! publish their results. Consumers subscribe only to the topics they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{DuelEvent, WorldEvent};
