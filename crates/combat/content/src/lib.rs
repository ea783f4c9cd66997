//! Data-driven combat content and loaders.
//!
//! This crate ships the sample catalog and provides loaders for RON/TOML data files:
//! - Item templates (weapons, ammunition, medical, stimulants, armor) via RON
//! - NPC templates (walkers, raiders, bosses) via RON
//! - Balance tables ([`combat_core::CombatConfig`]) via TOML
//!
//! Content is consumed by runtime oracles and never appears in persisted state.
//!
//! All loaders use combat-core types directly with serde for RON/TOML deserialization.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    ConfigLoader, ContentFactory, ItemLoader, LoadResult, LoadedContent, NpcLoader,
    validate_references,
};

/// Directory holding the sample data shipped with this crate.
pub const SAMPLE_DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data");
