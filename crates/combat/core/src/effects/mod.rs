//! Status effects: stimulants, afflictions and their aggregation.
//!
//! Active stimulants and afflictions are folded into a single [`EffectSet`]
//! before any roll is made. Expiry is not tracked here; callers pass only the
//! effects that are currently active.

mod affliction;
mod aggregate;

pub use affliction::AfflictionKind;
pub use aggregate::{EffectSet, EffectSource, StimulantEffects, aggregate};
