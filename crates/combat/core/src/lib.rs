//! Deterministic combat rules for the survival game.
//!
//! `combat-core` holds the pure half of combat resolution: status effect
//! aggregation, hit and damage rolls, the NPC policy, loot rolls and turn
//! ordering. Nothing here performs I/O; every random draw comes from the
//! `rand::Rng` supplied by the caller, so a seeded generator replays a fight
//! exactly. The async duel loop and the persisted store live in
//! `combat-runtime`.
pub mod action;
pub mod combat;
pub mod config;
pub mod effects;
pub mod env;
pub mod error;
pub mod loot;
pub mod npc;
pub mod state;
pub mod turn;

pub use action::ActionChoice;
pub use combat::{
    AttackError, AttackProfile, AttackResolution, DamageRoll, DefenderProfile, HitRoll, Limb,
    LimbHit, compute_damage, resolve_attack, resolve_hit,
};
pub use config::{
    AfflictionTable, ArmorTable, CombatConfig, DuelTable, FleeTable, HitTable, LootTable,
    NpcPolicyTable,
};
pub use effects::{AfflictionKind, EffectSet, EffectSource, StimulantEffects, aggregate};
pub use env::{
    Ammunition, ArmorItem, ArmorSlot, Catalog, CatalogError, DropTable, ItemKind, ItemOracle,
    ItemTemplate, MedicalItem, MeleeWeapon, NpcKind, NpcOracle, NpcTemplate, RangedWeapon,
    StimulantItem, ThrowableWeapon,
};
pub use error::{CombatError, ErrorSeverity};
pub use loot::{DropRolls, DropSource, ItemDrop, Rarity, guaranteed_drops, roll_drops, rolled_drops};
pub use npc::{NpcAction, NpcChoice, decide};
pub use state::{
    CombatantState, ItemId, ItemInstance, ItemKey, ItemLocation, LocationId, NpcKey, PlayerId,
};
pub use turn::{TurnEntry, order_turn};
