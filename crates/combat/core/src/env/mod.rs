//! Traits describing read-only catalog data.
//!
//! Oracles expose item and NPC templates. The [`Catalog`] aggregate bundles
//! them so resolution code can look up anything it needs without coupling to
//! a concrete content source.
mod error;
mod items;
mod npc;

pub use error::CatalogError;
pub use items::{
    Ammunition, ArmorItem, ArmorSlot, ItemKind, ItemOracle, ItemTemplate, MedicalItem,
    MeleeWeapon, RangedWeapon, StimulantItem, ThrowableWeapon,
};
pub use npc::{DropTable, NpcKind, NpcOracle, NpcTemplate};

use crate::state::{ItemKey, NpcKey};

/// Aggregates the item and NPC oracles.
#[derive(Clone, Copy)]
pub struct Catalog<'a> {
    pub items: &'a dyn ItemOracle,
    pub npcs: &'a dyn NpcOracle,
}

impl<'a> Catalog<'a> {
    pub fn new(items: &'a dyn ItemOracle, npcs: &'a dyn NpcOracle) -> Self {
        Self { items, npcs }
    }

    pub fn item(&self, key: &ItemKey) -> Result<&'a ItemTemplate, CatalogError> {
        self.items
            .template(key)
            .ok_or_else(|| CatalogError::ItemNotFound(key.clone()))
    }

    pub fn npc(&self, key: &NpcKey) -> Result<&'a NpcTemplate, CatalogError> {
        self.npcs
            .template(key)
            .ok_or_else(|| CatalogError::NpcNotFound(key.clone()))
    }
}

impl core::fmt::Debug for Catalog<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Catalog")
            .field("items", &self.items.all_templates().len())
            .field("npcs", &self.npcs.all_templates().len())
            .finish()
    }
}
