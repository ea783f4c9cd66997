//! Concrete item instances as persisted by the store.

use super::{ItemId, ItemKey, LocationId, PlayerId};

/// A concrete, possibly durability-bearing unit of an item template.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemInstance {
    pub id: ItemId,
    pub template: ItemKey,
    /// Remaining uses. `None` for templates without durability.
    pub durability: Option<u32>,
    /// Whether the owner has this instance in an equipped slot.
    pub equipped: bool,
}

impl ItemInstance {
    pub fn new(id: ItemId, template: ItemKey, durability: Option<u32>) -> Self {
        Self {
            id,
            template,
            durability,
            equipped: false,
        }
    }

    /// Returns true if one more use would exhaust this instance.
    ///
    /// Instances without durability are single-use when consumed.
    pub fn is_last_use(&self) -> bool {
        self.durability.is_none_or(|d| d <= 1)
    }
}

/// Where an item instance currently lives. Exactly one owner at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemLocation {
    /// In a player's inventory (equipped or carried).
    Inventory(PlayerId),
    /// Dropped at a location, claimable by anyone.
    Ground(LocationId),
}

impl ItemLocation {
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            Self::Inventory(owner) => Some(*owner),
            Self::Ground(_) => None,
        }
    }
}
