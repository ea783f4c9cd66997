//! Actions a player can choose during a duel.

use crate::combat::Limb;
use crate::state::ItemId;

/// A player's submitted choice for one turn.
///
/// Items are referenced by instance id; the runtime re-validates ownership
/// when the action resolves since the player may have traded or used the item
/// while thinking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionChoice {
    Attack {
        weapon: ItemId,
        ammo: Option<ItemId>,
        limb: Option<Limb>,
    },
    UseMedical(ItemId),
    UseStimulant(ItemId),
    Flee,
}

impl ActionChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionChoice::Attack { .. } => "attack",
            ActionChoice::UseMedical(_) => "heal",
            ActionChoice::UseStimulant(_) => "stimulant",
            ActionChoice::Flee => "flee",
        }
    }

    /// Item whose speed sets this action's place in the turn order.
    pub fn speed_item(&self) -> Option<ItemId> {
        match self {
            ActionChoice::Attack { weapon, .. } => Some(*weapon),
            ActionChoice::UseMedical(item) | ActionChoice::UseStimulant(item) => Some(*item),
            ActionChoice::Flee => None,
        }
    }
}
