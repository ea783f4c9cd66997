use strum::{Display, IntoStaticStr};

use crate::effects::{AfflictionKind, StimulantEffects};
use crate::state::ItemKey;

/// Read-only access to item templates.
pub trait ItemOracle: Send + Sync {
    fn template(&self, key: &ItemKey) -> Option<&ItemTemplate>;

    /// Returns all templates available in this oracle.
    fn all_templates(&self) -> Vec<&ItemTemplate>;

    /// Templates of every stimulant, used to look up active stimulant cooldowns.
    fn stimulants(&self) -> Vec<&ItemTemplate> {
        self.all_templates()
            .into_iter()
            .filter(|t| matches!(t.kind, ItemKind::Stimulant(_)))
            .collect()
    }
}

/// Item template with common fields and type-specific data.
///
/// # Design: Base + Kind Pattern
///
/// - Base struct holds fields every item has (key, display name, durability)
/// - `kind` enum holds type-specific data; behavior dispatches on the tag
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemTemplate {
    pub key: ItemKey,
    pub display: String,
    /// Maximum durability. `None` means the item never wears.
    #[cfg_attr(feature = "serde", serde(default))]
    pub durability: Option<u32>,
    pub kind: ItemKind,
}

impl ItemTemplate {
    /// Turn-order speed of using this item, zero for items that cannot be used in a duel.
    pub fn speed(&self) -> u32 {
        match &self.kind {
            ItemKind::Melee(w) => w.speed,
            ItemKind::Ranged(w) => w.speed,
            ItemKind::Throwable(w) => w.speed,
            ItemKind::Medical(m) => m.speed,
            ItemKind::Stimulant(s) => s.speed,
            ItemKind::Ammunition(_)
            | ItemKind::Armor(_)
            | ItemKind::Helmet(_)
            | ItemKind::Misc => 0,
        }
    }

    /// Seconds between open-world attacks, for weapons.
    pub fn fire_rate(&self) -> Option<u32> {
        match &self.kind {
            ItemKind::Melee(w) => Some(w.fire_rate),
            ItemKind::Ranged(w) => Some(w.fire_rate),
            ItemKind::Throwable(w) => Some(w.fire_rate),
            _ => None,
        }
    }

    pub fn is_weapon(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Melee(_) | ItemKind::Ranged(_) | ItemKind::Throwable(_)
        )
    }

    /// Protection level when worn in the given slot.
    pub fn armor_level(&self, slot: ArmorSlot) -> Option<f64> {
        match (&self.kind, slot) {
            (ItemKind::Armor(a), ArmorSlot::BodyArmor) => Some(a.level),
            (ItemKind::Helmet(a), ArmorSlot::Helmet) => Some(a.level),
            _ => None,
        }
    }

    pub fn medical(&self) -> Option<&MedicalItem> {
        match &self.kind {
            ItemKind::Medical(m) => Some(m),
            _ => None,
        }
    }

    pub fn stimulant(&self) -> Option<&StimulantItem> {
        match &self.kind {
            ItemKind::Stimulant(s) => Some(s),
            _ => None,
        }
    }

    pub fn ammunition(&self) -> Option<&Ammunition> {
        match &self.kind {
            ItemKind::Ammunition(a) => Some(a),
            _ => None,
        }
    }
}

/// Item type with type-specific data.
#[derive(Clone, Debug, PartialEq, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemKind {
    #[strum(serialize = "Melee Weapon")]
    Melee(MeleeWeapon),
    #[strum(serialize = "Ranged Weapon")]
    Ranged(RangedWeapon),
    #[strum(serialize = "Throwable Weapon")]
    Throwable(ThrowableWeapon),
    #[strum(serialize = "Ammunition")]
    Ammunition(Ammunition),
    #[strum(serialize = "Medical")]
    Medical(MedicalItem),
    #[strum(serialize = "Stimulant")]
    Stimulant(StimulantItem),
    #[strum(serialize = "Body Armor")]
    Armor(ArmorItem),
    #[strum(serialize = "Helmet")]
    Helmet(ArmorItem),
    /// Keys, backpacks, junk: nothing combat cares about.
    #[strum(serialize = "Misc")]
    Misc,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeleeWeapon {
    pub damage: u32,
    pub penetration: f64,
    pub accuracy: u32,
    pub speed: u32,
    pub fire_rate: u32,
}

/// Ranged weapons deal no damage themselves; the loaded ammunition does.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangedWeapon {
    pub accuracy: u32,
    pub speed: u32,
    pub fire_rate: u32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThrowableWeapon {
    pub damage: u32,
    pub penetration: f64,
    pub accuracy: u32,
    pub speed: u32,
    pub fire_rate: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub spreads_damage_to_limbs: Option<u8>,
    /// Affliction applied to the defender on a landed throw (e.g. incendiary).
    #[cfg_attr(feature = "serde", serde(default))]
    pub inflicts: Option<AfflictionKind>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ammunition {
    pub damage: u32,
    pub penetration: f64,
    /// Ranged weapons this ammunition can be loaded into.
    pub ammo_for: Vec<ItemKey>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub spreads_damage_to_limbs: Option<u8>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MedicalItem {
    pub heals_for: u32,
    pub speed: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cures: Vec<AfflictionKind>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StimulantItem {
    pub effects: StimulantEffects,
    pub duration_secs: u64,
    pub speed: u32,
}

impl StimulantItem {
    pub fn cooldown_key(key: &ItemKey) -> String {
        format!("stimulant:{}", key.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmorItem {
    pub level: f64,
}

/// Protective equipment slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArmorSlot {
    #[strum(to_string = "armor")]
    BodyArmor,
    #[strum(to_string = "helmet")]
    Helmet,
}
