//! Attacker and defender inputs to attack resolution.

use crate::config::NpcPolicyTable;
use crate::effects::{AfflictionKind, EffectSet};
use crate::env::{ArmorSlot, Catalog, CatalogError, ItemKind, ItemTemplate, NpcKind, NpcTemplate};
use crate::error::{CombatError, ErrorSeverity};
use crate::state::ItemKey;

/// Errors raised while assembling an attack from a weapon choice.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AttackError {
    #[error("'{0}' is not a weapon")]
    NotAWeapon(ItemKey),

    #[error("'{weapon}' needs ammunition")]
    MissingAmmo { weapon: ItemKey },

    #[error("'{ammo}' does not fit '{weapon}'")]
    AmmoMismatch { weapon: ItemKey, ammo: ItemKey },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl CombatError for AttackError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotAWeapon(_) | Self::MissingAmmo { .. } | Self::AmmoMismatch { .. } => {
                ErrorSeverity::Validation
            }
            Self::Catalog(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotAWeapon(_) => "ATTACK_NOT_A_WEAPON",
            Self::MissingAmmo { .. } => "ATTACK_MISSING_AMMO",
            Self::AmmoMismatch { .. } => "ATTACK_AMMO_MISMATCH",
            Self::Catalog(err) => err.error_code(),
        }
    }
}

/// Everything the resolver needs to know about the attacking side.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackProfile {
    pub damage: u32,
    pub penetration: f64,
    pub accuracy: u32,
    /// Number of distinct limbs the damage is split across (at least 1).
    pub spread: u8,
    /// Affliction applied by any landed hit (e.g. incendiary grenades).
    pub inflicts: Option<AfflictionKind>,
    /// Percent chance per landed attack to inflict Bitten.
    pub bite_chance_pct: u32,
}

impl AttackProfile {
    /// Builds a player attack from a weapon and optional loaded ammunition.
    ///
    /// Ranged weapons take damage, penetration and spread from the ammo;
    /// melee and throwable weapons ignore any ammo passed.
    pub fn for_weapon(weapon: &ItemTemplate, ammo: Option<&ItemTemplate>) -> Result<Self, AttackError> {
        match &weapon.kind {
            ItemKind::Melee(w) => Ok(Self {
                damage: w.damage,
                penetration: w.penetration,
                accuracy: w.accuracy,
                spread: 1,
                inflicts: None,
                bite_chance_pct: 0,
            }),
            ItemKind::Throwable(w) => Ok(Self {
                damage: w.damage,
                penetration: w.penetration,
                accuracy: w.accuracy,
                spread: w.spreads_damage_to_limbs.unwrap_or(1),
                inflicts: w.inflicts,
                bite_chance_pct: 0,
            }),
            ItemKind::Ranged(w) => {
                let ammo = ammo.ok_or_else(|| AttackError::MissingAmmo {
                    weapon: weapon.key.clone(),
                })?;
                let Some(rounds) = ammo.ammunition() else {
                    return Err(AttackError::AmmoMismatch {
                        weapon: weapon.key.clone(),
                        ammo: ammo.key.clone(),
                    });
                };
                if !rounds.ammo_for.contains(&weapon.key) {
                    return Err(AttackError::AmmoMismatch {
                        weapon: weapon.key.clone(),
                        ammo: ammo.key.clone(),
                    });
                }
                Ok(Self {
                    damage: rounds.damage,
                    penetration: rounds.penetration,
                    accuracy: w.accuracy,
                    spread: rounds.spreads_damage_to_limbs.unwrap_or(1),
                    inflicts: None,
                    bite_chance_pct: 0,
                })
            }
            _ => Err(AttackError::NotAWeapon(weapon.key.clone())),
        }
    }

    /// Builds the attack of an NPC template.
    ///
    /// NPC damage always comes from the template; raiders take penetration,
    /// accuracy and spread from their weapon (and ammo, if ranged).
    pub fn for_npc(
        npc: &NpcTemplate,
        catalog: Catalog<'_>,
        policy: &NpcPolicyTable,
    ) -> Result<Self, AttackError> {
        match &npc.kind {
            NpcKind::Walker {
                penetration,
                chance_to_bite,
            } => Ok(Self {
                damage: npc.damage,
                penetration: *penetration,
                accuracy: policy.unarmed_accuracy,
                spread: 1,
                inflicts: None,
                bite_chance_pct: *chance_to_bite,
            }),
            NpcKind::Raider { weapon, ammo } => {
                let weapon = catalog.item(weapon)?;
                let ammo = ammo.as_ref().map(|key| catalog.item(key)).transpose()?;
                let armed = Self::for_weapon(weapon, ammo)?;
                Ok(Self {
                    damage: npc.damage,
                    ..armed
                })
            }
        }
    }
}

/// Everything the resolver needs to know about the defending side.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DefenderProfile {
    /// Body armor level, if worn.
    pub armor: Option<f64>,
    /// Helmet level, if worn.
    pub helmet: Option<f64>,
    pub effects: EffectSet,
    /// Afflictions already active; these are never inflicted twice.
    pub afflictions: Vec<AfflictionKind>,
}

impl DefenderProfile {
    pub fn level(&self, slot: ArmorSlot) -> Option<f64> {
        match slot {
            ArmorSlot::BodyArmor => self.armor,
            ArmorSlot::Helmet => self.helmet,
        }
    }

    pub fn is_afflicted(&self, kind: AfflictionKind) -> bool {
        self.afflictions.contains(&kind)
    }
}
