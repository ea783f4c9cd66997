//! Turn summaries and the final duel report.

use std::fmt;

use combat_core::{AfflictionKind, ItemId, ItemKey, Limb, LocationId, PlayerId};
use serde::{Deserialize, Serialize};

use super::session::{DuelId, DuelOutcome, EncounterKind};

/// Who did something in a turn message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    Player(PlayerId),
    Npc(String),
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Player(id) => write!(f, "{id}"),
            Actor::Npc(name) => f.write_str(name),
        }
    }
}

/// Damage landed on one limb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimbReport {
    pub limb: Limb,
    pub damage: u32,
    pub reduced: u32,
}

/// One line of a turn summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnMessage {
    /// The step was rolled back and the actor's turn became a no-op.
    Skipped { actor: Actor, reason: String },
    NoAction { player: PlayerId },
    /// Died or fled earlier in the same turn.
    AlreadyOut { actor: Actor },
    Attack {
        attacker: Actor,
        defender: Actor,
        weapon: String,
        requested: Option<Limb>,
        /// A called shot that missed its limb; nothing landed.
        missed: bool,
        hits: Vec<LimbReport>,
    },
    WeaponBroke { player: PlayerId, item: ItemKey },
    ArmorWorn { player: PlayerId, item: ItemKey, remaining: u32 },
    ArmorBroke { player: PlayerId, item: ItemKey },
    Afflicted { target: Actor, affliction: AfflictionKind },
    Healed { actor: Actor, item: ItemKey, amount: u32, cured: Vec<AfflictionKind> },
    Stimulated { actor: Actor, item: ItemKey },
    NpcIdle { npc: String },
    Fled { player: PlayerId },
    FleeFailed { player: PlayerId },
    Died { player: PlayerId, killer: Actor },
    NpcKilled { npc: String, by: PlayerId },
    Loot { player: PlayerId, items: Vec<ItemKey> },
    /// Drops left lying where an open-world NPC fell.
    LootDropped { location: LocationId, items: Vec<ItemKey> },
}

impl fmt::Display for TurnMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnMessage::Skipped { actor, reason } => write!(f, "{actor} skipped their turn: {reason}"),
            TurnMessage::NoAction { player } => write!(f, "{player} did nothing"),
            TurnMessage::AlreadyOut { actor } => write!(f, "{actor} died or fled before acting"),
            TurnMessage::Attack {
                attacker,
                defender,
                weapon,
                requested,
                missed,
                hits,
            } => {
                if *missed {
                    let limb = requested.map(|l| l.to_string()).unwrap_or_default();
                    return write!(f, "{attacker} aimed for {defender}'s {limb} with {weapon} and missed");
                }
                let total: u32 = hits.iter().map(|h| h.damage).sum();
                write!(f, "{attacker} hit {defender} with {weapon} for {total} damage")?;
                let limbs: Vec<String> = hits
                    .iter()
                    .map(|h| {
                        if h.reduced > 0 {
                            format!("{} {} ({} absorbed)", h.limb, h.damage, h.reduced)
                        } else {
                            format!("{} {}", h.limb, h.damage)
                        }
                    })
                    .collect();
                if !limbs.is_empty() {
                    write!(f, " [{}]", limbs.join(", "))?;
                }
                Ok(())
            }
            TurnMessage::WeaponBroke { player, item } => write!(f, "{player}'s {item} broke"),
            TurnMessage::ArmorWorn {
                player,
                item,
                remaining,
            } => write!(f, "{player}'s {item} took wear ({remaining} left)"),
            TurnMessage::ArmorBroke { player, item } => write!(f, "{player}'s {item} broke"),
            TurnMessage::Afflicted { target, affliction } => write!(f, "{target} is now {affliction}"),
            TurnMessage::Healed {
                actor,
                item,
                amount,
                cured,
            } => {
                write!(f, "{actor} used {item} and healed {amount}")?;
                if !cured.is_empty() {
                    let names: Vec<String> = cured.iter().map(|c| c.to_string()).collect();
                    write!(f, ", curing {}", names.join(", "))?;
                }
                Ok(())
            }
            TurnMessage::Stimulated { actor, item } => write!(f, "{actor} used {item}"),
            TurnMessage::NpcIdle { npc } => write!(f, "{npc} sits this turn out"),
            TurnMessage::Fled { player } => write!(f, "{player} fled"),
            TurnMessage::FleeFailed { player } => write!(f, "{player} tried to flee but could not get away"),
            TurnMessage::Died { player, killer } => write!(f, "{player} was killed by {killer}"),
            TurnMessage::NpcKilled { npc, by } => write!(f, "{by} killed {npc}"),
            TurnMessage::Loot { player, items } => {
                let names: Vec<&str> = items.iter().map(ItemKey::as_str).collect();
                write!(f, "{player} looted {}", names.join(", "))
            }
            TurnMessage::LootDropped { location, items } => {
                let names: Vec<&str> = items.iter().map(ItemKey::as_str).collect();
                write!(f, "{} dropped at {location}", names.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    pub turn: u32,
    pub messages: Vec<TurnMessage>,
}

impl TurnSummary {
    pub fn new(turn: u32) -> Self {
        Self {
            turn,
            messages: Vec::new(),
        }
    }
}

impl fmt::Display for TurnSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Turn {}", self.turn)?;
        for message in &self.messages {
            writeln!(f, "  {message}")?;
        }
        Ok(())
    }
}

/// An item created from a kill, with the player who earned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootAward {
    pub player: PlayerId,
    pub item: ItemId,
    pub template: ItemKey,
    pub durability: Option<u32>,
}

/// Everything that happened in a finished duel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelReport {
    pub duel_id: DuelId,
    pub location: LocationId,
    pub kind: EncounterKind,
    pub outcome: DuelOutcome,
    pub turns: Vec<TurnSummary>,
    pub loot: Vec<LootAward>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_line_lists_limbs_and_absorption() {
        let msg = TurnMessage::Attack {
            attacker: Actor::Player(PlayerId(1)),
            defender: Actor::Npc("Raider".into()),
            weapon: "mossberg_500".into(),
            requested: None,
            missed: false,
            hits: vec![
                LimbReport {
                    limb: Limb::Head,
                    damage: 2,
                    reduced: 6,
                },
                LimbReport {
                    limb: Limb::Leg,
                    damage: 8,
                    reduced: 0,
                },
            ],
        };
        assert_eq!(
            msg.to_string(),
            "<@1> hit Raider with mossberg_500 for 10 damage [head 2 (6 absorbed), leg 8]"
        );
    }

    #[test]
    fn missed_called_shot_names_the_limb() {
        let msg = TurnMessage::Attack {
            attacker: Actor::Player(PlayerId(1)),
            defender: Actor::Npc("Walker".into()),
            weapon: "knife".into(),
            requested: Some(Limb::Head),
            missed: true,
            hits: vec![],
        };
        assert_eq!(msg.to_string(), "<@1> aimed for Walker's head with knife and missed");
    }
}
