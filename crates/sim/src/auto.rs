//! Collector that plays every player with a simple heuristic.
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use combat_core::{ActionChoice, ItemInstance, ItemKind, ItemTemplate, PlayerId};
use combat_runtime::{ActionCollector, ActionPrompt, InMemoryStore, OracleManager, PlayerChoice};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Heals below half health, otherwise fires a loaded gun, swings a melee
/// weapon, or runs.
pub struct AutoCollector {
    store: InMemoryStore,
    oracles: OracleManager,
}

impl AutoCollector {
    pub fn new(store: InMemoryStore, oracles: OracleManager) -> Self {
        Self { store, oracles }
    }

    fn pick(&self, player: PlayerId) -> Result<ActionChoice> {
        let row = self
            .store
            .combatant_row(player)?
            .ok_or_else(|| anyhow!("unknown player {player}"))?;
        let inventory = self.store.inventory_of(player)?;
        let catalog = self.oracles.catalog();
        let owned: Vec<(&ItemInstance, &ItemTemplate)> = inventory
            .iter()
            .filter_map(|item| catalog.item(&item.template).ok().map(|t| (item, t)))
            .collect();

        if row.health * 2 < row.max_health {
            if let Some((item, _)) = owned.iter().find(|(_, t)| t.medical().is_some()) {
                return Ok(ActionChoice::UseMedical(item.id));
            }
        }

        for (weapon, template) in &owned {
            if !matches!(template.kind, ItemKind::Ranged(_)) {
                continue;
            }
            let loaded = owned.iter().find(|(_, ammo)| {
                ammo.ammunition()
                    .is_some_and(|ammo| ammo.ammo_for.contains(&template.key))
            });
            if let Some((ammo, _)) = loaded {
                return Ok(ActionChoice::Attack {
                    weapon: weapon.id,
                    ammo: Some(ammo.id),
                    limb: None,
                });
            }
        }

        let melee = owned
            .iter()
            .find(|(_, t)| matches!(t.kind, ItemKind::Melee(_) | ItemKind::Throwable(_)));
        Ok(match melee {
            Some((weapon, _)) => ActionChoice::Attack {
                weapon: weapon.id,
                ammo: None,
                limb: None,
            },
            None => ActionChoice::Flee,
        })
    }
}

#[async_trait]
impl ActionCollector for AutoCollector {
    async fn collect(&self, prompt: &ActionPrompt, choices: mpsc::Sender<PlayerChoice>) {
        for &player in &prompt.players {
            let choice = match self.pick(player) {
                Ok(choice) => choice,
                Err(err) => {
                    warn!(player = player.0, error = %err, "no choice for player");
                    continue;
                }
            };
            debug!(player = player.0, turn = prompt.turn, action = choice.as_str(), "auto choice");
            if choices.send((player, choice)).await.is_err() {
                break;
            }
        }
    }
}
