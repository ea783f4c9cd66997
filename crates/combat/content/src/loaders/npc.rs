//! NPC catalog loader.

use std::path::Path;

use combat_core::NpcTemplate;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// NPC catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcCatalog {
    pub npcs: Vec<NpcTemplate>,
}

/// Loader for NPC templates from RON files.
pub struct NpcLoader;

impl NpcLoader {
    /// Load NPC templates from a RON file.
    ///
    /// RON format: `(npcs: [NpcTemplate, ...])`
    pub fn load(path: &Path) -> LoadResult<Vec<NpcTemplate>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<NpcTemplate>> {
        let catalog: NpcCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse NPC catalog RON: {}", e))?;

        for npc in &catalog.npcs {
            if npc.health == 0 {
                anyhow::bail!("NPC '{}' has zero health", npc.key);
            }
        }

        Ok(catalog.npcs)
    }
}

#[cfg(test)]
mod tests {
    use combat_core::NpcKind;

    use super::*;

    #[test]
    fn parses_walker_with_default_fields() {
        let npcs = NpcLoader::parse(
            r#"(
                npcs: [
                    (
                        key: "walker_weak",
                        display: "Walker",
                        health: 30,
                        damage: 20,
                        xp: 20,
                        kind: Walker(penetration: 0.6, chance_to_bite: 15),
                        drops: (common: ["bandage"], rolls: 1),
                    ),
                ],
            )"#,
        )
        .unwrap();

        let walker = &npcs[0];
        assert!(!walker.boss);
        assert!(matches!(walker.kind, NpcKind::Walker { chance_to_bite: 15, .. }));
        assert!(walker.uses_heals.is_empty());
        assert_eq!(walker.drops.rolls, 1);
    }

    #[test]
    fn rejects_zero_health() {
        let err = NpcLoader::parse(
            r#"(npcs: [(key: "ghost", display: "Ghost", health: 0, damage: 1, xp: 0,
                kind: Walker(penetration: 0.0, chance_to_bite: 0), drops: (rolls: 0))])"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("zero health"));
    }
}
