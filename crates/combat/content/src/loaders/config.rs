//! Combat balance table loader.

use std::path::Path;

use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat tables from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing tables and fields keep their defaults, so an empty file yields
    /// [`CombatConfig::default`].
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse combat config TOML: {}", e))?;

        if config.armor.wear_divisor <= 0.0 {
            anyhow::bail!("armor.wear_divisor must be positive");
        }
        if config.loot.ammo_drop_min > config.loot.ammo_drop_max {
            anyhow::bail!("loot.ammo_drop_min exceeds loot.ammo_drop_max");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use combat_core::{FleeTable, HitTable};

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ConfigLoader::parse("").unwrap();
        assert_eq!(config, CombatConfig::default());
    }

    #[test]
    fn partial_tables_override_only_named_fields() {
        let config = ConfigLoader::parse(
            r#"
            [flee]
            boss_pct = 25

            [hit]
            head_weight = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.flee.boss_pct, 25);
        assert_eq!(config.flee.scavenge_pct, FleeTable::DEFAULT_SCAVENGE_PCT);
        assert_eq!(config.hit.head_weight, 5);
        assert_eq!(config.hit.chest_weight, HitTable::DEFAULT_CHEST_WEIGHT);
    }

    #[test]
    fn rejects_inverted_ammo_range() {
        let err = ConfigLoader::parse("[loot]\nammo_drop_min = 5\nammo_drop_max = 2\n").unwrap_err();
        assert!(err.to_string().contains("ammo_drop_min"));
    }
}
