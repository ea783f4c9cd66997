//! Content factory for building catalogs from data files.

use std::path::{Path, PathBuf};

use combat_core::{CombatConfig, ItemTemplate, NpcTemplate};

use crate::loaders::{ConfigLoader, ItemLoader, LoadResult, NpcLoader, validate_references};

/// Everything loaded from a data directory, already cross-checked.
#[derive(Clone, Debug)]
pub struct LoadedContent {
    pub items: Vec<ItemTemplate>,
    pub npcs: Vec<NpcTemplate>,
    pub config: CombatConfig,
}

/// Content factory that loads all combat content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── combat.toml
/// ├── items.ron
/// └── npcs.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Path to the directory containing data files
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Factory over the sample data shipped with this crate.
    pub fn sample() -> Self {
        Self::new(crate::SAMPLE_DATA_DIR)
    }

    /// Load balance tables from `combat.toml`.
    ///
    /// A missing file is not an error; the defaults apply.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        let path = self.data_dir.join("combat.toml");
        if !path.exists() {
            return Ok(CombatConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load item catalog from `items.ron`.
    pub fn load_items(&self) -> LoadResult<Vec<ItemTemplate>> {
        let path = self.data_dir.join("items.ron");
        ItemLoader::load(&path)
    }

    /// Load NPC catalog from `npcs.ron`.
    pub fn load_npcs(&self) -> LoadResult<Vec<NpcTemplate>> {
        let path = self.data_dir.join("npcs.ron");
        NpcLoader::load(&path)
    }

    /// Load every file and verify that all item references resolve.
    pub fn load_all(&self) -> LoadResult<LoadedContent> {
        let items = self.load_items()?;
        let npcs = self.load_npcs()?;
        let config = self.load_config()?;
        validate_references(&items, &npcs).map_err(|e| {
            anyhow::anyhow!("Invalid content in {}: {}", self.data_dir.display(), e)
        })?;

        Ok(LoadedContent {
            items,
            npcs,
            config,
        })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use combat_core::{ItemKey, NpcKey};

    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn sample_data_loads_and_cross_checks() {
        let content = ContentFactory::sample().load_all().unwrap();

        let cain = content
            .npcs
            .iter()
            .find(|n| n.key == NpcKey::from("cain"))
            .unwrap();
        assert!(cain.boss);
        assert_eq!(cain.weapon(), Some(&ItemKey::from("glock-17")));

        let buckshot = content
            .items
            .iter()
            .find(|i| i.key == ItemKey::from("12-gauge_buckshot"))
            .and_then(|i| i.ammunition())
            .unwrap();
        assert_eq!(buckshot.spreads_damage_to_limbs, Some(3));
        assert_eq!(content.config.duel.max_turns, 20);
    }

    #[test]
    fn dangling_reference_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("items.ron"),
            r#"(items: [(key: "bandage", display: "Bandage", durability: Some(1),
                kind: Medical((heals_for: 20, speed: 12)))])"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("npcs.ron"),
            r#"(npcs: [(key: "raider_weak", display: "Raider", health: 30, damage: 25, xp: 40,
                kind: Raider(weapon: "luger"), drops: (common: ["bandage"], rolls: 1))])"#,
        )
        .unwrap();

        let err = ContentFactory::new(dir.path()).load_all().unwrap_err();
        assert!(err.to_string().contains("luger"));
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ContentFactory::new(dir.path()).load_config().unwrap();
        assert_eq!(config, CombatConfig::default());
    }
}
