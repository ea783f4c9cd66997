//! Content loaders for reading combat data from files.
//!
//! Each loader turns one RON/TOML file into combat-core types; the
//! [`ContentFactory`] ties them together and cross-checks references.

pub mod config;
pub mod factory;
pub mod item;
pub mod npc;

pub use config::ConfigLoader;
pub use factory::{ContentFactory, LoadedContent};
pub use item::ItemLoader;
pub use npc::NpcLoader;

use std::collections::HashSet;
use std::path::Path;

use combat_core::{ItemKey, ItemTemplate, NpcKind, NpcTemplate};

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}

/// Checks that every item key referenced by an NPC or an ammunition template exists.
///
/// Also rejects duplicate template keys, since later entries would silently
/// shadow earlier ones once the catalog is indexed.
pub fn validate_references(items: &[ItemTemplate], npcs: &[NpcTemplate]) -> LoadResult<()> {
    let mut known: HashSet<&ItemKey> = HashSet::new();
    for item in items {
        if !known.insert(&item.key) {
            anyhow::bail!("Duplicate item template '{}'", item.key);
        }
    }

    let require = |owner: &str, key: &ItemKey| -> LoadResult<()> {
        if known.contains(key) {
            Ok(())
        } else {
            Err(anyhow::anyhow!("'{}' references unknown item '{}'", owner, key))
        }
    };

    for item in items {
        if let Some(ammo) = item.ammunition() {
            for weapon in &ammo.ammo_for {
                require(item.key.as_str(), weapon)?;
            }
        }
    }

    let mut seen_npcs = HashSet::new();
    for npc in npcs {
        let owner = npc.key.as_str();
        if !seen_npcs.insert(&npc.key) {
            anyhow::bail!("Duplicate NPC template '{}'", owner);
        }

        if let NpcKind::Raider { weapon, ammo } = &npc.kind {
            require(owner, weapon)?;
            if let Some(ammo) = ammo {
                require(owner, ammo)?;
            }
        }

        let worn = npc.armor.iter().chain(npc.helmet.iter());
        let pools = [
            &npc.drops.common,
            &npc.drops.uncommon,
            &npc.drops.rare,
            &npc.drops.rarest,
        ];
        let used = npc.uses_heals.iter().chain(npc.uses_stimulants.iter());
        for key in worn.chain(pools.into_iter().flatten()).chain(used) {
            require(owner, key)?;
        }
    }

    Ok(())
}
