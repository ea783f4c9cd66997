//! Minimal [`combat_core::ItemOracle`] backed by an in-memory map.
use std::collections::HashMap;

use combat_core::{ItemKey, ItemOracle, ItemTemplate};

/// ItemOracle implementation with static item templates
pub struct ItemOracleImpl {
    templates: HashMap<ItemKey, ItemTemplate>,
}

impl ItemOracleImpl {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Add an item template, replacing any template with the same key
    pub fn add_template(&mut self, template: ItemTemplate) {
        self.templates.insert(template.key.clone(), template);
    }
}

impl Default for ItemOracleImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<ItemTemplate> for ItemOracleImpl {
    fn from_iter<I: IntoIterator<Item = ItemTemplate>>(iter: I) -> Self {
        let mut oracle = Self::new();
        for template in iter {
            oracle.add_template(template);
        }
        oracle
    }
}

impl ItemOracle for ItemOracleImpl {
    fn template(&self, key: &ItemKey) -> Option<&ItemTemplate> {
        self.templates.get(key)
    }

    fn all_templates(&self) -> Vec<&ItemTemplate> {
        self.templates.values().collect()
    }
}
