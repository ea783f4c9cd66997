//! NPC templates implementing [`combat_core::NpcOracle`].
use std::collections::HashMap;

use combat_core::{NpcKey, NpcOracle, NpcTemplate};

/// NpcOracle implementation with static NPC templates
pub struct NpcOracleImpl {
    templates: HashMap<NpcKey, NpcTemplate>,
}

impl NpcOracleImpl {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Add an NPC template
    pub fn add_template(&mut self, template: NpcTemplate) {
        self.templates.insert(template.key.clone(), template);
    }
}

impl Default for NpcOracleImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<NpcTemplate> for NpcOracleImpl {
    fn from_iter<I: IntoIterator<Item = NpcTemplate>>(iter: I) -> Self {
        let mut oracle = Self::new();
        for template in iter {
            oracle.add_template(template);
        }
        oracle
    }
}

impl NpcOracle for NpcOracleImpl {
    fn template(&self, key: &NpcKey) -> Option<&NpcTemplate> {
        self.templates.get(key)
    }

    fn all_templates(&self) -> Vec<&NpcTemplate> {
        self.templates.values().collect()
    }
}
