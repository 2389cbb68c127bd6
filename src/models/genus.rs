use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A species group (genus) known to the coefficient tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenusDefinition {
    pub alias: String,
    /// 1-based preference order, also the position in modifier files.
    pub index: usize,
    pub name: String,
}

/// Genus definitions ordered by index.
#[derive(Debug, Clone, Default)]
pub struct GenusDefinitionMap {
    genera: Vec<GenusDefinition>,
    by_alias: HashMap<String, usize>,
}

impl GenusDefinitionMap {
    /// `genera` must already be in index order.
    pub fn new(genera: Vec<GenusDefinition>) -> Self {
        let by_alias = genera
            .iter()
            .enumerate()
            .map(|(i, g)| (g.alias.clone(), i))
            .collect();
        Self { genera, by_alias }
    }

    pub fn get(&self, alias: &str) -> Option<&GenusDefinition> {
        self.by_alias.get(alias).map(|&i| &self.genera[i])
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.by_alias.contains_key(alias)
    }

    /// Look up by 1-based index.
    pub fn by_index(&self, index: usize) -> Option<&GenusDefinition> {
        index.checked_sub(1).and_then(|i| self.genera.get(i))
    }

    pub fn index_of(&self, alias: &str) -> Option<usize> {
        self.get(alias).map(|g| g.index)
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> + '_ {
        self.genera.iter().map(|g| g.alias.as_str())
    }

    pub fn len(&self) -> usize {
        self.genera.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genera.is_empty()
    }
}
