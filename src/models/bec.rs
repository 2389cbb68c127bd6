use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Broad climatic region of a BEC zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    Coastal,
    Interior,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::Coastal, Region::Interior];

    pub fn alias(self) -> char {
        match self {
            Region::Coastal => 'C',
            Region::Interior => 'I',
        }
    }

    pub fn from_alias(alias: char) -> Option<Region> {
        match alias.to_ascii_uppercase() {
            'C' => Some(Region::Coastal),
            'I' => Some(Region::Interior),
            _ => None,
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Region::Coastal => write!(f, "Coastal"),
            Region::Interior => write!(f, "Interior"),
        }
    }
}

/// Alias of the BEC zone substituted when a zone lacks its own coefficients.
pub const DEFAULT_BEC: &str = "ESSF";

/// Zones without growth coefficients of their own.
pub const NON_GROWTH_BECS: [&str; 2] = ["AT", "BG"];

/// Zones without volume coefficients of their own.
pub const NON_VOLUME_BECS: [&str; 1] = ["BG"];

/// Zones without decay coefficients of their own.
pub const NON_DECAY_BECS: [&str; 0] = [];

/// A biogeoclimatic zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BecDefinition {
    pub alias: String,
    pub region: Region,
    pub name: String,
    /// Zone whose growth coefficients apply to this one.
    pub growth_bec: String,
    /// Zone whose volume coefficients apply to this one.
    pub volume_bec: String,
    /// Zone whose decay coefficients apply to this one.
    pub decay_bec: String,
}

impl BecDefinition {
    /// A zone that supplies all of its own coefficients.
    pub fn new(alias: impl Into<String>, region: Region, name: impl Into<String>) -> Self {
        let alias = alias.into();
        Self {
            growth_bec: alias.clone(),
            volume_bec: alias.clone(),
            decay_bec: alias.clone(),
            alias,
            region,
            name: name.into(),
        }
    }

    /// Redirect growth/volume/decay lookups to `default` where this zone has no
    /// coefficients of that kind.
    pub fn with_substitutes(mut self, default: &str) -> Self {
        if NON_GROWTH_BECS.contains(&self.alias.as_str()) {
            self.growth_bec = default.to_string();
        }
        if NON_VOLUME_BECS.contains(&self.alias.as_str()) {
            self.volume_bec = default.to_string();
        }
        if NON_DECAY_BECS.contains(&self.alias.as_str()) {
            self.decay_bec = default.to_string();
        }
        self
    }
}

impl std::fmt::Display for BecDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.alias)
    }
}

/// All known BEC zones in file order.
#[derive(Debug, Clone, Default)]
pub struct BecLookup {
    definitions: Vec<BecDefinition>,
    by_alias: HashMap<String, usize>,
}

impl BecLookup {
    pub fn new(definitions: Vec<BecDefinition>) -> Self {
        let by_alias = definitions
            .iter()
            .enumerate()
            .map(|(i, d)| (d.alias.clone(), i))
            .collect();
        Self {
            definitions,
            by_alias,
        }
    }

    pub fn get(&self, alias: &str) -> Option<&BecDefinition> {
        self.by_alias.get(alias).map(|&i| &self.definitions[i])
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.by_alias.contains_key(alias)
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> + '_ {
        self.definitions.iter().map(|d| d.alias.as_str())
    }

    pub fn definitions(&self) -> &[BecDefinition] {
        &self.definitions
    }

    /// Zones matched by a scope: blank for every zone, a region letter for all
    /// zones in that region, otherwise one zone by alias.
    pub fn by_scope(&self, scope: &str) -> Vec<&BecDefinition> {
        let scope = scope.trim();
        if scope.is_empty() {
            return self.definitions.iter().collect();
        }
        let mut chars = scope.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(region) = Region::from_alias(c) {
                return self
                    .definitions
                    .iter()
                    .filter(|d| d.region == region)
                    .collect();
            }
        }
        self.get(scope).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
