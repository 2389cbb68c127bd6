use std::collections::HashMap;

use super::bec::{BecLookup, Region};
use super::coefficients::Coefficients;
use super::genus::GenusDefinitionMap;
use super::matrix_map::{MatrixMap2, MatrixMap3};

/// Species × BEC zone → equation group number.
pub type EquationGroups = MatrixMap2<String, String, i32>;

/// Utilization class index × species × BEC zone → coefficients.
pub type UtilComponentCoefficients = MatrixMap3<i32, String, String, Coefficients>;

/// Utilization class index × group → coefficients, absent where the file had no row.
pub type GroupCoefficients = MatrixMap2<i32, i32, Coefficients>;

/// Species × region → scalar adjustment.
pub type RegionModifiers = MatrixMap2<String, Region, f32>;

/// Species/region adjustments read from the modifier file.
#[derive(Debug, Clone)]
pub struct Modifiers {
    pub basal_area: RegionModifiers,
    pub quad_mean_diameter: RegionModifiers,
    pub decay: RegionModifiers,
    pub waste: RegionModifiers,
}

impl Modifiers {
    /// Neutral modifiers: multiplicative ones at 1, additive ones at 0.
    pub fn neutral(genera: &GenusDefinitionMap) -> Self {
        let species: Vec<String> = genera.aliases().map(str::to_string).collect();
        let table = |value: f32| {
            MatrixMap2::with_default(species.iter().cloned(), Region::ALL, move |_, _| value)
        };
        Self {
            basal_area: table(1.0),
            quad_mean_diameter: table(1.0),
            decay: table(0.0),
            waste: table(0.0),
        }
    }
}

/// Every lookup table the estimation methods read.
///
/// Built once from the control files and only read afterwards.
#[derive(Debug, Clone)]
pub struct ControlMap {
    pub genera: GenusDefinitionMap,
    pub becs: BecLookup,
    pub volume_groups: EquationGroups,
    pub decay_groups: EquationGroups,
    pub breakage_groups: EquationGroups,
    pub basal_area_util_components: UtilComponentCoefficients,
    pub quad_mean_diameter_util_components: UtilComponentCoefficients,
    pub whole_stem_util_components: GroupCoefficients,
    pub close_utilization: GroupCoefficients,
    pub net_decay: GroupCoefficients,
    /// Keyed by species.
    pub net_decay_waste: HashMap<String, Coefficients>,
    /// Keyed by breakage group.
    pub net_breakage: HashMap<i32, Coefficients>,
    /// Keyed by volume group.
    pub total_stand_whole_stem: HashMap<i32, Coefficients>,
    pub modifiers: Modifiers,
}

/// Counts used to summarise a loaded control map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub name: &'static str,
    pub populated: usize,
    pub size: usize,
}

impl TableSummary {
    pub fn is_full(&self) -> bool {
        self.populated == self.size
    }
}

impl ControlMap {
    /// Entry counts for every table.
    pub fn summary(&self) -> Vec<TableSummary> {
        let keyed = |name, populated: usize| TableSummary {
            name,
            populated,
            size: populated,
        };
        vec![
            keyed("Genus definitions", self.genera.len()),
            keyed("BEC definitions", self.becs.len()),
            TableSummary {
                name: "Volume groups",
                populated: self.volume_groups.len(),
                size: self.volume_groups.size(),
            },
            TableSummary {
                name: "Decay groups",
                populated: self.decay_groups.len(),
                size: self.decay_groups.size(),
            },
            TableSummary {
                name: "Breakage groups",
                populated: self.breakage_groups.len(),
                size: self.breakage_groups.size(),
            },
            TableSummary {
                name: "BA utilization components",
                populated: self.basal_area_util_components.len(),
                size: self.basal_area_util_components.size(),
            },
            TableSummary {
                name: "DQ utilization components",
                populated: self.quad_mean_diameter_util_components.len(),
                size: self.quad_mean_diameter_util_components.size(),
            },
            TableSummary {
                name: "Whole-stem utilization",
                populated: self.whole_stem_util_components.len(),
                size: self.whole_stem_util_components.size(),
            },
            TableSummary {
                name: "Close utilization",
                populated: self.close_utilization.len(),
                size: self.close_utilization.size(),
            },
            TableSummary {
                name: "Net decay",
                populated: self.net_decay.len(),
                size: self.net_decay.size(),
            },
            keyed("Net decay waste", self.net_decay_waste.len()),
            keyed("Net breakage", self.net_breakage.len()),
            keyed("Total stand whole-stem", self.total_stand_whole_stem.len()),
        ]
    }
}
