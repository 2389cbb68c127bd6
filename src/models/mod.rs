mod bec;
mod coefficients;
mod control_map;
mod genus;
mod matrix_map;
mod stand;
mod utilization;

pub use bec::{
    BecDefinition, BecLookup, Region, DEFAULT_BEC, NON_DECAY_BECS, NON_GROWTH_BECS,
    NON_VOLUME_BECS,
};
pub use coefficients::{Coefficients, CoefficientsView, CoefficientsViewMut};
pub use control_map::{
    ControlMap, EquationGroups, GroupCoefficients, Modifiers, RegionModifiers, TableSummary,
    UtilComponentCoefficients,
};
pub use genus::{GenusDefinition, GenusDefinitionMap};
pub use matrix_map::{Dimension, MatrixMap, MatrixMap2, MatrixMap3, MatrixMap4};
pub use stand::{
    ComponentVectors, SpeciesInput, SpeciesResult, StandInput, StandResult, UtilizationSet,
};
pub use utilization::{UtilizationClass, UtilizationVector};
