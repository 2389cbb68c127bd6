use serde::{Deserialize, Serialize};

use super::utilization::{UtilizationClass, UtilizationVector};
use crate::error::YieldError;

/// Stand-level totals for one species of the primary layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesInput {
    /// Genus (SP0) alias.
    pub genus: String,
    /// Basal area of trees 7.5 cm and up (m²/ha).
    pub basal_area: f32,
    pub trees_per_hectare: f32,
    /// Quadratic mean diameter (cm).
    pub quad_mean_diameter: f32,
    /// Lorey height (m).
    pub lorey_height: f32,
    /// Whole-stem volume (m³/ha). Required unless whole-stem volume is estimated.
    #[serde(default)]
    pub whole_stem_volume: Option<f32>,
}

/// A polygon's primary layer as handed to the stand computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandInput {
    pub polygon_id: String,
    /// BEC zone alias.
    pub bec: String,
    pub age_breast_height: f32,
    pub species: Vec<SpeciesInput>,
}

impl StandInput {
    /// Check the values that can be checked without a control map.
    pub fn validate(&self) -> Result<(), YieldError> {
        if self.species.is_empty() {
            return Err(YieldError::Validation(format!(
                "Polygon {} has no species",
                self.polygon_id
            )));
        }
        for spec in &self.species {
            let fields = [
                ("basal area", spec.basal_area),
                ("trees per hectare", spec.trees_per_hectare),
                ("quadratic mean diameter", spec.quad_mean_diameter),
                ("lorey height", spec.lorey_height),
            ];
            for (name, value) in fields {
                if value.is_nan() || value < 0.0 {
                    return Err(YieldError::Validation(format!(
                        "Species {} in polygon {} has invalid {name} {value}",
                        spec.genus, self.polygon_id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Every per-class attribute computed for a species or a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSet {
    pub basal_area: UtilizationVector,
    pub trees_per_hectare: UtilizationVector,
    pub quad_mean_diameter: UtilizationVector,
    /// SMALL and ALL only.
    pub lorey_height: UtilizationVector,
    pub whole_stem_volume: UtilizationVector,
    pub close_utilization_volume: UtilizationVector,
    pub close_utilization_net_decay_volume: UtilizationVector,
    pub close_utilization_net_decay_waste_volume: UtilizationVector,
    pub close_utilization_net_decay_waste_breakage_volume: UtilizationVector,
}

impl Default for UtilizationSet {
    fn default() -> Self {
        Self {
            basal_area: UtilizationVector::zeroed(),
            trees_per_hectare: UtilizationVector::zeroed(),
            quad_mean_diameter: UtilizationVector::zeroed(),
            lorey_height: UtilizationVector::heights(0.0, 0.0),
            whole_stem_volume: UtilizationVector::zeroed(),
            close_utilization_volume: UtilizationVector::zeroed(),
            close_utilization_net_decay_volume: UtilizationVector::zeroed(),
            close_utilization_net_decay_waste_volume: UtilizationVector::zeroed(),
            close_utilization_net_decay_waste_breakage_volume: UtilizationVector::zeroed(),
        }
    }
}

impl UtilizationSet {
    /// The vectors that add up across species, with their column names.
    pub fn summable(&self) -> [(&'static str, &UtilizationVector); 7] {
        [
            ("basal_area", &self.basal_area),
            ("trees_per_hectare", &self.trees_per_hectare),
            ("whole_stem_volume", &self.whole_stem_volume),
            ("close_utilization_volume", &self.close_utilization_volume),
            ("net_decay_volume", &self.close_utilization_net_decay_volume),
            ("net_decay_waste_volume", &self.close_utilization_net_decay_waste_volume),
            (
                "net_decay_waste_breakage_volume",
                &self.close_utilization_net_decay_waste_breakage_volume,
            ),
        ]
    }

    fn summable_mut(&mut self) -> [&mut UtilizationVector; 7] {
        [
            &mut self.basal_area,
            &mut self.trees_per_hectare,
            &mut self.whole_stem_volume,
            &mut self.close_utilization_volume,
            &mut self.close_utilization_net_decay_volume,
            &mut self.close_utilization_net_decay_waste_volume,
            &mut self.close_utilization_net_decay_waste_breakage_volume,
        ]
    }

    /// Add another set's summable vectors into this one.
    pub fn add(&mut self, other: &UtilizationSet) {
        let sources = other.summable();
        for (target, (_, source)) in self.summable_mut().into_iter().zip(sources) {
            target
                .coefficients_mut()
                .pairwise_in_place(source.coefficients(), |a, b| a + b);
        }
    }

    /// Value of one class across the per-class attributes, in CSV column order.
    pub fn row(&self, uc: UtilizationClass) -> [f32; 8] {
        [
            self.basal_area.get(uc),
            self.trees_per_hectare.get(uc),
            self.quad_mean_diameter.get(uc),
            self.whole_stem_volume.get(uc),
            self.close_utilization_volume.get(uc),
            self.close_utilization_net_decay_volume.get(uc),
            self.close_utilization_net_decay_waste_volume.get(uc),
            self.close_utilization_net_decay_waste_breakage_volume.get(uc),
        ]
    }
}

/// Basal area, trees per hectare and diameter by class, the inputs and
/// outputs of reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentVectors {
    pub basal_area: UtilizationVector,
    pub trees_per_hectare: UtilizationVector,
    pub quad_mean_diameter: UtilizationVector,
}

impl ComponentVectors {
    pub fn validate(&self) -> Result<(), YieldError> {
        for (name, v) in [
            ("basal_area", &self.basal_area),
            ("trees_per_hectare", &self.trees_per_hectare),
            ("quad_mean_diameter", &self.quad_mean_diameter),
        ] {
            if v.len() != UtilizationClass::ALL_CLASSES.len() {
                return Err(YieldError::Validation(format!(
                    "{name} needs a value for every utilization class"
                )));
            }
        }
        Ok(())
    }
}

/// Computed utilization for one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesResult {
    pub genus: String,
    pub volume_group: i32,
    pub decay_group: i32,
    pub breakage_group: i32,
    /// Share of the layer's basal area, in percent.
    pub percent_of_layer: f32,
    pub utilization: UtilizationSet,
}

/// Computed utilization for a polygon's primary layer and its species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandResult {
    pub polygon_id: String,
    pub bec: String,
    pub layer: UtilizationSet,
    pub species: Vec<SpeciesResult>,
}
