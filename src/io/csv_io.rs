use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::YieldError;
use crate::models::{StandResult, UtilizationClass, UtilizationSet};

/// Name used in the `species` column for layer totals.
pub const LAYER_ROW: &str = "LAYER";

/// One utilization class of one species (or the layer) in a results file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub polygon_id: String,
    pub species: String,
    pub utilization_class: i32,
    pub basal_area: f32,
    pub trees_per_hectare: f32,
    pub quad_mean_diameter: f32,
    /// Only present for the SMALL and ALL classes.
    pub lorey_height: Option<f32>,
    pub whole_stem_volume: f32,
    pub close_utilization_volume: f32,
    pub net_decay_volume: f32,
    pub net_decay_waste_volume: f32,
    pub net_decay_waste_breakage_volume: f32,
}

impl ResultRow {
    fn new(polygon_id: &str, species: &str, set: &UtilizationSet, uc: UtilizationClass) -> Self {
        let [ba, tph, dq, ws, cu, nd, ndw, ndwb] = set.row(uc);
        Self {
            polygon_id: polygon_id.to_string(),
            species: species.to_string(),
            utilization_class: uc.index(),
            basal_area: ba,
            trees_per_hectare: tph,
            quad_mean_diameter: dq,
            lorey_height: set.lorey_height.coefficients().try_get(uc.index()),
            whole_stem_volume: ws,
            close_utilization_volume: cu,
            net_decay_volume: nd,
            net_decay_waste_volume: ndw,
            net_decay_waste_breakage_volume: ndwb,
        }
    }
}

/// Flatten results into rows: per stand, the layer first and then each
/// species, each over every utilization class.
pub fn result_rows(results: &[StandResult]) -> Vec<ResultRow> {
    let mut rows = Vec::new();
    for result in results {
        let sets = std::iter::once((LAYER_ROW, &result.layer))
            .chain(result.species.iter().map(|s| (s.genus.as_str(), &s.utilization)));
        for (name, set) in sets {
            for uc in UtilizationClass::ALL_CLASSES {
                rows.push(ResultRow::new(&result.polygon_id, name, set, uc));
            }
        }
    }
    rows
}

/// Write stand results to a CSV file.
pub fn write_results_csv(results: &[StandResult], path: impl AsRef<Path>) -> Result<(), YieldError> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    for row in result_rows(results) {
        wtr.serialize(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read rows back from a results CSV file.
pub fn read_result_rows(path: impl AsRef<Path>) -> Result<Vec<ResultRow>, YieldError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SpeciesResult, UtilizationVector};

    fn result() -> StandResult {
        let mut spec = UtilizationSet::default();
        spec.basal_area = UtilizationVector::from_values([0.0, 4.0, 1.0, 1.0, 1.0, 1.0]);
        spec.lorey_height = UtilizationVector::heights(0.0, 18.5);
        StandResult {
            polygon_id: "p1".to_string(),
            bec: "CWH".to_string(),
            layer: spec.clone(),
            species: vec![SpeciesResult {
                genus: "H".to_string(),
                volume_group: 1,
                decay_group: 2,
                breakage_group: 3,
                percent_of_layer: 100.0,
                utilization: spec,
            }],
        }
    }

    #[test]
    fn test_rows_per_class() {
        let rows = result_rows(&[result()]);
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].species, LAYER_ROW);
        assert_eq!(rows[0].utilization_class, -1);
        assert_eq!(rows[1].lorey_height, Some(18.5));
        assert_eq!(rows[2].lorey_height, None);
        assert_eq!(rows[6].species, "H");
        assert_eq!(rows[7].basal_area, 4.0);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        write_results_csv(&[result()], &path).unwrap();
        let rows = read_result_rows(&path).unwrap();
        assert_eq!(rows, result_rows(&[result()]));
    }
}
