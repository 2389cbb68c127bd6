use tracing::{debug, info, instrument, warn};

use super::conversions::{quad_mean_diameter, trees_per_hectare};
use super::estimation::{Estimator, SpeciesEquations};
use super::reconciliation::reconcile_components;
use crate::config::{ProcessingOptions, VolumeMode};
use crate::error::YieldError;
use crate::models::{
    BecDefinition, ControlMap, EquationGroups, SpeciesInput, SpeciesResult, StandInput, StandResult,
    UtilizationClass, UtilizationSet, UtilizationVector,
};

/// Program number from which breakage is no longer estimated.
const NO_BREAKAGE_PROGRAM: usize = 6;

/// Stand computations over a loaded control map.
pub struct YieldEngine<'a> {
    estimator: Estimator<'a>,
    options: &'a ProcessingOptions,
}

impl<'a> YieldEngine<'a> {
    pub fn new(control: &'a ControlMap, options: &'a ProcessingOptions) -> Self {
        Self {
            estimator: Estimator::new(control),
            options,
        }
    }

    fn control(&self) -> &'a ControlMap {
        self.estimator.control()
    }

    /// Compute utilization for every species of a stand and the layer totals.
    #[instrument(skip_all, fields(polygon = %stand.polygon_id))]
    pub fn compute_stand(&self, stand: &StandInput) -> Result<StandResult, YieldError> {
        stand.validate()?;
        let bec = self.control().becs.get(&stand.bec).ok_or_else(|| {
            YieldError::Validation(format!(
                "Polygon {} has unknown BEC zone {}",
                stand.polygon_id, stand.bec
            ))
        })?;
        debug!(bec = %bec, species = stand.species.len(), "computing stand");

        let mut species = stand
            .species
            .iter()
            .map(|spec| self.compute_species_utilization(bec, stand.age_breast_height, spec))
            .collect::<Result<Vec<_>, _>>()?;
        let layer = compute_layer_utilization(&mut species);

        info!(
            basal_area = layer.basal_area.all(),
            whole_stem_volume = layer.whole_stem_volume.all(),
            "stand computed"
        );
        Ok(StandResult {
            polygon_id: stand.polygon_id.clone(),
            bec: bec.alias.clone(),
            layer,
            species,
        })
    }

    /// Break one species' stand totals down by utilization class and estimate
    /// its volumes.
    pub fn compute_species_utilization(
        &self,
        bec: &BecDefinition,
        age_breast_height: f32,
        input: &SpeciesInput,
    ) -> Result<SpeciesResult, YieldError> {
        let control = self.control();
        let genus = input.genus.as_str();
        if !control.genera.contains(genus) {
            return Err(YieldError::Validation(format!("Unknown genus {genus}")));
        }
        let group = |table: &EquationGroups, zone: &str, name: &str| {
            table.get(genus, zone).copied().ok_or_else(|| {
                YieldError::processing(format!("No {name} group for {genus} in {zone}"))
            })
        };
        let volume_group = group(&control.volume_groups, bec.volume_bec.as_str(), "volume")?;
        let decay_group = group(&control.decay_groups, bec.decay_bec.as_str(), "decay")?;
        let breakage_group = group(&control.breakage_groups, bec.alias.as_str(), "breakage")?;

        let equations = SpeciesEquations {
            genus,
            region: bec.region,
            volume_group,
            decay_group,
            breakage_group,
            lorey_height: input.lorey_height,
            age_breast_height,
        };

        let whole_stem_volume = match self.options.volume_mode {
            VolumeMode::ByUtilization => input.whole_stem_volume.ok_or_else(|| {
                YieldError::Validation(format!(
                    "Species {genus} has no whole stem volume but the volume mode requires one"
                ))
            })?,
            VolumeMode::EstimateWholeStem
                if input.trees_per_hectare > 0.0 && input.quad_mean_diameter > 0.0 =>
            {
                input.trees_per_hectare
                    * self.estimator.estimate_whole_stem_volume_per_tree(
                        volume_group,
                        input.lorey_height,
                        input.quad_mean_diameter,
                    )?
            }
            VolumeMode::EstimateWholeStem => 0.0,
        };
        debug!(genus, whole_stem_volume, "species whole stem volume");

        let mut work = UtilizationSet::default();
        work.basal_area.set_all(input.basal_area);
        work.trees_per_hectare.set_all(input.trees_per_hectare);
        work.quad_mean_diameter.set_all(input.quad_mean_diameter);
        work.lorey_height.set_all(input.lorey_height);
        work.whole_stem_volume.set_all(whole_stem_volume);

        self.estimator
            .estimate_quad_mean_diameter_by_utilization(bec, genus, &mut work.quad_mean_diameter)?;
        self.estimator.estimate_basal_area_by_utilization(
            bec,
            genus,
            &work.quad_mean_diameter,
            &mut work.basal_area,
        )?;
        set_trees_per_hectare(&mut work);

        reconcile_components(
            &mut work.basal_area,
            &mut work.trees_per_hectare,
            &mut work.quad_mean_diameter,
        )?;
        // Diameters may have moved, so tree counts and the reconciliation are redone.
        set_trees_per_hectare(&mut work);
        reconcile_components(
            &mut work.basal_area,
            &mut work.trees_per_hectare,
            &mut work.quad_mean_diameter,
        )?;

        if input.basal_area > 0.0 {
            self.estimate_volumes(&equations, &mut work)?;
        } else {
            warn!(genus, "species has no basal area, volumes left at zero");
            work.whole_stem_volume = UtilizationVector::zeroed();
        }

        let mut utilization = UtilizationSet::default();
        utilization.lorey_height = work.lorey_height.clone();
        for (target, source) in [
            (&mut utilization.basal_area, &work.basal_area),
            (&mut utilization.trees_per_hectare, &work.trees_per_hectare),
            (&mut utilization.quad_mean_diameter, &work.quad_mean_diameter),
        ] {
            target.set_all(source.all());
            target.copy_from(source, UtilizationClass::is_band);
        }
        for (target, source) in [
            (&mut utilization.whole_stem_volume, &work.whole_stem_volume),
            (&mut utilization.close_utilization_volume, &work.close_utilization_volume),
            (
                &mut utilization.close_utilization_net_decay_volume,
                &work.close_utilization_net_decay_volume,
            ),
            (
                &mut utilization.close_utilization_net_decay_waste_volume,
                &work.close_utilization_net_decay_waste_volume,
            ),
            (
                &mut utilization.close_utilization_net_decay_waste_breakage_volume,
                &work.close_utilization_net_decay_waste_breakage_volume,
            ),
        ] {
            target.copy_from(source, |uc| uc != UtilizationClass::Small);
        }

        Ok(SpeciesResult {
            genus: genus.to_string(),
            volume_group,
            decay_group,
            breakage_group,
            percent_of_layer: 0.0,
            utilization,
        })
    }

    fn estimate_volumes(
        &self,
        equations: &SpeciesEquations<'_>,
        work: &mut UtilizationSet,
    ) -> Result<(), YieldError> {
        let all = UtilizationClass::All;
        let no_adjustment = UtilizationVector::zeroed();
        let est = &self.estimator;

        est.estimate_whole_stem_volume(equations, all, 0.0, work)?;
        est.estimate_close_utilization_volume(equations, all, &no_adjustment, work)?;
        est.estimate_net_decay_volume(equations, all, &no_adjustment, work)?;
        est.estimate_net_decay_and_waste_volume(equations, all, &no_adjustment, work)?;
        if self.options.modifier_program < NO_BREAKAGE_PROGRAM {
            est.estimate_net_decay_waste_and_breakage_volume(equations, all, work)?;
        }
        Ok(())
    }
}

fn set_trees_per_hectare(set: &mut UtilizationSet) {
    for uc in UtilizationClass::UTIL_CLASSES {
        let tph = trees_per_hectare(set.basal_area.get(uc), set.quad_mean_diameter.get(uc));
        set.trees_per_hectare.set(uc, tph);
    }
}

/// Sum species into layer totals and fill in each species' share of the
/// layer basal area.
pub fn compute_layer_utilization(species: &mut [SpeciesResult]) -> UtilizationSet {
    let mut layer = UtilizationSet::default();
    let mut weighted_height = [0.0f32; 2];
    let height_classes = [UtilizationClass::Small, UtilizationClass::All];

    for spec in species.iter() {
        let set = &spec.utilization;
        layer.add(set);
        for (slot, uc) in weighted_height.iter_mut().zip(height_classes) {
            *slot += set.lorey_height.get(uc) * set.basal_area.get(uc);
        }
    }

    for (weighted, uc) in weighted_height.into_iter().zip(height_classes) {
        let ba = layer.basal_area.get(uc);
        let height = if ba > 0.0 { weighted / ba } else { 0.0 };
        layer.lorey_height.set(uc, height);
    }
    for uc in UtilizationClass::ALL_CLASSES {
        let dq = quad_mean_diameter(layer.basal_area.get(uc), layer.trees_per_hectare.get(uc));
        layer.quad_mean_diameter.set(uc, dq);
    }

    let layer_ba = layer.basal_area.all();
    for spec in species.iter_mut() {
        spec.percent_of_layer = if layer_ba > 0.0 {
            100.0 * spec.utilization.basal_area.all() / layer_ba
        } else {
            0.0
        };
    }
    layer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::control_map;
    use assert_approx_eq::assert_approx_eq;

    fn spec(genus: &str, basal_area: f32, trees_per_hectare: f32) -> SpeciesInput {
        SpeciesInput {
            genus: genus.to_string(),
            basal_area,
            trees_per_hectare,
            quad_mean_diameter: quad_mean_diameter(basal_area, trees_per_hectare),
            lorey_height: 20.0,
            whole_stem_volume: None,
        }
    }

    fn stand(species: Vec<SpeciesInput>) -> StandInput {
        StandInput {
            polygon_id: "01002 S000001 00".to_string(),
            bec: "CWH".to_string(),
            age_breast_height: 60.0,
            species,
        }
    }

    fn assert_bands_reconciled(set: &UtilizationSet) {
        let ba = &set.basal_area;
        let tph = &set.trees_per_hectare;
        assert_approx_eq!(ba.band_sum(), ba.all(), 2e-4 * ba.all());
        assert_approx_eq!(tph.band_sum(), tph.all(), 2e-4 * tph.all());
        for uc in UtilizationClass::UTIL_CLASSES {
            if ba.get(uc) > 0.0 {
                let dq = set.quad_mean_diameter.get(uc);
                assert!(dq >= uc.low_bound() - 1e-3 && dq <= uc.high_bound() + 1e-3);
            }
        }
    }

    #[test]
    fn test_species_volume_chain() {
        let control = control_map();
        let options = ProcessingOptions::default();
        let engine = YieldEngine::new(&control, &options);
        let input = spec("H", 20.0, 600.0);
        let bec = control.becs.get("CWH").unwrap();

        let result = engine.compute_species_utilization(bec, 60.0, &input).unwrap();
        let set = &result.utilization;
        assert_eq!(result.volume_group, 2);
        assert_bands_reconciled(set);
        assert_eq!(set.basal_area.small(), 0.0);

        let ws = 600.0 * (-10.0f32).exp() * input.quad_mean_diameter.powi(2) * 20.0;
        let tol = ws * 1e-5;
        assert_approx_eq!(set.whole_stem_volume.all(), ws, tol);
        assert_approx_eq!(set.whole_stem_volume.band_sum(), ws, tol);
        assert_approx_eq!(set.close_utilization_volume.all(), ws / 2.0, tol);
        assert_approx_eq!(set.close_utilization_net_decay_volume.all(), ws / 4.0, tol);
        let frw = (1.0 - (-0.5f32).exp()) * 0.25;
        let ndw = ws / 2.0 * (0.5 - frw);
        assert_approx_eq!(set.close_utilization_net_decay_waste_volume.all(), ndw, tol);
        assert_approx_eq!(
            set.close_utilization_net_decay_waste_breakage_volume.all(),
            ndw - ws / 20.0,
            tol
        );
    }

    #[test]
    fn test_species_falls_into_single_class() {
        let control = control_map();
        let options = ProcessingOptions::default();
        let engine = YieldEngine::new(&control, &options);
        let bec = control.becs.get("CWH").unwrap();

        // the even basal area split puts far too many trees in the small
        // classes, so everything lands in the class holding the stand diameter
        let result = engine
            .compute_species_utilization(bec, 60.0, &spec("C", 5.0, 150.0))
            .unwrap();
        let ba = &result.utilization.basal_area;
        assert_approx_eq!(ba.get(UtilizationClass::U175To225), 5.0, 1e-4);
        assert_eq!(ba.get(UtilizationClass::U75To125), 0.0);
        assert_eq!(ba.get(UtilizationClass::Over225), 0.0);
        assert_bands_reconciled(&result.utilization);
    }

    #[test]
    fn test_supplied_whole_stem_volume() {
        let control = control_map();
        let options = ProcessingOptions {
            volume_mode: VolumeMode::ByUtilization,
            ..ProcessingOptions::default()
        };
        let engine = YieldEngine::new(&control, &options);
        let bec = control.becs.get("CWH").unwrap();

        let mut input = spec("H", 20.0, 600.0);
        let err = engine
            .compute_species_utilization(bec, 60.0, &input)
            .unwrap_err();
        assert!(matches!(err, YieldError::Validation(_)));

        input.whole_stem_volume = Some(150.0);
        let result = engine.compute_species_utilization(bec, 60.0, &input).unwrap();
        assert_approx_eq!(result.utilization.whole_stem_volume.all(), 150.0, 1e-3);
    }

    #[test]
    fn test_no_breakage_for_last_program() {
        let control = control_map();
        let options = ProcessingOptions {
            modifier_program: 6,
            ..ProcessingOptions::default()
        };
        let engine = YieldEngine::new(&control, &options);
        let bec = control.becs.get("CWH").unwrap();
        let result = engine
            .compute_species_utilization(bec, 60.0, &spec("H", 20.0, 600.0))
            .unwrap();
        let set = &result.utilization;
        assert!(set.close_utilization_net_decay_waste_volume.all() > 0.0);
        assert_eq!(set.close_utilization_net_decay_waste_breakage_volume.all(), 0.0);
    }

    #[test]
    fn test_zero_basal_area_species() {
        let control = control_map();
        let options = ProcessingOptions::default();
        let engine = YieldEngine::new(&control, &options);
        let bec = control.becs.get("CWH").unwrap();
        let input = SpeciesInput {
            quad_mean_diameter: 10.0,
            ..spec("C", 0.0, 0.0)
        };
        let result = engine.compute_species_utilization(bec, 60.0, &input).unwrap();
        let set = &result.utilization;
        assert_eq!(set.basal_area.band_sum(), 0.0);
        assert_eq!(set.trees_per_hectare.band_sum(), 0.0);
        assert_eq!(set.whole_stem_volume.all(), 0.0);
    }

    #[test]
    fn test_compute_stand_layer() {
        let control = control_map();
        let options = ProcessingOptions::default();
        let engine = YieldEngine::new(&control, &options);
        let input = stand(vec![spec("H", 20.0, 600.0), spec("C", 5.0, 150.0)]);

        let result = engine.compute_stand(&input).unwrap();
        let layer = &result.layer;
        assert_eq!(result.species.len(), 2);
        assert_approx_eq!(layer.basal_area.all(), 25.0, 1e-4);
        assert_approx_eq!(layer.trees_per_hectare.all(), 750.0, 1e-2);
        assert_approx_eq!(
            layer.quad_mean_diameter.all(),
            quad_mean_diameter(25.0, 750.0),
            1e-4
        );
        assert_approx_eq!(layer.lorey_height.all(), 20.0, 1e-4);
        assert_eq!(layer.lorey_height.small(), 0.0);
        assert_approx_eq!(result.species[0].percent_of_layer, 80.0, 1e-3);
        assert_approx_eq!(result.species[1].percent_of_layer, 20.0, 1e-3);

        let volume: f32 = result
            .species
            .iter()
            .map(|s| s.utilization.whole_stem_volume.all())
            .sum();
        assert_approx_eq!(layer.whole_stem_volume.all(), volume, 1e-3);
    }

    #[test]
    fn test_unknown_bec_and_genus() {
        let control = control_map();
        let options = ProcessingOptions::default();
        let engine = YieldEngine::new(&control, &options);

        let mut input = stand(vec![spec("H", 20.0, 600.0)]);
        input.bec = "XX".to_string();
        let err = engine.compute_stand(&input).unwrap_err();
        assert!(err.to_string().contains("unknown BEC zone XX"));

        let input = stand(vec![spec("Z", 20.0, 600.0)]);
        let err = engine.compute_stand(&input).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Unknown genus Z");
    }

    #[test]
    fn test_substituted_volume_zone() {
        let control = control_map();
        let options = ProcessingOptions::default();
        let engine = YieldEngine::new(&control, &options);
        let mut input = stand(vec![spec("H", 20.0, 600.0)]);
        input.bec = "BG".to_string();
        let result = engine.compute_stand(&input).unwrap();
        assert_eq!(result.bec, "BG");
        assert_eq!(result.species[0].volume_group, 2);
    }
}
