//! Empirical estimation equations.
//!
//! Each method reads its coefficients from the control map and fills in the
//! per-class slots of a utilization vector. The `EMPnnn` names are the
//! equation numbers the coefficient files are documented under.

use tracing::{debug, trace};

use crate::error::YieldError;
use crate::models::{
    BecDefinition, ControlMap, Region, UtilizationClass, UtilizationSet, UtilizationVector,
};

/// Largest logit that can be exponentiated without overflowing an `f32`.
const MAX_LOGIT: f32 = 88.0;

/// `exp(logit)`, failing rather than overflowing.
pub fn safe_exponent(logit: f32) -> Result<f32, YieldError> {
    if logit > MAX_LOGIT {
        return Err(YieldError::processing(format!(
            "logit {logit} exceeds {MAX_LOGIT}"
        )));
    }
    Ok(logit.exp())
}

/// Logistic function `e / (1 + e)` of a logit, via [`safe_exponent`].
pub fn exponent_ratio(logit: f32) -> Result<f32, YieldError> {
    let e = safe_exponent(logit)?;
    Ok(e / (1.0 + e))
}

/// Logistic function saturated to 0 below `-radix` and 1 above `radix`.
pub fn ratio(arg: f32, radix: f32) -> f32 {
    if arg < -radix {
        0.0
    } else if arg > radix {
        1.0
    } else {
        arg.exp() / (1.0 + arg.exp())
    }
}

fn clamp(value: f32, low: f32, high: f32) -> f32 {
    value.max(low).min(high)
}

/// Sum of the four real utilization classes.
pub fn sum_utilization_components(v: &UtilizationVector) -> f32 {
    v.band_sum()
}

/// Store the sum of the four real classes in the ALL slot.
pub fn store_sum_utilization_components(v: &mut UtilizationVector) -> f32 {
    let sum = v.band_sum();
    v.set_all(sum);
    sum
}

/// Scale the four real classes so they sum to the ALL slot. Returns the
/// scale factor.
pub fn normalize_utilization_components(v: &mut UtilizationVector) -> Result<f32, YieldError> {
    let sum = v.band_sum();
    if sum <= 0.0 {
        return Err(YieldError::processing(format!(
            "Total volume {sum} was not positive."
        )));
    }
    let k = v.all() / sum;
    for uc in UtilizationClass::UTIL_CLASSES {
        v.scalar_at(uc, |x| x * k);
    }
    Ok(k)
}

/// Fill `output` from `input` one real class at a time.
///
/// Classes where `skip` holds for the input are set to `default` whatever
/// `target` is. Otherwise only `target` is computed, or every class when
/// `target` is ALL.
fn estimate_utilization(
    input: &UtilizationVector,
    output: &mut UtilizationVector,
    target: UtilizationClass,
    skip: impl Fn(f32) -> bool,
    default: f32,
    mut processor: impl FnMut(UtilizationClass, f32) -> Result<f32, YieldError>,
) -> Result<(), YieldError> {
    for uc in UtilizationClass::UTIL_CLASSES {
        let value = input.get(uc);
        if skip(value) {
            output.set(uc, default);
            continue;
        }
        if target != UtilizationClass::All && target != uc {
            continue;
        }
        output.set(uc, processor(uc, value)?);
    }
    Ok(())
}

/// What the volume equations need to know about one species.
#[derive(Debug, Clone, Copy)]
pub struct SpeciesEquations<'s> {
    pub genus: &'s str,
    pub region: Region,
    pub volume_group: i32,
    pub decay_group: i32,
    pub breakage_group: i32,
    pub lorey_height: f32,
    pub age_breast_height: f32,
}

/// Estimation methods bound to a loaded control map.
#[derive(Debug, Clone, Copy)]
pub struct Estimator<'a> {
    control: &'a ControlMap,
}

impl<'a> Estimator<'a> {
    pub fn new(control: &'a ControlMap) -> Self {
        Self { control }
    }

    pub fn control(&self) -> &'a ControlMap {
        self.control
    }

    /// EMP070. Split the ALL basal area across the four real classes.
    ///
    /// A zero total leaves every class at zero without evaluating anything.
    pub fn estimate_basal_area_by_utilization(
        &self,
        bec: &BecDefinition,
        genus: &str,
        quad_mean_diameter: &UtilizationVector,
        basal_area: &mut UtilizationVector,
    ) -> Result<(), YieldError> {
        let ba_all = basal_area.all();
        if ba_all == 0.0 {
            for uc in UtilizationClass::UTIL_CLASSES {
                basal_area.set(uc, 0.0);
            }
            return Ok(());
        }

        let dq = quad_mean_diameter.all();
        // Basal area at or above each class's lower bound, from 7.5 cm up.
        let mut above = [ba_all, 0.0, 0.0, 0.0];
        for i in 1..above.len() {
            let coe = self
                .control
                .basal_area_util_components
                .get(&(i as i32), genus, bec.growth_bec.as_str())
                .ok_or_else(|| {
                    YieldError::processing(format!(
                        "Could not find BA utilization coefficients for {genus} in {}",
                        bec.growth_bec
                    ))
                })?;
            let a0 = coe.get(1);
            let a1 = coe.get(2);
            let logit = if i == 1 {
                a0 + a1 * dq.powf(0.25)
            } else {
                a0 + a1 * dq
            };
            above[i] = above[i - 1] * exponent_ratio(logit)?;
            if i == 1 && dq < 12.5 {
                let dq1 = quad_mean_diameter.get(UtilizationClass::U75To125);
                let ba12_max = (1.0 - ((dq1 - 7.4) / (dq - 7.4)).powi(2)) * above[0];
                above[1] = above[1].min(ba12_max);
            }
        }

        basal_area.set(UtilizationClass::U75To125, ba_all - above[1]);
        basal_area.set(UtilizationClass::U125To175, above[1] - above[2]);
        basal_area.set(UtilizationClass::U175To225, above[2] - above[3]);
        basal_area.set(UtilizationClass::Over225, above[3]);
        debug!(genus, ?basal_area, "estimated basal area by utilization");
        Ok(())
    }

    /// EMP071. Estimate the diameter of each real class from the ALL diameter.
    ///
    /// Below 7.5001 cm both ALL and the 7.5 cm class are set to 7.5.
    pub fn estimate_quad_mean_diameter_by_utilization(
        &self,
        bec: &BecDefinition,
        genus: &str,
        quad_mean_diameter: &mut UtilizationVector,
    ) -> Result<(), YieldError> {
        let dq07 = quad_mean_diameter.all();
        trace!(genus, bec = %bec.alias, dq07, "estimating DQ by utilization class");

        for uc in UtilizationClass::UTIL_CLASSES {
            let coe = self
                .control
                .quad_mean_diameter_util_components
                .get(&uc.index(), genus, bec.growth_bec.as_str())
                .ok_or_else(|| {
                    YieldError::processing(format!(
                        "Could not find DQ utilization coefficients for {genus} in {}",
                        bec.growth_bec
                    ))
                })?;
            let a0 = coe.get(1);
            let a1 = coe.get(2);
            let a2 = coe.get(3);

            let dq = match uc {
                UtilizationClass::U75To125 => {
                    if dq07 < 7.5001 {
                        quad_mean_diameter.set_all(7.5);
                        7.5
                    } else {
                        let logit = a1 / a0 * (dq07 - 7.5);
                        (7.5 + a0 * (1.0 - safe_exponent(logit)?).powf(a2)).min(dq07)
                    }
                }
                UtilizationClass::U125To175 | UtilizationClass::U175To225 => {
                    let logit = a0 + a1 * (dq07 / 7.5).powf(a2);
                    uc.low_bound() + 5.0 * exponent_ratio(logit)?
                }
                _ => {
                    let a3 = coe.get(4);
                    let logit = a2 + a1 * dq07.powf(a3);
                    (dq07 + a0 * (1.0 - exponent_ratio(logit)?)).max(22.5)
                }
            };
            debug!(class = %uc, dq, "estimated DQ");
            quad_mean_diameter.set(uc, dq);
        }
        Ok(())
    }

    /// EMP090. Whole-stem volume of an average tree (m³).
    pub fn estimate_whole_stem_volume_per_tree(
        &self,
        volume_group: i32,
        lorey_height: f32,
        quad_mean_diameter: f32,
    ) -> Result<f32, YieldError> {
        let coe = self
            .control
            .total_stand_whole_stem
            .get(&volume_group)
            .ok_or_else(|| {
                YieldError::processing(format!(
                    "Could not find total stand whole stem volume coefficients for group {volume_group}"
                ))
            })?;
        let dq = quad_mean_diameter;
        let hl = lorey_height;

        let log_mean_volume = coe.get(0)
            + coe.get(1) * dq.ln()
            + coe.get(2) * hl.ln()
            + coe.get(3) * dq
            + coe.get(4) / dq
            + coe.get(5) * hl
            + coe.get(6) * dq * dq
            + coe.get(7) * hl * dq
            + coe.get(8) * hl / dq;
        Ok(log_mean_volume.exp())
    }

    /// EMP091. Whole-stem volume by class, scaled to the ALL volume when
    /// `target` is ALL.
    pub fn estimate_whole_stem_volume(
        &self,
        species: &SpeciesEquations<'_>,
        target: UtilizationClass,
        adjust_close_util: f32,
        set: &mut UtilizationSet,
    ) -> Result<(), YieldError> {
        let dq_sp = set.quad_mean_diameter.all();
        let hl = species.lorey_height;
        let group = species.volume_group;
        let dq = &set.quad_mean_diameter;

        estimate_utilization(
            &set.basal_area,
            &mut set.whole_stem_volume,
            target,
            |ba| ba < 0.0,
            0.0,
            |uc, ba| {
                let coe = self
                    .control
                    .whole_stem_util_components
                    .get(&uc.index(), &group)
                    .ok_or_else(|| {
                        YieldError::processing(format!(
                            "Could not find whole stem utilization coefficients for group {group}"
                        ))
                    })?;
                let a0 = coe.get(0);
                let a1 = coe.get(1);
                let a2 = coe.get(2);
                let a3 = coe.get(3);

                let mut arg = a0 + a1 * hl.ln() + a2 * dq.get(uc).ln();
                arg += if uc == UtilizationClass::Over225 {
                    a3 * dq_sp
                } else {
                    a3 * dq_sp.ln()
                };
                if uc == target {
                    arg += adjust_close_util;
                }
                Ok(ba * arg.exp())
            },
        )?;

        if target == UtilizationClass::All {
            normalize_utilization_components(&mut set.whole_stem_volume)?;
        }
        Ok(())
    }

    /// EMP092. Close utilization volume by class.
    pub fn estimate_close_utilization_volume(
        &self,
        species: &SpeciesEquations<'_>,
        target: UtilizationClass,
        adjust: &UtilizationVector,
        set: &mut UtilizationSet,
    ) -> Result<(), YieldError> {
        let hl = species.lorey_height;
        let group = species.volume_group;
        let dq = &set.quad_mean_diameter;

        estimate_utilization(
            &set.whole_stem_volume,
            &mut set.close_utilization_volume,
            target,
            |ws| ws <= 0.0,
            0.0,
            |uc, ws| {
                let coe = self
                    .control
                    .close_utilization
                    .get(&uc.index(), &group)
                    .ok_or_else(|| {
                        YieldError::processing(format!(
                            "Could not find close utilization coefficients for group {group}"
                        ))
                    })?;
                let arg = coe.get(1) + coe.get(2) * dq.get(uc) + coe.get(3) * hl + adjust.get(uc);
                Ok(ws * ratio(arg, 7.0))
            },
        )?;

        if target == UtilizationClass::All {
            store_sum_utilization_components(&mut set.close_utilization_volume);
        }
        Ok(())
    }

    /// EMP093. Close utilization volume net of decay by class.
    pub fn estimate_net_decay_volume(
        &self,
        species: &SpeciesEquations<'_>,
        target: UtilizationClass,
        adjust: &UtilizationVector,
        set: &mut UtilizationSet,
    ) -> Result<(), YieldError> {
        let dq = &set.quad_mean_diameter;
        let dq_sp = dq.all();
        let age = species.age_breast_height.max(20.0).ln();
        let group = species.decay_group;
        let modifier = self
            .control
            .modifiers
            .decay
            .get(species.genus, &species.region)
            .copied()
            .unwrap_or(0.0);

        estimate_utilization(
            &set.close_utilization_volume,
            &mut set.close_utilization_net_decay_volume,
            target,
            |cu| cu <= 0.0,
            0.0,
            |uc, cu| {
                let coe = self
                    .control
                    .net_decay
                    .get(&uc.index(), &group)
                    .ok_or_else(|| {
                        YieldError::processing(format!(
                            "Could not find net decay coefficients for group {group}"
                        ))
                    })?;
                let a0 = coe.get(1);
                let a1 = coe.get(2);
                let a2 = coe.get(3);

                let diameter = if uc == UtilizationClass::Over225 {
                    dq.get(uc)
                } else {
                    dq_sp
                };
                let arg = a0 + a1 * diameter.ln() + a2 * age + adjust.get(uc) + modifier;
                Ok(cu * ratio(arg, 8.0))
            },
        )?;

        if target == UtilizationClass::All {
            store_sum_utilization_components(&mut set.close_utilization_net_decay_volume);
        }
        Ok(())
    }

    /// EMP094. Close utilization volume net of decay and waste by class.
    pub fn estimate_net_decay_and_waste_volume(
        &self,
        species: &SpeciesEquations<'_>,
        target: UtilizationClass,
        adjust: &UtilizationVector,
        set: &mut UtilizationSet,
    ) -> Result<(), YieldError> {
        let genus = species.genus;
        let hl = species.lorey_height;
        let dq = &set.quad_mean_diameter;
        let cu_util = &set.close_utilization_volume;
        let coe = self.control.net_decay_waste.get(genus).ok_or_else(|| {
            YieldError::processing(format!(
                "Could not find net waste coefficients for genus {genus}"
            ))
        })?;
        let modifier = self
            .control
            .modifiers
            .waste
            .get(genus, &species.region)
            .copied()
            .unwrap_or(0.0);

        estimate_utilization(
            &set.close_utilization_net_decay_volume,
            &mut set.close_utilization_net_decay_waste_volume,
            target,
            |nd| nd.is_nan() || nd <= 0.0,
            0.0,
            |uc, net_decay| {
                let mut a0 = coe.get(0);
                let a1 = coe.get(1);
                let a2 = coe.get(2);
                let a3 = coe.get(3);
                let a4 = coe.get(4);
                if uc == UtilizationClass::Over225 {
                    a0 += coe.get(5);
                }
                let cu = cu_util.get(uc);
                let frd = 1.0 - net_decay / cu;

                let arg = a0 + a1 * frd + a3 * dq.get(uc).ln() + a4 * hl.ln() + modifier;
                let arg = clamp(arg, -10.0, 10.0);

                let frw = (1.0 - (a2 * frd).exp()) * arg.exp() / (1.0 + arg.exp()) * (1.0 - frd);
                let frw = frd.min(frw);
                let mut result = cu * (1.0 - frd - frw);

                let adjustment = adjust.get(uc);
                if adjustment != 0.0 {
                    let r = result / net_decay;
                    if r > 0.0 && r < 1.0 {
                        let arg = clamp((r / (1.0 - r)).ln() + adjustment, -10.0, 10.0);
                        result = arg.exp() / (1.0 + arg.exp()) * net_decay;
                    }
                }
                Ok(result)
            },
        )?;

        if target == UtilizationClass::All {
            store_sum_utilization_components(&mut set.close_utilization_net_decay_waste_volume);
        }
        Ok(())
    }

    /// EMP095. Close utilization volume net of decay, waste and breakage by class.
    pub fn estimate_net_decay_waste_and_breakage_volume(
        &self,
        species: &SpeciesEquations<'_>,
        target: UtilizationClass,
        set: &mut UtilizationSet,
    ) -> Result<(), YieldError> {
        let group = species.breakage_group;
        let coe = self.control.net_breakage.get(&group).ok_or_else(|| {
            YieldError::processing(format!(
                "Could not find net breakage coefficients for group {group}"
            ))
        })?;
        let a1 = coe.get(1);
        let a2 = coe.get(2);
        let a3 = coe.get(3);
        let a4 = coe.get(4);
        let dq = &set.quad_mean_diameter;
        let cu_util = &set.close_utilization_volume;

        estimate_utilization(
            &set.close_utilization_net_decay_waste_volume,
            &mut set.close_utilization_net_decay_waste_breakage_volume,
            target,
            |ndw| ndw <= 0.0,
            0.0,
            |uc, net_waste| {
                let percent_broken = clamp(a1 + a2 * dq.get(uc).ln(), a3, a4);
                let broken = (percent_broken / 100.0 * cu_util.get(uc)).min(net_waste);
                Ok(net_waste - broken)
            },
        )?;

        if target == UtilizationClass::All {
            store_sum_utilization_components(
                &mut set.close_utilization_net_decay_waste_breakage_volume,
            );
        }
        Ok(())
    }
}
