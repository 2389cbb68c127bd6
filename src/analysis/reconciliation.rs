//! Reconciles per-class basal area, trees per hectare and diameter so the
//! four real classes agree with each other and with the ALL totals.
//!
//! Three strategies are tried in turn:
//!
//! * **Mode 1** when even the smallest legal diameters cannot account for the
//!   stand's tree count: diameters drop to their class minimums and basal area
//!   moves down into smaller classes.
//! * **Mode 2** otherwise: class diameters are scaled by a common factor,
//!   pinning any class that leaves its bounds.
//! * **Mode 3** when Mode 2 runs out of unpinned basal area: everything goes
//!   into the one class the stand diameter falls in.

use tracing::debug;

use super::conversions::{quad_mean_diameter, trees_per_hectare};
use crate::error::YieldError;
use crate::models::{UtilizationClass, UtilizationVector};

/// Mode 1 donors, largest first. Each gives basal area to the class below it.
const MODE_1_DONORS: [UtilizationClass; 3] = [
    UtilizationClass::Over225,
    UtilizationClass::U175To225,
    UtilizationClass::U125To175,
];

const MAX_MODE_2_ITERATIONS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    EntryCheck,
    PreCheck,
    Mode1 { tph_sum_high: f32 },
    Mode2Check,
    Mode2,
    Mode3,
    Done,
}

struct Components<'v> {
    basal_area: &'v mut UtilizationVector,
    trees_per_hectare: &'v mut UtilizationVector,
    quad_mean_diameter: &'v mut UtilizationVector,
}

/// Reconcile the three vectors in place.
///
/// Only the four real classes are written; SMALL and ALL are inputs. A zero
/// ALL basal area zeroes the class basal areas and tree counts.
pub fn reconcile_components(
    basal_area: &mut UtilizationVector,
    trees_per_hectare: &mut UtilizationVector,
    quad_mean_diameter: &mut UtilizationVector,
) -> Result<(), YieldError> {
    let mut components = Components {
        basal_area,
        trees_per_hectare,
        quad_mean_diameter,
    };

    let mut step = Step::EntryCheck;
    loop {
        debug!(?step, "reconciliation");
        step = match step {
            Step::EntryCheck => components.entry_check(),
            Step::PreCheck => components.pre_check()?,
            Step::Mode1 { tph_sum_high } => components.mode_1(tph_sum_high),
            Step::Mode2Check => components.mode_2_check(),
            Step::Mode2 => components.mode_2()?,
            Step::Mode3 => components.mode_3(),
            Step::Done => return Ok(()),
        };
    }
}

impl Components<'_> {
    fn entry_check(&mut self) -> Step {
        if self.basal_area.all() != 0.0 {
            return Step::PreCheck;
        }
        for uc in UtilizationClass::UTIL_CLASSES {
            self.basal_area.set(uc, 0.0);
            self.trees_per_hectare.set(uc, 0.0);
        }
        Step::Done
    }

    fn pre_check(&self) -> Result<Step, YieldError> {
        let ba_sum = self.basal_area.band_sum();
        if (ba_sum - self.basal_area.all()).abs() > 0.00003 * ba_sum {
            return Err(YieldError::processing(format!(
                "Computed base areas for {}+ components do not sum to expected total",
                UtilizationClass::U75To125.low_bound()
            )));
        }

        let dq0 = quad_mean_diameter(self.basal_area.all(), self.trees_per_hectare.all());
        if dq0 < UtilizationClass::U75To125.low_bound() {
            return Err(YieldError::processing(format!(
                "Quadratic mean diameter computed from total base area and trees per hectare is less than {} cm",
                UtilizationClass::U75To125.low_bound()
            )));
        }

        // Most trees the classes could hold with every diameter at its minimum.
        let tph_sum_high: f32 = UtilizationClass::UTIL_CLASSES
            .iter()
            .map(|&uc| trees_per_hectare(self.basal_area.get(uc), uc.low_bound()))
            .sum();

        if tph_sum_high < self.trees_per_hectare.all() {
            Ok(Step::Mode1 { tph_sum_high })
        } else {
            Ok(Step::Mode2Check)
        }
    }

    fn mode_1(&mut self, tph_sum_high: f32) -> Step {
        let mut tph_need = self.trees_per_hectare.all() - tph_sum_high;

        for uc in UtilizationClass::UTIL_CLASSES {
            self.quad_mean_diameter.set(uc, uc.low_bound());
        }

        for uc in MODE_1_DONORS {
            let Some(below) = uc.previous() else {
                continue;
            };
            let ba = self.basal_area.get(uc);
            let tph_avail =
                trees_per_hectare(ba, below.low_bound()) - trees_per_hectare(ba, uc.low_bound());

            if tph_avail < tph_need {
                self.basal_area.scalar_at(below, |x| x + ba);
                self.basal_area.set(uc, 0.0);
                tph_need -= tph_avail;
            } else {
                let moved = ba * tph_need / tph_avail;
                self.basal_area.scalar_at(below, |x| x + moved);
                self.basal_area.scalar_at(uc, |x| x - moved);
                break;
            }
        }

        self.recompute_trees_per_hectare();
        Step::Done
    }

    /// Skip Mode 2 when the classes already agree with each other and the
    /// totals.
    fn mode_2_check(&self) -> Step {
        let tph_sum = self.trees_per_hectare.band_sum();
        if tph_sum <= 0.0 || (tph_sum - self.trees_per_hectare.all()).abs() / tph_sum > 0.00001 {
            return Step::Mode2;
        }

        for uc in UtilizationClass::UTIL_CLASSES {
            let ba = self.basal_area.get(uc);
            if ba <= 0.0 {
                continue;
            }
            let tph = self.trees_per_hectare.get(uc);
            if tph <= 0.0 {
                return Step::Mode2;
            }
            let dq = self.quad_mean_diameter.get(uc);
            let d_want = quad_mean_diameter(ba, tph);
            let in_bounds = dq >= uc.low_bound() && dq <= uc.high_bound();
            if !in_bounds || (d_want - dq).abs() >= 0.00001 {
                return Step::Mode2;
            }
        }
        Step::Done
    }

    fn mode_2(&mut self) -> Result<Step, YieldError> {
        let mut iterations = 0;
        let mut ba_fixed = 0.0f32;
        let mut tph_fixed = 0.0f32;
        let mut pinned: Vec<UtilizationClass> = Vec::new();
        let mut dq_trial = UtilizationVector::zeroed();

        loop {
            iterations += 1;
            if iterations > MAX_MODE_2_ITERATIONS {
                return Err(YieldError::processing(format!(
                    "Mode 2 component reconciliation iterations exceeded {MAX_MODE_2_ITERATIONS}"
                )));
            }

            let free = |uc: &UtilizationClass| !pinned.contains(uc);
            let sum: f32 = UtilizationClass::UTIL_CLASSES
                .iter()
                .filter(|uc| free(*uc))
                .map(|&uc| {
                    let ba = self.basal_area.get(uc);
                    let dq = self.quad_mean_diameter.get(uc);
                    if ba != 0.0 {
                        ba / (dq * dq)
                    } else {
                        0.0
                    }
                })
                .sum();

            let ba_all = self.basal_area.all() - ba_fixed;
            let tph_all = self.trees_per_hectare.all() - tph_fixed;
            if ba_all <= 0.0 || tph_all <= 0.0 {
                return Ok(Step::Mode3);
            }

            let dq_all = quad_mean_diameter(ba_all, tph_all);
            let sqrt_k = (dq_all * dq_all / ba_all * sum).sqrt();

            for uc in UtilizationClass::UTIL_CLASSES {
                if free(&uc) && self.basal_area.get(uc) > 0.0 {
                    dq_trial.set(uc, self.quad_mean_diameter.get(uc) * sqrt_k);
                }
            }

            // Worst bound violation as (class, relative size, pinned bound).
            let mut worst: Option<(UtilizationClass, f32, f32)> = None;
            for uc in UtilizationClass::UTIL_CLASSES {
                let trial = dq_trial.get(uc);
                let mut consider = |violation: f32, bound: f32| {
                    if violation > worst.map_or(0.0, |(_, v, _)| v) {
                        worst = Some((uc, violation, bound));
                    }
                };
                if self.basal_area.get(uc) > 0.0 && trial < uc.low_bound() {
                    consider(1.0 - trial / uc.low_bound(), uc.low_bound());
                }
                if trial > uc.high_bound() {
                    consider(trial / uc.high_bound() - 1.0, uc.high_bound());
                }
            }

            let Some((uc, violation, bound)) = worst else {
                break;
            };
            debug!(class = %uc, violation, bound, "pinning diameter");
            dq_trial.set(uc, bound);
            pinned.push(uc);
            let ba = self.basal_area.get(uc);
            ba_fixed += ba;
            tph_fixed += trees_per_hectare(ba, bound);
        }

        for uc in UtilizationClass::UTIL_CLASSES {
            self.quad_mean_diameter.set(uc, dq_trial.get(uc));
        }
        self.recompute_trees_per_hectare();

        let ba_sum = self.basal_area.band_sum();
        if (ba_sum - self.basal_area.all()).abs() > 0.0002 * ba_sum {
            return Err(YieldError::processing("Failed to reconcile Base Area"));
        }
        let tph_sum = self.trees_per_hectare.band_sum();
        if (tph_sum - self.trees_per_hectare.all()).abs() > 0.0002 * tph_sum {
            return Err(YieldError::processing("Failed to reconcile Trees per Hectare"));
        }
        Ok(Step::Done)
    }

    /// Put everything in the first real class whose high bound exceeds the
    /// stand diameter. Empty classes get their midpoint diameter.
    fn mode_3(&mut self) -> Step {
        for uc in UtilizationClass::UTIL_CLASSES {
            self.basal_area.set(uc, 0.0);
            self.trees_per_hectare.set(uc, 0.0);
            self.quad_mean_diameter.set(uc, uc.low_bound() + 2.5);
        }

        let dq_all = self.quad_mean_diameter.all();
        let target = UtilizationClass::UTIL_CLASSES
            .into_iter()
            .find(|uc| dq_all < uc.high_bound())
            .unwrap_or(UtilizationClass::Over225);

        self.basal_area.set(target, self.basal_area.all());
        self.trees_per_hectare.set(target, self.trees_per_hectare.all());
        self.quad_mean_diameter.set(target, dq_all);
        Step::Done
    }

    fn recompute_trees_per_hectare(&mut self) {
        for uc in UtilizationClass::UTIL_CLASSES {
            let tph = trees_per_hectare(self.basal_area.get(uc), self.quad_mean_diameter.get(uc));
            self.trees_per_hectare.set(uc, tph);
        }
    }
}
