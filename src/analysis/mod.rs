pub mod conversions;
mod engine;
pub mod estimation;
mod reconciliation;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{compute_layer_utilization, YieldEngine};
pub use estimation::{Estimator, SpeciesEquations};
pub use reconciliation::reconcile_components;
