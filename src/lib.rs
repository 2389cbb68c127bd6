pub mod analysis;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod visualization;

pub use analysis::{reconcile_components, Estimator, YieldEngine};
pub use config::{EngineConfig, ProcessingOptions, VolumeMode};
pub use error::YieldError;
pub use io::{load_control_map, ResultWriter};
pub use models::{
    ComponentVectors, ControlMap, StandInput, StandResult, UtilizationClass, UtilizationSet,
    UtilizationVector,
};
