//! Loads every control file named by an [`EngineConfig`] into a [`ControlMap`].

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::info;

use super::coefficient_files::{
    read_ba_util_components, read_close_utilization, read_dq_util_components,
    read_net_breakage, read_net_decay, read_net_decay_waste, read_total_stand_whole_stem,
    read_whole_stem_util,
};
use super::definitions::{read_bec_definitions, read_genus_definitions};
use super::equation_group::read_equation_groups;
use super::modifier::read_modifiers;
use crate::config::EngineConfig;
use crate::error::YieldError;
use crate::models::{ControlMap, Modifiers, NON_DECAY_BECS, NON_VOLUME_BECS};

fn open(path: &Path) -> Result<BufReader<File>, YieldError> {
    let file = File::open(path).map_err(|e| {
        YieldError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })?;
    Ok(BufReader::new(file))
}

/// Read a single control file, logging where it came from and how much it held.
fn load<T>(
    path: &Path,
    table: &str,
    read: impl FnOnce(BufReader<File>) -> Result<T, YieldError>,
    count: impl Fn(&T) -> usize,
) -> Result<T, YieldError> {
    let value = read(open(path)?)?;
    info!(path = %path.display(), entries = count(&value), "loaded {table}");
    Ok(value)
}

/// Build the control map from the files named in `config`.
///
/// Definitions are read first since every other table is keyed by them.
pub fn load_control_map(config: &EngineConfig) -> Result<ControlMap, YieldError> {
    let files = &config.control;
    let resolve = |p: &Path| files.resolve(p);

    let becs = load(
        &resolve(&files.bec_definitions),
        "BEC definitions",
        read_bec_definitions,
        |b| b.len(),
    )?;
    let genera = load(
        &resolve(&files.genus_definitions),
        "genus definitions",
        |r| read_genus_definitions(r, config.processing.species_count),
        |g| g.len(),
    )?;

    let volume_groups = load(
        &resolve(&files.volume_groups),
        "volume groups",
        |r| read_equation_groups(r, &genera, &becs, &NON_VOLUME_BECS),
        |t| t.len(),
    )?;
    let decay_groups = load(
        &resolve(&files.decay_groups),
        "decay groups",
        |r| read_equation_groups(r, &genera, &becs, &NON_DECAY_BECS),
        |t| t.len(),
    )?;
    let breakage_groups = load(
        &resolve(&files.breakage_groups),
        "breakage groups",
        |r| read_equation_groups(r, &genera, &becs, &[]),
        |t| t.len(),
    )?;

    let basal_area_util_components = load(
        &resolve(&files.ba_util_components),
        "BA utilization components",
        |r| read_ba_util_components(r, &genera, &becs),
        |t| t.len(),
    )?;
    let quad_mean_diameter_util_components = load(
        &resolve(&files.dq_util_components),
        "DQ utilization components",
        |r| read_dq_util_components(r, &genera, &becs),
        |t| t.len(),
    )?;

    let whole_stem_util_components = load(
        &resolve(&files.whole_stem_util),
        "whole-stem utilization coefficients",
        read_whole_stem_util,
        |t| t.len(),
    )?;
    let close_utilization = load(
        &resolve(&files.close_utilization),
        "close utilization coefficients",
        read_close_utilization,
        |t| t.len(),
    )?;
    let net_decay = load(
        &resolve(&files.net_decay),
        "net decay coefficients",
        read_net_decay,
        |t| t.len(),
    )?;
    let net_decay_waste = load(
        &resolve(&files.net_decay_waste),
        "net decay waste coefficients",
        |r| read_net_decay_waste(r, &genera),
        |t| t.len(),
    )?;
    let net_breakage = load(
        &resolve(&files.net_breakage),
        "net breakage coefficients",
        read_net_breakage,
        |t| t.len(),
    )?;
    let total_stand_whole_stem = load(
        &resolve(&files.total_stand_whole_stem),
        "total stand whole-stem coefficients",
        read_total_stand_whole_stem,
        |t| t.len(),
    )?;

    let modifiers = match &files.modifiers {
        Some(path) => load(
            &resolve(path),
            "modifiers",
            |r| read_modifiers(r, &genera, config.processing.modifier_program),
            |m| m.basal_area.len(),
        )?,
        None => Modifiers::neutral(&genera),
    };

    Ok(ControlMap {
        genera,
        becs,
        volume_groups,
        decay_groups,
        breakage_groups,
        basal_area_util_components,
        quad_mean_diameter_util_components,
        whole_stem_util_components,
        close_utilization,
        net_decay,
        net_decay_waste,
        net_breakage,
        total_stand_whole_stem,
        modifiers,
    })
}
