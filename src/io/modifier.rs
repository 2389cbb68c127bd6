//! Species/region modifier file.
//!
//! Each line holds a sequence number, six program flags and up to ten
//! modifier values. Sequences 200-299 carry BA and DQ modifiers and 300-399
//! carry decay and waste modifiers; the last two digits pick the species by
//! index, with 0 meaning every species.

use std::io::BufRead;

use tracing::{debug, warn};

use super::line_parser::{LineParser, Record};
use super::value_parser;
use crate::error::YieldError;
use crate::models::{GenusDefinitionMap, Modifiers, Region, RegionModifiers};

pub const PROGRAM_COUNT: usize = 6;
const MOD_COUNT: usize = 10;

/// Apply a modifier file on top of neutral modifiers.
///
/// `program` is the 1-based program column whose flag decides whether a line
/// applies.
pub fn read_modifiers<R: BufRead>(
    reader: R,
    genera: &GenusDefinitionMap,
    program: usize,
) -> Result<Modifiers, YieldError> {
    let mut modifiers = Modifiers::neutral(genera);
    let parser = LineParser::new()
        .integer(3, "sequence")
        .multi_logical(PROGRAM_COUNT, 2, "programs")
        .multi_optional_float(MOD_COUNT, 6, "mods")
        .ignore_line(value_parser::is_blank)
        .stop_segment(|segments| segments.first().and_then(|s| s.as_deref()) == Some("999"))
        .ignore_segment(|segments| {
            segments
                .first()
                .and_then(|s| s.as_deref())
                .map_or(true, |s| {
                    value_parser::is_blank(s) || value_parser::parse_integer(s).is_ok_and(|v| v == 0)
                })
        });

    parser.parse(reader, |record| {
        let sequence = record.integer("sequence")?;
        let programs = record.logicals("programs")?;
        let applies = program
            .checked_sub(1)
            .and_then(|i| programs.get(i).copied())
            .unwrap_or(false);
        if !applies {
            debug!(sequence, program, "modifier line not for this program");
            return Ok(());
        }
        match sequence {
            200..=299 => {
                let mods = required_mods(&record, 4)?;
                for alias in species_for(&record, genera, sequence - 200)? {
                    by_region(&mut modifiers.basal_area, &alias, &mods[0..2]);
                    by_region(&mut modifiers.quad_mean_diameter, &alias, &mods[2..4]);
                }
            }
            300..=399 => {
                let mods = required_mods(&record, 4)?;
                for alias in species_for(&record, genera, sequence - 300)? {
                    by_region(&mut modifiers.decay, &alias, &mods[0..2]);
                    by_region(&mut modifiers.waste, &alias, &mods[2..4]);
                }
            }
            _ => warn!(sequence, line = record.line, "skipping unsupported modifier sequence"),
        }
        Ok(())
    })?;
    Ok(modifiers)
}

/// The first `count` modifier values, all of which must be present.
fn required_mods(record: &Record, count: usize) -> Result<Vec<f32>, YieldError> {
    let raw = record.optional_floats("mods")?;
    let mods: Option<Vec<f32>> = raw.into_iter().chain(std::iter::repeat(None)).take(count).collect();
    mods.ok_or_else(|| record.error("", format!("Expected {count} modifier values")))
}

fn species_for(
    record: &Record,
    genera: &GenusDefinitionMap,
    index: i32,
) -> Result<Vec<String>, YieldError> {
    if index == 0 {
        return Ok(genera.aliases().map(str::to_string).collect());
    }
    genera
        .by_index(index as usize)
        .map(|g| vec![g.alias.clone()])
        .ok_or_else(|| record.error(index.to_string(), format!("{index} is not a valid species index")))
}

/// Set one value per region, in region order.
fn by_region(table: &mut RegionModifiers, alias: &str, values: &[f32]) {
    for (region, &value) in Region::ALL.iter().zip(values) {
        if let Some(slot) = table.get_mut(alias, region) {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenusDefinition;

    fn genera() -> GenusDefinitionMap {
        GenusDefinitionMap::new(
            ["AC", "B", "C"]
                .iter()
                .enumerate()
                .map(|(i, a)| GenusDefinition {
                    alias: a.to_string(),
                    index: i + 1,
                    name: a.to_string(),
                })
                .collect(),
        )
    }

    fn line(sequence: &str, programs: [u8; 6], mods: &[f32]) -> String {
        let flags: String = programs.iter().map(|p| format!("{p:>2}")).collect();
        let values: String = mods.iter().map(|m| format!("{m:>6.3}")).collect();
        format!("{sequence:>3}{flags}{values}\n")
    }

    #[test]
    fn test_defaults_without_lines() {
        let m = read_modifiers("".as_bytes(), &genera(), 1).unwrap();
        assert_eq!(m.basal_area.get("AC", &Region::Coastal), Some(&1.0));
        assert_eq!(m.quad_mean_diameter.get("C", &Region::Interior), Some(&1.0));
        assert_eq!(m.decay.get("B", &Region::Coastal), Some(&0.0));
        assert_eq!(m.waste.get("B", &Region::Interior), Some(&0.0));
    }

    #[test]
    fn test_ba_dq_for_one_species() {
        let input = line("202", [1, 0, 0, 0, 0, 0], &[1.1, 1.2, 0.9, 0.8]);
        let m = read_modifiers(input.as_bytes(), &genera(), 1).unwrap();
        assert_eq!(m.basal_area.get("B", &Region::Coastal), Some(&1.1));
        assert_eq!(m.basal_area.get("B", &Region::Interior), Some(&1.2));
        assert_eq!(m.quad_mean_diameter.get("B", &Region::Coastal), Some(&0.9));
        assert_eq!(m.quad_mean_diameter.get("B", &Region::Interior), Some(&0.8));
        assert_eq!(m.basal_area.get("AC", &Region::Coastal), Some(&1.0));
    }

    #[test]
    fn test_decay_waste_for_all_species() {
        let input = line("300", [0, 0, 1, 0, 0, 0], &[0.1, 0.2, 0.3, 0.4]);
        let m = read_modifiers(input.as_bytes(), &genera(), 3).unwrap();
        for alias in ["AC", "B", "C"] {
            assert_eq!(m.decay.get(alias, &Region::Interior), Some(&0.2));
            assert_eq!(m.waste.get(alias, &Region::Coastal), Some(&0.3));
        }
    }

    #[test]
    fn test_program_flag_and_stop() {
        let input = line("201", [0, 1, 0, 0, 0, 0], &[2.0, 2.0, 2.0, 2.0])
            + "\n"
            + &line("  0", [1, 1, 1, 1, 1, 1], &[9.0, 9.0, 9.0, 9.0])
            + "999\n"
            + &line("201", [1, 1, 1, 1, 1, 1], &[3.0, 3.0, 3.0, 3.0]);
        let m = read_modifiers(input.as_bytes(), &genera(), 1).unwrap();
        assert_eq!(m.basal_area.get("AC", &Region::Coastal), Some(&1.0));
        let m = read_modifiers(input.as_bytes(), &genera(), 2).unwrap();
        assert_eq!(m.basal_area.get("AC", &Region::Coastal), Some(&2.0));
    }

    #[test]
    fn test_unknown_sequence_is_skipped() {
        let input = line("098", [1, 1, 1, 1, 1, 1], &[1.5, 1.5]);
        assert!(read_modifiers(input.as_bytes(), &genera(), 1).is_ok());
    }

    #[test]
    fn test_missing_values() {
        let input = line("201", [1, 0, 0, 0, 0, 0], &[1.1, 1.2]);
        let err = read_modifiers(input.as_bytes(), &genera(), 1).unwrap_err();
        assert_eq!(err.to_string(), "Error at line 1: Expected 4 modifier values");
    }

    #[test]
    fn test_bad_species_index() {
        let input = line("209", [1, 0, 0, 0, 0, 0], &[1.0, 1.0, 1.0, 1.0]);
        let err = read_modifiers(input.as_bytes(), &genera(), 1).unwrap_err();
        assert!(err.to_string().contains("9 is not a valid species index"));
    }
}
