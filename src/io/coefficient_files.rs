//! Readers for the concrete coefficient tables used by the volume and
//! utilization estimators.

use std::collections::HashMap;
use std::io::BufRead;

use tracing::debug;

use super::coefficient_parser::{
    expect_full, CoefficientParser, BEC_SCOPE_KEY, GROUP_INDEX_KEY, SPECIES_KEY, UC_INDEX_KEY,
};
use crate::error::YieldError;
use crate::models::{
    BecLookup, Coefficients, GenusDefinitionMap, GroupCoefficients, UtilComponentCoefficients,
};

pub const BA_UTIL_CODES: [&str; 3] = ["BA12", "BA17", "BA22"];
pub const DQ_UTIL_CODES: [&str; 4] = ["DQ07", "DQ12", "DQ17", "DQ22"];

pub const MAX_WHOLE_STEM_GROUPS: i32 = 80;
pub const MAX_CLOSE_UTIL_GROUPS: i32 = 80;
pub const MAX_DECAY_GROUPS: i32 = 98;
pub const MAX_BREAKAGE_GROUPS: i32 = 40;

fn uc_indices() -> impl Iterator<Item = i32> {
    1..=4
}

/// Shared reader for the BA and DQ utilization component files:
/// code(4) gap species(2) gap BEC scope(4) then `count` coefficients of 10.
///
/// Reading stops at a line starting with four spaces. Combinations the file
/// does not mention hold zero coefficients.
fn read_util_components<R: BufRead>(
    reader: R,
    genera: &GenusDefinitionMap,
    becs: &BecLookup,
    label: &'static str,
    codes: &'static [&'static str],
    count: usize,
) -> Result<UtilComponentCoefficients, YieldError> {
    let parser = CoefficientParser::new()
        .code_key(4, UC_INDEX_KEY, label, codes)
        .space(1)
        .species_key(genera)
        .space(1)
        .bec_scope_key(becs)
        .coefficients(count, 10)
        .origin(1)
        .stop_line(|line| line.starts_with("    "));

    let mut table = UtilComponentCoefficients::with_default(
        1..=codes.len() as i32,
        genera.aliases().map(str::to_string),
        becs.aliases().map(str::to_string),
        |_, _, _| Coefficients::zeroed(count, 1),
    );
    let rows = parser.parse(reader, |record, coefficients| {
        let uc = record.integer(UC_INDEX_KEY)?;
        let species = record.text(SPECIES_KEY)?;
        let scope = record.text(BEC_SCOPE_KEY)?;
        let matched = becs.by_scope(scope);
        if matched.is_empty() {
            return Err(record.error(scope, format!("Could not find any BECs for scope {scope}")));
        }
        for bec in matched {
            table.put(uc, species.to_string(), bec.alias.clone(), coefficients.clone());
        }
        Ok(())
    })?;
    debug!(rows, table = label, "utilization component coefficients");
    Ok(table)
}

/// Basal area by utilization class coefficients (`REGBAC`).
pub fn read_ba_util_components<R: BufRead>(
    reader: R,
    genera: &GenusDefinitionMap,
    becs: &BecLookup,
) -> Result<UtilComponentCoefficients, YieldError> {
    read_util_components(reader, genera, becs, "BA", &BA_UTIL_CODES, 2)
}

/// Quadratic mean diameter by utilization class coefficients (`REGDQC`).
pub fn read_dq_util_components<R: BufRead>(
    reader: R,
    genera: &GenusDefinitionMap,
    becs: &BecLookup,
) -> Result<UtilComponentCoefficients, YieldError> {
    read_util_components(reader, genera, becs, "DQ", &DQ_UTIL_CODES, 4)
}

/// Shared reader for uc(2) gap group(3) coefficient tables.
fn read_group_table<R: BufRead>(
    reader: R,
    max_groups: i32,
    count: usize,
    origin: i32,
) -> Result<GroupCoefficients, YieldError> {
    let parser = CoefficientParser::new()
        .uc_index_key()
        .space(1)
        .group_key(max_groups)
        .coefficients(count, 10)
        .origin(origin);

    let mut table = GroupCoefficients::new(uc_indices(), 1..=max_groups);
    parser.parse(reader, |record, coefficients| {
        table.put(
            record.integer(UC_INDEX_KEY)?,
            record.integer(GROUP_INDEX_KEY)?,
            coefficients,
        );
        Ok(())
    })?;
    Ok(table)
}

/// Whole-stem volume by utilization class (`REGVU`), four coefficients from 0.
pub fn read_whole_stem_util<R: BufRead>(reader: R) -> Result<GroupCoefficients, YieldError> {
    read_group_table(reader, MAX_WHOLE_STEM_GROUPS, 4, 0)
}

/// Close utilization volume (`REGVCU`), three coefficients from 1.
pub fn read_close_utilization<R: BufRead>(reader: R) -> Result<GroupCoefficients, YieldError> {
    read_group_table(reader, MAX_CLOSE_UTIL_GROUPS, 3, 1)
}

/// Net of decay volume (`REGVDU`), three coefficients from 1.
pub fn read_net_decay<R: BufRead>(reader: R) -> Result<GroupCoefficients, YieldError> {
    read_group_table(reader, MAX_DECAY_GROUPS, 3, 1)
}

/// Net of decay and waste (`REGVWU`): species(2) then six coefficients of 9,
/// from 0. Every species must be present.
pub fn read_net_decay_waste<R: BufRead>(
    reader: R,
    genera: &GenusDefinitionMap,
) -> Result<HashMap<String, Coefficients>, YieldError> {
    let parser = CoefficientParser::new()
        .species_key(genera)
        .coefficients(6, 9)
        .origin(0);

    let mut table = HashMap::new();
    parser.parse(reader, |record, coefficients| {
        table.insert(record.text(SPECIES_KEY)?.to_string(), coefficients);
        Ok(())
    })?;
    expect_full("net decay waste coefficients", table.len(), genera.len())?;
    Ok(table)
}

/// Net breakage (`REGBREAK`): group(3) then four coefficients of 9, from 1.
pub fn read_net_breakage<R: BufRead>(reader: R) -> Result<HashMap<i32, Coefficients>, YieldError> {
    read_keyed_by_group(reader, MAX_BREAKAGE_GROUPS, 4, 9, 1)
}

/// Total stand whole-stem volume (`VTOTREG4`): group(3) then nine
/// coefficients of 10, from 0.
pub fn read_total_stand_whole_stem<R: BufRead>(
    reader: R,
) -> Result<HashMap<i32, Coefficients>, YieldError> {
    read_keyed_by_group(reader, MAX_WHOLE_STEM_GROUPS, 9, 10, 0)
}

fn read_keyed_by_group<R: BufRead>(
    reader: R,
    max_groups: i32,
    count: usize,
    width: usize,
    origin: i32,
) -> Result<HashMap<i32, Coefficients>, YieldError> {
    let parser = CoefficientParser::new()
        .group_key(max_groups)
        .coefficients(count, width)
        .origin(origin);

    let mut table = HashMap::new();
    parser.parse(reader, |record, coefficients| {
        table.insert(record.integer(GROUP_INDEX_KEY)?, coefficients);
        Ok(())
    })?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BecDefinition, GenusDefinition, Region};

    fn genera() -> GenusDefinitionMap {
        GenusDefinitionMap::new(
            ["AC", "B"]
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

    fn becs() -> BecLookup {
        BecLookup::new(vec![
            BecDefinition::new("CWH", Region::Coastal, "Coastal Western Hemlock"),
            BecDefinition::new("ESSF", Region::Interior, "Engelmann Spruce"),
            BecDefinition::new("IDF", Region::Interior, "Interior Douglas Fir"),
        ])
    }

    #[test]
    fn test_ba_util_components_scopes() {
        let input = "BA12 AC      -23.22790  12.60472\n\
                     BA17 AC I     -1.5      2.5\n\
                     \n\
                     BA22 B  IDF    3.0      4.0\n";
        let input = format!("{input}    \nBA12 B        9.0      9.0\n");
        let table = read_ba_util_components(input.as_bytes(), &genera(), &becs()).unwrap();
        assert!(table.is_full());
        let c = table.get(&1, "AC", "CWH").unwrap();
        assert_eq!(c.get(1), -23.2279);
        assert_eq!(c.get(2), 12.60472);
        assert_eq!(table.get(&2, "AC", "ESSF").unwrap().get(1), -1.5);
        assert_eq!(table.get(&2, "AC", "CWH").unwrap().get(1), 0.0);
        assert_eq!(table.get(&3, "B", "IDF").unwrap().get(2), 4.0);
        assert_eq!(table.get(&3, "B", "ESSF").unwrap().get(2), 0.0);
        // stopped before the last line
        assert_eq!(table.get(&1, "B", "CWH").unwrap().get(1), 0.0);
    }

    #[test]
    fn test_dq_util_components_need_four_coefficients() {
        let input = "DQ07 AC         1.0       2.0\n";
        let err = read_dq_util_components(input.as_bytes(), &genera(), &becs()).unwrap_err();
        assert!(err.to_string().contains("Expected 4 coefficients"));
    }

    #[test]
    fn test_unknown_scope() {
        let input = "BA12 AC XX     1.0       2.0\n";
        let err = read_ba_util_components(input.as_bytes(), &genera(), &becs()).unwrap_err();
        assert_eq!(err.to_string(), "Error at line 1: XX is not a valid BEC scope");
    }

    #[test]
    fn test_close_utilization() {
        let input = " 1   1    -7.425    0.0000   0.15032\n 0   0\n 4  80     1.000     2.000     3.000\n";
        let table = read_close_utilization(input.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        let c = table.get(&1, &1).unwrap();
        assert_eq!(c.index_from(), 1);
        assert_eq!(c.get(1), -7.425);
        assert!(table.get(&2, &1).is_none());
        assert_eq!(table.get(&4, &80).unwrap().get(3), 3.0);
    }

    #[test]
    fn test_whole_stem_origin_zero() {
        let input = " 2  12    -1.000     2.000     3.000     4.000\n";
        let table = read_whole_stem_util(input.as_bytes()).unwrap();
        let c = table.get(&2, &12).unwrap();
        assert_eq!(c.index_from(), 0);
        assert_eq!(c.get(0), -1.0);
        assert_eq!(c.get(3), 4.0);
    }

    #[test]
    fn test_net_decay_group_limit() {
        let ok = " 1  98     1.000     2.000     3.000\n";
        assert!(read_net_decay(ok.as_bytes()).is_ok());
        let bad = " 1  99     1.000     2.000     3.000\n";
        assert!(read_net_decay(bad.as_bytes()).is_err());
    }

    #[test]
    fn test_net_decay_waste_requires_every_species() {
        let line = "    1.000    2.000    3.000    4.000    5.000    6.000\n";
        let both = format!("AC{line}B {line}");
        let table = read_net_decay_waste(both.as_bytes(), &genera()).unwrap();
        assert_eq!(table["B"].get(5), 6.0);

        let only_one = format!("AC{line}");
        let err = read_net_decay_waste(only_one.as_bytes(), &genera()).unwrap_err();
        assert!(matches!(err, YieldError::ParseValidation(_)));
    }

    #[test]
    fn test_breakage_and_total_stand() {
        let breakage = "  5    2.500   -0.200    1.000   30.000\n";
        let table = read_net_breakage(breakage.as_bytes()).unwrap();
        let c = &table[&5];
        assert_eq!(c.index_from(), 1);
        assert_eq!(c.get(4), 30.0);

        let total = " 10  -10.0000    1.1000    0.8000    0.0000    0.0000    0.0000    0.0000    0.0000    0.0000\n";
        let table = read_total_stand_whole_stem(total.as_bytes()).unwrap();
        let c = &table[&10];
        assert_eq!(c.index_from(), 0);
        assert_eq!(c.len(), 9);
        assert_eq!(c.get(1), 1.1);
    }
}
