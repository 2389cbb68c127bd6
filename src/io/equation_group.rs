//! Species × BEC → equation group tables (volume, decay and breakage groups).

use std::collections::HashSet;
use std::io::BufRead;

use super::line_parser::LineParser;
use super::value_parser;
use crate::error::YieldError;
use crate::models::{BecLookup, EquationGroups, GenusDefinitionMap};

/// Largest group number any equation group file may assign.
pub const MAX_EQUATION_GROUP: i32 = 180;

/// Read an equation group file: species(2) gap BEC(4) gap group(3).
///
/// Every species must be mapped for every BEC other than those in `hidden_becs`.
/// Mapping the same species and BEC twice is an error.
pub fn read_equation_groups<R: BufRead>(
    reader: R,
    genera: &GenusDefinitionMap,
    becs: &BecLookup,
    hidden_becs: &[&str],
) -> Result<EquationGroups, YieldError> {
    let parser = LineParser::new()
        .stripped(2, "species")
        .space(1)
        .stripped(4, "bec")
        .space(1)
        .value(
            3,
            "group",
            value_parser::index_in_range(1, MAX_EQUATION_GROUP, "equation group"),
            value_parser::Value::Integer,
        )
        .ignore_segment(|segments| {
            let blank = |i: usize| {
                segments
                    .get(i)
                    .and_then(|s| s.as_deref())
                    .map_or(true, value_parser::is_blank)
            };
            blank(0) || blank(4)
        });

    let mut groups = EquationGroups::new(
        genera.aliases().map(str::to_string),
        becs.aliases().map(str::to_string),
    );
    parser.parse(reader, |record| {
        let species = record.text("species")?;
        let bec = record.text("bec")?;
        if !genera.contains(species) {
            return Err(record.error(species, format!("{species} is not an SP0 identifier")));
        }
        if !becs.contains(bec) {
            return Err(record.error(bec, format!("{bec} is not a BEC identifier")));
        }
        let group = record.integer("group")?;
        if groups
            .put(species.to_string(), bec.to_string(), group)
            .is_some()
        {
            return Err(record.error(
                species,
                format!("Duplicate equation group for SP0 {species} and BEC {bec}"),
            ));
        }
        Ok(())
    })?;

    let hidden: HashSet<&str> = hidden_becs.iter().copied().collect();
    let mut errors = Vec::new();
    groups.each_key(|species, bec, group| {
        if group.is_none() && !hidden.contains(bec.as_str()) {
            errors.push(format!(
                "Expected mappings for BEC {bec} but it was missing for SP0 {species}"
            ));
        }
    });
    if !errors.is_empty() {
        return Err(YieldError::ParseValidation(errors.join("\n")));
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BecDefinition, GenusDefinition, Region, DEFAULT_BEC, NON_VOLUME_BECS};

    fn genera() -> GenusDefinitionMap {
        GenusDefinitionMap::new(vec![
            GenusDefinition {
                alias: "AC".to_string(),
                index: 1,
                name: "Cottonwood".to_string(),
            },
            GenusDefinition {
                alias: "B".to_string(),
                index: 2,
                name: "Balsam".to_string(),
            },
        ])
    }

    fn becs() -> BecLookup {
        BecLookup::new(vec![
            BecDefinition::new("BG", Region::Interior, "Bunchgrass").with_substitutes(DEFAULT_BEC),
            BecDefinition::new("ESSF", Region::Interior, "Engelmann Spruce"),
        ])
    }

    #[test]
    fn test_complete_table() {
        let input = "AC BG     1\nAC ESSF   2\n\nB  BG     3\nB  ESSF   4\n";
        let groups = read_equation_groups(input.as_bytes(), &genera(), &becs(), &[]).unwrap();
        assert!(groups.is_full());
        assert_eq!(groups.get("B", "ESSF"), Some(&4));
    }

    #[test]
    fn test_missing_combination() {
        let input = "AC BG     1\nAC ESSF   2\nB  ESSF   4\n";
        let err = read_equation_groups(input.as_bytes(), &genera(), &becs(), &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parse validation error: Expected mappings for BEC BG but it was missing for SP0 B"
        );
    }

    #[test]
    fn test_hidden_bec_may_be_missing() {
        let input = "AC ESSF   2\nB  ESSF   4\n";
        let groups =
            read_equation_groups(input.as_bytes(), &genera(), &becs(), &NON_VOLUME_BECS).unwrap();
        assert_eq!(groups.get("AC", "BG"), None);
        assert_eq!(groups.get("AC", "ESSF"), Some(&2));
    }

    #[test]
    fn test_unknown_and_duplicate_keys() {
        let err = read_equation_groups("ZZ ESSF   2\n".as_bytes(), &genera(), &becs(), &[])
            .unwrap_err();
        assert_eq!(err.to_string(), "Error at line 1: ZZ is not an SP0 identifier");

        let err = read_equation_groups("AC XX     2\n".as_bytes(), &genera(), &becs(), &[])
            .unwrap_err();
        assert_eq!(err.to_string(), "Error at line 1: XX is not a BEC identifier");

        let err = read_equation_groups(
            "AC ESSF   2\nAC ESSF   3\n".as_bytes(),
            &genera(),
            &becs(),
            &[],
        )
        .unwrap_err();
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_group_out_of_range() {
        let err = read_equation_groups("AC ESSF 181\n".as_bytes(), &genera(), &becs(), &[])
            .unwrap_err();
        assert!(err.to_string().contains("181 is not a valid equation group"));
    }
}
