//! BEC zone and genus definition files.

use std::io::BufRead;

use tracing::debug;

use super::line_parser::LineParser;
use super::value_parser::{self, Value};
use crate::error::YieldError;
use crate::models::{BecDefinition, BecLookup, GenusDefinition, GenusDefinitionMap, DEFAULT_BEC};

/// Read BEC zone definitions: alias(4) gap region(1) gap name.
///
/// Reading stops at a `Z` in the region column. The default zone must be
/// present since other zones fall back to it.
pub fn read_bec_definitions<R: BufRead>(reader: R) -> Result<BecLookup, YieldError> {
    let parser = LineParser::new()
        .stripped(4, "alias")
        .space(1)
        .region(1, "region")
        .space(1)
        .stripped_rest("name")
        .ignore_line(value_parser::is_blank)
        .stop_segment(|segments| {
            segments
                .get(2)
                .and_then(|s| s.as_deref())
                .is_some_and(|s| s.eq_ignore_ascii_case("Z"))
        });

    let mut definitions = Vec::new();
    parser.parse(reader, |record| {
        let definition = BecDefinition::new(
            record.text("alias")?,
            record.region("region")?,
            record.text_or_empty("name"),
        )
        .with_substitutes(DEFAULT_BEC);
        debug!(alias = %definition.alias, region = %definition.region, "BEC definition");
        definitions.push(definition);
        Ok(())
    })?;

    let lookup = BecLookup::new(definitions);
    if !lookup.contains(DEFAULT_BEC) {
        return Err(YieldError::ParseValidation(format!(
            "Could not find default BEC {DEFAULT_BEC}"
        )));
    }
    Ok(lookup)
}

/// Read genus definitions: alias(2) gap name(32) gap preference(2).
///
/// A blank or zero preference means the line number. Every preference from 1
/// to `species_count` must be used exactly once.
pub fn read_genus_definitions<R: BufRead>(
    reader: R,
    species_count: usize,
) -> Result<GenusDefinitionMap, YieldError> {
    let parser = LineParser::new()
        .stripped(2, "alias")
        .space(1)
        .stripped(32, "name")
        .space(1)
        .value(
            2,
            "preference",
            |s: &str| value_parser::parse_integer_or_blank(s).map(|p| p.unwrap_or(0)),
            Value::Integer,
        )
        .ignore_line(value_parser::is_blank);

    let mut slots: Vec<Option<GenusDefinition>> = vec![None; species_count];
    parser.parse(reader, |record| {
        let alias = record.text("alias")?.to_string();
        let name = record.text_or_empty("name").to_string();
        let preference = match record.integer("preference") {
            Ok(p) if p != 0 => i64::from(p),
            _ => record.line as i64,
        };

        if preference < 1 || preference > species_count as i64 {
            return Err(record.error(
                preference.to_string(),
                format!("Genera ordering {preference} is outside 1 to {species_count}"),
            ));
        }
        let preference = preference as usize;
        let slot = &mut slots[preference - 1];
        if let Some(existing) = slot {
            return Err(record.error(
                preference.to_string(),
                format!(
                    "Genera ordering {preference} has already been specified for genera {}",
                    existing.alias
                ),
            ));
        }
        *slot = Some(GenusDefinition {
            alias,
            index: preference,
            name,
        });
        Ok(())
    })?;

    let genera: Option<Vec<GenusDefinition>> = slots.into_iter().collect();
    genera.map(GenusDefinitionMap::new).ok_or_else(|| {
        YieldError::ParseValidation("Not all genus definitions were provided.".to_string())
    })
}
