//! Builder for coefficient tables: a few validated key columns followed by a
//! block of fixed-width coefficients.

use std::collections::HashSet;
use std::io::BufRead;

use super::line_parser::{LineParser, Record};
use super::value_parser::{self, Value};
use crate::error::{ValueParseError, YieldError};
use crate::models::{BecLookup, Coefficients, GenusDefinitionMap, Region};

pub const UC_INDEX_KEY: &str = "ucIndex";
pub const GROUP_INDEX_KEY: &str = "groupIndex";
pub const SPECIES_KEY: &str = "species";
pub const REGION_KEY: &str = "region";
pub const BEC_SCOPE_KEY: &str = "becScope";
pub const COEFFICIENTS_KEY: &str = "coefficients";

type IgnoreTest = fn(&str) -> bool;

/// What to do with a line that has fewer coefficients than declared.
#[derive(Debug, Clone, Copy)]
pub enum MissingCoefficients {
    /// Fail the parse.
    Reject,
    /// Pad with zeros.
    Zero,
    /// Pad with a value chosen by position (0-based within the block).
    Fill(fn(usize) -> f32),
}

/// Declarative parser for a coefficient file.
#[derive(Debug)]
pub struct CoefficientParser {
    line: LineParser,
    /// One entry per segment; `None` for gaps, which never cause a skip.
    ignore_tests: Vec<Option<IgnoreTest>>,
    keys: Vec<&'static str>,
    count: usize,
    origin: i32,
    missing: MissingCoefficients,
}

impl Default for CoefficientParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CoefficientParser {
    pub fn new() -> Self {
        Self {
            line: LineParser::new(),
            ignore_tests: Vec::new(),
            keys: Vec::new(),
            count: 0,
            origin: 0,
            missing: MissingCoefficients::Reject,
        }
    }

    /// Apply `f` to the underlying line parser, then reinstall the key
    /// ignore rule so it covers every segment declared so far.
    fn with_line(mut self, f: impl FnOnce(LineParser) -> LineParser) -> Self {
        let line = std::mem::take(&mut self.line);
        let tests = self.ignore_tests.clone();
        self.line = f(line).ignore_segment(move |segments| {
            tests.iter().enumerate().any(|(i, test)| match (test, segments.get(i)) {
                (Some(_), None) | (Some(_), Some(None)) => true,
                (Some(test), Some(Some(text))) => test(text.as_str()),
                (None, _) => false,
            })
        });
        self
    }

    /// A key column parsed by `parser`, skipping the line when `ignore` holds.
    pub fn key<T, F>(
        mut self,
        width: usize,
        name: &'static str,
        parser: F,
        wrap: fn(T) -> Value,
        ignore: IgnoreTest,
    ) -> Self
    where
        T: 'static,
        F: Fn(&str) -> Result<T, ValueParseError> + Send + Sync + 'static,
    {
        self.ignore_tests.push(Some(ignore));
        self.keys.push(name);
        self.with_line(|line| line.value(width, name, parser, wrap))
    }

    /// Utilization class index 1 to 4.
    pub fn uc_index_key(self) -> Self {
        self.key(
            2,
            UC_INDEX_KEY,
            value_parser::index_in_range(1, 4, "UC Index"),
            Value::Integer,
            value_parser::is_blank_or_zero,
        )
    }

    /// Group index 1 to `max_groups`.
    pub fn group_key(self, max_groups: i32) -> Self {
        self.key(
            3,
            GROUP_INDEX_KEY,
            value_parser::index_in_range(1, max_groups, "Group Index"),
            Value::Integer,
            value_parser::is_blank_or_zero,
        )
    }

    pub fn species_key(self, genera: &GenusDefinitionMap) -> Self {
        let aliases: HashSet<String> = genera.aliases().map(str::to_string).collect();
        self.key(
            2,
            SPECIES_KEY,
            move |s: &str| {
                let alias = s.trim();
                if aliases.contains(alias) {
                    Ok(alias.to_string())
                } else {
                    Err(ValueParseError::new(s, format!("{alias} is not a valid species")))
                }
            },
            Value::Text,
            value_parser::is_blank,
        )
    }

    pub fn region_key(self) -> Self {
        self.key(
            1,
            REGION_KEY,
            value_parser::parse_region,
            Value::Region,
            value_parser::is_blank,
        )
    }

    /// BEC scope: blank, a region letter, or a known BEC alias. Never skips.
    pub fn bec_scope_key(self, becs: &BecLookup) -> Self {
        let aliases: HashSet<String> = becs.aliases().map(str::to_string).collect();
        self.key(
            4,
            BEC_SCOPE_KEY,
            move |s: &str| {
                let scope = s.trim();
                let is_region = scope.len() == 1
                    && scope.chars().next().and_then(Region::from_alias).is_some();
                if scope.is_empty() || is_region || aliases.contains(scope) {
                    Ok(scope.to_string())
                } else {
                    Err(ValueParseError::new(s, format!("{scope} is not a valid BEC scope")))
                }
            },
            Value::Text,
            |_| false,
        )
    }

    /// A coded key such as `BA12`, stored as the 1-based position of the code
    /// in `codes`.
    pub fn code_key(self, width: usize, name: &'static str, label: &'static str, codes: &'static [&'static str]) -> Self {
        self.key(
            width,
            name,
            move |s: &str| {
                let code = s.trim();
                codes
                    .iter()
                    .position(|c| c.eq_ignore_ascii_case(code))
                    .map(|i| i as i32 + 1)
                    .ok_or_else(|| {
                        ValueParseError::new(
                            s,
                            format!("{code} is not a valid {label} code, expected one of {}", codes.join(", ")),
                        )
                    })
            },
            Value::Integer,
            value_parser::is_blank,
        )
    }

    pub fn space(mut self, width: usize) -> Self {
        self.ignore_tests.push(None);
        self.with_line(|line| line.space(width))
    }

    /// The coefficient block: `count` values of `width` characters.
    pub fn coefficients(mut self, count: usize, width: usize) -> Self {
        self.count = count;
        self.ignore_tests.push(None);
        self.with_line(|line| line.multi_float(count, width, COEFFICIENTS_KEY))
    }

    /// Index of the first coefficient in the resulting vectors.
    pub fn origin(mut self, origin: i32) -> Self {
        self.origin = origin;
        self
    }

    pub fn missing(mut self, policy: MissingCoefficients) -> Self {
        self.missing = policy;
        self
    }

    /// Stop at the first line matching `pred`.
    pub fn stop_line(mut self, pred: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        let line = std::mem::take(&mut self.line);
        self.line = line.stop_line(pred);
        self
    }

    /// Names of the key columns in declaration order.
    pub fn keys(&self) -> &[&'static str] {
        &self.keys
    }

    fn complete(&self, record: &Record) -> Result<Coefficients, YieldError> {
        let mut values = record.floats(COEFFICIENTS_KEY)?;
        if values.len() < self.count {
            match self.missing {
                MissingCoefficients::Reject => {
                    return Err(record.error(
                        "",
                        format!(
                            "Expected {} coefficients but found {}",
                            self.count,
                            values.len()
                        ),
                    ));
                }
                MissingCoefficients::Zero => values.resize(self.count, 0.0),
                MissingCoefficients::Fill(fill) => {
                    values.extend((values.len()..self.count).map(fill));
                }
            }
        }
        Ok(Coefficients::new(values, self.origin))
    }

    /// Parse every line, passing the key record and its coefficients to
    /// `handler`. Returns the number of records handled.
    pub fn parse<R, F>(&self, reader: R, mut handler: F) -> Result<usize, YieldError>
    where
        R: BufRead,
        F: FnMut(&Record, Coefficients) -> Result<(), YieldError>,
    {
        self.line.parse(reader, |record| {
            let coefficients = self.complete(&record)?;
            tracing::trace!(line = record.line, ?coefficients, "coefficient row");
            handler(&record, coefficients)
        })
    }
}

/// Fail unless a dense table received every combination of its keys.
pub fn expect_full(table: &str, populated: usize, size: usize) -> Result<(), YieldError> {
    if populated == size {
        Ok(())
    } else {
        Err(YieldError::ParseValidation(format!(
            "Expected {size} entries in {table} but {populated} were provided"
        )))
    }
}
