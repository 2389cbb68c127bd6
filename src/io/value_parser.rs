//! Field-level parsers for fixed-column control files.
//!
//! Each parser takes the raw text of one segment and returns a typed value or a
//! [`ValueParseError`] carrying that text.

use crate::error::ValueParseError;
use crate::models::Region;

/// Widest key segment that may be blanked out with spaces or zeros.
const MAX_BLANKABLE_KEY_LENGTH: usize = 3;

/// A parsed segment.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i32),
    Float(f32),
    OptionalFloat(Option<f32>),
    Text(String),
    Logical(bool),
    Region(Region),
    Integers(Vec<i32>),
    Floats(Vec<f32>),
    OptionalFloats(Vec<Option<f32>>),
    Logicals(Vec<bool>),
}

/// Boxed segment parser stored by the line parser.
pub type SegmentParser = Box<dyn Fn(&str) -> Result<Value, ValueParseError> + Send + Sync>;

pub fn parse_integer(s: &str) -> Result<i32, ValueParseError> {
    let trimmed = s.trim();
    trimmed
        .parse::<i32>()
        .map_err(|_| ValueParseError::new(s, format!("\"{trimmed}\" is not a valid integer")))
}

pub fn parse_float(s: &str) -> Result<f32, ValueParseError> {
    let trimmed = s.trim();
    trimmed
        .parse::<f32>()
        .map_err(|_| ValueParseError::new(s, format!("\"{trimmed}\" is not a valid float")))
}

/// An integer, or `None` for a blank field.
pub fn parse_integer_or_blank(s: &str) -> Result<Option<i32>, ValueParseError> {
    if s.trim().is_empty() {
        Ok(None)
    } else {
        parse_integer(s).map(Some)
    }
}

/// A float, or `None` for a blank field.
pub fn parse_optional_float(s: &str) -> Result<Option<f32>, ValueParseError> {
    if s.trim().is_empty() {
        Ok(None)
    } else {
        parse_float(s).map(Some)
    }
}

/// A logical flag: blank, `0`, `F` and `N` are false; `T`, `Y` and any
/// other integer are true.
pub fn parse_logical(s: &str) -> Result<bool, ValueParseError> {
    let trimmed = s.trim();
    match trimmed.to_ascii_uppercase().as_str() {
        "" | "F" | "N" => Ok(false),
        "T" | "Y" => Ok(true),
        _ => trimmed
            .parse::<i32>()
            .map(|v| v != 0)
            .map_err(|_| ValueParseError::new(s, format!("\"{trimmed}\" is not a valid logical"))),
    }
}

pub fn parse_region(s: &str) -> Result<Region, ValueParseError> {
    let trimmed = s.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Region::from_alias(c),
        _ => None,
    }
    .ok_or_else(|| ValueParseError::new(s, format!("{trimmed} is not a valid region")))
}

/// Segment text with surrounding whitespace removed.
pub fn parse_stripped(s: &str) -> Result<String, ValueParseError> {
    Ok(s.trim().to_string())
}

/// An integer that must lie in `min..=max`.
pub fn index_in_range(
    min: i32,
    max: i32,
    label: &'static str,
) -> impl Fn(&str) -> Result<i32, ValueParseError> + Send + Sync {
    move |s| {
        let value = parse_integer(s)?;
        if (min..=max).contains(&value) {
            Ok(value)
        } else {
            Err(ValueParseError::new(
                s,
                format!("{value} is not a valid {label}, should be {min} to {max} inclusive"),
            ))
        }
    }
}

/// Split `s` into `width`-character pieces after trimming trailing whitespace,
/// parsing each with `parser`. The final piece may be shorter than `width`.
pub fn segment_list<T>(
    s: &str,
    width: usize,
    parser: impl Fn(&str) -> Result<T, ValueParseError>,
) -> Result<Vec<T>, ValueParseError> {
    let chars: Vec<char> = s.trim_end().chars().collect();
    if width == 0 {
        return Ok(Vec::new());
    }
    chars
        .chunks(width)
        .map(|chunk| parser(&chunk.iter().collect::<String>()))
        .collect()
}

/// True for segments that are blank, zero, or a blank-padded zero such as
/// `"  0"`, `"0.0"` or `" 00 "`.
///
/// Matches at most three leading spaces, three zeros, an optional point, three
/// zeros and three trailing spaces.
pub fn is_blank_or_zero(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    i += run_length(&bytes[i..], MAX_BLANKABLE_KEY_LENGTH, |b| b.is_ascii_whitespace());
    i += run_length(&bytes[i..], MAX_BLANKABLE_KEY_LENGTH, |b| b == b'0');
    i += run_length(&bytes[i..], 1, |b| b == b'.');
    i += run_length(&bytes[i..], MAX_BLANKABLE_KEY_LENGTH, |b| b == b'0');
    i += run_length(&bytes[i..], MAX_BLANKABLE_KEY_LENGTH, |b| b.is_ascii_whitespace());
    i == bytes.len()
}

fn run_length(bytes: &[u8], limit: usize, pred: impl Fn(u8) -> bool) -> usize {
    bytes.iter().take(limit).take_while(|&&b| pred(b)).count()
}

pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
