//! Declarative parser for fixed-column text records.
//!
//! A [`LineParser`] is built from an ordered list of segments. Each line read
//! is cut into those segments, checked against the stop and ignore hooks, then
//! parsed into a [`Record`] that is handed to the caller.

use std::collections::HashMap;
use std::io::BufRead;

use super::value_parser::{self, SegmentParser, Value};
use crate::error::{ValueParseError, YieldError};
use crate::models::Region;

type LinePredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;
type SegmentPredicate = Box<dyn Fn(&[Option<String>]) -> bool + Send + Sync>;

struct Segment {
    /// `None` for a segment that runs to the end of the line.
    width: Option<usize>,
    name: Option<&'static str>,
    parser: Option<SegmentParser>,
}

/// Values parsed from one line, keyed by segment name.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub line: usize,
    values: HashMap<&'static str, Value>,
}

impl Record {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            values: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: &'static str, value: Value) {
        self.values.insert(name, value);
    }

    /// The raw value, absent when the line ended before the segment.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// A failure tied to this record's line.
    pub fn error(&self, value: impl Into<String>, message: impl Into<String>) -> YieldError {
        ValueParseError::new(value, message).at_line(self.line)
    }

    fn missing(&self, name: &str, kind: &str) -> YieldError {
        self.error("", format!("expected {kind} field \"{name}\""))
    }

    pub fn integer(&self, name: &str) -> Result<i32, YieldError> {
        match self.get(name) {
            Some(Value::Integer(v)) => Ok(*v),
            _ => Err(self.missing(name, "integer")),
        }
    }

    pub fn float(&self, name: &str) -> Result<f32, YieldError> {
        match self.get(name) {
            Some(Value::Float(v)) => Ok(*v),
            _ => Err(self.missing(name, "float")),
        }
    }

    pub fn text(&self, name: &str) -> Result<&str, YieldError> {
        match self.get(name) {
            Some(Value::Text(v)) => Ok(v),
            _ => Err(self.missing(name, "text")),
        }
    }

    /// Text value, or an empty string when the line ended before the segment.
    pub fn text_or_empty(&self, name: &str) -> &str {
        match self.get(name) {
            Some(Value::Text(v)) => v,
            _ => "",
        }
    }

    pub fn region(&self, name: &str) -> Result<Region, YieldError> {
        match self.get(name) {
            Some(Value::Region(v)) => Ok(*v),
            _ => Err(self.missing(name, "region")),
        }
    }

    /// List of floats, empty when the line ended before the segment.
    pub fn floats(&self, name: &str) -> Result<Vec<f32>, YieldError> {
        match self.get(name) {
            Some(Value::Floats(v)) => Ok(v.clone()),
            None => Ok(Vec::new()),
            _ => Err(self.missing(name, "float list")),
        }
    }

    pub fn optional_floats(&self, name: &str) -> Result<Vec<Option<f32>>, YieldError> {
        match self.get(name) {
            Some(Value::OptionalFloats(v)) => Ok(v.clone()),
            None => Ok(Vec::new()),
            _ => Err(self.missing(name, "optional float list")),
        }
    }

    pub fn logicals(&self, name: &str) -> Result<Vec<bool>, YieldError> {
        match self.get(name) {
            Some(Value::Logicals(v)) => Ok(v.clone()),
            None => Ok(Vec::new()),
            _ => Err(self.missing(name, "logical list")),
        }
    }
}

/// What a single line turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Record(Record),
    Ignored,
    Stop,
}

/// Builder and interpreter for one fixed-column file layout.
#[derive(Default)]
pub struct LineParser {
    segments: Vec<Segment>,
    stop_line: Option<LinePredicate>,
    ignore_line: Option<LinePredicate>,
    stop_segment: Option<SegmentPredicate>,
    ignore_segment: Option<SegmentPredicate>,
}

impl std::fmt::Debug for LineParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let layout: Vec<_> = self
            .segments
            .iter()
            .map(|s| (s.name.unwrap_or("_"), s.width))
            .collect();
        f.debug_struct("LineParser").field("segments", &layout).finish()
    }
}

impl LineParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, width: Option<usize>, name: Option<&'static str>, parser: Option<SegmentParser>) -> Self {
        assert!(
            self.segments.last().map_or(true, |s| s.width.is_some()),
            "no segment may follow an unbounded segment"
        );
        self.segments.push(Segment {
            width,
            name,
            parser,
        });
        self
    }

    /// Skip `width` characters.
    pub fn space(self, width: usize) -> Self {
        self.push(Some(width), None, None)
    }

    /// A segment parsed with a custom value parser.
    pub fn value<T, F>(self, width: usize, name: &'static str, parser: F, wrap: fn(T) -> Value) -> Self
    where
        T: 'static,
        F: Fn(&str) -> Result<T, ValueParseError> + Send + Sync + 'static,
    {
        self.push(
            Some(width),
            Some(name),
            Some(Box::new(move |s: &str| parser(s).map(wrap))),
        )
    }

    pub fn integer(self, width: usize, name: &'static str) -> Self {
        self.value(width, name, value_parser::parse_integer, Value::Integer)
    }

    pub fn float(self, width: usize, name: &'static str) -> Self {
        self.value(width, name, value_parser::parse_float, Value::Float)
    }

    pub fn optional_float(self, width: usize, name: &'static str) -> Self {
        self.value(width, name, value_parser::parse_optional_float, Value::OptionalFloat)
    }

    pub fn logical(self, width: usize, name: &'static str) -> Self {
        self.value(width, name, value_parser::parse_logical, Value::Logical)
    }

    pub fn region(self, width: usize, name: &'static str) -> Self {
        self.value(width, name, value_parser::parse_region, Value::Region)
    }

    /// Raw segment text.
    pub fn string(self, width: usize, name: &'static str) -> Self {
        self.value(width, name, |s: &str| Ok(s.to_string()), Value::Text)
    }

    /// Segment text with surrounding whitespace removed.
    pub fn stripped(self, width: usize, name: &'static str) -> Self {
        self.value(width, name, value_parser::parse_stripped, Value::Text)
    }

    /// Stripped text running to the end of the line. Nothing may follow it.
    pub fn stripped_rest(self, name: &'static str) -> Self {
        self.push(
            None,
            Some(name),
            Some(Box::new(|s: &str| value_parser::parse_stripped(s).map(Value::Text))),
        )
    }

    /// `count` consecutive `width`-character floats. Trailing blank values are
    /// dropped, so a short line yields fewer than `count` entries.
    pub fn multi_float(self, count: usize, width: usize, name: &'static str) -> Self {
        self.push(
            Some(count * width),
            Some(name),
            Some(Box::new(move |s: &str| {
                value_parser::segment_list(s, width, value_parser::parse_float).map(Value::Floats)
            })),
        )
    }

    /// Like [`multi_float`](Self::multi_float) but blank values inside the
    /// block are kept as `None`.
    pub fn multi_optional_float(self, count: usize, width: usize, name: &'static str) -> Self {
        self.push(
            Some(count * width),
            Some(name),
            Some(Box::new(move |s: &str| {
                value_parser::segment_list(s, width, value_parser::parse_optional_float)
                    .map(Value::OptionalFloats)
            })),
        )
    }

    pub fn multi_logical(self, count: usize, width: usize, name: &'static str) -> Self {
        self.push(
            Some(count * width),
            Some(name),
            Some(Box::new(move |s: &str| {
                value_parser::segment_list(s, width, value_parser::parse_logical).map(Value::Logicals)
            })),
        )
    }

    /// Stop reading, without parsing, at the first line matching `pred`.
    pub fn stop_line(mut self, pred: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.stop_line = Some(Box::new(pred));
        self
    }

    /// Skip lines matching `pred`.
    pub fn ignore_line(mut self, pred: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.ignore_line = Some(Box::new(pred));
        self
    }

    /// Stop reading at the first line whose segments match `pred`.
    pub fn stop_segment(
        mut self,
        pred: impl Fn(&[Option<String>]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.stop_segment = Some(Box::new(pred));
        self
    }

    /// Skip lines whose segments match `pred`.
    pub fn ignore_segment(
        mut self,
        pred: impl Fn(&[Option<String>]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.ignore_segment = Some(Box::new(pred));
        self
    }

    /// Cut a line into one entry per segment. Segments starting past the end
    /// of the line are `None`; one that runs past the end takes what is left.
    pub fn segmentize(&self, line: &str) -> Vec<Option<String>> {
        let chars: Vec<char> = line.chars().collect();
        let mut start = 0;
        self.segments
            .iter()
            .map(|segment| {
                if start >= chars.len() {
                    return None;
                }
                let end = match segment.width {
                    Some(width) => (start + width).min(chars.len()),
                    None => chars.len(),
                };
                let text: String = chars[start..end].iter().collect();
                start = end;
                Some(text)
            })
            .collect()
    }

    /// Interpret one line.
    pub fn parse_line(&self, line: &str, number: usize) -> Result<LineOutcome, YieldError> {
        if self.stop_line.as_ref().is_some_and(|p| p(line)) {
            return Ok(LineOutcome::Stop);
        }
        if self.ignore_line.as_ref().is_some_and(|p| p(line)) {
            return Ok(LineOutcome::Ignored);
        }
        let texts = self.segmentize(line);
        if self.stop_segment.as_ref().is_some_and(|p| p(&texts)) {
            return Ok(LineOutcome::Stop);
        }
        if self.ignore_segment.as_ref().is_some_and(|p| p(&texts)) {
            return Ok(LineOutcome::Ignored);
        }

        let mut record = Record::new(number);
        for (segment, text) in self.segments.iter().zip(&texts) {
            if let (Some(name), Some(parser), Some(text)) = (segment.name, &segment.parser, text) {
                let value = parser(text.as_str()).map_err(|e| e.at_line(number))?;
                record.insert(name, value);
            }
        }
        Ok(LineOutcome::Record(record))
    }

    /// Read every line of `reader`, passing each parsed record to `handler`.
    ///
    /// Returns the number of records handled.
    pub fn parse<R, F>(&self, reader: R, mut handler: F) -> Result<usize, YieldError>
    where
        R: BufRead,
        F: FnMut(Record) -> Result<(), YieldError>,
    {
        let mut handled = 0;
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            match self.parse_line(&line, i + 1)? {
                LineOutcome::Stop => break,
                LineOutcome::Ignored => continue,
                LineOutcome::Record(record) => {
                    handler(record)?;
                    handled += 1;
                }
            }
        }
        Ok(handled)
    }

    /// Parse every line into a list of records.
    pub fn parse_all<R: BufRead>(&self, reader: R) -> Result<Vec<Record>, YieldError> {
        let mut records = Vec::new();
        self.parse(reader, |record| {
            records.push(record);
            Ok(())
        })?;
        Ok(records)
    }
}
