pub mod coefficient_files;
pub mod coefficient_parser;
mod control;
mod csv_io;
pub mod definitions;
pub mod equation_group;
mod json_io;
pub mod line_parser;
pub mod modifier;
pub mod value_parser;

use std::path::Path;

use crate::error::YieldError;
use crate::models::StandResult;

pub use coefficient_parser::{CoefficientParser, MissingCoefficients};
pub use control::load_control_map;
pub use csv_io::{read_result_rows, result_rows, write_results_csv, ResultRow, LAYER_ROW};
pub use json_io::{
    read_component_vectors, read_component_vectors_from_bytes, read_stands,
    read_stands_from_bytes, write_results_json,
};
pub use line_parser::{LineOutcome, LineParser, Record};
pub use modifier::PROGRAM_COUNT;
pub use value_parser::Value;

/// Trait for writing computed stand results to a file.
pub trait ResultWriter {
    fn write(&self, results: &[StandResult], path: &Path) -> Result<(), YieldError>;
}

/// CSV results writer, one row per species or layer per utilization class.
pub struct CsvFormat;

impl ResultWriter for CsvFormat {
    fn write(&self, results: &[StandResult], path: &Path) -> Result<(), YieldError> {
        write_results_csv(results, path)
    }
}

/// JSON results writer.
#[derive(Default)]
pub struct JsonFormat {
    pub pretty: bool,
}

impl ResultWriter for JsonFormat {
    fn write(&self, results: &[StandResult], path: &Path) -> Result<(), YieldError> {
        write_results_json(results, path, self.pretty)
    }
}

/// Pick a writer from the output file's extension.
pub fn writer_for(path: &Path, pretty: bool) -> Result<Box<dyn ResultWriter>, YieldError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "csv" => Ok(Box::new(CsvFormat)),
        "json" => Ok(Box::new(JsonFormat { pretty })),
        _ => Err(YieldError::Validation(format!(
            "Unsupported output format: .{ext}. Use .csv or .json"
        ))),
    }
}
