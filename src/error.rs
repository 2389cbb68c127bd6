use thiserror::Error;

/// Errors that can occur while loading control files or computing stand yields.
#[derive(Error, Debug)]
pub enum YieldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// A field of a fixed-column control file failed to parse or validate.
    #[error("Error at line {line}: {message}")]
    Parse {
        line: usize,
        value: String,
        message: String,
    },

    /// A control file was read to the end but its contents are structurally wrong.
    #[error("Parse validation error: {0}")]
    ParseValidation(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("UtilizationClass index {0} is not recognized")]
    UnknownUtilizationClass(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl YieldError {
    pub(crate) fn processing(message: impl Into<String>) -> Self {
        YieldError::Processing(message.into())
    }

    /// Line number of a parse error, if this is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            YieldError::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Failure of a single field value, before the line it came from is known.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ValueParseError {
    pub value: String,
    pub message: String,
}

impl ValueParseError {
    pub fn new(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            message: message.into(),
        }
    }

    pub(crate) fn at_line(self, line: usize) -> YieldError {
        YieldError::Parse {
            line,
            value: self.value,
            message: self.message,
        }
    }
}
