use serde::Serialize;
use tracing::error;
use crate::cli::models::{ArgumentError, ExtractionResult, Status};

/// Printed for every failure after the argument check.
pub const EMPTY_OBJECT: &str = "{}";

pub const NO_URL_MESSAGE: &str = "No URL provided";

/// The single stdout line of a run and the code the process exits with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub line: String,
    pub exit_code: u8,
}

impl Outcome {
    pub fn is_empty(&self) -> bool {
        self.line == EMPTY_OBJECT
    }
}

pub fn success(result: &ExtractionResult) -> Outcome {
    match to_line(result) {
        Some(line) => Outcome { line, exit_code: 0 },
        None => empty(),
    }
}

pub fn empty() -> Outcome {
    Outcome {
        line: EMPTY_OBJECT.to_string(),
        exit_code: 0,
    }
}

pub fn argument_error(message: impl Into<String>) -> Outcome {
    let body = ArgumentError {
        error: message.into(),
        status: Status::Failed,
    };
    let line = to_line(&body).unwrap_or_else(|| EMPTY_OBJECT.to_string());

    Outcome { line, exit_code: 1 }
}

fn to_line<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(line) => Some(line),
        Err(e) => {
            error!(error = %e, "failed to serialize output");
            None
        }
    }
}
