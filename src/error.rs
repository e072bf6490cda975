use crate::config::ConfigError;
use crate::extraction::DocumentError;
use crate::reference::ReferenceError;
use crate::telemetry::TelemetryError;
use std::fmt;

/// Failures that surface to the orchestration layer. Per-field and per-record
/// issues inside a document never reach this level; they resolve locally to
/// nulls, `Unknown` classifications, or recorded record failures.
#[derive(Debug)]
pub enum EngineError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Reference(ReferenceError),
    Document(DocumentError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Config(err) => write!(f, "configuration error: {err}"),
            EngineError::Telemetry(err) => write!(f, "telemetry error: {err}"),
            EngineError::Reference(err) => write!(f, "reference data error: {err}"),
            EngineError::Document(err) => write!(f, "document error: {err}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Config(err) => Some(err),
            EngineError::Telemetry(err) => Some(err),
            EngineError::Reference(err) => Some(err),
            EngineError::Document(err) => Some(err),
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for EngineError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<ReferenceError> for EngineError {
    fn from(value: ReferenceError) -> Self {
        Self::Reference(value)
    }
}

impl From<DocumentError> for EngineError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}
