use batterway_models::LciError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum BatterwayError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("I/O error: {path} - {message}")]
    Io { path: String, message: String },

    #[error("CSV error in {table}: {message}")]
    Csv { table: String, message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Inventory error: {message}")]
    Inventory { message: String },

    #[error(transparent)]
    Lci(#[from] LciError),
}

impl BatterwayError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn csv(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Csv {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn inventory(message: impl Into<String>) -> Self {
        Self::Inventory {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Csv { .. } => "CSV_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Inventory { .. } => "INVENTORY_ERROR",
            Self::Lci(error) => error.error_code(),
        }
    }
}

pub type BatterwayResult<T> = Result<T, BatterwayError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
}

impl From<&BatterwayError> for ErrorReport {
    fn from(error: &BatterwayError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

impl From<config::ConfigError> for BatterwayError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}
