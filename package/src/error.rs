//! Error types for environment queries

use pkgenv_config::ConfigError;
use thiserror::Error;

/// Result type alias for environment operations
pub type Result<T> = std::result::Result<T, Error>;

/// Environment errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Wrong number of arguments for {method}: expected {expected}, got {got}")]
    Argument {
        method: String,
        expected: &'static str,
        got: usize,
    },

    #[error("Wrong argument type for {method}: expected {expected}, got {got}")]
    Type {
        method: String,
        expected: &'static str,
        got: String,
    },

    #[error("No such repository: {0}")]
    NoSuchRepository(String),

    #[error("Invalid or unknown package set: {0}")]
    SetName(String),

    #[error("No such method: {0}")]
    NoMethod(String),

    #[error("Repository registered twice: {0}")]
    DuplicateRepository(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Invalid package specification: {0}")]
    InvalidPackageSpec(String),

    #[error("Invalid dependency specification: {0}")]
    InvalidDepSpec(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl Error {
    /// Build a type error from the offending value
    pub fn type_error(method: &str, expected: &'static str, got: &serde_json::Value) -> Self {
        Error::Type {
            method: method.to_string(),
            expected,
            got: json_type_name(got).to_string(),
        }
    }
}

/// Name of a JSON value's type, for error messages
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
