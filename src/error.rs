//! Error types for tokensync.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=store, 3=not_found, 4=validation, etc.)
//! - Retryability flags
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers
//!
//! Only batch-level failures travel through this type. Per-token failures
//! during reconciliation are folded into the sync summary instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tokensync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Store (exit 2)
    DatabaseError,
    CollectionUnavailable,

    // Not Found (exit 3)
    CollectionNotFound,
    EntryNotFound,
    RecordNotFound,

    // Validation (exit 4)
    InvalidArgument,
    EmptyBatch,
    InvalidValue,
    TypeMismatch,

    // Source (exit 6)
    SourceError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::DatabaseError => "DATABASE_ERROR",
            Self::CollectionUnavailable => "COLLECTION_UNAVAILABLE",
            Self::CollectionNotFound => "COLLECTION_NOT_FOUND",
            Self::EntryNotFound => "ENTRY_NOT_FOUND",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::EmptyBatch => "EMPTY_BATCH",
            Self::InvalidValue => "INVALID_VALUE",
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::SourceError => "SOURCE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::DatabaseError | Self::CollectionUnavailable => 2,
            Self::CollectionNotFound | Self::EntryNotFound | Self::RecordNotFound => 3,
            Self::InvalidArgument | Self::EmptyBatch | Self::InvalidValue | Self::TypeMismatch => 4,
            Self::SourceError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether re-running the same command may succeed.
    ///
    /// Store writes are keyed by full name, so a re-run after a transient
    /// database or network failure is safe.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError | Self::CollectionUnavailable | Self::SourceError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in tokensync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No records to synchronize")]
    EmptyBatch,

    #[error("Collection '{name}' could not be obtained: {reason}")]
    CollectionUnavailable { name: String, reason: String },

    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    #[error("Entry not found: {id}")]
    EntryNotFound { id: String },

    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    #[error("Alias target not found: {target}")]
    AliasTargetNotFound { target: String },

    #[error("Invalid {expected} value: {value}")]
    InvalidValue { expected: String, value: String },

    #[error("Type mismatch for '{name}': entry is {actual}, value is {expected}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Document source error: {0}")]
    Source(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyBatch => ErrorCode::EmptyBatch,
            Self::CollectionUnavailable { .. } => ErrorCode::CollectionUnavailable,
            Self::CollectionNotFound { .. } => ErrorCode::CollectionNotFound,
            Self::EntryNotFound { .. } | Self::AliasTargetNotFound { .. } => {
                ErrorCode::EntryNotFound
            }
            Self::RecordNotFound { .. } => ErrorCode::RecordNotFound,
            Self::InvalidValue { .. } => ErrorCode::InvalidValue,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::InputNotFound { .. } | Self::Io(_) => ErrorCode::IoError,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Http(_) | Self::Source(_) => ErrorCode::SourceError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::EmptyBatch => Some(
                "The source returned no records. Check the database id or input file, \
                 and that the integration has access to the database."
                    .to_string(),
            ),

            Self::CollectionNotFound { name } => Some(format!(
                "No collection named '{name}'. Use `tokensync collections` to see available collections."
            )),

            Self::InputNotFound { path } => Some(format!(
                "Export the database as JSON first, then pass it with `--input {}`.",
                path.display()
            )),

            Self::Source(msg) if msg.contains("401") => Some(
                "The document source rejected the token. Set NOTION_TOKEN or `notion_token` in ~/.tokensync/config.json."
                    .to_string(),
            ),

            Self::Http(_) => Some(
                "Check network access, or point `notion_base_url` at a reachable proxy."
                    .to_string(),
            ),

            Self::InvalidArgument(msg) if msg.contains("mapping") => Some(
                "Field mappings look like `--map name=Title`. Valid properties: \
                 name, group, value, resolved, type, description, unit"
                    .to_string(),
            ),

            _ => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
