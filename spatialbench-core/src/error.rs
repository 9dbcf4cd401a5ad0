// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for SpatialBench.
//!
//! Errors are explicit enum variants grouped by the phase that raises them.
//! Per-query execution failures are never represented here: they are captured
//! as strings inside an `ExecutionRecord` so a run can continue past them.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the benchmark core.
#[derive(Debug, Error)]
pub enum BenchError {
    // =========================================================================
    // Configuration Errors - Detected Before Any Connection Attempt
    // =========================================================================
    #[error("Hard validation error: {0}")]
    Validation(#[from] HardValidationError),

    #[error("Unknown engine '{name}'. Available engines: {available}")]
    UnknownEngine { name: String, available: String },

    #[error("Unknown dialect '{dialect}'. Available: {available}")]
    UnknownDialect { dialect: String, available: String },

    #[error("Dialect '{dialect}' defines queries [{found}], expected [{expected}]")]
    QuerySetMismatch {
        dialect: String,
        expected: String,
        found: String,
    },

    #[error("Engine '{name}' is already registered")]
    DuplicateEngine { name: String },

    #[error("Engine registered as '{key}' reports identity '{identity}'")]
    EngineIdentityMismatch { key: String, identity: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Connection Errors - Fatal to One Backend's Run
    // =========================================================================
    #[error("Failed to connect to {engine}: {reason}")]
    Connection { engine: String, reason: String },

    // =========================================================================
    // Load Errors - Required Data Missing or Unreadable
    // =========================================================================
    #[error("Data directory not found: {path}")]
    DataDirNotFound { path: PathBuf },

    #[error("Failed to load table '{table}': {reason}")]
    Load { table: String, reason: String },

    // =========================================================================
    // Execution Errors - Outside a Measured Query
    // =========================================================================
    #[error("Warmup failed for {engine}: {reason}")]
    Warmup { engine: String, reason: String },

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl BenchError {
    /// Create a connection error for the named engine.
    pub fn connection(engine: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Connection {
            engine: engine.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a load error for the named table.
    pub fn load(table: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Load {
            table: table.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a warmup error for the named engine.
    pub fn warmup(engine: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Warmup {
            engine: engine.into(),
            reason: reason.to_string(),
        }
    }

    /// Which class of the error taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_)
            | Self::UnknownEngine { .. }
            | Self::UnknownDialect { .. }
            | Self::QuerySetMismatch { .. }
            | Self::DuplicateEngine { .. }
            | Self::EngineIdentityMismatch { .. }
            | Self::ConfigNotFound { .. }
            | Self::ConfigParse { .. } => ErrorCategory::Configuration,
            Self::Connection { .. } => ErrorCategory::Connection,
            Self::DataDirNotFound { .. } | Self::Load { .. } => ErrorCategory::Load,
            Self::Warmup { .. } => ErrorCategory::Execution,
            Self::Io { .. } => ErrorCategory::System,
        }
    }
}

/// Error taxonomy shared by the core, the orchestrator and the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Connection,
    Load,
    Execution,
    Export,
    System,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Connection => "connection",
            Self::Load => "load",
            Self::Execution => "execution",
            Self::Export => "export",
            Self::System => "system",
        };
        f.write_str(name)
    }
}

/// Field-level validation errors raised while building validated types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HardValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid query identifier '{value}': expected 'q' followed by a positive integer")]
    InvalidQueryId { value: String },

    #[error("Execution record for {query} violates invariant: {reason}")]
    InvalidRecord { query: String, reason: String },
}

/// Result type alias using BenchError.
pub type BenchResult<T> = Result<T, BenchError>;
