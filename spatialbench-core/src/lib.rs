//! SpatialBench Core Library
//!
//! Backend-independent pieces of the SpatialBench runner: the engine
//! contract and registry, the query provider, the scoped timer, execution
//! records, data-directory table resolution and run configuration.

pub mod config;
pub mod engine;
pub mod error;
pub mod queries;
pub mod record;
pub mod registry;
pub mod tables;
pub mod timer;
pub mod types;

// Re-export commonly used types
pub use config::{BenchConfig, ConfigLoader, EngineSelection, OutputConfig, OutputFormat};
pub use engine::{Engine, DEFAULT_QUERY_TIMEOUT, SPATIALBENCH_QUERY_COUNT, SPATIALBENCH_TABLES};
pub use error::{BenchError, BenchResult, ErrorCategory, HardValidationError};
pub use queries::{BuiltinQueries, DirectoryQueries, QueryProvider, QuerySet};
pub use record::ExecutionRecord;
pub use registry::{EngineFactory, EngineRegistry};
pub use tables::{ResolvedTable, TableSet, TableSource};
pub use timer::{measure, ScopedTimer, TimerScope};
pub use types::{IterationCount, QueryId, ScaleFactor};
