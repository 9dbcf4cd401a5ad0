// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark orchestrator: drives one backend through its full lifecycle.
//!
//! Queries and iterations run sequentially on the calling thread so that one
//! query's wall-clock time is never perturbed by another. Backends are also
//! run one after another, never concurrently.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use spatialbench_core::{
    measure, BenchConfig, BenchError, Engine, EngineRegistry, ExecutionRecord, IterationCount,
    QueryProvider, QuerySet, ScaleFactor, DEFAULT_QUERY_TIMEOUT, SPATIALBENCH_QUERY_COUNT,
};

use crate::metrics::RunSummary;

/// Fatal lifecycle failure for one backend, with whatever was collected first.
#[derive(Debug, Error)]
#[error("Benchmark run for '{engine}' failed: {source}")]
pub struct RunError {
    pub engine: String,
    #[source]
    pub source: BenchError,
    /// Results gathered before the failure
    pub partial: Box<RunSummary>,
}

/// Progress callbacks. All methods default to doing nothing.
pub trait RunObserver {
    fn on_run_start(&mut self, _engine: &str) {}

    fn on_iteration_start(&mut self, _engine: &str, _iteration: u32, _total: u32) {}

    fn on_record(&mut self, _record: &ExecutionRecord) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Closes the wrapped engine exactly once, on every exit path.
struct CloseGuard<'a, E: Engine + ?Sized> {
    engine: &'a mut E,
}

impl<E: Engine + ?Sized> Deref for CloseGuard<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        self.engine
    }
}

impl<E: Engine + ?Sized> DerefMut for CloseGuard<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        self.engine
    }
}

impl<E: Engine + ?Sized> Drop for CloseGuard<'_, E> {
    fn drop(&mut self) {
        tracing::debug!(engine = self.engine.name(), "Closing engine");
        self.engine.close();
    }
}

/// Outcome of one backend within a multi-backend invocation.
#[derive(Debug)]
pub struct EngineOutcome {
    pub name: String,
    pub result: Result<RunSummary, RunError>,
}

/// Benchmark runner configured through builder methods.
#[derive(Debug, Clone)]
pub struct BenchmarkRunner {
    data_dir: PathBuf,
    scale_factor: ScaleFactor,
    iterations: IterationCount,
    queries: Option<Vec<String>>,
    warmup: bool,
    include_load_time: bool,
    timeout: Duration,
}

impl BenchmarkRunner {
    /// Create a runner over `data_dir` with default settings.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            scale_factor: ScaleFactor::default(),
            iterations: IterationCount::default(),
            queries: None,
            warmup: true,
            include_load_time: false,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Create a runner from a validated run configuration.
    pub fn from_config(config: &BenchConfig, data_dir: impl Into<PathBuf>) -> Self {
        Self::new(data_dir)
            .scale_factor(config.scale_factor)
            .iterations(config.iterations)
            .queries(config.queries.clone())
            .warmup(config.warmup)
            .include_load_time(config.include_load_time)
            .timeout(config.query_timeout)
    }

    pub fn scale_factor(mut self, scale_factor: ScaleFactor) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the number of passes over the query suite.
    pub fn iterations(mut self, iterations: IterationCount) -> Self {
        self.iterations = iterations;
        self
    }

    /// Restrict the run to these query names. `None` runs every query.
    pub fn queries(mut self, queries: Option<Vec<String>>) -> Self {
        self.queries = queries;
        self
    }

    pub fn warmup(mut self, enabled: bool) -> Self {
        self.warmup = enabled;
        self
    }

    pub fn include_load_time(mut self, enabled: bool) -> Self {
        self.include_load_time = enabled;
        self
    }

    /// Advisory per-query timeout handed to the backend.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Run the full lifecycle against one backend.
    ///
    /// The engine is closed exactly once whether or not the run succeeds.
    pub fn run<E>(
        &self,
        engine: &mut E,
        provider: &dyn QueryProvider,
        observer: &mut dyn RunObserver,
    ) -> Result<RunSummary, RunError>
    where
        E: Engine + ?Sized,
    {
        let mut engine = CloseGuard { engine };
        let name = engine.name().to_string();

        let mut summary = RunSummary::new(name.as_str(), self.scale_factor, self.iterations);
        summary.include_load_time = self.include_load_time;

        let fail = |summary: RunSummary, source: BenchError| {
            tracing::error!(engine = %name, category = %source.category(), error = %source, "Benchmark run aborted");
            RunError {
                engine: name.clone(),
                source,
                partial: Box::new(summary),
            }
        };

        observer.on_run_start(&name);

        let queries = match self.resolve_queries(&*engine, provider) {
            Ok(queries) => queries,
            Err(e) => return Err(fail(summary, e)),
        };

        if let Err(e) = engine.connect() {
            return Err(fail(summary, e));
        }
        summary.engine_version = engine.version();
        tracing::info!(engine = %name, version = %summary.engine_version, "Connected");

        let (loaded, load_time) = measure(|| engine.load_data(&self.data_dir, self.scale_factor));
        summary.load_time_seconds = load_time.as_secs_f64();
        if let Err(e) = loaded {
            return Err(fail(summary, e));
        }
        tracing::info!(
            engine = %name,
            data_dir = %self.data_dir.display(),
            load_time_secs = summary.load_time_seconds,
            "Data loaded"
        );

        if self.warmup {
            if let Err(e) = engine.warmup() {
                tracing::warn!(engine = %name, error = %e, "Warmup failed, continuing");
            }
        }

        let total = self.iterations.value();
        for iteration in 1..=total {
            observer.on_iteration_start(&name, iteration, total);
            for (query, text) in &queries {
                let record = engine
                    .run_query(query, text, self.timeout)
                    .with_iteration(iteration);
                observer.on_record(&record);
                summary.add_record(record);
            }
        }

        tracing::info!(
            engine = %name,
            total = summary.total_queries(),
            failed = summary.failed_queries(),
            total_time_secs = summary.total_time(),
            "Benchmark run complete"
        );
        Ok(summary)
    }

    /// Run each named backend in turn. A failing backend does not stop the rest.
    pub fn run_all(
        &self,
        registry: &EngineRegistry,
        names: &[String],
        provider: &dyn QueryProvider,
        observer: &mut dyn RunObserver,
    ) -> Vec<EngineOutcome> {
        names
            .iter()
            .map(|name| {
                let result = match registry.get(name) {
                    Ok(mut engine) => self.run(&mut *engine, provider, observer),
                    Err(source) => {
                        tracing::error!(engine = %name, error = %source, "Cannot create engine");
                        Err(RunError {
                            engine: name.clone(),
                            source,
                            partial: Box::new(RunSummary::new(
                                name.as_str(),
                                self.scale_factor,
                                self.iterations,
                            )),
                        })
                    }
                };
                EngineOutcome {
                    name: name.clone(),
                    result,
                }
            })
            .collect()
    }

    /// Working query set for `engine`, numerically ordered and filtered.
    fn resolve_queries<E>(&self, engine: &E, provider: &dyn QueryProvider) -> Result<QuerySet, BenchError>
    where
        E: Engine + ?Sized,
    {
        let mut queries = if engine.uses_query_text() {
            provider.queries_for(engine.dialect())?
        } else {
            QuerySet::placeholders(SPATIALBENCH_QUERY_COUNT)
        };

        if let Some(requested) = &self.queries {
            let missing = queries.retain_requested(requested);
            if !missing.is_empty() {
                tracing::warn!(
                    engine = engine.name(),
                    missing = %missing.join(", "),
                    "Requested queries not found"
                );
            }
        }

        tracing::info!(engine = engine.name(), count = queries.len(), "Resolved query set");
        Ok(queries)
    }
}
