// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Scripted engines for driving the orchestrator without a real backend.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spatialbench_core::{
    BenchError, BenchResult, Engine, ExecutionRecord, QueryId, ScaleFactor,
};

/// Shared lifecycle event log.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn count(log: &EventLog, event: &str) -> usize {
    log.lock().unwrap().iter().filter(|e| *e == event).count()
}

/// Engine whose every lifecycle outcome is scripted up front.
pub struct ScriptedEngine {
    name: &'static str,
    dialect: &'static str,
    uses_text: bool,
    fail_connect: bool,
    fail_load: bool,
    fail_warmup: bool,
    load_delay: Duration,
    failing: Vec<String>,
    durations: HashMap<String, VecDeque<f64>>,
    log: EventLog,
}

impl ScriptedEngine {
    /// SQL-text engine on the `DuckDB` dialect where every query succeeds.
    pub fn new(name: &'static str, log: EventLog) -> Self {
        Self {
            name,
            dialect: "DuckDB",
            uses_text: true,
            fail_connect: false,
            fail_load: false,
            fail_warmup: false,
            load_delay: Duration::ZERO,
            failing: Vec::new(),
            durations: HashMap::new(),
            log,
        }
    }

    pub fn with_dialect(mut self, dialect: &'static str) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn function_dispatch(mut self) -> Self {
        self.uses_text = false;
        self.dialect = "Arrow";
        self
    }

    pub fn fail_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn fail_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub fn fail_warmup(mut self) -> Self {
        self.fail_warmup = true;
        self
    }

    pub fn load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Every attempt of `query` fails.
    pub fn failing(mut self, query: &str) -> Self {
        self.failing.push(query.to_string());
        self
    }

    /// Elapsed times reported for successive attempts of `query`. A `None`
    /// entry makes that attempt fail.
    pub fn script(mut self, query: &str, attempts: &[Option<f64>]) -> Self {
        let encoded = attempts.iter().map(|a| a.unwrap_or(f64::NAN)).collect();
        self.durations.insert(query.to_string(), encoded);
        self
    }

    fn push(&self, event: String) {
        self.log.lock().unwrap().push(event);
    }
}

impl Engine for ScriptedEngine {
    fn name(&self) -> &'static str {
        self.name
    }

    fn dialect(&self) -> &'static str {
        self.dialect
    }

    fn uses_query_text(&self) -> bool {
        self.uses_text
    }

    fn connect(&mut self) -> BenchResult<()> {
        self.push("connect".to_string());
        if self.fail_connect {
            return Err(BenchError::connection(self.name, "scripted connect failure"));
        }
        Ok(())
    }

    fn load_data(&mut self, _data_dir: &Path, _scale_factor: ScaleFactor) -> BenchResult<()> {
        self.push("load".to_string());
        std::thread::sleep(self.load_delay);
        if self.fail_load {
            return Err(BenchError::load("trip", "scripted load failure"));
        }
        Ok(())
    }

    fn run_query(&mut self, query: &QueryId, query_text: &str, _timeout: Duration) -> ExecutionRecord {
        let text = if query_text.is_empty() { "<none>" } else { "<sql>" };
        self.push(format!("run {} {}", query, text));

        if self.failing.iter().any(|f| f == query.as_str()) {
            return ExecutionRecord::failure(query.clone(), self.name, 0.01, "scripted query failure");
        }

        let scripted = self
            .durations
            .get_mut(query.as_str())
            .and_then(VecDeque::pop_front)
            .unwrap_or(0.1);

        if scripted.is_nan() {
            ExecutionRecord::failure(query.clone(), self.name, 0.01, "scripted query failure")
        } else {
            ExecutionRecord::success(query.clone(), self.name, scripted, 7)
        }
    }

    fn close(&mut self) {
        self.push("close".to_string());
    }

    fn warmup(&mut self) -> BenchResult<()> {
        self.push("warmup".to_string());
        if self.fail_warmup {
            return Err(BenchError::warmup(self.name, "scripted warmup failure"));
        }
        Ok(())
    }

    fn version(&self) -> String {
        "scripted-1.0".to_string()
    }
}
