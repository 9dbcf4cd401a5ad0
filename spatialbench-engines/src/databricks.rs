// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Databricks SQL warehouse backend.
//!
//! Statements go through the SQL Statement Execution REST API. Tables are
//! expected to exist already as Delta tables in the configured catalog and
//! schema; loading only verifies them.
//!
//! Configuration comes from the environment:
//!
//! - `DATABRICKS_SERVER_HOSTNAME`: workspace hostname
//! - `DATABRICKS_HTTP_PATH`: SQL warehouse HTTP path, e.g. `/sql/1.0/warehouses/abc123`
//! - `DATABRICKS_ACCESS_TOKEN`: personal access token or OAuth token
//! - `DATABRICKS_CATALOG` (default `main`) and `DATABRICKS_SCHEMA` (default `spatialbench`)

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use spatialbench_core::{
    BenchError, BenchResult, Engine, ExecutionRecord, QueryId, ScaleFactor, ScopedTimer,
    SPATIALBENCH_TABLES,
};

const ENGINE_NAME: &str = "databricks";

pub const ENV_SERVER_HOSTNAME: &str = "DATABRICKS_SERVER_HOSTNAME";
pub const ENV_HTTP_PATH: &str = "DATABRICKS_HTTP_PATH";
pub const ENV_ACCESS_TOKEN: &str = "DATABRICKS_ACCESS_TOKEN";
pub const ENV_CATALOG: &str = "DATABRICKS_CATALOG";
pub const ENV_SCHEMA: &str = "DATABRICKS_SCHEMA";

/// How long the server holds a submission before answering with a pending state.
const SERVER_WAIT: &str = "10s";
/// Per-request HTTP timeout. Must stay above `SERVER_WAIT`.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Connection settings for a SQL warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabricksSettings {
    pub server_hostname: String,
    pub http_path: String,
    pub access_token: String,
    pub catalog: String,
    pub schema: String,
}

impl DatabricksSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> BenchResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Fails with a connection error naming
    /// every missing required variable.
    pub fn from_lookup<F>(lookup: F) -> BenchResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server_hostname = get(ENV_SERVER_HOSTNAME);
        let http_path = get(ENV_HTTP_PATH);
        let access_token = get(ENV_ACCESS_TOKEN);

        match (server_hostname, http_path, access_token) {
            (Some(server_hostname), Some(http_path), Some(access_token)) => Ok(Self {
                server_hostname,
                http_path,
                access_token,
                catalog: get(ENV_CATALOG).unwrap_or_else(|| "main".to_string()),
                schema: get(ENV_SCHEMA).unwrap_or_else(|| "spatialbench".to_string()),
            }),
            (host, path, token) => {
                let missing: Vec<&str> = [
                    (host.is_none(), ENV_SERVER_HOSTNAME),
                    (path.is_none(), ENV_HTTP_PATH),
                    (token.is_none(), ENV_ACCESS_TOKEN),
                ]
                .into_iter()
                .filter_map(|(absent, key)| absent.then_some(key))
                .collect();

                Err(BenchError::connection(
                    ENGINE_NAME,
                    format!(
                        "Missing required Databricks configuration: {}. Set these environment variables.",
                        missing.join(", ")
                    ),
                ))
            }
        }
    }

    /// Warehouse id: the last segment of the HTTP path.
    pub fn warehouse_id(&self) -> &str {
        self.http_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    fn base_url(&self) -> String {
        let host = self
            .server_hostname
            .trim_start_matches("https://")
            .trim_end_matches('/');
        format!("https://{}/api/2.0/sql/statements", host)
    }
}

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    warehouse_id: &'a str,
    catalog: &'a str,
    schema: &'a str,
    wait_timeout: &'a str,
    on_wait_timeout: &'a str,
    disposition: &'a str,
    format: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum StatementState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Closed,
}

impl StatementState {
    fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementStatus {
    state: StatementState,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    total_row_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ResultData {
    #[serde(default)]
    data_array: Option<Vec<Vec<Option<String>>>>,
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    statement_id: String,
    status: StatementStatus,
    #[serde(default)]
    manifest: Option<Manifest>,
    #[serde(default)]
    result: Option<ResultData>,
}

impl StatementResponse {
    fn row_count(&self) -> u64 {
        self.manifest
            .as_ref()
            .and_then(|m| m.total_row_count)
            .unwrap_or(0)
    }

    fn first_value(&self) -> Option<&str> {
        self.result
            .as_ref()?
            .data_array
            .as_ref()?
            .first()?
            .first()?
            .as_deref()
    }

    fn failure_message(&self) -> String {
        let detail = self.status.error.as_ref();
        let message = detail
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| format!("statement ended in state {:?}", self.status.state));
        match detail.and_then(|e| e.error_code.as_deref()) {
            Some(code) => format!("{}: {}", code, message),
            None => message,
        }
    }
}

/// How a statement's result is returned.
#[derive(Debug, Clone, Copy)]
enum Disposition {
    /// Row count only; the data stays on the warehouse.
    Manifest,
    /// Small results returned in the response body.
    Inline,
}

/// Client for one SQL warehouse session.
#[derive(Debug)]
struct Session {
    client: Client,
    settings: DatabricksSettings,
    /// Statement Execution API root.
    endpoint: String,
    poll_interval: Duration,
}

impl Session {
    fn new(settings: DatabricksSettings) -> BenchResult<Self> {
        let endpoint = settings.base_url();
        Self::with_endpoint(settings, endpoint)
    }

    fn with_endpoint(settings: DatabricksSettings, endpoint: String) -> BenchResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BenchError::connection(ENGINE_NAME, e))?;
        Ok(Self {
            client,
            settings,
            endpoint,
            poll_interval: POLL_INTERVAL,
        })
    }

    /// Submit `sql` and poll until it finishes. A statement still running at
    /// `timeout` is cancelled. A timeout too large to form a deadline waits
    /// indefinitely.
    fn execute(&self, sql: &str, timeout: Duration, disposition: Disposition) -> Result<StatementResponse, String> {
        let (disposition, format) = match disposition {
            Disposition::Manifest => ("EXTERNAL_LINKS", "ARROW_STREAM"),
            Disposition::Inline => ("INLINE", "JSON_ARRAY"),
        };
        let request = StatementRequest {
            statement: sql,
            warehouse_id: self.settings.warehouse_id(),
            catalog: &self.settings.catalog,
            schema: &self.settings.schema,
            wait_timeout: SERVER_WAIT,
            on_wait_timeout: "CONTINUE",
            disposition,
            format,
        };

        let deadline = Instant::now().checked_add(timeout);
        let mut response: StatementResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.settings.access_token)
            .json(&request)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| e.to_string())?;

        while !response.status.state.is_terminal() {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                self.cancel(&response.statement_id);
                return Err(format!("Query timed out after {}s", timeout.as_secs()));
            }
            thread::sleep(self.poll_interval);
            response = self.poll(&response.statement_id)?;
        }

        match response.status.state {
            StatementState::Succeeded => Ok(response),
            _ => Err(response.failure_message()),
        }
    }

    fn poll(&self, statement_id: &str) -> Result<StatementResponse, String> {
        self.client
            .get(format!("{}/{}", self.endpoint, statement_id))
            .bearer_auth(&self.settings.access_token)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| e.to_string())
    }

    fn cancel(&self, statement_id: &str) {
        let result = self
            .client
            .post(format!("{}/{}/cancel", self.endpoint, statement_id))
            .bearer_auth(&self.settings.access_token)
            .send()
            .and_then(|r| r.error_for_status());
        if let Err(e) = result {
            tracing::warn!(statement_id, error = %e, "Failed to cancel statement");
        }
    }
}

/// Databricks SQL engine.
#[derive(Debug, Default)]
pub struct DatabricksEngine {
    /// Explicit settings; read from the environment on connect when absent.
    settings: Option<DatabricksSettings>,
    session: Option<Session>,
}

impl DatabricksEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with explicit settings instead of the environment.
    pub fn with_settings(settings: DatabricksSettings) -> Self {
        Self {
            settings: Some(settings),
            session: None,
        }
    }

    fn session(&self) -> BenchResult<&Session> {
        self.session.as_ref().ok_or_else(|| {
            BenchError::connection(ENGINE_NAME, "Connection not established. Call connect() first.")
        })
    }
}

impl Engine for DatabricksEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn dialect(&self) -> &'static str {
        "Databricks"
    }

    fn connect(&mut self) -> BenchResult<()> {
        if self.session.is_some() {
            return Ok(());
        }

        let settings = match &self.settings {
            Some(settings) => settings.clone(),
            None => DatabricksSettings::from_env()?,
        };

        tracing::info!(engine = ENGINE_NAME, host = %settings.server_hostname, "Connecting to Databricks");

        let session = Session::new(settings)?;

        session
            .execute("SELECT 1", Duration::from_secs(60), Disposition::Inline)
            .map_err(|e| BenchError::connection(ENGINE_NAME, format!("Failed to connect to Databricks: {}", e)))?;

        tracing::info!(
            engine = ENGINE_NAME,
            catalog = %session.settings.catalog,
            schema = %session.settings.schema,
            "Databricks connection established"
        );
        self.session = Some(session);
        Ok(())
    }

    fn load_data(&mut self, _data_dir: &Path, scale_factor: ScaleFactor) -> BenchResult<()> {
        let session = self.session()?;

        tracing::info!(
            catalog = %session.settings.catalog,
            schema = %session.settings.schema,
            scale_factor = %scale_factor,
            "Verifying tables"
        );

        let mut missing = Vec::new();
        for table in SPATIALBENCH_TABLES {
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            match session.execute(&sql, Duration::from_secs(300), Disposition::Inline) {
                Ok(response) => {
                    let rows = response.first_value().unwrap_or("0");
                    tracing::info!(table, rows, "Verified table");
                }
                Err(e) => {
                    tracing::warn!(table, error = %e, "Table not found");
                    missing.push(table);
                }
            }
        }

        if missing.len() == SPATIALBENCH_TABLES.len() {
            return Err(BenchError::load(
                "*",
                format!(
                    "no SpatialBench tables found in {}.{}",
                    session.settings.catalog, session.settings.schema
                ),
            ));
        }
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "Ensure data is loaded to Databricks Delta tables");
        }
        Ok(())
    }

    fn run_query(&mut self, query: &QueryId, query_text: &str, timeout: Duration) -> ExecutionRecord {
        tracing::debug!(query = %query, "Executing query");

        let session = self.session.as_ref();
        let mut timer = ScopedTimer::new();
        let outcome = timer.time(|| match session {
            Some(session) => session.execute(query_text, timeout, Disposition::Manifest),
            None => Err("Connection not established".to_string()),
        });
        let elapsed = timer.elapsed_secs();

        match outcome {
            Ok(response) => {
                let rows = response.row_count();
                tracing::debug!(query = %query, rows, elapsed_secs = elapsed, "Query completed");
                ExecutionRecord::success(query.clone(), ENGINE_NAME, elapsed, rows)
                    .with_metadata("statement_id", response.statement_id)
            }
            Err(e) => {
                tracing::error!(query = %query, error = %e, "Query failed");
                ExecutionRecord::failure(query.clone(), ENGINE_NAME, elapsed, e)
            }
        }
    }

    fn close(&mut self) {
        if self.session.take().is_some() {
            tracing::info!(engine = ENGINE_NAME, "Closing Databricks connection");
        }
    }

    fn version(&self) -> String {
        self.session
            .as_ref()
            .and_then(|session| {
                session
                    .execute(
                        "SELECT current_version().dbsql_version",
                        Duration::from_secs(60),
                        Disposition::Inline,
                    )
                    .ok()
            })
            .and_then(|response| response.first_value().map(|v| format!("Databricks SQL {}", v)))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    use super::*;

    /// Serve one canned JSON body per connection, in order, and hand back
    /// the request lines that were received.
    fn serve(bodies: &[&'static str]) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut bodies: VecDeque<&'static str> = bodies.iter().copied().collect();

        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            while let Some(body) = bodies.pop_front() {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(&stream);

                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                requests.push(request_line.trim_end().to_string());

                let mut content_length = 0usize;
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).unwrap();
                    if header == "\r\n" || header.is_empty() {
                        break;
                    }
                    let lower = header.to_ascii_lowercase();
                    if let Some(value) = lower.strip_prefix("content-length:") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                let mut request_body = vec![0u8; content_length];
                reader.read_exact(&mut request_body).unwrap();

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                (&stream).write_all(response.as_bytes()).unwrap();
            }
            requests
        });

        (format!("http://127.0.0.1:{}/api/2.0/sql/statements", port), handle)
    }

    fn local_session(endpoint: String) -> Session {
        let settings = DatabricksSettings {
            server_hostname: "localhost".to_string(),
            http_path: "/sql/1.0/warehouses/abc123".to_string(),
            access_token: "dapi-token".to_string(),
            catalog: "main".to_string(),
            schema: "spatialbench".to_string(),
        };
        let mut session = Session::with_endpoint(settings, endpoint).unwrap();
        session.client = Client::builder()
            .no_proxy()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap();
        session.poll_interval = Duration::from_millis(10);
        session
    }

    const PENDING: &str = r#"{"statement_id": "s1", "status": {"state": "PENDING"}}"#;
    const RUNNING: &str = r#"{"statement_id": "s1", "status": {"state": "RUNNING"}}"#;
    const SUCCEEDED: &str =
        r#"{"statement_id": "s1", "status": {"state": "SUCCEEDED"}, "manifest": {"total_row_count": 5}}"#;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_settings_defaults() {
        let vars = env(&[
            (ENV_SERVER_HOSTNAME, "adb-123.cloud.databricks.com"),
            (ENV_HTTP_PATH, "/sql/1.0/warehouses/abc123"),
            (ENV_ACCESS_TOKEN, "dapi-token"),
        ]);
        let settings = DatabricksSettings::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(settings.catalog, "main");
        assert_eq!(settings.schema, "spatialbench");
        assert_eq!(settings.warehouse_id(), "abc123");
        assert_eq!(
            settings.base_url(),
            "https://adb-123.cloud.databricks.com/api/2.0/sql/statements"
        );
    }

    #[test]
    fn test_missing_settings_are_named() {
        let vars = env(&[(ENV_SERVER_HOSTNAME, "adb-123.cloud.databricks.com")]);
        let err = DatabricksSettings::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        let message = err.to_string();

        assert!(message.contains(ENV_HTTP_PATH));
        assert!(message.contains(ENV_ACCESS_TOKEN));
        assert!(!message.contains(ENV_SERVER_HOSTNAME));
    }

    #[test]
    fn test_parse_succeeded_response() {
        let json = r#"{
            "statement_id": "01ed-92c4",
            "status": {"state": "SUCCEEDED"},
            "manifest": {"format": "ARROW_STREAM", "total_row_count": 42},
            "result": {"external_links": []}
        }"#;
        let response: StatementResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status.state, StatementState::Succeeded);
        assert_eq!(response.row_count(), 42);
    }

    #[test]
    fn test_parse_inline_value() {
        let json = r#"{
            "statement_id": "01ed-92c5",
            "status": {"state": "SUCCEEDED"},
            "manifest": {"total_row_count": 1},
            "result": {"data_array": [["2025.35"]]}
        }"#;
        let response: StatementResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_value(), Some("2025.35"));
    }

    #[test]
    fn test_failure_message() {
        let json = r#"{
            "statement_id": "01ed-92c6",
            "status": {"state": "FAILED", "error": {"error_code": "BAD_REQUEST", "message": "Table not found"}}
        }"#;
        let response: StatementResponse = serde_json::from_str(json).unwrap();
        assert!(response.status.state.is_terminal());
        assert_eq!(response.failure_message(), "BAD_REQUEST: Table not found");
    }

    #[test]
    fn test_execute_polls_until_succeeded() {
        let (endpoint, server) = serve(&[PENDING, RUNNING, SUCCEEDED]);
        let session = local_session(endpoint);

        let response = session
            .execute("SELECT * FROM trip", Duration::from_secs(30), Disposition::Manifest)
            .unwrap();
        assert_eq!(response.row_count(), 5);

        let requests = server.join().unwrap();
        assert_eq!(
            requests,
            vec![
                "POST /api/2.0/sql/statements HTTP/1.1",
                "GET /api/2.0/sql/statements/s1 HTTP/1.1",
                "GET /api/2.0/sql/statements/s1 HTTP/1.1",
            ]
        );
    }

    #[test]
    fn test_execute_cancels_at_deadline() {
        let cancelled = r#"{}"#;
        let (endpoint, server) = serve(&[RUNNING, cancelled]);
        let session = local_session(endpoint);

        let err = session
            .execute("SELECT * FROM trip", Duration::ZERO, Disposition::Manifest)
            .unwrap_err();
        assert_eq!(err, "Query timed out after 0s");

        let requests = server.join().unwrap();
        assert_eq!(requests[1], "POST /api/2.0/sql/statements/s1/cancel HTTP/1.1");
    }

    #[test]
    fn test_execute_with_unbounded_timeout() {
        let (endpoint, server) = serve(&[PENDING, SUCCEEDED]);
        let session = local_session(endpoint);

        let response = session
            .execute("SELECT 1", Duration::from_secs(u64::MAX), Disposition::Manifest)
            .unwrap();
        assert_eq!(response.statement_id, "s1");
        assert_eq!(server.join().unwrap().len(), 2);
    }

    #[test]
    fn test_request_timeout_exceeds_server_wait() {
        let server_wait: u64 = SERVER_WAIT.trim_end_matches('s').parse().unwrap();
        assert!(REQUEST_TIMEOUT > Duration::from_secs(server_wait));
    }

    #[test]
    fn test_run_before_connect_is_captured() {
        let mut engine = DatabricksEngine::new();
        let record = engine.run_query(&QueryId::new("q3").unwrap(), "SELECT 1", Duration::from_secs(1));
        assert!(!record.is_success());
        assert_eq!(record.row_count(), 0);
        assert_eq!(record.error_message(), Some("Connection not established"));
        assert!(record.duration_seconds() > 0.0);

        engine.close();
        engine.close();
    }
}
