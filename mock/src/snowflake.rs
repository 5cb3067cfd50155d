use std::collections::HashMap;
use std::future::IntoFuture;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const STATEMENT_HANDLE: &str = "01b7a2c4-0000-4e6f-0000-000000000001";

/// What the mock answers to a submitted statement.
#[derive(Debug, Clone, Default)]
pub struct MockResult {
    /// `(name, type)` of each column.
    pub columns: Vec<(String, String)>,
    pub partitions: Vec<Vec<Vec<Option<String>>>>,
    /// Fetching this partition fails with a 500.
    pub failing_partition: Option<usize>,
    /// Number of `202 Accepted` answers before the result is ready.
    pub pending_polls: usize,
    /// `(status, code, message)` returned instead of a result.
    pub error: Option<(u16, String, String)>,
    /// Delay before answering the submit request.
    pub delay: Option<Duration>,
}

impl MockResult {
    /// One row, one `fixed` column holding `value`.
    pub fn single_value(value: &str) -> Self {
        Self {
            columns: vec![("1".to_string(), "fixed".to_string())],
            partitions: vec![vec![vec![Some(value.to_string())]]],
            ..Default::default()
        }
    }

    pub fn failing(status: u16, code: &str, message: &str) -> Self {
        Self {
            error: Some((status, code.to_string(), message.to_string())),
            ..Default::default()
        }
    }

    pub fn with_partition(mut self, rows: Vec<Vec<Option<String>>>) -> Self {
        self.partitions.push(rows);
        self
    }

    pub fn with_failing_partition(mut self, index: usize) -> Self {
        self.failing_partition = Some(index);
        self
    }

    pub fn with_pending_polls(mut self, polls: usize) -> Self {
        self.pending_polls = polls;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn metadata(&self) -> Value {
        let row_type: Vec<Value> = self
            .columns
            .iter()
            .map(|(name, data_type)| json!({ "name": name, "type": data_type, "nullable": true }))
            .collect();
        let partition_info: Vec<Value> = self
            .partitions
            .iter()
            .map(|p| json!({ "rowCount": p.len(), "uncompressedSize": 16 }))
            .collect();
        let num_rows: usize = self.partitions.iter().map(|p| p.len()).sum();
        json!({
            "numRows": num_rows,
            "format": "jsonv2",
            "rowType": row_type,
            "partitionInfo": partition_info,
        })
    }

    fn result_set(&self) -> Value {
        json!({
            "resultSetMetaData": self.metadata(),
            "data": self.partitions.first().cloned().unwrap_or_default(),
            "code": "090001",
            "statementStatusUrl": format!("/api/v2/statements/{STATEMENT_HANDLE}"),
            "sqlState": "00000",
            "statementHandle": STATEMENT_HANDLE,
            "message": "Statement executed successfully.",
            "createdOn": 1_700_000_000_000_i64,
        })
    }
}

/// A statement received by the Snowflake mock.
#[derive(Debug, Clone)]
pub struct SubmittedStatement {
    pub body: Value,
    pub authorization: String,
    pub token_type: String,
}

#[derive(Default)]
struct SnowflakeMockState {
    submitted: Vec<SubmittedStatement>,
    pending_polls: usize,
    polls: usize,
    partition_fetches: Vec<usize>,
    cancels: usize,
}

struct SnowflakeMockContext {
    result: MockResult,
    state: Mutex<SnowflakeMockState>,
}

pub struct SnowflakeMockServer {
    pub addr: SocketAddr,
    context: Arc<SnowflakeMockContext>,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

impl SnowflakeMockServer {
    pub async fn start(result: MockResult) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).await?;
        let addr = listener.local_addr()?;
        let context = Arc::new(SnowflakeMockContext {
            state: Mutex::new(SnowflakeMockState {
                pending_polls: result.pending_polls,
                ..Default::default()
            }),
            result,
        });
        let router = Router::new()
            .route("/api/v2/statements", post(handle_submit))
            .route("/api/v2/statements/:handle", get(handle_status))
            .route("/api/v2/statements/:handle/cancel", post(handle_cancel))
            .with_state(context.clone());
        let handle = tokio::spawn(axum::serve(listener, router).into_future());
        tracing::debug!("snowflake-mock listening on {}", addr);
        Ok(Self { addr, context, handle })
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn submitted(&self) -> Vec<SubmittedStatement> {
        self.state(|s| s.submitted.clone())
    }

    pub fn polls(&self) -> usize {
        self.state(|s| s.polls)
    }

    pub fn partition_fetches(&self) -> Vec<usize> {
        self.state(|s| s.partition_fetches.clone())
    }

    pub fn cancels(&self) -> usize {
        self.state(|s| s.cancels)
    }

    fn state<T: Default>(&self, f: impl FnOnce(&SnowflakeMockState) -> T) -> T {
        self.context.state.lock().map(|s| f(&s)).unwrap_or_default()
    }
}

impl Drop for SnowflakeMockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn sql_error(status: u16, code: &str, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "code": code,
            "message": message,
            "sqlState": "42000",
            "statementHandle": STATEMENT_HANDLE,
        })),
    )
        .into_response()
}

fn in_progress() -> Response {
    (
        StatusCode::ACCEPTED,
        Json(json!({
            "code": "333334",
            "message": "Asynchronous execution in progress. Use provided query id to perform query monitoring and management.",
            "statementHandle": STATEMENT_HANDLE,
            "statementStatusUrl": format!("/api/v2/statements/{STATEMENT_HANDLE}"),
        })),
    )
        .into_response()
}

async fn handle_submit(
    State(context): State<Arc<SnowflakeMockContext>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let authorization = header("authorization");
    let token_type = header("x-snowflake-authorization-token-type");
    let pending = match context.state.lock() {
        Ok(mut state) => {
            state.submitted.push(SubmittedStatement {
                body,
                authorization: authorization.clone(),
                token_type: token_type.clone(),
            });
            state.pending_polls > 0
        }
        Err(_) => false,
    };

    if !authorization.starts_with("Bearer ") || token_type.is_empty() {
        return sql_error(401, "390101", "Authorization header is missing or malformed.");
    }
    if let Some(delay) = context.result.delay {
        tokio::time::sleep(delay).await;
    }
    if let Some((status, code, message)) = &context.result.error {
        return sql_error(*status, code, message);
    }
    if pending {
        return in_progress();
    }
    Json(context.result.result_set()).into_response()
}

async fn handle_status(
    State(context): State<Arc<SnowflakeMockContext>>,
    Path(handle): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if handle != STATEMENT_HANDLE {
        return sql_error(404, "000709", "Statement not found.");
    }
    match params.get("partition").map(|p| p.parse::<usize>()) {
        Some(Ok(partition)) => {
            if let Ok(mut state) = context.state.lock() {
                state.partition_fetches.push(partition);
            }
            if context.result.failing_partition == Some(partition) {
                return sql_error(500, "000603", "Incident while fetching result partition.");
            }
            match context.result.partitions.get(partition) {
                Some(rows) => Json(json!({ "data": rows })).into_response(),
                None => sql_error(422, "000610", "Partition out of range."),
            }
        }
        Some(Err(_)) => sql_error(400, "000611", "Invalid partition."),
        None => {
            let pending = match context.state.lock() {
                Ok(mut state) => {
                    state.polls += 1;
                    if state.pending_polls > 0 {
                        state.pending_polls -= 1;
                    }
                    state.pending_polls > 0
                }
                Err(_) => false,
            };
            if pending {
                in_progress()
            } else {
                Json(context.result.result_set()).into_response()
            }
        }
    }
}

async fn handle_cancel(State(context): State<Arc<SnowflakeMockContext>>, Path(handle): Path<String>) -> Response {
    if let Ok(mut state) = context.state.lock() {
        state.cancels += 1;
    }
    Json(json!({
        "code": "000604",
        "message": "SQL execution canceled",
        "sqlState": "57014",
        "statementHandle": handle,
    }))
    .into_response()
}
