use serde::{Deserialize, Serialize};

/// Body of `POST /api/v2/statements`.
#[derive(Clone, PartialEq, Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub statement: String,
    /// Seconds before Snowflake aborts the statement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// One cell of a `jsonv2` result. Every value is a string; SQL NULL is JSON null.
#[derive(Clone, PartialEq, Eq, Deserialize, Debug, Default)]
#[serde(transparent)]
pub struct Value(pub Option<String>);

#[derive(Clone, PartialEq, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RowType {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
    pub length: Option<i64>,
}

#[derive(Clone, PartialEq, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartitionInfo {
    pub row_count: i64,
    pub uncompressed_size: Option<i64>,
    pub compressed_size: Option<i64>,
}

#[derive(Clone, PartialEq, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResultSetMetaData {
    #[serde(default)]
    pub num_rows: i64,
    pub format: Option<String>,
    #[serde(default)]
    pub row_type: Vec<RowType>,
    #[serde(default)]
    pub partition_info: Vec<PartitionInfo>,
}

/// `200 OK` answer: the first partition of the result plus metadata for the rest.
#[derive(Clone, PartialEq, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub code: Option<String>,
    pub sql_state: Option<String>,
    pub message: Option<String>,
    pub statement_handle: String,
    pub result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

/// `202 Accepted` answer: the statement is still running.
#[derive(Clone, PartialEq, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct QueryStatus {
    pub code: Option<String>,
    pub message: Option<String>,
    pub statement_handle: String,
    pub statement_status_url: Option<String>,
}

/// Answer of `GET /api/v2/statements/{handle}?partition=N`.
#[derive(Clone, PartialEq, Deserialize, Debug, Default)]
pub struct Partition {
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum StatementResponse {
    Complete(ResultSet),
    InProgress(QueryStatus),
}
