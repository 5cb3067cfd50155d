use std::fmt;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An error returned from the Snowflake SQL API.
    #[error(transparent)]
    Response(#[from] ErrorResponse),

    /// An error from the HTTP client.
    #[error(transparent)]
    HttpClient(#[from] reqwest::Error),

    /// An error from a token source.
    #[error("token source failed: {0}")]
    TokenSource(Box<dyn std::error::Error + Send + Sync>),

    #[error("login timed out")]
    LoginTimeout,
}

/// Error body of the SQL API.
///
/// https://docs.snowflake.com/en/developer-guide/sql-api/reference#querystatus
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: u16,
    /// Snowflake error code, e.g. `002003`.
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    pub sql_state: Option<String>,
    pub statement_handle: Option<String>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.sql_state.as_deref().unwrap_or("-"), self.message)
    }
}

impl std::error::Error for ErrorResponse {}
