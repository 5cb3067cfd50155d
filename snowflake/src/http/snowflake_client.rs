use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};

use sfkms_token::TokenSource;

use crate::http::error::{Error, ErrorResponse};
use crate::http::statement::{Partition, QueryStatus, ResultSet, StatementResponse, SubmitRequest};

pub const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
const USER_AGENT: &str = concat!("sfkms-snowflake/", env!("CARGO_PKG_VERSION"));

/// Thin client for the Snowflake SQL API v2.
///
/// https://docs.snowflake.com/en/developer-guide/sql-api/reference
#[derive(Debug, Clone)]
pub struct SnowflakeClient {
    ts: Arc<dyn TokenSource>,
    endpoint: String,
    http: Client,
    application: Option<String>,
    login_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl SnowflakeClient {
    pub(crate) fn new(ts: Arc<dyn TokenSource>, base_url: &str, http: Client) -> Self {
        Self {
            ts,
            endpoint: format!("{base_url}/api/v2/statements"),
            http,
            application: None,
            login_timeout: None,
            request_timeout: None,
        }
    }

    pub(crate) fn with_application(mut self, application: &str) -> Self {
        self.application = (!application.is_empty()).then(|| application.to_string());
        self
    }

    pub(crate) fn with_timeouts(mut self, login: Option<Duration>, request: Option<Duration>) -> Self {
        self.login_timeout = login;
        self.request_timeout = request;
        self
    }

    pub(crate) fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Submits a statement for execution.
    pub async fn submit(&self, req: &SubmitRequest) -> Result<StatementResponse, Error> {
        let builder = self.http.post(self.endpoint()).json(req);
        self.send_statement(builder).await
    }

    /// Checks the status of a statement, returning the result set once it has completed.
    pub async fn status(&self, statement_handle: &str) -> Result<StatementResponse, Error> {
        let url = format!("{}/{}", self.endpoint(), statement_handle);
        self.send_statement(self.http.get(url)).await
    }

    /// Fetches one partition of a completed statement's result.
    pub async fn partition(&self, statement_handle: &str, partition: usize) -> Result<Partition, Error> {
        let url = format!("{}/{}?partition={}", self.endpoint(), statement_handle, partition);
        let response = self.with_headers(self.http.get(url)).await?.send().await?;
        let response = Self::check_response_status(response).await?;
        Ok(response.json().await?)
    }

    /// Cancels a running statement.
    pub async fn cancel(&self, statement_handle: &str) -> Result<(), Error> {
        let url = format!("{}/{}/cancel", self.endpoint(), statement_handle);
        let response = self.with_headers(self.http.post(url)).await?.send().await?;
        Self::check_response_status(response).await?;
        Ok(())
    }

    async fn with_headers(&self, builder: RequestBuilder) -> Result<RequestBuilder, Error> {
        let token = match self.login_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.ts.token())
                .await
                .map_err(|_| Error::LoginTimeout)?,
            None => self.ts.token().await,
        }
        .map_err(Error::TokenSource)?;
        let mut builder = builder
            .header(reqwest::header::AUTHORIZATION, token.value())
            .header(TOKEN_TYPE_HEADER, token.token_type)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT);
        if let Some(application) = &self.application {
            builder = builder.header("X-Snowflake-Application", application);
        }
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder)
    }

    async fn send_statement(&self, builder: RequestBuilder) -> Result<StatementResponse, Error> {
        let response = self.with_headers(builder).await?.send().await?;
        let response = Self::check_response_status(response).await?;
        if response.status() == StatusCode::ACCEPTED {
            let status: QueryStatus = response.json().await?;
            tracing::debug!("statement {} in progress", status.statement_handle);
            Ok(StatementResponse::InProgress(status))
        } else {
            let result: ResultSet = response.json().await?;
            Ok(StatementResponse::Complete(result))
        }
    }

    /// Checks whether an HTTP response is successful and returns it, or returns an error.
    async fn check_response_status(response: Response) -> Result<Response, Error> {
        // Check the status code, returning the response if it is not an error.
        let error = match response.error_for_status_ref() {
            Ok(_) => return Ok(response),
            Err(error) => error,
        };

        // try to extract a response error, falling back to the status error if it can not be parsed.
        let status = response.status().as_u16();
        Err(response
            .json::<ErrorResponse>()
            .await
            .map(|mut e| {
                e.status = status;
                Error::Response(e)
            })
            .unwrap_or(Error::HttpClient(error)))
    }
}
