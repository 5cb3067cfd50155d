use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sfkms_auth::signer::AwsKmsKeySigner;
use sfkms_auth::{create_kms_jwt_token_source, create_oauth_token_source};
use sfkms_aws_kms::arn::KeyArn;
use sfkms_aws_kms::client::{Client as KmsClient, ClientConfig as KmsClientConfig};
use sfkms_aws_kms::Credentials;
use sfkms_token::TokenSource;

use crate::cancel::CancellationToken;
use crate::config::{AuthType, Config};
use crate::dsn::parse_dsn;
use crate::error::Error;
use crate::http::snowflake_client::SnowflakeClient;
use crate::http::statement::{StatementResponse, SubmitRequest};
use crate::rows::{with_cancel, Rows};

/// Wait between two status checks of a running statement.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Client for the Snowflake SQL API. KMS calls go through the AWS SDK's own client.
    pub http: reqwest::Client,
    /// Overrides the KMS endpoint resolved by the AWS SDK.
    pub kms_endpoint: Option<String>,
    /// Static AWS credentials. The AWS SDK default credentials chain is used when absent.
    pub kms_credentials: Option<Credentials>,
    /// Replaces the token source selected by the DSN's authenticator.
    pub token_source: Option<Arc<dyn TokenSource>>,
    pub poll_interval: Duration,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            http: reqwest::Client::default(),
            kms_endpoint: None,
            kms_credentials: None,
            token_source: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl OpenOptions {
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_kms_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.kms_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_kms_credentials(mut self, credentials: Credentials) -> Self {
        self.kms_credentials = Some(credentials);
        self
    }

    pub fn with_token_source(mut self, ts: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(ts);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Database handle. Opening parses the DSN and prepares the authenticator without any network
/// round trip; the first request happens in [`Db::query`].
#[derive(Debug)]
pub struct Db {
    config: Config,
    client: SnowflakeClient,
    poll_interval: Duration,
    closed: Arc<AtomicBool>,
}

impl Db {
    pub fn open(dsn: &str) -> Result<Self, Error> {
        Self::open_with_options(dsn, OpenOptions::default())
    }

    pub fn open_with_options(dsn: &str, options: OpenOptions) -> Result<Self, Error> {
        let config = parse_dsn(dsn)?;
        let ts = match &options.token_source {
            Some(ts) => ts.clone(),
            None => token_source(&config, &options)?,
        };
        let base_url = format!("{}://{}:{}", config.protocol, config.host, config.port);
        let client = SnowflakeClient::new(ts, &base_url, options.http)
            .with_application(&config.application)
            .with_timeouts(config.login_timeout, config.request_timeout);
        tracing::debug!("opened {} as {} with {}", base_url, config.user, config.authenticator);
        Ok(Self {
            config,
            client,
            poll_interval: options.poll_interval,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs `statement` and waits for it to complete.
    pub async fn query(&self, statement: &str) -> Result<Rows, Error> {
        self.query_with_cancel(statement, None).await
    }

    /// Like [`Db::query`], but stops with [`Error::Cancelled`] as soon as `cancel` fires. A
    /// statement that is already running on the server is cancelled there too.
    pub async fn query_with_cancel(&self, statement: &str, cancel: Option<CancellationToken>) -> Result<Rows, Error> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        let request = self.submit_request(statement);
        let submit = async { Ok::<_, Error>(self.client.submit(&request).await?) };
        let mut response = with_cancel(cancel.as_ref(), submit).await?;
        loop {
            let status = match response {
                StatementResponse::Complete(result) => {
                    let rows = result.result_set_meta_data.as_ref().map(|m| m.num_rows).unwrap_or_default();
                    tracing::info!("statement {} completed rows={}", result.statement_handle, rows);
                    return Ok(Rows::new(self.client.clone(), result, cancel, self.closed.clone()));
                }
                StatementResponse::InProgress(status) => status,
            };
            let poll = async {
                tokio::time::sleep(self.poll_interval).await;
                Ok::<_, Error>(self.client.status(&status.statement_handle).await?)
            };
            response = match with_cancel(cancel.as_ref(), poll).await {
                Err(Error::Cancelled) => {
                    if let Err(e) = self.client.cancel(&status.statement_handle).await {
                        tracing::warn!("failed to cancel statement {}: {}", status.statement_handle, e);
                    }
                    return Err(Error::Cancelled);
                }
                other => other?,
            };
        }
    }

    /// Marks the handle closed. Later queries, and reads from [`Rows`] it returned, fail with
    /// [`Error::Closed`].
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("closed {}", self.client.endpoint());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn submit_request(&self, statement: &str) -> SubmitRequest {
        let non_empty = |v: &str| (!v.is_empty()).then(|| v.to_string());
        SubmitRequest {
            statement: statement.to_string(),
            timeout: self.config.request_timeout.map(|t| t.as_secs()),
            database: non_empty(&self.config.database),
            schema: non_empty(&self.config.schema),
            warehouse: non_empty(&self.config.warehouse),
            role: non_empty(&self.config.role),
        }
    }
}

fn token_source(config: &Config, options: &OpenOptions) -> Result<Arc<dyn TokenSource>, Error> {
    match config.authenticator {
        AuthType::KmsJwt => {
            let arn: KeyArn = config.aws_kms_key_arn.parse()?;
            let mut kms_config = KmsClientConfig::for_key(&arn);
            if let Some(endpoint) = &options.kms_endpoint {
                kms_config = kms_config.with_endpoint(endpoint.as_str());
            }
            if let Some(credentials) = &options.kms_credentials {
                kms_config = kms_config.with_credentials(credentials.clone());
            }
            let signer = AwsKmsKeySigner::new(KmsClient::new(kms_config), config.aws_kms_key_arn.as_str());
            let mut auth_config = sfkms_auth::Config::new(&config.account, &config.user);
            if let Some(timeout) = config.jwt_expire_timeout {
                auth_config = auth_config.with_expire_timeout(timeout);
            }
            Ok(Arc::new(create_kms_jwt_token_source(auth_config, Arc::new(signer))?))
        }
        AuthType::OAuth => Ok(Arc::new(create_oauth_token_source(&config.token)?)),
        AuthType::Snowflake => Err(Error::UnsupportedAuthenticator(AuthType::Snowflake)),
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{Db, OpenOptions};
    use crate::error::Error;

    #[test]
    fn test_open_does_not_connect() {
        // nothing listens on port 9; opening must still succeed
        let dsn = "jsmith@127.0.0.1:9?account=xy12345&authenticator=kms_jwt&awsKmsKeyArn=arn%3Aaws%3Akms%3Aus-east-1%3A123456789%3Akey%2Fmrk-1&protocol=http";
        let db = Db::open(dsn).unwrap();
        assert_eq!("xy12345", db.config().account);
        assert!(!db.is_closed());
        db.close();
        assert!(db.is_closed());
    }

    #[test]
    fn test_open_errors() {
        assert!(matches!(Db::open("no-user-part"), Err(Error::Dsn(_))));
        assert!(matches!(
            Db::open("jsmith@127.0.0.1:9?account=a&authenticator=kms_jwt&awsKmsKeyArn=not-an-arn"),
            Err(Error::Kms(_))
        ));
        assert!(matches!(
            Db::open_with_options("jsmith:pw@127.0.0.1:9?account=a", OpenOptions::default()),
            Err(Error::UnsupportedAuthenticator(_))
        ));
    }

    #[tokio::test]
    async fn test_query_closed() {
        let db = Db::open("jsmith@127.0.0.1:9?account=a&authenticator=oauth&token=t").unwrap();
        db.close();
        assert!(matches!(db.query("SELECT 1").await, Err(Error::Closed)));
    }
}
