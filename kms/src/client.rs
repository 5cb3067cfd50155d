use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_kms::config::{Credentials, Region};
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::{MessageType, SigningAlgorithmSpec};
use tokio::sync::OnceCell;

use crate::arn::KeyArn;
use crate::error::Error;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Falls back to the SDK region chain (`AWS_REGION`, profile, instance metadata).
    pub region: Option<String>,
    /// Overrides the resolved KMS endpoint, including `AWS_ENDPOINT_URL_KMS`.
    pub endpoint: Option<String>,
    /// Falls back to the SDK default credentials chain.
    pub credentials: Option<Credentials>,
    pub connect_timeout: Duration,
    pub operation_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            credentials: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Config in the region of the key.
    pub fn for_key(arn: &KeyArn) -> Self {
        Self {
            region: Some(arn.region.clone()),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    async fn load(&self) -> aws_sdk_kms::Client {
        let timeouts = TimeoutConfig::builder()
            .connect_timeout(self.connect_timeout)
            .operation_timeout(self.operation_timeout)
            .build();
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(timeouts);
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &self.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        if let Some(credentials) = &self.credentials {
            loader = loader.credentials_provider(credentials.clone());
        }
        let config = loader.load().await;
        tracing::debug!("kms client loaded: region = {:?}", config.region());
        aws_sdk_kms::Client::new(&config)
    }
}

/// AWS KMS client.
///
/// Creating a client never touches the network. The SDK configuration, including credentials,
/// is resolved on the first call and shared by clones.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    sdk: Arc<OnceCell<aws_sdk_kms::Client>>,
}

impl Debug for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("region", &self.config.region)
            .field("endpoint", &self.config.endpoint)
            .field("loaded", &self.sdk.initialized())
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
            sdk: Arc::new(OnceCell::new()),
        }
    }

    pub fn region(&self) -> Option<&str> {
        self.config.region.as_deref()
    }

    async fn sdk(&self) -> &aws_sdk_kms::Client {
        self.sdk.get_or_init(|| self.config.load()).await
    }

    /// Signs a precomputed message digest.
    ///
    /// https://docs.aws.amazon.com/kms/latest/APIReference/API_Sign.html
    pub async fn sign_digest(
        &self,
        key_id: &str,
        digest: Vec<u8>,
        algorithm: SigningAlgorithmSpec,
    ) -> Result<Vec<u8>, Error> {
        tracing::debug!("kms sign key = {}, algorithm = {}", key_id, algorithm.as_str());
        let output = self
            .sdk()
            .await
            .sign()
            .key_id(key_id)
            .message(Blob::new(digest))
            .message_type(MessageType::Digest)
            .signing_algorithm(algorithm)
            .send()
            .await?;
        output.signature.map(Blob::into_inner).ok_or(Error::MissingField("Signature"))
    }

    /// Returns the DER-encoded public key of an asymmetric key.
    ///
    /// https://docs.aws.amazon.com/kms/latest/APIReference/API_GetPublicKey.html
    pub async fn public_key(&self, key_id: &str) -> Result<Vec<u8>, Error> {
        tracing::debug!("kms get public key = {}", key_id);
        let output = self.sdk().await.get_public_key().key_id(key_id).send().await?;
        output.public_key.map(Blob::into_inner).ok_or(Error::MissingField("PublicKey"))
    }
}
