//! # sfkms-auth
//!
//! Token sources for the Snowflake SQL API.
//!
//! * key-pair JWT signed by a [`signer::KeySigner`], normally [`signer::AwsKmsKeySigner`]
//! * OAuth access token obtained elsewhere
//!
//! ```rust
//! use std::sync::Arc;
//! use sfkms_auth::{create_kms_jwt_token_source, Config};
//! use sfkms_auth::signer::AwsKmsKeySigner;
//! use sfkms_aws_kms::arn::KeyArn;
//! use sfkms_aws_kms::client::{Client, ClientConfig};
//!
//! fn run(key: &str) -> Result<(), Box<dyn std::error::Error>> {
//!     let arn: KeyArn = key.parse()?;
//!     let signer = AwsKmsKeySigner::new(Client::new(ClientConfig::for_key(&arn)), key);
//!     let ts = create_kms_jwt_token_source(Config::new("xy12345", "jsmith"), Arc::new(signer))?;
//!     Ok(())
//! }
//! ```
pub mod error;
pub mod signer;
pub mod token;
pub mod token_source;

use std::sync::Arc;
use std::time::Duration;

use crate::signer::KeySigner;
use crate::token::DefaultTokenSource;
use crate::token_source::kms_jwt_token_source::KmsJwtTokenSource;
use crate::token_source::oauth_token_source::OAuthTokenSource;
use crate::token_source::reuse_token_source::ReuseTokenSource;

/// Lifetime of a key-pair JWT unless configured otherwise.
pub const DEFAULT_JWT_EXPIRE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct Config<'a> {
    account: &'a str,
    user: &'a str,
    expire_timeout: Duration,
}

impl<'a> Config<'a> {
    pub fn new(account: &'a str, user: &'a str) -> Self {
        Self {
            account,
            user,
            expire_timeout: DEFAULT_JWT_EXPIRE_TIMEOUT,
        }
    }

    pub fn with_expire_timeout(mut self, value: Duration) -> Self {
        self.expire_timeout = value;
        self
    }
}

/// Key-pair JWT token source. Tokens are reused until shortly before they expire, so the
/// signer is called at most once per token lifetime.
pub fn create_kms_jwt_token_source(
    config: Config<'_>,
    signer: Arc<dyn KeySigner>,
) -> Result<DefaultTokenSource, error::Error> {
    let source = KmsJwtTokenSource::new(config.account, config.user, config.expire_timeout, signer)?;
    let reuse = ReuseTokenSource::new(Box::new(source));
    Ok(DefaultTokenSource::new(Arc::new(reuse)))
}

pub fn create_oauth_token_source(access_token: &str) -> Result<DefaultTokenSource, error::Error> {
    let source = OAuthTokenSource::new(access_token)?;
    Ok(DefaultTokenSource::new(Arc::new(source)))
}
