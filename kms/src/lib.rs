//! # sfkms-aws-kms
//!
//! A thin layer over `aws-sdk-kms`: signs a digest with an asymmetric key and reads its public key.
//! The SDK client is built lazily so that creating a [`client::Client`] never touches the network.
//!
//! ## Quickstart
//!
//! ```rust
//! use sfkms_aws_kms::arn::KeyArn;
//! use sfkms_aws_kms::client::{Client, ClientConfig};
//! use sfkms_aws_kms::SigningAlgorithmSpec;
//!
//! async fn run(key: &str, digest: Vec<u8>) -> Result<Vec<u8>, sfkms_aws_kms::error::Error> {
//!     let arn: KeyArn = key.parse()?;
//!     let client = Client::new(ClientConfig::for_key(&arn));
//!     client
//!         .sign_digest(&arn.to_string(), digest, SigningAlgorithmSpec::RsassaPkcs1V15Sha256)
//!         .await
//! }
//! ```
//!
//! Credentials, endpoint overrides (`AWS_ENDPOINT_URL_KMS`) and retries follow the AWS SDK's
//! default chains unless set on the [`client::ClientConfig`].
pub mod arn;
pub mod client;
pub mod error;

pub use aws_sdk_kms::config::Credentials;
pub use aws_sdk_kms::types::SigningAlgorithmSpec;
