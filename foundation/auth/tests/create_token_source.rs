use std::sync::Arc;

use sfkms_auth::signer::AwsKmsKeySigner;
use sfkms_auth::*;
use sfkms_aws_kms::client::{Client, ClientConfig};
use sfkms_aws_kms::Credentials;
use sfkms_mock::KmsMockServer;
use sfkms_token::TokenSource;

#[ctor::ctor]
fn init() {
    let filter = tracing_subscriber::filter::EnvFilter::from_default_env().add_directive("sfkms_auth=trace".parse().unwrap());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

const KEY_ARN: &str = "arn:aws:kms:us-east-1:123456789:key/mrk-123456789";

#[tokio::test]
async fn test_create_kms_jwt_token_source() {
    let server = KmsMockServer::start(b"public-key-der".to_vec(), b"signature".to_vec())
        .await
        .unwrap();
    let client = Client::new(
        ClientConfig::default()
            .with_region("us-east-1")
            .with_endpoint(&server.endpoint)
            .with_credentials(Credentials::new("AKIDEXAMPLE", "secret", None, None, "test")),
    );
    let signer = AwsKmsKeySigner::new(client, KEY_ARN);

    let ts = create_kms_jwt_token_source(Config::new("xy12345", "jsmith"), Arc::new(signer)).unwrap();
    let first = ts.token().await.unwrap();
    let second = ts.token().await.unwrap();

    assert_eq!("KEYPAIR_JWT", first.token_type);
    assert_eq!(first.access_token, second.access_token);
    // one GetPublicKey and one Sign; the second token came from the cache
    assert_eq!(1, server.count("TrentService.GetPublicKey"));
    assert_eq!(1, server.count("TrentService.Sign"));
}

#[tokio::test]
async fn test_create_kms_jwt_token_source_denied() {
    let server = KmsMockServer::start_denying().await.unwrap();
    let client = Client::new(
        ClientConfig::default()
            .with_region("us-east-1")
            .with_endpoint(&server.endpoint)
            .with_credentials(Credentials::new("AKIDEXAMPLE", "secret", None, None, "test")),
    );
    let ts = create_kms_jwt_token_source(
        Config::new("xy12345", "jsmith"),
        Arc::new(AwsKmsKeySigner::new(client, KEY_ARN)),
    )
    .unwrap();
    let err = ts.token().await.unwrap_err();
    assert!(err.to_string().contains("AccessDeniedException"), "{err}");
}

#[tokio::test]
async fn test_create_oauth_token_source() {
    let ts = create_oauth_token_source("oauth-access-token").unwrap();
    let token = ts.token().await.unwrap();
    assert_eq!("OAUTH", token.token_type);
    assert_eq!("Bearer oauth-access-token", token.value());
    assert!(create_oauth_token_source("").is_err());
}
