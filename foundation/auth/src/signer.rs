use std::fmt::Debug;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use sfkms_aws_kms::client::Client;
use sfkms_aws_kms::SigningAlgorithmSpec;

use crate::error::Error;

/// An RSA key whose private half never leaves its holder.
#[async_trait]
pub trait KeySigner: Send + Sync + Debug {
    /// DER-encoded SubjectPublicKeyInfo of the key.
    async fn public_key(&self) -> Result<Vec<u8>, Error>;

    /// RSASSA-PKCS1-v1_5 SHA-256 signature of `message`.
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Signs with an asymmetric key in AWS KMS. The message is hashed locally and only the digest
/// is sent.
#[derive(Clone, Debug)]
pub struct AwsKmsKeySigner {
    client: Client,
    key_id: String,
}

impl AwsKmsKeySigner {
    pub fn new(client: Client, key_id: impl Into<String>) -> Self {
        Self {
            client,
            key_id: key_id.into(),
        }
    }
}

#[async_trait]
impl KeySigner for AwsKmsKeySigner {
    async fn public_key(&self) -> Result<Vec<u8>, Error> {
        Ok(self.client.public_key(&self.key_id).await?)
    }

    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error> {
        let digest = Sha256::digest(message).to_vec();
        let signature = self
            .client
            .sign_digest(&self.key_id, digest, SigningAlgorithmSpec::RsassaPkcs1V15Sha256)
            .await?;
        if signature.is_empty() {
            return Err(Error::EmptySignature);
        }
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use base64::prelude::*;
    use sha2::{Digest, Sha256};

    use sfkms_aws_kms::client::{Client, ClientConfig};
    use sfkms_aws_kms::Credentials;
    use sfkms_mock::KmsMockServer;

    use crate::error::Error;
    use crate::signer::{AwsKmsKeySigner, KeySigner};

    const KEY_ARN: &str = "arn:aws:kms:us-east-1:123456789:key/mrk-123456789";

    fn signer(endpoint: &str) -> AwsKmsKeySigner {
        let config = ClientConfig::default()
            .with_region("us-east-1")
            .with_endpoint(endpoint)
            .with_credentials(Credentials::new("AKIDEXAMPLE", "secret", None, None, "test"));
        AwsKmsKeySigner::new(Client::new(config), KEY_ARN)
    }

    #[tokio::test]
    async fn test_sign_sends_digest() {
        let server = KmsMockServer::start(b"public".to_vec(), b"signature".to_vec()).await.unwrap();
        let signer = signer(&server.endpoint);

        assert_eq!(b"public".to_vec(), signer.public_key().await.unwrap());
        assert_eq!(b"signature".to_vec(), signer.sign(b"header.payload").await.unwrap());

        let requests = server.requests();
        assert_eq!(2, requests.len());
        let sign = &requests[1];
        assert_eq!("TrentService.Sign", sign.target);
        assert!(sign.authorization.contains("Credential=AKIDEXAMPLE/"));
        assert!(sign.authorization.contains("/us-east-1/kms/aws4_request"));
        assert_eq!(KEY_ARN, sign.body["KeyId"]);
        assert_eq!("RSASSA_PKCS1_V1_5_SHA_256", sign.body["SigningAlgorithm"]);
        let digest = BASE64_STANDARD.encode(Sha256::digest(b"header.payload"));
        assert_eq!(digest.as_str(), sign.body["Message"]);
    }

    #[tokio::test]
    async fn test_sign_access_denied() {
        let server = KmsMockServer::start_denying().await.unwrap();
        let signer = signer(&server.endpoint);
        match signer.sign(b"header.payload").await {
            Err(Error::Kms(e)) => assert_eq!(Some("AccessDeniedException"), e.code()),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_signature() {
        let server = KmsMockServer::start(b"public".to_vec(), vec![]).await.unwrap();
        let signer = signer(&server.endpoint);
        assert!(matches!(signer.sign(b"x").await, Err(Error::EmptySignature)));
    }
}
