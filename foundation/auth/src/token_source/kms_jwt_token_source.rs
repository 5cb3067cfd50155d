use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tokio::sync::OnceCell;

use sfkms_token::{Token, TOKEN_TYPE_KEYPAIR_JWT};

use crate::error::Error;
use crate::signer::KeySigner;
use crate::token_source::TokenSource;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Encodes the claims and signs `header.payload` with `signer`.
    async fn token(&self, signer: &dyn KeySigner) -> Result<String, Error> {
        let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
        let signing_input = format!(
            "{}.{}",
            BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(self)?)
        );
        let signature = signer.sign(signing_input.as_bytes()).await?;
        Ok(format!("{}.{}", signing_input, BASE64_URL_SAFE_NO_PAD.encode(signature)))
    }
}

/// `SHA256:<base64 of the SHA-256 of the DER public key>`, the form Snowflake stores as
/// `RSA_PUBLIC_KEY_FP`.
pub fn public_key_fingerprint(public_key_der: &[u8]) -> String {
    format!("SHA256:{}", BASE64_STANDARD.encode(Sha256::digest(public_key_der)))
}

/// Account name as it appears in JWT claims: the locator before the first `.`, upper case.
pub fn account_name(account: &str) -> String {
    account.split('.').next().unwrap_or_default().to_ascii_uppercase()
}

// Snowflake key-pair authentication with the private key held by a KeySigner.
// see https://docs.snowflake.com/en/developer-guide/sql-api/authenticating#using-key-pair-authentication
pub struct KmsJwtTokenSource {
    account: String,
    user: String,
    expire_timeout: Duration,
    signer: Arc<dyn KeySigner>,
    fingerprint: OnceCell<String>,
}

impl Debug for KmsJwtTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KmsJwtTokenSource")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("expire_timeout", &self.expire_timeout)
            .field("signer", &self.signer)
            .finish()
    }
}

impl KmsJwtTokenSource {
    pub(crate) fn new(
        account: &str,
        user: &str,
        expire_timeout: Duration,
        signer: Arc<dyn KeySigner>,
    ) -> Result<KmsJwtTokenSource, Error> {
        let account = account_name(account);
        if account.is_empty() {
            return Err(Error::EmptyAccount);
        }
        if user.is_empty() {
            return Err(Error::EmptyUser);
        }
        Ok(KmsJwtTokenSource {
            account,
            user: user.to_ascii_uppercase(),
            expire_timeout,
            signer,
            fingerprint: OnceCell::new(),
        })
    }

    async fn fingerprint(&self) -> Result<&str, Error> {
        let fingerprint = self
            .fingerprint
            .get_or_try_init(|| async {
                let public_key = self.signer.public_key().await?;
                Ok::<_, Error>(public_key_fingerprint(&public_key))
            })
            .await?;
        Ok(fingerprint.as_str())
    }

    pub(crate) fn claims(&self, fingerprint: &str, iat: OffsetDateTime) -> Claims {
        let qualified_user = format!("{}.{}", self.account, self.user);
        Claims {
            iss: format!("{qualified_user}.{fingerprint}"),
            sub: qualified_user,
            iat: iat.unix_timestamp(),
            exp: (iat + self.expire_timeout).unix_timestamp(),
        }
    }
}

#[async_trait]
impl TokenSource for KmsJwtTokenSource {
    async fn token(&self) -> Result<Token, Error> {
        let fingerprint = self.fingerprint().await?;
        let iat = OffsetDateTime::now_utc();
        let claims = self.claims(fingerprint, iat);
        let token = claims.token(self.signer.as_ref()).await?;
        tracing::debug!("signed key-pair jwt sub={} exp={}", claims.sub, claims.exp);
        Ok(Token {
            access_token: token,
            token_type: TOKEN_TYPE_KEYPAIR_JWT.to_string(),
            expiry: Some(iat + self.expire_timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use base64::prelude::*;
    use time::macros::datetime;

    use crate::error::Error;
    use crate::signer::KeySigner;
    use crate::token_source::kms_jwt_token_source::{
        account_name, public_key_fingerprint, Claims, KmsJwtTokenSource,
    };
    use crate::token_source::TokenSource;

    #[derive(Debug, Default)]
    struct FakeSigner {
        public_key_calls: AtomicUsize,
        messages: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl KeySigner for FakeSigner {
        async fn public_key(&self) -> Result<Vec<u8>, Error> {
            self.public_key_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }

        async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error> {
            self.messages.lock().unwrap().push(message.to_vec());
            Ok(b"fake-signature".to_vec())
        }
    }

    // sha256 of the empty input
    const EMPTY_KEY_FINGERPRINT: &str = "SHA256:47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=";

    #[test]
    fn test_public_key_fingerprint() {
        assert_eq!(EMPTY_KEY_FINGERPRINT, public_key_fingerprint(&[]));
    }

    #[test]
    fn test_account_name() {
        assert_eq!("XY12345", account_name("xy12345.us-east-2.aws"));
        assert_eq!("MYORG-MYACCOUNT", account_name("myorg-myaccount"));
    }

    #[test]
    fn test_claims() {
        let signer = Arc::new(FakeSigner::default());
        let ts = KmsJwtTokenSource::new("xy12345.us-east-2", "jsmith", Duration::from_secs(60), signer).unwrap();
        let iat = datetime!(2026-10-18 00:00:00 UTC);
        let claims = ts.claims(EMPTY_KEY_FINGERPRINT, iat);
        assert_eq!(
            Claims {
                iss: format!("XY12345.JSMITH.{EMPTY_KEY_FINGERPRINT}"),
                sub: "XY12345.JSMITH".to_string(),
                iat: iat.unix_timestamp(),
                exp: iat.unix_timestamp() + 60,
            },
            claims
        );
    }

    #[test]
    fn test_required_fields() {
        let signer = Arc::new(FakeSigner::default());
        let timeout = Duration::from_secs(60);
        assert!(matches!(
            KmsJwtTokenSource::new("", "jsmith", timeout, signer.clone()),
            Err(Error::EmptyAccount)
        ));
        assert!(matches!(
            KmsJwtTokenSource::new("xy12345", "", timeout, signer),
            Err(Error::EmptyUser)
        ));
    }

    #[tokio::test]
    async fn test_token() {
        let signer = Arc::new(FakeSigner::default());
        let ts = KmsJwtTokenSource::new("xy12345", "jsmith", Duration::from_secs(120), signer.clone()).unwrap();

        let token = ts.token().await.unwrap();
        assert_eq!("KEYPAIR_JWT", token.token_type);
        assert!(token.valid());

        let parts: Vec<&str> = token.access_token.split('.').collect();
        assert_eq!(3, parts.len());
        let header = jsonwebtoken::decode_header(&token.access_token).unwrap();
        assert_eq!(jsonwebtoken::Algorithm::RS256, header.alg);
        assert_eq!(Some("JWT".to_string()), header.typ);

        let claims: Claims = serde_json::from_slice(&BASE64_URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!("XY12345.JSMITH", claims.sub);
        assert_eq!(format!("XY12345.JSMITH.{EMPTY_KEY_FINGERPRINT}"), claims.iss);
        assert_eq!(120, claims.exp - claims.iat);

        assert_eq!(b"fake-signature".to_vec(), BASE64_URL_SAFE_NO_PAD.decode(parts[2]).unwrap());
        let messages = signer.messages.lock().unwrap().clone();
        assert_eq!(vec![format!("{}.{}", parts[0], parts[1]).into_bytes()], messages);
    }

    #[tokio::test]
    async fn test_public_key_fetched_once() {
        let signer = Arc::new(FakeSigner::default());
        let ts = KmsJwtTokenSource::new("xy12345", "jsmith", Duration::from_secs(60), signer.clone()).unwrap();
        ts.token().await.unwrap();
        ts.token().await.unwrap();
        assert_eq!(1, signer.public_key_calls.load(Ordering::SeqCst));
        assert_eq!(2, signer.messages.lock().unwrap().len());
    }
}
