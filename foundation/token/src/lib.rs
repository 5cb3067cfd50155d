use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use time::OffsetDateTime;

/// Value of `X-Snowflake-Authorization-Token-Type` for key-pair JWTs.
pub const TOKEN_TYPE_KEYPAIR_JWT: &str = "KEYPAIR_JWT";
/// Value of `X-Snowflake-Authorization-Token-Type` for OAuth access tokens.
pub const TOKEN_TYPE_OAUTH: &str = "OAUTH";

#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub expiry: Option<OffsetDateTime>,
}

impl Token {
    pub fn value(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    pub fn valid(&self) -> bool {
        !self.access_token.is_empty() && !self.expired()
    }

    fn expired(&self) -> bool {
        match self.expiry {
            None => false,
            Some(s) => {
                let now = OffsetDateTime::now_utc();
                let exp = s + time::Duration::seconds(-10);
                now > exp
            }
        }
    }
}

#[async_trait]
pub trait TokenSource: Send + Sync + Debug {
    /// token returns the valid token
    async fn token(&self) -> Result<Token, Box<dyn Error + Send + Sync>>;
}
