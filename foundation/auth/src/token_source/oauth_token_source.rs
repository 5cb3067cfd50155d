use async_trait::async_trait;
use sfkms_token::{Token, TOKEN_TYPE_OAUTH};

use crate::error::Error;
use crate::token_source::TokenSource;

/// Presents an OAuth access token obtained out of band.
pub struct OAuthTokenSource {
    access_token: String,
}

impl OAuthTokenSource {
    pub(crate) fn new(access_token: &str) -> Result<Self, Error> {
        if access_token.is_empty() {
            return Err(Error::EmptyToken);
        }
        Ok(Self {
            access_token: access_token.to_string(),
        })
    }
}

#[async_trait]
impl TokenSource for OAuthTokenSource {
    async fn token(&self) -> Result<Token, Error> {
        Ok(Token {
            access_token: self.access_token.clone(),
            token_type: TOKEN_TYPE_OAUTH.to_string(),
            expiry: None,
        })
    }
}
