pub mod kms_jwt_token_source;
pub mod oauth_token_source;
pub mod reuse_token_source;

use std::fmt::{Debug, Formatter};

use async_trait::async_trait;
use sfkms_token::Token;

use crate::error::Error;

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<Token, Error>;
}

impl Debug for dyn TokenSource {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str("TokenSource")
    }
}
