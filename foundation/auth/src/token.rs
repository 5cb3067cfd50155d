use std::sync::Arc;

use async_trait::async_trait;

use sfkms_token::{Token, TokenSource};

use crate::token_source::TokenSource as InternalTokenSource;

/// Exposes an internal token source through the driver-facing [`TokenSource`] trait.
#[derive(Debug, Clone)]
pub struct DefaultTokenSource {
    inner: Arc<dyn InternalTokenSource>,
}

impl DefaultTokenSource {
    pub(crate) fn new(inner: Arc<dyn InternalTokenSource>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl TokenSource for DefaultTokenSource {
    async fn token(&self) -> Result<Token, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.inner.token().await?)
    }
}
