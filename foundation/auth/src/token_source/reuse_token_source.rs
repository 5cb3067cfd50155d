use async_trait::async_trait;
use sfkms_token::Token;

use crate::error::Error;
use crate::token_source::TokenSource;

/// Hands out the current token until it is about to expire, then asks `target` for a new one.
#[derive(Debug)]
pub struct ReuseTokenSource {
    target: Box<dyn TokenSource>,
    current_token: std::sync::RwLock<Option<Token>>,
    guard: tokio::sync::Mutex<()>,
}

impl ReuseTokenSource {
    pub(crate) fn new(target: Box<dyn TokenSource>) -> ReuseTokenSource {
        ReuseTokenSource {
            target,
            current_token: std::sync::RwLock::new(None),
            guard: tokio::sync::Mutex::new(()),
        }
    }
}

#[async_trait]
impl TokenSource for ReuseTokenSource {
    async fn token(&self) -> Result<Token, Error> {
        if let Ok(token) = self.r_lock_token() {
            return Ok(token);
        }

        // Only single task can refresh token
        let _locking = self.guard.lock().await;

        if let Ok(token) = self.r_lock_token() {
            return Ok(token);
        }

        let token = self.target.token().await?;
        tracing::debug!("token refresh success : expiry={:?}", token.expiry);
        *self.current_token.write().map_err(|_| Error::LockPoisoned)? = Some(token.clone());
        Ok(token)
    }
}

impl ReuseTokenSource {
    fn r_lock_token(&self) -> Result<Token, Error> {
        let token = self.current_token.read().map_err(|_| Error::LockPoisoned)?;
        match token.as_ref() {
            Some(token) if token.valid() => Ok(token.clone()),
            _ => Err(Error::InvalidToken),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use sfkms_token::Token;
    use time::OffsetDateTime;

    use crate::error::Error;
    use crate::token_source::reuse_token_source::ReuseTokenSource;
    use crate::token_source::TokenSource;

    struct CountingTokenSource {
        calls: Arc<AtomicUsize>,
        lifetime: time::Duration,
    }

    #[async_trait]
    impl TokenSource for CountingTokenSource {
        async fn token(&self) -> Result<Token, Error> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Token {
                access_token: format!("token-{n}"),
                token_type: "KEYPAIR_JWT".to_string(),
                expiry: Some(OffsetDateTime::now_utc() + self.lifetime),
            })
        }
    }

    #[tokio::test]
    async fn test_reuse_valid_token() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ts = ReuseTokenSource::new(Box::new(CountingTokenSource {
            calls: calls.clone(),
            lifetime: time::Duration::minutes(1),
        }));
        let first = ts.token().await.unwrap();
        let second = ts.token().await.unwrap();
        assert_eq!(first.access_token, second.access_token);
        assert_eq!(1, calls.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_refresh_expiring_token() {
        let calls = Arc::new(AtomicUsize::new(0));
        // expires inside the skew window, so never reusable
        let ts = ReuseTokenSource::new(Box::new(CountingTokenSource {
            calls: calls.clone(),
            lifetime: time::Duration::seconds(5),
        }));
        assert_eq!("token-0", ts.token().await.unwrap().access_token);
        assert_eq!("token-1", ts.token().await.unwrap().access_token);
        assert_eq!(2, calls.load(Ordering::SeqCst));
    }
}
