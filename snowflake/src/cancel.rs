use tokio_util::sync::CancellationToken as InternalCancellationToken;

/// Cancels a running statement. Wraps `tokio_util::sync::CancellationToken` so callers do not
/// depend on `tokio-util` directly.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    inner: InternalCancellationToken,
}

impl Default for CancellationToken {
    fn default() -> CancellationToken {
        CancellationToken::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: InternalCancellationToken::new(),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Completes when cancellation is requested.
    pub async fn cancelled(&self) {
        self.inner.cancelled().await
    }
}
