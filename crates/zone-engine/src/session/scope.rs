//! Lifetime scope for asynchronous work started by an editing surface
//!
//! Results that arrive after the surface is gone must not be applied to
//! it. Every persistence future is run through a [`SessionScope`]; once the
//! scope is torn down, pending and future runs resolve to `None`.

use crate::types::{Result, ZoneError};
use std::future::Future;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct SessionScope {
    token: CancellationToken,
}

impl SessionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope torn down together with this one, or on its own
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn teardown(&self) {
        if !self.token.is_cancelled() {
            log::debug!("Session scope torn down, discarding pending results");
        }
        self.token.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drive `future` unless the scope is torn down first.
    ///
    /// Returns `None` if teardown happens before or while the future runs.
    pub async fn run<F: Future>(&self, future: F) -> Option<F::Output> {
        if self.token.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            output = future => {
                if self.token.is_cancelled() {
                    None
                } else {
                    Some(output)
                }
            }
        }
    }

    /// [`run`](Self::run) for fallible futures, mapping teardown to
    /// [`ZoneError::Cancelled`]
    pub async fn run_result<T>(&self, future: impl Future<Output = Result<T>>) -> Result<T> {
        self.run(future).await.unwrap_or(Err(ZoneError::Cancelled))
    }
}
