//! Caller-supplied cancellation and deadlines.
//!
//! Every engine operation takes a [`CancelSignal`] and races its work against
//! it. Losing the race drops the in-flight future, so an open store
//! transaction is discarded rather than committed.

use std::future::Future;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::CoreError;

/// Observer side of a cancellation channel, optionally bounded by a deadline.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    receiver: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Trigger side of a cancellation channel.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

/// ## Summary
/// Creates a linked cancellation handle and signal.
#[must_use]
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (sender, receiver) = watch::channel(false);
    (
        CancelHandle { sender },
        CancelSignal {
            receiver: Some(receiver),
            deadline: None,
        },
    )
}

impl CancelHandle {
    /// Cancels every signal cloned from this handle's pair.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl CancelSignal {
    /// A signal that never fires.
    #[must_use]
    pub fn never() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Bounds the signal by an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// ## Summary
    /// Bounds the signal by a deadline relative to now.
    #[must_use]
    pub fn with_timeout(self, timeout: std::time::Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.receiver.as_ref().is_some_and(|rx| *rx.borrow())
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|at| Instant::now() >= at)
    }

    /// Resolves once the handle fires. Pends forever if it never does.
    pub async fn cancelled(&self) {
        let Some(receiver) = &self.receiver else {
            return std::future::pending().await;
        };
        let mut receiver = receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                // Handle dropped without firing.
                return std::future::pending().await;
            }
        }
    }

    async fn expired(&self) {
        match self.deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    }

    /// ## Summary
    /// Drives `work` to completion unless the signal fires or the deadline passes first.
    ///
    /// ## Errors
    /// Returns `CoreError::Cancelled` or `CoreError::DeadlineExceeded` (converted into `E`)
    /// when the work loses the race, otherwise whatever `work` returns.
    pub async fn run<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<CoreError>,
    {
        if self.is_cancelled() {
            return Err(CoreError::Cancelled.into());
        }
        if self.is_expired() {
            return Err(CoreError::DeadlineExceeded.into());
        }

        tokio::select! {
            biased;
            () = self.cancelled() => {
                tracing::debug!("Operation cancelled by caller");
                Err(CoreError::Cancelled.into())
            }
            () = self.expired() => {
                tracing::debug!("Operation deadline exceeded");
                Err(CoreError::DeadlineExceeded.into())
            }
            result = work => result,
        }
    }
}
