//! The awaitable answer to one `is_registered` call.
//!
//! # How a query is correlated (for beginners)
//!
//! ```text
//! caller                    registry                     host
//! ──────                    ────────                     ────
//! is_registered("F1")
//!                           id = allocator.next()
//!                           on("query-completed:<id>", one-shot handler)
//!                           emit("query", ["F1", "<id>"])  ──►
//!   ◄── RegistrationQuery                                      looks up F1
//!                                                         ◄── emit("query-completed:<id>", [true])
//!                           handler: off(channel), send(true) on the oneshot
//! .await → Ok(true)
//! ```
//!
//! The one-shot handler owns the sending half of a `tokio::sync::oneshot`
//! channel inside a `Mutex<Option<_>>`.  Taking the sender out is the latch:
//! the first boolean answer wins and any later message on the same channel
//! finds `None` and is ignored.
//!
//! # Releasing the subscription
//!
//! The [`RegistrationQuery`] holds a guard for its channel.  If the query is
//! dropped before an answer arrives, or its deadline passes, the guard
//! unsubscribes the channel so nothing is left behind on the bridge.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use shortcut_core::{Accelerator, CorrelationId};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::Sleep;
use tracing::debug;

use crate::infrastructure::bridge::Bridge;

/// Reasons a query can finish without an answer from the host.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The host did not answer before the deadline.
    #[error("host did not answer within {0:?}")]
    TimedOut(Duration),

    /// The subscription was removed before any answer arrived, for example
    /// because the query could not be sent.
    #[error("query channel closed before the host answered")]
    ChannelClosed,

    /// A blocking wait could not start its timer runtime.
    #[error("failed to start blocking wait: {0}")]
    Runtime(String),
}

/// Future resolving to whether the host reports the accelerator as registered.
///
/// The answer reflects the host's view: `true` may mean *another* application
/// owns the accelerator, and `false` does not remove any local binding.
///
/// Deadlines (set via [`RegistrationQuery::with_timeout`] or the registry's
/// configured default) use the Tokio timer, so a query with a deadline must
/// be awaited inside a Tokio runtime or waited on with
/// [`RegistrationQuery::wait_blocking`].
#[must_use = "dropping a RegistrationQuery cancels it"]
pub struct RegistrationQuery {
    accelerator: Accelerator,
    correlation: CorrelationId,
    answer: oneshot::Receiver<bool>,
    subscription: SubscriptionGuard,
    timeout: Option<Duration>,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl RegistrationQuery {
    pub(crate) fn new(
        accelerator: Accelerator,
        correlation: CorrelationId,
        answer: oneshot::Receiver<bool>,
        bridge: Arc<dyn Bridge>,
    ) -> Self {
        let subscription = SubscriptionGuard {
            bridge,
            channel: correlation.channel(),
            armed: true,
        };
        Self {
            accelerator,
            correlation,
            answer,
            subscription,
            timeout: None,
            deadline: None,
        }
    }

    /// Fails the query with [`QueryError::TimedOut`] if no answer arrives
    /// within `limit`.  Replaces any earlier deadline.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self.deadline = None;
        self
    }

    pub(crate) fn with_optional_timeout(self, limit: Option<Duration>) -> Self {
        match limit {
            Some(limit) => self.with_timeout(limit),
            None => self,
        }
    }

    /// The accelerator this query asks about.
    pub fn accelerator(&self) -> &Accelerator {
        &self.accelerator
    }

    /// The per-call id the host must answer on.
    pub fn correlation(&self) -> CorrelationId {
        self.correlation
    }

    /// The one-shot event channel this query is subscribed to.
    pub fn channel(&self) -> &str {
        &self.subscription.channel
    }

    /// Blocks the current thread until the query resolves.
    ///
    /// Without a deadline this parks on the oneshot directly.  With one, a
    /// private current-thread runtime drives the timer.
    ///
    /// # Errors
    ///
    /// Returns the same errors as awaiting the query, plus
    /// [`QueryError::Runtime`] if called from inside a Tokio runtime (where
    /// blocking would stall the executor) or if the timer runtime cannot be
    /// created.
    pub fn wait_blocking(self) -> Result<bool, QueryError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(QueryError::Runtime(
                "wait_blocking called from within a Tokio runtime; await the query instead"
                    .to_string(),
            ));
        }

        if self.timeout.is_none() {
            let RegistrationQuery {
                answer,
                mut subscription,
                ..
            } = self;
            return match answer.blocking_recv() {
                Ok(registered) => {
                    subscription.armed = false;
                    Ok(registered)
                }
                Err(_) => {
                    subscription.release();
                    Err(QueryError::ChannelClosed)
                }
            };
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| QueryError::Runtime(e.to_string()))?;
        runtime.block_on(self)
    }
}

impl Future for RegistrationQuery {
    type Output = Result<bool, QueryError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match Pin::new(&mut this.answer).poll(cx) {
            Poll::Ready(Ok(registered)) => {
                // The one-shot handler has already unsubscribed itself.
                this.subscription.armed = false;
                return Poll::Ready(Ok(registered));
            }
            Poll::Ready(Err(_)) => {
                this.subscription.release();
                return Poll::Ready(Err(QueryError::ChannelClosed));
            }
            Poll::Pending => {}
        }

        if let Some(limit) = this.timeout {
            let deadline = this
                .deadline
                .get_or_insert_with(|| Box::pin(tokio::time::sleep(limit)));
            if deadline.as_mut().poll(cx).is_ready() {
                debug!(
                    "query for '{}' timed out after {limit:?}",
                    this.accelerator
                );
                this.subscription.release();
                return Poll::Ready(Err(QueryError::TimedOut(limit)));
            }
        }

        Poll::Pending
    }
}

/// Unsubscribes a query channel when released or dropped while armed.
struct SubscriptionGuard {
    bridge: Arc<dyn Bridge>,
    channel: String,
    armed: bool,
}

impl SubscriptionGuard {
    fn release(&mut self) {
        if self.armed {
            self.armed = false;
            self.bridge.off(&self.channel);
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if self.armed {
            debug!("releasing unanswered query channel '{}'", self.channel);
        }
        self.release();
    }
}
