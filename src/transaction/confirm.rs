//! Transaction confirmation implementation. A submitted transaction is
//! considered confirmed as soon as the node returns a receipt for it; until
//! then the receipt is polled at a fixed interval until an optional
//! wall-clock timeout elapses.

use crate::errors::ExecutionError;
use futures::future::{BoxFuture, FutureExt as _};
use futures_timer::Delay;
use std::fmt::Debug;
use std::time::{Duration, Instant};
use web3::api::Web3;
use web3::types::{TransactionReceipt, H256};
use web3::Transport;

/// The default delay between receipt queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// The default time to wait for a transaction to be mined.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(240_000);

/// A struct with the confirmation parameters.
#[derive(Clone, Debug, PartialEq)]
#[must_use = "confirm parameters do nothing unless waited for"]
pub struct ConfirmParams {
    /// The delay between consecutive `eth_getTransactionReceipt` calls.
    pub poll_interval: Duration,
    /// The maximum time to wait for the transaction to be mined, measured
    /// from the first receipt query. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl ConfirmParams {
    /// Set new value for [`poll_interval`].
    ///
    /// [`poll_interval`]: #structfield.poll_interval
    #[inline]
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set new value for [`timeout`].
    ///
    /// [`timeout`]: #structfield.timeout
    #[inline]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the timeout in milliseconds, where zero or a negative value
    /// disables it.
    #[inline]
    pub fn timeout_millis(self, millis: i64) -> Self {
        let timeout = u64::try_from(millis)
            .ok()
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis);
        self.timeout(timeout)
    }
}

impl Default for ConfirmParams {
    fn default() -> Self {
        ConfirmParams {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

/// Source of time for the confirmation loop.
pub trait Clock: Debug + Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;

    /// A future that resolves after the specified duration.
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// The wall clock, sleeping on `futures-timer` delays.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        delay(duration).boxed()
    }
}

/// Create a new delay that may resolve immediately when delayed for a zero
/// duration.
///
/// The `Delay` future always returns `Poll::Pending` at least once, even with
/// a delay of zero.
async fn delay(duration: Duration) {
    if !duration.is_zero() {
        Delay::new(duration).await;
    }
}

/// State of one confirmation loop.
#[derive(Debug)]
struct PendingTransaction {
    hash: H256,
    started: Instant,
    polls: usize,
}

/// Waits for a transaction to be mined and returns its receipt.
///
/// Query failures are returned immediately and never retried. The timeout is
/// checked after every empty receipt and only fires once the elapsed time
/// exceeds it, so a query made exactly at the deadline is still honoured.
pub async fn wait_for_receipt<T: Transport>(
    web3: &Web3<T>,
    hash: H256,
    params: &ConfirmParams,
    clock: &dyn Clock,
) -> Result<TransactionReceipt, ExecutionError> {
    let mut pending = PendingTransaction {
        hash,
        started: clock.now(),
        polls: 0,
    };

    loop {
        pending.polls += 1;
        let receipt = web3
            .eth()
            .transaction_receipt(pending.hash)
            .await
            .map_err(ExecutionError::ReceiptQuery)?;
        if let Some(receipt) = receipt {
            tracing::debug!(hash = ?pending.hash, polls = pending.polls, "transaction mined");
            return Ok(receipt);
        }

        let elapsed = clock.now().saturating_duration_since(pending.started);
        if let Some(timeout) = params.timeout {
            if elapsed > timeout {
                return Err(ExecutionError::ConfirmationTimeout {
                    hash: pending.hash,
                    elapsed,
                });
            }
        }

        tracing::trace!(hash = ?pending.hash, ?elapsed, "transaction pending");
        clock.sleep(params.poll_interval).await;
    }
}
