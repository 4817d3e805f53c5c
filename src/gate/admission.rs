//! Admission control: concurrency capping plus per-minute rate limiting.
//!
//! Two independent limits shape database work:
//! - a counting gate (`tokio::sync::Semaphore`) caps how many requests hold a
//!   lease at once; the excess caller suspends until a lease is released;
//! - a sliding 60-second window caps admissions per minute; a caller over the
//!   quota sleeps until the window has room. Requests are shaped, never
//!   rejected.
//!
//! Releasing a lease returns the concurrency slot only; a rate admission is a
//! forward-looking quota and is not refunded. Dropping the acquire future
//! before it completes (cancellation) consumes neither: the semaphore permit
//! is handed back by tokio and the window entry is only recorded in the same
//! lock scope that grants the lease.

use crate::error::{DiagError, DiagResult};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Length of the rate-limiting window.
const RATE_WINDOW: Duration = Duration::from_secs(60);

/// A granted unit of gated database work.
///
/// The concurrency slot is returned when the lease is dropped, which happens
/// exactly once on every exit path - success, error or cancellation.
#[derive(Debug)]
pub struct QueryLease {
    _permit: Option<OwnedSemaphorePermit>,
}

impl QueryLease {
    fn granted(permit: OwnedSemaphorePermit) -> Self {
        Self {
            _permit: Some(permit),
        }
    }

    fn unbounded() -> Self {
        Self { _permit: None }
    }
}

/// Concurrency gate plus sliding-window rate limiter.
#[derive(Debug)]
pub struct QueryGovernor {
    concurrency: Arc<Semaphore>,
    /// Admission timestamps inside the trailing window, oldest first.
    window: Mutex<VecDeque<Instant>>,
    max_per_minute: usize,
}

impl QueryGovernor {
    pub fn new(max_concurrent: usize, max_per_minute: usize) -> Self {
        Self {
            concurrency: Arc::new(Semaphore::new(max_concurrent)),
            window: Mutex::new(VecDeque::with_capacity(max_per_minute.min(1024))),
            max_per_minute,
        }
    }

    /// Wait until both limits allow another request.
    ///
    /// The concurrency slot is taken first so a caller blocked on the rate
    /// window does not also hold up the slot accounting of finished requests.
    pub async fn acquire(&self) -> DiagResult<QueryLease> {
        let permit = self
            .concurrency
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DiagError::internal("admission gate closed"))?;

        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                while window
                    .front()
                    .is_some_and(|admitted| now.duration_since(*admitted) >= RATE_WINDOW)
                {
                    window.pop_front();
                }
                if window.len() < self.max_per_minute {
                    window.push_back(now);
                    None
                } else {
                    // Oldest admission decides when capacity frees up.
                    window.front().map(|oldest| *oldest + RATE_WINDOW - now)
                }
            };

            match wait {
                None => return Ok(QueryLease::granted(permit)),
                Some(delay) => tokio::time::sleep(delay).await,
            }
        }
    }

    /// Number of concurrency slots currently free.
    pub fn available_slots(&self) -> usize {
        self.concurrency.available_permits()
    }
}

/// Pluggable admission capability.
///
/// Gated dispatch over a closed set of strategies: the governed variant for
/// the MCP surface, and an unbounded variant for local/test invocation paths
/// that grants immediately and makes lease release a no-op.
#[derive(Debug)]
pub enum AdmissionControl {
    Governed(QueryGovernor),
    Unbounded,
}

impl AdmissionControl {
    pub fn governed(max_concurrent: usize, max_per_minute: usize) -> Self {
        Self::Governed(QueryGovernor::new(max_concurrent, max_per_minute))
    }

    pub fn unbounded() -> Self {
        Self::Unbounded
    }

    /// Acquire a lease, suspending until both limits allow it.
    pub async fn acquire(&self) -> DiagResult<QueryLease> {
        match self {
            Self::Governed(governor) => governor.acquire().await,
            Self::Unbounded => Ok(QueryLease::unbounded()),
        }
    }
}
