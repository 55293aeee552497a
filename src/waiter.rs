/*!
 * Condition Waiter
 *
 * Owns the full lifecycle of one wait: spawn the poll worker, block on
 * the completion cell for up to `at_most`, and tear the worker down on
 * every exit path before control returns to the caller.
 *
 * # Shutdown
 *
 * The stop signal is raised and the worker joined regardless of how the
 * wait resolved (success, failure, timeout, cancellation). Raising the
 * stop only suppresses future polls; an evaluation already in flight runs
 * to completion and its result is discarded by the complete-once cell.
 */

use crate::completion::{CancelTarget, CancelToken, Completion, Outcome};
use crate::config::WaitConfig;
use crate::error::{Failure, FailureKind, WaitError, WaitResult};
use crate::poller::{run_poller, StopSignal};
use std::convert::Infallible;
use std::panic;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Blocking condition poller
///
/// Configuration plus one operation; no state survives a call, so a
/// configured waiter may be reused and shared freely — concurrent waits
/// never interfere.
///
/// # Examples
///
/// ```
/// use condwait::ConditionWaiter;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let ready = Arc::new(AtomicBool::new(false));
///
/// let flag = ready.clone();
/// std::thread::spawn(move || {
///     std::thread::sleep(Duration::from_millis(20));
///     flag.store(true, Ordering::SeqCst);
/// });
///
/// ConditionWaiter::new()
///     .at_most(Duration::from_secs(2))
///     .poll_delay(Duration::from_millis(5))
///     .poll_interval(Duration::from_millis(5))
///     .wait_until(move || ready.load(Ordering::SeqCst))
///     .expect("condition never became true");
/// ```
#[derive(Debug, Clone)]
pub struct ConditionWaiter<K = ()>
where
    K: FailureKind,
{
    config: WaitConfig<K>,
    cancel: Option<CancelToken>,
}

impl<K: FailureKind> ConditionWaiter<K> {
    /// Create a waiter with the default schedule (100ms delay, 100ms
    /// interval, 10s budget, nothing ignored)
    pub fn new() -> Self {
        Self {
            config: WaitConfig::new(),
            cancel: None,
        }
    }

    /// Create a waiter from an existing configuration
    pub fn with_config(config: WaitConfig<K>) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Set the total wall-clock budget for the wait
    pub fn at_most(mut self, budget: Duration) -> Self {
        self.config = self.config.with_at_most(budget);
        self
    }

    /// Set the time before the first poll
    pub fn poll_delay(mut self, delay: Duration) -> Self {
        self.config = self.config.with_poll_delay(delay);
        self
    }

    /// Set the time between the end of one poll and the start of the next
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_poll_interval(interval);
        self
    }

    /// Set the failure kinds tolerated as "condition not yet true"
    pub fn ignored_failures(mut self, kinds: impl IntoIterator<Item = K>) -> Self {
        self.config = self.config.with_ignored_failures(kinds);
        self
    }

    /// Attach a token that can cancel this waiter's blocked waits
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The waiter's configuration
    pub fn config(&self) -> &WaitConfig<K> {
        &self.config
    }

    /// Block until the predicate returns `Ok(true)`, a failure with an
    /// unignored kind is raised, the `at_most` budget elapses, or the
    /// attached [`CancelToken`] is cancelled.
    ///
    /// The predicate runs exclusively on a dedicated worker thread,
    /// strictly serialized: the next poll is scheduled `poll_interval`
    /// after the previous one *completes*. Failures whose kind is covered
    /// by the ignored set are swallowed and treated as a negative poll.
    ///
    /// The worker is always stopped and joined before this returns; a
    /// predicate evaluation already in flight is allowed to finish (its
    /// late result is discarded), and a panicking predicate is re-raised
    /// here on the calling thread.
    pub fn wait<F, E>(&self, predicate: F) -> WaitResult<E>
    where
        F: FnMut() -> Result<bool, E> + Send + 'static,
        E: Failure<K> + Send + 'static,
    {
        let start = Instant::now();
        let completion = Arc::new(Completion::new());
        let stop = Arc::new(StopSignal::new());

        let registration = self.cancel.as_ref().map(|token| {
            let target: Arc<dyn CancelTarget> = completion.clone();
            let target: Weak<dyn CancelTarget> = Arc::downgrade(&target);
            (token, token.attach(target))
        });

        debug!(
            at_most_ms = self.config.at_most().as_millis() as u64,
            poll_delay_ms = self.config.poll_delay().as_millis() as u64,
            poll_interval_ms = self.config.poll_interval().as_millis() as u64,
            "wait started"
        );

        let worker = {
            let completion = Arc::clone(&completion);
            let stop = Arc::clone(&stop);
            let config = self.config.clone();
            thread::Builder::new()
                .name("condwait-poll".into())
                .spawn(move || run_poller(&config, &stop, &completion, predicate))
                .expect("failed to spawn poll worker thread")
        };

        // Budget is measured from the start of the call, not from the
        // first poll.
        let outcome = completion.wait_deadline(start + self.config.at_most());

        // Cleanup runs on every exit path before the outcome is surfaced:
        // suppress future polls, wait out an in-flight one, drop the
        // cancel registration.
        stop.raise();
        let joined = worker.join();
        if let Some((token, id)) = registration {
            token.detach(id);
        }
        if let Err(payload) = joined {
            panic::resume_unwind(payload);
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Outcome::Satisfied => {
                debug!(elapsed_ms, "condition satisfied");
                Ok(())
            }
            Outcome::Failed(failure) => {
                debug!(elapsed_ms, "predicate failure propagated");
                Err(WaitError::Predicate(failure))
            }
            Outcome::Cancelled => {
                debug!(elapsed_ms, "wait cancelled");
                Err(WaitError::Cancelled)
            }
            Outcome::TimedOut => {
                debug!(elapsed_ms, "wait timed out");
                Err(WaitError::Timeout {
                    elapsed_ms,
                    timeout_ms: self.config.at_most().as_millis() as u64,
                })
            }
            Outcome::Panicked(payload) => panic::resume_unwind(payload),
        }
    }
}

impl ConditionWaiter<()> {
    /// [`wait`](Self::wait) for predicates that cannot fail.
    pub fn wait_until<F>(&self, mut predicate: F) -> WaitResult
    where
        F: FnMut() -> bool + Send + 'static,
    {
        self.wait(move || Ok::<bool, Infallible>(predicate()))
    }
}

impl<K: FailureKind> Default for ConditionWaiter<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_defaults_match_config() {
        let waiter: ConditionWaiter = ConditionWaiter::new();
        assert_eq!(waiter.config().poll_delay(), Duration::from_millis(100));
        assert_eq!(waiter.config().poll_interval(), Duration::from_millis(100));
        assert_eq!(waiter.config().at_most(), Duration::from_secs(10));
    }

    #[test]
    fn test_fluent_setters_build_config() {
        let waiter: ConditionWaiter = ConditionWaiter::new()
            .at_most(Duration::from_millis(200))
            .poll_delay(Duration::from_millis(10))
            .poll_interval(Duration::from_millis(20));

        assert_eq!(waiter.config().at_most(), Duration::from_millis(200));
        assert_eq!(waiter.config().poll_delay(), Duration::from_millis(10));
        assert_eq!(waiter.config().poll_interval(), Duration::from_millis(20));
    }

    #[test]
    fn test_wait_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = ConditionWaiter::new()
            .at_most(Duration::from_secs(2))
            .poll_delay(Duration::from_millis(5))
            .poll_interval(Duration::from_millis(5))
            .wait_until(move || calls_clone.fetch_add(1, Ordering::SeqCst) >= 2);

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_waiter_is_reusable() {
        let waiter: ConditionWaiter = ConditionWaiter::new()
            .at_most(Duration::from_millis(500))
            .poll_delay(Duration::from_millis(1))
            .poll_interval(Duration::from_millis(1));

        assert!(waiter.wait_until(|| true).is_ok());
        assert!(waiter.wait_until(|| true).is_ok());
    }
}
