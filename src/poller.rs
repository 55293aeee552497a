/*!
 * Fixed-Delay Poll Worker
 *
 * The scheduling half of a wait: a loop that sleeps `poll_delay` before
 * the first predicate evaluation, then `poll_interval` measured from the
 * *end* of each evaluation, so invocations are totally ordered and can
 * never overlap. The sleeps are interruptible by the stop signal, which
 * keeps teardown from waiting out a pending interval; only an in-flight
 * evaluation is ever waited for.
 */

use crate::completion::{Completion, Outcome};
use crate::config::WaitConfig;
use crate::error::{Failure, FailureKind};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::trace;

/// Cooperative stop flag with an interruptible sleep
pub(crate) struct StopSignal {
    stopped: Mutex<bool>,
    signal: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            signal: Condvar::new(),
        }
    }

    /// Request the worker stop; wakes a sleeping worker immediately.
    pub fn raise(&self) {
        let mut stopped = self.stopped.lock();
        *stopped = true;
        self.signal.notify_all();
    }

    /// Sleep for `delay` unless the stop is raised first.
    ///
    /// Returns true if the stop was raised.
    pub fn wait_for(&self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.signal.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

/// Poll loop body, run on the dedicated worker thread.
///
/// Exits after signaling a terminal outcome or when the stop is raised.
pub(crate) fn run_poller<K, F, E>(
    config: &WaitConfig<K>,
    stop: &StopSignal,
    completion: &Completion<E>,
    mut predicate: F,
) where
    K: FailureKind,
    F: FnMut() -> Result<bool, E>,
    E: Failure<K>,
{
    let mut delay = config.poll_delay();
    let mut polls: u64 = 0;

    loop {
        if stop.wait_for(delay) {
            return;
        }

        polls += 1;
        match panic::catch_unwind(AssertUnwindSafe(|| predicate())) {
            Ok(Ok(true)) => {
                trace!(polls, "condition satisfied");
                completion.complete(Outcome::Satisfied);
                return;
            }
            Ok(Ok(false)) => {
                trace!(polls, "condition not yet true");
            }
            Ok(Err(failure)) => {
                if config.is_ignored(&failure.kind()) {
                    trace!(polls, kind = ?failure.kind(), "ignored failure, treating condition as unmet");
                } else {
                    completion.complete(Outcome::Failed(failure));
                    return;
                }
            }
            Err(payload) => {
                completion.complete(Outcome::Panicked(payload));
                return;
            }
        }

        delay = config.poll_interval();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_stop_signal_interrupts_sleep() {
        let stop = Arc::new(StopSignal::new());
        let stop_clone = stop.clone();

        let handle = thread::spawn(move || {
            let start = Instant::now();
            let raised = stop_clone.wait_for(Duration::from_secs(5));
            (raised, start.elapsed())
        });

        thread::sleep(Duration::from_millis(50));
        stop.raise();

        let (raised, elapsed) = handle.join().unwrap();
        assert!(raised);
        assert!(elapsed < Duration::from_secs(1));
    }

    #[test]
    fn test_stop_signal_sleep_runs_to_completion() {
        let stop = StopSignal::new();
        let start = Instant::now();

        assert!(!stop.wait_for(Duration::from_millis(50)));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_raised_signal_returns_immediately() {
        let stop = StopSignal::new();
        stop.raise();

        let start = Instant::now();
        assert!(stop.wait_for(Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_poller_signals_on_true() {
        let config: WaitConfig = WaitConfig::new()
            .with_poll_delay(Duration::from_millis(1))
            .with_poll_interval(Duration::from_millis(1));
        let stop = StopSignal::new();
        let completion: Completion<std::convert::Infallible> = Completion::new();
        let calls = AtomicU32::new(0);

        run_poller(&config, &stop, &completion, || {
            Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2)
        });

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            completion.wait_deadline(Instant::now()),
            Outcome::Satisfied
        ));
    }

    #[test]
    fn test_poller_stops_without_signal_when_raised() {
        let config: WaitConfig = WaitConfig::new().with_poll_delay(Duration::from_millis(5));
        let stop = StopSignal::new();
        stop.raise();
        let completion: Completion<std::convert::Infallible> = Completion::new();

        run_poller(&config, &stop, &completion, || Ok(true));

        // Stop was raised before the first poll; nothing was signaled
        assert!(matches!(
            completion.wait_deadline(Instant::now()),
            Outcome::TimedOut
        ));
    }
}
