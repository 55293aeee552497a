/*!
 * Wait Configuration
 *
 * Immutable-once-built schedule and failure-tolerance policy for a single
 * wait. Built via value-consuming `with_*` setters so a shared waiter can
 * never be mutated underneath a concurrent call site; the config is read
 * only for the duration of a wait and may be reused for later waits.
 */

use crate::error::FailureKind;
use std::time::Duration;

/// Default time between the end of one poll and the start of the next: 100ms
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default time before the first poll: 100ms
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(100);

/// Default total wall-clock budget for a wait: 10s
pub const DEFAULT_AT_MOST: Duration = Duration::from_secs(10);

/// Wait schedule and ignored-failure policy
///
/// Durations carry their own magnitude and unit via the
/// [`Duration`] constructors; comparisons and error reporting normalize to
/// milliseconds.
///
/// Note: a budget shorter than the poll delay is honored as written — the
/// wait times out before the first poll ever runs.
#[derive(Debug, Clone)]
pub struct WaitConfig<K = ()>
where
    K: FailureKind,
{
    poll_interval: Duration,
    poll_delay: Duration,
    at_most: Duration,
    ignored_failures: Vec<K>,
}

impl<K: FailureKind> WaitConfig<K> {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_delay: DEFAULT_POLL_DELAY,
            at_most: DEFAULT_AT_MOST,
            ignored_failures: Vec::new(),
        }
    }

    /// Set the time between the end of one poll and the start of the next
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the time before the first poll
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    /// Set the total wall-clock budget for the wait
    pub fn with_at_most(mut self, budget: Duration) -> Self {
        self.at_most = budget;
        self
    }

    /// Set the failure kinds treated as "condition not yet true"
    pub fn with_ignored_failures(mut self, kinds: impl IntoIterator<Item = K>) -> Self {
        self.ignored_failures = kinds.into_iter().collect();
        self
    }

    /// Time between the end of one poll and the start of the next
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Time before the first poll
    #[inline]
    pub fn poll_delay(&self) -> Duration {
        self.poll_delay
    }

    /// Total wall-clock budget for the wait
    #[inline]
    pub fn at_most(&self) -> Duration {
        self.at_most
    }

    /// Failure kinds tolerated as a negative poll result
    #[inline]
    pub fn ignored_failures(&self) -> &[K] {
        &self.ignored_failures
    }

    /// Whether a raised failure kind is covered by the ignored set
    pub(crate) fn is_ignored(&self, raised: &K) -> bool {
        self.ignored_failures.iter().any(|kind| kind.subsumes(raised))
    }
}

impl<K: FailureKind> Default for WaitConfig<K> {
    fn default() -> Self {
        Self::new()
    }
}
