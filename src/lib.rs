/*!
 * condwait
 *
 * Blocking condition-polling primitive: poll a user-supplied predicate on
 * a fixed schedule until it returns true, a timeout elapses, or the
 * predicate raises an unignored failure. Used in tests and
 * synchronization code to wait for asynchronous conditions without manual
 * sleep/retry loops.
 *
 * # Architecture
 *
 * One component, [`ConditionWaiter`], closing over two mechanisms:
 * - a one-shot completion cell with complete-once semantics, which the
 *   caller blocks on with a deadline,
 * - a dedicated poll worker running a fixed-delay loop (the next poll is
 *   scheduled after the previous one *completes*, so polls never overlap).
 *
 * Every exit path stops and joins the worker before returning — no leaked
 * background activity.
 *
 * # Example
 *
 * ```
 * use condwait::{ConditionWaiter, Failure, FailureKind, WaitError};
 * use std::time::Duration;
 *
 * #[derive(Debug, Clone, Copy, PartialEq, Eq)]
 * enum StoreFailure {
 *     Unavailable,
 *     Corrupt,
 * }
 *
 * impl FailureKind for StoreFailure {}
 *
 * #[derive(Debug)]
 * struct StoreError(StoreFailure);
 *
 * impl Failure<StoreFailure> for StoreError {
 *     fn kind(&self) -> StoreFailure {
 *         self.0
 *     }
 * }
 *
 * // Tolerate the store being unavailable while it warms up; anything
 * // else aborts the wait immediately.
 * let result = ConditionWaiter::new()
 *     .at_most(Duration::from_millis(100))
 *     .poll_delay(Duration::from_millis(5))
 *     .poll_interval(Duration::from_millis(5))
 *     .ignored_failures([StoreFailure::Unavailable])
 *     .wait(|| Err::<bool, _>(StoreError(StoreFailure::Unavailable)));
 *
 * assert!(matches!(result, Err(WaitError::Timeout { .. })));
 * ```
 */

mod completion;
mod config;
mod error;
mod poller;
mod waiter;

// Re-export public API
pub use completion::CancelToken;
pub use config::{WaitConfig, DEFAULT_AT_MOST, DEFAULT_POLL_DELAY, DEFAULT_POLL_INTERVAL};
pub use error::{Failure, FailureKind, WaitError, WaitResult};
pub use waiter::ConditionWaiter;
