/*!
 * Error Types and Failure Classification
 *
 * The wait protocol surfaces exactly one terminal outcome to the caller:
 * normal return, timeout, a propagated predicate failure, or cancellation.
 * Predicate failures carry a kind discriminator so the waiter can decide
 * which failures abort the wait and which are tolerated as "condition not
 * yet true".
 */

use std::convert::Infallible;
use std::fmt::Debug;
use thiserror::Error;

/// Kind discriminator for predicate failures.
///
/// Configured ignore sets hold kinds; a raised failure is tolerated when
/// any ignored kind [`subsumes`](FailureKind::subsumes) the raised kind.
/// The default relation is plain equality; taxonomies with super-kinds
/// override it so an ignored super-kind covers all of its sub-kinds.
///
/// ```
/// use condwait::FailureKind;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum StoreFailure {
///     Unavailable,
///     ConnectionRefused,
///     Corrupt,
/// }
///
/// impl FailureKind for StoreFailure {
///     fn subsumes(&self, raised: &Self) -> bool {
///         // Unavailable covers the transient connection failures
///         matches!(
///             (*self, *raised),
///             (StoreFailure::Unavailable, StoreFailure::ConnectionRefused)
///         ) || self == raised
///     }
/// }
/// ```
pub trait FailureKind: Copy + Eq + Debug + Send + Sync + 'static {
    /// Whether an ignored `self` also covers `raised`.
    fn subsumes(&self, raised: &Self) -> bool {
        self == raised
    }
}

impl FailureKind for () {}

/// A predicate failure that can be classified by kind.
pub trait Failure<K: FailureKind> {
    /// Kind discriminator used for ignore matching.
    fn kind(&self) -> K;
}

// Infallible predicates need no classification; the impl is never reached.
impl<K: FailureKind> Failure<K> for Infallible {
    fn kind(&self) -> K {
        match *self {}
    }
}

/// Wait operation errors
#[derive(Error, Debug)]
pub enum WaitError<E> {
    /// The condition never became true within the `at_most` budget.
    #[error("condition not met within {timeout_ms}ms (waited {elapsed_ms}ms)")]
    Timeout { elapsed_ms: u64, timeout_ms: u64 },

    /// An unignored predicate failure, passed through unchanged.
    #[error("condition check failed: {0}")]
    Predicate(#[source] E),

    /// The wait was cancelled externally via a [`CancelToken`](crate::CancelToken).
    #[error("wait was cancelled")]
    Cancelled,
}

impl<E> WaitError<E> {
    /// Check if this is a timeout error
    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is a cancellation error
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Extract the original predicate failure, if that is what ended the wait
    #[inline]
    pub fn into_predicate_error(self) -> Option<E> {
        match self {
            Self::Predicate(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for wait operations
pub type WaitResult<E = Infallible> = Result<(), WaitError<E>>;
