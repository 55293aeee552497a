/*!
 * One-Shot Completion Cell
 *
 * Synchronization point between the caller of a wait and its poll worker.
 *
 * # Design: Locked Check-and-Set for Complete-Once Semantics
 *
 * The cell holds a three-state slot (pending / resolved / consumed) behind
 * a `parking_lot::Mutex` paired with a `Condvar`. The first `complete`
 * wins; later signals are no-ops. The blocking side resolves its deadline
 * inside the same critical section that checks for a signaled outcome, so
 * a late success and the deadline can never both take effect.
 */

use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

/// Terminal outcome of a single wait
pub(crate) enum Outcome<E> {
    /// The predicate returned true
    Satisfied,
    /// The predicate raised an unignored failure
    Failed(E),
    /// The wait was cancelled externally
    Cancelled,
    /// The budget elapsed with no signal (installed by the blocking side)
    TimedOut,
    /// The predicate panicked; payload is re-raised on the caller
    Panicked(Box<dyn Any + Send>),
}

enum State<E> {
    Pending,
    Resolved(Outcome<E>),
    Consumed,
}

/// One-shot outcome cell shared between caller and poll worker
pub(crate) struct Completion<E> {
    state: Mutex<State<E>>,
    signal: Condvar,
}

impl<E> Completion<E> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Pending),
            signal: Condvar::new(),
        }
    }

    /// Signal a terminal outcome. First signal wins; returns false if the
    /// cell was already resolved or consumed.
    pub fn complete(&self, outcome: Outcome<E>) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, State::Pending) {
            return false;
        }
        *state = State::Resolved(outcome);
        self.signal.notify_all();
        true
    }

    /// Block until an outcome is signaled or `deadline` passes.
    ///
    /// On deadline the cell is consumed in the same critical section that
    /// checks for an earlier signal, so exactly one outcome wins even when
    /// success and timeout race.
    pub fn wait_deadline(&self, deadline: Instant) -> Outcome<E> {
        let mut state = self.state.lock();

        loop {
            if matches!(*state, State::Resolved(_)) {
                break;
            }
            if self.signal.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }

        match std::mem::replace(&mut *state, State::Consumed) {
            State::Resolved(outcome) => outcome,
            // Deadline elapsed while still pending; consuming the cell
            // turns any late worker signal into a no-op.
            _ => Outcome::TimedOut,
        }
    }
}

/// Type-erased view of a completion cell, for cancellation.
pub(crate) trait CancelTarget: Send + Sync {
    /// Resolve the attached wait as cancelled; false if already resolved.
    fn cancel(&self) -> bool;
}

impl<E: Send + 'static> CancelTarget for Completion<E> {
    fn cancel(&self) -> bool {
        self.complete(Outcome::Cancelled)
    }
}

/// Cancels blocked waits from another thread
///
/// A token is created independently of any wait and handed to a waiter via
/// [`ConditionWaiter::cancel_token`](crate::ConditionWaiter::cancel_token).
/// Cancellation is remembered: a wait attached after [`cancel`](Self::cancel)
/// was called resolves immediately.
///
/// Cloning is cheap; clones share the same cancellation state.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

#[derive(Default)]
struct TokenInner {
    cancelled: AtomicBool,
    next_id: AtomicU64,
    targets: Mutex<Vec<(u64, Weak<dyn CancelTarget>)>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel all attached waits, and any wait attached later.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let targets = std::mem::take(&mut *self.inner.targets.lock());
        for (_, target) in targets {
            if let Some(target) = target.upgrade() {
                target.cancel();
            }
        }
    }

    /// Whether `cancel` has been called on this token (or a clone of it)
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Register a live wait's completion cell; returns a registration id
    /// for [`detach`](Self::detach). A pre-cancelled token resolves the
    /// cell immediately.
    pub(crate) fn attach(&self, target: Weak<dyn CancelTarget>) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut targets = self.inner.targets.lock();
            targets.retain(|(_, t)| t.strong_count() > 0);
            targets.push((id, target.clone()));
        }
        if self.is_cancelled() {
            if let Some(target) = target.upgrade() {
                target.cancel();
            }
        }
        id
    }

    /// Remove a registration made by [`attach`](Self::attach).
    pub(crate) fn detach(&self, id: u64) {
        self.inner.targets.lock().retain(|(tid, _)| *tid != id);
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
