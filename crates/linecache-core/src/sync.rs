//! Writer/reader synchronization over the cache.
//!
//! Two roles share one [`CacheState`]: a writer thread applying deltas
//! from the text engine, and a render thread reading row windows. A single
//! `parking_lot` mutex guards the whole state; [`CacheGuard`] is the
//! scoped view that holds it for its lifetime, so the lock can never be
//! held across an unstructured scope.
//!
//! ## Wake protocol
//!
//! A reader that asks for rows the cache does not have yet flags itself as
//! waiting and parks on a condition variable with a bounded timeout — a
//! responsiveness bound, not a correctness wait. A writer that applies a
//! delta while the flag is set clears it and arms the guard to signal
//! *after* the lock is released; signaling under the lock would wake a
//! waiter only for it to block again on reacquisition. The guard performs
//! that handoff in its destructor, so it happens on every exit path,
//! panics included.
//!
//! The protocol assumes at most one outstanding blocking reader; a second
//! concurrent `blocking_rows` call has unspecified wake fairness. That is
//! a usage constraint on the embedder, not something enforced here.

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut, Range};
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::cache::CacheState;
use crate::damage::DamageList;
use crate::delta::Delta;
use crate::row::Row;
use crate::trace::{CacheObserver, NoopObserver};

/// How long a blocking read parks for missing rows before returning a
/// partial window. Tuned for render responsiveness: long enough for the
/// engine's next delta to land in the common case, short enough that a
/// stalled engine cannot freeze a frame for more than a few frames.
pub const MISSING_ROWS_WAIT: Duration = Duration::from_millis(50);

/// The shared line cache: owns the state, its lock, and the reader waker.
///
/// # Example
///
/// ```rust
/// use linecache_core::{Delta, LineCache, NewRow, Op};
///
/// let cache: LineCache<()> = LineCache::new();
/// let delta = Delta::from_ops(vec![Op::Insert {
///     n: 1,
///     lines: vec![NewRow::numbered("hello", 1)],
/// }]);
/// cache.locked().apply(&delta);
/// assert_eq!(cache.height(), 1);
/// ```
pub struct LineCache<T> {
    state: Mutex<CacheState<T>>,
    waker: Condvar,
    observer: Box<dyn CacheObserver>,
}

impl<T> Default for LineCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LineCache<T> {
    /// Create an empty cache with no observer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_observer(Box::new(NoopObserver))
    }

    /// Create an empty cache that reports events to `observer`.
    #[must_use]
    pub fn with_observer(observer: Box<dyn CacheObserver>) -> Self {
        Self {
            state: Mutex::new(CacheState::new()),
            waker: Condvar::new(),
            observer,
        }
    }

    /// Acquire the lock, returning a view that holds it until dropped.
    pub fn locked(&self) -> CacheGuard<'_, T> {
        CacheGuard {
            state: ManuallyDrop::new(self.state.lock()),
            waker: &self.waker,
            observer: &*self.observer,
            notify_on_release: false,
        }
    }

    /// Current document height. Its own atomic snapshot; not synchronized
    /// with any other accessor call.
    #[must_use]
    pub fn height(&self) -> usize {
        self.locked().height()
    }

    /// Returns true if the document has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locked().is_empty()
    }

    /// Damage for every materialized row carrying a cursor.
    #[must_use]
    pub fn cursor_damage(&self) -> DamageList {
        self.locked().cursor_damage()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for LineCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.state.try_lock() {
            Some(state) => f.debug_struct("LineCache").field("state", &*state).finish(),
            None => f
                .debug_struct("LineCache")
                .field("state", &"<locked>")
                .finish(),
        }
    }
}

/// Scoped, synchronized view of the cache.
///
/// Dereferences to [`CacheState`], so every read and mutation is available
/// while the lock is held. [`CacheGuard::apply`] and
/// [`CacheGuard::blocking_rows`] layer the wake protocol on top.
pub struct CacheGuard<'a, T> {
    state: ManuallyDrop<MutexGuard<'a, CacheState<T>>>,
    waker: &'a Condvar,
    observer: &'a dyn CacheObserver,
    notify_on_release: bool,
}

impl<T> CacheGuard<'_, T> {
    /// Apply a delta, waking a blocked reader once the lock is released.
    pub fn apply(&mut self, delta: &Delta) -> DamageList {
        if self.state.waiting_reader {
            // Hand the wake off to the destructor: the waiter needs the
            // lock to re-read, so the signal must follow the unlock.
            self.state.waiting_reader = false;
            self.notify_on_release = true;
        }
        let damage = self.state.apply(delta);
        self.observer.delta_applied(self.state.revision(), &damage);
        damage
    }

    /// Read the rows in `range`, waiting briefly if any are missing.
    ///
    /// If every row is present, returns immediately. Otherwise parks on
    /// the waker (releasing the lock) for at most [`MISSING_ROWS_WAIT`],
    /// reacquires, and re-reads the same range once. The result may still
    /// contain gaps; callers must tolerate `None` entries.
    pub fn blocking_rows(&mut self, range: Range<usize>) -> Vec<Option<Row<T>>>
    where
        T: Clone,
    {
        let missing = range.clone().any(|ix| self.state.row(ix).is_none());
        if missing {
            self.state.waiting_reader = true;
            let timed_out = self
                .waker
                .wait_for(&mut self.state, MISSING_ROWS_WAIT)
                .timed_out();
            if timed_out && self.state.waiting_reader {
                // No writer observed us; withdraw the flag ourselves and
                // return whatever is available.
                self.state.waiting_reader = false;
            }
            // A timeout with the flag already cleared means a writer saw
            // us and its wake raced our timeout. The condition variable
            // holds no pending token, so there is nothing to drain.
            self.observer.reader_waited(timed_out);
        }
        range.map(|ix| self.state.row(ix).cloned()).collect()
    }
}

impl<T> Deref for CacheGuard<'_, T> {
    type Target = CacheState<T>;

    fn deref(&self) -> &CacheState<T> {
        &**self.state
    }
}

impl<T> DerefMut for CacheGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut CacheState<T> {
        &mut **self.state
    }
}

impl<T> Drop for CacheGuard<'_, T> {
    fn drop(&mut self) {
        // Safety: `state` is never touched again; this is the only place
        // the guard is dropped.
        unsafe { ManuallyDrop::drop(&mut self.state) };
        if self.notify_on_release {
            self.waker.notify_one();
        }
    }
}
