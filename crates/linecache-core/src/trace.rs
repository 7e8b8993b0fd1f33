//! Injected observability.
//!
//! The cache never reaches into ambient global state from its hot path;
//! instead it reports events through a [`CacheObserver`] supplied at
//! construction. The default is [`NoopObserver`]. Embedders that want
//! structured logging plug in [`TraceObserver`], which forwards to the
//! `tracing` ecosystem.

use crate::damage::DamageList;

/// Hooks invoked by the cache at its two interesting moments.
///
/// Implementations must be cheap and must not acquire the cache lock;
/// both hooks run while it is held.
pub trait CacheObserver: Send + Sync {
    /// A delta was applied, producing `damage` at `revision`.
    fn delta_applied(&self, revision: u64, damage: &DamageList) {
        let _ = (revision, damage);
    }

    /// A blocking reader finished waiting for missing rows.
    fn reader_waited(&self, timed_out: bool) {
        let _ = timed_out;
    }
}

/// The default observer: does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CacheObserver for NoopObserver {}

/// Observer that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceObserver;

impl CacheObserver for TraceObserver {
    fn delta_applied(&self, revision: u64, damage: &DamageList) {
        tracing::debug!(
            revision,
            damaged_rows = damage.row_count(),
            ranges = damage.ranges().len(),
            "delta applied"
        );
    }

    fn reader_waited(&self, timed_out: bool) {
        if timed_out {
            tracing::debug!("blocking read timed out with rows still missing");
        } else {
            tracing::trace!("blocking read woken by delta");
        }
    }
}
