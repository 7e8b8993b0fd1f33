//! Concurrent, windowed line cache.
//!
//! `linecache-core` mirrors a remotely maintained text document by
//! replaying the incremental update deltas an authoritative text engine
//! sends, and answers a renderer's row queries. Parts of the document may
//! be deliberately unmaterialized (outside the engine's retained window);
//! the cache tracks them as invalid-row counts so indices and heights stay
//! honest, reports exactly which rows went stale after each delta, and
//! lets a render thread briefly block for rows that have not arrived yet.
//!
//! ## Architecture
//!
//! - [`damage::DamageList`] — ordered, coalesced damaged-row ranges.
//! - [`row::Row`] — one materialized line, generic over a consumer-owned
//!   association payload.
//! - [`delta`] — the wire vocabulary (`invalidate`/`ins`/`copy`/`update`/
//!   `skip`) and its JSON codec.
//! - [`cache::CacheState`] — three-zone storage and the single-pass delta
//!   replay algorithm.
//! - [`sync::LineCache`] / [`sync::CacheGuard`] — the shared façade, its
//!   mutex-scoped view, and the writer-to-reader wake protocol.
//! - [`trace::CacheObserver`] — injected observability, no-op by default.
//!
//! ## Threading
//!
//! One writer (delta application) and one primary render reader, each on
//! its own thread, share the cache through [`sync::LineCache`]. Every
//! operation runs under one mutex; the only suspension point is
//! [`sync::CacheGuard::blocking_rows`], bounded by
//! [`sync::MISSING_ROWS_WAIT`].

#![warn(missing_docs)]

pub mod cache;
pub mod damage;
pub mod delta;
pub mod row;
pub mod sync;
pub mod trace;

pub use cache::CacheState;
pub use damage::{DamageList, DamageRange};
pub use delta::{Annotation, Delta, DeltaError, NewRow, Op, RowPatch};
pub use row::{CursorColumns, Row, StyleSpan};
pub use sync::{CacheGuard, LineCache, MISSING_ROWS_WAIT};
pub use trace::{CacheObserver, NoopObserver, TraceObserver};
