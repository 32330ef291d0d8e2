//! # Storage Layer
//!
//! The [`RecordStore`] trait is the only way coupon records are created, read
//! or changed. Everything above it (commands, the API facade, HTTP) holds a
//! shared reference and never touches the data directory itself.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: production storage, one JSON file per coupon
//! - [`memory::InMemoryStore`]: non-persistent store for tests
//!
//! ## Consistency
//!
//! Implementations must be `Send + Sync` and honour these rules under any
//! amount of concurrent callers:
//!
//! - `create` is a single check-and-insert per id: of two racing creates for
//!   the same id, exactly one succeeds.
//! - `update` is a single read-modify-write per id: concurrent updates are
//!   all reflected, none is lost.
//! - operations on different ids do not wait on each other.
//! - a reader sees either the previous complete record or the new complete
//!   record, never something in between.
//!
//! ## Storage Format
//!
//! For `FileStore`:
//! ```text
//! DataJson/
//! ├── C1.json                      # {"idcoupon": "C1", "monay": 50, "counter": 2}
//! ├── C2.json
//! └── .C2.json.<uuid>.tmp          # in-flight write, renamed over C2.json when complete
//! ```

use crate::error::Result;
use crate::model::CouponRecord;

pub mod fs;
pub mod locks;
pub mod memory;

/// Report from the `doctor` operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    /// Temp files left behind by writes that never got promoted.
    pub removed_temp_files: usize,
    /// Record files that exist but do not parse.
    pub unreadable_records: Vec<String>,
}

pub trait RecordStore: Send + Sync {
    /// Persist a brand-new record. Fails with `AlreadyExists` if the id is taken.
    /// The stored use count is always 1, whatever the caller passed.
    fn create(&self, record: &CouponRecord) -> Result<CouponRecord>;

    /// Snapshot of the stored record, or `NotFound`.
    fn get(&self, id: &str) -> Result<CouponRecord>;

    /// Add `max(increment, 0)` to the balance and bump the use count by one.
    /// Returns the record as stored after the change.
    fn update(&self, id: &str, increment: i64) -> Result<CouponRecord>;

    /// Verify and clean up the backing storage.
    fn doctor(&self) -> Result<DoctorReport>;
}
