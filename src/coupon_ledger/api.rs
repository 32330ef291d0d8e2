//! # API Facade
//!
//! A thin facade over the command layer and the single entry point for every
//! ledger operation, whatever transport sits in front of it (HTTP server, CLI).
//!
//! The facade dispatches to `commands/*.rs` and returns their structured
//! results. It holds no business logic and does no I/O of its own.
//!
//! `LedgerApi<S: RecordStore>` is generic over the storage backend:
//! - Production: `LedgerApi<FileStore>`
//! - Testing: `LedgerApi<InMemoryStore>`
//!
//! The store sits behind an `Arc`, so a `LedgerApi` is cheap to clone and can
//! be handed to every request handler and blocking worker.

use crate::commands;
use crate::error::Result;
use crate::model::{BalanceUpdate, NewCoupon};
use crate::store::RecordStore;
use std::sync::Arc;

pub struct LedgerApi<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> Clone for LedgerApi<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RecordStore> LedgerApi<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn create_coupon(&self, payload: NewCoupon) -> Result<commands::CmdResult> {
        commands::create::run(self.store.as_ref(), payload)
    }

    pub fn get_coupon(&self, id: Option<String>) -> Result<commands::CmdResult> {
        commands::get::run(self.store.as_ref(), id)
    }

    pub fn update_coupon(&self, payload: BalanceUpdate) -> Result<commands::CmdResult> {
        commands::update::run(self.store.as_ref(), payload)
    }

    pub fn doctor(&self) -> Result<commands::CmdResult> {
        commands::doctor::run(self.store.as_ref())
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

pub use commands::{CmdMessage, CmdResult, MessageLevel, LIVENESS_PROBE_ID};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::memory::InMemoryStore;

    #[test]
    fn clones_share_one_store() {
        let api = LedgerApi::new(InMemoryStore::new());
        let other = api.clone();

        api.create_coupon(NewCoupon {
            id: Some("C1".into()),
            ..NewCoupon::default()
        })
        .unwrap();
        other
            .update_coupon(BalanceUpdate {
                id: Some("C1".into()),
                increment: Some(5),
            })
            .unwrap();

        let record = &api.get_coupon(Some("C1".into())).unwrap().affected_records[0];
        assert_eq!((record.balance, record.use_count), (5, 2));
        assert_eq!(other.store().len(), 1);
    }

    #[test]
    fn dispatches_errors_unchanged() {
        let api = LedgerApi::new(InMemoryStore::new());
        let err = api.get_coupon(Some("nope".into())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
