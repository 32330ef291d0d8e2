use super::{DoctorReport, RecordStore};
use crate::error::{LedgerError, Result};
use crate::model::{validate_id, CouponRecord};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// In-memory storage for testing and development.
/// Does NOT persist data.
///
/// Each operation is a single map access under one mutex, which is plenty
/// for tests but is not the per-id locking [`super::fs::FileStore`] does.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<String, CouponRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for InMemoryStore {
    fn create(&self, record: &CouponRecord) -> Result<CouponRecord> {
        validate_id(&record.id)?;
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        if records.contains_key(&record.id) {
            return Err(LedgerError::AlreadyExists(record.id.clone()));
        }
        let stored = CouponRecord {
            use_count: 1,
            ..record.clone()
        };
        records.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    fn get(&self, id: &str) -> Result<CouponRecord> {
        validate_id(id)?;
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    fn update(&self, id: &str, increment: i64) -> Result<CouponRecord> {
        validate_id(id)?;
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let current = records
            .get(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        // Work on a copy so a failed increment leaves the stored record alone.
        let mut next = current.clone();
        next.apply_increment(increment)?;
        records.insert(id.to_string(), next.clone());
        Ok(next)
    }

    fn doctor(&self) -> Result<DoctorReport> {
        Ok(DoctorReport::default())
    }
}

// --- Test Fixtures ---
