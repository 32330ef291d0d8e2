use super::locks::KeyLocks;
use super::{DoctorReport, RecordStore};
use crate::error::{LedgerError, Result};
use crate::model::{validate_id, CouponRecord};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

const RECORD_EXT: &str = ".json";
const TMP_EXT: &str = ".tmp";

/// File-backed store: `<root>/<id>.json` per coupon.
///
/// Every read and write for an id runs under that id's lock from
/// [`KeyLocks`]. Writes go to a dot-prefixed temp file in the same directory,
/// are fsynced, and then renamed over the record file, so a record file is
/// always either the old complete version or the new one.
///
/// Temp names are `.{uuid}.tmp`, independent of the id, so any id whose
/// record file name fits the filesystem can also be written. A temp file
/// lives only while its writer holds a read guard on `sweep`; the doctor
/// takes the write guard before removing temp files.
pub struct FileStore {
    root: PathBuf,
    locks: KeyLocks,
    sweep: RwLock<()>,
    #[cfg(test)]
    fail_before_promote: std::sync::atomic::AtomicBool,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: KeyLocks::new(),
            sweep: RwLock::new(()),
            #[cfg(test)]
            fail_before_promote: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Like [`FileStore::new`], creating the data directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(root);
        fs::create_dir_all(&store.root)?;
        Ok(store)
    }

    pub fn record_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}{}", id, RECORD_EXT))
    }

    fn read_record(&self, id: &str) -> Result<Option<CouponRecord>> {
        let bytes = match fs::read(self.record_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record = serde_json::from_slice(&bytes)?;
        Ok(Some(record))
    }

    fn write_record(&self, record: &CouponRecord) -> Result<()> {
        let target = self.record_path(&record.id);
        let content = serde_json::to_vec_pretty(record)?;

        let _in_flight = self.sweep.read().unwrap_or_else(PoisonError::into_inner);
        let tmp = self.root.join(format!(".{}{}", Uuid::new_v4(), TMP_EXT));
        if let Err(e) = write_synced(&tmp, &content) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!(id = %record.id, tmp = %tmp.display(), "wrote temp record");

        #[cfg(test)]
        if self
            .fail_before_promote
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            // Leave the temp file in place, as a crash at this point would.
            return Err(io::Error::other("simulated crash before promote").into());
        }

        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        sync_dir(&self.root);
        debug!(id = %record.id, path = %target.display(), "promoted record");
        Ok(())
    }
}

impl RecordStore for FileStore {
    fn create(&self, record: &CouponRecord) -> Result<CouponRecord> {
        validate_id(&record.id)?;
        self.locks.with_lock(&record.id, || {
            if self.record_path(&record.id).try_exists()? {
                return Err(LedgerError::AlreadyExists(record.id.clone()));
            }
            let stored = CouponRecord {
                use_count: 1,
                ..record.clone()
            };
            self.write_record(&stored)?;
            Ok(stored)
        })
    }

    fn get(&self, id: &str) -> Result<CouponRecord> {
        validate_id(id)?;
        self.locks.with_lock(id, || {
            self.read_record(id)?
                .ok_or_else(|| LedgerError::NotFound(id.to_string()))
        })
    }

    fn update(&self, id: &str, increment: i64) -> Result<CouponRecord> {
        validate_id(id)?;
        self.locks.with_lock(id, || {
            let mut record = self
                .read_record(id)?
                .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
            record.apply_increment(increment)?;
            self.write_record(&record)?;
            Ok(record)
        })
    }

    fn doctor(&self) -> Result<DoctorReport> {
        let mut report = DoctorReport::default();
        if !self.root.exists() {
            return Ok(report);
        }

        // Writers take a per-id lock before a read guard on `sweep`, so the
        // sweep guard is dropped before any per-id lock is taken below.
        let mut records = Vec::new();
        {
            let _sweep = self.sweep.write().unwrap_or_else(PoisonError::into_inner);
            for entry in fs::read_dir(&self.root)? {
                let entry = entry?;
                if !entry.file_type()?.is_file() {
                    continue;
                }
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };

                if is_temp_file(&name) {
                    match fs::remove_file(entry.path()) {
                        Ok(()) => {
                            debug!(file = %name, "removed stale temp file");
                            report.removed_temp_files += 1;
                        }
                        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                        Err(e) => return Err(e.into()),
                    }
                } else if name.ends_with(RECORD_EXT) {
                    records.push(name);
                }
            }
        }

        for name in records {
            let Some(id) = name.strip_suffix(RECORD_EXT) else {
                continue;
            };
            if validate_id(id).is_err() {
                continue;
            }
            if let Err(e) = self.locks.with_lock(id, || self.read_record(id)) {
                warn!(file = %name, error = %e, "unreadable record file");
                report.unreadable_records.push(name);
            }
        }

        report.unreadable_records.sort();
        Ok(report)
    }
}

// Ids never start with a dot, so a dot-prefixed `.tmp` file is never a record.
fn is_temp_file(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TMP_EXT) && name.len() > 1 + TMP_EXT.len()
}

fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}

// Makes the rename itself durable. Best effort: some platforms cannot open
// or sync a directory handle.
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
    #[cfg(not(unix))]
    let _ = dir;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::MAX_ID_LEN;
    use std::sync::atomic::Ordering;
    use std::thread;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        (dir, store)
    }

    fn leftover_temp_files(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(TMP_EXT))
            .collect()
    }

    #[test]
    fn create_writes_one_file_named_after_the_id() {
        let (dir, store) = setup();
        store
            .create(&CouponRecord::new("C1").with_balance(0))
            .unwrap();

        let on_disk = fs::read_to_string(dir.path().join("C1.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&on_disk).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"idcoupon": "C1", "monay": 0, "counter": 1})
        );
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[test]
    fn create_forces_use_count_to_one() {
        let (_dir, store) = setup();
        let mut record = CouponRecord::new("C1");
        record.use_count = 7;
        let stored = store.create(&record).unwrap();
        assert_eq!(stored.use_count, 1);
        assert_eq!(store.get("C1").unwrap().use_count, 1);
    }

    #[test]
    fn second_create_is_rejected_and_keeps_the_first() {
        let (_dir, store) = setup();
        store.create(&CouponRecord::new("C1").with_balance(10)).unwrap();

        let err = store
            .create(&CouponRecord::new("C1").with_balance(999))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(store.get("C1").unwrap().balance, 10);
    }

    #[test]
    fn update_on_missing_id_creates_nothing() {
        let (dir, store) = setup();
        let err = store.update("ghost", 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!dir.path().join("ghost.json").exists());
    }

    #[test]
    fn path_like_ids_never_reach_the_filesystem() {
        let (dir, store) = setup();
        let err = store.create(&CouponRecord::new("../escape")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!dir.path().parent().unwrap().join("escape.json").exists());
    }

    #[test]
    fn failed_promote_keeps_previous_record() {
        let (dir, store) = setup();
        store.create(&CouponRecord::new("C1").with_balance(50)).unwrap();

        store.fail_before_promote.store(true, Ordering::SeqCst);
        let err = store.update("C1", 25).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
        store.fail_before_promote.store(false, Ordering::SeqCst);

        let record = store.get("C1").unwrap();
        assert_eq!(record.balance, 50);
        assert_eq!(record.use_count, 1);
        assert_eq!(leftover_temp_files(dir.path()).len(), 1);

        let report = store.doctor().unwrap();
        assert_eq!(report.removed_temp_files, 1);
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[test]
    fn failed_first_write_leaves_no_record() {
        let (_dir, store) = setup();
        store.fail_before_promote.store(true, Ordering::SeqCst);
        assert!(store.create(&CouponRecord::new("C1")).is_err());
        store.fail_before_promote.store(false, Ordering::SeqCst);

        assert_eq!(store.get("C1").unwrap_err().kind(), ErrorKind::NotFound);
        // The id is free again once the interrupted write is gone.
        store.create(&CouponRecord::new("C1")).unwrap();
    }

    #[test]
    fn corrupt_record_is_a_storage_failure() {
        let (dir, store) = setup();
        fs::write(dir.path().join("C1.json"), "{\"idcoupon\": \"C1\", \"mon").unwrap();

        assert_eq!(store.get("C1").unwrap_err().kind(), ErrorKind::StorageFailure);
        assert_eq!(
            store.update("C1", 1).unwrap_err().kind(),
            ErrorKind::StorageFailure
        );

        let report = store.doctor().unwrap();
        assert_eq!(report.unreadable_records, vec!["C1.json".to_string()]);
    }

    #[test]
    fn doctor_ignores_healthy_and_foreign_files() {
        let (dir, store) = setup();
        store.create(&CouponRecord::new("C1")).unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::create_dir(dir.path().join("sub.json")).unwrap();

        let report = store.doctor().unwrap();
        assert_eq!(report, DoctorReport::default());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn doctor_on_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("not-there"));
        assert_eq!(store.doctor().unwrap(), DoctorReport::default());
    }

    #[test]
    fn open_creates_the_data_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested").join("DataJson");
        let store = FileStore::open(&root).unwrap();
        assert!(root.is_dir());
        store.create(&CouponRecord::new("C1")).unwrap();
        assert!(root.join("C1.json").exists());
    }

    #[test]
    fn temp_files_are_recognised_by_name() {
        assert!(is_temp_file(".0b6e2f44-6d1c-4c0e-9a0a-3f1d8a9b2c11.tmp"));
        assert!(is_temp_file(".C1.json.abc.tmp"));
        assert!(!is_temp_file("C1.json"));
        assert!(!is_temp_file("C1.tmp"));
        assert!(!is_temp_file(".tmp"));
    }

    #[test]
    fn longest_allowed_id_can_be_created_and_updated() {
        let (dir, store) = setup();
        let id = "X".repeat(MAX_ID_LEN);
        store.create(&CouponRecord::new(id.as_str()).with_balance(1)).unwrap();
        let record = store.update(&id, 2).unwrap();
        assert_eq!((record.balance, record.use_count), (3, 2));
        assert!(dir.path().join(format!("{}.json", id)).exists());
        assert!(leftover_temp_files(dir.path()).is_empty());

        let mid = "Y".repeat(220);
        store.create(&CouponRecord::new(mid.as_str())).unwrap();
        assert_eq!(store.get(&mid).unwrap().use_count, 1);
    }

    #[test]
    fn id_too_long_for_a_file_name_is_a_validation_error() {
        let (dir, store) = setup();
        let id = "X".repeat(MAX_ID_LEN + 1);
        let err = store.create(&CouponRecord::new(id.as_str())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn doctor_sweeps_while_writes_continue() {
        let (_dir, store) = setup();
        store.create(&CouponRecord::new("C1")).unwrap();

        thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..100 {
                    store.update("C1", 1).unwrap();
                }
            });
            for _ in 0..20 {
                let report = store.doctor().unwrap();
                assert!(report.unreadable_records.is_empty());
            }
        });

        assert_eq!(store.get("C1").unwrap().use_count, 101);
    }
}
