use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// A coupon as persisted in `<data_dir>/<idcoupon>.json`.
///
/// Field names on the wire and on disk follow the legacy format
/// (`idcoupon`, `monay`, `counter`), the Rust names say what they mean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponRecord {
    #[serde(rename = "idcoupon")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "monay", default)]
    pub balance: i64,
    #[serde(rename = "counter", default)]
    pub use_count: u64,
}

impl CouponRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            phone: None,
            balance: 0,
            use_count: 1,
        }
    }

    pub fn with_balance(mut self, balance: i64) -> Self {
        self.balance = balance;
        self
    }

    /// Applies one update: the balance grows by the increment (negative
    /// increments count as zero) and the use count grows by one.
    pub fn apply_increment(&mut self, increment: i64) -> Result<()> {
        let increment = increment.max(0);
        self.balance = self.balance.checked_add(increment).ok_or_else(|| {
            LedgerError::Validation(format!(
                "balance of {} would overflow when adding {}",
                self.id, increment
            ))
        })?;
        self.use_count = self.use_count.saturating_add(1);
        Ok(())
    }
}

/// Body of `POST /add`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCoupon {
    #[serde(rename = "idcoupon", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(rename = "monay", default)]
    pub balance: Option<i64>,
}

/// Body of `POST /update`. Anything besides the id and the increment is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BalanceUpdate {
    #[serde(rename = "idcoupon", default)]
    pub id: Option<String>,
    #[serde(rename = "monay", default)]
    pub increment: Option<i64>,
}

/// Longest id, in bytes, whose `<id>.json` file name fits the common
/// 255-byte file name limit.
pub const MAX_ID_LEN: usize = 250;

/// Checks that `id` can be used as a record key.
///
/// Ids double as file names, so anything that could escape the data
/// directory, collide with temp files (which start with a dot) or exceed the
/// file name limit is refused.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(LedgerError::Validation("coupon id must not be empty".into()));
    }
    if id.len() > MAX_ID_LEN {
        return Err(LedgerError::Validation(format!(
            "coupon id is {} bytes long, the limit is {}",
            id.len(),
            MAX_ID_LEN
        )));
    }
    if id.starts_with('.') {
        return Err(LedgerError::Validation(format!(
            "coupon id must not start with '.': {}",
            id
        )));
    }
    if id.contains(['/', '\\', '\0']) {
        return Err(LedgerError::Validation(format!(
            "coupon id contains a forbidden character: {:?}",
            id
        )));
    }
    Ok(())
}
