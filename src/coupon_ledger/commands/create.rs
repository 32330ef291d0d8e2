use crate::commands::{reject_probe_id, require_id, CmdMessage, CmdResult};
use crate::error::{LedgerError, Result};
use crate::model::{CouponRecord, NewCoupon};
use crate::store::RecordStore;

pub fn run<S: RecordStore + ?Sized>(store: &S, payload: NewCoupon) -> Result<CmdResult> {
    let id = require_id(payload.id)?;
    reject_probe_id(&id)?;

    let balance = payload.balance.unwrap_or(0);
    if balance < 0 {
        return Err(LedgerError::Validation(format!(
            "initial monay must not be negative, got {}",
            balance
        )));
    }

    let record = CouponRecord {
        id,
        name: payload.name.filter(|s| !s.is_empty()),
        phone: payload.phone.filter(|s| !s.is_empty()),
        balance,
        use_count: 1,
    };
    let stored = store.create(&record)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Coupon created: {}", stored.id)));
    Ok(result.with_affected_records(vec![stored]))
}
