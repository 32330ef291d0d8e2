use crate::commands::{reject_probe_id, require_id, CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::BalanceUpdate;
use crate::store::RecordStore;

pub fn run<S: RecordStore + ?Sized>(store: &S, payload: BalanceUpdate) -> Result<CmdResult> {
    let id = require_id(payload.id)?;
    reject_probe_id(&id)?;

    let record = store.update(&id, payload.increment.unwrap_or(0))?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Coupon updated: {} (monay {}, counter {})",
        record.id, record.balance, record.use_count
    )));
    Ok(result.with_affected_records(vec![record]))
}
