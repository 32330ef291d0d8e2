use crate::commands::{require_id, CmdResult};
use crate::error::Result;
use crate::store::RecordStore;

pub fn run<S: RecordStore + ?Sized>(store: &S, id: Option<String>) -> Result<CmdResult> {
    let id = require_id(id)?;
    let record = store.get(&id)?;
    Ok(CmdResult::default().with_affected_records(vec![record]))
}
