use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::{DoctorReport, RecordStore};

pub fn run<S: RecordStore + ?Sized>(store: &S) -> Result<CmdResult> {
    let report = store.doctor()?;
    Ok(report_to_result(&report))
}

fn report_to_result(report: &DoctorReport) -> CmdResult {
    let mut result = CmdResult::default();

    if report.removed_temp_files > 0 {
        result.add_message(CmdMessage::success(format!(
            "Removed {} stale temp file(s) left by interrupted writes",
            report.removed_temp_files
        )));
    }
    for file in &report.unreadable_records {
        result.add_message(CmdMessage::warning(format!(
            "Record file does not parse: {}",
            file
        )));
    }
    if result.messages.is_empty() {
        result.add_message(CmdMessage::info("No problems found"));
    }

    result
}
