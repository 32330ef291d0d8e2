use crate::error::{LedgerError, Result};
use crate::model::CouponRecord;

pub mod create;
pub mod doctor;
pub mod get;
pub mod update;

/// Id answered by `GET /get` as a liveness probe. It never names a record,
/// so create and update refuse it.
pub const LIVENESS_PROBE_ID: &str = "test";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_records: Vec<CouponRecord>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_records(mut self, records: Vec<CouponRecord>) -> Self {
        self.affected_records = records;
        self
    }

    /// The messages joined one per line, for plain-text transports.
    pub fn summary(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Pulls the coupon id out of an intent, treating an empty id as missing.
pub(crate) fn require_id(id: Option<String>) -> Result<String> {
    match id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(LedgerError::Validation("idcoupon is required".into())),
    }
}

pub(crate) fn reject_probe_id(id: &str) -> Result<()> {
    if id == LIVENESS_PROBE_ID {
        return Err(LedgerError::Validation(format!(
            "'{}' is reserved and cannot be used as a coupon id",
            LIVENESS_PROBE_ID
        )));
    }
    Ok(())
}
