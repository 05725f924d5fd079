//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod decision;
mod operation_log;
mod purchase;
mod record;

pub use decision::{
    Decision, DecisionRecord, InboundEmail, InboundRejection, TOKEN_MAX_LENGTH, TOKEN_MIN_LENGTH,
    detect_decision, extract_token,
};
pub use operation_log::{OperationKind, OperationLogEntry, render_text_line};
pub use purchase::{ITEMS_PREVIEW_LENGTH, PurchaseView, purchase_amount};
pub use record::{RECORD_KEY_MAX_LENGTH, RecordKey};
