//! Data models shared across the pipeline.

pub mod config;
pub mod transaction;

pub use transaction::{ABSENT, TransactionRecord, VoucherKind};
