//! Canonical transaction record produced by every extraction strategy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::statement::amount;

/// Sentinel stored in any field that is not present or not applicable.
pub const ABSENT: &str = "-";

/// Receipt/Payment classification of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VoucherKind {
    Receipt,
    Payment,
    #[default]
    #[serde(rename = "-")]
    Unknown,
}

impl VoucherKind {
    /// Derive the voucher kind from which of debit/credit is populated.
    pub fn from_amounts(debit: &str, credit: &str) -> Self {
        if credit != ABSENT {
            VoucherKind::Receipt
        } else if debit != ABSENT {
            VoucherKind::Payment
        } else {
            VoucherKind::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherKind::Receipt => "Receipt",
            VoucherKind::Payment => "Payment",
            VoucherKind::Unknown => ABSENT,
        }
    }
}

impl fmt::Display for VoucherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized statement line.
///
/// Dates keep their source shape unless the institution canonicalizes them.
/// Amount fields hold either a plain decimal string (`1234.56`) or [`ABSENT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub transaction_date: String,
    pub value_date: String,
    pub cheque_or_ref_no: String,
    #[serde(rename = "branchOrBranchCode")]
    pub branch_code: String,
    pub description: String,
    pub debit: String,
    pub credit: String,
    pub balance: String,
    pub voucher_kind: VoucherKind,
}

impl TransactionRecord {
    /// Create a record with every field absent except the transaction date.
    pub fn new(transaction_date: impl Into<String>) -> Self {
        Self {
            transaction_date: transaction_date.into(),
            value_date: ABSENT.to_string(),
            cheque_or_ref_no: ABSENT.to_string(),
            branch_code: ABSENT.to_string(),
            description: ABSENT.to_string(),
            debit: ABSENT.to_string(),
            credit: ABSENT.to_string(),
            balance: ABSENT.to_string(),
            voucher_kind: VoucherKind::Unknown,
        }
    }

    pub fn has_debit(&self) -> bool {
        self.debit != ABSENT
    }

    pub fn has_credit(&self) -> bool {
        self.credit != ABSENT
    }

    /// Recompute `voucher_kind` from the amount fields.
    pub fn classify_voucher(&mut self) {
        self.voucher_kind = VoucherKind::from_amounts(&self.debit, &self.credit);
    }

    pub fn debit_amount(&self) -> Option<Decimal> {
        amount::parse_decimal(&self.debit)
    }

    pub fn credit_amount(&self) -> Option<Decimal> {
        amount::parse_decimal(&self.credit)
    }

    pub fn balance_amount(&self) -> Option<Decimal> {
        amount::parse_signed(&self.balance)
    }
}

/// Store `value` in a text field, falling back to [`ABSENT`] for blanks.
pub(crate) fn or_absent(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        ABSENT.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_record_is_absent() {
        let record = TransactionRecord::new("01-04-2025");
        assert_eq!(record.debit, ABSENT);
        assert_eq!(record.credit, ABSENT);
        assert_eq!(record.balance, ABSENT);
        assert_eq!(record.voucher_kind, VoucherKind::Unknown);
    }

    #[test]
    fn test_voucher_from_amounts() {
        assert_eq!(VoucherKind::from_amounts("-", "10.00"), VoucherKind::Receipt);
        assert_eq!(VoucherKind::from_amounts("10.00", "-"), VoucherKind::Payment);
        assert_eq!(VoucherKind::from_amounts("-", "-"), VoucherKind::Unknown);
    }

    #[test]
    fn test_serializes_camel_case_with_sentinel_voucher() {
        let record = TransactionRecord::new("01-04-2025");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["transactionDate"], "01-04-2025");
        assert_eq!(json["chequeOrRefNo"], "-");
        assert_eq!(json["branchOrBranchCode"], "-");
        assert_eq!(json["voucherKind"], "-");
    }

    #[test]
    fn test_or_absent() {
        assert_eq!(or_absent("  "), "-");
        assert_eq!(or_absent(" NEFT "), "NEFT");
    }
}
