//! Balance-delta reconciliation.
//!
//! Many layouts expose a running balance but no labelled debit/credit
//! columns. The [`Reconciler`] walks transactions in block order and infers
//! the moved amount from successive balances. One reconciler serves exactly
//! one document.

use rust_decimal::Decimal;
use tracing::trace;

use super::amount::{self, format_amount};
use crate::models::ABSENT;

/// Debit/credit/balance inferred for one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub debit: String,
    pub credit: String,
    pub balance: String,
}

impl Reconciled {
    fn absent() -> Self {
        Self {
            debit: ABSENT.to_string(),
            credit: ABSENT.to_string(),
            balance: ABSENT.to_string(),
        }
    }
}

/// Running state for one document's balance chain.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    previous_balance: Option<Decimal>,
    index: usize,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last balance that parsed successfully.
    pub fn previous_balance(&self) -> Option<Decimal> {
        self.previous_balance
    }

    /// Number of transactions seen so far.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Reconcile the next transaction. `amounts` is in left-to-right order
    /// and its last entry is the balance.
    pub fn step<S: AsRef<str>>(&mut self, amounts: &[S]) -> Reconciled {
        let index = self.index;
        self.index += 1;

        let mut out = Reconciled::absent();
        let Some(last) = amounts.last() else {
            return out;
        };

        let Some(balance) = amount::parse_signed(last.as_ref()) else {
            trace!("transaction {}: balance {:?} did not parse", index, last.as_ref());
            return out;
        };
        out.balance = format_amount(balance);

        if index == 0 && amounts.len() >= 2 {
            // First row with a prior amount is taken as an opening credit.
            out.credit = amount::normalize_or_absent(amounts[0].as_ref());
        } else if let Some(previous) = self.previous_balance {
            let delta = balance - previous;
            if delta > Decimal::ZERO {
                out.credit = format_amount(delta.abs());
            } else if delta < Decimal::ZERO {
                out.debit = format_amount(delta.abs());
            }
        }

        self.previous_balance = Some(balance);
        out
    }
}

/// Reconcile a whole document's amount lists with a fresh accumulator.
pub fn reconcile_all<S: AsRef<str>>(lists: &[Vec<S>]) -> Vec<Reconciled> {
    let mut reconciler = Reconciler::new();
    lists.iter().map(|amounts| reconciler.step(amounts)).collect()
}
