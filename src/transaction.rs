// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Append-only transaction log.
//!
//! Each customer keeps an ordered record of ledger-affecting events for
//! audit and display. Entries are immutable once appended; insertion order
//! is display order.

use crate::base::round_cents;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
    LoanDisbursal,
    LoanRepayment,
    NewInvestment,
    InvestmentMatured,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Deposit => "Deposit",
            Self::Withdrawal => "Withdrawal",
            Self::Transfer => "Transfer",
            Self::LoanDisbursal => "Loan Disbursal",
            Self::LoanRepayment => "Loan Repayment",
            Self::NewInvestment => "New Investment",
            Self::InvestmentMatured => "Investment Matured",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Creates a transaction stamped with the current time.
    pub fn new(kind: TransactionKind, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            description: description.into(),
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:<18} | Amount: {:>10.2} | Description: {}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.kind,
            round_cents(self.amount),
            self.description
        )
    }
}

/// Ordered, append-only sequence of transactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TransactionLog {
    entries: Vec<Transaction>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transaction: Transaction) {
        self.entries.push(transaction);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Transaction> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn log_preserves_insertion_order() {
        let mut log = TransactionLog::new();
        log.push(Transaction::new(TransactionKind::Deposit, dec!(10), "first"));
        log.push(Transaction::new(TransactionKind::Withdrawal, dec!(5), "second"));

        let kinds: Vec<_> = log.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TransactionKind::Deposit, TransactionKind::Withdrawal]);
        assert_eq!(log.last().unwrap().description, "second");
    }

    #[test]
    fn display_pads_kind_and_amount() {
        let tx = Transaction::new(TransactionKind::LoanRepayment, dec!(12.5), "Paid installment");
        let text = tx.to_string();
        assert!(text.contains("Loan Repayment     |"));
        assert!(text.contains("Amount:      12.50 |"));
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut log = TransactionLog::new();
        log.push(Transaction::new(TransactionKind::Deposit, dec!(1), "x"));
        let value = serde_json::to_value(&log).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["kind"], "Deposit");
        assert_eq!(value[0]["amount"], "1");
    }
}
