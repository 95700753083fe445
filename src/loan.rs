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

//! Loans and the loan approval policy.
//!
//! Interest compounds annually and is applied once, when the loan is created:
//! `total_repayable = principal × (1 + rate/100)^years`. After that the loan
//! only tracks how much is still due.
//!
//! ```text
//!  Active (amount_due > 0) ──payments──► Settled (amount_due == 0)
//! ```

use crate::LedgerError;
use crate::base::{LoanId, add_years, compound_annually, round_cents};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of loan. Each kind has a fixed annual interest rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum LoanKind {
    Personal,
    Student,
    Business,
}

impl LoanKind {
    /// Annual interest rate in percent.
    pub fn interest_rate(&self) -> Decimal {
        match self {
            Self::Personal => dec!(8.5),
            Self::Student => dec!(4.5),
            Self::Business => dec!(10.5),
        }
    }
}

impl fmt::Display for LoanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Personal => f.write_str("Personal"),
            Self::Student => f.write_str("Student"),
            Self::Business => f.write_str("Business"),
        }
    }
}

impl FromStr for LoanKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "personal" => Ok(Self::Personal),
            "student" => Ok(Self::Student),
            "business" => Ok(Self::Business),
            other => Err(LedgerError::LoanRejected(format!(
                "unknown loan type '{other}' (expected Personal, Student or Business)"
            ))),
        }
    }
}

/// Loan approval rules.
///
/// | Kind | Rule |
/// |------|------|
/// | Student | amount ≤ 500,000.00 |
/// | Personal, Business | salary > 20,000.00 and amount < salary × 100 |
pub struct LoanPolicy;

impl LoanPolicy {
    pub const MAX_STUDENT_LOAN: Decimal = dec!(500000);
    pub const MIN_SALARY: Decimal = dec!(20000);
    pub const SALARY_MULTIPLIER: Decimal = dec!(100);

    /// Checks an application against the rules.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - `amount` is zero or negative.
    /// - [`LedgerError::InvalidTenure`] - `tenure_years` is zero.
    /// - [`LedgerError::LoanRejected`] - the application fails the rules for its kind.
    ///
    /// A salary so large that `salary × 100` leaves the decimal range places
    /// no cap on the amount.
    pub fn assess(
        kind: LoanKind,
        amount: Decimal,
        tenure_years: u32,
        salary: Decimal,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        if tenure_years == 0 {
            return Err(LedgerError::InvalidTenure);
        }
        match kind {
            LoanKind::Student if amount > Self::MAX_STUDENT_LOAN => Err(
                LedgerError::LoanRejected("Maximum Student Loan is 500,000.00.".to_string()),
            ),
            LoanKind::Student => Ok(()),
            LoanKind::Personal | LoanKind::Business => {
                let within_limit = salary
                    .checked_mul(Self::SALARY_MULTIPLIER)
                    .is_none_or(|limit| amount < limit);
                if salary > Self::MIN_SALARY && within_limit {
                    Ok(())
                } else {
                    Err(LedgerError::LoanRejected(
                        "Loan not approved based on salary/amount.".to_string(),
                    ))
                }
            }
        }
    }
}

/// Settlement state of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanStatus {
    Active,
    Settled,
}

/// A disbursed loan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Loan {
    id: LoanId,
    kind: LoanKind,
    principal: Decimal,
    interest_rate: Decimal,
    total_repayable: Decimal,
    amount_due: Decimal,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl Loan {
    /// Creates a loan at the kind's interest rate with a fresh ID.
    ///
    /// # Errors
    ///
    /// [`LedgerError::AmountOverflow`] when the compounded repayable amount
    /// does not fit in a decimal.
    pub fn new(
        kind: LoanKind,
        principal: Decimal,
        start_date: NaiveDate,
        tenure_years: u32,
    ) -> Result<Self, LedgerError> {
        let interest_rate = kind.interest_rate();
        let total_repayable = compound_annually(principal, interest_rate, tenure_years)
            .ok_or(LedgerError::AmountOverflow)?;
        Ok(Self {
            id: LoanId::generate(),
            kind,
            principal,
            interest_rate,
            total_repayable,
            amount_due: total_repayable,
            start_date,
            end_date: add_years(start_date, tenure_years),
        })
    }

    pub fn id(&self) -> &LoanId {
        &self.id
    }

    pub fn kind(&self) -> LoanKind {
        self.kind
    }

    pub fn principal(&self) -> Decimal {
        self.principal
    }

    pub fn interest_rate(&self) -> Decimal {
        self.interest_rate
    }

    pub fn total_repayable(&self) -> Decimal {
        self.total_repayable
    }

    pub fn amount_due(&self) -> Decimal {
        self.amount_due
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn status(&self) -> LoanStatus {
        if self.amount_due > Decimal::ZERO {
            LoanStatus::Active
        } else {
            LoanStatus::Settled
        }
    }

    /// Reduces the amount due, never below zero. Non-positive amounts are ignored.
    pub fn make_payment(&mut self, amount: Decimal) {
        if amount <= Decimal::ZERO {
            return;
        }
        self.amount_due = (self.amount_due - amount).max(Decimal::ZERO);
        debug_assert!(self.amount_due <= self.total_repayable);
    }
}

impl fmt::Display for Loan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - Loan ID: {} | Type: {} | Principal: {:.2} | Total Repayable: {:.2} | Amount Due: {:.2} | End Date: {}",
            self.id,
            self.kind,
            round_cents(self.principal),
            round_cents(self.total_repayable),
            round_cents(self.amount_due),
            self.end_date
        )
    }
}
