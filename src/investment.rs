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

//! Fixed-deposit investments.

use crate::base::{InvestmentId, add_years, compound_annually, round_cents};
use crate::error::LedgerError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An investment. The maturity value is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Investment {
    id: InvestmentId,
    kind: String,
    description: String,
    amount_invested: Decimal,
    start_date: NaiveDate,
    end_date: NaiveDate,
    interest_rate: Decimal,
    maturity_value: Decimal,
}

impl Investment {
    pub const FIXED_DEPOSIT_RATE: Decimal = dec!(6.5);

    /// # Errors
    ///
    /// [`LedgerError::AmountOverflow`] when the maturity value does not fit
    /// in a decimal.
    pub fn new(
        id: InvestmentId,
        kind: impl Into<String>,
        description: impl Into<String>,
        amount_invested: Decimal,
        start_date: NaiveDate,
        tenure_years: u32,
        interest_rate: Decimal,
    ) -> Result<Self, LedgerError> {
        let maturity_value = compound_annually(amount_invested, interest_rate, tenure_years)
            .ok_or(LedgerError::AmountOverflow)?;
        Ok(Self {
            id,
            kind: kind.into(),
            description: description.into(),
            amount_invested,
            start_date,
            end_date: add_years(start_date, tenure_years),
            interest_rate,
            maturity_value,
        })
    }

    /// A fixed deposit at [`Investment::FIXED_DEPOSIT_RATE`].
    pub fn fixed_deposit(
        id: InvestmentId,
        amount_invested: Decimal,
        start_date: NaiveDate,
        tenure_years: u32,
    ) -> Result<Self, LedgerError> {
        Self::new(
            id,
            "Fixed Deposit",
            "FD Investment",
            amount_invested,
            start_date,
            tenure_years,
            Self::FIXED_DEPOSIT_RATE,
        )
    }

    pub fn id(&self) -> &InvestmentId {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount_invested(&self) -> Decimal {
        self.amount_invested
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn interest_rate(&self) -> Decimal {
        self.interest_rate
    }

    pub fn maturity_value(&self) -> Decimal {
        self.maturity_value
    }

    /// Matured once the end date is not after `today`.
    pub fn is_matured(&self, today: NaiveDate) -> bool {
        self.end_date <= today
    }
}

impl fmt::Display for Investment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - Investment [ID: {}, Type: {}, Amount: {:.2}, Rate: {:.1}%, Maturity Value: {:.2}, End: {}]",
            self.id,
            self.kind,
            round_cents(self.amount_invested),
            self.interest_rate.round_dp(1),
            round_cents(self.maturity_value),
            self.end_date
        )
    }
}
