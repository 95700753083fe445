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

//! Core identifier and money helpers.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bank account number.
///
/// Also the key of the customer roster, so it must be unique across all
/// customers. Uniqueness is the job of the [`AccountIdSource`](crate::ids::AccountIdSource).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a loan, e.g. `LN-1A2B3C4D`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct LoanId(String);

impl LoanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh `LN-` prefixed ID from a random UUID.
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("LN-{}", uuid[..8].to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for an investment, e.g. `INV501`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct InvestmentId(String);

impl InvestmentId {
    const PREFIX: &'static str = "INV";

    pub fn from_sequence(n: u64) -> Self {
        Self(format!("{}{n}", Self::PREFIX))
    }

    /// Returns the numeric part of a sequence-issued ID.
    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix(Self::PREFIX)?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvestmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rounds a money value to cents, half away from zero.
///
/// The result always carries a scale of two, so `5000` becomes `5000.00`.
pub fn round_cents(value: Decimal) -> Decimal {
    let mut cents = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    cents
}

/// Compounds `principal` annually at `rate_percent` for `years`, rounded to cents.
///
/// `principal × (1 + rate/100)^years`, evaluated exactly in decimal and
/// rounded half away from zero. `None` when the value leaves the decimal range.
pub fn compound_annually(principal: Decimal, rate_percent: Decimal, years: u32) -> Option<Decimal> {
    let factor = Decimal::ONE.checked_add(rate_percent.checked_div(Decimal::ONE_HUNDRED)?)?;
    let mut value = principal;
    for _ in 0..years {
        value = value.checked_mul(factor)?;
    }
    Some(round_cents(value))
}

/// Adds whole years to a date, clamping Feb 29 to Feb 28 when needed.
pub fn add_years(date: NaiveDate, years: u32) -> NaiveDate {
    date.checked_add_months(Months::new(years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use rust_decimal_macros::dec;

    #[test]
    fn loan_id_has_prefix_and_eight_uppercase_chars() {
        let id = LoanId::generate();
        let suffix = id.as_str().strip_prefix("LN-").unwrap();
        assert_eq!(suffix.len(), 8);
        assert_eq!(suffix, suffix.to_uppercase());
    }

    #[test]
    fn investment_id_sequence_roundtrip() {
        let id = InvestmentId::from_sequence(501);
        assert_eq!(id.as_str(), "INV501");
        assert_eq!(id.sequence(), Some(501));
    }

    #[test]
    fn compound_two_years_at_eight_and_a_half() {
        assert_eq!(
            compound_annually(dec!(100000), dec!(8.5), 2),
            Some(dec!(117722.50))
        );
    }

    #[test]
    fn compound_three_years_at_six_and_a_half() {
        // 10000 × 1.065^3 = 12079.49625
        assert_eq!(compound_annually(dec!(10000), dec!(6.5), 3), Some(dec!(12079.50)));
    }

    #[test]
    fn add_years_clamps_leap_day() {
        let leap = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(add_years(leap, 1), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(add_years(leap, 4), leap.with_year(2028).unwrap());
    }

    #[test]
    fn round_cents_half_away_from_zero() {
        assert_eq!(round_cents(dec!(12079.49625)), dec!(12079.50));
        assert_eq!(round_cents(dec!(0.125)), dec!(0.13));
        assert_eq!(round_cents(dec!(-0.125)), dec!(-0.13));
        assert_eq!(round_cents(dec!(5000)).to_string(), "5000.00");
    }

    #[test]
    fn compound_zero_years_is_principal() {
        assert_eq!(compound_annually(dec!(250.00), dec!(4.5), 0), Some(dec!(250.00)));
    }

    #[test]
    fn compound_out_of_range_is_none() {
        // 1.085^700 × 100000 is far beyond 96-bit decimal range.
        assert_eq!(compound_annually(dec!(100000), dec!(8.5), 700), None);
        assert_eq!(compound_annually(Decimal::MAX, dec!(6.5), 1), None);
    }
}
