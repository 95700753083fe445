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

//! Minimum-balance accounts.
//!
//! Every account carries a fixed minimum balance (the caution deposit). A
//! withdrawal may never take the balance below it. Balance mutations happen
//! under a per-account lock, so unrelated accounts never contend.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use bank_ledger_rs::{Account, AccountId, AccountKind, LedgerError};
//!
//! let account = Account::new(AccountId::new("1000000001"), AccountKind::Personal, dec!(5000));
//! account.deposit(dec!(5000)).unwrap();
//! assert_eq!(account.withdraw(dec!(100)), Err(LedgerError::InsufficientFunds));
//! assert_eq!(account.balance(), dec!(5000));
//! ```

use crate::LedgerError;
use crate::base::{AccountId, round_cents};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::{Deserialize, Serialize as DeriveSerialize};
use std::fmt;
use std::str::FromStr;

/// Kind of account chosen at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, DeriveSerialize)]
pub enum AccountKind {
    Personal,
    Business,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Personal => f.write_str("Personal"),
            Self::Business => f.write_str("Business"),
        }
    }
}

impl FromStr for AccountKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "personal" => Ok(Self::Personal),
            "business" => Ok(Self::Business),
            other => Err(LedgerError::InvalidRegistration(format!(
                "unknown account type '{other}' (expected Personal or Business)"
            ))),
        }
    }
}

#[derive(Debug)]
struct AccountData {
    balance: Decimal,
    closed: bool,
}

impl AccountData {
    /// Increases the balance.
    fn deposit(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        if self.closed {
            return Err(LedgerError::AccountClosed);
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        Ok(())
    }

    /// Decreases the balance, keeping it at or above `floor`.
    fn withdraw(&mut self, amount: Decimal, floor: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        if self.closed {
            return Err(LedgerError::AccountClosed);
        }
        if self.balance - amount < floor {
            return Err(LedgerError::InsufficientFunds);
        }
        self.balance -= amount;
        debug_assert!(
            self.balance >= floor,
            "Invariant violated: balance {} below minimum {}",
            self.balance,
            floor
        );
        Ok(())
    }
}

/// Ledger account.
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    kind: AccountKind,
    min_balance: Decimal,
    inner: Mutex<AccountData>,
}

impl Account {
    /// Creates an account with a zero balance.
    ///
    /// A negative `min_balance` is treated as zero.
    pub fn new(id: AccountId, kind: AccountKind, min_balance: Decimal) -> Self {
        Self {
            id,
            kind,
            min_balance: min_balance.max(Decimal::ZERO),
            inner: Mutex::new(AccountData {
                balance: Decimal::ZERO,
                closed: false,
            }),
        }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn min_balance(&self) -> Decimal {
        self.min_balance
    }

    pub fn balance(&self) -> Decimal {
        self.inner.lock().balance
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Credits `amount`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - `amount` is zero or negative.
    /// - [`LedgerError::AccountClosed`] - the account has been closed.
    /// - [`LedgerError::AmountOverflow`] - the new balance would not fit in a decimal.
    pub fn deposit(&self, amount: Decimal) -> Result<(), LedgerError> {
        self.inner.lock().deposit(amount)
    }

    /// Debits `amount`. Nothing is withdrawn on failure.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - `amount` is zero or negative.
    /// - [`LedgerError::AccountClosed`] - the account has been closed.
    /// - [`LedgerError::InsufficientFunds`] - the balance would drop below the minimum.
    pub fn withdraw(&self, amount: Decimal) -> Result<(), LedgerError> {
        self.inner.lock().withdraw(amount, self.min_balance)
    }

    /// Puts back money this account just paid out, even if it has been
    /// closed in the meantime.
    pub(crate) fn restore(&self, amount: Decimal) {
        debug_assert!(amount > Decimal::ZERO);
        let mut inner = self.inner.lock();
        inner.balance = inner.balance.saturating_add(amount);
    }

    /// Closes the account. Further deposits and withdrawals fail.
    pub fn close(&self) {
        self.inner.lock().closed = true;
    }
}

/// Plain-data form of an [`Account`], used for snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, DeriveSerialize)]
pub struct AccountRecord {
    pub id: AccountId,
    pub kind: AccountKind,
    pub balance: Decimal,
    pub min_balance: Decimal,
    #[serde(default)]
    pub closed: bool,
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Self {
            id: record.id,
            kind: record.kind,
            min_balance: record.min_balance.max(Decimal::ZERO),
            inner: Mutex::new(AccountData {
                balance: record.balance,
                closed: record.closed,
            }),
        }
    }
}

impl From<&Account> for AccountRecord {
    fn from(account: &Account) -> Self {
        let data = account.inner.lock();
        Self {
            id: account.id.clone(),
            kind: account.kind,
            balance: data.balance,
            min_balance: account.min_balance,
            closed: data.closed,
        }
    }
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Account", 5)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("balance", &data.balance)?;
        state.serialize_field("min_balance", &self.min_balance)?;
        state.serialize_field("closed", &data.closed)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Account {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        AccountRecord::deserialize(deserializer).map(Account::from)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.lock();
        writeln!(f, "Account Details:")?;
        writeln!(f, "  Account Number: {}", self.id)?;
        writeln!(f, "  Account Type: {}", self.kind)?;
        writeln!(f, "  Balance: {:.2}", round_cents(data.balance))?;
        write!(f, "  Minimum Balance Required: {:.2}", round_cents(self.min_balance))?;
        if data.closed {
            write!(f, "\n  Status: Closed")?;
        }
        Ok(())
    }
}
