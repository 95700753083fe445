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

//! # Bank Ledger
//!
//! This library provides the ledger of a small retail bank: minimum-balance
//! accounts, deposits and withdrawals, customer-to-customer transfers, loans,
//! fixed-deposit investments, a support desk, and concurrent batch account
//! closure.
//!
//! ## Core Components
//!
//! - [`Bank`]: Application context owning the roster, admin and support desk
//! - [`Customer`]: Aggregate coordinating an account, its loans, investments and log
//! - [`Account`]: Balance with a minimum-balance floor, locked per account
//! - [`Loan`] / [`Investment`]: Annually compounded money products
//! - [`BatchDeletion`]: Bounded worker pool that settles and closes accounts
//! - [`LedgerError`]: Error types for ledger operations
//!
//! ## Example
//!
//! ```
//! use bank_ledger_rs::{AccountKind, Bank, Registration};
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let bank = Bank::default();
//! let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
//!
//! let customer = bank
//!     .register(
//!         Registration {
//!             name: "Asha Rao".into(),
//!             date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
//!             address: "12 Hill Road".into(),
//!             salary: dec!(50000),
//!             account_kind: AccountKind::Personal,
//!             min_balance: dec!(5000),
//!             password: "secret".into(),
//!         },
//!         today,
//!     )
//!     .unwrap();
//!
//! // The opening deposit equals the minimum balance.
//! assert_eq!(customer.account().balance(), dec!(5000));
//!
//! bank.deposit(customer.account_id(), dec!(250.00)).unwrap();
//! assert_eq!(customer.account().balance(), dec!(5250.00));
//! ```
//!
//! ## Thread Safety
//!
//! Every account guards its balance with its own lock and the roster is a
//! concurrent map, so operations on different customers never serialize
//! behind one another.

pub mod account;
pub mod admin;
pub mod bank;
mod base;
pub mod closure;
pub mod config;
pub mod customer;
pub mod error;
pub mod ids;
pub mod investment;
pub mod loan;
pub mod roster;
pub mod store;
pub mod support;
mod transaction;
pub mod transfer;

pub use account::{Account, AccountKind};
pub use admin::Admin;
pub use bank::{AccountSummary, Bank};
pub use base::{AccountId, InvestmentId, LoanId, compound_annually, round_cents};
pub use closure::{BatchDeletion, BatchDeletionReport, ClosureCharges, ClosureOutcome};
pub use config::{BatchConfig, Config};
pub use customer::{Customer, CustomerRecord, MaturityReport, Registration, SECURITY_QUESTIONS};
pub use error::{LedgerError, StoreError};
pub use ids::{AccountIdSource, InvestmentIds, RandomAccountIds, SequentialAccountIds};
pub use investment::Investment;
pub use loan::{Loan, LoanKind, LoanPolicy, LoanStatus};
pub use roster::Roster;
pub use store::{JsonStore, MemoryStore, Store};
pub use support::{SupportDesk, SupportMessage};
pub use transaction::{Transaction, TransactionKind, TransactionLog};
pub use transfer::TransferReceipt;
