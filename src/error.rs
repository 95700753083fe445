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

//! Error types for ledger operations and snapshot persistence.

use crate::base::{AccountId, LoanId};
use std::path::PathBuf;
use thiserror::Error;

/// Ledger operation errors.
///
/// Every variant is raised before any state is mutated, except
/// [`LedgerError::TransferFailed`], which is reported after the sender has
/// been refunded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Amount or computed value exceeds the representable range
    #[error("amount is too large")]
    AmountOverflow,

    /// Withdrawal would take the balance below the minimum balance
    #[error("insufficient funds (minimum balance must be maintained)")]
    InsufficientFunds,

    /// Account has been closed
    #[error("account is closed")]
    AccountClosed,

    /// No customer owns the given account number
    #[error("no customer found with account number: {0}")]
    AccountNotFound(AccountId),

    /// Customer has no loan with the given ID
    #[error("loan ID not found: {0}")]
    LoanNotFound(LoanId),

    /// Loan has already been repaid in full
    #[error("loan {0} is already fully paid")]
    LoanSettled(LoanId),

    /// Loan application failed the approval policy
    #[error("loan rejected: {0}")]
    LoanRejected(String),

    /// Tenure must be at least one year
    #[error("invalid tenure (must be at least one year)")]
    InvalidTenure,

    /// Sender and recipient are the same account
    #[error("cannot transfer money to your own account")]
    SelfTransfer,

    /// Recipient could not be credited; the sender was refunded
    #[error("transfer failed, amount refunded: {0}")]
    TransferFailed(String),

    /// Registration input rejected
    #[error("invalid registration: {0}")]
    InvalidRegistration(String),

    /// Account/admin ID and password do not match
    #[error("invalid ID or password")]
    InvalidCredentials,

    /// No security question has been configured
    #[error("no security question is set for this user")]
    SecurityQuestionNotSet,

    /// Security answer does not match
    #[error("incorrect security answer")]
    SecurityAnswerMismatch,

    /// New password is blank
    #[error("password cannot be empty")]
    InvalidPassword,

    /// Support message content is blank
    #[error("message cannot be empty")]
    EmptyMessage,

    /// Unknown support message
    #[error("support message not found: {0}")]
    MessageNotFound(u32),

    /// Support message has already been answered
    #[error("support message {0} is already resolved")]
    MessageAlreadyResolved(u32),
}

/// Snapshot persistence errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
