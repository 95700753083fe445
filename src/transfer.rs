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

//! Customer-to-customer transfers.
//!
//! There is no two-account atomic primitive. A transfer withdraws from the
//! sender first, then deposits into the recipient; if the deposit fails the
//! withdrawn amount is put back into the sender's account before the error
//! is returned. Only one account lock is held at a time, so concurrent
//! transfers in opposite directions cannot deadlock.

use crate::LedgerError;
use crate::base::AccountId;
use crate::customer::Customer;
use crate::transaction::{Transaction, TransactionKind};
use rust_decimal::Decimal;
use tracing::{error, info};

/// Result of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub sender: AccountId,
    pub recipient: AccountId,
    pub amount: Decimal,
    /// Sender balance right after the transfer.
    pub sender_balance: Decimal,
}

/// Moves `amount` from `sender` to `recipient`.
///
/// On success the sender logs a `Transfer` and the recipient a `Deposit`,
/// each naming the counterparty.
///
/// # Errors
///
/// - [`LedgerError::SelfTransfer`] - both sides are the same account.
/// - [`LedgerError::InvalidAmount`] - `amount` is not positive.
/// - [`LedgerError::InsufficientFunds`] / [`LedgerError::AccountClosed`] - the
///   sender could not be debited. Nothing changed.
/// - [`LedgerError::TransferFailed`] - the recipient could not be credited.
///   The sender has been refunded and neither log was touched.
pub fn transfer(
    sender: &Customer,
    recipient: &Customer,
    amount: Decimal,
) -> Result<TransferReceipt, LedgerError> {
    if sender.account_id() == recipient.account_id() {
        return Err(LedgerError::SelfTransfer);
    }
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount);
    }

    sender.account().withdraw(amount)?;

    if let Err(e) = recipient.account().deposit(amount) {
        sender.account().restore(amount);
        error!(
            from = %sender.account_id(),
            to = %recipient.account_id(),
            %amount,
            error = %e,
            "transfer deposit leg failed, sender refunded"
        );
        return Err(LedgerError::TransferFailed(e.to_string()));
    }

    sender.record(Transaction::new(
        TransactionKind::Transfer,
        amount,
        format!(
            "Transferred to {} (Acc: {})",
            recipient.name(),
            recipient.account_id()
        ),
    ));
    recipient.record(Transaction::new(
        TransactionKind::Deposit,
        amount,
        format!(
            "Received from {} (Acc: {})",
            sender.name(),
            sender.account_id()
        ),
    ));
    info!(
        from = %sender.account_id(),
        to = %recipient.account_id(),
        %amount,
        "transfer completed"
    );

    Ok(TransferReceipt {
        sender: sender.account_id().clone(),
        recipient: recipient.account_id().clone(),
        amount,
        sender_balance: sender.account().balance(),
    })
}
