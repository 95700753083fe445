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

//! Bank application context.
//!
//! [`Bank`] owns the customer roster, the admin record, the support desk and
//! the ID sources, and exposes every ledger operation by account number. It
//! replaces process-wide globals: create one at startup (fresh or from a
//! [`Store`]) and pass it to whatever drives it.
//!
//! # Persistence
//!
//! Operations only change memory. Call [`Bank::save`] after a successful
//! mutation; a failed save is reported but does not undo the mutation.

use crate::LedgerError;
use crate::admin::Admin;
use crate::base::{AccountId, LoanId};
use crate::closure::{BatchDeletion, BatchDeletionReport};
use crate::config::BatchConfig;
use crate::customer::{Customer, CustomerRecord, MaturityReport, Registration};
use crate::error::StoreError;
use crate::ids::{AccountIdSource, InvestmentIds, RandomAccountIds};
use crate::investment::Investment;
use crate::loan::{Loan, LoanKind, LoanPolicy};
use crate::roster::Roster;
use crate::store::Store;
use crate::support::SupportDesk;
use crate::transfer::{self, TransferReceipt};
use chrono::NaiveDate;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// One row of the admin account listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub account: AccountId,
    pub name: String,
    pub kind: String,
    pub balance: Decimal,
    pub min_balance: Decimal,
    pub closed: bool,
}

pub struct Bank {
    roster: Roster,
    admin: RwLock<Admin>,
    support: SupportDesk,
    account_ids: Box<dyn AccountIdSource>,
    investment_ids: InvestmentIds,
    batch: BatchDeletion,
}

impl Bank {
    /// Creates an empty bank with random account numbers and the default admin.
    pub fn new(batch: BatchConfig) -> Self {
        Self::with_id_source(batch, Box::new(RandomAccountIds::new()))
    }

    pub fn with_id_source(batch: BatchConfig, account_ids: Box<dyn AccountIdSource>) -> Self {
        Self {
            roster: Roster::new(),
            admin: RwLock::new(Admin::default()),
            support: SupportDesk::new(),
            account_ids,
            investment_ids: InvestmentIds::new(),
            batch: BatchDeletion::new(batch),
        }
    }

    /// Restores a bank from `store`.
    ///
    /// Loaded account numbers are reserved with `account_ids` and investment
    /// numbering continues after the highest loaded ID. When no admin has been
    /// saved, the default admin is created and saved.
    pub fn load(
        store: &dyn Store,
        batch: BatchConfig,
        account_ids: Box<dyn AccountIdSource>,
    ) -> Result<Self, StoreError> {
        let records = store.load_customers()?;
        account_ids.reserve(&mut records.iter().map(|r| r.account.id.clone()));

        let investment_ids = InvestmentIds::new();
        for record in &records {
            for investment in record.investments.iter().chain(&record.closed_investments) {
                investment_ids.observe(investment.id());
            }
        }

        let admin = match store.load_admin()? {
            Some(admin) => admin,
            None => {
                let admin = Admin::default();
                store.save_admin(&admin)?;
                admin
            }
        };

        let bank = Self {
            roster: records.into_iter().map(Customer::from).collect(),
            admin: RwLock::new(admin),
            support: SupportDesk::from_messages(store.load_messages()?),
            account_ids,
            investment_ids,
            batch: BatchDeletion::new(batch),
        };
        info!(
            customers = bank.roster.len(),
            messages = bank.support.len(),
            "bank state loaded"
        );
        Ok(bank)
    }

    /// Persists customers, admin and support messages.
    pub fn save(&self, store: &dyn Store) -> Result<(), StoreError> {
        store.save_customers(&self.customer_records())?;
        store.save_admin(&self.admin.read())?;
        store.save_messages(&self.support.to_map())
    }

    pub fn customer_records(&self) -> Vec<CustomerRecord> {
        self.roster
            .customers()
            .iter()
            .map(|c| c.to_record())
            .collect()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn support(&self) -> &SupportDesk {
        &self.support
    }

    // === Customers ===

    /// Registers a customer under a fresh account number.
    pub fn register(
        &self,
        registration: Registration,
        today: NaiveDate,
    ) -> Result<Arc<Customer>, LedgerError> {
        registration.validate(today)?;
        let customer = Customer::open(registration, self.account_ids.next_account_id(), today)?;
        info!(account = %customer.account_id(), "customer registered");
        Ok(self.roster.insert(customer))
    }

    /// # Errors
    ///
    /// [`LedgerError::AccountNotFound`] if no customer has this account number.
    pub fn customer(&self, account_id: &AccountId) -> Result<Arc<Customer>, LedgerError> {
        self.roster
            .get(account_id)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.clone()))
    }

    pub fn login(&self, account_id: &AccountId, password: &str) -> Result<Arc<Customer>, LedgerError> {
        let customer = self.customer(account_id)?;
        if customer.check_password(password) {
            Ok(customer)
        } else {
            Err(LedgerError::InvalidCredentials)
        }
    }

    /// Verifies the security answer, then sets the new password.
    pub fn reset_customer_password(
        &self,
        account_id: &AccountId,
        answer: &str,
        new_password: &str,
    ) -> Result<(), LedgerError> {
        let customer = self.customer(account_id)?;
        customer.verify_security_answer(answer)?;
        customer.set_password(new_password)
    }

    /// Returns the new balance.
    pub fn deposit(&self, account_id: &AccountId, amount: Decimal) -> Result<Decimal, LedgerError> {
        let customer = self.customer(account_id)?;
        customer.deposit(amount)?;
        Ok(customer.account().balance())
    }

    /// Returns the new balance.
    pub fn withdraw(&self, account_id: &AccountId, amount: Decimal) -> Result<Decimal, LedgerError> {
        let customer = self.customer(account_id)?;
        customer.withdraw(amount)?;
        Ok(customer.account().balance())
    }

    /// Transfers between two customers by account number.
    ///
    /// A self-transfer is rejected before the recipient is looked up.
    pub fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        if from == to {
            return Err(LedgerError::SelfTransfer);
        }
        let sender = self.customer(from)?;
        let recipient = self.customer(to)?;
        transfer::transfer(&sender, &recipient, amount)
    }

    /// Assesses and, if approved, disburses a loan starting `today`.
    pub fn apply_loan(
        &self,
        account_id: &AccountId,
        kind: LoanKind,
        amount: Decimal,
        tenure_years: u32,
        today: NaiveDate,
    ) -> Result<Loan, LedgerError> {
        let customer = self.customer(account_id)?;
        LoanPolicy::assess(kind, amount, tenure_years, customer.salary())?;
        let loan = Loan::new(kind, amount, today, tenure_years)?;
        customer.apply_loan(loan.clone())?;
        Ok(loan)
    }

    /// Returns the amount actually paid.
    pub fn repay_loan(
        &self,
        account_id: &AccountId,
        loan_id: &LoanId,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        self.customer(account_id)?.repay_loan(loan_id, amount)
    }

    /// Opens a fixed deposit starting `today`.
    pub fn open_fixed_deposit(
        &self,
        account_id: &AccountId,
        amount: Decimal,
        tenure_years: u32,
        today: NaiveDate,
    ) -> Result<Investment, LedgerError> {
        let customer = self.customer(account_id)?;
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        if tenure_years == 0 {
            return Err(LedgerError::InvalidTenure);
        }
        let investment =
            Investment::fixed_deposit(self.investment_ids.next_id(), amount, today, tenure_years)?;
        customer.add_investment(investment.clone())?;
        Ok(investment)
    }

    pub fn mature_investments(
        &self,
        account_id: &AccountId,
        today: NaiveDate,
    ) -> Result<MaturityReport, LedgerError> {
        Ok(self.customer(account_id)?.mature_investments(today))
    }

    /// Opens a support ticket for the customer. Returns its ID.
    pub fn contact_support(&self, account_id: &AccountId, content: &str) -> Result<u32, LedgerError> {
        let customer = self.customer(account_id)?;
        self.support
            .contact(customer.account_id(), &customer.name(), content)
    }

    // === Administration ===

    pub fn admin(&self) -> Admin {
        self.admin.read().clone()
    }

    pub fn login_admin(&self, admin_id: &str, password: &str) -> Result<(), LedgerError> {
        self.admin.read().authenticate(admin_id, password)
    }

    pub fn set_admin_security_question(&self, question: &str, answer: &str) -> Result<(), LedgerError> {
        self.admin.write().set_security_question(question, answer)
    }

    pub fn reset_admin_password(&self, answer: &str, new_password: &str) -> Result<(), LedgerError> {
        self.admin.write().reset_password(answer, new_password)
    }

    pub fn resolve_message(&self, message_id: u32, reply: &str) -> Result<(), LedgerError> {
        self.support.resolve(message_id, reply)
    }

    /// All accounts ordered by account number.
    pub fn account_summaries(&self) -> Vec<AccountSummary> {
        self.roster
            .customers()
            .iter()
            .map(|c| AccountSummary {
                account: c.account_id().clone(),
                name: c.name(),
                kind: c.account().kind().to_string(),
                balance: c.account().balance(),
                min_balance: c.account().min_balance(),
                closed: c.account().is_closed(),
            })
            .collect()
    }

    /// Removes a single customer without settling the account.
    pub fn delete_customer(&self, account_id: &AccountId) -> Result<Arc<Customer>, LedgerError> {
        let customer = self
            .roster
            .remove(account_id)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.clone()))?;
        info!(account = %account_id, "customer deleted");
        Ok(customer)
    }

    /// Closes the given accounts concurrently and removes them from the roster.
    pub fn batch_delete(&self, account_ids: &[AccountId]) -> BatchDeletionReport {
        self.batch.run(&self.roster, account_ids)
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::new(BatchConfig::default())
    }
}
