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

//! Customer aggregate.
//!
//! A [`Customer`] owns exactly one [`Account`] plus its loans, investments
//! and transaction log, and coordinates the multi-step money movements that
//! touch more than one of them:
//!
//! | Operation | Steps |
//! |-----------|-------|
//! | [`Customer::apply_loan`] | credit principal → add loan → log disbursal |
//! | [`Customer::repay_loan`] | debit capped amount → reduce amount due → log repayment |
//! | [`Customer::add_investment`] | debit amount → add investment → log purchase |
//! | [`Customer::mature_investments`] | credit each matured value → archive credited → log each |
//!
//! The account is always debited or credited first. If that step fails the
//! operation returns the error with nothing else changed.
//!
//! # Locking
//!
//! Books (loans, investments, log) sit behind one mutex per customer and the
//! balance behind the account's own mutex. Operations take the books lock
//! first, then the account lock.

use crate::LedgerError;
use crate::account::{Account, AccountKind, AccountRecord};
use crate::base::{AccountId, LoanId, round_cents};
use crate::investment::Investment;
use crate::loan::{Loan, LoanStatus};
use crate::transaction::{Transaction, TransactionKind, TransactionLog};
use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Predefined security questions offered for password recovery.
pub const SECURITY_QUESTIONS: [&str; 6] = [
    "What is your mother's maiden name?",
    "What was the name of your first pet?",
    "What city were you born in?",
    "What is your favorite movie?",
    "What is your favorite book?",
    "What is the name of your best friend from childhood?",
];

/// Input for opening a new customer account.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub salary: Decimal,
    pub account_kind: AccountKind,
    pub min_balance: Decimal,
    pub password: String,
}

impl Registration {
    pub const ALLOWED_MIN_BALANCES: [Decimal; 3] = [dec!(0), dec!(5000), dec!(10000)];

    /// Checks the registration form.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidRegistration`] naming the first offending field.
    pub fn validate(&self, today: NaiveDate) -> Result<(), LedgerError> {
        let invalid = |reason: &str| -> Result<(), LedgerError> {
            Err(LedgerError::InvalidRegistration(reason.to_string()))
        };
        if self.name.trim().is_empty() {
            return invalid("name cannot be empty");
        }
        if self.date_of_birth > today {
            return invalid("date of birth cannot be in the future");
        }
        if self.address.trim().is_empty() {
            return invalid("address cannot be empty");
        }
        if self.salary < Decimal::ZERO {
            return invalid("salary cannot be negative");
        }
        if !Self::ALLOWED_MIN_BALANCES.contains(&self.min_balance) {
            return invalid("minimum balance must be 0, 5000 or 10000");
        }
        if self.password.trim().is_empty() {
            return invalid("password cannot be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
struct SecurityQuestion {
    question: String,
    answer: String,
}

#[derive(Debug)]
struct Profile {
    name: String,
    date_of_birth: NaiveDate,
    address: String,
    salary: Decimal,
    password: String,
    security: Option<SecurityQuestion>,
}

#[derive(Debug, Default)]
struct Books {
    loans: Vec<Loan>,
    investments: Vec<Investment>,
    /// Investments that matured and were paid out.
    closed_investments: Vec<Investment>,
    history: TransactionLog,
}

/// Outcome of a maturity sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaturityReport {
    /// Investments paid out, with the amount credited.
    pub credited: Vec<(Investment, Decimal)>,
    /// Matured investments whose credit failed; they stay active.
    pub failed: Vec<(Investment, LedgerError)>,
    /// Balance after the sweep.
    pub balance: Decimal,
}

impl MaturityReport {
    /// True when no investment had matured.
    pub fn is_empty(&self) -> bool {
        self.credited.is_empty() && self.failed.is_empty()
    }
}

/// Bank customer.
#[derive(Debug)]
pub struct Customer {
    profile: RwLock<Profile>,
    account: Account,
    books: Mutex<Books>,
}

impl Customer {
    /// Opens a customer account from a validated registration.
    ///
    /// The account starts at zero and is immediately credited with its
    /// minimum balance as the opening deposit.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidRegistration`] if the form is invalid.
    pub fn open(
        registration: Registration,
        account_id: AccountId,
        today: NaiveDate,
    ) -> Result<Self, LedgerError> {
        registration.validate(today)?;
        let account = Account::new(
            account_id,
            registration.account_kind,
            registration.min_balance,
        );
        if registration.min_balance > Decimal::ZERO {
            account.deposit(registration.min_balance)?;
        }
        Ok(Self {
            profile: RwLock::new(Profile {
                name: registration.name.trim().to_string(),
                date_of_birth: registration.date_of_birth,
                address: registration.address.trim().to_string(),
                salary: registration.salary,
                password: registration.password,
                security: None,
            }),
            account,
            books: Mutex::new(Books::default()),
        })
    }

    pub fn name(&self) -> String {
        self.profile.read().name.clone()
    }

    pub fn date_of_birth(&self) -> NaiveDate {
        self.profile.read().date_of_birth
    }

    pub fn address(&self) -> String {
        self.profile.read().address.clone()
    }

    pub fn salary(&self) -> Decimal {
        self.profile.read().salary
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn account_id(&self) -> &AccountId {
        self.account.id()
    }

    // === Credentials ===

    /// Plain equality check.
    pub fn check_password(&self, password: &str) -> bool {
        self.profile.read().password == password
    }

    /// # Errors
    ///
    /// [`LedgerError::InvalidPassword`] if `password` is blank.
    pub fn set_password(&self, password: &str) -> Result<(), LedgerError> {
        if password.trim().is_empty() {
            return Err(LedgerError::InvalidPassword);
        }
        self.profile.write().password = password.to_string();
        Ok(())
    }

    pub fn security_question(&self) -> Option<String> {
        self.profile
            .read()
            .security
            .as_ref()
            .map(|s| s.question.clone())
    }

    /// Sets the question and answer together.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidRegistration`] if either is blank.
    pub fn set_security_question(&self, question: &str, answer: &str) -> Result<(), LedgerError> {
        if question.trim().is_empty() || answer.trim().is_empty() {
            return Err(LedgerError::InvalidRegistration(
                "security question and answer cannot be empty".to_string(),
            ));
        }
        self.profile.write().security = Some(SecurityQuestion {
            question: question.trim().to_string(),
            answer: answer.trim().to_string(),
        });
        Ok(())
    }

    /// Compares trimmed, case-insensitively.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::SecurityQuestionNotSet`] - nothing to compare against.
    /// - [`LedgerError::SecurityAnswerMismatch`] - wrong answer.
    pub fn verify_security_answer(&self, answer: &str) -> Result<(), LedgerError> {
        let profile = self.profile.read();
        let security = profile
            .security
            .as_ref()
            .ok_or(LedgerError::SecurityQuestionNotSet)?;
        if security.answer.trim().eq_ignore_ascii_case(answer.trim()) {
            Ok(())
        } else {
            Err(LedgerError::SecurityAnswerMismatch)
        }
    }

    // === Books ===

    pub fn loans(&self) -> Vec<Loan> {
        self.books.lock().loans.clone()
    }

    pub fn loan(&self, loan_id: &LoanId) -> Option<Loan> {
        self.books
            .lock()
            .loans
            .iter()
            .find(|l| l.id() == loan_id)
            .cloned()
    }

    /// Loans that still have an amount due.
    pub fn active_loans(&self) -> Vec<Loan> {
        self.books
            .lock()
            .loans
            .iter()
            .filter(|l| l.status() == LoanStatus::Active)
            .cloned()
            .collect()
    }

    pub fn investments(&self) -> Vec<Investment> {
        self.books.lock().investments.clone()
    }

    pub fn closed_investments(&self) -> Vec<Investment> {
        self.books.lock().closed_investments.clone()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.books.lock().history.iter().cloned().collect()
    }

    pub(crate) fn record(&self, transaction: Transaction) {
        self.books.lock().history.push(transaction);
    }

    // === Self-service ===

    /// Credits the account and logs a deposit.
    pub fn deposit(&self, amount: Decimal) -> Result<(), LedgerError> {
        let mut books = self.books.lock();
        self.account.deposit(amount)?;
        books.history.push(Transaction::new(
            TransactionKind::Deposit,
            amount,
            "Self-deposit into account",
        ));
        Ok(())
    }

    /// Debits the account and logs a withdrawal.
    pub fn withdraw(&self, amount: Decimal) -> Result<(), LedgerError> {
        let mut books = self.books.lock();
        self.account.withdraw(amount)?;
        books.history.push(Transaction::new(
            TransactionKind::Withdrawal,
            amount,
            "Self-withdrawal from account",
        ));
        Ok(())
    }

    // === Compound operations ===

    /// Disburses an approved loan into the account.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - the principal is not positive.
    /// - [`LedgerError::AccountClosed`] - the account has been closed.
    ///
    /// On error the loan is not recorded.
    pub fn apply_loan(&self, loan: Loan) -> Result<(), LedgerError> {
        let mut books = self.books.lock();
        self.account.deposit(loan.principal())?;
        books.history.push(Transaction::new(
            TransactionKind::LoanDisbursal,
            loan.principal(),
            format!("Loan Disbursed: {}", loan.kind()),
        ));
        info!(
            account = %self.account.id(),
            loan = %loan.id(),
            principal = %loan.principal(),
            "loan disbursed"
        );
        books.loans.push(loan);
        Ok(())
    }

    /// Pays towards a loan from the account.
    ///
    /// The payment is capped at the amount due; the capped amount is what
    /// gets withdrawn, applied and logged. Returns that amount.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::LoanNotFound`] - no loan with this ID.
    /// - [`LedgerError::LoanSettled`] - nothing is due.
    /// - [`LedgerError::InvalidAmount`] - `amount` is not positive.
    /// - [`LedgerError::InsufficientFunds`] - the withdrawal would breach the minimum balance.
    ///
    /// On error the loan is unchanged.
    pub fn repay_loan(&self, loan_id: &LoanId, amount: Decimal) -> Result<Decimal, LedgerError> {
        let mut books = self.books.lock();
        let loan = books
            .loans
            .iter_mut()
            .find(|l| l.id() == loan_id)
            .ok_or_else(|| LedgerError::LoanNotFound(loan_id.clone()))?;
        if loan.status() == LoanStatus::Settled {
            return Err(LedgerError::LoanSettled(loan_id.clone()));
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let payment = amount.min(loan.amount_due());
        self.account.withdraw(payment)?;
        loan.make_payment(payment);
        let remaining = loan.amount_due();

        books.history.push(Transaction::new(
            TransactionKind::LoanRepayment,
            payment,
            format!("Paid installment for loan {loan_id}"),
        ));
        info!(
            account = %self.account.id(),
            loan = %loan_id,
            %payment,
            %remaining,
            "loan repayment"
        );
        Ok(payment)
    }

    /// Buys an investment with money from the account.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - the invested amount is not positive.
    /// - [`LedgerError::InsufficientFunds`] - the withdrawal would breach the minimum balance.
    ///
    /// On error the investment is not added.
    pub fn add_investment(&self, investment: Investment) -> Result<(), LedgerError> {
        let mut books = self.books.lock();
        self.account.withdraw(investment.amount_invested())?;
        books.history.push(Transaction::new(
            TransactionKind::NewInvestment,
            investment.amount_invested(),
            format!("FD Created: {}", investment.id()),
        ));
        info!(
            account = %self.account.id(),
            investment = %investment.id(),
            amount = %investment.amount_invested(),
            "investment opened"
        );
        books.investments.push(investment);
        Ok(())
    }

    /// Pays out every investment matured as of `today`.
    ///
    /// Each maturity value is credited on its own; a failed credit does not
    /// stop the sweep. Credited investments move to the closed archive,
    /// failed ones stay active in their original position so a later sweep
    /// can retry them.
    pub fn mature_investments(&self, today: NaiveDate) -> MaturityReport {
        let mut books = self.books.lock();
        let pending = std::mem::take(&mut books.investments);

        let mut report = MaturityReport::default();
        for investment in pending {
            if !investment.is_matured(today) {
                books.investments.push(investment);
                continue;
            }
            let value = investment.maturity_value();
            match self.account.deposit(value) {
                Ok(()) => {
                    books.history.push(Transaction::new(
                        TransactionKind::InvestmentMatured,
                        value,
                        format!("Maturity of {}", investment.id()),
                    ));
                    info!(
                        account = %self.account.id(),
                        investment = %investment.id(),
                        %value,
                        "investment matured"
                    );
                    books.closed_investments.push(investment.clone());
                    report.credited.push((investment, value));
                }
                Err(e) => {
                    warn!(
                        account = %self.account.id(),
                        investment = %investment.id(),
                        error = %e,
                        "maturity credit failed, investment kept for retry"
                    );
                    books.investments.push(investment.clone());
                    report.failed.push((investment, e));
                }
            }
        }
        report.balance = self.account.balance();
        report
    }

    /// Plain-data copy of the customer for snapshots.
    pub fn to_record(&self) -> CustomerRecord {
        let books = self.books.lock();
        let profile = self.profile.read();
        CustomerRecord {
            name: profile.name.clone(),
            date_of_birth: profile.date_of_birth,
            address: profile.address.clone(),
            salary: profile.salary,
            password: profile.password.clone(),
            security_question: profile.security.as_ref().map(|s| s.question.clone()),
            security_answer: profile.security.as_ref().map(|s| s.answer.clone()),
            account: AccountRecord::from(&self.account),
            loans: books.loans.clone(),
            investments: books.investments.clone(),
            closed_investments: books.closed_investments.clone(),
            transactions: books.history.clone(),
        }
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let profile = self.profile.read();
        writeln!(f, "Customer Details:")?;
        writeln!(f, "  Name: {}", profile.name)?;
        writeln!(f, "  Date of Birth: {}", profile.date_of_birth)?;
        writeln!(f, "  Address: {}", profile.address)?;
        writeln!(f, "  Salary: {:.2}", round_cents(profile.salary))?;
        write!(f, "  {}", self.account)
    }
}

/// Plain-data form of a [`Customer`], used for snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomerRecord {
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub salary: Decimal,
    pub password: String,
    #[serde(default)]
    pub security_question: Option<String>,
    #[serde(default)]
    pub security_answer: Option<String>,
    pub account: AccountRecord,
    #[serde(default)]
    pub loans: Vec<Loan>,
    #[serde(default)]
    pub investments: Vec<Investment>,
    #[serde(default)]
    pub closed_investments: Vec<Investment>,
    #[serde(default)]
    pub transactions: TransactionLog,
}

impl From<CustomerRecord> for Customer {
    fn from(record: CustomerRecord) -> Self {
        // A half-configured question is dropped.
        let security = match (record.security_question, record.security_answer) {
            (Some(question), Some(answer)) => Some(SecurityQuestion { question, answer }),
            _ => None,
        };
        Self {
            profile: RwLock::new(Profile {
                name: record.name,
                date_of_birth: record.date_of_birth,
                address: record.address,
                salary: record.salary,
                password: record.password,
                security,
            }),
            account: Account::from(record.account),
            books: Mutex::new(Books {
                loans: record.loans,
                investments: record.investments,
                closed_investments: record.closed_investments,
                history: record.transactions,
            }),
        }
    }
}
