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

//! Customer aggregate integration tests: loans, investments and the
//! transaction log.

use bank_ledger_rs::{
    AccountId, AccountKind, Customer, CustomerRecord, Investment, InvestmentId, LedgerError, Loan,
    LoanId, LoanKind, LoanStatus, Registration, TransactionKind,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// === Helper Functions ===

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn registration(min_balance: Decimal) -> Registration {
    Registration {
        name: "Ravi Kumar".to_string(),
        date_of_birth: date(1988, 3, 14),
        address: "12 Park Street".to_string(),
        salary: dec!(60000),
        account_kind: AccountKind::Personal,
        min_balance,
        password: "secret".to_string(),
    }
}

fn fixed_deposit(sequence: u32, amount: Decimal, tenure_years: u32) -> Investment {
    Investment::fixed_deposit(
        InvestmentId::from_sequence(sequence.into()),
        amount,
        date(2026, 1, 1),
        tenure_years,
    )
    .unwrap()
}

fn customer(min_balance: Decimal) -> Customer {
    Customer::open(
        registration(min_balance),
        AccountId::new("2000000001"),
        date(2026, 1, 1),
    )
    .unwrap()
}

// === Opening ===

#[test]
fn opening_deposit_equals_minimum_balance() {
    let customer = customer(dec!(5000));
    assert_eq!(customer.account().balance(), dec!(5000));
    assert_eq!(customer.account().min_balance(), dec!(5000));
    assert!(customer.transactions().is_empty());
}

#[test]
fn minimum_balance_account_cannot_withdraw_opening_deposit() {
    let customer = customer(dec!(5000));
    assert_eq!(customer.withdraw(dec!(100)), Err(LedgerError::InsufficientFunds));
    assert_eq!(customer.withdraw(dec!(0)), Err(LedgerError::InvalidAmount));
    assert!(customer.transactions().is_empty());
}

#[test]
fn registration_rejects_unsupported_minimum_balance() {
    let result = Customer::open(
        registration(dec!(2500)),
        AccountId::new("2000000001"),
        date(2026, 1, 1),
    );
    assert!(matches!(result, Err(LedgerError::InvalidRegistration(_))));
}

#[test]
fn registration_rejects_future_birth_date() {
    let mut form = registration(dec!(0));
    form.date_of_birth = date(2030, 1, 1);
    assert!(matches!(
        form.validate(date(2026, 1, 1)),
        Err(LedgerError::InvalidRegistration(_))
    ));
}

// === Self-service ===

#[test]
fn deposit_and_withdraw_are_logged() {
    let customer = customer(dec!(0));
    customer.deposit(dec!(300)).unwrap();
    customer.withdraw(dec!(120)).unwrap();

    let log = customer.transactions();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].kind, TransactionKind::Deposit);
    assert_eq!(log[0].amount, dec!(300));
    assert_eq!(log[0].description, "Self-deposit into account");
    assert_eq!(log[1].kind, TransactionKind::Withdrawal);
    assert_eq!(log[1].amount, dec!(120));
    assert_eq!(customer.account().balance(), dec!(180));
}

#[test]
fn failed_withdrawal_is_not_logged() {
    let customer = customer(dec!(0));
    customer.deposit(dec!(10)).unwrap();
    assert_eq!(customer.withdraw(dec!(11)), Err(LedgerError::InsufficientFunds));
    assert_eq!(customer.transactions().len(), 1);
}

// === Security ===

#[test]
fn security_answer_is_trimmed_and_case_insensitive() {
    let customer = customer(dec!(0));
    assert_eq!(
        customer.verify_security_answer("x"),
        Err(LedgerError::SecurityQuestionNotSet)
    );

    customer
        .set_security_question("What city were you born in?", "Pune")
        .unwrap();
    assert!(customer.verify_security_answer("  pune ").is_ok());
    assert_eq!(
        customer.verify_security_answer("Mumbai"),
        Err(LedgerError::SecurityAnswerMismatch)
    );
}

#[test]
fn password_change() {
    let customer = customer(dec!(0));
    assert!(customer.check_password("secret"));
    customer.set_password("n3w").unwrap();
    assert!(customer.check_password("n3w"));
    assert!(!customer.check_password("secret"));
    assert_eq!(customer.set_password("  "), Err(LedgerError::InvalidPassword));
}

// === Loans ===

#[test]
fn loan_disbursal_credits_account() {
    let customer = customer(dec!(0));
    let loan = Loan::new(LoanKind::Personal, dec!(100000), date(2026, 1, 1), 2).unwrap();
    assert_eq!(loan.total_repayable(), dec!(117722.50));
    assert_eq!(loan.end_date(), date(2028, 1, 1));

    customer.apply_loan(loan.clone()).unwrap();

    assert_eq!(customer.account().balance(), dec!(100000));
    assert_eq!(customer.loans(), vec![loan]);
    let last = customer.transactions().pop().unwrap();
    assert_eq!(last.kind, TransactionKind::LoanDisbursal);
    assert_eq!(last.description, "Loan Disbursed: Personal");
}

#[test]
fn full_repayment_settles_loan() {
    let customer = customer(dec!(0));
    let loan = Loan::new(LoanKind::Personal, dec!(100000), date(2026, 1, 1), 2).unwrap();
    let id = loan.id().clone();
    customer.apply_loan(loan).unwrap();
    customer.deposit(dec!(17722.50)).unwrap();

    let paid = customer.repay_loan(&id, dec!(117722.50)).unwrap();

    assert_eq!(paid, dec!(117722.50));
    let loan = customer.loan(&id).unwrap();
    assert_eq!(loan.amount_due(), Decimal::ZERO);
    assert_eq!(loan.status(), LoanStatus::Settled);
    assert!(customer.active_loans().is_empty());
    assert_eq!(customer.account().balance(), Decimal::ZERO);
    assert_eq!(customer.repay_loan(&id, dec!(1)), Err(LedgerError::LoanSettled(id)));
}

#[test]
fn overpayment_is_capped_and_logged_as_capped() {
    let customer = customer(dec!(0));
    let loan = Loan::new(LoanKind::Student, dec!(1000), date(2026, 1, 1), 1).unwrap();
    let id = loan.id().clone();
    customer.apply_loan(loan).unwrap();
    customer.deposit(dec!(5000)).unwrap();

    let paid = customer.repay_loan(&id, dec!(5000)).unwrap();

    assert_eq!(paid, dec!(1045.00));
    assert_eq!(customer.loan(&id).unwrap().amount_due(), Decimal::ZERO);
    assert_eq!(customer.account().balance(), dec!(4955.00));
    let last = customer.transactions().pop().unwrap();
    assert_eq!(last.kind, TransactionKind::LoanRepayment);
    assert_eq!(last.amount, dec!(1045.00));
}

#[test]
fn repayment_without_funds_leaves_loan_untouched() {
    let customer = customer(dec!(5000));
    let loan = Loan::new(LoanKind::Student, dec!(1000), date(2026, 1, 1), 1).unwrap();
    let id = loan.id().clone();
    customer.apply_loan(loan).unwrap();
    customer.withdraw(dec!(1000)).unwrap();

    assert_eq!(
        customer.repay_loan(&id, dec!(100)),
        Err(LedgerError::InsufficientFunds)
    );
    assert_eq!(customer.loan(&id).unwrap().amount_due(), dec!(1045.00));
}

#[test]
fn disbursal_past_decimal_range_is_rejected() {
    let customer = customer(dec!(0));
    customer.deposit(Decimal::MAX).unwrap();
    let logged = customer.transactions().len();
    let loan = Loan::new(LoanKind::Student, dec!(1000), date(2026, 1, 1), 1).unwrap();

    assert_eq!(customer.apply_loan(loan), Err(LedgerError::AmountOverflow));

    assert_eq!(customer.account().balance(), Decimal::MAX);
    assert!(customer.loans().is_empty());
    assert_eq!(customer.transactions().len(), logged);
}

#[test]
fn repaying_unknown_loan_fails() {
    let customer = customer(dec!(0));
    let id = LoanId::new("LN-NOPE0000");
    assert_eq!(
        customer.repay_loan(&id, dec!(10)),
        Err(LedgerError::LoanNotFound(id))
    );
}

// === Investments ===

#[test]
fn fixed_deposit_maturity_value() {
    let fd = fixed_deposit(501, dec!(10000), 3);
    assert_eq!(fd.maturity_value(), dec!(12079.50));
    assert_eq!(fd.interest_rate(), dec!(6.5));
    assert_eq!(fd.end_date(), date(2029, 1, 1));
    assert!(!fd.is_matured(date(2028, 12, 31)));
    assert!(fd.is_matured(date(2029, 1, 1)));
}

#[test]
fn investment_requires_funds_above_minimum() {
    let customer = customer(dec!(5000));
    let fd = fixed_deposit(501, dec!(1), 1);
    assert_eq!(customer.add_investment(fd), Err(LedgerError::InsufficientFunds));
    assert!(customer.investments().is_empty());
}

#[test]
fn maturity_sweep_credits_and_archives() {
    let customer = customer(dec!(0));
    customer.deposit(dec!(20000)).unwrap();
    let short = fixed_deposit(501, dec!(10000), 1);
    let long = fixed_deposit(502, dec!(5000), 5);
    customer.add_investment(short.clone()).unwrap();
    customer.add_investment(long.clone()).unwrap();
    assert_eq!(customer.account().balance(), dec!(5000));

    let report = customer.mature_investments(date(2027, 1, 1));

    assert_eq!(report.credited, vec![(short.clone(), dec!(10650.00))]);
    assert!(report.failed.is_empty());
    assert_eq!(report.balance, dec!(15650.00));
    assert_eq!(customer.investments(), vec![long]);
    assert_eq!(customer.closed_investments(), vec![short]);
    let last = customer.transactions().pop().unwrap();
    assert_eq!(last.kind, TransactionKind::InvestmentMatured);
    assert_eq!(last.description, "Maturity of INV501");
}

#[test]
fn maturity_sweep_with_nothing_due_is_empty() {
    let customer = customer(dec!(0));
    let report = customer.mature_investments(date(2026, 1, 1));
    assert!(report.is_empty());
}

#[test]
fn failed_maturity_credit_keeps_investment_active() {
    let customer = customer(dec!(0));
    customer.deposit(dec!(1000)).unwrap();
    let fd = fixed_deposit(501, dec!(1000), 1);
    customer.add_investment(fd.clone()).unwrap();
    customer.account().close();

    let report = customer.mature_investments(date(2027, 6, 1));

    assert!(report.credited.is_empty());
    assert_eq!(report.failed, vec![(fd.clone(), LedgerError::AccountClosed)]);
    assert_eq!(customer.investments(), vec![fd]);
    assert!(customer.closed_investments().is_empty());
}

#[test]
fn failed_maturity_credits_keep_their_position() {
    let customer = customer(dec!(0));
    customer.deposit(dec!(3000)).unwrap();
    let first = fixed_deposit(501, dec!(1000), 1);
    let long = fixed_deposit(502, dec!(1000), 5);
    let last = fixed_deposit(503, dec!(1000), 1);
    for investment in [&first, &long, &last] {
        customer.add_investment(investment.clone()).unwrap();
    }
    customer.account().close();

    let report = customer.mature_investments(date(2027, 6, 1));

    assert_eq!(report.failed.len(), 2);
    assert_eq!(customer.investments(), vec![first, long, last]);
}

#[test]
fn maturity_credit_past_decimal_range_is_kept_for_retry() {
    let customer = customer(dec!(0));
    customer.deposit(dec!(1000)).unwrap();
    let fd = fixed_deposit(501, dec!(1000), 1);
    customer.add_investment(fd.clone()).unwrap();
    customer.deposit(Decimal::MAX).unwrap();

    let report = customer.mature_investments(date(2027, 6, 1));

    assert_eq!(report.failed, vec![(fd.clone(), LedgerError::AmountOverflow)]);
    assert_eq!(report.balance, Decimal::MAX);
    assert_eq!(customer.investments(), vec![fd]);
}

// === Records ===

#[test]
fn record_roundtrip_preserves_books() {
    let customer = customer(dec!(0));
    customer.deposit(dec!(50000)).unwrap();
    customer
        .set_security_question("What is your favorite book?", "Dune")
        .unwrap();
    let loan = Loan::new(LoanKind::Business, dec!(20000), date(2026, 1, 1), 3).unwrap();
    customer.apply_loan(loan).unwrap();
    customer
        .add_investment(fixed_deposit(501, dec!(1000), 2))
        .unwrap();

    let record = customer.to_record();
    let json = serde_json::to_string(&record).unwrap();
    let parsed: CustomerRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, record);

    let restored = Customer::from(parsed);
    assert_eq!(restored.to_record(), record);
    assert_eq!(
        restored.security_question().as_deref(),
        Some("What is your favorite book?")
    );
}

#[test]
fn half_configured_security_question_is_dropped() {
    let mut record = customer(dec!(0)).to_record();
    record.security_question = Some("What is your favorite movie?".to_string());
    record.security_answer = None;

    let restored = Customer::from(record);
    assert_eq!(restored.security_question(), None);
}

#[test]
fn display_lists_profile_and_account() {
    let text = customer(dec!(10000)).to_string();
    assert!(text.starts_with("Customer Details:"));
    assert!(text.contains("Name: Ravi Kumar"));
    assert!(text.contains("Salary: 60000.00"));
    assert!(text.contains("Balance: 10000.00"));
}
