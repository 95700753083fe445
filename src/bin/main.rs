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

use bank_ledger_rs::{
    AccountId, AccountKind, Bank, BatchConfig, BatchDeletionReport, Config, Customer, JsonStore,
    LedgerError, LoanId, LoanKind, RandomAccountIds, Registration, SECURITY_QUESTIONS, StoreError,
    round_cents,
};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Bank Ledger - customer and admin operations on a persisted bank
///
/// State lives in JSON snapshots inside the data directory and is saved
/// after every successful change.
#[derive(Parser, Debug)]
#[command(name = "bank-ledger")]
#[command(about = "A banking ledger with loans, fixed deposits and batch account closure", long_about = None)]
struct Cli {
    /// Directory holding the JSON snapshots
    #[arg(long, global = true, env = "BANK_DATA_DIR", default_value = Config::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Maximum concurrent workers for batch deletion
    #[arg(long, global = true, default_value_t = BatchConfig::DEFAULT_MAX_WORKERS)]
    batch_workers: usize,

    /// Seconds to wait for batch deletion tasks
    #[arg(long, global = true, default_value_t = 60)]
    batch_timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            data_dir: self.data_dir.clone(),
            batch: BatchConfig {
                max_workers: self.batch_workers,
                timeout: Duration::from_secs(self.batch_timeout_secs),
                ..BatchConfig::default()
            },
        }
    }
}

#[derive(Args, Debug)]
struct CustomerAuth {
    /// Bank account number
    #[arg(long)]
    account: String,
    #[arg(long)]
    password: String,
}

#[derive(Args, Debug)]
struct AdminAuth {
    #[arg(long)]
    admin_id: String,
    #[arg(long)]
    password: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a new customer account
    Register {
        #[arg(long)]
        name: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: NaiveDate,
        #[arg(long)]
        address: String,
        #[arg(long)]
        salary: Decimal,
        /// Personal or Business
        #[arg(long, default_value = "Personal")]
        account_type: AccountKind,
        /// 0, 5000 or 10000
        #[arg(long, default_value = "0")]
        min_balance: Decimal,
        #[arg(long)]
        password: String,
    },
    /// Show account details
    Login {
        #[command(flatten)]
        auth: CustomerAuth,
    },
    Deposit {
        #[command(flatten)]
        auth: CustomerAuth,
        #[arg(long)]
        amount: Decimal,
    },
    Withdraw {
        #[command(flatten)]
        auth: CustomerAuth,
        #[arg(long)]
        amount: Decimal,
    },
    /// Send money to another account
    Transfer {
        #[command(flatten)]
        auth: CustomerAuth,
        /// Recipient account number
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: Decimal,
    },
    #[command(subcommand)]
    Loan(LoanCommand),
    /// Open a fixed deposit
    Invest {
        #[command(flatten)]
        auth: CustomerAuth,
        #[arg(long)]
        amount: Decimal,
        /// Tenure in years
        #[arg(long)]
        tenure: u32,
    },
    /// List active and matured investments
    Investments {
        #[command(flatten)]
        auth: CustomerAuth,
    },
    /// Pay out matured investments
    Mature {
        #[command(flatten)]
        auth: CustomerAuth,
    },
    /// Transaction history
    Statement {
        #[command(flatten)]
        auth: CustomerAuth,
        /// Write CSV instead of text
        #[arg(long)]
        csv: bool,
    },
    /// List the predefined security questions
    SecurityQuestions,
    /// Set the security question used for password reset
    SetSecurity {
        #[command(flatten)]
        auth: CustomerAuth,
        /// Question number from `security-questions`
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
        question: u8,
        #[arg(long)]
        answer: String,
    },
    /// Reset a customer password with the security answer
    ResetPassword {
        #[arg(long)]
        account: String,
        #[arg(long)]
        answer: String,
        #[arg(long)]
        new_password: String,
    },
    #[command(subcommand)]
    Support(SupportCommand),
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand, Debug)]
enum LoanCommand {
    /// Apply for a loan; approved loans are disbursed immediately
    Apply {
        #[command(flatten)]
        auth: CustomerAuth,
        /// Personal, Student or Business
        #[arg(long)]
        kind: LoanKind,
        #[arg(long)]
        amount: Decimal,
        /// Tenure in years
        #[arg(long)]
        tenure: u32,
    },
    /// Pay an installment; overpayments are capped at the amount due
    Repay {
        #[command(flatten)]
        auth: CustomerAuth,
        #[arg(long)]
        loan: String,
        #[arg(long)]
        amount: Decimal,
    },
    List {
        #[command(flatten)]
        auth: CustomerAuth,
    },
}

#[derive(Subcommand, Debug)]
enum SupportCommand {
    /// Send a message to support
    Contact {
        #[command(flatten)]
        auth: CustomerAuth,
        #[arg(long)]
        message: String,
    },
    /// List unresolved messages
    List {
        #[command(flatten)]
        auth: AdminAuth,
    },
    /// Reply to a message and mark it resolved
    Resolve {
        #[command(flatten)]
        auth: AdminAuth,
        #[arg(long)]
        id: u32,
        #[arg(long)]
        reply: String,
    },
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// All accounts as CSV
    List {
        #[command(flatten)]
        auth: AdminAuth,
    },
    /// Full details of one customer
    Show {
        #[command(flatten)]
        auth: AdminAuth,
        #[arg(long)]
        account: String,
    },
    /// Remove one customer without settlement
    Delete {
        #[command(flatten)]
        auth: AdminAuth,
        #[arg(long)]
        account: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Settle, close and remove several accounts concurrently
    BatchDelete {
        #[command(flatten)]
        auth: AdminAuth,
        /// Comma-separated account numbers
        #[arg(long)]
        accounts: String,
    },
    /// Set the admin security question
    SetSecurity {
        #[command(flatten)]
        auth: AdminAuth,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
        question: u8,
        #[arg(long)]
        answer: String,
    },
    /// Reset the admin password with the security answer
    ResetPassword {
        #[arg(long)]
        answer: String,
        #[arg(long)]
        new_password: String,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("deletion not confirmed (pass --yes)")]
    NotConfirmed,
}

/// Whether a command changed state that must be saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    Changed,
    ReadOnly,
}

fn main() {
    init_tracing();
    let args = Cli::parse();
    let config = args.config();
    let store = JsonStore::new(config.data_dir.clone());
    tracing::debug!(dir = %store.dir().display(), "loading bank data");

    let bank = match Bank::load(&store, config.batch, Box::new(RandomAccountIds::new())) {
        Ok(bank) => bank,
        Err(e) => {
            eprintln!("Error loading bank data: {}", e);
            process::exit(1);
        }
    };

    let today = Local::now().date_naive();
    let mut stdout = std::io::stdout();
    match execute(&bank, args.command, today, &mut stdout) {
        Ok(Effect::Changed) => {
            if let Err(e) = bank.save(&store) {
                tracing::error!(error = %e, "saving bank data failed");
                eprintln!("Error saving bank data (changes kept in memory only): {}", e);
                process::exit(1);
            }
        }
        Ok(Effect::ReadOnly) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .init();
}

fn login(bank: &Bank, auth: &CustomerAuth) -> Result<Arc<Customer>, LedgerError> {
    bank.login(&AccountId::new(auth.account.trim()), &auth.password)
}

fn login_admin(bank: &Bank, auth: &AdminAuth) -> Result<(), LedgerError> {
    bank.login_admin(&auth.admin_id, &auth.password)
}

/// Splits a comma-separated list of account numbers.
fn parse_account_list(input: &str) -> Vec<AccountId> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(AccountId::new)
        .collect()
}

/// Runs one command, writing its output to `out`.
fn execute<W: Write>(
    bank: &Bank,
    command: Command,
    today: NaiveDate,
    out: &mut W,
) -> Result<Effect, CliError> {
    match command {
        Command::Register {
            name,
            dob,
            address,
            salary,
            account_type,
            min_balance,
            password,
        } => {
            let customer = bank.register(
                Registration {
                    name,
                    date_of_birth: dob,
                    address,
                    salary,
                    account_kind: account_type,
                    min_balance,
                    password,
                },
                today,
            )?;
            writeln!(out, "Registration successful.")?;
            writeln!(out, "Your account number is: {}", customer.account_id())?;
            Ok(Effect::Changed)
        }
        Command::Login { auth } => {
            let customer = login(bank, &auth)?;
            writeln!(out, "Welcome, {}!", customer.name())?;
            writeln!(out, "{}", customer)?;
            Ok(Effect::ReadOnly)
        }
        Command::Deposit { auth, amount } => {
            let customer = login(bank, &auth)?;
            let balance = bank.deposit(customer.account_id(), amount)?;
            writeln!(out, "Deposited {:.2}. New balance: {:.2}", round_cents(amount), round_cents(balance))?;
            Ok(Effect::Changed)
        }
        Command::Withdraw { auth, amount } => {
            let customer = login(bank, &auth)?;
            let balance = bank.withdraw(customer.account_id(), amount)?;
            writeln!(out, "Withdrew {:.2}. New balance: {:.2}", round_cents(amount), round_cents(balance))?;
            Ok(Effect::Changed)
        }
        Command::Transfer { auth, to, amount } => {
            let customer = login(bank, &auth)?;
            let receipt = bank.transfer(customer.account_id(), &AccountId::new(to.trim()), amount)?;
            writeln!(
                out,
                "Transferred {:.2} to {}. New balance: {:.2}",
                round_cents(receipt.amount),
                receipt.recipient,
                round_cents(receipt.sender_balance)
            )?;
            Ok(Effect::Changed)
        }
        Command::Loan(LoanCommand::Apply {
            auth,
            kind,
            amount,
            tenure,
        }) => {
            let customer = login(bank, &auth)?;
            let loan = bank.apply_loan(customer.account_id(), kind, amount, tenure, today)?;
            writeln!(out, "Loan approved and disbursed.")?;
            writeln!(out, "{}", loan)?;
            Ok(Effect::Changed)
        }
        Command::Loan(LoanCommand::Repay { auth, loan, amount }) => {
            let customer = login(bank, &auth)?;
            let loan_id = LoanId::new(loan.trim());
            let paid = bank.repay_loan(customer.account_id(), &loan_id, amount)?;
            if paid < amount {
                writeln!(out, "Payment capped at the amount due: {:.2}", round_cents(paid))?;
            }
            match customer.loan(&loan_id) {
                Some(loan) if loan.amount_due() > Decimal::ZERO => writeln!(
                    out,
                    "Paid {:.2}. Remaining due: {:.2}",
                    round_cents(paid),
                    round_cents(loan.amount_due())
                )?,
                _ => writeln!(out, "Paid {:.2}. Loan {} is fully repaid.", round_cents(paid), loan_id)?,
            }
            Ok(Effect::Changed)
        }
        Command::Loan(LoanCommand::List { auth }) => {
            let customer = login(bank, &auth)?;
            write_loans(&customer, out)?;
            Ok(Effect::ReadOnly)
        }
        Command::Invest {
            auth,
            amount,
            tenure,
        } => {
            let customer = login(bank, &auth)?;
            let investment = bank.open_fixed_deposit(customer.account_id(), amount, tenure, today)?;
            writeln!(out, "Fixed deposit created.")?;
            writeln!(out, "{}", investment)?;
            Ok(Effect::Changed)
        }
        Command::Investments { auth } => {
            let customer = login(bank, &auth)?;
            write_investments(&customer, out)?;
            Ok(Effect::ReadOnly)
        }
        Command::Mature { auth } => {
            let customer = login(bank, &auth)?;
            let report = bank.mature_investments(customer.account_id(), today)?;
            if report.is_empty() {
                writeln!(out, "You have no investments that are due for maturity.")?;
                return Ok(Effect::ReadOnly);
            }
            for (investment, value) in &report.credited {
                writeln!(
                    out,
                    "Investment {} has matured. Amount {:.2} has been credited.",
                    investment.id(),
                    round_cents(*value)
                )?;
            }
            for (investment, e) in &report.failed {
                writeln!(out, "Error processing maturity for {}: {}", investment.id(), e)?;
            }
            writeln!(out, "New account balance: {:.2}", round_cents(report.balance))?;
            Ok(Effect::Changed)
        }
        Command::Statement { auth, csv } => {
            let customer = login(bank, &auth)?;
            if csv {
                write_statement_csv(&customer, out)?;
            } else {
                writeln!(out, "--- Transaction History for {} ---", customer.name())?;
                let history = customer.transactions();
                if history.is_empty() {
                    writeln!(out, "No transactions found.")?;
                }
                for tx in history {
                    writeln!(out, "{}", tx)?;
                }
            }
            Ok(Effect::ReadOnly)
        }
        Command::SecurityQuestions => {
            for (n, question) in SECURITY_QUESTIONS.iter().enumerate() {
                writeln!(out, "{}. {}", n + 1, question)?;
            }
            Ok(Effect::ReadOnly)
        }
        Command::SetSecurity {
            auth,
            question,
            answer,
        } => {
            let customer = login(bank, &auth)?;
            customer.set_security_question(SECURITY_QUESTIONS[usize::from(question) - 1], &answer)?;
            writeln!(out, "Security question updated.")?;
            Ok(Effect::Changed)
        }
        Command::ResetPassword {
            account,
            answer,
            new_password,
        } => {
            bank.reset_customer_password(&AccountId::new(account.trim()), &answer, &new_password)?;
            writeln!(out, "Password reset successful.")?;
            Ok(Effect::Changed)
        }
        Command::Support(command) => execute_support(bank, command, out),
        Command::Admin(command) => execute_admin(bank, command, out),
    }
}

fn execute_support<W: Write>(
    bank: &Bank,
    command: SupportCommand,
    out: &mut W,
) -> Result<Effect, CliError> {
    match command {
        SupportCommand::Contact { auth, message } => {
            let customer = login(bank, &auth)?;
            let id = bank.contact_support(customer.account_id(), &message)?;
            writeln!(out, "Your message has been sent (ID: {}).", id)?;
            Ok(Effect::Changed)
        }
        SupportCommand::List { auth } => {
            login_admin(bank, &auth)?;
            let open = bank.support().unresolved();
            if open.is_empty() {
                writeln!(out, "No unresolved support messages.")?;
            }
            for message in open {
                writeln!(out, "{}", message)?;
            }
            Ok(Effect::ReadOnly)
        }
        SupportCommand::Resolve { auth, id, reply } => {
            login_admin(bank, &auth)?;
            bank.resolve_message(id, &reply)?;
            writeln!(out, "Message {} resolved.", id)?;
            Ok(Effect::Changed)
        }
    }
}

fn execute_admin<W: Write>(
    bank: &Bank,
    command: AdminCommand,
    out: &mut W,
) -> Result<Effect, CliError> {
    match command {
        AdminCommand::List { auth } => {
            login_admin(bank, &auth)?;
            write_accounts(bank, out)?;
            Ok(Effect::ReadOnly)
        }
        AdminCommand::Show { auth, account } => {
            login_admin(bank, &auth)?;
            let customer = bank.customer(&AccountId::new(account.trim()))?;
            writeln!(out, "{}", customer)?;
            write_loans(&customer, out)?;
            write_investments(&customer, out)?;
            writeln!(out, "--- Transaction History ---")?;
            for tx in customer.transactions() {
                writeln!(out, "{}", tx)?;
            }
            Ok(Effect::ReadOnly)
        }
        AdminCommand::Delete { auth, account, yes } => {
            login_admin(bank, &auth)?;
            let account_id = AccountId::new(account.trim());
            bank.customer(&account_id)?;
            if !yes {
                return Err(CliError::NotConfirmed);
            }
            let customer = bank.delete_customer(&account_id)?;
            writeln!(out, "Customer {} ({}) deleted.", customer.name(), account_id)?;
            Ok(Effect::Changed)
        }
        AdminCommand::BatchDelete { auth, accounts } => {
            login_admin(bank, &auth)?;
            let report = bank.batch_delete(&parse_account_list(&accounts));
            write_batch_report(&report, out)?;
            if report.removed.is_empty() {
                Ok(Effect::ReadOnly)
            } else {
                Ok(Effect::Changed)
            }
        }
        AdminCommand::SetSecurity {
            auth,
            question,
            answer,
        } => {
            login_admin(bank, &auth)?;
            bank.set_admin_security_question(SECURITY_QUESTIONS[usize::from(question) - 1], &answer)?;
            writeln!(out, "Security question updated.")?;
            Ok(Effect::Changed)
        }
        AdminCommand::ResetPassword {
            answer,
            new_password,
        } => {
            bank.reset_admin_password(&answer, &new_password)?;
            writeln!(out, "Password reset successful.")?;
            Ok(Effect::Changed)
        }
    }
}

fn write_loans<W: Write>(customer: &Customer, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "--- Loans for {} ---", customer.name())?;
    let loans = customer.loans();
    if loans.is_empty() {
        writeln!(out, "No active loans.")?;
    }
    for loan in loans {
        writeln!(out, "{}", loan)?;
    }
    Ok(())
}

fn write_investments<W: Write>(
    customer: &Customer,
    out: &mut W,
) -> std::io::Result<()> {
    writeln!(out, "--- Investments for {} ---", customer.name())?;
    let active = customer.investments();
    if active.is_empty() {
        writeln!(out, "No investments found.")?;
    }
    for investment in active {
        writeln!(out, "{}", investment)?;
    }
    let closed = customer.closed_investments();
    if !closed.is_empty() {
        writeln!(out, "--- Matured ---")?;
        for investment in closed {
            writeln!(out, "{}", investment)?;
        }
    }
    Ok(())
}

fn write_batch_report<W: Write>(report: &BatchDeletionReport, out: &mut W) -> std::io::Result<()> {
    for id in &report.not_found {
        writeln!(out, "Warning: no customer found with account number {}. Skipping.", id)?;
    }
    if report.removed.is_empty() {
        writeln!(out, "No valid accounts to delete.")?;
        return Ok(());
    }
    for outcome in &report.outcomes {
        writeln!(
            out,
            "Closed {} ({}): refunded {:.2}, charges collected {:.2}",
            outcome.account_id,
            outcome.customer_name,
            round_cents(outcome.caution_refund),
            round_cents(outcome.charges_collected)
        )?;
    }
    if report.timed_out {
        writeln!(out, "Warning: some closure tasks did not finish in time.")?;
    }
    writeln!(out, "{} account(s) deleted.", report.removed.len())
}

/// Account listing row with amounts at two decimals.
#[derive(Serialize)]
struct AccountRow<'a> {
    account: &'a str,
    name: &'a str,
    kind: &'a str,
    balance: Decimal,
    min_balance: Decimal,
    closed: bool,
}

/// Write all accounts as CSV.
///
/// # CSV Format
///
/// Columns: `account, name, kind, balance, min_balance, closed`
pub fn write_accounts<W: Write>(bank: &Bank, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for summary in bank.account_summaries() {
        wtr.serialize(AccountRow {
            account: summary.account.as_str(),
            name: &summary.name,
            kind: &summary.kind,
            balance: round_cents(summary.balance),
            min_balance: round_cents(summary.min_balance),
            closed: summary.closed,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a customer's transaction log as CSV.
///
/// Columns: `timestamp, kind, amount, description`
pub fn write_statement_csv<W: Write>(
    customer: &Customer,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for tx in customer.transactions() {
        wtr.serialize(&tx)?;
    }
    wtr.flush()?;
    Ok(())
}
