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

//! Concurrent batch account closure.
//!
//! Each targeted customer is settled by an independent task:
//!
//! 1. Refund the caution deposit (the account's minimum balance), if any.
//! 2. Try to collect the closure charges. Failure is tolerated; closure is
//!    never blocked by fees that cannot be collected.
//! 3. Close the account.
//!
//! Tasks run on a bounded pool of named worker threads fed through a
//! channel. The orchestrator waits for all of them up to a timeout, then
//! removes *every* targeted customer from the roster in one step, whether
//! or not its task finished.

use crate::LedgerError;
use crate::base::AccountId;
use crate::config::BatchConfig;
use crate::customer::Customer;
use crate::roster::Roster;
use crossbeam::channel::{self, RecvTimeoutError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fees withdrawn when an account is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosureCharges {
    pub bank_charge: Decimal,
    pub government_tax: Decimal,
}

impl ClosureCharges {
    pub fn total(&self) -> Decimal {
        self.bank_charge + self.government_tax
    }
}

impl Default for ClosureCharges {
    fn default() -> Self {
        Self {
            bank_charge: dec!(140.00),
            government_tax: dec!(30.00),
        }
    }
}

/// What happened to one account during closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureOutcome {
    pub account_id: AccountId,
    pub customer_name: String,
    /// Caution deposit credited back (zero when there was none or it failed).
    pub caution_refund: Decimal,
    pub refund_error: Option<LedgerError>,
    /// Charges withdrawn (zero when they could not be collected).
    pub charges_collected: Decimal,
    pub final_balance: Decimal,
}

/// Summary of a batch deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDeletionReport {
    /// Requested account numbers that matched no customer.
    pub not_found: Vec<AccountId>,
    /// Outcomes of the tasks that finished before the deadline.
    pub outcomes: Vec<ClosureOutcome>,
    /// Account numbers removed from the roster.
    pub removed: Vec<AccountId>,
    pub timed_out: bool,
}

/// Settles and closes a single account.
pub fn close_account(customer: &Customer, charges: &ClosureCharges) -> ClosureOutcome {
    let account = customer.account();
    let mut outcome = ClosureOutcome {
        account_id: account.id().clone(),
        customer_name: customer.name(),
        caution_refund: Decimal::ZERO,
        refund_error: None,
        charges_collected: Decimal::ZERO,
        final_balance: Decimal::ZERO,
    };

    let caution = account.min_balance();
    if caution > Decimal::ZERO {
        match account.deposit(caution) {
            Ok(()) => outcome.caution_refund = caution,
            Err(e) => {
                warn!(account = %account.id(), error = %e, "caution deposit refund failed");
                outcome.refund_error = Some(e);
            }
        }
    }

    match account.withdraw(charges.total()) {
        Ok(()) => outcome.charges_collected = charges.total(),
        Err(e) => debug!(account = %account.id(), error = %e, "closure charges not collected"),
    }

    account.close();
    outcome.final_balance = account.balance();
    info!(
        account = %account.id(),
        customer = %outcome.customer_name,
        refund = %outcome.caution_refund,
        charges = %outcome.charges_collected,
        "account closed"
    );
    outcome
}

/// Batch deletion engine.
#[derive(Debug, Clone)]
pub struct BatchDeletion {
    config: BatchConfig,
}

impl BatchDeletion {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Closes the given accounts concurrently and removes them from `roster`.
    ///
    /// Unknown and repeated account numbers are skipped. This never fails as
    /// a whole; per-account problems are logged and reported in the outcomes.
    pub fn run(&self, roster: &Roster, account_ids: &[AccountId]) -> BatchDeletionReport {
        let mut report = BatchDeletionReport::default();
        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for id in account_ids {
            if !seen.insert(id.clone()) {
                continue;
            }
            match roster.get(id) {
                Some(customer) => targets.push(customer),
                None => {
                    warn!(account = %id, "batch deletion: no customer with this account number");
                    report.not_found.push(id.clone());
                }
            }
        }
        if targets.is_empty() {
            return report;
        }

        let (outcomes, timed_out) = self.settle(&targets);
        report.outcomes = outcomes;
        report.timed_out = timed_out;

        for customer in &targets {
            if roster.remove(customer.account_id()).is_some() {
                report.removed.push(customer.account_id().clone());
            }
        }
        info!(
            requested = account_ids.len(),
            removed = report.removed.len(),
            not_found = report.not_found.len(),
            timed_out,
            "batch deletion finished"
        );
        report
    }

    /// Runs the closure tasks on the worker pool and collects their outcomes.
    fn settle(&self, targets: &[Arc<Customer>]) -> (Vec<ClosureOutcome>, bool) {
        let worker_count = targets.len().min(self.config.max_workers.max(1));
        let (job_tx, job_rx) = channel::unbounded::<Arc<Customer>>();
        let (outcome_tx, outcome_rx) = channel::unbounded::<ClosureOutcome>();
        let cancelled = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);
        for n in 1..=worker_count {
            let jobs = job_rx.clone();
            let results = outcome_tx.clone();
            let cancelled = Arc::clone(&cancelled);
            let charges = self.config.charges;
            let spawned = thread::Builder::new()
                .name(format!("closure-worker-{n}"))
                .spawn(move || {
                    while let Ok(customer) = jobs.recv() {
                        if cancelled.load(Ordering::Acquire) {
                            debug!(account = %customer.account_id(), "closure task cancelled");
                            continue;
                        }
                        if results.send(close_account(&customer, &charges)).is_err() {
                            break;
                        }
                    }
                });
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => warn!(error = %e, "could not start closure worker"),
            }
        }
        drop(job_rx);
        drop(outcome_tx);

        if workers.is_empty() {
            warn!("no closure workers available, settling on the calling thread");
            let outcomes = targets
                .iter()
                .map(|c| close_account(c, &self.config.charges))
                .collect();
            return (outcomes, false);
        }

        for customer in targets {
            // Receivers outlive this loop; the send cannot fail.
            let _ = job_tx.send(Arc::clone(customer));
        }
        drop(job_tx);

        let deadline = Instant::now().checked_add(self.config.timeout);
        let mut outcomes = Vec::with_capacity(targets.len());
        let mut timed_out = false;
        while outcomes.len() < targets.len() {
            let received = match deadline {
                Some(deadline) => outcome_rx.recv_deadline(deadline),
                None => outcome_rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(outcome) => outcomes.push(outcome),
                Err(RecvTimeoutError::Timeout) => {
                    cancelled.store(true, Ordering::Release);
                    timed_out = true;
                    warn!(
                        finished = outcomes.len(),
                        total = targets.len(),
                        "batch deletion timed out, cancelling pending tasks"
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    warn!(
                        finished = outcomes.len(),
                        total = targets.len(),
                        "closure workers stopped early"
                    );
                    break;
                }
            }
        }

        // Timed-out workers are left to drain on their own.
        if !timed_out {
            for worker in workers {
                if worker.join().is_err() {
                    warn!("closure worker panicked");
                }
            }
        }
        (outcomes, timed_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountKind;
    use crate::customer::Registration;
    use chrono::NaiveDate;

    fn customer(id: &str, min_balance: Decimal) -> Customer {
        Customer::open(
            Registration {
                name: format!("Customer {id}"),
                date_of_birth: NaiveDate::from_ymd_opt(1985, 1, 1).unwrap(),
                address: "1 Main St".to_string(),
                salary: dec!(30000),
                account_kind: AccountKind::Personal,
                min_balance,
                password: "pw".to_string(),
            },
            AccountId::new(id),
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn close_refunds_caution_and_collects_charges() {
        let c = customer("1", dec!(5000));
        let outcome = close_account(&c, &ClosureCharges::default());

        assert_eq!(outcome.caution_refund, dec!(5000));
        assert_eq!(outcome.charges_collected, dec!(170.00));
        // 5000 opening + 5000 refund - 170 charges
        assert_eq!(outcome.final_balance, dec!(9830.00));
        assert!(c.account().is_closed());
    }

    #[test]
    fn close_tolerates_uncollectable_charges() {
        let c = customer("2", Decimal::ZERO);
        let outcome = close_account(&c, &ClosureCharges::default());

        assert_eq!(outcome.caution_refund, Decimal::ZERO);
        assert_eq!(outcome.charges_collected, Decimal::ZERO);
        assert_eq!(outcome.final_balance, Decimal::ZERO);
        assert!(c.account().is_closed());
    }

    #[test]
    fn closing_twice_does_not_refund_again() {
        let c = customer("3", dec!(10000));
        close_account(&c, &ClosureCharges::default());
        let balance = c.account().balance();

        let second = close_account(&c, &ClosureCharges::default());
        assert_eq!(second.refund_error, Some(LedgerError::AccountClosed));
        assert_eq!(c.account().balance(), balance);
    }

    #[test]
    fn charges_total() {
        assert_eq!(ClosureCharges::default().total(), dec!(170));
    }
}
