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

//! Lock-ordering tests backed by parking_lot's deadlock detector.
//!
//! These tests drive the ledger's locking paths (per-account locks, the
//! customer books and the roster map) from many threads at once while a
//! background thread watches the lock graph for cycles.

use bank_ledger_rs::{
    AccountId, AccountKind, Bank, BatchConfig, LoanKind, Registration, SequentialAccountIds,
};
use chrono::NaiveDate;
use parking_lot::deadlock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

// === Helpers ===

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
}

fn bank_with(customers: usize, funds: Decimal) -> (Arc<Bank>, Vec<AccountId>) {
    let bank = Arc::new(Bank::with_id_source(
        BatchConfig::default(),
        Box::new(SequentialAccountIds::starting_at(1_000_000_000)),
    ));
    let ids = (0..customers)
        .map(|i| {
            let customer = bank
                .register(
                    Registration {
                        name: format!("Customer {i}"),
                        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                        address: "Test Lane".to_string(),
                        salary: dec!(50000),
                        account_kind: AccountKind::Personal,
                        min_balance: dec!(0),
                        password: "pw".to_string(),
                    },
                    today(),
                )
                .unwrap();
            customer.deposit(funds).unwrap();
            customer.account_id().clone()
        })
        .collect();
    (bank, ids)
}

// A macro rather than a fn: `DeadlockedThread` lives in a private
// parking_lot_core module and cannot be named in a signature.
macro_rules! report_and_abort {
    ($cycles:expr) => {{
        let cycles = $cycles;
        eprintln!("lock cycle detected in ledger locks ({} cycle(s))", cycles.len());
        for (n, threads) in cycles.iter().enumerate() {
            for t in threads {
                eprintln!("cycle {n}: thread {:?}\n{:#?}", t.thread_id(), t.backtrace());
            }
        }
        std::process::abort();
    }};
}

/// Background thread that polls parking_lot's lock graph while a test runs.
///
/// Deadlocked workers never return from `join`, so a detected cycle is
/// reported with each thread's backtrace and the test process is aborted.
struct LockWatch {
    stop: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

impl LockWatch {
    const POLL: Duration = Duration::from_millis(50);

    fn start() -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("lock-watch".to_string())
            .spawn(move || {
                while !flag.load(Ordering::Acquire) {
                    thread::sleep(Self::POLL);
                    let cycles = deadlock::check_deadlock();
                    if !cycles.is_empty() {
                        report_and_abort!(&cycles);
                    }
                }
            })
            .unwrap();
        Self { stop, handle }
    }

    /// Stops polling and waits for the watcher to exit.
    fn finish(self) {
        self.stop.store(true, Ordering::Release);
        self.handle.join().unwrap();
    }
}


// === Tests ===

/// Transfers in both directions between the same pair of accounts.
#[test]
fn no_deadlock_opposite_transfers() {
    let watch = LockWatch::start();
    let (bank, ids) = bank_with(2, dec!(100000));
    let mut handles = Vec::new();

    for t in 0..8 {
        let bank = bank.clone();
        let (from, to) = if t % 2 == 0 {
            (ids[0].clone(), ids[1].clone())
        } else {
            (ids[1].clone(), ids[0].clone())
        };
        handles.push(thread::spawn(move || {
            for _ in 0..500 {
                let _ = bank.transfer(&from, &to, dec!(3.5));
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    watch.finish();

    let total: Decimal = ids
        .iter()
        .map(|id| bank.customer(id).unwrap().account().balance())
        .sum();
    assert_eq!(total, dec!(200000));
}

/// Transfers around a ring of accounts while other threads read books.
#[test]
fn no_deadlock_transfer_ring_with_readers() {
    let watch = LockWatch::start();
    let (bank, ids) = bank_with(6, dec!(10000));
    let ids = Arc::new(ids);
    let mut handles = Vec::new();

    for t in 0..6 {
        let bank = bank.clone();
        let ids = ids.clone();
        handles.push(thread::spawn(move || {
            for i in 0..300 {
                let from = &ids[(t + i) % ids.len()];
                let to = &ids[(t + i + 1) % ids.len()];
                let _ = bank.transfer(from, to, dec!(1.25));
            }
        }));
    }
    for _ in 0..3 {
        let bank = bank.clone();
        let ids = ids.clone();
        handles.push(thread::spawn(move || {
            for i in 0..300 {
                let customer = bank.customer(&ids[i % ids.len()]).unwrap();
                let _ = customer.to_record();
                let _ = customer.to_string();
                let _ = bank.account_summaries();
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    watch.finish();

    let total: Decimal = ids
        .iter()
        .map(|id| bank.customer(id).unwrap().account().balance())
        .sum();
    assert_eq!(total, dec!(60000));
}

/// Loans, repayments and investments on one customer from many threads.
#[test]
fn no_deadlock_compound_operations_single_customer() {
    let watch = LockWatch::start();
    let (bank, ids) = bank_with(1, dec!(1000000));
    let id = ids[0].clone();
    let mut handles = Vec::new();

    for t in 0..6 {
        let bank = bank.clone();
        let id = id.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..50 {
                match t % 3 {
                    0 => {
                        if let Ok(loan) = bank.apply_loan(&id, LoanKind::Student, dec!(100), 1, today()) {
                            let _ = bank.repay_loan(&id, loan.id(), dec!(200));
                        }
                    }
                    1 => {
                        let _ = bank.open_fixed_deposit(&id, dec!(10), 1, today());
                        let _ = bank.mature_investments(&id, today());
                    }
                    _ => {
                        let _ = bank.deposit(&id, dec!(5));
                        let _ = bank.withdraw(&id, dec!(5));
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    watch.finish();

    let customer = bank.customer(&id).unwrap();
    assert_eq!(customer.loans().len(), 100);
    assert!(customer.active_loans().is_empty());
    assert_eq!(customer.investments().len(), 100);
}

/// Batch deletion running while other threads deposit and transfer.
#[test]
fn no_deadlock_batch_deletion_under_load() {
    let watch = LockWatch::start();
    let (bank, ids) = bank_with(40, dec!(1000));
    let stop = Arc::new(AtomicBool::new(false));
    let mut handles = Vec::new();

    for t in 0..4 {
        let bank = bank.clone();
        let ids = ids.clone();
        let stop = stop.clone();
        handles.push(thread::spawn(move || {
            let mut i = t;
            while !stop.load(Ordering::SeqCst) {
                let from = &ids[i % ids.len()];
                let to = &ids[(i + 7) % ids.len()];
                let _ = bank.deposit(from, dec!(1));
                let _ = bank.transfer(from, to, dec!(1));
                i += 1;
            }
        }));
    }

    thread::sleep(Duration::from_millis(50));
    let report = bank.batch_delete(&ids[..30]);
    stop.store(true, Ordering::SeqCst);

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    watch.finish();

    assert_eq!(report.removed.len(), 30);
    assert_eq!(bank.roster().len(), 10);
}
