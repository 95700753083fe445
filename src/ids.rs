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

//! Unique ID sources.

use crate::base::{AccountId, InvestmentId};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Issues account numbers.
///
/// Implementations must never return an ID they have already issued or
/// been told about via [`AccountIdSource::reserve`].
pub trait AccountIdSource: Send + Sync {
    fn next_account_id(&self) -> AccountId;

    /// Marks existing IDs (e.g. loaded from a snapshot) as taken.
    fn reserve(&self, ids: &mut dyn Iterator<Item = AccountId>);
}

/// Random 10-digit account numbers.
#[derive(Debug, Default)]
pub struct RandomAccountIds {
    used: Mutex<HashSet<AccountId>>,
}

impl RandomAccountIds {
    const LOWEST: u64 = 1_000_000_000;
    const HIGHEST: u64 = 9_999_999_999;

    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountIdSource for RandomAccountIds {
    fn next_account_id(&self) -> AccountId {
        let mut used = self.used.lock();
        let mut rng = rand::rng();
        loop {
            let candidate = AccountId::new(
                rng.random_range(Self::LOWEST..=Self::HIGHEST).to_string(),
            );
            if used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    fn reserve(&self, ids: &mut dyn Iterator<Item = AccountId>) {
        self.used.lock().extend(ids);
    }
}

/// Sequential account numbers starting at a fixed value. Handy in tests.
#[derive(Debug)]
pub struct SequentialAccountIds {
    next: AtomicU64,
}

impl SequentialAccountIds {
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl AccountIdSource for SequentialAccountIds {
    fn next_account_id(&self) -> AccountId {
        AccountId::new(self.next.fetch_add(1, Ordering::Relaxed).to_string())
    }

    fn reserve(&self, ids: &mut dyn Iterator<Item = AccountId>) {
        let highest = ids.filter_map(|id| id.as_str().parse::<u64>().ok()).max();
        if let Some(highest) = highest {
            self.next.fetch_max(highest + 1, Ordering::Relaxed);
        }
    }
}

/// Issues `INV<n>` investment IDs, starting after 500.
#[derive(Debug)]
pub struct InvestmentIds {
    last: AtomicU64,
}

impl InvestmentIds {
    const FLOOR: u64 = 500;

    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(Self::FLOOR),
        }
    }

    pub fn next_id(&self) -> InvestmentId {
        InvestmentId::from_sequence(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Makes sure future IDs come after `id`.
    pub fn observe(&self, id: &InvestmentId) {
        if let Some(n) = id.sequence() {
            self.last.fetch_max(n, Ordering::Relaxed);
        }
    }
}

impl Default for InvestmentIds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_are_ten_digits() {
        let ids = RandomAccountIds::new();
        for _ in 0..100 {
            let id = ids.next_account_id();
            assert_eq!(id.as_str().len(), 10);
            assert!(id.as_str().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn random_ids_do_not_repeat() {
        let ids = RandomAccountIds::new();
        let issued: HashSet<_> = (0..1000).map(|_| ids.next_account_id()).collect();
        assert_eq!(issued.len(), 1000);
    }

    #[test]
    fn reserved_ids_are_never_issued() {
        let ids = RandomAccountIds::new();
        let reserved = AccountId::new("1234567890");
        ids.reserve(&mut std::iter::once(reserved.clone()));
        assert!(!ids.used.lock().insert(reserved));
    }

    #[test]
    fn sequential_ids_skip_reserved_range() {
        let ids = SequentialAccountIds::starting_at(1000);
        ids.reserve(&mut ["1005", "1002"].into_iter().map(AccountId::new));
        assert_eq!(ids.next_account_id().as_str(), "1006");
    }

    #[test]
    fn investment_ids_start_after_500_and_follow_observed() {
        let ids = InvestmentIds::new();
        assert_eq!(ids.next_id().as_str(), "INV501");
        ids.observe(&InvestmentId::from_sequence(740));
        assert_eq!(ids.next_id().as_str(), "INV741");
        ids.observe(&InvestmentId::from_sequence(10));
        assert_eq!(ids.next_id().as_str(), "INV742");
    }
}
