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

//! The set of all customers, keyed by account number.

use crate::base::AccountId;
use crate::customer::Customer;
use dashmap::DashMap;
use std::sync::Arc;

/// Concurrent customer roster.
///
/// Uniqueness of account numbers is guaranteed by the ID source; inserting a
/// customer whose number is already present replaces the previous entry.
#[derive(Debug, Default)]
pub struct Roster {
    customers: DashMap<AccountId, Arc<Customer>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, customer: Customer) -> Arc<Customer> {
        let customer = Arc::new(customer);
        self.customers
            .insert(customer.account_id().clone(), Arc::clone(&customer));
        customer
    }

    pub fn get(&self, account_id: &AccountId) -> Option<Arc<Customer>> {
        self.customers.get(account_id).map(|c| Arc::clone(&c))
    }

    pub fn contains(&self, account_id: &AccountId) -> bool {
        self.customers.contains_key(account_id)
    }

    pub fn remove(&self, account_id: &AccountId) -> Option<Arc<Customer>> {
        self.customers.remove(account_id).map(|(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    /// All customers ordered by account number.
    pub fn customers(&self) -> Vec<Arc<Customer>> {
        let mut all: Vec<_> = self
            .customers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        all.sort_by(|a, b| a.account_id().cmp(b.account_id()));
        all
    }
}

impl FromIterator<Customer> for Roster {
    fn from_iter<I: IntoIterator<Item = Customer>>(iter: I) -> Self {
        let roster = Roster::new();
        for customer in iter {
            roster.insert(customer);
        }
        roster
    }
}
