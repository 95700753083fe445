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

//! Support desk: customer messages and admin replies.

use crate::LedgerError;
use crate::base::AccountId;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SupportMessage {
    pub id: u32,
    pub account_id: AccountId,
    pub customer_name: String,
    pub content: String,
    pub reply: String,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
}

impl SupportMessage {
    pub const NO_REPLY: &'static str = "No reply yet.";
}

impl fmt::Display for SupportMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Message ID: {} ---", self.id)?;
        writeln!(
            f,
            "From: {} (Acc: {}) on {}",
            self.customer_name,
            self.account_id,
            self.created_at.format("%Y-%m-%d %H:%M")
        )?;
        writeln!(f, "Issue: {}", self.content)?;
        writeln!(f, "Reply: {}", self.reply)?;
        write!(
            f,
            "Status: {}",
            if self.resolved { "Resolved" } else { "Pending" }
        )
    }
}

/// Support tickets keyed by message ID.
#[derive(Debug, Default)]
pub struct SupportDesk {
    messages: DashMap<u32, SupportMessage>,
    last_id: AtomicU32,
}

impl SupportDesk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a desk from persisted messages; new IDs continue after the highest one.
    pub fn from_messages(messages: HashMap<u32, SupportMessage>) -> Self {
        let last_id = messages.keys().copied().max().unwrap_or(0);
        Self {
            messages: messages.into_iter().collect(),
            last_id: AtomicU32::new(last_id),
        }
    }

    /// Opens a ticket. Returns its ID.
    ///
    /// # Errors
    ///
    /// [`LedgerError::EmptyMessage`] if `content` is blank.
    pub fn contact(
        &self,
        account_id: &AccountId,
        customer_name: &str,
        content: &str,
    ) -> Result<u32, LedgerError> {
        if content.trim().is_empty() {
            return Err(LedgerError::EmptyMessage);
        }
        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.messages.insert(
            id,
            SupportMessage {
                id,
                account_id: account_id.clone(),
                customer_name: customer_name.to_string(),
                content: content.trim().to_string(),
                reply: SupportMessage::NO_REPLY.to_string(),
                created_at: Utc::now(),
                resolved: false,
            },
        );
        Ok(id)
    }

    pub fn get(&self, id: u32) -> Option<SupportMessage> {
        self.messages.get(&id).map(|m| m.clone())
    }

    /// Unresolved messages, oldest first.
    pub fn unresolved(&self) -> Vec<SupportMessage> {
        let mut open: Vec<_> = self
            .messages
            .iter()
            .filter(|m| !m.resolved)
            .map(|m| m.clone())
            .collect();
        open.sort_by_key(|m| m.id);
        open
    }

    /// Messages sent from one account, oldest first.
    pub fn for_account(&self, account_id: &AccountId) -> Vec<SupportMessage> {
        let mut mine: Vec<_> = self
            .messages
            .iter()
            .filter(|m| &m.account_id == account_id)
            .map(|m| m.clone())
            .collect();
        mine.sort_by_key(|m| m.id);
        mine
    }

    /// Replies to a message and marks it resolved.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::MessageNotFound`] - unknown ID.
    /// - [`LedgerError::MessageAlreadyResolved`] - already answered.
    pub fn resolve(&self, id: u32, reply: &str) -> Result<(), LedgerError> {
        let mut message = self
            .messages
            .get_mut(&id)
            .ok_or(LedgerError::MessageNotFound(id))?;
        if message.resolved {
            return Err(LedgerError::MessageAlreadyResolved(id));
        }
        message.reply = reply.trim().to_string();
        message.resolved = true;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Copy of all messages for persistence.
    pub fn to_map(&self) -> HashMap<u32, SupportMessage> {
        self.messages
            .iter()
            .map(|m| (*m.key(), m.value().clone()))
            .collect()
    }
}
