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

//! Snapshot persistence.
//!
//! The ledger never saves on its own; callers decide when to persist. A
//! failed save leaves the in-memory state as it is.

use crate::admin::Admin;
use crate::customer::CustomerRecord;
use crate::error::StoreError;
use crate::support::SupportMessage;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Load/save contract for the bank's three snapshots.
pub trait Store: Send + Sync {
    fn load_customers(&self) -> Result<Vec<CustomerRecord>, StoreError>;
    fn save_customers(&self, customers: &[CustomerRecord]) -> Result<(), StoreError>;

    /// `None` when no admin has been saved yet.
    fn load_admin(&self) -> Result<Option<Admin>, StoreError>;
    fn save_admin(&self, admin: &Admin) -> Result<(), StoreError>;

    fn load_messages(&self) -> Result<HashMap<u32, SupportMessage>, StoreError>;
    fn save_messages(&self, messages: &HashMap<u32, SupportMessage>) -> Result<(), StoreError>;
}

/// JSON files in a data directory.
///
/// Each file is written to a temporary sibling first and renamed into
/// place, so a crash mid-write never leaves a truncated snapshot.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    const CUSTOMERS_FILE: &'static str = "customers.json";
    const ADMIN_FILE: &'static str = "admin.json";
    const MESSAGES_FILE: &'static str = "support_messages.json";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StoreError> {
        let path = self.dir.join(file);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Json { path, source })
    }

    fn write<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let path = self.dir.join(file);
        let tmp = self.dir.join(format!("{file}.tmp"));
        let json = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }
}

impl Store for JsonStore {
    fn load_customers(&self) -> Result<Vec<CustomerRecord>, StoreError> {
        Ok(self.read(Self::CUSTOMERS_FILE)?.unwrap_or_default())
    }

    fn save_customers(&self, customers: &[CustomerRecord]) -> Result<(), StoreError> {
        self.write(Self::CUSTOMERS_FILE, customers)
    }

    fn load_admin(&self) -> Result<Option<Admin>, StoreError> {
        self.read(Self::ADMIN_FILE)
    }

    fn save_admin(&self, admin: &Admin) -> Result<(), StoreError> {
        self.write(Self::ADMIN_FILE, admin)
    }

    fn load_messages(&self) -> Result<HashMap<u32, SupportMessage>, StoreError> {
        Ok(self.read(Self::MESSAGES_FILE)?.unwrap_or_default())
    }

    fn save_messages(&self, messages: &HashMap<u32, SupportMessage>) -> Result<(), StoreError> {
        self.write(Self::MESSAGES_FILE, messages)
    }
}

/// In-memory store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    customers: Mutex<Vec<CustomerRecord>>,
    admin: Mutex<Option<Admin>>,
    messages: Mutex<HashMap<u32, SupportMessage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn load_customers(&self) -> Result<Vec<CustomerRecord>, StoreError> {
        Ok(self.customers.lock().clone())
    }

    fn save_customers(&self, customers: &[CustomerRecord]) -> Result<(), StoreError> {
        *self.customers.lock() = customers.to_vec();
        Ok(())
    }

    fn load_admin(&self) -> Result<Option<Admin>, StoreError> {
        Ok(self.admin.lock().clone())
    }

    fn save_admin(&self, admin: &Admin) -> Result<(), StoreError> {
        *self.admin.lock() = Some(admin.clone());
        Ok(())
    }

    fn load_messages(&self) -> Result<HashMap<u32, SupportMessage>, StoreError> {
        Ok(self.messages.lock().clone())
    }

    fn save_messages(&self, messages: &HashMap<u32, SupportMessage>) -> Result<(), StoreError> {
        *self.messages.lock() = messages.clone();
        Ok(())
    }
}
