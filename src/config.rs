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

//! Runtime configuration.

use crate::closure::ClosureCharges;
use std::path::PathBuf;
use std::time::Duration;

/// Batch deletion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Upper bound on concurrent closure workers.
    pub max_workers: usize,
    /// How long to wait for all closure tasks.
    pub timeout: Duration,
    pub charges: ClosureCharges,
}

impl BatchConfig {
    pub const DEFAULT_MAX_WORKERS: usize = 10;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_workers: Self::DEFAULT_MAX_WORKERS,
            timeout: Self::DEFAULT_TIMEOUT,
            charges: ClosureCharges::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the JSON snapshots.
    pub data_dir: PathBuf,
    pub batch: BatchConfig,
}

impl Config {
    pub const DEFAULT_DATA_DIR: &'static str = "bank-data";
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(Self::DEFAULT_DATA_DIR),
            batch: BatchConfig::default(),
        }
    }
}
