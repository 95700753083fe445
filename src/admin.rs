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

//! Bank administrator record.

use crate::LedgerError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Admin {
    user_id: String,
    name: String,
    admin_id: String,
    password: String,
    #[serde(default)]
    security_question: Option<String>,
    #[serde(default)]
    security_answer: Option<String>,
}

impl Admin {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        admin_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            admin_id: admin_id.into(),
            password: password.into(),
            security_question: None,
            security_answer: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn admin_id(&self) -> &str {
        &self.admin_id
    }

    /// Both the admin ID and the password must match exactly.
    pub fn authenticate(&self, admin_id: &str, password: &str) -> Result<(), LedgerError> {
        if self.admin_id == admin_id && self.password == password {
            Ok(())
        } else {
            Err(LedgerError::InvalidCredentials)
        }
    }

    pub fn security_question(&self) -> Option<&str> {
        match (&self.security_question, &self.security_answer) {
            (Some(q), Some(_)) => Some(q),
            _ => None,
        }
    }

    pub fn set_security_question(&mut self, question: &str, answer: &str) -> Result<(), LedgerError> {
        if question.trim().is_empty() || answer.trim().is_empty() {
            return Err(LedgerError::InvalidRegistration(
                "security question and answer cannot be empty".to_string(),
            ));
        }
        self.security_question = Some(question.trim().to_string());
        self.security_answer = Some(answer.trim().to_string());
        Ok(())
    }

    /// Resets the password after checking the security answer (trimmed, case-insensitive).
    pub fn reset_password(&mut self, answer: &str, new_password: &str) -> Result<(), LedgerError> {
        let expected = match (&self.security_question, &self.security_answer) {
            (Some(_), Some(expected)) => expected,
            _ => return Err(LedgerError::SecurityQuestionNotSet),
        };
        if !expected.trim().eq_ignore_ascii_case(answer.trim()) {
            return Err(LedgerError::SecurityAnswerMismatch);
        }
        if new_password.trim().is_empty() {
            return Err(LedgerError::InvalidPassword);
        }
        self.password = new_password.to_string();
        Ok(())
    }
}

impl Default for Admin {
    /// Used when no admin has been persisted yet.
    fn default() -> Self {
        Self::new("admin001", "Default Admin", "ADMIN001", "adminpass")
    }
}
