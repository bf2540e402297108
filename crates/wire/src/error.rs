// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `{code, message}` rejection body used throughout §7's taxonomy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

impl From<&patze_core::ValidationError> for ErrorBody {
    fn from(err: &patze_core::ValidationError) -> Self {
        ErrorBody::new(err.code(), err.to_string())
    }
}
