//! Outcome of a remediation attempt.

use serde::{Deserialize, Serialize};

/// Status of an issue after fix dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixStatus {
    /// Remediated now.
    Fixed,
    /// Not remediated.
    NotFixed,
    /// Remediation started and awaits human action (e.g. a pull request merge).
    InProgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixResult {
    pub status: FixStatus,
    pub message: Option<String>,
}

impl FixResult {
    pub fn fixed() -> Self {
        Self {
            status: FixStatus::Fixed,
            message: None,
        }
    }

    pub fn not_fixed(message: impl Into<String>) -> Self {
        Self {
            status: FixStatus::NotFixed,
            message: Some(message.into()),
        }
    }

    pub fn in_progress(message: impl Into<String>) -> Self {
        Self {
            status: FixStatus::InProgress,
            message: Some(message.into()),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self.status {
            FixStatus::Fixed => "✅",
            FixStatus::NotFixed => "❌",
            FixStatus::InProgress => "⏳",
        }
    }
}
