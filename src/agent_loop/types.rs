//! Core run types for the round loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique run identifier.
pub type RunId = Uuid;

/// Run lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
    Canceled,
}

/// Result of one user turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    /// True when the round limit cut the turn short while the model was
    /// still requesting tools. A designed outcome, not a failure.
    #[serde(default)]
    pub truncated: bool,
    /// Rounds actually executed.
    #[serde(default)]
    pub rounds: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    pub fn completed(rounds: usize) -> Self {
        Self {
            status: RunStatus::Completed,
            truncated: false,
            rounds,
            error: None,
            finished_at: Utc::now(),
        }
    }

    pub fn truncated_at(rounds: usize) -> Self {
        Self {
            status: RunStatus::Completed,
            truncated: true,
            rounds,
            error: None,
            finished_at: Utc::now(),
        }
    }

    pub fn canceled(rounds: usize) -> Self {
        Self {
            status: RunStatus::Canceled,
            truncated: false,
            rounds,
            error: None,
            finished_at: Utc::now(),
        }
    }

    pub fn failed(error: impl Into<String>, rounds: usize) -> Self {
        Self {
            status: RunStatus::Failed,
            truncated: false,
            rounds,
            error: Some(error.into()),
            finished_at: Utc::now(),
        }
    }
}
