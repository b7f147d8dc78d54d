//! Run event stream types.
//!
//! The core never assumes it shares a thread with its consumer: events go
//! through an [`EventSink`] callback and the consumer owns the hand-off
//! (queue, channel, queued GUI invocation, ...).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tools::ToolOutcome;

use super::types::RunId;

/// Callback used for streaming run events.
pub type EventSink = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// Run lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RunLifecycle {
    Started,
    Completed { truncated: bool },
    Failed { error: String },
    Canceled,
}

/// Concrete event payloads emitted by the round loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEventPayload {
    Lifecycle {
        state: RunLifecycle,
    },
    /// Incremental answer text. An empty `is_final` event closes the block.
    ContentDelta {
        text: String,
        is_final: bool,
    },
    /// Incremental model deliberation text.
    ReasoningDelta {
        text: String,
        is_final: bool,
    },
    /// A streamed tool call whose arguments currently parse. Display-only;
    /// the authoritative arguments are re-parsed at dispatch.
    ToolCallObserved {
        name: String,
        arguments: serde_json::Value,
    },
    ToolResult {
        name: String,
        outcome: ToolOutcome,
    },
    RoundComplete {
        round: usize,
    },
    Error {
        message: String,
    },
}

/// Envelope for streaming run events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub run_id: RunId,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: RunEventPayload,
}

pub(crate) struct EventEmitter {
    run_id: RunId,
    seq: std::sync::atomic::AtomicU64,
    sink: Option<EventSink>,
}

impl EventEmitter {
    pub(crate) fn new(run_id: RunId, sink: Option<EventSink>) -> Self {
        Self {
            run_id,
            seq: std::sync::atomic::AtomicU64::new(1),
            sink,
        }
    }

    pub(crate) fn emit(&self, payload: RunEventPayload) {
        let Some(sink) = &self.sink else { return };
        let seq = self.seq.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        (sink)(RunEvent {
            run_id: self.run_id,
            seq,
            timestamp: Utc::now(),
            payload,
        });
    }
}
