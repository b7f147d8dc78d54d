//! Shared test support: scripted transports, a recording executor, and an
//! event-collecting sink.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use pymol_agent::agent_loop::{EventSink, RunEvent};
use pymol_agent::client::ChatTransport;
use pymol_agent::error::{AgentError, Result};
use pymol_agent::tools::{ToolExecutor, ToolOutcome};
use pymol_agent::types::{ChatDelta, ChatMessage, ToolCallDelta};

pub fn content_delta(text: &str) -> ChatDelta {
    ChatDelta {
        content: Some(text.to_string()),
        ..ChatDelta::default()
    }
}

pub fn reasoning_delta(text: &str) -> ChatDelta {
    ChatDelta {
        reasoning: Some(text.to_string()),
        ..ChatDelta::default()
    }
}

pub fn tool_delta(
    index: usize,
    id: Option<&str>,
    name: Option<&str>,
    arguments: Option<&str>,
) -> ChatDelta {
    ChatDelta {
        tool_calls: vec![ToolCallDelta {
            index,
            id: id.map(Into::into),
            name: name.map(Into::into),
            arguments: arguments.map(Into::into),
        }],
        ..ChatDelta::default()
    }
}

/// A round split into deltas, or a mid-stream failure.
pub type ScriptedRound = Vec<Result<ChatDelta>>;

pub fn ok_round(deltas: Vec<ChatDelta>) -> ScriptedRound {
    deltas.into_iter().map(Ok).collect()
}

enum Script {
    Rounds(Mutex<VecDeque<ScriptedRound>>),
    Repeating(Vec<ChatDelta>),
    /// Yields its deltas, then never ends. For cancellation tests.
    Stalling(Vec<ChatDelta>),
    /// `stream_chat` itself fails.
    Refusing,
}

/// In-process transport that replays scripted rounds and records every
/// outbound message list.
pub struct ScriptedTransport {
    script: Script,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    reasoning: bool,
}

impl ScriptedTransport {
    pub fn new(rounds: Vec<ScriptedRound>) -> Self {
        Self {
            script: Script::Rounds(Mutex::new(rounds.into())),
            requests: Mutex::new(Vec::new()),
            reasoning: false,
        }
    }

    /// Replays the same round forever. For round-limit tests.
    pub fn repeating(round: Vec<ChatDelta>) -> Self {
        Self {
            script: Script::Repeating(round),
            requests: Mutex::new(Vec::new()),
            reasoning: false,
        }
    }

    pub fn stalling(prefix: Vec<ChatDelta>) -> Self {
        Self {
            script: Script::Stalling(prefix),
            requests: Mutex::new(Vec::new()),
            reasoning: false,
        }
    }

    pub fn refusing() -> Self {
        Self {
            script: Script::Refusing,
            requests: Mutex::new(Vec::new()),
            reasoning: false,
        }
    }

    pub fn with_reasoning_model(mut self, reasoning: bool) -> Self {
        self.reasoning = reasoning;
        self
    }

    /// Message lists of every request issued so far.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        _tools: &[pymol_agent::tools::ToolDefinition],
    ) -> Result<BoxStream<'static, Result<ChatDelta>>> {
        self.requests.lock().unwrap().push(messages.to_vec());
        match &self.script {
            Script::Rounds(rounds) => {
                let round = rounds.lock().unwrap().pop_front().unwrap_or_default();
                Ok(futures::stream::iter(round).boxed())
            }
            Script::Repeating(round) => {
                let round: Vec<Result<ChatDelta>> =
                    round.iter().cloned().map(Ok).collect();
                Ok(futures::stream::iter(round).boxed())
            }
            Script::Stalling(prefix) => {
                let prefix: Vec<Result<ChatDelta>> =
                    prefix.iter().cloned().map(Ok).collect();
                Ok(futures::stream::iter(prefix)
                    .chain(futures::stream::pending())
                    .boxed())
            }
            Script::Refusing => Err(AgentError::api(503, "scripted refusal")),
        }
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    fn is_reasoning_model(&self) -> bool {
        self.reasoning
    }
}

/// Executor that records calls and replays queued outcomes.
pub struct RecordingExecutor {
    calls: Mutex<Vec<(String, serde_json::Value)>>,
    outcomes: Mutex<VecDeque<ToolOutcome>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcomes: Mutex::new(VecDeque::new()),
        }
    }

    pub fn queue_outcome(&self, outcome: ToolOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutor for RecordingExecutor {
    async fn execute(&self, name: &str, arguments: &serde_json::Value) -> ToolOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ToolOutcome::ok("executed"))
    }
}

/// Sink that appends every event to a shared vector.
pub fn recording_sink() -> (EventSink, Arc<Mutex<Vec<RunEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&events);
    let sink: EventSink = Arc::new(move |event| {
        captured.lock().unwrap().push(event);
    });
    (sink, events)
}
