//! Bounded multi-round orchestration loop.
//!
//! One user turn runs as one tokio task: request, drain the delta stream,
//! dispatch assembled tool calls, append results, loop. The loop is
//! iterative and bounded: a model that requests tools on every round is cut
//! off at `max_rounds` with a truncation outcome instead of recursing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::ChatTransport;
use crate::config::LoopConfig;
use crate::conversation::Conversation;
use crate::error::{AgentError, Result};
use crate::tools::{ToolDefinition, ToolExecutor, ToolOutcome};
use crate::types::{ChatMessage, ToolCall};

use super::assembler::ToolCallAssembler;
use super::events::{EventEmitter, EventSink, RunEventPayload, RunLifecycle};
use super::types::{RunId, RunResult, RunStatus};

/// Handle for an in-flight turn.
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    cancel: CancellationToken,
    result_rx: oneshot::Receiver<RunResult>,
}

impl RunHandle {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Request cooperative cancellation. Idempotent. The loop notices at the
    /// next decoded delta or round boundary; nothing partial is committed to
    /// the conversation for the interrupted round.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the turn to finish.
    pub async fn wait(self) -> RunResult {
        self.result_rx
            .await
            .unwrap_or_else(|_| RunResult::canceled(0))
    }
}

/// Drives user turns against one transport, executor and tool catalogue.
///
/// Owns its conversation store; no process-wide mutable state. Turns are not
/// re-entrant: `start` rejects a new turn while one is in flight.
pub struct ChatRunner {
    transport: Arc<dyn ChatTransport>,
    executor: Arc<dyn ToolExecutor>,
    tools: Arc<Vec<ToolDefinition>>,
    config: LoopConfig,
    conversation: Arc<Mutex<Conversation>>,
    busy: Arc<AtomicBool>,
}

impl ChatRunner {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        executor: Arc<dyn ToolExecutor>,
        tools: Vec<ToolDefinition>,
        config: LoopConfig,
    ) -> Self {
        Self {
            transport,
            executor,
            tools: Arc::new(tools),
            config,
            conversation: Arc::new(Mutex::new(Conversation::new())),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared view of the conversation store.
    pub fn conversation(&self) -> Arc<Mutex<Conversation>> {
        Arc::clone(&self.conversation)
    }

    /// Copy of the current history.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.conversation.lock().expect("conversation lock").messages().to_vec()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Clear the history. Rejected while a turn is in flight.
    pub fn clear_history(&self) -> Result<()> {
        if self.is_busy() {
            return Err(AgentError::InvalidState(
                "cannot clear history while a turn is in flight".into(),
            ));
        }
        self.conversation.lock().expect("conversation lock").clear();
        Ok(())
    }

    /// Start one user turn. Appends the user message and spawns the round
    /// loop; progress is reported through `sink`, the final outcome through
    /// the returned handle.
    pub fn start(&self, user_text: impl Into<String>, sink: Option<EventSink>) -> Result<RunHandle> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AgentError::InvalidState("a turn is already in flight".into()));
        }

        let run_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let (result_tx, result_rx) = oneshot::channel();

        self.conversation
            .lock()
            .expect("conversation lock")
            .append(ChatMessage::user(user_text));

        let ctx = RoundContext {
            transport: Arc::clone(&self.transport),
            executor: Arc::clone(&self.executor),
            tools: Arc::clone(&self.tools),
            config: self.config.clone(),
            conversation: Arc::clone(&self.conversation),
            cancel: cancel.clone(),
        };
        let busy = Arc::clone(&self.busy);

        tokio::spawn(async move {
            let emitter = EventEmitter::new(run_id, sink);
            emitter.emit(RunEventPayload::Lifecycle {
                state: RunLifecycle::Started,
            });
            debug!(%run_id, "turn started");

            let result = ctx.drive_rounds(&emitter).await;

            let state = match result.status {
                RunStatus::Completed => RunLifecycle::Completed {
                    truncated: result.truncated,
                },
                RunStatus::Canceled => RunLifecycle::Canceled,
                RunStatus::Failed => RunLifecycle::Failed {
                    error: result.error.clone().unwrap_or_default(),
                },
            };
            emitter.emit(RunEventPayload::Lifecycle { state });
            debug!(%run_id, status = ?result.status, rounds = result.rounds, "turn finished");

            busy.store(false, Ordering::SeqCst);
            let _ = result_tx.send(result);
        });

        Ok(RunHandle {
            run_id,
            cancel,
            result_rx,
        })
    }
}

/// Everything one spawned turn needs, detached from the runner's lifetime.
struct RoundContext {
    transport: Arc<dyn ChatTransport>,
    executor: Arc<dyn ToolExecutor>,
    tools: Arc<Vec<ToolDefinition>>,
    config: LoopConfig,
    conversation: Arc<Mutex<Conversation>>,
    cancel: CancellationToken,
}

impl RoundContext {
    async fn drive_rounds(&self, emitter: &EventEmitter) -> RunResult {
        for round in 1..=self.config.max_rounds {
            if self.cancel.is_cancelled() {
                return RunResult::canceled(round - 1);
            }

            let outbound = self.outbound_messages();
            debug!(round, messages = outbound.len(), "opening round");

            let mut stream = match self.transport.stream_chat(&outbound, &self.tools).await {
                Ok(stream) => stream,
                Err(err) => {
                    emitter.emit(RunEventPayload::Error {
                        message: err.to_string(),
                    });
                    return RunResult::failed(err.to_string(), round);
                }
            };

            // Per-round stream state: accumulated text plus the assembler.
            let mut content = String::new();
            let mut reasoning = String::new();
            let mut assembler = ToolCallAssembler::new();

            loop {
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        // Partial output already reached the sink; the store
                        // keeps its state from the start of this round.
                        debug!(round, "canceled mid-stream");
                        return RunResult::canceled(round - 1);
                    }
                    delta = stream.next() => {
                        let Some(delta) = delta else { break };
                        match delta {
                            Ok(delta) => {
                                if let Some(text) = delta.content {
                                    if !text.is_empty() {
                                        content.push_str(&text);
                                        emitter.emit(RunEventPayload::ContentDelta {
                                            text,
                                            is_final: false,
                                        });
                                    }
                                }
                                if let Some(text) = delta.reasoning {
                                    if !text.is_empty() {
                                        reasoning.push_str(&text);
                                        emitter.emit(RunEventPayload::ReasoningDelta {
                                            text,
                                            is_final: false,
                                        });
                                    }
                                }
                                for tc in &delta.tool_calls {
                                    if let Some((name, arguments)) = assembler.ingest(tc) {
                                        emitter.emit(RunEventPayload::ToolCallObserved {
                                            name,
                                            arguments,
                                        });
                                    }
                                }
                            }
                            Err(err) => {
                                emitter.emit(RunEventPayload::Error {
                                    message: err.to_string(),
                                });
                                return RunResult::failed(err.to_string(), round);
                            }
                        }
                    }
                }
            }

            emitter.emit(RunEventPayload::ContentDelta {
                text: String::new(),
                is_final: true,
            });
            emitter.emit(RunEventPayload::ReasoningDelta {
                text: String::new(),
                is_final: true,
            });

            let calls = assembler.finalize();
            debug!(round, tool_calls = calls.len(), content_len = content.len(), "stream drained");

            if calls.is_empty() {
                self.conversation
                    .lock()
                    .expect("conversation lock")
                    .append(ChatMessage::assistant_with_tools(content, reasoning, Vec::new()));
                emitter.emit(RunEventPayload::RoundComplete { round });
                return RunResult::completed(round);
            }

            // The assistant message introducing the calls goes in first so
            // every tool message references an id in the preceding assistant
            // message.
            self.conversation
                .lock()
                .expect("conversation lock")
                .append(ChatMessage::assistant_with_tools(
                    content,
                    reasoning,
                    calls.clone(),
                ));

            for call in &calls {
                let outcome = self.dispatch(call).await;
                emitter.emit(RunEventPayload::ToolResult {
                    name: call.name.clone(),
                    outcome: outcome.clone(),
                });

                let encoded = serde_json::to_string(&outcome).unwrap_or_else(|_| {
                    r#"{"success":false,"message":"unserializable tool result"}"#.to_string()
                });
                self.conversation
                    .lock()
                    .expect("conversation lock")
                    .append(ChatMessage::tool_result(call.id.clone(), encoded));
            }

            emitter.emit(RunEventPayload::RoundComplete { round });
        }

        warn!(max_rounds = self.config.max_rounds, "round limit reached, truncating turn");
        RunResult::truncated_at(self.config.max_rounds)
    }

    /// System prompt plus the normalized history snapshot.
    fn outbound_messages(&self) -> Vec<ChatMessage> {
        let conv = self.conversation.lock().expect("conversation lock");
        let mut messages = Vec::with_capacity(conv.len() + 1);
        messages.push(ChatMessage::system(&self.config.system_prompt));
        messages.extend(conv.snapshot(self.transport.is_reasoning_model()));
        messages
    }

    /// Parse the finalized argument text and run the executor.
    ///
    /// Unlike the speculative parses while streaming, a parse failure here
    /// becomes a failed outcome so the call is still acknowledged with a tool
    /// message and the pairing invariant holds.
    async fn dispatch(&self, call: &ToolCall) -> ToolOutcome {
        let arguments = match serde_json::from_str::<serde_json::Value>(&call.arguments) {
            Ok(value) if value.is_object() => value,
            Ok(_) => {
                warn!(tool = %call.name, "tool arguments are not a JSON object");
                return ToolOutcome::failure(format!(
                    "invalid arguments for '{}': expected a JSON object",
                    call.name
                ));
            }
            Err(err) => {
                warn!(tool = %call.name, %err, "tool arguments failed to parse");
                return ToolOutcome::failure(format!(
                    "invalid arguments for '{}': {err}",
                    call.name
                ));
            }
        };

        debug!(tool = %call.name, "dispatching tool call");
        self.executor.execute(&call.name, &arguments).await
    }
}
