//! Incremental SSE decoder for chat-completions streams.
//!
//! Turns the byte stream of a streaming response into an ordered sequence of
//! [`ChatDelta`]s. The sequence ends at the `[DONE]` sentinel or when the
//! connection closes. A single malformed line never aborts the stream;
//! provider jitter is skipped with a debug log.

use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;

use crate::error::AgentError;
use crate::types::{ChatDelta, ToolCallDelta, Usage};

const DONE_SENTINEL: &str = "[DONE]";

/// Decode a streaming response into a lazy, finite sequence of deltas.
pub fn delta_stream(
    resp: reqwest::Response,
) -> BoxStream<'static, Result<ChatDelta, AgentError>> {
    let byte_stream = resp.bytes_stream();

    let stream = async_stream::stream! {
        let mut buffer = String::new();
        futures::pin_mut!(byte_stream);

        'read: while let Some(chunk_result) = byte_stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    yield Err(AgentError::Network(e));
                    break;
                }
            };

            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(line_end) = buffer.find('\n') {
                let line = buffer[..line_end].trim().to_string();
                buffer = buffer[line_end + 1..].to_string();

                if line.is_empty() || line.starts_with(':') {
                    continue;
                }

                let payload = data_payload(&line);
                if payload == DONE_SENTINEL {
                    break 'read;
                }

                match serde_json::from_str::<StreamChunk>(payload) {
                    Ok(chunk) => {
                        let delta = chunk.into_delta();
                        if !delta.is_empty() {
                            yield Ok(delta);
                        }
                    }
                    Err(err) => {
                        debug!(%err, line = payload, "skipping malformed SSE line");
                    }
                }
            }
        }
    };

    Box::pin(stream)
}

/// Strip the SSE `data:` prefix. Lines without it are returned unchanged;
/// some gateways omit the prefix entirely.
fn data_payload(line: &str) -> &str {
    line.strip_prefix("data:").map(str::trim_start).unwrap_or(line)
}

// Wire types for one chat-completions stream chunk.

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: WireDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct WireDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
    // Some providers name the field `reasoning` instead.
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCallDelta>>,
}

#[derive(Deserialize)]
struct WireToolCallDelta {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<WireFunctionDelta>,
}

#[derive(Deserialize, Default)]
struct WireFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

impl StreamChunk {
    fn into_delta(self) -> ChatDelta {
        let mut delta = ChatDelta {
            usage: self.usage,
            ..ChatDelta::default()
        };

        if let Some(choice) = self.choices.into_iter().next() {
            delta.finish_reason = choice.finish_reason;
            delta.content = choice.delta.content;
            delta.reasoning = choice.delta.reasoning_content.or(choice.delta.reasoning);
            delta.tool_calls = choice
                .delta
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|tc| {
                    let function = tc.function.unwrap_or_default();
                    ToolCallDelta {
                        index: tc.index,
                        id: tc.id,
                        name: function.name,
                        arguments: function.arguments,
                    }
                })
                .collect();
        }

        delta
    }
}
