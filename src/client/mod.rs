//! Chat-completions transport.
//!
//! [`ChatTransport`] is the seam the round loop drives; [`ChatClient`] is the
//! HTTP implementation against an OpenAI-compatible endpoint.

pub mod http;
pub mod sse;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::Result;
use crate::tools::ToolDefinition;
use crate::types::{ChatDelta, ChatMessage};

use http::{bearer_headers, shared_client, status_to_error};

/// Transport used by the round loop to reach the model.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open a streaming request carrying the full message list and tool
    /// catalogue. The returned stream is finite; it ends at the `[DONE]`
    /// sentinel or on connection close.
    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<BoxStream<'static, Result<ChatDelta>>>;

    /// Cheap non-streaming round-trip validating endpoint, key and model.
    async fn test_connection(&self) -> Result<()>;

    /// Whether the endpoint's model emits reasoning deltas. Drives the
    /// snapshot normalization for assistant tool-call messages.
    fn is_reasoning_model(&self) -> bool {
        false
    }
}

/// HTTP client for one configured endpoint.
pub struct ChatClient {
    config: ApiConfig,
}

impl ChatClient {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_url.trim_end_matches('/')
        )
    }

    fn build_request_body(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        stream: bool,
    ) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = messages.iter().map(message_to_wire).collect();

        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "stream": stream,
        });

        let obj = body.as_object_mut().expect("body is an object");
        if !tools.is_empty() {
            let tool_defs: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            obj.insert("tools".into(), tool_defs.into());
            obj.insert("tool_choice".into(), "auto".into());
        }

        body
    }
}

#[async_trait]
impl ChatTransport for ChatClient {
    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<BoxStream<'static, Result<ChatDelta>>> {
        self.config.validate()?;
        let body = self.build_request_body(messages, tools, true);

        debug!(
            model = %self.config.model,
            messages = messages.len(),
            tools = tools.len(),
            "opening chat stream"
        );

        let resp = shared_client()
            .post(self.endpoint())
            .headers(bearer_headers(&self.config.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        Ok(sse::delta_stream(resp))
    }

    async fn test_connection(&self) -> Result<()> {
        self.config.validate()?;
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": "hi" }],
            "max_tokens": 5,
            "stream": false,
        });

        let resp = shared_client()
            .post(self.endpoint())
            .headers(bearer_headers(&self.config.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }
        Ok(())
    }

    fn is_reasoning_model(&self) -> bool {
        self.config.reasoning_model
    }
}

/// Serialize one message into the chat-completions wire shape.
fn message_to_wire(msg: &ChatMessage) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    obj.insert("role".into(), serde_json::json!(msg.role));
    if let Some(ref content) = msg.content {
        obj.insert("content".into(), serde_json::json!(content));
    }
    if let Some(ref reasoning) = msg.reasoning_content {
        obj.insert("reasoning_content".into(), serde_json::json!(reasoning));
    }
    if !msg.tool_calls.is_empty() {
        let calls: Vec<serde_json::Value> = msg
            .tool_calls
            .iter()
            .map(|tc| {
                serde_json::json!({
                    "id": tc.id,
                    "type": "function",
                    "function": {
                        "name": tc.name,
                        "arguments": tc.arguments,
                    }
                })
            })
            .collect();
        obj.insert("tool_calls".into(), calls.into());
    }
    if let Some(ref id) = msg.tool_call_id {
        obj.insert("tool_call_id".into(), serde_json::json!(id));
    }
    serde_json::Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCall;

    fn client() -> ChatClient {
        ChatClient::new(ApiConfig::new(
            "https://api.example.com/v1/",
            "sk-test",
            "test-model",
        ))
    }

    #[test]
    fn endpoint_handles_trailing_slash() {
        assert_eq!(
            client().endpoint(),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn body_omits_tools_when_catalogue_is_empty() {
        let body = client().build_request_body(&[ChatMessage::user("hi")], &[], true);
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert_eq!(body["stream"], serde_json::json!(true));
    }

    #[test]
    fn body_carries_tool_catalogue_and_auto_choice() {
        let tools = vec![ToolDefinition::new(
            "pymol_show",
            "Show a representation",
            serde_json::json!({"type": "object", "properties": {}}),
        )];
        let body = client().build_request_body(&[ChatMessage::user("hi")], &tools, true);
        assert_eq!(body["tool_choice"], serde_json::json!("auto"));
        assert_eq!(
            body["tools"][0]["function"]["name"],
            serde_json::json!("pymol_show")
        );
    }

    #[test]
    fn assistant_tool_calls_use_wire_shape() {
        let msg = ChatMessage::assistant_with_tools(
            "",
            "",
            vec![ToolCall {
                id: "call_1".into(),
                name: "pymol_show".into(),
                arguments: r#"{"representation":"cartoon"}"#.into(),
            }],
        );
        let wire = message_to_wire(&msg);
        assert_eq!(wire["tool_calls"][0]["type"], serde_json::json!("function"));
        assert_eq!(
            wire["tool_calls"][0]["function"]["arguments"],
            serde_json::json!(r#"{"representation":"cartoon"}"#)
        );
        // content was absent in the stored record and stays absent on the
        // wire; the snapshot normalization is the only place that injects it
        assert!(wire.get("content").is_none());
    }

    #[test]
    fn tool_result_wire_shape() {
        let wire = message_to_wire(&ChatMessage::tool_result(
            "call_1",
            r#"{"success":true,"message":"ok"}"#,
        ));
        assert_eq!(wire["role"], serde_json::json!("tool"));
        assert_eq!(wire["tool_call_id"], serde_json::json!("call_1"));
    }
}
