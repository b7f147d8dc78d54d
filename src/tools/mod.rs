//! Tool catalogue types and the executor contract.
//!
//! The concrete tools (PyMOL command bindings) live in the host application.
//! The core only ships the catalogue entry shape sent to the model and the
//! [`ToolExecutor`] boundary it dispatches calls through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Definition of one callable tool, supplied to every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the parameters.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Structured result of one tool execution.
///
/// Failures are data, not errors: the loop feeds them back to the model as a
/// tool message either way, so the model can adapt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn ok_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Boundary through which the loop executes tool calls.
///
/// Implementations must not panic; any internal fault is expected to come
/// back as `ToolOutcome { success: false, .. }`. Long-running tools own their
/// internal concurrency; the loop awaits one call at a time.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, name: &str, arguments: &serde_json::Value) -> ToolOutcome;
}

/// Executor that rejects every call. For hosts without a tool catalogue.
pub struct NullExecutor;

#[async_trait]
impl ToolExecutor for NullExecutor {
    async fn execute(&self, name: &str, _arguments: &serde_json::Value) -> ToolOutcome {
        ToolOutcome::failure(format!("no executor configured for tool '{name}'"))
    }
}

/// Closure-based executor for quick wiring and tests.
pub struct FnExecutor<F>
where
    F: Fn(&str, &serde_json::Value) -> ToolOutcome + Send + Sync,
{
    handler: F,
}

impl<F> FnExecutor<F>
where
    F: Fn(&str, &serde_json::Value) -> ToolOutcome + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<F> ToolExecutor for FnExecutor<F>
where
    F: Fn(&str, &serde_json::Value) -> ToolOutcome + Send + Sync,
{
    async fn execute(&self, name: &str, arguments: &serde_json::Value) -> ToolOutcome {
        (self.handler)(name, arguments)
    }
}
