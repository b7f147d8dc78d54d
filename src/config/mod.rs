//! Runtime configuration for the client and the round loop.
//!
//! Profiles are stored and edited by the host application; the core only
//! consumes a fully resolved [`ApiConfig`]. The env-variable path exists for
//! headless use and tests.

use crate::error::{AgentError, Result};

/// Default cap on tool rounds within one user turn.
pub const DEFAULT_MAX_ROUNDS: usize = 10;

/// System prompt sent on every request. Hosts with a richer tool catalogue
/// override this through [`LoopConfig`].
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a PyMOL molecular visualization assistant. You can control PyMOL \
through the provided tools.

Guidelines:
- Answer in the same language the user writes in.
- Prefer batching repetitive operations into a single scripted tool call.
- Call tools to gather information or perform operations, wait for each \
result, and decide the next step from it.
- If a tool fails, try an alternative approach.
- When the user asks about a structure without naming a PDB ID or file, \
assume it is already loaded and query it instead of loading a new one.
- Once the user's request is fulfilled, stop; do not volunteer extra \
suggestions.";

/// Connection profile for one chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://api.example.com/v1`.
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    /// Whether the model emits `reasoning_content` deltas. Controls the
    /// snapshot normalization applied to assistant tool-call messages.
    pub reasoning_model: bool,
}

impl ApiConfig {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            reasoning_model: false,
        }
    }

    pub fn with_reasoning_model(mut self, reasoning: bool) -> Self {
        self.reasoning_model = reasoning;
        self
    }

    /// Load from `PYMOL_AGENT_API_URL`, `PYMOL_AGENT_API_KEY`,
    /// `PYMOL_AGENT_MODEL` and `PYMOL_AGENT_REASONING` (optional, "1"/"true").
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let var = |name: &str| {
            std::env::var(name)
                .map_err(|_| AgentError::Configuration(format!("missing env var {name}")))
        };
        let api_url = var("PYMOL_AGENT_API_URL")?;
        let api_key = var("PYMOL_AGENT_API_KEY")?;
        let model = var("PYMOL_AGENT_MODEL")?;
        let reasoning_model = matches!(
            std::env::var("PYMOL_AGENT_REASONING").as_deref(),
            Ok("1") | Ok("true")
        );

        Ok(Self {
            api_url,
            api_key,
            model,
            reasoning_model,
        })
    }

    /// Check that all required fields are non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() || self.api_key.is_empty() || self.model.is_empty() {
            return Err(AgentError::Configuration(
                "api_url, api_key and model must all be set".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the round loop itself.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub system_prompt: String,
    /// Upper bound on request/response rounds per user turn.
    pub max_rounds: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

impl LoopConfig {
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_fields() {
        let cfg = ApiConfig::new("", "key", "model");
        assert!(cfg.validate().is_err());
        let cfg = ApiConfig::new("https://api.example.com/v1", "key", "model");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn loop_config_defaults() {
        let cfg = LoopConfig::default();
        assert_eq!(cfg.max_rounds, DEFAULT_MAX_ROUNDS);
        assert!(cfg.system_prompt.contains("PyMOL"));
    }
}
