//! pymol-agent: streaming tool-call orchestration core.
//!
//! Drives a multi-round conversation against a chat-completions endpoint:
//! decodes the SSE response incrementally, reassembles fragmented tool
//! calls, dispatches them to an external executor, and feeds results back
//! into the conversation until the model answers without tools or the
//! round limit is reached.
//!
//! The visual layer, the concrete PyMOL tool implementations, and config
//! persistence are external collaborators: the core emits [`agent_loop::RunEvent`]s
//! through a thread-safe sink and calls into a [`tools::ToolExecutor`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use pymol_agent::agent_loop::ChatRunner;
//! use pymol_agent::client::ChatClient;
//! use pymol_agent::config::{ApiConfig, LoopConfig};
//! use pymol_agent::tools::NullExecutor;
//!
//! # async fn example() -> pymol_agent::error::Result<()> {
//! let client = ChatClient::new(ApiConfig::from_env()?);
//! let runner = ChatRunner::new(
//!     Arc::new(client),
//!     Arc::new(NullExecutor),
//!     Vec::new(),
//!     LoopConfig::default(),
//! );
//! let handle = runner.start("show chain A as cartoon", None)?;
//! let result = handle.wait().await;
//! println!("{:?}", result.status);
//! # Ok(())
//! # }
//! ```

pub mod agent_loop;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod tools;
pub mod types;
