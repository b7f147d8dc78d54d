//! Round loop primitives (runs, events, tool-call assembly).

pub mod assembler;
pub mod events;
pub mod runner;
pub mod types;

pub use assembler::*;
pub use events::*;
pub use runner::*;
pub use types::*;
