//! Reassembly of fragmented tool-call deltas.
//!
//! Models emit a tool call as a series of deltas keyed by a position index:
//! the id and name arrive whole or in pieces, and the argument text arrives
//! token by token as shards of one JSON document. There is no end marker for
//! an individual call; completeness is only known by the argument text
//! parsing as a JSON object, or by the stream ending.

use tracing::debug;

use crate::types::{ToolCall, ToolCallDelta};

#[derive(Debug, Default)]
struct ToolCallFragment {
    index: usize,
    id: String,
    name: String,
    arguments: String,
}

/// Accumulates tool-call fragments for one streaming round.
#[derive(Debug, Default)]
pub struct ToolCallAssembler {
    // First-observed index order, which is also dispatch order.
    fragments: Vec<ToolCallFragment>,
}

impl ToolCallAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one delta into the fragment at its index, creating it on first
    /// sight.
    ///
    /// Returns `Some((name, arguments))` each time an argument append leaves
    /// the fragment parseable as a JSON object. This is a live-display signal, not
    /// a completion guarantee, since later shards may still extend the text.
    /// A parse failure here means "keep buffering", never an error.
    pub fn ingest(&mut self, delta: &ToolCallDelta) -> Option<(String, serde_json::Value)> {
        let frag = match self.fragments.iter_mut().find(|f| f.index == delta.index) {
            Some(frag) => frag,
            None => {
                self.fragments.push(ToolCallFragment {
                    index: delta.index,
                    ..ToolCallFragment::default()
                });
                self.fragments.last_mut().expect("just pushed")
            }
        };

        if let Some(ref id) = delta.id {
            frag.id.push_str(id);
        }
        if let Some(ref name) = delta.name {
            frag.name.push_str(name);
        }

        let mut arguments_grew = false;
        if let Some(ref arguments) = delta.arguments {
            frag.arguments.push_str(arguments);
            arguments_grew = true;
        }

        if arguments_grew && !frag.name.is_empty() {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&frag.arguments) {
                if value.is_object() {
                    return Some((frag.name.clone(), value));
                }
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Finalize at stream end, in first-observed order.
    ///
    /// Fragments with an empty name or empty argument text never represent a
    /// committed call and are dropped silently, as are fragments whose
    /// argument text still fails to parse as JSON; those are excluded from
    /// dispatch entirely and produce no tool message.
    pub fn finalize(self) -> Vec<ToolCall> {
        self.fragments
            .into_iter()
            .filter_map(|frag| {
                if frag.name.is_empty() || frag.arguments.is_empty() {
                    debug!(index = frag.index, "dropping uncommitted tool-call fragment");
                    return None;
                }
                if serde_json::from_str::<serde_json::Value>(&frag.arguments).is_err() {
                    debug!(
                        index = frag.index,
                        name = %frag.name,
                        "dropping tool-call fragment with unparseable arguments"
                    );
                    return None;
                }
                Some(ToolCall {
                    id: frag.id,
                    name: frag.name,
                    arguments: frag.arguments,
                })
            })
            .collect()
    }
}
