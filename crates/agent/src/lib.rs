//! The conversation loop — the heart of AgentLoom.
//!
//! Each exchange follows a **Send → Act → Observe** cycle:
//!
//! 1. **Receive** a user message
//! 2. **Send** the transcript and tool declarations to the model transport
//! 3. **If tool calls**: execute them in order, stage the results, loop back to 2
//! 4. **If a final answer**: commit the exchange, journal it, return the text
//!
//! The loop is bounded by a maximum number of model turns. A call to the
//! hand-off tool ends the exchange with that tool's result.

pub mod agent;
pub mod loop_runner;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use agent::Agent;
pub use loop_runner::{
    ConversationLoop, DEFAULT_HANDOVER_TOOL, DEFAULT_MAX_TURNS, LoopState, Outcome, ToolFailurePolicy,
};
pub use workflow::{TaskAssignment, parse_plan, run_hierarchical, run_sequential};
