//! Domain event system — observable side channel of the conversation loop.
//!
//! Events are published when something interesting happens (a tool ran, a
//! call was dropped, an exchange completed). Callers and tests subscribe to
//! react without coupling to the loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The model answered one turn
    ResponseGenerated {
        conversation_id: String,
        model: String,
        turn: u32,
        tokens_used: u32,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed
    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The model asked for a tool that is not registered
    ToolNotFound {
        conversation_id: String,
        tool_name: String,
        call_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A failed tool call left no result in the transcript
    ToolCallDropped {
        conversation_id: String,
        tool_name: String,
        call_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A `send` produced a final answer
    ExchangeCompleted {
        conversation_id: String,
        turns: u32,
        timestamp: DateTime<Utc>,
    },

    /// A `send` ended by handing over to the hand-off tool
    HandedOver {
        conversation_id: String,
        tool_name: String,
        timestamp: DateTime<Utc>,
    },

    /// A `send` hit the turn bound
    TurnLimitExceeded {
        conversation_id: String,
        max_turns: u32,
        timestamp: DateTime<Utc>,
    },

    /// An entry was appended to the memory journal
    MemoryAppended {
        backend: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
/// Components can subscribe to receive all events and filter for what they care about.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
