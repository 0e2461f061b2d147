//! The conversation loop implementation.
//!
//! One `run` is one exchange: the user input goes to the model, requested
//! tools are executed in emitted order, and the model is asked again until
//! it answers or the turn bound is hit. Messages produced along the way are
//! staged and only committed to the caller's transcript when the exchange
//! succeeds.

use agentloom_core::error::{Error, ToolError, TransportError};
use agentloom_core::event::{DomainEvent, EventBus};
use agentloom_core::journal::{MemoryEntry, MemoryJournal};
use agentloom_core::message::{Conversation, Message, ToolCall};
use agentloom_core::tool::ToolRegistry;
use agentloom_core::transport::{GenerationConfig, ModelTransport, TransportRequest};
use chrono::Utc;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_TURNS: u32 = 8;
pub const DEFAULT_HANDOVER_TOOL: &str = "human";

/// What happens to a tool call whose execution fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolFailurePolicy {
    /// Leave no result in the transcript (the failure is still published
    /// as a `ToolCallDropped` event)
    #[default]
    Drop,
    /// Append `"Error: …"` as the tool result so the model can react
    ReportToModel,
}

impl FromStr for ToolFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "report" | "report_to_model" => Ok(Self::ReportToModel),
            other => Err(format!("unknown tool failure policy '{other}' (expected 'drop' or 'report')")),
        }
    }
}

/// Where an exchange is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingModel,
    ExecutingTools,
    Done,
    Failed,
}

/// How a successful exchange ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The model produced a final answer
    Answered { text: String, turns: u32 },
    /// The hand-off tool ran; its result is the answer
    HandedOver { text: String, turns: u32 },
}

impl Outcome {
    pub fn text(&self) -> &str {
        match self {
            Outcome::Answered { text, .. } | Outcome::HandedOver { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Outcome::Answered { text, .. } | Outcome::HandedOver { text, .. } => text,
        }
    }

    pub fn turns(&self) -> u32 {
        match self {
            Outcome::Answered { turns, .. } | Outcome::HandedOver { turns, .. } => *turns,
        }
    }
}

/// Per-exchange bookkeeping.
struct Exchange<'a> {
    conversation_id: &'a str,
    state: LoopState,
    turn: u32,
    staged: Vec<Message>,
}

impl Exchange<'_> {
    fn enter(&mut self, next: LoopState) {
        debug!(
            conversation_id = %self.conversation_id,
            turn = self.turn,
            from = ?self.state,
            to = ?next,
            "Loop state transition"
        );
        self.state = next;
    }

    /// Narrow the tool-call request staged at `index` to the calls a later
    /// staged result answers. A request left with no calls and no text is
    /// removed.
    fn prune_unanswered(&mut self, index: usize) {
        let answered: HashSet<String> = self.staged[index + 1..]
            .iter()
            .filter_map(|m| m.tool_call_id.clone())
            .collect();

        let request = &mut self.staged[index];
        let before = request.tool_calls.len();
        request.tool_calls.retain(|c| answered.contains(&c.id));
        if request.tool_calls.len() < before {
            debug!(
                conversation_id = %self.conversation_id,
                pruned = before - request.tool_calls.len(),
                "Unanswered tool calls removed from the transcript"
            );
        }
        if request.tool_calls.is_empty() && request.content.trim().is_empty() {
            self.staged.remove(index);
        }
    }
}

/// Orchestrates model calls and tool execution for one conversation at a
/// time. Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct ConversationLoop {
    transport: Arc<dyn ModelTransport>,
    tools: Arc<ToolRegistry>,
    event_bus: Arc<EventBus>,
    generation: GenerationConfig,
    max_turns: u32,
    memory: Option<Arc<dyn MemoryJournal>>,
    handover_tool: String,
    failure_policy: ToolFailurePolicy,
}

impl ConversationLoop {
    pub fn new(transport: Arc<dyn ModelTransport>, tools: Arc<ToolRegistry>, event_bus: Arc<EventBus>) -> Self {
        Self {
            transport,
            tools,
            event_bus,
            generation: GenerationConfig::default(),
            max_turns: DEFAULT_MAX_TURNS,
            memory: None,
            handover_tool: DEFAULT_HANDOVER_TOOL.to_string(),
            failure_policy: ToolFailurePolicy::default(),
        }
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Bound on model round-trips per exchange (at least 1).
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    /// Record every completed exchange in `journal`.
    pub fn with_memory(mut self, journal: Arc<dyn MemoryJournal>) -> Self {
        self.memory = Some(journal);
        self
    }

    pub fn with_handover_tool(mut self, name: impl Into<String>) -> Self {
        self.handover_tool = name.into();
        self
    }

    pub fn with_tool_failure_policy(mut self, policy: ToolFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn memory(&self) -> Option<&Arc<dyn MemoryJournal>> {
        self.memory.as_ref()
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    /// Run one exchange and return the answer text.
    pub async fn run(&self, conversation: &mut Conversation, user_input: &str) -> Result<String, Error> {
        self.run_exchange(conversation, user_input).await.map(Outcome::into_text)
    }

    /// Run one exchange.
    ///
    /// On error `conversation` is left exactly as it was.
    pub async fn run_exchange(&self, conversation: &mut Conversation, user_input: &str) -> Result<Outcome, Error> {
        let conversation_id = conversation.id.to_string();
        info!(
            conversation_id = %conversation_id,
            transport = self.transport.name(),
            messages = conversation.len(),
            "Processing exchange"
        );

        let mut exchange = Exchange {
            conversation_id: &conversation_id,
            state: LoopState::AwaitingModel,
            turn: 0,
            staged: vec![Message::user(user_input)],
        };

        let result = match self.drive(conversation, &mut exchange).await {
            Ok(outcome) => self.remember(user_input, &outcome).await.map(|()| outcome),
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => {
                exchange.enter(LoopState::Done);
                conversation.extend(exchange.staged);
                match &outcome {
                    Outcome::Answered { turns, .. } => self.event_bus.publish(DomainEvent::ExchangeCompleted {
                        conversation_id: conversation_id.clone(),
                        turns: *turns,
                        timestamp: Utc::now(),
                    }),
                    Outcome::HandedOver { .. } => self.event_bus.publish(DomainEvent::HandedOver {
                        conversation_id: conversation_id.clone(),
                        tool_name: self.handover_tool.clone(),
                        timestamp: Utc::now(),
                    }),
                }
                Ok(outcome)
            }
            Err(e) => {
                exchange.enter(LoopState::Failed);
                warn!(conversation_id = %conversation_id, error = %e, "Exchange failed; staged messages discarded");
                Err(e)
            }
        }
    }

    async fn drive(&self, conversation: &Conversation, exchange: &mut Exchange<'_>) -> Result<Outcome, Error> {
        let tool_declarations = self.tools.declarations_for(self.transport.kind());

        loop {
            if exchange.turn >= self.max_turns {
                warn!(
                    conversation_id = %exchange.conversation_id,
                    max_turns = self.max_turns,
                    "Turn limit reached"
                );
                self.event_bus.publish(DomainEvent::TurnLimitExceeded {
                    conversation_id: exchange.conversation_id.to_string(),
                    max_turns: self.max_turns,
                    timestamp: Utc::now(),
                });
                return Err(Error::MaxTurnsExceeded {
                    max_turns: self.max_turns,
                });
            }
            exchange.turn += 1;

            let request = TransportRequest {
                model: self.transport.model().to_string(),
                messages: conversation
                    .messages()
                    .iter()
                    .chain(exchange.staged.iter())
                    .cloned()
                    .collect(),
                tools: tool_declarations.clone(),
                generation: self.generation,
            };

            let response = self.transport.send_raw(request).await?;

            self.event_bus.publish(DomainEvent::ResponseGenerated {
                conversation_id: exchange.conversation_id.to_string(),
                model: self.transport.model().to_string(),
                turn: exchange.turn,
                tokens_used: self.transport.usage(&response).map(|u| u.total_tokens).unwrap_or(0),
                timestamp: Utc::now(),
            });

            if self.transport.is_finished(&response) {
                let text = self.transport.extract_text(&response);
                if text.trim().is_empty() {
                    return Err(TransportError::MalformedResponse(
                        "finished response carried no text and no tool calls".into(),
                    )
                    .into());
                }
                exchange.staged.push(Message::assistant(text.clone()));
                return Ok(Outcome::Answered {
                    text,
                    turns: exchange.turn,
                });
            }

            let calls = self.transport.extract_tool_calls(&response)?;
            if calls.is_empty() {
                return Err(
                    TransportError::MalformedResponse("unfinished response requested no tools".into()).into(),
                );
            }

            exchange.enter(LoopState::ExecutingTools);
            debug!(
                conversation_id = %exchange.conversation_id,
                tool_count = calls.len(),
                "Executing tool calls"
            );

            let text = self.transport.extract_text(&response);
            let request_index = exchange.staged.len();
            exchange.staged.push(Message::assistant_tool_calls(text, calls.clone()));

            if let Some(call) = self.handover_call(&calls) {
                let result = self.tools.execute(call).await?;
                info!(
                    conversation_id = %exchange.conversation_id,
                    tool = %call.name,
                    "Handing over"
                );
                exchange
                    .staged
                    .push(Message::tool_result(result.call_id, result.name, result.content.clone()));
                exchange.prune_unanswered(request_index);
                return Ok(Outcome::HandedOver {
                    text: result.content,
                    turns: exchange.turn,
                });
            }

            for call in &calls {
                self.execute_call(exchange, call).await;
            }
            exchange.prune_unanswered(request_index);

            exchange.enter(LoopState::AwaitingModel);
        }
    }

    /// The first call naming the hand-off tool, when that tool is registered.
    fn handover_call<'c>(&self, calls: &'c [ToolCall]) -> Option<&'c ToolCall> {
        if !self.tools.contains(&self.handover_tool) {
            return None;
        }
        calls.iter().find(|c| c.name == self.handover_tool)
    }

    async fn execute_call(&self, exchange: &mut Exchange<'_>, call: &ToolCall) {
        let start = Instant::now();
        let result = self.tools.execute(call).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(result) => {
                self.event_bus.publish(DomainEvent::ToolExecuted {
                    tool_name: call.name.clone(),
                    success: true,
                    duration_ms,
                    timestamp: Utc::now(),
                });
                exchange
                    .staged
                    .push(Message::tool_result(result.call_id, result.name, result.content));
            }
            Err(ToolError::NotFound(name)) => {
                warn!(
                    conversation_id = %exchange.conversation_id,
                    tool = %name,
                    "Model requested an unknown tool"
                );
                self.event_bus.publish(DomainEvent::ToolNotFound {
                    conversation_id: exchange.conversation_id.to_string(),
                    tool_name: name.clone(),
                    call_id: call.id.clone(),
                    timestamp: Utc::now(),
                });
                exchange.staged.push(Message::tool_result(
                    call.id.clone(),
                    call.name.clone(),
                    format!("Tool '{name}' is not available."),
                ));
            }
            Err(e) => {
                warn!(
                    conversation_id = %exchange.conversation_id,
                    tool = %call.name,
                    error = %e,
                    "Tool execution failed"
                );
                self.event_bus.publish(DomainEvent::ToolExecuted {
                    tool_name: call.name.clone(),
                    success: false,
                    duration_ms,
                    timestamp: Utc::now(),
                });
                match self.failure_policy {
                    ToolFailurePolicy::Drop => self.event_bus.publish(DomainEvent::ToolCallDropped {
                        conversation_id: exchange.conversation_id.to_string(),
                        tool_name: call.name.clone(),
                        call_id: call.id.clone(),
                        reason: e.to_string(),
                        timestamp: Utc::now(),
                    }),
                    ToolFailurePolicy::ReportToModel => exchange.staged.push(Message::tool_result(
                        call.id.clone(),
                        call.name.clone(),
                        format!("Error: {e}"),
                    )),
                }
            }
        }
    }

    /// Journal an answered exchange. Hand-overs are not journaled.
    async fn remember(&self, user_input: &str, outcome: &Outcome) -> Result<(), Error> {
        let (Some(journal), Outcome::Answered { text, .. }) = (&self.memory, outcome) else {
            return Ok(());
        };
        journal.append(MemoryEntry::new(user_input, text.as_str())).await?;
        self.event_bus.publish(DomainEvent::MemoryAppended {
            backend: journal.name().to_string(),
            timestamp: Utc::now(),
        });
        debug!(backend = journal.name(), "Exchange recorded in memory journal");
        Ok(())
    }
}
