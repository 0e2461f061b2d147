//! `Agent` — one conversation driven by a [`ConversationLoop`].

use agentloom_core::error::Error;
use agentloom_core::message::Conversation;
use tracing::debug;

use crate::loop_runner::{ConversationLoop, Outcome};

/// A conversation session.
///
/// The memory journal (when the loop has one) is read once here and folded
/// into the system message; later appends by this or other agents are not
/// seen until a new `Agent` is built.
pub struct Agent {
    runner: ConversationLoop,
    conversation: Conversation,
}

impl Agent {
    pub async fn new(runner: ConversationLoop, system_prompt: impl Into<String>) -> Result<Self, Error> {
        let mut prompt = system_prompt.into();

        if let Some(journal) = runner.memory() {
            let snapshot = journal.snapshot().await?;
            debug!(
                backend = journal.name(),
                entries = snapshot.len(),
                version = snapshot.version,
                "Seeding conversation from memory journal"
            );
            if let Some(block) = snapshot.to_prompt_block() {
                prompt = if prompt.trim().is_empty() {
                    block
                } else {
                    format!("{prompt}\n\n{block}")
                };
            }
        }

        let conversation = if prompt.trim().is_empty() {
            Conversation::new()
        } else {
            Conversation::with_system(prompt)
        };

        Ok(Self { runner, conversation })
    }

    /// Send a user message and return the answer.
    pub async fn send(&mut self, user_input: &str) -> Result<String, Error> {
        self.runner.run(&mut self.conversation, user_input).await
    }

    /// Send a user message, reporting whether the exchange was handed over.
    pub async fn send_exchange(&mut self, user_input: &str) -> Result<Outcome, Error> {
        self.runner.run_exchange(&mut self.conversation, user_input).await
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn runner(&self) -> &ConversationLoop {
        &self.runner
    }
}
