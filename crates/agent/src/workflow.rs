//! Multi-agent workflows.
//!
//! - **Sequential**: each agent's answer is the next agent's input.
//! - **Hierarchical**: a manager answers with a JSON plan assigning tasks to
//!   workers by index; the tasks run in plan order.

use agentloom_core::error::Error;
use serde::Deserialize;
use tracing::info;

use crate::agent::Agent;

/// One entry of a manager's plan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssignment {
    pub agent_index: usize,
    pub task_description: String,
}

/// Pipe `prompt` through `agents` in order and return the last answer.
pub async fn run_sequential(prompt: &str, agents: &mut [Agent]) -> Result<String, Error> {
    if agents.is_empty() {
        return Err(Error::Workflow("sequential workflow needs at least one agent".into()));
    }

    let mut input = prompt.to_string();
    for (index, agent) in agents.iter_mut().enumerate() {
        input = agent.send(&input).await?;
        info!(agent = index, chars = input.len(), "Sequential step complete");
    }
    Ok(input)
}

/// Ask `manager` for a plan, then run each assignment on its worker.
///
/// Returns the answer of the last assignment.
pub async fn run_hierarchical(prompt: &str, manager: &mut Agent, workers: &mut [Agent]) -> Result<String, Error> {
    let plan_text = manager.send(prompt).await?;
    let plan = parse_plan(&plan_text)?;

    if let Some(bad) = plan.iter().find(|a| a.agent_index >= workers.len()) {
        return Err(Error::Workflow(format!(
            "plan assigns a task to agent {} but only {} workers exist",
            bad.agent_index,
            workers.len()
        )));
    }
    info!(tasks = plan.len(), "Manager plan accepted");

    let mut answer = None;
    for assignment in &plan {
        let worker = &mut workers[assignment.agent_index];
        let result = worker.send(&assignment.task_description).await?;
        info!(agent = assignment.agent_index, chars = result.len(), "Hierarchical task complete");
        answer = Some(result);
    }
    answer.ok_or_else(|| Error::Workflow("manager plan assigned no tasks".into()))
}

/// Extract the plan: the JSON array spanning the first `[` to the last `]`.
pub fn parse_plan(text: &str) -> Result<Vec<TaskAssignment>, Error> {
    let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) else {
        return Err(Error::Workflow("manager answer contains no JSON plan".into()));
    };
    if end < start {
        return Err(Error::Workflow("manager answer contains no JSON plan".into()));
    }
    serde_json::from_str(&text[start..=end]).map_err(|e| Error::Workflow(format!("malformed plan: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loop_runner::ConversationLoop;
    use crate::test_helpers::{ScriptedTransport, text_response};
    use agentloom_core::event::EventBus;
    use agentloom_core::tool::ToolRegistry;
    use std::sync::Arc;

    async fn agent(transport: Arc<ScriptedTransport>) -> Agent {
        let runner = ConversationLoop::new(transport, Arc::new(ToolRegistry::new()), Arc::new(EventBus::default()));
        Agent::new(runner, "worker").await.unwrap()
    }

    fn last_user_message(transport: &ScriptedTransport, call: usize) -> String {
        transport.requests()[call]
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn sequential_chains_answers() {
        let first = Arc::new(ScriptedTransport::new(vec![text_response("research notes")]));
        let second = Arc::new(ScriptedTransport::new(vec![text_response("final draft")]));
        let mut agents = vec![agent(first.clone()).await, agent(second.clone()).await];

        let answer = run_sequential("write about rust", &mut agents).await.unwrap();

        assert_eq!(answer, "final draft");
        assert_eq!(last_user_message(&first, 0), "write about rust");
        assert_eq!(last_user_message(&second, 0), "research notes");
    }

    #[tokio::test]
    async fn sequential_needs_agents() {
        assert!(matches!(run_sequential("x", &mut []).await, Err(Error::Workflow(_))));
    }

    #[tokio::test]
    async fn hierarchical_runs_plan_in_order() {
        let plan = r#"Here is the plan:
[{"agentIndex": 1, "taskDescription": "research"}, {"agentIndex": 0, "taskDescription": "write"}]
Good luck."#;
        let manager_transport = Arc::new(ScriptedTransport::new(vec![text_response(plan)]));
        let w0 = Arc::new(ScriptedTransport::new(vec![text_response("article")]));
        let w1 = Arc::new(ScriptedTransport::new(vec![text_response("facts")]));

        let mut manager = agent(manager_transport).await;
        let mut workers = vec![agent(w0.clone()).await, agent(w1.clone()).await];

        let answer = run_hierarchical("make content", &mut manager, &mut workers).await.unwrap();
        assert_eq!(answer, "article");
        assert_eq!(last_user_message(&w1, 0), "research");
        assert_eq!(last_user_message(&w0, 0), "write");
    }

    #[tokio::test]
    async fn hierarchical_rejects_out_of_range_index() {
        let manager_transport = Arc::new(ScriptedTransport::new(vec![text_response(
            r#"[{"agentIndex": 5, "taskDescription": "x"}]"#,
        )]));
        let mut manager = agent(manager_transport).await;
        let mut workers = vec![agent(Arc::new(ScriptedTransport::new(vec![]))).await];

        let err = run_hierarchical("go", &mut manager, &mut workers).await.unwrap_err();
        assert!(matches!(err, Error::Workflow(msg) if msg.contains("agent 5")));
    }

    #[test]
    fn parse_plan_errors() {
        assert!(parse_plan("no plan here").is_err());
        assert!(parse_plan("] backwards [").is_err());
        assert!(parse_plan(r#"[{"agentIndex": "zero"}]"#).is_err());
    }

    #[test]
    fn parse_plan_spans_first_to_last_bracket() {
        let plan = parse_plan(r#"x [{"agentIndex": 0, "taskDescription": "a [b]"}] y"#).unwrap();
        assert_eq!(
            plan,
            vec![TaskAssignment {
                agent_index: 0,
                task_description: "a [b]".into()
            }]
        );
    }

    #[tokio::test]
    async fn empty_plan_is_an_error() {
        let manager_transport = Arc::new(ScriptedTransport::new(vec![text_response("[]")]));
        let mut manager = agent(manager_transport).await;
        let err = run_hierarchical("go", &mut manager, &mut []).await.unwrap_err();
        assert!(matches!(err, Error::Workflow(_)));
    }
}
