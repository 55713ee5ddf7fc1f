//! Agent controller - the conversation state machine

use serde_json::Value;
use std::fmt;
use tracing::{debug, info, trace};

use kotto_prompts::PendingGraph;
use kotto_provider::{LlmClient, Message, Role};

use crate::capabilities::{builtins, Arguments, Capability, CapabilityRegistry, ExitCapability};
use crate::context::ContextBuilder;
use crate::template::{Naive, StructuredCall, Template};
use crate::{AgentError, Result, Signal};

/// Longest rendering of a return value written to the log
const MAX_LOGGED_OUTPUT: usize = 76;

/// Per-run agent options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentOptions {
    /// Offer `builtins.exit` to the model
    pub allow_exit: bool,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self { allow_exit: true }
    }
}

/// The next message to send. Without a prompt, the controller derives one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub role: Role,
    pub prompt: Option<String>,
}

impl Pending {
    pub fn user() -> Self {
        Self {
            role: Role::User,
            prompt: None,
        }
    }

    pub fn system(prompt: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            prompt: Some(prompt.into()),
        }
    }
}

impl Default for Pending {
    fn default() -> Self {
        Self::user()
    }
}

/// Outcome of one tick
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    Pending(Pending),
    Exited(Value),
}

/// A dispatched call and what it returned
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub call: StructuredCall,
    pub output: Option<Value>,
}

#[derive(Debug)]
struct UnknownCapability {
    name: String,
    available: Vec<String>,
}

impl fmt::Display for UnknownCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "there is no function named `{}`, the functions you can call are: {}",
            self.name,
            self.available.join(", ")
        )
    }
}

impl std::error::Error for UnknownCapability {}

/// Drives one agent run: prompts the model, dispatches its calls and feeds
/// the results back until it exits
pub struct AgentController<C: LlmClient> {
    registry: CapabilityRegistry,
    graph: PendingGraph,
    client: C,
    template: Box<dyn Template>,
    options: AgentOptions,
    history: Vec<ActionRecord>,
    exited: bool,
}

impl<C: LlmClient> AgentController<C> {
    pub fn new(registry: CapabilityRegistry, graph: impl Into<PendingGraph>, client: C) -> Self {
        Self {
            registry,
            graph: graph.into(),
            client,
            template: Box::new(Naive),
            options: AgentOptions::default(),
            history: Vec::new(),
            exited: false,
        }
    }

    pub fn with_template<T: Template + 'static>(mut self, template: T) -> Self {
        self.template = Box::new(template);
        self
    }

    pub fn with_options(mut self, options: AgentOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> AgentOptions {
        self.options
    }

    /// Calls dispatched so far, oldest first
    pub fn history(&self) -> &[ActionRecord] {
        &self.history
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn is_exited(&self) -> bool {
        self.exited
    }

    /// Render the full context, waiting for the graph if it is still loading
    pub async fn context(&mut self) -> Result<String> {
        let graph = self.graph.wait().await?;
        let context = ContextBuilder::new(&self.registry)
            .allow_exit(self.options.allow_exit)
            .render(&graph, self.template.as_ref())?;
        Ok(context)
    }

    /// The full context before the first action, then the latest output
    async fn resolve_prompt(&mut self) -> Result<String> {
        let last_output = self
            .history
            .last()
            .map(|record| record.output.clone().unwrap_or(Value::Null));
        match last_output {
            None => self.context().await,
            Some(output) => Ok(self.template.render_output(&output)),
        }
    }

    /// One request, parse and dispatch round
    pub async fn tick(&mut self, pending: Pending) -> Result<Turn> {
        if self.exited {
            return Err(AgentError::Done);
        }

        let prompt = match pending.prompt {
            Some(prompt) => prompt,
            None => self.resolve_prompt().await?,
        };

        trace!("sending {} prompt ({} chars)", pending.role, prompt.len());

        let reply = self
            .client
            .complete(vec![Message::new(pending.role, prompt)])
            .await?;

        let call = match self.template.parse_response(&reply) {
            Ok(call) => call,
            Err(e) => {
                info!("feedback: {}", e);
                return Ok(Turn::Pending(Pending::system(self.template.render_error(&e))));
            }
        };

        if let Some(reasoning) = &call.reasoning {
            info!("thought: {}", reasoning);
        }
        info!(
            "call: {}({})",
            call.name,
            call.arguments
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        match self.dispatch(&call).await {
            Ok(output) => {
                info!("returns: {}", truncate(&output.to_string(), MAX_LOGGED_OUTPUT));
                self.history.push(ActionRecord {
                    call,
                    output: Some(output),
                });
                Ok(Turn::Pending(Pending::user()))
            }
            Err(Signal::Feedback(message)) => {
                info!("feedback: {}", message);
                Ok(Turn::Pending(Pending::system(message)))
            }
            Err(Signal::Exit(value)) => {
                let value = value.unwrap_or(Value::Null);
                info!("exit: {}", value);
                self.exited = true;
                Ok(Turn::Exited(value))
            }
            Err(Signal::Interrupt(cause)) => {
                info!("interrupt: {}", cause);
                Err(AgentError::Interrupted(cause))
            }
            Err(Signal::Fatal(source)) => Err(AgentError::Capability {
                name: call.name,
                source,
            }),
        }
    }

    /// Tick until the model exits, returning the exit value
    pub async fn run_to_completion(&mut self) -> Result<Value> {
        let mut pending = Pending::user();
        let mut turn = 0u64;
        loop {
            turn += 1;
            debug!("turn {}", turn);
            match self.tick(pending).await? {
                Turn::Pending(next) => pending = next,
                Turn::Exited(value) => return Ok(value),
            }
        }
    }

    async fn dispatch(&self, call: &StructuredCall) -> std::result::Result<Value, Signal> {
        let args = Arguments::new(call.name.clone(), call.arguments.clone());

        if call.name.starts_with(builtins::PREFIX) {
            if call.name == builtins::EXIT && self.options.allow_exit {
                return ExitCapability.invoke(args).await;
            }
            return Err(self.unknown(&call.name));
        }

        match self.registry.lookup(&call.name) {
            Some(capability) => capability.invoke(args).await,
            None => Err(self.unknown(&call.name)),
        }
    }

    fn unknown(&self, name: &str) -> Signal {
        let mut available: Vec<String> =
            self.registry.names().into_iter().map(String::from).collect();
        if self.options.allow_exit {
            available.push(builtins::EXIT.to_string());
        }
        let error = UnknownCapability {
            name: name.to_string(),
            available,
        };
        Signal::Feedback(self.template.render_error(&error))
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 76), "short");
        let long = "x".repeat(100);
        let cut = truncate(&long, 76);
        assert_eq!(cut.chars().count(), 76);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_pending_defaults_to_user() {
        assert_eq!(Pending::default(), Pending::user());
        assert_eq!(Pending::user().prompt, None);
        assert_eq!(Pending::system("fix").role, Role::System);
    }

    #[test]
    fn test_options_default_allows_exit() {
        assert!(AgentOptions::default().allow_exit);
    }

    #[test]
    fn test_unknown_capability_lists_names() {
        let err = UnknownCapability {
            name: "fly".to_string(),
            available: vec!["echo".to_string(), "builtins.exit".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "there is no function named `fly`, the functions you can call are: echo, builtins.exit"
        );
    }
}
