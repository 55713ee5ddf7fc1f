//! Agent execution engine
//!
//! Lets a model drive a program: the model picks which capability to call
//! and with what arguments, the controller dispatches it and feeds the
//! result back until the program signals completion.

use serde_json::Value;
use thiserror::Error;

pub mod capabilities;
pub mod context;
pub mod controller;
pub mod template;

pub use capabilities::{Arguments, Capability, CapabilityRegistry, FnCapability, RegistryBuilder};
pub use context::ContextBuilder;
pub use controller::{ActionRecord, AgentController, AgentOptions, Pending, Turn};
pub use template::{Naive, ParseError, StructuredCall, Template};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Control signals raised while dispatching a call
#[derive(Error, Debug)]
pub enum Signal {
    /// Recoverable: the message is sent back to the model as a correction
    #[error("{0}")]
    Feedback(String),

    /// Abort the run and hand the cause to the caller
    #[error("interrupted: {0}")]
    Interrupt(#[source] BoxError),

    /// Successful termination with an optional payload
    #[error("exit")]
    Exit(Option<Value>),

    /// Contract violation, never retried
    #[error("{0}")]
    Fatal(#[source] BoxError),
}

impl Signal {
    pub fn feedback(message: impl Into<String>) -> Self {
        Signal::Feedback(message.into())
    }

    pub fn interrupt(cause: impl Into<BoxError>) -> Self {
        Signal::Interrupt(cause.into())
    }

    pub fn exit(value: impl Into<Value>) -> Self {
        Signal::Exit(Some(value.into()))
    }

    pub fn fatal(cause: impl Into<BoxError>) -> Self {
        Signal::Fatal(cause.into())
    }
}

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("interrupted: {0}")]
    Interrupted(#[source] BoxError),

    #[error(transparent)]
    Provider(#[from] kotto_provider::ProviderError),

    #[error(transparent)]
    Prompts(#[from] kotto_prompts::PromptsError),

    #[error("capability '{name}' failed: {source}")]
    Capability {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("capability '{0}' is registered twice")]
    DuplicateCapability(String),

    #[error("'{0}' is in the reserved builtins namespace")]
    ReservedName(String),

    #[error("agent is done")]
    Done,
}

pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::error::Error as _;

    #[test]
    fn test_signal_helpers() {
        assert!(matches!(Signal::feedback("bad arg"), Signal::Feedback(m) if m == "bad arg"));
        assert!(matches!(Signal::exit("done"), Signal::Exit(Some(v)) if v == json!("done")));
        assert!(matches!(Signal::exit(json!({"a": 1})), Signal::Exit(Some(_))));
        assert!(matches!(Signal::interrupt("no language"), Signal::Interrupt(_)));
    }

    #[test]
    fn test_signal_display() {
        assert_eq!(Signal::feedback("bad arg").to_string(), "bad arg");
        assert_eq!(
            Signal::interrupt("user left").to_string(),
            "interrupted: user left"
        );
    }

    #[test]
    fn test_interrupt_keeps_cause() {
        let err = AgentError::Interrupted("user left".into());
        assert_eq!(err.to_string(), "interrupted: user left");
        assert_eq!(err.source().unwrap().to_string(), "user left");
    }

    #[test]
    fn test_provider_error_is_transparent() {
        let err = AgentError::from(kotto_provider::ProviderError::EmptyCompletion);
        assert_eq!(err.to_string(), "completion has empty content");
    }
}
