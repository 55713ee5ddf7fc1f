//! Prompt templates: what the model sees and how its replies are read

use kotto_prompts::{NodeFormat, Scope};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The model's choice of capability and arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredCall {
    pub name: String,
    /// Advisory only, never validated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

impl StructuredCall {
    pub fn new(name: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            reasoning: None,
            arguments,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}

/// A reply that could not be read as a call
#[derive(Error, Debug, Clone, PartialEq)]
#[error("could not parse your answer as a function call ({reason}), you answered:\n{text}")]
pub struct ParseError {
    pub text: String,
    pub reason: String,
}

/// Strategy for rendering context and reading replies
pub trait Template: Send + Sync {
    /// Instructional block listing the scope's declarations and the
    /// response format
    fn render_context(&self, scope: &Scope<'_>) -> String;

    /// A capability's return value, as the next user message
    fn render_output(&self, value: &Value) -> String;

    /// A failure, as a corrective system message
    fn render_error(&self, error: &dyn std::error::Error) -> String;

    fn parse_response(&self, response: &str) -> Result<StructuredCall, ParseError>;
}

const RESPONSE_FORMAT: &str = r#"{
   "name": "the name of the function you want to call",
   "reasoning": "the reasoning that you've used to arrive to the conclusion you should use this function",
   "arguments": [
        // ... the arguments of the function you want to call
   ]
}"#;

pub fn block_quote(body: &str, lang: &str) -> String {
    format!("```{}\n{}\n```", lang, body)
}

/// Plain instructions, TypeScript declarations, JSON answers
#[derive(Debug, Clone, Copy, Default)]
pub struct Naive;

impl Template for Naive {
    fn render_context(&self, scope: &Scope<'_>) -> String {
        let flattened = scope
            .current()
            .into_iter()
            .filter(|node| node.format == NodeFormat::TypeScript)
            .map(|node| node.fmt.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "You are the runtime of a JavaScript program, you decide which functions to call.

Here is the abbreviated code of the program:

{}

Each of your prompts must be of the following valid JSON form:

{}

You must make sure that the function you are calling accepts the arguments you give it.

Let's begin!",
            block_quote(&flattened, "TypeScript"),
            RESPONSE_FORMAT
        )
    }

    fn render_output(&self, value: &Value) -> String {
        block_quote(&value.to_string(), "json")
    }

    fn render_error(&self, error: &dyn std::error::Error) -> String {
        format!(
            "error: {}.

Remember, your answers must be valid JSON objects, conforming to the following format (excluding the block quote):

{}

Your answer must not include anything other than a valid JSON object.",
            error,
            block_quote(RESPONSE_FORMAT, "json")
        )
    }

    fn parse_response(&self, response: &str) -> Result<StructuredCall, ParseError> {
        let trimmed = response.trim();

        let direct = match serde_json::from_str::<StructuredCall>(trimmed) {
            Ok(call) => return Ok(call),
            Err(e) => e,
        };

        for block in fenced_blocks(trimmed) {
            if let Ok(call) = serde_json::from_str::<StructuredCall>(block.trim()) {
                return Ok(call);
            }
        }

        Err(ParseError {
            text: response.to_string(),
            reason: direct.to_string(),
        })
    }
}

/// Bodies of the ``` fenced blocks in `text`, language tags dropped
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after_fence = &rest[open + 3..];
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        match body.find("```") {
            Some(close) => {
                blocks.push(&body[..close]);
                rest = &body[close + 3..];
            }
            None => break,
        }
    }

    blocks
}
