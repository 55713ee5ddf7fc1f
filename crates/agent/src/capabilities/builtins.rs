//! Capabilities every agent gets for free

use async_trait::async_trait;
use kotto_prompts::{DeclarationNode, NodeKind, Scope};
use serde_json::Value;

use super::{Arguments, Capability};
use crate::Signal;

/// Namespace user capabilities may not use
pub const PREFIX: &str = "builtins.";

pub const EXIT: &str = "builtins.exit";

const EXIT_DECL: &str = "declare namespace builtins {
    /**
     * Call this when the program is done, with its result if it has one.
     */
    function exit(value?: any): never;
}";

/// `builtins.exit`, ends the run with an optional value
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitCapability;

impl ExitCapability {
    pub fn declaration() -> DeclarationNode {
        DeclarationNode::new(NodeKind::FnDecl, EXIT, EXIT_DECL)
    }
}

#[async_trait]
impl Capability for ExitCapability {
    fn name(&self) -> &str {
        EXIT
    }

    fn contribute(&self, scope: &mut Scope<'_>) -> kotto_prompts::Result<()> {
        scope.add_node(Self::declaration());
        Ok(())
    }

    async fn invoke(&self, args: Arguments) -> Result<Value, Signal> {
        let mut values = args.into_values();
        match values.len() {
            0 => Err(Signal::Exit(None)),
            1 => Err(Signal::Exit(values.pop())),
            n => Err(Signal::Feedback(format!(
                "`{}` takes at most one argument, got {}",
                EXIT, n
            ))),
        }
    }
}
