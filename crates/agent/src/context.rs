//! Context builder for assembling the initial prompt

use kotto_prompts::{DeclarationGraph, Scope};
use tracing::debug;

use crate::capabilities::{Capability, CapabilityRegistry, ExitCapability};
use crate::template::Template;

/// Closes the graph over what the registered capabilities need
pub struct ContextBuilder<'r> {
    registry: &'r CapabilityRegistry,
    allow_exit: bool,
}

impl<'r> ContextBuilder<'r> {
    pub fn new(registry: &'r CapabilityRegistry) -> Self {
        Self {
            registry,
            allow_exit: true,
        }
    }

    /// Whether `builtins.exit` is declared
    pub fn allow_exit(mut self, allow: bool) -> Self {
        self.allow_exit = allow;
        self
    }

    pub fn scope<'g>(&self, graph: &'g DeclarationGraph) -> kotto_prompts::Result<Scope<'g>> {
        let mut scope = graph.scope();
        self.registry.contribute(&mut scope)?;
        if self.allow_exit {
            ExitCapability.contribute(&mut scope)?;
        }
        debug!("context scope holds {} declarations", scope.len());
        Ok(scope)
    }

    pub fn render(
        &self,
        graph: &DeclarationGraph,
        template: &dyn Template,
    ) -> kotto_prompts::Result<String> {
        let scope = self.scope(graph)?;
        Ok(template.render_context(&scope))
    }
}
