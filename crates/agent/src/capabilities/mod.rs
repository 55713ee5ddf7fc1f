//! Capabilities the model can call

pub mod args;
pub mod builtins;
pub mod function;

pub use args::Arguments;
pub use builtins::ExitCapability;
pub use function::FnCapability;

use async_trait::async_trait;
use kotto_prompts::Scope;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use tracing::debug;

use crate::{AgentError, Signal};

type BoxedCapability = Box<dyn Capability>;

/// An operation exposed to the model
#[async_trait]
pub trait Capability: Send + Sync {
    /// Name the model calls it by
    fn name(&self) -> &str;

    /// Add the declarations that describe this capability to `scope`
    fn contribute(&self, scope: &mut Scope<'_>) -> kotto_prompts::Result<()>;

    /// Run with positional arguments. Malformed arguments must come back as
    /// [`Signal::Feedback`].
    async fn invoke(&self, args: Arguments) -> Result<Value, Signal>;
}

/// Fixed table of capabilities, built once per agent
pub struct CapabilityRegistry {
    capabilities: Vec<BoxedCapability>,
    by_name: HashMap<String, usize>,
    classes: Vec<String>,
}

impl CapabilityRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn Capability> {
        self.by_name
            .get(name)
            .map(|&i| self.capabilities[i].as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Class declarations first, then every capability's declarations in
    /// registration order
    pub fn contribute(&self, scope: &mut Scope<'_>) -> kotto_prompts::Result<()> {
        for class in &self.classes {
            scope.add_by_pattern("class_decl", &[Scope::ident(class)])?;
        }
        for capability in &self.capabilities {
            capability.contribute(scope)?;
        }
        Ok(())
    }
}

/// Collects capabilities, then validates names once in [`RegistryBuilder::build`]
#[derive(Default)]
pub struct RegistryBuilder {
    capabilities: Vec<BoxedCapability>,
    classes: Vec<String>,
}

impl RegistryBuilder {
    /// Also describe the agent class itself (`class_decl Class#N`)
    pub fn with_class(mut self, class: &str) -> Self {
        if !self.classes.iter().any(|c| c == class) {
            self.classes.push(class.to_string());
        }
        self
    }

    pub fn register<C: Capability + 'static>(mut self, capability: C) -> Self {
        self.capabilities.push(Box::new(capability));
        self
    }

    /// A method of the agent class, described by its `method_decl`
    pub fn method<F, Fut, T>(self, class: &str, name: &str, handler: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Signal>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        self.register(FnCapability::method(class, name, handler))
    }

    /// A free function, described by its `fn_decl`
    pub fn function<F, Fut, T>(self, name: &str, handler: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Signal>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        self.register(FnCapability::function(name, handler))
    }

    pub fn build(self) -> crate::Result<CapabilityRegistry> {
        let mut by_name = HashMap::with_capacity(self.capabilities.len());
        for (i, capability) in self.capabilities.iter().enumerate() {
            let name = capability.name();
            if name.starts_with(builtins::PREFIX) {
                return Err(AgentError::ReservedName(name.to_string()));
            }
            if by_name.insert(name.to_string(), i).is_some() {
                return Err(AgentError::DuplicateCapability(name.to_string()));
            }
        }

        debug!("registered {} capabilities", self.capabilities.len());

        Ok(CapabilityRegistry {
            capabilities: self.capabilities,
            by_name,
            classes: self.classes,
        })
    }
}
