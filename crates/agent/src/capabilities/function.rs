//! Closure-backed capabilities

use async_trait::async_trait;
use kotto_prompts::Scope;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

use super::{Arguments, Capability};
use crate::Signal;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type Handler = Box<dyn Fn(Arguments) -> BoxFuture<Result<Value, Signal>> + Send + Sync>;

/// Which declarations describe the capability
#[derive(Debug, Clone, PartialEq, Eq)]
enum Declaration {
    Method { class: String },
    Function,
}

/// A capability implemented by an async closure
pub struct FnCapability {
    name: String,
    declaration: Declaration,
    handler: Handler,
}

impl FnCapability {
    /// Method `name` of `class`, described by `method_decl Class#N.name#N`
    pub fn method<F, Fut, T>(class: &str, name: &str, handler: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Signal>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        Self::new(
            name,
            Declaration::Method {
                class: class.to_string(),
            },
            handler,
        )
    }

    /// Free function `name`, described by `fn_decl name#N`
    pub fn function<F, Fut, T>(name: &str, handler: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Signal>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        Self::new(name, Declaration::Function, handler)
    }

    fn new<F, Fut, T>(name: &str, declaration: Declaration, handler: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Signal>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let handler: Handler = Box::new(move |args: Arguments| -> BoxFuture<Result<Value, Signal>> {
            let fut = handler(args);
            Box::pin(async move {
                let output = fut.await?;
                serde_json::to_value(output).map_err(Signal::fatal)
            })
        });

        Self {
            name: name.to_string(),
            declaration,
            handler,
        }
    }
}

#[async_trait]
impl Capability for FnCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn contribute(&self, scope: &mut Scope<'_>) -> kotto_prompts::Result<()> {
        match &self.declaration {
            Declaration::Method { class } => scope.add_by_pattern(
                "method_decl",
                &[Scope::ident(class), Scope::ident(&self.name)],
            ),
            Declaration::Function => scope.add_by_pattern("fn_decl", &[Scope::ident(&self.name)]),
        }
    }

    async fn invoke(&self, args: Arguments) -> Result<Value, Signal> {
        (self.handler)(args).await
    }
}
