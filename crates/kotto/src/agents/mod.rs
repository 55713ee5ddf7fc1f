//! Bundled demo agents

use anyhow::Result;
use kotto_agent::CapabilityRegistry;
use kotto_prompts::DeclarationGraph;

mod extract;
mod hello;
mod hello_world;

/// An agent shipped with the binary, with its compiled declarations
pub struct BundledAgent {
    pub name: &'static str,
    pub about: &'static str,
    artifact: &'static str,
    registry: fn(&[String]) -> Result<CapabilityRegistry>,
}

impl BundledAgent {
    /// Capabilities for a run, given the arguments after `--`
    pub fn registry(&self, args: &[String]) -> Result<CapabilityRegistry> {
        (self.registry)(args)
    }

    /// The declarations embedded at build time
    pub fn graph(&self) -> kotto_prompts::Result<DeclarationGraph> {
        DeclarationGraph::from_artifact(self.artifact)
    }
}

const AGENTS: &[BundledAgent] = &[
    BundledAgent {
        name: "hello",
        about: "Says something encouraging",
        artifact: include_str!("../../prompts/hello.prompts.js"),
        registry: hello::registry,
    },
    BundledAgent {
        name: "hello-world",
        about: "Cheers you up",
        artifact: include_str!("../../prompts/hello-world.prompts.js"),
        registry: hello_world::registry,
    },
    BundledAgent {
        name: "extract",
        about: "Extracts structured data from free text (argument or stdin)",
        artifact: include_str!("../../prompts/extract.prompts.js"),
        registry: extract::registry,
    },
];

pub fn all() -> &'static [BundledAgent] {
    AGENTS
}

pub fn find(name: &str) -> Option<&'static BundledAgent> {
    AGENTS.iter().find(|agent| agent.name == name)
}
