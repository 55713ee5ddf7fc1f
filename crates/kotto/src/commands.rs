//! kotto command implementations

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use kotto_agent::{AgentController, AgentOptions, Pending, Turn};
use kotto_config::{self, Config};
use kotto_prompts::{BuildOptions, DeclarationGraph, PendingGraph};
use kotto_provider::{ChatCompletion, LlmClient, OpenAiProvider};

use crate::agents;
use crate::RunArgs;

/// Run a bundled agent and print its exit value
pub async fn run_command(args: RunArgs) -> Result<()> {
    let agent = agents::find(&args.agent).ok_or_else(|| {
        anyhow!(
            "unknown agent '{}', run `kotto agents` to list them",
            args.agent
        )
    })?;

    let config = Config::load().await.context("failed to load config")?;
    let key = config.api_key().ok_or_else(|| {
        anyhow!("no OpenAI key configured, run `kotto config openai.key <KEY>` or set OPENAI_KEY")
    })?;

    let graph = load_graph(agent, &args).await?;
    let registry = agent.registry(&args.args)?;
    debug!("running {} with {:?}", agent.name, registry.names());

    let provider = OpenAiProvider::new(
        key,
        config.api_base().map(String::from),
        Some(config.model().to_string()),
    );
    let client = ChatCompletion::new(provider);
    let mut controller = AgentController::new(registry, graph, client).with_options(AgentOptions {
        allow_exit: !args.no_exit,
    });

    let output = match args.max_turns {
        Some(max_turns) => run_bounded(&mut controller, max_turns).await?,
        None => controller.run_to_completion().await?,
    };

    println!("{}", render_output(&output)?);
    Ok(())
}

/// Bundled artifact unless `--prompts` or `--source` says otherwise
async fn load_graph(agent: &agents::BundledAgent, args: &RunArgs) -> Result<PendingGraph> {
    if let Some(source) = &args.source {
        let opts = BuildOptions::new(kotto_config::artifacts_dir()?);
        let artifact = kotto_prompts::build(source, &opts)
            .await
            .with_context(|| format!("failed to compile {}", source))?;
        info!("compiled {} to {:?}", source, artifact);
        return Ok(DeclarationGraph::spawn_load(artifact));
    }

    if let Some(path) = &args.prompts {
        return Ok(DeclarationGraph::spawn_load(path.clone()));
    }

    let graph = agent
        .graph()
        .with_context(|| format!("bundled declarations for '{}' are invalid", agent.name))?;
    Ok(graph.into())
}

async fn run_bounded<C: LlmClient>(
    controller: &mut AgentController<C>,
    max_turns: u64,
) -> Result<Value> {
    let mut pending = Pending::user();
    for turn in 1..=max_turns {
        debug!("turn {}/{}", turn, max_turns);
        match controller.tick(pending).await? {
            Turn::Pending(next) => pending = next,
            Turn::Exited(value) => return Ok(value),
        }
    }
    bail!("agent did not exit within {} turns", max_turns)
}

/// Strings print raw, everything else as JSON
fn render_output(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string_pretty(other)?),
    }
}

/// Set a configuration attribute and save
pub async fn config_command(attr: String, value: String) -> Result<()> {
    let mut config = Config::load().await.context("failed to load config")?;
    config.set(&attr, &value)?;
    config.save().await.context("failed to save config")?;
    println!("{} updated", attr);
    Ok(())
}

/// List bundled agents
pub fn agents_command() -> Result<()> {
    for agent in agents::all() {
        println!("{:<12} {}", agent.name, agent.about);
    }
    Ok(())
}
