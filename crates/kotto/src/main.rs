//! kotto - let a language model drive your program

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod agents;
mod commands;

use commands::{agents_command, config_command, run_command};

/// kotto - run agents driven by a language model
#[derive(Parser)]
#[command(name = "kotto")]
#[command(about = "Let a language model drive your program")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an agent until it exits
    Run(RunArgs),
    /// Run an agent with trace logging
    Debug(RunArgs),
    /// Set a configuration attribute
    Config {
        /// Attribute name, e.g. openai.key
        attr: String,
        /// New value
        value: String,
    },
    /// List bundled agents
    Agents,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Name of a bundled agent
    pub agent: String,
    /// Trace every thought, call and return
    #[arg(long)]
    pub trace: bool,
    /// Do not offer builtins.exit to the model
    #[arg(long)]
    pub no_exit: bool,
    /// Load declarations from this artifact instead of the bundled one
    #[arg(long, value_name = "PATH", conflicts_with = "source")]
    pub prompts: Option<PathBuf>,
    /// Compile declarations from this source file with kottoc first
    #[arg(long, value_name = "PATH")]
    pub source: Option<String>,
    /// Give up after this many turns
    #[arg(long, value_name = "N")]
    pub max_turns: Option<u64>,
    /// Arguments passed to the agent
    #[arg(last = true)]
    pub args: Vec<String>,
}

const KOTTO_CRATES: &[&str] = &[
    "kotto",
    "kotto_agent",
    "kotto_prompts",
    "kotto_provider",
    "kotto_config",
];

fn init_tracing(trace: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if trace {
            let directives = KOTTO_CRATES
                .iter()
                .map(|c| format!("{}=trace", c))
                .collect::<Vec<_>>()
                .join(",");
            EnvFilter::new(format!("warn,{}", directives))
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let trace = match &cli.command {
        Commands::Run(args) => args.trace,
        Commands::Debug(_) => true,
        _ => false,
    };
    init_tracing(trace);

    let result = match cli.command {
        Commands::Run(args) => run_command(args).await,
        Commands::Debug(args) => run_command(RunArgs { trace: true, ..args }).await,
        Commands::Config { attr, value } => config_command(attr, value).await,
        Commands::Agents => agents_command(),
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
