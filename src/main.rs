//! Agentica command line
//!
//! ```text
//! agentica run --config agent.yaml --task "What time is it?" [--scripted responses.json] [--log-dir logs]
//! agentica tools
//! ```
//!
//! `run` uses the OpenRouter provider configured from the environment unless
//! `--scripted` points at a JSON array of canned model responses.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use agentica::agent::{AgentDefinition, StepLoop};
use agentica::cli::Console;
use agentica::llm::{LlmProvider, OpenRouterProvider, ScriptedProvider};
use agentica::logging::{self, LogConfig};
use agentica::tools::common;

const USAGE: &str = "usage:
  agentica run --config <agent.yaml> --task <text> [--scripted <responses.json>] [--log-dir <dir>]
  agentica tools";

struct RunArgs {
    config: PathBuf,
    task: String,
    scripted: Option<PathBuf>,
    log_dir: Option<PathBuf>,
}

fn parse_run_args(args: &[String]) -> Result<RunArgs> {
    let mut config = None;
    let mut task = None;
    let mut scripted = None;
    let mut log_dir = None;

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .with_context(|| format!("missing value for {}", flag))
        };
        match flag.as_str() {
            "--config" => config = Some(PathBuf::from(value()?)),
            "--task" => task = Some(value()?),
            "--scripted" => scripted = Some(PathBuf::from(value()?)),
            "--log-dir" => log_dir = Some(PathBuf::from(value()?)),
            other => bail!("unknown argument: {}\n{}", other, USAGE),
        }
    }

    Ok(RunArgs {
        config: config.with_context(|| format!("--config is required\n{}", USAGE))?,
        task: task.with_context(|| format!("--task is required\n{}", USAGE))?,
        scripted,
        log_dir,
    })
}

async fn run(args: RunArgs) -> Result<bool> {
    let mut log_config = LogConfig::new();
    if let Some(dir) = &args.log_dir {
        log_config = log_config.with_log_dir(dir);
    }
    let _guard = logging::init_logging(&log_config)?;

    let console = Console::new();

    let definition = AgentDefinition::load(&args.config)?;
    let config = definition.to_config()?;
    let tools = Arc::new(definition.builtin_registry()?);

    let llm: Arc<dyn LlmProvider> = match &args.scripted {
        Some(path) => Arc::new(ScriptedProvider::from_file(path)?),
        None => Arc::new(OpenRouterProvider::from_env()?),
    };

    if definition.is_verbose() {
        console.print_banner(
            definition.name(),
            definition.description.as_deref(),
            definition.logo.as_deref(),
        );
    }

    let mut step_loop = StepLoop::new(config, llm, tools)?;

    let token = step_loop.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling run");
            token.cancel();
        }
    });

    let outcome = step_loop.run(&args.task).await;
    console.print_outcome(&outcome);

    Ok(outcome.result.is_success())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("run") => {
            let run_args = parse_run_args(&args[1..])?;
            if !run(run_args).await? {
                std::process::exit(1);
            }
        }
        Some("tools") => {
            for name in common::builtin_names() {
                if let Some(tool) = common::builtin(name) {
                    println!("{}\n", tool.descriptor().render());
                }
            }
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}
