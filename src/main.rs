//! tooldispatch CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tooldispatch::agent::ToolCallingAgent;
use tooldispatch::capability::{builtin, CapabilityRegistry};
use tooldispatch::cli::{is_exit_line, Cli, Commands, RunArgs};
use tooldispatch::dispatcher::DispatchResult;
use tooldispatch::prompt::build_system_prompt;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "tooldispatch=debug" } else { "tooldispatch=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.resolve_config()?;
    // Duplicate names are a startup error.
    let registry = Arc::new(CapabilityRegistry::with_capabilities(builtin::all_capabilities(&config)?)?);

    match cli.command {
        Commands::Prompt => {
            println!("{}", build_system_prompt(&registry));
            Ok(())
        }
        Commands::Run(args) => {
            let agent = ToolCallingAgent::from_config(&config, registry);
            handle_run(&agent, args).await
        }
        Commands::Chat => {
            let agent = ToolCallingAgent::from_config(&config, registry);
            handle_chat(&agent).await
        }
    }
}

async fn handle_run(agent: &ToolCallingAgent, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let report = agent.run_with_cancel(&args.instruction, &cancel).await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.result)?);
    } else {
        print_result(&report.result);
    }

    if report.result.is_error() {
        std::process::exit(2);
    }
    Ok(())
}

async fn handle_chat(agent: &ToolCallingAgent) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!(
        "Capabilities: {}. Type 'exit' to quit.",
        agent.registry().names().collect::<Vec<_>>().join(", ")
    );

    while let Some(line) = lines.next_line().await? {
        if is_exit_line(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let result = agent.run(&line).await;
        print_result(&result);
        println!("{}", "-".repeat(50));
    }
    Ok(())
}

fn print_result(result: &DispatchResult) {
    match (&result.error, &result.capability) {
        (None, Some(name)) if result.success => println!("[{name}] {}", result.output),
        (None, _) => println!("{}", result.output),
        (Some(kind), _) => eprintln!("{kind}: {}", result.output),
    }
}
