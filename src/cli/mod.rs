//! CLI definitions for tooldispatch.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::DispatchConfig;
use crate::error::DispatchError;

/// Words that end an interactive chat session.
pub const EXIT_WORDS: &[&str] = &["exit", "quit", "TERMINATE"];

/// tooldispatch CLI
#[derive(Parser, Debug)]
#[command(name = "tooldispatch", version, about = "Dispatch model tool calls to local capabilities")]
pub struct Cli {
    /// Path to a TOML config file (default: ~/.tooldispatch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model identifier sent to the backend
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// OpenAI-compatible base URL (e.g. http://localhost:11434/v1)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Backend timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one dispatch cycle for an instruction
    Run(RunArgs),
    /// Print the system prompt built from the registered capabilities
    Prompt,
    /// Read instructions from stdin, one dispatch cycle per line
    Chat,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Natural-language instruction
    pub instruction: String,
}

impl Cli {
    /// Resolve the effective config: file and env layers, then CLI flags.
    pub fn resolve_config(&self) -> Result<DispatchConfig, DispatchError> {
        let mut config = DispatchConfig::load(self.config.as_deref())?;
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            if secs == 0 {
                return Err(DispatchError::Configuration("--timeout-secs must be greater than zero".into()));
            }
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

/// Whether a chat line ends the session.
pub fn is_exit_line(line: &str) -> bool {
    let line = line.trim();
    EXIT_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_with_instruction() {
        let cli = Cli::try_parse_from(["tooldispatch", "run", "What's my schedule for today?"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.instruction, "What's my schedule for today?");
                assert!(!args.json);
            }
            other => panic!("expected Run, got {other:?}"),
        }
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tooldispatch",
            "chat",
            "--model",
            "llama3",
            "--base-url",
            "http://localhost:11434/v1",
            "--timeout-secs",
            "5",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Chat));
        assert_eq!(cli.model.as_deref(), Some("llama3"));
        assert_eq!(cli.timeout_secs, Some(5));
    }

    #[test]
    fn parse_prompt() {
        let cli = Cli::try_parse_from(["tooldispatch", "prompt"]).unwrap();
        assert!(matches!(cli.command, Commands::Prompt));
    }

    #[test]
    fn run_requires_instruction() {
        assert!(Cli::try_parse_from(["tooldispatch", "run"]).is_err());
    }

    #[test]
    fn exit_words_end_chat() {
        assert!(is_exit_line("exit"));
        assert!(is_exit_line("  TERMINATE \n"));
        assert!(is_exit_line("Quit"));
        assert!(!is_exit_line("exit the browser"));
    }
}
