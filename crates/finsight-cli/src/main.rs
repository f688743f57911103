//! finsight: AI-assisted stock analysis from the command line

mod analyze;
mod diagnose;
mod interactive;
mod output;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use finsight_tools::{ToolError, ToolSet};
use finsight_utils::{AppConfig, filter_for_verbosity, init_tracing_with_default};
use tracing::{debug, warn};

use crate::analyze::AnalyzeArgs;

#[derive(Parser, Debug)]
#[command(name = "finsight", version)]
#[command(about = "Stock analysis with Gemini, web search and SEC filings", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze one or more stocks
    Analyze(AnalyzeArgs),
    /// Answer a few questions, then analyze (the default)
    Interactive,
    /// Check connectivity, credentials and tools
    Diagnose,
    /// Invoke a single tool directly
    Tool {
        /// Tool name, e.g. "Financial Calculator"
        name: String,
        /// Input passed to the tool
        input: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing_with_default(filter_for_verbosity(cli.verbose));
    debug!(command = ?cli.command, "Starting finsight");

    match cli.command {
        Some(Commands::Analyze(args)) => analyze::run(args).await,
        Some(Commands::Interactive) | None => interactive::run().await,
        Some(Commands::Diagnose) => diagnose::run().await,
        Some(Commands::Tool { name, input }) => run_tool(&name, &input).await,
    }
}

async fn run_tool(name: &str, input: &str) -> Result<()> {
    let tools = match AppConfig::from_env() {
        Ok(config) => ToolSet::from_config(&config)?,
        Err(e) => {
            warn!(error = %e, "Configuration incomplete, only offline tools are available");
            ToolSet::offline()
        }
    };

    match tools.invoke(name, input).await {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(ToolError::UnknownTool(unknown)) => {
            eprintln!("Available tools:");
            for available in tools.names() {
                eprintln!("  - {available}");
            }
            bail!("Unknown tool: {unknown}")
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["finsight"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_global_verbose_after_subcommand() {
        let cli = Cli::try_parse_from(["finsight", "diagnose", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::Diagnose)));
    }

    #[test]
    fn test_tool_command() {
        let cli =
            Cli::try_parse_from(["finsight", "tool", "Financial Calculator", "2 * (3 + 4)"]).unwrap();
        match cli.command {
            Some(Commands::Tool { name, input }) => {
                assert_eq!(name, "Financial Calculator");
                assert_eq!(input, "2 * (3 + 4)");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error() {
        assert!(run_tool("Crystal Ball", "AAPL").await.is_err());
    }
}
