//! Command line arguments for erc20-classifier.
//!
//! Options are global so they can be given before or after the command.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command to execute
#[derive(Debug, Clone, PartialEq, Eq, Default, Subcommand)]
pub enum Command {
    /// Classify a slice of the corpus (default)
    #[default]
    Classify,
    /// List the suite's checks in report column order
    List,
    /// Print version and build information
    Version,
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated report, one row per token
    #[default]
    Csv,
    /// Machine-readable JSON
    Json,
    /// Human-readable terminal table
    Text,
}

/// Parsed command line arguments
#[derive(Debug, Clone, Parser)]
#[command(
    name = "erc20-classifier",
    version,
    about = "Classify ERC-20 tokens with a forge post-deployment test suite"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Corpus to classify: bad-top, bad-all or top
    #[arg(long, global = true, default_value = "bad-top")]
    pub corpus: String,

    /// Directory corpus paths are resolved against
    #[arg(long, global = true, default_value = ".")]
    pub corpus_root: PathBuf,

    /// Index of the first token to classify
    #[arg(long, global = true, default_value_t = 0)]
    pub offset: usize,

    /// Number of tokens to classify
    #[arg(long, global = true, default_value_t = 3)]
    pub count: usize,

    /// Test file holding the suite
    #[arg(long, global = true, default_value = "test/ERC20PostDeploymentTest.sol")]
    pub test_file: String,

    /// Contract inside the test file
    #[arg(long, global = true, default_value = "ERC20PostDeploymentTest")]
    pub contract: String,

    /// Also export the token address as ERC20_IMPLEMENTATION_ADDRESS
    #[arg(long, global = true)]
    pub bind_implementation: bool,

    /// forge binary
    #[arg(long, global = true, default_value = "forge")]
    pub forge: PathBuf,

    /// Foundry project directory forge runs in
    #[arg(long, global = true)]
    pub project_root: Option<PathBuf>,

    /// RPC endpoint to fork; defaults to Infura mainnet
    #[arg(long, global = true, env = "FORK_URL", hide_env_values = true)]
    pub fork_url: Option<String>,

    /// Infura project key for the default fork endpoint
    #[arg(long, global = true, env = "INFURA_API_KEY", hide_env_values = true)]
    pub infura_api_key: Option<String>,

    /// Etherscan key exported to the suite
    #[arg(long, global = true, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    pub etherscan_api_key: Option<String>,

    /// Check whose failure reason carries the token name
    #[arg(long, global = true, default_value = "testName")]
    pub name_check: String,

    /// Check whose failure reason carries the token symbol
    #[arg(long, global = true, default_value = "testSymbol")]
    pub symbol_check: String,

    /// Check whose failure reason carries the token decimals
    #[arg(long, global = true, default_value = "testDecimals")]
    pub decimals_check: String,

    /// Tokens classified concurrently
    #[arg(short, long, global = true, default_value_t = 1, value_parser = parse_jobs)]
    pub jobs: usize,

    /// Kill a forge invocation after this many milliseconds
    #[arg(long = "timeout", global = true)]
    pub timeout_ms: Option<u64>,

    /// Report format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Csv, env = "ERC20_CLASSIFIER_FORMAT")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Exit with status 1 when any token was skipped
    #[arg(long, global = true)]
    pub fail_on_skip: bool,

    /// Only log errors; the text report also drops its column legend
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log debug detail and pass forge's stderr through
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl Args {
    /// Command to run, `classify` when none was given
    pub fn selected_command(&self) -> Command {
        self.command.clone().unwrap_or_default()
    }

    /// Color is off with --no-color or a NO_COLOR environment variable
    pub fn color_enabled(&self) -> bool {
        !self.no_color && std::env::var_os("NO_COLOR").is_none()
    }

    /// Log filter implied by -q / -v
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }
}

fn parse_jobs(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(jobs) => Ok(jobs),
        Err(_) => Err(format!("invalid job count: '{}'", value)),
    }
}
