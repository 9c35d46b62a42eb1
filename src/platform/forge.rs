//! forge process interface.
//!
//! Runs Foundry's `forge test` in listing mode and in per-token mode and
//! hands back the final JSON payload it prints.
//!
//! # Graceful Degradation
//!
//! This module handles errors gracefully:
//! - Missing binary: Returns EngineError::Spawn with the binary path
//! - Non-zero exit status: Not an error; failing checks make forge exit 1
//! - Hanging invocation: Killed after the configured timeout, EngineError::Timeout
//! - Build noise on stdout: Ignored, only the last JSON line is returned
//! - No JSON at all: Returns EngineError::NoPayload with the exit status
//!
//! Per-token bindings travel in an `ExecutionContext` and are set on the
//! child process only. The parent environment is never modified.

use crate::ClassifierConfig;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Token under test
pub const ENV_TOKEN_ADDRESS: &str = "ERC20_ADDRESS";
/// Implementation address for proxied tokens
pub const ENV_IMPLEMENTATION_ADDRESS: &str = "ERC20_IMPLEMENTATION_ADDRESS";
/// Block explorer credential some suites use for source lookups
pub const ENV_API_KEY: &str = "ETHERSCAN_API_KEY";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Identifies one suite: a test file and the contract inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteSpec {
    pub test_file: String,
    pub contract: String,
    /// Also bind the token address as its implementation address
    pub bind_implementation: bool,
}

impl Default for SuiteSpec {
    fn default() -> Self {
        SuiteSpec {
            test_file: "test/ERC20PostDeploymentTest.sol".to_string(),
            contract: "ERC20PostDeploymentTest".to_string(),
            bind_implementation: false,
        }
    }
}

impl SuiteSpec {
    /// Key forge uses for this suite in `--json` run output
    pub fn result_key(&self) -> String {
        format!("{}:{}", self.test_file, self.contract)
    }
}

/// Per-invocation bindings for one token.
#[derive(Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub address: String,
    pub implementation_address: Option<String>,
    pub fork_url: String,
    pub api_key: Option<String>,
}

impl ExecutionContext {
    pub fn for_token(
        address: &str,
        suite: &SuiteSpec,
        fork_url: &str,
        api_key: Option<&str>,
    ) -> Self {
        ExecutionContext {
            address: address.to_string(),
            implementation_address: suite.bind_implementation.then(|| address.to_string()),
            fork_url: fork_url.to_string(),
            api_key: api_key.map(|k| k.to_string()),
        }
    }

    /// Environment variables to set on the engine process
    pub fn env_bindings(&self) -> Vec<(&'static str, &str)> {
        let mut env = vec![(ENV_TOKEN_ADDRESS, self.address.as_str())];
        if let Some(ref implementation) = self.implementation_address {
            env.push((ENV_IMPLEMENTATION_ADDRESS, implementation.as_str()));
        }
        if let Some(ref key) = self.api_key {
            env.push((ENV_API_KEY, key.as_str()));
        }
        env
    }
}

// Keeps credentials and the keyed fork URL out of debug logs.
impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("address", &self.address)
            .field("implementation_address", &self.implementation_address)
            .field("fork_url", &redact_url(&self.fork_url))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Errors raised while invoking the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("failed to launch {binary}: {message}")]
    Spawn { binary: String, message: String },

    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("no JSON payload in engine output (exit status: {status})")]
    NoPayload { status: String },

    #[error("I/O error while waiting for engine: {0}")]
    Io(String),
}

/// The external contract-test engine.
///
/// Both methods return the raw JSON payload; decoding belongs to the caller.
pub trait TestEngine: Sync {
    /// List every test in the project, keyed by file then contract
    fn list(&self, suite: &SuiteSpec) -> Result<String, EngineError>;

    /// Run exactly one suite with the given token bindings
    fn run(&self, suite: &SuiteSpec, context: &ExecutionContext) -> Result<String, EngineError>;
}

/// `forge` subprocess engine
#[derive(Debug, Clone)]
pub struct ForgeEngine {
    binary: PathBuf,
    project_root: Option<PathBuf>,
    timeout: Option<Duration>,
    quiet: bool,
}

impl ForgeEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        ForgeEngine {
            binary: binary.into(),
            project_root: None,
            timeout: None,
            quiet: true,
        }
    }

    /// Engine configured from a classifier configuration
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let mut engine = ForgeEngine::new(config.forge_binary.clone());
        if let Some(ref root) = config.project_root {
            engine = engine.with_project_root(root.clone());
        }
        if let Some(ms) = config.timeout_ms {
            engine = engine.with_timeout(Duration::from_millis(ms));
        }
        engine
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// When false, forge's stderr is passed through instead of discarded
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn base_command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        if let Some(ref root) = self.project_root {
            command.current_dir(root);
        }
        command
    }

    fn list_command(&self, suite: &SuiteSpec) -> Command {
        let mut command = self.base_command();
        command.args(["test", "--list", "--json", "--match-path", suite.test_file.as_str()]);
        command
    }

    fn run_command(&self, suite: &SuiteSpec, context: &ExecutionContext) -> Command {
        let mut command = self.base_command();
        command.args([
            "test",
            "--json",
            "--match-path",
            suite.test_file.as_str(),
            "--match-contract",
            suite.contract.as_str(),
            "--fork-url",
            context.fork_url.as_str(),
        ]);
        command.envs(context.env_bindings());
        command
    }

    fn execute(&self, mut command: Command) -> Result<String, EngineError> {
        command.stdin(Stdio::null()).stdout(Stdio::piped());
        if self.quiet {
            command.stderr(Stdio::null());
        } else {
            command.stderr(Stdio::inherit());
        }

        let mut child = command.spawn().map_err(|e| EngineError::Spawn {
            binary: self.binary.display().to_string(),
            message: e.to_string(),
        })?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Io("stdout was not captured".to_string()))?;
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        let waited = match self.timeout {
            Some(limit) => wait_with_timeout(&mut child, limit),
            None => child.wait().map_err(|e| EngineError::Io(e.to_string())),
        };

        // joined on every path, a killed child closes the pipe
        let read = reader
            .join()
            .map_err(|_| EngineError::Io("stdout reader panicked".to_string()));

        let status = waited?;
        let bytes = read?.map_err(|e| EngineError::Io(e.to_string()))?;
        let output = String::from_utf8_lossy(&bytes);

        log::debug!("{} exited with {}", self.binary.display(), status);

        extract_json_payload(&output)
            .map(|payload| payload.to_string())
            .ok_or_else(|| EngineError::NoPayload {
                status: status.to_string(),
            })
    }
}

impl TestEngine for ForgeEngine {
    fn list(&self, suite: &SuiteSpec) -> Result<String, EngineError> {
        log::debug!("Listing tests in {}", suite.test_file);
        self.execute(self.list_command(suite))
    }

    fn run(&self, suite: &SuiteSpec, context: &ExecutionContext) -> Result<String, EngineError> {
        log::debug!("Running {} with {:?}", suite.result_key(), context);
        self.execute(self.run_command(suite, context))
    }
}

/// Wait for the child, killing it once the limit passes
fn wait_with_timeout(child: &mut Child, limit: Duration) -> Result<ExitStatus, EngineError> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(e) => return Err(EngineError::Io(e.to_string())),
        }

        if start.elapsed() >= limit {
            let _ = child.kill();
            let _ = child.wait();
            return Err(EngineError::Timeout {
                timeout_ms: limit.as_millis() as u64,
            });
        }

        thread::sleep(POLL_INTERVAL);
    }
}

/// Final JSON document in engine output.
///
/// forge prints its `--json` report as one line, possibly after compiler
/// progress lines. A fully-JSON output is returned as is.
pub fn extract_json_payload(output: &str) -> Option<&str> {
    let trimmed = output.trim();
    if trimmed.starts_with('{')
        && serde_json::from_str::<serde::de::IgnoredAny>(trimmed).is_ok()
    {
        return Some(trimmed);
    }

    trimmed
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with('{') && line.ends_with('}'))
}

/// Strip the path (where Infura keeps the key) from an RPC URL
fn redact_url(url: &str) -> String {
    match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            let host_end = rest.find('/').unwrap_or(rest.len());
            if host_end == rest.len() {
                url.to_string()
            } else {
                format!("{}/...", &url[..scheme_end + 3 + host_end])
            }
        }
        None => "<redacted>".to_string(),
    }
}
