//! Command-line interface parsing for appsearch
//!
//! Alfred invokes the script filter with the user's query as arguments. This module
//! parses them with clap and turns them into a validated `RunConfig`.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::cache::CacheResolver;
use crate::engine::{EngineConfig, FailurePolicy};
use crate::search::DEFAULT_RESULT_LIMIT;

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// No search term was given
    #[error("Missing search term")]
    EmptyTerm,

    /// Concurrency must be at least one
    #[error("Invalid concurrency: must be at least 1")]
    ZeroConcurrency,

    /// Timeout must be at least one second
    #[error("Invalid timeout: must be at least 1 second")]
    ZeroTimeout,
}

/// Search the Mac App Store from Alfred
#[derive(Parser, Debug)]
#[command(name = "appsearch")]
#[command(about = "Search the Mac App Store and print Alfred feedback with cached artwork")]
#[command(version)]
pub struct Cli {
    /// Search term; multiple words are joined with spaces
    #[arg(value_name = "TERM", required = true)]
    pub term: Vec<String>,

    /// Maximum number of artwork downloads in flight (defaults to the CPU count)
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    pub timeout: u64,

    /// Maximum number of search results
    #[arg(long, value_name = "N", default_value_t = DEFAULT_RESULT_LIMIT)]
    pub limit: u32,

    /// Directory the artwork cache lives under (defaults to the temp directory)
    #[arg(long, value_name = "DIR", env = "alfred_workflow_cache")]
    pub cache_dir: Option<PathBuf>,

    /// Show unavailable artwork instead of failing when a download fails
    #[arg(long)]
    pub isolate_failures: bool,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// The joined search term
    pub term: String,
    /// Maximum concurrent downloads
    pub concurrency: usize,
    /// Maximum number of search results
    pub limit: u32,
    /// Where cache entries are placed
    pub resolver: CacheResolver,
    /// Download engine settings
    pub engine: EngineConfig,
}

/// Number of CPUs available, falling back to one
pub fn default_concurrency() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl RunConfig {
    /// Creates a RunConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(RunConfig)` with defaults filled in
    /// * `Err(CliError)` if a value is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let term = cli.term.join(" ").trim().to_string();
        if term.is_empty() {
            return Err(CliError::EmptyTerm);
        }

        let concurrency = match cli.concurrency {
            Some(0) => return Err(CliError::ZeroConcurrency),
            Some(n) => n,
            None => default_concurrency(),
        };

        if cli.timeout == 0 {
            return Err(CliError::ZeroTimeout);
        }

        let resolver = match &cli.cache_dir {
            Some(dir) => CacheResolver::new(dir),
            None => CacheResolver::in_temp_dir(),
        };

        let policy = if cli.isolate_failures {
            FailurePolicy::IsolateItem
        } else {
            FailurePolicy::AbortBatch
        };

        Ok(RunConfig {
            term,
            concurrency,
            limit: cli.limit,
            resolver,
            engine: EngineConfig {
                timeout: Duration::from_secs(cli.timeout),
                policy,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_single_term() {
        let cli = Cli::parse_from(["appsearch", "xcode"]);
        assert_eq!(cli.term, vec!["xcode"]);
        assert!(cli.concurrency.is_none());
        assert_eq!(cli.timeout, 5);
        assert_eq!(cli.limit, 20);
        assert!(!cli.isolate_failures);
    }

    #[test]
    fn test_cli_requires_term() {
        assert!(Cli::try_parse_from(["appsearch"]).is_err());
    }

    #[test]
    fn test_run_config_joins_words() {
        let cli = Cli::parse_from(["appsearch", "pixel", "editor"]);
        let config = RunConfig::from_cli(&cli).unwrap();
        assert_eq!(config.term, "pixel editor");
    }

    #[test]
    fn test_run_config_defaults() {
        let cli = Cli::parse_from(["appsearch", "--cache-dir", "/tmp/cache", "xcode"]);
        let config = RunConfig::from_cli(&cli).unwrap();
        assert_eq!(config.concurrency, default_concurrency());
        assert!(config.concurrency >= 1);
        assert_eq!(config.engine.timeout, Duration::from_secs(5));
        assert_eq!(config.engine.policy, FailurePolicy::AbortBatch);
        assert_eq!(config.resolver, CacheResolver::new("/tmp/cache"));
    }

    #[test]
    fn test_run_config_custom_values() {
        let cli = Cli::parse_from([
            "appsearch",
            "-j",
            "3",
            "--timeout",
            "10",
            "--limit",
            "7",
            "--isolate-failures",
            "xcode",
        ]);
        let config = RunConfig::from_cli(&cli).unwrap();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.limit, 7);
        assert_eq!(config.engine.timeout, Duration::from_secs(10));
        assert_eq!(config.engine.policy, FailurePolicy::IsolateItem);
    }

    #[test]
    fn test_run_config_rejects_blank_term() {
        let cli = Cli::parse_from(["appsearch", "  "]);
        assert_eq!(RunConfig::from_cli(&cli).unwrap_err(), CliError::EmptyTerm);
    }

    #[test]
    fn test_run_config_rejects_zero_concurrency() {
        let cli = Cli::parse_from(["appsearch", "--concurrency", "0", "xcode"]);
        assert_eq!(
            RunConfig::from_cli(&cli).unwrap_err(),
            CliError::ZeroConcurrency
        );
    }

    #[test]
    fn test_run_config_rejects_zero_timeout() {
        let cli = Cli::parse_from(["appsearch", "--timeout", "0", "xcode"]);
        assert_eq!(RunConfig::from_cli(&cli).unwrap_err(), CliError::ZeroTimeout);
    }
}
