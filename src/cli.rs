//! Command-line interface parsing for cratever
//!
//! This module handles parsing of CLI arguments using clap, including
//! crate-name validation and derivation of the effective cache TTL from the
//! --max-age and --refresh flags.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The crate name contains characters the registry does not allow
    #[error("Invalid crate name: '{0}'. Names start with a letter and contain only alphanumeric characters, '-' or '_'")]
    InvalidCrateName(String),
}

/// cratever - look up the latest published version of a crate
#[derive(Parser, Debug)]
#[command(name = "cratever")]
#[command(about = "Look up the latest published version of a crate, cached for offline use")]
#[command(version)]
pub struct Cli {
    /// Name of the crate to look up
    pub name: String,

    /// Maximum cache age in minutes before the registry is queried again
    #[arg(long, value_name = "MINUTES", default_value_t = 60)]
    pub max_age: u64,

    /// Query the registry even if a fresh cached copy exists
    #[arg(long)]
    pub refresh: bool,

    /// Seed the cache from a previously written JSON file when no cached
    /// copy exists yet
    #[arg(long, value_name = "FILE")]
    pub seed: Option<PathBuf>,

    /// Remove the cached entry for this crate and exit
    #[arg(long)]
    pub clear_cache: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Effective TTL for the cache entry.
    ///
    /// --refresh forces a zero TTL so the registry is always queried; the
    /// cached copy still serves as the fallback when that query fails.
    pub fn ttl(&self) -> Duration {
        if self.refresh {
            Duration::ZERO
        } else {
            Duration::from_secs(self.max_age * 60)
        }
    }
}

/// Validates a crate name before it is used in a registry URL or file name.
///
/// # Arguments
/// * `name` - The crate name from CLI
///
/// # Returns
/// * `Ok(())` if the name is a plausible crates.io package name
/// * `Err(CliError::InvalidCrateName)` otherwise
pub fn validate_crate_name(name: &str) -> Result<(), CliError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_alphabetic()
                && name.len() <= 64
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(CliError::InvalidCrateName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_simple_names() {
        assert!(validate_crate_name("serde").is_ok());
        assert!(validate_crate_name("serde_json").is_ok());
        assert!(validate_crate_name("tracing-subscriber").is_ok());
        assert!(validate_crate_name("h2").is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        assert!(validate_crate_name("").is_err());
    }

    #[test]
    fn test_validate_rejects_punctuation_and_spaces() {
        assert!(validate_crate_name("bad name").is_err());
        assert!(validate_crate_name("bad/name").is_err());
        assert!(validate_crate_name("bad!").is_err());
        assert!(validate_crate_name("../escape").is_err());
    }

    #[test]
    fn test_validate_rejects_leading_digit_or_dash() {
        assert!(validate_crate_name("1password").is_err());
        assert!(validate_crate_name("-serde").is_err());
    }

    #[test]
    fn test_validate_rejects_overlong_name() {
        let name = "a".repeat(65);
        assert!(validate_crate_name(&name).is_err());
        let name = "a".repeat(64);
        assert!(validate_crate_name(&name).is_ok());
    }

    #[test]
    fn test_ttl_from_max_age() {
        let cli = Cli::parse_from(["cratever", "serde", "--max-age", "30"]);
        assert_eq!(cli.ttl(), Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_ttl_default_is_one_hour() {
        let cli = Cli::parse_from(["cratever", "serde"]);
        assert_eq!(cli.ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_refresh_flag_forces_zero_ttl() {
        let cli = Cli::parse_from(["cratever", "serde", "--refresh", "--max-age", "30"]);
        assert_eq!(cli.ttl(), Duration::ZERO);
    }

    #[test]
    fn test_seed_flag_parses_path() {
        let cli = Cli::parse_from(["cratever", "serde", "--seed", "/tmp/seed.json"]);
        assert_eq!(cli.seed, Some(PathBuf::from("/tmp/seed.json")));
    }

    #[test]
    fn test_flags_default_off() {
        let cli = Cli::parse_from(["cratever", "serde"]);
        assert!(!cli.refresh);
        assert!(!cli.clear_cache);
        assert!(!cli.json);
        assert!(cli.seed.is_none());
    }
}
