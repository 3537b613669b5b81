use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::lifecycle::DeletePolicy;

/// Name of the SQLite database inside `state_dir`.
pub const DATABASE_FILE: &str = "platewise.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Directory for persistent state (SQLite database).
    /// Defaults to current working directory.
    pub state_dir: PathBuf,
    /// How review deletes are carried out. Defaults to soft.
    pub delete_policy: DeletePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid number")?;

        let state_dir = env::var("STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let delete_policy = parse_delete_policy(env::var("REVIEW_DELETE_POLICY").ok())
            .context("REVIEW_DELETE_POLICY must be 'soft' or 'hard'")?;

        Ok(Config {
            port,
            state_dir,
            delete_policy,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.state_dir.join(DATABASE_FILE)
    }
}

/// Parse REVIEW_DELETE_POLICY from an optional string value.
///
/// Missing or blank means the default (soft).
pub fn parse_delete_policy(value: Option<String>) -> Result<DeletePolicy> {
    match value.filter(|s| !s.trim().is_empty()) {
        None => Ok(DeletePolicy::default()),
        Some(raw) => raw.parse::<DeletePolicy>().map_err(anyhow::Error::msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delete_policy_default() {
        assert_eq!(parse_delete_policy(None).unwrap(), DeletePolicy::Soft);
        assert_eq!(
            parse_delete_policy(Some("  ".to_string())).unwrap(),
            DeletePolicy::Soft
        );
    }

    #[test]
    fn test_parse_delete_policy_values() {
        assert_eq!(
            parse_delete_policy(Some("hard".to_string())).unwrap(),
            DeletePolicy::Hard
        );
        // Case and surrounding whitespace are ignored
        assert_eq!(
            parse_delete_policy(Some(" Soft\n".to_string())).unwrap(),
            DeletePolicy::Soft
        );
    }

    #[test]
    fn test_parse_delete_policy_rejects_unknown() {
        let err = parse_delete_policy(Some("purge".to_string())).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"unknown delete policy 'purge' (expected 'soft' or 'hard')"
        );
    }

    #[test]
    fn test_database_path() {
        let config = Config {
            port: 3000,
            state_dir: PathBuf::from("/var/lib/platewise"),
            delete_policy: DeletePolicy::Soft,
        };
        assert_eq!(
            config.database_path(),
            PathBuf::from("/var/lib/platewise/platewise.db")
        );
    }
}
