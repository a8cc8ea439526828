// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime settings read from the environment.
//!
//! | Variable                    | Meaning                                   |
//! |-----------------------------|-------------------------------------------|
//! | `TALLYBOT_DB`               | SQLite file (default: platform data dir)  |
//! | `LINE_CHANNEL_ACCESS_TOKEN` | Enables posting chat replies to LINE      |
//! | `TALLYBOT_DASHBOARD_URL`    | Link shown in chat replies                |
//! | `TALLYBOT_CRON_SECRET`      | Required by `recurring execute` when set  |

use crate::db;
use anyhow::Result;
use std::path::PathBuf;

pub const DEFAULT_DASHBOARD_URL: &str = "https://line-voice-accounting.onrender.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: Option<PathBuf>,
    pub line_access_token: Option<String>,
    pub dashboard_url: String,
    pub cron_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            line_access_token: None,
            dashboard_url: DEFAULT_DASHBOARD_URL.to_string(),
            cron_secret: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            db_path: get("TALLYBOT_DB").map(PathBuf::from),
            line_access_token: get("LINE_CHANNEL_ACCESS_TOKEN"),
            dashboard_url: get("TALLYBOT_DASHBOARD_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_DASHBOARD_URL.to_string()),
            cron_secret: get("TALLYBOT_CRON_SECRET"),
        }
    }

    /// Explicit `--db` beats `TALLYBOT_DB`, which beats the data dir.
    pub fn resolve_db_path(&self, cli_override: Option<&str>) -> Result<PathBuf> {
        if let Some(p) = cli_override.map(str::trim).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(p));
        }
        match &self.db_path {
            Some(p) => Ok(p.clone()),
            None => db::default_db_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn reads_and_trims_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TALLYBOT_DB", " /tmp/t.sqlite "),
            ("LINE_CHANNEL_ACCESS_TOKEN", "tok"),
            ("TALLYBOT_DASHBOARD_URL", "https://example.org/"),
            ("TALLYBOT_CRON_SECRET", ""),
        ]);
        let cfg = Config::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.db_path, Some(PathBuf::from("/tmp/t.sqlite")));
        assert_eq!(cfg.line_access_token.as_deref(), Some("tok"));
        assert_eq!(cfg.dashboard_url, "https://example.org");
        assert_eq!(cfg.cron_secret, None);
    }

    #[test]
    fn cli_override_wins() {
        let cfg = Config {
            db_path: Some(PathBuf::from("/env.sqlite")),
            ..Config::default()
        };
        assert_eq!(
            cfg.resolve_db_path(Some("/cli.sqlite")).unwrap(),
            PathBuf::from("/cli.sqlite")
        );
        assert_eq!(
            cfg.resolve_db_path(None).unwrap(),
            PathBuf::from("/env.sqlite")
        );
    }
}
