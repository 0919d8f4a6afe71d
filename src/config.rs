// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_RECONCILE_TIMEOUT: Duration = Duration::from_secs(300);

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace holding the credential and token secrets of cluster-scoped Keycloaks
    pub operator_namespace: String,
    /// Requeue interval after a successful reconciliation, `None` waits for the next change
    pub success_reconcile_timeout: Option<Duration>,
    /// Upper bound for a single reconciliation
    pub reconcile_timeout: Duration,
    /// Whether dependents get a controller owner reference to their parent
    pub owner_references: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let operator_namespace = lookup("OPERATOR_NAMESPACE")
            .context("OPERATOR_NAMESPACE environment variable not set")?
            .trim()
            .to_string();
        if operator_namespace.is_empty() {
            bail!("OPERATOR_NAMESPACE environment variable is empty");
        }

        let success_reconcile_timeout = match lookup("SUCCESS_RECONCILE_TIMEOUT") {
            Some(val) => {
                let d = humantime::parse_duration(val.trim())
                    .with_context(|| format!("wrong reconcile timeout duration format: {}", val))?;
                (!d.is_zero()).then_some(d)
            }
            None => None,
        };

        let reconcile_timeout = match lookup("RECONCILE_TIMEOUT") {
            Some(val) => humantime::parse_duration(val.trim())
                .with_context(|| format!("wrong RECONCILE_TIMEOUT duration format: {}", val))?,
            None => DEFAULT_RECONCILE_TIMEOUT,
        };

        let owner_references = lookup("SET_OWNER_REFERENCES")
            .map(|v| v.trim().parse::<bool>())
            .transpose()
            .context("SET_OWNER_REFERENCES must be true or false")?
            .unwrap_or(true);

        Ok(Config {
            operator_namespace,
            success_reconcile_timeout,
            reconcile_timeout,
            owner_references,
        })
    }
}
