use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::services::resample::DEFAULT_TARGET_POINTS;

const DEFAULT_APP_SCHEMA: &str = "btracker_app";
const DEFAULT_HIVE_SCHEMA: &str = "hive";
const MAX_TARGET_POINTS: u64 = 100_000;

fn setup_config_path() -> Option<PathBuf> {
    env_optional_string("BTRACKER_CONFIG_PATH").map(PathBuf::from)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SetupConfigOverrides {
    #[serde(default)]
    database_url: Option<String>,
    #[serde(default)]
    app_schema: Option<String>,
    #[serde(default)]
    hive_schema: Option<String>,
    #[serde(default)]
    target_points: Option<u64>,
    #[serde(default)]
    db_max_connections: Option<u32>,
    #[serde(default)]
    max_block_span: Option<i64>,
    #[serde(default)]
    max_time_span_days: Option<i64>,
}

fn load_setup_config_overrides() -> Option<SetupConfigOverrides> {
    load_overrides_from(&setup_config_path()?)
}

fn load_overrides_from(path: &Path) -> Option<SetupConfigOverrides> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "setup config not found; using env defaults");
        return None;
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read setup config; using env defaults"
            );
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to parse setup config; using env defaults"
            );
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct BalanceTrackerConfig {
    pub database_url: String,
    /// Schema holding `account_balance_history` and the side ledgers.
    pub app_schema: String,
    /// Schema holding `accounts_view` and `blocks_view`.
    pub hive_schema: String,
    pub target_points: i64,
    pub db_max_connections: u32,
    pub db_acquire_timeout_seconds: u64,
    /// Widest accepted block range; `0` means unlimited.
    pub max_block_span: i64,
    /// Widest accepted time range in days; `0` means unlimited.
    pub max_time_span_days: i64,
}

impl BalanceTrackerConfig {
    pub fn from_env() -> Result<Self> {
        let overrides = load_setup_config_overrides().unwrap_or_default();
        Self::resolve(&overrides)
    }

    fn resolve(overrides: &SetupConfigOverrides) -> Result<Self> {
        let database_url = env_optional_string("BTRACKER_DATABASE_URL")
            .or_else(|| {
                overrides
                    .database_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(|value| value.to_string())
            })
            .context("BTRACKER_DATABASE_URL must be set (or present as database_url in the setup config)")?;
        let database_url = normalize_database_url(database_url);

        let app_schema = env_optional_string("BTRACKER_APP_SCHEMA")
            .or_else(|| overrides.app_schema.clone())
            .unwrap_or_else(|| DEFAULT_APP_SCHEMA.to_string());
        let hive_schema = env_optional_string("BTRACKER_HIVE_SCHEMA")
            .or_else(|| overrides.hive_schema.clone())
            .unwrap_or_else(|| DEFAULT_HIVE_SCHEMA.to_string());
        validate_identifier(&app_schema, "BTRACKER_APP_SCHEMA")?;
        validate_identifier(&hive_schema, "BTRACKER_HIVE_SCHEMA")?;

        let target_points = env_u64("BTRACKER_TARGET_POINTS")
            .or(overrides.target_points)
            .unwrap_or(DEFAULT_TARGET_POINTS as u64)
            .clamp(1, MAX_TARGET_POINTS) as i64;
        let db_max_connections = env_u64("BTRACKER_DB_MAX_CONNECTIONS")
            .map(|value| value.min(u32::MAX as u64) as u32)
            .or(overrides.db_max_connections)
            .unwrap_or(10)
            .clamp(1, 100);
        let db_acquire_timeout_seconds = env_u64("BTRACKER_DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or(8)
            .clamp(1, 300);
        let max_block_span = env_i64("BTRACKER_MAX_BLOCK_SPAN")
            .or(overrides.max_block_span)
            .unwrap_or(0)
            .max(0);
        let max_time_span_days = env_i64("BTRACKER_MAX_TIME_SPAN_DAYS")
            .or(overrides.max_time_span_days)
            .unwrap_or(0)
            .max(0);

        Ok(Self {
            database_url,
            app_schema,
            hive_schema,
            target_points,
            db_max_connections,
            db_acquire_timeout_seconds,
            max_block_span,
            max_time_span_days,
        })
    }
}

fn env_optional_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_optional_string(key).and_then(|value| value.parse::<u64>().ok())
}

fn env_i64(key: &str) -> Option<i64> {
    env_optional_string(key).and_then(|value| value.parse::<i64>().ok())
}

/// Schema names are spliced into SQL text, so only plain identifiers are allowed.
fn validate_identifier(value: &str, label: &str) -> Result<()> {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        anyhow::bail!("{label} must not be empty");
    };
    if !(first.is_ascii_lowercase() || first == '_') {
        anyhow::bail!("{label} must start with a lowercase letter or underscore");
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        anyhow::bail!("{label} may only contain lowercase letters, digits and underscores");
    }
    if value.len() > 63 {
        anyhow::bail!("{label} must be at most 63 characters");
    }
    Ok(())
}

fn normalize_database_url(url: String) -> String {
    if let Some(stripped) = url.strip_prefix("postgresql+psycopg2://") {
        return format!("postgresql://{stripped}");
    }
    if let Some(stripped) = url.strip_prefix("postgresql+psycopg://") {
        return format!("postgresql://{stripped}");
    }
    url
}
