//! Runtime configuration resolution for aiwd-api
//!
//! Secrets resolve with Database → ENV → TOML priority.

use aiwd_common::config::{is_valid_key, TomlConfig};
use aiwd_common::db::settings;
use aiwd_common::Result;
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

/// Environment variable holding the generative-sample API key
pub const OPENAI_API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Resolve the OpenAI API key from the three configuration tiers
///
/// **Priority:** Database → ENV → TOML. `Ok(None)` when no tier has a usable
/// key; the service then runs with the offline sampler.
pub async fn resolve_openai_api_key(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
) -> Result<Option<String>> {
    let db_key = settings::get_openai_api_key(db)
        .await?
        .filter(|k| is_valid_key(k));
    let env_key = std::env::var(OPENAI_API_KEY_ENV_VAR)
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .openai
        .api_key
        .clone()
        .filter(|k| is_valid_key(k));

    let sources: Vec<&str> = [
        ("database", db_key.is_some()),
        ("environment", env_key.is_some()),
        ("TOML", toml_key.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, present)| present.then_some(name))
    .collect();

    if sources.len() > 1 {
        warn!(
            "OpenAI API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = db_key {
        info!("OpenAI API key loaded from database");
        return Ok(Some(key));
    }

    if let Some(key) = env_key {
        info!("OpenAI API key loaded from environment variable");
        return Ok(Some(key));
    }

    if let Some(key) = toml_key {
        info!("OpenAI API key loaded from TOML config");
        return Ok(Some(key));
    }

    Ok(None)
}
