// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express. All failures are
//! collected rather than stopping at the first one.

use crate::diagnostic::ConfigError;
use crate::model::PactumConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Shortest accepted HMAC secret, in bytes.
pub const MIN_TOKEN_SECRET_LEN: usize = 32;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &PactumConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    } else {
        let is_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_hostname = host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        if !is_ip && !is_hostname {
            errors.push(ConfigError::validation(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "server.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.server.log_level
        )));
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "server.request_timeout_secs must be greater than 0",
        ));
    }

    if let Some(secret) = &config.auth.token_secret
        && secret.len() < MIN_TOKEN_SECRET_LEN
    {
        errors.push(ConfigError::validation(format!(
            "auth.token_secret must be at least {MIN_TOKEN_SECRET_LEN} bytes, got {}",
            secret.len()
        )));
    }

    if config.auth.token_ttl_secs == 0 {
        errors.push(ConfigError::validation(
            "auth.token_ttl_secs must be greater than 0",
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.realtime.channel_capacity == 0 {
        errors.push(ConfigError::validation(
            "realtime.channel_capacity must be greater than 0",
        ));
    }

    let currency = &config.payments.currency;
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_lowercase()) {
        errors.push(ConfigError::validation(format!(
            "payments.currency must be a lowercase three-letter code, got `{currency}`"
        )));
    }

    if config.ai.max_tokens == 0 {
        errors.push(ConfigError::validation("ai.max_tokens must be greater than 0"));
    }

    if !config.ai.base_url.starts_with("http://") && !config.ai.base_url.starts_with("https://") {
        errors.push(ConfigError::validation(format!(
            "ai.base_url must be an http(s) URL, got `{}`",
            config.ai.base_url
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
