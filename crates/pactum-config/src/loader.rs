// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports `./pactum.toml` > `~/.config/pactum/pactum.toml` > `/etc/pactum/pactum.toml`
//! with environment variable overrides via the `PACTUM_` prefix.

#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PactumConfig;

/// Top-level sections, used to map `PACTUM_<SECTION>_<KEY>` onto `section.key`.
const SECTIONS: [&str; 7] = [
    "server",
    "auth",
    "storage",
    "realtime",
    "payments",
    "ai",
    "notifications",
];

/// Config files in merge order (later overrides earlier).
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/pactum/pactum.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("pactum/pactum.toml"));
    }
    paths.push(PathBuf::from("pactum.toml"));
    paths
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/pactum/pactum.toml`
/// 3. `~/.config/pactum/pactum.toml`
/// 4. `./pactum.toml`
/// 5. `PACTUM_*` environment variables
pub fn load_config() -> Result<PactumConfig, figment::Error> {
    build_figment().extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    let figment = config_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(PactumConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        );
    figment.merge(env_provider())
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<PactumConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PactumConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PactumConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PactumConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment provider mapping `PACTUM_SERVER_LOG_LEVEL` to `server.log_level`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that contain underscores stay intact.
fn env_provider() -> Env {
    Env::prefixed("PACTUM_").map(|key| {
        let key_str = key.as_str();
        SECTIONS
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or_else(|| key_str.to_string())
            .into()
    })
}
