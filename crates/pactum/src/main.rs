// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pactum - escrow-contract marketplace backend.
//!
//! This is the binary entry point.

mod serve;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use pactum_config::PactumConfig;
use pactum_core::{Identity, PactumError, Role};
use pactum_gateway::TokenSigner;

/// Pactum - escrow-contract marketplace backend.
#[derive(Parser, Debug)]
#[command(name = "pactum", version, about, long_about = None)]
struct Cli {
    /// Config file to load instead of the standard search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP and WebSocket server.
    Serve,
    /// Issue a signed bearer token.
    Token {
        /// Email identity the token is issued for.
        email: String,
        /// One of user, agent, admin.
        #[arg(long, default_value = "user")]
        role: Role,
        /// Lifetime override in seconds.
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
    /// Load and validate configuration, then exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => pactum_config::load_and_validate_path(path),
        None => pactum_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            pactum_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Token {
            email,
            role,
            ttl_secs,
        } => issue_token(&config, &email, role, ttl_secs).map(|token| println!("{token}")),
        Commands::CheckConfig => {
            check_config(&config);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pactum: {e}");
            ExitCode::FAILURE
        }
    }
}

fn issue_token(
    config: &PactumConfig,
    email: &str,
    role: Role,
    ttl_secs: Option<u64>,
) -> Result<String, PactumError> {
    let secret = config
        .auth
        .token_secret
        .as_deref()
        .ok_or_else(|| PactumError::Config("auth.token_secret is not set".to_string()))?;
    let identity = Identity::new(email, role);
    if identity.email.is_empty() {
        return Err(PactumError::InvalidInput("email is required".to_string()));
    }
    TokenSigner::new(secret, ttl_secs.unwrap_or(config.auth.token_ttl_secs))?.issue(&identity)
}

fn check_config(config: &PactumConfig) {
    println!("pactum: configuration is valid");
    println!(
        "  server: {}:{} (log level {})",
        config.server.host, config.server.port, config.server.log_level
    );
    println!("  storage: {}", config.storage.database_path);
    println!(
        "  payments: {}",
        if config.payments.sandbox { "sandbox" } else { "not configured" }
    );
    println!(
        "  ai: {}",
        if config.ai.api_key.is_some() { config.ai.model.as_str() } else { "disabled" }
    );
    if config.auth.token_secret.is_none() {
        eprintln!("pactum: warning: auth.token_secret is not set; `serve` and `token` will refuse to run");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn token_command_parses_role() {
        let cli = Cli::try_parse_from(["pactum", "token", "Amy@X.io", "--role", "agent"]).unwrap();
        match cli.command {
            Commands::Token { email, role, .. } => {
                assert_eq!(email, "Amy@X.io");
                assert_eq!(role, Role::Agent);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["pactum", "token", "a@x.io", "--role", "root"]).is_err());
    }

    #[test]
    fn issued_token_verifies() {
        let mut config = PactumConfig::default();
        assert!(matches!(
            issue_token(&config, "a@x.io", Role::User, None),
            Err(PactumError::Config(_))
        ));

        config.auth.token_secret = Some("cli-secret".into());
        let token = issue_token(&config, "Amy@X.io", Role::Agent, Some(60)).unwrap();
        let identity = TokenSigner::new("cli-secret", 60).unwrap().verify(&token).unwrap();
        assert_eq!(identity, Identity::agent("amy@x.io"));
    }

    #[test]
    fn default_config_loads() {
        let config = pactum_config::load_and_validate_str("").expect("defaults are valid");
        assert_eq!(config.server.port, PactumConfig::default().server.port);
    }

    #[test]
    fn config_file_feeds_token_issuing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pactum.toml");
        std::fs::write(
            &path,
            "[auth]\ntoken_secret = \"0123456789abcdef0123456789abcdef\"\ntoken_ttl_secs = 120\n",
        )
        .unwrap();

        let config = pactum_config::load_and_validate_path(&path).unwrap();
        check_config(&config);
        let token = issue_token(&config, "bob@x.io", Role::User, None).unwrap();
        let signer = TokenSigner::new("0123456789abcdef0123456789abcdef", 120).unwrap();
        assert_eq!(signer.verify(&token).unwrap(), Identity::user("bob@x.io"));

        std::fs::write(&path, "[auth]\ntoken_secret = \"short\"\n").unwrap();
        assert!(pactum_config::load_and_validate_path(&path).is_err());
    }
}
