//! Command-line interface.
//!
//! Without a subcommand the server starts. Other subcommands:
//! - `hash-password <password>` - Print an Argon2 hash for `auth.admin_password_hash`
//! - `generate-secret` - Print a random value for `auth.jwt_secret`
//! - `config check` - Validate configuration file

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::auth::{generate_secret, hash_password};
use crate::config::Config;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "atelier")]
#[command(author, version, about = "Portfolio site and admin API for an interior design studio", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "ATELIER_CONFIG", default_value = "atelier.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (the default)
    Serve,

    /// Hash an admin password for the configuration file
    HashPassword {
        /// Plain-text password
        password: String,
    },

    /// Generate a random session signing secret
    GenerateSecret,

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

impl Cli {
    /// Whether this invocation should start the server
    pub fn is_serve(&self) -> bool {
        matches!(self.command, None | Some(Commands::Serve))
    }
}

/// Run a CLI command
pub fn run_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::HashPassword { password }) => cmd_hash_password(password),
        Some(Commands::GenerateSecret) => {
            println!("{}", generate_secret());
            Ok(())
        }
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli),
        // Starting the server is handled in main.rs
        Some(Commands::Serve) | None => Ok(()),
    }
}

fn cmd_hash_password(password: &str) -> Result<()> {
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }
    let hash = hash_password(password).map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    println!("{}", hash);
    Ok(())
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("Defaults and ATELIER_* environment variables will be used when starting the server.");
    }

    match Config::load(config_path) {
        Ok(config) => {
            println!("[OK] Configuration is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("Server:");
            println!("  Listen:       {}:{}", config.server.host, config.server.port);
            println!("  Data Dir:     {}", config.server.data_dir.display());
            println!("  Public Dir:   {}", config.server.public_dir.display());
            println!("  Projects:     {}", config.projects_file().display());
            println!();
            println!("Uploads:");
            println!("  Dir:          {}", config.uploads.dir.display());
            println!("  URL Prefix:   {}", config.uploads.url_prefix);
            println!(
                "  Max Size:     {}MB",
                config.uploads.max_bytes / (1024 * 1024)
            );
            println!();
            println!("Security:");
            println!("  Admin User:   {}", config.auth.admin_username);
            println!(
                "  Password:     {}",
                match (config.admin_password_hash(), config.auth.allow_default_password) {
                    (Some(_), _) => "Hash configured",
                    (None, true) => "Bootstrap password (change before deploying!)",
                    (None, false) => "Not configured (login disabled)",
                }
            );
            println!(
                "  JWT Secret:   {}",
                if config.auth.jwt_secret.is_some() {
                    "Configured"
                } else {
                    "Random per process"
                }
            );
            println!(
                "  Proxy Headers: {}",
                if config.server.trust_proxy_headers {
                    "Trusted"
                } else {
                    "Ignored"
                }
            );
            println!(
                "  Rate Limiting: {}",
                if config.rate_limit.enabled {
                    "Enabled"
                } else {
                    "Disabled"
                }
            );
            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration is invalid:");
            println!("  {:#}", e);
            Err(e)
        }
    }
}
