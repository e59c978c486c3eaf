//! # SASbot CLI Module
//!
//! Operator commands.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show tenant and message counters
//! - `init` - Initialize a new database
//! - `import` - Apply a TOML tenant manifest
//! - `onboard` - Create a trial tenant
//! - `tenants` - List tenants
//! - `identify` - Resolve a WhatsApp number to its tenant
//! - `prompt` - Print a tenant's assembled system prompt

mod commands;

use clap::{Parser, Subcommand};
use sasbot_core::SasbotError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// SASbot - tenant configuration server for WhatsApp chatbots
///
/// Stores each business's bot profile, catalog and hours, and assembles the
/// system prompt the workflow engine hands to the language model.
#[derive(Parser, Debug)]
#[command(name = "sasbot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the tenant database
    #[arg(short = 'D', long, global = true, default_value = "sasbot.db")]
    pub database: PathBuf,

    /// Storage backend: "redb" (ACID database) or "memory" (volatile)
    #[arg(short = 'B', long, global = true, default_value = "redb")]
    pub backend: String,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Manifest to apply before serving (useful with the memory backend)
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },

    /// Show tenant and message counters
    Status,

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Apply a TOML tenant manifest
    Import {
        /// Path to the manifest file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Create a trial tenant for a new business
    Onboard {
        /// Company name
        #[arg(short, long)]
        name: String,

        /// Business type (escort, dental, retail, restaurant, other)
        #[arg(short, long)]
        business_type: Option<String>,

        /// Industry template id to seed defaults from
        #[arg(short, long)]
        template: Option<String>,
    },

    /// List tenants
    Tenants,

    /// Resolve a WhatsApp number to its tenant
    Identify {
        /// WhatsApp number in any common format
        #[arg(short, long)]
        number: String,
    },

    /// Print a tenant's assembled system prompt
    Prompt {
        /// Tenant id
        #[arg(short, long)]
        tenant: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), SasbotError> {
    let backend = cli.backend.as_str();
    let json_mode = cli.json_mode;
    let db = cli.database.as_path();

    match cli.command {
        Some(Commands::Server {
            host,
            port,
            manifest,
        }) => cmd_server(db, backend, &host, port, manifest.as_deref()).await,
        Some(Commands::Status) => cmd_status(db, backend, json_mode),
        Some(Commands::Init { force }) => cmd_init(db, backend, force),
        Some(Commands::Import { file }) => cmd_import(db, backend, json_mode, &file),
        Some(Commands::Onboard {
            name,
            business_type,
            template,
        }) => cmd_onboard(db, backend, json_mode, name, business_type, template),
        Some(Commands::Tenants) => cmd_tenants(db, backend, json_mode),
        Some(Commands::Identify { number }) => cmd_identify(db, backend, json_mode, &number),
        Some(Commands::Prompt { tenant }) => cmd_prompt(db, backend, json_mode, &tenant),
        None => cmd_status(db, backend, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sasbot",
            "prompt",
            "--tenant",
            "abc",
            "-B",
            "memory",
            "--json-mode",
        ])
        .expect("parse");
        assert_eq!(cli.backend, "memory");
        assert!(cli.json_mode);
        assert!(matches!(cli.command, Some(Commands::Prompt { tenant }) if tenant == "abc"));
    }
}
