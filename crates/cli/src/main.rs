//! Delicias Florencia CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (both schemas)
//! df-cli migrate
//!
//! # Create an admin user
//! df-cli admin create -e marta@deliciasflorencia.cl -n "Marta Rojas" -r super_admin -p '...'
//!
//! # List admin users
//! df-cli admin list
//!
//! # Replace an admin's password
//! df-cli admin set-password -e marta@deliciasflorencia.cl -p '...'
//!
//! # Load distributor listings from YAML
//! df-cli seed socios -f crates/cli/seeds/socios.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `ADMIN_DATABASE_URL` - Preferred over `DATABASE_URL` when set
//! - `DF_ADMIN_PASSWORD` - Password for `admin create`/`set-password` when `-p` is omitted

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "df-cli")]
#[command(author, version, about = "Delicias Florencia CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Load data from files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`, `viewer`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Initial password (at least 12 characters)
        #[arg(short, long, env = "DF_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List admin users
    List,
    /// Replace an admin user's password
    SetPassword {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// New password (at least 12 characters)
        #[arg(short, long, env = "DF_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert approved, public socios from a YAML file
    Socios {
        /// Path to the YAML file
        #[arg(short, long)]
        file: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::admin::create_user(&email, &name, &role, &password).await?;
            }
            AdminAction::List => commands::admin::list_users().await?,
            AdminAction::SetPassword { email, password } => {
                commands::admin::set_password(&email, &password).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Socios { file } => commands::seed::socios(&file).await?,
        },
    }
    Ok(())
}
