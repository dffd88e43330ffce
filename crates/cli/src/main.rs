//! Leafspring CRM CLI - data file and assistant tools.
//!
//! # Usage
//!
//! ```bash
//! # Write a fresh data file (default catalog + admin user)
//! crm-cli seed --force
//!
//! # Create a user
//! crm-cli user create -u maria -n "Maria Lopes" -r staff -p 'long-password'
//!
//! # Ask the assistant
//! crm-cli ask "Which countries bring the most pending orders?"
//! crm-cli research "Gulf Cargo LLC, Dubai"
//! crm-cli analyze c1712345678901
//! ```
//!
//! # Environment Variables
//!
//! Reads the same variables as the server (`CRM_DATA_FILE`,
//! `CRM_ADMIN_PASSWORD`, `LLM_*`), plus `LLM_API_KEY` for the assistant
//! commands.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use leafspring_crm_core::CustomerId;
use leafspring_crm_server::config::CrmConfig;

mod commands;

use commands::CliError;
use commands::assistant::Question;

#[derive(Parser)]
#[command(name = "crm-cli")]
#[command(author, version, about = "Leafspring CRM CLI tools")]
struct Cli {
    /// Data file to operate on (defaults to `CRM_DATA_FILE`)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a fresh data file with default products and the admin user
    Seed {
        /// Overwrite an existing data file
        #[arg(long)]
        force: bool,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Ask a question about the CRM data
    Ask {
        question: String,
        #[command(flatten)]
        key: ApiKey,
    },
    /// Research a company, using web search when available
    Research {
        query: String,
        #[command(flatten)]
        key: ApiKey,
    },
    /// Analyze one customer
    Analyze {
        customer_id: String,
        #[command(flatten)]
        key: ApiKey,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`admin`, `staff`)
        #[arg(short, long, default_value = "staff")]
        role: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[derive(clap::Args)]
struct ApiKey {
    /// Chat-completion API key (defaults to `LLM_API_KEY`)
    #[arg(long)]
    api_key: Option<String>,
}

impl ApiKey {
    fn into_secret(self) -> SecretString {
        let key = self
            .api_key
            .or_else(|| std::env::var("LLM_API_KEY").ok())
            .unwrap_or_default();
        SecretString::from(key)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = CrmConfig::from_env()?;
    let data_file = cli
        .data_file
        .unwrap_or_else(|| config.data_file.clone());

    match cli.command {
        Commands::Seed { force } => commands::seed::run(&config, &data_file, force).await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                name,
                role,
                password,
            } => {
                commands::user::create_user(
                    &config,
                    &data_file,
                    &username,
                    &name,
                    &role,
                    SecretString::from(password),
                )
                .await?;
            }
        },
        Commands::Ask { question, key } => {
            ask(&config, &data_file, Question::General(question), key).await?;
        }
        Commands::Research { query, key } => {
            ask(&config, &data_file, Question::CompanyResearch(query), key).await?;
        }
        Commands::Analyze { customer_id, key } => {
            let question = Question::CustomerAnalysis(CustomerId::new(customer_id));
            ask(&config, &data_file, question, key).await?;
        }
    }
    Ok(())
}

/// Run an assistant flow and print the answer to stdout.
#[allow(clippy::print_stdout)]
async fn ask(
    config: &CrmConfig,
    data_file: &std::path::Path,
    question: Question,
    key: ApiKey,
) -> Result<(), CliError> {
    let answer =
        commands::assistant::answer(config, data_file, question, &key.into_secret()).await?;
    println!("{answer}");
    Ok(())
}
