use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scm_gitlab::GitlabScm;
use scm_gitlab_cli::commands::{self, parse_key_val};
use scm_gitlab_cli::errors::Error;
use secrecy::SecretString;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// scm-gitlab CLI: run the GitLab SCM adapter against files on disk
#[derive(Parser)]
#[command(name = "scm-gitlab")]
#[command(about = "Classify GitLab webhooks and build checkout commands", long_about = None)]
struct Cli {
    /// Adapter configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized event for a webhook delivery, or null if it is ignored
    ParseHook {
        /// JSON payload of the delivery
        #[arg(short, long)]
        payload: PathBuf,

        /// Delivery header, e.g. "X-Gitlab-Event=Push Hook"
        #[arg(long = "header", value_parser = parse_key_val)]
        headers: Vec<(String, String)>,
    },

    /// Print whether the adapter recognizes a webhook delivery
    CanHandle {
        /// JSON payload of the delivery
        #[arg(short, long)]
        payload: PathBuf,

        /// Delivery header, e.g. "X-Gitlab-Event=Push Hook"
        #[arg(long = "header", value_parser = parse_key_val)]
        headers: Vec<(String, String)>,
    },

    /// Print the checkout command for a checkout plan
    Checkout {
        /// JSON checkout plan
        #[arg(long)]
        plan: PathBuf,
    },

    /// Resolve a checkout URL to its scm uri
    ParseUrl {
        /// Checkout URL, e.g. https://gitlab.com/group/project.git#main
        url: String,

        /// GitLab access token
        #[arg(long, env = "SCM_GITLAB_TOKEN", hide_env_values = true)]
        token: String,
    },
}

async fn run(cli: Cli) -> Result<String, Error> {
    let config = commands::load_config(cli.config.as_deref())?;
    let scm = GitlabScm::new(config)?;

    match cli.command {
        Commands::ParseHook { payload, headers } => {
            commands::parse_hook(&scm, &payload, &commands::build_headers(&headers)?)
        }
        Commands::CanHandle { payload, headers } => {
            commands::can_handle(&scm, &payload, &commands::build_headers(&headers)?)
        }
        Commands::Checkout { plan } => commands::checkout(&scm, &plan),
        Commands::ParseUrl { url, token } => {
            commands::parse_url(&scm, &url, &SecretString::from(token)).await
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("SCM_GITLAB_LOG"))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Error: {e}");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
