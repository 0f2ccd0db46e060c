//! Command-line front end over the portal client.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;

use docportal_client::config::session_file_path;
use docportal_client::{ClientConfig, FileStorage, PortalState};

#[derive(Parser)]
#[command(name = "docportal")]
#[command(about = "Document portal client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        email: String,

        /// Password (prefer the environment variable over the flag)
        #[arg(long, env = "DOCPORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the stored identity
    Whoami,
    /// Fetch and print the dashboard summary
    Dashboard,
    /// Check API health
    Health,
}

#[tokio::main]
async fn main() {
    docportal_observability::init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig::from_env().context("failed to read configuration")?;
    let path = session_file_path().context("could not resolve a session file location")?;
    let state = PortalState::bootstrap(config, Arc::new(FileStorage::new(path)))
        .await
        .context("failed to start portal client")?;

    match cli.command {
        Commands::Login { email, password } => {
            let result = state.auth.login(&email, &password).await;
            if !result.success {
                bail!("login failed: {}", result.error.unwrap_or_default());
            }
            if let Some(session) = state.auth.current_session().await? {
                println!("logged in as {} ({})", session.display_name(), session.role());
            }
        }
        Commands::Logout => {
            state.auth.logout().await?;
            println!("logged out");
        }
        Commands::Whoami => match state.initial_session() {
            Some(session) => {
                let id = session
                    .user_id()
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{} ({}) id={}", session.display_name(), session.role(), id);
            }
            None => println!("not logged in"),
        },
        Commands::Dashboard => dashboard(&state).await?,
        Commands::Health => {
            let health = state.portal.health().await?;
            println!("{} {}", health.status, health.version.unwrap_or_default());
        }
    }

    Ok(())
}

async fn dashboard(state: &PortalState) -> Result<()> {
    let Some(session) = state.initial_session() else {
        bail!("not logged in; run `docportal login <email>` first");
    };

    match state.portal.dashboard().await {
        Ok(summary) => {
            for metric in summary.metrics_for(session.role()) {
                println!("{:<18} {}", metric.label, metric.value);
            }
            Ok(())
        }
        Err(e) if e.is_session_rejected() => {
            bail!("session rejected by the server ({e}); run `docportal logout` and log in again")
        }
        Err(e) => Err(e).context("failed to load dashboard"),
    }
}
