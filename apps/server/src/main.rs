use anyhow::Context;
use clap::{Parser, Subcommand};
use huddle_auth::AuthError;
use huddle_config::load as load_config;
use huddle_database::UserRepository;
use huddle_gateway::{create_router, GatewayState};
use huddle_runtime::{telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "huddle-server")]
#[command(about = "Huddle realtime backend (serves by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Commands {
    /// Start the HTTP and WebSocket server
    Serve,
    /// Mint a session token for a user, creating the user if needed
    IssueToken {
        #[arg(long)]
        username: String,
        /// Display color for a newly created user
        #[arg(long)]
        color: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::IssueToken { username, color } => issue_token(&username, color.as_deref()).await,
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Huddle backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let app = create_router(GatewayState::new(services.hub, services.channels));

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(huddle_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn issue_token(username: &str, color: Option<&str>) -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let user_id = match services.authenticator.find_user_by_username(username).await {
        Ok(user) => user.id,
        Err(AuthError::UserNotFound) => {
            let identity = UserRepository::new(services.db_pool.clone())
                .create(username, color)
                .await
                .with_context(|| format!("failed to create user {username}"))?;
            info!(user_id = identity.user_id, username, "created user");
            identity.user_id
        }
        Err(error) => return Err(error).context("failed to look up user"),
    };

    let session = services
        .authenticator
        .issue_session(user_id)
        .await
        .context("failed to issue session")?;

    info!(user_id, expires_at = %session.expires_at, "issued session token");
    println!("{}", session.token);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["huddle-server"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn issue_token_requires_a_username() {
        assert!(Cli::try_parse_from(["huddle-server", "issue-token"]).is_err());

        let cli = Cli::try_parse_from([
            "huddle-server",
            "issue-token",
            "--username",
            "ana",
            "--color",
            "#e11d48",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::IssueToken {
                username: "ana".into(),
                color: Some("#e11d48".into()),
            })
        );
    }
}
