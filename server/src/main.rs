// Application bootstrap and CLI commands only. Handlers, routes and business
// logic live in the library modules.

pub use corkboard_server::*;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use corkboard_core::{config::AppConfig, db::Database, user::UserStore};
use dotenvy::{Error as DotenvError, dotenv};
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Corkboard server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Run database migrations
    Migrate,
    /// Create a workspace owned by an existing user
    CreateWorkspace(CreateWorkspaceArgs),
}

#[derive(Args, Debug)]
struct CreateWorkspaceArgs {
    /// Owner user ID to associate with the workspace
    #[arg(
        long = "owner-id",
        value_name = "ID",
        required_unless_present = "owner_email"
    )]
    owner_id: Option<String>,
    /// Owner email (looked up before creation)
    #[arg(
        long = "owner-email",
        value_name = "EMAIL",
        required_unless_present = "owner_id"
    )]
    owner_email: Option<String>,
    /// Display name for the workspace
    #[arg(long, value_name = "NAME")]
    name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_status = load_env_file();
    init_tracing();
    report_env_status(&env_status);

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_serve(config).await,
        Command::Migrate => run_migrate(config).await,
        Command::CreateWorkspace(args) => run_create_workspace(config, args).await,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
}

async fn run_serve(config: AppConfig) -> anyhow::Result<()> {
    info!(
        database_path = %config.database_path,
        database_max_connections = config.database_max_connections,
        "Starting server with database configuration"
    );

    let database = Database::connect(&config).await?;
    let bind_address = config.bind_address;
    let state = build_state(&database, config);

    let app = router::build_router(state);

    let listener = TcpListener::bind(bind_address)
        .await
        .context("failed to bind socket")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read local address")?;

    info!("listening on {actual_addr}");

    if let Err(error) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(?error, "server terminated with error");
    }

    Ok(())
}

async fn run_migrate(config: AppConfig) -> anyhow::Result<()> {
    let _database = Database::connect(&config).await?;
    info!("migrations completed");
    Ok(())
}

async fn run_create_workspace(config: AppConfig, args: CreateWorkspaceArgs) -> anyhow::Result<()> {
    let CreateWorkspaceArgs {
        owner_id,
        owner_email,
        name,
    } = args;

    let trimmed_name = name.trim();
    if trimmed_name.is_empty() {
        bail!("workspace name must not be empty");
    }

    let database = Database::connect(&config).await?;
    let state = build_state(&database, config);
    let owner_id = resolve_owner_id(&state.user_store, owner_id, owner_email).await?;

    let (workspace, _owner_membership) = state
        .workspace_service
        .create(&owner_id, Some(trimmed_name))
        .await
        .map_err(|err| anyhow::anyhow!("failed to create workspace: {err}"))?;

    info!(workspace_id = %workspace.id.as_str(), owner_id = %owner_id, "created workspace");
    println!(
        "Created workspace '{}' ({}) for owner {}",
        workspace.name,
        workspace.id.as_str(),
        owner_id
    );

    Ok(())
}

async fn resolve_owner_id(
    user_store: &UserStore,
    owner_id: Option<String>,
    owner_email: Option<String>,
) -> anyhow::Result<String> {
    if let Some(id) = owner_id {
        let normalized = id.trim().to_owned();
        if normalized.is_empty() {
            bail!("owner-id must not be empty");
        }

        user_store
            .find_by_id(&normalized)
            .await?
            .with_context(|| format!("no user found with id {normalized}"))?;

        return Ok(normalized);
    }

    if let Some(email) = owner_email {
        let normalized = email.trim().to_owned();
        if normalized.is_empty() {
            bail!("owner-email must not be empty");
        }

        let user = user_store
            .find_by_email(&normalized)
            .await?
            .with_context(|| format!("no user found with email {normalized}"))?;

        return Ok(user.id.into_inner());
    }

    bail!("either --owner-id or --owner-email must be provided");
}

enum EnvLoadStatus {
    Loaded(PathBuf),
    NotFound,
    Failed(DotenvError),
}

fn load_env_file() -> EnvLoadStatus {
    match dotenv() {
        Ok(path) => {
            let display_path = make_relative(&path).unwrap_or(path);
            EnvLoadStatus::Loaded(display_path)
        }
        Err(DotenvError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            EnvLoadStatus::NotFound
        }
        Err(err) => EnvLoadStatus::Failed(err),
    }
}

fn report_env_status(status: &EnvLoadStatus) {
    match status {
        EnvLoadStatus::Loaded(path) => {
            info!("Loaded environment variables from {}", path.display());
        }
        EnvLoadStatus::NotFound => {
            info!("No .env file found; using process environment only");
        }
        EnvLoadStatus::Failed(err) => {
            warn!("Failed to load .env file: {err:?}");
        }
    }
}

fn make_relative(path: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    path.strip_prefix(&cwd).map(|p| p.to_path_buf()).ok()
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut int = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

        tokio::select! {
            _ = term.recv() => {},
            _ = int.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
