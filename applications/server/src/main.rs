/// Tattmap Server - tattoo artist directory backend
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tattmap_core::types::{GoogleProfile, Role};
use tattmap_server::{
    api,
    config::ServerConfig,
    services::{AuthService, LocalPhotoStorage},
    state::AppState,
};
use tattmap_storage::Database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tattmap-server")]
#[command(about = "Tattmap artist directory server", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "TATTMAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create or update a user and print an access token
    AddUser {
        /// Google account id
        #[arg(long)]
        google_id: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Grant the ADMIN role
        #[arg(long)]
        admin: bool,
    },
    /// List all users
    ListUsers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tattmap_server=info,tattmap_storage=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load_from(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await?,
        Commands::AddUser {
            google_id,
            email,
            name,
            admin,
        } => add_user(config, google_id, email, name, admin).await?,
        Commands::ListUsers => list_users(config).await?,
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;

    tracing::info!("Starting Tattmap Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    // Initialize database
    let db = open_database(&config).await?;
    let db = Arc::new(db);
    tracing::info!("Database connected");

    // Initialize photo storage
    let photo_storage = LocalPhotoStorage::new(
        config.storage.photo_storage_path.clone(),
        config.storage.public_base_url.clone(),
    );
    photo_storage.initialize().await?;
    tracing::info!(
        "Photo storage initialized at {}",
        photo_storage.base_path().display()
    );

    // Initialize auth service
    let auth_service = Arc::new(AuthService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_days,
    ));

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    // Build application state
    let app_state = AppState::new(db, auth_service, Arc::new(photo_storage), Arc::new(config));
    tracing::info!("Search backend: {}", app_state.search.backend_name());

    let app = api::router(app_state);

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn add_user(
    config: ServerConfig,
    google_id: String,
    email: String,
    name: Option<String>,
    admin: bool,
) -> anyhow::Result<()> {
    config.validate()?;
    let db = open_database(&config).await?;

    let role = if admin { Role::Admin } else { Role::User };
    let profile = GoogleProfile {
        google_id,
        email,
        name,
        avatar: None,
    };

    let user = tattmap_storage::users::upsert_google_user(db.pool(), &profile, role).await?;
    let auth_service = AuthService::new(&config.auth.jwt_secret, config.auth.jwt_expiration_days);
    let token = auth_service.create_token(&user)?;

    println!("User {} ({}) role {}", user.id, user.email, user.role);
    println!("Access token: {}", token);

    Ok(())
}

async fn list_users(config: ServerConfig) -> anyhow::Result<()> {
    let db = open_database(&config).await?;
    let users = tattmap_storage::users::get_all(db.pool()).await?;

    println!("Users:");
    for user in users {
        println!(
            "  {} - {} [{}] {}",
            user.id,
            user.email,
            user.role,
            user.name.unwrap_or_default()
        );
    }

    Ok(())
}

async fn open_database(config: &ServerConfig) -> anyhow::Result<Database> {
    if let Some(parent) = sqlite_parent_dir(&config.storage.database_url) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let db = Database::connect(&config.storage.database_url).await?;
    Ok(db)
}

/// Directory holding a file-backed SQLite database, if any
fn sqlite_parent_dir(url: &str) -> Option<PathBuf> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    PathBuf::from(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
}
