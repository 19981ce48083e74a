use clap::{Args, Parser, Subcommand};
use clients::linkr::v1::ClientCreated;
use color_eyre::{Result, eyre::Context};
use linkr::{
    api,
    db::Sqlite,
    identity,
    link::Shortener,
    namespace::DefaultNamespace,
};
use tracing::{info, level_filters::LevelFilter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the API and redirects.
    Serve(ServeConfig),

    /// Apply pending database migrations.
    Migrate(DatabaseConfig),

    /// Manage API clients.
    Client {
        #[command(subcommand)]
        command: ClientCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    /// Create an API client and print its credentials.
    ///
    /// This is how the first admin client is created.
    Create(CreateClientConfig),
}

#[derive(Args, Debug)]
struct DatabaseConfig {
    /// Database URL (SQLite)
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[derive(Args, Debug)]
struct ServeConfig {
    #[command(flatten)]
    database: DatabaseConfig,

    /// Base URL that shortened links are rendered under
    #[arg(long, env = "LINKR_BASE_URL")]
    base_url: Url,

    /// Port to listen on
    #[arg(long, env = "APP_PORT", default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
}

#[derive(Args, Debug)]
struct CreateClientConfig {
    #[command(flatten)]
    database: DatabaseConfig,

    /// Role of the new client; defaults to write-only
    #[arg(long)]
    role: Option<String>,

    /// Label for the owner of the client
    #[arg(long)]
    username: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the environment may be set directly.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(
            tracing_tree::HierarchicalLayer::default()
                .with_indent_lines(true)
                .with_indent_amount(2)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_verbose_exit(false)
                .with_verbose_entry(false)
                .with_deferred_spans(true)
                .with_bracketed_fields(true)
                .with_span_retrace(true)
                .with_timer(tracing_tree::time::Uptime::default())
                .with_targets(false),
        )
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    match cli.command {
        Command::Serve(config) => serve(config).await,
        Command::Migrate(config) => migrate(config).await,
        Command::Client {
            command: ClientCommand::Create(config),
        } => create_client(config).await,
    }
}

async fn serve(config: ServeConfig) -> Result<()> {
    let db = Sqlite::connect(&config.database.database_url).await?;
    db.validate_migrations()
        .await
        .context("validate database schema")?;
    let default_namespace = db
        .ensure_default_namespace()
        .await
        .context("set up default namespace")?;

    let app = api::router(
        db,
        DefaultNamespace(default_namespace),
        Shortener::new(config.base_url.as_str()),
    )?;

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(addr = %listener.local_addr()?, base_url = %config.base_url, "server.listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn migrate(config: DatabaseConfig) -> Result<()> {
    let db = Sqlite::connect(&config.database_url).await?;
    db.migrate().await?;
    info!("migrate.success");
    Ok(())
}

async fn create_client(config: CreateClientConfig) -> Result<()> {
    let db = Sqlite::connect(&config.database.database_url).await?;
    db.validate_migrations()
        .await
        .context("validate database schema")?;

    let client = identity::create_client(
        &db,
        config.role.as_deref(),
        config.username.as_deref(),
    )
    .await?;

    let created = ClientCreated::builder()
        .client_id(client.id.as_str())
        .client_signing_key(client.signing_key.expose())
        .role(client.role)
        .build();
    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}
