use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drafter::{api, config::AppConfig, db::Database, mcp, state::AppState};

#[derive(Parser)]
#[command(name = "drft")]
#[command(about = "Conversational report drafting with structured outlines and semantic history")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Port for the HTTP API; overrides the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Start MCP server via stdio
    Mcp,
    /// Embed every stored report that has no search vector yet
    Reindex,
}

/// Initialize tracing with output to stderr (for MCP mode) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "drafter=debug,tower_http=debug".into()),
    );

    if use_stderr {
        // MCP mode: stdout is the protocol channel
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn open_database(config: &AppConfig) -> anyhow::Result<Database> {
    let db = match &config.database_path {
        Some(path) => Database::open(path.clone())?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let db = open_database(&config)?;
    let state = AppState::from_config(db, &config);

    if state.retriever.is_available() {
        let retriever = state.retriever.clone();
        tokio::spawn(async move {
            if let Err(e) = retriever.sync_reports().await {
                tracing::warn!(error = %e, "Startup reindex failed");
            }
        });
    }

    let app = api::create_router_with_config(state, api::SecurityConfig::from_env());
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Drafter server listening on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = matches!(cli.command, Some(Commands::Mcp));
    init_tracing(use_stderr);

    let mut config = AppConfig::load()?;

    match cli.command {
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await?;
        }
        Some(Commands::Mcp) => {
            let db = open_database(&config)?;
            mcp::run_stdio_server(AppState::from_config(db, &config)).await?;
        }
        Some(Commands::Reindex) => {
            let db = open_database(&config)?;
            let state = AppState::from_config(db, &config);
            if !state.retriever.is_available() {
                anyhow::bail!("Embeddings are disabled; enable embeddings_enabled to reindex");
            }
            let indexed = state.retriever.sync_reports().await?;
            println!("Indexed {} report(s)", indexed);
        }
        None => serve(config).await?,
    }

    Ok(())
}
