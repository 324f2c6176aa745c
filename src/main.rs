use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tracing_subscriber::EnvFilter;

use glyphgate::config::Config;
use glyphgate::db::{self, AppState};
use glyphgate::dict::DictIndex;
use glyphgate::handlers;
use glyphgate::metrics::Metrics;
use glyphgate::middleware::hash_token;

#[derive(Parser)]
#[command(name = "glyphgate", version, about = "Activation and entitlement server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (the default).
    Serve,
    /// Hash an admin token for use as ADMIN_TOKEN_HASH.
    HashToken {
        /// Token to hash; a random one is generated when omitted.
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::HashToken { token } => {
            print_token_hash(token);
            Ok(())
        }
    }
}

fn print_token_hash(token: Option<String>) {
    let token = token.unwrap_or_else(generate_token);
    println!("token: {token}");
    println!("hash:  {}", hash_token(&token));
}

fn generate_token() -> String {
    use rand::Rng;
    let bytes: [u8; 24] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

async fn serve() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    if config.admin_token_hash.is_none() {
        tracing::warn!(
            "ADMIN_TOKEN_HASH not set; admin endpoints are disabled (run `glyphgate hash-token`)"
        );
    }

    let pool = db::new_pool(&config.database_path, config.pool_size)
        .with_context(|| format!("failed to open database at {}", config.database_path))?;
    {
        let conn = pool.get()?;
        db::init_db(&conn)?;
    }

    let dict = {
        let conn = pool.get()?;
        DictIndex::load(&conn)?
    };
    tracing::info!(entries = dict.len(), "content index built");

    let state = AppState {
        db: pool,
        plans: config.plans.clone(),
        dict: Arc::new(dict),
        metrics: Arc::new(Metrics::new()),
        admin_token_hash: config.admin_token_hash.clone(),
        generate_code_limit: config.generate_code_limit,
        request_timeout: Duration::from_secs(config.request_timeout_secs),
    };

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(50)
            .finish()
            .expect("valid rate limiter configuration"),
    );
    let app = handlers::app(state).layer(GovernorLayer::new(governor_conf));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
