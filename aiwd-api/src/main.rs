//! aiwd-api - AI writing detection service
//!
//! Scores submitted text for AI-likelihood and serves the auxiliary text
//! tools (grammar, plagiarism, highlighting, writing assistant) plus the
//! authenticated admin surface for weight configurations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aiwd_api::config::resolve_openai_api_key;
use aiwd_api::sampler::{GenerativeSampler, OfflineSampler, OpenAiSampler};
use aiwd_api::scoring::{
    OrchestratorSettings, ScoreProviders, ScoringOrchestrator, SqliteResultStore,
    SqliteWeightStore,
};
use aiwd_api::services::GrammarChecker;
use aiwd_api::{build_router, AppState};
use aiwd_common::api::auth::load_shared_secret;
use aiwd_common::config::{
    load_toml_config, resolve_config_path, resolve_database_path, TomlConfig,
};
use aiwd_common::db::{init_database_pool, weight_configs};

/// Command-line arguments for aiwd-api
#[derive(Parser, Debug)]
#[command(name = "aiwd-api")]
#[command(about = "AI writing detection service")]
#[command(version)]
struct Cli {
    /// Path to TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to SQLite database file
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "AIWD_PORT")]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print the admin shared secret, creating one if missing
    ShowSecret,
    /// Insert the preset weight configurations that do not exist yet
    InitDefaults,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());
    let toml_config =
        load_toml_config(config_path.as_deref()).context("Failed to load configuration")?;

    // RUST_LOG wins over the config file
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting aiwd-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("Config file: none (compiled defaults)"),
    }

    let db_path = resolve_database_path(cli.database.as_deref(), &toml_config);
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    info!("Database: {}", db_path.display());

    let db = init_database_pool(&db_path)
        .await
        .context("Failed to open database")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(db, toml_config, cli.port).await,
        Command::ShowSecret => {
            let secret = load_shared_secret(&db).await?;
            println!("{}", secret);
            Ok(())
        }
        Command::InitDefaults => {
            let created = weight_configs::seed_presets(&db).await?;
            if created.is_empty() {
                println!("All preset configurations already exist");
            }
            for config in created {
                println!(
                    "Created '{}' (default: {}, weight sum {:.2})",
                    config.text_type,
                    config.is_default,
                    config.weights.sum()
                );
            }
            Ok(())
        }
    }
}

async fn serve(db: SqlitePool, config: TomlConfig, port_override: Option<u16>) -> Result<()> {
    let sampler: Arc<dyn GenerativeSampler> = match resolve_openai_api_key(&db, &config).await? {
        Some(key) => Arc::new(
            OpenAiSampler::new(key, &config.openai)
                .context("Failed to build OpenAI client")?,
        ),
        None => {
            warn!("No OpenAI API key configured; using offline sample generator");
            Arc::new(OfflineSampler::new())
        }
    };
    info!("Generative sampler: {}", sampler.name());

    let shared_secret = if config.admin.auth_enabled {
        let secret = load_shared_secret(&db).await?;
        info!("✓ Loaded shared secret for admin authentication");
        secret
    } else {
        warn!("Admin authentication disabled by configuration");
        0
    };

    let grammar = GrammarChecker::from_config(&config.grammar)
        .context("Failed to build grammar checker")?;
    info!("Grammar backend: {}", grammar.backend_name());

    let settings = OrchestratorSettings::from(&config.analysis);
    info!(
        default_text_type = %settings.default_text_type,
        sample_count = settings.sample_count,
        provider_timeout_ms = settings.provider_timeout.as_millis() as u64,
        simulated_latency = config.analysis.simulated_latency,
        "Scoring pipeline configured"
    );

    let orchestrator = ScoringOrchestrator::new(
        ScoreProviders::simulated(config.analysis.simulated_latency),
        sampler,
        Arc::new(SqliteWeightStore::new(db.clone())),
        Arc::new(SqliteResultStore::new(db.clone())),
        settings,
    );

    let state = AppState::new(db, Arc::new(orchestrator), shared_secret)
        .with_grammar_checker(grammar)
        .with_auth_max_age_ms(config.admin.auth_max_age_ms)
        .with_plagiarism_corpus_limit(config.analysis.plagiarism_corpus_limit);

    let origin: HeaderValue = config
        .server
        .frontend_url
        .parse()
        .with_context(|| format!("Invalid frontend_url: {}", config.server.frontend_url))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let app = build_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let port = port_override.unwrap_or(config.server.port);
    let addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
