//! Capitol Call server binary.
//!
//! Starts the voice webhook server with structured logging, database
//! initialization, and graceful shutdown on SIGTERM/SIGINT.

use capitolcall_congress::{CongressClient, CongressConfig};
use capitolcall_flow::{store, Engine};
use capitolcall_server::{load_config, AppState, SqliteMailbox};
use capitolcall_twiml::{AudioLibrary, SpeechRenderer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("CAPITOLCALL_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    let config = load_config(selected_config_path)
        .expect("failed to load configuration, the server cannot start without valid config");

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    if config.voice.validate_signatures && config.voice.auth_token.is_empty() {
        tracing::warn!(
            "signature validation is enabled but voice.auth_token is empty; \
             all webhooks will be rejected"
        );
    }

    let pool = capitolcall_db::create_pool(
        &config.database.path,
        capitolcall_db::DbRuntimeSettings {
            busy_timeout_ms: config.database.busy_timeout_ms,
            pool_max_size: config.database.pool_max_size,
        },
    )
    .expect("failed to create database pool, check database.path in config");

    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        let applied =
            capitolcall_db::run_migrations(&conn).expect("failed to run database migrations");
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }
    }

    let translations =
        store::load_translations(&pool).expect("failed to load prompt translations");
    if !translations.is_empty() {
        tracing::info!(count = translations.len(), "loaded prompt translations");
    }

    let mut renderer = SpeechRenderer::new(
        config.voice.default_language.clone(),
        config.voice.tts_voice.clone(),
    )
    .with_translations(translations);

    if let Some(manifest_path) = &config.voice.audio_manifest {
        let manifest = std::fs::read_to_string(manifest_path)
            .expect("failed to read audio manifest, check voice.audio_manifest in config");
        let audio = AudioLibrary::from_manifest_str(&manifest)
            .expect("failed to parse audio manifest");
        renderer = renderer.with_audio(audio);
        tracing::info!(path = %manifest_path, "loaded pre-rendered audio manifest");
    }

    let directory = CongressClient::new(
        CongressConfig {
            congress_base: config.congress.congress_base.clone(),
            congress_api_key: config.congress.congress_api_key.clone(),
            influence_base: config.congress.influence_base.clone(),
            influence_api_key: config.congress.influence_api_key.clone(),
            elections_base: config.congress.elections_base.clone(),
            elections_api_key: config.congress.elections_api_key.clone(),
            subscriptions_base: config.congress.subscriptions_base.clone(),
            zip_cache_hours: config.congress.zip_cache_hours,
        },
        pool.clone(),
    )
    .expect("failed to build upstream HTTP client");

    let engine = Engine::new(
        Arc::new(directory),
        Arc::new(SqliteMailbox::new(pool.clone())),
        renderer,
        config.voice.languages.clone(),
        config.voice.input_timeout,
    );

    let state = Arc::new(AppState {
        pool,
        engine,
        public_url: config.voice.public_url.trim_end_matches('/').to_string(),
        auth_token: config.voice.auth_token.clone(),
        validate_signatures: config.voice.validate_signatures,
    });

    let app = capitolcall_server::app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting capitolcall server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address, is another process using this port?");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("capitolcall server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
