//! `avatar-server`: serves the voice list to the kiosk page.
//!
//! Usage: `avatar-server [CONFIG_PATH]`. Without an argument the path comes
//! from `AVATAR_CONFIG_PATH`, then `config.toml`.

use avatar_server::config::{self, LoggingConfig};
use avatar_server::{app, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn config_path() -> (String, &'static str) {
    let from_arg = std::env::args().nth(1).filter(|p| !p.trim().is_empty());
    if let Some(path) = from_arg {
        return (path, "argument");
    }
    match std::env::var("AVATAR_CONFIG_PATH") {
        Ok(path) if !path.trim().is_empty() => (path, "environment"),
        _ => ("config.toml".to_string(), "default"),
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|e| {
        eprintln!("invalid log level {:?} ({e}), using info", logging.level);
        EnvFilter::new("info")
    });
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() {
    let (path, source) = config_path();
    let config = config::load_config(Some(&path))
        .unwrap_or_else(|e| panic!("cannot start without a valid config ({path}): {e}"));
    init_tracing(&config.logging);
    tracing::info!(%path, source, "configuration loaded");

    let state = AppState::new(config.liveavatar.clone())
        .unwrap_or_else(|e| panic!("invalid [liveavatar] section: {e}"));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("cannot bind {addr}: {e}"));
    tracing::info!(%addr, "avatar kiosk server listening");

    if let Err(e) = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server stopped with an error");
        std::process::exit(1);
    }
    tracing::info!("avatar kiosk server shut down");
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::info!("SIGINT received, shutting down"),
                _ = term.recv() => tracing::info!("SIGTERM received, shutting down"),
            },
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM, waiting for SIGINT only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Ctrl+C received, shutting down");
    }
}
