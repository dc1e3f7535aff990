use love_timer::{resolve_data_dir, router, AppState};
use std::{env, net::SocketAddr};
use tokio::fs;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOCK_PORT: u16 = 47567;

fn port_from_env(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Held for the whole process; a second instance fails to bind it.
    let lock_port = port_from_env("APP_LOCK_PORT", DEFAULT_LOCK_PORT);
    let _instance_lock = match std::net::TcpListener::bind(("127.0.0.1", lock_port)) {
        Ok(lock) => lock,
        Err(err) => {
            error!("another instance is already running (lock port {lock_port}): {err}");
            return Err(err.into());
        }
    };

    let data_dir = resolve_data_dir();
    fs::create_dir_all(&data_dir).await?;
    info!("data directory: {}", data_dir.display());

    let state = AppState::load(data_dir).await;
    let app = router(state);

    let port = port_from_env("PORT", DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}
