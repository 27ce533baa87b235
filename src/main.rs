use anyhow::Context;
use tasks_api::{app_state::AppState, build_app, settings::Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the process environment and settings.json still apply.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "tasks_api=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── Settings ───────────────────────────────────────────────
    let settings = Settings::load().context("failed to load settings")?;
    tracing::debug!(?settings, "settings loaded");
    let address = settings.socket_address();
    let mount_path = settings.mount_path.clone();

    // ── Shared state + app ─────────────────────────────────────
    let state = AppState::shared(settings).context("failed to build route table")?;
    let app = build_app(state);

    // ── Start ──────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!("Server running on http://{address}{mount_path}");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
