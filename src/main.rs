//! Spectator controller entrypoint wiring the rotation loop, timers, REST, WebSocket and SSE layers.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spectator_controller::{
    config::{Settings, load_custom_commands, load_rotation},
    provider::{StateProvider, bflist::BflistProvider},
    routes,
    services::{
        announcer::{Announcer, SseAnnouncer, WebhookAnnouncer},
        controller::Controller,
        scheduler,
    },
    state::{AppState, Hubs, SharedState, rotation::RotationState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = Settings::from_env();
    let servers = load_rotation(&settings.rotation_config_path);
    let custom_commands = load_custom_commands(&settings.custom_commands_path);
    info!(
        servers = servers.len(),
        custom_commands = custom_commands.len(),
        "configuration loaded"
    );

    let provider: Arc<dyn StateProvider> = Arc::new(
        BflistProvider::new(&settings.provider_base_url, settings.request_timeout)
            .context("building bflist client")?,
    );

    let hubs = Hubs::new();
    let mut announcers: Vec<Arc<dyn Announcer>> = vec![Arc::new(SseAnnouncer::new(hubs.sse.clone()))];
    if let Some(url) = settings.announce_webhook_url.as_deref() {
        match WebhookAnnouncer::new(url, settings.request_timeout) {
            Ok(webhook) => announcers.push(Arc::new(webhook)),
            Err(err) => warn!(error = %err, "announcement webhook disabled"),
        }
    }

    let rotation = RotationState::new(servers, settings.rotation.clone());
    let has_rotation = !rotation.is_empty();
    let (mut controller, handle) = Controller::new(
        rotation,
        provider,
        announcers,
        hubs.spectators.clone(),
        settings.rotation_config_path.clone(),
    );
    controller.prime().await;
    tokio::spawn(controller.run());

    scheduler::spawn_refresh_timer(handle.clone());
    if has_rotation {
        scheduler::spawn_score_timer(handle.clone(), settings.rotation.score_interval_minutes);
    }

    let port = settings.port;
    let app_state = AppState::new(settings, handle, hubs, custom_commands);
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
}
