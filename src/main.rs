// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use anyhow::Context;
use axum::{
    Router,
    routing::{delete, get},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::climate_history_service::ClimateHistoryService;
use crate::application::energy_history_service::EnergyHistoryService;
use crate::application::home_server_repository::HomeServerRepository;
use crate::application::live_dashboard_service::{LIVENESS_CHECK_INTERVAL, LiveDashboardService};
use crate::application::power_draw_service::PowerDrawService;
use crate::application::push_channel::{PushChannel, PushSubscription};
use crate::application::push_transport::PushTransport;
use crate::application::settings_service::SettingsService;
use crate::domain::dashboard::{ClimateReading, MeterReading};
use crate::infrastructure::config::{PushSettings, TransportKind, load_dashboard_config};
use crate::infrastructure::rest_repository::RestRepository;
use crate::infrastructure::stomp_transport::StompTransport;
use crate::infrastructure::websocket_transport::WebSocketTransport;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    climate, delete_energy_contract, energy_per_day, energy_per_hour, energy_per_month, get_mindergasnl,
    health_check, list_energy_contracts, live_dashboard, power_draw, put_mindergasnl, save_energy_contract,
    stream_live_dashboard,
};

fn push_transport(settings: &PushSettings, endpoint: &str) -> Arc<dyn PushTransport> {
    match settings.transport {
        TransportKind::WebSocket => {
            tracing::info!("Push updates from {}", endpoint);
            Arc::new(WebSocketTransport::new(endpoint, settings))
        }
        TransportKind::Tcp => {
            tracing::info!("Push updates from STOMP broker {}", settings.broker_address);
            Arc::new(StompTransport::new(settings))
        }
    }
}

/// Subscribes the live dashboard to the meter and climate topics.
fn start_push_channels(settings: &PushSettings, live: &LiveDashboardService) -> Vec<PushSubscription> {
    let meter_service = live.clone();
    let meter = PushChannel::new(
        push_transport(settings, &settings.meter_endpoint),
        settings.meter_topic.clone(),
        settings.reconnect_delay(),
    )
    .start(move |reading: Option<MeterReading>| meter_service.on_meter_reading(reading));

    let climate_service = live.clone();
    let climate = PushChannel::new(
        push_transport(settings, &settings.climate_endpoint),
        settings.climate_topic.clone(),
        settings.reconnect_delay(),
    )
    .start(move |reading: Option<ClimateReading>| climate_service.on_climate_reading(reading));

    tracing::info!(
        "Listening for push updates on {} and {}",
        settings.meter_topic,
        settings.climate_topic
    );
    vec![meter, climate]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_dashboard_config().context("Failed to load dashboard configuration")?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn HomeServerRepository> = Arc::new(RestRepository::new(&config.backend)?);

    // Create services (application layer)
    let layouts = &config.layouts;
    let energy_history_service = EnergyHistoryService::new(repository.clone(), layouts.energy);
    let power_draw_service = PowerDrawService::new(repository.clone(), layouts.power_draw);
    let climate_history_service = ClimateHistoryService::new(repository.clone(), layouts.climate);
    let settings_service = SettingsService::new(repository.clone());
    let live_dashboard_service = LiveDashboardService::new(repository);

    if let Err(e) = live_dashboard_service.seed().await {
        tracing::warn!("Starting without current readings: {}", e);
    }
    let _watchdog = live_dashboard_service.start_watchdog(LIVENESS_CHECK_INTERVAL);
    let _push_subscriptions = if config.push.enabled {
        start_push_channels(&config.push, &live_dashboard_service)
    } else {
        tracing::info!("Push updates disabled");
        Vec::new()
    };

    // Create application state
    let state = Arc::new(AppState {
        energy_history_service,
        power_draw_service,
        climate_history_service,
        settings_service,
        live_dashboard_service,
    });

    // Build router (presentation layer)
    // Note: We handle compression manually in our response builders,
    // so we don't use CompressionLayer to avoid double compression
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/charts/energie/uur", get(energy_per_hour))
        .route("/charts/energie/dag", get(energy_per_day))
        .route("/charts/energie/maand", get(energy_per_month))
        .route("/charts/opgenomen-vermogen", get(power_draw))
        .route("/charts/klimaat", get(climate))
        .route("/dashboard", get(live_dashboard))
        .route("/dashboard/live", get(stream_live_dashboard))
        .route("/settings/mindergasnl", get(get_mindergasnl).put(put_mindergasnl))
        .route("/energiecontracten", get(list_energy_contracts).post(save_energy_contract))
        .route("/energiecontracten/:id", delete(delete_energy_contract))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .listen_address
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.listen_address))?;
    tracing::info!("Starting home-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
