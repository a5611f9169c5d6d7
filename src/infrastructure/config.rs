use crate::domain::layout::WindowFit;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub backend: BackendSettings,
    #[serde(default)]
    pub push: PushSettings,
    #[serde(default)]
    pub layouts: LayoutSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    /// Base URL of the home server, without the `/api` suffix.
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl BackendSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// How STOMP frames reach the broker.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// One WebSocket per topic, as served by the home server itself.
    #[default]
    WebSocket,
    /// Plain TCP to a broker with a STOMP listener.
    Tcp,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PushSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub transport: TransportKind,
    /// WebSocket endpoint carrying the meter topic.
    #[serde(default = "default_meter_endpoint")]
    pub meter_endpoint: String,
    /// WebSocket endpoint carrying the climate topic.
    #[serde(default = "default_climate_endpoint")]
    pub climate_endpoint: String,
    /// `host:port` of the STOMP broker, for the TCP transport.
    #[serde(default = "default_broker_address")]
    pub broker_address: String,
    #[serde(default = "default_virtual_host")]
    pub virtual_host: String,
    #[serde(default = "default_meter_topic")]
    pub meter_topic: String,
    #[serde(default = "default_climate_topic")]
    pub climate_topic: String,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,
}

impl PushSettings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            transport: TransportKind::default(),
            meter_endpoint: default_meter_endpoint(),
            climate_endpoint: default_climate_endpoint(),
            broker_address: default_broker_address(),
            virtual_host: default_virtual_host(),
            meter_topic: default_meter_topic(),
            climate_topic: default_climate_topic(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            heartbeat_ms: default_heartbeat_ms(),
        }
    }
}

/// Chart height limits per view.
#[derive(Debug, Deserialize, Clone)]
pub struct LayoutSettings {
    #[serde(default = "default_energy_layout")]
    pub energy: WindowFit,
    #[serde(default = "default_power_draw_layout")]
    pub power_draw: WindowFit,
    #[serde(default = "default_climate_layout")]
    pub climate: WindowFit,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            energy: default_energy_layout(),
            power_draw: default_power_draw_layout(),
            climate: default_climate_layout(),
        }
    }
}

fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_meter_endpoint() -> String {
    "ws://localhost:8081/ws/meterstand/websocket".to_string()
}

fn default_climate_endpoint() -> String {
    "ws://localhost:8081/ws/klimaat/websocket".to_string()
}

fn default_broker_address() -> String {
    "localhost:61613".to_string()
}

fn default_virtual_host() -> String {
    "/".to_string()
}

fn default_meter_topic() -> String {
    "/topic/meterstand".to_string()
}

fn default_climate_topic() -> String {
    "/topic/klimaat".to_string()
}

fn default_reconnect_delay_secs() -> u64 {
    10
}

fn default_heartbeat_ms() -> u64 {
    10_000
}

fn default_energy_layout() -> WindowFit {
    WindowFit::new(220, 475, 115)
}

fn default_power_draw_layout() -> WindowFit {
    WindowFit::new(220, 500, 10)
}

fn default_climate_layout() -> WindowFit {
    WindowFit::new(220, 475, 140)
}

/// Reads `config/dashboard.toml` (optional) and `DASHBOARD__*` environment
/// variables, e.g. `DASHBOARD__BACKEND__BASE_URL`.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Replaces `{name}` placeholders in a REST path template with the
/// percent-encoded variable values. Unknown placeholders are left as is.
pub fn expand_path(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("{{{}}}", key);
        result = result.replace(&placeholder, &urlencoding::encode(value));
    }
    result
}
