// Application layer - Use cases, series pipeline and the ports to the outside world
pub mod chart_builder;
pub mod climate_history_service;
pub mod energy_history_service;
pub mod error;
pub mod gap_filler;
pub mod home_server_repository;
pub mod live_dashboard_service;
pub mod power_draw_service;
pub mod push_channel;
pub mod push_transport;
pub mod reshaper;
pub mod settings_service;
pub mod table_builder;
pub mod task_guard;

#[cfg(test)]
pub mod test_support;
