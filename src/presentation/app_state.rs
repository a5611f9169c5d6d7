// Application state for HTTP handlers
use crate::application::climate_history_service::ClimateHistoryService;
use crate::application::energy_history_service::EnergyHistoryService;
use crate::application::live_dashboard_service::LiveDashboardService;
use crate::application::power_draw_service::PowerDrawService;
use crate::application::settings_service::SettingsService;

#[derive(Clone)]
pub struct AppState {
    pub energy_history_service: EnergyHistoryService,
    pub power_draw_service: PowerDrawService,
    pub climate_history_service: ClimateHistoryService,
    pub settings_service: SettingsService,
    pub live_dashboard_service: LiveDashboardService,
}
