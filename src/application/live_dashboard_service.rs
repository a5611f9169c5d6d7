// Live dashboard service - current meter and climate readings fed by the push channels
use crate::application::error::DashboardError;
use crate::application::home_server_repository::HomeServerRepository;
use crate::application::task_guard::TaskGuard;
use crate::domain::dashboard::{ClimateReading, LiveDashboard, MeterReading, MeterUpdate};
use chrono::{DateTime, Local, NaiveDate};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;

pub const LIVENESS_CHECK_INTERVAL: Duration = Duration::from_secs(10);

const SEED_FAILED: &str = "Actuele meterstanden konden niet worden opgehaald";
const OLDEST_FAILED: &str = "Oudste meterstand van vandaag kon niet worden opgehaald";

#[derive(Clone)]
pub struct LiveDashboardService {
    repository: Arc<dyn HomeServerRepository>,
    state: Arc<watch::Sender<LiveDashboard>>,
    fetching_oldest: Arc<AtomicBool>,
}

impl LiveDashboardService {
    pub fn new(repository: Arc<dyn HomeServerRepository>) -> Self {
        let (state, _) = watch::channel(LiveDashboard::default());
        Self {
            repository,
            state: Arc::new(state),
            fetching_oldest: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn snapshot(&self) -> LiveDashboard {
        self.state.borrow().clone()
    }

    /// Receiver that sees every dashboard change, starting at the current one.
    pub fn subscribe(&self) -> watch::Receiver<LiveDashboard> {
        self.state.subscribe()
    }

    /// Loads the current readings over REST, before the first push message
    /// arrives.
    pub async fn seed(&self) -> Result<(), DashboardError> {
        let (latest, oldest, climate) = futures::try_join!(
            self.repository.latest_meter_reading(),
            self.repository.oldest_meter_reading_of_today(),
            self.repository.latest_climate_reading(),
        )
        .map_err(|e| DashboardError::backend(SEED_FAILED, e))?;

        let now = Local::now();
        self.state.send_modify(|dashboard| {
            if let Some(oldest) = &oldest {
                dashboard.set_oldest_reading_of_today(oldest, now.date_naive());
            }
            dashboard.apply_meter_reading(latest.as_ref(), now.timestamp_millis());
            dashboard.apply_climate_reading(climate.as_ref());
        });
        tracing::info!("Live dashboard seeded");
        Ok(())
    }

    pub fn on_meter_reading(&self, reading: Option<MeterReading>) {
        self.apply_meter_reading(reading, Local::now());
    }

    fn apply_meter_reading(&self, reading: Option<MeterReading>, now: DateTime<Local>) {
        let today = now.date_naive();
        let mut fetch_oldest = false;
        self.state.send_modify(|dashboard| {
            match dashboard.apply_meter_reading(reading.as_ref(), now.timestamp_millis()) {
                MeterUpdate::Applied => fetch_oldest = dashboard.needs_oldest_reading(today),
                MeterUpdate::Missing => tracing::debug!("Meter channel reported no reading"),
                MeterUpdate::TooOld => tracing::warn!("Ignoring outdated meter reading"),
            }
        });
        if fetch_oldest {
            self.spawn_oldest_reading_refresh(today);
        }
    }

    /// At most one refresh runs at a time; readings arriving meanwhile do
    /// not start another.
    fn spawn_oldest_reading_refresh(&self, today: NaiveDate) {
        if self.fetching_oldest.swap(true, Ordering::AcqRel) {
            return;
        }
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.refresh_oldest_reading(today).await {
                tracing::warn!("{}", e);
            }
            service.fetching_oldest.store(false, Ordering::Release);
        });
    }

    /// Loads the first meter reading of `today`, the base for the gas used
    /// today.
    pub async fn refresh_oldest_reading(&self, today: NaiveDate) -> Result<(), DashboardError> {
        let oldest = self
            .repository
            .oldest_meter_reading_of_today()
            .await
            .map_err(|e| DashboardError::backend(OLDEST_FAILED, e))?;

        match oldest {
            Some(oldest) => {
                self.state
                    .send_modify(|dashboard| dashboard.set_oldest_reading_of_today(&oldest, today));
                tracing::debug!("Oldest meter reading of {} loaded", today);
            }
            None => tracing::debug!("No meter reading yet for {}", today),
        }
        Ok(())
    }

    pub fn on_climate_reading(&self, reading: Option<ClimateReading>) {
        self.state.send_modify(|dashboard| match reading.as_ref() {
            Some(reading) => dashboard.apply_climate_reading(Some(reading)),
            None => dashboard.clear_climate_data(),
        });
    }

    pub fn check_liveness(&self) -> bool {
        let now = Local::now().timestamp_millis();
        let mut live = false;
        self.state.send_if_modified(|dashboard| {
            let before = dashboard.clone();
            live = dashboard.check_liveness(now);
            *dashboard != before
        });
        if !live {
            tracing::debug!("No recent meter reading, showing no-connection alert");
        }
        live
    }

    /// Checks liveness every `period` until the guard is dropped.
    pub fn start_watchdog(&self, period: Duration) -> TaskGuard {
        let service = self.clone();
        TaskGuard::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                service.check_liveness();
            }
        })
    }
}
