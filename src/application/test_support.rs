// In-memory home server repository for service tests
use crate::application::home_server_repository::HomeServerRepository;
use crate::domain::dashboard::{ClimateReading, MeterReading};
use crate::domain::energy::Category;
use crate::domain::sample::Sample;
use crate::domain::settings::{EnergyContract, MindergasnlSettings};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct FakeRepository {
    pub hourly: HashMap<Category, Vec<Sample>>,
    pub daily: HashMap<Category, Vec<Sample>>,
    pub monthly: Vec<Sample>,
    pub power: Vec<Sample>,
    pub climate: Vec<Sample>,
    pub latest_meter: Option<MeterReading>,
    pub oldest_meter: Option<MeterReading>,
    pub latest_climate: Option<ClimateReading>,
    /// Categories whose requests fail.
    pub failing: Vec<Category>,
    pub fail_all: bool,
    pub settings: Mutex<MindergasnlSettings>,
    pub contracts: Mutex<Vec<EnergyContract>>,
    pub calls: AtomicUsize,
}

impl FakeRepository {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, category: Option<Category>) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all || category.is_some_and(|c| self.failing.contains(&c)) {
            anyhow::bail!("backend unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl HomeServerRepository for FakeRepository {
    async fn usage_per_hour(&self, category: Category, _day_start_ms: i64) -> anyhow::Result<Vec<Sample>> {
        self.check(Some(category))?;
        Ok(self.hourly.get(&category).cloned().unwrap_or_default())
    }

    async fn usage_per_day(&self, category: Category, from_ms: i64, to_ms: i64) -> anyhow::Result<Vec<Sample>> {
        self.check(Some(category))?;
        Ok(self
            .daily
            .get(&category)
            .map(|samples| {
                samples
                    .iter()
                    .filter(|s| s.key >= from_ms && s.key <= to_ms)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn electricity_per_month(&self, _year: i32) -> anyhow::Result<Vec<Sample>> {
        self.check(None)?;
        Ok(self.monthly.clone())
    }

    async fn power_draw(&self, from_ms: i64, to_ms: i64, _sub_period_ms: i64) -> anyhow::Result<Vec<Sample>> {
        self.check(None)?;
        Ok(self
            .power
            .iter()
            .filter(|s| s.key >= from_ms && s.key < to_ms)
            .cloned()
            .collect())
    }

    async fn climate_history(&self, from_ms: i64, to_ms: i64) -> anyhow::Result<Vec<Sample>> {
        self.check(None)?;
        Ok(self
            .climate
            .iter()
            .filter(|s| s.key >= from_ms && s.key < to_ms)
            .cloned()
            .collect())
    }

    async fn latest_meter_reading(&self) -> anyhow::Result<Option<MeterReading>> {
        self.check(None)?;
        Ok(self.latest_meter.clone())
    }

    async fn oldest_meter_reading_of_today(&self) -> anyhow::Result<Option<MeterReading>> {
        self.check(None)?;
        Ok(self.oldest_meter.clone())
    }

    async fn latest_climate_reading(&self) -> anyhow::Result<Option<ClimateReading>> {
        self.check(None)?;
        Ok(self.latest_climate.clone())
    }

    async fn mindergasnl_settings(&self) -> anyhow::Result<MindergasnlSettings> {
        self.check(None)?;
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn save_mindergasnl_settings(&self, settings: &MindergasnlSettings) -> anyhow::Result<MindergasnlSettings> {
        self.check(None)?;
        *self.settings.lock().unwrap() = settings.clone();
        Ok(settings.clone())
    }

    async fn energy_contracts(&self) -> anyhow::Result<Vec<EnergyContract>> {
        self.check(None)?;
        Ok(self.contracts.lock().unwrap().clone())
    }

    async fn save_energy_contract(&self, contract: &EnergyContract) -> anyhow::Result<EnergyContract> {
        self.check(None)?;
        let mut contracts = self.contracts.lock().unwrap();
        let saved = EnergyContract {
            id: Some(contracts.len() as i64 + 1),
            ..contract.clone()
        };
        contracts.push(saved.clone());
        Ok(saved)
    }

    async fn delete_energy_contract(&self, id: i64) -> anyhow::Result<()> {
        self.check(None)?;
        self.contracts.lock().unwrap().retain(|c| c.id != Some(id));
        Ok(())
    }
}
