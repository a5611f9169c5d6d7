// Repository trait for home-server backend access
use crate::domain::dashboard::{ClimateReading, MeterReading};
use crate::domain::energy::Category;
use crate::domain::sample::Sample;
use crate::domain::settings::{EnergyContract, MindergasnlSettings};
use async_trait::async_trait;

#[async_trait]
pub trait HomeServerRepository: Send + Sync {
    /// Usage per hour of the day starting at `day_start_ms`, keyed by `uur`
    async fn usage_per_hour(&self, category: Category, day_start_ms: i64) -> anyhow::Result<Vec<Sample>>;

    /// Usage per day within `[from_ms, to_ms]`, keyed by `dt`
    async fn usage_per_day(
        &self,
        category: Category,
        from_ms: i64,
        to_ms: i64,
    ) -> anyhow::Result<Vec<Sample>>;

    /// Electricity usage per month of `year`, keyed by `maand`, with
    /// `verbruik` and `kosten` fields
    async fn electricity_per_month(&self, year: i32) -> anyhow::Result<Vec<Sample>>;

    /// Power draw samples keyed by `datumtijd`, tagged with the tariff indicator
    async fn power_draw(
        &self,
        from_ms: i64,
        to_ms: i64,
        sub_period_ms: i64,
    ) -> anyhow::Result<Vec<Sample>>;

    /// Climate sensor history keyed by `datumtijd`
    async fn climate_history(&self, from_ms: i64, to_ms: i64) -> anyhow::Result<Vec<Sample>>;

    async fn latest_meter_reading(&self) -> anyhow::Result<Option<MeterReading>>;

    async fn oldest_meter_reading_of_today(&self) -> anyhow::Result<Option<MeterReading>>;

    async fn latest_climate_reading(&self) -> anyhow::Result<Option<ClimateReading>>;

    async fn mindergasnl_settings(&self) -> anyhow::Result<MindergasnlSettings>;

    async fn save_mindergasnl_settings(
        &self,
        settings: &MindergasnlSettings,
    ) -> anyhow::Result<MindergasnlSettings>;

    async fn energy_contracts(&self) -> anyhow::Result<Vec<EnergyContract>>;

    async fn save_energy_contract(&self, contract: &EnergyContract) -> anyhow::Result<EnergyContract>;

    async fn delete_energy_contract(&self, id: i64) -> anyhow::Result<()>;
}
