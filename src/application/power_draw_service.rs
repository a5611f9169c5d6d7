// Power draw service - Use case for the power draw (opgenomen vermogen) day chart
use crate::application::chart_builder::power_draw_chart;
use crate::application::error::DashboardError;
use crate::application::gap_filler::{WATT_FIELD, fill_tariff_gaps, tariff_column, tariff_rows};
use crate::application::home_server_repository::HomeServerRepository;
use crate::application::table_builder::series_table;
use crate::domain::chart::{ChartView, DEFAULT_PADDING};
use crate::domain::format::watt_format;
use crate::domain::layout::{Viewport, WindowFit};
use crate::domain::period::{end_of_day, hourly_ticks, start_of_day, time_of_day_label};
use crate::domain::statistics::{SignalFilter, Statistics};
use chrono::{Local, NaiveDate};
use std::sync::Arc;

const FETCH_FAILED: &str = "Opgenomen vermogen kon niet worden opgehaald";

/// Length of the sub periods the backend averages the power draw over.
pub const SUB_PERIOD_MS: i64 = 60_000;

#[derive(Clone)]
pub struct PowerDrawService {
    repository: Arc<dyn HomeServerRepository>,
    layout: WindowFit,
}

impl PowerDrawService {
    pub fn new(repository: Arc<dyn HomeServerRepository>, layout: WindowFit) -> Self {
        Self { repository, layout }
    }

    pub async fn chart(&self, date: NaiveDate, viewport: Option<Viewport>) -> ChartView {
        let view = match self.build(date).await {
            Ok(view) => view,
            Err(error) => ChartView::failed(DEFAULT_PADDING, &error.to_string()),
        };
        view.with_height(viewport.map(|v| self.layout.height(v)))
    }

    async fn build(&self, date: NaiveDate) -> Result<ChartView, DashboardError> {
        let invalid = || DashboardError::InvalidRequest(format!("ongeldige datum: {}", date));
        let from = start_of_day(date, &Local).ok_or_else(invalid)?;
        let to = end_of_day(date, &Local).ok_or_else(invalid)?;
        let range = (from.timestamp_millis(), to.timestamp_millis());

        let samples = self
            .repository
            .power_draw(range.0, range.1, SUB_PERIOD_MS)
            .await
            .map_err(|e| DashboardError::backend(FETCH_FAILED, e))?;
        tracing::debug!("Fetched {} power draw samples for {}", samples.len(), date);

        let statistics = Statistics::compute(
            samples.iter().map(|s| s.value(WATT_FIELD)),
            SignalFilter::Positive,
        );
        let rows = fill_tariff_gaps(&samples);

        let config = power_draw_chart(&rows, hourly_ticks(&from, &to), range, Some(&statistics));
        let series = [
            (tariff_column("dal"), "Dal".to_string()),
            (tariff_column("normaal"), "Normaal".to_string()),
        ];
        let table = series_table(&tariff_rows(&samples), "Tijdstip", &series, &watt_format(), |row| {
            time_of_day_label(row.key, &Local)
        });

        Ok(ChartView::new(config, table).with_statistics(Some(statistics)))
    }
}
