// Climate history service - Use case for the temperature/humidity day overlay chart
use crate::application::chart_builder::climate_chart;
use crate::application::error::DashboardError;
use crate::application::home_server_repository::HomeServerRepository;
use crate::application::reshaper::{Columns, SampleStream, project_onto_date, reshape};
use crate::application::table_builder::series_table;
use crate::domain::chart::{ChartConfig, ChartView, DEFAULT_PADDING, TableData};
use crate::domain::climate::{CLIMATE_KEY_FIELD, ClimateSensor, model_date};
use crate::domain::layout::{Viewport, WindowFit};
use crate::domain::period::{end_of_day, hourly_ticks, start_of_day, time_of_day_label, weekday_date_label};
use crate::domain::sample::Sample;
use crate::domain::statistics::Statistics;
use chrono::{Local, NaiveDate};
use futures::future::try_join_all;
use std::sync::Arc;

const FETCH_FAILED: &str = "Klimaatgegevens konden niet worden opgehaald";

#[derive(Debug, Clone)]
pub struct ClimateQuery {
    pub sensor: ClimateSensor,
    /// Selected days, each drawn as its own series.
    pub dates: Vec<NaiveDate>,
    pub viewport: Option<Viewport>,
}

#[derive(Clone)]
pub struct ClimateHistoryService {
    repository: Arc<dyn HomeServerRepository>,
    layout: WindowFit,
}

impl ClimateHistoryService {
    pub fn new(repository: Arc<dyn HomeServerRepository>, layout: WindowFit) -> Self {
        Self { repository, layout }
    }

    pub async fn chart(&self, query: &ClimateQuery) -> ChartView {
        let view = match self.build(query).await {
            Ok(view) => view,
            Err(error) => ChartView::failed(DEFAULT_PADDING, &error.to_string()),
        };
        view.with_height(query.viewport.map(|v| self.layout.height(v)))
    }

    async fn build(&self, query: &ClimateQuery) -> Result<ChartView, DashboardError> {
        let mut dates = query.dates.clone();
        dates.sort();
        dates.dedup();
        if dates.is_empty() {
            return Ok(ChartView::new(ChartConfig::empty(DEFAULT_PADDING), TableData::default()));
        }

        let ranges = dates
            .iter()
            .map(|date| day_range(*date))
            .collect::<Result<Vec<_>, _>>()?;
        let histories: Vec<Vec<Sample>> = try_join_all(
            ranges
                .iter()
                .map(|(from, to)| self.repository.climate_history(*from, *to)),
        )
        .await
        .map_err(|e| DashboardError::backend(FETCH_FAILED, e))?;

        let model = model_date();
        let projected: Vec<Vec<Sample>> = histories
            .iter()
            .map(|history| project_onto_date(history, &Local, model))
            .collect();

        let series: Vec<(String, String)> = dates
            .iter()
            .map(|date| (date.format("%d-%m-%Y").to_string(), weekday_date_label(*date)))
            .collect();
        let streams: Vec<SampleStream<'_>> = series
            .iter()
            .zip(&projected)
            .map(|((column, _), samples)| SampleStream::new(column.clone(), samples))
            .collect();
        let mut rows = reshape(
            CLIMATE_KEY_FIELD,
            &streams,
            &Columns::Single(query.sensor.field().to_string()),
        );
        rows.sort_by_key(|row| row.key);

        // Reference lines only make sense for a single day.
        let statistics = match projected.as_slice() {
            [single] => Some(Statistics::compute(
                single.iter().map(|s| s.value(query.sensor.field())),
                query.sensor.signal_filter(),
            )),
            _ => None,
        };

        let (from, to) = model_day_bounds(model)?;
        let config = climate_chart(
            &rows,
            query.sensor,
            &series,
            hourly_ticks(&from, &to),
            (from.timestamp_millis(), to.timestamp_millis()),
            statistics.as_ref(),
        );
        let table = series_table(&rows, "Tijdstip", &series, &query.sensor.value_format(), |row| {
            time_of_day_label(row.key, &Local)
        });

        Ok(ChartView::new(config, table).with_statistics(statistics))
    }
}

fn day_range(date: NaiveDate) -> Result<(i64, i64), DashboardError> {
    let from = start_of_day(date, &Local);
    let to = end_of_day(date, &Local);
    match (from, to) {
        (Some(from), Some(to)) => Ok((from.timestamp_millis(), to.timestamp_millis())),
        _ => Err(DashboardError::InvalidRequest(format!("ongeldige datum: {}", date))),
    }
}

fn model_day_bounds(
    model: NaiveDate,
) -> Result<(chrono::DateTime<Local>, chrono::DateTime<Local>), DashboardError> {
    match (start_of_day(model, &Local), end_of_day(model, &Local)) {
        (Some(from), Some(to)) => Ok((from, to)),
        _ => Err(DashboardError::InvalidRequest(format!("ongeldige datum: {}", model))),
    }
}
