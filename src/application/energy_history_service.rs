// Energy history service - Use case for the hourly, daily and monthly energy charts
use crate::application::chart_builder::{EnergyChartRequest, energy_chart};
use crate::application::error::DashboardError;
use crate::application::home_server_repository::HomeServerRepository;
use crate::application::reshaper::{Columns, SampleStream, reshape};
use crate::application::table_builder::energy_table;
use crate::domain::chart::ChartView;
use crate::domain::energy::{Category, CategorySelection, Subtype};
use crate::domain::layout::{Viewport, WindowFit};
use crate::domain::period::{Period, daily_ticks, month_bounds, monthly_ticks, start_of_day};
use crate::domain::sample::Sample;
use crate::domain::statistics::{SignalFilter, Statistics};
use chrono::{Datelike, Local, NaiveDate};
use futures::future::try_join_all;
use std::sync::Arc;

const FETCH_FAILED: &str = "Verbruiksgegevens konden niet worden opgehaald";

/// The monthly view only knows electricity.
const MONTHLY_CATEGORIES: [Category; 1] = [Category::Stroom];

#[derive(Debug, Clone)]
pub struct EnergyQuery {
    pub date: NaiveDate,
    pub subtype: Subtype,
    pub selection: CategorySelection,
    pub viewport: Option<Viewport>,
}

#[derive(Clone)]
pub struct EnergyHistoryService {
    repository: Arc<dyn HomeServerRepository>,
    layout: WindowFit,
}

impl EnergyHistoryService {
    pub fn new(repository: Arc<dyn HomeServerRepository>, layout: WindowFit) -> Self {
        Self { repository, layout }
    }

    /// Never fails: a backend error yields the empty chart with the error
    /// message instead of partial data.
    pub async fn chart(&self, period: Period, query: &EnergyQuery) -> ChartView {
        let view = match self.build(period, query).await {
            Ok(view) => view,
            Err(error) => ChartView::failed(period.profile().empty_padding, &error.to_string()),
        };
        view.with_height(query.viewport.map(|v| self.layout.height(v)))
    }

    async fn build(&self, period: Period, query: &EnergyQuery) -> Result<ChartView, DashboardError> {
        let categories = match period {
            Period::Month => &MONTHLY_CATEGORIES[..],
            _ => query.selection.categories(),
        };
        tracing::debug!(
            "Building {} energy chart for {} ({:?}, {:?})",
            period.code(),
            query.date,
            query.subtype,
            categories
        );

        let month = month_bounds(query.date, &Local).ok_or_else(|| invalid_date(query.date))?;
        let samples: Vec<Vec<Sample>> = match period {
            Period::Hour => {
                let day_start = start_of_day(query.date, &Local)
                    .ok_or_else(|| invalid_date(query.date))?
                    .timestamp_millis();
                try_join_all(
                    categories
                        .iter()
                        .map(|c| self.repository.usage_per_hour(*c, day_start)),
                )
                .await
            }
            Period::Day => {
                try_join_all(
                    categories
                        .iter()
                        .map(|c| self.repository.usage_per_day(*c, month.0, month.1)),
                )
                .await
            }
            Period::Month => self
                .repository
                .electricity_per_month(query.date.year())
                .await
                .map(|samples| vec![samples]),
        }
        .map_err(|e| DashboardError::backend(FETCH_FAILED, e))?;

        let streams: Vec<SampleStream<'_>> = categories
            .iter()
            .zip(&samples)
            .map(|(category, samples)| SampleStream::new(category.code(), samples))
            .collect();
        let rows = reshape(
            period.profile().key_field,
            &streams,
            &Columns::PerSubtype(Subtype::ALL.to_vec()),
        );

        let statistics = match categories {
            [single] => Some(Statistics::compute(
                rows.iter().map(|r| r.get(&query.subtype.column(*single))),
                SignalFilter::Positive,
            )),
            _ => None,
        };

        let (ticks, x_range) = match period {
            Period::Hour => (Vec::new(), None),
            Period::Day => {
                let first = start_of_day(query.date.with_day(1).unwrap_or(query.date), &Local)
                    .ok_or_else(|| invalid_date(query.date))?;
                (daily_ticks(&first), Some(month))
            }
            Period::Month => (monthly_ticks(), None),
        };

        let config = energy_chart(&EnergyChartRequest {
            period,
            rows: &rows,
            subtype: query.subtype,
            categories,
            ticks,
            x_range,
            statistics,
        });
        let table = energy_table(&rows, query.subtype, categories, |row| {
            period.label(row.key, &Local)
        });

        Ok(ChartView::new(config, table).with_statistics(statistics))
    }
}

fn invalid_date(date: NaiveDate) -> DashboardError {
    DashboardError::InvalidRequest(format!("datum {} bestaat niet in de lokale tijdzone", date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::FakeRepository;
    use crate::domain::energy::SelectionMode;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn usage(key: i64, verbruik: f64, kosten: f64) -> Sample {
        Sample::new(key)
            .with_value("verbruik", verbruik)
            .with_value("kosten", kosten)
    }

    fn service(repository: FakeRepository) -> (EnergyHistoryService, Arc<FakeRepository>) {
        let repository = Arc::new(repository);
        let service = EnergyHistoryService::new(repository.clone(), WindowFit::new(220, 475, 115));
        (service, repository)
    }

    fn query(subtype: Subtype, categories: Vec<Category>) -> EnergyQuery {
        EnergyQuery {
            date: date(),
            subtype,
            selection: CategorySelection::new(SelectionMode::Multiple, categories),
            viewport: None,
        }
    }

    #[tokio::test]
    async fn test_hourly_costs_for_both_categories() {
        let mut repository = FakeRepository::default();
        repository
            .hourly
            .insert(Category::Stroom, vec![usage(0, 1.0, 0.25), usage(1, 2.0, 0.5)]);
        repository.hourly.insert(Category::Gas, vec![usage(1, 0.5, 0.75)]);
        let (service, repository) = service(repository);

        let view = service
            .chart(Period::Hour, &query(Subtype::Kosten, vec![Category::Stroom, Category::Gas]))
            .await;

        assert_eq!(repository.calls(), 2);
        assert!(view.error.is_none());
        assert_eq!(view.config.data.json.len(), 2);
        assert_eq!(view.config.data.json[1].get("gas-kosten"), Some(0.75));
        assert_eq!(view.table.cols.last().map(String::as_str), Some("Totaal"));
        assert_eq!(view.table.rows[1][3], "\u{20AC} 1,25");
        assert!(view.statistics.is_none());
    }

    #[tokio::test]
    async fn test_one_failing_category_fails_the_batch() {
        let mut repository = FakeRepository::default();
        repository.hourly.insert(Category::Stroom, vec![usage(0, 1.0, 0.25)]);
        repository.failing.push(Category::Gas);
        let (service, _) = service(repository);

        let view = service
            .chart(Period::Hour, &query(Subtype::Kosten, vec![Category::Stroom, Category::Gas]))
            .await;

        assert_eq!(view.error.as_deref(), Some(FETCH_FAILED));
        assert!(view.config.is_empty());
        assert!(view.table.rows.is_empty());
    }

    #[tokio::test]
    async fn test_daily_chart_covers_the_month() {
        let day = start_of_day(date(), &Local).unwrap().timestamp_millis();
        let mut repository = FakeRepository::default();
        repository.daily.insert(Category::Gas, vec![usage(day, 2.0, 1.6)]);
        let (service, _) = service(repository);

        let view = service
            .chart(Period::Day, &query(Subtype::Verbruik, vec![Category::Gas]))
            .await;

        assert_eq!(view.config.axis.x.tick.values.as_ref().map(Vec::len), Some(31));
        assert_eq!(view.config.data.keys.as_ref().unwrap().x, "dt");
        assert_eq!(view.table.rows[0], vec!["01-03 (vr)", "2,000 m\u{00B3}"]);
        assert_eq!(view.statistics.and_then(|s| s.mean), Some(2.0));
    }

    #[tokio::test]
    async fn test_monthly_chart_ignores_selection() {
        let mut repository = FakeRepository::default();
        repository.monthly = vec![usage(1, 300.0, 60.0), usage(2, 100.0, 20.0)];
        let (service, _) = service(repository);

        let view = service
            .chart(Period::Month, &query(Subtype::Verbruik, vec![Category::Gas]))
            .await;

        let keys = view.config.data.keys.as_ref().unwrap();
        assert_eq!(keys.x, "maand");
        assert_eq!(keys.value, vec!["stroom-verbruik"]);
        let lines = &view.config.grid.as_ref().unwrap().y.lines;
        assert_eq!(lines[0].value, 200.0);
        assert_eq!(view.table.rows[1][0], "februari");
    }

    #[tokio::test]
    async fn test_empty_selection_renders_empty_chart_with_height() {
        let (service, repository) = service(FakeRepository::default());
        let mut query = query(Subtype::Verbruik, Vec::new());
        query.viewport = Some(Viewport::new(900, 100));

        let view = service.chart(Period::Hour, &query).await;

        assert_eq!(repository.calls(), 0);
        assert!(view.config.is_empty());
        assert!(!view.config.legend.show);
        assert!(view.error.is_none());
        assert_eq!(view.height, Some(475));
    }
}
