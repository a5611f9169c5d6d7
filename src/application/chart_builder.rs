// Chart configuration builder - turns merged rows into chart library configurations
use crate::application::gap_filler::{POWER_KEY_FIELD, tariff_column};
use crate::domain::chart::{
    AxisPadding, AxisType, Axes, Axis, BarSpec, BarWidth, ChartConfig, DataKeys, DataSpec,
    DEFAULT_PADDING, Grid, GridAxis, GridLine, SeriesType, Tick, TickFormat, Toggle,
    TooltipFormat, TooltipSpec, Transition,
};
use crate::domain::climate::{CLIMATE_KEY_FIELD, ClimateSensor};
use crate::domain::energy::{Category, Subtype};
use crate::domain::format::{ValueFormat, energy_format, watt_format};
use crate::domain::period::{HALF_DAY_MS, Period, hour_period_label, short_month_name};
use crate::domain::sample::MergedRow;
use crate::domain::statistics::Statistics;
use std::collections::BTreeMap;

const CHART_ELEMENT: &str = "#chart";
const POWER_TARIFFS: [&str; 2] = ["dal", "normaal"];

/// Input of the stacked bar charts of the hour/day/month energy views.
#[derive(Debug, Clone)]
pub struct EnergyChartRequest<'a> {
    pub period: Period,
    pub rows: &'a [MergedRow],
    pub subtype: Subtype,
    pub categories: &'a [Category],
    pub ticks: Vec<i64>,
    /// First and last millisecond of the displayed period, for time axes.
    pub x_range: Option<(i64, i64)>,
    pub statistics: Option<Statistics>,
}

pub fn energy_chart(request: &EnergyChartRequest<'_>) -> ChartConfig {
    let profile = request.period.profile();
    if request.rows.is_empty() {
        return ChartConfig::empty(profile.empty_padding);
    }

    let columns: Vec<String> = request
        .categories
        .iter()
        .map(|c| request.subtype.column(*c))
        .collect();
    let value_format = energy_format(
        request.subtype,
        request.categories.first().copied().unwrap_or(Category::Stroom),
    );

    let mut colors = BTreeMap::new();
    let mut names = BTreeMap::new();
    for (category, column) in request.categories.iter().zip(&columns) {
        colors.insert(column.clone(), category.color().to_string());
        names.insert(column.clone(), category.display_name().to_string());
    }

    let x = match request.period {
        Period::Hour => Axis {
            axis_type: Some(profile.axis_type),
            tick: Tick {
                labels: Some(request.rows.iter().map(|r| hour_period_label(r.key)).collect()),
                ..Tick::default()
            },
            ..Axis::default()
        },
        Period::Day => Axis {
            axis_type: Some(profile.axis_type),
            tick: Tick {
                values: Some(request.ticks.clone()),
                format: profile.tick_format.map(|f| TickFormat::Time(f.to_string())),
                centered: Some(true),
                ..Tick::default()
            },
            min: request.x_range.map(|(from, _)| (from - HALF_DAY_MS) as f64),
            max: request.x_range.map(|(_, to)| to as f64),
            padding: Some(AxisPadding { left: 0, right: 10 }),
        },
        Period::Month => Axis {
            axis_type: Some(profile.axis_type),
            tick: Tick {
                labels: Some(
                    request
                        .ticks
                        .iter()
                        .map(|m| short_month_name(*m).unwrap_or_default().to_string())
                        .collect(),
                ),
                values: Some(request.ticks.clone()),
                centered: Some(true),
                ..Tick::default()
            },
            min: Some(0.5),
            max: Some(12.5),
            padding: Some(AxisPadding { left: 0, right: 10 }),
        },
    };

    let tooltip_title = match request.period {
        Period::Day => Some(TickFormat::Time("%a %d-%m".to_string())),
        _ => None,
    };

    ChartConfig {
        bindto: Some(CHART_ELEMENT),
        data: DataSpec {
            json: request.rows.to_vec(),
            keys: Some(DataKeys {
                x: profile.key_field.to_string(),
                value: columns.clone(),
            }),
            series_type: Some(SeriesType::Bar),
            groups: vec![columns],
            colors,
            names,
            ..DataSpec::default()
        },
        axis: Axes {
            x,
            y: value_axis(&value_format),
        },
        legend: Toggle { show: false },
        point: None,
        bar: Some(BarSpec {
            width: BarWidth { ratio: 0.8 },
        }),
        transition: Some(Transition { duration: 0 }),
        tooltip: Some(TooltipSpec {
            show: true,
            format: Some(TooltipFormat {
                title: tooltip_title,
                value: Some(value_format),
                total: request.categories.len() > 1,
            }),
        }),
        padding: profile.padding,
        grid: Some(Grid {
            y: GridAxis {
                show: true,
                lines: mean_line(request.statistics.as_ref(), "gemiddelde"),
            },
        }),
    }
}

/// Area chart of the power draw of one day, one series per tariff.
pub fn power_draw_chart(
    rows: &[MergedRow],
    ticks: Vec<i64>,
    x_range: (i64, i64),
    statistics: Option<&Statistics>,
) -> ChartConfig {
    if rows.is_empty() {
        return ChartConfig::empty(DEFAULT_PADDING);
    }

    let columns: Vec<String> = POWER_TARIFFS.iter().map(|t| tariff_column(t)).collect();
    let types = columns
        .iter()
        .map(|c| (c.clone(), SeriesType::Area))
        .collect();
    let lines = statistics
        .map(|s| statistics_lines(s, &watt_format().with_suffix(" W")))
        .unwrap_or_default();

    ChartConfig {
        bindto: Some(CHART_ELEMENT),
        data: DataSpec {
            json: rows.to_vec(),
            keys: Some(DataKeys {
                x: POWER_KEY_FIELD.to_string(),
                value: columns,
            }),
            types,
            ..DataSpec::default()
        },
        axis: Axes {
            x: time_axis(ticks, x_range, -45),
            y: value_axis(&watt_format()),
        },
        legend: Toggle { show: false },
        point: Some(Toggle { show: false }),
        bar: None,
        transition: Some(Transition { duration: 0 }),
        tooltip: Some(TooltipSpec {
            show: false,
            format: None,
        }),
        padding: DEFAULT_PADDING,
        grid: Some(Grid {
            y: GridAxis { show: true, lines },
        }),
    }
}

/// Spline chart with one series per selected date, all projected onto the
/// same model day.
pub fn climate_chart(
    rows: &[MergedRow],
    sensor: ClimateSensor,
    series: &[(String, String)],
    ticks: Vec<i64>,
    x_range: (i64, i64),
    statistics: Option<&Statistics>,
) -> ChartConfig {
    if rows.is_empty() {
        return ChartConfig::empty(DEFAULT_PADDING);
    }

    let value_format = sensor.value_format();
    let lines = statistics
        .map(|s| statistics_lines(s, &value_format))
        .unwrap_or_default();

    ChartConfig {
        bindto: Some(CHART_ELEMENT),
        data: DataSpec {
            json: rows.to_vec(),
            keys: Some(DataKeys {
                x: CLIMATE_KEY_FIELD.to_string(),
                value: series.iter().map(|(column, _)| column.clone()).collect(),
            }),
            series_type: Some(SeriesType::Spline),
            names: series.iter().cloned().collect(),
            ..DataSpec::default()
        },
        axis: Axes {
            x: time_axis(ticks, x_range, -30),
            y: Axis {
                tick: Tick {
                    format: Some(TickFormat::Value(value_format.clone())),
                    ..Tick::default()
                },
                ..Axis::default()
            },
        },
        legend: Toggle { show: false },
        point: None,
        bar: None,
        transition: Some(Transition { duration: 0 }),
        tooltip: Some(TooltipSpec {
            show: true,
            format: Some(TooltipFormat {
                value: Some(value_format),
                ..TooltipFormat::default()
            }),
        }),
        padding: DEFAULT_PADDING,
        grid: Some(Grid {
            y: GridAxis { show: true, lines },
        }),
    }
}

/// Average, lowest and highest value as labelled reference lines.
pub fn statistics_lines(statistics: &Statistics, format: &ValueFormat) -> Vec<GridLine> {
    let mut lines = Vec::new();
    if let Some(mean) = statistics.mean.filter(|m| m.is_finite()) {
        lines.push(GridLine {
            value: mean,
            text: format!("Gemiddelde: {}", format.format(mean)),
            class: "avg",
            position: Some("middle"),
        });
    }
    if let Some(min) = statistics.min.filter(|m| m.is_finite()) {
        lines.push(GridLine {
            value: min,
            text: format!("Laagste: {}", format.format(min)),
            class: "min",
            position: Some("start"),
        });
    }
    if let Some(max) = statistics.max.filter(|m| m.is_finite()) {
        lines.push(GridLine {
            value: max,
            text: format!("Hoogste: {}", format.format(max)),
            class: "max",
            position: None,
        });
    }
    lines
}

fn mean_line(statistics: Option<&Statistics>, class: &'static str) -> Vec<GridLine> {
    statistics
        .and_then(|s| s.mean)
        .filter(|mean| *mean > 0.0)
        .map(|mean| GridLine {
            value: mean,
            text: String::new(),
            class,
            position: None,
        })
        .into_iter()
        .collect()
}

fn value_axis(format: &ValueFormat) -> Axis {
    Axis {
        tick: Tick {
            format: Some(TickFormat::Value(format.without_unit())),
            ..Tick::default()
        },
        ..Axis::default()
    }
}

fn time_axis(ticks: Vec<i64>, (from, to): (i64, i64), rotate: i32) -> Axis {
    Axis {
        axis_type: Some(AxisType::Timeseries),
        tick: Tick {
            values: Some(ticks),
            format: Some(TickFormat::Time("%H:%M".to_string())),
            rotate: Some(rotate),
            ..Tick::default()
        },
        min: Some(from as f64),
        max: Some(to as f64),
        padding: Some(AxisPadding { left: 0, right: 10 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::period::monthly_ticks;
    use serde_json::json;

    fn hour_rows() -> Vec<MergedRow> {
        vec![
            MergedRow::new("uur", 0)
                .with_field("stroom-kosten", 0.12)
                .with_field("gas-kosten", 0.3),
            MergedRow::new("uur", 1).with_field("stroom-kosten", 0.1),
        ]
    }

    fn hour_request<'a>(rows: &'a [MergedRow], categories: &'a [Category]) -> EnergyChartRequest<'a> {
        EnergyChartRequest {
            period: Period::Hour,
            rows,
            subtype: Subtype::Kosten,
            categories,
            ticks: Vec::new(),
            x_range: None,
            statistics: None,
        }
    }

    #[test]
    fn test_empty_rows_short_circuit() {
        let stats = Statistics {
            min: Some(1.0),
            max: Some(3.0),
            mean: Some(2.0),
        };
        let request = EnergyChartRequest {
            period: Period::Day,
            rows: &[],
            subtype: Subtype::Verbruik,
            categories: &[Category::Stroom],
            ticks: vec![1, 2, 3],
            x_range: Some((0, 10)),
            statistics: Some(stats),
        };

        let config = energy_chart(&request);

        assert!(config.is_empty());
        assert!(!config.legend.show);
        assert_eq!(config.axis.x.tick.values, Some(Vec::new()));
        assert_eq!(config.axis.y.tick.values, Some(Vec::new()));
        assert!(config.grid.is_none());

        assert!(power_draw_chart(&[], vec![1], (0, 1), Some(&stats)).is_empty());
    }

    #[test]
    fn test_hourly_bars_are_stacked_per_category() {
        let rows = hour_rows();
        let categories = [Category::Stroom, Category::Gas];
        let config = energy_chart(&hour_request(&rows, &categories));

        let keys = config.data.keys.as_ref().unwrap();
        assert_eq!(keys.x, "uur");
        assert_eq!(keys.value, vec!["stroom-kosten", "gas-kosten"]);
        assert_eq!(config.data.groups, vec![vec!["stroom-kosten".to_string(), "gas-kosten".to_string()]]);
        assert_eq!(config.data.colors["gas-kosten"], "#BA2924");
        assert_eq!(
            config.axis.x.tick.labels,
            Some(vec!["00:00 - 01:00".to_string(), "01:00 - 02:00".to_string()])
        );
        let tooltip = config.tooltip.unwrap().format.unwrap();
        assert!(tooltip.total);
        assert_eq!(tooltip.value.unwrap().format(1.5), "\u{20AC} 1,50");
    }

    #[test]
    fn test_monthly_chart_mean_line() {
        let rows = vec![
            MergedRow::new("maand", 1).with_field("stroom-verbruik", 200.0),
            MergedRow::new("maand", 2).with_field("stroom-verbruik", 100.0),
        ];
        let request = EnergyChartRequest {
            period: Period::Month,
            rows: &rows,
            subtype: Subtype::Verbruik,
            categories: &[Category::Stroom],
            ticks: monthly_ticks(),
            x_range: None,
            statistics: Some(Statistics {
                min: Some(100.0),
                max: Some(200.0),
                mean: Some(150.0),
            }),
        };

        let config = energy_chart(&request);
        let lines = &config.grid.as_ref().unwrap().y.lines;

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].value, 150.0);
        assert_eq!(lines[0].class, "gemiddelde");
        assert_eq!(config.axis.x.tick.values.as_ref().map(Vec::len), Some(12));
        assert_eq!(config.axis.x.tick.labels.as_ref().unwrap()[2], "mrt");
    }

    #[test]
    fn test_no_reference_line_without_positive_mean() {
        let rows = hour_rows();
        let categories = [Category::Stroom];
        let mut request = hour_request(&rows, &categories);
        request.statistics = Some(Statistics::default());

        let config = energy_chart(&request);
        assert!(config.grid.unwrap().y.lines.is_empty());
    }

    #[test]
    fn test_power_draw_chart_serialization() {
        let rows = vec![MergedRow::new(POWER_KEY_FIELD, 100).with_field("watt-dal", 80.0)];
        let stats = Statistics {
            min: Some(80.0),
            max: Some(80.0),
            mean: Some(80.0),
        };

        let config = power_draw_chart(&rows, vec![0, 3_600_000], (0, 86_400_000), Some(&stats));
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["data"]["types"], json!({"watt-dal": "area", "watt-normaal": "area"}));
        assert_eq!(json["data"]["keys"]["x"], "datumtijd");
        assert_eq!(json["axis"]["x"]["type"], "timeseries");
        assert_eq!(json["axis"]["x"]["tick"]["format"], "%H:%M");
        assert_eq!(json["axis"]["y"]["tick"]["format"]["decimals"], 0);
        assert_eq!(json["grid"]["y"]["lines"][0]["value"], 80.0);
        assert_eq!(json["grid"]["y"]["lines"][0]["text"], "Gemiddelde: 80 W");
        assert_eq!(json["tooltip"]["show"], false);
    }

    #[test]
    fn test_climate_statistics_lines_have_labels() {
        let stats = Statistics {
            min: Some(18.0),
            max: Some(22.5),
            mean: Some(20.0),
        };
        let lines = statistics_lines(&stats, &ClimateSensor::Temperatuur.value_format());

        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Gemiddelde: 20,00\u{2103}",
                "Laagste: 18,00\u{2103}",
                "Hoogste: 22,50\u{2103}"
            ]
        );
    }

    #[test]
    fn test_freezing_lowest_temperature_keeps_its_line() {
        let stats = Statistics {
            min: Some(0.0),
            max: Some(4.5),
            mean: Some(-0.5),
        };
        let lines = statistics_lines(&stats, &ClimateSensor::Temperatuur.value_format());

        let classes: Vec<&str> = lines.iter().map(|l| l.class).collect();
        assert_eq!(classes, vec!["avg", "min", "max"]);
        assert_eq!(lines[1].value, 0.0);
        assert_eq!(lines[1].text, "Laagste: 0,00\u{2103}");
    }

    #[test]
    fn test_climate_chart_series_names() {
        let rows = vec![MergedRow::new(CLIMATE_KEY_FIELD, 0).with_field("01-03-2024", 20.0)];
        let series = vec![("01-03-2024".to_string(), "vr 01-03-2024".to_string())];

        let config = climate_chart(&rows, ClimateSensor::Temperatuur, &series, vec![0], (0, 1), None);

        assert_eq!(config.data.series_type, Some(SeriesType::Spline));
        assert_eq!(config.data.names["01-03-2024"], "vr 01-03-2024");
        assert!(config.grid.unwrap().y.lines.is_empty());
    }
}
