// Declarative chart configuration (c3 layout) and the chart view returned to the browser
use crate::domain::format::ValueFormat;
use crate::domain::sample::MergedRow;
use crate::domain::statistics::Statistics;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Padding {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Padding {
    pub const fn new(top: u32, bottom: u32, left: u32, right: u32) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }
}

pub const DEFAULT_PADDING: Padding = Padding::new(10, 25, 55, 20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesType {
    Bar,
    Area,
    Spline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    Category,
    Timeseries,
    Indexed,
}

/// Either a d3 time format string or a number format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TickFormat {
    Time(String),
    Value(ValueFormat),
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Tick {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<TickFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centered: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisPadding {
    pub left: u32,
    pub right: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Axis {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub axis_type: Option<AxisType>,
    pub tick: Tick,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<AxisPadding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Axes {
    pub x: Axis,
    pub y: Axis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataKeys {
    pub x: String,
    pub value: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DataSpec {
    pub json: Vec<MergedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<DataKeys>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub series_type: Option<SeriesType>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub types: BTreeMap<String, SeriesType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub colors: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub names: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Toggle {
    pub show: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarWidth {
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarSpec {
    pub width: BarWidth,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transition {
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct TooltipFormat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<TickFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ValueFormat>,
    /// Show a "Totaal" row summing all series.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub total: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipSpec {
    pub show: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<TooltipFormat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLine {
    pub value: f64,
    pub text: String,
    pub class: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridAxis {
    pub show: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<GridLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    pub y: GridAxis,
}

/// Configuration handed verbatim to the chart library. Built fresh for every
/// redraw and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindto: Option<&'static str>,
    pub data: DataSpec,
    pub axis: Axes,
    pub legend: Toggle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point: Option<Toggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar: Option<BarSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<TooltipSpec>,
    pub padding: Padding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<Grid>,
}

impl ChartConfig {
    /// Minimal configuration for a chart without data: no series, no tick
    /// values, no legend.
    pub fn empty(padding: Padding) -> Self {
        let no_ticks = || Axis {
            tick: Tick {
                values: Some(Vec::new()),
                ..Tick::default()
            },
            ..Axis::default()
        };

        Self {
            bindto: None,
            data: DataSpec::default(),
            axis: Axes {
                x: no_ticks(),
                y: no_ticks(),
            },
            legend: Toggle { show: false },
            point: None,
            bar: None,
            transition: None,
            tooltip: None,
            padding,
            grid: None,
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.data.json.is_empty()
    }
}

/// Rows for the tabular rendering of the same data.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct TableData {
    pub cols: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Everything a view needs to render one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub config: ChartConfig,
    pub table: TableData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    /// Height the chart should be resized to, when viewport geometry was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChartView {
    pub fn new(config: ChartConfig, table: TableData) -> Self {
        Self {
            config,
            table,
            statistics: None,
            height: None,
            error: None,
        }
    }

    /// Empty chart carrying a user-facing error message.
    pub fn failed(padding: Padding, message: &str) -> Self {
        let mut view = Self::new(ChartConfig::empty(padding), TableData::default());
        view.error = Some(message.to_string());
        view
    }

    pub fn with_statistics(mut self, statistics: Option<Statistics>) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_height(mut self, height: Option<u32>) -> Self {
        self.height = height;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_config_serialization() {
        let config = ChartConfig::empty(DEFAULT_PADDING);
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(
            json,
            json!({
                "data": {"json": []},
                "axis": {
                    "x": {"tick": {"values": []}},
                    "y": {"tick": {"values": []}}
                },
                "legend": {"show": false},
                "padding": {"top": 10, "bottom": 25, "left": 55, "right": 20}
            })
        );
        assert!(config.is_empty());
    }

    #[test]
    fn test_failed_view_carries_message() {
        let view = ChartView::failed(DEFAULT_PADDING, "Ophalen mislukt");
        assert!(view.config.is_empty());
        assert_eq!(view.error.as_deref(), Some("Ophalen mislukt"));
        assert!(view.table.rows.is_empty());
    }
}
