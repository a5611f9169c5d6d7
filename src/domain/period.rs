// Period granularities, their axis profile and axis tick generation
use crate::domain::chart::{AxisType, Padding};
use crate::domain::sample::BucketKey;
use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};

pub const ONE_HOUR_MS: i64 = 60 * 60 * 1000;
pub const HALF_DAY_MS: i64 = 12 * ONE_HOUR_MS;

const SHORT_WEEKDAYS: [&str; 7] = ["ma", "di", "wo", "do", "vr", "za", "zo"];
const SHORT_MONTHS: [&str; 12] = [
    "jan", "feb", "mrt", "apr", "mei", "jun", "jul", "aug", "sep", "okt", "nov", "dec",
];
const FULL_MONTHS: [&str; 12] = [
    "januari",
    "februari",
    "maart",
    "april",
    "mei",
    "juni",
    "juli",
    "augustus",
    "september",
    "oktober",
    "november",
    "december",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// Hours of one day, keyed by hour index 0-23.
    Hour,
    /// Days of one month, keyed by the day's epoch millis.
    Day,
    /// Months of one year, keyed by month index 1-12.
    Month,
}

/// Everything that differs between the per-period energy charts.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodProfile {
    pub key_field: &'static str,
    pub axis_type: AxisType,
    pub tick_format: Option<&'static str>,
    pub padding: Padding,
    pub empty_padding: Padding,
}

impl Period {
    pub fn code(&self) -> &'static str {
        match self {
            Period::Hour => "uur",
            Period::Day => "dag",
            Period::Month => "maand",
        }
    }

    pub fn profile(&self) -> PeriodProfile {
        match self {
            Period::Hour => PeriodProfile {
                key_field: "uur",
                axis_type: AxisType::Category,
                tick_format: None,
                padding: Padding::new(10, 45, 55, 20),
                empty_padding: Padding::new(10, 20, 50, 20),
            },
            Period::Day => PeriodProfile {
                key_field: "dt",
                axis_type: AxisType::Timeseries,
                tick_format: Some("%a %d"),
                padding: Padding::new(10, 20, 50, 20),
                empty_padding: Padding::new(10, 20, 55, 20),
            },
            Period::Month => PeriodProfile {
                key_field: "maand",
                axis_type: AxisType::Indexed,
                tick_format: None,
                padding: Padding::new(10, 10, 50, 20),
                empty_padding: Padding::new(10, 10, 50, 20),
            },
        }
    }

    /// Human readable label of a bucket, used for table rows and category
    /// axis ticks.
    pub fn label<Tz: TimeZone>(&self, key: BucketKey, tz: &Tz) -> String {
        match self {
            Period::Hour => hour_period_label(key),
            Period::Day => match tz.timestamp_millis_opt(key).earliest() {
                Some(day) => format!(
                    "{:02}-{:02} ({})",
                    day.day(),
                    day.month(),
                    SHORT_WEEKDAYS[day.weekday().num_days_from_monday() as usize]
                ),
                None => key.to_string(),
            },
            Period::Month => full_month_name(key).unwrap_or_default().to_string(),
        }
    }
}

pub fn hour_period_label(hour: BucketKey) -> String {
    format!("{:02}:00 - {:02}:00", hour, hour + 1)
}

/// Local `HH:MM` of an epoch-millis key.
pub fn time_of_day_label<Tz: TimeZone>(key: BucketKey, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    tz.timestamp_millis_opt(key)
        .earliest()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// `vr 01-03-2024`
pub fn weekday_date_label(date: NaiveDate) -> String {
    format!(
        "{} {}",
        SHORT_WEEKDAYS[date.weekday().num_days_from_monday() as usize],
        date.format("%d-%m-%Y")
    )
}

pub fn short_month_name(month: BucketKey) -> Option<&'static str> {
    usize::try_from(month - 1)
        .ok()
        .and_then(|i| SHORT_MONTHS.get(i).copied())
}

pub fn full_month_name(month: BucketKey) -> Option<&'static str> {
    usize::try_from(month - 1)
        .ok()
        .and_then(|i| FULL_MONTHS.get(i).copied())
}

/// One tick per hour from `from` up to and including `to`.
pub fn hourly_ticks<Tz: TimeZone>(from: &DateTime<Tz>, to: &DateTime<Tz>) -> Vec<i64> {
    let from_ms = from.timestamp_millis();
    let hours = (to.timestamp_millis() - from_ms) / ONE_HOUR_MS;
    (0..=hours).map(|i| from_ms + i * ONE_HOUR_MS).collect()
}

/// One tick per calendar day of the month that `month_start` falls in, at
/// local midnight.
pub fn daily_ticks<Tz: TimeZone>(month_start: &DateTime<Tz>) -> Vec<i64> {
    let tz = month_start.timezone();
    let first = month_start.date_naive().with_day(1).unwrap_or(month_start.date_naive());

    (0..days_in_month(first.year(), first.month()))
        .filter_map(|offset| first.checked_add_days(Days::new(offset as u64)))
        .filter_map(|day| start_of_day(day, &tz))
        .map(|midnight| midnight.timestamp_millis())
        .collect()
}

pub fn monthly_ticks() -> Vec<i64> {
    (1..=12).collect()
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

pub fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).earliest()
}

/// Local midnight of the day after `date`.
pub fn end_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Tz>> {
    start_of_day(date.checked_add_days(Days::new(1))?, tz)
}

/// First and last millisecond of the month containing `date`.
pub fn month_bounds<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<(i64, i64)> {
    let first = date.with_day(1)?;
    let last = first.checked_add_days(Days::new(days_in_month(first.year(), first.month()) as u64 - 1))?;
    let from = start_of_day(first, tz)?.timestamp_millis();
    let to = end_of_day(last, tz)?.timestamp_millis() - 1;
    Some((from, to))
}
