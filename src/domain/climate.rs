// Climate sensor readings
use crate::domain::format::ValueFormat;
use crate::domain::statistics::SignalFilter;
use chrono::NaiveDate;
use std::str::FromStr;

pub const CLIMATE_KEY_FIELD: &str = "datumtijd";

/// Day onto which readings of several dates are projected so their time of day
/// lines up on one axis.
pub fn model_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 1, 1).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimateSensor {
    Temperatuur,
    Luchtvochtigheid,
}

impl ClimateSensor {
    pub fn field(&self) -> &'static str {
        match self {
            ClimateSensor::Temperatuur => "temperatuur",
            ClimateSensor::Luchtvochtigheid => "luchtvochtigheid",
        }
    }

    pub fn value_format(&self) -> ValueFormat {
        match self {
            ClimateSensor::Temperatuur => ValueFormat::plain(2).with_suffix("\u{2103}"),
            ClimateSensor::Luchtvochtigheid => ValueFormat::plain(1).with_suffix("%"),
        }
    }

    /// Temperatures at or below zero are real readings; a humidity of zero
    /// is a sensor without signal.
    pub fn signal_filter(&self) -> SignalFilter {
        match self {
            ClimateSensor::Temperatuur => SignalFilter::Finite,
            ClimateSensor::Luchtvochtigheid => SignalFilter::Positive,
        }
    }
}

impl FromStr for ClimateSensor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "temperatuur" => Ok(ClimateSensor::Temperatuur),
            "luchtvochtigheid" => Ok(ClimateSensor::Luchtvochtigheid),
            other => Err(format!("onbekende sensorwaarde: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_formats() {
        assert_eq!(ClimateSensor::Temperatuur.value_format().format(21.4567), "21,46\u{2103}");
        assert_eq!(ClimateSensor::Luchtvochtigheid.value_format().format(55.26), "55,3%");
        assert_eq!("Temperatuur".parse(), Ok(ClimateSensor::Temperatuur));
    }
}
