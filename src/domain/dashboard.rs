// Live dashboard domain model
use crate::domain::sample::deserialize_timestamp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const LED_COUNT: usize = 10;
pub const LED_STEP_WATT: f64 = 150.0;
/// Meter readings older than this are not shown as "current".
pub const MAX_READING_AGE_MS: i64 = 60_000;

/// Most recent smart meter reading, as pushed on the meter topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterReading {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub datumtijd: i64,
    #[serde(default)]
    pub stroom_tarief1: Option<f64>,
    #[serde(default)]
    pub stroom_tarief2: Option<f64>,
    #[serde(default)]
    pub gas: Option<f64>,
    #[serde(default)]
    pub stroom_opgenomen_vermogen_in_watt: Option<f64>,
}

/// Most recent climate sensor reading, as pushed on the climate topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateReading {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub datumtijd: i64,
    #[serde(default)]
    pub temperatuur: Option<f64>,
    #[serde(default)]
    pub luchtvochtigheid: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterUpdate {
    Applied,
    Missing,
    TooOld,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LiveDashboard {
    pub last_update: Option<i64>,
    pub huidig_opgenomen_vermogen: Option<f64>,
    pub t1: Option<f64>,
    pub t2: Option<f64>,
    pub meterstand_gas: Option<f64>,
    pub gas_verbruik_vandaag: Option<f64>,
    pub huidige_temperatuur: Option<f64>,
    pub stroom_leds: [bool; LED_COUNT],
    pub show_no_connection_alert: bool,
    #[serde(skip)]
    oudste_gas_van_vandaag: Option<f64>,
    /// Day the oldest reading belongs to.
    #[serde(skip)]
    oudste_dag: Option<NaiveDate>,
}

impl LiveDashboard {
    pub fn apply_meter_reading(&mut self, reading: Option<&MeterReading>, now_ms: i64) -> MeterUpdate {
        let outcome = match reading {
            None => {
                self.clear_meter_data();
                MeterUpdate::Missing
            }
            Some(r) if r.datumtijd < now_ms - MAX_READING_AGE_MS => {
                self.clear_meter_data();
                MeterUpdate::TooOld
            }
            Some(r) => {
                self.last_update = Some(r.datumtijd);
                self.t1 = r.stroom_tarief1;
                self.t2 = r.stroom_tarief2;
                self.meterstand_gas = r.gas;
                self.huidig_opgenomen_vermogen = r.stroom_opgenomen_vermogen_in_watt;
                self.stroom_leds = leds_for(r.stroom_opgenomen_vermogen_in_watt);
                self.update_gas_used_today();
                MeterUpdate::Applied
            }
        };
        self.check_liveness(now_ms);
        outcome
    }

    pub fn apply_climate_reading(&mut self, reading: Option<&ClimateReading>) {
        if let Some(r) = reading {
            self.huidige_temperatuur = r.temperatuur;
        }
    }

    pub fn set_oldest_reading_of_today(&mut self, reading: &MeterReading, today: NaiveDate) {
        self.oudste_gas_van_vandaag = reading.gas;
        self.oudste_dag = Some(today);
        self.update_gas_used_today();
    }

    /// True when no oldest reading is held for `today`. An oldest reading of
    /// an earlier day is dropped together with the gas used today.
    pub fn needs_oldest_reading(&mut self, today: NaiveDate) -> bool {
        if self.oudste_dag.is_some_and(|day| day != today) {
            self.oudste_gas_van_vandaag = None;
            self.oudste_dag = None;
            self.gas_verbruik_vandaag = None;
        }
        self.oudste_dag.is_none()
    }

    /// Raises the no-connection alert and clears meter data when no fresh
    /// reading has been received. Returns whether the dashboard is live.
    pub fn check_liveness(&mut self, now_ms: i64) -> bool {
        let live = self
            .last_update
            .is_some_and(|t| t >= now_ms - MAX_READING_AGE_MS);
        if !live {
            self.clear_meter_data();
        }
        self.show_no_connection_alert = !live;
        live
    }

    pub fn clear_meter_data(&mut self) {
        self.last_update = None;
        self.huidig_opgenomen_vermogen = None;
        self.t1 = None;
        self.t2 = None;
        self.meterstand_gas = None;
        self.gas_verbruik_vandaag = None;
        self.oudste_gas_van_vandaag = None;
        self.oudste_dag = None;
        self.stroom_leds = [false; LED_COUNT];
    }

    pub fn clear_climate_data(&mut self) {
        self.huidige_temperatuur = None;
    }

    fn update_gas_used_today(&mut self) {
        if let (Some(current), Some(oldest)) = (self.meterstand_gas, self.oudste_gas_van_vandaag) {
            self.gas_verbruik_vandaag = Some(current - oldest);
        }
    }
}

/// LED 0 lights for any draw; LED n from n * 150 W.
fn leds_for(watt: Option<f64>) -> [bool; LED_COUNT] {
    let watt = watt.unwrap_or(0.0);
    let mut leds = [false; LED_COUNT];
    for (i, led) in leds.iter_mut().enumerate() {
        *led = if i == 0 {
            watt > 0.0
        } else {
            watt >= i as f64 * LED_STEP_WATT
        };
    }
    leds
}
