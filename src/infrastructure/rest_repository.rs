// Home server REST repository implementation
use crate::application::home_server_repository::HomeServerRepository;
use crate::domain::dashboard::{ClimateReading, MeterReading};
use crate::domain::energy::Category;
use crate::domain::sample::Sample;
use crate::domain::settings::{EnergyContract, MindergasnlSettings};
use crate::infrastructure::config::{BackendSettings, expand_path};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

const USAGE_PER_HOUR: &str = "/api/{category}/verbruik-per-uur-op-dag/{dag}";
const USAGE_PER_DAY: &str = "/api/{category}/verbruik-per-dag/{van}/{totEnMet}";
const ELECTRICITY_PER_MONTH: &str = "/api/elektriciteit/verbruikPerMaandInJaar/{jaar}";
const POWER_DRAW: &str = "/api/opgenomen-vermogen/history/{van}/{tot}";
const CLIMATE_HISTORY: &str = "/api/klimaat/history/{van}/{tot}";
const LATEST_METER_READING: &str = "/api/meterstanden/meest-recente";
const OLDEST_METER_READING_OF_TODAY: &str = "/api/meterstanden/oudste-vandaag";
const LATEST_CLIMATE_READING: &str = "/api/klimaat/meest-recente";
const MINDERGASNL: &str = "/api/mindergasnl";
const ENERGY_CONTRACTS: &str = "/api/energiecontract";
const ENERGY_CONTRACT: &str = "/api/energiecontract/{id}";

#[derive(Debug, Clone)]
pub struct RestRepository {
    base_url: String,
    client: reqwest::Client,
}

impl RestRepository {
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, template: &str, vars: &[(&str, String)]) -> String {
        let vars: HashMap<&str, String> = vars.iter().cloned().collect();
        format!("{}{}", self.base_url, expand_path(template, &vars))
    }

    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<String> {
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url)
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} {} failed with status {}: {}", method, url, status, body);
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response of {}", url))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.send(Method::GET, url, None).await?;
        serde_json::from_str(&body).with_context(|| format!("Failed to parse response of {}", url))
    }

    /// An empty body means "nothing there yet".
    async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let body = self.send(Method::GET, url, None).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body).with_context(|| format!("Failed to parse response of {}", url))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, url: &str, payload: &B) -> Result<T> {
        let payload = serde_json::to_value(payload).context("Failed to serialize request body")?;
        let body = self.send(Method::POST, url, Some(&payload)).await?;
        serde_json::from_str(&body).with_context(|| format!("Failed to parse response of {}", url))
    }

    async fn get_samples(&self, url: &str, key_field: &str, tag_field: Option<&str>) -> Result<Vec<Sample>> {
        let rows: Vec<Value> = self.get_json(url).await?;
        Ok(parse_samples(&rows, key_field, tag_field))
    }
}

/// Parses backend rows leniently, skipping rows without a usable key.
fn parse_samples(rows: &[Value], key_field: &str, tag_field: Option<&str>) -> Vec<Sample> {
    let samples: Vec<Sample> = rows
        .iter()
        .filter_map(|row| Sample::from_json(row, key_field, tag_field))
        .collect();

    if samples.len() < rows.len() {
        tracing::debug!(
            "Skipped {} rows without a usable '{}'",
            rows.len() - samples.len(),
            key_field
        );
    }
    samples
}

#[async_trait]
impl HomeServerRepository for RestRepository {
    async fn usage_per_hour(&self, category: Category, day_start_ms: i64) -> Result<Vec<Sample>> {
        let url = self.url(
            USAGE_PER_HOUR,
            &[
                ("category", category.code().to_string()),
                ("dag", day_start_ms.to_string()),
            ],
        );
        self.get_samples(&url, "uur", None).await
    }

    async fn usage_per_day(&self, category: Category, from_ms: i64, to_ms: i64) -> Result<Vec<Sample>> {
        let url = self.url(
            USAGE_PER_DAY,
            &[
                ("category", category.code().to_string()),
                ("van", from_ms.to_string()),
                ("totEnMet", to_ms.to_string()),
            ],
        );
        self.get_samples(&url, "dt", None).await
    }

    async fn electricity_per_month(&self, year: i32) -> Result<Vec<Sample>> {
        let url = self.url(ELECTRICITY_PER_MONTH, &[("jaar", year.to_string())]);
        let samples = self.get_samples(&url, "maand", None).await?;
        Ok(samples
            .into_iter()
            .map(|s| s.rename("kWh", "verbruik").rename("euro", "kosten"))
            .collect())
    }

    async fn power_draw(&self, from_ms: i64, to_ms: i64, sub_period_ms: i64) -> Result<Vec<Sample>> {
        let url = format!(
            "{}?subPeriodLength={}",
            self.url(POWER_DRAW, &[("van", from_ms.to_string()), ("tot", to_ms.to_string())]),
            sub_period_ms
        );
        self.get_samples(&url, "datumtijd", Some("tariefIndicator")).await
    }

    async fn climate_history(&self, from_ms: i64, to_ms: i64) -> Result<Vec<Sample>> {
        let url = self.url(
            CLIMATE_HISTORY,
            &[("van", from_ms.to_string()), ("tot", to_ms.to_string())],
        );
        self.get_samples(&url, "datumtijd", None).await
    }

    async fn latest_meter_reading(&self) -> Result<Option<MeterReading>> {
        self.get_optional(&self.url(LATEST_METER_READING, &[])).await
    }

    async fn oldest_meter_reading_of_today(&self) -> Result<Option<MeterReading>> {
        self.get_optional(&self.url(OLDEST_METER_READING_OF_TODAY, &[])).await
    }

    async fn latest_climate_reading(&self) -> Result<Option<ClimateReading>> {
        self.get_optional(&self.url(LATEST_CLIMATE_READING, &[])).await
    }

    async fn mindergasnl_settings(&self) -> Result<MindergasnlSettings> {
        let settings: Option<MindergasnlSettings> = self.get_optional(&self.url(MINDERGASNL, &[])).await?;
        Ok(settings.unwrap_or_default())
    }

    async fn save_mindergasnl_settings(&self, settings: &MindergasnlSettings) -> Result<MindergasnlSettings> {
        self.post_json(&self.url(MINDERGASNL, &[]), settings).await
    }

    async fn energy_contracts(&self) -> Result<Vec<EnergyContract>> {
        self.get_json(&self.url(ENERGY_CONTRACTS, &[])).await
    }

    async fn save_energy_contract(&self, contract: &EnergyContract) -> Result<EnergyContract> {
        self.post_json(&self.url(ENERGY_CONTRACTS, &[]), contract).await
    }

    async fn delete_energy_contract(&self, id: i64) -> Result<()> {
        let url = self.url(ENERGY_CONTRACT, &[("id", id.to_string())]);
        self.send(Method::DELETE, &url, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repository() -> RestRepository {
        RestRepository::new(&BackendSettings {
            base_url: "http://homeserver:8080/".to_string(),
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_url_building() {
        let url = repository().url(
            USAGE_PER_DAY,
            &[
                ("category", "gas".to_string()),
                ("van", "1".to_string()),
                ("totEnMet", "2".to_string()),
            ],
        );
        assert_eq!(url, "http://homeserver:8080/api/gas/verbruik-per-dag/1/2");
    }

    #[test]
    fn test_parse_power_draw_rows() {
        let rows = vec![
            json!({"datumtijd": 1000, "watt": 120, "tariefIndicator": "NORMAAL"}),
            json!({"datumtijd": "2024-03-01T10:00:00+01:00", "watt": null, "tariefIndicator": "DAL"}),
            json!({"watt": 50}),
        ];

        let samples = parse_samples(&rows, "datumtijd", Some("tariefIndicator"));

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].tag.as_deref(), Some("normaal"));
        assert_eq!(samples[0].value("watt"), Some(120.0));
        assert_eq!(samples[1].key, 1_709_283_600_000);
        assert_eq!(samples[1].value("watt"), None);
    }

    #[test]
    fn test_parse_monthly_rows() {
        let rows = vec![json!({"maand": 3, "kWh": 250.5, "euro": 55.1})];

        let samples: Vec<Sample> = parse_samples(&rows, "maand", None)
            .into_iter()
            .map(|s| s.rename("kWh", "verbruik").rename("euro", "kosten"))
            .collect();

        assert_eq!(samples[0].key, 3);
        assert_eq!(samples[0].value("verbruik"), Some(250.5));
        assert_eq!(samples[0].value("kosten"), Some(55.1));
        assert_eq!(samples[0].value("kWh"), None);
    }
}
