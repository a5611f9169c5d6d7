// Settings and energy contract resources, with their client-side validation
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const AUTHENTICATIETOKEN_MAX_LENGTH: usize = 255;
pub const LEVERANCIER_MAX_LENGTH: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} mag maximaal {max} tekens bevatten")]
    TooLong { field: &'static str, max: usize },
    #[error("{0} is verplicht")]
    Required(&'static str),
    #[error("{0} mag niet negatief zijn")]
    Negative(&'static str),
}

/// Upload settings for MinderGas.nl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MindergasnlSettings {
    pub automatisch_uploaden: bool,
    #[serde(default)]
    pub authenticatietoken: Option<String>,
}

impl MindergasnlSettings {
    /// The token is required as soon as automatic uploading is switched on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let token = self.authenticatietoken.as_deref().unwrap_or("");

        if token.chars().count() > AUTHENTICATIETOKEN_MAX_LENGTH {
            return Err(ValidationError::TooLong {
                field: "authenticatietoken",
                max: AUTHENTICATIETOKEN_MAX_LENGTH,
            });
        }
        if self.automatisch_uploaden && token.trim().is_empty() {
            return Err(ValidationError::Required("authenticatietoken"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyContract {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub valid_from: NaiveDate,
    /// Derived by the backend from the next contract's start date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,
    pub stroom_per_kwh_normaal_tarief: f64,
    pub stroom_per_kwh_dal_tarief: f64,
    pub gas_per_kuub: f64,
    #[serde(default)]
    pub leverancier: String,
}

impl EnergyContract {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.leverancier.chars().count() > LEVERANCIER_MAX_LENGTH {
            return Err(ValidationError::TooLong {
                field: "leverancier",
                max: LEVERANCIER_MAX_LENGTH,
            });
        }
        let prices = [
            ("stroomPerKwhNormaalTarief", self.stroom_per_kwh_normaal_tarief),
            ("stroomPerKwhDalTarief", self.stroom_per_kwh_dal_tarief),
            ("gasPerKuub", self.gas_per_kuub),
        ];
        for (field, price) in prices {
            if price < 0.0 {
                return Err(ValidationError::Negative(field));
            }
        }
        Ok(())
    }

    /// Payload sent to the backend; `validTo` is never written back.
    pub fn for_backend(&self) -> Self {
        Self {
            valid_to: None,
            ..self.clone()
        }
    }
}
