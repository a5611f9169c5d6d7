// Value formatting for axes, tooltips and tables (nl-NL: decimal comma)
use crate::domain::energy::{Category, Subtype};
use serde::Serialize;

pub const PLACEHOLDER: &str = "-";

/// Declarative number format. Serialized into the chart configuration so the
/// chart library can apply it to every rendered point; `format` applies the
/// same rules on this side for tables and labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueFormat {
    pub decimals: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    pub decimal_separator: char,
}

impl ValueFormat {
    pub fn plain(decimals: usize) -> Self {
        Self {
            decimals,
            prefix: None,
            suffix: None,
            decimal_separator: ',',
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = Some(suffix.to_string());
        self
    }

    /// Same number format without prefix or suffix (y axis ticks).
    pub fn without_unit(&self) -> Self {
        Self::plain(self.decimals)
    }

    pub fn format(&self, value: f64) -> String {
        let number = format!("{:.*}", self.decimals, value);
        let number = if self.decimal_separator == '.' {
            number
        } else {
            number.replace('.', &self.decimal_separator.to_string())
        };
        format!(
            "{}{}{}",
            self.prefix.as_deref().unwrap_or(""),
            number,
            self.suffix.as_deref().unwrap_or("")
        )
    }

    /// Absent and non-finite values render as `placeholder`.
    pub fn format_or(&self, value: Option<f64>, placeholder: &str) -> String {
        match value {
            Some(v) if v.is_finite() => self.format(v),
            _ => placeholder.to_string(),
        }
    }
}

/// Consumption: three decimals and the category's unit; cost: euro sign and
/// two decimals.
pub fn energy_format(subtype: Subtype, category: Category) -> ValueFormat {
    match subtype {
        Subtype::Verbruik => {
            ValueFormat::plain(3).with_suffix(&format!(" {}", category.unit_label()))
        }
        Subtype::Kosten => ValueFormat::plain(2).with_prefix("\u{20AC} "),
    }
}

pub fn watt_format() -> ValueFormat {
    ValueFormat::plain(0)
}
