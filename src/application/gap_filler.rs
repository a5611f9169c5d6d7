// Gap-filler for power draw series - splits area series at tariff switches
use crate::domain::sample::{MergedRow, Sample};

pub const POWER_KEY_FIELD: &str = "datumtijd";
pub const WATT_FIELD: &str = "watt";

pub fn tariff_column(tariff: &str) -> String {
    format!("{}-{}", WATT_FIELD, tariff)
}

/// Turns power draw samples into rows with one `watt-{tariff}` column per
/// tariff. Where two consecutive samples have different tariffs, a row is
/// inserted 1 ms before the second sample that carries its value in the
/// previous tariff's column, so the area chart steps at the switch instead of
/// sloping across it.
pub fn fill_tariff_gaps(samples: &[Sample]) -> Vec<MergedRow> {
    let mut rows = Vec::with_capacity(samples.len());
    let mut previous_tariff: Option<&str> = None;

    for sample in samples {
        let tariff = sample.tag.as_deref();
        let watt = sample.value(WATT_FIELD);

        if let (Some(previous), Some(current)) = (previous_tariff, tariff) {
            if previous != current {
                let mut boundary = MergedRow::new(POWER_KEY_FIELD, sample.key - 1);
                if let Some(watt) = watt {
                    boundary.set(&tariff_column(previous), watt);
                }
                rows.push(boundary);
            }
        }

        rows.push(tariff_row(sample));
        previous_tariff = tariff;
    }

    rows
}

/// One row per sample without boundary rows, for tabular display.
pub fn tariff_rows(samples: &[Sample]) -> Vec<MergedRow> {
    samples.iter().map(tariff_row).collect()
}

fn tariff_row(sample: &Sample) -> MergedRow {
    let mut row = MergedRow::new(POWER_KEY_FIELD, sample.key);
    if let (Some(tariff), Some(watt)) = (sample.tag.as_deref(), sample.value(WATT_FIELD)) {
        row.set(&tariff_column(tariff), watt);
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn power(key: i64, tariff: &str, watt: f64) -> Sample {
        Sample::new(key).with_value(WATT_FIELD, watt).with_tag(tariff)
    }

    #[test]
    fn test_boundary_row_at_tariff_switch() {
        let samples = vec![power(100, "normaal", 50.0), power(200, "dal", 80.0)];

        let rows = fill_tariff_gaps(&samples);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], MergedRow::new(POWER_KEY_FIELD, 100).with_field("watt-normaal", 50.0));
        assert_eq!(rows[1], MergedRow::new(POWER_KEY_FIELD, 199).with_field("watt-normaal", 80.0));
        assert_eq!(rows[2], MergedRow::new(POWER_KEY_FIELD, 200).with_field("watt-dal", 80.0));
    }

    #[test]
    fn test_constant_tariff_inserts_nothing() {
        let samples = vec![
            power(100, "dal", 50.0),
            power(200, "dal", 60.0),
            power(300, "dal", 70.0),
        ];

        assert_eq!(fill_tariff_gaps(&samples).len(), samples.len());
    }

    #[test]
    fn test_untagged_sample_breaks_the_pair() {
        let samples = vec![
            power(100, "normaal", 50.0),
            Sample::new(200).with_value(WATT_FIELD, 60.0),
            power(300, "dal", 70.0),
        ];

        let rows = fill_tariff_gaps(&samples);

        assert_eq!(rows.len(), 3);
        assert!(rows[1].fields.is_empty());
    }

    #[test]
    fn test_first_sample_has_no_boundary() {
        let rows = fill_tariff_gaps(&[power(100, "normaal", 50.0)]);
        assert_eq!(rows.len(), 1);
        assert!(fill_tariff_gaps(&[]).is_empty());
    }

    #[test]
    fn test_tariff_rows_keep_only_real_readings() {
        let samples = vec![power(100, "normaal", 50.0), power(200, "dal", 80.0)];

        let rows = tariff_rows(&samples);

        assert_eq!(
            rows,
            vec![
                MergedRow::new(POWER_KEY_FIELD, 100).with_field("watt-normaal", 50.0),
                MergedRow::new(POWER_KEY_FIELD, 200).with_field("watt-dal", 80.0),
            ]
        );
    }
}
