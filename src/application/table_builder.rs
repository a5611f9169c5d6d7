// Table builder - tabular rendering of the same merged rows as the charts
use crate::domain::chart::TableData;
use crate::domain::energy::{Category, Subtype};
use crate::domain::format::{PLACEHOLDER, ValueFormat, energy_format};
use crate::domain::sample::MergedRow;

const TOTAL_COLUMN: &str = "Totaal";

/// One row per bucket, one column per selected category and a `Totaal`
/// column when more than one category is selected. Absent values are left
/// blank.
pub fn energy_table<F>(rows: &[MergedRow], subtype: Subtype, categories: &[Category], label: F) -> TableData
where
    F: Fn(&MergedRow) -> String,
{
    let Some(first) = categories.first() else {
        return TableData::default();
    };
    let format = energy_format(subtype, *first);
    let with_total = categories.len() > 1;

    let mut cols = vec![String::new()];
    cols.extend(categories.iter().map(|c| c.display_name().to_string()));
    if with_total {
        cols.push(TOTAL_COLUMN.to_string());
    }

    let rows = rows
        .iter()
        .map(|row| {
            let mut cells = vec![label(row)];
            let mut total: Option<f64> = None;
            for category in categories {
                let value = row.get(&subtype.column(*category));
                if let Some(v) = value {
                    total = Some(total.unwrap_or(0.0) + v);
                }
                cells.push(format.format_or(value, ""));
            }
            if with_total {
                cells.push(format.format_or(total, ""));
            }
            cells
        })
        .collect();

    TableData { cols, rows }
}

/// A label column followed by one column per series.
pub fn series_table<F>(
    rows: &[MergedRow],
    label_header: &str,
    series: &[(String, String)],
    format: &ValueFormat,
    label: F,
) -> TableData
where
    F: Fn(&MergedRow) -> String,
{
    let mut cols = vec![label_header.to_string()];
    cols.extend(series.iter().map(|(_, header)| header.clone()));

    let rows = rows
        .iter()
        .map(|row| {
            let mut cells = vec![label(row)];
            cells.extend(
                series
                    .iter()
                    .map(|(column, _)| format.format_or(row.get(column), PLACEHOLDER)),
            );
            cells
        })
        .collect();

    TableData { cols, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::period::hour_period_label;

    fn hour_label(row: &MergedRow) -> String {
        hour_period_label(row.key)
    }

    #[test]
    fn test_total_column_for_multiple_categories() {
        let rows = vec![
            MergedRow::new("uur", 0)
                .with_field("stroom-kosten", 0.25)
                .with_field("gas-kosten", 0.5),
            MergedRow::new("uur", 1).with_field("stroom-kosten", 0.126),
        ];

        let table = energy_table(&rows, Subtype::Kosten, &[Category::Stroom, Category::Gas], hour_label);

        assert_eq!(table.cols, vec!["", "Stroom", "Gas", "Totaal"]);
        assert_eq!(table.rows[0], vec!["00:00 - 01:00", "\u{20AC} 0,25", "\u{20AC} 0,50", "\u{20AC} 0,75"]);
        assert_eq!(table.rows[1][2], "");
        assert_eq!(table.rows[1][3], "\u{20AC} 0,13");
    }

    #[test]
    fn test_single_category_has_no_total() {
        let rows = vec![MergedRow::new("uur", 5).with_field("gas-verbruik", 1.5)];

        let table = energy_table(&rows, Subtype::Verbruik, &[Category::Gas], hour_label);

        assert_eq!(table.cols, vec!["", "Gas"]);
        assert_eq!(table.rows, vec![vec!["05:00 - 06:00".to_string(), "1,500 m\u{00B3}".to_string()]]);
    }

    #[test]
    fn test_no_categories_gives_empty_table() {
        let rows = vec![MergedRow::new("uur", 5)];
        assert_eq!(energy_table(&rows, Subtype::Verbruik, &[], hour_label), TableData::default());
    }

    #[test]
    fn test_series_table_placeholders() {
        let rows = vec![MergedRow::new("datumtijd", 0).with_field("a", 20.0)];
        let series = vec![
            ("a".to_string(), "ma 01-01-2024".to_string()),
            ("b".to_string(), "di 02-01-2024".to_string()),
        ];

        let table = series_table(&rows, "Tijdstip", &series, &ValueFormat::plain(1), |_| "00:00".to_string());

        assert_eq!(table.cols, vec!["Tijdstip", "ma 01-01-2024", "di 02-01-2024"]);
        assert_eq!(table.rows[0], vec!["00:00", "20,0", "-"]);
    }
}
