// Series reshaper - merges per-category sample streams into chart rows
use crate::domain::energy::Subtype;
use crate::domain::sample::{BucketKey, MergedRow, Sample};
use chrono::{NaiveDate, TimeZone, Timelike};
use std::collections::HashMap;

/// How the fields of a sample stream map onto merged-row columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Columns {
    /// `{stream}-{subtype}` per subtype, read from the subtype's field.
    PerSubtype(Vec<Subtype>),
    /// A single `{stream}` column, read from one field.
    Single(String),
}

/// Samples of one selected category (or date), sorted by bucket key.
#[derive(Debug, Clone)]
pub struct SampleStream<'a> {
    pub name: String,
    pub samples: &'a [Sample],
}

impl<'a> SampleStream<'a> {
    pub fn new(name: impl Into<String>, samples: &'a [Sample]) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }
}

/// Rows come out in first-seen key order across the streams, in the order
/// the streams are given. A key missing from one stream leaves that stream's
/// columns unset.
pub fn reshape(key_field: &'static str, streams: &[SampleStream<'_>], columns: &Columns) -> Vec<MergedRow> {
    let mut rows: Vec<MergedRow> = Vec::new();
    let mut positions: HashMap<BucketKey, usize> = HashMap::new();

    for stream in streams {
        for sample in stream.samples {
            let position = *positions.entry(sample.key).or_insert_with(|| {
                rows.push(MergedRow::new(key_field, sample.key));
                rows.len() - 1
            });
            let row = &mut rows[position];

            match columns {
                Columns::PerSubtype(subtypes) => {
                    for subtype in subtypes {
                        if let Some(value) = sample.value(subtype.code()) {
                            row.set(&format!("{}-{}", stream.name, subtype.code()), value);
                        }
                    }
                }
                Columns::Single(field) => {
                    if let Some(value) = sample.value(field) {
                        row.set(&stream.name, value);
                    }
                }
            }
        }
    }

    rows
}

/// Moves every sample onto `date`, keeping its local time of day (seconds
/// dropped), so readings from different days share one time axis.
pub fn project_onto_date<Tz: TimeZone>(samples: &[Sample], tz: &Tz, date: NaiveDate) -> Vec<Sample> {
    samples
        .iter()
        .filter_map(|sample| {
            let local = tz.timestamp_millis_opt(sample.key).earliest()?;
            let time = local.time().with_second(0)?.with_nanosecond(0)?;
            let projected = tz.from_local_datetime(&date.and_time(time)).earliest()?;
            Some(Sample {
                key: projected.timestamp_millis(),
                ..sample.clone()
            })
        })
        .collect()
}
