//! Bulk workout import from CSV exports.
//!
//! Headers are matched by name, so column order is free and unknown columns
//! are ignored. Numeric cells that do not parse are treated as absent. A row
//! is skipped, not fatal, when its type or date cannot be read or when the
//! resulting workout fails validation.

use crate::models::{
    parse_range_bound, NewWorkout, OwnerId, RangeEdge, WorkoutCategory, WorkoutRecord,
};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvRow {
    #[serde(rename = "type")]
    category: Option<String>,
    date: Option<String>,
    duration: Option<String>,
    distance: Option<String>,
    calories: Option<String>,
    #[serde(alias = "avgHR")]
    average_heart_rate: Option<String>,
    #[serde(alias = "maxHR")]
    max_heart_rate: Option<String>,
    pace: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Default)]
pub struct CsvImport {
    pub workouts: Vec<WorkoutRecord>,
    pub skipped: usize,
}

/// Turns an uploaded CSV into workout records for `owner`. Rows without a
/// date are logged at `now`.
pub fn workouts_from_csv(owner: OwnerId, bytes: &[u8], now: DateTime<Utc>) -> CsvImport {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(bytes);
    let headers: csv::StringRecord = match reader.headers() {
        Ok(headers) => headers.iter().map(canonical_header).collect(),
        Err(err) => {
            debug!("unreadable csv header: {err}");
            return CsvImport::default();
        }
    };
    reader.set_headers(headers);

    let mut import = CsvImport::default();
    for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
        let record = row
            .map_err(|err| err.to_string())
            .and_then(|row| to_workout(owner, row, now));
        match record {
            Ok(record) => import.workouts.push(record),
            Err(reason) => {
                debug!(row = line + 1, "skipping csv row: {reason}");
                import.skipped += 1;
            }
        }
    }
    import
}

/// Header cells in the shapes common exporters use.
fn canonical_header(raw: &str) -> String {
    match raw.trim() {
        "averageHeartRate" | "avgHeartRate" => "average_heart_rate".into(),
        "maxHeartRate" => "max_heart_rate".into(),
        other => other.to_string(),
    }
}

fn to_workout(
    owner: OwnerId,
    row: CsvRow,
    now: DateTime<Utc>,
) -> std::result::Result<WorkoutRecord, String> {
    let category = match present(row.category) {
        None => WorkoutCategory::Run,
        Some(raw) => parse_category(&raw).ok_or_else(|| format!("unknown type `{raw}`"))?,
    };
    let occurred_at = match present(row.date) {
        None => now,
        Some(raw) => parse_range_bound(&raw, RangeEdge::Start)
            .ok_or_else(|| format!("unreadable date `{raw}`"))?,
    };

    let mut input = NewWorkout::new(category, number(row.duration).unwrap_or(0.0));
    input.occurred_at = Some(occurred_at);
    input.distance_km = number(row.distance);
    input.calories_burned = number(row.calories);
    input.avg_heart_rate = heart_rate(row.average_heart_rate);
    input.max_heart_rate = heart_rate(row.max_heart_rate);
    input.pace_min_per_km = number(row.pace).filter(|pace| *pace > 0.0);
    input.notes = present(row.notes);

    WorkoutRecord::create(owner, input, now).map_err(|err| err.to_string())
}

fn present(cell: Option<String>) -> Option<String> {
    cell.filter(|value| !value.is_empty())
}

fn number(cell: Option<String>) -> Option<f64> {
    present(cell)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

fn heart_rate(cell: Option<String>) -> Option<u32> {
    number(cell)
        .filter(|bpm| *bpm >= 1.0 && *bpm <= f64::from(u16::MAX))
        .map(|bpm| bpm.round() as u32)
}

fn parse_category(raw: &str) -> Option<WorkoutCategory> {
    let category = match raw.to_lowercase().as_str() {
        "run" => WorkoutCategory::Run,
        "lift" => WorkoutCategory::Lift,
        "cycle" => WorkoutCategory::Cycle,
        "swim" => WorkoutCategory::Swim,
        "crossfit" => WorkoutCategory::Crossfit,
        "yoga" => WorkoutCategory::Yoga,
        "other" => WorkoutCategory::Other,
        _ => return None,
    };
    Some(category)
}
