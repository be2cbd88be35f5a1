use crate::errors::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque owner identity shared by users, tokens and workout records.
///
/// Every textual spelling of the same UUID parses to the same value, so an id
/// taken from a token always matches the one stored on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::InvalidIdentity);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| Error::InvalidIdentity)
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutCategory {
    Run,
    Lift,
    Cycle,
    Swim,
    Crossfit,
    Yoga,
    Other,
}

impl WorkoutCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Lift => "lift",
            Self::Cycle => "cycle",
            Self::Swim => "swim",
            Self::Crossfit => "crossfit",
            Self::Yoga => "yoga",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubExercise {
    pub name: String,
    #[serde(default)]
    pub sets: Option<u32>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub rpe: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: Uuid,
    pub owner: OwnerId,
    pub category: WorkoutCategory,
    pub occurred_at: DateTime<Utc>,
    pub duration_minutes: f64,
    #[serde(default)]
    pub distance_km: f64,
    #[serde(default)]
    pub calories_burned: f64,
    #[serde(default)]
    pub avg_heart_rate: Option<u32>,
    #[serde(default)]
    pub max_heart_rate: Option<u32>,
    #[serde(default)]
    pub pace_min_per_km: Option<f64>,
    #[serde(default)]
    pub elevation_gain: Option<f64>,
    #[serde(default)]
    pub perceived_effort: Option<u8>,
    #[serde(default)]
    pub sleep_quality: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub sub_exercises: Vec<SubExercise>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkoutRecord {
    /// Builds a record from a logging request. Pace is derived here and only here.
    pub fn create(owner: OwnerId, input: NewWorkout, now: DateTime<Utc>) -> Result<Self> {
        input.validate()?;

        let distance_km = input.distance_km.unwrap_or(0.0);
        let pace_min_per_km = input
            .pace_min_per_km
            .or_else(|| derive_pace(input.duration_minutes, distance_km));

        Ok(Self {
            id: Uuid::new_v4(),
            owner,
            category: input.category,
            occurred_at: input.occurred_at.unwrap_or(now),
            duration_minutes: input.duration_minutes,
            distance_km,
            calories_burned: input.calories_burned.unwrap_or(0.0),
            avg_heart_rate: input.avg_heart_rate,
            max_heart_rate: input.max_heart_rate,
            pace_min_per_km,
            elevation_gain: input.elevation_gain,
            perceived_effort: input.perceived_effort,
            sleep_quality: input.sleep_quality,
            notes: input.notes,
            sub_exercises: input.sub_exercises,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the supplied fields. A stored pace is left as it was unless the
    /// update carries one.
    pub fn apply(&mut self, update: WorkoutUpdate, now: DateTime<Utc>) -> Result<()> {
        update.validate()?;

        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(occurred_at) = update.occurred_at {
            self.occurred_at = occurred_at;
        }
        if let Some(duration) = update.duration_minutes {
            self.duration_minutes = duration;
        }
        if let Some(distance) = update.distance_km {
            self.distance_km = distance;
        }
        if let Some(calories) = update.calories_burned {
            self.calories_burned = calories;
        }
        if update.avg_heart_rate.is_some() {
            self.avg_heart_rate = update.avg_heart_rate;
        }
        if update.max_heart_rate.is_some() {
            self.max_heart_rate = update.max_heart_rate;
        }
        if update.pace_min_per_km.is_some() {
            self.pace_min_per_km = update.pace_min_per_km;
        }
        if update.elevation_gain.is_some() {
            self.elevation_gain = update.elevation_gain;
        }
        if update.perceived_effort.is_some() {
            self.perceived_effort = update.perceived_effort;
        }
        if update.sleep_quality.is_some() {
            self.sleep_quality = update.sleep_quality;
        }
        if update.notes.is_some() {
            self.notes = update.notes;
        }
        if let Some(sub_exercises) = update.sub_exercises {
            self.sub_exercises = sub_exercises;
        }
        self.updated_at = now;
        Ok(())
    }
}

fn derive_pace(duration_minutes: f64, distance_km: f64) -> Option<f64> {
    (duration_minutes > 0.0 && distance_km > 0.0).then(|| duration_minutes / distance_km)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkout {
    pub category: WorkoutCategory,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    pub duration_minutes: f64,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub calories_burned: Option<f64>,
    #[serde(default)]
    pub avg_heart_rate: Option<u32>,
    #[serde(default)]
    pub max_heart_rate: Option<u32>,
    #[serde(default)]
    pub pace_min_per_km: Option<f64>,
    #[serde(default)]
    pub elevation_gain: Option<f64>,
    #[serde(default)]
    pub perceived_effort: Option<u8>,
    #[serde(default)]
    pub sleep_quality: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub sub_exercises: Vec<SubExercise>,
}

impl NewWorkout {
    pub fn new(category: WorkoutCategory, duration_minutes: f64) -> Self {
        Self {
            category,
            occurred_at: None,
            duration_minutes,
            distance_km: None,
            calories_burned: None,
            avg_heart_rate: None,
            max_heart_rate: None,
            pace_min_per_km: None,
            elevation_gain: None,
            perceived_effort: None,
            sleep_quality: None,
            notes: None,
            sub_exercises: Vec::new(),
        }
    }

    fn validate(&self) -> Result<()> {
        non_negative("durationMinutes", Some(self.duration_minutes))?;
        non_negative("distanceKm", self.distance_km)?;
        non_negative("caloriesBurned", self.calories_burned)?;
        non_negative("paceMinPerKm", self.pace_min_per_km)?;
        non_negative("elevationGain", self.elevation_gain)?;
        positive("avgHeartRate", self.avg_heart_rate)?;
        positive("maxHeartRate", self.max_heart_rate)?;
        one_to_ten("perceivedEffort", self.perceived_effort)?;
        one_to_ten("sleepQuality", self.sleep_quality)?;
        validate_sub_exercises(&self.sub_exercises)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutUpdate {
    #[serde(default)]
    pub category: Option<WorkoutCategory>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub calories_burned: Option<f64>,
    #[serde(default)]
    pub avg_heart_rate: Option<u32>,
    #[serde(default)]
    pub max_heart_rate: Option<u32>,
    #[serde(default)]
    pub pace_min_per_km: Option<f64>,
    #[serde(default)]
    pub elevation_gain: Option<f64>,
    #[serde(default)]
    pub perceived_effort: Option<u8>,
    #[serde(default)]
    pub sleep_quality: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub sub_exercises: Option<Vec<SubExercise>>,
}

impl WorkoutUpdate {
    fn validate(&self) -> Result<()> {
        non_negative("durationMinutes", self.duration_minutes)?;
        non_negative("distanceKm", self.distance_km)?;
        non_negative("caloriesBurned", self.calories_burned)?;
        non_negative("paceMinPerKm", self.pace_min_per_km)?;
        non_negative("elevationGain", self.elevation_gain)?;
        positive("avgHeartRate", self.avg_heart_rate)?;
        positive("maxHeartRate", self.max_heart_rate)?;
        one_to_ten("perceivedEffort", self.perceived_effort)?;
        one_to_ten("sleepQuality", self.sleep_quality)?;
        match &self.sub_exercises {
            Some(sub_exercises) => validate_sub_exercises(sub_exercises),
            None => Ok(()),
        }
    }
}

fn non_negative(field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(Error::Validation(format!(
            "{field} must be a non-negative number"
        ))),
        _ => Ok(()),
    }
}

fn positive(field: &str, value: Option<u32>) -> Result<()> {
    match value {
        Some(0) => Err(Error::Validation(format!("{field} must be positive"))),
        _ => Ok(()),
    }
}

fn one_to_ten(field: &str, value: Option<u8>) -> Result<()> {
    match value {
        Some(v) if !(1..=10).contains(&v) => Err(Error::Validation(format!(
            "{field} must be between 1 and 10"
        ))),
        _ => Ok(()),
    }
}

fn validate_sub_exercises(sub_exercises: &[SubExercise]) -> Result<()> {
    for exercise in sub_exercises {
        if exercise.name.trim().is_empty() {
            return Err(Error::Validation("exercise name is required".into()));
        }
        one_to_ten("rpe", exercise.rpe)?;
        non_negative("weight", exercise.weight)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AthleteType {
    #[default]
    Runner,
    Cyclist,
    Weightlifter,
    Crossfit,
    Swimmer,
}

impl AthleteType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Runner => "runner",
            Self::Cyclist => "cyclist",
            Self::Weightlifter => "weightlifter",
            Self::Crossfit => "crossfit",
            Self::Swimmer => "swimmer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitnessLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl FitnessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: OwnerId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub athlete_type: AthleteType,
    #[serde(default)]
    pub fitness_level: FitnessLevel,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            athlete_type: self.athlete_type,
            fitness_level: self.fitness_level,
            age: self.age,
            weight: self.weight,
            height: self.height,
            created_at: self.created_at,
        }
    }
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: OwnerId,
    pub name: String,
    pub email: String,
    pub athlete_type: AthleteType,
    pub fitness_level: FitnessLevel,
    pub age: Option<u32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub athlete_type: Option<AthleteType>,
    #[serde(default)]
    pub fitness_level: Option<FitnessLevel>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub athlete_type: Option<AthleteType>,
    #[serde(default)]
    pub fitness_level: Option<FitnessLevel>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

/// Trailing report window selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportPeriod {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
}

impl ReportPeriod {
    /// Unknown or missing values fall back to 30 days.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("7d") => Self::Week,
            Some("90d") => Self::Quarter,
            _ => Self::Month,
        }
    }

    pub fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateOverview {
    pub total_workouts: u64,
    pub total_duration: f64,
    pub total_distance: f64,
    pub total_calories: f64,
    pub avg_heart_rate: Option<f64>,
    pub avg_pace: Option<f64>,
    pub avg_perceived_effort: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyBucket {
    /// Sunday = 1 through Saturday = 7.
    pub day_ordinal: u8,
    pub count: u64,
    pub total_duration: f64,
    pub total_distance: f64,
    pub total_calories: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeBreakdown {
    pub category: WorkoutCategory,
    pub count: u64,
    pub total_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub sequence_index: u32,
    pub duration: f64,
    pub distance: f64,
    pub pace: Option<f64>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOverview {
    pub overview: AggregateOverview,
    pub weekly_activity: Vec<WeeklyBucket>,
    pub by_type: Vec<TypeBreakdown>,
    pub recent_progress: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
    pub month: u32,
    pub workouts: u64,
    pub total_duration: f64,
    pub total_distance: f64,
    pub total_calories: f64,
    pub avg_pace: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStatsResponse {
    pub year: i32,
    pub monthly_stats: Vec<MonthlyBucket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Date,
    Duration,
    Distance,
    Calories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filters and paging for workout listings.
///
/// Both date bounds are inclusive. They accept RFC 3339 timestamps or plain
/// `YYYY-MM-DD` dates; a plain end date covers that whole UTC day.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutQuery {
    #[serde(default, deserialize_with = "range_start")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "range_end")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, rename = "type")]
    pub category: Option<WorkoutCategory>,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for WorkoutQuery {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            category: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            page: default_page(),
            limit: default_limit(),
        }
    }
}

/// Which side of an inclusive date range a bound sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEdge {
    Start,
    End,
}

/// Parses an RFC 3339 timestamp or a `YYYY-MM-DD` date. A bare date resolves
/// to the first instant of that UTC day as a start, and to its last instant as
/// an end.
pub fn parse_range_bound(raw: &str, edge: RangeEdge) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = match edge {
        RangeEdge::Start => NaiveTime::from_hms_opt(0, 0, 0)?,
        RangeEdge::End => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)?,
    };
    Some(date.and_time(time).and_utc())
}

type Bound = Option<DateTime<Utc>>;

fn range_bound<'de, D>(deserializer: D, edge: RangeEdge) -> std::result::Result<Bound, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_range_bound(&raw, edge).map(Some).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "expected YYYY-MM-DD or an RFC 3339 timestamp, got `{raw}`"
        ))
    })
}

pub(crate) fn range_start<'de, D>(deserializer: D) -> std::result::Result<Bound, D::Error>
where
    D: Deserializer<'de>,
{
    range_bound(deserializer, RangeEdge::Start)
}

pub(crate) fn range_end<'de, D>(deserializer: D) -> std::result::Result<Bound, D::Error>
where
    D: Deserializer<'de>,
{
    range_bound(deserializer, RangeEdge::End)
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    100
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Pagination {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub pages: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkoutList {
    pub workouts: Vec<WorkoutRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct WorkoutResponse {
    pub message: String,
    pub workout: WorkoutRecord,
}

/// Everything the document store persists.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub workouts: Vec<WorkoutRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap()
    }

    #[test]
    fn owner_id_spellings_resolve_to_the_same_owner() {
        let canonical = OwnerId::parse("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let upper = OwnerId::parse("67E55044-10B1-426F-9247-BB680E5FE0C8").unwrap();
        let simple = OwnerId::parse("67e5504410b1426f9247bb680e5fe0c8").unwrap();
        let padded = OwnerId::parse("  67e55044-10b1-426f-9247-bb680e5fe0c8 ").unwrap();

        assert_eq!(canonical, upper);
        assert_eq!(canonical, simple);
        assert_eq!(canonical, padded);
        assert_eq!(upper.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn owner_id_rejects_malformed_input() {
        assert!(matches!(OwnerId::parse(""), Err(Error::InvalidIdentity)));
        assert!(matches!(OwnerId::parse("   "), Err(Error::InvalidIdentity)));
        assert!(matches!(OwnerId::parse("not-a-user"), Err(Error::InvalidIdentity)));
    }

    #[test]
    fn create_derives_pace_from_duration_and_distance() {
        let mut input = NewWorkout::new(WorkoutCategory::Run, 60.0);
        input.distance_km = Some(10.0);
        let record = WorkoutRecord::create(OwnerId::new(), input, at(1)).unwrap();
        assert_eq!(record.pace_min_per_km, Some(6.0));
        assert_eq!(record.occurred_at, at(1));
        assert_eq!(record.calories_burned, 0.0);
    }

    #[test]
    fn create_keeps_supplied_pace_and_skips_zero_distance() {
        let mut with_pace = NewWorkout::new(WorkoutCategory::Run, 60.0);
        with_pace.distance_km = Some(10.0);
        with_pace.pace_min_per_km = Some(5.5);
        let record = WorkoutRecord::create(OwnerId::new(), with_pace, at(1)).unwrap();
        assert_eq!(record.pace_min_per_km, Some(5.5));

        let lift = NewWorkout::new(WorkoutCategory::Lift, 45.0);
        let record = WorkoutRecord::create(OwnerId::new(), lift, at(1)).unwrap();
        assert_eq!(record.pace_min_per_km, None);
        assert_eq!(record.distance_km, 0.0);
    }

    #[test]
    fn update_does_not_recompute_pace() {
        let mut input = NewWorkout::new(WorkoutCategory::Run, 60.0);
        input.distance_km = Some(10.0);
        let mut record = WorkoutRecord::create(OwnerId::new(), input, at(1)).unwrap();

        let update = WorkoutUpdate {
            duration_minutes: Some(30.0),
            ..WorkoutUpdate::default()
        };
        record.apply(update, at(2)).unwrap();
        assert_eq!(record.duration_minutes, 30.0);
        assert_eq!(record.pace_min_per_km, Some(6.0));
        assert_eq!(record.updated_at, at(2));

        let update = WorkoutUpdate {
            pace_min_per_km: Some(3.0),
            ..WorkoutUpdate::default()
        };
        record.apply(update, at(3)).unwrap();
        assert_eq!(record.pace_min_per_km, Some(3.0));
    }

    #[test]
    fn validation_rejects_out_of_range_fields() {
        let mut negative = NewWorkout::new(WorkoutCategory::Run, -1.0);
        assert!(matches!(
            WorkoutRecord::create(OwnerId::new(), negative.clone(), at(1)),
            Err(Error::Validation(_))
        ));

        negative.duration_minutes = 20.0;
        negative.perceived_effort = Some(11);
        assert!(matches!(
            WorkoutRecord::create(OwnerId::new(), negative, at(1)),
            Err(Error::Validation(_))
        ));

        let mut lift = NewWorkout::new(WorkoutCategory::Lift, 50.0);
        lift.sub_exercises.push(SubExercise {
            name: "squat".into(),
            sets: Some(5),
            reps: Some(5),
            weight: Some(100.0),
            rpe: Some(0),
        });
        assert!(matches!(
            WorkoutRecord::create(OwnerId::new(), lift, at(1)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn period_parse_falls_back_to_thirty_days() {
        assert_eq!(ReportPeriod::parse(Some("7d")).days(), 7);
        assert_eq!(ReportPeriod::parse(Some("90d")).days(), 90);
        assert_eq!(ReportPeriod::parse(Some("30d")), ReportPeriod::Month);
        assert_eq!(ReportPeriod::parse(Some("invalid")), ReportPeriod::Month);
        assert_eq!(ReportPeriod::parse(None), ReportPeriod::Month);
    }

    #[test]
    fn listing_bounds_accept_plain_dates_and_timestamps() {
        let query: WorkoutQuery = serde_json::from_value(serde_json::json!({
            "startDate": "2026-03-10",
            "endDate": "2026-03-12",
        }))
        .unwrap();
        let start = query.start_date.unwrap();
        let end = query.end_date.unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap());
        assert!(end >= Utc.with_ymd_and_hms(2026, 3, 12, 23, 59, 59).unwrap());
        assert!(end < Utc.with_ymd_and_hms(2026, 3, 13, 0, 0, 0).unwrap());

        let query: WorkoutQuery = serde_json::from_value(serde_json::json!({
            "startDate": "2026-03-10T09:00:00+02:00",
            "endDate": "",
        }))
        .unwrap();
        assert_eq!(query.start_date, Some(Utc.with_ymd_and_hms(2026, 3, 10, 7, 0, 0).unwrap()));
        assert_eq!(query.end_date, None);

        let rejected = serde_json::from_value::<WorkoutQuery>(serde_json::json!({
            "endDate": "03/12/2026",
        }));
        assert!(rejected.is_err());
    }

    #[test]
    fn workout_payload_uses_camel_case_and_lowercase_categories() {
        let payload = serde_json::json!({
            "category": "cycle",
            "durationMinutes": 90,
            "distanceKm": 40.5,
            "avgHeartRate": 142
        });
        let input: NewWorkout = serde_json::from_value(payload).unwrap();
        assert_eq!(input.category, WorkoutCategory::Cycle);
        assert_eq!(input.distance_km, Some(40.5));
        assert_eq!(input.avg_heart_rate, Some(142));
    }
}
