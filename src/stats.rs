use crate::errors::{Error, Result};
use crate::models::{
    AggregateOverview, MonthlyBucket, OwnerId, ReportPeriod, StatsOverview, TrendPoint,
    TypeBreakdown, WeeklyBucket, WorkoutRecord,
};
use crate::storage::RecordStore;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use tracing::debug;

/// The weekly histogram always covers the trailing seven days.
const HISTOGRAM_DAYS: u32 = 7;

/// Number of records plotted on the recent-progress chart.
pub const TREND_LIMIT: usize = 10;

/// Read-only aggregation over one owner's workout records.
///
/// Each operation issues its own query against the store. Every public method
/// has an `_at` twin that takes the clock explicitly.
pub struct StatsAggregator<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> StatsAggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn get_stats_overview(
        &self,
        owner: OwnerId,
        period: ReportPeriod,
    ) -> Result<StatsOverview> {
        self.get_stats_overview_at(owner, period, Utc::now()).await
    }

    /// Runs all four aggregations. An empty window short-circuits to the
    /// zero overview with empty series; any store failure aborts the whole call.
    pub async fn get_stats_overview_at(
        &self,
        owner: OwnerId,
        period: ReportPeriod,
        now: DateTime<Utc>,
    ) -> Result<StatsOverview> {
        let days = period.days() as u32;
        let overview = self.compute_overview_at(owner, days, now).await?;
        if overview.total_workouts == 0 {
            debug!(%owner, period = period.as_str(), "no workouts in window");
            return Ok(StatsOverview {
                overview,
                ..StatsOverview::default()
            });
        }

        let weekly_activity = self.compute_weekly_histogram_at(owner, now).await?.to_vec();
        let by_type = self.compute_type_breakdown_at(owner, days, now).await?;
        let recent_progress = self
            .compute_recent_trend_at(owner, days, TREND_LIMIT, now)
            .await?;

        debug!(
            %owner,
            period = period.as_str(),
            workouts = overview.total_workouts,
            "computed stats overview"
        );
        Ok(StatsOverview {
            overview,
            weekly_activity,
            by_type,
            recent_progress,
        })
    }

    pub async fn compute_overview(
        &self,
        owner: OwnerId,
        window_days: u32,
    ) -> Result<AggregateOverview> {
        self.compute_overview_at(owner, window_days, Utc::now()).await
    }

    pub async fn compute_overview_at(
        &self,
        owner: OwnerId,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> Result<AggregateOverview> {
        let records = self.window(owner, window_days, now).await?;
        Ok(overview_of(&records))
    }

    pub async fn compute_weekly_histogram(&self, owner: OwnerId) -> Result<[WeeklyBucket; 7]> {
        self.compute_weekly_histogram_at(owner, Utc::now()).await
    }

    /// Seven buckets, Sunday = 1 through Saturday = 7 on the UTC calendar,
    /// zero-filled for days without activity.
    pub async fn compute_weekly_histogram_at(
        &self,
        owner: OwnerId,
        now: DateTime<Utc>,
    ) -> Result<[WeeklyBucket; 7]> {
        let records = self.window(owner, HISTOGRAM_DAYS, now).await?;

        let mut buckets: [WeeklyBucket; 7] = std::array::from_fn(|i| WeeklyBucket {
            day_ordinal: i as u8 + 1,
            ..WeeklyBucket::default()
        });
        for record in &records {
            let ordinal = record.occurred_at.weekday().number_from_sunday() as usize;
            let bucket = &mut buckets[ordinal - 1];
            bucket.count += 1;
            bucket.total_duration += record.duration_minutes;
            bucket.total_distance += record.distance_km;
            bucket.total_calories += record.calories_burned;
        }
        Ok(buckets)
    }

    pub async fn compute_type_breakdown(
        &self,
        owner: OwnerId,
        window_days: u32,
    ) -> Result<Vec<TypeBreakdown>> {
        self.compute_type_breakdown_at(owner, window_days, Utc::now())
            .await
    }

    /// Descending by count. Equal counts keep the order in which each category
    /// first appears in the chronological scan.
    pub async fn compute_type_breakdown_at(
        &self,
        owner: OwnerId,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<TypeBreakdown>> {
        let records = self.window(owner, window_days, now).await?;

        let mut groups: Vec<TypeBreakdown> = Vec::new();
        for record in &records {
            match groups.iter_mut().find(|g| g.category == record.category) {
                Some(group) => {
                    group.count += 1;
                    group.total_duration += record.duration_minutes;
                }
                None => groups.push(TypeBreakdown {
                    category: record.category,
                    count: 1,
                    total_duration: record.duration_minutes,
                }),
            }
        }
        groups.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(groups)
    }

    pub async fn compute_recent_trend(
        &self,
        owner: OwnerId,
        window_days: u32,
        limit: usize,
    ) -> Result<Vec<TrendPoint>> {
        self.compute_recent_trend_at(owner, window_days, limit, Utc::now())
            .await
    }

    /// The `limit` most recent records in chronological order, indexed 1..=N
    /// regardless of the calendar gaps between them.
    pub async fn compute_recent_trend_at(
        &self,
        owner: OwnerId,
        window_days: u32,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<TrendPoint>> {
        let records = self.window(owner, window_days, now).await?;
        let first = records.len().saturating_sub(limit);

        Ok(records[first..]
            .iter()
            .zip(1u32..)
            .map(|(record, sequence_index)| TrendPoint {
                sequence_index,
                duration: record.duration_minutes,
                distance: record.distance_km,
                pace: record.pace_min_per_km,
                date: record.occurred_at,
            })
            .collect())
    }

    /// Twelve calendar-month buckets for `year`, zero-filled.
    pub async fn compute_monthly_summary(
        &self,
        owner: OwnerId,
        year: i32,
    ) -> Result<Vec<MonthlyBucket>> {
        let start = Utc
            .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| Error::Validation(format!("invalid year {year}")))?;
        let end = Utc
            .with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| Error::Validation(format!("invalid year {year}")))?;
        let records = self.store.workouts_between(owner, start, Some(end)).await?;

        let mut buckets: Vec<MonthlyBucket> = (1..=12)
            .map(|month| MonthlyBucket {
                month,
                ..MonthlyBucket::default()
            })
            .collect();
        let mut paces = [Mean::default(); 12];
        for record in &records {
            let index = record.occurred_at.month0() as usize;
            let bucket = &mut buckets[index];
            bucket.workouts += 1;
            bucket.total_duration += record.duration_minutes;
            bucket.total_distance += record.distance_km;
            bucket.total_calories += record.calories_burned;
            paces[index].add(record.pace_min_per_km);
        }
        for (bucket, pace) in buckets.iter_mut().zip(paces) {
            bucket.avg_pace = pace.value();
        }
        Ok(buckets)
    }

    async fn window(
        &self,
        owner: OwnerId,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkoutRecord>> {
        let since = now - Duration::days(i64::from(days));
        self.store.workouts_between(owner, since, None).await
    }
}

/// Totals count missing values as zero; averages skip them.
fn overview_of(records: &[WorkoutRecord]) -> AggregateOverview {
    let mut overview = AggregateOverview::default();
    let mut heart_rate = Mean::default();
    let mut pace = Mean::default();
    let mut effort = Mean::default();

    for record in records {
        overview.total_workouts += 1;
        overview.total_duration += record.duration_minutes;
        overview.total_distance += record.distance_km;
        overview.total_calories += record.calories_burned;
        heart_rate.add(record.avg_heart_rate.map(f64::from));
        pace.add(record.pace_min_per_km);
        effort.add(record.perceived_effort.map(f64::from));
    }

    overview.avg_heart_rate = heart_rate.value();
    overview.avg_pace = pace.value();
    overview.avg_perceived_effort = effort.value();
    overview
}

#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn add(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.sum += value;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewWorkout, WorkoutCategory, WorkoutQuery};
    use crate::storage::tests::empty_store;
    use crate::storage::{JsonFileStore, RecordStore};
    use async_trait::async_trait;
    use uuid::Uuid;

    /// Saturday 2026-03-14, noon UTC.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    async fn log(
        store: &JsonFileStore,
        owner: OwnerId,
        category: WorkoutCategory,
        at: DateTime<Utc>,
        build: impl FnOnce(&mut NewWorkout),
    ) -> WorkoutRecord {
        let mut input = NewWorkout::new(category, 30.0);
        input.occurred_at = Some(at);
        build(&mut input);
        let record = WorkoutRecord::create(owner, input, at).unwrap();
        store.insert_workout(record).await.unwrap()
    }

    #[tokio::test]
    async fn empty_window_yields_zero_overview_and_empty_series() {
        let store = empty_store();
        let owner = OwnerId::new();
        log(&store, owner, WorkoutCategory::Run, days_ago(45), |_| {}).await;
        let stats = StatsAggregator::new(&store);

        let result = stats
            .get_stats_overview_at(owner, ReportPeriod::Month, now())
            .await
            .unwrap();
        assert_eq!(result.overview, AggregateOverview::default());
        assert_eq!(result.overview.avg_heart_rate, None);
        assert!(result.weekly_activity.is_empty());
        assert!(result.by_type.is_empty());
        assert!(result.recent_progress.is_empty());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["overview"]["totalWorkouts"], 0);
        assert!(json["overview"]["avgPace"].is_null());
    }

    #[tokio::test]
    async fn averages_skip_missing_values_while_sums_count_them_as_zero() {
        let store = empty_store();
        let owner = OwnerId::new();
        log(&store, owner, WorkoutCategory::Run, days_ago(1), |w| {
            w.avg_heart_rate = Some(140);
            w.calories_burned = Some(300.0);
        })
        .await;
        log(&store, owner, WorkoutCategory::Run, days_ago(2), |_| {}).await;
        log(&store, owner, WorkoutCategory::Run, days_ago(3), |w| {
            w.avg_heart_rate = Some(160);
            w.distance_km = Some(5.0);
        })
        .await;

        let overview = StatsAggregator::new(&store)
            .compute_overview_at(owner, 30, now())
            .await
            .unwrap();
        assert_eq!(overview.total_workouts, 3);
        assert_eq!(overview.total_duration, 90.0);
        assert_eq!(overview.total_distance, 5.0);
        assert_eq!(overview.total_calories, 300.0);
        assert_eq!(overview.avg_heart_rate, Some(150.0));
        assert_eq!(overview.avg_pace, Some(6.0));
        assert_eq!(overview.avg_perceived_effort, None);
    }

    #[tokio::test]
    async fn overview_ignores_other_owners_and_older_records() {
        let store = empty_store();
        let owner = OwnerId::new();
        log(&store, owner, WorkoutCategory::Swim, days_ago(5), |_| {}).await;
        log(&store, owner, WorkoutCategory::Swim, days_ago(8), |_| {}).await;
        log(&store, OwnerId::new(), WorkoutCategory::Swim, days_ago(1), |_| {}).await;

        let overview = StatsAggregator::new(&store)
            .compute_overview_at(owner, 7, now())
            .await
            .unwrap();
        assert_eq!(overview.total_workouts, 1);
    }

    #[tokio::test]
    async fn weekly_histogram_always_has_seven_ordered_buckets() {
        let store = empty_store();
        let owner = OwnerId::new();
        // Sunday 03-08 through Saturday 03-14, skipping Tuesday and Thursday.
        for days in [6, 5, 3, 1, 0] {
            let at = days_ago(days) - Duration::hours(3);
            log(&store, owner, WorkoutCategory::Run, at, |w| {
                w.distance_km = Some(5.0);
                w.calories_burned = Some(250.0);
            })
            .await;
        }
        log(&store, owner, WorkoutCategory::Lift, days_ago(6) - Duration::hours(1), |_| {}).await;
        log(&store, owner, WorkoutCategory::Run, days_ago(8), |_| {}).await;

        let stats = StatsAggregator::new(&store);
        let buckets = stats.compute_weekly_histogram_at(owner, now()).await.unwrap();

        let ordinals: Vec<u8> = buckets.iter().map(|b| b.day_ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4, 5, 6, 7]);
        let counts: Vec<u64> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 0, 1, 0, 1, 1]);
        assert_eq!(buckets[0].total_duration, 60.0);
        assert_eq!(buckets[0].total_distance, 5.0);
        assert_eq!(buckets[2], WeeklyBucket { day_ordinal: 3, ..WeeklyBucket::default() });
        assert_eq!(buckets[6].total_calories, 250.0);
    }

    #[tokio::test]
    async fn weekly_histogram_of_an_empty_store_is_seven_zero_buckets() {
        let store = empty_store();
        let buckets = StatsAggregator::new(&store)
            .compute_weekly_histogram_at(OwnerId::new(), now())
            .await
            .unwrap();

        assert_eq!(buckets.len(), 7);
        for (index, bucket) in buckets.iter().enumerate() {
            assert_eq!(
                *bucket,
                WeeklyBucket {
                    day_ordinal: index as u8 + 1,
                    ..WeeklyBucket::default()
                }
            );
        }
    }

    #[tokio::test]
    async fn weekly_histogram_ignores_the_report_window() {
        let store = empty_store();
        let owner = OwnerId::new();
        log(&store, owner, WorkoutCategory::Run, days_ago(20), |_| {}).await;
        log(&store, owner, WorkoutCategory::Run, days_ago(2), |_| {}).await;

        let result = StatsAggregator::new(&store)
            .get_stats_overview_at(owner, ReportPeriod::Quarter, now())
            .await
            .unwrap();
        assert_eq!(result.overview.total_workouts, 2);
        assert_eq!(result.weekly_activity.len(), 7);
        let in_week: u64 = result.weekly_activity.iter().map(|b| b.count).sum();
        assert_eq!(in_week, 1);
    }

    #[tokio::test]
    async fn type_breakdown_orders_by_count_then_first_seen() {
        let store = empty_store();
        let owner = OwnerId::new();
        let mut day = 20;
        let mut next = || {
            day -= 1;
            days_ago(day)
        };
        log(&store, owner, WorkoutCategory::Run, next(), |_| {}).await;
        log(&store, owner, WorkoutCategory::Lift, next(), |w| w.duration_minutes = 50.0).await;
        log(&store, owner, WorkoutCategory::Cycle, next(), |w| w.duration_minutes = 90.0).await;
        for _ in 0..4 {
            log(&store, owner, WorkoutCategory::Run, next(), |_| {}).await;
        }
        for _ in 0..2 {
            log(&store, owner, WorkoutCategory::Cycle, next(), |_| {}).await;
            log(&store, owner, WorkoutCategory::Lift, next(), |_| {}).await;
        }

        let breakdown = StatsAggregator::new(&store)
            .compute_type_breakdown_at(owner, 30, now())
            .await
            .unwrap();
        let order: Vec<(WorkoutCategory, u64)> =
            breakdown.iter().map(|b| (b.category, b.count)).collect();
        assert_eq!(
            order,
            vec![
                (WorkoutCategory::Run, 5),
                (WorkoutCategory::Lift, 3),
                (WorkoutCategory::Cycle, 3),
            ]
        );
        assert_eq!(breakdown[0].total_duration, 150.0);
        assert_eq!(breakdown[1].total_duration, 110.0);
        assert_eq!(breakdown[2].total_duration, 150.0);
    }

    #[tokio::test]
    async fn type_breakdown_tie_follows_chronology_not_insertion() {
        let store = empty_store();
        let owner = OwnerId::new();
        log(&store, owner, WorkoutCategory::Swim, days_ago(2), |_| {}).await;
        log(&store, owner, WorkoutCategory::Yoga, days_ago(4), |_| {}).await;

        let breakdown = StatsAggregator::new(&store)
            .compute_type_breakdown_at(owner, 30, now())
            .await
            .unwrap();
        assert_eq!(breakdown[0].category, WorkoutCategory::Yoga);
        assert_eq!(breakdown[1].category, WorkoutCategory::Swim);
    }

    #[tokio::test]
    async fn recent_trend_reindexes_the_latest_records_chronologically() {
        let store = empty_store();
        let owner = OwnerId::new();
        let origin = days_ago(50);
        let days: Vec<i64> = (1..=12).chain(40..=42).collect();
        // Insert newest first so ordering cannot come from insertion.
        for day in days.iter().rev() {
            log(&store, owner, WorkoutCategory::Run, origin + Duration::days(*day), |w| {
                w.duration_minutes = *day as f64;
            })
            .await;
        }

        let trend = StatsAggregator::new(&store)
            .compute_recent_trend_at(owner, 90, TREND_LIMIT, now())
            .await
            .unwrap();

        assert_eq!(trend.len(), 10);
        let indices: Vec<u32> = trend.iter().map(|p| p.sequence_index).collect();
        assert_eq!(indices, (1..=10).collect::<Vec<u32>>());
        let picked: Vec<f64> = trend.iter().map(|p| p.duration).collect();
        assert_eq!(
            picked,
            vec![6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 40.0, 41.0, 42.0]
        );
        assert_eq!(trend[0].date, origin + Duration::days(6));
        assert!(trend.windows(2).all(|w| w[0].date < w[1].date));
        let day_forty = trend.iter().find(|p| p.duration == 40.0).unwrap();
        assert_eq!(day_forty.sequence_index, 8);
    }

    #[tokio::test]
    async fn recent_trend_returns_everything_when_short() {
        let store = empty_store();
        let owner = OwnerId::new();
        log(&store, owner, WorkoutCategory::Run, days_ago(3), |w| {
            w.distance_km = Some(10.0);
        })
        .await;
        log(&store, owner, WorkoutCategory::Lift, days_ago(1), |_| {}).await;

        let trend = StatsAggregator::new(&store)
            .compute_recent_trend_at(owner, 7, TREND_LIMIT, now())
            .await
            .unwrap();
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].sequence_index, 1);
        assert_eq!(trend[0].pace, Some(3.0));
        assert_eq!(trend[1].sequence_index, 2);
        assert_eq!(trend[1].pace, None);
    }

    #[tokio::test]
    async fn unknown_period_matches_thirty_days() {
        let store = empty_store();
        let owner = OwnerId::new();
        log(&store, owner, WorkoutCategory::Run, days_ago(2), |_| {}).await;
        log(&store, owner, WorkoutCategory::Cycle, days_ago(20), |_| {}).await;
        log(&store, owner, WorkoutCategory::Swim, days_ago(60), |_| {}).await;
        let stats = StatsAggregator::new(&store);

        let fallback = stats
            .get_stats_overview_at(owner, ReportPeriod::parse(Some("invalid")), now())
            .await
            .unwrap();
        let thirty = stats
            .get_stats_overview_at(owner, ReportPeriod::parse(Some("30d")), now())
            .await
            .unwrap();
        let ninety = stats
            .get_stats_overview_at(owner, ReportPeriod::Quarter, now())
            .await
            .unwrap();

        assert_eq!(fallback, thirty);
        assert_eq!(thirty.overview.total_workouts, 2);
        assert_eq!(ninety.overview.total_workouts, 3);
    }

    #[tokio::test]
    async fn monthly_summary_backfills_every_month() {
        let store = empty_store();
        let owner = OwnerId::new();
        let march = Utc.with_ymd_and_hms(2026, 3, 3, 7, 0, 0).unwrap();
        log(&store, owner, WorkoutCategory::Run, march, |w| {
            w.distance_km = Some(10.0);
        })
        .await;
        log(&store, owner, WorkoutCategory::Lift, march + Duration::days(1), |_| {}).await;
        let last_year = Utc.with_ymd_and_hms(2025, 12, 31, 23, 0, 0).unwrap();
        log(&store, owner, WorkoutCategory::Run, last_year, |_| {}).await;

        let months = StatsAggregator::new(&store)
            .compute_monthly_summary(owner, 2026)
            .await
            .unwrap();
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], MonthlyBucket { month: 1, ..MonthlyBucket::default() });
        assert_eq!(months[2].workouts, 2);
        assert_eq!(months[2].total_duration, 60.0);
        assert_eq!(months[2].avg_pace, Some(3.0));
        assert_eq!(months[11].month, 12);
        assert_eq!(months[11].workouts, 0);
    }

    struct UnreachableStore;

    #[async_trait]
    impl RecordStore for UnreachableStore {
        async fn insert_workout(&self, _record: WorkoutRecord) -> Result<WorkoutRecord> {
            Err(Error::StoreUnavailable("connection refused".into()))
        }

        async fn insert_workouts(
            &self,
            _records: Vec<WorkoutRecord>,
        ) -> Result<Vec<WorkoutRecord>> {
            Err(Error::StoreUnavailable("connection refused".into()))
        }

        async fn find_workout(&self, _owner: OwnerId, _id: Uuid) -> Result<Option<WorkoutRecord>> {
            Err(Error::StoreUnavailable("connection refused".into()))
        }

        async fn replace_workout(&self, _record: WorkoutRecord) -> Result<bool> {
            Err(Error::StoreUnavailable("connection refused".into()))
        }

        async fn delete_workout(&self, _owner: OwnerId, _id: Uuid) -> Result<bool> {
            Err(Error::StoreUnavailable("connection refused".into()))
        }

        async fn workouts_between(
            &self,
            _owner: OwnerId,
            _start: DateTime<Utc>,
            _end: Option<DateTime<Utc>>,
        ) -> Result<Vec<WorkoutRecord>> {
            Err(Error::StoreUnavailable("connection refused".into()))
        }

        async fn list_workouts(
            &self,
            _owner: OwnerId,
            _query: &WorkoutQuery,
        ) -> Result<(Vec<WorkoutRecord>, usize)> {
            Err(Error::StoreUnavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn store_failure_aborts_the_composite_call() {
        let result = StatsAggregator::new(&UnreachableStore)
            .get_stats_overview_at(OwnerId::new(), ReportPeriod::Week, now())
            .await;
        assert!(matches!(result, Err(Error::StoreUnavailable(_))));
    }
}
