//! Training insights and plans.
//!
//! A [`TextGenerator`] is optional. When one is injected, its reply is treated
//! as untrusted text: the first balanced JSON object is pulled out and parsed,
//! and anything that does not fit falls back to the deterministic templates
//! below. Without a generator the templates are used directly.

use crate::errors::{Error, Result};
use crate::models::{
    AthleteType, FitnessLevel, OwnerId, ReportPeriod, User, WorkoutCategory, WorkoutRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Number of recent workouts included in prompts.
const PROMPT_HISTORY: usize = 20;

const MAX_PLAN_WEEKS: u32 = 12;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStatistics {
    pub total_workouts: usize,
    pub total_duration: f64,
    pub total_distance: f64,
    pub avg_duration: f64,
    pub avg_distance: f64,
    pub period_days: i64,
}

impl PeriodStatistics {
    pub fn from_records(records: &[WorkoutRecord], period: ReportPeriod) -> Self {
        let total_workouts = records.len();
        let total_duration: f64 = records.iter().map(|w| w.duration_minutes).sum();
        let total_distance: f64 = records.iter().map(|w| w.distance_km).sum();
        let divisor = total_workouts.max(1) as f64;
        Self {
            total_workouts,
            total_duration: total_duration.round(),
            total_distance: round_to(total_distance, 2),
            avg_duration: round_to(total_duration / divisor, 1),
            avg_distance: round_to(total_distance / divisor, 2),
            period_days: period.days(),
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextSteps {
    pub short_term: String,
    pub medium_term: String,
    pub long_term: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    pub summary: String,
    pub performance_trends: Vec<String>,
    pub recovery_score: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub injury_risks: Vec<String>,
    pub performance_score: f64,
    pub consistency_score: f64,
    pub progress_score: f64,
    pub next_steps: NextSteps,
    #[serde(default)]
    pub calculated_stats: PeriodStatistics,
    #[serde(default)]
    pub period: ReportPeriod,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    #[serde(default = "default_goal")]
    pub goal: String,
    #[serde(default = "default_weeks")]
    pub duration_weeks: u32,
    #[serde(default = "default_intensity")]
    pub intensity: String,
    #[serde(default = "default_focus")]
    pub focus: String,
}

impl Default for PlanRequest {
    fn default() -> Self {
        Self {
            goal: default_goal(),
            duration_weeks: default_weeks(),
            intensity: default_intensity(),
            focus: default_focus(),
        }
    }
}

fn default_goal() -> String {
    "Improve overall fitness".into()
}

fn default_weeks() -> u32 {
    4
}

fn default_intensity() -> String {
    "moderate".into()
}

fn default_focus() -> String {
    "balanced".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayWorkout {
    pub workout_type: String,
    pub duration: String,
    pub intensity: String,
    pub description: String,
    pub key_focus: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekDays {
    pub monday: DayWorkout,
    pub tuesday: DayWorkout,
    pub wednesday: DayWorkout,
    pub thursday: DayWorkout,
    pub friday: DayWorkout,
    pub saturday: DayWorkout,
    pub sunday: DayWorkout,
}

impl WeekDays {
    /// Monday first.
    pub fn named(&self) -> [(&'static str, &DayWorkout); 7] {
        [
            ("Monday", &self.monday),
            ("Tuesday", &self.tuesday),
            ("Wednesday", &self.wednesday),
            ("Thursday", &self.thursday),
            ("Friday", &self.friday),
            ("Saturday", &self.saturday),
            ("Sunday", &self.sunday),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekPlan {
    pub week_number: u32,
    pub focus: String,
    pub goals: Vec<String>,
    pub total_volume: String,
    pub days: WeekDays,
    pub recovery_strategies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPlan {
    pub plan_title: String,
    pub goal: String,
    pub duration_weeks: u32,
    pub intensity_level: String,
    pub weeks: Vec<WeekPlan>,
    pub progression_strategy: String,
    pub performance_metrics: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default)]
    pub generated_for: Option<OwnerId>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub athlete_type: Option<AthleteType>,
    #[serde(default)]
    pub fitness_level: Option<FitnessLevel>,
}

/// Produces insight and plan documents, preferring the injected generator.
pub struct InsightService {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl InsightService {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub fn is_available(&self) -> bool {
        self.generator.is_some()
    }

    /// `workouts` must be the owner's records for `period`, oldest first.
    pub async fn insights(
        &self,
        user: &User,
        period: ReportPeriod,
        workouts: &[WorkoutRecord],
        now: DateTime<Utc>,
    ) -> Result<InsightReport> {
        if workouts.is_empty() {
            return Err(Error::NotFound(
                "No workout data found for the selected period".into(),
            ));
        }
        let stats = PeriodStatistics::from_records(workouts, period);

        let generated = match &self.generator {
            Some(generator) => {
                let prompt = insight_prompt(user, &stats, workouts);
                self.structured::<InsightReport>(generator.as_ref(), &prompt, "insights")
                    .await
            }
            None => None,
        };

        let mut report = match generated {
            Some(mut report) => {
                report.ai_generated = true;
                report.note = None;
                report
            }
            None => template_insights(workouts, &stats),
        };
        report.calculated_stats = stats;
        report.period = period;
        report.generated_at = Some(now);
        Ok(report)
    }

    /// `history` is the owner's recent workouts, newest first.
    pub async fn training_plan(
        &self,
        user: &User,
        request: &PlanRequest,
        history: &[WorkoutRecord],
        now: DateTime<Utc>,
    ) -> Result<TrainingPlan> {
        if !(1..=MAX_PLAN_WEEKS).contains(&request.duration_weeks) {
            return Err(Error::Validation(format!(
                "durationWeeks must be between 1 and {MAX_PLAN_WEEKS}"
            )));
        }

        let generated = match &self.generator {
            Some(generator) => {
                let prompt = plan_prompt(user, request, history);
                self.structured::<TrainingPlan>(generator.as_ref(), &prompt, "training plan")
                    .await
            }
            None => None,
        };

        let mut plan = match generated {
            Some(mut plan) => {
                plan.ai_generated = true;
                plan
            }
            None => template_plan(user.athlete_type, request),
        };
        plan.generated_for = Some(user.id);
        plan.generated_at = Some(now);
        plan.athlete_type = Some(user.athlete_type);
        plan.fitness_level = Some(user.fitness_level);
        Ok(plan)
    }

    async fn structured<T: DeserializeOwned>(
        &self,
        generator: &dyn TextGenerator,
        prompt: &str,
        what: &str,
    ) -> Option<T> {
        let text = match generator.generate(prompt).await {
            Ok(text) => text,
            Err(err) => {
                warn!("{what} generation failed, using template: {err}");
                return None;
            }
        };
        let parsed = parse_structured(&text);
        match &parsed {
            Some(_) => info!("{what} generated by text generator"),
            None => warn!("{what} reply was not usable JSON, using template"),
        }
        parsed
    }
}

/// Parses the first balanced JSON object found in `text`.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Option<T> {
    let object = extract_json_object(text)?;
    serde_json::from_str(object).ok()
}

/// Returns the first balanced `{...}` span, skipping braces inside string
/// literals. Markdown fences and surrounding prose are ignored.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(&text[start..]) {
            return Some(&text[start..start + end]);
        }
        search_from = start + 1;
    }
    None
}

fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

fn insight_prompt(user: &User, stats: &PeriodStatistics, workouts: &[WorkoutRecord]) -> String {
    let first = workouts.len().saturating_sub(PROMPT_HISTORY);
    let recent: Vec<serde_json::Value> = workouts[first..]
        .iter()
        .map(|w| {
            serde_json::json!({
                "date": w.occurred_at.date_naive().to_string(),
                "type": w.category.as_str(),
                "duration": w.duration_minutes,
                "distance": w.distance_km,
                "calories": w.calories_burned,
                "avgHR": w.avg_heart_rate,
                "pace": w.pace_min_per_km.map(|p| round_to(p, 2)),
                "perceivedEffort": w.perceived_effort,
            })
        })
        .collect();

    format!(
        "You are an athletic coach. Analyse this {athlete} ({level}) training block of {days} days: \
         {count} workouts, {duration} minutes, {distance} km.\n\
         Recent workouts: {recent}\n\
         Reply with one JSON object with keys summary, performanceTrends, recoveryScore, strengths, \
         weaknesses, recommendations, injuryRisks, performanceScore, consistencyScore, \
         progressScore and nextSteps (shortTerm, mediumTerm, longTerm). Scores are 1-10.",
        athlete = user.athlete_type.as_str(),
        level = user.fitness_level.as_str(),
        days = stats.period_days,
        count = stats.total_workouts,
        duration = stats.total_duration,
        distance = stats.total_distance,
        recent = serde_json::Value::Array(recent),
    )
}

fn plan_prompt(user: &User, request: &PlanRequest, history: &[WorkoutRecord]) -> String {
    let history: Vec<serde_json::Value> = history
        .iter()
        .take(PROMPT_HISTORY)
        .map(|w| {
            serde_json::json!({
                "date": w.occurred_at.date_naive().to_string(),
                "type": w.category.as_str(),
                "duration": w.duration_minutes,
                "distance": w.distance_km,
                "intensity": w.perceived_effort.unwrap_or(5),
            })
        })
        .collect();

    format!(
        "Create a {weeks}-week training plan for a {athlete} ({level}). Goal: {goal}. \
         Intensity: {intensity}. Focus: {focus}.\n\
         Last 30 days: {history}\n\
         Reply with one JSON object with keys planTitle, goal, durationWeeks, intensityLevel, \
         weeks (weekNumber, focus, goals, totalVolume, days monday..sunday each with workoutType, \
         duration, intensity, description, keyFocus, recoveryStrategies), progressionStrategy, \
         performanceMetrics and notes.",
        weeks = request.duration_weeks,
        athlete = user.athlete_type.as_str(),
        level = user.fitness_level.as_str(),
        goal = request.goal,
        intensity = request.intensity,
        focus = request.focus,
        history = serde_json::Value::Array(history),
    )
}

fn template_insights(workouts: &[WorkoutRecord], stats: &PeriodStatistics) -> InsightReport {
    let mut categories: Vec<WorkoutCategory> = Vec::new();
    for workout in workouts {
        if !categories.contains(&workout.category) {
            categories.push(workout.category);
        }
    }
    let names: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();
    let count = workouts.len();

    InsightReport {
        summary: format!(
            "Based on your {} days of training data, you've completed {} workouts totaling {} minutes. \
             Your primary activities include {}.",
            stats.period_days,
            stats.total_workouts,
            stats.total_duration,
            names.join(", ")
        ),
        performance_trends: vec![
            format!("Consistent {} frequency", names.first().copied().unwrap_or("training")),
            format!("Average workout duration: {} minutes", stats.avg_duration),
            format!(
                "{} workout regularity",
                if count >= 5 { "Good" } else { "Improving" }
            ),
        ],
        recovery_score: if count > 10 { 6.0 } else { 8.0 },
        strengths: strings(&[
            "Commitment to regular training",
            "Variety in workout types",
            "Consistent logging of workouts",
        ]),
        weaknesses: strings(&[
            "Could benefit from more structured training plan",
            "Consider tracking nutrition for optimal performance",
            "Incorporate more recovery-focused activities",
        ]),
        recommendations: strings(&[
            "Add 2 strength training sessions per week",
            "Increase weekly training volume by 10% gradually",
            "Include one active recovery day",
            "Track sleep quality and aim for 7-8 hours",
            "Consider setting specific performance goals",
        ]),
        injury_risks: strings(&[
            "Watch for overuse injuries with high frequency",
            "Ensure proper warm-up before intense sessions",
            "Listen to your body and adjust when needed",
        ]),
        performance_score: if count > 5 { 7.5 } else { 6.5 },
        consistency_score: if count > 8 { 8.0 } else { 7.0 },
        progress_score: 7.0,
        next_steps: NextSteps {
            short_term: "Focus on consistency for the next 2 weeks".into(),
            medium_term: "Increase intensity gradually over the next month".into(),
            long_term: "Set a specific goal like running a 10k or improving strength metrics"
                .into(),
        },
        calculated_stats: stats.clone(),
        period: ReportPeriod::default(),
        generated_at: None,
        ai_generated: false,
        note: Some("Generated from templates; configure GEMINI_API_KEY for AI insights.".into()),
    }
}

fn template_plan(athlete: AthleteType, request: &PlanRequest) -> TrainingPlan {
    let multiplier = intensity_multiplier(&request.intensity);
    let title = athlete.as_str();
    let mut title_chars = title.chars();
    let plan_title = match title_chars.next() {
        Some(first) => format!("{}{} Training Plan", first.to_uppercase(), title_chars.as_str()),
        None => "Training Plan".into(),
    };

    let weeks = (1..=request.duration_weeks)
        .map(|week| WeekPlan {
            week_number: week,
            focus: weekly_focus(week, athlete).into(),
            goals: vec![
                "Complete all scheduled workouts".into(),
                "Focus on proper form and technique".into(),
                "Prioritize recovery between sessions".into(),
            ],
            total_volume: format!("{} minutes", week * 120),
            days: daily_workouts(week, athlete, multiplier),
            recovery_strategies: strings(&[
                "Light stretching after workouts",
                "Stay hydrated (3-4L water daily)",
                "7-8 hours of quality sleep",
                "Active recovery on rest days",
            ]),
        })
        .collect();

    TrainingPlan {
        plan_title,
        goal: request.goal.clone(),
        duration_weeks: request.duration_weeks,
        intensity_level: request.intensity.clone(),
        weeks,
        progression_strategy: "Linear progression with 10% weekly volume increase".into(),
        performance_metrics: strings(&[
            "Workout completion rate",
            "Duration consistency",
            "Perceived effort (RPE)",
            "Recovery quality",
        ]),
        notes: "Generated from templates; configure GEMINI_API_KEY for personalised plans.".into(),
        ai_generated: false,
        generated_for: None,
        generated_at: None,
        athlete_type: None,
        fitness_level: None,
    }
}

fn intensity_multiplier(intensity: &str) -> f64 {
    match intensity {
        "hard" => 1.2,
        "light" => 0.8,
        _ => 1.0,
    }
}

fn weekly_focus(week: u32, athlete: AthleteType) -> &'static str {
    let focuses: &[&'static str] = match athlete {
        AthleteType::Runner => &["Base Building", "Endurance", "Speed Development", "Peak Performance"],
        AthleteType::Cyclist => &["Foundation", "Power", "Endurance", "Peak"],
        AthleteType::Weightlifter => &["Hypertrophy", "Strength", "Power", "Peak"],
        AthleteType::Crossfit => &[
            "Skill Development",
            "Strength",
            "Metabolic Conditioning",
            "Competition Prep",
        ],
        AthleteType::Swimmer => &["Technique", "Endurance", "Speed", "Race Prep"],
    };
    let index = (week.max(1) - 1) as usize;
    focuses[index.min(focuses.len() - 1)]
}

fn minutes(base: f64, multiplier: f64) -> i64 {
    (base * multiplier).round() as i64
}

fn day(workout_type: &str, duration: String, intensity: &str, description: &str, key_focus: &str) -> DayWorkout {
    DayWorkout {
        workout_type: workout_type.into(),
        duration,
        intensity: intensity.into(),
        description: description.into(),
        key_focus: key_focus.into(),
    }
}

fn daily_workouts(week: u32, athlete: AthleteType, multiplier: f64) -> WeekDays {
    match athlete {
        AthleteType::Weightlifter => WeekDays {
            monday: day("Upper Body", "60 min".into(), "7-8", "Bench press, rows, shoulder press, pull-ups", "Strength"),
            tuesday: day("Lower Body", "60 min".into(), "7-8", "Squats, deadlifts, lunges, calf raises", "Power"),
            wednesday: day("Active Recovery", "30 min".into(), "2-3", "Light cardio and mobility work", "Recovery"),
            thursday: day("Upper Body", "60 min".into(), "6-7", "Incline press, lat pulldowns, dips, bicep/tricep work", "Hypertrophy"),
            friday: day("Lower Body", "60 min".into(), "6-7", "Leg press, Romanian deadlifts, leg extensions/curls", "Muscle Building"),
            saturday: day("Full Body/Conditioning", "45 min".into(), "5-6", "Circuit training or metabolic conditioning", "Endurance"),
            sunday: day("Rest", "0".into(), "1", "Complete rest", "Recovery"),
        },
        _ => {
            let range = |low: f64, high: f64| {
                format!("{}-{} min", minutes(low, multiplier), minutes(high, multiplier))
            };
            let long_run = 60.0 + f64::from(week) * 10.0;
            WeekDays {
                monday: day("Easy Run", range(30.0, 45.0), "3-4", "Light conversational pace, focus on form and breathing", "Recovery & Form"),
                tuesday: day("Interval Training", range(45.0, 60.0), "7-8", "Warm up 10min, then 8x400m at fast pace with 90s rest, cool down 10min", "Speed Development"),
                wednesday: day("Cross Training", format!("{} min", minutes(30.0, multiplier)), "2-3", "Yoga, swimming, or cycling for active recovery", "Active Recovery & Mobility"),
                thursday: day("Tempo Run", range(40.0, 50.0), "6-7", "10min warm up, 20min at tempo pace (comfortably hard), 10min cool down", "Lactate Threshold"),
                friday: day("Rest Day", "0".into(), "1", "Complete rest or light walking", "Full Recovery"),
                saturday: day("Long Run", format!("{} min", minutes(long_run, multiplier)), "4-5", "Steady pace long run, focus on endurance and mental toughness", "Endurance Building"),
                sunday: day("Recovery", range(20.0, 30.0), "2-3", "Very easy pace or walk, optional light stretching", "Recovery & Preparation"),
            }
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
