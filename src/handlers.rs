use crate::auth::{validate_registration, AuthenticatedOwner};
use crate::errors::{ApiJson, ApiQuery, AppError, Error};
use crate::import::workouts_from_csv;
use crate::insights::{InsightReport, PlanRequest, TrainingPlan};
use crate::models::{
    parse_range_bound, range_end, range_start, AuthResponse, LoginRequest,
    MonthlyStatsResponse, NewWorkout, OwnerId, Pagination, ProfileUpdate, RangeEdge,
    RegisterRequest, ReportPeriod, StatsOverview, User, WorkoutCategory, WorkoutList,
    WorkoutQuery, WorkoutRecord, WorkoutResponse, WorkoutUpdate,
};
use crate::pdf::{render_training_plan, render_workout_log};
use crate::state::AppState;
use crate::stats::StatsAggregator;
use crate::storage::{RecordStore, UserStore};
use crate::ui::render_index;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

/// Lookback used to give the plan generator recent context.
const PLAN_HISTORY_DAYS: i64 = 30;

/// Default span of an exported workout log.
const LOG_EXPORT_DAYS: i64 = 30;

const CSV_EXTENSIONS: [&str; 2] = ["csv", "txt"];

type ApiResult<T> = Result<Json<T>, AppError>;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InsightRequest {
    #[serde(default)]
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanExportRequest {
    #[serde(default)]
    pub plan_data: Option<Value>,
    #[serde(default)]
    pub start_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogExportQuery {
    #[serde(default, deserialize_with = "range_start")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "range_end")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, rename = "type")]
    pub category: Option<WorkoutCategory>,
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(state.insights.is_available()))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now(),
        "aiAvailable": state.insights.is_available(),
    }))
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    validate_registration(&payload)?;

    let user = User {
        id: OwnerId::new(),
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_lowercase(),
        password_hash: state.auth.hash_password(&payload.password).await?,
        athlete_type: payload.athlete_type.unwrap_or_default(),
        fitness_level: payload.fitness_level.unwrap_or_default(),
        age: payload.age,
        weight: payload.weight,
        height: payload.height,
        created_at: Utc::now(),
    };
    let user = state.store.insert_user(user).await?;
    let token = state.auth.issue_token(&user)?;
    info!(owner = %user.id, "registered user");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".into(),
            token,
            user: user.profile(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let user = state
        .store
        .find_user_by_email(&payload.email)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;
    if !state
        .auth
        .verify_password(&payload.password, &user.password_hash)
        .await?
    {
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let token = state.auth.issue_token(&user)?;
    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        token,
        user: user.profile(),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
) -> ApiResult<Value> {
    let user = load_user(&state, owner).await?;
    Ok(Json(json!({ "user": user.profile() })))
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<Value> {
    let mut user = load_user(&state, owner).await?;

    if let Some(name) = update.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("Name cannot be empty"));
        }
        user.name = name.to_string();
    }
    if let Some(athlete_type) = update.athlete_type {
        user.athlete_type = athlete_type;
    }
    if let Some(fitness_level) = update.fitness_level {
        user.fitness_level = fitness_level;
    }
    if update.age.is_some() {
        user.age = update.age;
    }
    if update.weight.is_some() {
        user.weight = update.weight;
    }
    if update.height.is_some() {
        user.height = update.height;
    }

    if !state.store.replace_user(user.clone()).await? {
        return Err(Error::NotFound("User not found".into()).into());
    }
    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": user.profile(),
    })))
}

pub async fn create_workout(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(payload): ApiJson<NewWorkout>,
) -> Result<(StatusCode, Json<WorkoutResponse>), AppError> {
    let record = WorkoutRecord::create(owner, payload, Utc::now())?;
    let workout = state.store.insert_workout(record).await?;
    info!(%owner, workout = %workout.id, category = workout.category.as_str(), "logged workout");

    Ok((
        StatusCode::CREATED,
        Json(WorkoutResponse {
            message: "Workout logged successfully".into(),
            workout,
        }),
    ))
}

pub async fn list_workouts(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiQuery(query): ApiQuery<WorkoutQuery>,
) -> ApiResult<WorkoutList> {
    let (workouts, total) = state.store.list_workouts(owner, &query).await?;
    let limit = query.limit.max(1);
    Ok(Json(WorkoutList {
        workouts,
        pagination: Pagination {
            total,
            page: query.page.max(1),
            limit,
            pages: total.div_ceil(limit),
        },
    }))
}

/// Accepts a multipart upload with the CSV in its `file` field.
pub async fn import_csv(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let accepted = field
            .file_name()
            .and_then(|name| std::path::Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| CSV_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
        if !accepted {
            return Err(AppError::bad_request("Only CSV files are allowed"));
        }
        upload = Some(field.bytes().await?);
        break;
    }
    let bytes = upload.ok_or_else(|| AppError::bad_request("No file uploaded"))?;

    let import = workouts_from_csv(owner, &bytes, Utc::now());
    if import.workouts.is_empty() {
        return Err(AppError::bad_request("No valid workout data found in CSV"));
    }
    let workouts = state.store.insert_workouts(import.workouts).await?;
    info!(%owner, imported = workouts.len(), skipped = import.skipped, "imported csv workouts");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Successfully imported {} workouts", workouts.len()),
            "count": workouts.len(),
            "skipped": import.skipped,
            "workouts": workouts,
        })),
    ))
}

pub async fn get_workout(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let workout = state
        .store
        .find_workout(owner, workout_id(&id)?)
        .await?
        .ok_or_else(workout_not_found)?;
    Ok(Json(json!({ "workout": workout })))
}

pub async fn update_workout(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<WorkoutUpdate>,
) -> ApiResult<WorkoutResponse> {
    let mut workout = state
        .store
        .find_workout(owner, workout_id(&id)?)
        .await?
        .ok_or_else(workout_not_found)?;

    workout.apply(update, Utc::now())?;
    if !state.store.replace_workout(workout.clone()).await? {
        return Err(workout_not_found().into());
    }

    Ok(Json(WorkoutResponse {
        message: "Workout updated successfully".into(),
        workout,
    }))
}

pub async fn delete_workout(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    if !state.store.delete_workout(owner, workout_id(&id)?).await? {
        return Err(workout_not_found().into());
    }
    info!(%owner, workout = %id, "deleted workout");
    Ok(Json(json!({ "message": "Workout deleted successfully" })))
}

pub async fn stats_overview(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> ApiResult<StatsOverview> {
    let period = ReportPeriod::parse(query.period.as_deref());
    let stats = StatsAggregator::new(state.store.as_ref())
        .get_stats_overview(owner, period)
        .await?;
    Ok(Json(stats))
}

pub async fn stats_monthly(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiQuery(query): ApiQuery<YearQuery>,
) -> ApiResult<MonthlyStatsResponse> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let monthly_stats = StatsAggregator::new(state.store.as_ref())
        .compute_monthly_summary(owner, year)
        .await?;
    Ok(Json(MonthlyStatsResponse {
        year,
        monthly_stats,
    }))
}

pub async fn insights(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    payload: Option<Json<InsightRequest>>,
) -> ApiResult<InsightReport> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let period = ReportPeriod::parse(request.period.as_deref());
    let user = load_user(&state, owner).await?;

    let now = Utc::now();
    let workouts = state
        .store
        .workouts_between(owner, now - Duration::days(period.days()), None)
        .await?;
    let report = state.insights.insights(&user, period, &workouts, now).await?;
    Ok(Json(report))
}

pub async fn training_plan(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    payload: Option<Json<PlanRequest>>,
) -> ApiResult<TrainingPlan> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let user = load_user(&state, owner).await?;

    let now = Utc::now();
    let mut history = state
        .store
        .workouts_between(owner, now - Duration::days(PLAN_HISTORY_DAYS), None)
        .await?;
    history.reverse();

    let plan = state
        .insights
        .training_plan(&user, &request, &history, now)
        .await?;
    Ok(Json(plan))
}

pub async fn training_plan_pdf(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(request): ApiJson<PlanExportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let plan: TrainingPlan = request
        .plan_data
        .and_then(|plan| serde_json::from_value(plan).ok())
        .filter(|plan: &TrainingPlan| !plan.weeks.is_empty())
        .ok_or_else(|| AppError::bad_request("Invalid training plan data"))?;
    let user = load_user(&state, owner).await?;

    let now = Utc::now();
    let start = request
        .start_date
        .as_deref()
        .and_then(|raw| parse_range_bound(raw, RangeEdge::Start))
        .unwrap_or(now);
    let bytes = rendered(move || render_training_plan(&user, &plan, start, now)).await?;
    Ok(pdf_attachment("training-plan", now, bytes))
}

pub async fn workout_log_pdf(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiQuery(query): ApiQuery<LogExportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = load_user(&state, owner).await?;
    let now = Utc::now();
    let start = query
        .start_date
        .unwrap_or_else(|| now - Duration::days(LOG_EXPORT_DAYS));
    let end = query.end_date.unwrap_or(now);

    let mut workouts = state.store.workouts_between(owner, start, None).await?;
    workouts.retain(|w| w.occurred_at <= end && query.category.is_none_or(|c| w.category == c));
    workouts.reverse();

    let bytes = rendered(move || render_workout_log(&user, &workouts, start, end, now)).await?;
    Ok(pdf_attachment("workout-log", now, bytes))
}

async fn rendered(
    render: impl FnOnce() -> crate::errors::Result<Vec<u8>> + Send + 'static,
) -> Result<Vec<u8>, AppError> {
    let bytes = tokio::task::spawn_blocking(render)
        .await
        .map_err(|err| Error::Internal(format!("pdf rendering task failed: {err}")))??;
    Ok(bytes)
}

fn pdf_attachment(name: &str, now: DateTime<Utc>, bytes: Vec<u8>) -> impl IntoResponse {
    let disposition = format!(
        "attachment; filename=\"{name}-{}.pdf\"",
        now.timestamp_millis()
    );
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
}

async fn load_user(state: &AppState, owner: OwnerId) -> Result<User, AppError> {
    state
        .store
        .find_user(owner)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".into()).into())
}

fn workout_id(raw: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw.trim()).map_err(|_| workout_not_found())
}

fn workout_not_found() -> Error {
    Error::NotFound("Workout not found".into())
}
