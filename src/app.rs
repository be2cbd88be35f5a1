use crate::handlers;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Largest CSV upload accepted.
const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub fn router(state: AppState, cors_origin: &str) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/health", get(handlers::health))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/me", get(handlers::me))
        .route("/api/users/profile", put(handlers::update_profile))
        .route(
            "/api/workouts",
            get(handlers::list_workouts).post(handlers::create_workout),
        )
        .route(
            "/api/workouts/upload/csv",
            post(handlers::import_csv).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route("/api/workouts/stats/overview", get(handlers::stats_overview))
        .route("/api/workouts/stats/monthly", get(handlers::stats_monthly))
        .route(
            "/api/workouts/:id",
            get(handlers::get_workout)
                .put(handlers::update_workout)
                .delete(handlers::delete_workout),
        )
        .route("/api/ai/insights", post(handlers::insights))
        .route("/api/ai/training-plan", post(handlers::training_plan))
        .route("/api/pdf/training-plan", post(handlers::training_plan_pdf))
        .route("/api/pdf/workout-log", get(handlers::workout_log_pdf))
        .layer(cors(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `*` or an empty value allows any origin; otherwise a comma-separated list.
fn cors(origins: &str) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    let allow_origin = if parsed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
}
