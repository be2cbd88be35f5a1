pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod gemini;
pub mod handlers;
pub mod import;
pub mod insights;
pub mod models;
pub mod pdf;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use stats::StatsAggregator;
pub use storage::{JsonFileStore, RecordStore, UserStore};
