use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/static/lang/:file", get(handlers::get_lang_table))
        .route("/api/config", get(handlers::get_config).post(handlers::update_config))
        .route("/api/config/defaults", get(handlers::get_default_config))
        .route("/api/config/reset_all", post(handlers::reset_all_config))
        .route("/api/calendar_log", get(handlers::get_calendar_log))
        .route("/api/calendar/toggle", post(handlers::toggle_calendar_date))
        .route("/api/calendar/reset", post(handlers::reset_calendar))
        .route("/api/calendar/months", get(handlers::get_calendar_months))
        .route("/api/audio_manifest", get(handlers::get_audio_manifest))
        .route("/api/audio/:category/:filename", get(handlers::serve_audio_file))
        .route("/api/wheel/sectors", get(handlers::get_wheel_sectors))
        .route("/api/wheel/spin", post(handlers::spin_wheel))
        .route("/api/timers", get(handlers::get_timers))
        .with_state(state)
}
