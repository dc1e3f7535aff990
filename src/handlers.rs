use crate::audio;
use crate::calendar::{build_months, CalendarInput, MonthGrid};
use crate::errors::AppError;
use crate::i18n;
use crate::models::{
    now_naive, AppConfig, AudioManifest, CalendarLogModel, Language, SpinResponse, TimerSnapshot,
    ToggleOutcome, ToggleRequest,
};
use crate::state::AppState;
use crate::timer;
use crate::ui::render_index;
use crate::wheel::{generate_sectors, WheelLayout, WheelSimulation};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

/// One minute of frames at 60 fps is far beyond any real spin.
const MAX_SPIN_TICKS: u32 = 60 * 60 * 10;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let config = state.config.lock().await.get().await;
    Html(render_index(&config))
}

pub async fn get_config(State(state): State<AppState>) -> Json<AppConfig> {
    Json(state.config.lock().await.get().await)
}

pub async fn update_config(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AppConfig>, AppError> {
    let body = match payload {
        Ok(Json(body)) if !is_empty_body(&body) => body,
        _ => {
            warn!("update config attempt with empty body");
            return Err(AppError::bad_request("Request body must contain JSON data"));
        }
    };

    let updated = state.config.lock().await.update(body).await?;
    Ok(Json(updated))
}

pub async fn get_default_config() -> Json<AppConfig> {
    info!("serving default configuration");
    Json(AppConfig::default())
}

pub async fn reset_all_config(State(state): State<AppState>) -> Result<Json<AppConfig>, AppError> {
    warn!("full config reset requested");
    let config = state.config.lock().await.backup_and_reset().await?;
    Ok(Json(config))
}

pub async fn get_calendar_log(State(state): State<AppState>) -> Json<CalendarLogModel> {
    Json(state.calendar_log.lock().await.get().await)
}

pub async fn toggle_calendar_date(
    State(state): State<AppState>,
    payload: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<Json<ToggleOutcome>, AppError> {
    let Some(raw) = payload.ok().and_then(|Json(request)| request.date) else {
        return Err(AppError::bad_request("Missing 'date' key in request body"));
    };
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        warn!("invalid date format in toggle: {raw}");
        AppError::bad_request("Invalid date format, use YYYY-MM-DD")
    })?;

    let (sticker, max_rotation) = {
        let config = state.config.lock().await.get().await;
        (config.sticker_emoji, config.sticker_random_rotation_max)
    };
    let outcome = state
        .calendar_log
        .lock()
        .await
        .toggle(date, &sticker, max_rotation)
        .await?;
    Ok(Json(outcome))
}

pub async fn reset_calendar(State(state): State<AppState>) -> Result<Json<CalendarLogModel>, AppError> {
    let log = state.calendar_log.lock().await.reset().await?;
    info!("calendar log cleared");
    Ok(Json(log))
}

pub async fn get_calendar_months(State(state): State<AppState>) -> Result<Json<Vec<MonthGrid>>, AppError> {
    let config = state.config.lock().await.get().await;
    let log = state.calendar_log.lock().await.get().await;
    let labels = i18n::bundled(config.language)?.weekday_short_labels();

    let months = build_months(&CalendarInput {
        departure: config.date_departure.date(),
        arrival: config.date_arrival.date(),
        marked: &log.marked_dates,
        language: config.language,
        weekday_labels: &labels,
        sticker_scale: config.sticker_scale,
    });
    Ok(Json(months))
}

pub async fn get_audio_manifest(State(state): State<AppState>) -> Result<Json<AudioManifest>, AppError> {
    info!("[AUDIO] requesting manifest");
    Ok(Json(audio::build_manifest(&state.sounds_dir()).await?))
}

pub async fn serve_audio_file(
    State(state): State<AppState>,
    Path((category, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = audio::read_sound(&state.sounds_dir(), &category, &filename).await?;
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], bytes))
}

pub async fn get_wheel_sectors(State(state): State<AppState>) -> Json<WheelLayout> {
    let config = state.config.lock().await.get().await;
    Json(wheel_layout(&config))
}

/// Spins the configured wheel headlessly until it rests and reports the
/// option under the pointer.
pub async fn spin_wheel(State(state): State<AppState>) -> Json<SpinResponse> {
    let config = state.config.lock().await.get().await;
    let layout = wheel_layout(&config);

    let mut simulation = WheelSimulation::new();
    simulation.set_layout(&layout);
    simulation.spin();
    let summary = simulation.run_until_stopped(MAX_SPIN_TICKS, &mut ());

    let sector_index = layout.sector_under_pointer(simulation.angle());
    let option = layout
        .options()
        .nth(sector_index)
        .unwrap_or_else(crate::wheel::WheelOption::placeholder);
    info!(
        "wheel stopped on '{}' after {} frames",
        option.label, summary.ticks
    );

    Json(SpinResponse {
        sector_index,
        angle: simulation.angle(),
        option,
        ticks: summary.ticks,
        crossings: summary.crossings,
    })
}

pub async fn get_timers(State(state): State<AppState>) -> Json<Vec<TimerSnapshot>> {
    let config = state.config.lock().await.get().await;
    Json(timer::snapshots(&config, now_naive()))
}

pub async fn get_lang_table(Path(file): Path<String>) -> Result<impl IntoResponse, AppError> {
    let language = file
        .strip_suffix(".json")
        .and_then(Language::from_code)
        .ok_or_else(|| AppError::not_found(format!("unknown language file: {file}")))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], i18n::raw_table(language)))
}

fn wheel_layout(config: &AppConfig) -> WheelLayout {
    generate_sectors(&config.wheel_options, &config.colors.color_accent_primary)
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
