use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::wheel::WheelOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "ru" => Some(Language::Ru),
            "en" => Some(Language::En),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub color_background: String,
    pub color_text: String,
    pub color_text_emphasis: String,
    pub color_accent_primary: String,
    pub color_accent_secondary: String,
    pub color_divider: String,
    pub color_glow_effect: String,
    pub color_glow_shadow: String,
    pub color_timer_arrival_bg: String,
    pub color_timer_relationship_bg: String,
    pub color_timer_custom_bg: String,
    pub color_timer_custom_bg_hover: String,
    pub color_timer_countdown: String,
    pub color_timer_elapsed: String,
    pub color_nav_active_indicator: String,
    pub color_arrival_highlight_bg: String,
    pub color_arrival_highlight_sticker: String,
    pub color_calendar_day_bg: String,
    pub color_calendar_marked_day_bg: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            color_background: "#141414".into(),
            color_text: "#E8EAED".into(),
            color_text_emphasis: "#FFFFFF".into(),
            color_accent_primary: "#F48FB1".into(),
            color_accent_secondary: "#2A2A2A".into(),
            color_divider: "#444444".into(),
            color_glow_effect: "#F48FB1".into(),
            color_glow_shadow: "#E91E63".into(),
            color_timer_arrival_bg: "#2A2A2A".into(),
            color_timer_relationship_bg: "#2A2A2A".into(),
            color_timer_custom_bg: "#212121".into(),
            color_timer_custom_bg_hover: "#313131".into(),
            color_timer_countdown: "#F48FB1".into(),
            color_timer_elapsed: "#AECBFA".into(),
            color_nav_active_indicator: "#F48FB1".into(),
            color_arrival_highlight_bg: "#4E353F".into(),
            color_arrival_highlight_sticker: "#F48FB1".into(),
            color_calendar_day_bg: "rgba(0,0,0,0.4)".into(),
            color_calendar_marked_day_bg: "#5C3A47".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrivalDayConfig {
    pub use_bg: bool,
    pub bg_color: String,
    pub use_sticker: bool,
    pub sticker_emoji: String,
    pub sticker_scale: f64,
}

impl Default for ArrivalDayConfig {
    fn default() -> Self {
        Self {
            use_bg: true,
            bg_color: "#4E353F".into(),
            use_sticker: true,
            sticker_emoji: "💖".into(),
            sticker_scale: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomTimer {
    pub id: String,
    pub enabled: bool,
    pub label: String,
    #[serde(with = "flexible_datetime")]
    pub date: NaiveDateTime,
}

impl CustomTimer {
    pub fn new(label: impl Into<String>, date: NaiveDateTime) -> Self {
        Self {
            label: label.into(),
            date,
            ..Self::default()
        }
    }
}

impl Default for CustomTimer {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            enabled: true,
            label: "New Timer".into(),
            date: now_naive(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub limit_text_length: bool,
    pub timer_completed_message: String,
    pub arrival_timer_enabled: bool,
    pub arrival_timer_text: String,
    pub relationship_timer_enabled: bool,
    pub relationship_timer_text: String,
    pub custom_timers: Vec<CustomTimer>,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            limit_text_length: true,
            timer_completed_message: "It happened!".into(),
            arrival_timer_enabled: true,
            arrival_timer_text: "Time until arrival".into(),
            relationship_timer_enabled: true,
            relationship_timer_text: "We have been together".into(),
            custom_timers: Vec::new(),
        }
    }
}

/// Root document persisted as `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub is_first_launch: bool,
    pub language: Language,
    pub animations_enabled: bool,
    pub effects_enabled: bool,
    pub blur_strength: f64,

    #[serde(with = "flexible_datetime", alias = "date_vova_departure")]
    pub date_departure: NaiveDateTime,
    #[serde(with = "flexible_datetime", alias = "date_vova_arrival")]
    pub date_arrival: NaiveDateTime,
    #[serde(with = "flexible_datetime")]
    pub date_relationship_start: NaiveDateTime,

    pub timers: TimerConfig,
    pub wheel_options: Vec<WheelOption>,

    pub sticker_emoji: String,
    pub sticker_color: String,
    pub sticker_scale: f64,
    pub sticker_random_rotation_max: i32,

    pub arrival_day: ArrivalDayConfig,
    pub calendar_empty_cell_color: String,
    pub calendar_marked_day_color: String,
    pub calendar_save_zoom: bool,

    pub effect_particle_day: String,

    pub colors: ColorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = now_naive();
        Self {
            is_first_launch: true,
            language: Language::default(),
            animations_enabled: true,
            effects_enabled: true,
            blur_strength: 1.5,
            date_departure: now,
            date_arrival: now,
            date_relationship_start: now,
            timers: TimerConfig::default(),
            wheel_options: Vec::new(),
            sticker_emoji: "X".into(),
            sticker_color: "#F48FB1".into(),
            sticker_scale: 1.0,
            sticker_random_rotation_max: 15,
            arrival_day: ArrivalDayConfig::default(),
            calendar_empty_cell_color: "rgba(0, 0, 0, 0.15)".into(),
            calendar_marked_day_color: "#5C3A47".into(),
            calendar_save_zoom: false,
            effect_particle_day: "💖".into(),
            colors: ColorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkEntry {
    pub rotation: i32,
    pub sticker: String,
}

pub type MarkedDates = BTreeMap<NaiveDate, MarkEntry>;

/// Root document persisted as `calendar_log.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CalendarLogModel {
    #[serde(default)]
    pub marked_dates: MarkedDates,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToggleOutcome {
    Added { entry: MarkEntry },
    Removed,
}

pub type AudioManifest = BTreeMap<String, Vec<String>>;

#[derive(Debug, Serialize, Deserialize)]
pub struct SpinResponse {
    pub sector_index: usize,
    /// Final clockwise rotation of the wheel in degrees, `[0, 360)`.
    pub angle: f64,
    pub option: WheelOption,
    pub ticks: u32,
    pub crossings: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub id: String,
    pub label: String,
    pub mode: crate::timer::TimerMode,
    pub text: String,
}

pub fn now_naive() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Accepts `YYYY-MM-DDTHH:MM:SS[.f]`, `YYYY-MM-DD HH:MM[:SS]` and plain
/// `YYYY-MM-DD` (midnight), writes the first form.
pub mod flexible_datetime {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid datetime: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(value) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(value);
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }
}
