use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::errors::AppError;
use crate::models::{AppConfig, CustomTimer};
use crate::storage::{read_json, write_json, Loaded};
use crate::wheel::MAX_WHEEL_OPTIONS;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Defaults written on first launch, with two sample custom timers.
pub fn initial_config() -> AppConfig {
    let mut config = AppConfig::default();
    let samples = [("Since we met", 2023), ("Engagement", 2024)];
    for (label, year) in samples {
        if let Some(date) = NaiveDate::from_ymd_opt(year, 1, 1).and_then(|d| d.and_hms_opt(12, 0, 0)) {
            config.timers.custom_timers.push(CustomTimer::new(label, date));
        }
    }
    config
}

pub fn validate(config: &AppConfig) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    let mut check_range = |field: &str, value: f64, min: f64, max: f64| {
        if !(min..=max).contains(&value) {
            errors.push(FieldError::new(field, format!("must be between {min} and {max}")));
        }
    };
    check_range("blur_strength", config.blur_strength, 0.0, 20.0);
    check_range("sticker_scale", config.sticker_scale, 0.1, 10.0);
    check_range("arrival_day.sticker_scale", config.arrival_day.sticker_scale, 0.1, 10.0);
    check_range(
        "sticker_random_rotation_max",
        f64::from(config.sticker_random_rotation_max),
        0.0,
        180.0,
    );

    let mut check_len = |field: String, value: &str, max: usize| {
        if value.chars().count() > max {
            errors.push(FieldError::new(field, format!("must be at most {max} characters")));
        }
    };
    check_len("sticker_emoji".into(), &config.sticker_emoji, 2);
    check_len("effect_particle_day".into(), &config.effect_particle_day, 2);
    check_len("timers.timer_completed_message".into(), &config.timers.timer_completed_message, 20);
    check_len("timers.arrival_timer_text".into(), &config.timers.arrival_timer_text, 50);
    check_len("timers.relationship_timer_text".into(), &config.timers.relationship_timer_text, 50);
    for (i, timer) in config.timers.custom_timers.iter().enumerate() {
        check_len(format!("timers.custom_timers[{i}].label"), &timer.label, 50);
    }
    for (i, option) in config.wheel_options.iter().enumerate() {
        check_len(format!("wheel_options[{i}].label"), &option.label, 100);
    }

    if config.wheel_options.len() > MAX_WHEEL_OPTIONS {
        errors.push(FieldError::new(
            "wheel_options",
            format!("at most {MAX_WHEEL_OPTIONS} options"),
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Owns `config.json` and the cached configuration.
#[derive(Debug)]
pub struct ConfigManager {
    path: PathBuf,
    config: Option<AppConfig>,
}

impl ConfigManager {
    pub fn new(path: PathBuf) -> Self {
        info!("config path set to {}", path.display());
        Self { path, config: None }
    }

    /// Missing file: defaults are created and written. Corrupt file: defaults
    /// are used in memory and the file is left alone for manual recovery.
    pub async fn load_or_create_defaults(&mut self) {
        match read_json::<AppConfig>(&self.path).await {
            Loaded::Found(config) => {
                info!("config loaded from {}", self.path.display());
                self.config = Some(config);
            }
            Loaded::Missing => {
                info!("config file not found, creating defaults");
                let config = initial_config();
                if let Err(err) = write_json(&self.path, &config).await {
                    error!("failed to save default config: {err}");
                }
                self.config = Some(config);
            }
            Loaded::Corrupt(reason) => {
                error!("config corrupted or invalid: {reason}");
                warn!("using default config in memory, corrupt file not overwritten");
                self.config = Some(initial_config());
            }
        }
    }

    pub async fn get(&mut self) -> AppConfig {
        if let Some(config) = &self.config {
            return config.clone();
        }
        debug!("config cache empty, loading");
        self.load_or_create_defaults().await;
        self.config.clone().unwrap_or_else(initial_config)
    }

    pub async fn update(&mut self, raw: Value) -> Result<AppConfig, AppError> {
        let mut config: AppConfig = serde_json::from_value(raw).map_err(|err| {
            warn!("config rejected: {err}");
            AppError::bad_request("Validation failed")
                .with_details(serde_json::json!([{ "field": "", "message": err.to_string() }]))
        })?;

        if let Err(errors) = validate(&config) {
            warn!("config validation failed: {errors:?}");
            return Err(AppError::bad_request("Validation failed")
                .with_details(serde_json::to_value(&errors)?));
        }

        if config.is_first_launch {
            info!("first launch setup complete");
            config.is_first_launch = false;
        }

        write_json(&self.path, &config).await?;
        info!("config updated and saved");
        self.config = Some(config.clone());
        Ok(config)
    }

    /// Moves the current file aside as `config.backup.<timestamp>.json` and
    /// starts over from defaults. The backup is moved back if that fails.
    pub async fn backup_and_reset(&mut self) -> Result<AppConfig, AppError> {
        let backup = self.backup_path();
        let had_file = fs::try_exists(&self.path).await.unwrap_or(false);
        if had_file {
            info!("creating config backup {}", backup.display());
            fs::rename(&self.path, &backup).await?;
        } else {
            info!("config not found, skipping backup");
        }

        let config = initial_config();
        if let Err(err) = write_json(&self.path, &config).await {
            error!("config reset failed: {err}");
            if had_file {
                match fs::rename(&backup, &self.path).await {
                    Ok(()) => info!("rolled back to backup config"),
                    Err(restore) => error!("backup restore failed: {restore}"),
                }
            }
            return Err(err);
        }

        warn!("configuration reset to defaults");
        self.config = Some(config.clone());
        Ok(config)
    }

    fn backup_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("config");
        let stamp = Local::now().format("%Y-%m-%dT%H-%M-%S");
        self.path.with_file_name(format!("{stem}.backup.{stamp}.json"))
    }
}
