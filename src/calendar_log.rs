use chrono::NaiveDate;
use rand::Rng;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::errors::AppError;
use crate::models::{CalendarLogModel, MarkEntry, ToggleOutcome};
use crate::storage::{read_json, write_json, Loaded};

/// Owns `calendar_log.json`: the set of marked days and their stickers.
#[derive(Debug)]
pub struct CalendarLog {
    path: PathBuf,
    log: Option<CalendarLogModel>,
}

impl CalendarLog {
    pub fn new(path: PathBuf) -> Self {
        info!("calendar log path set to {}", path.display());
        Self { path, log: None }
    }

    /// Same policy as the config: create when missing, keep a corrupt file
    /// untouched and start from an empty log in memory.
    pub async fn load_or_create(&mut self) {
        match read_json::<CalendarLogModel>(&self.path).await {
            Loaded::Found(log) => {
                info!("calendar log loaded ({} marked dates)", log.marked_dates.len());
                self.log = Some(log);
            }
            Loaded::Missing => {
                warn!("calendar log not found, creating a new one");
                let log = CalendarLogModel::default();
                if let Err(err) = write_json(&self.path, &log).await {
                    error!("failed to save calendar log: {err}");
                }
                self.log = Some(log);
            }
            Loaded::Corrupt(reason) => {
                error!("calendar log corrupted or invalid: {reason}");
                error!("loading empty log into memory, corrupt file not overwritten");
                self.log = Some(CalendarLogModel::default());
            }
        }
    }

    async fn loaded(&mut self) -> &mut CalendarLogModel {
        if self.log.is_none() {
            debug!("calendar log cache empty, loading");
            self.load_or_create().await;
        }
        self.log.get_or_insert_with(CalendarLogModel::default)
    }

    pub async fn get(&mut self) -> CalendarLogModel {
        self.loaded().await.clone()
    }

    /// Removes the mark if present, otherwise adds one with a rotation drawn
    /// uniformly from `[-max_rotation, max_rotation]`.
    pub async fn toggle(
        &mut self,
        date: NaiveDate,
        sticker: &str,
        max_rotation: i32,
    ) -> Result<ToggleOutcome, AppError> {
        let outcome = {
            let log = self.loaded().await;
            if log.marked_dates.remove(&date).is_some() {
                info!("removed mark for {date}");
                ToggleOutcome::Removed
            } else {
                let limit = max_rotation.abs();
                let rotation = rand::rng().random_range(-limit..=limit);
                let entry = MarkEntry {
                    rotation,
                    sticker: sticker.to_string(),
                };
                log.marked_dates.insert(date, entry.clone());
                info!("added mark for {date} (rotation {rotation})");
                ToggleOutcome::Added { entry }
            }
        };
        self.save().await?;
        Ok(outcome)
    }

    pub async fn reset(&mut self) -> Result<CalendarLogModel, AppError> {
        warn!("resetting calendar log");
        self.loaded().await.marked_dates.clear();
        self.save().await?;
        Ok(CalendarLogModel::default())
    }

    async fn save(&self) -> Result<(), AppError> {
        match &self.log {
            Some(log) => write_json(&self.path, log).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::temp_dir;
    use tokio::fs;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[tokio::test]
    async fn toggle_adds_then_removes() {
        let dir = temp_dir("log_toggle");
        let path = dir.join("calendar_log.json");
        let mut log = CalendarLog::new(path.clone());

        match log.toggle(day(2), "X", 15).await.unwrap() {
            ToggleOutcome::Added { entry } => {
                assert_eq!(entry.sticker, "X");
                assert!((-15..=15).contains(&entry.rotation));
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut reloaded = CalendarLog::new(path);
        assert!(reloaded.get().await.marked_dates.contains_key(&day(2)));

        assert_eq!(log.toggle(day(2), "X", 15).await.unwrap(), ToggleOutcome::Removed);
        assert!(log.get().await.marked_dates.is_empty());

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn zero_rotation_limit_gives_upright_stickers() {
        let dir = temp_dir("log_zero");
        let mut log = CalendarLog::new(dir.join("calendar_log.json"));
        match log.toggle(day(3), "*", 0).await.unwrap() {
            ToggleOutcome::Added { entry } => assert_eq!(entry.rotation, 0),
            other => panic!("unexpected {other:?}"),
        }
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let dir = temp_dir("log_reset");
        let mut log = CalendarLog::new(dir.join("calendar_log.json"));
        log.toggle(day(4), "X", 10).await.unwrap();
        log.toggle(day(5), "X", 10).await.unwrap();

        let fresh = log.reset().await.unwrap();
        assert!(fresh.marked_dates.is_empty());
        assert!(log.get().await.marked_dates.is_empty());

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn corrupt_log_starts_empty_and_is_kept() {
        let dir = temp_dir("log_corrupt");
        fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("calendar_log.json");
        fs::write(&path, b"{ \"marked_dates\": 7").await.unwrap();

        let mut log = CalendarLog::new(path.clone());
        assert!(log.get().await.marked_dates.is_empty());
        assert_eq!(fs::read(&path).await.unwrap(), b"{ \"marked_dates\": 7");

        let _ = fs::remove_dir_all(&dir).await;
    }
}
