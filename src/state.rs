use crate::calendar_log::CalendarLog;
use crate::config::ConfigManager;
use crate::storage::{CALENDAR_LOG_FILE, CONFIG_FILE, SOUNDS_DIR};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub config: Arc<Mutex<ConfigManager>>,
    pub calendar_log: Arc<Mutex<CalendarLog>>,
}

impl AppState {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            config: Arc::new(Mutex::new(ConfigManager::new(data_dir.join(CONFIG_FILE)))),
            calendar_log: Arc::new(Mutex::new(CalendarLog::new(data_dir.join(CALENDAR_LOG_FILE)))),
            data_dir,
        }
    }

    /// Loads both documents up front so the first request does not pay for it.
    pub async fn load(data_dir: PathBuf) -> Self {
        let state = Self::new(data_dir);
        state.config.lock().await.load_or_create_defaults().await;
        state.calendar_log.lock().await.load_or_create().await;
        state
    }

    pub fn sounds_dir(&self) -> PathBuf {
        self.data_dir.join(SOUNDS_DIR)
    }
}
