//! Client-side application state.
//!
//! One owned [`Shell`] holds everything the UI mutates: the loaded config and
//! its editable copy, the marked days, the wheel options and the UI flags.
//! Derived views (calendar months, wheel layout) are recomputed on demand
//! after each mutation. All server traffic goes through a [`Backend`].

use chrono::NaiveDate;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::calendar::{build_months, CalendarInput, CalendarZoom, CompletionTracker, MonthGrid};
use crate::i18n::{self, Translations};
use crate::models::{
    AppConfig, AudioManifest, CalendarLogModel, Language, MarkEntry, MarkedDates, ToggleOutcome,
};
use crate::state::AppState;
use crate::timer::{self, TickerHandle, Ticker, TimerMode};
use crate::wheel::{
    generate_sectors, AnimationLoop, Tick, WheelHooks, WheelLayout, WheelOption, WheelSimulation,
    MAX_WHEEL_OPTIONS,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub enum ShellError {
    Request(String),
    Timeout,
    SaveInProgress,
    NotLoaded,
    TooManyOptions,
    UnknownField(String),
}

impl std::fmt::Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellError::Request(message) => write!(f, "request failed: {message}"),
            ShellError::Timeout => write!(f, "request timed out"),
            ShellError::SaveInProgress => write!(f, "a save is already in progress"),
            ShellError::NotLoaded => write!(f, "application data is not loaded"),
            ShellError::TooManyOptions => {
                write!(f, "the wheel holds at most {MAX_WHEEL_OPTIONS} options")
            }
            ShellError::UnknownField(field) => write!(f, "unknown settings field: {field}"),
        }
    }
}

impl std::error::Error for ShellError {}

/// The REST API as seen from the UI.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn fetch_config(&self) -> Result<AppConfig, ShellError>;
    async fn fetch_defaults(&self) -> Result<AppConfig, ShellError>;
    async fn fetch_calendar_log(&self) -> Result<CalendarLogModel, ShellError>;
    async fn fetch_lang(&self, language: Language) -> Result<Translations, ShellError>;
    async fn fetch_audio_manifest(&self) -> Result<AudioManifest, ShellError>;
    async fn toggle_date(&self, date: NaiveDate) -> Result<ToggleOutcome, ShellError>;
    async fn reset_calendar(&self) -> Result<CalendarLogModel, ShellError>;
    async fn save_config(&self, config: &AppConfig) -> Result<AppConfig, ShellError>;
    async fn reset_all(&self) -> Result<AppConfig, ShellError>;
}

/// Talks to the managers of an in-process [`AppState`] instead of HTTP.
#[derive(Clone)]
pub struct LocalBackend {
    state: AppState,
}

impl LocalBackend {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

fn request_error(err: crate::errors::AppError) -> ShellError {
    ShellError::Request(err.message)
}

impl Backend for LocalBackend {
    async fn fetch_config(&self) -> Result<AppConfig, ShellError> {
        Ok(self.state.config.lock().await.get().await)
    }

    async fn fetch_defaults(&self) -> Result<AppConfig, ShellError> {
        Ok(AppConfig::default())
    }

    async fn fetch_calendar_log(&self) -> Result<CalendarLogModel, ShellError> {
        Ok(self.state.calendar_log.lock().await.get().await)
    }

    async fn fetch_lang(&self, language: Language) -> Result<Translations, ShellError> {
        i18n::bundled(language).map_err(|err| ShellError::Request(err.to_string()))
    }

    async fn fetch_audio_manifest(&self) -> Result<AudioManifest, ShellError> {
        crate::audio::build_manifest(&self.state.sounds_dir())
            .await
            .map_err(request_error)
    }

    async fn toggle_date(&self, date: NaiveDate) -> Result<ToggleOutcome, ShellError> {
        let config = self.state.config.lock().await.get().await;
        self.state
            .calendar_log
            .lock()
            .await
            .toggle(date, &config.sticker_emoji, config.sticker_random_rotation_max)
            .await
            .map_err(request_error)
    }

    async fn reset_calendar(&self) -> Result<CalendarLogModel, ShellError> {
        self.state.calendar_log.lock().await.reset().await.map_err(request_error)
    }

    async fn save_config(&self, config: &AppConfig) -> Result<AppConfig, ShellError> {
        let raw = serde_json::to_value(config).map_err(|err| ShellError::Request(err.to_string()))?;
        self.state.config.lock().await.update(raw).await.map_err(request_error)
    }

    async fn reset_all(&self) -> Result<AppConfig, ShellError> {
        self.state
            .config
            .lock()
            .await
            .backup_and_reset()
            .await
            .map_err(request_error)
    }
}

async fn with_timeout<T>(
    limit: Duration,
    request: impl Future<Output = Result<T, ShellError>>,
) -> Result<T, ShellError> {
    tokio::time::timeout(limit, request)
        .await
        .map_err(|_| ShellError::Timeout)?
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Main,
    Calendar,
    Wheel,
    Settings,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub current_page: Page,
    pub is_loaded: bool,
    pub error: Option<String>,
    pub is_dirty: bool,
    pub is_saving: bool,
    pub hover: Option<String>,
    pub notice: Option<String>,
}

pub struct Shell<B> {
    backend: B,
    request_timeout: Duration,
    config: Option<AppConfig>,
    form: Option<AppConfig>,
    defaults: Option<AppConfig>,
    marked: MarkedDates,
    lang: Translations,
    audio: AudioManifest,
    ui: UiState,
    wheel_options: Vec<WheelOption>,
    wheel: WheelSimulation,
    animation: AnimationLoop,
    completion: CompletionTracker,
    tickers: Vec<(String, TickerHandle)>,
    timers_mounted: bool,
    calendar_zoom: CalendarZoom,
}

impl<B: Backend> Shell<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            config: None,
            form: None,
            defaults: None,
            marked: MarkedDates::new(),
            lang: Translations::default(),
            audio: AudioManifest::new(),
            ui: UiState::default(),
            wheel_options: Vec::new(),
            wheel: WheelSimulation::new(),
            animation: AnimationLoop::new(),
            completion: CompletionTracker::new(),
            tickers: Vec::new(),
            timers_mounted: false,
            calendar_zoom: CalendarZoom::default(),
        }
    }

    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.request_timeout = limit;
        self
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn config(&self) -> Option<&AppConfig> {
        self.config.as_ref()
    }

    pub fn form(&self) -> Option<&AppConfig> {
        self.form.as_ref()
    }

    pub fn marked(&self) -> &MarkedDates {
        &self.marked
    }

    pub fn lang(&self) -> &Translations {
        &self.lang
    }

    pub fn audio(&self) -> &AudioManifest {
        &self.audio
    }

    pub fn wheel_options(&self) -> &[WheelOption] {
        &self.wheel_options
    }

    pub fn calendar_zoom(&self) -> CalendarZoom {
        self.calendar_zoom
    }

    pub fn wheel(&self) -> &WheelSimulation {
        &self.wheel
    }

    /// Initial load. Any failure of config, log or translations becomes the
    /// single global error and nothing is shown; the audio manifest is
    /// optional.
    pub async fn load(&mut self) -> Result<(), ShellError> {
        info!("shell: loading application data");
        match self.load_inner().await {
            Ok(()) => {
                self.ui.is_loaded = true;
                self.ui.error = None;
                info!("shell: loaded");
                Ok(())
            }
            Err(err) => {
                error!("shell: initial load failed: {err}");
                self.ui.is_loaded = false;
                self.ui.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn load_inner(&mut self) -> Result<(), ShellError> {
        let limit = self.request_timeout;
        let config = with_timeout(limit, self.backend.fetch_config()).await?;
        let lang = with_timeout(limit, self.backend.fetch_lang(config.language)).await?;
        let log = with_timeout(limit, self.backend.fetch_calendar_log()).await?;
        self.audio = match with_timeout(limit, self.backend.fetch_audio_manifest()).await {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!("shell: audio manifest unavailable: {err}");
                AudioManifest::new()
            }
        };

        self.lang = lang;
        self.marked = log.marked_dates;
        self.wheel_options = config.wheel_options.clone();
        self.form = Some(config.clone());
        self.config = Some(config);
        self.ui.is_dirty = false;
        self.refresh_wheel();

        let months = self.calendar_months();
        self.completion.forget();
        self.completion.observe(&months, &self.marked);
        Ok(())
    }

    pub fn navigate_to(&mut self, page: Page) {
        debug!("shell: navigate to {page:?}");
        self.ui.current_page = page;
        self.animation.set_visible(page == Page::Wheel);
        if page == Page::Wheel {
            self.animation.start();
        }
        let keep_zoom = self.config.as_ref().is_some_and(|config| config.calendar_save_zoom);
        if page == Page::Calendar && !keep_zoom {
            self.calendar_zoom.reset();
        }
    }

    /// Ctrl + wheel over the calendar page resizes the month modules.
    /// Returns the new minimum module width, or `None` if ignored.
    pub fn zoom_calendar(&mut self, delta_y: f64, ctrl: bool) -> Option<u32> {
        if !ctrl || self.ui.current_page != Page::Calendar {
            return None;
        }
        Some(self.calendar_zoom.scroll(delta_y))
    }

    pub fn set_hover(&mut self, target: Option<String>) {
        self.ui.hover = target;
    }

    pub fn dismiss_notice(&mut self) {
        self.ui.notice = None;
    }

    pub fn mark_dirty(&mut self) {
        self.ui.is_dirty = true;
    }

    /// Edits the settings form in place and marks it dirty.
    pub fn edit_form(&mut self, edit: impl FnOnce(&mut AppConfig)) -> Result<(), ShellError> {
        let form = self.form.as_mut().ok_or(ShellError::NotLoaded)?;
        edit(form);
        self.mark_dirty();
        Ok(())
    }

    /// Restores one top-level settings field from the factory defaults.
    pub async fn reset_field(&mut self, field: &str) -> Result<(), ShellError> {
        if self.defaults.is_none() {
            let defaults = with_timeout(self.request_timeout, self.backend.fetch_defaults()).await?;
            self.defaults = Some(defaults);
        }
        let defaults = self.defaults.as_ref().ok_or(ShellError::NotLoaded)?;
        let form = self.form.as_ref().ok_or(ShellError::NotLoaded)?;

        let to_value = |config: &AppConfig| {
            serde_json::to_value(config).map_err(|err| ShellError::Request(err.to_string()))
        };
        let default_value = to_value(defaults)?;
        let mut form_value = to_value(form)?;
        let replacement = default_value
            .get(field)
            .cloned()
            .ok_or_else(|| ShellError::UnknownField(field.to_string()))?;
        if let Value::Object(map) = &mut form_value {
            map.insert(field.to_string(), replacement);
        }

        let updated: AppConfig =
            serde_json::from_value(form_value).map_err(|err| ShellError::Request(err.to_string()))?;
        self.form = Some(updated);
        self.mark_dirty();
        Ok(())
    }

    /// Marks or unmarks a day. The local map changes first; if the server
    /// call fails the previous entry is put back. Returns the months that
    /// just became fully marked.
    pub async fn toggle_date(&mut self, date: NaiveDate) -> Result<Vec<String>, ShellError> {
        let sticker = self
            .config
            .as_ref()
            .map(|config| config.sticker_emoji.clone())
            .ok_or(ShellError::NotLoaded)?;

        let previous = self.marked.get(&date).cloned();
        if previous.is_some() {
            self.marked.remove(&date);
        } else {
            self.marked.insert(date, MarkEntry { rotation: 0, sticker });
        }

        match with_timeout(self.request_timeout, self.backend.toggle_date(date)).await {
            Ok(ToggleOutcome::Added { entry }) => {
                self.marked.insert(date, entry);
            }
            Ok(ToggleOutcome::Removed) => {
                self.marked.remove(&date);
            }
            Err(err) => {
                warn!("shell: toggle {date} failed, rolling back: {err}");
                match previous {
                    Some(entry) => self.marked.insert(date, entry),
                    None => self.marked.remove(&date),
                };
                self.ui.notice = Some(err.to_string());
                return Err(err);
            }
        }

        let months = self.calendar_months();
        Ok(self.completion.observe(&months, &self.marked))
    }

    pub async fn reset_calendar(&mut self) -> Result<(), ShellError> {
        let log = with_timeout(self.request_timeout, self.backend.reset_calendar()).await?;
        self.marked = log.marked_dates;
        self.completion.forget();
        let months = self.calendar_months();
        self.completion.observe(&months, &self.marked);
        Ok(())
    }

    /// Claims the single save slot and returns the form to submit.
    pub fn begin_save(&mut self) -> Result<AppConfig, ShellError> {
        if self.ui.is_saving {
            warn!("shell: save rejected, another save is in flight");
            return Err(ShellError::SaveInProgress);
        }
        let form = self.form.clone().ok_or(ShellError::NotLoaded)?;
        self.ui.is_saving = true;
        Ok(form)
    }

    /// Releases the save slot. Only the flag is rolled back on failure.
    pub fn finish_save(&mut self, result: Result<AppConfig, ShellError>) -> Result<AppConfig, ShellError> {
        self.ui.is_saving = false;
        match result {
            Ok(saved) => {
                info!("shell: settings saved");
                self.apply_config(saved.clone());
                self.ui.notice = None;
                Ok(saved)
            }
            Err(err) => {
                error!("shell: save failed: {err}");
                self.ui.notice = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn save_settings(&mut self) -> Result<AppConfig, ShellError> {
        let form = self.begin_save()?;
        let result = with_timeout(self.request_timeout, self.backend.save_config(&form)).await;
        self.finish_save(result)
    }

    pub async fn reset_all(&mut self) -> Result<AppConfig, ShellError> {
        let config = with_timeout(self.request_timeout, self.backend.reset_all()).await?;
        self.apply_config(config.clone());
        Ok(config)
    }

    fn apply_config(&mut self, config: AppConfig) {
        self.wheel_options = config.wheel_options.clone();
        self.form = Some(config.clone());
        self.config = Some(config);
        self.ui.is_dirty = false;
        self.refresh_wheel();
        if self.timers_mounted {
            self.mount_timers();
        }
    }

    pub fn add_option(&mut self, label: impl Into<String>) -> Result<&WheelOption, ShellError> {
        if self.wheel_options.len() >= MAX_WHEEL_OPTIONS {
            return Err(ShellError::TooManyOptions);
        }
        self.wheel_options.push(WheelOption::new(label));
        self.refresh_wheel();
        self.wheel_options.last().ok_or(ShellError::TooManyOptions)
    }

    pub fn remove_option(&mut self, id: &str) -> bool {
        let before = self.wheel_options.len();
        self.wheel_options.retain(|option| option.id != id);
        let removed = self.wheel_options.len() != before;
        if removed {
            self.refresh_wheel();
        }
        removed
    }

    pub fn rename_option(&mut self, id: &str, label: impl Into<String>) -> bool {
        match self.wheel_options.iter_mut().find(|option| option.id == id) {
            Some(option) => {
                option.label = label.into();
                self.refresh_wheel();
                true
            }
            None => false,
        }
    }

    /// Copies the working option list into the form and saves it.
    pub async fn save_options(&mut self) -> Result<AppConfig, ShellError> {
        let options = self.wheel_options.clone();
        self.edit_form(|form| form.wheel_options = options)?;
        self.save_settings().await
    }

    pub fn calendar_months(&self) -> Vec<MonthGrid> {
        let Some(config) = &self.config else {
            return Vec::new();
        };
        let labels = self.lang.weekday_short_labels();
        build_months(&CalendarInput {
            departure: config.date_departure.date(),
            arrival: config.date_arrival.date(),
            marked: &self.marked,
            language: config.language,
            weekday_labels: &labels,
            sticker_scale: config.sticker_scale,
        })
    }

    pub fn wheel_layout(&self) -> WheelLayout {
        let base = self
            .config
            .as_ref()
            .map(|config| config.colors.color_accent_primary.as_str())
            .unwrap_or("#F48FB1");
        generate_sectors(&self.wheel_options, base)
    }

    fn refresh_wheel(&mut self) {
        let layout = self.wheel_layout();
        self.wheel.set_layout(&layout);
    }

    pub fn spin_wheel(&mut self) {
        self.wheel.spin();
    }

    pub fn stop_wheel(&mut self) {
        self.wheel.stop_spin();
    }

    /// One animation frame; `None` while the wheel page is hidden.
    pub fn frame(&mut self, hooks: &mut impl WheelHooks) -> Option<Tick> {
        self.animation.frame(&mut self.wheel, hooks)
    }

    /// Starts one ticker per enabled timer display, cancelling any running
    /// ones first. Must be called inside a tokio runtime.
    pub fn mount_timers(&mut self) {
        self.unmount_timers();
        self.timers_mounted = true;
        let Some(config) = &self.config else {
            return;
        };
        let now = crate::models::now_naive();
        let message = config.timers.timer_completed_message.clone();

        let mut displays = Vec::new();
        if config.timers.arrival_timer_enabled {
            displays.push(("arrival".to_string(), TimerMode::Countdown, config.date_arrival));
        }
        if config.timers.relationship_timer_enabled {
            displays.push((
                "relationship".to_string(),
                TimerMode::Elapsed,
                config.date_relationship_start,
            ));
        }
        for custom in config.timers.custom_timers.iter().filter(|timer| timer.enabled) {
            displays.push((custom.id.clone(), TimerMode::for_target(custom.date, now), custom.date));
        }

        self.tickers = displays
            .into_iter()
            .map(|(id, mode, target)| (id, Ticker::new(mode, target, message.clone()).start()))
            .collect();
        debug!("shell: {} timers mounted", self.tickers.len());
    }

    pub fn unmount_timers(&mut self) {
        for (_, handle) in self.tickers.drain(..) {
            handle.stop();
        }
        self.timers_mounted = false;
    }

    pub fn timer_texts(&self) -> Vec<(String, String)> {
        self.tickers
            .iter()
            .map(|(id, handle)| (id.clone(), handle.text()))
            .collect()
    }

    pub fn readings_now(&self) -> Vec<crate::models::TimerSnapshot> {
        self.config
            .as_ref()
            .map(|config| timer::snapshots(config, crate::models::now_naive()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::initial_config;
    use crate::storage::test_support::temp_dir;
    use crate::wheel::PLACEHOLDER_ID;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Fake {
        config: Mutex<Option<AppConfig>>,
        log: Mutex<CalendarLogModel>,
        fail_config: bool,
        fail_toggle: bool,
        fail_save: bool,
        slow: bool,
        saves: Mutex<u32>,
    }

    impl Fake {
        fn with_range(departure: &str, arrival: &str) -> Self {
            let mut config = initial_config();
            config.date_departure = crate::models::flexible_datetime::parse(departure).unwrap();
            config.date_arrival = crate::models::flexible_datetime::parse(arrival).unwrap();
            Self {
                config: Mutex::new(Some(config)),
                ..Self::default()
            }
        }

        fn fail(message: &str) -> ShellError {
            ShellError::Request(message.to_string())
        }
    }

    impl Backend for Fake {
        async fn fetch_config(&self) -> Result<AppConfig, ShellError> {
            if self.fail_config {
                return Err(Fake::fail("500"));
            }
            self.config.lock().unwrap().clone().ok_or_else(|| Fake::fail("no config"))
        }

        async fn fetch_defaults(&self) -> Result<AppConfig, ShellError> {
            Ok(AppConfig::default())
        }

        async fn fetch_calendar_log(&self) -> Result<CalendarLogModel, ShellError> {
            Ok(self.log.lock().unwrap().clone())
        }

        async fn fetch_lang(&self, language: Language) -> Result<Translations, ShellError> {
            i18n::bundled(language).map_err(|err| Fake::fail(&err.to_string()))
        }

        async fn fetch_audio_manifest(&self) -> Result<AudioManifest, ShellError> {
            Err(Fake::fail("no audio"))
        }

        async fn toggle_date(&self, date: NaiveDate) -> Result<ToggleOutcome, ShellError> {
            if self.slow {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.fail_toggle {
                return Err(Fake::fail("toggle failed"));
            }
            let mut log = self.log.lock().unwrap();
            if log.marked_dates.remove(&date).is_some() {
                Ok(ToggleOutcome::Removed)
            } else {
                let entry = MarkEntry { rotation: 7, sticker: "S".into() };
                log.marked_dates.insert(date, entry.clone());
                Ok(ToggleOutcome::Added { entry })
            }
        }

        async fn reset_calendar(&self) -> Result<CalendarLogModel, ShellError> {
            let mut log = self.log.lock().unwrap();
            log.marked_dates.clear();
            Ok(log.clone())
        }

        async fn save_config(&self, config: &AppConfig) -> Result<AppConfig, ShellError> {
            *self.saves.lock().unwrap() += 1;
            if self.fail_save {
                return Err(Fake::fail("validation failed"));
            }
            let mut saved = config.clone();
            saved.is_first_launch = false;
            *self.config.lock().unwrap() = Some(saved.clone());
            Ok(saved)
        }

        async fn reset_all(&self) -> Result<AppConfig, ShellError> {
            let fresh = initial_config();
            *self.config.lock().unwrap() = Some(fresh.clone());
            Ok(fresh)
        }
    }

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    async fn loaded(fake: Fake) -> Shell<Fake> {
        let mut shell = Shell::new(fake);
        shell.load().await.unwrap();
        shell
    }

    #[tokio::test]
    async fn load_failure_sets_global_error() {
        let fake = Fake { fail_config: true, ..Fake::default() };
        let mut shell = Shell::new(fake);
        assert!(shell.load().await.is_err());
        assert!(!shell.ui().is_loaded);
        assert!(shell.ui().error.is_some());
        assert!(shell.calendar_months().is_empty());
    }

    #[tokio::test]
    async fn load_tolerates_missing_audio() {
        let shell = loaded(Fake::with_range("2025-01-01", "2025-01-31")).await;
        assert!(shell.ui().is_loaded);
        assert!(shell.audio().is_empty());
        assert_eq!(shell.lang().get("weekday_mon"), "Пн");
        assert_eq!(shell.calendar_months().len(), 1);
    }

    #[tokio::test]
    async fn toggle_adopts_server_entry() {
        let mut shell = loaded(Fake::with_range("2025-01-01", "2025-01-31")).await;
        shell.navigate_to(Page::Calendar);
        shell.toggle_date(day("2025-01-10")).await.unwrap();
        assert_eq!(shell.marked()[&day("2025-01-10")].rotation, 7);

        shell.toggle_date(day("2025-01-10")).await.unwrap();
        assert!(shell.marked().is_empty());
    }

    #[tokio::test]
    async fn failed_toggle_rolls_back() {
        let fake = Fake {
            fail_toggle: true,
            ..Fake::with_range("2025-01-01", "2025-01-31")
        };
        fake.log.lock().unwrap().marked_dates.insert(
            day("2025-01-05"),
            MarkEntry { rotation: -3, sticker: "X".into() },
        );
        let mut shell = loaded(fake).await;

        assert!(shell.toggle_date(day("2025-01-06")).await.is_err());
        assert!(!shell.marked().contains_key(&day("2025-01-06")));

        assert!(shell.toggle_date(day("2025-01-05")).await.is_err());
        assert_eq!(shell.marked()[&day("2025-01-05")].rotation, -3);
        assert!(shell.ui().notice.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_toggle_times_out_and_rolls_back() {
        let fake = Fake {
            slow: true,
            ..Fake::with_range("2025-01-01", "2025-01-31")
        };
        let mut shell = loaded(fake).await.with_timeout(Duration::from_secs(2));
        let err = shell.toggle_date(day("2025-01-07")).await.unwrap_err();
        assert_eq!(err, ShellError::Timeout);
        assert!(shell.marked().is_empty());
    }

    #[tokio::test]
    async fn completing_a_month_is_reported_once() {
        let mut shell = loaded(Fake::with_range("2025-01-28", "2025-02-02")).await;
        assert!(shell.toggle_date(day("2025-01-29")).await.unwrap().is_empty());
        assert!(shell.toggle_date(day("2025-01-30")).await.unwrap().is_empty());
        assert_eq!(shell.toggle_date(day("2025-01-31")).await.unwrap(), ["2025-01"]);
        assert!(shell.toggle_date(day("2025-02-01")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_save_is_rejected_while_first_is_in_flight() {
        let mut shell = loaded(Fake::with_range("2025-01-01", "2025-01-31")).await;
        let form = shell.begin_save().unwrap();
        assert!(shell.ui().is_saving);
        assert_eq!(shell.begin_save().unwrap_err(), ShellError::SaveInProgress);

        shell.finish_save(Ok(form)).unwrap();
        assert!(!shell.ui().is_saving);
        assert!(shell.begin_save().is_ok());
    }

    #[tokio::test]
    async fn failed_save_only_releases_the_flag() {
        let fake = Fake {
            fail_save: true,
            ..Fake::with_range("2025-01-01", "2025-01-31")
        };
        let mut shell = loaded(fake).await;
        shell.edit_form(|form| form.sticker_emoji = "Q".into()).unwrap();

        assert!(shell.save_settings().await.is_err());
        assert!(!shell.ui().is_saving);
        assert!(shell.ui().is_dirty);
        assert_eq!(shell.form().unwrap().sticker_emoji, "Q");
        assert_eq!(shell.config().unwrap().sticker_emoji, "X");
    }

    #[tokio::test]
    async fn save_clears_dirty_flag() {
        let mut shell = loaded(Fake::with_range("2025-01-01", "2025-01-31")).await;
        shell.edit_form(|form| form.blur_strength = 3.0).unwrap();
        assert!(shell.ui().is_dirty);
        let saved = shell.save_settings().await.unwrap();
        assert_eq!(saved.blur_strength, 3.0);
        assert!(!shell.ui().is_dirty);
        assert!(!shell.config().unwrap().is_first_launch);
    }

    #[tokio::test]
    async fn reset_field_copies_default() {
        let mut shell = loaded(Fake::with_range("2025-01-01", "2025-01-31")).await;
        shell.edit_form(|form| {
            form.sticker_color = "#000000".into();
            form.blur_strength = 9.0;
        })
        .unwrap();
        shell.reset_field("sticker_color").await.unwrap();
        let form = shell.form().unwrap();
        assert_eq!(form.sticker_color, "#F48FB1");
        assert_eq!(form.blur_strength, 9.0);

        assert_eq!(
            shell.reset_field("no_such_field").await.unwrap_err(),
            ShellError::UnknownField("no_such_field".into())
        );
    }

    #[tokio::test]
    async fn wheel_options_are_capped_and_saved() {
        let mut shell = loaded(Fake::with_range("2025-01-01", "2025-01-31")).await;
        assert_eq!(shell.wheel_layout().sectors[0].id, PLACEHOLDER_ID);

        for i in 0..MAX_WHEEL_OPTIONS {
            shell.add_option(format!("option {i}")).unwrap();
        }
        assert_eq!(shell.add_option("one too many").unwrap_err(), ShellError::TooManyOptions);
        assert_eq!(shell.wheel().boundaries().len(), MAX_WHEEL_OPTIONS - 1);

        let first = shell.wheel_options()[0].id.clone();
        assert!(shell.remove_option(&first));
        assert!(!shell.remove_option(&first));
        assert_eq!(shell.wheel().boundaries().len(), MAX_WHEEL_OPTIONS - 2);

        let saved = shell.save_options().await.unwrap();
        assert_eq!(saved.wheel_options.len(), MAX_WHEEL_OPTIONS - 1);
        assert_eq!(*shell.backend.saves.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn wheel_frames_only_run_on_wheel_page() {
        let mut shell = loaded(Fake::with_range("2025-01-01", "2025-01-31")).await;
        shell.add_option("a").unwrap();
        shell.add_option("b").unwrap();
        shell.spin_wheel();

        assert!(shell.frame(&mut ()).is_none());
        shell.navigate_to(Page::Wheel);
        assert!(shell.frame(&mut ()).is_some());
        shell.navigate_to(Page::Settings);
        assert!(shell.frame(&mut ()).is_none());

        shell.navigate_to(Page::Wheel);
        shell.stop_wheel();
        let mut stopped = false;
        for _ in 0..200 {
            if shell.frame(&mut ()).is_some_and(|tick| tick.stopped) {
                stopped = true;
                break;
            }
        }
        assert!(stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn timers_are_replaced_on_remount() {
        let mut shell = loaded(Fake::with_range("2025-01-01", "2025-01-31")).await;
        shell.mount_timers();
        let ids: Vec<_> = shell.timer_texts().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[0], "arrival");

        shell
            .edit_form(|form| form.timers.custom_timers.clear())
            .unwrap();
        shell.save_settings().await.unwrap();
        shell.mount_timers();
        assert_eq!(shell.timer_texts().len(), 2);
        assert_eq!(shell.readings_now().len(), 2);

        shell.unmount_timers();
        assert!(shell.timer_texts().is_empty());
    }

    #[tokio::test]
    async fn saving_new_dates_retargets_mounted_timers() {
        let mut shell = loaded(Fake::with_range("2025-01-01", "2025-01-31")).await;
        shell
            .edit_form(|form| form.timers.custom_timers.clear())
            .unwrap();
        shell.save_settings().await.unwrap();
        shell.mount_timers();
        assert_eq!(shell.timer_texts().len(), 2);

        let far = crate::models::now_naive() + chrono::TimeDelta::days(500);
        shell
            .edit_form(|form| {
                form.date_arrival = far;
                form.timers.relationship_timer_enabled = false;
            })
            .unwrap();
        shell.save_settings().await.unwrap();

        let texts = shell.timer_texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, "arrival");
        assert!(texts[0].1.starts_with("500:") || texts[0].1.starts_with("499:"));

        shell.unmount_timers();
        shell.reset_all().await.unwrap();
        assert!(shell.timer_texts().is_empty());
    }

    #[tokio::test]
    async fn calendar_zoom_follows_page_and_setting() {
        let mut shell = loaded(Fake::with_range("2025-01-01", "2025-01-31")).await;
        assert_eq!(shell.zoom_calendar(-1.0, true), None);

        shell.navigate_to(Page::Calendar);
        assert_eq!(shell.zoom_calendar(-1.0, false), None);
        assert_eq!(shell.zoom_calendar(-1.0, true), Some(360));
        assert_eq!(shell.zoom_calendar(-1.0, true), Some(400));

        shell.navigate_to(Page::Main);
        shell.navigate_to(Page::Calendar);
        assert_eq!(shell.calendar_zoom().width(), crate::calendar::ZOOM_DEFAULT_WIDTH);

        shell.edit_form(|form| form.calendar_save_zoom = true).unwrap();
        shell.save_settings().await.unwrap();
        shell.zoom_calendar(-1.0, true);
        shell.navigate_to(Page::Wheel);
        shell.navigate_to(Page::Calendar);
        assert_eq!(shell.calendar_zoom().width(), 360);
    }

    #[tokio::test]
    async fn hover_notice_and_rename() {
        let fake = Fake {
            fail_toggle: true,
            ..Fake::with_range("2025-01-01", "2025-01-31")
        };
        let mut shell = loaded(fake).await;

        shell.set_hover(Some("2025-01-10".into()));
        assert_eq!(shell.ui().hover.as_deref(), Some("2025-01-10"));
        shell.set_hover(None);
        assert!(shell.ui().hover.is_none());

        assert!(shell.toggle_date(day("2025-01-10")).await.is_err());
        assert!(shell.ui().notice.is_some());
        shell.dismiss_notice();
        assert!(shell.ui().notice.is_none());

        let id = shell.add_option("Pizza").unwrap().id.clone();
        assert!(shell.rename_option(&id, "Sushi"));
        assert!(!shell.rename_option("missing", "Tacos"));
        assert_eq!(shell.wheel_layout().sectors[0].label, "Sushi");
    }

    #[tokio::test]
    async fn local_backend_round_trip() {
        let dir = temp_dir("shell_local");
        let state = AppState::load(dir.clone()).await;
        let mut shell = Shell::new(LocalBackend::new(state.clone()));
        shell.load().await.unwrap();

        shell
            .edit_form(|form| {
                form.date_departure = crate::models::flexible_datetime::parse("2025-03-01").unwrap();
                form.date_arrival = crate::models::flexible_datetime::parse("2025-03-10").unwrap();
            })
            .unwrap();
        shell.save_settings().await.unwrap();
        shell.toggle_date(day("2025-03-05")).await.unwrap();

        let log = state.calendar_log.lock().await.get().await;
        assert!(log.marked_dates.contains_key(&day("2025-03-05")));
        assert_eq!(shell.calendar_months().len(), 1);

        shell.reset_calendar().await.unwrap();
        assert!(shell.marked().is_empty());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
