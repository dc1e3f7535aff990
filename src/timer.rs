//! Countdown / elapsed displays and their once-per-second tickers.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::{AppConfig, TimerSnapshot};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Countdown,
    Elapsed,
}

impl TimerMode {
    /// Future targets count down, past ones count up.
    pub fn for_target(target: NaiveDateTime, now: NaiveDateTime) -> Self {
        if target > now {
            TimerMode::Countdown
        } else {
            TimerMode::Elapsed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading {
    Running(String),
    Finished(String),
}

impl Reading {
    pub fn text(&self) -> &str {
        match self {
            Reading::Running(text) | Reading::Finished(text) => text,
        }
    }
}

pub fn read(
    mode: TimerMode,
    target: NaiveDateTime,
    now: NaiveDateTime,
    completed_message: &str,
) -> Reading {
    let diff = match mode {
        TimerMode::Countdown => target - now,
        TimerMode::Elapsed => now - target,
    };
    if diff.num_milliseconds() < 0 {
        return Reading::Finished(completed_message.to_string());
    }
    Reading::Running(format_span(diff.num_seconds()))
}

/// `DD:HH:MM:SS`, every field zero-padded to two digits.
pub fn format_span(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("{days:02}:{hours:02}:{minutes:02}:{seconds:02}")
}

/// Readings for every enabled display in `config`.
pub fn snapshots(config: &AppConfig, now: NaiveDateTime) -> Vec<TimerSnapshot> {
    let message = config.timers.timer_completed_message.as_str();
    let mut out = Vec::new();

    if config.timers.arrival_timer_enabled {
        out.push(snapshot(
            "arrival",
            &config.timers.arrival_timer_text,
            TimerMode::Countdown,
            config.date_arrival,
            now,
            message,
        ));
    }
    if config.timers.relationship_timer_enabled {
        out.push(snapshot(
            "relationship",
            &config.timers.relationship_timer_text,
            TimerMode::Elapsed,
            config.date_relationship_start,
            now,
            message,
        ));
    }
    for timer in config.timers.custom_timers.iter().filter(|timer| timer.enabled) {
        out.push(snapshot(
            &timer.id,
            &timer.label,
            TimerMode::for_target(timer.date, now),
            timer.date,
            now,
            message,
        ));
    }
    out
}

fn snapshot(
    id: &str,
    label: &str,
    mode: TimerMode,
    target: NaiveDateTime,
    now: NaiveDateTime,
    message: &str,
) -> TimerSnapshot {
    TimerSnapshot {
        id: id.to_string(),
        label: label.to_string(),
        mode,
        text: read(mode, target, now, message).text().to_string(),
    }
}

pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub struct Ticker {
    pub mode: TimerMode,
    pub target: NaiveDateTime,
    pub completed_message: String,
    pub clock: Clock,
}

impl Ticker {
    pub fn new(mode: TimerMode, target: NaiveDateTime, completed_message: impl Into<String>) -> Self {
        Self {
            mode,
            target,
            completed_message: completed_message.into(),
            clock: Arc::new(crate::models::now_naive),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Publishes a reading immediately and then every second. A countdown
    /// that reaches its target publishes the completion message and ends.
    pub fn start(self) -> TickerHandle {
        let first = read(self.mode, self.target, (self.clock)(), &self.completed_message);
        let (sender, receiver) = watch::channel(first.text().to_string());

        let task = tokio::spawn(async move {
            if matches!(first, Reading::Finished(_)) {
                return;
            }
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.tick().await;
            loop {
                interval.tick().await;
                let reading = read(self.mode, self.target, (self.clock)(), &self.completed_message);
                let finished = matches!(reading, Reading::Finished(_));
                if sender.send(reading.text().to_string()).is_err() {
                    debug!("ticker display dropped, stopping");
                    return;
                }
                if finished {
                    return;
                }
            }
        });

        TickerHandle { receiver, task }
    }
}

/// Owning handle for a running ticker; stopping or dropping it cancels the
/// task.
pub struct TickerHandle {
    receiver: watch::Receiver<String>,
    task: JoinHandle<()>,
}

impl TickerHandle {
    pub fn text(&self) -> String {
        self.receiver.borrow().clone()
    }

    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
