//! Month-by-month calendar grid for the countdown window.
//!
//! The window runs from the day after departure through the arrival day,
//! inclusive. Every month is laid out as 6 rows of 7 Monday-first cells.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

use crate::i18n::month_name;
use crate::models::{flexible_datetime, Language, MarkEntry, MarkedDates};

pub const GRID_CELLS: usize = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `None` when the window is empty (departure on or after arrival).
    pub fn from_departure(departure: NaiveDate, arrival: NaiveDate) -> Option<Self> {
        let start = departure.checked_add_days(Days::new(1))?;
        (start <= arrival).then_some(Self { start, end: arrival })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sticker {
    pub symbol: String,
    pub transform: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCell {
    pub key: String,
    pub day_of_month: u32,
    pub is_padding: bool,
    pub is_in_range: bool,
    pub date_string: Option<String>,
    pub is_arrival_day: bool,
    pub sticker: Option<Sticker>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGrid {
    pub key: String,
    pub title: String,
    pub weekday_labels: [String; 7],
    pub days: Vec<DayCell>,
}

impl MonthGrid {
    pub fn in_range_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days
            .iter()
            .filter(|cell| cell.is_in_range)
            .filter_map(|cell| cell.date_string.as_deref())
            .filter_map(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
    }
}

pub struct CalendarInput<'a> {
    pub departure: NaiveDate,
    pub arrival: NaiveDate,
    pub marked: &'a MarkedDates,
    pub language: Language,
    pub weekday_labels: &'a [String; 7],
    pub sticker_scale: f64,
}

pub fn build_months(input: &CalendarInput<'_>) -> Vec<MonthGrid> {
    let Some(range) = DateRange::from_departure(input.departure, input.arrival) else {
        return Vec::new();
    };

    let mut months = Vec::new();
    let (mut year, mut month) = (range.start.year(), range.start.month());
    let last = (range.end.year(), range.end.month());
    while (year, month) <= last {
        months.push(build_month(year, month, &range, input));
        (year, month) = next_month(year, month);
    }
    months
}

/// Same as [`build_months`] but from raw config strings. Anything unparseable
/// yields no months.
pub fn build_months_from_str(
    departure: &str,
    arrival: &str,
    marked: &MarkedDates,
    language: Language,
    weekday_labels: &[String; 7],
    sticker_scale: f64,
) -> Vec<MonthGrid> {
    let (Some(departure), Some(arrival)) =
        (flexible_datetime::parse(departure), flexible_datetime::parse(arrival))
    else {
        return Vec::new();
    };
    build_months(&CalendarInput {
        departure: departure.date(),
        arrival: arrival.date(),
        marked,
        language,
        weekday_labels,
        sticker_scale,
    })
}

fn build_month(year: i32, month: u32, range: &DateRange, input: &CalendarInput<'_>) -> MonthGrid {
    let key = format!("{year:04}-{month:02}");
    let (padding, days_in_month) = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(first) => (padding_days(first), days_in_month(year, month)),
        None => (0, 0),
    };

    let days = (0..GRID_CELLS)
        .map(|i| {
            let cell_key = format!("{key}-{i}");
            let day = i as i64 - padding as i64 + 1;
            if day < 1 || day > days_in_month as i64 {
                return padding_cell(cell_key);
            }
            let day = day as u32;
            match NaiveDate::from_ymd_opt(year, month, day) {
                Some(date) if range.contains(date) => DayCell {
                    key: cell_key,
                    day_of_month: day,
                    is_padding: false,
                    is_in_range: true,
                    date_string: Some(date.format("%Y-%m-%d").to_string()),
                    is_arrival_day: date == range.end,
                    sticker: input
                        .marked
                        .get(&date)
                        .map(|entry| sticker_for(entry, input.sticker_scale)),
                },
                _ => DayCell {
                    key: cell_key,
                    day_of_month: day,
                    is_padding: false,
                    is_in_range: false,
                    date_string: None,
                    is_arrival_day: false,
                    sticker: None,
                },
            }
        })
        .collect();

    MonthGrid {
        title: format!("{} {year}", month_name(input.language, month).to_uppercase()),
        key,
        weekday_labels: input.weekday_labels.clone(),
        days,
    }
}

fn padding_cell(key: String) -> DayCell {
    DayCell {
        key,
        day_of_month: 0,
        is_padding: true,
        is_in_range: false,
        date_string: None,
        is_arrival_day: false,
        sticker: None,
    }
}

/// Leading blanks before the 1st in a Monday-first week.
fn padding_days(first_of_month: NaiveDate) -> u32 {
    match first_of_month.weekday().num_days_from_sunday() {
        0 => 6,
        weekday => weekday - 1,
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next) = next_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next, 1)
        .and_then(|date| date.pred_opt())
        .map(|date| date.day())
        .unwrap_or(0)
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 { (year + 1, 1) } else { (year, month + 1) }
}

fn sticker_for(entry: &MarkEntry, scale: f64) -> Sticker {
    Sticker {
        symbol: entry.sticker.clone(),
        transform: sticker_transform(entry.rotation, scale),
    }
}

pub fn sticker_transform(rotation: i32, scale: f64) -> String {
    if (scale - 1.0).abs() > f64::EPSILON {
        format!("rotate({rotation}deg) scale({scale})")
    } else {
        format!("rotate({rotation}deg)")
    }
}

pub fn is_month_completed(month: &MonthGrid, marked: &MarkedDates) -> bool {
    let mut in_range = month.in_range_dates().peekable();
    in_range.peek().is_some() && in_range.all(|date| marked.contains_key(&date))
}

/// Remembers the last completion state per month and reports only the
/// false -> true edges. The first observation of a month only records it.
#[derive(Debug, Default)]
pub struct CompletionTracker {
    previous: HashMap<String, bool>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, months: &[MonthGrid], marked: &MarkedDates) -> Vec<String> {
        let mut newly_completed = Vec::new();
        for month in months {
            let completed = is_month_completed(month, marked);
            let before = self.previous.insert(month.key.clone(), completed);
            if completed && before == Some(false) {
                newly_completed.push(month.key.clone());
            }
        }
        newly_completed
    }

    pub fn forget(&mut self) {
        self.previous.clear();
    }
}

pub const ZOOM_DEFAULT_WIDTH: u32 = 320;
pub const ZOOM_MIN_WIDTH: u32 = 240;
pub const ZOOM_MAX_WIDTH: u32 = 800;
pub const ZOOM_STEP: u32 = 40;

/// Minimum width of one month module, driven by Ctrl + mouse wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarZoom {
    min_module_width: u32,
}

impl Default for CalendarZoom {
    fn default() -> Self {
        Self {
            min_module_width: ZOOM_DEFAULT_WIDTH,
        }
    }
}

impl CalendarZoom {
    pub fn width(&self) -> u32 {
        self.min_module_width
    }

    /// Scrolling up (`delta_y < 0`) widens the modules, scrolling down
    /// narrows them.
    pub fn scroll(&mut self, delta_y: f64) -> u32 {
        let width = if delta_y < 0.0 {
            self.min_module_width + ZOOM_STEP
        } else {
            self.min_module_width.saturating_sub(ZOOM_STEP)
        };
        self.min_module_width = width.clamp(ZOOM_MIN_WIDTH, ZOOM_MAX_WIDTH);
        self.min_module_width
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn css_value(&self) -> String {
        format!("{}px", self.min_module_width)
    }
}
