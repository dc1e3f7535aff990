use crate::models::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const RU_TABLE: &str = include_str!("../static/lang/ru.json");
const EN_TABLE: &str = include_str!("../static/lang/en.json");

const WEEKDAY_KEYS: [&str; 7] = [
    "weekday_mon",
    "weekday_tue",
    "weekday_wed",
    "weekday_thu",
    "weekday_fri",
    "weekday_sat",
    "weekday_sun",
];

const MONTHS_RU: [&str; 12] = [
    "январь", "февраль", "март", "апрель", "май", "июнь",
    "июль", "август", "сентябрь", "октябрь", "ноябрь", "декабрь",
];

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Flat key -> string table, as served under `/static/lang/{code}.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Translations {
    entries: BTreeMap<String, String>,
}

impl Translations {
    /// Missing keys resolve to the key itself so the UI never renders blanks.
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.entries.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn weekday_short_labels(&self) -> [String; 7] {
        WEEKDAY_KEYS.map(|key| self.get(key).to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Raw JSON of a bundled table.
pub fn raw_table(language: Language) -> &'static str {
    match language {
        Language::Ru => RU_TABLE,
        Language::En => EN_TABLE,
    }
}

pub fn bundled(language: Language) -> Result<Translations, serde_json::Error> {
    serde_json::from_str(raw_table(language))
}

/// Long month name, `month` is 1-based.
pub fn month_name(language: Language, month: u32) -> &'static str {
    let index = (month.saturating_sub(1) % 12) as usize;
    match language {
        Language::Ru => MONTHS_RU[index],
        Language::En => MONTHS_EN[index],
    }
}
