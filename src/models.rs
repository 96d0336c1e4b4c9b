//! Data models for the FocusNest application.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The purpose of the current countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    /// Focused work.
    #[default]
    Focus,
    /// Break taken after most focus cycles.
    ShortBreak,
    /// Break taken after every fourth focus cycle.
    LongBreak,
}

impl TimerMode {
    pub const ALL: [TimerMode; 3] = [Self::Focus, Self::ShortBreak, Self::LongBreak];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Focus => "Focus",
            Self::ShortBreak => "Short Break",
            Self::LongBreak => "Long Break",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, Self::Focus)
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{0} duration must be at least one minute")]
    ZeroDuration(TimerMode),
    #[error("{0} duration must be at most {max} minutes", max = MAX_MINUTES)]
    TooLong(TimerMode),
}

/// Longest duration whose length in seconds still fits a `u32`.
pub const MAX_MINUTES: u32 = u32::MAX / 60;

/// Countdown durations in minutes, one per mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    pub focus: u32,
    pub short_break: u32,
    pub long_break: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus: 25,
            short_break: 5,
            long_break: 15,
        }
    }
}

impl TimerSettings {
    /// Returns the configured duration of `mode` in minutes.
    pub fn minutes(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Focus => self.focus,
            TimerMode::ShortBreak => self.short_break,
            TimerMode::LongBreak => self.long_break,
        }
    }

    /// Returns the full countdown length of `mode` in seconds.
    pub fn duration_secs(&self, mode: TimerMode) -> u32 {
        self.minutes(mode).saturating_mul(60)
    }

    /// Sets the duration of a single mode.
    pub fn set_minutes(&mut self, mode: TimerMode, mins: u32) {
        match mode {
            TimerMode::Focus => self.focus = mins,
            TimerMode::ShortBreak => self.short_break = mins,
            TimerMode::LongBreak => self.long_break = mins,
        }
    }

    /// Every duration must be positive and no longer than [`MAX_MINUTES`].
    pub fn validate(&self) -> Result<(), SettingsError> {
        for mode in TimerMode::ALL {
            match self.minutes(mode) {
                0 => return Err(SettingsError::ZeroDuration(mode)),
                mins if mins > MAX_MINUTES => return Err(SettingsError::TooLong(mode)),
                _ => {}
            }
        }
        Ok(())
    }
}

/// Canonical countdown state. Everything shown to the user is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    pub mode: TimerMode,
    pub remaining_secs: u32,
    pub running: bool,
    /// Focus countdowns completed since launch. Never reset automatically.
    pub completed_focus_cycles: u32,
}

impl TimerState {
    /// A stopped, full-length countdown for `mode`.
    pub fn fresh(mode: TimerMode, settings: &TimerSettings) -> Self {
        Self {
            mode,
            remaining_secs: settings.duration_secs(mode),
            running: false,
            completed_focus_cycles: 0,
        }
    }
}

/// Opaque habit identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(pub i64);

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for HabitId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(HabitId)
    }
}

/// Completion record for one calendar day. This is the persisted shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayLog {
    pub date: NaiveDate,
    pub completed: bool,
}

/// A tracked habit and its sparse per-day completion ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    /// At most one entry per day; stored as a list of [`DayLog`].
    #[serde(with = "day_logs", default)]
    pub logs: BTreeMap<NaiveDate, bool>,
}

impl Habit {
    pub fn new(id: HabitId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            logs: BTreeMap::new(),
        }
    }
}

/// Serializes the day map as a list of `DayLog`. Duplicate days collapse on
/// load with the last entry winning.
mod day_logs {
    use super::DayLog;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        logs: &BTreeMap<NaiveDate, bool>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            logs.iter()
                .map(|(&date, &completed)| DayLog { date, completed }),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<NaiveDate, bool>, D::Error> {
        let logs = Vec::<DayLog>::deserialize(deserializer)?;
        Ok(logs.into_iter().map(|l| (l.date, l.completed)).collect())
    }
}
