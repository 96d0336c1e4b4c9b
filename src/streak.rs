//! Habit streak ledger.
//!
//! Completion is kept as a sparse day -> flag map per habit. Streaks and the
//! weekly grid are recomputed from that map on every read.

use crate::models::{Habit, HabitId};
use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};

/// How far back `current_streak` walks before giving up.
pub const STREAK_LOOKBACK_DAYS: u32 = 30;

impl Habit {
    /// True if the habit was marked done on `day`. A missing log counts as not done.
    pub fn is_completed(&self, day: NaiveDate) -> bool {
        self.logs.get(&day).copied().unwrap_or(false)
    }

    /// Consecutive completed days ending at `reference` (inclusive), capped at
    /// [`STREAK_LOOKBACK_DAYS`].
    pub fn current_streak(&self, reference: NaiveDate) -> u32 {
        self.current_streak_capped(reference, STREAK_LOOKBACK_DAYS)
    }

    /// Like [`Habit::current_streak`] with an explicit lookback cap.
    pub fn current_streak_capped(&self, reference: NaiveDate, cap: u32) -> u32 {
        let mut streak = 0;
        let mut day = Some(reference);

        while let Some(d) = day {
            if streak >= cap || !self.is_completed(d) {
                break;
            }
            streak += 1;
            day = d.pred_opt();
        }

        streak
    }
}

/// One habit's row in the weekly grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitWeek {
    pub id: HabitId,
    pub name: String,
    pub completed: [bool; 7],
    pub streak: u32,
}

/// The seven days of the week containing a reference day, with every
/// habit's completion state on each of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekView {
    pub days: [NaiveDate; 7],
    pub reference: NaiveDate,
    pub rows: Vec<HabitWeek>,
}

/// Returns the seven consecutive days of the week containing `reference`,
/// starting on `week_start`.
pub fn week_days(reference: NaiveDate, week_start: Weekday) -> [NaiveDate; 7] {
    let offset = (7 + reference.weekday().num_days_from_monday()
        - week_start.num_days_from_monday())
        % 7;
    let first = reference
        .checked_sub_days(Days::new(offset as u64))
        .unwrap_or(reference);

    let mut days = [first; 7];
    for (i, slot) in days.iter_mut().enumerate() {
        *slot = first
            .checked_add_days(Days::new(i as u64))
            .unwrap_or(first);
    }
    days
}

/// Owns the habit list for one tracker.
#[derive(Debug, Clone, Default)]
pub struct StreakLedger {
    habits: Vec<Habit>,
    last_id: i64,
}

impl StreakLedger {
    /// Builds a ledger from previously stored habits.
    pub fn from_habits(habits: Vec<Habit>) -> Self {
        let last_id = habits.iter().map(|h| h.id.0).max().unwrap_or(0);
        Self { habits, last_id }
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    pub fn get(&self, id: HabitId) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == id)
    }

    /// Adds a habit with an empty ledger. Blank names are ignored.
    pub fn add(&mut self, name: &str) -> Option<HabitId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let id = self.next_id();
        self.habits.push(Habit::new(id, name));
        Some(id)
    }

    /// Removes a habit together with all of its day logs.
    pub fn remove(&mut self, id: HabitId) -> bool {
        let before = self.habits.len();
        self.habits.retain(|h| h.id != id);
        self.habits.len() != before
    }

    /// Flips the completion flag for `day`, inserting a completed log if the
    /// day has none yet. Unknown ids are ignored.
    pub fn toggle(&mut self, id: HabitId, day: NaiveDate) -> Option<&Habit> {
        let habit = self.habits.iter_mut().find(|h| h.id == id)?;
        let completed = habit.logs.entry(day).or_insert(false);
        *completed = !*completed;
        Some(&*habit)
    }

    pub fn week_view(&self, reference: NaiveDate, week_start: Weekday) -> WeekView {
        let days = week_days(reference, week_start);
        let rows = self
            .habits
            .iter()
            .map(|habit| HabitWeek {
                id: habit.id,
                name: habit.name.clone(),
                completed: days.map(|d| habit.is_completed(d)),
                streak: habit.current_streak(reference),
            })
            .collect();

        WeekView {
            days,
            reference,
            rows,
        }
    }

    /// Ids are millisecond timestamps, bumped so they never repeat. Once the
    /// id space is exhausted the lowest free positive id is used instead.
    fn next_id(&mut self) -> HabitId {
        match self.last_id.checked_add(1) {
            Some(next) => {
                self.last_id = Utc::now().timestamp_millis().max(next);
                HabitId(self.last_id)
            }
            None => (1..)
                .map(HabitId)
                .find(|id| self.get(*id).is_none())
                .unwrap_or(HabitId(0)),
        }
    }
}
