//! Main application state and logic.

use crate::cycle::{AudibleCue, CompletionEvent, CycleTimer};
use crate::models::{HabitId, SettingsError, TimerMode, TimerSettings};
use crate::persistence::{Store, HABITS_KEY, SETTINGS_KEY};
use crate::streak::{StreakLedger, WeekView};
use chrono::{Local, NaiveDate, Weekday};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The timer and the habit tracker, plus the store they are saved to.
/// The two widgets share nothing but the store.
pub struct App {
    pub timer: CycleTimer,
    pub habits: StreakLedger,
    pub week_start: Weekday,
    store: Store,
}

impl App {
    /// Loads settings and habits from `store`.
    pub fn new(store: Store, week_start: Weekday) -> Self {
        let settings = load_settings(&store);
        let habits = StreakLedger::from_habits(store.get(HABITS_KEY, Vec::new()));

        Self {
            timer: CycleTimer::new(settings),
            habits,
            week_start,
            store,
        }
    }

    /// The local calendar day.
    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub fn set_mode(&mut self, mode: TimerMode) {
        self.timer.set_mode(mode);
    }

    pub fn start(&mut self) {
        self.timer.start();
    }

    pub fn pause(&mut self) {
        self.timer.pause();
    }

    pub fn reset(&mut self) {
        self.timer.reset();
    }

    /// Advances the timer by one second.
    /// Returns (state_changed, optional_completion_event).
    pub fn tick(&mut self, cue: &dyn AudibleCue) -> (bool, Option<CompletionEvent>) {
        let (changed, event) = self.timer.tick(cue);
        match event {
            Some(CompletionEvent::FocusComplete { cycles, next }) => {
                log::info!("Focus cycle {} complete, next: {}", cycles, next);
            }
            Some(CompletionEvent::BreakComplete { finished }) => {
                log::info!("{} complete, back to focus", finished);
            }
            None => {}
        }
        (changed, event)
    }

    /// Updates the timer durations and saves them.
    pub fn update_settings<F>(&mut self, updater: F) -> Result<(), SettingsError>
    where
        F: FnOnce(&mut TimerSettings),
    {
        let mut settings = *self.timer.settings();
        updater(&mut settings);
        self.timer.update_settings(settings)?;
        self.store.set(SETTINGS_KEY, &settings);
        Ok(())
    }

    /// Re-reads the habit list from the store, picking up edits made by
    /// another process.
    pub fn reload_habits(&mut self) {
        self.habits = StreakLedger::from_habits(self.store.get(HABITS_KEY, Vec::new()));
    }

    pub fn add_habit(&mut self, name: &str) -> Option<HabitId> {
        let id = self.habits.add(name)?;
        self.save_habits();
        Some(id)
    }

    pub fn remove_habit(&mut self, id: HabitId) -> bool {
        let removed = self.habits.remove(id);
        if removed {
            self.save_habits();
        }
        removed
    }

    /// Toggles `day` for a habit. Returns the new completion state, or `None`
    /// if the habit does not exist.
    pub fn toggle_habit(&mut self, id: HabitId, day: NaiveDate) -> Option<bool> {
        let completed = self.habits.toggle(id, day)?.is_completed(day);
        self.save_habits();
        Some(completed)
    }

    pub fn week_view(&self, reference: NaiveDate) -> WeekView {
        self.habits.week_view(reference, self.week_start)
    }

    fn save_habits(&self) {
        self.store.set(HABITS_KEY, self.habits.habits());
    }
}

/// Locks the shared app, recovering from a poisoned lock.
pub fn lock(app: &Mutex<App>) -> MutexGuard<'_, App> {
    app.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stored settings with a zero duration are treated as absent.
fn load_settings(store: &Store) -> TimerSettings {
    let settings = store.get(SETTINGS_KEY, TimerSettings::default());
    match settings.validate() {
        Ok(()) => settings,
        Err(e) => {
            log::warn!("Ignoring stored settings: {}", e);
            TimerSettings::default()
        }
    }
}
