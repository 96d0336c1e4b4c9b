//! Menu event handling.
//!
//! Menu ids are encoded from [`MenuAction`] when the menu is built and decoded
//! back when an item is clicked, so the dispatch logic never touches muda.

use crate::app::App;
use crate::models::{HabitId, TimerMode};
use chrono::NaiveDate;

const ID_START: &str = "start";
const ID_PAUSE: &str = "pause";
const ID_RESET: &str = "reset";
const ID_RELOAD: &str = "reload_habits";
const ID_QUIT: &str = "quit";

/// Something the user asked for from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    SetMode(TimerMode),
    Start,
    Pause,
    Reset,
    SetDuration(TimerMode, u32),
    ToggleHabit(HabitId, NaiveDate),
    DeleteHabit(HabitId),
    ReloadHabits,
    Quit,
}

impl MenuAction {
    /// The menu id this action is bound to.
    pub fn id(&self) -> String {
        match self {
            Self::SetMode(mode) => format!("mode_{}", mode_key(*mode)),
            Self::Start => ID_START.to_string(),
            Self::Pause => ID_PAUSE.to_string(),
            Self::Reset => ID_RESET.to_string(),
            Self::SetDuration(mode, mins) => format!("{}_{}", mode_key(*mode), mins),
            Self::ToggleHabit(id, day) => format!("habit_{}_{}", id, day),
            Self::DeleteHabit(id) => format!("delete_{}", id),
            Self::ReloadHabits => ID_RELOAD.to_string(),
            Self::Quit => ID_QUIT.to_string(),
        }
    }

    /// Decodes a menu id. Ids that carry no action (status lines) yield `None`.
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            ID_START => return Some(Self::Start),
            ID_PAUSE => return Some(Self::Pause),
            ID_RESET => return Some(Self::Reset),
            ID_RELOAD => return Some(Self::ReloadHabits),
            ID_QUIT => return Some(Self::Quit),
            _ => {}
        }

        if let Some(key) = id.strip_prefix("mode_") {
            return parse_mode_key(key).map(Self::SetMode);
        }

        if let Some(rest) = id.strip_prefix("habit_") {
            let (habit, day) = rest.split_once('_')?;
            return Some(Self::ToggleHabit(habit.parse().ok()?, day.parse().ok()?));
        }

        if let Some(habit) = id.strip_prefix("delete_") {
            return habit.parse().ok().map(Self::DeleteHabit);
        }

        // Duration presets
        let (key, mins) = id.split_once('_')?;
        let mode = parse_mode_key(key)?;
        let mins = mins.parse().ok()?;
        Some(Self::SetDuration(mode, mins))
    }
}

fn mode_key(mode: TimerMode) -> &'static str {
    match mode {
        TimerMode::Focus => "focus",
        TimerMode::ShortBreak => "short",
        TimerMode::LongBreak => "long",
    }
}

fn parse_mode_key(key: &str) -> Option<TimerMode> {
    TimerMode::ALL.into_iter().find(|m| mode_key(*m) == key)
}

/// Result of handling a menu event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Event handled, continue running.
    Continue,
    /// User requested quit.
    Quit,
    /// Timer state changed, menu needs update.
    StateChanged,
    /// Durations changed, menu needs rebuild.
    SettingsChanged,
    /// Habit list changed, habit submenu needs rebuild.
    HabitsChanged,
}

/// Handles a clicked menu id and updates the app state accordingly.
pub fn handle_menu_id(app: &mut App, id: &str) -> EventResult {
    match MenuAction::parse(id) {
        Some(action) => apply(app, action),
        None => EventResult::Continue,
    }
}

pub fn apply(app: &mut App, action: MenuAction) -> EventResult {
    match action {
        MenuAction::SetMode(mode) => {
            app.set_mode(mode);
            EventResult::StateChanged
        }
        MenuAction::Start => {
            app.start();
            EventResult::StateChanged
        }
        MenuAction::Pause => {
            app.pause();
            EventResult::StateChanged
        }
        MenuAction::Reset => {
            app.reset();
            EventResult::StateChanged
        }
        MenuAction::SetDuration(mode, mins) => {
            match app.update_settings(|s| s.set_minutes(mode, mins)) {
                Ok(()) => EventResult::SettingsChanged,
                Err(e) => {
                    log::warn!("Rejected duration change: {}", e);
                    EventResult::Continue
                }
            }
        }
        // Reload first so edits from the CLI are not overwritten.
        MenuAction::ToggleHabit(id, day) => {
            app.reload_habits();
            if app.toggle_habit(id, day).is_none() {
                log::debug!("Habit {} no longer exists", id);
            }
            EventResult::HabitsChanged
        }
        MenuAction::DeleteHabit(id) => {
            app.reload_habits();
            app.remove_habit(id);
            EventResult::HabitsChanged
        }
        MenuAction::ReloadHabits => {
            app.reload_habits();
            EventResult::HabitsChanged
        }
        MenuAction::Quit => EventResult::Quit,
    }
}
