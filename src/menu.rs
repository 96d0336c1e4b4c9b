//! Menu building and updating for the tray dropdown.

use crate::app::App;
use crate::cycle::CycleTimer;
use crate::event::MenuAction;
use crate::models::{TimerMode, TimerSettings};
use crate::streak::{HabitWeek, WeekView};
use crate::timer::format_time;
use chrono::NaiveDate;
use muda::accelerator::Accelerator;
use muda::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use std::collections::HashMap;
use thiserror::Error;

pub const ID_STATUS: &str = "status";
pub const ID_PROGRESS: &str = "progress";
pub const ID_CYCLES: &str = "cycles";

const FOCUS_PRESETS: [u32; 6] = [15, 20, 25, 30, 45, 60];
const SHORT_BREAK_PRESETS: [u32; 4] = [3, 5, 10, 15];
const LONG_BREAK_PRESETS: [u32; 4] = [10, 15, 20, 30];

const PROGRESS_WIDTH: usize = 20;

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Menu error: {0}")]
    Muda(#[from] muda::Error),
}

/// Holds references to menu items that need dynamic updates.
pub struct MenuItems {
    pub status: MenuItem,
    pub progress: MenuItem,
    pub cycles: MenuItem,
    pub start: MenuItem,
    pub pause: MenuItem,
    pub mode_checks: HashMap<TimerMode, CheckMenuItem>,
    /// The day the habit grid was built for.
    pub built_for: NaiveDate,
}

fn action_item(action: MenuAction, text: &str, enabled: bool) -> MenuItem {
    MenuItem::with_id(MenuId::new(action.id()), text, enabled, None::<Accelerator>)
}

fn info_item(id: &str, text: String) -> MenuItem {
    MenuItem::with_id(MenuId::new(id), text, false, None::<Accelerator>)
}

/// Builds the complete menu structure.
pub fn build_menu(app: &App, today: NaiveDate) -> Result<(Menu, MenuItems), MenuError> {
    let timer = &app.timer;
    let menu = Menu::new();

    // Status display (disabled, info only)
    let status = info_item(ID_STATUS, format_status(timer));
    let progress = info_item(ID_PROGRESS, format_progress(timer.progress_fraction()));
    let cycles = info_item(ID_CYCLES, format_cycles(timer.completed_focus_cycles()));
    menu.append(&status)?;
    menu.append(&progress)?;
    menu.append(&cycles)?;

    menu.append(&PredefinedMenuItem::separator())?;

    // Mode selection
    let mut mode_checks = HashMap::new();
    for mode in TimerMode::ALL {
        let item = CheckMenuItem::with_id(
            MenuId::new(MenuAction::SetMode(mode).id()),
            mode.label(),
            true,
            mode == timer.mode(),
            None::<Accelerator>,
        );
        menu.append(&item)?;
        mode_checks.insert(mode, item);
    }

    menu.append(&PredefinedMenuItem::separator())?;

    // Control buttons
    let start = action_item(MenuAction::Start, "▶  Start", !timer.is_running());
    let pause = action_item(MenuAction::Pause, "⏸  Pause", timer.is_running());
    let reset = action_item(MenuAction::Reset, "↺  Reset", true);
    menu.append(&start)?;
    menu.append(&pause)?;
    menu.append(&reset)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let habits_menu = build_habits_submenu(&app.week_view(today))?;
    menu.append(&habits_menu)?;

    let settings_menu = build_settings_submenu(timer.settings())?;
    menu.append(&settings_menu)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let quit = action_item(MenuAction::Quit, "Quit FocusNest", true);
    menu.append(&quit)?;

    let items = MenuItems {
        status,
        progress,
        cycles,
        start,
        pause,
        mode_checks,
        built_for: today,
    };

    Ok((menu, items))
}

fn build_habits_submenu(view: &WeekView) -> Result<Submenu, MenuError> {
    let submenu = Submenu::new(format!("✅  Habits ({})", format_week_range(view)), true);

    if view.rows.is_empty() {
        let empty = MenuItem::new(
            "No habits yet. Add one with `focusnest habit add`",
            false,
            None::<Accelerator>,
        );
        submenu.append(&empty)?;
    }

    for row in &view.rows {
        let habit_sub = Submenu::new(format_habit_title(row), true);
        for (i, day) in view.days.iter().enumerate() {
            let item = CheckMenuItem::with_id(
                MenuId::new(MenuAction::ToggleHabit(row.id, *day).id()),
                format_day_label(*day, *day == view.reference),
                true,
                row.completed[i],
                None::<Accelerator>,
            );
            habit_sub.append(&item)?;
        }
        habit_sub.append(&PredefinedMenuItem::separator())?;
        habit_sub.append(&action_item(MenuAction::DeleteHabit(row.id), "Delete", true))?;
        submenu.append(&habit_sub)?;
    }

    submenu.append(&PredefinedMenuItem::separator())?;
    submenu.append(&action_item(MenuAction::ReloadHabits, "Reload Habits", true))?;

    Ok(submenu)
}

/// Duration presets are rebuilt with the menu, so their checkmarks are not tracked.
fn build_settings_submenu(settings: &TimerSettings) -> Result<Submenu, MenuError> {
    let submenu = Submenu::new("⚙  Settings", true);

    for (mode, presets) in [
        (TimerMode::Focus, &FOCUS_PRESETS[..]),
        (TimerMode::ShortBreak, &SHORT_BREAK_PRESETS[..]),
        (TimerMode::LongBreak, &LONG_BREAK_PRESETS[..]),
    ] {
        let current = settings.minutes(mode);
        let mode_sub = Submenu::new(format!("{}: {} min", mode.label(), current), true);
        for &mins in presets {
            let item = CheckMenuItem::with_id(
                MenuId::new(MenuAction::SetDuration(mode, mins).id()),
                format!("{} min", mins),
                true,
                mins == current,
                None::<Accelerator>,
            );
            mode_sub.append(&item)?;
        }
        submenu.append(&mode_sub)?;
    }

    Ok(submenu)
}

/// Updates the timer-related items based on the current state.
pub fn update_menu_items(items: &MenuItems, timer: &CycleTimer) {
    items.status.set_text(format_status(timer));
    items.progress.set_text(format_progress(timer.progress_fraction()));
    items.cycles.set_text(format_cycles(timer.completed_focus_cycles()));

    for (mode, check) in &items.mode_checks {
        check.set_checked(*mode == timer.mode());
    }

    items.start.set_enabled(!timer.is_running());
    items.pause.set_enabled(timer.is_running());
}

/// Formats the status line for the menu.
pub fn format_status(timer: &CycleTimer) -> String {
    let suffix = if timer.is_running() { "" } else { " (paused)" };
    format!(
        "{}  ·  {}{}",
        timer.mode().label(),
        format_time(timer.remaining_secs()),
        suffix
    )
}

/// Formats the progress bar for the menu.
pub fn format_progress(fraction: f32) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (fraction * PROGRESS_WIDTH as f32).round() as usize;
    format!(
        "{}{}  {}%",
        "█".repeat(filled),
        "░".repeat(PROGRESS_WIDTH - filled),
        (fraction * 100.0).round() as u32
    )
}

pub fn format_cycles(count: u32) -> String {
    format!("Completed cycles: {}", count)
}

pub fn format_habit_title(row: &HabitWeek) -> String {
    match row.streak {
        0 => row.name.clone(),
        1 => format!("{}  ·  🔥 1 day", row.name),
        n => format!("{}  ·  🔥 {} days", row.name, n),
    }
}

/// Formats a grid column label, e.g. `Wed 05/15`.
pub fn format_day_label(day: NaiveDate, is_today: bool) -> String {
    let label = day.format("%a %m/%d").to_string();
    if is_today {
        format!("{} (today)", label)
    } else {
        label
    }
}

pub fn format_week_range(view: &WeekView) -> String {
    format!(
        "{} – {}",
        view.days[0].format("%b %d"),
        view.days[6].format("%b %d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HabitId, TimerState};
    use crate::streak::StreakLedger;
    use chrono::Weekday;

    fn timer_with(remaining_secs: u32, running: bool) -> CycleTimer {
        CycleTimer::with_state(
            TimerSettings::default(),
            TimerState {
                mode: TimerMode::ShortBreak,
                remaining_secs,
                running,
                completed_focus_cycles: 2,
            },
        )
    }

    #[test]
    fn test_format_status() {
        assert_eq!(format_status(&timer_with(180, true)), "Short Break  ·  03:00");
        assert_eq!(
            format_status(&timer_with(180, false)),
            "Short Break  ·  03:00 (paused)"
        );
    }

    #[test]
    fn test_format_progress_empty() {
        assert_eq!(format_progress(0.0), "░░░░░░░░░░░░░░░░░░░░  0%");
    }

    #[test]
    fn test_format_progress_half() {
        assert_eq!(format_progress(0.5), "██████████░░░░░░░░░░  50%");
    }

    #[test]
    fn test_format_progress_complete() {
        assert_eq!(format_progress(1.0), "████████████████████  100%");
    }

    #[test]
    fn test_format_progress_from_timer() {
        // 150 of 300 seconds elapsed
        let timer = timer_with(150, true);
        assert_eq!(format_progress(timer.progress_fraction()), "██████████░░░░░░░░░░  50%");
    }

    #[test]
    fn test_format_cycles() {
        assert_eq!(format_cycles(3), "Completed cycles: 3");
    }

    #[test]
    fn test_format_habit_title() {
        let mut row = HabitWeek {
            id: HabitId(1),
            name: "Read".to_string(),
            completed: [false; 7],
            streak: 0,
        };
        assert_eq!(format_habit_title(&row), "Read");
        row.streak = 1;
        assert_eq!(format_habit_title(&row), "Read  ·  🔥 1 day");
        row.streak = 12;
        assert_eq!(format_habit_title(&row), "Read  ·  🔥 12 days");
    }

    #[test]
    fn test_format_day_label() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        assert_eq!(format_day_label(day, false), "Wed 05/15");
        assert_eq!(format_day_label(day, true), "Wed 05/15 (today)");
    }

    #[test]
    fn test_format_week_range() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let view = StreakLedger::default().week_view(day, Weekday::Sun);
        assert_eq!(format_week_range(&view), "May 12 – May 18");
    }
}
