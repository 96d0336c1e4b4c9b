//! Command line interface.

use crate::app::App;
use crate::models::{HabitId, SettingsError, TimerMode};
use crate::persistence::DB_PATH_ENV;
use crate::streak::WeekView;
use chrono::{NaiveDate, Weekday};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "focusnest", version, about = "Focus timer and habit streaks in your menubar")]
pub struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true, env = DB_PATH_ENV)]
    pub db: Option<PathBuf>,

    /// First day of the habit week
    #[arg(long, global = true, value_enum, default_value_t = WeekStart::Sunday)]
    pub week_start: WeekStart,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekStart {
    Sunday,
    Monday,
}

impl From<WeekStart> for Weekday {
    fn from(start: WeekStart) -> Self {
        match start {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the menubar timer (default)
    Tray,
    /// Manage tracked habits
    #[command(subcommand)]
    Habit(HabitCommand),
    /// Show or change timer durations
    Settings(SettingsArgs),
}

#[derive(Subcommand, Debug)]
pub enum HabitCommand {
    /// Start tracking a habit
    Add { name: String },
    /// Stop tracking a habit and drop its history
    Remove { id: HabitId },
    /// Flip a day between done and not done
    Toggle {
        id: HabitId,
        /// Day to toggle (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List habits with their current streak
    List,
    /// Show the week grid
    Week {
        /// Any day in the week to show (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// Focus duration in minutes
    #[arg(long)]
    pub focus: Option<u32>,
    /// Short break duration in minutes
    #[arg(long)]
    pub short_break: Option<u32>,
    /// Long break duration in minutes
    #[arg(long)]
    pub long_break: Option<u32>,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("No habit with id {0}")]
    UnknownHabit(HabitId),
    #[error("Habit name must not be blank")]
    BlankName,
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Runs a habit subcommand against `app`, writing a report to `out`.
pub fn run_habit(
    app: &mut App,
    command: HabitCommand,
    today: NaiveDate,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        HabitCommand::Add { name } => {
            let id = app.add_habit(&name).ok_or(CliError::BlankName)?;
            writeln!(out, "Added habit {}: {}", id, name.trim())?;
        }
        HabitCommand::Remove { id } => {
            if !app.remove_habit(id) {
                return Err(CliError::UnknownHabit(id));
            }
            writeln!(out, "Removed habit {}", id)?;
        }
        HabitCommand::Toggle { id, date } => {
            let day = date.unwrap_or(today);
            let done = app.toggle_habit(id, day).ok_or(CliError::UnknownHabit(id))?;
            let habit = app.habits.get(id).ok_or(CliError::UnknownHabit(id))?;
            writeln!(
                out,
                "{}: {} marked {} (streak: {})",
                habit.name,
                day,
                if done { "done" } else { "not done" },
                habit.current_streak(today)
            )?;
        }
        HabitCommand::List => {
            if app.habits.is_empty() {
                writeln!(out, "No habits yet.")?;
            }
            for habit in app.habits.habits() {
                writeln!(
                    out,
                    "{:>14}  {:<24} streak {}",
                    habit.id.0,
                    habit.name,
                    habit.current_streak(today)
                )?;
            }
        }
        HabitCommand::Week { date } => {
            write_week(&app.week_view(date.unwrap_or(today)), out)?;
        }
    }
    Ok(())
}

/// Applies any given durations, then prints the current settings.
pub fn run_settings(app: &mut App, args: SettingsArgs, out: &mut impl Write) -> Result<(), CliError> {
    let changes = [
        (TimerMode::Focus, args.focus),
        (TimerMode::ShortBreak, args.short_break),
        (TimerMode::LongBreak, args.long_break),
    ];
    if changes.iter().any(|(_, mins)| mins.is_some()) {
        app.update_settings(|s| {
            for (mode, mins) in changes {
                if let Some(mins) = mins {
                    s.set_minutes(mode, mins);
                }
            }
        })?;
    }

    let settings = app.timer.settings();
    for mode in TimerMode::ALL {
        writeln!(out, "{:<12} {} min", format!("{}:", mode.label()), settings.minutes(mode))?;
    }
    Ok(())
}

fn write_week(view: &WeekView, out: &mut impl Write) -> io::Result<()> {
    let name_width = view
        .rows
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(5);

    write!(out, "{:<width$}", "Habit", width = name_width)?;
    for day in &view.days {
        let marker = if *day == view.reference { "*" } else { " " };
        write!(out, "  {}{}", day.format("%a"), marker)?;
    }
    writeln!(out, "  Streak")?;

    if view.rows.is_empty() {
        writeln!(out, "No habits yet.")?;
    }
    for row in &view.rows {
        write!(out, "{:<width$}", row.name, width = name_width)?;
        for done in row.completed {
            write!(out, "  {}   ", if done { "✓" } else { "·" })?;
        }
        writeln!(out, "  {}", row.streak)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::Store;

    fn create_test_app() -> App {
        App::new(Store::open_in_memory().unwrap(), Weekday::Sun)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    fn run(app: &mut App, command: HabitCommand) -> Result<String, CliError> {
        let mut out = Vec::new();
        run_habit(app, command, today(), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["focusnest"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.week_start, WeekStart::Sunday);
    }

    #[test]
    fn test_parse_habit_toggle() {
        let cli = Cli::try_parse_from([
            "focusnest",
            "--week-start",
            "monday",
            "habit",
            "toggle",
            "42",
            "--date",
            "2024-05-01",
        ])
        .unwrap();

        assert_eq!(Weekday::from(cli.week_start), Weekday::Mon);
        match cli.command {
            Some(Command::Habit(HabitCommand::Toggle { id, date })) => {
                assert_eq!(id, HabitId(42));
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 1));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        let result = Cli::try_parse_from(["focusnest", "habit", "week", "--date", "yesterday"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_add_toggle_list() {
        let mut app = create_test_app();
        let out = run(&mut app, HabitCommand::Add { name: " Read ".into() }).unwrap();
        assert!(out.ends_with(": Read\n"));
        let id = app.habits.habits()[0].id;

        let out = run(&mut app, HabitCommand::Toggle { id, date: None }).unwrap();
        assert_eq!(out, "Read: 2024-05-15 marked done (streak: 1)\n");

        let out = run(&mut app, HabitCommand::List).unwrap();
        assert!(out.contains("Read"));
        assert!(out.trim_end().ends_with("streak 1"));
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let mut app = create_test_app();
        let result = run(&mut app, HabitCommand::Add { name: "  ".into() });
        assert!(matches!(result, Err(CliError::BlankName)));
    }

    #[test]
    fn test_unknown_habit() {
        let mut app = create_test_app();
        let result = run(
            &mut app,
            HabitCommand::Toggle {
                id: HabitId(3),
                date: None,
            },
        );
        assert!(matches!(result, Err(CliError::UnknownHabit(HabitId(3)))));

        let result = run(&mut app, HabitCommand::Remove { id: HabitId(3) });
        assert!(matches!(result, Err(CliError::UnknownHabit(_))));
    }

    #[test]
    fn test_week_grid() {
        let mut app = create_test_app();
        let id = app.add_habit("Run").unwrap();
        app.toggle_habit(id, today());

        let out = run(&mut app, HabitCommand::Week { date: None }).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Habit  Sun"));
        assert!(lines[0].contains("Wed*"));
        assert_eq!(lines[1].matches('✓').count(), 1);
        assert_eq!(lines[1].matches('·').count(), 6);
        assert!(lines[1].ends_with("  1"));
    }

    #[test]
    fn test_empty_list_and_week() {
        let mut app = create_test_app();
        assert_eq!(run(&mut app, HabitCommand::List).unwrap(), "No habits yet.\n");
        let out = run(&mut app, HabitCommand::Week { date: None }).unwrap();
        assert!(out.ends_with("No habits yet.\n"));
    }

    #[test]
    fn test_settings_show_and_update() {
        let mut app = create_test_app();
        let mut out = Vec::new();
        run_settings(
            &mut app,
            SettingsArgs {
                focus: Some(50),
                short_break: None,
                long_break: Some(20),
            },
            &mut out,
        )
        .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "Focus:       50 min\nShort Break: 5 min\nLong Break:  20 min\n"
        );
    }

    #[test]
    fn test_settings_reject_zero() {
        let mut app = create_test_app();
        let result = run_settings(
            &mut app,
            SettingsArgs {
                focus: Some(0),
                short_break: None,
                long_break: None,
            },
            &mut Vec::<u8>::new(),
        );
        assert!(matches!(result, Err(CliError::Settings(_))));
    }

    #[test]
    fn test_settings_reject_overlong() {
        let mut app = create_test_app();
        let result = run_settings(
            &mut app,
            SettingsArgs {
                focus: Some(u32::MAX),
                short_break: None,
                long_break: None,
            },
            &mut Vec::<u8>::new(),
        );
        assert!(matches!(
            result,
            Err(CliError::Settings(SettingsError::TooLong(TimerMode::Focus)))
        ));
        assert_eq!(app.timer.settings().focus, 25);
        assert_eq!(app.timer.remaining_secs(), 25 * 60);
    }
}
