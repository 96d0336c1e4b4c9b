//! Focus/break cycle timer.
//!
//! A synchronous state machine. Time only advances through [`CycleTimer::tick`],
//! which the host calls once per second while the timer is running.

use crate::models::{SettingsError, TimerMode, TimerSettings, TimerState};
use thiserror::Error;

/// Every n-th completed focus countdown is followed by a long break.
pub const LONG_BREAK_EVERY: u32 = 4;

#[derive(Error, Debug)]
pub enum CueError {
    #[error("Audible cue unavailable: {0}")]
    Unavailable(String),
}

/// Plays a short tone when a countdown completes.
pub trait AudibleCue {
    fn play(&self) -> Result<(), CueError>;
}

/// A cue that does nothing.
#[cfg(test)]
pub struct Silent;

#[cfg(test)]
impl AudibleCue for Silent {
    fn play(&self) -> Result<(), CueError> {
        Ok(())
    }
}

/// Emitted when a countdown reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionEvent {
    FocusComplete { cycles: u32, next: TimerMode },
    BreakComplete { finished: TimerMode },
}

#[derive(Debug, Clone)]
pub struct CycleTimer {
    settings: TimerSettings,
    state: TimerState,
}

impl CycleTimer {
    pub fn new(settings: TimerSettings) -> Self {
        Self {
            state: TimerState::fresh(TimerMode::Focus, &settings),
            settings,
        }
    }

    /// Creates a timer from an explicit state (for testing). `remaining_secs` is
    /// clamped to the mode's full duration.
    #[cfg(test)]
    pub fn with_state(settings: TimerSettings, mut state: TimerState) -> Self {
        state.remaining_secs = state.remaining_secs.min(settings.duration_secs(state.mode));
        Self { settings, state }
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    pub fn remaining_secs(&self) -> u32 {
        self.state.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn completed_focus_cycles(&self) -> u32 {
        self.state.completed_focus_cycles
    }

    pub fn set_mode(&mut self, mode: TimerMode) {
        self.state.mode = mode;
        self.state.running = false;
        self.state.remaining_secs = self.settings.duration_secs(mode);
    }

    pub fn start(&mut self) {
        if self.state.remaining_secs > 0 {
            self.state.running = true;
        }
    }

    pub fn pause(&mut self) {
        self.state.running = false;
    }

    /// Stops the countdown and restores the current mode's full duration.
    pub fn reset(&mut self) {
        self.state.running = false;
        self.state.remaining_secs = self.settings.duration_secs(self.state.mode);
    }

    /// Replaces the durations and re-derives the remaining time for the
    /// current mode. The running flag is left as is.
    pub fn update_settings(&mut self, settings: TimerSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.settings = settings;
        self.state.remaining_secs = settings.duration_secs(self.state.mode);
        Ok(())
    }

    /// Advances the countdown by one second.
    /// Returns (state_changed, optional_completion_event).
    pub fn tick(&mut self, cue: &dyn AudibleCue) -> (bool, Option<CompletionEvent>) {
        if !self.state.running || self.state.remaining_secs == 0 {
            return (false, None);
        }

        self.state.remaining_secs -= 1;
        if self.state.remaining_secs > 0 {
            return (true, None);
        }

        self.state.running = false;
        if let Err(e) = cue.play() {
            log::debug!("Ignoring cue failure: {}", e);
        }

        let event = self.advance_mode();
        self.state.remaining_secs = self.settings.duration_secs(self.state.mode);
        (true, Some(event))
    }

    fn advance_mode(&mut self) -> CompletionEvent {
        match self.state.mode {
            TimerMode::Focus => {
                self.state.completed_focus_cycles += 1;
                let cycles = self.state.completed_focus_cycles;
                let next = if cycles % LONG_BREAK_EVERY == 0 {
                    TimerMode::LongBreak
                } else {
                    TimerMode::ShortBreak
                };
                self.state.mode = next;
                CompletionEvent::FocusComplete { cycles, next }
            }
            finished => {
                self.state.mode = TimerMode::Focus;
                CompletionEvent::BreakComplete { finished }
            }
        }
    }

    /// Elapsed share of the current countdown, from 0.0 to 1.0.
    pub fn progress_fraction(&self) -> f32 {
        let total = self.settings.duration_secs(self.state.mode);
        if total == 0 {
            return 1.0;
        }
        let elapsed = total.saturating_sub(self.state.remaining_secs);
        elapsed as f32 / total as f32
    }
}
