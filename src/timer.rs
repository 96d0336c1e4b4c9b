//! One-second tick source for the cycle timer.
//!
//! The driver thread only calls [`App::tick`]; the state machine itself stays
//! synchronous. Delayed or skipped ticks are not caught up.

use crate::app::{self, App};
use crate::cycle::{AudibleCue, CompletionEvent, CueError, CycleTimer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Nominal tick cadence.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Message sent from the timer thread to the main thread.
#[derive(Debug, Clone)]
pub enum TimerMessage {
    /// Timer state has changed, UI needs update.
    StateChanged { title: String },
    /// A countdown reached zero.
    Completed(CompletionEvent),
    /// Play the completion tone.
    Chime,
}

/// Forwards the completion cue to the thread that owns the audio device.
pub struct ChannelCue {
    tx: Sender<TimerMessage>,
}

impl ChannelCue {
    pub fn new(tx: Sender<TimerMessage>) -> Self {
        Self { tx }
    }
}

impl AudibleCue for ChannelCue {
    fn play(&self) -> Result<(), CueError> {
        self.tx
            .send(TimerMessage::Chime)
            .map_err(|_| CueError::Unavailable("main thread is gone".to_string()))
    }
}

/// Background thread that ticks the shared app until stopped.
pub struct TickDriver {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TickDriver {
    pub fn spawn(app: Arc<Mutex<App>>, tx: Sender<TimerMessage>) -> Self {
        Self::with_interval(app, tx, TICK_INTERVAL)
    }

    pub fn with_interval(app: Arc<Mutex<App>>, tx: Sender<TimerMessage>, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::spawn(move || run_timer_loop(app, tx, interval, stop_flag));

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stops the tick source. No tick is delivered after this returns.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Timer thread panicked");
            }
        }
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_timer_loop(
    app: Arc<Mutex<App>>,
    tx: Sender<TimerMessage>,
    interval: Duration,
    stop: Arc<AtomicBool>,
) {
    let cue = ChannelCue::new(tx.clone());

    while !stop.load(Ordering::SeqCst) {
        thread::sleep(interval);
        if stop.load(Ordering::SeqCst) {
            break;
        }

        let (message, completion) = {
            let mut app = app::lock(&app);
            let (changed, completion) = app.tick(&cue);
            let message = changed.then(|| TimerMessage::StateChanged {
                title: format_tray_title(&app.timer),
            });
            (message, completion)
        };

        // The receiver may already be gone during shutdown.
        if let Some(event) = completion {
            let _ = tx.send(TimerMessage::Completed(event));
        }
        if let Some(msg) = message {
            let _ = tx.send(msg);
        }
    }
}

/// Formats the tray title based on the current timer state.
pub fn format_tray_title(timer: &CycleTimer) -> String {
    let icon = if timer.mode().is_break() { "☕" } else { "🎯" };
    let remaining = timer.remaining_secs();
    let full = timer.settings().duration_secs(timer.mode());

    if timer.is_running() {
        format!("{} {}", icon, format_time(remaining))
    } else if remaining < full {
        format!("⏸ {}", format_time(remaining))
    } else {
        icon.to_string()
    }
}

/// Formats time in MM:SS format.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TimerMode, TimerSettings, TimerState};
    use crate::persistence::Store;
    use chrono::Weekday;
    use std::sync::mpsc;

    fn timer_with(mode: TimerMode, remaining_secs: u32, running: bool) -> CycleTimer {
        CycleTimer::with_state(
            TimerSettings::default(),
            TimerState {
                mode,
                remaining_secs,
                running,
                completed_focus_cycles: 0,
            },
        )
    }

    #[test]
    fn test_format_tray_title_idle() {
        assert_eq!(format_tray_title(&timer_with(TimerMode::Focus, 1500, false)), "🎯");
        assert_eq!(format_tray_title(&timer_with(TimerMode::ShortBreak, 300, false)), "☕");
    }

    #[test]
    fn test_format_tray_title_running() {
        assert_eq!(
            format_tray_title(&timer_with(TimerMode::Focus, 1432, true)),
            "🎯 23:52"
        );
        assert_eq!(
            format_tray_title(&timer_with(TimerMode::ShortBreak, 272, true)),
            "☕ 04:32"
        );
    }

    #[test]
    fn test_format_tray_title_paused() {
        assert_eq!(
            format_tray_title(&timer_with(TimerMode::Focus, 600, false)),
            "⏸ 10:00"
        );
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(59), "00:59");
        assert_eq!(format_time(60), "01:00");
        assert_eq!(format_time(125), "02:05");
        assert_eq!(format_time(1500), "25:00");
        assert_eq!(format_time(3599), "59:59");
    }

    #[test]
    fn test_channel_cue_sends_chime_until_receiver_dropped() {
        let (tx, rx) = mpsc::channel();
        let cue = ChannelCue::new(tx);
        assert!(cue.play().is_ok());
        assert!(matches!(rx.try_recv(), Ok(TimerMessage::Chime)));

        drop(rx);
        assert!(cue.play().is_err());
    }

    #[test]
    fn test_driver_ticks_until_completion() {
        let mut app = App::new(Store::open_in_memory().unwrap(), Weekday::Sun);
        app.update_settings(|s| s.focus = 1).unwrap();
        app.start();
        let app = Arc::new(Mutex::new(app));

        let (tx, rx) = mpsc::channel();
        let mut driver = TickDriver::with_interval(Arc::clone(&app), tx, Duration::from_millis(1));

        let mut saw_chime = false;
        let completion = loop {
            match rx.recv_timeout(Duration::from_secs(10)) {
                Ok(TimerMessage::Chime) => saw_chime = true,
                Ok(TimerMessage::Completed(event)) => break event,
                Ok(TimerMessage::StateChanged { .. }) => {}
                Err(e) => panic!("timer never completed: {}", e),
            }
        };
        driver.stop();

        assert!(saw_chime);
        assert_eq!(
            completion,
            CompletionEvent::FocusComplete {
                cycles: 1,
                next: TimerMode::ShortBreak
            }
        );
        let app = app::lock(&app);
        assert_eq!(app.timer.mode(), TimerMode::ShortBreak);
        assert!(!app.timer.is_running());
    }

    #[test]
    fn test_stopped_driver_does_not_tick() {
        let mut app = App::new(Store::open_in_memory().unwrap(), Weekday::Sun);
        app.start();
        let app = Arc::new(Mutex::new(app));

        let (tx, rx) = mpsc::channel();
        let mut driver = TickDriver::with_interval(Arc::clone(&app), tx, Duration::from_millis(1));
        driver.stop();

        let remaining = app::lock(&app).timer.remaining_secs();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(app::lock(&app).timer.remaining_secs(), remaining);
        drop(rx);
    }
}
