//! FocusNest - a menubar focus/break timer with a habit streak tracker.
//!
//! The tray shows the running countdown; the habit grid can be toggled from
//! the menu or managed from the command line.

use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};

use clap::Parser;
use muda::MenuEvent;
use tray_icon::{TrayIcon, TrayIconBuilder};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

mod app;
mod audio;
mod cli;
mod cycle;
mod event;
mod menu;
mod models;
mod persistence;
mod streak;
mod timer;

use app::App;
use audio::AudioPlayer;
use cli::{Cli, Command};
use cycle::AudibleCue;
use event::EventResult;
use menu::MenuItems;
use persistence::Store;
use timer::{TickDriver, TimerMessage};

/// Application handler for the winit event loop.
struct FocusNest {
    app: Arc<Mutex<App>>,
    tray: Option<TrayIcon>,
    menu_items: Option<MenuItems>,
    timer_rx: Receiver<TimerMessage>,
    audio: Option<AudioPlayer>,
    driver: Option<TickDriver>,
}

impl FocusNest {
    fn new(
        app: Arc<Mutex<App>>,
        tray: TrayIcon,
        menu_items: MenuItems,
        timer_rx: Receiver<TimerMessage>,
        driver: TickDriver,
    ) -> Self {
        // Audio is created on the main thread to avoid Send issues
        let audio = match AudioPlayer::new() {
            Ok(audio) => Some(audio),
            Err(e) => {
                log::warn!("Audio disabled: {}", e);
                None
            }
        };

        Self {
            app,
            tray: Some(tray),
            menu_items: Some(menu_items),
            timer_rx,
            audio,
            driver: Some(driver),
        }
    }

    fn update_menu(&self) {
        if let Some(ref items) = self.menu_items {
            let app = app::lock(&self.app);
            menu::update_menu_items(items, &app.timer);
        }
    }

    fn update_tray_title(&self) {
        let title = timer::format_tray_title(&app::lock(&self.app).timer);
        self.set_tray_title(&title);
    }

    fn set_tray_title(&self, title: &str) {
        if let Some(ref tray) = self.tray {
            tray.set_title(Some(title));
        }
    }

    /// Rebuilds the whole menu, needed whenever habits or durations change.
    fn rebuild_menu(&mut self) {
        let built = {
            let app = app::lock(&self.app);
            menu::build_menu(&app, App::today())
        };

        match built {
            Ok((menu, items)) => {
                if let Some(ref tray) = self.tray {
                    tray.set_menu(Some(Box::new(menu)));
                }
                self.menu_items = Some(items);
            }
            Err(e) => log::warn!("Failed to rebuild menu: {}", e),
        }
    }

    fn process_timer_messages(&mut self) {
        // Process all pending timer messages
        while let Ok(msg) = self.timer_rx.try_recv() {
            match msg {
                TimerMessage::StateChanged { title } => {
                    self.set_tray_title(&title);
                    self.update_menu();
                }
                TimerMessage::Completed(event) => {
                    log::debug!("Countdown finished: {:?}", event);
                }
                TimerMessage::Chime => {
                    if let Some(ref audio) = self.audio {
                        if let Err(e) = audio.play() {
                            log::warn!("Failed to play chime: {}", e);
                        }
                    }
                }
            }
        }
    }

    fn process_menu_events(&mut self, event_loop: &ActiveEventLoop) {
        while let Ok(event) = MenuEvent::receiver().try_recv() {
            let result = {
                let mut app = app::lock(&self.app);
                event::handle_menu_id(&mut app, event.id().as_ref())
            };

            match result {
                EventResult::Quit => {
                    if let Some(mut driver) = self.driver.take() {
                        driver.stop();
                    }
                    event_loop.exit();
                    return;
                }
                EventResult::StateChanged => {
                    self.update_menu();
                    self.update_tray_title();
                }
                EventResult::SettingsChanged => {
                    self.rebuild_menu();
                    self.update_tray_title();
                }
                EventResult::HabitsChanged => self.rebuild_menu(),
                EventResult::Continue => {}
            }
        }
    }

    /// The habit grid is built for one day; rebuild it after midnight.
    fn check_day_rollover(&mut self) {
        let stale = self
            .menu_items
            .as_ref()
            .is_some_and(|items| items.built_for != App::today());
        if stale {
            self.rebuild_menu();
        }
    }
}

impl ApplicationHandler for FocusNest {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        // Nothing to do on resume for a tray-only app
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
        // No window events for a tray-only app
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Set a short poll interval to check for events
        event_loop.set_control_flow(ControlFlow::Poll);

        self.process_timer_messages();
        self.process_menu_events(event_loop);
        self.check_day_rollover();
    }
}

fn run_tray(app: App) -> Result<(), Box<dyn std::error::Error>> {
    let app = Arc::new(Mutex::new(app));

    // Create event loop (required for tray on macOS)
    let event_loop = EventLoop::new()?;

    let (built_menu, menu_items) = {
        let app_lock = app::lock(&app);
        menu::build_menu(&app_lock, App::today())?
    };

    let title = timer::format_tray_title(&app::lock(&app).timer);
    let tray = TrayIconBuilder::new()
        .with_menu(Box::new(built_menu))
        .with_title(&title)
        .with_tooltip("FocusNest - Focus Timer & Habits")
        .build()?;

    // Channel for timer messages
    let (tx, rx) = mpsc::channel();
    let driver = TickDriver::spawn(Arc::clone(&app), tx);

    let mut focusnest = FocusNest::new(app, tray, menu_items, rx, driver);
    event_loop.run_app(&mut focusnest)?;

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let store = match cli.db {
        Some(ref path) => Store::open(path)?,
        None => Store::open_default()?,
    };
    let mut app = App::new(store, cli.week_start.into());

    match cli.command {
        None | Some(Command::Tray) => run_tray(app),
        Some(Command::Habit(command)) => {
            cli::run_habit(&mut app, command, App::today(), &mut std::io::stdout())?;
            Ok(())
        }
        Some(Command::Settings(args)) => {
            cli::run_settings(&mut app, args, &mut std::io::stdout())?;
            Ok(())
        }
    }
}
