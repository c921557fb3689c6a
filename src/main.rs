mod config;
mod ui;

use crate::config::{Config, ConfigStore, FileConfigStore};
use chrono::{DateTime, Local};
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::info;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use serde::{Deserialize, Serialize};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    time::Duration,
};
use tacho::{
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    export,
    runtime::{CrosstermEventSource, FixedTicker, Runner, TachoEvent, TachoEventSource, Ticker},
    Tachometer,
};

/// tap a key every time a spinning object comes round and get a timing table
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Records the time of each key press relative to the first one, so the rotation timing of a spinning object can be pasted into a spreadsheet or plotting tool."
)]
pub struct Cli {
    /// milliseconds between elapsed-time redraws while a session runs
    #[clap(short = 't', long)]
    tick_ms: Option<u64>,

    /// key that records a rotation
    #[clap(short = 'k', long, value_enum)]
    mark_key: Option<MarkKey>,

    /// decimals shown on the running timer
    #[clap(short = 'd', long)]
    decimals: Option<usize>,

    /// print the recorded table to stdout on exit
    #[clap(long, conflicts_with = "no_table")]
    table: bool,

    /// do not print the recorded table to stdout on exit
    #[clap(long)]
    no_table: bool,

    /// write the effective settings to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Layer command line overrides on top of the stored config
    fn apply(&self, cfg: Config) -> Config {
        Config {
            tick_ms: self.tick_ms.unwrap_or(cfg.tick_ms),
            mark_key: self.mark_key.unwrap_or(cfg.mark_key),
            decimals: self.decimals.unwrap_or(cfg.decimals),
            print_table: match (self.table, self.no_table) {
                (true, _) => true,
                (_, true) => false,
                _ => cfg.print_table,
            },
        }
    }
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum MarkKey {
    Space,
    Enter,
}

impl MarkKey {
    fn matches(&self, code: KeyCode) -> bool {
        match self {
            MarkKey::Space => code == KeyCode::Char(' '),
            MarkKey::Enter => code == KeyCode::Enter,
        }
    }
}

/// What a key press did to the app, so the loop can arm or cancel the ticker
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Started,
    Stopped,
    Marked,
    Ignored,
    Quit,
}

#[derive(Debug)]
pub struct App<C: Clock> {
    pub tacho: Tachometer<C>,
    pub settings: Config,
    pub started_at: Option<DateTime<Local>>,
}

impl<C: Clock> App<C> {
    pub fn new(clock: C, settings: Config) -> Self {
        Self {
            tacho: Tachometer::new(clock),
            settings,
            started_at: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::Ignored;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        if self.settings.mark_key.matches(key.code) {
            return match self.tacho.on_mark() {
                Some(_) => Action::Marked,
                None => Action::Ignored,
            };
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('s') => {
                if self.tacho.start() {
                    self.started_at = Some(Local::now());
                    Action::Started
                } else {
                    Action::Ignored
                }
            }
            KeyCode::Char('x') => {
                if self.tacho.stop() {
                    Action::Stopped
                } else {
                    Action::Ignored
                }
            }
            _ => Action::Ignored,
        }
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    // The terminal belongs to the TUI, so records only ever go to the file.
    // A logger that is already installed stays in place.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .ok();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let store = FileConfigStore::new();
    let settings = cli.apply(store.load());
    if cli.save_config {
        store.save(&settings)?;
        info!("saved settings to {}", store.path().display());
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(SystemClock, settings);
    let ticker = FixedTicker::new(Duration::from_millis(app.settings.tick_ms.max(1)));
    let mut runner = Runner::new(CrosstermEventSource::new(), ticker);
    let outcome = start_tui(&mut terminal, &mut app, &mut runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;
    outcome?;

    app.tacho.stop();
    if app.settings.print_table && !app.tacho.entries().is_empty() {
        export::write_table(io::stdout().lock(), app.tacho.entries())?;
    }

    Ok(())
}

fn start_tui<B: Backend, C: Clock, E: TachoEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    runner: &mut Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            TachoEvent::Tick => {
                if app.tacho.is_running() {
                    terminal.draw(|f| ui(app, f))?;
                }
            }
            TachoEvent::Resize => {
                terminal.draw(|f| ui(app, f))?;
            }
            TachoEvent::Key(key) => {
                match app.handle_key(key) {
                    Action::Quit => break,
                    Action::Started => runner.start_ticking(),
                    Action::Stopped => runner.stop_ticking(),
                    Action::Marked | Action::Ignored => {}
                }
                terminal.draw(|f| ui(app, f))?;
            }
            TachoEvent::Closed => break,
        }
    }

    Ok(())
}

fn ui<C: Clock>(app: &App<C>, f: &mut Frame) {
    f.render_widget(app, f.area());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tacho::{clock::ManualClock, Entry};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(clock: &ManualClock) -> App<ManualClock> {
        App::new(clock.clone(), Config::default())
    }

    #[test]
    fn start_mark_stop_flow() {
        let clock = ManualClock::new(0);
        let mut app = app(&clock);

        assert_eq!(app.handle_key(press(KeyCode::Char('s'))), Action::Started);
        assert!(app.started_at.is_some());
        clock.set(1_500);
        assert_eq!(app.handle_key(press(KeyCode::Char(' '))), Action::Marked);
        clock.set(2_300);
        assert_eq!(app.handle_key(press(KeyCode::Char(' '))), Action::Marked);
        assert_eq!(app.handle_key(press(KeyCode::Char('x'))), Action::Stopped);

        assert_eq!(
            app.tacho.entries(),
            &[Entry::new(0.0, 0), Entry::new(0.8, 1)]
        );
    }

    #[test]
    fn repeated_commands_are_ignored() {
        let clock = ManualClock::new(0);
        let mut app = app(&clock);
        assert_eq!(app.handle_key(press(KeyCode::Char('x'))), Action::Ignored);
        assert_eq!(app.handle_key(press(KeyCode::Char(' '))), Action::Ignored);
        app.handle_key(press(KeyCode::Char('s')));
        assert_eq!(app.handle_key(press(KeyCode::Char('s'))), Action::Ignored);
    }

    #[test]
    fn key_release_does_not_mark() {
        let clock = ManualClock::new(0);
        let mut app = app(&clock);
        app.handle_key(press(KeyCode::Char('s')));
        let release =
            KeyEvent::new_with_kind(KeyCode::Char(' '), KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(app.handle_key(release), Action::Ignored);
        assert!(app.tacho.entries().is_empty());
    }

    #[test]
    fn enter_mark_key() {
        let clock = ManualClock::new(0);
        let settings = Config {
            mark_key: MarkKey::Enter,
            ..Config::default()
        };
        let mut app = App::new(clock.clone(), settings);
        app.handle_key(press(KeyCode::Char('s')));
        assert_eq!(app.handle_key(press(KeyCode::Char(' '))), Action::Ignored);
        assert_eq!(app.handle_key(press(KeyCode::Enter)), Action::Marked);
    }

    #[test]
    fn quit_keys() {
        let clock = ManualClock::new(0);
        let mut app = app(&clock);
        assert_eq!(app.handle_key(press(KeyCode::Esc)), Action::Quit);
        assert_eq!(app.handle_key(press(KeyCode::Char('q'))), Action::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.handle_key(ctrl_c), Action::Quit);
    }

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from(["tacho", "-t", "20", "--mark-key", "enter", "--no-table"]);
        let cfg = cli.apply(Config::default());
        assert_eq!(cfg.tick_ms, 20);
        assert_eq!(cfg.mark_key, MarkKey::Enter);
        assert_eq!(cfg.decimals, 2);
        assert!(!cfg.print_table);
    }

    #[test]
    fn table_flag_reenables_stored_opt_out() {
        let stored = Config {
            print_table: false,
            ..Config::default()
        };
        let cli = Cli::parse_from(["tacho", "--table"]);
        assert!(cli.apply(stored.clone()).print_table);

        let cli = Cli::parse_from(["tacho"]);
        assert!(!cli.apply(stored).print_table);
    }

    #[test]
    fn table_flags_conflict() {
        assert!(Cli::try_parse_from(["tacho", "--table", "--no-table"]).is_err());
    }

    #[test]
    fn cli_without_flags_keeps_config() {
        let cli = Cli::parse_from(["tacho"]);
        let stored = Config {
            tick_ms: 5,
            mark_key: MarkKey::Enter,
            decimals: 4,
            print_table: true,
        };
        assert_eq!(cli.apply(stored.clone()), stored);
    }
}
