//! The interactive loop: one task multiplexes the live ticker and incoming
//! control commands, so the dashboard has exactly one mutator.

use std::future::pending;
use std::time::Instant as StdInstant;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};

use crate::dashboard::{Dashboard, LiveState};
use crate::logging::{log, log_session_summary, obj, v_str, Domain, Level};
use crate::render::Presenter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetDayRange(usize),
    ToggleLive,
    Pause,
    Resume,
    ExportCsv,
    /// Perturb once now, regardless of the timer.
    Tick,
    Quit,
}

impl Command {
    /// Parse one line of user input: `range 14`, `pause`, `resume`, `toggle`,
    /// `export`, `tick`, `quit`.
    pub fn parse(line: &str) -> Option<Command> {
        let mut parts = line.split_whitespace();
        let head = parts.next()?.to_lowercase();
        match head.as_str() {
            "range" | "days" => parts.next()?.parse().ok().map(Command::SetDayRange),
            "toggle" | "live" => Some(Command::ToggleLive),
            "pause" => Some(Command::Pause),
            "resume" => Some(Command::Resume),
            "export" | "csv" => Some(Command::ExportCsv),
            "tick" => Some(Command::Tick),
            "quit" | "exit" | "q" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Periodic timer with explicit start/stop. A stopped ticker never fires.
pub struct LiveTicker {
    period: Duration,
    interval: Option<Interval>,
}

impl LiveTicker {
    pub fn new(period: Duration) -> Self {
        Self { period, interval: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// First tick fires one full period from now.
    pub fn start(&mut self) {
        if self.interval.is_some() {
            return;
        }
        let mut iv = interval_at(Instant::now() + self.period, self.period);
        iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(iv);
    }

    pub fn stop(&mut self) {
        self.interval = None;
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next tick; pends forever while stopped.
    pub async fn next(&mut self) {
        match self.interval.as_mut() {
            Some(iv) => {
                iv.tick().await;
            }
            None => pending::<()>().await,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub ticks: u64,
    pub commands: u64,
    pub exports: u64,
    pub errors: u64,
}

fn sync_ticker(ticker: &mut LiveTicker, live: LiveState) {
    match live {
        LiveState::Running => ticker.start(),
        LiveState::Paused => ticker.stop(),
    }
}

/// Apply one command. Returns false when the session should end.
fn apply(
    dash: &mut Dashboard,
    ticker: &mut LiveTicker,
    cmd: Command,
    summary: &mut SessionSummary,
) -> bool {
    summary.commands += 1;
    let outcome: Result<()> = match cmd {
        Command::Quit => return false,
        Command::SetDayRange(days) => dash.set_day_range(days),
        Command::ToggleLive => {
            sync_ticker(ticker, dash.toggle_live());
            Ok(())
        }
        Command::Pause => {
            if dash.is_live() {
                sync_ticker(ticker, dash.toggle_live());
            }
            Ok(())
        }
        Command::Resume => {
            if !dash.is_live() {
                sync_ticker(ticker, dash.toggle_live());
            }
            Ok(())
        }
        Command::ExportCsv => dash.export_csv().map(|_| summary.exports += 1),
        Command::Tick => {
            if dash.tick().is_some() {
                summary.ticks += 1;
            }
            Ok(())
        }
    };
    if let Err(err) = outcome {
        summary.errors += 1;
        log(
            Level::Warn,
            Domain::Command,
            "command_failed",
            obj(&[("msg", v_str(&format!("{:#}", err)))]),
        );
    }
    true
}

fn frame(dash: &mut Dashboard, presenter: &mut dyn Presenter) {
    dash.render(presenter);
    if let Err(err) = presenter.present() {
        log(
            Level::Error,
            Domain::Render,
            "present_failed",
            obj(&[("msg", v_str(&err.to_string()))]),
        );
    }
}

/// Run until `Quit` arrives or the command channel closes. Renders after
/// every tick and every command.
pub async fn run_session(
    dash: &mut Dashboard,
    presenter: &mut dyn Presenter,
    commands: &mut mpsc::Receiver<Command>,
    period: Duration,
) -> SessionSummary {
    let started = StdInstant::now();
    let mut ticker = LiveTicker::new(period);
    sync_ticker(&mut ticker, dash.live_state());
    let mut summary = SessionSummary::default();

    frame(dash, presenter);

    loop {
        tokio::select! {
            biased;
            cmd = commands.recv() => {
                let Some(cmd) = cmd else { break };
                if !apply(dash, &mut ticker, cmd, &mut summary) {
                    break;
                }
            }
            _ = ticker.next() => {
                if dash.tick().is_some() {
                    summary.ticks += 1;
                }
            }
        }
        frame(dash, presenter);
    }

    log_session_summary(
        started.elapsed().as_secs(),
        summary.ticks,
        summary.commands,
        summary.exports,
        dash.days(),
    );
    summary
}
