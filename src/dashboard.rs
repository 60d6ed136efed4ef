//! The dashboard controller: owns the metrics state, the random source and
//! the live flag, and turns control commands into state changes.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local};
use serde_json::json;

use crate::export::{export_file_name, export_to_dir, to_csv, ExportReceipt};
use crate::format::stamp;
use crate::live::{self, TickOutcome};
use crate::logging::{
    log, log_command, log_resynthesis, log_tick, obj, v_num, v_str, Domain, Level, ProfileScope,
};
use crate::metrics::{compute_kpis, Kpis};
use crate::render::{self, Presenter};
use crate::rng::{RandomSource, SeededRandom, ThreadRandom};
use crate::state::{Config, MetricsState};
use crate::synth;

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Always reports the same instant.
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveState {
    Running,
    Paused,
}

impl LiveState {
    pub fn toggled(self) -> Self {
        match self {
            LiveState::Running => LiveState::Paused,
            LiveState::Paused => LiveState::Running,
        }
    }
}

pub struct Dashboard {
    state: MetricsState,
    rng: Box<dyn RandomSource>,
    clock: Box<dyn Clock>,
    live: LiveState,
    export_dir: PathBuf,
    ticks: u64,
}

impl Dashboard {
    /// Build from configuration: seeded RNG when a seed is set, thread RNG
    /// otherwise, wall clock.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let rng: Box<dyn RandomSource> = match cfg.seed {
            Some(seed) => Box::new(SeededRandom::new(seed)),
            None => Box::new(ThreadRandom::new()),
        };
        let live = if cfg.start_paused { LiveState::Paused } else { LiveState::Running };
        Self::open(cfg.days, rng, Box::new(SystemClock), live, PathBuf::from(&cfg.export_dir))
    }

    /// Seed a fresh state and log the startup event.
    pub fn open(
        days: usize,
        mut rng: Box<dyn RandomSource>,
        clock: Box<dyn Clock>,
        live: LiveState,
        export_dir: PathBuf,
    ) -> Result<Self> {
        let mut state = MetricsState::new(days);
        synth::seed(&mut state, rng.as_mut(), days, clock.now().date_naive())?;
        let mut dash = Self {
            state,
            rng,
            clock,
            live,
            export_dir,
            ticks: 0,
        };
        let detail = match live {
            LiveState::Running => "Realtime updates are running",
            LiveState::Paused => "Realtime updates are paused",
        };
        dash.push_event("Dashboard ready", detail);
        log(
            Level::Info,
            Domain::System,
            "dashboard_ready",
            obj(&[
                ("days", json!(days)),
                ("live", json!(dash.is_live())),
                ("export_dir", v_str(&dash.export_dir.to_string_lossy())),
            ]),
        );
        Ok(dash)
    }

    pub fn state(&self) -> &MetricsState {
        &self.state
    }

    pub fn kpis(&self) -> Kpis {
        compute_kpis(&self.state)
    }

    pub fn days(&self) -> usize {
        self.state.days
    }

    pub fn live_state(&self) -> LiveState {
        self.live
    }

    pub fn is_live(&self) -> bool {
        self.live == LiveState::Running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    fn now_stamp(&self) -> String {
        stamp(&self.clock.now())
    }

    fn push_event(&mut self, title: &str, detail: &str) {
        let at = self.now_stamp();
        self.state.push_event(title, detail, at);
    }

    /// Resynthesize everything for `days` days. Rejects 0 and anything above
    /// `MAX_DAY_RANGE` without touching the current state.
    pub fn set_day_range(&mut self, days: usize) -> Result<()> {
        {
            let _scope = ProfileScope::with_context("resynthesis", &[("days", json!(days))]);
            let today = self.clock.now().date_naive();
            synth::seed(&mut self.state, self.rng.as_mut(), days, today)?;
        }
        let kpis = self.kpis();
        log_resynthesis(days, kpis.total_revenue, kpis.total_orders);
        let detail = format!("Showing last {} days", days);
        self.push_event("Range changed", &detail);
        log_command("range_changed", &detail);
        Ok(())
    }

    /// Flip between running and paused.
    pub fn toggle_live(&mut self) -> LiveState {
        self.live = self.live.toggled();
        let title = match self.live {
            LiveState::Running => "Live resumed",
            LiveState::Paused => "Live paused",
        };
        self.push_event(title, "Realtime updates toggled");
        log_command("live_toggled", title);
        self.live
    }

    /// CSV document for the current series: `(file name, contents)`.
    pub fn csv_document(&self) -> (String, String) {
        (export_file_name(self.state.days), to_csv(&self.state.series))
    }

    /// Write the CSV into the export directory.
    pub fn export_csv(&mut self) -> Result<ExportReceipt> {
        let receipt = export_to_dir(&self.export_dir, self.state.days, &self.state.series)?;
        self.push_event("Exported CSV", &format!("Downloaded {}", receipt.file_name));
        log(
            Level::Info,
            Domain::Export,
            "csv_exported",
            obj(&[
                ("file", v_str(&receipt.path.to_string_lossy())),
                ("rows", json!(receipt.rows)),
                ("bytes", json!(receipt.bytes)),
                ("sha256", v_str(&receipt.sha256)),
            ]),
        );
        Ok(receipt)
    }

    /// One live perturbation step. Does nothing while paused.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if !self.is_live() {
            return None;
        }
        let at = self.now_stamp();
        let outcome = live::tick(&mut self.state, self.rng.as_mut(), at);
        self.ticks += 1;
        let last_revenue = self.state.last_point().map(|p| p.revenue).unwrap_or(0.0);
        log_tick(self.ticks, &outcome.product, outcome.event.title(), last_revenue);
        Some(outcome)
    }

    /// Push a full frame to `presenter`.
    pub fn render(&mut self, presenter: &mut dyn Presenter) {
        let kpis = self.kpis();
        let stamp = self.now_stamp();
        render::render_metrics(presenter, &self.state, &kpis, self.rng.as_mut(), &stamp);
        render::render_events(presenter, &self.state);
        log(
            Level::Trace,
            Domain::Render,
            "frame",
            obj(&[
                ("total_revenue", v_num(kpis.total_revenue)),
                ("events", json!(self.state.events.len())),
            ]),
        );
    }
}
