//! End-to-end checks on the dashboard controller and the session loop.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{Local, TimeZone, Utc};
use livedash::dashboard::{Dashboard, FixedClock, LiveState};
use livedash::metrics::compute_kpis;
use livedash::render::{ChartData, Presenter, ProductRow, KPI_ORDERS, KPI_REVENUE, LAST_UPDATED};
use livedash::rng::SeededRandom;
use livedash::session::{run_session, Command};
use livedash::state::{Event, EVENT_LOG_CAP, MAX_DAY_RANGE};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

#[derive(Default)]
struct RecordingPresenter {
    texts: HashMap<String, String>,
    line: ChartData,
    breakdown: ChartData,
    products: Vec<ProductRow>,
    events: Vec<Event>,
    frames: usize,
}

impl Presenter for RecordingPresenter {
    fn set_text(&mut self, element: &str, text: &str) {
        self.texts.insert(element.to_string(), text.to_string());
    }

    fn draw_line_chart(&mut self, data: &ChartData) {
        self.line = data.clone();
    }

    fn draw_breakdown_chart(&mut self, data: &ChartData) {
        self.breakdown = data.clone();
    }

    fn render_products(&mut self, rows: &[ProductRow]) {
        self.products = rows.to_vec();
    }

    fn render_events(&mut self, events: &[Event]) {
        self.events = events.to_vec();
    }

    fn present(&mut self) -> std::io::Result<()> {
        self.frames += 1;
        Ok(())
    }
}

fn dashboard(days: usize, live: LiveState) -> Dashboard {
    let at = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap().with_timezone(&Local);
    Dashboard::open(
        days,
        Box::new(SeededRandom::new(2024)),
        Box::new(FixedClock(at)),
        live,
        PathBuf::from("."),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Controller properties
// ---------------------------------------------------------------------------

#[test]
fn seed_produces_requested_length_for_any_range() {
    let mut dash = dashboard(7, LiveState::Running);
    for n in [1usize, 3, 7, 14, 30, 60, 365] {
        dash.set_day_range(n).unwrap();
        let series = &dash.state().series;
        assert_eq!(series.len(), n);
        for pair in series.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
        for p in series {
            assert!(p.revenue >= 12_000.0);
            assert!(p.conv >= 0.018 && p.conv <= 0.042);
        }
    }
}

#[test]
fn single_day_view_has_flat_deltas() {
    let mut dash = dashboard(1, LiveState::Running);
    let k = dash.kpis();
    assert_eq!(k.revenue_delta, 0.0);
    assert_eq!(k.orders_delta, 0.0);
    assert_eq!(k.conversion_delta, 0.0);
    assert_eq!(k.aov_delta, 0.0);

    // Still flat after the only point moves.
    for _ in 0..10 {
        dash.tick();
    }
    let k = dash.kpis();
    assert_eq!(k.revenue_delta, 0.0);
    assert_eq!(k.aov_delta, 0.0);
}

#[test]
fn totals_track_series_after_ticks() {
    let mut dash = dashboard(7, LiveState::Running);
    for _ in 0..25 {
        dash.tick();
    }
    let k = dash.kpis();
    let series = &dash.state().series;
    let orders: u64 = series.iter().map(|p| p.orders as u64).sum();
    let revenue: f64 = series.iter().map(|p| p.revenue).sum();
    assert_eq!(k.total_orders, orders);
    assert!((k.total_revenue - revenue).abs() < 1e-6);
    assert_eq!(k, compute_kpis(dash.state()));
}

#[test]
fn live_bounds_and_event_cap_hold() {
    let mut dash = dashboard(7, LiveState::Running);
    for i in 0..1_000 {
        if i % 97 == 0 {
            dash.toggle_live();
        }
        dash.tick();
        let last = dash.state().series.last().unwrap();
        assert!(last.revenue >= 8_000.0);
        assert!(last.orders >= 10);
        assert!(last.conv >= 0.005 && last.conv <= 0.09);
        assert!(dash.state().events.len() <= EVENT_LOG_CAP);
    }
}

#[test]
fn render_pushes_all_widgets() {
    let mut dash = dashboard(7, LiveState::Running);
    let mut presenter = RecordingPresenter::default();
    dash.render(&mut presenter);

    assert!(presenter.texts[KPI_REVENUE].starts_with('₹'));
    assert!(presenter.texts["kpiRevenueMeta"].ends_with("vs yesterday"));
    assert!(!presenter.texts[KPI_ORDERS].is_empty());
    assert!(presenter.texts[LAST_UPDATED].starts_with("Updated: "));
    assert!(presenter.texts[LAST_UPDATED].contains("/2026, "));
    assert_eq!(presenter.line.labels.len(), 7);
    assert_eq!(presenter.breakdown.labels, vec!["Web", "Mobile", "Store"]);
    assert_eq!(presenter.products.len(), 5);
    assert_eq!(presenter.events.len(), 1);
    assert_eq!(presenter.events[0].title, "Dashboard ready");
}

// ---------------------------------------------------------------------------
// Session loop
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn session_applies_queued_commands_in_order() {
    let mut dash = dashboard(7, LiveState::Running);
    let mut presenter = RecordingPresenter::default();
    let (tx, mut rx) = mpsc::channel(8);
    for cmd in [
        Command::SetDayRange(14),
        Command::ToggleLive,
        Command::Tick,
        Command::ToggleLive,
        Command::Quit,
    ] {
        tx.send(cmd).await.unwrap();
    }

    let summary = run_session(&mut dash, &mut presenter, &mut rx, Duration::from_millis(2500)).await;

    assert_eq!(summary.commands, 5);
    assert_eq!(summary.ticks, 0);
    assert_eq!(summary.errors, 0);
    assert_eq!(dash.days(), 14);
    assert!(dash.is_live());
    let titles: Vec<&str> = dash.state().events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Live resumed", "Live paused", "Range changed"]);
    // Initial frame plus one per non-quit command.
    assert_eq!(presenter.frames, 5);
    assert_eq!(presenter.line.labels.len(), 14);
}

#[tokio::test(start_paused = true)]
async fn session_ticks_on_schedule_while_running() {
    let mut dash = dashboard(7, LiveState::Running);
    let mut presenter = RecordingPresenter::default();
    let (tx, mut rx) = mpsc::channel(8);
    tokio::spawn(async move {
        sleep(Duration::from_millis(6_000)).await;
        let _ = tx.send(Command::Quit).await;
    });

    let summary = run_session(&mut dash, &mut presenter, &mut rx, Duration::from_millis(2500)).await;

    assert_eq!(summary.ticks, 2);
    assert_eq!(dash.ticks(), 2);
    // Ready event plus one synthetic event per tick.
    assert_eq!(dash.state().events.len(), 3);
    assert_eq!(presenter.frames, 3);
}

#[tokio::test(start_paused = true)]
async fn paused_session_never_ticks() {
    let mut dash = dashboard(7, LiveState::Paused);
    let mut presenter = RecordingPresenter::default();
    let before = dash.state().series.clone();
    let (tx, mut rx) = mpsc::channel::<Command>(8);
    tokio::spawn(async move {
        sleep(Duration::from_secs(60)).await;
        drop(tx);
    });

    let summary = run_session(&mut dash, &mut presenter, &mut rx, Duration::from_millis(2500)).await;

    assert_eq!(summary.ticks, 0);
    assert_eq!(dash.state().series, before);
    assert_eq!(dash.state().events.latest().unwrap().detail, "Realtime updates are paused");
}

#[tokio::test(start_paused = true)]
async fn bad_range_is_reported_not_fatal() {
    let mut dash = dashboard(7, LiveState::Paused);
    let mut presenter = RecordingPresenter::default();
    let (tx, mut rx) = mpsc::channel(8);
    tx.send(Command::SetDayRange(0)).await.unwrap();
    tx.send(Command::SetDayRange(3)).await.unwrap();
    drop(tx);

    let summary = run_session(&mut dash, &mut presenter, &mut rx, Duration::from_millis(2500)).await;

    assert_eq!(summary.errors, 1);
    assert_eq!(summary.commands, 2);
    assert_eq!(dash.days(), 3);
}

#[tokio::test(start_paused = true)]
async fn oversized_range_is_rejected_without_panicking() {
    let mut dash = dashboard(7, LiveState::Paused);
    let mut presenter = RecordingPresenter::default();
    let (tx, mut rx) = mpsc::channel(8);
    tx.send(Command::SetDayRange(100_000_000)).await.unwrap();
    tx.send(Command::SetDayRange(usize::MAX)).await.unwrap();
    tx.send(Command::SetDayRange(MAX_DAY_RANGE)).await.unwrap();
    drop(tx);

    let summary = run_session(&mut dash, &mut presenter, &mut rx, Duration::from_millis(2500)).await;

    assert_eq!(summary.errors, 2);
    assert_eq!(summary.commands, 3);
    assert_eq!(dash.days(), MAX_DAY_RANGE);
    assert_eq!(dash.state().series.len(), MAX_DAY_RANGE);
}
