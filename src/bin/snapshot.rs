//! Deterministic one-shot dump of the dashboard.
//!
//! SEED, DAYS and TICKS control the run; DATE (`YYYY-MM-DD`, default
//! 2026-01-01) pins the clock to local noon on that day. `--csv` prints the
//! export document instead of the JSON snapshot.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde_json::json;

use livedash::dashboard::{Dashboard, FixedClock, LiveState};
use livedash::render::kpi_tiles;
use livedash::rng::SeededRandom;

fn pinned_now(raw: Option<String>) -> Result<DateTime<Local>> {
    let raw = raw.unwrap_or_else(|| "2026-01-01".to_string());
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("DATE must be YYYY-MM-DD, got {:?}", raw))?;
    let noon = date.and_hms_opt(12, 0, 0).context("noon out of range")?;
    Local
        .from_local_datetime(&noon)
        .earliest()
        .with_context(|| format!("no local time for {}", noon))
}

fn main() -> Result<()> {
    let now = pinned_now(env::var("DATE").ok())?;
    let seed = env::var("SEED")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(42u64);
    let days = env::var("DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(7usize);
    let ticks = env::var("TICKS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0u64);
    let csv = env::args().any(|a| a == "--csv");

    let mut dash = Dashboard::open(
        days,
        Box::new(SeededRandom::new(seed)),
        Box::new(FixedClock(now)),
        LiveState::Running,
        PathBuf::from("."),
    )?;
    for _ in 0..ticks {
        dash.tick();
    }

    if csv {
        let (_, doc) = dash.csv_document();
        println!("{}", doc);
        return Ok(());
    }

    let kpis = dash.kpis();
    let tiles: Vec<_> = kpi_tiles(&kpis)
        .iter()
        .map(|t| json!({"element": t.element, "value": t.value, "meta": t.meta}))
        .collect();
    let state = dash.state();
    let out = json!({
        "seed": seed,
        "date": now.date_naive(),
        "days": state.days,
        "ticks": dash.ticks(),
        "kpis": kpis,
        "tiles": tiles,
        "series": state.series,
        "channels": state.channels,
        "products": state.products_by_revenue(),
        "events": state.events.to_vec(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
