use std::collections::VecDeque;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::format;

/// Products tracked on the dashboard. Membership never changes; only the
/// numbers attached to each name do.
pub const PRODUCT_NAMES: [&str; 5] = [
    "Wireless Earbuds",
    "Smart Watch",
    "Gaming Mouse",
    "Backpack",
    "Power Bank",
];

pub const EVENT_LOG_CAP: usize = 8;

pub const DEFAULT_DAYS: usize = 7;

/// Longest range the synthesizer accepts (ten years).
pub const MAX_DAY_RANGE: usize = 3650;

#[derive(Clone, Debug)]
pub struct Config {
    pub days: usize,
    pub tick_ms: u64,
    pub export_dir: String,
    pub seed: Option<u64>,
    pub start_paused: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            days: parse_days(std::env::var("DASH_DAYS").ok().as_deref()),
            tick_ms: std::env::var("DASH_TICK_MS").ok().and_then(|v| v.parse().ok()).filter(|t| *t > 0).unwrap_or(2500),
            export_dir: std::env::var("DASH_EXPORT_DIR").unwrap_or_else(|_| ".".to_string()),
            seed: std::env::var("DASH_SEED").ok().and_then(|v| v.parse().ok()),
            start_paused: std::env::var("DASH_START_PAUSED").map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")).unwrap_or(false),
        }
    }
}

/// Day range from `DASH_DAYS`; anything outside `1..=MAX_DAY_RANGE` falls
/// back to the default.
fn parse_days(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.trim().parse().ok())
        .filter(|d| (1..=MAX_DAY_RANGE).contains(d))
        .unwrap_or(DEFAULT_DAYS)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            tick_ms: 2500,
            export_dir: ".".to_string(),
            seed: None,
            start_paused: false,
        }
    }
}

/// One day of metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub label: String,
    pub date: NaiveDate,
    pub revenue: f64,
    pub orders: u32,
    pub conv: f64,
}

impl MetricPoint {
    /// Revenue per order for this day, 0 when there were no orders.
    pub fn order_value(&self) -> f64 {
        if self.orders == 0 {
            0.0
        } else {
            self.revenue / self.orders as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMix {
    pub web: u32,
    pub mobile: u32,
    pub store: u32,
}

impl ChannelMix {
    pub const LABELS: [&'static str; 3] = ["Web", "Mobile", "Store"];

    pub fn values(&self) -> [u32; 3] {
        [self.web, self.mobile, self.store]
    }

    pub fn total(&self) -> u64 {
        self.web as u64 + self.mobile as u64 + self.store as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    pub fn from_up(up: bool) -> Self {
        if up {
            Trend::Up
        } else {
            Trend::Down
        }
    }

    pub fn arrow(&self) -> &'static str {
        format::arrow(matches!(self, Trend::Up))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub units: u32,
    pub revenue: f64,
    pub trend: Trend,
}

impl Product {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            units: 0,
            revenue: 0.0,
            trend: Trend::Up,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    pub detail: String,
    pub at: String,
}

/// Newest-first feed, capped at [`EVENT_LOG_CAP`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    entries: VecDeque<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.entries.push_front(event);
        self.entries.truncate(EVENT_LOG_CAP);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&Event> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Event> {
        self.entries.iter().cloned().collect()
    }
}

/// Everything the dashboard shows, owned in one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsState {
    pub days: usize,
    pub series: Vec<MetricPoint>,
    pub channels: ChannelMix,
    pub products: Vec<Product>,
    pub events: EventLog,
}

impl MetricsState {
    /// Empty state with the fixed product set. Call the synthesizer before
    /// reading any metrics from it.
    pub fn new(days: usize) -> Self {
        Self {
            days,
            series: Vec::with_capacity(days),
            channels: ChannelMix::default(),
            products: PRODUCT_NAMES.iter().map(|n| Product::new(n)).collect(),
            events: EventLog::new(),
        }
    }

    pub fn last_point(&self) -> Option<&MetricPoint> {
        self.series.last()
    }

    /// Products ordered by revenue, highest first.
    pub fn products_by_revenue(&self) -> Vec<&Product> {
        let mut prods: Vec<&Product> = self.products.iter().collect();
        prods.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
        prods
    }

    pub fn push_event(&mut self, title: &str, detail: &str, at: String) {
        self.events.push(Event {
            title: title.to_string(),
            detail: detail.to_string(),
            at,
        });
    }
}
