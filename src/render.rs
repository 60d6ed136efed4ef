//! Presentation layer.
//!
//! The dashboard never draws anything itself. It turns state into view models
//! (KPI tile text, chart datasets, table rows) and hands them to a
//! [`Presenter`]. [`TerminalPresenter`] prints a plain text view.

use std::collections::BTreeMap;
use std::io::Write;

use crate::format::{count, delta_meta, money, pct};
use crate::metrics::Kpis;
use crate::rng::{uniform_int, RandomSource};
use crate::state::{ChannelMix, Event, MetricsState};

pub const KPI_REVENUE: &str = "kpiRevenue";
pub const KPI_ORDERS: &str = "kpiOrders";
pub const KPI_CONV: &str = "kpiConv";
pub const KPI_AOV: &str = "kpiAov";
pub const LAST_UPDATED: &str = "lastUpdated";

pub fn meta_id(element: &str) -> String {
    format!("{}Meta", element)
}

/// Dataset for one chart: parallel labels and values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiTile {
    pub element: &'static str,
    pub value: String,
    pub meta: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub name: String,
    pub units: String,
    pub revenue: String,
    pub badge: String,
}

pub trait Presenter {
    fn set_text(&mut self, element: &str, text: &str);
    fn draw_line_chart(&mut self, data: &ChartData);
    fn draw_breakdown_chart(&mut self, data: &ChartData);
    fn render_products(&mut self, rows: &[ProductRow]);
    fn render_events(&mut self, events: &[Event]);

    /// Called once a full frame has been pushed.
    fn present(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn kpi_tiles(kpis: &Kpis) -> [KpiTile; 4] {
    [
        KpiTile {
            element: KPI_REVENUE,
            value: money(kpis.total_revenue),
            meta: delta_meta(kpis.revenue_delta),
        },
        KpiTile {
            element: KPI_ORDERS,
            value: count(kpis.total_orders),
            meta: delta_meta(kpis.orders_delta),
        },
        KpiTile {
            element: KPI_CONV,
            value: pct(kpis.avg_conversion),
            meta: delta_meta(kpis.conversion_delta),
        },
        KpiTile {
            element: KPI_AOV,
            value: money(kpis.average_order_value),
            meta: delta_meta(kpis.aov_delta),
        },
    ]
}

pub fn revenue_chart(state: &MetricsState) -> ChartData {
    ChartData {
        labels: state.series.iter().map(|p| p.label.clone()).collect(),
        values: state.series.iter().map(|p| p.revenue.round()).collect(),
    }
}

pub fn channel_chart(channels: &ChannelMix) -> ChartData {
    ChartData {
        labels: ChannelMix::LABELS.iter().map(|l| l.to_string()).collect(),
        values: channels.values().iter().map(|v| *v as f64).collect(),
    }
}

/// Table rows, highest revenue first. The badge percentage is decorative and
/// drawn fresh on every render.
pub fn product_rows(state: &MetricsState, rng: &mut dyn RandomSource) -> Vec<ProductRow> {
    state
        .products_by_revenue()
        .into_iter()
        .map(|p| ProductRow {
            name: p.name.clone(),
            units: count(p.units as u64),
            revenue: money(p.revenue),
            badge: format!("{} {}%", p.trend.arrow(), uniform_int(rng, 1, 9)),
        })
        .collect()
}

/// KPIs, charts and the product table. Events are rendered separately, when
/// the log changes.
pub fn render_metrics(
    presenter: &mut dyn Presenter,
    state: &MetricsState,
    kpis: &Kpis,
    rng: &mut dyn RandomSource,
    stamp: &str,
) {
    for tile in kpi_tiles(kpis) {
        presenter.set_text(tile.element, &tile.value);
        presenter.set_text(&meta_id(tile.element), &tile.meta);
    }
    presenter.set_text(LAST_UPDATED, &format!("Updated: {}", stamp));
    presenter.draw_line_chart(&revenue_chart(state));
    presenter.draw_breakdown_chart(&channel_chart(&state.channels));
    presenter.render_products(&product_rows(state, rng));
}

pub fn render_events(presenter: &mut dyn Presenter, state: &MetricsState) {
    presenter.render_events(&state.events.to_vec());
}

/// Buffers one frame of output and prints it on [`TerminalPresenter::flush`].
pub struct TerminalPresenter<W: Write> {
    out: W,
    texts: BTreeMap<String, String>,
    line_chart: ChartData,
    breakdown: ChartData,
    products: Vec<ProductRow>,
    events: Vec<Event>,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            texts: BTreeMap::new(),
            line_chart: ChartData::default(),
            breakdown: ChartData::default(),
            products: Vec::new(),
            events: Vec::new(),
        }
    }

    fn text(&self, element: &str) -> &str {
        self.texts.get(element).map(String::as_str).unwrap_or("-")
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print the current frame.
    pub fn flush(&mut self) -> std::io::Result<()> {
        let mut frame = String::new();
        frame.push_str(&format!("=== Sales Dashboard  ({})\n", self.text(LAST_UPDATED)));
        for (label, id) in [
            ("Revenue", KPI_REVENUE),
            ("Orders", KPI_ORDERS),
            ("Conversion", KPI_CONV),
            ("Avg order", KPI_AOV),
        ] {
            frame.push_str(&format!(
                "{:<12} {:>14}   {}\n",
                label,
                self.text(id),
                self.text(&meta_id(id))
            ));
        }

        frame.push_str("\nRevenue by day\n");
        let peak = self.line_chart.values.iter().cloned().fold(0.0_f64, f64::max);
        for (label, value) in self.line_chart.labels.iter().zip(&self.line_chart.values) {
            frame.push_str(&format!(
                "{:<8} {:>10} {}\n",
                label,
                money(*value),
                bar(*value, peak, 30)
            ));
        }

        frame.push_str("\nChannel mix\n");
        let total: f64 = self.breakdown.values.iter().sum();
        for (label, value) in self.breakdown.labels.iter().zip(&self.breakdown.values) {
            let share = if total > 0.0 { value / total } else { 0.0 };
            frame.push_str(&format!("{:<8} {:>6} {:>6}\n", label, *value as u64, pct(share)));
        }

        frame.push_str(&format!(
            "\n{:<18} {:>6} {:>12} {:>6}\n",
            "Product", "Units", "Revenue", "Trend"
        ));
        frame.push_str(&format!("{}\n", "-".repeat(46)));
        for row in &self.products {
            frame.push_str(&format!(
                "{:<18} {:>6} {:>12} {:>6}\n",
                row.name, row.units, row.revenue, row.badge
            ));
        }

        frame.push_str("\nEvents\n");
        for e in &self.events {
            frame.push_str(&format!("[{}] {}: {}\n", e.at, e.title, e.detail));
        }
        writeln!(self.out, "{}", frame)?;
        self.out.flush()
    }
}

fn bar(value: f64, peak: f64, width: usize) -> String {
    if peak <= 0.0 {
        return String::new();
    }
    let n = ((value / peak) * width as f64).round() as usize;
    "#".repeat(n.min(width))
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn set_text(&mut self, element: &str, text: &str) {
        self.texts.insert(element.to_string(), text.to_string());
    }

    fn draw_line_chart(&mut self, data: &ChartData) {
        self.line_chart = data.clone();
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
        self.flush()
    }
}
