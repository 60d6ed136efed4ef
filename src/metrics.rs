use serde::{Deserialize, Serialize};

use crate::state::{MetricPoint, MetricsState};

/// Headline numbers and their day-over-day movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_revenue: f64,
    pub total_orders: u64,
    pub avg_conversion: f64,
    pub average_order_value: f64,
    pub revenue_delta: f64,
    pub orders_delta: f64,
    pub conversion_delta: f64,
    pub aov_delta: f64,
}

/// `num / den`, or 0 when `den` is 0.
pub fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Relative change from `prev` to `last`; 0 when `prev` is 0.
pub fn relative_change(last: f64, prev: f64) -> f64 {
    safe_div(last - prev, prev)
}

pub fn compute_kpis(state: &MetricsState) -> Kpis {
    compute_series_kpis(&state.series)
}

pub fn compute_series_kpis(series: &[MetricPoint]) -> Kpis {
    let total_revenue: f64 = series.iter().map(|p| p.revenue).sum();
    let total_orders: u64 = series.iter().map(|p| p.orders as u64).sum();
    let avg_conversion = safe_div(series.iter().map(|p| p.conv).sum(), series.len() as f64);
    let average_order_value = safe_div(total_revenue, total_orders as f64);

    let mut kpis = Kpis {
        total_revenue,
        total_orders,
        avg_conversion,
        average_order_value,
        ..Kpis::default()
    };

    let Some(last) = series.last() else {
        return kpis;
    };
    // A single day compares against itself.
    let prev = if series.len() >= 2 { &series[series.len() - 2] } else { last };

    kpis.revenue_delta = relative_change(last.revenue, prev.revenue);
    kpis.orders_delta = relative_change(last.orders as f64, prev.orders as f64);
    kpis.conversion_delta = relative_change(last.conv, prev.conv);
    kpis.aov_delta = relative_change(last.order_value(), prev.order_value());
    kpis
}
