//! Synthetic data generation for a day range.

use anyhow::{anyhow, bail, Result};
use chrono::{Duration, NaiveDate};

use crate::format::day_label;
use crate::rng::{coin, uniform, uniform_int, RandomSource};
use crate::state::{ChannelMix, MetricPoint, MetricsState, Product, Trend, MAX_DAY_RANGE};

pub const REVENUE_BASE: f64 = 45_000.0;
pub const REVENUE_STEP: f64 = 1_800.0;
pub const REVENUE_FLOOR: f64 = 12_000.0;
pub const UNIT_PRICE_MIN: i64 = 499;
pub const UNIT_PRICE_MAX: i64 = 2_499;

/// Reject ranges the synthesizer cannot build.
pub fn check_day_range(days: usize) -> Result<()> {
    if days == 0 {
        bail!("day range must be at least 1");
    }
    if days > MAX_DAY_RANGE {
        bail!("day range {} exceeds the maximum of {}", days, MAX_DAY_RANGE);
    }
    Ok(())
}

/// `days` consecutive dates, oldest first, ending at `today`.
pub fn build_days(days: usize, today: NaiveDate) -> Result<Vec<NaiveDate>> {
    check_day_range(days)?;
    (0..days)
        .rev()
        .map(|back| {
            today
                .checked_sub_signed(Duration::days(back as i64))
                .ok_or_else(|| anyhow!("date {} days before {} is out of range", back, today))
        })
        .collect()
}

pub fn synth_series(
    rng: &mut dyn RandomSource,
    days: usize,
    today: NaiveDate,
) -> Result<Vec<MetricPoint>> {
    let points = build_days(days, today)?
        .into_iter()
        .enumerate()
        .map(|(idx, date)| {
            let base = REVENUE_BASE + idx as f64 * REVENUE_STEP + uniform_int(rng, -4000, 4000) as f64;
            let orders = uniform_int(rng, 120, 260) as u32;
            let conv = uniform(rng, 0.018, 0.042);
            MetricPoint {
                label: day_label(date),
                date,
                revenue: base.max(REVENUE_FLOOR),
                orders,
                conv,
            }
        })
        .collect();
    Ok(points)
}

pub fn synth_channels(rng: &mut dyn RandomSource) -> ChannelMix {
    ChannelMix {
        web: uniform_int(rng, 220, 420) as u32,
        mobile: uniform_int(rng, 260, 520) as u32,
        store: uniform_int(rng, 80, 180) as u32,
    }
}

pub fn reset_product(rng: &mut dyn RandomSource, product: &mut Product) {
    let units = uniform_int(rng, 80, 220);
    product.units = units as u32;
    product.revenue = (units * uniform_int(rng, UNIT_PRICE_MIN, UNIT_PRICE_MAX)) as f64;
    product.trend = Trend::from_up(coin(rng));
}

/// Rebuild `state` for `days` days ending at `today`.
///
/// The replacement series, channels and products are generated aside and
/// swapped in together; on error `state` is left as it was. The event log is
/// cleared.
pub fn seed(
    state: &mut MetricsState,
    rng: &mut dyn RandomSource,
    days: usize,
    today: NaiveDate,
) -> Result<()> {
    let series = synth_series(rng, days, today)?;
    let channels = synth_channels(rng);
    let mut products = state.products.clone();
    for p in products.iter_mut() {
        reset_product(rng, p);
    }

    state.days = days;
    state.series = series;
    state.channels = channels;
    state.products = products;
    state.events.clear();
    Ok(())
}
