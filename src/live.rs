//! Live perturbation: the small random drift applied on every tick.
//!
//! History is never touched. Only the newest day, the channel mix and one
//! product move, and exactly one synthetic event is logged.

use crate::format::money;
use crate::rng::{coin, pick, uniform, uniform_int, RandomSource};
use crate::state::{MetricsState, Trend};
use crate::synth::{UNIT_PRICE_MAX, UNIT_PRICE_MIN};

pub const LIVE_REVENUE_FLOOR: f64 = 8_000.0;
pub const LIVE_ORDERS_FLOOR: i64 = 10;
pub const CONV_MIN: f64 = 0.005;
pub const CONV_MAX: f64 = 0.09;

const LOW_STOCK_ITEMS: [&str; 3] = ["Earbuds", "Watch", "Mouse"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NewOrder,
    TrafficSpike,
    Refund,
    CampaignUpdate,
    InventoryAlert,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::NewOrder,
        EventKind::TrafficSpike,
        EventKind::Refund,
        EventKind::CampaignUpdate,
        EventKind::InventoryAlert,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            EventKind::NewOrder => "New order",
            EventKind::TrafficSpike => "Traffic spike",
            EventKind::Refund => "Refund processed",
            EventKind::CampaignUpdate => "Campaign update",
            EventKind::InventoryAlert => "Inventory alert",
        }
    }

    /// Detail line with freshly drawn values.
    pub fn detail(&self, rng: &mut dyn RandomSource) -> String {
        match self {
            EventKind::NewOrder => {
                format!("+{} from Mobile", money(uniform_int(rng, 499, 8999) as f64))
            }
            EventKind::TrafficSpike => format!("Web sessions up {}%", uniform_int(rng, 2, 9)),
            EventKind::Refund => format!("-{}", money(uniform_int(rng, 499, 3999) as f64)),
            EventKind::CampaignUpdate => format!("CTR improved by {}%", uniform_int(rng, 1, 6)),
            EventKind::InventoryAlert => {
                let item = pick(rng, &LOW_STOCK_ITEMS).copied().unwrap_or("Earbuds");
                format!("{} low stock", item)
            }
        }
    }
}

/// What a tick changed, for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub product: String,
    pub added_units: u32,
    pub event: EventKind,
}

fn nudge(value: u32, delta: i64, floor: i64) -> u32 {
    (value as i64 + delta).max(floor) as u32
}

/// Perturb `state` in place and log one synthetic event stamped `at`.
pub fn tick(state: &mut MetricsState, rng: &mut dyn RandomSource, at: String) -> TickOutcome {
    if let Some(last) = state.series.last_mut() {
        last.revenue = (last.revenue + uniform_int(rng, -1200, 2200) as f64).max(LIVE_REVENUE_FLOOR);
        last.orders = nudge(last.orders, uniform_int(rng, -6, 10), LIVE_ORDERS_FLOOR);
        last.conv = (last.conv + uniform(rng, -0.0012, 0.0015)).clamp(CONV_MIN, CONV_MAX);
    }

    let ch = &mut state.channels;
    ch.web = nudge(ch.web, uniform_int(rng, -3, 6), 0);
    ch.mobile = nudge(ch.mobile, uniform_int(rng, -3, 6), 0);
    ch.store = nudge(ch.store, uniform_int(rng, -2, 4), 0);

    let mut touched = String::new();
    let mut added_units = 0;
    if !state.products.is_empty() {
        let idx = uniform_int(rng, 0, state.products.len() as i64 - 1) as usize;
        let p = &mut state.products[idx];
        let add = uniform_int(rng, 0, 6);
        p.units += add as u32;
        p.revenue += (add * uniform_int(rng, UNIT_PRICE_MIN, UNIT_PRICE_MAX)) as f64;
        p.trend = Trend::from_up(coin(rng));
        touched = p.name.clone();
        added_units = add as u32;
    }

    let kind = pick(rng, &EventKind::ALL).copied().unwrap_or(EventKind::NewOrder);
    let detail = kind.detail(rng);
    state.push_event(kind.title(), &detail, at);

    TickOutcome {
        product: touched,
        added_units,
        event: kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{ScriptedRandom, SeededRandom};
    use crate::state::EVENT_LOG_CAP;
    use crate::synth::seed;
    use chrono::NaiveDate;

    fn seeded(days: usize, seed_val: u64) -> MetricsState {
        let mut rng = SeededRandom::new(seed_val);
        let mut state = MetricsState::new(days);
        seed(&mut state, &mut rng, days, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()).unwrap();
        state
    }

    #[test]
    fn test_tick_leaves_history_untouched() {
        let mut state = seeded(7, 3);
        let history = state.series[..6].to_vec();
        let mut rng = SeededRandom::new(11);
        for _ in 0..50 {
            tick(&mut state, &mut rng, "now".into());
        }
        assert_eq!(&state.series[..6], history.as_slice());
        assert_eq!(state.series.len(), 7);
    }

    #[test]
    fn test_floors_hold_under_downward_pressure() {
        let mut state = seeded(7, 5);
        let mut rng = ScriptedRandom::constant(0.0);
        for _ in 0..500 {
            tick(&mut state, &mut rng, "now".into());
        }
        let last = state.series.last().unwrap();
        assert_eq!(last.revenue, LIVE_REVENUE_FLOOR);
        assert_eq!(last.orders, 10);
        assert_eq!(last.conv, CONV_MIN);
        assert_eq!(state.channels.web, 0);
        assert_eq!(state.channels.mobile, 0);
        assert_eq!(state.channels.store, 0);
    }

    #[test]
    fn test_conversion_capped_under_upward_pressure() {
        let mut state = seeded(7, 5);
        let mut rng = ScriptedRandom::constant(0.999_999);
        for _ in 0..200 {
            tick(&mut state, &mut rng, "now".into());
        }
        let last = state.series.last().unwrap();
        assert_eq!(last.conv, CONV_MAX);
        assert!(last.revenue > 8_000.0);
    }

    #[test]
    fn test_bounds_hold_for_random_walk() {
        let mut state = seeded(14, 21);
        let mut rng = SeededRandom::new(1234);
        for _ in 0..2_000 {
            tick(&mut state, &mut rng, "now".into());
            let last = state.series.last().unwrap();
            assert!(last.revenue >= LIVE_REVENUE_FLOOR);
            assert!(last.orders >= 10);
            assert!(last.conv >= CONV_MIN && last.conv <= CONV_MAX);
            assert!(state.events.len() <= EVENT_LOG_CAP);
        }
    }

    #[test]
    fn test_one_event_per_tick_newest_first() {
        let mut state = seeded(7, 8);
        let mut rng = SeededRandom::new(2);
        tick(&mut state, &mut rng, "t1".into());
        assert_eq!(state.events.len(), 1);
        tick(&mut state, &mut rng, "t2".into());
        assert_eq!(state.events.len(), 2);
        assert_eq!(state.events.latest().unwrap().at, "t2");
    }

    #[test]
    fn test_single_product_changes() {
        let mut state = seeded(7, 9);
        let before = state.products.clone();
        // Draws in order: revenue, orders, conv, web, mobile, store,
        // product index (0.999 -> last), units (0.999 -> 6), price, trend,
        // event kind (0.0 -> new order), amount.
        let mut rng = ScriptedRandom::new(vec![
            0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.999, 0.999, 0.0, 0.9, 0.0, 0.0,
        ]);
        let out = tick(&mut state, &mut rng, "now".into());
        assert_eq!(out.product, "Power Bank");
        assert_eq!(out.added_units, 6);
        assert_eq!(out.event, EventKind::NewOrder);
        assert_eq!(state.products[..4], before[..4]);
        assert_eq!(state.products[4].units, before[4].units + 6);
        assert_eq!(state.products[4].revenue, before[4].revenue + 6.0 * 499.0);
        assert_eq!(state.products[4].trend, Trend::Up);
        assert_eq!(state.events.latest().unwrap().detail, "+₹499 from Mobile");
        assert_eq!(rng.consumed(), 12);
    }

    #[test]
    fn test_event_details() {
        let mut rng = ScriptedRandom::constant(0.0);
        assert_eq!(EventKind::TrafficSpike.detail(&mut rng), "Web sessions up 2%");
        assert_eq!(EventKind::Refund.detail(&mut rng), "-₹499");
        assert_eq!(EventKind::CampaignUpdate.detail(&mut rng), "CTR improved by 1%");
        assert_eq!(EventKind::InventoryAlert.detail(&mut rng), "Earbuds low stock");
        let mut rng = ScriptedRandom::constant(0.999_999);
        assert_eq!(EventKind::NewOrder.detail(&mut rng), "+₹8,999 from Mobile");
        assert_eq!(EventKind::InventoryAlert.detail(&mut rng), "Mouse low stock");
    }
}
