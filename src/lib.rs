pub mod dashboard;
pub mod export;
pub mod format;
pub mod live;
pub mod logging;
pub mod metrics;
pub mod render;
pub mod rng;
pub mod session;
pub mod state;
pub mod synth;
