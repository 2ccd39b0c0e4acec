pub mod config;
pub mod metrics;
pub mod plot;
pub mod render;
pub mod result;
pub mod util;
