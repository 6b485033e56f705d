//! Local driver for a fairstake session: YAML config, manual stepping and
//! timed autoplay.

mod config;
pub use config::Config;

mod driver;
pub use driver::{autoplay, step, RunSummary};
