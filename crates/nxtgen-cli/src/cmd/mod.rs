pub mod config;
pub mod demo;
pub mod list;
pub mod run;
pub mod scan;
pub mod serve;

use anyhow::Context;
use nxtgen_core::config::Config;
use nxtgen_core::dashboard::Dashboard;
use std::path::Path;

/// Seeded dashboard configured from `root`'s config file.
pub(crate) fn load_dashboard(root: &Path) -> anyhow::Result<(Config, Dashboard)> {
    let config = Config::load(root).context("failed to load config")?;
    let dashboard = Dashboard::seeded(&config.sequencer);
    Ok((config, dashboard))
}
