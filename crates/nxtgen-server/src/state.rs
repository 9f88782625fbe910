use nxtgen_core::config::Config;
use nxtgen_core::dashboard::Dashboard;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub config: Arc<Config>,
    pub dashboard: Dashboard,
    /// Ticks once per change to any dashboard entity.
    pub event_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(root: PathBuf, config: Config) -> Self {
        let (tx, _) = broadcast::channel(config.sequencer.channel_capacity.max(1));
        let dashboard = Dashboard::seeded(&config.sequencer).with_notifier(tx.clone());
        Self {
            root,
            config: Arc::new(config),
            dashboard,
            event_tx: tx,
        }
    }

    /// Read `.nxtgen/config.yaml` under `root` (defaults when absent).
    pub fn load(root: PathBuf) -> anyhow::Result<Self> {
        let config = Config::load(&root)?;
        for w in config.validate() {
            tracing::warn!(level = ?w.level, "config: {}", w.message);
        }
        Ok(Self::new(root, config))
    }
}
