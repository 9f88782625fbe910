use crate::error::Result;
use crate::paths;
use crate::sequencer::Pacing;
use crate::types::TargetKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// SequencerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencerConfig {
    #[serde(default)]
    pub pacing: Pacing,
    /// Pause between the last event and the terminal state.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_workflow_interval_ms")]
    pub workflow_interval_ms: u64,
    #[serde(default = "default_finding_interval_ms")]
    pub finding_interval_ms: u64,
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,
    /// Spacing of the MCP connect handshake lines.
    #[serde(default = "default_mcp_connect_interval_ms")]
    pub mcp_connect_interval_ms: u64,
    #[serde(default = "default_tool_test_interval_ms")]
    pub tool_test_interval_ms: u64,
    /// How long a security scan takes before new findings appear.
    #[serde(default = "default_scan_delay_ms")]
    pub scan_delay_ms: u64,
    /// Buffered events per sequence for slow subscribers.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_settle_ms() -> u64 {
    500
}

fn default_workflow_interval_ms() -> u64 {
    700
}

fn default_finding_interval_ms() -> u64 {
    800
}

fn default_step_interval_ms() -> u64 {
    600
}

fn default_mcp_connect_interval_ms() -> u64 {
    500
}

fn default_tool_test_interval_ms() -> u64 {
    300
}

fn default_scan_delay_ms() -> u64 {
    3000
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            pacing: Pacing::default(),
            settle_ms: default_settle_ms(),
            workflow_interval_ms: default_workflow_interval_ms(),
            finding_interval_ms: default_finding_interval_ms(),
            step_interval_ms: default_step_interval_ms(),
            mcp_connect_interval_ms: default_mcp_connect_interval_ms(),
            tool_test_interval_ms: default_tool_test_interval_ms(),
            scan_delay_ms: default_scan_delay_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl SequencerConfig {
    /// Spacing stamped on catalog scripts for `kind`.
    pub fn interval_for(&self, kind: TargetKind) -> Duration {
        let ms = match kind {
            TargetKind::Workflow => self.workflow_interval_ms,
            TargetKind::SecurityFinding => self.finding_interval_ms,
            TargetKind::PipelineStep => self.step_interval_ms,
            TargetKind::McpServer => self.mcp_connect_interval_ms,
            TargetKind::ToolTest => self.tool_test_interval_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn scan_delay(&self) -> Duration {
        Duration::from_millis(self.scan_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    #[serde(default)]
    pub sequencer: SequencerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self::new("nxtgen")
    }
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                name: project_name.into(),
                description: None,
            },
            sequencer: SequencerConfig::default(),
            server: ServerConfig::default(),
        }
    }

    pub fn exists(root: &Path) -> bool {
        paths::config_path(root).exists()
    }

    /// Load `.nxtgen/config.yaml`, falling back to defaults when the file is
    /// absent. A file that exists but does not parse is an error.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let seq = &self.sequencer;

        if seq.channel_capacity == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "sequencer.channel_capacity must be greater than 0".to_string(),
            });
        }

        if let Pacing::Fixed { interval_ms: 0 } = seq.pacing {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "fixed pacing with interval_ms=0 emits every event at once".to_string(),
            });
        }

        for (field, ms) in [
            ("workflow_interval_ms", seq.workflow_interval_ms),
            ("finding_interval_ms", seq.finding_interval_ms),
            ("step_interval_ms", seq.step_interval_ms),
            ("mcp_connect_interval_ms", seq.mcp_connect_interval_ms),
            ("tool_test_interval_ms", seq.tool_test_interval_ms),
        ] {
            if ms == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("sequencer.{field} is 0: events will not be paced"),
                });
            } else if ms > 60_000 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("sequencer.{field}={ms} (over a minute per event is unusual)"),
                });
            }
        }

        if self.version != 1 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("unknown config version {}", self.version),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
