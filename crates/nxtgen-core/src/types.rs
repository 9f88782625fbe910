use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::NxtgenError;

// ---------------------------------------------------------------------------
// TargetKind
// ---------------------------------------------------------------------------

/// The kinds of entity a sequence can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Workflow,
    SecurityFinding,
    PipelineStep,
    McpServer,
    ToolTest,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Workflow => "workflow",
            TargetKind::SecurityFinding => "security_finding",
            TargetKind::PipelineStep => "pipeline_step",
            TargetKind::McpServer => "mcp_server",
            TargetKind::ToolTest => "tool_test",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TargetKind {
    type Err = NxtgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "workflow" | "workflows" => Ok(TargetKind::Workflow),
            "security_finding" | "security-finding" | "finding" | "findings" => {
                Ok(TargetKind::SecurityFinding)
            }
            "pipeline_step" | "pipeline-step" | "step" | "steps" => Ok(TargetKind::PipelineStep),
            "mcp_server" | "mcp-server" | "mcp" | "server" | "servers" => Ok(TargetKind::McpServer),
            "tool_test" | "tool-test" | "tool-tests" => Ok(TargetKind::ToolTest),
            _ => Err(NxtgenError::InvalidKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Kind-independent view of an entity status, as seen by the sequencer.
///
/// Transitions: `Ready | Failed → InProgress → Resolved`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Idle, waiting for an action (pending, running, stopped).
    Ready,
    /// A sequence is replaying against the entity.
    InProgress,
    Resolved,
    Failed,
}

impl Lifecycle {
    pub fn is_terminal(self) -> bool {
        matches!(self, Lifecycle::Resolved | Lifecycle::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lifecycle::Ready => "ready",
            Lifecycle::InProgress => "in_progress",
            Lifecycle::Resolved => "resolved",
            Lifecycle::Failed => "failed",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// WorkflowStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
    Pending,
    Troubleshooting,
    Stopped,
}

impl WorkflowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStatus::Running => "running",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::Troubleshooting => "troubleshooting",
            WorkflowStatus::Stopped => "stopped",
        }
    }

    pub fn lifecycle(self) -> Lifecycle {
        match self {
            WorkflowStatus::Troubleshooting => Lifecycle::InProgress,
            WorkflowStatus::Completed => Lifecycle::Resolved,
            WorkflowStatus::Failed => Lifecycle::Failed,
            WorkflowStatus::Running | WorkflowStatus::Pending | WorkflowStatus::Stopped => {
                Lifecycle::Ready
            }
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowStatus {
    type Err = NxtgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(WorkflowStatus::Running),
            "completed" => Ok(WorkflowStatus::Completed),
            "failed" => Ok(WorkflowStatus::Failed),
            "pending" => Ok(WorkflowStatus::Pending),
            "troubleshooting" => Ok(WorkflowStatus::Troubleshooting),
            "stopped" => Ok(WorkflowStatus::Stopped),
            _ => Err(NxtgenError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// FindingStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    Pending,
    Fixing,
    Resolved,
    Failed,
}

impl FindingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FindingStatus::Pending => "pending",
            FindingStatus::Fixing => "fixing",
            FindingStatus::Resolved => "resolved",
            FindingStatus::Failed => "failed",
        }
    }

    pub fn lifecycle(self) -> Lifecycle {
        match self {
            FindingStatus::Pending => Lifecycle::Ready,
            FindingStatus::Fixing => Lifecycle::InProgress,
            FindingStatus::Resolved => Lifecycle::Resolved,
            FindingStatus::Failed => Lifecycle::Failed,
        }
    }
}

impl fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FindingStatus {
    type Err = NxtgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FindingStatus::Pending),
            "fixing" => Ok(FindingStatus::Fixing),
            "resolved" => Ok(FindingStatus::Resolved),
            "failed" => Ok(FindingStatus::Failed),
            _ => Err(NxtgenError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// StepStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Running,
    Pending,
    Error,
    Troubleshooting,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Success => "success",
            StepStatus::Running => "running",
            StepStatus::Pending => "pending",
            StepStatus::Error => "error",
            StepStatus::Troubleshooting => "troubleshooting",
        }
    }

    pub fn lifecycle(self) -> Lifecycle {
        match self {
            StepStatus::Troubleshooting => Lifecycle::InProgress,
            StepStatus::Success => Lifecycle::Resolved,
            StepStatus::Error => Lifecycle::Failed,
            StepStatus::Running | StepStatus::Pending => Lifecycle::Ready,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepStatus {
    type Err = NxtgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(StepStatus::Success),
            "running" => Ok(StepStatus::Running),
            "pending" => Ok(StepStatus::Pending),
            "error" => Ok(StepStatus::Error),
            "troubleshooting" => Ok(StepStatus::Troubleshooting),
            _ => Err(NxtgenError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// McpStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McpStatus {
    Connected,
    Disconnected,
    Connecting,
    Error,
}

impl McpStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            McpStatus::Connected => "connected",
            McpStatus::Disconnected => "disconnected",
            McpStatus::Connecting => "connecting",
            McpStatus::Error => "error",
        }
    }

    pub fn lifecycle(self) -> Lifecycle {
        match self {
            McpStatus::Connecting => Lifecycle::InProgress,
            McpStatus::Connected => Lifecycle::Resolved,
            McpStatus::Error => Lifecycle::Failed,
            McpStatus::Disconnected => Lifecycle::Ready,
        }
    }
}

impl fmt::Display for McpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for McpStatus {
    type Err = NxtgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connected" => Ok(McpStatus::Connected),
            "disconnected" => Ok(McpStatus::Disconnected),
            "connecting" => Ok(McpStatus::Connecting),
            "error" => Ok(McpStatus::Error),
            _ => Err(NxtgenError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ToolTestStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolTestStatus {
    Idle,
    Running,
    Succeeded,
    Cancelled,
}

impl ToolTestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolTestStatus::Idle => "idle",
            ToolTestStatus::Running => "running",
            ToolTestStatus::Succeeded => "succeeded",
            ToolTestStatus::Cancelled => "cancelled",
        }
    }

    pub fn lifecycle(self) -> Lifecycle {
        match self {
            ToolTestStatus::Running => Lifecycle::InProgress,
            ToolTestStatus::Succeeded => Lifecycle::Resolved,
            ToolTestStatus::Idle | ToolTestStatus::Cancelled => Lifecycle::Ready,
        }
    }
}

impl fmt::Display for ToolTestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = NxtgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(NxtgenError::InvalidSeverity(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_kind_parses_aliases() {
        assert_eq!("workflows".parse::<TargetKind>().unwrap(), TargetKind::Workflow);
        assert_eq!(
            "finding".parse::<TargetKind>().unwrap(),
            TargetKind::SecurityFinding
        );
        assert_eq!(
            "pipeline-step".parse::<TargetKind>().unwrap(),
            TargetKind::PipelineStep
        );
        assert_eq!("mcp".parse::<TargetKind>().unwrap(), TargetKind::McpServer);
        assert!("cluster".parse::<TargetKind>().is_err());
    }

    #[test]
    fn target_kind_display_roundtrips() {
        for kind in [
            TargetKind::Workflow,
            TargetKind::SecurityFinding,
            TargetKind::PipelineStep,
            TargetKind::McpServer,
            TargetKind::ToolTest,
        ] {
            assert_eq!(kind.to_string().parse::<TargetKind>().unwrap(), kind);
        }
    }

    #[test]
    fn workflow_status_lifecycle() {
        assert_eq!(WorkflowStatus::Failed.lifecycle(), Lifecycle::Failed);
        assert_eq!(
            WorkflowStatus::Troubleshooting.lifecycle(),
            Lifecycle::InProgress
        );
        assert_eq!(WorkflowStatus::Completed.lifecycle(), Lifecycle::Resolved);
        assert_eq!(WorkflowStatus::Stopped.lifecycle(), Lifecycle::Ready);
    }

    #[test]
    fn step_error_counts_as_failed() {
        assert_eq!(StepStatus::Error.lifecycle(), Lifecycle::Failed);
        assert!(StepStatus::Success.lifecycle().is_terminal());
        assert!(!StepStatus::Running.lifecycle().is_terminal());
    }

    #[test]
    fn mcp_status_lifecycle() {
        assert_eq!(McpStatus::Connecting.lifecycle(), Lifecycle::InProgress);
        assert_eq!(McpStatus::Connected.lifecycle(), Lifecycle::Resolved);
        assert_eq!(McpStatus::Error.lifecycle(), Lifecycle::Failed);
        assert_eq!("disconnected".parse::<McpStatus>().unwrap(), McpStatus::Disconnected);
    }

    #[test]
    fn finding_status_serializes_snake_case() {
        let json = serde_json::to_string(&FindingStatus::Fixing).unwrap();
        assert_eq!(json, "\"fixing\"");
    }

    #[test]
    fn severity_orders_critical_first() {
        let mut v = vec![Severity::Low, Severity::Critical, Severity::Medium];
        v.sort();
        assert_eq!(v, vec![Severity::Critical, Severity::Medium, Severity::Low]);
    }

    #[test]
    fn invalid_status_is_rejected() {
        assert!("exploded".parse::<WorkflowStatus>().is_err());
        assert!("exploded".parse::<FindingStatus>().is_err());
        assert!("exploded".parse::<StepStatus>().is_err());
    }
}
