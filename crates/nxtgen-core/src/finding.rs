use serde::{Deserialize, Serialize};

use crate::script::LogLine;
use crate::target::Target;
use crate::types::{FindingStatus, Lifecycle, Severity, TargetKind};

const RESOLUTION_LINES: &[&str] = &["[RESOLVED] Finding marked resolved"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityFinding {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub fix: String,
    pub status: FindingStatus,
    #[serde(default)]
    pub fix_logs: Vec<LogLine>,
    #[serde(default)]
    pub fix_commands: Vec<String>,
}

impl SecurityFinding {
    pub fn new(
        id: impl Into<String>,
        severity: Severity,
        title: impl Into<String>,
        fix: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            title: title.into(),
            fix: fix.into(),
            status: FindingStatus::Pending,
            fix_logs: Vec::new(),
            fix_commands: Vec::new(),
        }
    }

    /// Findings present before any scan has run.
    pub fn seed() -> Vec<SecurityFinding> {
        vec![
            Self::new(
                "1",
                Severity::High,
                "Outdated node:18-alpine base image",
                "Update to node:20-alpine",
            ),
            Self::new(
                "2",
                Severity::High,
                "Exposed port 22 on prod security group",
                "Restrict to VPN CIDR only",
            ),
            Self::new(
                "3",
                Severity::Medium,
                "Missing rate limiting on /api/auth",
                "Add express-rate-limit middleware",
            ),
            Self::new(
                "4",
                Severity::Low,
                "HTTP headers missing security policies",
                "Add helmet middleware",
            ),
        ]
    }

    /// Findings reported by a completed security scan.
    pub fn scan_results() -> Vec<SecurityFinding> {
        vec![
            Self::new(
                "10",
                Severity::Critical,
                "SQL injection vulnerability in user input",
                "Use parameterized queries",
            ),
            Self::new(
                "11",
                Severity::High,
                "Exposed AWS credentials in environment",
                "Move to AWS Secrets Manager",
            ),
            Self::new(
                "12",
                Severity::High,
                "Outdated npm packages with CVEs",
                "Run npm audit fix --force",
            ),
            Self::new(
                "13",
                Severity::Medium,
                "Missing CORS configuration",
                "Add cors middleware with whitelist",
            ),
            Self::new(
                "14",
                Severity::Low,
                "Console.log statements in production",
                "Remove debug logs",
            ),
        ]
    }
}

impl Target for SecurityFinding {
    const KIND: TargetKind = TargetKind::SecurityFinding;

    fn id(&self) -> &str {
        &self.id
    }

    fn lifecycle(&self) -> Lifecycle {
        self.status.lifecycle()
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn resolution_lines(&self) -> &'static [&'static str] {
        RESOLUTION_LINES
    }

    fn sequence_log(&self) -> &[LogLine] {
        &self.fix_logs
    }

    fn enter_in_progress(&mut self) {
        self.status = FindingStatus::Fixing;
        self.fix_logs.clear();
        self.fix_commands.clear();
    }

    fn record(&mut self, line: LogLine, _emitted: usize, _total: usize) {
        if let Some(cmd) = &line.command {
            self.fix_commands.push(cmd.clone());
        }
        self.fix_logs.push(line);
    }

    fn resolve(&mut self, suffix: Vec<LogLine>) {
        self.status = FindingStatus::Resolved;
        self.fix_logs.extend(suffix);
    }

    fn interrupt(&mut self) {
        self.status = FindingStatus::Pending;
    }
}

// ---------------------------------------------------------------------------
// FindingCounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FindingCounts {
    pub pending: usize,
    pub resolved: usize,
    pub critical: usize,
    pub total: usize,
}

pub fn counts(findings: &[SecurityFinding]) -> FindingCounts {
    FindingCounts {
        pending: findings
            .iter()
            .filter(|f| f.status == FindingStatus::Pending)
            .count(),
        resolved: findings
            .iter()
            .filter(|f| f.status == FindingStatus::Resolved)
            .count(),
        critical: findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .count(),
        total: findings.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Event;
    use std::time::Duration;

    #[test]
    fn seed_counts() {
        let c = counts(&SecurityFinding::seed());
        assert_eq!(
            c,
            FindingCounts {
                pending: 4,
                resolved: 0,
                critical: 0,
                total: 4
            }
        );
    }

    #[test]
    fn scan_results_include_one_critical() {
        let c = counts(&SecurityFinding::scan_results());
        assert_eq!(c.critical, 1);
        assert_eq!(c.total, 5);
    }

    #[test]
    fn record_collects_commands_separately() {
        let mut f = SecurityFinding::seed().remove(0);
        f.begin().unwrap();
        let with_cmd = Event::new("[BUILD] Rebuilding...", Duration::ZERO)
            .with_command("docker build -t app:latest .");
        f.record(LogLine::from_event(&with_cmd), 1, 2);
        f.record(
            LogLine::from_event(&Event::new("[INFO] ok", Duration::ZERO)),
            2,
            2,
        );
        assert_eq!(f.fix_logs.len(), 2);
        assert_eq!(f.fix_commands, vec!["docker build -t app:latest ."]);
    }

    #[test]
    fn restart_clears_commands_too() {
        let mut f = SecurityFinding::seed().remove(0);
        f.begin().unwrap();
        f.fix_commands.push("stale".into());
        f.begin().unwrap();
        assert!(f.fix_commands.is_empty());
        assert_eq!(f.status, FindingStatus::Fixing);
    }

    #[test]
    fn interrupt_returns_to_pending() {
        let mut f = SecurityFinding::seed().remove(1);
        f.begin().unwrap();
        f.interrupt();
        assert_eq!(f.status, FindingStatus::Pending);
    }
}
