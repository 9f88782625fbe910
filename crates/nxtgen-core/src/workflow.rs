use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::script::LogLine;
use crate::target::{progress_percent, Target};
use crate::types::{Lifecycle, TargetKind, WorkflowStatus};

const RESOLUTION_LINES: &[&str] = &["[RESOLVED] Workflow marked completed"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub status: WorkflowStatus,
    pub progress: u8,
    pub duration: String,
    pub branch: String,
    pub auto_heal: bool,
    #[serde(default)]
    pub troubleshoot_logs: Vec<LogLine>,
    pub created_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(id: impl Into<String>, name: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: WorkflowStatus::Pending,
            progress: 0,
            duration: "—".to_string(),
            branch: branch.into(),
            auto_heal: true,
            troubleshoot_logs: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn fixture(
        id: &str,
        name: &str,
        status: WorkflowStatus,
        progress: u8,
        duration: &str,
        branch: &str,
        auto_heal: bool,
    ) -> Self {
        Self {
            status,
            progress,
            duration: duration.to_string(),
            auto_heal,
            ..Self::new(id, name, branch)
        }
    }

    /// The workflows shown on a fresh dashboard.
    pub fn seed() -> Vec<Workflow> {
        vec![
            Self::fixture(
                "1",
                "Production Deploy - Node.js API",
                WorkflowStatus::Running,
                65,
                "4m 32s",
                "main",
                true,
            ),
            Self::fixture(
                "2",
                "Database Migration - PostgreSQL",
                WorkflowStatus::Completed,
                100,
                "2m 15s",
                "main",
                false,
            ),
            Self::fixture(
                "3",
                "Security Scan - Docker Images",
                WorkflowStatus::Failed,
                45,
                "1m 47s",
                "feature/auth",
                false,
            ),
            Self::fixture(
                "4",
                "Staging Deploy - Frontend",
                WorkflowStatus::Pending,
                0,
                "—",
                "develop",
                true,
            ),
        ]
    }

    /// Name for a workflow created from an optional repository URL:
    /// `Deploy <repo>` with any `.git` suffix removed, or `New Workflow`.
    pub fn name_for_repo(repo_url: Option<&str>) -> String {
        let repo = repo_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .and_then(|u| u.trim_end_matches('/').rsplit('/').next())
            .map(|seg| seg.trim_end_matches(".git"))
            .filter(|seg| !seg.is_empty());
        match repo {
            Some(r) => format!("Deploy {r}"),
            None => "New Workflow".to_string(),
        }
    }

    /// Next numeric id after the largest numeric id in `existing`.
    pub fn next_id(existing: &[Workflow]) -> String {
        let max = existing
            .iter()
            .filter_map(|w| w.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (max + 1).to_string()
    }
}

impl Target for Workflow {
    const KIND: TargetKind = TargetKind::Workflow;

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
        &self.troubleshoot_logs
    }

    fn enter_in_progress(&mut self) {
        self.status = WorkflowStatus::Troubleshooting;
        self.troubleshoot_logs.clear();
    }

    fn record(&mut self, line: LogLine, emitted: usize, total: usize) {
        self.troubleshoot_logs.push(line);
        self.progress = progress_percent(emitted, total);
    }

    fn resolve(&mut self, suffix: Vec<LogLine>) {
        self.status = WorkflowStatus::Completed;
        self.progress = 100;
        self.troubleshoot_logs.extend(suffix);
    }

    fn interrupt(&mut self) {
        self.status = WorkflowStatus::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_has_one_failed_workflow() {
        let seed = Workflow::seed();
        assert_eq!(seed.len(), 4);
        let failed: Vec<_> = seed
            .iter()
            .filter(|w| w.status == WorkflowStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "Security Scan - Docker Images");
    }

    #[test]
    fn name_for_repo_strips_git_suffix() {
        assert_eq!(
            Workflow::name_for_repo(Some("https://github.com/user/react-app.git")),
            "Deploy react-app"
        );
        assert_eq!(
            Workflow::name_for_repo(Some("https://github.com/user/api/")),
            "Deploy api"
        );
        assert_eq!(Workflow::name_for_repo(Some("  ")), "New Workflow");
        assert_eq!(Workflow::name_for_repo(None), "New Workflow");
    }

    #[test]
    fn next_id_follows_largest() {
        let seed = Workflow::seed();
        assert_eq!(Workflow::next_id(&seed), "5");
        assert_eq!(Workflow::next_id(&[]), "1");
    }

    #[test]
    fn begin_clears_prior_output() {
        let mut w = Workflow::seed().remove(2);
        w.troubleshoot_logs.push(LogLine::now("stale"));
        w.begin().unwrap();
        assert_eq!(w.status, WorkflowStatus::Troubleshooting);
        assert!(w.troubleshoot_logs.is_empty());
    }

    #[test]
    fn completed_workflow_cannot_begin() {
        let mut w = Workflow::seed().remove(1);
        assert!(w.begin().is_err());
        assert_eq!(w.status, WorkflowStatus::Completed);
    }

    #[test]
    fn record_updates_progress() {
        let mut w = Workflow::new("9", "x", "main");
        w.begin().unwrap();
        w.record(LogLine::now("a"), 1, 4);
        assert_eq!(w.progress, 25);
        w.resolve(vec![LogLine::now("done")]);
        assert_eq!(w.progress, 100);
        assert_eq!(w.status, WorkflowStatus::Completed);
        assert_eq!(w.troubleshoot_logs.len(), 2);
    }
}
