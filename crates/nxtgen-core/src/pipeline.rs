use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::script::LogLine;
use crate::target::Target;
use crate::types::{Lifecycle, StepStatus, TargetKind};

const RESOLUTION_LINES: &[&str] = &[
    "[SUCCESS] Issue resolved automatically",
    "[SUCCESS] Deployment successful",
];

/// One stage of a workflow's pipeline (source checkout, image build, CI, deploy).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStep {
    /// Lowercase identifier, e.g. `kubernetes`.
    pub id: String,
    pub name: String,
    pub status: StepStatus,
    pub commands: Vec<String>,
    /// The step's own output. Resolution lines are appended here as well.
    pub logs: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub troubleshoot_logs: Vec<LogLine>,
}

impl PipelineStep {
    fn fixture(
        name: &str,
        status: StepStatus,
        commands: &[&str],
        logs: &[&str],
        metadata: &[(&str, &str)],
    ) -> Self {
        Self {
            id: name.to_lowercase(),
            name: name.to_string(),
            status,
            commands: commands.iter().map(|s| s.to_string()).collect(),
            logs: logs.iter().map(|s| s.to_string()).collect(),
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            troubleshoot_logs: Vec::new(),
        }
    }

    /// The pipeline shown in a workflow's detail view.
    pub fn seed() -> Vec<PipelineStep> {
        vec![
            Self::fixture(
                "GitHub",
                StepStatus::Success,
                &[
                    "git clone https://github.com/user/react-app.git",
                    "git checkout main",
                    "git pull origin main",
                    "git status",
                ],
                &[
                    "[00:28:39] Cloning repository...",
                    "[00:28:41] Successfully cloned",
                    "[00:28:42] Switched to branch 'main'",
                    "[00:28:42] Working tree clean",
                ],
                &[
                    ("Repository", "user/react-app"),
                    ("Branch", "main"),
                    ("Commit", "a1b2c3d"),
                    ("Author", "Yash"),
                ],
            ),
            Self::fixture(
                "Docker",
                StepStatus::Success,
                &[
                    "docker build -t react-app:latest .",
                    "docker tag react-app:latest registry.io/react-app:v1.0",
                    "docker push registry.io/react-app:v1.0",
                ],
                &[
                    "[00:28:45] Building Docker image...",
                    "[00:28:52] Successfully built image",
                    "[00:28:53] Tagged react-app:latest",
                    "[00:28:58] Pushed to registry successfully",
                ],
                &[
                    ("Image ID", "sha256:abc123..."),
                    ("Size", "245 MB"),
                    ("Registry", "registry.io"),
                    ("Tag", "v1.0"),
                ],
            ),
            Self::fixture(
                "Jenkins",
                StepStatus::Running,
                &[
                    "jenkins-cli build ReactApp-Pipeline",
                    "jenkins-cli console ReactApp-Pipeline #42",
                ],
                &[
                    "[00:29:01] Started build #42",
                    "[00:29:15] Running unit tests...",
                    "[00:29:45] Tests passed (18/18)",
                    "[00:30:02] Starting integration tests...",
                ],
                &[
                    ("Build Number", "#42"),
                    ("Started By", "SCM Change"),
                    ("Duration", "4m 32s"),
                    ("Workspace", "/var/jenkins/workspace/ReactApp"),
                ],
            ),
            Self::fixture(
                "Kubernetes",
                StepStatus::Error,
                &[
                    "kubectl apply -f deployment.yaml",
                    "kubectl apply -f service.yaml",
                    "kubectl get pods -n production",
                    "kubectl rollout status deployment/react-app",
                ],
                &[
                    "[00:30:15] Applying deployment manifest...",
                    "[00:30:16] Error: ImagePullBackOff",
                    "[00:30:17] Pod react-app-7d9f8c6b5d-x2k4m failed to start",
                    "[00:30:18] Reason: Unable to pull image registry.io/react-app:v1.0",
                ],
                &[
                    ("Namespace", "production"),
                    ("Replicas", "3"),
                    ("Service Type", "LoadBalancer"),
                    ("Port", "80"),
                ],
            ),
        ]
    }
}

impl Target for PipelineStep {
    const KIND: TargetKind = TargetKind::PipelineStep;

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
        self.status = StepStatus::Troubleshooting;
        self.troubleshoot_logs.clear();
    }

    fn record(&mut self, line: LogLine, _emitted: usize, _total: usize) {
        self.troubleshoot_logs.push(line);
    }

    fn resolve(&mut self, suffix: Vec<LogLine>) {
        self.status = StepStatus::Success;
        self.logs.extend(suffix.iter().map(LogLine::render));
        self.troubleshoot_logs.extend(suffix);
    }

    fn interrupt(&mut self) {
        self.status = StepStatus::Error;
    }
}
