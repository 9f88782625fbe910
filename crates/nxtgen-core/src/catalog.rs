//! Built-in scripts for the dashboard's simulated actions.
//!
//! Each function picks a variant by matching on the target's name or title
//! and stamps every event with the supplied interval.

use std::time::Duration;
use uuid::Uuid;

use crate::finding::SecurityFinding;
use crate::mcp::McpServer;
use crate::pipeline::PipelineStep;
use crate::script::{Event, Script};
use crate::workflow::Workflow;

/// Troubleshooting run for a failed workflow.
pub fn workflow_troubleshoot(workflow: &Workflow, interval: Duration) -> Script {
    let name = workflow.name.as_str();
    if name.contains("Security") {
        Script::from_lines(
            &[
                "[SCAN] Analyzing failed scan results...",
                "[INFO] Identified issue: Docker image vulnerability check timeout",
                "[FIX] Increasing scan timeout from 30s to 120s...",
                "[RETRY] Retrying vulnerability scan...",
                "$ trivy image --timeout 120s registry.io/app:latest",
                "[PROGRESS] Scan in progress (1/3 layers)...",
                "[PROGRESS] Scan in progress (2/3 layers)...",
                "[PROGRESS] Scan in progress (3/3 layers)...",
                "[SUCCESS] Vulnerability scan completed successfully",
                "[INFO] Generating security report...",
                "[DONE] Workflow recovered! All checks passed.",
            ],
            interval,
        )
    } else if name.contains("Deploy") {
        Script::from_lines(
            &[
                "[SCAN] Analyzing deployment failure...",
                "[INFO] Root cause: Container health check failed",
                "$ kubectl describe pod react-app-7d9f8c6b5d-x2k4m",
                "[WARN] Found: OOMKilled - Memory limit exceeded",
                "[FIX] Increasing memory limit from 256Mi to 512Mi...",
                "$ kubectl set resources deployment/react-app --limits=memory=512Mi",
                "[RETRY] Triggering rolling restart...",
                "$ kubectl rollout restart deployment/react-app",
                "[WAIT] Waiting for pods to be ready...",
                "[SUCCESS] Pod react-app-8e0f9d7c6e-y3l5n is running",
                "[DONE] Deployment recovered successfully!",
            ],
            interval,
        )
    } else {
        let run_id = Uuid::new_v4().simple().to_string();
        let diagnose = format!("$ nxtgen diagnose --workflow-id {}", &run_id[..9]);
        Script::from_lines(
            &[
                "[SCAN] Analyzing workflow failure...",
                "[INFO] Running diagnostics...",
                diagnose.as_str(),
                "[FIX] Identified issue: Transient network error",
                "[RETRY] Retrying failed step...",
                "[SUCCESS] Step completed successfully",
                "[DONE] Workflow recovered!",
            ],
            interval,
        )
    }
}

/// Auto-fix run for a security finding. Log lines and commands are separate.
pub fn finding_fix(finding: &SecurityFinding, interval: Duration) -> Script {
    let steps: &[(&str, Option<&str>)] = if finding.title.contains("node:18-alpine") {
        &[
            ("[SCAN] Analyzing Dockerfile...", Some("cat Dockerfile | grep FROM")),
            ("[INFO] Found base image: node:18-alpine", None),
            (
                "[FIX] Updating base image to node:20-alpine...",
                Some("sed -i \"s/node:18-alpine/node:20-alpine/g\" Dockerfile"),
            ),
            ("[BUILD] Rebuilding Docker image...", Some("docker build -t app:latest .")),
            ("[SUCCESS] Build successful! Image updated to node:20-alpine", None),
            (
                "[DEPLOY] Pushing updated image to registry...",
                Some("docker push registry.io/app:latest"),
            ),
            ("[DONE] Vulnerability resolved successfully!", None),
        ]
    } else if finding.title.contains("port 22") {
        &[
            ("[SCAN] Fetching security group configuration...", None),
            (
                "[INFO] Current rule: 0.0.0.0/0 on port 22",
                Some("aws ec2 describe-security-groups --group-id sg-prod"),
            ),
            (
                "[FIX] Removing public SSH access...",
                Some("aws ec2 revoke-security-group-ingress --protocol tcp --port 22 --cidr 0.0.0.0/0"),
            ),
            (
                "[FIX] Adding VPN CIDR restriction...",
                Some("aws ec2 authorize-security-group-ingress --protocol tcp --port 22 --cidr 10.0.0.0/8"),
            ),
            ("[SUCCESS] Security group updated successfully!", None),
            ("[DONE] Port 22 now restricted to VPN only", None),
        ]
    } else if finding.title.contains("rate limiting") {
        &[
            ("[INSTALL] Installing express-rate-limit...", Some("npm install express-rate-limit")),
            ("[CONFIG] Updating auth middleware...", None),
            ("[CONFIG] Configuring rate limiter: 100 requests/15min", None),
            ("[APPLY] Applying to /api/auth routes...", Some("git diff src/middleware/auth.js")),
            ("[SUCCESS] Rate limiting configured!", None),
            ("[DEPLOY] Deploying changes...", Some("npm run deploy")),
            ("[DONE] API endpoints now protected!", None),
        ]
    } else {
        &[
            ("[INSTALL] Installing helmet middleware...", Some("npm install helmet")),
            ("[CONFIG] Adding helmet to Express app...", None),
            ("[CONFIG] Configuring security headers...", Some("vi src/app.js")),
            ("[INFO] Headers: X-Frame-Options, CSP, HSTS", None),
            ("[SUCCESS] Security headers configured!", None),
            ("[DEPLOY] Restarting application...", Some("pm2 restart api")),
            ("[DONE] Headers now include security policies!", None),
        ]
    };

    steps
        .iter()
        .map(|(log, cmd)| {
            let event = Event::new(*log, interval);
            match cmd {
                Some(c) => event.with_command(*c),
                None => event,
            }
        })
        .collect()
}

/// Troubleshooting run for a pipeline step.
pub fn step_troubleshoot(step: &PipelineStep, interval: Duration) -> Script {
    match step.id.as_str() {
        "kubernetes" => Script::from_lines(
            &[
                "[SCAN] Analyzing deployment failure...",
                "[INFO] Error identified: ImagePullBackOff",
                "$ kubectl describe pod react-app-7d9f8c6b5d-x2k4m -n production",
                "[WARN] Found: Image pull secret missing",
                "[FIX] Creating registry secret...",
                "$ kubectl create secret docker-registry regcred --docker-server=registry.io --docker-username=deploy --docker-password=***",
                "[CONFIG] Patching deployment with imagePullSecrets...",
                "$ kubectl patch deployment react-app -p '{\"spec\":{\"template\":{\"spec\":{\"imagePullSecrets\":[{\"name\":\"regcred\"}]}}}}'",
                "[RETRY] Triggering rollout restart...",
                "$ kubectl rollout restart deployment/react-app -n production",
                "[WAIT] Waiting for pods to be ready...",
                "$ kubectl rollout status deployment/react-app -n production",
                "[SUCCESS] Pod react-app-8e0f9d7c6e-y3l5n is Running",
                "[SUCCESS] Pod react-app-8e0f9d7c6e-z4m6o is Running",
                "[SUCCESS] Pod react-app-8e0f9d7c6e-w5n7p is Running",
                "[DONE] Deployment recovered successfully!",
            ],
            interval,
        ),
        "jenkins" => Script::from_lines(
            &[
                "[SCAN] Analyzing build failure...",
                "[INFO] Checking build logs...",
                "$ jenkins-cli console ReactApp-Pipeline #42",
                "[WARN] Found: Test timeout in integration tests",
                "[FIX] Increasing test timeout from 30s to 120s...",
                "[RETRY] Retrying build...",
                "$ jenkins-cli build ReactApp-Pipeline -p TEST_TIMEOUT=120",
                "[WAIT] Running tests...",
                "[SUCCESS] All tests passed (18/18)",
                "[DONE] Build recovered!",
            ],
            interval,
        ),
        _ => Script::from_lines(
            &[
                "[SCAN] Analyzing failure...",
                "[INFO] Running diagnostics...",
                "[FIX] Applying fix...",
                "[SUCCESS] Issue resolved!",
                "[DONE] Step recovered!",
            ],
            interval,
        ),
    }
}

/// Handshake run when connecting an MCP server.
pub fn mcp_connect(server: &McpServer, interval: Duration) -> Script {
    let open = format!("> Connecting to {} MCP server...", server.id);
    let found = format!(
        "> Discovered {} tools, {} resources",
        server.tools.len(),
        server.resources.len()
    );
    Script::from_lines(
        &[open.as_str(), "> Negotiating protocol version...", found.as_str()],
        interval,
    )
}

/// Canned output of a test invocation of `tool` on `server_id`.
pub fn tool_test(server_id: &str, tool: &str, interval: Duration) -> Script {
    let invoking = format!("> Invoking {tool}...");
    let connecting = format!("> Connecting to {server_id} MCP server...");
    let timestamp = format!(
        "  \"timestamp\": \"{}\"",
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    );
    Script::from_lines(
        &[
            invoking.as_str(),
            connecting.as_str(),
            "> Authenticating with credentials...",
            "> Executing tool with parameters...",
            "> Response received:",
            "{",
            "  \"success\": true,",
            "  \"data\": { \"message\": \"Tool executed successfully\" },",
            timestamp.as_str(),
            "}",
        ],
        interval,
    )
}

/// The self-healing incident replayed by the landing-page terminal. Offsets
/// are absolute from the start of the run.
pub fn terminal_demo() -> Script {
    let ms = Duration::from_millis;
    Script::from_offsets(&[
        ("> nxt-gen monitor --status", ms(500)),
        ("System Status: CRITICAL", ms(1000)),
        ("Detected: Pod Restart Loop (Service: Payment-API)", ms(1500)),
        ("> nxt-gen fix --auto", ms(2500)),
        ("Analyzing operational logs...", ms(3000)),
        ("Root Cause: Memory Limit Exceeded (OOMKilled)", ms(4000)),
        (
            "Action: Scaling Vertical Resource Limits (512MB -> 1024MB)",
            ms(5000),
        ),
        ("Verifying Fix...", ms(6500)),
        ("Service Health: STABLE", ms(8000)),
        ("Incident Resolved in 4.2s. Report generated.", ms(9000)),
        ("Listening for new events...", ms(10500)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::Pacing;
    use crate::types::WorkflowStatus;

    const MS700: Duration = Duration::from_millis(700);

    #[test]
    fn security_workflow_gets_scan_script() {
        let wf = Workflow::seed().remove(2);
        let s = workflow_troubleshoot(&wf, MS700);
        assert_eq!(s.len(), 11);
        assert_eq!(
            s.events()[4].command.as_deref(),
            Some("trivy image --timeout 120s registry.io/app:latest")
        );
    }

    #[test]
    fn deploy_workflow_gets_rollout_script() {
        let wf = Workflow::seed().remove(0);
        let s = workflow_troubleshoot(&wf, MS700);
        assert_eq!(s.len(), 11);
        assert!(s.events()[0].display_text.contains("deployment failure"));
    }

    #[test]
    fn generic_workflow_embeds_short_diagnose_id() {
        let mut wf = Workflow::new("7", "Database Migration", "main");
        wf.status = WorkflowStatus::Failed;
        let s = workflow_troubleshoot(&wf, MS700);
        assert_eq!(s.len(), 7);
        let cmd = s.events()[2].command.as_deref().unwrap();
        let id = cmd.rsplit(' ').next().unwrap();
        assert_eq!(id.len(), 9);
    }

    #[test]
    fn finding_fix_variants_have_commands() {
        for f in SecurityFinding::seed() {
            let s = finding_fix(&f, Duration::from_millis(800));
            assert!(!s.is_empty());
            assert!(s.events().iter().any(|e| e.command.is_some()));
            assert!(s.events().last().unwrap().display_text.starts_with("[DONE]"));
        }
    }

    #[test]
    fn node_image_fix_has_four_commands() {
        let f = SecurityFinding::seed().remove(0);
        let s = finding_fix(&f, Duration::from_millis(800));
        let cmds = s.events().iter().filter(|e| e.command.is_some()).count();
        assert_eq!(cmds, 4);
    }

    #[test]
    fn kubernetes_step_script_is_longest() {
        let steps = PipelineStep::seed();
        let k8s = step_troubleshoot(&steps[3], Duration::from_millis(600));
        let jenkins = step_troubleshoot(&steps[2], Duration::from_millis(600));
        let github = step_troubleshoot(&steps[0], Duration::from_millis(600));
        assert_eq!(k8s.len(), 16);
        assert_eq!(jenkins.len(), 10);
        assert_eq!(github.len(), 5);
    }

    #[test]
    fn mcp_connect_reports_discovered_tools() {
        let supabase = McpServer::seed().remove(1);
        let s = mcp_connect(&supabase, Duration::from_millis(500));
        assert_eq!(s.len(), 3);
        assert_eq!(s.events()[0].display_text, "> Connecting to supabase MCP server...");
        assert_eq!(s.events()[2].display_text, "> Discovered 5 tools, 2 resources");
    }

    #[test]
    fn tool_test_prints_ten_lines_of_json_response() {
        let s = tool_test("netlify", "deploy-site", Duration::from_millis(300));
        assert_eq!(s.len(), 10);
        assert_eq!(s.events()[0].display_text, "> Invoking deploy-site...");
        assert!(s.events()[8].display_text.contains("\"timestamp\""));
        assert!(s.events().iter().all(|e| e.command.is_none()));
    }

    #[test]
    fn terminal_demo_spans_ten_and_a_half_seconds() {
        let s = terminal_demo();
        assert_eq!(s.len(), 11);
        assert_eq!(
            Pacing::Scripted.duration_of(&s),
            Duration::from_millis(10500)
        );
    }
}
