//! The operations behind the dashboard's buttons.
//!
//! [`Dashboard`] owns one repository and one [`Sequencer`] per target kind
//! and pairs each action with the catalog script it replays.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::info;

use crate::catalog;
use crate::config::SequencerConfig;
use crate::error::{NxtgenError, Result};
use crate::finding::{self, FindingCounts, SecurityFinding};
use crate::mcp::{McpServer, ToolTest};
use crate::pipeline::PipelineStep;
use crate::repository::{InMemoryRepository, Repository};
use crate::script::LogLine;
use crate::sequencer::{ActiveSummary, SequenceEvent, SequenceHandle, Sequencer};
use crate::target::Target;
use crate::types::{TargetKind, WorkflowStatus};
use crate::workflow::Workflow;

/// Parameters for a new workflow.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct NewWorkflow {
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FindingsView {
    pub findings: Vec<SecurityFinding>,
    pub counts: FindingCounts,
    pub scanning: bool,
}

/// One repository per target kind.
#[derive(Clone)]
pub struct Repositories {
    pub workflows: Arc<dyn Repository<Workflow>>,
    pub findings: Arc<dyn Repository<SecurityFinding>>,
    pub steps: Arc<dyn Repository<PipelineStep>>,
    pub servers: Arc<dyn Repository<McpServer>>,
    pub tool_tests: Arc<dyn Repository<ToolTest>>,
}

impl Repositories {
    /// In-memory repositories over the seed fixtures. Tool tests start empty.
    pub fn seeded() -> Self {
        Self {
            workflows: Arc::new(InMemoryRepository::with_items(Workflow::seed())),
            findings: Arc::new(InMemoryRepository::with_items(SecurityFinding::seed())),
            steps: Arc::new(InMemoryRepository::with_items(PipelineStep::seed())),
            servers: Arc::new(InMemoryRepository::with_items(McpServer::seed())),
            tool_tests: Arc::new(InMemoryRepository::new()),
        }
    }
}

#[derive(Clone)]
pub struct Dashboard {
    workflows: Sequencer<Workflow>,
    findings: Sequencer<SecurityFinding>,
    steps: Sequencer<PipelineStep>,
    servers: Sequencer<McpServer>,
    tool_tests: Sequencer<ToolTest>,
    config: SequencerConfig,
    scanning: Arc<AtomicBool>,
    notify: Option<broadcast::Sender<()>>,
}

impl Dashboard {
    /// A dashboard over the seeded fixtures.
    pub fn seeded(config: &SequencerConfig) -> Self {
        Self::with_repositories(Repositories::seeded(), config)
    }

    pub fn with_repositories(repos: Repositories, config: &SequencerConfig) -> Self {
        Self {
            workflows: Sequencer::new(repos.workflows, config),
            findings: Sequencer::new(repos.findings, config),
            steps: Sequencer::new(repos.steps, config),
            servers: Sequencer::new(repos.servers, config),
            tool_tests: Sequencer::new(repos.tool_tests, config),
            config: config.clone(),
            scanning: Arc::new(AtomicBool::new(false)),
            notify: None,
        }
    }

    /// Tick `tx` whenever any entity changes.
    pub fn with_notifier(self, tx: broadcast::Sender<()>) -> Self {
        Self {
            workflows: self.workflows.with_notifier(tx.clone()),
            findings: self.findings.with_notifier(tx.clone()),
            steps: self.steps.with_notifier(tx.clone()),
            servers: self.servers.with_notifier(tx.clone()),
            tool_tests: self.tool_tests.with_notifier(tx.clone()),
            notify: Some(tx),
            ..self
        }
    }

    fn changed(&self) {
        if let Some(tx) = &self.notify {
            let _ = tx.send(());
        }
    }

    pub fn workflow_sequencer(&self) -> &Sequencer<Workflow> {
        &self.workflows
    }

    // -----------------------------------------------------------------------
    // Workflows
    // -----------------------------------------------------------------------

    pub fn list_workflows(&self) -> Result<Vec<Workflow>> {
        self.workflows.repository().list()
    }

    pub fn workflow(&self, id: &str) -> Result<Workflow> {
        self.workflows.repository().get(id)
    }

    /// New workflows are listed first. The id is one past the largest
    /// numeric id present when the workflow is stored.
    pub fn create_workflow(&self, req: NewWorkflow) -> Result<Workflow> {
        let name = Workflow::name_for_repo(req.repo_url.as_deref());
        let branch = req
            .branch
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or("main");
        let wf = self
            .workflows
            .repository()
            .prepend_with(&mut |existing: &[Workflow]| {
                Workflow::new(Workflow::next_id(existing), name.clone(), branch)
            })?;
        info!(id = %wf.id, name = %wf.name, "workflow created");
        self.changed();
        Ok(wf)
    }

    pub async fn troubleshoot_workflow(&self, id: &str) -> Result<SequenceHandle> {
        let wf = self.workflow(id)?;
        let script = catalog::workflow_troubleshoot(
            &wf,
            self.config.interval_for(TargetKind::Workflow),
        );
        self.workflows.start(id, script).await
    }

    /// Cancel any running sequence and mark the workflow stopped.
    pub async fn stop_workflow(&self, id: &str) -> Result<Workflow> {
        self.workflows.cancel(id).await?;
        let wf = self.workflows.repository().update(id, &mut |w: &mut Workflow| {
            w.status = WorkflowStatus::Stopped;
            Ok(())
        })?;
        info!(id, "workflow stopped");
        self.changed();
        Ok(wf)
    }

    pub fn toggle_auto_heal(&self, id: &str) -> Result<Workflow> {
        let wf = self.workflows.repository().update(id, &mut |w: &mut Workflow| {
            w.auto_heal = !w.auto_heal;
            Ok(())
        })?;
        info!(id, auto_heal = wf.auto_heal, "auto-heal toggled");
        self.changed();
        Ok(wf)
    }

    // -----------------------------------------------------------------------
    // Findings
    // -----------------------------------------------------------------------

    pub fn list_findings(&self) -> Result<Vec<SecurityFinding>> {
        self.findings.repository().list()
    }

    /// Findings with their counts. Empty while a scan runs.
    pub fn findings_view(&self) -> Result<FindingsView> {
        let findings = self.list_findings()?;
        Ok(FindingsView {
            counts: finding::counts(&findings),
            findings,
            scanning: self.is_scanning(),
        })
    }

    pub async fn fix_finding(&self, id: &str) -> Result<SequenceHandle> {
        if self.is_scanning() {
            return Err(scan_busy());
        }
        let f = self
            .findings
            .repository()
            .get(id)
            .map_err(|e| if self.is_scanning() { scan_busy() } else { e })?;
        let script = catalog::finding_fix(&f, self.config.interval_for(TargetKind::SecurityFinding));

        // Re-checked under the registry lock: a scan that began after the
        // check above has either cancelled this fix or will see it refused.
        let scanning = self.scanning.clone();
        self.findings
            .start_if(id, script, move || {
                if scanning.load(Ordering::SeqCst) {
                    Err(scan_busy())
                } else {
                    Ok(())
                }
            })
            .await
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    /// Cancel active fixes and clear the findings, wait out the scan delay,
    /// then store the scan's results. Only one scan runs at a time.
    pub async fn scan(&self) -> Result<Vec<SecurityFinding>> {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(scan_busy());
        }
        let guard = ScanGuard(&self.scanning);

        let cancelled = self.findings.cancel_all().await;
        self.findings.repository().replace_all(Vec::new())?;
        info!(cancelled_fixes = cancelled, "security scan started");
        self.changed();

        tokio::time::sleep(self.config.scan_delay()).await;

        let results = SecurityFinding::scan_results();
        self.findings.repository().replace_all(results.clone())?;
        info!(findings = results.len(), "security scan complete");
        drop(guard);
        self.changed();
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Pipeline steps
    // -----------------------------------------------------------------------

    pub fn list_steps(&self) -> Result<Vec<PipelineStep>> {
        self.steps.repository().list()
    }

    /// Steps are addressed by name, case-insensitively.
    pub async fn troubleshoot_step(&self, name: &str) -> Result<SequenceHandle> {
        let id = name.to_lowercase();
        let step = self.steps.repository().get(&id)?;
        let script = catalog::step_troubleshoot(&step, self.config.interval_for(TargetKind::PipelineStep));
        self.steps.start(&id, script).await
    }

    // -----------------------------------------------------------------------
    // MCP servers
    // -----------------------------------------------------------------------

    pub fn list_servers(&self) -> Result<Vec<McpServer>> {
        self.servers.repository().list()
    }

    pub fn server(&self, id: &str) -> Result<McpServer> {
        self.servers.repository().get(id)
    }

    /// `connecting` while the handshake replays, then `connected`.
    pub async fn connect_server(&self, id: &str) -> Result<SequenceHandle> {
        let server = self.server(id)?;
        let script = catalog::mcp_connect(&server, self.config.interval_for(TargetKind::McpServer));
        self.servers.start(id, script).await
    }

    /// Abort any handshake in flight and drop the session.
    pub async fn disconnect_server(&self, id: &str) -> Result<McpServer> {
        self.servers.cancel(id).await?;
        let server = self
            .servers
            .repository()
            .update(id, &mut |s: &mut McpServer| {
                s.disconnect();
                Ok(())
            })?;
        info!(id, "mcp server disconnected");
        self.changed();
        Ok(server)
    }

    /// Replay a test invocation of `tool`. Testing the same tool again
    /// replaces the previous output.
    pub async fn test_tool(&self, server_id: &str, tool: &str) -> Result<SequenceHandle> {
        let server = self.server(server_id)?;
        let id = ToolTest::id_for(server_id, tool);
        if server.tool(tool).is_none() {
            return Err(NxtgenError::not_found(TargetKind::ToolTest, id));
        }
        match self.tool_tests.repository().insert(ToolTest::new(server_id, tool)) {
            Ok(()) | Err(NxtgenError::TargetExists { .. }) => {}
            Err(e) => return Err(e),
        }
        let script = catalog::tool_test(server_id, tool, self.config.interval_for(TargetKind::ToolTest));
        self.tool_tests.start(&id, script).await
    }

    pub fn list_tool_tests(&self) -> Result<Vec<ToolTest>> {
        self.tool_tests.repository().list()
    }

    pub fn tool_test(&self, server_id: &str, tool: &str) -> Result<ToolTest> {
        self.tool_tests
            .repository()
            .get(&ToolTest::id_for(server_id, tool))
    }

    // -----------------------------------------------------------------------
    // Sequences
    // -----------------------------------------------------------------------

    pub async fn active_sequences(&self) -> Vec<ActiveSummary> {
        let mut all = self.workflows.active().await;
        all.extend(self.findings.active().await);
        all.extend(self.steps.active().await);
        all.extend(self.servers.active().await);
        all.extend(self.tool_tests.active().await);
        all
    }

    pub async fn cancel(&self, kind: TargetKind, id: &str) -> Result<bool> {
        match kind {
            TargetKind::Workflow => self.workflows.cancel(id).await,
            TargetKind::SecurityFinding => self.findings.cancel(id).await,
            TargetKind::PipelineStep => self.steps.cancel(&id.to_lowercase()).await,
            TargetKind::McpServer => self.servers.cancel(id).await,
            TargetKind::ToolTest => self.tool_tests.cancel(id).await,
        }
    }

    pub async fn subscribe(
        &self,
        kind: TargetKind,
        id: &str,
    ) -> Option<broadcast::Receiver<SequenceEvent>> {
        match kind {
            TargetKind::Workflow => self.workflows.subscribe(id).await,
            TargetKind::SecurityFinding => self.findings.subscribe(id).await,
            TargetKind::PipelineStep => self.steps.subscribe(&id.to_lowercase()).await,
            TargetKind::McpServer => self.servers.subscribe(id).await,
            TargetKind::ToolTest => self.tool_tests.subscribe(id).await,
        }
    }

    /// Output recorded on a target by its current or most recent sequence.
    pub fn sequence_log(&self, kind: TargetKind, id: &str) -> Result<Vec<LogLine>> {
        match kind {
            TargetKind::Workflow => log_of(self.workflows.repository().as_ref(), id),
            TargetKind::SecurityFinding => log_of(self.findings.repository().as_ref(), id),
            TargetKind::PipelineStep => {
                log_of(self.steps.repository().as_ref(), &id.to_lowercase())
            }
            TargetKind::McpServer => log_of(self.servers.repository().as_ref(), id),
            TargetKind::ToolTest => log_of(self.tool_tests.repository().as_ref(), id),
        }
    }

    /// Cancel every active sequence of every kind.
    pub async fn shutdown(&self) -> usize {
        self.workflows.cancel_all().await
            + self.findings.cancel_all().await
            + self.steps.cancel_all().await
            + self.servers.cancel_all().await
            + self.tool_tests.cancel_all().await
    }
}

fn scan_busy() -> NxtgenError {
    NxtgenError::Busy("security scan".to_string())
}

fn log_of<T: Target>(repo: &dyn Repository<T>, id: &str) -> Result<Vec<LogLine>> {
    Ok(repo.get(id)?.sequence_log().to_vec())
}

struct ScanGuard<'a>(&'a AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
