use crate::cmd::load_dashboard;
use crate::output::{print_json, print_log_line};
use anyhow::Context;
use nxtgen_core::dashboard::Dashboard;
use nxtgen_core::sequencer::{Outcome, SequenceEvent, SequenceHandle};
use nxtgen_core::types::TargetKind;
use serde::Serialize;
use std::path::Path;
use tokio::sync::broadcast::error::RecvError;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn troubleshoot(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let (_, dashboard) = load_dashboard(root)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let handle = dashboard
            .troubleshoot_workflow(id)
            .await
            .with_context(|| format!("cannot troubleshoot workflow '{id}'"))?;
        let outcome = follow_until_done(&dashboard, TargetKind::Workflow, id, handle, json).await?;
        let wf = dashboard.workflow(id)?;
        report(json, outcome, &wf, || {
            format!("Workflow '{}' is {} ({}%)", wf.name, wf.status, wf.progress)
        })
    })
}

pub fn fix(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let (_, dashboard) = load_dashboard(root)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let handle = dashboard
            .fix_finding(id)
            .await
            .with_context(|| format!("cannot fix finding '{id}'"))?;
        let outcome =
            follow_until_done(&dashboard, TargetKind::SecurityFinding, id, handle, json).await?;
        let finding = dashboard
            .list_findings()?
            .into_iter()
            .find(|f| f.id == id)
            .with_context(|| format!("finding '{id}' disappeared"))?;
        report(json, outcome, &finding, || {
            format!(
                "Finding '{}' is {} ({} commands run)",
                finding.title,
                finding.status,
                finding.fix_commands.len()
            )
        })
    })
}

pub fn step(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let (_, dashboard) = load_dashboard(root)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let handle = dashboard
            .troubleshoot_step(name)
            .await
            .with_context(|| format!("cannot troubleshoot step '{name}'"))?;
        let id = handle.target_id.clone();
        let outcome =
            follow_until_done(&dashboard, TargetKind::PipelineStep, &id, handle, json).await?;
        let step = dashboard
            .list_steps()?
            .into_iter()
            .find(|s| s.id == id)
            .with_context(|| format!("step '{name}' disappeared"))?;
        report(json, outcome, &step, || {
            format!("Step '{}' is {}", step.name, step.status)
        })
    })
}

pub fn connect(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let (_, dashboard) = load_dashboard(root)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let handle = dashboard
            .connect_server(id)
            .await
            .with_context(|| format!("cannot connect MCP server '{id}'"))?;
        let outcome = follow_until_done(&dashboard, TargetKind::McpServer, id, handle, json).await?;
        let server = dashboard.server(id)?;
        report(json, outcome, &server, || {
            format!("MCP server '{}' is {}", server.name, server.status)
        })
    })
}

pub fn test_tool(root: &Path, server_id: &str, tool: &str, json: bool) -> anyhow::Result<()> {
    let (_, dashboard) = load_dashboard(root)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let handle = dashboard
            .test_tool(server_id, tool)
            .await
            .with_context(|| format!("cannot test tool '{tool}' on '{server_id}'"))?;
        let id = handle.target_id.clone();
        let outcome = follow_until_done(&dashboard, TargetKind::ToolTest, &id, handle, json).await?;
        let run = dashboard.tool_test(server_id, tool)?;
        report(json, outcome, &run, || {
            format!("Tool '{}' test {} ({} lines)", run.tool, run.status, run.output.len())
        })
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Print lines as they arrive. Ctrl-C cancels the sequence.
async fn follow_until_done(
    dashboard: &Dashboard,
    kind: TargetKind,
    id: &str,
    handle: SequenceHandle,
    json: bool,
) -> anyhow::Result<Outcome> {
    let follow = follow(handle, json);
    tokio::pin!(follow);
    tokio::select! {
        outcome = &mut follow => Ok(outcome),
        _ = tokio::signal::ctrl_c() => {
            dashboard.cancel(kind, id).await?;
            Ok(follow.await)
        }
    }
}

async fn follow(mut handle: SequenceHandle, json: bool) -> Outcome {
    loop {
        match handle.events().recv().await {
            Ok(SequenceEvent::Emitted { line, .. }) => {
                if !json {
                    print_log_line(&line);
                }
            }
            Ok(SequenceEvent::Resolved { lines, .. }) => {
                if !json {
                    lines.iter().for_each(print_log_line);
                }
                break;
            }
            Ok(SequenceEvent::Cancelled { .. }) | Err(RecvError::Closed) => break,
            Ok(SequenceEvent::Started { .. }) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "output fell behind the sequence");
            }
        }
    }
    handle.wait().await
}

fn report<T: Serialize>(
    json: bool,
    outcome: Outcome,
    entity: &T,
    summary: impl FnOnce() -> String,
) -> anyhow::Result<()> {
    if json {
        print_json(&serde_json::json!({
            "outcome": outcome,
            "target": entity,
        }))?;
    } else {
        println!();
        println!("{}", summary());
    }
    match outcome {
        Outcome::Resolved => Ok(()),
        Outcome::Cancelled | Outcome::Superseded => {
            anyhow::bail!("sequence ended before resolving ({outcome:?})")
        }
    }
}
