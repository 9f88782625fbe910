use crate::cmd::load_dashboard;
use crate::output::{print_json, print_table};
use nxtgen_core::types::TargetKind;
use std::path::Path;

pub fn run(root: &Path, kind: &str, json: bool) -> anyhow::Result<()> {
    let kind: TargetKind = kind.parse()?;
    let (_, dashboard) = load_dashboard(root)?;

    match kind {
        TargetKind::Workflow => {
            let workflows = dashboard.list_workflows()?;
            if json {
                return print_json(&workflows);
            }
            let rows = workflows
                .iter()
                .map(|w| {
                    vec![
                        w.id.clone(),
                        w.name.clone(),
                        w.status.to_string(),
                        format!("{}%", w.progress),
                        w.branch.clone(),
                        if w.auto_heal { "on" } else { "off" }.to_string(),
                    ]
                })
                .collect();
            print_table(
                &["ID", "NAME", "STATUS", "PROGRESS", "BRANCH", "AUTO-HEAL"],
                rows,
            );
        }
        TargetKind::SecurityFinding => {
            let view = dashboard.findings_view()?;
            if json {
                return print_json(&view);
            }
            let rows = view
                .findings
                .iter()
                .map(|f| {
                    vec![
                        f.id.clone(),
                        f.severity.to_string(),
                        f.title.clone(),
                        f.status.to_string(),
                    ]
                })
                .collect();
            print_table(&["ID", "SEVERITY", "TITLE", "STATUS"], rows);
            let c = view.counts;
            println!(
                "\n{} pending, {} resolved, {} critical ({} total)",
                c.pending, c.resolved, c.critical, c.total
            );
        }
        TargetKind::PipelineStep => {
            let steps = dashboard.list_steps()?;
            if json {
                return print_json(&steps);
            }
            let rows = steps
                .iter()
                .map(|s| {
                    vec![
                        s.name.clone(),
                        s.status.to_string(),
                        s.commands.len().to_string(),
                        s.logs.last().cloned().unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(&["STEP", "STATUS", "COMMANDS", "LAST LOG"], rows);
        }
        TargetKind::McpServer => {
            let servers = dashboard.list_servers()?;
            if json {
                return print_json(&servers);
            }
            let rows = servers
                .iter()
                .map(|s| {
                    vec![
                        s.id.clone(),
                        s.name.clone(),
                        s.category.clone(),
                        s.status.to_string(),
                        s.tools.len().to_string(),
                        s.last_sync.clone().unwrap_or_else(|| "-".to_string()),
                    ]
                })
                .collect();
            print_table(&["ID", "NAME", "CATEGORY", "STATUS", "TOOLS", "LAST SYNC"], rows);
        }
        TargetKind::ToolTest => {
            let tests = dashboard.list_tool_tests()?;
            if json {
                return print_json(&tests);
            }
            let rows = tests
                .iter()
                .map(|t| vec![t.id.clone(), t.status.to_string(), t.output.len().to_string()])
                .collect();
            print_table(&["ID", "STATUS", "LINES"], rows);
        }
    }
    Ok(())
}
