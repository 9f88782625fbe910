use crate::cmd::load_dashboard;
use crate::output::{print_json, print_table};
use nxtgen_core::finding;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let (config, dashboard) = load_dashboard(root)?;
    if !json {
        println!(
            "Scanning... ({}s)",
            config.sequencer.scan_delay().as_secs_f32()
        );
    }

    let rt = tokio::runtime::Runtime::new()?;
    let findings = rt.block_on(dashboard.scan())?;
    let counts = finding::counts(&findings);

    if json {
        return print_json(&serde_json::json!({
            "findings": findings,
            "counts": counts,
        }));
    }

    let rows = findings
        .iter()
        .map(|f| vec![f.id.clone(), f.severity.to_string(), f.title.clone()])
        .collect();
    print_table(&["ID", "SEVERITY", "TITLE"], rows);
    println!("\n{} findings, {} critical", counts.total, counts.critical);
    Ok(())
}
