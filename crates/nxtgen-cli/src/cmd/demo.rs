use crate::output::print_json;
use anyhow::Context;
use nxtgen_core::catalog;
use nxtgen_core::config::Config;
use nxtgen_core::sequencer::{self, Outcome, SequenceEvent};
use std::path::Path;
use tokio::sync::broadcast::error::RecvError;

/// Replay the terminal incident line by line, honouring the configured pacing.
/// Ctrl-C stops the replay.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let seq = &config.sequencer;

    let rt = tokio::runtime::Runtime::new()?;
    let (lines, outcome) = rt.block_on(async {
        let mut playback = sequencer::play(
            "terminal",
            catalog::terminal_demo(),
            seq.pacing,
            seq.channel_capacity,
        );
        let stop = playback.stopper();
        let mut lines = Vec::new();
        loop {
            tokio::select! {
                ev = playback.events().recv() => match ev {
                    Ok(SequenceEvent::Emitted { line, .. }) => {
                        if !json {
                            println!("{}", line.text);
                        }
                        lines.push(line);
                    }
                    Ok(SequenceEvent::Started { .. }) => {}
                    Ok(_) | Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "output fell behind the demo");
                    }
                },
                _ = tokio::signal::ctrl_c() => stop.abort(),
            }
        }
        (lines, playback.wait().await)
    });

    if json {
        print_json(&lines)?;
    }
    if outcome != Outcome::Resolved {
        anyhow::bail!("demo stopped after {} lines", lines.len());
    }
    Ok(())
}
