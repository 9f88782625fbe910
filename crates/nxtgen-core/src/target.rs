use crate::error::{NxtgenError, Result};
use crate::script::LogLine;
use crate::types::{Lifecycle, TargetKind};

/// An entity whose status a sequence drives.
///
/// The sequencer only talks to entities through this trait: it calls
/// [`Target::begin`] when a sequence starts, [`Target::record`] for each
/// emitted event, and then exactly one of [`Target::resolve`] or
/// [`Target::interrupt`].
pub trait Target: Clone + Send + Sync + 'static {
    const KIND: TargetKind;

    fn id(&self) -> &str;

    fn lifecycle(&self) -> Lifecycle;

    /// Kind-specific status name, e.g. `troubleshooting` or `fixing`.
    fn status_label(&self) -> &'static str;

    /// Lines appended after the last scripted event when the target resolves.
    fn resolution_lines(&self) -> &'static [&'static str];

    /// Output recorded by the current (or most recent) sequence.
    fn sequence_log(&self) -> &[LogLine];

    /// Switch to the in-progress status and drop any prior sequence output.
    fn enter_in_progress(&mut self);

    /// Append one emitted event. `emitted` counts events so far, including
    /// this one, out of `total`.
    fn record(&mut self, line: LogLine, emitted: usize, total: usize);

    /// Switch to the terminal success status and append the suffix lines.
    fn resolve(&mut self, suffix: Vec<LogLine>);

    /// The sequence was cancelled before it resolved.
    fn interrupt(&mut self);

    /// Validate and enter the in-progress status.
    ///
    /// A target that already resolved cannot restart. A target that is in
    /// progress can: the new sequence replaces the old one.
    fn begin(&mut self) -> Result<()> {
        if self.lifecycle() == Lifecycle::Resolved {
            return Err(NxtgenError::InvalidTransition {
                from: self.status_label().to_string(),
                to: "in_progress".to_string(),
                reason: format!("{} '{}' is already resolved", Self::KIND, self.id()),
            });
        }
        self.enter_in_progress();
        Ok(())
    }
}

/// Percentage of `emitted` over `total`, rounded, capped at 100.
pub fn progress_percent(emitted: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = ((emitted as f64 / total as f64) * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}
