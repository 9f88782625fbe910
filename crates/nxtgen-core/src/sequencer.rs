//! Timed event sequencer.
//!
//! A [`Sequencer`] replays a [`Script`] against one target entity: it marks
//! the target in progress, appends each event to the target's log on a delay,
//! and after a final settle pause moves the target to its resolved state.
//!
//! ```text
//! start(id, script)
//!     │  registry lock: begin() on target, supersede old run, spawn task
//!     ▼
//! drive task ── sleep(delay) ── lock ── generation current? ── record() ──▶ Emitted
//!     │                                        │ no
//!     │                                        └─▶ exit silently
//!     ▼
//! sleep(settle) ── lock ── resolve() ──▶ Resolved
//! ```
//!
//! Every write a drive task makes happens under the registry lock and only
//! while its generation is the one registered for the target. Cancelling or
//! superseding a run bumps it out of the registry under the same lock, so a
//! stale task can never append to a target after that point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot, Mutex};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SequencerConfig;
use crate::error::Result;
use crate::repository::Repository;
use crate::script::{Event, LogLine, Script};
use crate::target::Target;
use crate::types::TargetKind;

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

/// How long to wait before each event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Pacing {
    /// Use each event's own `emit_delay`.
    #[default]
    Scripted,
    /// Ignore per-event delays; space every event `interval_ms` apart.
    Fixed { interval_ms: u64 },
}

impl Pacing {
    pub fn delay_for(&self, event: &Event) -> Duration {
        match self {
            Pacing::Scripted => event.emit_delay,
            Pacing::Fixed { interval_ms } => Duration::from_millis(*interval_ms),
        }
    }

    /// Time from start to the last event of `script`, settle excluded.
    pub fn duration_of(&self, script: &Script) -> Duration {
        script.events().iter().map(|e| self.delay_for(e)).sum()
    }
}

// ---------------------------------------------------------------------------
// SequenceEvent / Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// `cancel` or `cancel_all` was called.
    Requested,
    /// A newer sequence was started on the same target.
    Superseded,
    /// The target disappeared from the repository mid-run.
    TargetRemoved,
}

/// Live notifications for observers of one sequence.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SequenceEvent {
    Started {
        sequence_id: String,
        target_id: String,
        total: usize,
    },
    Emitted {
        sequence_id: String,
        target_id: String,
        /// 1-based position of the event in the script.
        index: usize,
        total: usize,
        line: LogLine,
    },
    Resolved {
        sequence_id: String,
        target_id: String,
        lines: Vec<LogLine>,
    },
    Cancelled {
        sequence_id: String,
        target_id: String,
        reason: CancelReason,
    },
}

impl SequenceEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SequenceEvent::Resolved { .. } | SequenceEvent::Cancelled { .. }
        )
    }

    /// Event name for SSE framing.
    pub fn name(&self) -> &'static str {
        match self {
            SequenceEvent::Started { .. } => "started",
            SequenceEvent::Emitted { .. } => "emitted",
            SequenceEvent::Resolved { .. } => "resolved",
            SequenceEvent::Cancelled { .. } => "cancelled",
        }
    }
}

/// How a sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Resolved,
    Cancelled,
    Superseded,
}

/// Summary of a running sequence, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveSummary {
    pub kind: TargetKind,
    pub target_id: String,
    pub sequence_id: String,
    pub emitted: usize,
    pub total: usize,
    pub started_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

struct ActiveSequence {
    sequence_id: String,
    generation: u64,
    abort: AbortHandle,
    tx: broadcast::Sender<SequenceEvent>,
    done: oneshot::Sender<Outcome>,
    emitted: usize,
    total: usize,
    started_at: DateTime<Utc>,
}

impl ActiveSequence {
    /// Stop the drive task and notify observers. The entry must already be
    /// out of the registry.
    fn finish_cancelled(self, target_id: &str, reason: CancelReason) {
        self.abort.abort();
        let _ = self.tx.send(SequenceEvent::Cancelled {
            sequence_id: self.sequence_id,
            target_id: target_id.to_string(),
            reason,
        });
        let outcome = match reason {
            CancelReason::Superseded => Outcome::Superseded,
            CancelReason::Requested | CancelReason::TargetRemoved => Outcome::Cancelled,
        };
        let _ = self.done.send(outcome);
    }
}

#[derive(Default)]
struct Registry {
    next_generation: u64,
    active: HashMap<String, ActiveSequence>,
}

impl Registry {
    fn is_current(&self, target_id: &str, generation: u64) -> bool {
        self.active
            .get(target_id)
            .is_some_and(|a| a.generation == generation)
    }
}

// ---------------------------------------------------------------------------
// SequenceHandle
// ---------------------------------------------------------------------------

/// Returned by [`Sequencer::start`]. Dropping it does not stop the sequence.
pub struct SequenceHandle {
    pub sequence_id: String,
    pub target_id: String,
    events: broadcast::Receiver<SequenceEvent>,
    done: oneshot::Receiver<Outcome>,
}

impl SequenceHandle {
    /// Receiver subscribed before the first event, so it sees every event.
    pub fn events(&mut self) -> &mut broadcast::Receiver<SequenceEvent> {
        &mut self.events
    }

    /// Wait for the sequence to end.
    pub async fn wait(self) -> Outcome {
        // The sender only disappears without sending if the drive task was
        // torn down with the runtime.
        self.done.await.unwrap_or(Outcome::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

pub struct Sequencer<T: Target> {
    repo: Arc<dyn Repository<T>>,
    pacing: Pacing,
    settle: Duration,
    capacity: usize,
    registry: Arc<Mutex<Registry>>,
    notify: Option<broadcast::Sender<()>>,
}

impl<T: Target> Clone for Sequencer<T> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            pacing: self.pacing,
            settle: self.settle,
            capacity: self.capacity,
            registry: self.registry.clone(),
            notify: self.notify.clone(),
        }
    }
}

impl<T: Target> Sequencer<T> {
    pub fn new(repo: Arc<dyn Repository<T>>, config: &SequencerConfig) -> Self {
        Self {
            repo,
            pacing: config.pacing,
            settle: config.settle(),
            capacity: config.channel_capacity.max(1),
            registry: Arc::new(Mutex::new(Registry::default())),
            notify: None,
        }
    }

    /// Send `()` on `tx` after every change this sequencer makes to a target.
    pub fn with_notifier(mut self, tx: broadcast::Sender<()>) -> Self {
        self.notify = Some(tx);
        self
    }

    fn changed(&self) {
        if let Some(tx) = &self.notify {
            let _ = tx.send(());
        }
    }

    pub fn repository(&self) -> &Arc<dyn Repository<T>> {
        &self.repo
    }

    /// Start replaying `script` against `target_id`.
    ///
    /// The target enters its in-progress status and loses any prior sequence
    /// output before this returns. If a sequence was already running on the
    /// target it is superseded and can no longer write.
    pub async fn start(&self, target_id: &str, script: Script) -> Result<SequenceHandle> {
        self.start_if(target_id, script, || Ok(())).await
    }

    /// Like [`Sequencer::start`], but `precondition` runs once the registry
    /// lock is held and its error aborts the start. Anything that mutates
    /// the registry (`cancel_all` included) is ordered against the check.
    pub async fn start_if<F>(
        &self,
        target_id: &str,
        script: Script,
        precondition: F,
    ) -> Result<SequenceHandle>
    where
        F: FnOnce() -> Result<()> + Send,
    {
        let mut reg = self.registry.lock().await;
        precondition()?;

        self.repo.update(target_id, &mut |t: &mut T| t.begin())?;

        if let Some(prev) = reg.active.remove(target_id) {
            info!(
                kind = %T::KIND,
                target_id,
                sequence_id = %prev.sequence_id,
                "superseding active sequence"
            );
            prev.finish_cancelled(target_id, CancelReason::Superseded);
        }

        reg.next_generation += 1;
        let generation = reg.next_generation;
        let sequence_id = Uuid::new_v4().to_string();
        let total = script.len();
        let expected = self.pacing.duration_of(&script) + self.settle;

        let (tx, events) = broadcast::channel(self.capacity);
        let (done_tx, done) = oneshot::channel();
        let _ = tx.send(SequenceEvent::Started {
            sequence_id: sequence_id.clone(),
            target_id: target_id.to_string(),
            total,
        });

        let run = DriveTask {
            repo: self.repo.clone(),
            registry: self.registry.clone(),
            target_id: target_id.to_string(),
            sequence_id: sequence_id.clone(),
            generation,
            pacing: self.pacing,
            settle: self.settle,
            notify: self.notify.clone(),
        };
        self.changed();

        // The task cannot write before the entry below is inserted: every
        // write takes the registry lock, which we still hold.
        let handle = tokio::spawn(run.drive(script));

        reg.active.insert(
            target_id.to_string(),
            ActiveSequence {
                sequence_id: sequence_id.clone(),
                generation,
                abort: handle.abort_handle(),
                tx,
                done: done_tx,
                emitted: 0,
                total,
                started_at: Utc::now(),
            },
        );

        info!(
            kind = %T::KIND,
            target_id,
            sequence_id = %sequence_id,
            events = total,
            expected_ms = expected.as_millis() as u64,
            "sequence started"
        );

        Ok(SequenceHandle {
            sequence_id,
            target_id: target_id.to_string(),
            events,
            done,
        })
    }

    /// Cancel the active sequence on `target_id`, if any, and run the
    /// target's interrupt hook. Returns whether a sequence was active.
    pub async fn cancel(&self, target_id: &str) -> Result<bool> {
        let mut reg = self.registry.lock().await;
        let Some(active) = reg.active.remove(target_id) else {
            return Ok(false);
        };
        self.interrupt_and_finish(target_id, active);
        Ok(true)
    }

    /// Cancel every active sequence. Returns how many were cancelled.
    pub async fn cancel_all(&self) -> usize {
        let mut reg = self.registry.lock().await;
        let drained: Vec<(String, ActiveSequence)> = reg.active.drain().collect();
        let count = drained.len();
        for (target_id, active) in drained {
            self.interrupt_and_finish(&target_id, active);
        }
        if count > 0 {
            info!(kind = %T::KIND, count, "cancelled all sequences");
        }
        count
    }

    fn interrupt_and_finish(&self, target_id: &str, active: ActiveSequence) {
        let interrupted = self.repo.update(target_id, &mut |t: &mut T| {
            t.interrupt();
            Ok(())
        });
        if let Err(e) = interrupted {
            warn!(kind = %T::KIND, target_id, error = %e, "interrupt hook failed");
        }
        info!(
            kind = %T::KIND,
            target_id,
            sequence_id = %active.sequence_id,
            emitted = active.emitted,
            total = active.total,
            "sequence cancelled"
        );
        active.finish_cancelled(target_id, CancelReason::Requested);
        self.changed();
    }

    /// Subscribe to the active sequence on `target_id`. Events emitted before
    /// the call are not replayed; read the target for its log so far.
    pub async fn subscribe(&self, target_id: &str) -> Option<broadcast::Receiver<SequenceEvent>> {
        let reg = self.registry.lock().await;
        reg.active.get(target_id).map(|a| a.tx.subscribe())
    }

    pub async fn is_active(&self, target_id: &str) -> bool {
        self.registry.lock().await.active.contains_key(target_id)
    }

    pub async fn active(&self) -> Vec<ActiveSummary> {
        let reg = self.registry.lock().await;
        let mut list: Vec<ActiveSummary> = reg
            .active
            .iter()
            .map(|(id, a)| ActiveSummary {
                kind: T::KIND,
                target_id: id.clone(),
                sequence_id: a.sequence_id.clone(),
                emitted: a.emitted,
                total: a.total,
                started_at: a.started_at,
            })
            .collect();
        list.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        list
    }
}

// ---------------------------------------------------------------------------
// Drive task
// ---------------------------------------------------------------------------

struct DriveTask<T: Target> {
    repo: Arc<dyn Repository<T>>,
    registry: Arc<Mutex<Registry>>,
    target_id: String,
    sequence_id: String,
    generation: u64,
    pacing: Pacing,
    settle: Duration,
    notify: Option<broadcast::Sender<()>>,
}

impl<T: Target> DriveTask<T> {
    fn changed(&self) {
        if let Some(tx) = &self.notify {
            let _ = tx.send(());
        }
    }

    async fn drive(self, script: Script) {
        let total = script.len();

        for (i, event) in script.events().iter().enumerate() {
            tokio::time::sleep(self.pacing.delay_for(event)).await;

            let mut reg = self.registry.lock().await;
            if !reg.is_current(&self.target_id, self.generation) {
                debug!(target_id = %self.target_id, sequence_id = %self.sequence_id, "stale sequence exiting");
                return;
            }

            let line = LogLine::from_event(event);
            let recorded = self.repo.update(&self.target_id, &mut |t: &mut T| {
                t.record(line.clone(), i + 1, total);
                Ok(())
            });
            if let Err(e) = recorded {
                self.abandon(&mut reg, e);
                return;
            }

            if let Some(active) = reg.active.get_mut(&self.target_id) {
                active.emitted = i + 1;
                let _ = active.tx.send(SequenceEvent::Emitted {
                    sequence_id: self.sequence_id.clone(),
                    target_id: self.target_id.clone(),
                    index: i + 1,
                    total,
                    line,
                });
            }
            self.changed();
        }

        tokio::time::sleep(self.settle).await;

        let mut reg = self.registry.lock().await;
        if !reg.is_current(&self.target_id, self.generation) {
            return;
        }

        let mut suffix = Vec::new();
        let resolved = self.repo.update(&self.target_id, &mut |t: &mut T| {
            suffix = t
                .resolution_lines()
                .iter()
                .map(|l| LogLine::now(*l))
                .collect();
            t.resolve(suffix.clone());
            Ok(())
        });
        if let Err(e) = resolved {
            self.abandon(&mut reg, e);
            return;
        }

        if let Some(active) = reg.active.remove(&self.target_id) {
            info!(
                kind = %T::KIND,
                target_id = %self.target_id,
                sequence_id = %self.sequence_id,
                events = total,
                "sequence resolved"
            );
            let _ = active.tx.send(SequenceEvent::Resolved {
                sequence_id: self.sequence_id.clone(),
                target_id: self.target_id.clone(),
                lines: suffix,
            });
            let _ = active.done.send(Outcome::Resolved);
        }
        self.changed();
    }

    /// The target vanished from the repository; drop the run.
    fn abandon(&self, reg: &mut Registry, err: crate::error::NxtgenError) {
        warn!(
            kind = %T::KIND,
            target_id = %self.target_id,
            sequence_id = %self.sequence_id,
            error = %err,
            "target unavailable, abandoning sequence"
        );
        if let Some(active) = reg.active.remove(&self.target_id) {
            let _ = active.tx.send(SequenceEvent::Cancelled {
                sequence_id: self.sequence_id.clone(),
                target_id: self.target_id.clone(),
                reason: CancelReason::TargetRemoved,
            });
            let _ = active.done.send(Outcome::Cancelled);
        }
    }
}

// ---------------------------------------------------------------------------
// Detached playback
// ---------------------------------------------------------------------------

/// A script replayed with no target behind it, such as the terminal demo.
///
/// Observers get the same [`SequenceEvent`]s a target-backed run produces,
/// but nothing is recorded and the resolution carries no suffix lines.
pub struct Playback {
    handle: SequenceHandle,
    task: AbortHandle,
}

impl Playback {
    pub fn events(&mut self) -> &mut broadcast::Receiver<SequenceEvent> {
        self.handle.events()
    }

    /// Aborting the returned handle stops the playback; [`Playback::wait`]
    /// then reports [`Outcome::Cancelled`].
    pub fn stopper(&self) -> AbortHandle {
        self.task.clone()
    }

    pub async fn wait(self) -> Outcome {
        self.handle.wait().await
    }
}

/// Replay `script` under `pacing`. `name` stands in for the target id on
/// every event. Must be called from within a tokio runtime.
pub fn play(name: &str, script: Script, pacing: Pacing, capacity: usize) -> Playback {
    let sequence_id = Uuid::new_v4().to_string();
    let target_id = name.to_string();
    let total = script.len();

    let (tx, events) = broadcast::channel(capacity.max(1));
    let (done_tx, done) = oneshot::channel();
    let _ = tx.send(SequenceEvent::Started {
        sequence_id: sequence_id.clone(),
        target_id: target_id.clone(),
        total,
    });

    let task = {
        let sequence_id = sequence_id.clone();
        let target_id = target_id.clone();
        tokio::spawn(async move {
            for (i, event) in script.events().iter().enumerate() {
                tokio::time::sleep(pacing.delay_for(event)).await;
                let _ = tx.send(SequenceEvent::Emitted {
                    sequence_id: sequence_id.clone(),
                    target_id: target_id.clone(),
                    index: i + 1,
                    total,
                    line: LogLine::from_event(event),
                });
            }
            let _ = tx.send(SequenceEvent::Resolved {
                sequence_id,
                target_id,
                lines: Vec::new(),
            });
            let _ = done_tx.send(Outcome::Resolved);
        })
    };
    debug!(name, sequence_id = %sequence_id, events = total, "playback started");

    Playback {
        handle: SequenceHandle {
            sequence_id,
            target_id,
            events,
            done,
        },
        task: task.abort_handle(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineStep;
    use crate::repository::InMemoryRepository;
    use crate::types::{StepStatus, WorkflowStatus};
    use crate::workflow::Workflow;
    use tokio::time::Instant;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn config() -> SequencerConfig {
        SequencerConfig::default()
    }

    fn workflows() -> (Arc<InMemoryRepository<Workflow>>, Sequencer<Workflow>) {
        let repo = Arc::new(InMemoryRepository::with_items(Workflow::seed()));
        let seq = Sequencer::<Workflow>::new(repo.clone(), &config());
        (repo, seq)
    }

    fn lines(prefix: &str, n: usize, interval: Duration) -> Script {
        (1..=n)
            .map(|i| Event::new(format!("{prefix}{i}"), interval))
            .collect()
    }

    fn texts(w: &Workflow) -> Vec<String> {
        w.troubleshoot_logs.iter().map(|l| l.text.clone()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn five_events_at_700ms_then_resolve() {
        let (repo, seq) = workflows();
        let start = Instant::now();
        let mut handle = seq.start("3", lines("step-", 5, ms(700))).await.unwrap();

        let mut emitted_at = Vec::new();
        let mut resolved_at = None;
        loop {
            match handle.events().recv().await {
                Ok(SequenceEvent::Emitted { .. }) => emitted_at.push(start.elapsed()),
                Ok(SequenceEvent::Resolved { .. }) => {
                    resolved_at = Some(start.elapsed());
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }

        assert_eq!(emitted_at.len(), 5);
        let last = *emitted_at.last().unwrap();
        assert!(last >= ms(3500 - 700) && last <= ms(3500 + 700), "last at {last:?}");
        let resolved_at = resolved_at.expect("resolved");
        assert!(resolved_at - last <= ms(500), "settled after {:?}", resolved_at - last);

        assert_eq!(handle.wait().await, Outcome::Resolved);
        assert_eq!(repo.get("3").unwrap().status, WorkflowStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn line_count_is_script_plus_suffix() {
        let (repo, seq) = workflows();
        let handle = seq.start("3", lines("w", 4, ms(10))).await.unwrap();
        assert_eq!(handle.wait().await, Outcome::Resolved);
        let wf = repo.get("3").unwrap();
        assert_eq!(wf.troubleshoot_logs.len(), 4 + wf.resolution_lines().len());

        let steps = Arc::new(InMemoryRepository::with_items(PipelineStep::seed()));
        let step_seq = Sequencer::<PipelineStep>::new(steps.clone(), &config());
        let handle = step_seq
            .start("kubernetes", lines("k", 3, ms(10)))
            .await
            .unwrap();
        assert_eq!(handle.wait().await, Outcome::Resolved);
        let k8s = steps.get("kubernetes").unwrap();
        assert_eq!(k8s.troubleshoot_logs.len(), 3 + 2);
        assert_eq!(k8s.status, StepStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn status_passes_through_in_progress() {
        let (repo, seq) = workflows();
        assert_eq!(repo.get("3").unwrap().status, WorkflowStatus::Failed);

        let mut handle = seq.start("3", lines("x", 2, ms(100))).await.unwrap();
        assert_eq!(
            repo.get("3").unwrap().status,
            WorkflowStatus::Troubleshooting
        );

        while let Ok(ev) = handle.events().recv().await {
            if !ev.is_terminal() {
                assert_eq!(
                    repo.get("3").unwrap().status,
                    WorkflowStatus::Troubleshooting
                );
            } else {
                break;
            }
        }
        assert_eq!(repo.get("3").unwrap().status, WorkflowStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_discards_in_flight_output() {
        let (repo, seq) = workflows();
        let first = seq.start("3", lines("a", 5, ms(700))).await.unwrap();

        tokio::time::sleep(ms(1500)).await;
        assert_eq!(texts(&repo.get("3").unwrap()), vec!["a1", "a2"]);

        let second = seq.start("3", lines("b", 2, ms(700))).await.unwrap();
        assert!(repo.get("3").unwrap().troubleshoot_logs.is_empty());

        assert_eq!(first.wait().await, Outcome::Superseded);
        assert_eq!(second.wait().await, Outcome::Resolved);

        let wf = repo.get("3").unwrap();
        let got = texts(&wf);
        assert_eq!(&got[..2], &["b1", "b2"]);
        assert_eq!(got.len(), 3);
        assert!(got.iter().all(|t| !t.starts_with('a')));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_emission() {
        let (repo, seq) = workflows();
        let handle = seq.start("3", lines("c", 5, ms(700))).await.unwrap();

        tokio::time::sleep(ms(1000)).await;
        assert!(seq.cancel("3").await.unwrap());
        assert_eq!(handle.wait().await, Outcome::Cancelled);

        let before = repo.get("3").unwrap();
        assert_eq!(before.status, WorkflowStatus::Stopped);
        assert_eq!(texts(&before), vec!["c1"]);

        tokio::time::sleep(ms(10_000)).await;
        assert_eq!(texts(&repo.get("3").unwrap()), vec!["c1"]);
        assert!(!seq.is_active("3").await);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_without_active_sequence_is_noop() {
        let (repo, seq) = workflows();
        assert!(!seq.cancel("3").await.unwrap());
        assert_eq!(repo.get("3").unwrap().status, WorkflowStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_tears_down_every_run() {
        let (repo, seq) = workflows();
        seq.start("1", lines("p", 3, ms(500))).await.unwrap();
        seq.start("3", lines("q", 3, ms(500))).await.unwrap();
        assert_eq!(seq.active().await.len(), 2);

        assert_eq!(seq.cancel_all().await, 2);
        assert!(seq.active().await.is_empty());

        tokio::time::sleep(ms(5_000)).await;
        for id in ["1", "3"] {
            let wf = repo.get(id).unwrap();
            assert_eq!(wf.status, WorkflowStatus::Stopped);
            assert!(wf.troubleshoot_logs.is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_pacing_ignores_event_delays() {
        let repo = Arc::new(InMemoryRepository::with_items(Workflow::seed()));
        let cfg = SequencerConfig {
            pacing: Pacing::Fixed { interval_ms: 100 },
            ..SequencerConfig::default()
        };
        let seq = Sequencer::<Workflow>::new(repo.clone(), &cfg);
        let start = Instant::now();
        let handle = seq.start("3", lines("f", 3, ms(10_000))).await.unwrap();
        assert_eq!(handle.wait().await, Outcome::Resolved);
        assert!(start.elapsed() <= ms(300 + 500 + 50));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_script_resolves_after_settle() {
        let (repo, seq) = workflows();
        let start = Instant::now();
        let handle = seq.start("4", Script::default()).await.unwrap();
        assert_eq!(handle.wait().await, Outcome::Resolved);
        assert!(start.elapsed() >= ms(500));
        let wf = repo.get("4").unwrap();
        assert_eq!(wf.troubleshoot_logs.len(), 1);
        assert_eq!(wf.progress, 100);
    }

    #[tokio::test]
    async fn resolved_target_cannot_start() {
        let (_repo, seq) = workflows();
        let err = seq.start("2", lines("z", 1, ms(1))).await.err().unwrap();
        assert!(matches!(
            err,
            crate::error::NxtgenError::InvalidTransition { .. }
        ));
        assert!(!seq.is_active("2").await);
    }

    #[tokio::test]
    async fn missing_target_is_not_found() {
        let (_repo, seq) = workflows();
        let err = seq.start("404", lines("z", 1, ms(1))).await.err().unwrap();
        assert!(matches!(
            err,
            crate::error::NxtgenError::TargetNotFound { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn independent_targets_run_concurrently() {
        let (repo, seq) = workflows();
        let a = seq.start("1", lines("one", 3, ms(300))).await.unwrap();
        let b = seq.start("3", lines("three", 2, ms(400))).await.unwrap();
        assert_eq!(a.wait().await, Outcome::Resolved);
        assert_eq!(b.wait().await, Outcome::Resolved);
        assert_eq!(repo.get("1").unwrap().troubleshoot_logs.len(), 4);
        assert_eq!(repo.get("3").unwrap().troubleshoot_logs.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn removed_target_abandons_sequence() {
        let (repo, seq) = workflows();
        let handle = seq.start("3", lines("r", 3, ms(200))).await.unwrap();
        repo.remove("3").unwrap();
        assert_eq!(handle.wait().await, Outcome::Cancelled);
        assert!(!seq.is_active("3").await);
    }

    #[tokio::test(start_paused = true)]
    async fn late_subscriber_sees_remaining_events() {
        let (_repo, seq) = workflows();
        let handle = seq.start("3", lines("s", 3, ms(300))).await.unwrap();
        tokio::time::sleep(ms(450)).await;

        let mut rx = seq.subscribe("3").await.expect("active");
        let mut indexes = Vec::new();
        while let Ok(ev) = rx.recv().await {
            match ev {
                SequenceEvent::Emitted { index, .. } => indexes.push(index),
                SequenceEvent::Resolved { lines, .. } => {
                    assert_eq!(lines.len(), 1);
                    break;
                }
                _ => {}
            }
        }
        assert_eq!(indexes, vec![2, 3]);
        assert_eq!(handle.wait().await, Outcome::Resolved);
        assert!(seq.subscribe("3").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn notifier_ticks_on_every_write() {
        let repo = Arc::new(InMemoryRepository::with_items(Workflow::seed()));
        let (tx, mut rx) = broadcast::channel(64);
        let seq = Sequencer::<Workflow>::new(repo, &config()).with_notifier(tx);
        let handle = seq.start("3", lines("n", 2, ms(100))).await.unwrap();
        assert_eq!(handle.wait().await, Outcome::Resolved);

        let mut ticks = 0;
        while rx.try_recv().is_ok() {
            ticks += 1;
        }
        // start, two emissions, resolve
        assert_eq!(ticks, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn start_if_checks_precondition_under_lock() {
        let (repo, seq) = workflows();
        let err = seq
            .start_if("3", lines("g", 2, ms(100)), || {
                Err(crate::error::NxtgenError::Busy("maintenance".into()))
            })
            .await
            .err()
            .unwrap();
        assert!(matches!(err, crate::error::NxtgenError::Busy(_)));
        assert!(!seq.is_active("3").await);
        assert_eq!(repo.get("3").unwrap().status, WorkflowStatus::Failed);

        let handle = seq.start_if("3", lines("g", 2, ms(100)), || Ok(())).await.unwrap();
        assert_eq!(handle.wait().await, Outcome::Resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn playback_emits_every_line_without_a_target() {
        let start = Instant::now();
        let mut playback = play("terminal", lines("t", 3, ms(250)), Pacing::Scripted, 16);
        let mut texts = Vec::new();
        loop {
            match playback.events().recv().await {
                Ok(SequenceEvent::Emitted { line, index, total, .. }) => {
                    assert_eq!(total, 3);
                    assert_eq!(index, texts.len() + 1);
                    texts.push(line.text);
                }
                Ok(SequenceEvent::Resolved { lines, .. }) => {
                    assert!(lines.is_empty());
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        assert_eq!(texts, vec!["t1", "t2", "t3"]);
        assert!(start.elapsed() >= ms(750));
        assert_eq!(playback.wait().await, Outcome::Resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_playback_reports_cancelled() {
        let mut playback = play("terminal", lines("t", 5, ms(1000)), Pacing::Scripted, 16);
        tokio::time::sleep(ms(1500)).await;
        playback.stopper().abort();

        let mut emitted = 0;
        while let Ok(ev) = playback.events().recv().await {
            if let SequenceEvent::Emitted { .. } = ev {
                emitted += 1;
            }
        }
        assert_eq!(emitted, 1);
        assert_eq!(playback.wait().await, Outcome::Cancelled);
    }

    #[test]
    fn duration_of_follows_pacing() {
        let script = lines("d", 4, ms(700));
        assert_eq!(Pacing::Scripted.duration_of(&script), ms(2800));
        assert_eq!(Pacing::Fixed { interval_ms: 10 }.duration_of(&script), ms(40));
    }

    #[test]
    fn pacing_serializes_with_mode_tag() {
        let json = serde_json::to_value(Pacing::Fixed { interval_ms: 700 }).unwrap();
        assert_eq!(json["mode"], "fixed");
        assert_eq!(json["interval_ms"], 700);
        let scripted = serde_json::to_value(Pacing::Scripted).unwrap();
        assert_eq!(scripted["mode"], "scripted");
    }
}
