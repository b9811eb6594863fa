//! Forwards optimizer events from a blocking producer to one async subscriber.
//!
//! The producer runs the event iterator on tokio's blocking pool and pushes
//! every event into a bounded `mpsc` queue, so it can never run further ahead
//! of the subscriber than the queue capacity. Dropping the subscriber closes
//! the queue; the next send fails and the producer drops the iterator, which
//! stops the search. A producer that panics still delivers a `Finish` with
//! no best candidate, so a subscriber always sees exactly one terminal event.

use std::panic::{AssertUnwindSafe, catch_unwind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::optimization::OptimizerEvent;
use crate::infrastructure::observability::Metrics;

pub const DEFAULT_STREAM_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    NoCandidate,
    Cancelled,
    /// The event source panicked mid-run
    Failed,
}

impl StreamOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamOutcome::Completed => "completed",
            StreamOutcome::NoCandidate => "no_candidate",
            StreamOutcome::Cancelled => "cancelled",
            StreamOutcome::Failed => "failed",
        }
    }
}

/// Receiving end of one streaming run
pub struct ProgressStream {
    run_id: Uuid,
    receiver: mpsc::Receiver<OptimizerEvent>,
    producer: JoinHandle<StreamOutcome>,
}

impl ProgressStream {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Next event in production order, `None` once the producer is done
    pub async fn recv(&mut self) -> Option<OptimizerEvent> {
        self.receiver.recv().await
    }

    /// Disconnects the subscriber and waits for the producer to stop
    pub async fn close(self) -> anyhow::Result<StreamOutcome> {
        drop(self.receiver);
        Ok(self.producer.await?)
    }
}

/// Evaluations covered by the events seen so far
#[derive(Default)]
struct EvaluationTally {
    primary: usize,
    refine: usize,
}

impl EvaluationTally {
    fn observe(&mut self, event: &OptimizerEvent) {
        match event {
            OptimizerEvent::PrimaryStart { .. } => {}
            OptimizerEvent::PrimaryProgress { count, .. } => self.primary = *count,
            OptimizerEvent::PrimaryEnd { count_primary, .. } => self.primary = *count_primary,
            OptimizerEvent::RefineProgress { count, .. } => self.refine = *count,
            OptimizerEvent::Finish {
                tested_phase1,
                tested_phase2,
                ..
            } => {
                self.primary = *tested_phase1;
                self.refine = *tested_phase2;
            }
        }
    }

    fn total(&self) -> usize {
        self.primary + self.refine
    }
}

/// Holds one unit of the `active_streams` gauge for as long as it lives
struct ActiveStreamGuard {
    metrics: Option<Metrics>,
}

impl ActiveStreamGuard {
    fn new(metrics: Option<Metrics>) -> Self {
        if let Some(m) = &metrics {
            m.active_streams.inc();
        }
        Self { metrics }
    }
}

impl Drop for ActiveStreamGuard {
    fn drop(&mut self) {
        if let Some(m) = &self.metrics {
            m.active_streams.dec();
        }
    }
}

/// Sends events until the terminal one, or until the subscriber goes away
fn forward<I>(events: I, sender: &mpsc::Sender<OptimizerEvent>, tally: &mut EvaluationTally) -> StreamOutcome
where
    I: Iterator<Item = OptimizerEvent>,
{
    let mut outcome = StreamOutcome::Completed;
    for event in events {
        tally.observe(&event);
        if let OptimizerEvent::Finish { best: None, .. } = &event {
            outcome = StreamOutcome::NoCandidate;
        }
        let terminal = event.is_terminal();
        if sender.blocking_send(event).is_err() {
            return StreamOutcome::Cancelled;
        }
        if terminal {
            break;
        }
    }
    outcome
}

#[derive(Clone)]
pub struct StreamCoordinator {
    capacity: usize,
    metrics: Option<Metrics>,
}

impl StreamCoordinator {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Starts producing `events` for a single subscriber. Must be called
    /// from within a tokio runtime.
    pub fn spawn<I>(&self, optimizer: &'static str, events: I) -> ProgressStream
    where
        I: Iterator<Item = OptimizerEvent> + Send + 'static,
    {
        let run_id = Uuid::new_v4();
        let (sender, receiver) = mpsc::channel(self.capacity);
        let metrics = self.metrics.clone();

        let active = ActiveStreamGuard::new(metrics.clone());
        info!("StreamCoordinator: Run {} started ({})", run_id, optimizer);

        let producer = tokio::task::spawn_blocking(move || {
            let _active = active;
            let mut tally = EvaluationTally::default();

            let outcome = match catch_unwind(AssertUnwindSafe(|| forward(events, &sender, &mut tally))) {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(
                        "StreamCoordinator: Run {} aborted by a panic after {} evaluations",
                        run_id,
                        tally.total()
                    );
                    let finish = OptimizerEvent::Finish {
                        best: None,
                        tested_phase1: tally.primary,
                        tested_phase2: tally.refine,
                    };
                    // The subscriber may already be gone
                    let _ = sender.blocking_send(finish);
                    StreamOutcome::Failed
                }
            };

            match outcome {
                StreamOutcome::Cancelled => warn!(
                    "StreamCoordinator: Run {} cancelled by subscriber after {} evaluations",
                    run_id,
                    tally.total()
                ),
                _ => debug!(
                    "StreamCoordinator: Run {} finished ({}) after {} evaluations",
                    run_id,
                    outcome.as_str(),
                    tally.total()
                ),
            }

            if let Some(m) = &metrics {
                m.add_evaluations(optimizer, tally.total());
                m.inc_runs(optimizer, outcome.as_str());
            }
            outcome
        });

        ProgressStream {
            run_id,
            receiver,
            producer,
        }
    }
}

impl Default for StreamCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_STREAM_CAPACITY)
    }
}
