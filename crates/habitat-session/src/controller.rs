//! Decides when to re-score and which result to publish.
//!
//! Every occupancy change bumps a generation counter and supersedes any
//! evaluation still in flight. Results are tagged with the generation that
//! requested them; only the latest generation is ever published, so a slow
//! evaluation can never overwrite the score of a newer layout.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use habitat_logic::grid::{occupied_cell_count, FloorGrid};
use habitat_logic::scorer::EvaluationResult;

use crate::config::SessionConfig;
use crate::evaluator::{EvaluationError, Evaluator};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScoreStatus {
    #[default]
    Idle,
    Evaluating,
    Ready,
    /// The latest evaluation failed; `result` still holds the last good score.
    Failed(String),
}

/// What the editor layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScoreSnapshot {
    pub generation: u64,
    pub status: ScoreStatus,
    pub result: EvaluationResult,
}

struct Completed {
    generation: u64,
    outcome: Result<EvaluationResult, EvaluationError>,
}

/// Sends the task's outcome when the task ends, however it ends. A task that
/// panics or is aborted before finishing reports `Interrupted`; aborted tasks
/// are always superseded, so that report is discarded as stale.
struct CompletionReport {
    generation: u64,
    completed_tx: mpsc::UnboundedSender<Completed>,
    outcome: Option<Result<EvaluationResult, EvaluationError>>,
}

impl Drop for CompletionReport {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or(Err(EvaluationError::Interrupted));
        // Fails only once the controller itself is gone.
        let _ = self.completed_tx.send(Completed {
            generation: self.generation,
            outcome,
        });
    }
}

pub struct ScoreSessionController<E: Evaluator> {
    evaluator: Arc<E>,
    config: SessionConfig,
    generation: u64,
    pending: bool,
    in_flight: Option<JoinHandle<()>>,
    completed_tx: mpsc::UnboundedSender<Completed>,
    completed_rx: mpsc::UnboundedReceiver<Completed>,
    snapshot_tx: watch::Sender<ScoreSnapshot>,
}

impl<E: Evaluator> ScoreSessionController<E> {
    pub fn new(evaluator: E, config: SessionConfig) -> Self {
        Self::from_shared(Arc::new(evaluator), config)
    }

    pub fn from_shared(evaluator: Arc<E>, config: SessionConfig) -> Self {
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(ScoreSnapshot::default());
        Self {
            evaluator,
            config,
            generation: 0,
            pending: false,
            in_flight: None,
            completed_tx,
            completed_rx,
            snapshot_tx,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Latest issued generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the latest generation is still waiting for its result.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn subscribe(&self) -> watch::Receiver<ScoreSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Schedule a re-evaluation of `floors`, superseding any earlier request.
    ///
    /// An empty habitat publishes a zero result immediately without touching
    /// the evaluator. Must be called from inside a tokio runtime.
    pub fn occupancy_changed(&mut self, floors: &[FloorGrid]) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }

        if occupied_cell_count(floors) == 0 {
            self.pending = false;
            self.snapshot_tx.send_replace(ScoreSnapshot {
                generation,
                status: ScoreStatus::Ready,
                result: EvaluationResult::default(),
            });
            return generation;
        }

        self.pending = true;
        self.snapshot_tx.send_modify(|s| {
            s.generation = generation;
            s.status = ScoreStatus::Evaluating;
        });

        let evaluator = Arc::clone(&self.evaluator);
        let completed_tx = self.completed_tx.clone();
        let floors = floors.to_vec();
        let debounce = self.config.debounce();
        let timeout = self.config.evaluation_timeout();

        self.in_flight = Some(tokio::spawn(async move {
            let mut report = CompletionReport {
                generation,
                completed_tx,
                outcome: None,
            };
            if !debounce.is_zero() {
                tokio::time::sleep(debounce).await;
            }
            report.outcome = Some(
                match tokio::time::timeout(timeout, evaluator.evaluate(floors)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(EvaluationError::TimedOut(timeout)),
                },
            );
        }));
        generation
    }

    /// Wait until the latest requested evaluation has been published.
    pub async fn settle(&mut self) -> ScoreSnapshot {
        while self.pending {
            match self.completed_rx.recv().await {
                Some(completed) => {
                    self.accept(completed);
                }
                None => break,
            }
        }
        self.snapshot()
    }

    /// Publish whatever has finished, without waiting. Returns how many
    /// results were accepted (0 or 1).
    pub fn drain(&mut self) -> usize {
        let mut accepted = 0;
        while let Ok(completed) = self.completed_rx.try_recv() {
            if self.accept(completed) {
                accepted += 1;
            }
        }
        accepted
    }

    fn accept(&mut self, completed: Completed) -> bool {
        if completed.generation != self.generation {
            log::debug!(
                "Discarding stale evaluation for generation {} (latest {})",
                completed.generation,
                self.generation
            );
            return false;
        }

        self.pending = false;
        self.in_flight = None;
        let generation = completed.generation;
        match completed.outcome {
            Ok(result) => {
                log::info!(
                    "Generation {} scored {} ({} worse, {} improvements)",
                    generation,
                    result.score,
                    result.worse_points.len(),
                    result.improvements_points.len()
                );
                self.snapshot_tx.send_replace(ScoreSnapshot {
                    generation,
                    status: ScoreStatus::Ready,
                    result,
                });
            }
            Err(e) => {
                log::warn!("Evaluation for generation {} failed: {}", generation, e);
                self.snapshot_tx.send_modify(|s| {
                    s.generation = generation;
                    s.status = ScoreStatus::Failed(e.to_string());
                });
            }
        }
        true
    }
}

impl<E: Evaluator> Drop for ScoreSessionController<E> {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}
