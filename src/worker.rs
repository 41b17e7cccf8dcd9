//! Background inference: one thread owns the classifier and the fusion rules.
//!
//! The engine hands over a copy of each full window together with the
//! evidence captured at that moment. The job queue is bounded; when the worker
//! falls behind, new windows are dropped and counted instead of blocking the
//! sample pump.

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::classifier::Classifier;
use crate::error::{WResult, WalkStandError};
use crate::fusion::{FusionEngine, FusionEvidence, FusionOutput};

/// One full window ready for classification.
#[derive(Debug, Clone)]
pub struct WindowJob {
    pub features: Vec<f32>,
    pub evidence: FusionEvidence,
    pub window_seq: u64,
    pub run_id: u64,
}

/// What the worker sends back for each job it processed.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutcome {
    Output(FusionOutput),
    Failed { window_seq: u64, run_id: u64, error: WalkStandError },
}

impl InferenceOutcome {
    pub fn run_id(&self) -> u64 {
        match self {
            InferenceOutcome::Output(out) => out.run_id,
            InferenceOutcome::Failed { run_id, .. } => *run_id,
        }
    }
}

pub struct InferenceWorker {
    jobs: Option<Sender<WindowJob>>,
    handle: Option<JoinHandle<()>>,
    submitted: u64,
    dropped: u64,
    processed: Arc<AtomicU64>,
}

impl InferenceWorker {
    /// Start the worker thread. Outcomes arrive on the returned receiver.
    pub fn spawn(
        mut classifier: Box<dyn Classifier>,
        fusion: FusionEngine,
        queue_depth: usize,
    ) -> WResult<(Self, Receiver<InferenceOutcome>)> {
        let (job_tx, job_rx) = channel::bounded::<WindowJob>(queue_depth.max(1));
        let (out_tx, out_rx) = channel::unbounded::<InferenceOutcome>();
        let processed = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&processed);

        let handle = thread::Builder::new()
            .name("inference".to_string())
            .spawn(move || {
                for job in job_rx.iter() {
                    let outcome = run_job(classifier.as_mut(), &fusion, &job);
                    counter.fetch_add(1, Ordering::Relaxed);
                    if out_tx.send(outcome).is_err() {
                        debug!("Result receiver gone, inference worker exiting");
                        break;
                    }
                }
            })
            .map_err(|e| WalkStandError::Internal(format!("failed to spawn inference worker: {e}")))?;

        info!("Inference worker started (queue depth {})", queue_depth.max(1));
        Ok((
            Self {
                jobs: Some(job_tx),
                handle: Some(handle),
                submitted: 0,
                dropped: 0,
                processed,
            },
            out_rx,
        ))
    }

    /// Queue a window. Returns `Ok(false)` if the queue was full and the
    /// window was dropped.
    pub fn submit(&mut self, job: WindowJob) -> WResult<bool> {
        let jobs = self.jobs.as_ref().ok_or(WalkStandError::WorkerDisconnected)?;
        match jobs.try_send(job) {
            Ok(()) => {
                self.submitted += 1;
                Ok(true)
            }
            Err(TrySendError::Full(job)) => {
                self.dropped += 1;
                warn!(
                    "Inference queue full, dropping window {} ({} dropped so far)",
                    job.window_seq, self.dropped
                );
                Ok(false)
            }
            Err(TrySendError::Disconnected(_)) => Err(WalkStandError::WorkerDisconnected),
        }
    }

    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Close the queue and wait for in-flight jobs to finish.
    pub fn shutdown(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Inference worker panicked");
            }
        }
    }
}

impl Drop for InferenceWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_job(classifier: &mut dyn Classifier, fusion: &FusionEngine, job: &WindowJob) -> InferenceOutcome {
    let result = classifier
        .predict(&job.features)
        .and_then(|scores| fusion.decide(&scores, &job.evidence, job.window_seq, job.run_id));

    match result {
        Ok(output) => {
            debug!("Window {} → {} ({:?})", job.window_seq, output.label, output.decision);
            InferenceOutcome::Output(output)
        }
        Err(error) => {
            warn!("Window {} dropped: {}", job.window_seq, error);
            InferenceOutcome::Failed { window_seq: job.window_seq, run_id: job.run_id, error }
        }
    }
}
