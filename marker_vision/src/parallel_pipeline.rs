// THEORY:
// Batch analysis for many images at once. Each image is independent and the grid
// is read-only, so images are fanned out over a fixed pool of blocking workers
// with no shared mutable state. A single dispatcher task hands tasks to workers
// round-robin; every task carries its own oneshot channel for the reply.
//
// The pool must be created inside a tokio runtime.

use crate::core_modules::sample_grid::PixelGrid;
use crate::error::{Result, VisionError};
use crate::pipeline::{MarkerPipeline, PipelineConfig, Report};
use futures::future::join_all;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct AnalysisTask {
    pub grid: PixelGrid,
    pub result_sender: oneshot::Sender<Report>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<AnalysisTask>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns one worker per logical CPU.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_workers(config, num_cpus::get())
    }

    pub fn with_workers(config: PipelineConfig, worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(VisionError::InvalidConfig {
                field: "worker_count",
                reason: "a pool needs at least one worker".to_string(),
            });
        }
        let pipeline = MarkerPipeline::new(config)?;

        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<AnalysisTask>();
        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<AnalysisTask>())
            .unzip();

        let dispatcher = tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(task).is_err() {
                    warn!(worker_idx, "worker stopped, dropping task");
                }
                worker_idx = (worker_idx + 1) % worker_senders.len();
            }
        });

        let workers = worker_receivers
            .into_iter()
            .enumerate()
            .map(|(worker_idx, mut worker_receiver)| {
                let pipeline = pipeline.clone();
                tokio::task::spawn_blocking(move || {
                    while let Some(task) = worker_receiver.blocking_recv() {
                        let report = pipeline.analyze(&task.grid);
                        if task.result_sender.send(report).is_err() {
                            debug!(worker_idx, "caller went away before the report was ready");
                        }
                    }
                })
            })
            .collect();

        Ok(Self {
            task_sender,
            dispatcher,
            workers,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub async fn process(&self, grid: PixelGrid) -> Result<Report> {
        let (result_sender, result_receiver) = oneshot::channel();

        self.task_sender
            .send(AnalysisTask {
                grid,
                result_sender,
            })
            .map_err(|_| VisionError::WorkerUnavailable("failed to send task to worker pool"))?;

        result_receiver
            .await
            .map_err(|_| VisionError::WorkerUnavailable("failed to receive result from worker"))
    }

    /// Analyzes every grid concurrently. Results keep the input order.
    pub async fn process_all(&self, grids: Vec<PixelGrid>) -> Vec<Result<Report>> {
        join_all(grids.into_iter().map(|grid| self.process(grid))).await
    }

    /// Stops accepting tasks and waits for queued work to drain.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        if let Err(err) = self.dispatcher.await {
            warn!(%err, "dispatcher task failed");
        }
        for worker in self.workers {
            if let Err(err) = worker.await {
                warn!(%err, "worker task failed");
            }
        }
    }
}
