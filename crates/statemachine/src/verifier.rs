//! Background checkpoint verification
//!
//! Every freshly frozen fiber is queued here and deserialized on a single
//! dedicated thread, so a checkpoint that cannot be restored is noticed while
//! the node is still running instead of on the next restart.
//!
//! Producers never block: `submit_check` only appends to an unbounded FIFO.
//! Failures are logged with their cause chain and latched into a flag that
//! [`CheckpointVerifier::stop`] returns once the worker has drained the queue.

use crate::error::{Result, StateMachineError};
use crate::state::{FiberSnapshot, FrozenFiber};
use ledgerflow_serialization::{SerializationContext, SerializationEnvironment};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::error::Error as StdError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

enum Job {
    Check(FrozenFiber),
    Finish,
}

#[derive(Default)]
struct JobQueue {
    jobs: Mutex<VecDeque<Job>>,
    ready: Condvar,
}

impl JobQueue {
    fn push(&self, job: Job) {
        self.jobs.lock().push_back(job);
        self.ready.notify_one();
    }

    fn take(&self) -> Job {
        let mut jobs = self.jobs.lock();
        loop {
            if let Some(job) = jobs.pop_front() {
                return job;
            }
            self.ready.wait(&mut jobs);
        }
    }
}

#[derive(Default)]
struct Outcome {
    unrestorable: AtomicBool,
    checks_completed: AtomicU64,
}

enum Lifecycle {
    NotStarted,
    Running(JoinHandle<()>),
    Stopped,
}

/// Single-threaded checkpoint deserialization checker
pub struct CheckpointVerifier {
    queue: Arc<JobQueue>,
    outcome: Arc<Outcome>,
    lifecycle: Mutex<Lifecycle>,
}

impl CheckpointVerifier {
    /// Verifier that has not been started
    pub fn new() -> Self {
        CheckpointVerifier {
            queue: Arc::new(JobQueue::default()),
            outcome: Arc::new(Outcome::default()),
            lifecycle: Mutex::new(Lifecycle::NotStarted),
        }
    }

    /// Start the worker thread
    ///
    /// Every check deserializes with `context`. Starting twice fails with
    /// [`StateMachineError::DoubleStart`], including after `stop`.
    pub fn start(
        &self,
        environment: Arc<SerializationEnvironment>,
        context: SerializationContext,
    ) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        if !matches!(*lifecycle, Lifecycle::NotStarted) {
            return Err(StateMachineError::DoubleStart);
        }
        let queue = Arc::clone(&self.queue);
        let outcome = Arc::clone(&self.outcome);
        let handle = thread::Builder::new()
            .name("checkpoint-verifier".to_string())
            .spawn(move || run(&queue, &outcome, &environment, &context))
            .map_err(StateMachineError::Spawn)?;
        info!("checkpoint verifier started");
        *lifecycle = Lifecycle::Running(handle);
        Ok(())
    }

    /// Queue a frozen fiber for verification; never blocks on the worker
    pub fn submit_check(&self, fiber: FrozenFiber) {
        self.queue.push(Job::Check(fiber));
    }

    /// Finish the queued checks, join the worker and report whether any
    /// checkpoint was unrestorable
    ///
    /// Checks submitted after `stop` are never run.
    pub fn stop(&self) -> bool {
        let previous = std::mem::replace(&mut *self.lifecycle.lock(), Lifecycle::Stopped);
        if let Lifecycle::Running(handle) = previous {
            self.queue.push(Job::Finish);
            if handle.join().is_err() {
                error!("checkpoint verifier thread panicked");
                self.outcome.unrestorable.store(true, Ordering::SeqCst);
            }
            info!(
                checks = self.checks_completed(),
                unrestorable = self.found_unrestorable(),
                "checkpoint verifier stopped"
            );
        }
        self.found_unrestorable()
    }

    /// True once any check has failed
    pub fn found_unrestorable(&self) -> bool {
        self.outcome.unrestorable.load(Ordering::SeqCst)
    }

    /// Number of checks the worker has finished
    pub fn checks_completed(&self) -> u64 {
        self.outcome.checks_completed.load(Ordering::SeqCst)
    }

    /// True while the worker runs
    pub fn is_running(&self) -> bool {
        matches!(*self.lifecycle.lock(), Lifecycle::Running(_))
    }
}

impl Default for CheckpointVerifier {
    fn default() -> Self {
        Self::new()
    }
}

fn run(
    queue: &JobQueue,
    outcome: &Outcome,
    environment: &SerializationEnvironment,
    context: &SerializationContext,
) {
    loop {
        match queue.take() {
            Job::Check(fiber) => {
                match environment.deserialize::<FiberSnapshot>(fiber.as_bytes(), context) {
                    Ok(snapshot) => {
                        debug!(flow = %snapshot.flow_id, bytes = fiber.len(), "checkpoint restorable");
                    }
                    Err(e) => {
                        error!(
                            checkpoint = %fiber.hash(),
                            error = %e,
                            causes = %cause_chain(&e),
                            "encountered unrestorable checkpoint"
                        );
                        outcome.unrestorable.store(true, Ordering::SeqCst);
                    }
                }
                outcome.checks_completed.fetch_add(1, Ordering::SeqCst);
            }
            Job::Finish => return,
        }
    }
}

fn cause_chain(error: &dyn StdError) -> String {
    let mut causes = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    if causes.is_empty() {
        "none".to_string()
    } else {
        causes.join(": ")
    }
}
