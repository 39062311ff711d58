//! Task runner and the executors that drive it.
//!
//! The runner applies one task with the handler registered for its kind and
//! writes the terminal status back to the store. Executors decide *when* that
//! happens: [`InlineExecutor`] right after enqueue, [`BackgroundExecutor`] on a
//! worker thread that polls the queue.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::store::{TaskStore, TaskStoreError};
use super::types::{MatrixUpdateTask, TaskId, TaskKind, TaskResult, TaskStatus};

/// Task handler function type.
pub type TaskHandler = Box<dyn Fn(&MatrixUpdateTask) -> TaskResult + Send + Sync>;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often to poll for new tasks
    pub poll_interval: Duration,
    /// Thread name, also used for logging
    pub name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            name: "matrix-worker".to_string(),
        }
    }
}

impl WorkerConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Worker runtime statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct WorkerStats {
    pub tasks_processed: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub uptime_secs: u64,
}

/// Runs tasks with registered handlers.
pub struct TaskRunner<S: TaskStore> {
    store: S,
    handlers: HashMap<TaskKind, TaskHandler>,
}

impl<S: TaskStore> TaskRunner<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a task kind.
    pub fn register_handler<F>(&mut self, kind: TaskKind, handler: F)
    where
        F: Fn(&MatrixUpdateTask) -> TaskResult + Send + Sync + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply one pending task and persist its terminal status.
    ///
    /// A handler failure is recorded on the task and returned as `Ok`; only
    /// queue failures are errors.
    pub fn run(&self, task: &mut MatrixUpdateTask) -> Result<TaskStatus, TaskStoreError> {
        if !task.is_pending() {
            return Ok(task.status.clone());
        }

        let result = match self.handlers.get(&task.kind) {
            Some(handler) => handler(task),
            None => {
                warn!(task_id = %task.id, kind = task.kind.type_name(), "no handler for task");
                TaskResult::failure(format!("no handler for task kind: {}", task.kind.type_name()))
            }
        };

        match result {
            TaskResult::Success { applied } => {
                task.mark_completed(applied)?;
                self.store.update(task)?;
                info!(task_id = %task.id, applied, "matrix task completed");
            }
            TaskResult::Failure { error, applied } => {
                warn!(task_id = %task.id, applied, error = %error, "matrix task failed");
                task.mark_failed(error, applied)?;
                self.store.update(task)?;
            }
        }

        Ok(task.status.clone())
    }

    /// Load and run one task by id.
    pub fn run_by_id(&self, task_id: TaskId) -> Result<TaskStatus, TaskStoreError> {
        let mut task = self
            .store
            .get(task_id)?
            .ok_or(TaskStoreError::NotFound(task_id))?;
        self.run(&mut task)
    }
}

/// Decides when a freshly enqueued task gets applied.
pub trait TaskExecutor: Send + Sync {
    /// Called once the task record has been written to the queue.
    fn submit(&self, task_id: TaskId) -> Result<(), TaskStoreError>;

    /// Stop any background work. Idempotent.
    fn shutdown(&self) {}

    /// Runtime statistics, when the executor keeps any.
    fn stats(&self) -> Option<WorkerStats> {
        None
    }
}

/// Applies each task synchronously inside `submit`.
pub struct InlineExecutor<S: TaskStore> {
    runner: Arc<TaskRunner<S>>,
}

impl<S: TaskStore> InlineExecutor<S> {
    pub fn new(runner: Arc<TaskRunner<S>>) -> Self {
        Self { runner }
    }
}

impl<S: TaskStore> TaskExecutor for InlineExecutor<S> {
    fn submit(&self, task_id: TaskId) -> Result<(), TaskStoreError> {
        let status = self.runner.run_by_id(task_id)?;
        debug!(task_id = %task_id, status = status.name(), "task applied inline");
        Ok(())
    }
}

/// Handle to control a running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<WorkerStats>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    /// Get current worker statistics.
    pub fn stats(&self) -> WorkerStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn stop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn a worker thread that drains the queue until shut down.
pub fn spawn_worker<S>(runner: Arc<TaskRunner<S>>, config: WorkerConfig) -> std::io::Result<WorkerHandle>
where
    S: TaskStore + 'static,
{
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
    let stats = Arc::new(Mutex::new(WorkerStats::default()));
    let stats_clone = stats.clone();

    let join = thread::Builder::new()
        .name(config.name.clone())
        .spawn(move || worker_loop(&runner, &config, &shutdown_rx, &stats_clone))?;

    Ok(WorkerHandle {
        shutdown: shutdown_tx,
        join: Some(join),
        stats,
    })
}

fn update_stats(stats: &Mutex<WorkerStats>, f: impl FnOnce(&mut WorkerStats)) {
    if let Ok(mut s) = stats.lock() {
        f(&mut s);
    }
}

fn worker_loop<S: TaskStore>(
    runner: &TaskRunner<S>,
    config: &WorkerConfig,
    shutdown_rx: &mpsc::Receiver<()>,
    stats: &Mutex<WorkerStats>,
) {
    info!(worker = %config.name, "matrix worker started");
    let start_time = Instant::now();

    loop {
        // Check for shutdown
        match shutdown_rx.try_recv() {
            Ok(()) | Err(mpsc::TryRecvError::Disconnected) => break,
            Err(mpsc::TryRecvError::Empty) => {}
        }

        update_stats(stats, |s| s.uptime_secs = start_time.elapsed().as_secs());

        match runner.store().claim_next() {
            Ok(Some(mut task)) => {
                debug!(worker = %config.name, task_id = %task.id, "claimed task");
                match runner.run(&mut task) {
                    Ok(status) => update_stats(stats, |s| {
                        s.tasks_processed += 1;
                        match status {
                            TaskStatus::Completed => s.tasks_completed += 1,
                            TaskStatus::Failed { .. } => s.tasks_failed += 1,
                            TaskStatus::Pending => {}
                        }
                    }),
                    Err(e) => {
                        error!(worker = %config.name, task_id = %task.id, error = %e, "failed to record task outcome");
                        thread::sleep(config.poll_interval);
                    }
                }
            }
            Ok(None) => {
                // Nothing queued; wait for work or shutdown
                match shutdown_rx.recv_timeout(config.poll_interval) {
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                }
            }
            Err(e) => {
                error!(worker = %config.name, error = %e, "failed to claim task");
                thread::sleep(config.poll_interval);
            }
        }
    }

    info!(worker = %config.name, "matrix worker stopped");
}

/// Leaves tasks to a worker thread; `submit` returns immediately.
pub struct BackgroundExecutor {
    handle: Mutex<Option<WorkerHandle>>,
}

impl BackgroundExecutor {
    pub fn spawn<S>(runner: Arc<TaskRunner<S>>, config: WorkerConfig) -> std::io::Result<Self>
    where
        S: TaskStore + 'static,
    {
        Ok(Self {
            handle: Mutex::new(Some(spawn_worker(runner, config)?)),
        })
    }
}

impl TaskExecutor for BackgroundExecutor {
    fn submit(&self, task_id: TaskId) -> Result<(), TaskStoreError> {
        debug!(task_id = %task_id, "task queued for background worker");
        Ok(())
    }

    fn shutdown(&self) {
        let handle = self.handle.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle {
            handle.shutdown();
        }
    }

    fn stats(&self) -> Option<WorkerStats> {
        let guard = self.handle.lock().ok()?;
        guard.as_ref().map(WorkerHandle::stats)
    }
}
