use crate::ScopeError;
use futures::future::BoxFuture;
use once_cell::sync::OnceCell;
use std::{future::Future, sync::mpsc as std_mpsc, thread};
use tokio::{
    runtime::{Builder, Handle, Runtime, RuntimeFlavor},
    sync::mpsc,
    task::JoinSet,
};
use tracing::debug;

const WORKER_NAME: &str = "request-scope-worker";

type Job = BoxFuture<'static, ()>;

fn unavailable(reason: impl ToString) -> ScopeError {
    ScopeError::WorkerUnavailable {
        reason: reason.to_string(),
    }
}

fn current_thread_runtime() -> Result<Runtime, ScopeError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(unavailable)
}

struct Worker {
    jobs: mpsc::UnboundedSender<Job>,
}

impl Worker {
    fn start() -> Result<Self, ScopeError> {
        let runtime = current_thread_runtime()?;
        let (jobs, mut receiver) = mpsc::unbounded_channel::<Job>();

        thread::Builder::new()
            .name(WORKER_NAME.to_owned())
            .spawn(move || {
                runtime.block_on(async move {
                    let mut running = JoinSet::new();
                    loop {
                        tokio::select! {
                            job = receiver.recv() => match job {
                                Some(job) => {
                                    running.spawn(job);
                                }
                                None => break,
                            },
                            Some(_) = running.join_next(), if !running.is_empty() => {}
                        }
                    }

                    // Let in-flight jobs finish before the runtime goes away
                    while running.join_next().await.is_some() {}
                });
                debug!("request scope worker stopped");
            })
            .map_err(unavailable)?;

        debug!("request scope worker started");
        Ok(Worker { jobs })
    }
}

/// Runs async work on behalf of synchronous callers.
///
/// Services are created synchronously, but some scoped resources can only be
/// entered asynchronously. Blocking on such a future from inside an async
/// runtime would stall or panic, so the future is handed to a dedicated
/// worker thread with its own runtime and the caller waits for the result.
/// The worker is started the first time it is needed and lives as long as the
/// bridge. Each job runs as its own task on the worker, so one slow job never
/// holds up another.
#[derive(Default)]
pub struct AsyncBridge {
    worker: OnceCell<Worker>,
}

impl AsyncBridge {
    /// Creates a bridge. The worker thread is not started yet.
    #[must_use]
    pub fn new() -> Self {
        AsyncBridge::default()
    }

    /// Checks whether the worker thread has been started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.worker.get().is_some()
    }

    /// Runs a future to completion and returns its output, blocking the
    /// calling thread.
    ///
    /// If the calling thread is not inside a tokio runtime, the future is
    /// driven inline on a temporary runtime. Otherwise, it runs on the worker.
    /// On a multi-threaded runtime the wait happens inside
    /// [`block_in_place`](tokio::task::block_in_place) so other tasks on the
    /// runtime keep making progress.
    pub fn block_on<F>(&self, future: F) -> Result<F::Output, ScopeError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let Ok(handle) = Handle::try_current() else {
            return Ok(current_thread_runtime()?.block_on(future));
        };

        if thread::current().name() == Some(WORKER_NAME) {
            return Err(unavailable("the worker cannot wait on itself"));
        }

        let (sender, receiver) = std_mpsc::sync_channel(1);
        self.submit(Box::pin(async move {
            // The caller may have given up waiting
            let _ = sender.send(future.await);
        }))?;

        let wait = || {
            receiver
                .recv()
                .map_err(|_| unavailable("the job was dropped before finishing"))
        };
        match handle.runtime_flavor() {
            RuntimeFlavor::MultiThread => tokio::task::block_in_place(wait),
            _ => wait(),
        }
    }

    /// Runs a future on the worker without waiting for it.
    pub fn spawn<F>(&self, future: F) -> Result<(), ScopeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.submit(Box::pin(future))
    }

    fn submit(&self, job: Job) -> Result<(), ScopeError> {
        self.worker
            .get_or_try_init(Worker::start)?
            .jobs
            .send(job)
            .map_err(|_| unavailable("the worker has stopped"))
    }
}
