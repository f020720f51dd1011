//! Worker pools for blocking execution

use crate::core::{
    context::RunContext,
    error::{Error, Result},
    runnable::RunStream,
};
use rayon::prelude::*;
use std::sync::mpsc::{self, SyncSender};
use tracing::debug;

/// Where a [`WorkerPool`] runs its items
enum Workers {
    Inline,
    /// rayon's global pool, shared by every unbounded call
    Shared,
    Dedicated(rayon::ThreadPool),
}

/// Bounded pool of worker threads for one call
///
/// A pool of size one runs everything on the calling thread.
pub struct WorkerPool {
    workers: Workers,
    size: usize,
}

impl WorkerPool {
    /// Create a dedicated pool with `size` workers
    pub fn new(size: usize) -> Result<Self> {
        let size = size.max(1);
        if size == 1 {
            return Ok(Self::inline());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|index| format!("runnable-worker-{}", index))
            .build()
            .map_err(|e| Error::Worker(format!("Failed to build worker pool: {}", e)))?;

        debug!("Created worker pool with {} threads", size);
        Ok(Self {
            workers: Workers::Dedicated(pool),
            size,
        })
    }

    fn inline() -> Self {
        Self {
            workers: Workers::Inline,
            size: 1,
        }
    }

    /// Pool for `units` pieces of work.
    ///
    /// With a concurrency limit on the context a dedicated pool of that size
    /// is built. Without one the work goes to the shared global pool, which
    /// never grows past the machine's parallelism.
    pub fn for_context(ctx: &RunContext, units: usize) -> Result<Self> {
        match ctx.max_concurrency() {
            Some(limit) => Self::new(limit.min(units)),
            None => {
                let size = units.min(available_parallelism()).max(1);
                if size == 1 {
                    return Ok(Self::inline());
                }
                Ok(Self {
                    workers: Workers::Shared,
                    size,
                })
            }
        }
    }

    /// Upper bound on items running at once
    pub fn size(&self) -> usize {
        self.size
    }

    /// Apply `f` to every item, preserving order. Stops scheduling new items
    /// after the first error and returns it.
    pub fn try_map<T, U, F>(&self, items: Vec<T>, f: F) -> Result<Vec<U>>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> Result<U> + Send + Sync,
    {
        match &self.workers {
            Workers::Dedicated(pool) => pool.install(|| items.into_par_iter().map(f).collect()),
            Workers::Shared => items.into_par_iter().map(f).collect(),
            Workers::Inline => items.into_iter().map(f).collect(),
        }
    }

    /// Apply `f` to every item, preserving order
    pub fn map<T, U, F>(&self, items: Vec<T>, f: F) -> Vec<U>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> U + Send + Sync,
    {
        match &self.workers {
            Workers::Dedicated(pool) => pool.install(|| items.into_par_iter().map(f).collect()),
            Workers::Shared => items.into_par_iter().map(f).collect(),
            Workers::Inline => items.into_iter().map(f).collect(),
        }
    }
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Run blocking work on the runtime's blocking pool
pub async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Worker(format!("Blocking task failed: {}", e)))?
}

/// Drive a producer on its own thread and expose its items as a stream.
///
/// The producer starts on the first pull and hands items over one at a time;
/// it should stop as soon as sending fails, which happens once the stream is
/// dropped.
pub fn stream_detached<T, F>(produce: F) -> RunStream<'static, T>
where
    T: Send + 'static,
    F: FnOnce(SyncSender<Result<T>>) + Send + 'static,
{
    let mut produce = Some(produce);
    let mut receiver: Option<mpsc::Receiver<Result<T>>> = None;

    Box::new(std::iter::from_fn(move || {
        if let Some(produce) = produce.take() {
            let (tx, rx) = mpsc::sync_channel(0);
            let spawned = std::thread::Builder::new()
                .name("runnable-stream".to_string())
                .spawn(move || produce(tx));
            if let Err(e) = spawned {
                return Some(Err(Error::Worker(format!(
                    "Failed to start stream worker: {}",
                    e
                ))));
            }
            receiver = Some(rx);
        }
        receiver.as_ref()?.recv().ok()
    }))
}
