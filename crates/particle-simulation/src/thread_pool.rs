//! Minimal spin-waiting thread pool
//!
//! A fixed set of workers polls a shared FIFO of boxed tasks. Completion is
//! tracked with a pending counter that callers spin on (`await_drain`), which
//! gives a hard barrier between simulation phases.

use std::collections::VecDeque;
use std::io;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// A unit of work
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Thread-safe FIFO of tasks with a pending count for completion barriers
#[derive(Default)]
pub struct TaskQueue {
    tasks: Mutex<VecDeque<Task>>,
    pending: AtomicUsize,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task and count it as pending
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) {
        self.push(Box::new(task));
    }

    fn push(&self, task: Task) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        self.pending.fetch_add(1, Ordering::AcqRel);
        tasks.push_back(task);
    }

    /// Pop the oldest task without blocking
    pub fn try_take(&self) -> Option<Task> {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Spin (yielding) until every submitted task has finished executing
    pub fn await_drain(&self) {
        while self.pending.load(Ordering::Acquire) > 0 {
            thread::yield_now();
        }
    }

    /// Retire one task; called after the task has run
    pub fn mark_done(&self) {
        self.pending.fetch_sub(1, Ordering::AcqRel);
    }

    /// Tasks submitted but not yet retired
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

/// Run a task taken from the queue and retire it, even if it panics
fn run_task(queue: &TaskQueue, task: Task) {
    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
        log::error!("Pooled task panicked");
    }
    queue.mark_done();
}

/// One dedicated thread executing tasks from a shared queue
pub struct Worker {
    id: usize,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn(id: usize, queue: Arc<TaskQueue>) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name(format!("verlet-worker-{id}"))
            .spawn(move || {
                while flag.load(Ordering::Acquire) {
                    match queue.try_take() {
                        Some(task) => run_task(&queue, task),
                        None => thread::yield_now(),
                    }
                }
            })?;

        Ok(Self {
            id,
            running,
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Ask the loop to exit and join the thread
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Worker {} terminated abnormally", self.id);
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Fixed-size pool of workers sharing one task queue
pub struct ThreadPool {
    queue: Arc<TaskQueue>,
    workers: Vec<Worker>,
}

impl ThreadPool {
    /// Spawn `thread_count` workers (at least one)
    pub fn new(thread_count: usize) -> io::Result<Self> {
        if thread_count == 0 {
            log::warn!("Thread pool needs at least one worker, using 1");
        }
        let thread_count = thread_count.max(1);
        let queue = Arc::new(TaskQueue::new());
        let workers = (0..thread_count)
            .map(|id| Worker::spawn(id, Arc::clone(&queue)))
            .collect::<io::Result<Vec<_>>>()?;

        log::info!("Spawned {} worker threads", workers.len());
        Ok(Self { queue, workers })
    }

    /// One worker per available hardware thread
    pub fn with_available_parallelism() -> io::Result<Self> {
        let count = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self::new(count)
    }

    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Run `f` with a [`Scope`] whose tasks may borrow from the caller
    ///
    /// Returns once every task submitted through the scope has finished, also when
    /// `f` unwinds. A panic in any of this scope's tasks is re-raised here after
    /// the drain; panics of other scopes or unscoped tasks are not.
    pub fn scope<'env, F, R>(&self, f: F) -> R
    where
        F: for<'scope> FnOnce(&'scope Scope<'scope, 'env>) -> R,
    {
        let scope = Scope {
            queue: &self.queue,
            panicked: AtomicBool::new(false),
            scope: PhantomData,
            env: PhantomData,
        };
        let drain = DrainGuard(&self.queue);
        let result = f(&scope);
        drop(drain);

        if scope.panicked.load(Ordering::Acquire) {
            panic!("a task submitted to the thread pool panicked");
        }
        result
    }

    /// Apply `callback(start, end)` to contiguous slices covering `[0, count)`
    ///
    /// The range is cut into `thread_count` equal slices, one task each. The
    /// remainder of an uneven split runs on the calling thread. Returns after all
    /// slices are done. `callback` must not call back into the pool.
    pub fn parallel_for<F>(&self, count: usize, callback: F)
    where
        F: Fn(usize, usize) + Sync,
    {
        let threads = self.thread_count();
        let slice_size = count / threads;
        let callback = &callback;

        self.scope(|scope| {
            if slice_size > 0 {
                for i in 0..threads {
                    let start = i * slice_size;
                    let end = start + slice_size;
                    scope.submit(move || callback(start, end));
                }
            }
            if slice_size * threads < count {
                callback(slice_size * threads, count);
            }
        });
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        for worker in &mut self.workers {
            worker.stop();
        }
        log::debug!("Thread pool stopped");
    }
}

/// Handle for submitting tasks that borrow data living at least as long as `'env`
pub struct Scope<'scope, 'env: 'scope> {
    queue: &'scope TaskQueue,
    panicked: AtomicBool,
    scope: PhantomData<&'scope mut &'scope ()>,
    env: PhantomData<&'env mut &'env ()>,
}

impl<'scope, 'env> Scope<'scope, 'env> {
    pub fn submit<F>(&'scope self, task: F)
    where
        F: FnOnce() + Send + 'scope,
    {
        let panicked = &self.panicked;
        let task: Box<dyn FnOnce() + Send + 'scope> = Box::new(move || {
            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                log::error!("Scoped task panicked");
                panicked.store(true, Ordering::Release);
            }
        });
        // SAFETY: `ThreadPool::scope` drains the queue before `'scope` ends, also
        // while unwinding, so the task never outlives the data it borrows.
        let task: Task = unsafe {
            std::mem::transmute::<Box<dyn FnOnce() + Send + 'scope>, Task>(task)
        };
        self.queue.push(task);
    }
}

struct DrainGuard<'a>(&'a TaskQueue);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.await_drain();
    }
}
