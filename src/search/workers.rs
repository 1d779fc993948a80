//! The worker pool: a fixed set of OS threads that run searches on private
//! position copies under an idle/condvar lifecycle.
//!
//! A worker is either parked on its condvar (idle) or running a search.
//! `go` hands every worker its own copy of the position and limits and
//! wakes it; `stop` raises advisory stop flags the searchers poll at
//! recursion boundaries; `wait_until_idle` blocks until every worker has
//! parked again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;

use crate::position::Position;
use crate::search::{SearchLimits, Searcher};

struct JobSlot {
    pos: Position,
    limits: SearchLimits,
    idle: bool,
    shutdown: bool,
}

struct WorkerShared {
    job: Mutex<JobSlot>,
    idle_cv: Condvar,
    stop: Arc<AtomicBool>,
}

struct Worker {
    shared: Arc<WorkerShared>,
    handle: Option<thread::JoinHandle<()>>,
}

pub struct WorkerPool {
    workers: Vec<Worker>,
}

fn lock_job(shared: &WorkerShared) -> std::sync::MutexGuard<'_, JobSlot> {
    shared.job.lock().unwrap_or_else(PoisonError::into_inner)
}

fn worker_loop(shared: Arc<WorkerShared>, id: usize) {
    log::debug!("worker {id} started");
    loop {
        let (pos, limits) = {
            let mut job = lock_job(&shared);
            while job.idle && !job.shutdown {
                job = shared
                    .idle_cv
                    .wait(job)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if job.shutdown {
                log::debug!("worker {id} shutting down");
                return;
            }
            (job.pos.clone(), job.limits)
        };

        let mut searcher = Searcher::new(pos, limits, Arc::clone(&shared.stop));
        searcher.search();

        let mut job = lock_job(&shared);
        job.idle = true;
        drop(job);
        shared.idle_cv.notify_all();
    }
}

impl WorkerPool {
    pub fn new(num_workers: usize) -> WorkerPool {
        assert!(num_workers >= 1, "a pool needs at least one worker");
        let workers = (0..num_workers)
            .map(|id| {
                let shared = Arc::new(WorkerShared {
                    job: Mutex::new(JobSlot {
                        pos: Position::new(),
                        limits: SearchLimits::default(),
                        idle: true,
                        shutdown: false,
                    }),
                    idle_cv: Condvar::new(),
                    stop: Arc::new(AtomicBool::new(false)),
                });
                let loop_shared = Arc::clone(&shared);
                let handle = thread::Builder::new()
                    .name(format!("search-{id}"))
                    .spawn(move || worker_loop(loop_shared, id))
                    .expect("failed to spawn search worker");
                Worker {
                    shared,
                    handle: Some(handle),
                }
            })
            .collect();
        WorkerPool { workers }
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Starts every worker on a private copy of `pos` and returns
    /// immediately. The mutex release orders the copied state before the
    /// worker's reads.
    pub fn go(&self, pos: &Position, limits: SearchLimits) {
        for worker in &self.workers {
            worker.shared.stop.store(false, Ordering::Release);
            let mut job = lock_job(&worker.shared);
            job.pos = pos.clone();
            job.limits = limits;
            job.idle = false;
            drop(job);
            worker.shared.idle_cv.notify_all();
        }
    }

    /// Raises every worker's stop flag. Advisory: a running search returns
    /// soon after observing it, with its position intact.
    pub fn stop(&self) {
        for worker in &self.workers {
            worker.shared.stop.store(true, Ordering::Release);
        }
    }

    /// Blocks until every worker is parked on its condvar again.
    pub fn wait_until_idle(&self) {
        for worker in &self.workers {
            let mut job = lock_job(&worker.shared);
            while !job.idle {
                job = worker
                    .shared
                    .idle_cv
                    .wait(job)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.shared.stop.store(true, Ordering::Release);
            let mut job = lock_job(&worker.shared);
            job.shutdown = true;
            drop(job);
            worker.shared.idle_cv.notify_all();
        }
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
    }
}
