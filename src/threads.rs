use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crossbeam::channel;
use log::trace;

/// Rows per band so that `height` rows fit in at most `workers` bands.
pub fn band_height(height: usize, workers: usize) -> usize {
    let workers = workers.max(1);
    ((height + workers - 1) / workers).max(1)
}

/// Half-open row ranges covering `0..height` contiguously, at most `workers`
/// of them. Only the last range may be shorter.
pub fn split_rows(height: usize, workers: usize) -> Vec<Range<usize>> {
    let size = band_height(height, workers);
    (0..height)
        .step_by(size)
        .map(|start| start..(start + size).min(height))
        .collect()
}

/// A run of whole image rows together with the exclusive slice of the pixel
/// buffer backing them.
#[derive(Debug)]
pub struct Band<'a> {
    pub rows: Range<usize>,
    pub pixels: &'a mut [u8],
}

pub trait Split<'a> {
    /// Cuts `self` into bands following [`split_rows`]. `row_len` is the
    /// number of bytes in one row.
    fn split_bands(self, row_len: usize, workers: usize) -> Vec<Band<'a>>;
}

impl<'a> Split<'a> for &'a mut [u8] {
    fn split_bands(self, row_len: usize, workers: usize) -> Vec<Band<'a>> {
        if row_len == 0 || self.is_empty() {
            return vec![];
        }
        let height = self.len() / row_len;
        let rows = split_rows(height, workers);
        self.chunks_mut(band_height(height, workers) * row_len)
            .zip(rows)
            .map(|(pixels, rows)| Band { rows, pixels })
            .collect()
    }
}

/// Outcome of one [`WorkerPool::run`] call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    /// Tasks that reported completion.
    pub tasks: usize,
    /// Threads that were started, whether or not they claimed a task.
    pub workers: usize,
}

/// Fixed number of threads draining a shared queue of tasks.
///
/// Threads are spawned per [`WorkerPool::run`] call and joined before it
/// returns; nothing outlives the call.
#[derive(Copy, Clone, Debug)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `f` once for every task, on whichever worker claims it first.
    /// Blocks until every task has reported completion.
    pub fn run<T, F>(&self, tasks: Vec<T>, f: F) -> Completion
    where
        T: Send,
        F: Fn(T) + Sync,
    {
        let total = tasks.len();
        let (task_tx, task_rx) = channel::bounded::<T>(total.max(1));
        let (done_tx, done_rx) = channel::bounded::<usize>(total.max(1));
        for task in tasks {
            // Capacity covers every task and the receiver is still alive.
            if task_tx.send(task).is_err() {
                unreachable!("task queue closed early");
            }
        }
        drop(task_tx);

        let f = &f;
        let started = &AtomicUsize::new(0);
        let tasks = thread::scope(|s| {
            for id in 0..self.workers {
                let task_rx = task_rx.clone();
                let done_tx = done_tx.clone();
                s.spawn(move || {
                    started.fetch_add(1, Ordering::Relaxed);
                    for task in task_rx.iter() {
                        f(task);
                        trace!("worker {} finished a task", id);
                        let _ = done_tx.send(id);
                    }
                });
            }
            drop(done_tx);
            done_rx.iter().take(total).count()
        });
        Completion {
            tasks,
            workers: started.load(Ordering::Relaxed),
        }
    }
}
