// vexel/renderer/src/concurrent.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The fixed worker pool and cancellation tokens.

use crossbeam_channel::{bounded, Receiver, Sender};
use log::debug;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

/// A cooperative cancellation flag shared between a render caller and the
/// worker pool.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[inline]
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// State shared by one `execute_all` call. Workers pull indices until the
/// batch drains; the last completion wakes the submitting thread.
struct Batch {
    // Borrowed from the `execute_all` frame. The submitting thread does not
    // return until `completed == count`, so the borrow outlives every
    // worker access despite the erased lifetime.
    task: *const (dyn Fn(usize) + Sync),
    next: AtomicUsize,
    completed: AtomicUsize,
    count: usize,
    done: Mutex<bool>,
    condvar: Condvar,
}

unsafe impl Send for Batch {}
unsafe impl Sync for Batch {}

impl Batch {
    fn run(&self) {
        loop {
            let index = self.next.fetch_add(1, Ordering::Relaxed);
            if index >= self.count {
                return;
            }
            let task = unsafe { &*self.task };
            task(index);
            if self.completed.fetch_add(1, Ordering::AcqRel) + 1 == self.count {
                let mut done = self.done.lock().unwrap();
                *done = true;
                self.condvar.notify_all();
            }
        }
    }
}

/// A fixed-size pool of worker threads sharing a bounded work queue.
///
/// `execute_all` is a fork-join barrier: it distributes `count` index tasks
/// across the workers (the calling thread participates as well) and returns
/// only after every task has run exactly once. After `close`, no further
/// batches are dispatched to workers; `execute_all` then degrades to running
/// inline on the caller.
pub struct WorkerPool {
    sender: Option<Sender<Arc<Batch>>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// `worker_count == 0` selects the host's available parallelism.
    pub fn new(worker_count: usize) -> WorkerPool {
        let worker_count = if worker_count == 0 {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            worker_count
        };
        let (sender, receiver): (Sender<Arc<Batch>>, Receiver<Arc<Batch>>) =
            bounded(worker_count * 4);
        let workers = (0..worker_count)
            .map(|index| {
                let receiver = receiver.clone();
                thread::Builder::new()
                    .name(format!("vexel-worker-{}", index))
                    .spawn(move || {
                        while let Ok(batch) = receiver.recv() {
                            batch.run();
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();
        debug!("worker pool started with {} threads", worker_count);
        WorkerPool { sender: Some(sender), workers }
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.sender.is_none()
    }

    /// Runs `task(i)` for every `i` in `0..count`, blocking until all have
    /// completed.
    pub fn execute_all(&self, count: usize, task: &(dyn Fn(usize) + Sync)) {
        if count == 0 {
            return;
        }
        let batch = Arc::new(Batch {
            task: unsafe {
                std::mem::transmute::<&(dyn Fn(usize) + Sync), &'static (dyn Fn(usize) + Sync)>(
                    task,
                ) as *const _
            },
            next: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            count,
            done: Mutex::new(false),
            condvar: Condvar::new(),
        });

        if let Some(ref sender) = self.sender {
            // One handle per worker; whoever drains the index counter first
            // wins. Submission blocks when the queue is full.
            for _ in 0..self.workers.len() {
                if sender.send(batch.clone()).is_err() {
                    break;
                }
            }
        }

        // The calling thread works too, which also guarantees completion
        // when the pool is closed or has no spare workers.
        batch.run();

        let mut done = batch.done.lock().unwrap();
        while !*done {
            done = batch.condvar.wait(done).unwrap();
        }
    }

    /// Runs `factory(i)` for every index in parallel and collects the
    /// results in index order.
    pub fn build_vector<T, F>(&self, count: usize, factory: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync,
    {
        struct Slots<'a, T>(&'a [UnsafeCell<Option<T>>]);
        // Each slot is written exactly once, by the single worker that owns
        // its index.
        unsafe impl<'a, T: Send> Sync for Slots<'a, T> {}

        let slots: Vec<UnsafeCell<Option<T>>> =
            (0..count).map(|_| UnsafeCell::new(None)).collect();
        let shared = Slots(&slots);
        self.execute_all(count, &|index| {
            let slot = shared.0[index].get();
            unsafe {
                *slot = Some(factory(index));
            }
        });
        slots
            .into_iter()
            .map(|slot| slot.into_inner().expect("worker pool dropped a task"))
            .collect()
    }

    /// Shuts the pool down and joins every worker. Idempotent; after close,
    /// `execute_all` runs inline on the caller.
    pub fn close(&mut self) {
        if let Some(sender) = self.sender.take() {
            drop(sender);
            for worker in self.workers.drain(..) {
                let _ = worker.join();
            }
            debug!("worker pool closed");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.close();
    }
}
