use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of scoring workers. Tasks are pure closures over
/// read-only compiled data, so workers share nothing but the job queue.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = unbounded::<Job>();
        let workers = (0..size)
            .map(|_| {
                let receiver: Receiver<Job> = receiver.clone();
                thread::spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        // A panicking job must not take the worker down;
                        // its result channel closes and the caller sees
                        // a failed outcome.
                        let _ = catch_unwind(AssertUnwindSafe(job));
                    }
                })
            })
            .collect();
        WorkerPool {
            sender: Some(sender),
            workers,
        }
    }

    /// Queue a task and hand back a handle for deadline-bounded collection.
    /// The deadline clock starts at submission.
    pub fn submit<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let submitted = Instant::now();
        if let Some(sender) = &self.sender {
            let job: Job = Box::new(move || {
                let _ = tx.send(task());
            });
            let _ = sender.send(job);
        }
        TaskHandle { rx, submitted }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

pub struct TaskHandle<T> {
    rx: Receiver<T>,
    submitted: Instant,
}

/// Typed per-task outcome; a task that misses its deadline or dies is a
/// recorded non-fatal result, not an error to catch.
#[derive(Debug)]
pub enum TaskOutcome<T> {
    Done(T),
    TimedOut,
    Failed,
}

impl<T> TaskHandle<T> {
    /// Wait for the task's result until `timeout` past submission.
    pub fn join_within(&self, timeout: Duration) -> TaskOutcome<T> {
        match self.rx.recv_deadline(self.submitted + timeout) {
            Ok(value) => TaskOutcome::Done(value),
            Err(RecvTimeoutError::Timeout) => TaskOutcome::TimedOut,
            Err(RecvTimeoutError::Disconnected) => TaskOutcome::Failed,
        }
    }
}
