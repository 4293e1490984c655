use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use tracing::debug;
use wavelog_types::Status;

type Callback<T> = Box<dyn FnOnce(&Result<T, Status>) + Send + 'static>;

struct Slot<T> {
    result: Option<Result<T, Status>>,
    callbacks: Vec<Callback<T>>,
}

struct FetchInner<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

/// A future-like handle to the result of an asynchronous read.
///
/// Cloning yields another handle to the same pending result. Completion is
/// one-shot; later completions of an already-completed fetch are ignored.
pub struct Fetch<T: Clone> {
    inner: Arc<FetchInner<T>>,
}

impl<T: Clone> Clone for Fetch<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> Fetch<T> {
    /// A fetch that has not completed yet.
    pub fn pending() -> Self {
        Self {
            inner: Arc::new(FetchInner {
                slot: Mutex::new(Slot {
                    result: None,
                    callbacks: Vec::new(),
                }),
                ready: Condvar::new(),
            }),
        }
    }

    /// A fetch already holding its result.
    pub fn ready(result: Result<T, Status>) -> Self {
        let fetch = Self::pending();
        fetch.complete(result);
        fetch
    }

    /// Deliver the result, wake all waiters, and run registered callbacks.
    /// No-op if already complete.
    pub(crate) fn complete(&self, result: Result<T, Status>) {
        let mut slot = self.inner.slot.lock().expect("fetch lock poisoned");
        if slot.result.is_some() {
            return;
        }
        slot.result = Some(result.clone());
        let callbacks = std::mem::take(&mut slot.callbacks);
        self.inner.ready.notify_all();
        drop(slot);
        // Callbacks run outside the lock so they may inspect this fetch.
        for callback in callbacks {
            callback(&result);
        }
    }

    /// Run `callback` with the result once available. Runs immediately on
    /// the calling thread if the fetch is already complete.
    pub(crate) fn on_complete(&self, callback: Callback<T>) {
        let immediate = {
            let mut slot = self.inner.slot.lock().expect("fetch lock poisoned");
            match &slot.result {
                Some(result) => Some(result.clone()),
                None => {
                    slot.callbacks.push(callback);
                    return;
                }
            }
        };
        if let Some(result) = immediate {
            callback(&result);
        }
    }

    /// Whether `other` is a handle to the same underlying fetch.
    pub(crate) fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Block until the result is available.
    pub fn wait(&self) -> Result<T, Status> {
        let mut slot = self.inner.slot.lock().expect("fetch lock poisoned");
        loop {
            if let Some(result) = slot.result.as_ref() {
                return result.clone();
            }
            slot = self.inner.ready.wait(slot).expect("fetch lock poisoned");
        }
    }

    /// The result if already available, without blocking.
    pub fn try_get(&self) -> Option<Result<T, Status>> {
        self.inner
            .slot
            .lock()
            .expect("fetch lock poisoned")
            .result
            .clone()
    }

    pub fn is_complete(&self) -> bool {
        self.inner
            .slot
            .lock()
            .expect("fetch lock poisoned")
            .result
            .is_some()
    }
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs read jobs either inline on the calling thread or on a small pool
/// of worker threads, per configuration.
pub(crate) enum ReadExecutor {
    Inline,
    Pool {
        sender: Mutex<Option<mpsc::Sender<Job>>>,
        workers: Vec<thread::JoinHandle<()>>,
    },
}

impl ReadExecutor {
    pub fn new(threads: usize) -> Self {
        if threads == 0 {
            return Self::Inline;
        }
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let workers = (0..threads)
            .map(|i| {
                let receiver = Arc::clone(&receiver);
                thread::Builder::new()
                    .name(format!("block-reader-{i}"))
                    .spawn(move || loop {
                        let job = receiver.lock().expect("reader queue poisoned").recv();
                        match job {
                            Ok(job) => job(),
                            Err(_) => break,
                        }
                    })
                    .expect("failed to spawn reader thread")
            })
            .collect();
        debug!(threads, "started block reader pool");
        Self::Pool {
            sender: Mutex::new(Some(sender)),
            workers,
        }
    }

    /// Run a job. Inline executors run it on the calling thread; pooled
    /// executors hand it to a worker, falling back to inline execution if
    /// the pool is already shut down.
    pub fn execute(&self, job: Job) {
        match self {
            Self::Inline => job(),
            Self::Pool { sender, .. } => {
                let sender = sender
                    .lock()
                    .expect("reader queue poisoned")
                    .as_ref()
                    .cloned();
                match sender {
                    Some(s) => match s.send(job) {
                        Ok(()) => {}
                        Err(mpsc::SendError(job)) => job(),
                    },
                    None => job(),
                }
            }
        }
    }
}

impl Drop for ReadExecutor {
    fn drop(&mut self) {
        if let Self::Pool { sender, workers } = self {
            sender.lock().expect("reader queue poisoned").take();
            for worker in workers.drain(..) {
                let _ = worker.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn ready_fetch_is_immediately_complete() {
        let fetch = Fetch::ready(Ok(42u64));
        assert!(fetch.is_complete());
        assert_eq!(fetch.try_get().unwrap().unwrap(), 42);
        assert_eq!(fetch.wait().unwrap(), 42);
    }

    #[test]
    fn pending_fetch_blocks_until_completed() {
        let fetch: Fetch<u64> = Fetch::pending();
        assert!(!fetch.is_complete());
        assert!(fetch.try_get().is_none());

        let waiter = fetch.clone();
        let handle = thread::spawn(move || waiter.wait());
        fetch.complete(Ok(7));
        assert_eq!(handle.join().unwrap().unwrap(), 7);
    }

    #[test]
    fn completion_is_one_shot() {
        let fetch: Fetch<u64> = Fetch::pending();
        fetch.complete(Ok(1));
        fetch.complete(Ok(2));
        assert_eq!(fetch.wait().unwrap(), 1);
    }

    #[test]
    fn clones_observe_the_same_result() {
        let fetch: Fetch<String> = Fetch::pending();
        let other = fetch.clone();
        fetch.complete(Err(Status::not_found("gone")));
        assert!(other.wait().unwrap_err().is_not_found());
    }

    #[test]
    fn callback_registered_before_completion_fires_on_complete() {
        let fetch: Fetch<u64> = Fetch::pending();
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        fetch.on_complete(Box::new(move |result| {
            *slot.lock().unwrap() = Some(result.clone());
        }));
        assert!(seen.lock().unwrap().is_none());
        fetch.complete(Ok(5));
        assert_eq!(seen.lock().unwrap().clone().unwrap().unwrap(), 5);
    }

    #[test]
    fn callback_registered_after_completion_fires_immediately() {
        let fetch = Fetch::ready(Ok(3u64));
        let seen = Arc::new(AtomicUsize::new(0));
        let slot = Arc::clone(&seen);
        fetch.on_complete(Box::new(move |result| {
            slot.store(result.clone().unwrap() as usize, Ordering::SeqCst);
        }));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn inline_executor_runs_on_calling_thread() {
        let executor = ReadExecutor::new(0);
        let calling = thread::current().id();
        let ran_on = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&ran_on);
        executor.execute(Box::new(move || {
            *slot.lock().unwrap() = Some(thread::current().id());
        }));
        // Inline execution completes before execute returns.
        assert_eq!(ran_on.lock().unwrap().unwrap(), calling);
    }

    #[test]
    fn pool_executor_runs_all_jobs() {
        let executor = ReadExecutor::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        let fetches: Vec<Fetch<usize>> = (0..8)
            .map(|i| {
                let fetch: Fetch<usize> = Fetch::pending();
                let done = fetch.clone();
                let counter = Arc::clone(&counter);
                executor.execute(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    done.complete(Ok(i));
                }));
                fetch
            })
            .collect();
        for (i, fetch) in fetches.iter().enumerate() {
            assert_eq!(fetch.wait().unwrap(), i);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn pool_drop_joins_workers() {
        let executor = ReadExecutor::new(1);
        let fetch: Fetch<u64> = Fetch::pending();
        let done = fetch.clone();
        executor.execute(Box::new(move || done.complete(Ok(9))));
        drop(executor);
        // Drop waits for in-flight jobs to finish.
        assert_eq!(fetch.try_get().unwrap().unwrap(), 9);
    }
}
