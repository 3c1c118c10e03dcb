//! Observable state cell shared by every provider.
//!
//! `ReactiveState<S>` owns the current value in a `tokio::sync::watch`
//! channel, so async consumers can `await` changes, and keeps a list of
//! synchronous observers that run right after each committed mutation.
//! Observers run outside every internal lock, in registration order, and
//! receive the post-mutation snapshot.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::watch;

/// Callback invoked with the new state after every mutation.
pub type Observer<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Lock a std mutex, recovering the data if a panicking observer poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Observers<S> {
    next_id: u64,
    entries: Vec<(u64, Observer<S>)>,
}

/// A value plus the set of parties interested in its changes.
pub struct ReactiveState<S> {
    sender: watch::Sender<S>,
    observers: Arc<Mutex<Observers<S>>>,
}

impl<S> ReactiveState<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(initial: S) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender,
            observers: Arc::new(Mutex::new(Observers {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    pub fn get(&self) -> S {
        self.sender.borrow().clone()
    }

    /// Read a projection of the current value without cloning all of it.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.sender.borrow())
    }

    /// Apply `mutate`, then notify watchers and observers. Returns the new value.
    pub fn update(&self, mutate: impl FnOnce(&mut S)) -> S {
        self.sender.send_modify(mutate);
        let snapshot = self.get();
        self.notify(&snapshot);
        snapshot
    }

    /// Register a synchronous observer. It stays registered until the
    /// returned `Subscription` is released or dropped.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let id = {
            let mut observers = lock(&self.observers);
            let id = observers.next_id;
            observers.next_id += 1;
            observers.entries.push((id, Arc::new(observer)));
            id
        };

        let weak: Weak<Mutex<Observers<S>>> = Arc::downgrade(&self.observers);
        Subscription::new(move || {
            if let Some(observers) = weak.upgrade() {
                lock(&observers).entries.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// A `watch` receiver for async consumers.
    pub fn watch(&self) -> watch::Receiver<S> {
        self.sender.subscribe()
    }

    /// Number of registered synchronous observers.
    pub fn observer_count(&self) -> usize {
        lock(&self.observers).entries.len()
    }

    fn notify(&self, snapshot: &S) {
        let observers: Vec<Observer<S>> = lock(&self.observers)
            .entries
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(snapshot);
        }
    }
}

/// Registration of one observer. Released at most once: explicitly through
/// `release`, or implicitly on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Stop receiving updates.
    pub fn release(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}
