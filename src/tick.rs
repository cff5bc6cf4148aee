//! Repeating tick sources that drive a calendar clock.
//!
//! A [`TickSource`] calls a registered callback once per interval until the
//! subscription is cancelled. [`ManualTickSource`] leaves the cadence to the
//! host (call [`ManualTickSource::fire`] from the main loop), while
//! [`TokioTickSource`] schedules ticks on a tokio runtime.

use crate::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Callback run on every tick
pub type TickCallback = Box<dyn FnMut() + Send + 'static>;

/// Identifies one repeating registration with a tick source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display(fmt = "subscription #{_0}")]
pub struct SubscriptionHandle(u64);

/// A periodic timer the clock registers with while running.
pub trait TickSource: Send + Sync {
    /// Calls `callback` once every `interval` until cancelled.
    /// Returns `None` if the source cannot schedule ticks.
    fn register_repeating(
        &self,
        interval: Duration,
        callback: TickCallback,
    ) -> Option<SubscriptionHandle>;

    /// Stops a registration. Unknown handles are ignored.
    fn cancel(&self, handle: SubscriptionHandle);
}

/// Tick source pumped by the host: every [`fire`](Self::fire) delivers one
/// tick to each live registration.
#[derive(Default)]
pub struct ManualTickSource {
    inner: Mutex<ManualInner>,
}

#[derive(Default)]
struct ManualInner {
    next_id: u64,
    subscriptions: BTreeMap<SubscriptionHandle, (Duration, TickCallback)>,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers one tick to every registration, oldest first.
    /// Returns how many callbacks ran.
    ///
    /// Callbacks must not register with or cancel on this same source.
    pub fn fire(&self) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, callback) in inner.subscriptions.values_mut() {
            callback();
        }
        inner.subscriptions.len()
    }

    /// Number of live registrations
    pub fn active(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscriptions
            .len()
    }

    /// Interval a registration asked for
    pub fn interval(&self, handle: SubscriptionHandle) -> Option<Duration> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscriptions
            .get(&handle)
            .map(|(interval, _)| *interval)
    }
}

impl TickSource for ManualTickSource {
    fn register_repeating(
        &self,
        interval: Duration,
        callback: TickCallback,
    ) -> Option<SubscriptionHandle> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = SubscriptionHandle(inner.next_id);
        inner.next_id += 1;
        inner.subscriptions.insert(handle, (interval, callback));
        Some(handle)
    }

    fn cancel(&self, handle: SubscriptionHandle) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscriptions
            .remove(&handle);
    }
}

impl std::fmt::Debug for ManualTickSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualTickSource")
            .field("active", &self.active())
            .finish()
    }
}

/// Tick source backed by a tokio runtime: one spawned task per registration.
///
/// The first tick arrives one interval after registration. Ticks that fall
/// behind are delivered in a burst rather than merged.
#[derive(Debug)]
pub struct TokioTickSource {
    runtime: Handle,
    next_id: AtomicU64,
    tasks: Mutex<BTreeMap<SubscriptionHandle, JoinHandle<()>>>,
}

impl TokioTickSource {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(0),
            tasks: Mutex::new(BTreeMap::new()),
        }
    }

    /// Uses the runtime of the calling context, `None` outside a runtime
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// Number of live registrations
    pub fn active(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl TickSource for TokioTickSource {
    fn register_repeating(
        &self,
        interval: Duration,
        mut callback: TickCallback,
    ) -> Option<SubscriptionHandle> {
        if interval.is_zero() {
            return None;
        }
        let handle = SubscriptionHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        let first_tick = Instant::now() + interval;
        let task = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                ticker.tick().await;
                callback();
            }
        });
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, task);
        Some(handle)
    }

    fn cancel(&self, handle: SubscriptionHandle) {
        let task = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl Drop for TokioTickSource {
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, task) in std::mem::take(tasks) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, TickCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&count);
        let callback: TickCallback = Box::new(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn test_manual_fire_and_cancel() {
        let source = ManualTickSource::new();
        let (count, callback) = counter();
        let handle = source
            .register_repeating(Duration::from_secs(1), callback)
            .unwrap();
        assert_eq!(source.active(), 1);
        assert_eq!(source.interval(handle), Some(Duration::from_secs(1)));

        assert_eq!(source.fire(), 1);
        assert_eq!(source.fire(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        source.cancel(handle);
        assert_eq!(source.active(), 0);
        assert_eq!(source.fire(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_manual_cancel_unknown_handle() {
        let source = ManualTickSource::new();
        let (_, callback) = counter();
        let handle = source
            .register_repeating(Duration::from_millis(10), callback)
            .unwrap();
        source.cancel(SubscriptionHandle(99));
        assert_eq!(source.active(), 1);
        source.cancel(handle);
        source.cancel(handle);
        assert_eq!(source.active(), 0);
    }

    #[test]
    fn test_subscription_handle_display() {
        assert_eq!(SubscriptionHandle(3).to_string(), "subscription #3");
    }

    #[test]
    fn test_tokio_current_outside_runtime() {
        assert!(TokioTickSource::current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_ticks_once_per_interval() {
        let source = TokioTickSource::current().unwrap();
        let (count, callback) = counter();
        let handle = source
            .register_repeating(Duration::from_millis(100), callback)
            .unwrap();

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        source.cancel(handle);
        assert_eq!(source.active(), 0);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_rejects_zero_interval() {
        let source = TokioTickSource::current().unwrap();
        let (_, callback) = counter();
        assert!(source.register_repeating(Duration::ZERO, callback).is_none());
        assert_eq!(source.active(), 0);
    }
}
