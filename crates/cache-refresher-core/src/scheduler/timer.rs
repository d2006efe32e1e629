//! One-shot timers behind a small trait so the scheduler can run on tokio in
//! production and on a virtual clock in tests.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Work run when a timer elapses.
pub type TimerTask = BoxFuture<'static, ()>;

/// Something that can run a task once after a delay.
pub trait Timer: Send + Sync {
    /// Schedule `task` to run after `delay`. The returned handle cancels it.
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

/// Cancels a scheduled task that has not fired yet.
///
/// Dropping the handle does NOT cancel: it only gives up the ability to.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle").field("armed", &self.cancel.is_some()).finish()
    }
}

/// Timer backed by `tokio::time::sleep` on a spawned task.
#[derive(Debug, Clone)]
pub struct TokioTimer {
    runtime: tokio::runtime::Handle,
}

impl TokioTimer {
    /// Bind to the runtime of the calling context.
    ///
    /// Panics outside a tokio runtime, like `tokio::spawn`.
    pub fn current() -> Self {
        Self { runtime: tokio::runtime::Handle::current() }
    }

    pub fn from_handle(runtime: tokio::runtime::Handle) -> Self {
        Self { runtime }
    }
}

impl Timer for TokioTimer {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        TimerHandle::new(move || join.abort())
    }
}

struct ManualEntry {
    seq: u64,
    due: Duration,
    task: TimerTask,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_seq: u64,
    entries: Vec<ManualEntry>,
}

/// Virtual clock: nothing fires until [`ManualTimer::advance`] is awaited.
///
/// Due tasks run in `(due, scheduling order)` order, each to completion, with
/// the clock set to their due time so anything they schedule is timed from
/// the moment they fired.
#[derive(Clone, Default)]
pub struct ManualTimer {
    state: Arc<Mutex<ManualState>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of scheduled, not yet fired, not cancelled tasks.
    pub fn pending(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<Duration> {
        self.state.lock().entries.iter().map(|e| e.due).min()
    }

    /// Move the clock forward by `by`, running every task that falls due.
    pub async fn advance(&self, by: Duration) {
        let target = self.now() + by;

        loop {
            let task = {
                let mut state = self.state.lock();
                let next = state
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.due <= target)
                    .min_by_key(|(_, e)| (e.due, e.seq))
                    .map(|(idx, _)| idx);

                match next {
                    Some(idx) => {
                        let entry = state.entries.swap_remove(idx);
                        state.now = entry.due;
                        Some(entry.task)
                    },
                    None => {
                        state.now = target;
                        None
                    },
                }
            };

            match task {
                Some(task) => task.await,
                None => break,
            }
        }
    }

    /// Advance straight to the next due task and run it.
    ///
    /// Returns the time it fired at, or `None` when nothing is pending.
    pub async fn fire_next(&self) -> Option<Duration> {
        let due = self.next_due()?;
        let now = self.now();
        self.advance(due.saturating_sub(now)).await;
        Some(due)
    }
}

impl Timer for ManualTimer {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        let due = state.now + delay;
        state.entries.push(ManualEntry { seq, due, task });
        drop(state);

        let weak: Weak<Mutex<ManualState>> = Arc::downgrade(&self.state);
        TimerHandle::new(move || {
            if let Some(state) = weak.upgrade() {
                state.lock().entries.retain(|e| e.seq != seq);
            }
        })
    }
}

impl fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualTimer")
            .field("now", &state.now)
            .field("pending", &state.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task(counter: &Arc<AtomicUsize>) -> TimerTask {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        .boxed()
    }

    #[tokio::test]
    async fn test_manual_timer_fires_only_when_due() {
        let timer = ManualTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let _handle = timer.schedule_after(Duration::from_millis(1000), counting_task(&fired));
        timer.advance(Duration::from_millis(999)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(timer.pending(), 1);

        timer.advance(Duration::from_millis(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timer.pending(), 0);
        assert_eq!(timer.now(), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_manual_timer_cancel() {
        let timer = ManualTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = timer.schedule_after(Duration::from_millis(10), counting_task(&fired));
        handle.cancel();
        timer.advance(Duration::from_secs(1)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(timer.pending(), 0);
    }

    #[tokio::test]
    async fn test_dropping_handle_keeps_task() {
        let timer = ManualTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));

        drop(timer.schedule_after(Duration::from_millis(10), counting_task(&fired)));
        assert_eq!(timer.fire_next().await, Some(Duration::from_millis(10)));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timer.fire_next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_timer_abort() {
        let timer = TokioTimer::current();
        let fired = Arc::new(AtomicUsize::new(0));

        let keep = timer.schedule_after(Duration::from_millis(100), counting_task(&fired));
        let cancelled = timer.schedule_after(Duration::from_millis(100), counting_task(&fired));
        cancelled.cancel();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        drop(keep);
    }
}
