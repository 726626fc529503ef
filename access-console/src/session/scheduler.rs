//! Cancellable "run once after a delay" tasks.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::clock::{Clock, ManualClock};

/// Work to run when a timer fires.
pub type DeferredTask = BoxFuture<'static, ()>;

/// Identifies one armed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

pub trait Scheduler: Send + Sync {
    /// Run `task` once after `delay`.
    fn arm(&self, delay: Duration, task: DeferredTask) -> TaskHandle;

    /// Drop a task that has not fired yet. Unknown or fired handles are ignored.
    fn cancel(&self, handle: TaskHandle);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Scheduler backed by spawned Tokio sleeps.
#[derive(Default)]
pub struct TokioScheduler {
    next_id: AtomicU64,
    tasks: Arc<Mutex<HashMap<u64, tokio::task::AbortHandle>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of armed tasks that have not fired or been cancelled.
    pub fn pending(&self) -> usize {
        lock(&self.tasks).len()
    }
}

impl Scheduler for TokioScheduler {
    fn arm(&self, delay: Duration, task: DeferredTask) -> TaskHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = TaskHandle(id);

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(error = %e, "No Tokio runtime available, deferred task dropped");
                return handle;
            }
        };

        // Held across the spawn so the task cannot deregister before it is
        // registered, even on a multi-thread runtime
        let mut tasks = lock(&self.tasks);
        let registry = Arc::clone(&self.tasks);
        let join = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // Fired tasks are no longer cancellable by handle
            lock(&registry).remove(&id);
            task.await;
        });
        tasks.insert(id, join.abort_handle());

        handle
    }

    fn cancel(&self, handle: TaskHandle) {
        if let Some(abort) = lock(&self.tasks).remove(&handle.0) {
            abort.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, abort) in lock(&self.tasks).drain() {
            abort.abort();
        }
    }
}

struct PendingTask {
    id: u64,
    due: DateTime<Utc>,
    task: DeferredTask,
}

/// Deterministic scheduler driven by a [`ManualClock`].
///
/// Nothing fires until [`ManualScheduler::advance`] moves time past a task's
/// due instant.
pub struct ManualScheduler {
    clock: Arc<ManualClock>,
    next_id: AtomicU64,
    pending: Mutex<Vec<PendingTask>>,
}

impl ManualScheduler {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            next_id: AtomicU64::new(0),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Due instant of the earliest armed task.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        lock(&self.pending).iter().map(|p| p.due).min()
    }

    /// Move the clock forward, firing due tasks in order and awaiting each.
    ///
    /// Tasks armed by a firing task are eligible in the same call if they fall
    /// inside the window.
    pub async fn advance(&self, by: Duration) {
        let target = due_after(self.clock.now(), by);

        while let Some(next) = self.take_due(target) {
            if next.due > self.clock.now() {
                self.clock.set(next.due);
            }
            next.task.await;
        }

        if self.clock.now() < target {
            self.clock.set(target);
        }
    }

    /// Fire everything already due without moving the clock.
    pub async fn run_due(&self) {
        self.advance(Duration::ZERO).await;
    }

    fn take_due(&self, target: DateTime<Utc>) -> Option<PendingTask> {
        let mut pending = lock(&self.pending);
        let index = pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= target)
            .min_by_key(|(_, p)| (p.due, p.id))
            .map(|(i, _)| i)?;
        Some(pending.remove(index))
    }
}

/// `now + delay`, saturating at the end of the calendar.
fn due_after(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::TimeDelta::from_std(delay)
        .ok()
        .and_then(|delay| now.checked_add_signed(delay))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl Scheduler for ManualScheduler {
    fn arm(&self, delay: Duration, task: DeferredTask) -> TaskHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let due = due_after(self.clock.now(), delay);
        lock(&self.pending).push(PendingTask { id, due, task });
        TaskHandle(id)
    }

    fn cancel(&self, handle: TaskHandle) {
        lock(&self.pending).retain(|p| p.id != handle.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_task(counter: &Arc<AtomicUsize>) -> DeferredTask {
        let counter = Arc::clone(counter);
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_manual_scheduler_fires_at_due_time() {
        let clock = Arc::new(ManualClock::at_millis(0));
        let scheduler = ManualScheduler::new(Arc::clone(&clock));
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.arm(Duration::from_secs(10), counting_task(&fired));

        scheduler.advance(Duration::from_millis(9_999)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        scheduler.advance(Duration::from_millis(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(clock.now_millis(), 10_000);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_manual_scheduler_cancel() {
        let clock = Arc::new(ManualClock::at_millis(0));
        let scheduler = ManualScheduler::new(clock);
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.arm(Duration::from_secs(1), counting_task(&fired));
        scheduler.cancel(handle);
        scheduler.advance(Duration::from_secs(5)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_cancel_before_fire() {
        let scheduler = TokioScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.arm(Duration::from_secs(60), counting_task(&fired));
        assert_eq!(scheduler.pending(), 1);
        scheduler.cancel(handle);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_fires() {
        let scheduler = TokioScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.arm(Duration::from_secs(30), counting_task(&fired));
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_tokio_scheduler_zero_delay_tasks_deregister() {
        let scheduler = TokioScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..200 {
            scheduler.arm(Duration::ZERO, counting_task(&fired));
        }

        for _ in 0..100 {
            if fired.load(Ordering::SeqCst) == 200 && scheduler.pending() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(fired.load(Ordering::SeqCst), 200);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_manual_scheduler_saturates_far_future_delays() {
        let clock = Arc::new(ManualClock::at_millis(0));
        let scheduler = ManualScheduler::new(clock);
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.arm(Duration::MAX, counting_task(&fired));

        assert_eq!(scheduler.next_due(), Some(DateTime::<Utc>::MAX_UTC));
        scheduler.advance(Duration::from_secs(3600)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
