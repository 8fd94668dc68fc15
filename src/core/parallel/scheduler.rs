//! Bounded scheduler for batch jobs.
use super::{Task, TaskResult};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Runs whole jobs concurrently, bounded by a semaphore.
///
/// The default pool size is `min(4, hardware_parallelism)`; results come
/// back in submission order regardless of completion order.
pub struct TaskScheduler {
    semaphore: Arc<Semaphore>,
    cancellation: CancellationToken,
}

impl TaskScheduler {
    /// Scheduler with an explicit concurrency bound.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            cancellation: CancellationToken::new(),
        }
    }

    /// Scheduler sized for this machine.
    pub fn with_default_workers() -> Self {
        Self::new(num_cpus::get().min(4).max(1))
    }

    /// Token callers can use to stop the batch; queued jobs that have not
    /// started yet report `Cancelled`.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Run every task and collect results in submission order.
    pub async fn run_all(&self, tasks: Vec<Box<dyn Task>>) -> Vec<TaskResult> {
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let semaphore = Arc::clone(&self.semaphore);
                let cancellation = self.cancellation.clone();
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore open");
                    if cancellation.is_cancelled() {
                        return TaskResult::Cancelled;
                    }
                    task.execute().await
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| match joined {
                Ok(result) => result,
                Err(e) => TaskResult::Failed(format!("worker panicked: {}", e)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{Duration, sleep};

    struct ProbeTask {
        id: usize,
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Task for ProbeTask {
        async fn execute(&self) -> TaskResult {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            TaskResult::Success(format!("task {}", self.id))
        }

        fn task_id(&self) -> String {
            format!("probe-{}", self.id)
        }
    }

    #[tokio::test]
    async fn test_concurrency_bounded_and_order_preserved() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let scheduler = TaskScheduler::new(2);

        let tasks: Vec<Box<dyn Task>> = (0..6)
            .map(|id| {
                Box::new(ProbeTask {
                    id,
                    running: Arc::clone(&running),
                    peak: Arc::clone(&peak),
                }) as Box<dyn Task>
            })
            .collect();

        let results = scheduler.run_all(tasks).await;
        assert_eq!(results.len(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
        for (id, result) in results.iter().enumerate() {
            match result {
                TaskResult::Success(msg) => assert_eq!(msg, &format!("task {}", id)),
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_cancellation_skips_pending_tasks() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let scheduler = TaskScheduler::new(1);
        scheduler.cancellation().cancel();

        let tasks: Vec<Box<dyn Task>> = (0..3)
            .map(|id| {
                Box::new(ProbeTask {
                    id,
                    running: Arc::clone(&running),
                    peak: Arc::clone(&peak),
                }) as Box<dyn Task>
            })
            .collect();

        let results = scheduler.run_all(tasks).await;
        assert!(results.iter().all(|r| matches!(r, TaskResult::Cancelled)));
    }
}
