//! Job result table
//!
//! Matches job notifications to the callers waiting for them. The listener
//! deposits results; any number of tasks wait on individual job ids. A result
//! may arrive before or after its waiter registers.

use parking_lot::Mutex;
use shared::{JobId, JobResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::error::{ClientError, ClientResult};

#[derive(Debug)]
enum Slot {
    /// Result delivered, nobody has claimed it yet
    Ready(JobResult),
    /// Tasks suspended on this job
    Waiting(Vec<oneshot::Sender<JobResult>>),
}

#[derive(Debug, Default)]
struct TableState {
    slots: HashMap<JobId, Slot>,
    closed: bool,
}

/// Concurrency-safe job id → result map with per-key wakeups
#[derive(Debug, Clone, Default)]
pub struct JobTable {
    state: Arc<Mutex<TableState>>,
}

/// Outcome of registering interest in a job
enum Registration {
    Ready(JobResult),
    Pending(oneshot::Receiver<JobResult>),
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a job result, waking every task waiting on its id
    ///
    /// An unclaimed earlier result for the same id is overwritten.
    pub fn deposit(&self, result: JobResult) {
        let mut state = self.state.lock();
        Self::deposit_locked(&mut state, result);
    }

    fn deposit_locked(state: &mut TableState, result: JobResult) {
        let job_id = result.job_id.clone();

        let delivered = match state.slots.remove(&job_id) {
            Some(Slot::Waiting(waiters)) => {
                let mut delivered = 0usize;
                for tx in waiters {
                    if tx.send(result.clone()).is_ok() {
                        delivered += 1;
                    }
                }
                delivered
            }
            Some(Slot::Ready(previous)) => {
                tracing::debug!(job_id = %job_id, success = previous.success, "Overwriting unclaimed job result");
                0
            }
            None => 0,
        };

        // Nobody took it (no waiter yet, or all of them gave up): keep it.
        if delivered == 0 {
            state.slots.insert(job_id.clone(), Slot::Ready(result));
            tracing::debug!(
                job_id = %job_id,
                retained = Self::count_ready(state),
                "Retaining unclaimed job result"
            );
        }
    }

    /// Take a present result or enqueue a waiter for `job_id`
    fn register(&self, job_id: &JobId) -> ClientResult<Registration> {
        let mut state = self.state.lock();
        match state.slots.remove(job_id) {
            Some(Slot::Ready(result)) => Ok(Registration::Ready(result)),
            Some(Slot::Waiting(mut waiters)) => {
                if state.closed {
                    return Err(ClientError::ConnectionClosed);
                }
                let (tx, rx) = oneshot::channel();
                waiters.retain(|w| !w.is_closed());
                waiters.push(tx);
                state.slots.insert(job_id.clone(), Slot::Waiting(waiters));
                Ok(Registration::Pending(rx))
            }
            None => {
                if state.closed {
                    return Err(ClientError::ConnectionClosed);
                }
                let (tx, rx) = oneshot::channel();
                state.slots.insert(job_id.clone(), Slot::Waiting(vec![tx]));
                Ok(Registration::Pending(rx))
            }
        }
    }

    /// Wait for the result of `job_id`
    ///
    /// Returns immediately with a result that is already present, consuming
    /// it. Fails with `ConnectionClosed` once the table is closed and no
    /// result for the job is retained.
    pub async fn wait(&self, job_id: &JobId) -> ClientResult<JobResult> {
        match self.register(job_id)? {
            Registration::Ready(result) => Ok(result),
            // Sender dropped without a value only happens on close().
            Registration::Pending(rx) => rx.await.map_err(|_| ClientError::ConnectionClosed),
        }
    }

    /// Like [`wait`](Self::wait), bounded by `timeout`
    ///
    /// On expiry the table is left consistent: a result that arrives later,
    /// or one that was handed over just as the deadline passed, is retained
    /// for the next `wait` on the same id.
    pub async fn wait_timeout(&self, job_id: &JobId, timeout: Duration) -> ClientResult<JobResult> {
        let mut rx = match self.register(job_id)? {
            Registration::Ready(result) => return Ok(result),
            Registration::Pending(rx) => rx,
        };

        tokio::select! {
            biased;
            received = &mut rx => return received.map_err(|_| ClientError::ConnectionClosed),
            _ = tokio::time::sleep(timeout) => {}
        }

        self.abandon(job_id, rx);
        Err(ClientError::TimedOut(job_id.clone()))
    }

    /// Give up on a pending wait without losing a result already sent to it
    fn abandon(&self, job_id: &JobId, mut rx: oneshot::Receiver<JobResult>) {
        // Once closed, a racing deposit sees no live waiter and retains the result itself.
        rx.close();
        let mut state = self.state.lock();
        if let Ok(result) = rx.try_recv() {
            // A newer result stored meanwhile wins.
            if !matches!(state.slots.get(job_id), Some(Slot::Ready(_))) {
                Self::deposit_locked(&mut state, result);
            }
        }
        if let Some(Slot::Waiting(waiters)) = state.slots.get_mut(job_id) {
            waiters.retain(|w| !w.is_closed());
            if waiters.is_empty() {
                state.slots.remove(job_id);
            }
        }
    }

    /// Fail every pending and future wait that has no retained result
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        let before = state.slots.len();
        state.slots.retain(|_, slot| matches!(slot, Slot::Ready(_)));
        tracing::debug!(
            released = before - state.slots.len(),
            retained = state.slots.len(),
            "Job table closed"
        );
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Whether an unclaimed result for `job_id` is stored
    pub fn has_result(&self, job_id: &JobId) -> bool {
        matches!(self.state.lock().slots.get(job_id), Some(Slot::Ready(_)))
    }

    /// Number of delivered results nobody has claimed
    pub fn retained_results(&self) -> usize {
        Self::count_ready(&self.state.lock())
    }

    fn count_ready(state: &TableState) -> usize {
        state
            .slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    /// Number of tasks currently suspended in `wait`
    pub fn pending_waiters(&self) -> usize {
        self.state
            .lock()
            .slots
            .values()
            .map(|slot| match slot {
                Slot::Waiting(waiters) => waiters.iter().filter(|w| !w.is_closed()).count(),
                Slot::Ready(_) => 0,
            })
            .sum()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::wait_for_waiters;
    use super::*;
    use serde_json::json;
    use shared::JobNotification;
    use tokio::time::{sleep, timeout};

    fn result(job_id: &str, value: serde_json::Value) -> JobResult {
        JobResult::from_notification(JobId::new(job_id), JobNotification::success(Some(value)))
    }

    #[tokio::test]
    async fn test_deposit_before_wait_returns_immediately() {
        let table = JobTable::new();
        table.deposit(result("j1", json!(1)));
        assert!(table.has_result(&JobId::new("j1")));

        let got = timeout(Duration::from_millis(50), table.wait(&JobId::new("j1")))
            .await
            .expect("wait should not block")
            .unwrap();
        assert_eq!(got.return_value, Some(json!(1)));
        assert!(!table.has_result(&JobId::new("j1")));
    }

    #[tokio::test]
    async fn test_wait_before_deposit_unblocks_on_deposit() {
        let table = JobTable::new();
        let waiter = {
            let table = table.clone();
            tokio::spawn(async move { table.wait(&JobId::new("j1")).await })
        };
        wait_for_waiters(&table, 1).await;
        assert!(!waiter.is_finished());

        table.deposit(result("j1", json!("done")));
        let got = timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(got.return_value, Some(json!("done")));
        assert_eq!(table.pending_waiters(), 0);
        assert!(!table.has_result(&JobId::new("j1")));
    }

    #[tokio::test]
    async fn test_distinct_jobs_are_independent() {
        let table = JobTable::new();
        let w1 = {
            let table = table.clone();
            tokio::spawn(async move { table.wait(&JobId::new("j1")).await })
        };
        let w2 = {
            let table = table.clone();
            tokio::spawn(async move { table.wait(&JobId::new("j2")).await })
        };
        wait_for_waiters(&table, 2).await;

        table.deposit(result("j1", json!(1)));
        let got = timeout(Duration::from_secs(1), w1).await.unwrap().unwrap().unwrap();
        assert_eq!(got.job_id, JobId::new("j1"));

        sleep(Duration::from_millis(20)).await;
        assert!(!w2.is_finished());
        assert_eq!(table.pending_waiters(), 1);

        table.deposit(result("j2", json!(2)));
        let got = timeout(Duration::from_secs(1), w2).await.unwrap().unwrap().unwrap();
        assert_eq!(got.return_value, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_second_deposit_overwrites() {
        let table = JobTable::new();
        table.deposit(result("j1", json!("first")));
        table.deposit(result("j1", json!("second")));

        let got = table.wait(&JobId::new("j1")).await.unwrap();
        assert_eq!(got.return_value, Some(json!("second")));
    }

    #[tokio::test]
    async fn test_multiple_waiters_same_job() {
        let table = JobTable::new();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let table = table.clone();
                tokio::spawn(async move { table.wait(&JobId::new("j1")).await })
            })
            .collect();
        wait_for_waiters(&table, 3).await;

        table.deposit(result("j1", json!(7)));
        for waiter in waiters {
            let got = waiter.await.unwrap().unwrap();
            assert_eq!(got.return_value, Some(json!(7)));
        }
        assert!(!table.has_result(&JobId::new("j1")));
    }

    #[tokio::test]
    async fn test_close_fails_pending_waiters() {
        let table = JobTable::new();
        let waiter = {
            let table = table.clone();
            tokio::spawn(async move { table.wait(&JobId::new("job-9")).await })
        };
        wait_for_waiters(&table, 1).await;

        table.close();
        let err = timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, ClientError::ConnectionClosed));

        // Later waits fail fast too
        let err = table.wait(&JobId::new("job-10")).await.unwrap_err();
        assert!(matches!(err, ClientError::ConnectionClosed));
        assert!(table.is_closed());
    }

    #[tokio::test]
    async fn test_close_keeps_delivered_results() {
        let table = JobTable::new();
        table.deposit(result("j1", json!(1)));
        table.close();

        let got = table.wait(&JobId::new("j1")).await.unwrap();
        assert_eq!(got.return_value, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_timeout_then_late_result_is_retained() {
        let table = JobTable::new();
        let err = table
            .wait_timeout(&JobId::new("j1"), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::TimedOut(ref id) if id.as_str() == "j1"));
        assert_eq!(table.pending_waiters(), 0);

        table.deposit(result("j1", json!("late")));
        assert!(table.has_result(&JobId::new("j1")));

        let got = table
            .wait_timeout(&JobId::new("j1"), Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(got.return_value, Some(json!("late")));
    }

    #[tokio::test]
    async fn test_abandoned_wait_hands_back_sent_result() {
        let table = JobTable::new();
        let job_id = JobId::new("j1");
        let Ok(Registration::Pending(rx)) = table.register(&job_id) else {
            panic!("expected a pending registration");
        };

        // Delivered to the waiter just as its deadline passes
        table.deposit(result("j1", json!("raced")));
        assert!(!table.has_result(&job_id));

        table.abandon(&job_id, rx);
        assert_eq!(table.pending_waiters(), 0);
        let got = table.wait(&job_id).await.unwrap();
        assert_eq!(got.return_value, Some(json!("raced")));
    }

    #[tokio::test]
    async fn test_abandon_keeps_newer_result() {
        let table = JobTable::new();
        let job_id = JobId::new("j1");
        let Ok(Registration::Pending(rx)) = table.register(&job_id) else {
            panic!("expected a pending registration");
        };
        table.deposit(result("j1", json!("old")));
        table.deposit(result("j1", json!("new")));

        table.abandon(&job_id, rx);
        let got = table.wait(&job_id).await.unwrap();
        assert_eq!(got.return_value, Some(json!("new")));
    }

    #[tokio::test]
    async fn test_duplicate_after_claim_is_retained() {
        let table = JobTable::new();
        table.deposit(result("j1", json!(1)));
        table.wait(&JobId::new("j1")).await.unwrap();
        assert_eq!(table.retained_results(), 0);

        table.deposit(result("j1", json!(1)));
        table.deposit(result("j2", json!(2)));
        assert_eq!(table.retained_results(), 2);
        assert!(table.has_result(&JobId::new("j1")));
    }
}
