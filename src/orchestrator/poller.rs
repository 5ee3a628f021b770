//! Background status poller.
//!
//! Ticks are strictly sequential: the next tick is not scheduled until the previous
//! `/status` call has settled, so a slow backend never accumulates concurrent polls.

use crate::model::ServiceStatus;
use crate::remote::Backend;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owned poller task. Dropping the handle stops polling.
pub(crate) struct PollerHandle {
    status_rx: watch::Receiver<ServiceStatus>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<ServiceStatus> {
        self.status_rx.clone()
    }

    pub fn current(&self) -> ServiceStatus {
        self.status_rx.borrow().clone()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        // Dropping a JoinHandle does not cancel the task in Tokio; abort explicitly.
        self.task.abort();
    }
}

/// Start polling `/status` every `interval`. The first tick fires immediately.
pub(crate) fn spawn_status_poller(backend: Arc<dyn Backend>, interval: Duration) -> PollerHandle {
    let (status_tx, status_rx) = watch::channel(ServiceStatus::default());
    let task = tokio::spawn(poll_loop(backend, interval, status_tx));
    PollerHandle { status_rx, task }
}

async fn poll_loop(
    backend: Arc<dyn Backend>,
    interval: Duration,
    status_tx: watch::Sender<ServiceStatus>,
) {
    let mut ticker = tokio::time::interval(interval);
    // Constant cadence with no backoff; a late tick is delayed rather than bursted.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let was_online = status_tx.borrow().online;
        match backend.status().await {
            Ok(status) => {
                if !was_online && status.online {
                    tracing::info!(budget = %status.budget_remaining, "backend online");
                }
                status_tx.send_replace(status);
            }
            Err(e) => {
                if was_online {
                    tracing::info!("backend offline");
                }
                tracing::warn!(error = %e, "status poll failed");
                status_tx.send_modify(ServiceStatus::mark_offline);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileList, LogBundle, RunRequest};
    use crate::remote::RemoteError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays scripted `/status` results; an exhausted script yields transport errors.
    struct ScriptedStatus {
        script: Mutex<VecDeque<Result<ServiceStatus, RemoteError>>>,
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedStatus {
        fn new(script: Vec<Result<ServiceStatus, RemoteError>>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                delay,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Backend for ScriptedStatus {
        async fn status(&self) -> Result<ServiceStatus, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RemoteError::Transport("connection refused".into())))
        }
        async fn logs(&self, _limit: usize) -> Result<LogBundle, RemoteError> {
            unreachable!("poller only calls /status")
        }
        async fn files(&self) -> Result<FileList, RemoteError> {
            unreachable!("poller only calls /status")
        }
        async fn run(&self, _req: &RunRequest) -> Result<String, RemoteError> {
            unreachable!("poller only calls /status")
        }
    }

    fn online(budget: &str) -> Result<ServiceStatus, RemoteError> {
        Ok(ServiceStatus {
            online: true,
            budget_remaining: budget.into(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn failed_tick_keeps_budget_and_goes_offline() {
        let backend = ScriptedStatus::new(
            vec![online("$4.20"), Err(RemoteError::Status { status: 500 })],
            Duration::ZERO,
        );
        let handle = spawn_status_poller(backend, Duration::from_secs(5));
        let mut rx = handle.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(
            *rx.borrow_and_update(),
            ServiceStatus {
                online: true,
                budget_remaining: "$4.20".into()
            }
        );

        rx.changed().await.unwrap();
        assert_eq!(
            *rx.borrow_and_update(),
            ServiceStatus {
                online: false,
                budget_remaining: "$4.20".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn budget_only_changes_on_successful_polls() {
        let backend = ScriptedStatus::new(
            vec![
                Err(RemoteError::Transport("down".into())),
                online("$10.00"),
                Err(RemoteError::Status { status: 502 }),
                Err(RemoteError::Decode("bad".into())),
                online("$9.50"),
            ],
            Duration::ZERO,
        );
        let handle = spawn_status_poller(backend, Duration::from_secs(5));
        let mut rx = handle.subscribe();

        let mut seen = Vec::new();
        for _ in 0..5 {
            rx.changed().await.unwrap();
            let s = rx.borrow_and_update().clone();
            seen.push((s.online, s.budget_remaining));
        }
        assert_eq!(
            seen,
            vec![
                (false, "N/A".to_string()),
                (true, "$10.00".to_string()),
                (false, "$10.00".to_string()),
                (false, "$10.00".to_string()),
                (true, "$9.50".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_never_sees_overlapping_polls() {
        // Each call takes longer than the interval.
        let backend = ScriptedStatus::new(Vec::new(), Duration::from_secs(12));
        let handle = spawn_status_poller(backend.clone(), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 1);
        let calls = backend.calls.load(Ordering::SeqCst);
        assert!(calls >= 4 && calls <= 6, "calls = {calls}");
        assert!(!handle.current().online);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_polling() {
        let backend = ScriptedStatus::new(Vec::new(), Duration::ZERO);
        let handle = spawn_status_poller(backend.clone(), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(11)).await;
        let before = backend.calls.load(Ordering::SeqCst);
        assert_eq!(before, 3);

        drop(handle);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), before);
    }
}
