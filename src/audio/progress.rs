use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Periodic position-readout driver for seek-bar style consumers. Start
/// replaces any running poller; stop is idempotent and also runs on drop.
#[derive(Default)]
pub struct ProgressPoller {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressPoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start<F>(&self, interval: Duration, mut tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.stop();
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            loop {
                timer.tick().await;
                tick();
            }
        });
        *self.handle.lock().unwrap() = Some(handle);
    }

    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for ProgressPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn delivers_ticks_until_stopped() {
        let poller = ProgressPoller::new();
        let (tx, rx) = flume::unbounded();
        poller.start(Duration::from_millis(5), move || {
            let _ = tx.send(());
        });

        rx.recv_async().await.unwrap();
        rx.recv_async().await.unwrap();
        assert!(poller.is_running());

        poller.stop();
        poller.stop();
        assert!(!poller.is_running());

        tokio::time::sleep(Duration::from_millis(30)).await;
        let _ = rx.drain().count();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(rx.drain().count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn restart_replaces_previous_poller() {
        let poller = ProgressPoller::new();
        let (first_tx, first_rx) = flume::unbounded();
        poller.start(Duration::from_millis(5), move || {
            let _ = first_tx.send(());
        });
        first_rx.recv_async().await.unwrap();

        let (second_tx, second_rx) = flume::unbounded();
        poller.start(Duration::from_millis(5), move || {
            let _ = second_tx.send(());
        });
        second_rx.recv_async().await.unwrap();

        // first closure was aborted with its task, so its sender is gone
        assert!(first_rx.recv_async().await.is_err());

        poller.stop();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_before_start_is_a_no_op() {
        let poller = ProgressPoller::new();
        poller.stop();
        assert!(!poller.is_running());
    }
}
