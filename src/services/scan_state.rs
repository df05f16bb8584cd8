use std::sync::Arc;

use tokio::sync::{broadcast, watch, Mutex, RwLock};

use crate::models::scan::{ScanProgress, ScanReport};
use crate::services::scanner::{stop_channel, StopHandle, StopSignal};

#[derive(Debug)]
pub struct ScanStateInner {
    /// Report of the last completed scan
    pub latest: RwLock<ScanReport>,
    pub broadcaster: broadcast::Sender<ScanReport>,
    /// Progress of the scheduled scan
    pub progress: watch::Sender<ScanProgress>,
    /// Stop handles of every scan currently running
    pub active: Mutex<Vec<StopHandle>>,
}

impl ScanStateInner {
    pub fn new(capacity: usize) -> Self {
        let (broadcaster, _receiver) = broadcast::channel(capacity);
        let (progress, _progress_receiver) = watch::channel(ScanProgress::default());
        Self {
            latest: RwLock::new(ScanReport::default()),
            broadcaster,
            progress,
            active: Mutex::new(Vec::new()),
        }
    }

    /// Registers a new running scan alongside any already running
    pub async fn begin_scan(&self) -> (StopHandle, StopSignal) {
        let (handle, signal) = stop_channel();
        self.active.lock().await.push(handle.clone());
        (handle, signal)
    }

    /// Forgets `handle`; other running scans stay registered
    pub async fn end_scan(&self, handle: &StopHandle) {
        self.active
            .lock()
            .await
            .retain(|current| !current.same_channel(handle));
    }

    /// Stops every running scan, returns false when none was left to stop
    pub async fn stop_active(&self) -> bool {
        let active = self.active.lock().await;
        let mut stopped = false;
        for handle in active.iter().filter(|handle| !handle.is_stopped()) {
            handle.stop();
            stopped = true;
        }
        stopped
    }

    /// Stores and broadcasts a finished report
    pub async fn publish(&self, report: ScanReport) {
        *self.latest.write().await = report.clone();
        let _ = self.broadcaster.send(report);
    }
}

pub type SharedScanState = Arc<ScanStateInner>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stop_active_reaches_running_scan() {
        let state = ScanStateInner::new(4);
        assert!(!state.stop_active().await);

        let (handle, _signal) = state.begin_scan().await;
        assert!(state.stop_active().await);
        assert!(handle.is_stopped());
        assert!(!state.stop_active().await);

        state.end_scan(&handle).await;
        assert!(!state.stop_active().await);
    }

    #[tokio::test]
    async fn end_scan_keeps_newer_handle() {
        let state = ScanStateInner::new(4);
        let (first, _first_signal) = state.begin_scan().await;
        let (second, _second_signal) = state.begin_scan().await;

        state.end_scan(&first).await;
        assert!(state.stop_active().await);
        assert!(second.is_stopped());
        assert!(!first.is_stopped());
    }

    #[tokio::test]
    async fn overlapping_scans_stay_stoppable() {
        let state = ScanStateInner::new(4);
        let (scheduled, _scheduled_signal) = state.begin_scan().await;
        let (on_demand, _on_demand_signal) = state.begin_scan().await;

        state.end_scan(&on_demand).await;
        assert!(state.stop_active().await);
        assert!(scheduled.is_stopped());
        assert!(!on_demand.is_stopped());

        state.end_scan(&scheduled).await;
        assert!(state.active.lock().await.is_empty());
    }

    #[tokio::test]
    async fn stop_active_reaches_every_running_scan() {
        let state = ScanStateInner::new(4);
        let (first, mut first_signal) = state.begin_scan().await;
        let (second, mut second_signal) = state.begin_scan().await;

        assert!(state.stop_active().await);
        first_signal.stopped().await;
        second_signal.stopped().await;
        assert!(first.is_stopped() && second.is_stopped());
    }

    #[tokio::test]
    async fn publish_updates_latest_and_subscribers() {
        let state = ScanStateInner::new(4);
        let mut receiver = state.broadcaster.subscribe();
        let report = ScanReport {
            cancelled: true,
            ..ScanReport::default()
        };

        state.publish(report).await;

        assert!(state.latest.read().await.cancelled);
        assert!(receiver.recv().await.unwrap().cancelled);
    }
}
