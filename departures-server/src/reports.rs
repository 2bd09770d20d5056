//! Disruption and equipment report polling.
//!
//! Reports cover the whole network, so they are fetched on a timer rather
//! than per request. The latest successful fetch of each kind is kept in a
//! [`ReportStore`] and read by the web layer when rendering.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::domain::{Disruption, EquipmentReport};
use crate::sncf::{SncfError, TransitApi};

/// Default polling period for both report kinds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Latest fetched reports.
///
/// Each slot is replaced wholesale on a successful refresh and left as is on
/// failure. Slots are `None` until their first successful fetch.
#[derive(Default)]
pub struct ReportStore {
    disruptions: RwLock<Option<Arc<Vec<Disruption>>>>,
    equipment: RwLock<Option<Arc<Vec<EquipmentReport>>>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current disruption snapshot.
    pub async fn disruptions(&self) -> Option<Arc<Vec<Disruption>>> {
        self.disruptions.read().await.clone()
    }

    /// Current equipment snapshot.
    pub async fn equipment(&self) -> Option<Arc<Vec<EquipmentReport>>> {
        self.equipment.read().await.clone()
    }

    /// Fetch disruptions and replace the snapshot.
    ///
    /// On failure, the existing snapshot is preserved and the error is
    /// returned.
    pub async fn refresh_disruptions(&self, api: &dyn TransitApi) -> Result<usize, SncfError> {
        let reports = api.line_reports().await?;
        let count = reports.len();
        *self.disruptions.write().await = Some(Arc::new(reports));
        Ok(count)
    }

    /// Fetch equipment reports and replace the snapshot.
    ///
    /// On failure, the existing snapshot is preserved and the error is
    /// returned.
    pub async fn refresh_equipment(&self, api: &dyn TransitApi) -> Result<usize, SncfError> {
        let reports = api.equipment_reports().await?;
        let count = reports.len();
        *self.equipment.write().await = Some(Arc::new(reports));
        Ok(count)
    }
}

type Refresh = Box<dyn FnMut() -> BoxFuture<'static, Result<usize, SncfError>> + Send>;

/// Background refresh of both report kinds.
///
/// Runs one task per report kind, each on its own interval whose first tick
/// fires immediately. Dropping the poller also ends the tasks, but only
/// [`stop`] waits for them.
///
/// [`stop`]: ReportPoller::stop
pub struct ReportPoller {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl ReportPoller {
    /// Spawn the polling tasks.
    pub fn start(api: Arc<dyn TransitApi>, store: Arc<ReportStore>, period: Duration) -> Self {
        let (shutdown, rx) = watch::channel(false);

        let disruptions: Refresh = {
            let api = Arc::clone(&api);
            let store = Arc::clone(&store);
            Box::new(move || {
                let api = Arc::clone(&api);
                let store = Arc::clone(&store);
                async move { store.refresh_disruptions(api.as_ref()).await }.boxed()
            })
        };

        let equipment: Refresh = Box::new(move || {
            let api = Arc::clone(&api);
            let store = Arc::clone(&store);
            async move { store.refresh_equipment(api.as_ref()).await }.boxed()
        });

        let tasks = vec![
            tokio::spawn(poll("disruptions", period, rx.clone(), disruptions)),
            tokio::spawn(poll("equipment", period, rx, equipment)),
        ];

        info!(period_secs = period.as_secs(), "report polling started");
        Self { shutdown, tasks }
    }

    /// Signal the tasks to stop and wait for them to finish.
    ///
    /// A refresh in flight is abandoned.
    pub async fn stop(self) {
        // Receivers may already be gone if a task panicked
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "report polling task failed");
            }
        }
        info!("report polling stopped");
    }
}

async fn poll(
    kind: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut refresh: Refresh,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => break,
        }

        tokio::select! {
            result = refresh() => match result {
                Ok(count) => debug!(kind, count, "refreshed reports"),
                Err(e) => warn!(kind, error = %e, "failed to refresh reports, keeping previous"),
            },
            _ = shutdown.changed() => break,
        }
    }
}
