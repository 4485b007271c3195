//! Dashboard orchestration.
//!
//! A dashboard load is two dependent fetches: the snapshot, then guidance
//! keyed on the snapshot's AQI. [`Dashboard`] runs that sequence and builds a
//! [`DashboardViewModel`]. [`DashboardView`] owns one view lifecycle: it
//! publishes models to subscribers, tags each refresh with an invocation
//! token and decides which results may still be applied.
//!
//! # Usage
//!
//! ```ignore
//! let dashboard = Dashboard::new(provider, advisor);
//! let view = DashboardView::new(dashboard, CommitPolicy::LastCompleted);
//! let model = view.refresh().await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::classify::Classification;
use crate::error::FetchError;
use crate::guidance::{GuidanceText, HealthAdvisor};
use crate::model::Snapshot;
use crate::provider::DataProvider;

/// User-facing message when the snapshot cannot be loaded.
pub const SNAPSHOT_FAILED_MESSAGE: &str = "Failed to fetch data.";

/// Load state of one section of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Section<T> {
    /// Not requested (e.g. guidance after a failed snapshot).
    Idle,
    Loading,
    Ready(T),
    /// Failed with a retry-eligible message.
    Failed { message: String },
}

impl<T> Section<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Section::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Section::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// A forecast point with its severity badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastBadge {
    pub label: String,
    pub classification: Classification,
}

/// Everything the presentation layer needs to render the dashboard.
///
/// Every model holds results from exactly one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardViewModel {
    /// Token of the invocation that produced this model; 0 before any load.
    pub invocation: u64,
    pub snapshot: Section<Snapshot>,
    /// Classification of the snapshot's AQI, once known.
    pub severity: Option<Classification>,
    pub forecast: Vec<ForecastBadge>,
    pub guidance: Section<GuidanceText>,
}

impl DashboardViewModel {
    /// Nothing requested yet.
    pub fn idle() -> Self {
        Self {
            invocation: 0,
            snapshot: Section::Idle,
            severity: None,
            forecast: Vec::new(),
            guidance: Section::Idle,
        }
    }

    fn loading(invocation: u64) -> Self {
        Self {
            invocation,
            snapshot: Section::Loading,
            ..Self::idle()
        }
    }

    fn failed(invocation: u64, message: &str) -> Self {
        Self {
            invocation,
            snapshot: Section::Failed {
                message: message.to_string(),
            },
            ..Self::idle()
        }
    }

    fn with_snapshot(invocation: u64, snapshot: Snapshot) -> Self {
        let forecast = snapshot
            .forecast
            .iter()
            .map(|point| ForecastBadge {
                label: point.label.clone(),
                classification: Classification::of(point.aqi),
            })
            .collect();

        Self {
            invocation,
            severity: Some(Classification::of(snapshot.reading.aqi)),
            forecast,
            snapshot: Section::Ready(snapshot),
            guidance: Section::Loading,
        }
    }

    fn with_guidance(mut self, guidance: GuidanceText) -> Self {
        self.guidance = Section::Ready(guidance);
        self
    }

    /// AQI of the loaded snapshot, if any.
    pub fn aqi(&self) -> Option<u32> {
        self.snapshot.ready().map(|s| s.reading.aqi)
    }

    /// True while either section is still loading.
    pub fn is_loading(&self) -> bool {
        self.snapshot.is_loading() || self.guidance.is_loading()
    }
}

/// Runs the snapshot-then-guidance sequence. Holds no view state.
#[derive(Clone)]
pub struct Dashboard {
    provider: Arc<dyn DataProvider>,
    advisor: HealthAdvisor,
}

impl Dashboard {
    pub fn new(provider: Arc<dyn DataProvider>, advisor: HealthAdvisor) -> Self {
        Self { provider, advisor }
    }

    /// Fetch the current snapshot.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`FetchError`].
    pub async fn load_snapshot(&self) -> Result<Snapshot, FetchError> {
        self.provider.fetch_snapshot().await
    }

    /// Guidance for `aqi`. Never fails.
    pub async fn load_guidance(&self, aqi: u32) -> GuidanceText {
        self.advisor.generate_guidance(aqi).await
    }

    /// Load the whole dashboard once, outside any view lifecycle.
    pub async fn load_dashboard(&self) -> DashboardViewModel {
        self.run(0, |_| {}).await
    }

    /// Run one invocation, handing every intermediate model to `commit`.
    ///
    /// Guidance is only requested once the snapshot's AQI is known; a failed
    /// snapshot leaves guidance idle.
    async fn run(
        &self,
        invocation: u64,
        mut commit: impl FnMut(DashboardViewModel),
    ) -> DashboardViewModel {
        commit(DashboardViewModel::loading(invocation));

        let snapshot = match self.load_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(invocation, error = %e, "Failed to fetch snapshot");
                let failed = DashboardViewModel::failed(invocation, SNAPSHOT_FAILED_MESSAGE);
                commit(failed.clone());
                return failed;
            }
        };

        let aqi = snapshot.reading.aqi;
        let partial = DashboardViewModel::with_snapshot(invocation, snapshot);
        commit(partial.clone());

        let guidance = self.load_guidance(aqi).await;
        let complete = partial.with_guidance(guidance);
        commit(complete.clone());

        info!(
            invocation,
            aqi,
            category = complete.severity.map_or("unknown", |c| c.category.label()),
            "Dashboard loaded"
        );
        complete
    }
}

/// Which result wins when refreshes overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitPolicy {
    /// Every invocation's results are applied as they arrive; the one that
    /// completes last is what stays on screen.
    #[default]
    LastCompleted,
    /// Only the most recently started invocation may apply results.
    LatestInitiated,
}

/// One dashboard view lifecycle.
pub struct DashboardView {
    dashboard: Dashboard,
    policy: CommitPolicy,
    issued: AtomicU64,
    attached: AtomicBool,
    state: watch::Sender<DashboardViewModel>,
}

impl DashboardView {
    pub fn new(dashboard: Dashboard, policy: CommitPolicy) -> Self {
        let (state, _) = watch::channel(DashboardViewModel::idle());
        Self {
            dashboard,
            policy,
            issued: AtomicU64::new(0),
            attached: AtomicBool::new(true),
            state,
        }
    }

    /// Receive every model applied to this view.
    pub fn subscribe(&self) -> watch::Receiver<DashboardViewModel> {
        self.state.subscribe()
    }

    /// The model currently on screen.
    pub fn current(&self) -> DashboardViewModel {
        self.state.borrow().clone()
    }

    /// Tear the view down. Results still in flight are dropped on arrival.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
        debug!("Dashboard view detached");
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Reload snapshot and guidance, then return the model on screen.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> DashboardViewModel {
        if !self.is_attached() {
            debug!("Refresh ignored on detached view");
            return self.current();
        }

        let invocation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.dashboard
            .run(invocation, |model| {
                self.commit(model);
            })
            .await;

        self.current()
    }

    /// Apply `model` if the view is attached and the policy allows it.
    fn commit(&self, model: DashboardViewModel) -> bool {
        let invocation = model.invocation;

        if !self.is_attached() {
            debug!(invocation, "Discarding result for detached view");
            return false;
        }

        let latest = self.issued.load(Ordering::SeqCst);
        let accept = match self.policy {
            CommitPolicy::LastCompleted => true,
            CommitPolicy::LatestInitiated => invocation == latest,
        };

        if !accept {
            debug!(invocation, latest, "Discarding superseded result");
            return false;
        }

        self.state.send_if_modified(|current| {
            if *current == model {
                return false;
            }
            *current = model;
            true
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use crate::classify::SeverityCategory;
    use crate::error::ProviderError;
    use crate::guidance::{GuidanceOrigin, deterministic_guidance};
    use crate::mock::demo_snapshot;
    use crate::model::{AuthResponse, Complaint, NewComplaint, SubmissionReceipt};
    use crate::provider::test_support::RecordingProvider;
    use crate::text_generation::TextGenerator;

    type Gate = oneshot::Receiver<Result<Snapshot, FetchError>>;

    /// Provider whose snapshot calls wait until the test releases them,
    /// taking gates in call order.
    struct GatedProvider {
        gates: Mutex<VecDeque<Gate>>,
    }

    impl GatedProvider {
        fn new(count: usize) -> (Arc<Self>, Vec<oneshot::Sender<Result<Snapshot, FetchError>>>) {
            let mut senders = Vec::new();
            let mut gates = VecDeque::new();
            for _ in 0..count {
                let (tx, rx) = oneshot::channel();
                senders.push(tx);
                gates.push_back(rx);
            }
            (
                Arc::new(Self {
                    gates: Mutex::new(gates),
                }),
                senders,
            )
        }
    }

    #[async_trait]
    impl DataProvider for GatedProvider {
        async fn authenticate(&self, _: &str, _: &str) -> Result<AuthResponse, FetchError> {
            unreachable!()
        }

        async fn register(&self, _: &str, _: &str, _: &str) -> Result<AuthResponse, FetchError> {
            unreachable!()
        }

        async fn fetch_snapshot(&self) -> Result<Snapshot, FetchError> {
            let gate = self.gates.lock().unwrap().pop_front();
            match gate {
                Some(gate) => gate
                    .await
                    .unwrap_or_else(|_| Err(FetchError::Unavailable("gate dropped".to_string()))),
                None => Err(FetchError::Unavailable("no gate left".to_string())),
            }
        }

        async fn submit_complaint(&self, _: &NewComplaint) -> Result<SubmissionReceipt, FetchError> {
            unreachable!()
        }

        async fn fetch_complaints(&self, _: &str) -> Result<Vec<Complaint>, FetchError> {
            unreachable!()
        }
    }

    /// Generator that records prompts and always fails.
    #[derive(Default)]
    struct CountingGenerator {
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for CountingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            Err(ProviderError::Empty)
        }
    }

    fn snapshot_with_aqi(aqi: u32) -> Snapshot {
        let mut snapshot = demo_snapshot();
        snapshot.reading.aqi = aqi;
        snapshot
    }

    fn assert_consistent(model: &DashboardViewModel) {
        let aqi = model.aqi().expect("snapshot loaded");
        let guidance = model.guidance.ready().expect("guidance loaded");
        assert_eq!(guidance.aqi, aqi);
        assert_eq!(guidance.text, deterministic_guidance(aqi));
        assert_eq!(
            model.severity.map(|s| s.category),
            Some(SeverityCategory::from_aqi(aqi))
        );
    }

    async fn release_in_order(
        senders: Vec<oneshot::Sender<Result<Snapshot, FetchError>>>,
        order: &[(usize, u32)],
    ) {
        let mut senders: Vec<_> = senders.into_iter().map(Some).collect();
        for (index, aqi) in order {
            let tx = senders[*index].take().unwrap();
            let _ = tx.send(Ok(snapshot_with_aqi(*aqi)));
            for _ in 0..8 {
                tokio::task::yield_now().await;
            }
        }
    }

    #[tokio::test]
    async fn test_load_dashboard() {
        let dashboard = Dashboard::new(
            Arc::new(RecordingProvider::default()),
            HealthAdvisor::deterministic(),
        );

        let model = dashboard.load_dashboard().await;

        assert_eq!(model.aqi(), Some(388));
        assert_eq!(
            model.severity.unwrap().category,
            SeverityCategory::VeryPoor
        );
        assert!(!model.is_loading());
        assert_consistent(&model);
        assert_eq!(model.forecast.len(), 7);
        assert_eq!(model.forecast[2].label, "+24h");
        assert_eq!(
            model.forecast[2].classification.category,
            SeverityCategory::Severe
        );
    }

    #[tokio::test]
    async fn test_guidance_keyed_on_snapshot_aqi() {
        let generator = Arc::new(CountingGenerator::default());
        let advisor = HealthAdvisor::delegated(generator.clone(), Duration::from_secs(1));
        let dashboard = Dashboard::new(Arc::new(RecordingProvider::default()), advisor);

        let model = dashboard.load_dashboard().await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert!(generator.prompts.lock().unwrap()[0].contains("is 388."));
        let guidance = model.guidance.ready().unwrap();
        assert_eq!(guidance.origin, GuidanceOrigin::Fallback);
        assert_eq!(guidance.text, deterministic_guidance(388));
    }

    #[tokio::test]
    async fn test_snapshot_failure_skips_guidance() {
        let generator = Arc::new(CountingGenerator::default());
        let advisor = HealthAdvisor::delegated(generator.clone(), Duration::from_secs(1));
        let provider = Arc::new(RecordingProvider::failing());
        let dashboard = Dashboard::new(provider.clone(), advisor);

        let model = dashboard.load_dashboard().await;

        assert_eq!(model.snapshot.error(), Some(SNAPSHOT_FAILED_MESSAGE));
        assert_eq!(model.guidance, Section::Idle);
        assert!(model.severity.is_none());
        assert_eq!(provider.calls(), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_publishes_to_subscribers() {
        let dashboard = Dashboard::new(
            Arc::new(RecordingProvider::default()),
            HealthAdvisor::deterministic(),
        );
        let view = DashboardView::new(dashboard, CommitPolicy::default());
        let mut rx = view.subscribe();

        let model = view.refresh().await;

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen, model);
        assert_eq!(model.invocation, 1);
        assert_consistent(&model);

        assert_eq!(view.refresh().await.invocation, 2);
    }

    #[tokio::test]
    async fn test_overlapping_refreshes_last_completed_wins() {
        let (provider, senders) = GatedProvider::new(2);
        let dashboard = Dashboard::new(provider, HealthAdvisor::deterministic());
        let view = DashboardView::new(dashboard, CommitPolicy::LastCompleted);

        // The second request resolves first; the first resolves last.
        tokio::join!(
            view.refresh(),
            view.refresh(),
            release_in_order(senders, &[(1, 420), (0, 120)]),
        );

        let model = view.current();
        assert_eq!(model.aqi(), Some(120));
        assert_consistent(&model);
    }

    #[tokio::test]
    async fn test_overlapping_refreshes_latest_initiated_wins() {
        let (provider, senders) = GatedProvider::new(2);
        let dashboard = Dashboard::new(provider, HealthAdvisor::deterministic());
        let view = DashboardView::new(dashboard, CommitPolicy::LatestInitiated);

        tokio::join!(
            view.refresh(),
            view.refresh(),
            release_in_order(senders, &[(1, 420), (0, 120)]),
        );

        let model = view.current();
        assert_eq!(model.invocation, 2);
        assert_eq!(model.aqi(), Some(420));
        assert_consistent(&model);
    }

    #[tokio::test]
    async fn test_detached_view_discards_pending_result() {
        let (provider, senders) = GatedProvider::new(1);
        let dashboard = Dashboard::new(provider, HealthAdvisor::deterministic());
        let view = DashboardView::new(dashboard, CommitPolicy::LastCompleted);

        let teardown = async {
            tokio::task::yield_now().await;
            view.detach();
            release_in_order(senders, &[(0, 250)]).await;
        };
        tokio::join!(view.refresh(), teardown);

        let model = view.current();
        assert!(model.snapshot.is_loading());
        assert_eq!(model.aqi(), None);
        assert!(!view.is_attached());

        // Further refreshes do nothing.
        assert_eq!(view.refresh().await.invocation, 1);
    }
}
