//! Session: owner of all core state
//!
//! Network calls run as tasks on a `JoinSet`; each task returns its result
//! as a [`SessionEvent`] tagged with the request generation. The session is
//! the only writer of status, payload, metrics, sample rows, prediction and
//! the error banner, and it applies events one at a time.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::prediction::PredictionOrchestrator;
use super::request::RequestTicket;
use super::status::StatusResolver;
use super::training::TrainingOrchestrator;
use super::{Completion, ErrorBanner, OrchestratorError};
use crate::analytics::{AnalyticsCache, AnalyticsInputs, ComparisonRow, ImpactRow, Revisions, TrendPoint};
use crate::backend::{Backend, BackendError, DatasetUpload, HttpBackend};
use crate::config::ClientConfig;
use crate::simulation::SimulationModel;
use crate::types::{
    ConfigResponse, DatasetRow, FeatureKey, MetricsRecord, MetricsSource, PredictionResponse,
    SliderConfig, Status, TrainResponse, DEFAULT_TARGET_COLUMN,
};

// ============================================================================
// Events
// ============================================================================

/// What a request task produced
#[derive(Debug)]
pub enum Outcome<T> {
    Completed(Result<T, BackendError>),
    Cancelled,
}

/// A request outcome tagged with its generation
#[derive(Debug)]
pub struct RequestResult<T> {
    pub generation: u64,
    pub outcome: Outcome<T>,
}

/// Result of one backend request, delivered to the session
#[derive(Debug)]
pub enum SessionEvent {
    Probe(RequestResult<String>),
    Config(RequestResult<ConfigResponse>),
    Training(RequestResult<TrainResponse>),
    Prediction(RequestResult<PredictionResponse>),
}

/// What applying an event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// State updated
    Applied,
    /// Result of a superseded request, dropped
    Stale,
    /// Request was cancelled before producing a result
    Cancelled,
}

// ============================================================================
// State
// ============================================================================

/// Backend-derived state owned by the session.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Slider bounds from the last configuration
    pub slider_config: SliderConfig,
    /// Feature names the backend trains on
    pub features: Vec<String>,
    /// Column holding the target strength in dataset rows
    pub target_column: String,
    /// Last known training quality and who delivered it
    pub metrics: Option<MetricsRecord>,
    /// Historical rows for display and aggregation
    pub sample_rows: Vec<DatasetRow>,
    /// Result of the last completed prediction
    pub prediction: Option<PredictionResponse>,
    /// Banner shown to the operator
    pub error: Option<ErrorBanner>,
    /// Message of the last successful training
    pub last_training_message: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            slider_config: SliderConfig::new(),
            features: Vec::new(),
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            metrics: None,
            sample_rows: Vec::new(),
            prediction: None,
            error: None,
            last_training_message: None,
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Orchestration core for one operator session
pub struct Session {
    backend: Arc<dyn Backend>,
    state: SessionState,
    status: StatusResolver,
    model: SimulationModel,
    training: TrainingOrchestrator,
    prediction: PredictionOrchestrator,
    revisions: Revisions,
    analytics: AnalyticsCache,
    tasks: JoinSet<SessionEvent>,
}

impl Session {
    /// Create a session over any backend.
    pub fn new(backend: Arc<dyn Backend>, min_prediction_duration: Duration) -> Self {
        Self {
            backend,
            state: SessionState::default(),
            status: StatusResolver::default(),
            model: SimulationModel::default(),
            training: TrainingOrchestrator::default(),
            prediction: PredictionOrchestrator::new(min_prediction_duration),
            revisions: Revisions::default(),
            analytics: AnalyticsCache::default(),
            tasks: JoinSet::new(),
        }
    }

    /// Create a session talking HTTP to the configured backend.
    pub fn from_config(config: &ClientConfig) -> Result<Self, BackendError> {
        let backend = HttpBackend::new(&config.base_url, config.request_timeout())?;
        info!(base_url = %backend.base_url(), "Session created");
        Ok(Self::new(Arc::new(backend), config.min_prediction_duration()))
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    pub fn status(&self) -> Status {
        self.status.current()
    }

    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    pub const fn model(&self) -> &SimulationModel {
        &self.model
    }

    pub const fn is_training(&self) -> bool {
        self.training.is_training()
    }

    pub const fn is_predicting(&self) -> bool {
        self.prediction.is_predicting()
    }

    /// Whether any request task is still outstanding.
    pub fn has_pending(&self) -> bool {
        !self.tasks.is_empty()
    }

    // ------------------------------------------------------------------------
    // Payload edits
    // ------------------------------------------------------------------------

    /// Free-form numeric entry, accepted unclamped.
    pub fn set_feature(&mut self, key: FeatureKey, value: f64) {
        if let Some(setting) = self.state.slider_config.get(key.as_str()) {
            if !setting.contains(value) {
                debug!(feature = %key, value, min = setting.min, max = setting.max, "Value outside slider range");
            }
        }
        self.model.set(key, value);
        self.revisions.payload += 1;
    }

    /// Slider entry, snapped to the configured range and step.
    pub fn set_feature_from_slider(&mut self, key: FeatureKey, raw: f64) -> f64 {
        let value = self
            .model
            .set_from_slider(&self.state.slider_config, key, raw);
        self.revisions.payload += 1;
        value
    }

    pub fn set_target_strength(&mut self, value: Option<f64>) {
        self.model.set_target_strength(value);
        self.revisions.payload += 1;
    }

    // ------------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------------

    /// Issue the liveness probe and the configuration fetch.
    pub fn activate(&mut self) {
        info!("Activating session: probing backend and fetching configuration");
        let ticket = self.status.begin_probe();
        let backend = Arc::clone(&self.backend);
        self.spawn_request(ticket, SessionEvent::Probe, async move { backend.health().await });
        self.refresh_config();
    }

    /// Fetch configuration, superseding any fetch still in flight.
    pub fn refresh_config(&mut self) {
        let ticket = self.status.begin_config();
        debug!(generation = ticket.generation, "Configuration fetch issued");
        let backend = Arc::clone(&self.backend);
        self.spawn_request(ticket, SessionEvent::Config, async move { backend.config().await });
    }

    /// Start a training upload. Rejected while another is in flight.
    pub fn start_training(&mut self, upload: DatasetUpload) -> Result<u64, OrchestratorError> {
        let ticket = self.training.begin(&upload.file_name)?;
        let generation = ticket.generation;
        self.state.error = None;

        let backend = Arc::clone(&self.backend);
        self.spawn_request(ticket, SessionEvent::Training, async move {
            backend.train(upload).await
        });
        Ok(generation)
    }

    /// Start a prediction. Requires `ready` status and no prediction in flight.
    ///
    /// The previous prediction and error are cleared before the request goes
    /// out, and the payload is snapshotted with a freshly computed `lsf`.
    /// A success is held until the minimum duration has passed; a failure
    /// is reported as soon as it arrives.
    pub fn start_prediction(&mut self) -> Result<u64, OrchestratorError> {
        let ticket = self.prediction.begin(self.status.current())?;
        let generation = ticket.generation;

        self.state.error = None;
        self.state.prediction = None;
        self.revisions.prediction += 1;

        let payload = self.model.snapshot_for_submission();
        let min_duration = self.prediction.min_duration();
        debug!(generation, lsf = ?payload.lsf, "Prediction payload snapshotted");

        let backend = Arc::clone(&self.backend);
        self.spawn_request(ticket, SessionEvent::Prediction, async move {
            let floor = async {
                tokio::time::sleep(min_duration).await;
                Ok::<_, BackendError>(())
            };
            tokio::try_join!(backend.predict(&payload), floor).map(|(prediction, ())| prediction)
        });
        Ok(generation)
    }

    /// Upload a dataset and wait until training and the follow-up
    /// configuration refresh have both landed.
    pub async fn train(&mut self, upload: DatasetUpload) -> Result<(), OrchestratorError> {
        let generation = self.start_training(upload)?;
        self.settle().await;
        match self.training.completion_of(generation) {
            Some(Completion::Succeeded) => Ok(()),
            Some(Completion::Failed { reason }) => Err(OrchestratorError::TrainingFailed(reason.clone())),
            None => Err(OrchestratorError::Cancelled),
        }
    }

    /// Run one prediction to completion.
    pub async fn predict(&mut self) -> Result<&PredictionResponse, OrchestratorError> {
        let generation = self.start_prediction()?;
        while self.prediction.is_predicting() {
            if self.next_event().await.is_none() {
                break;
            }
        }
        match self.prediction.completion_of(generation) {
            Some(Completion::Succeeded) => self
                .state
                .prediction
                .as_ref()
                .ok_or(OrchestratorError::Cancelled),
            Some(Completion::Failed { reason }) => Err(OrchestratorError::PredictionFailed(reason.clone())),
            None => Err(OrchestratorError::Cancelled),
        }
    }

    /// Wait for the next request to finish and apply it.
    ///
    /// Returns `None` when nothing is outstanding.
    pub async fn next_event(&mut self) -> Option<Disposition> {
        let joined = self.tasks.join_next().await?;
        Some(match joined {
            Ok(event) => self.apply(event),
            Err(e) => {
                error!(error = %e, "Request task failed to join");
                Disposition::Cancelled
            }
        })
    }

    /// Apply events until no request is outstanding.
    pub async fn settle(&mut self) {
        while self.next_event().await.is_some() {}
    }

    /// Cancel every outstanding request and drain their tasks.
    pub async fn shutdown(&mut self) {
        self.status.cancel();
        self.training.cancel();
        self.prediction.cancel();
        let mut drained = 0_usize;
        while let Some(joined) = self.tasks.join_next().await {
            if let Ok(event) = joined {
                self.apply(event);
            }
            drained += 1;
        }
        info!(drained, "Session shut down");
    }

    fn spawn_request<T, F>(
        &mut self,
        ticket: RequestTicket,
        wrap: fn(RequestResult<T>) -> SessionEvent,
        request: F,
    ) where
        T: Send + 'static,
        F: Future<Output = Result<T, BackendError>> + Send + 'static,
    {
        let RequestTicket { generation, token } = ticket;
        self.tasks.spawn(async move {
            let outcome = tokio::select! {
                biased;
                () = token.cancelled() => Outcome::Cancelled,
                result = AssertUnwindSafe(request).catch_unwind() => {
                    Outcome::Completed(result.unwrap_or_else(|_| Err(BackendError::TaskPanicked)))
                }
            };
            wrap(RequestResult { generation, outcome })
        });
    }

    // ------------------------------------------------------------------------
    // Event application
    // ------------------------------------------------------------------------

    /// Apply one request result.
    pub fn apply(&mut self, event: SessionEvent) -> Disposition {
        let disposition = match event {
            SessionEvent::Probe(r) => self.apply_probe(r),
            SessionEvent::Config(r) => self.apply_config(r),
            SessionEvent::Training(r) => self.apply_training(r),
            SessionEvent::Prediction(r) => self.apply_prediction(r),
        };
        if disposition == Disposition::Stale {
            debug!("Discarded result of a superseded request");
        }
        disposition
    }

    fn apply_probe(&mut self, result: RequestResult<String>) -> Disposition {
        let Outcome::Completed(outcome) = result.outcome else {
            return Disposition::Cancelled;
        };
        match outcome {
            Ok(token) => {
                if !self.status.on_probe(result.generation, Some(&token)) {
                    return Disposition::Stale;
                }
            }
            Err(e) => {
                if !self.status.on_probe(result.generation, None) {
                    return Disposition::Stale;
                }
                warn!(error = %e, "Health check failed");
            }
        }
        Disposition::Applied
    }

    fn apply_config(&mut self, result: RequestResult<ConfigResponse>) -> Disposition {
        let Outcome::Completed(outcome) = result.outcome else {
            return Disposition::Cancelled;
        };
        match outcome {
            Ok(config) => {
                if !self.status.on_config(result.generation, Some(config.dataset_ready)) {
                    return Disposition::Stale;
                }
                info!(
                    dataset_ready = config.dataset_ready,
                    sliders = config.slider_config.len(),
                    sample_rows = config.sample_data.as_ref().map_or(0, Vec::len),
                    "Configuration loaded"
                );
                self.state.metrics = config
                    .metrics
                    .map(|m| MetricsRecord::new(m, MetricsSource::Config));
                self.state.sample_rows = config.sample_data.unwrap_or_default();
                self.state.features = config.features;
                self.state.target_column = config.target;
                self.state.slider_config = config.slider_config;
                self.model.apply_defaults(&self.state.slider_config);
                self.revisions.rows += 1;
                self.revisions.payload += 1;
            }
            Err(e) => {
                if !self.status.on_config(result.generation, None) {
                    return Disposition::Stale;
                }
                error!(error = %e, "Failed to load config");
                self.state.error = Some(ErrorBanner::BackendUnreachable);
            }
        }
        Disposition::Applied
    }

    fn apply_training(&mut self, result: RequestResult<TrainResponse>) -> Disposition {
        let Outcome::Completed(outcome) = result.outcome else {
            return Disposition::Cancelled;
        };
        let completion = match &outcome {
            Ok(_) => Completion::Succeeded,
            Err(e) => Completion::Failed { reason: e.to_string() },
        };
        if !self.training.finish(result.generation, completion) {
            return Disposition::Stale;
        }

        match outcome {
            Ok(trained) => {
                info!(
                    generation = result.generation,
                    mae = trained.metrics.mae,
                    r2 = trained.metrics.r2,
                    sample_rows = trained.sample_data.len(),
                    "Training completed"
                );
                self.state.metrics = Some(MetricsRecord::new(trained.metrics, MetricsSource::Training));
                self.state.sample_rows = trained.sample_data;
                self.state.features = trained.feature_names;
                self.state.target_column = trained.target_name;
                self.state.last_training_message = Some(trained.message);
                self.status.on_training_success();
                self.revisions.rows += 1;
            }
            Err(e) => {
                error!(generation = result.generation, error = %e, "Training failed");
                self.state.error = Some(ErrorBanner::TrainingFailed);
            }
        }

        // Slider bounds and background state may have changed either way
        self.refresh_config();
        Disposition::Applied
    }

    fn apply_prediction(&mut self, result: RequestResult<PredictionResponse>) -> Disposition {
        let Outcome::Completed(outcome) = result.outcome else {
            return Disposition::Cancelled;
        };
        let completion = match &outcome {
            Ok(_) => Completion::Succeeded,
            Err(e) => Completion::Failed { reason: e.to_string() },
        };
        let Some(elapsed) = self.prediction.finish(result.generation, completion) else {
            return Disposition::Stale;
        };
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(prediction) => {
                info!(
                    generation = result.generation,
                    strength = prediction.predicted_strength,
                    quality = %prediction.quality_label,
                    elapsed_ms,
                    "Prediction completed"
                );
                self.state.prediction = Some(prediction);
                self.revisions.prediction += 1;
            }
            Err(e) => {
                error!(generation = result.generation, error = %e, elapsed_ms, "Prediction failed");
                self.state.error = Some(ErrorBanner::PredictionFailed);
            }
        }
        Disposition::Applied
    }

    // ------------------------------------------------------------------------
    // Analytics
    // ------------------------------------------------------------------------

    /// SHAP contributions of the current prediction by descending impact.
    pub fn impact_ranking(&mut self) -> Vec<ImpactRow> {
        let inputs = analytics_inputs(&self.state, &self.model, self.revisions);
        self.analytics.impact_ranking(&inputs).to_vec()
    }

    /// Historical strength trend with the current prediction appended.
    pub fn trend_series(&mut self) -> Vec<TrendPoint> {
        let inputs = analytics_inputs(&self.state, &self.model, self.revisions);
        self.analytics.trend_series(&inputs).to_vec()
    }

    /// Current inputs against dataset averages.
    pub fn feature_comparison(&mut self) -> Vec<ComparisonRow> {
        let inputs = analytics_inputs(&self.state, &self.model, self.revisions);
        self.analytics.feature_comparison(&inputs).to_vec()
    }
}

fn analytics_inputs<'a>(
    state: &'a SessionState,
    model: &'a SimulationModel,
    revisions: Revisions,
) -> AnalyticsInputs<'a> {
    AnalyticsInputs {
        revisions,
        prediction: state.prediction.as_ref(),
        rows: &state.sample_rows,
        target_column: &state.target_column,
        payload: model.payload(),
    }
}
