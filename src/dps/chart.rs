//! Chart data generation with stale-result dropping.
//!
//! Each generation takes a request id from a monotonic counter. A finished
//! projection is stored only if no newer request was issued meanwhile and
//! the displayed axis is still the one it was computed for.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dps::curve::{project_curve, AxisConfig, AxisKind, CurveError, CurvePoint, CurveSubject};

#[derive(Debug, Error)]
pub enum ChartError {
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error("chart task failed: {0}")]
    Task(String),
}

/// Chart settings. Only the axis affects the data; the rest is display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSettings {
    pub axis: AxisConfig,
    #[serde(default)]
    pub smooth_lines: bool,
    #[serde(default)]
    pub show_labels: bool,
}

impl ChartSettings {
    pub fn needs_recompute(&self, previous: &ChartSettings) -> bool {
        self.axis != previous.axis
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartRequest {
    pub id: u64,
    pub axis: AxisKind,
}

#[derive(Debug, Default)]
struct ChartSnapshot {
    axis: AxisKind,
    request_id: u64,
    data: Vec<CurvePoint>,
}

#[derive(Debug, Default)]
pub struct ChartState {
    latest: AtomicU64,
    snapshot: Mutex<ChartSnapshot>,
}

impl ChartState {
    pub fn new(axis: AxisKind) -> Self {
        Self {
            latest: AtomicU64::new(0),
            snapshot: Mutex::new(ChartSnapshot {
                axis,
                ..ChartSnapshot::default()
            }),
        }
    }

    pub fn begin(&self, axis: AxisKind) -> ChartRequest {
        let id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        ChartRequest { id, axis }
    }

    pub fn is_latest(&self, request: &ChartRequest) -> bool {
        self.latest.load(Ordering::SeqCst) == request.id
    }

    /// Stores `data` if `request` is still current. Returns whether it was kept.
    ///
    /// The staleness checks run under the snapshot lock, so a request that
    /// lost the race to a newer one cannot overwrite its data.
    pub fn complete(&self, request: ChartRequest, data: Vec<CurvePoint>) -> bool {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_latest(&request) || request.id < snapshot.request_id {
            tracing::debug!("dropping chart request {}: superseded", request.id);
            return false;
        }
        if snapshot.axis != request.axis {
            tracing::debug!("dropping chart request {}: axis changed", request.id);
            return false;
        }
        snapshot.request_id = request.id;
        snapshot.data = data;
        true
    }

    /// Switches the displayed axis; data computed for the old axis is cleared.
    pub fn set_axis(&self, axis: AxisKind) {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        if snapshot.axis != axis {
            snapshot.axis = axis;
            snapshot.data.clear();
        }
    }

    pub fn axis(&self) -> AxisKind {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner).axis
    }

    pub fn data(&self) -> Vec<CurvePoint> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .data
            .clone()
    }

    /// Id of the request whose data is currently stored, 0 if none.
    pub fn stored_request(&self) -> u64 {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .request_id
    }
}

/// Projects `subjects` for `request` off the async executor and commits the
/// result through the guard.
pub async fn finish_chart_data(
    state: Arc<ChartState>,
    request: ChartRequest,
    subjects: Arc<Vec<CurveSubject>>,
    axis: AxisConfig,
) -> Result<bool, ChartError> {
    let points = tokio::task::spawn_blocking(move || project_curve(&subjects, &axis))
        .await
        .map_err(|err| ChartError::Task(err.to_string()))??;
    Ok(state.complete(request, points))
}

pub async fn generate_chart_data(
    state: Arc<ChartState>,
    subjects: Arc<Vec<CurveSubject>>,
    axis: AxisConfig,
) -> Result<bool, ChartError> {
    let request = state.begin(axis.kind);
    finish_chart_data(state, request, subjects, axis).await
}
