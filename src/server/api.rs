use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::Environment;
use crate::data::operator::{Operator, Profession, Rarity};
use crate::dps::{project_curve, AxisConfig, AxisKind, CurveBuff, CurveError, CurveSubject};
use crate::server::AppState;
use crate::stats::{apply_trust, compute_attributes, Attributes, OperatorConfig, StatsError};

/// Record types the `/api/static` endpoint accepts.
pub const STATIC_TYPES: [&str; 10] = [
    "materials",
    "modules",
    "operators",
    "ranges",
    "skills",
    "trust",
    "handbook",
    "skins",
    "voices",
    "gacha",
];

const DEFAULT_TRUST: u32 = 100;
const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    NotImplemented(String),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> (u16, &'static str) {
        match self {
            Self::Parse(_) | Self::BadRequest(_) | Self::Curve(_) => (400, "Bad Request"),
            Self::NotFound(_) => (404, "Not Found"),
            Self::NotImplemented(_) => (501, "Not Implemented"),
            Self::Stats(StatsError::PhaseNotFound { .. } | StatsError::LevelOutOfRange { .. }) => {
                (400, "Bad Request")
            }
            Self::Stats(_) => (422, "Unprocessable Entity"),
            Self::Internal(_) => (500, "Internal Server Error"),
        }
    }

    /// Message shown to clients. Internal failures stay generic outside
    /// development.
    pub fn public_message(&self, environment: Environment) -> String {
        match self {
            Self::Internal(_) if !environment.is_development() => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

fn internal(err: serde_json::Error) -> ApiError {
    ApiError::Internal(err.to_string())
}

#[derive(Serialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Serialized straight from `payload` so ordered maps keep their order.
fn data<T: Serialize>(payload: T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(&DataEnvelope { data: payload }).map_err(internal)
}

fn find_operator<'a>(state: &'a AppState, id: &str) -> Result<&'a Operator, ApiError> {
    state
        .store
        .resolve(id)
        .ok_or_else(|| ApiError::NotFound(format!("operator '{id}' not found")))
}

pub fn health_payload(state: &AppState) -> Result<String, ApiError> {
    serde_json::to_string_pretty(&json!({
        "status": "ok",
        "service": "myrtle-api",
        "version": env!("CARGO_PKG_VERSION"),
        "operators": state.store.len()
    }))
    .map_err(internal)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorListItem {
    pub id: String,
    pub name: String,
    pub profession: Profession,
    pub rarity: Rarity,
    pub phases: usize,
    pub modules: Vec<String>,
}

impl From<&Operator> for OperatorListItem {
    fn from(operator: &Operator) -> Self {
        Self {
            id: operator.id().to_string(),
            name: operator.name.clone(),
            profession: operator.profession,
            rarity: operator.rarity,
            phases: operator.phases.len(),
            modules: operator
                .modules
                .iter()
                .map(|module| module.equip_id.clone())
                .collect(),
        }
    }
}

pub fn operators_payload(state: &AppState) -> Result<String, ApiError> {
    let list: Vec<OperatorListItem> = state
        .store
        .operators()
        .iter()
        .map(OperatorListItem::from)
        .collect();
    data(list)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributesRequest {
    #[serde(alias = "id")]
    pub operator_id: String,
    pub phase_index: usize,
    #[serde(flatten)]
    pub config: OperatorConfig,
}

pub fn attributes_payload(state: &AppState, body: &str) -> Result<String, ApiError> {
    let request: AttributesRequest = serde_json::from_str(body)?;
    let operator = find_operator(state, &request.operator_id)?;
    let report =
        compute_attributes(operator, &request.config, request.phase_index, &state.specs)?;
    data(report)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisRequest {
    #[serde(default)]
    pub kind: AxisKind,
    pub max_value: Option<f64>,
    pub step_size: Option<f64>,
    pub targets: Option<u32>,
}

impl AxisRequest {
    pub fn into_config(self) -> AxisConfig {
        let defaults = AxisConfig::for_kind(self.kind);
        AxisConfig {
            kind: self.kind,
            max_value: self.max_value.unwrap_or(defaults.max_value),
            step_size: self.step_size.unwrap_or(defaults.step_size),
            targets: self.targets.unwrap_or(defaults.targets),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveOperator {
    #[serde(alias = "id")]
    pub operator_id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub phase_index: usize,
    #[serde(default)]
    pub buff: CurveBuff,
    #[serde(default)]
    pub hits: Option<f64>,
    #[serde(flatten)]
    pub config: OperatorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurveRequest {
    pub operators: Vec<CurveOperator>,
    #[serde(default)]
    pub axis: AxisRequest,
}

/// Builds one chart subject per requested operator build.
pub fn curve_subjects(
    state: &AppState,
    operators: &[CurveOperator],
) -> Result<Vec<CurveSubject>, ApiError> {
    operators
        .iter()
        .map(|entry| {
            let operator = find_operator(state, &entry.operator_id)?;
            let report =
                compute_attributes(operator, &entry.config, entry.phase_index, &state.specs)?;
            let label = entry.label.clone().unwrap_or_else(|| operator.name.clone());
            let mut subject = CurveSubject::from_report(label, operator, &report);
            subject.buff = entry.buff;
            if let Some(hits) = entry.hits {
                subject.hits = hits;
            }
            Ok(subject)
        })
        .collect()
}

pub fn curve_payload(state: &AppState, body: &str) -> Result<String, ApiError> {
    let request: CurveRequest = serde_json::from_str(body)?;
    if request.operators.is_empty() {
        return Err(ApiError::BadRequest("operators must not be empty".to_string()));
    }
    let subjects = curve_subjects(state, &request.operators)?;
    let points = project_curve(&subjects, &request.axis.into_config())?;
    data(points)
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub trust: Option<u32>,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustBonus {
    pub trust: u32,
    pub bonus: Attributes,
}

/// Keeps only the requested top-level fields of a record.
fn select_fields(record: Value, fields: Option<&[String]>) -> Value {
    match (record, fields) {
        (Value::Object(map), Some(fields)) if !fields.is_empty() => Value::Object(
            map.into_iter()
                .filter(|(key, _)| fields.iter().any(|field| field == key))
                .collect(),
        ),
        (record, _) => record,
    }
}

pub fn static_payload(state: &AppState, body: &str) -> Result<String, ApiError> {
    let request: StaticRequest = serde_json::from_str(body)?;
    let fields = request.fields.as_deref();
    match request.kind.as_str() {
        "operators" => match request.id.as_deref() {
            Some(id) => {
                let record = serde_json::to_value(find_operator(state, id)?).map_err(internal)?;
                data(select_fields(record, fields))
            }
            None => {
                let records = state
                    .store
                    .operators()
                    .iter()
                    .map(|operator| {
                        serde_json::to_value(operator).map(|record| select_fields(record, fields))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(internal)?;
                data(records)
            }
        },
        "modules" => {
            let id = request
                .id
                .as_deref()
                .ok_or_else(|| ApiError::BadRequest("modules requires an operator id".into()))?;
            data(&find_operator(state, id)?.modules)
        }
        "trust" => {
            let id = request
                .id
                .as_deref()
                .ok_or_else(|| ApiError::BadRequest("trust requires an operator id".into()))?;
            let operator = find_operator(state, id)?;
            let trust = request.trust.unwrap_or(DEFAULT_TRUST);
            let bonus = apply_trust(operator, trust, Attributes::new(), &mut Vec::new())?;
            data(TrustBonus { trust, bonus })
        }
        known if STATIC_TYPES.contains(&known) => {
            let method = request
                .method
                .as_deref()
                .map(|method| format!(" ({method})"))
                .unwrap_or_default();
            Err(ApiError::NotImplemented(format!(
                "type '{known}'{method} is not served by this instance"
            )))
        }
        _ => Err(ApiError::BadRequest("Invalid type.".to_string())),
    }
}
