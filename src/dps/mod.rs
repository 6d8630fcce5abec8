//! DPS curves for comparing operators against a swept enemy defense or
//! resistance, plus the chart-generation guard and CSV export.

pub mod chart;
pub mod curve;
pub mod export_csv;

pub use chart::{
    finish_chart_data, generate_chart_data, ChartError, ChartRequest, ChartSettings, ChartState,
};
pub use curve::{
    arts_hit, physical_hit, project_curve, seconds_per_attack, AxisConfig, AxisKind, CurveBuff,
    CurveError, CurvePoint, CurveSubject, DamageKind,
};
pub use export_csv::{curve_labels, write_curve_csv};
