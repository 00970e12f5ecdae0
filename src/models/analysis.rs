//! Wire types for the analysis backend.
//!
//! `GET /health` answers `{ "ok": bool }`. `POST /analyze` takes an
//! [`AnalysisRequest`] and answers an [`AnalyzeResponse`] on success or a
//! `{ "detail": ... }` body on failure.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::patient::PatientParameters;
use crate::error::ParameterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecimenHint {
    Blood,
    Urine,
    Sputum,
    Wound,
    Other,
}

impl SpecimenHint {
    pub const ALL: [SpecimenHint; 5] = [
        SpecimenHint::Blood,
        SpecimenHint::Urine,
        SpecimenHint::Sputum,
        SpecimenHint::Wound,
        SpecimenHint::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecimenHint::Blood => "blood",
            SpecimenHint::Urine => "urine",
            SpecimenHint::Sputum => "sputum",
            SpecimenHint::Wound => "wound",
            SpecimenHint::Other => "other",
        }
    }
}

impl FromStr for SpecimenHint {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParameterError::not_an_option("specimen_hint", s))
    }
}

impl fmt::Display for SpecimenHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /analyze`. Built fresh for every submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    report_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    specimen_hint: Option<SpecimenHint>,
    patient: PatientParameters,
    debug: bool,
}

impl AnalysisRequest {
    pub fn new(
        report_text: String,
        specimen_hint: Option<SpecimenHint>,
        patient: PatientParameters,
        debug: bool,
    ) -> Self {
        Self {
            report_text,
            specimen_hint,
            patient,
            debug,
        }
    }

    pub fn report_text(&self) -> &str {
        &self.report_text
    }

    pub fn specimen_hint(&self) -> Option<SpecimenHint> {
        self.specimen_hint
    }

    pub fn patient(&self) -> &PatientParameters {
        &self.patient
    }

    pub fn debug(&self) -> bool {
        self.debug
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzeStatus {
    RecommendationReady,
    NeedsMoreInfo,
    NeedsReview,
    NoSafeOption,
    #[default]
    #[serde(other)]
    Unknown,
}

impl AnalyzeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzeStatus::RecommendationReady => "recommendation_ready",
            AnalyzeStatus::NeedsMoreInfo => "needs_more_info",
            AnalyzeStatus::NeedsReview => "needs_review",
            AnalyzeStatus::NoSafeOption => "no_safe_option",
            AnalyzeStatus::Unknown => "unknown",
        }
    }
}

/// One dosing regimen. Only drug, dose and frequency are guaranteed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Regimen {
    pub drug: String,
    pub dose: String,
    pub frequency: String,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub primary: Option<Regimen>,
    #[serde(default)]
    pub alternatives: Vec<Regimen>,
    pub rationale: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub missing_info: Vec<String>,
}

/// Successful `/analyze` body. Fields the client does not render are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub status: AnalyzeStatus,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub safety_note: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    msg: String,
}

/// First `detail[].msg` of a failure body.
///
/// Returns `None` unless `detail` is a non-empty list whose every entry
/// carries a string `msg`.
pub fn detail_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    parsed.detail.into_iter().next().map(|d| d.msg)
}
