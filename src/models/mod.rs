//! Data model for the AURA client
//!
//! Patient parameters, the option catalog they are validated against, and
//! the request/response shapes exchanged with the analysis backend.

pub mod analysis;
pub mod catalog;
pub mod patient;

pub use analysis::{
    AnalysisRequest, AnalyzeResponse, AnalyzeStatus, Recommendation, Regimen, SpecimenHint,
};
pub use catalog::{ParameterCatalog, SyndromeOption};
pub use patient::{ChoiceField, PatientParameters, RenalBucket, Severity, Sex};
