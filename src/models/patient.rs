use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::catalog::ParameterCatalog;
use crate::error::ParameterError;

pub const MIN_AGE_YEARS: u32 = 18;
pub const MAX_AGE_YEARS: u32 = 110;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Stable,
    Sepsis,
    SepticShock,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenalBucket {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Stable,
        Severity::Sepsis,
        Severity::SepticShock,
        Severity::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Stable => "stable",
            Severity::Sepsis => "sepsis",
            Severity::SepticShock => "septic_shock",
            Severity::Unknown => "unknown",
        }
    }
}

impl RenalBucket {
    pub const ALL: [RenalBucket; 4] = [
        RenalBucket::Normal,
        RenalBucket::Mild,
        RenalBucket::Moderate,
        RenalBucket::Severe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RenalBucket::Normal => "normal",
            RenalBucket::Mild => "mild",
            RenalBucket::Moderate => "moderate",
            RenalBucket::Severe => "severe",
        }
    }
}

impl FromStr for Sex {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParameterError::not_an_option("sex", s))
    }
}

impl FromStr for Severity {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParameterError::not_an_option("severity", s))
    }
}

impl FromStr for RenalBucket {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParameterError::not_an_option("renal_bucket", s))
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RenalBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enumerated form fields that can be set from a raw option string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceField {
    Sex,
    Syndrome,
    Severity,
    RenalBucket,
}

/// Clinical inputs for one session.
///
/// Fields are private so every edit goes through a setter that enforces the
/// field's domain. A rejected edit leaves the record untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientParameters {
    age_years: u32,
    sex: Sex,
    syndrome: String,
    severity: Severity,
    egfr_ml_min: f64,
    renal_bucket: RenalBucket,
    beta_lactam_allergy: bool,
    other_allergies: BTreeSet<String>,
    pregnancy: bool,
    hepatic_impairment: bool,
    interactions: BTreeSet<String>,
}

impl Default for PatientParameters {
    fn default() -> Self {
        Self::with_catalog(&ParameterCatalog::default())
    }
}

impl PatientParameters {
    /// Session defaults, using the catalog's first syndrome.
    pub fn with_catalog(catalog: &ParameterCatalog) -> Self {
        Self {
            age_years: 56,
            sex: Sex::Female,
            syndrome: catalog
                .default_syndrome()
                .unwrap_or("empiric_sepsis_unknown")
                .to_string(),
            severity: Severity::Stable,
            egfr_ml_min: 80.0,
            renal_bucket: RenalBucket::Normal,
            beta_lactam_allergy: false,
            other_allergies: BTreeSet::new(),
            pregnancy: false,
            hepatic_impairment: false,
            interactions: BTreeSet::new(),
        }
    }

    pub fn age_years(&self) -> u32 {
        self.age_years
    }

    /// Clamps into the adult range and returns the stored value.
    pub fn set_age_years(&mut self, age: i64) -> u32 {
        let clamped = age.clamp(MIN_AGE_YEARS as i64, MAX_AGE_YEARS as i64) as u32;
        self.age_years = clamped;
        clamped
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn set_sex(&mut self, sex: Sex) {
        self.sex = sex;
    }

    pub fn syndrome(&self) -> &str {
        &self.syndrome
    }

    pub fn set_syndrome(
        &mut self,
        code: &str,
        catalog: &ParameterCatalog,
    ) -> Result<(), ParameterError> {
        if !catalog.has_syndrome(code) {
            return Err(ParameterError::not_an_option("syndrome", code));
        }
        self.syndrome = code.to_string();
        Ok(())
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn set_severity(&mut self, severity: Severity) {
        self.severity = severity;
    }

    pub fn egfr_ml_min(&self) -> f64 {
        self.egfr_ml_min
    }

    /// Negative values clamp to zero; NaN and infinities are refused.
    pub fn set_egfr_ml_min(&mut self, egfr: f64) -> Result<f64, ParameterError> {
        if !egfr.is_finite() {
            return Err(ParameterError::NotFinite {
                field: "egfr_ml_min",
                value: egfr,
            });
        }
        self.egfr_ml_min = egfr.max(0.0);
        Ok(self.egfr_ml_min)
    }

    pub fn renal_bucket(&self) -> RenalBucket {
        self.renal_bucket
    }

    pub fn set_renal_bucket(&mut self, bucket: RenalBucket) {
        self.renal_bucket = bucket;
    }

    pub fn beta_lactam_allergy(&self) -> bool {
        self.beta_lactam_allergy
    }

    pub fn set_beta_lactam_allergy(&mut self, flag: bool) {
        self.beta_lactam_allergy = flag;
    }

    pub fn other_allergies(&self) -> &BTreeSet<String> {
        &self.other_allergies
    }

    /// Adds the allergy if absent, removes it if present.
    ///
    /// Returns whether the allergy is held after the toggle.
    pub fn toggle_allergy(
        &mut self,
        allergy: &str,
        catalog: &ParameterCatalog,
    ) -> Result<bool, ParameterError> {
        if !catalog.has_allergy(allergy) {
            return Err(ParameterError::not_an_option("other_allergies", allergy));
        }
        Ok(toggle(&mut self.other_allergies, allergy))
    }

    pub fn pregnancy(&self) -> bool {
        self.pregnancy
    }

    pub fn set_pregnancy(&mut self, flag: bool) {
        self.pregnancy = flag;
    }

    pub fn hepatic_impairment(&self) -> bool {
        self.hepatic_impairment
    }

    pub fn set_hepatic_impairment(&mut self, flag: bool) {
        self.hepatic_impairment = flag;
    }

    pub fn interactions(&self) -> &BTreeSet<String> {
        &self.interactions
    }

    pub fn toggle_interaction(
        &mut self,
        interaction: &str,
        catalog: &ParameterCatalog,
    ) -> Result<bool, ParameterError> {
        if !catalog.has_interaction(interaction) {
            return Err(ParameterError::not_an_option("interactions", interaction));
        }
        Ok(toggle(&mut self.interactions, interaction))
    }

    /// Sets an enumerated field from its raw option string.
    pub fn apply_choice(
        &mut self,
        field: ChoiceField,
        value: &str,
        catalog: &ParameterCatalog,
    ) -> Result<(), ParameterError> {
        match field {
            ChoiceField::Sex => self.set_sex(value.parse()?),
            ChoiceField::Syndrome => self.set_syndrome(value, catalog)?,
            ChoiceField::Severity => self.set_severity(value.parse()?),
            ChoiceField::RenalBucket => self.set_renal_bucket(value.parse()?),
        }
        Ok(())
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) -> bool {
    if set.remove(value) {
        false
    } else {
        set.insert(value.to_string());
        true
    }
}
