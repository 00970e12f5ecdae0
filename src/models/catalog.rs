//! Configured option lists for the clinical parameter form.
//!
//! The catalog is configuration data: the patient model only checks
//! membership against it, it never interprets the codes.

use serde::{Deserialize, Serialize};

/// A selectable clinical syndrome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyndromeOption {
    pub code: String,
    pub label: String,
}

impl SyndromeOption {
    fn new(code: &str, label: &str) -> Self {
        Self {
            code: code.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterCatalog {
    pub syndromes: Vec<SyndromeOption>,
    pub allergies: Vec<String>,
    pub interactions: Vec<String>,
}

impl Default for ParameterCatalog {
    fn default() -> Self {
        Self {
            syndromes: vec![
                SyndromeOption::new("empiric_sepsis_unknown", "Empiric sepsis (source unknown)"),
                SyndromeOption::new("gn_bacteremia", "Gram-negative bacteremia"),
                SyndromeOption::new("mrsa_bacteremia", "MRSA bacteremia"),
                SyndromeOption::new("enterococcus_bacteremia", "Enterococcus bacteremia"),
                SyndromeOption::new(
                    "line_related_bacteremia",
                    "Central line-associated bacteremia",
                ),
                SyndromeOption::new("uti_source_bacteremia", "UTI-source bacteremia"),
                SyndromeOption::new("pneumonia_source_bacteremia", "Pneumonia-source bacteremia"),
            ],
            allergies: [
                "Vancomycin",
                "Fluoroquinolones",
                "Sulfonamides",
                "Macrolides",
                "Aminoglycosides",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            interactions: [
                "Warfarin",
                "Phenytoin",
                "Methotrexate",
                "Statins",
                "QT-prolonging drugs",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl ParameterCatalog {
    pub fn has_syndrome(&self, code: &str) -> bool {
        self.syndromes.iter().any(|s| s.code == code)
    }

    pub fn has_allergy(&self, allergy: &str) -> bool {
        self.allergies.iter().any(|a| a == allergy)
    }

    pub fn has_interaction(&self, interaction: &str) -> bool {
        self.interactions.iter().any(|i| i == interaction)
    }

    /// Label shown for a syndrome code, if configured.
    pub fn syndrome_label(&self, code: &str) -> Option<&str> {
        self.syndromes
            .iter()
            .find(|s| s.code == code)
            .map(|s| s.label.as_str())
    }

    /// First configured syndrome, used as the session default.
    pub fn default_syndrome(&self) -> Option<&str> {
        self.syndromes.first().map(|s| s.code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_starts_with_empiric_sepsis() {
        let catalog = ParameterCatalog::default();
        assert_eq!(catalog.default_syndrome(), Some("empiric_sepsis_unknown"));
        assert_eq!(catalog.syndromes.len(), 7);
    }

    #[test]
    fn membership_is_exact() {
        let catalog = ParameterCatalog::default();
        assert!(catalog.has_allergy("Vancomycin"));
        assert!(!catalog.has_allergy("vancomycin"));
        assert!(catalog.has_interaction("QT-prolonging drugs"));
        assert!(!catalog.has_syndrome("viral_pneumonia"));
    }

    #[test]
    fn syndrome_label_lookup() {
        let catalog = ParameterCatalog::default();
        assert_eq!(catalog.syndrome_label("gn_bacteremia"), Some("Gram-negative bacteremia"));
        assert_eq!(catalog.syndrome_label("nope"), None);
    }

    #[test]
    fn partial_override_keeps_other_lists() {
        let catalog: ParameterCatalog =
            serde_json::from_str(r#"{ "allergies": ["Linezolid"] }"#).unwrap();
        assert_eq!(catalog.allergies, vec!["Linezolid".to_string()]);
        assert_eq!(catalog.syndromes.len(), 7);
    }
}
