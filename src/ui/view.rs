//! Result rendering
//!
//! Pure projections from session state to what the user sees. Exactly one
//! [`ResultView`] variant exists per [`AnalysisState`], so a result and an
//! error can never be shown together.

use std::fmt;

use super::session::AnalysisState;
use crate::models::{AnalyzeResponse, AnalyzeStatus, Regimen};
use crate::services::Liveness;

/// Rationale entries shown with a recommendation.
pub const RATIONALE_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    AwaitingInput,
    InFlight,
    Recommendation(RecommendationView),
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryView {
    pub drug: String,
    pub dose: String,
    pub frequency: String,
    pub route: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationView {
    pub status: AnalyzeStatus,
    pub primary: Option<PrimaryView>,
    /// At most [`RATIONALE_LIMIT`] entries, in server order.
    pub rationale: Vec<String>,
    /// Entries received but not shown.
    pub hidden_rationale: usize,
    pub warnings: Vec<String>,
    pub missing_info: Vec<String>,
    pub safety_note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderView {
    pub liveness: Liveness,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub header: HeaderView,
    pub result: ResultView,
}

pub fn render(state: &AnalysisState) -> ResultView {
    match state {
        AnalysisState::Idle => ResultView::AwaitingInput,
        AnalysisState::Submitting { .. } => ResultView::InFlight,
        AnalysisState::Succeeded(response) => {
            ResultView::Recommendation(render_recommendation(response))
        }
        AnalysisState::Failed(message) => ResultView::Error {
            message: message.clone(),
        },
    }
}

pub fn render_session(liveness: Liveness, state: &AnalysisState) -> SessionView {
    SessionView {
        header: HeaderView { liveness },
        result: render(state),
    }
}

fn render_recommendation(response: &AnalyzeResponse) -> RecommendationView {
    let rec = &response.recommendation;
    let shown = rec.rationale.len().min(RATIONALE_LIMIT);

    RecommendationView {
        status: response.status,
        primary: rec.primary.as_ref().map(render_primary),
        rationale: rec.rationale[..shown].to_vec(),
        hidden_rationale: rec.rationale.len() - shown,
        warnings: rec.warnings.clone(),
        missing_info: rec.missing_info.clone(),
        safety_note: response.safety_note.clone(),
    }
}

fn render_primary(regimen: &Regimen) -> PrimaryView {
    PrimaryView {
        drug: regimen.drug.clone(),
        dose: regimen.dose.clone(),
        frequency: regimen.frequency.clone(),
        route: regimen.route.clone(),
        duration: regimen.duration.clone(),
    }
}

impl fmt::Display for HeaderView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AURA  [{}]", self.liveness.label())
    }
}

impl fmt::Display for PrimaryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}  {}", self.drug, self.dose, self.frequency)?;
        if let Some(route) = &self.route {
            write!(f, "  {}", route)?;
        }
        if let Some(duration) = &self.duration {
            write!(f, "  ({})", duration)?;
        }
        Ok(())
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultView::AwaitingInput => write!(f, "Awaiting report and patient parameters."),
            ResultView::InFlight => write!(f, "Analyzing..."),
            ResultView::Error { message } => write!(f, "Error: {}", message),
            ResultView::Recommendation(rec) => {
                writeln!(f, "Recommendation ({})", rec.status.as_str())?;
                match &rec.primary {
                    Some(primary) => writeln!(f, "  Primary: {}", primary)?,
                    None => writeln!(f, "  Primary: No safe primary option")?,
                }
                if !rec.rationale.is_empty() {
                    writeln!(f, "  Rationale:")?;
                    for line in &rec.rationale {
                        writeln!(f, "    - {}", line)?;
                    }
                }
                for warning in &rec.warnings {
                    writeln!(f, "  Warning: {}", warning)?;
                }
                for missing in &rec.missing_info {
                    writeln!(f, "  Missing: {}", missing)?;
                }
                if let Some(note) = &rec.safety_note {
                    writeln!(f, "  Safety: {}", note)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for SessionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        write!(f, "{}", self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recommendation;

    fn response(rationale: &[&str], primary: bool) -> AnalyzeResponse {
        AnalyzeResponse {
            status: AnalyzeStatus::RecommendationReady,
            recommendation: Recommendation {
                primary: primary.then(|| Regimen {
                    drug: "Cefazolin".into(),
                    dose: "2 g".into(),
                    frequency: "q8h".into(),
                    route: Some("IV".into()),
                    duration: None,
                    source: None,
                    notes: None,
                }),
                alternatives: vec![],
                rationale: rationale.iter().map(|s| s.to_string()).collect(),
                warnings: vec![],
                missing_info: vec![],
            },
            safety_note: None,
        }
    }

    #[test]
    fn each_state_has_one_view() {
        assert_eq!(render(&AnalysisState::Idle), ResultView::AwaitingInput);
        assert_eq!(render(&AnalysisState::Submitting { attempt: 1 }), ResultView::InFlight);
        assert_eq!(
            render(&AnalysisState::Failed("bad syndrome code".into())),
            ResultView::Error {
                message: "bad syndrome code".into()
            }
        );
    }

    #[test]
    fn rationale_keeps_order_and_caps_at_three() {
        let state = AnalysisState::Succeeded(response(&["a", "b", "c", "d", "e"], true));
        let ResultView::Recommendation(rec) = render(&state) else {
            panic!("expected recommendation view");
        };
        assert_eq!(rec.rationale, vec!["a", "b", "c"]);
        assert_eq!(rec.hidden_rationale, 2);

        // Source data is untouched.
        let AnalysisState::Succeeded(resp) = &state else { unreachable!() };
        assert_eq!(resp.recommendation.rationale.len(), 5);
    }

    #[test]
    fn short_rationale_is_shown_whole() {
        let state = AnalysisState::Succeeded(response(&["only"], true));
        let ResultView::Recommendation(rec) = render(&state) else {
            panic!("expected recommendation view");
        };
        assert_eq!(rec.rationale, vec!["only"]);
        assert_eq!(rec.hidden_rationale, 0);
    }

    #[test]
    fn primary_line_renders_drug_dose_frequency() {
        let view = render(&AnalysisState::Succeeded(response(&["x"], true)));
        let text = view.to_string();
        assert!(text.contains("Cefazolin  2 g  q8h  IV"));
    }

    #[test]
    fn missing_primary_is_explicit() {
        let view = render(&AnalysisState::Succeeded(response(&[], false)));
        assert!(view.to_string().contains("No safe primary option"));
    }

    #[test]
    fn error_renders_message_verbatim() {
        let view = render(&AnalysisState::Failed("Analysis request failed.".into()));
        assert_eq!(view.to_string(), "Error: Analysis request failed.");
    }

    #[test]
    fn header_shows_liveness_label() {
        let view = render_session(Liveness::Down, &AnalysisState::Idle);
        assert_eq!(view.header.to_string(), "AURA  [Offline]");
    }
}
