//! Analysis session: the form state and the analysis state machine.
//!
//! All session state lives in [`Session`] and only changes through
//! [`Session::update`]. Network work is returned as a [`Command`] whose
//! result comes back as another [`Message`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::command::Command;
use super::view::{self, SessionView};
use crate::error::{BackendError, ParameterError};
use crate::models::{
    AnalysisRequest, AnalyzeResponse, ChoiceField, ParameterCatalog, PatientParameters, RenalBucket,
    Severity, Sex, SpecimenHint,
};
use crate::services::liveness::{self, Liveness};
use crate::services::report::{EntryMode, ReportFile, ReportInput, TextExtractor};
use crate::services::AnalysisBackend;

#[derive(Debug, Clone)]
pub enum Message {
    AgeChanged(i64),
    SexSelected(Sex),
    SyndromeSelected(String),
    SeveritySelected(Severity),
    EgfrChanged(f64),
    RenalBucketSelected(RenalBucket),
    BetaLactamAllergySet(bool),
    AllergyToggled(String),
    InteractionToggled(String),
    PregnancySet(bool),
    HepaticImpairmentSet(bool),
    /// An enumerated field edited from its raw option string.
    ChoiceEntered(ChoiceField, String),
    SpecimenHintSelected(Option<SpecimenHint>),
    ReportTextChanged(String),
    FileSelected(ReportFile),
    FileDiscarded,
    Submit,
    Reset,
    AnalysisCompleted {
        attempt: u64,
        result: Result<AnalyzeResponse, BackendError>,
    },
    HealthChecked(Liveness),
}

/// Where the current analysis attempt stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AnalysisState {
    #[default]
    Idle,
    Submitting {
        attempt: u64,
    },
    Succeeded(AnalyzeResponse),
    Failed(String),
}

impl AnalysisState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, AnalysisState::Submitting { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub catalog: ParameterCatalog,
    pub entry_mode: EntryMode,
    pub debug: bool,
}

pub struct Session {
    backend: Arc<dyn AnalysisBackend>,
    extractor: Arc<dyn TextExtractor>,
    catalog: ParameterCatalog,
    patient: PatientParameters,
    specimen_hint: Option<SpecimenHint>,
    report: ReportInput,
    debug: bool,
    liveness: Liveness,
    analysis: AnalysisState,
    attempts: u64,
    rejected_edit: Option<ParameterError>,
}

impl Session {
    /// Creates the session and the one-shot liveness probe for it.
    pub fn new(
        backend: Arc<dyn AnalysisBackend>,
        extractor: Arc<dyn TextExtractor>,
        options: SessionOptions,
    ) -> (Self, Command) {
        let probe_backend = Arc::clone(&backend);
        let probe = Command::perform(
            async move { liveness::probe(probe_backend.as_ref()).await },
            Message::HealthChecked,
        );

        let session = Self {
            backend,
            extractor,
            patient: PatientParameters::with_catalog(&options.catalog),
            catalog: options.catalog,
            specimen_hint: None,
            report: ReportInput::new(options.entry_mode),
            debug: options.debug,
            liveness: Liveness::Unknown,
            analysis: AnalysisState::Idle,
            attempts: 0,
            rejected_edit: None,
        };

        (session, probe)
    }

    pub fn patient(&self) -> &PatientParameters {
        &self.patient
    }

    /// Display label of the selected syndrome, falling back to its code.
    pub fn syndrome_label(&self) -> &str {
        let code = self.patient.syndrome();
        self.catalog.syndrome_label(code).unwrap_or(code)
    }

    pub fn specimen_hint(&self) -> Option<SpecimenHint> {
        self.specimen_hint
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    pub fn analysis(&self) -> &AnalysisState {
        &self.analysis
    }

    pub fn is_submitting(&self) -> bool {
        self.analysis.is_submitting()
    }

    /// The most recent refused parameter edit, cleared by the next accepted one.
    pub fn rejected_edit(&self) -> Option<&ParameterError> {
        self.rejected_edit.as_ref()
    }

    pub fn view(&self) -> SessionView {
        view::render_session(self.liveness, &self.analysis)
    }

    pub fn update(&mut self, message: Message) -> Command {
        match message {
            Message::AgeChanged(age) => {
                self.patient.set_age_years(age);
                self.accept_edit();
            }
            Message::SexSelected(sex) => {
                self.patient.set_sex(sex);
                self.accept_edit();
            }
            Message::SyndromeSelected(code) => {
                let result = self.patient.set_syndrome(&code, &self.catalog);
                self.record_edit(result);
            }
            Message::SeveritySelected(severity) => {
                self.patient.set_severity(severity);
                self.accept_edit();
            }
            Message::EgfrChanged(egfr) => {
                let result = self.patient.set_egfr_ml_min(egfr).map(|_| ());
                self.record_edit(result);
            }
            Message::RenalBucketSelected(bucket) => {
                self.patient.set_renal_bucket(bucket);
                self.accept_edit();
            }
            Message::BetaLactamAllergySet(flag) => {
                self.patient.set_beta_lactam_allergy(flag);
                self.accept_edit();
            }
            Message::AllergyToggled(allergy) => {
                let result = self.patient.toggle_allergy(&allergy, &self.catalog).map(|_| ());
                self.record_edit(result);
            }
            Message::InteractionToggled(interaction) => {
                let result = self
                    .patient
                    .toggle_interaction(&interaction, &self.catalog)
                    .map(|_| ());
                self.record_edit(result);
            }
            Message::PregnancySet(flag) => {
                self.patient.set_pregnancy(flag);
                self.accept_edit();
            }
            Message::HepaticImpairmentSet(flag) => {
                self.patient.set_hepatic_impairment(flag);
                self.accept_edit();
            }
            Message::ChoiceEntered(field, value) => {
                let result = self.patient.apply_choice(field, &value, &self.catalog);
                self.record_edit(result);
            }
            Message::SpecimenHintSelected(hint) => {
                self.specimen_hint = hint;
            }
            Message::ReportTextChanged(text) => {
                if !self.report.set_text(text) {
                    debug!("Ignoring typed report text in file entry mode");
                }
            }
            Message::FileSelected(file) => {
                let name = file.name().to_string();
                if self.report.select_file(file) {
                    info!(file = %name, "Report file selected");
                } else {
                    debug!(file = %name, "Ignoring report file in text entry mode");
                }
            }
            Message::FileDiscarded => {
                if self.report.discard_file() {
                    info!("Report file discarded");
                }
            }
            Message::Submit => return self.submit(),
            Message::Reset => self.reset(),
            Message::AnalysisCompleted { attempt, result } => self.complete(attempt, result),
            Message::HealthChecked(status) => self.settle_liveness(status),
        }

        Command::none()
    }

    fn accept_edit(&mut self) {
        self.rejected_edit = None;
    }

    fn record_edit(&mut self, result: Result<(), ParameterError>) {
        match result {
            Ok(()) => self.rejected_edit = None,
            Err(e) => {
                warn!(error = %e, "Rejected parameter edit");
                self.rejected_edit = Some(e);
            }
        }
    }

    fn submit(&mut self) -> Command {
        if self.analysis.is_submitting() {
            debug!("Submission already in flight, ignoring trigger");
            return Command::none();
        }

        let report_text = match self.report.payload(self.extractor.as_ref()) {
            Ok(Some(text)) => text,
            Ok(None) => {
                info!("Submission refused: no report payload");
                self.analysis = AnalysisState::Failed(self.report.validation_message().to_string());
                return Command::none();
            }
            Err(e) => {
                warn!(error = %e, "Submission refused: report could not be read");
                self.analysis = AnalysisState::Failed(e.to_string());
                return Command::none();
            }
        };

        self.attempts += 1;
        let attempt = self.attempts;
        let request = AnalysisRequest::new(
            report_text,
            self.specimen_hint,
            self.patient.clone(),
            self.debug,
        );

        info!(
            attempt,
            report_len = request.report_text().len(),
            syndrome = %request.patient().syndrome(),
            "Submitting analysis"
        );
        self.analysis = AnalysisState::Submitting { attempt };

        let backend = Arc::clone(&self.backend);
        Command::perform(
            async move { backend.analyze(&request).await },
            move |result| Message::AnalysisCompleted { attempt, result },
        )
    }

    fn complete(&mut self, attempt: u64, result: Result<AnalyzeResponse, BackendError>) {
        match self.analysis {
            AnalysisState::Submitting { attempt: current } if current == attempt => {}
            _ => {
                debug!(attempt, "Ignoring stale analysis completion");
                return;
            }
        }

        self.analysis = match result {
            Ok(response) => {
                info!(
                    attempt,
                    status = response.status.as_str(),
                    rationale = response.recommendation.rationale.len(),
                    "Analysis succeeded"
                );
                AnalysisState::Succeeded(response)
            }
            Err(e) => {
                warn!(attempt, error = %e, "Analysis failed");
                AnalysisState::Failed(e.user_message())
            }
        };
    }

    fn reset(&mut self) {
        if self.analysis.is_submitting() {
            debug!("Cannot reset while a submission is in flight");
            return;
        }
        self.analysis = AnalysisState::Idle;
    }

    fn settle_liveness(&mut self, status: Liveness) {
        if self.liveness.is_settled() {
            debug!(current = %self.liveness, "Liveness already settled, ignoring");
            return;
        }
        self.liveness = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GENERIC_FAILURE_MESSAGE;
    use crate::models::{AnalyzeStatus, Recommendation, Regimen};
    use crate::services::backend::MockAnalysisBackend;
    use crate::services::report::{
        PlainTextExtractor, FILE_EMPTY_MESSAGE, FILE_REQUIRED_MESSAGE, TEXT_REQUIRED_MESSAGE,
    };
    use futures::future::join_all;

    fn sample_response() -> AnalyzeResponse {
        AnalyzeResponse {
            status: AnalyzeStatus::RecommendationReady,
            recommendation: Recommendation {
                primary: Some(Regimen {
                    drug: "Piperacillin-tazobactam".into(),
                    dose: "4.5 g".into(),
                    frequency: "q6h".into(),
                    route: Some("IV".into()),
                    duration: None,
                    source: None,
                    notes: None,
                }),
                alternatives: vec![],
                rationale: vec!["Susceptible on AST".into()],
                warnings: vec![],
                missing_info: vec![],
            },
            safety_note: None,
        }
    }

    fn session_with(backend: MockAnalysisBackend, mode: EntryMode) -> Session {
        let options = SessionOptions {
            entry_mode: mode,
            debug: true,
            ..Default::default()
        };
        // Probe command is dropped unpolled, so health is never called.
        let (session, _probe) =
            Session::new(Arc::new(backend), Arc::new(PlainTextExtractor), options);
        session
    }

    async fn run(cmd: Command) -> Vec<Message> {
        join_all(cmd.into_futures()).await
    }

    #[tokio::test]
    async fn empty_text_fails_validation_without_network() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_analyze().never();
        let mut session = session_with(backend, EntryMode::Text);

        let _ = session.update(Message::ReportTextChanged("   \n".into()));
        let cmd = session.update(Message::Submit);

        assert!(cmd.is_none());
        assert_eq!(session.analysis(), &AnalysisState::Failed(TEXT_REQUIRED_MESSAGE.into()));
    }

    #[tokio::test]
    async fn file_mode_without_file_fails_validation() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_analyze().never();
        let mut session = session_with(backend, EntryMode::File);

        let cmd = session.update(Message::Submit);

        assert!(cmd.is_none());
        assert_eq!(session.analysis(), &AnalysisState::Failed(FILE_REQUIRED_MESSAGE.into()));
    }

    #[tokio::test]
    async fn blank_file_fails_validation_without_network() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_analyze().never();
        let mut session = session_with(backend, EntryMode::File);

        let file = ReportFile::new("culture.txt", b"  \n".to_vec()).unwrap();
        let _ = session.update(Message::FileSelected(file));
        let cmd = session.update(Message::Submit);

        assert!(cmd.is_none());
        assert_eq!(session.analysis(), &AnalysisState::Failed(FILE_EMPTY_MESSAGE.into()));
    }

    #[test]
    fn syndrome_label_follows_selection() {
        let mut session = session_with(MockAnalysisBackend::new(), EntryMode::Text);
        assert_eq!(session.syndrome_label(), "Empiric sepsis (source unknown)");

        let _ = session.update(Message::SyndromeSelected("gn_bacteremia".into()));
        assert_eq!(session.syndrome_label(), "Gram-negative bacteremia");
    }

    #[tokio::test]
    async fn successful_submission_round_trip() {
        let mut backend = MockAnalysisBackend::new();
        backend
            .expect_analyze()
            .times(1)
            .withf(|req| req.report_text() == "E. COLI" && req.debug())
            .returning(|_| Ok(sample_response()));
        let mut session = session_with(backend, EntryMode::Text);

        let _ = session.update(Message::ReportTextChanged("E. COLI".into()));
        let cmd = session.update(Message::Submit);
        assert_eq!(session.analysis(), &AnalysisState::Submitting { attempt: 1 });

        for msg in run(cmd).await {
            let _ = session.update(msg);
        }

        assert_eq!(session.analysis(), &AnalysisState::Succeeded(sample_response()));
    }

    #[tokio::test]
    async fn second_trigger_while_submitting_is_ignored() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_analyze().times(1).returning(|_| Ok(sample_response()));
        let mut session = session_with(backend, EntryMode::Text);

        let _ = session.update(Message::ReportTextChanged("E. COLI".into()));
        let first = session.update(Message::Submit);
        let second = session.update(Message::Submit);
        let third = session.update(Message::Submit);

        assert_eq!(first.len(), 1);
        assert!(second.is_none());
        assert!(third.is_none());

        for msg in run(first).await {
            let _ = session.update(msg);
        }
        assert!(matches!(session.analysis(), AnalysisState::Succeeded(_)));
    }

    #[tokio::test]
    async fn backend_detail_becomes_failure_message() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_analyze().times(1).returning(|_| {
            Err(BackendError::Status {
                status: 422,
                detail: Some("bad syndrome code".into()),
            })
        });
        let mut session = session_with(backend, EntryMode::Text);

        let _ = session.update(Message::ReportTextChanged("E. COLI".into()));
        let cmd = session.update(Message::Submit);
        for msg in run(cmd).await {
            let _ = session.update(msg);
        }

        assert_eq!(session.analysis(), &AnalysisState::Failed("bad syndrome code".into()));
    }

    #[tokio::test]
    async fn transport_failure_is_generic() {
        let mut backend = MockAnalysisBackend::new();
        backend
            .expect_analyze()
            .times(1)
            .returning(|_| Err(BackendError::Timeout(60)));
        let mut session = session_with(backend, EntryMode::Text);

        let _ = session.update(Message::ReportTextChanged("E. COLI".into()));
        let cmd = session.update(Message::Submit);
        for msg in run(cmd).await {
            let _ = session.update(msg);
        }

        assert_eq!(session.analysis(), &AnalysisState::Failed(GENERIC_FAILURE_MESSAGE.into()));
    }

    #[tokio::test]
    async fn resubmission_clears_previous_outcome_then_validation_resets_it() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_analyze().times(2).returning(|_| Ok(sample_response()));
        let mut session = session_with(backend, EntryMode::Text);

        let _ = session.update(Message::ReportTextChanged("E. COLI".into()));
        let cmd = session.update(Message::Submit);
        for msg in run(cmd).await {
            let _ = session.update(msg);
        }
        assert!(matches!(session.analysis(), AnalysisState::Succeeded(_)));

        let cmd = session.update(Message::Submit);
        assert_eq!(session.analysis(), &AnalysisState::Submitting { attempt: 2 });
        for msg in run(cmd).await {
            let _ = session.update(msg);
        }

        let _ = session.update(Message::ReportTextChanged(String::new()));
        let cmd = session.update(Message::Submit);
        assert!(cmd.is_none());
        assert_eq!(session.analysis(), &AnalysisState::Failed(TEXT_REQUIRED_MESSAGE.into()));
    }

    #[tokio::test]
    async fn stale_completion_is_ignored() {
        let backend = MockAnalysisBackend::new();
        let mut session = session_with(backend, EntryMode::Text);

        let _ = session.update(Message::AnalysisCompleted {
            attempt: 7,
            result: Ok(sample_response()),
        });

        assert_eq!(session.analysis(), &AnalysisState::Idle);
    }

    #[tokio::test]
    async fn reset_is_refused_while_submitting() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_analyze().times(1).returning(|_| Ok(sample_response()));
        let mut session = session_with(backend, EntryMode::Text);

        let _ = session.update(Message::ReportTextChanged("E. COLI".into()));
        let cmd = session.update(Message::Submit);
        let _ = session.update(Message::Reset);
        assert!(session.is_submitting());

        for msg in run(cmd).await {
            let _ = session.update(msg);
        }
        let _ = session.update(Message::Reset);
        assert_eq!(session.analysis(), &AnalysisState::Idle);
    }

    #[tokio::test]
    async fn image_file_submits_placeholder_text() {
        let mut backend = MockAnalysisBackend::new();
        backend
            .expect_analyze()
            .times(1)
            .withf(|req| req.report_text().contains("culture.png"))
            .returning(|_| Ok(sample_response()));
        let mut session = session_with(backend, EntryMode::File);

        let file = ReportFile::new("culture.png", vec![0x89, 0x50, 0x4e, 0x47]).unwrap();
        let _ = session.update(Message::FileSelected(file));
        let cmd = session.update(Message::Submit);
        assert_eq!(cmd.len(), 1);

        for msg in run(cmd).await {
            let _ = session.update(msg);
        }
        assert!(matches!(session.analysis(), AnalysisState::Succeeded(_)));
    }

    #[tokio::test]
    async fn unreadable_text_file_fails_locally() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_analyze().never();
        let mut session = session_with(backend, EntryMode::File);

        let file = ReportFile::new("culture.txt", vec![0xff, 0xfe, 0xfd]).unwrap();
        let _ = session.update(Message::FileSelected(file));
        let cmd = session.update(Message::Submit);

        assert!(cmd.is_none());
        assert!(matches!(
            session.analysis(),
            AnalysisState::Failed(msg) if msg.contains("culture.txt")
        ));
    }

    #[test]
    fn rejected_edit_is_recorded_and_cleared() {
        let backend = MockAnalysisBackend::new();
        let mut session = session_with(backend, EntryMode::Text);

        let _ = session.update(Message::SyndromeSelected("viral_pneumonia".into()));
        assert!(session.rejected_edit().is_some());
        assert_eq!(session.patient().syndrome(), "empiric_sepsis_unknown");

        let _ = session.update(Message::ChoiceEntered(ChoiceField::Severity, "sepsis".into()));
        assert!(session.rejected_edit().is_none());
        assert_eq!(session.patient().severity(), Severity::Sepsis);
    }

    #[test]
    fn liveness_settles_once() {
        let backend = MockAnalysisBackend::new();
        let mut session = session_with(backend, EntryMode::Text);
        assert_eq!(session.liveness(), Liveness::Unknown);

        let _ = session.update(Message::HealthChecked(Liveness::Down));
        let _ = session.update(Message::HealthChecked(Liveness::Up));

        assert_eq!(session.liveness(), Liveness::Down);
    }

    #[tokio::test]
    async fn probe_command_reports_health() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_health().times(1).returning(|| Ok(true));
        let (mut session, probe) = Session::new(
            Arc::new(backend),
            Arc::new(PlainTextExtractor),
            SessionOptions::default(),
        );

        for msg in run(probe).await {
            let _ = session.update(msg);
        }
        assert_eq!(session.liveness(), Liveness::Up);
    }
}
