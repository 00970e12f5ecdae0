//! AURA client
//!
//! Runs one analysis from the command line and prints the rendered result.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use aura::config;
use aura::models::{RenalBucket, Severity, Sex, SpecimenHint};
use aura::services::{EntryMode, HttpBackend, PlainTextExtractor, ReportFile};
use aura::ui::{Message, ResultView, Runtime, Session, SessionOptions};

#[derive(Parser)]
#[command(name = "aura", about = "Antimicrobial recommendation from a microbiology culture report")]
struct Cli {
    /// Extra configuration file layered over config/default
    #[arg(long)]
    config: Option<PathBuf>,
    /// Report text as pasted from the lab system
    #[arg(long, conflicts_with = "report_file")]
    report_text: Option<String>,
    /// Report file (.txt, .pdf, .png, .jpg)
    #[arg(long)]
    report_file: Option<PathBuf>,
    #[arg(long)]
    age: Option<i64>,
    #[arg(long)]
    sex: Option<Sex>,
    #[arg(long)]
    syndrome: Option<String>,
    #[arg(long)]
    severity: Option<Severity>,
    #[arg(long)]
    renal: Option<RenalBucket>,
    #[arg(long)]
    egfr: Option<f64>,
    #[arg(long)]
    beta_lactam_allergy: bool,
    #[arg(long = "allergy")]
    allergies: Vec<String>,
    #[arg(long = "interaction")]
    interactions: Vec<String>,
    #[arg(long)]
    pregnancy: bool,
    #[arg(long)]
    hepatic_impairment: bool,
    #[arg(long)]
    specimen: Option<SpecimenHint>,
}

impl Cli {
    fn entry_mode(&self, configured: EntryMode) -> EntryMode {
        if self.report_file.is_some() {
            EntryMode::File
        } else if self.report_text.is_some() {
            EntryMode::Text
        } else {
            configured
        }
    }

    /// Parameter edits in the order a user would make them.
    fn edits(&self) -> Vec<Message> {
        let mut edits = Vec::new();
        if let Some(age) = self.age {
            edits.push(Message::AgeChanged(age));
        }
        if let Some(sex) = self.sex {
            edits.push(Message::SexSelected(sex));
        }
        if let Some(syndrome) = &self.syndrome {
            edits.push(Message::SyndromeSelected(syndrome.clone()));
        }
        if let Some(severity) = self.severity {
            edits.push(Message::SeveritySelected(severity));
        }
        if let Some(egfr) = self.egfr {
            edits.push(Message::EgfrChanged(egfr));
        }
        if let Some(renal) = self.renal {
            edits.push(Message::RenalBucketSelected(renal));
        }
        if self.beta_lactam_allergy {
            edits.push(Message::BetaLactamAllergySet(true));
        }
        edits.extend(self.allergies.iter().cloned().map(Message::AllergyToggled));
        edits.extend(self.interactions.iter().cloned().map(Message::InteractionToggled));
        if self.pregnancy {
            edits.push(Message::PregnancySet(true));
        }
        if self.hepatic_impairment {
            edits.push(Message::HepaticImpairmentSet(true));
        }
        if self.specimen.is_some() {
            edits.push(Message::SpecimenHintSelected(self.specimen));
        }
        edits
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let settings =
        config::load_from(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize logger
    aura::telemetry::init(&settings.logging);

    let backend = HttpBackend::new(&settings.backend).context("Failed to create HTTP client")?;
    info!(base_url = %backend.base_url(), "Using analysis backend");

    let options = SessionOptions {
        catalog: settings.catalog.clone(),
        entry_mode: cli.entry_mode(settings.analysis.entry_mode),
        debug: settings.analysis.debug,
    };
    let (session, probe) = Session::new(Arc::new(backend), Arc::new(PlainTextExtractor), options);
    let mut runtime = Runtime::new(session, probe);

    for edit in cli.edits() {
        runtime.dispatch(edit);
        if let Some(rejected) = runtime.session().rejected_edit() {
            eprintln!("Ignored: {}", rejected);
        }
    }

    if let Some(path) = &cli.report_file {
        let file = ReportFile::from_path(path)
            .await
            .with_context(|| format!("Cannot use report file {}", path.display()))?;
        runtime.dispatch(Message::FileSelected(file));
    }
    if let Some(text) = &cli.report_text {
        runtime.dispatch(Message::ReportTextChanged(text.clone()));
    }

    runtime.dispatch(Message::Submit);
    runtime.settle().await;

    let session = runtime.session();
    let patient = session.patient();
    println!(
        "Patient: {} y, {}, {}",
        patient.age_years(),
        patient.sex(),
        session.syndrome_label()
    );

    let view = session.view();
    println!("{}", view);

    Ok(match view.result {
        ResultView::Error { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}
