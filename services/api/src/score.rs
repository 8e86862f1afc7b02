use clap::Args;
use ficha_social::config::AppConfig;
use ficha_social::error::AppError;
use ficha_social::records::{
    next_status, CompletenessEvaluator, CompletenessReport, IntakeForm, RecordStatus,
};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON file holding the intake form (same shape as the API payload)
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// Nationality treated as local for the national-id rule (defaults to APP_LOCAL_NATIONALITY)
    #[arg(long)]
    pub(crate) local_nationality: Option<String>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        file,
        local_nationality,
        json,
    } = args;

    let local_nationality = match local_nationality {
        Some(value) => value,
        None => AppConfig::load()?.records.local_nationality,
    };

    let raw = std::fs::read_to_string(&file)?;
    let form: IntakeForm = serde_json::from_str(&raw)?;
    let report = CompletenessEvaluator::new(local_nationality).report(&form);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_report(&report, &file);
    }

    Ok(())
}

fn render_report(report: &CompletenessReport, file: &Path) {
    let status = next_status(report.score, RecordStatus::Incomplete);

    println!("Intake form {}", file.display());
    println!(
        "Completion: {}% ({}/{} tracked fields), status {}",
        report.score,
        report.awarded,
        report.tracked,
        status.label()
    );

    if report.missing.is_empty() {
        println!("\nMissing fields: none");
    } else {
        println!("\nMissing fields");
        for field in &report.missing {
            println!("- {field}");
        }
    }
}
