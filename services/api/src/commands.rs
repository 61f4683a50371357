use crate::infra::parse_date;
use chrono::{Local, NaiveDate};
use clap::Args;
use healthalliance::config::AppConfig;
use healthalliance::error::AppError;
use healthalliance::telemetry;
use healthalliance::workflows::ingestion::{pipeline, DirectorySink, PipelineReport};
use healthalliance::workflows::readmission::{
    explain, FeatureTable, PatientRiskInput, RiskAssessment, RiskComponent, RiskScorer,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct IngestArgs {
    /// Execution date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Root directory for the stored institution bundles
    #[arg(long, default_value = "data/lake")]
    pub(crate) output_dir: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct FeaturesArgs {
    /// Patient CSV with age, num_conditions, num_medications, recent_encounters and gender columns
    #[arg(long)]
    pub(crate) input: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Identifier echoed back in the assessment
    #[arg(long, default_value = "cli-patient")]
    pub(crate) patient_id: String,
    #[arg(long)]
    pub(crate) age: u32,
    #[arg(long, default_value = "unknown")]
    pub(crate) gender: String,
    /// Comma-separated condition codes
    #[arg(long, value_delimiter = ',')]
    pub(crate) conditions: Vec<String>,
    /// Comma-separated medication names
    #[arg(long, value_delimiter = ',')]
    pub(crate) medications: Vec<String>,
    #[arg(long, default_value_t = 0)]
    pub(crate) recent_encounters: u32,
}

pub(crate) fn run_ingest(args: IngestArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let execution_date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let sink = DirectorySink::new(args.output_dir);
    let report = pipeline::run(&sink, execution_date)?;

    print!("{}", render_ingest_report(&report));
    Ok(())
}

pub(crate) fn run_features(args: FeaturesArgs) -> Result<(), AppError> {
    let file = File::open(&args.input)?;
    let table = FeatureTable::from_csv(BufReader::new(file))?;

    print!("{}", render_feature_table(&table));
    Ok(())
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let input = PatientRiskInput {
        patient_id: args.patient_id,
        age: args.age,
        gender: args.gender,
        conditions: clean_list(args.conditions),
        medications: clean_list(args.medications),
        recent_encounters: args.recent_encounters,
        institution_id: None,
    };

    let (assessment, components) = explain(&RiskScorer::default(), &input);
    print!("{}", render_assessment(&assessment, &components));
    Ok(())
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

fn render_ingest_report(report: &PipelineReport) -> String {
    let mut out = format!("Ingestion run for {}\n", report.execution_date);
    for (institution, stats) in &report.stats {
        out.push_str(&format!(
            "  {:<6} valid={} invalid={}\n",
            institution, stats.valid, stats.invalid
        ));
    }
    for path in &report.written {
        out.push_str(&format!("  wrote {}\n", path.display()));
    }
    out
}

fn render_feature_table(table: &FeatureTable) -> String {
    let header: Vec<&str> = table.columns.iter().map(|column| column.name()).collect();
    let mut out = header.join(",");
    out.push('\n');
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(|value| value.to_string()).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

fn render_assessment(assessment: &RiskAssessment, components: &[RiskComponent]) -> String {
    let mut out = format!(
        "Patient {}\n  readmission risk: {:.2}\n  risk level: {}\n  confidence: {:.2}\n",
        assessment.patient_id,
        assessment.readmission_risk,
        assessment.risk_level,
        assessment.confidence
    );
    if !components.is_empty() {
        out.push_str("  contributing factors:\n");
        for component in components {
            out.push_str(&format!(
                "    - {} (+{:.2})\n",
                component.notes, component.weight
            ));
        }
    }
    out.push_str("  recommendations:\n");
    for step in &assessment.recommendations {
        out.push_str(&format!("    - {step}\n"));
    }
    out
}
