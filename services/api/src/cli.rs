use crate::commands::{run_features, run_ingest, run_score, FeaturesArgs, IngestArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use healthalliance::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "HealthAlliance DataSpace",
    about = "Serve readmission risk predictions and run FHIR ingestion for the partner institutions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run the daily FHIR ingestion pipeline against the partner feeds
    Ingest(IngestArgs),
    /// Extract the readmission feature table from a patient CSV
    Features(FeaturesArgs),
    /// Score a single patient without going through the HTTP API
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured port for the Prometheus scrape listener
    #[arg(long)]
    pub(crate) metrics_port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Ingest(args) => run_ingest(args),
        Command::Features(args) => run_features(args),
        Command::Score(args) => run_score(args),
    }
}
