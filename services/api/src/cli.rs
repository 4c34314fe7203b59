use crate::commands::{
    run_cohort, run_curve, run_score, run_subjects, CohortArgs, CurveArgs, ScoreArgs,
    SubjectsArgs,
};
use crate::server;
use atar_calc::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "ATAR Calculator",
    about = "Estimate Queensland ATARs from subject results, or serve the calculator over HTTP",
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
    /// Scale a single subject result
    Score(ScoreArgs),
    /// List the subjects in the loaded scaling tables
    Subjects(SubjectsArgs),
    /// Print the raw -> scaled curve for one subject
    Curve(CurveArgs),
    /// Evaluate a cohort CSV and print TE / ATAR estimates per student
    Cohort(CohortArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Subjects(args) => run_subjects(args),
        Command::Curve(args) => run_curve(args),
        Command::Cohort(args) => run_cohort(args),
    }
}
