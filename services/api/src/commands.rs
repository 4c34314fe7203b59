use crate::infra::{parse_category, parse_variation, resolve_range_mode};
use atar_calc::cohort::{write_cohort_csv, CohortImporter, CohortPipeline, CohortReport};
use atar_calc::config::AppConfig;
use atar_calc::error::AppError;
use atar_calc::format::to_fixed;
use atar_calc::scoring::{
    calculate_scaled_score, scaling_curve, RawResult, ScalingParameterStore, SubjectCategory,
    Variation,
};
use atar_calc::telemetry::{self, LogSink};
use clap::Args;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Subject name as it appears in the scaling tables
    pub(crate) subject: String,
    /// Raw result: a mark from 0 to 100, or a grade such as B or PASS
    pub(crate) result: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SubjectsArgs {
    /// Only list subjects in this category (General, Applied or VET)
    #[arg(long, value_parser = parse_category)]
    pub(crate) category: Option<SubjectCategory>,
}

#[derive(Args, Debug)]
pub(crate) struct CurveArgs {
    /// Subject name as it appears in the scaling tables
    pub(crate) subject: String,
    /// Sampling interval in marks for General subjects
    #[arg(long, default_value_t = 5.0)]
    pub(crate) step: f64,
}

#[derive(Args, Debug)]
pub(crate) struct CohortArgs {
    /// CSV with Student,Subject,Result and optional Lower,Upper columns
    pub(crate) input: PathBuf,
    /// ± marks applied to General results (defaults to ATAR_DEFAULT_VARIATION)
    #[arg(long, value_parser = parse_variation)]
    pub(crate) variation: Option<Variation>,
    /// Use the Lower/Upper columns as per-row ranges
    #[arg(long = "manual", conflicts_with = "variation")]
    pub(crate) manual_ranges: bool,
    /// Write the per-student CSV export to this path
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
    /// Print the full report as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

struct CommandContext {
    store: ScalingParameterStore,
    default_variation: Variation,
}

/// CLI commands log to stderr so stdout carries only the report.
fn load_context() -> Result<CommandContext, AppError> {
    let config = AppConfig::load()?;
    telemetry::init_with_sink(&config.telemetry, LogSink::Stderr)?;
    let store = config.scaling.load_store()?;
    info!(subjects = store.len(), "scaling tables loaded");

    Ok(CommandContext {
        store,
        default_variation: config.scaling.default_variation,
    })
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let context = load_context()?;
    let raw = RawResult::Text(args.result);

    match calculate_scaled_score(&context.store, &args.subject, &raw) {
        Ok(scaled) => println!("{} {} -> scaled score {}", args.subject, raw, to_fixed(scaled, 1)),
        Err(err) => println!("{} {} -> Err ({})", args.subject, raw, err),
    }
    Ok(())
}

pub(crate) fn run_subjects(args: SubjectsArgs) -> Result<(), AppError> {
    let context = load_context()?;

    for category in SubjectCategory::ordered() {
        if args.category.is_some_and(|wanted| wanted != category) {
            continue;
        }

        let subjects: Vec<_> = context
            .store
            .subjects()
            .into_iter()
            .filter(|entry| entry.category() == category)
            .collect();
        if subjects.is_empty() {
            continue;
        }

        println!("{} ({})", category.label(), subjects.len());
        for entry in subjects {
            println!("- {}", entry.subject_name);
        }
    }
    Ok(())
}

pub(crate) fn run_curve(args: CurveArgs) -> Result<(), AppError> {
    let context = load_context()?;
    let curve = scaling_curve(&context.store, &args.subject, args.step)
        .map_err(|err| AppError::InvalidRequest(err.to_string()))?;

    println!("{} ({})", curve.subject, curve.category.label());
    for point in &curve.points {
        println!("  {:>6} -> {}", point.raw_result, to_fixed(point.scaled_score, 1));
    }
    Ok(())
}

pub(crate) fn run_cohort(args: CohortArgs) -> Result<(), AppError> {
    let context = load_context()?;
    let students = CohortImporter::from_path(&args.input)?;
    let mode = resolve_range_mode(args.variation, args.manual_ranges, context.default_variation);
    let report = CohortPipeline::new(&context.store, mode).evaluate_cohort(&students);

    if let Some(path) = &args.export {
        let file = File::create(path)?;
        write_cohort_csv(BufWriter::new(file), &report)?;
        info!(path = %path.display(), "cohort export written");
    }

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|err| AppError::InvalidRequest(err.to_string()))?;
        println!("{json}");
    } else {
        render_cohort_report(&report);
    }
    Ok(())
}

fn render_cohort_report(report: &CohortReport) {
    println!("Cohort estimate ({} students)", report.summary.students);
    for outcome in &report.students {
        let atar = match &outcome.atar_range {
            Some(range) => range.display_string.clone(),
            None => outcome.atar.to_string(),
        };
        println!(
            "- {}: TE {} | ATAR {} | {} counted, {} excluded",
            outcome.student,
            outcome.te.te,
            atar,
            outcome.counted_subjects(),
            outcome.excluded_subjects()
        );
        for error in outcome.errors() {
            println!("    Err {}", error);
        }
    }

    let summary = &report.summary;
    println!(
        "\nEligible {} | Ineligible {}",
        summary.eligible, summary.ineligible
    );
    if let (Some(mean), Some(median)) = (summary.mean_atar, summary.median_atar) {
        println!(
            "Mean ATAR {} | Median ATAR {}",
            to_fixed(mean, 2),
            to_fixed(median, 2)
        );
    }

    println!("\nATAR bands");
    for band in &summary.atar_bands {
        println!("- {}: {}", band.band_label, band.students);
    }

    println!("\nSubjects");
    for subject in &report.subjects {
        let mean = subject
            .mean_scaled_score
            .map(|value| to_fixed(value, 2))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "- {}: {} results, {} errors, mean scaled {}",
            subject.subject, subject.results, subject.errors, mean
        );
    }
}
