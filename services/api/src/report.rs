use crate::infra::{load_dataset, DatasetPaths};
use allocation_curator::config::AppConfig;
use allocation_curator::curation::{
    run_validations, skill_risks, Dataset, EntityKind, ReadinessSummary, ValidationFinding,
};
use allocation_curator::error::AppError;
use allocation_curator::export::{export_dataset, ExportFormat};
use allocation_curator::ingest::EntityImporter;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DatasetArgs {
    /// Clients file (.csv or .json)
    #[arg(long)]
    pub(crate) clients: Option<PathBuf>,
    /// Workers file (.csv or .json)
    #[arg(long)]
    pub(crate) workers: Option<PathBuf>,
    /// Tasks file (.csv or .json)
    #[arg(long)]
    pub(crate) tasks: Option<PathBuf>,
}

impl DatasetArgs {
    fn load(self) -> Result<Dataset, AppError> {
        let config = AppConfig::load()?;
        let importer = EntityImporter::from_config(&config.curation);
        let paths = DatasetPaths {
            clients: self.clients,
            workers: self.workers,
            tasks: self.tasks,
        };
        load_dataset(&paths, &importer)
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct ValidateArgs {
    #[command(flatten)]
    pub(crate) dataset: DatasetArgs,
    /// Print the findings and summary as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    pub(crate) dataset: DatasetArgs,
    /// Collection to export: clients, workers or tasks
    #[arg(long, value_parser = crate::infra::parse_entity)]
    pub(crate) entity: EntityKind,
    /// Output format: csv or json
    #[arg(long, default_value = "csv")]
    pub(crate) format: String,
    /// Destination file. Defaults to `<entity>.<format>` in the working directory.
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Serialize)]
struct ValidationPayload<'a> {
    findings: &'a [ValidationFinding],
    summary: &'a ReadinessSummary,
    risks: &'a [String],
}

pub(crate) fn run_validation_report(args: ValidateArgs) -> Result<(), AppError> {
    let ValidateArgs { dataset, json } = args;
    let dataset = dataset.load()?;

    let findings = run_validations(&dataset);
    let summary = ReadinessSummary::from_findings(&findings);
    let risks = skill_risks(&dataset);

    if json {
        let payload = ValidationPayload {
            findings: &findings,
            summary: &summary,
            risks: &risks,
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => println!("{}", text),
            Err(err) => println!("Validation payload unavailable: {}", err),
        }
        return Ok(());
    }

    render_validation_report(&dataset, &findings, &summary, &risks);
    Ok(())
}

fn render_validation_report(
    dataset: &Dataset,
    findings: &[ValidationFinding],
    summary: &ReadinessSummary,
    risks: &[String],
) {
    println!("Data readiness report");
    println!(
        "- {} clients | {} workers | {} tasks",
        dataset.clients.len(),
        dataset.workers.len(),
        dataset.tasks.len()
    );
    println!(
        "- Score {}/100 | {} errors | {} warnings | export {}",
        summary.score,
        summary.errors,
        summary.warnings,
        if summary.export_ready {
            "ready"
        } else {
            "blocked"
        }
    );

    if findings.is_empty() {
        println!("\nFindings: none");
    } else {
        println!("\nFindings");
        for finding in findings {
            println!("- {}", finding);
        }
    }

    if !risks.is_empty() {
        println!("\nRecommendations");
        for risk in risks {
            println!("- {}", risk);
        }
    }
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let ExportArgs {
        dataset,
        entity,
        format,
        output,
    } = args;

    let format: ExportFormat = format.parse()?;
    let dataset = dataset.load()?;
    let document = export_dataset(&dataset, entity, format)?;

    let destination = output.unwrap_or_else(|| PathBuf::from(&document.file_name));
    std::fs::write(&destination, &document.body)?;
    println!(
        "Exported {} {} to {}",
        dataset.len_of(entity),
        entity,
        destination.display()
    );
    Ok(())
}
