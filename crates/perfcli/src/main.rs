// crates/perfcli/src/main.rs

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use perfcore::{Definitions, FlowElement, ProcessBundle, ProcessDefinition, Settings};
use perfruntime::ProcessAnalyzer;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bpmnperf")]
#[command(about = "Process performance analysis CLI", long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that process bundles are well formed and block structured
    Validate {
        /// Path to a process bundle JSON file
        #[arg(short, long, required = true)]
        file: Vec<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Validate and calculate time and cost performance
    Analyse {
        /// Path to a process bundle JSON file
        #[arg(short, long, required = true)]
        file: Vec<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },

    /// Write an example process bundle
    Init {
        /// Output file path
        #[arg(short, long, default_value = "process.json")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct SettingsArgs {
    /// Settings JSON file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Accept elements without duration or cost
    #[arg(long)]
    ignore_missing_basic: bool,

    /// Accept elements without start and end dates
    #[arg(long)]
    ignore_missing_optional: bool,

    /// Use the values handed down to sub-processes and call activities
    #[arg(long)]
    overwrite_with_parent: bool,

    /// Count duration and cost attached to sequence flows
    #[arg(long)]
    sequence_flows: bool,
}

impl SettingsArgs {
    fn resolve(&self) -> Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => Settings::load(path)
                .with_context(|| format!("reading settings {}", path.display()))?,
            None => Settings::default(),
        };
        settings.ignore_missing_basic_performance |= self.ignore_missing_basic;
        settings.ignore_missing_optional_performance |= self.ignore_missing_optional;
        settings.overwrite_with_parent_performance |= self.overwrite_with_parent;
        settings.consider_performance_in_sequence_flows |= self.sequence_flows;
        Ok(settings)
    }
}

/// Per-file output; a file that cannot be read does not stop the others
#[derive(Serialize)]
struct FileReport<T> {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<Vec<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate { file, settings } => {
            let analyzer = ProcessAnalyzer::new(settings.resolve()?);
            let reports = run_files(file, analyzer, |a, bundle| a.validate(bundle)).await?;
            println!("{}", serde_json::to_string_pretty(&reports)?);

            let any_failed = reports.iter().any(|r| {
                r.error.is_some()
                    || r.results
                        .iter()
                        .flatten()
                        .any(|result| !result.validation_passed)
            });
            if any_failed {
                std::process::exit(1);
            }
        }

        Commands::Analyse {
            file,
            settings,
            pretty,
        } => {
            let analyzer = ProcessAnalyzer::new(settings.resolve()?);
            let reports = run_files(file, analyzer, |a, bundle| a.analyse(bundle)).await?;
            let json = if pretty {
                serde_json::to_string_pretty(&reports)?
            } else {
                serde_json::to_string(&reports)?
            };
            println!("{}", json);
        }

        Commands::Init { output } => {
            create_example_bundle(&output)?;
        }
    }

    Ok(())
}

/// Read and process every file on the blocking pool, keeping argument order
async fn run_files<T, F>(
    files: Vec<PathBuf>,
    analyzer: ProcessAnalyzer,
    run: F,
) -> Result<Vec<FileReport<T>>>
where
    T: Send + 'static,
    F: Fn(&ProcessAnalyzer, &ProcessBundle) -> Vec<T> + Copy + Send + 'static,
{
    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let analyzer = analyzer.clone();
        handles.push(tokio::spawn(async move {
            let name = path.display().to_string();
            tracing::info!("Loading process bundle from: {}", name);
            let outcome = match tokio::fs::read_to_string(&path).await {
                Ok(json) => tokio::task::spawn_blocking(move || {
                    serde_json::from_str::<ProcessBundle>(&json)
                        .map(|bundle| run(&analyzer, &bundle))
                        .map_err(|e| e.to_string())
                })
                .await
                .unwrap_or_else(|e| Err(format!("analysis task failed: {}", e))),
                Err(e) => Err(e.to_string()),
            };
            if let Err(error) = &outcome {
                tracing::error!("Failed to process {}: {}", name, error);
            }
            FileReport {
                file: name,
                results: None,
                error: None,
            }
            .with_outcome(outcome)
        }));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        reports.push(handle.await.context("file task panicked")?);
    }
    Ok(reports)
}

impl<T> FileReport<T> {
    fn with_outcome(mut self, outcome: std::result::Result<Vec<T>, String>) -> Self {
        match outcome {
            Ok(results) => self.results = Some(results),
            Err(error) => self.error = Some(error),
        }
        self
    }
}

fn create_example_bundle(output: &Path) -> Result<()> {
    let mut packing = ProcessDefinition::new("SubProcess_Packing");
    packing.add(FlowElement::start_event("Packing_Start"));
    packing.add(
        FlowElement::task("Task_Pack")
            .with_name("Pack goods")
            .with_duration(1_800_000.0)
            .with_cost(12.0),
    );
    packing.add(FlowElement::end_event("Packing_End"));
    packing.connect("Packing_Start", "Task_Pack")?;
    packing.connect("Task_Pack", "Packing_End")?;

    let mut main = ProcessDefinition::new("Process_Order").with_name("Order handling");
    main.add(FlowElement::start_event("Start"));
    main.add(FlowElement::exclusive_gateway("Check_Split"));
    main.add(
        FlowElement::task("Task_Standard")
            .with_name("Standard check")
            .with_duration(600_000.0)
            .with_cost(5.0),
    );
    main.add(
        FlowElement::task("Task_Detailed")
            .with_name("Detailed check")
            .with_duration(3_600_000.0)
            .with_cost(40.0),
    );
    main.add(FlowElement::exclusive_gateway("Check_Join"));
    main.add(FlowElement::parallel_gateway("Prepare_Split"));
    main.add(
        FlowElement::task("Task_Invoice")
            .with_name("Write invoice")
            .with_duration(900_000.0)
            .with_cost(8.0),
    );
    main.add(
        FlowElement::sub_process("SubProcess_Packing", packing.flow_elements)
            .with_name("Packing"),
    );
    main.add(FlowElement::parallel_gateway("Prepare_Join"));
    main.add(FlowElement::exclusive_gateway("Ship_Join"));
    main.add(
        FlowElement::task("Task_Ship")
            .with_name("Ship parcel")
            .with_duration(1_200_000.0)
            .with_cost(15.0),
    );
    main.add(FlowElement::exclusive_gateway("Ship_Split"));
    main.add(FlowElement::call_activity("Call_Review", "Process_Review").with_name("Review"));
    main.add(FlowElement::end_event("End"));

    main.connect("Start", "Check_Split")?;
    main.connect_with_probability("Check_Split", "Task_Standard", 70.0)?;
    main.connect_with_probability("Check_Split", "Task_Detailed", 30.0)?;
    main.connect("Task_Standard", "Check_Join")?;
    main.connect("Task_Detailed", "Check_Join")?;
    main.connect("Check_Join", "Prepare_Split")?;
    main.connect("Prepare_Split", "Task_Invoice")?;
    main.connect("Prepare_Split", "SubProcess_Packing")?;
    main.connect("Task_Invoice", "Prepare_Join")?;
    main.connect("SubProcess_Packing", "Prepare_Join")?;
    main.connect("Prepare_Join", "Ship_Join")?;
    main.connect("Ship_Join", "Task_Ship")?;
    main.connect("Task_Ship", "Ship_Split")?;
    main.connect_with_probability("Ship_Split", "Ship_Join", 20.0)?;
    main.connect_with_probability("Ship_Split", "Call_Review", 80.0)?;
    main.connect("Call_Review", "End")?;

    let mut review = ProcessDefinition::new("Process_Review");
    review.add(FlowElement::start_event("Review_Start"));
    review.add(
        FlowElement::task("Task_Survey")
            .with_name("Customer survey")
            .with_duration(300_000.0)
            .with_cost(2.0),
    );
    review.add(FlowElement::end_event("Review_End"));
    review.connect("Review_Start", "Task_Survey")?;
    review.connect("Task_Survey", "Review_End")?;

    let bundle = ProcessBundle::new(Definitions::new().with_process(main))
        .with_called(ProcessBundle::new(Definitions::new().with_process(review)));

    let json = serde_json::to_string_pretty(&bundle)?;
    std::fs::write(output, json)?;

    println!("Created example process bundle: {}", output.display());
    println!();
    println!("Analyse it with:");
    println!("  bpmnperf analyse --file {} --pretty", output.display());

    Ok(())
}
