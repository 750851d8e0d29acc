use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cnpj_common::{Config, EnrichedRecord, InputRow};
use cnpj_enricher::{input, report, BatchRunner, RecordEnricher};
use ibge_client::IbgeClient;

#[derive(Parser)]
#[command(
    name = "cnpj-enricher",
    about = "Bulk CNPJ lookup with IBGE municipality validation and metro-region classification"
)]
struct Cli {
    /// Path to config TOML file (defaults apply when omitted)
    #[arg(long, global = true, env = "CNPJ_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enrich every row of a spreadsheet and write a CSV report
    Batch {
        /// Input file (.xlsx, .xls, .ods or .csv)
        #[arg(long)]
        input: PathBuf,
        /// Report path; overrides [report].output
        #[arg(long)]
        output: Option<PathBuf>,
        /// Worksheet name; overrides [input].sheet
        #[arg(long)]
        sheet: Option<String>,
        /// Only process the first N unique CNPJs
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Look up a single CNPJ and print the enriched record as JSON
    Lookup {
        cnpj: String,
        /// UF the company is expected in
        #[arg(long)]
        state: String,
        /// Municipality the company is expected in
        #[arg(long)]
        municipality: Option<String>,
    },
    /// List Brazilian states from IBGE
    States,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cnpj_enricher=info,cnpj_common=info"));
    if cli.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = Config::load(cli.config.as_deref())?;
    config.log();

    match cli.command {
        Command::Batch {
            input,
            output,
            sheet,
            limit,
        } => run_batch(config, input, output, sheet, limit).await,
        Command::Lookup {
            cnpj,
            state,
            municipality,
        } => run_lookup(config, cnpj, state, municipality).await,
        Command::States => list_states(config).await,
    }
}

async fn run_batch(
    mut config: Config,
    input_path: PathBuf,
    output: Option<PathBuf>,
    sheet: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    if sheet.is_some() {
        config.input.sheet = sheet;
    }
    let output = output.unwrap_or_else(|| config.report.output.clone());

    let rows = input::read_rows(&input_path, &config.input)
        .with_context(|| format!("Failed to read input {}", input_path.display()))?;
    let mut rows = input::dedup_by_cnpj(rows);
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    info!(rows = rows.len(), "Unique CNPJs to query");

    let runner = BatchRunner::new(RecordEnricher::from_config(&config)?, config.report.top_n);

    let progress = ProgressBar::new(rows.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} [{elapsed_precise}] {msg}")?,
    );
    let observer = |index: usize, _total: usize, record: &EnrichedRecord| {
        progress.set_position(index as u64);
        progress.set_message(format!("{} {}", record.cnpj, record.status));
    };

    let result = runner.run(&rows, &observer).await;
    progress.finish_and_clear();

    report::write_report(&output, &result.records, config.report.delimiter)
        .with_context(|| format!("Failed to write report {}", output.display()))?;

    println!("{}", result.summary);
    println!("Report saved to {}", output.display());
    Ok(())
}

async fn run_lookup(
    config: Config,
    cnpj: String,
    state: String,
    municipality: Option<String>,
) -> Result<()> {
    let enricher = RecordEnricher::from_config(&config)?;

    let mut row = InputRow::new(cnpj, state);
    if let Some(municipality) = municipality {
        row = row.with_municipality(municipality);
    }

    let record = enricher.enrich(&row).await;
    println!("{}", serde_json::to_string_pretty(&record)?);
    if let Some(region) = record.metro_region {
        println!("{}", region.name());
    }
    Ok(())
}

async fn list_states(config: Config) -> Result<()> {
    let ibge = IbgeClient::with_base_url(&config.geo_base_url, config.geo_timeout)?;
    let mut states = ibge.states().await?;
    states.sort_by(|a, b| a.code.cmp(&b.code));

    for state in states {
        println!("{}  {}", state.code, state.name);
    }
    Ok(())
}
