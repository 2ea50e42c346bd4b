use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use licita_pdf_to_csv::server::{self, ServerConfig};
use licita_pdf_to_csv::{
    ExtractOptions, ExtractionReport, FilterParams, HeaderPolicy, PageSelection, QualityMode,
    extract_tables_from_bytes, extract_tables_from_path, fetch_document, filter_table,
    write_view_csv,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "licita2csv",
    version,
    about = "Extract procurement line-item tables from PDFs into CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract tables, infer column roles and write filtered CSV output.
    Extract(ExtractArgs),
    /// Serve the extraction pipeline over HTTP.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long, required_unless_present = "url", conflicts_with = "url")]
    input: Option<PathBuf>,

    /// Fetch the input PDF from this URL instead of a local file.
    #[arg(short, long)]
    url: Option<String>,

    /// Output CSV path.
    #[arg(short, long)]
    output: PathBuf,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Case-insensitive substring filter applied across all columns.
    #[arg(short, long)]
    query: Option<String>,

    /// Keep only rows whose cost-center column equals this value exactly
    /// ("all" disables the filter).
    #[arg(long)]
    cost_center: Option<String>,

    /// Keep the first row of every fragment instead of dropping it as a header.
    #[arg(long, conflicts_with = "auto_header")]
    keep_first_row: bool,

    /// Infer per fragment whether the first row is a header.
    #[arg(long, conflicts_with = "keep_first_row")]
    auto_header: bool,

    /// Minimum cells required per candidate grid row.
    #[arg(long, default_value_t = 2)]
    min_cols: usize,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Fail on low-confidence grids instead of keeping them.
    #[arg(long, conflicts_with = "skip_ambiguous")]
    strict: bool,

    /// Drop low-confidence grids instead of keeping them.
    #[arg(long, conflicts_with = "strict")]
    skip_ambiguous: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Bind address, host:port.
    #[arg(long, default_value = "127.0.0.1:8799")]
    addr: String,

    /// Minimum cells required per candidate grid row.
    #[arg(long, default_value_t = 2)]
    min_cols: usize,
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    let pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid page selection: {error}"))
        .context("failed to parse --pages")?;

    let header_policy = if args.keep_first_row {
        HeaderPolicy::Keep
    } else if args.auto_header {
        HeaderPolicy::Auto
    } else {
        HeaderPolicy::StripFirst
    };

    let quality_mode = if args.strict {
        QualityMode::Strict
    } else if args.skip_ambiguous {
        QualityMode::SkipAmbiguous
    } else {
        QualityMode::BestEffort
    };

    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    Ok(ExtractOptions {
        pages,
        delimiter: args.delimiter as u8,
        header_policy,
        quality_mode,
        min_cols: args.min_cols,
        ..ExtractOptions::default()
    })
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?} fragment={:?} confidence={:?}: {}",
                warning.code, warning.page, warning.fragment_id, warning.confidence,
                warning.message
            );
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    let options = parse_options(args)?;

    let (merged, report) = if let Some(url) = &args.url {
        let bytes = fetch_document(url)
            .with_context(|| format!("failed to fetch document from '{url}'"))?;
        extract_tables_from_bytes(&bytes, &options)
            .with_context(|| format!("failed to extract tables from '{url}'"))?
    } else {
        let input = args
            .input
            .as_ref()
            .ok_or_else(|| anyhow!("either --input or --url is required"))?;
        extract_tables_from_path(input, &options)
            .with_context(|| format!("failed to extract tables from '{}'", input.display()))?
    };

    let params = FilterParams::new(args.query.as_deref(), args.cost_center.as_deref());
    let view = filter_table(&merged, &params);
    let filtered_rows = view.rows.len();
    write_view_csv(&args.output, &view, options.delimiter)
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;

    Ok(ExtractionReport {
        row_count: filtered_rows,
        ..report
    })
}

fn run_serve(args: &ServeArgs) -> Result<()> {
    let config = ServerConfig {
        addr: args.addr.clone(),
        options: ExtractOptions {
            min_cols: args.min_cols,
            ..ExtractOptions::default()
        },
    };
    server::run(&config).map_err(|error| anyhow!("server failed: {error}"))
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("licita_pdf_to_csv=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                if report.row_count > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
        Commands::Serve(args) => match run_serve(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
