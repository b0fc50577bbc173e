//! ungroup - Expand collection cells of tabular data into rows

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use ungroup::config::{Config, OutputFormat, UngroupSettings};
use ungroup::exec::ExecutionMonitor;
use ungroup::model::UniqueNamePolicy;
use ungroup::output::{render_to_file, render_to_stdout};
use ungroup::parser::ParserFactory;
use ungroup::ungroup_table;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Terminal,
    Csv,
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Terminal => OutputFormat::Terminal,
            CliOutputFormat::Csv => OutputFormat::Csv,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Expand collection cells of tabular data (CSV, Excel, Parquet, JSON) into one row per element
#[derive(Parser, Debug)]
#[command(name = "ungroup")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input file
    input: PathBuf,

    /// Write the result to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (default: from the output file extension, else terminal)
    #[arg(short, long, value_enum)]
    format: Option<CliOutputFormat>,

    /// Collection column(s) to ungroup (comma-separated); default is every collection column
    #[arg(short, long, value_delimiter = ',')]
    column: Vec<String>,

    /// Collection column(s) to leave alone when no --column is given (comma-separated)
    #[arg(long, value_delimiter = ',', conflicts_with = "column")]
    exclude: Vec<String>,

    /// Keep the original collection columns next to the new ones
    #[arg(long)]
    keep_collection_columns: bool,

    /// Drop generated rows whose new values are all missing
    #[arg(long)]
    skip_missing: bool,

    /// Write the original-to-generated row key mapping to this JSON file
    #[arg(long)]
    hilite_out: Option<PathBuf>,

    /// Make new column names unique as NAME<SEP>n instead of "NAME (#n)"
    #[arg(long, value_name = "SEP")]
    name_suffix: Option<String>,

    /// Column(s) whose values form the row keys (comma-separated); default Row0, Row1, ...
    #[arg(short, long, value_delimiter = ',')]
    key: Vec<String>,

    /// For Excel files: which sheet to read
    #[arg(long)]
    sheet: Option<String>,

    /// Only print row counts
    #[arg(long)]
    stats_only: bool,

    /// Terminal output: print at most N rows
    #[arg(long, value_name = "N")]
    max_rows: Option<usize>,

    /// JSON output on a single line
    #[arg(long)]
    compact: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("UNGROUP_LOG")
        .format_timestamp(None)
        .init();
}

fn build_config(cli: Cli) -> Config {
    let output_format = cli
        .format
        .map(OutputFormat::from)
        .or_else(|| cli.output.as_deref().and_then(OutputFormat::from_path))
        .unwrap_or_default();

    let mut settings = UngroupSettings::default()
        .with_remove_collection_columns(!cli.keep_collection_columns)
        .with_skip_missing_values(cli.skip_missing);
    settings = if cli.column.is_empty() {
        settings.with_all_collections_except(cli.exclude)
    } else {
        settings.with_columns(cli.column)
    };
    if let Some(sep) = cli.name_suffix {
        settings = settings.with_unique_names(UniqueNamePolicy::Suffix(sep));
    }

    let mut config = Config::new(cli.input)
        .with_output_format(output_format)
        .with_key_columns(cli.key)
        .with_stats_only(cli.stats_only)
        .with_compact_json(cli.compact);
    if let Some(max_rows) = cli.max_rows {
        config = config.with_max_rows(max_rows);
    }
    if let Some(path) = cli.output {
        config = config.with_output_file(path);
    }
    if let Some(sheet) = cli.sheet {
        config = config.with_sheet_name(sheet);
    }
    if let Some(path) = cli.hilite_out {
        config = config.with_hilite_file(path);
    }
    config.with_ungroup(settings)
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(cli);

    let table = ParserFactory::new()
        .parse(&config.input_file, &config)
        .with_context(|| format!("Failed to parse input file: {}", config.input_file.display()))?;

    let monitor = ExecutionMonitor::new();
    let (result, summary) = ungroup_table(table, &config.ungroup, &monitor)?;

    if summary.passthrough {
        print_warning("No ungroup column selected. Returning input table.")?;
    }

    if let Some(ref path) = config.hilite_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create hilite file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        summary
            .hilite
            .unwrap_or_default()
            .save(&mut writer)
            .with_context(|| format!("Failed to write hilite file: {}", path.display()))?;
        writer.flush()?;
    }

    if config.stats_only {
        println!("Input:   {} ({} rows)", config.input_file.display(), summary.rows_read);
        println!(
            "Output:  {} rows x {} columns",
            summary.rows_written,
            result.column_count()
        );
        return Ok(());
    }

    match config.output_file {
        Some(ref path) => render_to_file(&result, &config, path),
        None => render_to_stdout(&result, &config),
    }
}

fn print_warning(message: &str) -> std::io::Result<()> {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
    write!(stderr, "Warning:")?;
    stderr.reset()?;
    writeln!(stderr, " {}", message)
}
