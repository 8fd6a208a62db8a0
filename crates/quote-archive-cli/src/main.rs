//! CLI tool for inspecting and exporting bar and quote archives.

mod error;
mod output;

use std::ops::Bound;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use quote_archive_core::{
    Archive, ArchiveInfo, ArchiveKind, ArchiveLocation, ArchiveSchema, bars_to_record_batch,
    quotes_to_record_batch,
};
use snafu::ResultExt;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::{
    error::{
        CliResult, ExportSnafu, InvalidTimeSnafu, LoadSchemaSnafu, OpenArchiveSnafu,
        ReadArchiveSnafu, UnknownKindSnafu,
    },
    output::{OutputFormat, ReadOpts, ReadResult, render_table, write_batch_file, write_read_result},
};

#[derive(Debug, Args)]
struct ReadArgs {
    #[arg(long)]
    archive: PathBuf,

    /// Start of the time window (RFC 3339, inclusive)
    #[arg(long, requires = "to", conflicts_with_all = ["index_from", "index_to"])]
    from: Option<String>,

    /// End of the time window (RFC 3339, inclusive)
    #[arg(long, requires = "from")]
    to: Option<String>,

    /// First row to read
    #[arg(long = "index-from")]
    index_from: Option<usize>,

    /// Row past the last one to read; clamped to the row count
    #[arg(long = "index-to", conflicts_with_all = ["from", "to"])]
    index_to: Option<usize>,

    #[arg(long, default_value_t = 10)]
    max_rows: usize,

    /// Write every selected row to this file
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the archive kind, datasets and time span
    Info {
        #[arg(long)]
        archive: PathBuf,
    },

    /// Print the row bounds of a time window in one dataset
    Locate {
        #[arg(long)]
        archive: PathBuf,

        /// Timestamp dataset to search (e.g. DataBars, DateQuotes)
        #[arg(long)]
        dataset: String,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,
    },

    /// Preview or export price bars
    Bars(ReadArgs),

    /// Preview or export order-book quotes
    Quotes(ReadArgs),
}

#[derive(Debug, Parser)]
#[command(name = "qarchive")]
struct Cli {
    /// JSON file overriding the dataset names
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

/// How the rows of a read are chosen.
enum Selection {
    Time {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    Rows(Bound<usize>, Bound<usize>),
}

impl Selection {
    fn from_args(args: &ReadArgs) -> CliResult<Self> {
        match (&args.from, &args.to) {
            (Some(from), Some(to)) => Ok(Selection::Time {
                from: parse_time(from)?,
                to: parse_time(to)?,
            }),
            _ => Ok(Selection::Rows(
                args.index_from.map_or(Bound::Unbounded, Bound::Included),
                args.index_to.map_or(Bound::Unbounded, Bound::Excluded),
            )),
        }
    }
}

fn parse_time(value: &str) -> CliResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .context(InvalidTimeSnafu {
            value: value.to_string(),
        })
}

fn load_schema(path: Option<&Path>) -> CliResult<ArchiveSchema> {
    match path {
        Some(path) => ArchiveSchema::from_json_file(path).context(LoadSchemaSnafu),
        None => Ok(ArchiveSchema::default()),
    }
}

fn open_archive(root: &Path, schema: ArchiveSchema) -> CliResult<Archive> {
    Archive::open_with_schema(&ArchiveLocation::local(root), schema).context(OpenArchiveSnafu {
        archive: root.display().to_string(),
    })
}

fn print_info(root: &Path, info: &ArchiveInfo) {
    println!("archive: {}", root.display());
    if let Some(name) = ArchiveLocation::local(root).archive_name() {
        println!("name: {name}");
    }

    let kind = match info.kind {
        Some(ArchiveKind::Bars) => "bars",
        Some(ArchiveKind::Quotes) => "quotes",
        None => "unknown",
    };
    println!("kind: {kind}");

    let columns = ["dataset", "rows", "shape"].map(String::from);
    let rows: Vec<Vec<String>> = info
        .datasets
        .iter()
        .map(|d| {
            vec![
                d.name.clone(),
                d.row_count().to_string(),
                format!("{:?}", d.shape),
            ]
        })
        .collect();
    println!("{}", render_table("Datasets", &columns, &rows));

    match (info.first, info.last) {
        (Some(first), Some(last)) => {
            println!("first: {}", first.to_rfc3339());
            println!("last: {}", last.to_rfc3339());
        }
        _ => println!("(no rows)"),
    }
}

fn cmd_info(root: &Path, schema: ArchiveSchema) -> CliResult<()> {
    let archive = open_archive(root, schema)?;
    let info = archive.info().context(ReadArchiveSnafu {
        archive: root.display().to_string(),
    })?;
    print_info(root, &info);
    Ok(())
}

fn cmd_locate(
    root: &Path,
    schema: ArchiveSchema,
    dataset: &str,
    from: &str,
    to: &str,
) -> CliResult<()> {
    let (from, to) = (parse_time(from)?, parse_time(to)?);
    let archive = open_archive(root, schema)?;
    let range = archive
        .locate_range(dataset, from, to)
        .context(ReadArchiveSnafu {
            archive: root.display().to_string(),
        })?;

    println!("index_from: {}", range.start);
    println!("index_to: {}", range.end);
    Ok(())
}

fn cmd_read(schema: ArchiveSchema, kind: ArchiveKind, args: ReadArgs) -> CliResult<()> {
    let root = args.archive.as_path();
    let selection = Selection::from_args(&args)?;
    let archive = open_archive(root, schema)?;
    let read_ctx = || ReadArchiveSnafu {
        archive: root.display().to_string(),
    };

    let detected = archive.kind().with_context(|_| read_ctx())?;
    if detected.is_none() {
        return UnknownKindSnafu {
            archive: root.display().to_string(),
        }
        .fail();
    }

    let batch = match (kind, selection) {
        (ArchiveKind::Bars, Selection::Time { from, to }) => {
            let bars = archive.bars_between(from, to).with_context(|_| read_ctx())?;
            bars_to_record_batch(&bars)
        }
        (ArchiveKind::Bars, Selection::Rows(start, end)) => {
            let bars = archive.read_bars((start, end)).with_context(|_| read_ctx())?;
            bars_to_record_batch(&bars)
        }
        (ArchiveKind::Quotes, Selection::Time { from, to }) => {
            let quotes = archive.quotes_between(from, to).with_context(|_| read_ctx())?;
            quotes_to_record_batch(&quotes)
        }
        (ArchiveKind::Quotes, Selection::Rows(start, end)) => {
            let quotes = archive.read_quotes((start, end)).with_context(|_| read_ctx())?;
            quotes_to_record_batch(&quotes)
        }
    }
    .context(ExportSnafu)?;
    debug!(rows = batch.num_rows(), ?kind, "read archive rows");

    let opts = ReadOpts {
        max_rows: args.max_rows,
        output: args.output,
        format: args.format,
    };
    if let Some(path) = &opts.output {
        write_batch_file(path, opts.format, &batch)?;
    }

    let res = ReadResult::from_batch(&batch, opts.max_rows)?;
    let mut stdout = std::io::stdout().lock();
    write_read_result(&res, &opts, &mut stdout)
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let schema = load_schema(cli.schema.as_deref())?;

    match cli.cmd {
        Command::Info { archive } => cmd_info(&archive, schema),
        Command::Locate {
            archive,
            dataset,
            from,
            to,
        } => cmd_locate(&archive, schema, &dataset, &from, &to),
        Command::Bars(args) => cmd_read(schema, ArchiveKind::Bars, args),
        Command::Quotes(args) => cmd_read(schema, ArchiveKind::Quotes, args),
    }
}

fn main() {
    // Logs go to stderr so previews and exports on stdout stay clean.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
