use quote_archive_core::{ArchiveError, SchemaError};

use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Failed to load --schema: {source}"))]
    LoadSchema { source: SchemaError },

    #[snafu(display("Invalid timestamp '{value}' (expected RFC 3339): {source}"))]
    InvalidTime {
        value: String,
        source: chrono::ParseError,
    },

    #[snafu(display(
        "Failed to open archive at {archive}: {source}. \
         Ensure it is a directory of <Dataset>.parquet files."
    ))]
    OpenArchive {
        archive: String,
        #[snafu(source(from(ArchiveError, Box::new)))]
        source: Box<ArchiveError>,
    },

    #[snafu(display("Read failed for archive {archive}: {source}"))]
    ReadArchive {
        archive: String,
        #[snafu(source(from(ArchiveError, Box::new)))]
        source: Box<ArchiveError>,
    },

    #[snafu(display(
        "Archive {archive} holds neither bars nor quotes; \
         check the dataset names or pass --schema"
    ))]
    UnknownKind { archive: String },

    #[snafu(display("Failed to export records: {source}"))]
    Export {
        #[snafu(source(from(ArchiveError, Box::new)))]
        source: Box<ArchiveError>,
    },

    #[snafu(display("Failed to create output file {path}: {source}"))]
    CreateOutput {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("Failed to write output: {source}"))]
    WriteOutput { source: std::io::Error },

    #[snafu(display("Arrow error: {source}"))]
    Arrow { source: arrow::error::ArrowError },
}
