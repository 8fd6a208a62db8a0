//! Dataset naming for archives.
//!
//! Every archive holds one pair of row-aligned datasets: `Bars` with
//! `DataBars`, or `Quotes` with `DateQuotes`. [`ArchiveSchema`] maps those
//! logical roles to the dataset names actually stored, so archives written
//! with other names can still be read. The defaults match the producer.
//!
//! ```json
//! { "quotes": "L2Quotes", "date_quotes": "L2Dates" }
//! ```
//!
//! Omitted fields keep their default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::decode::BAR_META_TIMESTAMP_FIELD;
use crate::locate::TimestampKey;

/// Errors from loading a schema file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SchemaError {
    /// The schema file could not be read.
    #[snafu(display("Failed to read schema file {path}: {source}"))]
    Read {
        /// Path of the schema file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The schema file is not valid schema JSON.
    #[snafu(display("Failed to parse schema file {path}: {source}"))]
    Parse {
        /// Path of the schema file.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Which pair of datasets an archive carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveKind {
    /// `Bars` + `DataBars`.
    Bars,
    /// `Quotes` + `DateQuotes`.
    Quotes,
}

/// Names of the datasets that make up an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveSchema {
    /// OHLCV rows, `[volume, open, close, high, low]`.
    pub bars: String,
    /// Bar metadata rows, `[price_type, timestamp_ms]`.
    pub data_bars: String,
    /// Quote rows, `[ask_vector, bid_vector]`.
    pub quotes: String,
    /// Quote timestamps.
    pub date_quotes: String,
}

impl Default for ArchiveSchema {
    fn default() -> Self {
        Self {
            bars: "Bars".to_string(),
            data_bars: "DataBars".to_string(),
            quotes: "Quotes".to_string(),
            date_quotes: "DateQuotes".to_string(),
        }
    }
}

impl ArchiveSchema {
    /// Load a schema from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).context(ReadSnafu {
            path: path.display().to_string(),
        })?;
        serde_json::from_str(&text).context(ParseSnafu {
            path: path.display().to_string(),
        })
    }

    /// Timestamp key of a dataset this schema names, or `None` when the
    /// name is not one of the timestamp datasets.
    pub fn timestamp_key(&self, dataset: &str) -> Option<TimestampKey> {
        if dataset == self.date_quotes {
            Some(TimestampKey::Flat)
        } else if dataset == self.data_bars {
            Some(TimestampKey::Field(BAR_META_TIMESTAMP_FIELD))
        } else {
            None
        }
    }

    /// Name of the dataset holding the timestamps for `kind`.
    pub fn timestamp_dataset(&self, kind: ArchiveKind) -> &str {
        match kind {
            ArchiveKind::Bars => &self.data_bars,
            ArchiveKind::Quotes => &self.date_quotes,
        }
    }

    /// Names of the `(values, timestamps)` dataset pair for `kind`.
    pub fn datasets(&self, kind: ArchiveKind) -> (&str, &str) {
        match kind {
            ArchiveKind::Bars => (&self.bars, &self.data_bars),
            ArchiveKind::Quotes => (&self.quotes, &self.date_quotes),
        }
    }

    /// Detect the archive kind from the dataset names present.
    ///
    /// Bars win when an archive somehow carries both pairs.
    pub fn detect_kind<S: AsRef<str>>(&self, names: &[S]) -> Option<ArchiveKind> {
        let has = |wanted: &str| names.iter().any(|n| n.as_ref() == wanted);
        [ArchiveKind::Bars, ArchiveKind::Quotes]
            .into_iter()
            .find(|&kind| {
                let (values, timestamps) = self.datasets(kind);
                has(values) && has(timestamps)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_json_keeps_defaults() {
        let schema: ArchiveSchema =
            serde_json::from_str(r#"{ "quotes": "L2Quotes", "date_quotes": "L2Dates" }"#).unwrap();
        assert_eq!(schema.quotes, "L2Quotes");
        assert_eq!(schema.date_quotes, "L2Dates");
        assert_eq!(schema.bars, "Bars");
        assert_eq!(schema.data_bars, "DataBars");
    }

    #[test]
    fn timestamp_keys_follow_the_row_layouts() {
        let schema = ArchiveSchema::default();
        assert_eq!(schema.timestamp_key("DateQuotes"), Some(TimestampKey::Flat));
        assert_eq!(schema.timestamp_key("DataBars"), Some(TimestampKey::Field(1)));
        assert_eq!(schema.timestamp_key("Bars"), None);
    }

    #[test]
    fn kind_needs_both_datasets_of_a_pair() {
        let schema = ArchiveSchema::default();
        assert_eq!(
            schema.detect_kind(&["DataBars", "Bars"]),
            Some(ArchiveKind::Bars)
        );
        assert_eq!(
            schema.detect_kind(&["Quotes", "DateQuotes"]),
            Some(ArchiveKind::Quotes)
        );
        assert_eq!(schema.detect_kind(&["Quotes", "DataBars"]), None);
        assert_eq!(schema.detect_kind::<&str>(&[]), None);
    }

    #[test]
    fn loads_from_file_and_reports_failures() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("schema.json");
        std::fs::write(&path, r#"{ "bars": "Candles" }"#).unwrap();

        let schema = ArchiveSchema::from_json_file(&path).unwrap();
        assert_eq!(schema.bars, "Candles");
        assert_eq!(schema.datasets(ArchiveKind::Bars), ("Candles", "DataBars"));

        let err = ArchiveSchema::from_json_file(tmp.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SchemaError::Read { .. }));

        std::fs::write(&path, "not json").unwrap();
        let err = ArchiveSchema::from_json_file(&path).unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
    }
}
