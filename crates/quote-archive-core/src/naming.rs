//! Archive names.
//!
//! The archive producer names its output after the content:
//!
//! - quotes: `<SYMBOL>[ level2] <yyyyMMdd> <yyyyMMdd>`
//! - bars: `<SYMBOL> <Bid|Ask> <PERIOD> <yyyyMMdd> <yyyyMMdd>`
//!
//! followed by a file extension when the archive is a single file. Some
//! producer versions emit doubled spaces, so any run of whitespace separates
//! tokens.

mod period;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

pub use period::{BarPeriod, ParseBarPeriodError};

use crate::records::PriceType;

const DATE_FORMAT: &str = "%Y%m%d";
const LEVEL2_TOKEN: &str = "level2";
const KNOWN_EXTENSIONS: [&str; 5] = ["h5", "hdf5", "parquet", "csv", "txt"];

/// Errors produced when parsing an archive name.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum ParseArchiveNameError {
    /// The name was empty or only whitespace.
    #[snafu(display("archive name is empty"))]
    EmptyName,

    /// The name does not match either naming pattern.
    #[snafu(display(
        "archive name '{name}' has {tokens} tokens; expected '<SYMBOL>[ level2] <from> <to>' \
         or '<SYMBOL> <Bid|Ask> <PERIOD> <from> <to>'"
    ))]
    UnexpectedShape {
        /// The name as given.
        name: String,
        /// Number of whitespace-separated tokens found.
        tokens: usize,
    },

    /// A date token is not `yyyyMMdd`.
    #[snafu(display("invalid date '{token}' in archive name '{name}': {source}"))]
    InvalidDate {
        /// The name as given.
        name: String,
        /// The offending token.
        token: String,
        /// The chrono parse error.
        source: chrono::ParseError,
    },

    /// The side token of a bars name is neither `Bid` nor `Ask`.
    #[snafu(display("unknown price type '{token}' in archive name '{name}' (expected Bid|Ask)"))]
    UnknownPriceType {
        /// The name as given.
        name: String,
        /// The offending token.
        token: String,
    },

    /// The period token of a bars name does not parse.
    #[snafu(display("invalid period in archive name '{name}': {source}"))]
    InvalidPeriod {
        /// The name as given.
        name: String,
        /// The period parse error.
        source: ParseBarPeriodError,
    },
}

/// What an archive holds, as told by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveContent {
    /// Quote snapshots; `level2` archives carry more than one level per side.
    Quotes {
        /// Whether the name carries the `level2` marker.
        level2: bool,
    },
    /// Bars of one side sampled at one period.
    Bars {
        /// Side the bars were built from.
        price_type: PriceType,
        /// Sampling period.
        period: BarPeriod,
    },
}

/// A parsed archive name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveName {
    symbol: String,
    content: ArchiveContent,
    from: NaiveDate,
    to: NaiveDate,
}

impl ArchiveName {
    /// Build a name from its parts.
    pub fn new(
        symbol: impl Into<String>,
        content: ArchiveContent,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            content,
            from,
            to,
        }
    }

    /// Instrument symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Archive content.
    pub fn content(&self) -> ArchiveContent {
        self.content
    }

    /// First day covered.
    pub fn from_date(&self) -> NaiveDate {
        self.from
    }

    /// Last day covered.
    pub fn to_date(&self) -> NaiveDate {
        self.to
    }
}

fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if KNOWN_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known)) =>
        {
            stem
        }
        _ => name,
    }
}

fn parse_date(name: &str, token: &str) -> Result<NaiveDate, ParseArchiveNameError> {
    NaiveDate::parse_from_str(token, DATE_FORMAT).context(InvalidDateSnafu { name, token })
}

fn parse_price_type(name: &str, token: &str) -> Result<PriceType, ParseArchiveNameError> {
    [PriceType::Bid, PriceType::Ask]
        .into_iter()
        .find(|side| token.eq_ignore_ascii_case(side.as_str()))
        .context(UnknownPriceTypeSnafu { name, token })
}

impl FromStr for ArchiveName {
    type Err = ParseArchiveNameError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let name = input.trim();
        ensure!(!name.is_empty(), EmptyNameSnafu);

        let tokens: Vec<&str> = strip_extension(name).split_whitespace().collect();
        let shape_error = || {
            UnexpectedShapeSnafu {
                name,
                tokens: tokens.len(),
            }
            .build()
        };

        let [head @ .., from, to] = tokens.as_slice() else {
            return Err(shape_error());
        };

        let content = match head {
            [_] => ArchiveContent::Quotes { level2: false },
            [_, marker] if marker.eq_ignore_ascii_case(LEVEL2_TOKEN) => {
                ArchiveContent::Quotes { level2: true }
            }
            [_, side, period] => ArchiveContent::Bars {
                price_type: parse_price_type(name, side)?,
                period: period
                    .parse::<BarPeriod>()
                    .context(InvalidPeriodSnafu { name })?,
            },
            _ => return Err(shape_error()),
        };

        Ok(Self {
            symbol: head[0].to_string(),
            content,
            from: parse_date(name, from)?,
            to: parse_date(name, to)?,
        })
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)?;
        match self.content {
            ArchiveContent::Quotes { level2: false } => {}
            ArchiveContent::Quotes { level2: true } => write!(f, " {LEVEL2_TOKEN}")?,
            ArchiveContent::Bars { price_type, period } => {
                write!(f, " {} {period}", price_type.as_str())?
            }
        }
        write!(
            f,
            " {} {}",
            self.from.format(DATE_FORMAT),
            self.to.format(DATE_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_quote_names() {
        let name: ArchiveName = "EURUSD level2 20180615 20180616.h5".parse().unwrap();
        assert_eq!(name.symbol(), "EURUSD");
        assert_eq!(name.content(), ArchiveContent::Quotes { level2: true });
        assert_eq!(name.from_date(), date(2018, 6, 15));
        assert_eq!(name.to_date(), date(2018, 6, 16));

        let name: ArchiveName = "EURUSD 20180615 20180616".parse().unwrap();
        assert_eq!(name.content(), ArchiveContent::Quotes { level2: false });
    }

    #[test]
    fn parses_bar_names_with_doubled_spaces() {
        let name: ArchiveName = "EURUSD Bid S10  20180615  20180616.h5".parse().unwrap();
        assert_eq!(
            name.content(),
            ArchiveContent::Bars {
                price_type: PriceType::Bid,
                period: BarPeriod::Seconds(10),
            }
        );
        assert_eq!(name.to_string(), "EURUSD Bid S10 20180615 20180616");
    }

    #[test]
    fn display_round_trips() {
        for text in [
            "EURUSD 20180615 20180616",
            "XAUUSD level2 20200101 20200131",
            "BTCUSD Ask MN1 20190101 20191231",
        ] {
            let name: ArchiveName = text.parse().unwrap();
            assert_eq!(name.to_string(), text);
            assert_eq!(name.to_string().parse::<ArchiveName>().unwrap(), name);
        }
    }

    #[test]
    fn unknown_extensions_stay_part_of_the_name() {
        let err = "EURUSD 20180615 20180616.zip".parse::<ArchiveName>().unwrap_err();
        assert!(matches!(err, ParseArchiveNameError::InvalidDate { .. }));
    }

    #[test]
    fn rejects_malformed_names() {
        assert_eq!(
            "  ".parse::<ArchiveName>(),
            Err(ParseArchiveNameError::EmptyName)
        );
        assert!(matches!(
            "scratch".parse::<ArchiveName>(),
            Err(ParseArchiveNameError::UnexpectedShape { tokens: 1, .. })
        ));
        assert!(matches!(
            "EURUSD level3 20180615 20180616".parse::<ArchiveName>(),
            Err(ParseArchiveNameError::UnexpectedShape { .. })
        ));
        assert!(matches!(
            "EURUSD Mid S10 20180615 20180616".parse::<ArchiveName>(),
            Err(ParseArchiveNameError::UnknownPriceType { .. })
        ));
        assert!(matches!(
            "EURUSD Bid X10 20180615 20180616".parse::<ArchiveName>(),
            Err(ParseArchiveNameError::InvalidPeriod { .. })
        ));
        assert!(matches!(
            "EURUSD 2018-06-15 20180616".parse::<ArchiveName>(),
            Err(ParseArchiveNameError::InvalidDate { .. })
        ));
    }
}
