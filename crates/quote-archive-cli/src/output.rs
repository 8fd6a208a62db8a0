use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use arrow::{
    error::ArrowError,
    record_batch::RecordBatch,
    util::display::{ArrayFormatter, FormatOptions},
};
use clap::ValueEnum;
use snafu::ResultExt;
use tabled::{
    builder::Builder,
    settings::{Style, object::Rows, style::LineText, width::MinWidth},
};

use crate::error::{ArrowSnafu, CliResult, CreateOutputSnafu, WriteOutputSnafu};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Jsonl,
}

#[derive(Debug, Clone)]
pub struct ReadOpts {
    pub max_rows: usize,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
}

#[derive(Debug, Clone)]
pub struct ReadResult {
    pub columns: Vec<String>,
    pub preview_rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

impl ReadResult {
    /// Format the first `max_rows` rows of `batch` for the preview table.
    pub fn from_batch(batch: &RecordBatch, max_rows: usize) -> CliResult<Self> {
        let columns = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect();

        let options = FormatOptions::default();
        let formatters = batch
            .columns()
            .iter()
            .map(|col| ArrayFormatter::try_new(col.as_ref(), &options))
            .collect::<Result<Vec<_>, ArrowError>>()
            .context(ArrowSnafu)?;

        let rows_to_take = max_rows.min(batch.num_rows());
        let mut preview_rows = Vec::with_capacity(rows_to_take);
        for row_idx in 0..rows_to_take {
            let mut row = Vec::with_capacity(formatters.len());
            for formatter in &formatters {
                row.push(
                    formatter
                        .value(row_idx)
                        .try_to_string()
                        .context(ArrowSnafu)?,
                );
            }
            preview_rows.push(row);
        }

        Ok(Self {
            columns,
            preview_rows,
            total_rows: batch.num_rows(),
        })
    }
}

/// Columns the label is inset from the left corner of the top border.
const LABEL_INSET: usize = 6;

/// Render `rows` under a `columns` header as a rounded table with `label`
/// set into the top border. Empty when there are no columns.
pub fn render_table(label: &str, columns: &[String], rows: &[Vec<String>]) -> String {
    if columns.is_empty() {
        return String::new();
    }

    let mut builder = Builder::default();
    for record in std::iter::once(columns).chain(rows.iter().map(Vec::as_slice)) {
        builder.push_record(record);
    }

    // Wide enough for the inset label plus the border corners around it.
    let min_width = LABEL_INSET + label.len() + 4;
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(MinWidth::new(min_width))
        .with(LineText::new(label, Rows::first()).offset(LABEL_INSET))
        .with(MinWidth::new(min_width));
    table.to_string()
}

pub fn render_preview(res: &ReadResult, opts: &ReadOpts) -> Option<String> {
    if !res.preview_rows.is_empty() || opts.max_rows == 0 {
        return Some(render_table("Preview output", &res.columns, &res.preview_rows));
    }
    None
}

pub fn preview_message(res: &ReadResult, opts: &ReadOpts) -> Option<String> {
    if res.total_rows == 0 {
        return Some("(no rows)".to_string());
    }

    if opts.max_rows == 0 {
        return Some("(preview suppressed; use --max-rows > 0)".to_string());
    }

    None
}

pub fn write_read_result<W: Write>(res: &ReadResult, opts: &ReadOpts, out: &mut W) -> CliResult<()> {
    if let Some(rendered) = render_preview(res, opts) {
        writeln!(out, "{rendered}").context(WriteOutputSnafu)?;
    }

    if let Some(message) = preview_message(res, opts) {
        writeln!(out, "{message}").context(WriteOutputSnafu)?;
    }

    writeln!(out, "total_rows: {}", res.total_rows).context(WriteOutputSnafu)?;

    if let Some(path) = &opts.output {
        writeln!(out, "wrote: {} ({:?})", path.display(), opts.format).context(WriteOutputSnafu)?;
    }

    Ok(())
}

/// Write the whole of `batch` to `path`. The file is replaced if it exists.
pub fn write_batch_file(path: &Path, format: OutputFormat, batch: &RecordBatch) -> CliResult<()> {
    let file = File::create(path).context(CreateOutputSnafu {
        path: path.display().to_string(),
    })?;
    let writer = BufWriter::new(file);

    let mut writer = match format {
        OutputFormat::Csv => {
            let mut w = arrow_csv::WriterBuilder::new().build(writer);
            w.write(batch).context(ArrowSnafu)?;
            w.into_inner()
        }
        OutputFormat::Jsonl => {
            let mut w = arrow_json::LineDelimitedWriter::new(writer);
            w.write_batches(&[batch]).context(ArrowSnafu)?;
            w.finish().context(ArrowSnafu)?;
            w.into_inner()
        }
    };
    writer.flush().context(WriteOutputSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(max_rows: usize) -> ReadOpts {
        ReadOpts {
            max_rows,
            output: None,
            format: OutputFormat::Csv,
        }
    }

    fn result(total_rows: usize, preview: usize) -> ReadResult {
        ReadResult {
            columns: vec!["date".to_string(), "close".to_string()],
            preview_rows: (0..preview)
                .map(|i| vec![format!("d{i}"), format!("{i}.5")])
                .collect(),
            total_rows,
        }
    }

    #[test]
    fn summary_reports_rows_and_output_path() {
        let mut opts = opts(2);
        opts.output = Some(PathBuf::from("out.csv"));

        let mut buf = Vec::new();
        write_read_result(&result(5, 2), &opts, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Preview output"));
        assert!(text.contains("d1"));
        assert!(text.contains("total_rows: 5"));
        assert!(text.contains("wrote: out.csv (Csv)"));
    }

    #[test]
    fn zero_max_rows_suppresses_the_preview() {
        let res = result(3, 0);
        let opts = opts(0);
        assert_eq!(
            preview_message(&res, &opts).as_deref(),
            Some("(preview suppressed; use --max-rows > 0)")
        );
        // Header-only table still shows the columns.
        assert!(render_preview(&res, &opts).unwrap().contains("close"));
    }

    #[test]
    fn empty_results_say_so() {
        let res = result(0, 0);
        assert_eq!(preview_message(&res, &opts(10)).as_deref(), Some("(no rows)"));
        assert!(render_preview(&res, &opts(10)).is_none());
    }

    #[test]
    fn render_table_is_empty_without_columns() {
        assert!(render_table("Preview output", &[], &[]).is_empty());
    }

    #[test]
    fn narrow_tables_widen_to_fit_the_label() {
        let columns = vec!["n".to_string()];
        let rendered = render_table("Datasets", &columns, &[vec!["1".to_string()]]);
        let top = rendered.lines().next().unwrap();
        assert!(top.contains("Datasets"), "{rendered}");
        assert!(top.chars().count() >= LABEL_INSET + "Datasets".len() + 4);
        assert!(rendered.lines().all(|line| line.chars().count() == top.chars().count()));
    }
}
