// file: src/spreadsheet/extractor.rs
// description: streams one column of the first worksheet into path entries
// reference: single-pass row scan with shared string resolution

use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::models::PathEntry;
use crate::pipeline::progress::ProgressReporter;
use crate::spreadsheet::column::{ColumnRef, column_letters, column_number, split_reference};
use crate::spreadsheet::package::WorkbookPackage;
use crate::spreadsheet::rows::{CellKind, RawCell, RowReader, count_rows};
use crate::spreadsheet::shared_strings::SharedStrings;
use std::io::BufRead;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct Extraction {
    /// Entries in row order; multi-value cells keep their internal order.
    pub entries: Vec<PathEntry>,
    pub rows_scanned: usize,
    pub total_rows: usize,
    pub cancelled: bool,
}

pub struct ColumnExtractor {
    config: ExtractionConfig,
}

impl ColumnExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Reads every data row of `column` from the first sheet of the
    /// workbook at `path`. Blocking; run it off the async executor.
    ///
    /// Cancellation is checked before each row. A tripped token returns the
    /// entries gathered so far with `cancelled` set.
    pub fn extract(
        &self,
        path: &Path,
        column: &ColumnRef,
        cancel: &CancellationToken,
        progress: &mut ProgressReporter<PathEntry>,
    ) -> Result<Extraction> {
        let mut package = WorkbookPackage::open(path)?;
        let shared_strings = package.load_shared_strings()?;
        let total_rows = count_rows(package.open_sheet()?)?;

        info!(
            "Reading column {} from '{}' ({} rows, {} shared strings)",
            column,
            package.sheet_name(),
            total_rows,
            shared_strings.len()
        );

        if total_rows == 0 {
            progress.complete(0);
            return Ok(Extraction::default());
        }

        self.scan(
            RowReader::new(package.open_sheet()?),
            total_rows,
            &shared_strings,
            column,
            cancel,
            progress,
        )
    }

    fn scan<R: BufRead>(
        &self,
        mut rows: RowReader<R>,
        total_rows: usize,
        shared_strings: &SharedStrings,
        column: &ColumnRef,
        cancel: &CancellationToken,
        progress: &mut ProgressReporter<PathEntry>,
    ) -> Result<Extraction> {
        let mut extraction = Extraction {
            total_rows,
            ..Extraction::default()
        };

        loop {
            if cancel.is_cancelled() {
                info!(
                    "Extraction cancelled at row {} of {}",
                    extraction.rows_scanned, total_rows
                );
                extraction.cancelled = true;
                break;
            }

            let Some(row) = rows.next_row()? else {
                break;
            };
            extraction.rows_scanned += 1;

            let row_number = row
                .number
                .unwrap_or(extraction.rows_scanned as u32);
            let mut found = Vec::new();

            if row_number > self.config.header_rows
                && let Some(cell) = find_cell(&row.cells, column, row_number)
                && let Some(text) = resolve_text(cell, shared_strings)
            {
                found = self.split(text);
            }

            extraction.entries.extend(found.iter().cloned());
            progress.report(
                extraction.rows_scanned,
                total_rows,
                extraction.entries.len(),
                found,
            );
        }

        debug!(
            "Extracted {} entries from {} rows",
            extraction.entries.len(),
            extraction.rows_scanned
        );
        Ok(extraction)
    }

    /// Splits one cell's text into entries. Blank cells and blank pieces
    /// yield nothing.
    pub fn split(&self, text: &str) -> Vec<PathEntry> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        text.split(self.config.separator)
            .map(|part| {
                if self.config.trim_entries {
                    part.trim()
                } else {
                    part
                }
            })
            .filter(|part| !part.trim().is_empty())
            .map(PathEntry::from)
            .collect()
    }
}

/// Finds the cell whose reference equals the synthesized `column + row`.
/// Cells without an `r` attribute take their position in the row.
fn find_cell<'a>(cells: &'a [RawCell], column: &ColumnRef, row_number: u32) -> Option<&'a RawCell> {
    let mut next_position = 1u32;

    for cell in cells {
        let reference = match &cell.reference {
            Some(reference) => {
                if let Some((letters, _)) = split_reference(reference) {
                    next_position = column_number(&letters) + 1;
                }
                reference.clone()
            }
            None => {
                let synthesized = format!("{}{}", column_letters(next_position), row_number);
                next_position += 1;
                synthesized
            }
        };

        if column.matches_reference(&reference, row_number) {
            return Some(cell);
        }
    }

    None
}

fn resolve_text<'a>(cell: &'a RawCell, shared_strings: &'a SharedStrings) -> Option<&'a str> {
    match cell.kind {
        CellKind::SharedString => {
            let index = match cell.value.trim().parse::<usize>() {
                Ok(index) => index,
                Err(_) => {
                    warn!(
                        "Cell {:?} has a non-numeric shared string index '{}'",
                        cell.reference, cell.value
                    );
                    return None;
                }
            };

            let text = shared_strings.get(index);
            if text.is_none() {
                warn!(
                    "Cell {:?} refers to shared string {} of {}",
                    cell.reference,
                    index,
                    shared_strings.len()
                );
            }
            text
        }
        CellKind::InlineString => Some(cell.value.as_str()),
        CellKind::Other => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::CheckerError;
    use crate::pipeline::progress::Stage;
    use crate::spreadsheet::fixture::{FixtureValue, WorkbookFixture};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tokio::sync::mpsc::unbounded_channel;

    fn extractor() -> ColumnExtractor {
        ColumnExtractor::new(Config::default_config().extraction)
    }

    fn run(path: &Path, column: &str) -> Extraction {
        extractor()
            .extract(
                path,
                &ColumnRef::parse(column).unwrap(),
                &CancellationToken::new(),
                &mut ProgressReporter::disabled(Stage::Reading),
            )
            .unwrap()
    }

    fn workbook(temp: &TempDir, fixture: WorkbookFixture) -> PathBuf {
        let path = temp.path().join("paths.xlsx");
        fixture.write(&path);
        path
    }

    fn strings(entries: &[PathEntry]) -> Vec<&str> {
        entries.iter().map(PathEntry::as_str).collect()
    }

    #[test]
    fn test_rows_in_order_header_excluded() {
        let temp = TempDir::new().unwrap();
        let path = workbook(
            &temp,
            WorkbookFixture::new().column("B", "Filepath", &["/r2", "/r3", "/r4"]),
        );

        let extraction = run(&path, "B");
        assert_eq!(strings(&extraction.entries), vec!["/r2", "/r3", "/r4"]);
        assert_eq!(extraction.total_rows, 4);
        assert_eq!(extraction.rows_scanned, 4);
        assert!(!extraction.cancelled);
    }

    #[test]
    fn test_pipe_separated_cell_yields_entries_in_order() {
        let temp = TempDir::new().unwrap();
        let path = workbook(
            &temp,
            WorkbookFixture::new().column("A", "Files", &["a.txt|b.txt|c.txt"]),
        );

        assert_eq!(strings(&run(&path, "a").entries), vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_blank_cells_are_skipped_without_ending_scan() {
        let temp = TempDir::new().unwrap();
        let path = workbook(
            &temp,
            WorkbookFixture::new().column("A", "Files", &["/first", "", "   ", "/last"]),
        );

        let extraction = run(&path, "A");
        assert_eq!(strings(&extraction.entries), vec!["/first", "/last"]);
        assert_eq!(extraction.rows_scanned, 5);
    }

    #[test]
    fn test_only_requested_column_is_read() {
        let temp = TempDir::new().unwrap();
        let path = workbook(
            &temp,
            WorkbookFixture::new()
                .row(&[
                    ("A", FixtureValue::shared("Id")),
                    ("B", FixtureValue::shared("Path")),
                ])
                .row(&[
                    ("A", FixtureValue::shared("not-a-path")),
                    ("B", FixtureValue::shared("/wanted/1")),
                ])
                .row(&[
                    ("A", FixtureValue::Number(7.0)),
                    ("AB", FixtureValue::shared("/other/column")),
                    ("B", FixtureValue::inline("/wanted/2")),
                ])
                .row(&[("B", FixtureValue::Number(3.0))]),
        );

        assert_eq!(strings(&run(&path, "B").entries), vec!["/wanted/1", "/wanted/2"]);
        assert_eq!(strings(&run(&path, "AB").entries), vec!["/other/column"]);
    }

    #[test]
    fn test_cells_without_references_use_position() {
        let temp = TempDir::new().unwrap();
        let path = workbook(
            &temp,
            WorkbookFixture::new()
                .row(&[
                    ("A", FixtureValue::shared("Id")),
                    ("B", FixtureValue::shared("Path")),
                ])
                .row(&[
                    ("A", FixtureValue::shared("1")),
                    ("B", FixtureValue::shared(r"\\server\share\x.doc")),
                ])
                .without_references(),
        );

        assert_eq!(strings(&run(&path, "B").entries), vec![r"\\server\share\x.doc"]);
    }

    #[test]
    fn test_header_only_sheet_yields_nothing() {
        let temp = TempDir::new().unwrap();
        let path = workbook(&temp, WorkbookFixture::new().column("A", "Files", &[]));

        let extraction = run(&path, "A");
        assert!(extraction.entries.is_empty());
        assert_eq!(extraction.total_rows, 1);
    }

    #[test]
    fn test_empty_sheet_reports_one_complete_event() {
        let temp = TempDir::new().unwrap();
        let path = workbook(&temp, WorkbookFixture::new());
        let (tx, mut rx) = unbounded_channel();
        let mut progress = ProgressReporter::new(Stage::Reading, Some(tx));

        let extraction = extractor()
            .extract(
                &path,
                &ColumnRef::parse("A").unwrap(),
                &CancellationToken::new(),
                &mut progress,
            )
            .unwrap();
        drop(progress);

        assert!(extraction.entries.is_empty());
        assert_eq!(extraction.total_rows, 0);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.percentage_completed, 100);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_progress_per_row_is_monotonic_and_complete() {
        let temp = TempDir::new().unwrap();
        let path = workbook(
            &temp,
            WorkbookFixture::new().column("A", "Files", &["/1", "/2|/3"]),
        );
        let (tx, mut rx) = unbounded_channel();
        let mut progress = ProgressReporter::new(Stage::Reading, Some(tx));

        extractor()
            .extract(
                &path,
                &ColumnRef::parse("A").unwrap(),
                &CancellationToken::new(),
                &mut progress,
            )
            .unwrap();
        drop(progress);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push((event.percentage_completed, event.items_so_far, event.latest.len()));
        }
        assert_eq!(events, vec![(33, 0, 0), (66, 1, 1), (100, 3, 2)]);
    }

    #[test]
    fn test_cancelled_before_start_returns_partial() {
        let temp = TempDir::new().unwrap();
        let path = workbook(&temp, WorkbookFixture::new().column("A", "Files", &["/1", "/2"]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let extraction = extractor()
            .extract(
                &path,
                &ColumnRef::parse("A").unwrap(),
                &cancel,
                &mut ProgressReporter::disabled(Stage::Reading),
            )
            .unwrap();

        assert!(extraction.cancelled);
        assert!(extraction.entries.is_empty());
        assert_eq!(extraction.rows_scanned, 0);
    }

    /// Serves a sheet and trips `cancel` once reading passes `limit`.
    struct CancelAfter<'a> {
        data: &'a [u8],
        pos: usize,
        limit: usize,
        cancel: CancellationToken,
    }

    impl std::io::Read for CancelAfter<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = std::io::Read::read(&mut &self.data[self.pos..], buf)?;
            self.consume(n);
            Ok(n)
        }
    }

    impl BufRead for CancelAfter<'_> {
        fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
            Ok(&self.data[self.pos..])
        }

        fn consume(&mut self, amt: usize) {
            self.pos += amt;
            if self.pos >= self.limit {
                self.cancel.cancel();
            }
        }
    }

    #[test]
    fn test_cancel_after_rows_keeps_their_entries() {
        let cell = |row: u32, text: &str| {
            format!(
                r#"<row r="{0}"><c r="A{0}" t="inlineStr"><is><t>{1}</t></is></c></row>"#,
                row, text
            )
        };
        let sheet = format!(
            "<worksheet><sheetData>{}{}{}{}{}</sheetData></worksheet>",
            cell(1, "Files"),
            cell(2, "/r2"),
            cell(3, "/r3a|/r3b"),
            cell(4, "/r4"),
            cell(5, "/r5"),
        );
        let third_row_end = sheet
            .match_indices("</row>")
            .nth(2)
            .map(|(i, tag)| i + tag.len())
            .unwrap();

        let cancel = CancellationToken::new();
        let source = CancelAfter {
            data: sheet.as_bytes(),
            pos: 0,
            limit: third_row_end - 1,
            cancel: cancel.clone(),
        };

        let extraction = extractor()
            .scan(
                RowReader::new(source),
                5,
                &SharedStrings::default(),
                &ColumnRef::parse("A").unwrap(),
                &cancel,
                &mut ProgressReporter::disabled(Stage::Reading),
            )
            .unwrap();

        assert!(extraction.cancelled);
        assert_eq!(extraction.rows_scanned, 3);
        assert_eq!(strings(&extraction.entries), vec!["/r2", "/r3a", "/r3b"]);
    }

    #[test]
    fn test_unopenable_document_is_document_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.xlsx");
        std::fs::write(&path, b"PK\x03\x04 truncated").unwrap();

        let err = extractor()
            .extract(
                &path,
                &ColumnRef::parse("A").unwrap(),
                &CancellationToken::new(),
                &mut ProgressReporter::disabled(Stage::Reading),
            )
            .unwrap_err();
        assert!(matches!(err, CheckerError::DocumentOpen(_)));
    }

    #[test]
    fn test_split_options() {
        let mut config = Config::default_config().extraction;
        assert_eq!(
            strings(&ColumnExtractor::new(config.clone()).split("a| b||c")),
            vec!["a", " b", "c"]
        );

        assert_eq!(
            strings(&ColumnExtractor::new(config.clone()).split("a| |b")),
            vec!["a", "b"]
        );

        config.trim_entries = true;
        config.separator = ';';
        assert_eq!(
            strings(&ColumnExtractor::new(config).split(" a ; b ;")),
            vec!["a", "b"]
        );
    }
}
