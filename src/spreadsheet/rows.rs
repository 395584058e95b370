// file: src/spreadsheet/rows.rs
// description: forward-only row reader over worksheet xml
// reference: https://docs.rs/quick-xml

use crate::error::Result;
use crate::spreadsheet::package::attribute;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// `t="s"`: the value is an index into the shared string table.
    SharedString,
    /// `t="inlineStr"`: the text is stored in the cell itself.
    InlineString,
    /// Numbers, booleans, errors, formula results.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCell {
    pub reference: Option<String>,
    pub kind: CellKind,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    /// One-based row number from the `r` attribute, when present.
    pub number: Option<u32>,
    pub cells: Vec<RawCell>,
}

/// Yields one `<row>` at a time; only the current row is held in memory.
pub struct RowReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    finished: bool,
}

#[derive(Default)]
struct CellState {
    reference: Option<String>,
    kind: Option<CellKind>,
    value: String,
    in_value: bool,
    in_inline: bool,
    in_text: bool,
    phonetic_depth: usize,
}

impl CellState {
    fn begin(element: &BytesStart<'_>) -> Result<Self> {
        let kind = match attribute(element, b"t")?.as_deref() {
            Some("s") => CellKind::SharedString,
            Some("inlineStr") => CellKind::InlineString,
            _ => CellKind::Other,
        };

        Ok(Self {
            reference: attribute(element, b"r")?,
            kind: Some(kind),
            ..Self::default()
        })
    }

    fn collecting(&self) -> bool {
        self.in_value || (self.in_inline && self.in_text && self.phonetic_depth == 0)
    }

    fn finish(self) -> RawCell {
        RawCell {
            reference: self.reference,
            kind: self.kind.unwrap_or(CellKind::Other),
            value: self.value,
        }
    }
}

impl<R: BufRead> RowReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: Reader::from_reader(inner),
            buf: Vec::new(),
            finished: false,
        }
    }

    pub fn next_row(&mut self) -> Result<Option<SheetRow>> {
        if self.finished {
            return Ok(None);
        }

        let mut row: Option<SheetRow> = None;
        let mut cell: Option<CellState> = None;

        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"row" => {
                        row = Some(SheetRow {
                            number: row_number(&e)?,
                            cells: Vec::new(),
                        });
                    }
                    b"c" if row.is_some() => cell = Some(CellState::begin(&e)?),
                    b"v" => {
                        if let Some(state) = cell.as_mut() {
                            state.in_value = true;
                        }
                    }
                    b"is" => {
                        if let Some(state) = cell.as_mut() {
                            state.in_inline = true;
                        }
                    }
                    b"t" => {
                        if let Some(state) = cell.as_mut() {
                            state.in_text = true;
                        }
                    }
                    b"rPh" => {
                        if let Some(state) = cell.as_mut() {
                            state.phonetic_depth += 1;
                        }
                    }
                    _ => {}
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"row" => {
                        return Ok(Some(SheetRow {
                            number: row_number(&e)?,
                            cells: Vec::new(),
                        }));
                    }
                    b"c" => {
                        if let Some(current) = row.as_mut() {
                            current.cells.push(CellState::begin(&e)?.finish());
                        }
                    }
                    _ => {}
                },
                Event::Text(t) => {
                    if let Some(state) = cell.as_mut().filter(|s| s.collecting()) {
                        state.value.push_str(&t.unescape()?);
                    }
                }
                Event::CData(t) => {
                    if let Some(state) = cell.as_mut().filter(|s| s.collecting()) {
                        state.value.push_str(&String::from_utf8_lossy(&t.into_inner()));
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"row" => {
                        if let Some(done) = row.take() {
                            return Ok(Some(done));
                        }
                    }
                    b"c" => {
                        if let (Some(current), Some(state)) = (row.as_mut(), cell.take()) {
                            current.cells.push(state.finish());
                        }
                    }
                    b"v" => {
                        if let Some(state) = cell.as_mut() {
                            state.in_value = false;
                        }
                    }
                    b"is" => {
                        if let Some(state) = cell.as_mut() {
                            state.in_inline = false;
                        }
                    }
                    b"t" => {
                        if let Some(state) = cell.as_mut() {
                            state.in_text = false;
                        }
                    }
                    b"rPh" => {
                        if let Some(state) = cell.as_mut() {
                            state.phonetic_depth = state.phonetic_depth.saturating_sub(1);
                        }
                    }
                    b"sheetData" => {
                        self.finished = true;
                        return Ok(None);
                    }
                    _ => {}
                },
                Event::Eof => {
                    self.finished = true;
                    return Ok(row.take());
                }
                _ => {}
            }
        }
    }
}

/// Counts `<row>` elements without resolving any cell content.
pub fn count_rows<R: BufRead>(inner: R) -> Result<usize> {
    let mut reader = Reader::from_reader(inner);
    let mut buf = Vec::new();
    let mut rows = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"row" => rows += 1,
            Event::End(e) if e.local_name().as_ref() == b"sheetData" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

fn row_number(element: &BytesStart<'_>) -> Result<Option<u32>> {
    Ok(attribute(element, b"r")?.and_then(|r| r.trim().parse().ok()))
}
