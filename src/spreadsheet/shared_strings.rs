// file: src/spreadsheet/shared_strings.rs
// description: streaming reader for the workbook shared string table
// reference: https://docs.rs/quick-xml

use crate::error::Result;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::BufRead;

/// Index-addressed table of text values that cells refer to by position.
#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    items: Vec<String>,
}

impl SharedStrings {
    /// Reads `<si>` items in document order. Rich-text runs are
    /// concatenated; phonetic (`<rPh>`) runs are left out.
    pub fn read<R: BufRead>(inner: R) -> Result<Self> {
        let mut reader = Reader::from_reader(inner);
        let mut buf = Vec::new();
        let mut items = Vec::new();

        let mut current = String::new();
        let mut in_item = false;
        let mut in_text = false;
        let mut phonetic_depth = 0usize;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"si" => {
                        in_item = true;
                        current.clear();
                    }
                    b"rPh" => phonetic_depth += 1,
                    b"t" if in_item && phonetic_depth == 0 => in_text = true,
                    _ => {}
                },
                Event::End(e) => match e.local_name().as_ref() {
                    b"si" => {
                        items.push(std::mem::take(&mut current));
                        in_item = false;
                    }
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"t" => in_text = false,
                    _ => {}
                },
                Event::Empty(e) if e.local_name().as_ref() == b"si" => items.push(String::new()),
                Event::Text(t) if in_text => current.push_str(&t.unescape()?),
                Event::CData(t) if in_text => {
                    current.push_str(&String::from_utf8_lossy(&t.into_inner()))
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { items })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
