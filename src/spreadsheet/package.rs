// file: src/spreadsheet/package.rs
// description: opens an xlsx package and locates the first worksheet and shared strings
// reference: https://docs.rs/zip, https://docs.rs/quick-xml

use crate::error::{CheckerError, Result};
use crate::spreadsheet::shared_strings::SharedStrings;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const DEFAULT_SHEET_PART: &str = "xl/worksheets/sheet1.xml";
const DEFAULT_SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Read-only handle on an xlsx package. Parts are streamed out of the
/// archive on demand; nothing is inflated up front.
pub struct WorkbookPackage {
    archive: ZipArchive<BufReader<File>>,
    path: PathBuf,
    sheet_name: String,
    sheet_part: String,
    shared_strings_part: Option<String>,
}

#[derive(Debug, Default)]
struct Relationship {
    id: String,
    kind: String,
    target: String,
}

impl WorkbookPackage {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            CheckerError::DocumentOpen(format!("Could not open {}: {}", path.display(), e))
        })?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        if !has_part(&archive, WORKBOOK_PART) {
            return Err(CheckerError::DocumentOpen(format!(
                "{} is not a spreadsheet document: missing {}",
                path.display(),
                WORKBOOK_PART
            )));
        }

        let (sheet_name, sheet_rel_id) = read_first_sheet(&mut archive)?;
        let relationships = if has_part(&archive, WORKBOOK_RELS_PART) {
            read_relationships(&mut archive)?
        } else {
            Vec::new()
        };

        let sheet_part = sheet_rel_id
            .and_then(|id| relationships.iter().find(|rel| rel.id == id))
            .map(|rel| resolve_target(&rel.target))
            .unwrap_or_else(|| DEFAULT_SHEET_PART.to_string());

        if !has_part(&archive, &sheet_part) {
            return Err(CheckerError::DocumentOpen(format!(
                "{} does not contain worksheet part {}",
                path.display(),
                sheet_part
            )));
        }

        let shared_strings_part = relationships
            .iter()
            .find(|rel| rel.kind.ends_with("/sharedStrings"))
            .map(|rel| resolve_target(&rel.target))
            .or_else(|| Some(DEFAULT_SHARED_STRINGS_PART.to_string()))
            .filter(|part| has_part(&archive, part));

        debug!(
            "Opened {}: sheet '{}' at {}, shared strings {:?}",
            path.display(),
            sheet_name,
            sheet_part,
            shared_strings_part
        );

        Ok(Self {
            archive,
            path: path.to_path_buf(),
            sheet_name,
            sheet_part,
            shared_strings_part,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn sheet_part(&self) -> &str {
        &self.sheet_part
    }

    /// Loads the shared string table. A workbook without one yields an
    /// empty table.
    pub fn load_shared_strings(&mut self) -> Result<SharedStrings> {
        let Some(part) = self.shared_strings_part.clone() else {
            return Ok(SharedStrings::default());
        };

        let reader = self.open_part(&part)?;
        SharedStrings::read(reader)
    }

    /// Opens the first worksheet for a forward-only read.
    pub fn open_sheet(&mut self) -> Result<impl BufRead + use<'_>> {
        let part = self.sheet_part.clone();
        self.open_part(&part)
    }

    fn open_part(&mut self, name: &str) -> Result<impl BufRead + use<'_>> {
        let entry = self.archive.by_name(name)?;
        Ok(BufReader::new(entry))
    }
}

fn has_part<R: std::io::Read + std::io::Seek>(archive: &ZipArchive<R>, name: &str) -> bool {
    archive.file_names().any(|entry| entry == name)
}

/// Relationship targets are relative to `xl/` unless rooted.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(rooted) => rooted.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    }
}

fn read_first_sheet(
    archive: &mut ZipArchive<BufReader<File>>,
) -> Result<(String, Option<String>)> {
    let entry = archive.by_name(WORKBOOK_PART)?;
    let mut reader = Reader::from_reader(BufReader::new(entry));
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attribute(&e, b"name")?.unwrap_or_else(|| "Sheet1".to_string());
                let rel_id = attribute(&e, b"id")?;
                return Ok((name, rel_id));
            }
            Event::Eof => {
                return Err(CheckerError::DocumentOpen(
                    "Workbook does not declare any sheets".to_string(),
                ));
            }
            _ => {}
        }
        buf.clear();
    }
}

fn read_relationships(archive: &mut ZipArchive<BufReader<File>>) -> Result<Vec<Relationship>> {
    let entry = archive.by_name(WORKBOOK_RELS_PART)?;
    let mut reader = Reader::from_reader(BufReader::new(entry));
    let mut buf = Vec::new();
    let mut relationships = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                relationships.push(Relationship {
                    id: attribute(&e, b"Id")?.unwrap_or_default(),
                    kind: attribute(&e, b"Type")?.unwrap_or_default(),
                    target: attribute(&e, b"Target")?.unwrap_or_default(),
                });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

/// Looks up an attribute by local name, ignoring any namespace prefix.
pub(crate) fn attribute(element: &BytesStart<'_>, local_name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| CheckerError::DocumentOpen(e.to_string()))?;
        if attr.key.local_name().as_ref() == local_name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
