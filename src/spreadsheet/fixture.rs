// file: src/spreadsheet/fixture.rs
// description: builds small xlsx workbooks on disk for tests
// reference: https://docs.rs/zip

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

#[derive(Debug, Clone)]
pub enum FixtureValue {
    Shared(String),
    Inline(String),
    Number(f64),
}

impl FixtureValue {
    pub fn shared(text: &str) -> Self {
        Self::Shared(text.to_string())
    }

    pub fn inline(text: &str) -> Self {
        Self::Inline(text.to_string())
    }
}

/// Rows are numbered from 1 in insertion order.
#[derive(Debug, Default)]
pub struct WorkbookFixture {
    rows: Vec<Vec<(String, FixtureValue)>>,
    omit_references: bool,
}

impl WorkbookFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, cells: &[(&str, FixtureValue)]) -> Self {
        self.rows.push(
            cells
                .iter()
                .map(|(column, value)| (column.to_string(), value.clone()))
                .collect(),
        );
        self
    }

    /// One shared-string cell per row in `column`, below a header row.
    pub fn column(mut self, column: &str, header: &str, values: &[&str]) -> Self {
        self = self.row(&[(column, FixtureValue::shared(header))]);
        for value in values {
            self = self.row(&[(column, FixtureValue::shared(value))]);
        }
        self
    }

    /// Writes cells without `r` attributes, as some producers do.
    pub fn without_references(mut self) -> Self {
        self.omit_references = true;
        self
    }

    pub fn write(&self, path: &Path) {
        let mut shared: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut sheet = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );

        for (i, cells) in self.rows.iter().enumerate() {
            let row_number = i + 1;
            if self.omit_references {
                sheet.push_str("<row>");
            } else {
                sheet.push_str(&format!(r#"<row r="{}">"#, row_number));
            }

            for (column, value) in cells {
                let reference = if self.omit_references {
                    String::new()
                } else {
                    format!(r#" r="{}{}""#, column, row_number)
                };

                match value {
                    FixtureValue::Shared(text) => {
                        let next = shared.len();
                        let id = *index.entry(text.clone()).or_insert_with(|| {
                            shared.push(text.clone());
                            next
                        });
                        sheet.push_str(&format!(r#"<c{} t="s"><v>{}</v></c>"#, reference, id));
                    }
                    FixtureValue::Inline(text) => sheet.push_str(&format!(
                        r#"<c{} t="inlineStr"><is><t>{}</t></is></c>"#,
                        reference,
                        escape(text)
                    )),
                    FixtureValue::Number(n) => {
                        sheet.push_str(&format!(r#"<c{}><v>{}</v></c>"#, reference, n))
                    }
                }
            }
            sheet.push_str("</row>");
        }
        sheet.push_str("</sheetData></worksheet>");

        let mut sst = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
            shared.len()
        );
        for text in &shared {
            sst.push_str(&format!("<si><t xml:space=\"preserve\">{}</t></si>", escape(text)));
        }
        sst.push_str("</sst>");

        let file = File::create(path).expect("create fixture workbook");
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", ROOT_RELS.to_string()),
            ("xl/workbook.xml", WORKBOOK.to_string()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
            ("xl/worksheets/sheet1.xml", sheet),
            ("xl/sharedStrings.xml", sst),
        ];

        for (name, body) in parts {
            zip.start_file(name, options).expect("start fixture part");
            zip.write_all(body.as_bytes()).expect("write fixture part");
        }
        zip.finish().expect("finish fixture workbook");
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;
