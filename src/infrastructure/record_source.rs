//! JSON-lines record reader.
//!
//! One record per line, as emitted by the module scanner:
//!
//! ```text
//! {"suspect": "/src/main.js", "leads": ["/src/a.js"], "source": null}
//! {"suspect": "/src/a.js", "leads": [], "source": "/src/main.js"}
//! ```
//!
//! Blank lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use anyhow::{Context, Result};
use crate::domain::record::{DependencyRecord, RawRecord};

pub struct JsonLinesRecords<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> JsonLinesRecords<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for JsonLinesRecords<R> {
    type Item = Result<DependencyRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line_no = self.line_no;

            let line = match line.with_context(|| format!("Failed to read line {}", line_no)) {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            return Some(parse_line(trimmed).with_context(|| format!("line {}", line_no)));
        }
    }
}

fn parse_line(line: &str) -> Result<DependencyRecord> {
    let raw: RawRecord = serde_json::from_str(line).context("Invalid JSON record")?;
    Ok(DependencyRecord::try_from(raw)?)
}

/// Open a JSON-lines file for streaming.
pub fn open_records(path: &Path) -> Result<JsonLinesRecords<BufReader<File>>> {
    let file = File::open(path)
        .with_context(|| format!("Cannot read record file {}", path.display()))?;
    Ok(JsonLinesRecords::new(BufReader::new(file)))
}
