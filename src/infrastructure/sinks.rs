// Case file sinks: JSON to a file or stdout, and an in-memory sink.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::info;
use crate::domain::case_file::CaseFile;
use crate::ports::CaseSink;

/// Streams `value` as JSON into `writer`, without building an intermediate
/// string or `serde_json::Value`.
pub fn write_json<W: Write, T: Serialize + ?Sized>(
    writer: &mut W,
    value: &T,
    pretty: bool,
) -> Result<()> {
    let written = if pretty {
        serde_json::to_writer_pretty(&mut *writer, value)
    } else {
        serde_json::to_writer(&mut *writer, value)
    };
    written.context("Failed to serialize case file")
}

#[derive(Debug, Clone)]
pub enum JsonTarget {
    Stdout,
    File(PathBuf),
}

/// Writes the case file as JSON. Nothing is written unless a case file is
/// accepted, so an aborted run leaves no output behind.
pub struct JsonSink {
    target: JsonTarget,
    pretty: bool,
    written: bool,
    closed: bool,
}

impl JsonSink {
    pub fn new(target: JsonTarget, pretty: bool) -> Self {
        Self {
            target,
            pretty,
            written: false,
            closed: false,
        }
    }

    pub fn written(&self) -> bool {
        self.written
    }
}

impl CaseSink for JsonSink {
    fn accept(&mut self, case_file: CaseFile) -> Result<()> {
        if self.closed {
            bail!("case file sink already closed");
        }
        match &self.target {
            JsonTarget::Stdout => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                write_json(&mut handle, &case_file, self.pretty)?;
                handle.write_all(b"\n")?;
                handle.flush()?;
            }
            JsonTarget::File(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                let mut writer = BufWriter::new(file);
                write_json(&mut writer, &case_file, self.pretty)?;
                writer
                    .flush()
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!(path = %path.display(), roots = case_file.len(), "case file written");
            }
        }
        self.written = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Keeps the case file in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    case_file: Option<CaseFile>,
    accepted: usize,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case_file(&self) -> Option<&CaseFile> {
        self.case_file.as_ref()
    }

    pub fn take_case_file(&mut self) -> Option<CaseFile> {
        self.case_file.take()
    }

    /// Number of case files accepted over the sink's lifetime.
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl CaseSink for MemorySink {
    fn accept(&mut self, case_file: CaseFile) -> Result<()> {
        if self.closed {
            bail!("case file sink already closed");
        }
        self.case_file = Some(case_file);
        self.accepted += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::case_file::DependencyTree;
    use tempfile::tempdir;

    fn sample() -> CaseFile {
        let mut tree = DependencyTree::new();
        tree.insert("util.js".to_string(), DependencyTree::new());
        let mut case_file = CaseFile::new();
        case_file.insert("main.js".to_string(), tree);
        case_file
    }

    #[test]
    fn test_write_json_compact() {
        let mut out = Vec::new();
        write_json(&mut out, &sample(), false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#"{"main.js":{"util.js":{}}}"#);
    }

    #[test]
    fn test_file_sink_writes_on_accept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("case.json");
        let mut sink = JsonSink::new(JsonTarget::File(path.clone()), true);

        sink.accept(sample()).unwrap();
        sink.close().unwrap();

        assert!(sink.written());
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["main.js"]["util.js"].is_object());
    }

    #[test]
    fn test_file_sink_without_accept_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("case.json");
        let mut sink = JsonSink::new(JsonTarget::File(path.clone()), false);
        sink.close().unwrap();

        assert!(!sink.written());
        assert!(!path.exists());
    }

    #[test]
    fn test_memory_sink_rejects_after_close() {
        let mut sink = MemorySink::new();
        sink.close().unwrap();
        assert!(sink.is_closed());
        assert!(sink.accept(sample()).is_err());
        assert_eq!(sink.accepted(), 0);
    }
}
