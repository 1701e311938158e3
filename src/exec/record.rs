// src/exec/record.rs

//! CSV result recording.
//!
//! The header is the raw command-line tokens followed by `stdout`, `stderr`
//! and `returncode`; each row is the invocation's argument list followed by
//! its captured output and exit code. An invocation may expand to a
//! different number of fields than the header, so the writer is flexible.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::errors::Result;

use super::CapturedOutput;

pub struct CsvRecorder {
    writer: csv::Writer<Box<dyn Write + Send>>,
}

impl CsvRecorder {
    /// Create (or truncate) `path` and write the header row.
    pub fn create(path: impl AsRef<Path>, tokens: &[String]) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        debug!(path = %path.display(), "recording results");
        Self::from_writer(Box::new(file), tokens)
    }

    pub fn from_writer(writer: Box<dyn Write + Send>, tokens: &[String]) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(writer);
        let header = tokens
            .iter()
            .map(String::as_str)
            .chain(["stdout", "stderr", "returncode"]);
        writer.write_record(header)?;
        Ok(Self { writer })
    }

    pub fn record(&mut self, argv: &[String], output: &CapturedOutput, code: i32) -> Result<()> {
        let code = code.to_string();
        let row = argv.iter().map(String::as_str).chain([
            output.stdout.as_str(),
            output.stderr.as_str(),
            code.as_str(),
        ]);
        self.writer.write_record(row)?;
        // Rows already written survive an interrupted run.
        self.writer.flush()?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for CsvRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvRecorder").finish_non_exhaustive()
    }
}
