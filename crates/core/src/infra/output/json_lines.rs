use std::io::Write;

use super::RowSink;
use crate::domain::error::TranscribeError;
use crate::domain::types::ResultRow;

/// 1行1 JSON オブジェクトで書き出すシンク
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    name: String,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W, name: impl Into<String>) -> Self {
        Self {
            writer,
            name: name.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> RowSink for JsonLinesSink<W> {
    fn write_rows(&mut self, rows: &[ResultRow]) -> Result<(), TranscribeError> {
        let to_output_error = |e: std::io::Error| TranscribeError::Output(format!("{}: {e}", self.name));
        for row in rows {
            serde_json::to_writer(&mut self.writer, row)
                .map_err(|e| TranscribeError::Output(format!("{}: {e}", self.name)))?;
            self.writer.write_all(b"\n").map_err(to_output_error)?;
        }
        self.writer.flush().map_err(to_output_error)?;
        log::info!("Wrote {} rows to {}", rows.len(), self.name);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
