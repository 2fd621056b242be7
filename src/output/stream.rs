use crate::error::Error;
use crate::query::{QueryContext, RowSink};
use crate::resource::NormalizedResourceRow;
use std::io::Write;

/// Writes each row as one JSON line the moment it is emitted
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    written: u64,
    limit: Option<u64>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W, ctx: &QueryContext) -> Self {
        Self {
            writer,
            written: 0,
            limit: ctx.limit,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> RowSink for JsonLinesSink<W> {
    fn emit(&mut self, row: NormalizedResourceRow) -> Result<(), Error> {
        let line = serde_json::to_string(&row).map_err(|e| Error::Sink(e.to_string()))?;
        writeln!(self.writer, "{}", line).map_err(|e| Error::Sink(e.to_string()))?;
        self.written += 1;
        Ok(())
    }

    fn rows_remaining(&self) -> Option<u64> {
        self.limit.map(|limit| limit.saturating_sub(self.written))
    }
}
