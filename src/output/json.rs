use std::io::{self, Write};

use super::ReportPrinter;
use crate::report::Report;

/// Writes reports as a pretty-printed JSON array.
pub struct JsonPrinter<W> {
    writer: W,
}

impl<W: Write> JsonPrinter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> ReportPrinter for JsonPrinter<W> {
    fn print(&mut self, reports: &[Report]) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, reports)?;
        writeln!(self.writer)?;
        self.writer.flush()
    }
}
