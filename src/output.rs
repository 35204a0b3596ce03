//! Report rendering.

mod json;
mod table;

pub use json::JsonPrinter;
pub use table::TablePrinter;

use std::io::{self, Write};

use clap::ValueEnum;

use crate::report::Report;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub trait ReportPrinter {
    fn print(&mut self, reports: &[Report]) -> io::Result<()>;
}

pub fn printer<'a, W: Write + 'a>(format: OutputFormat, writer: W) -> Box<dyn ReportPrinter + 'a> {
    match format {
        OutputFormat::Table => Box::new(TablePrinter::new(writer)),
        OutputFormat::Json => Box::new(JsonPrinter::new(writer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Report;

    #[test]
    fn test_printer_selects_format() {
        let reports = vec![Report::compared("i-1", Vec::new())];

        let mut json = Vec::new();
        printer(OutputFormat::Json, &mut json).print(&reports).unwrap();
        assert!(String::from_utf8(json).unwrap().trim_start().starts_with('['));

        let mut table = Vec::new();
        printer(OutputFormat::Table, &mut table).print(&reports).unwrap();
        assert!(String::from_utf8(table).unwrap().contains("Instance [1] : i-1"));
    }

    #[test]
    fn test_default_format_is_table() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }
}
