//! Column-aligned text output, one block per instance.

use std::io::{self, Write};

use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::ReportPrinter;
use crate::report::{AttributeDrift, Report};

#[derive(Tabled)]
struct DriftRow {
    #[tabled(rename = "ATTRIBUTE")]
    attribute: String,
    #[tabled(rename = "DECLARED")]
    declared: String,
    #[tabled(rename = "LIVE")]
    live: String,
}

impl From<&AttributeDrift> for DriftRow {
    fn from(drift: &AttributeDrift) -> Self {
        Self {
            attribute: drift.name.to_string(),
            declared: drift.expected.to_string(),
            live: drift.found.to_string(),
        }
    }
}

pub struct TablePrinter<W> {
    writer: W,
}

impl<W: Write> TablePrinter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn print_report(&mut self, index: usize, report: &Report) -> io::Result<()> {
        writeln!(self.writer, "Instance [{}] : {}", index, report.instance_id)?;
        writeln!(self.writer, "Comment      : {}", report.comment)?;

        if !report.drifts.is_empty() {
            let rows: Vec<DriftRow> = report.drifts.iter().map(DriftRow::from).collect();
            let mut table = Table::new(rows);
            table.with(Style::blank());
            writeln!(self.writer, "{table}")?;
        }

        Ok(())
    }
}

impl<W: Write> ReportPrinter for TablePrinter<W> {
    fn print(&mut self, reports: &[Report]) -> io::Result<()> {
        if reports.is_empty() {
            writeln!(self.writer, "No instances to report.")?;
            return self.writer.flush();
        }

        for (index, report) in reports.iter().enumerate() {
            if index > 0 {
                writeln!(self.writer)?;
            }
            self.print_report(index + 1, report)?;
        }

        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Attribute, AttributeValue};
    use std::collections::BTreeMap;

    fn render(reports: &[Report]) -> String {
        let mut out = Vec::new();
        TablePrinter::new(&mut out).print(reports).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_empty_report_list() {
        assert_eq!(render(&[]), "No instances to report.\n");
    }

    #[test]
    fn test_clean_instance_has_no_table() {
        let output = render(&[Report::compared("i-1", Vec::new())]);
        assert!(output.contains("Instance [1] : i-1"));
        assert!(output.contains("Comment      : no drift detected"));
        assert!(!output.contains("ATTRIBUTE"));
    }

    #[test]
    fn test_drift_rows_render_values() {
        let tags = BTreeMap::from([("Name".to_string(), "web".to_string())]);
        let report = Report::compared(
            "i-1",
            vec![
                AttributeDrift {
                    name: Attribute::InstanceType,
                    expected: AttributeValue::Text("t2.small".to_string()),
                    found: AttributeValue::Text("t2.micro".to_string()),
                },
                AttributeDrift {
                    name: Attribute::Tags,
                    expected: AttributeValue::Map(tags),
                    found: AttributeValue::Absent,
                },
            ],
        );

        let output = render(&[report]);

        assert!(output.contains("Comment      : drift detected"));
        for expected in ["ATTRIBUTE", "DECLARED", "LIVE", "instance_type", "t2.small", "t2.micro"] {
            assert!(output.contains(expected), "missing {expected} in:\n{output}");
        }
        assert!(output.contains(r#"{"Name":"web"}"#));
    }

    #[test]
    fn test_instances_are_numbered_in_order() {
        let output = render(&[
            Report::compared("i-a", Vec::new()),
            Report::missing("i-b", Vec::new()),
        ]);
        let first = output.find("Instance [1] : i-a").unwrap();
        let second = output.find("Instance [2] : i-b").unwrap();
        assert!(first < second);
        assert!(output.contains("missing state"));
    }
}
