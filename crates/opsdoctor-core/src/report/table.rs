use std::io::Write;

use colored::{ColoredString, Colorize};

use super::Reporter;
use crate::{
    finding::{Finding, Report},
    severity::Severity,
};

const HEADERS: [&str; 4] = ["SEVERITY", "CHECK NAME", "RESOURCE", "MESSAGE"];
const COLUMN_GAP: usize = 2;

/// Aligned plain-text table, optionally with coloured severities.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableReporter {
    color: bool,
}

impl TableReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn paint(&self, finding: &Finding, padded: String) -> String {
        if !self.color {
            return padded;
        }
        let painted: ColoredString = match finding.severity {
            Some(Severity::Critical) => padded.as_str().red(),
            Some(Severity::High) => padded.as_str().yellow(),
            Some(Severity::Medium | Severity::Low) => padded.as_str().green(),
            None => return padded,
        };
        painted.to_string()
    }
}

fn row(finding: &Finding) -> [&str; 4] {
    [
        finding.severity_label(),
        &finding.check_name,
        &finding.resource_id,
        &finding.message,
    ]
}

impl Reporter for TableReporter {
    fn render(&self, out: &mut dyn Write, report: &Report) -> anyhow::Result<()> {
        writeln!(out, "=== {} Audit Results ===\n", report.module)?;
        if report.findings.is_empty() {
            writeln!(out, "No issues found.")?;
            return Ok(());
        }

        let mut widths = HEADERS.map(str::len);
        for finding in &report.findings {
            for (width, cell) in widths.iter_mut().zip(row(finding)) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let rule = HEADERS.map(|header| "-".repeat(header.len()));
        write_line(out, &widths, &HEADERS)?;
        write_line(out, &widths, &rule.iter().map(String::as_str).collect::<Vec<_>>())?;
        for finding in &report.findings {
            let cells = row(finding);
            let severity = pad(cells[0], widths[0]);
            writeln!(
                out,
                "{}{}",
                self.paint(finding, severity),
                join_tail(&widths[1..], &cells[1..])
            )?;
        }
        Ok(())
    }
}

fn pad(cell: &str, width: usize) -> String {
    format!("{cell:<width$}", width = width + COLUMN_GAP)
}

fn join_tail(widths: &[usize], cells: &[&str]) -> String {
    let last = cells.len().saturating_sub(1);
    let mut line = String::new();
    for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if idx == last {
            line.push_str(cell);
        } else {
            line.push_str(&pad(cell, *width));
        }
    }
    line
}

fn write_line(out: &mut dyn Write, widths: &[usize; 4], cells: &[&str]) -> std::io::Result<()> {
    writeln!(
        out,
        "{}{}",
        pad(cells[0], widths[0]),
        join_tail(&widths[1..], &cells[1..])
    )
}
