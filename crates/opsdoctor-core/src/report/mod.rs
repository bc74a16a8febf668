use std::{fmt, io::Write};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{finding::Report, scoring::Summary};

mod markdown;
mod table;

pub use markdown::MarkdownReporter;
pub use table::TableReporter;

/// Renders one module's findings to an output sink.
pub trait Reporter: Send + Sync {
    fn render(&self, out: &mut dyn Write, report: &Report) -> anyhow::Result<()>;
}

/// Output styles supported by the bundled reporters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Markdown => "markdown",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the reporter for `format`. `color` only affects the table output.
pub fn reporter_for(format: OutputFormat, color: bool) -> Box<dyn Reporter> {
    match format {
        OutputFormat::Table => Box::new(TableReporter::new().with_color(color)),
        OutputFormat::Json => Box::new(JsonReporter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownReporter),
    }
}

/// Writes a report as a JSON document, one per call.
#[derive(Debug, Clone, Copy)]
pub struct JsonReporter {
    pretty: bool,
}

impl JsonReporter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl Reporter for JsonReporter {
    fn render(&self, out: &mut dyn Write, report: &Report) -> anyhow::Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, report)
        } else {
            serde_json::to_writer(&mut *out, report)
        }
        .with_context(|| format!("failed to encode {} report as JSON", report.module))?;
        writeln!(out)?;
        Ok(())
    }
}

/// Pretty JSON rendering of a run summary.
pub fn render_summary_json(out: &mut dyn Write, summary: &Summary) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, summary).context("failed to encode summary")?;
    writeln!(out)?;
    Ok(())
}
