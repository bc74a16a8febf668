use std::io::Write;

use super::Reporter;
use crate::finding::Report;

/// Markdown document with a findings table and a recommendations list.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownReporter;

impl Reporter for MarkdownReporter {
    fn render(&self, out: &mut dyn Write, report: &Report) -> anyhow::Result<()> {
        writeln!(out, "# {} Audit Report\n", title_case(&report.module))?;

        if report.findings.is_empty() {
            writeln!(out, "No findings.\n")?;
            return Ok(());
        }

        writeln!(out, "| Severity | Check | Resource | Message |")?;
        writeln!(out, "| --- | --- | --- | --- |")?;
        for finding in &report.findings {
            writeln!(
                out,
                "| {} | {} | {} | {} |",
                finding.severity_label(),
                escape_cell(&finding.check_name),
                escape_cell(&finding.resource_id),
                escape_cell(&finding.message),
            )?;
        }
        writeln!(out)?;

        let mut recommendations = report
            .findings
            .iter()
            .filter(|finding| !finding.recommendation.is_empty())
            .peekable();
        if recommendations.peek().is_some() {
            writeln!(out, "## Recommendations\n")?;
            for finding in recommendations {
                writeln!(
                    out,
                    "- **{}**: {}",
                    finding.check_name, finding.recommendation
                )?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

fn title_case(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{finding::Finding, severity::Severity};

    fn render(report: &Report) -> String {
        let mut buf = Vec::new();
        MarkdownReporter.render(&mut buf, report).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn empty_report_has_heading_only() {
        let output = render(&Report::new("aws", vec![]));
        assert_eq!(output, "# Aws Audit Report\n\nNo findings.\n\n");
    }

    #[test]
    fn empty_module_name_keeps_heading() {
        let output = render(&Report::new("", vec![]));
        assert!(output.starts_with("#  Audit Report"));
    }

    #[test]
    fn recommendations_only_when_present() {
        let without = render(&Report::new(
            "aws",
            vec![Finding::new(
                "s3-public-bucket",
                Severity::Critical,
                "my-bucket",
                "Bucket is publicly accessible",
            )],
        ));
        assert!(without.contains("| CRITICAL | s3-public-bucket | my-bucket |"));
        assert!(!without.contains("- **"));

        let with = render(&Report::new(
            "git",
            vec![
                Finding::new("git-stale-branch", Severity::Low, "old-branch", "Branch is stale"),
                Finding::new("git-repo-size", Severity::Medium, ".", "Repo too large")
                    .with_recommendation("Clean up history"),
            ],
        ));
        assert!(with.contains("## Recommendations"));
        assert!(with.contains("- **git-repo-size**: Clean up history"));
        assert!(!with.contains("- **git-stale-branch**"));
    }

    #[test]
    fn pipes_in_cells_are_escaped() {
        let output = render(&Report::new(
            "docker",
            vec![Finding::new("c", Severity::Low, "a|b", "x")],
        ));
        assert!(output.contains("| a\\|b |"));
    }

    #[test]
    fn title_case_upper_cases_first_char() {
        assert_eq!(title_case("terraform"), "Terraform");
        assert_eq!(title_case("A"), "A");
        assert_eq!(title_case(""), "");
    }
}
