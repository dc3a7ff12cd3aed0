//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use sitecheck_common::{RunReport, Status};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable summary with a per-page table
    #[default]
    Text,
    /// The full report as JSON
    Json,
}

/// Print the finalized report in the selected format.
pub fn print_report(report: &RunReport, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", render_text(report)),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(report).unwrap_or_default()
            );
        }
    }
}

/// Render the human-readable summary.
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Page", "Passed", "Failed", "Errored"]);
    for (page, summary) in &report.per_page {
        table.add_row(vec![
            page.clone(),
            summary.passed.to_string(),
            paint_count(summary.failed, Status::Fail),
            paint_count(summary.errored, Status::Error),
        ]);
    }
    out.push_str(&table.to_string());
    out.push('\n');

    for problem in report.problems() {
        let marker = match problem.status {
            Status::Fail => "✗".red().to_string(),
            _ => "⚠".yellow().to_string(),
        };
        out.push_str(&format!(
            "{} {} [{}]: {}\n",
            marker,
            problem.check_id,
            problem.page,
            problem.message.as_deref().unwrap_or("no diagnostic"),
        ));
        if let Some(artifact) = &problem.artifact {
            out.push_str(&format!("  screenshot: {}\n", artifact.display()));
        }
    }

    let verdict = if report.passed() {
        format!("{}", "PASSED".green().bold())
    } else {
        format!("{}", "FAILED".red().bold())
    };
    out.push_str(&format!(
        "{}: {} checks, {} passed, {} failed, {} errored in {} ms\n",
        verdict,
        report.summary.total,
        report.summary.passed,
        report.summary.failed,
        report.summary.errored,
        report.duration_ms,
    ));

    out
}

fn paint_count(count: usize, status: Status) -> String {
    if count == 0 {
        return count.to_string();
    }
    match status {
        Status::Fail => count.to_string().red().to_string(),
        _ => count.to_string().yellow().to_string(),
    }
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "❌".red(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecheck_common::CheckResult;

    fn sample_report() -> RunReport {
        let mut report = RunReport::new();
        report.record(CheckResult::pass("tailwind-cdn", "index.html", 2));
        report.record(CheckResult::fail(
            "footer-copyright",
            "contact.html",
            3,
            "pattern `Tous droits` not found".into(),
        ));
        report.record(CheckResult::error(
            "theme-toggle",
            "index.html",
            30000,
            "check exceeded its 30s budget".into(),
        ));
        report.finalize(30005)
    }

    #[test]
    fn test_text_summary_lists_problems_and_totals() {
        colored::control::set_override(false);
        let text = render_text(&sample_report());

        assert!(text.contains("index.html"));
        assert!(text.contains("contact.html"));
        assert!(text.contains("✗ footer-copyright [contact.html]"));
        assert!(text.contains("⚠ theme-toggle [index.html]"));
        assert!(text.contains("FAILED: 3 checks, 1 passed, 1 failed, 1 errored"));
    }

    #[test]
    fn test_text_summary_all_green() {
        colored::control::set_override(false);
        let mut report = RunReport::new();
        report.record(CheckResult::pass("header-brand", "index.html", 1));
        let report = report.finalize(1);

        let text = render_text(&report);
        assert!(text.contains("PASSED: 1 checks, 1 passed, 0 failed, 0 errored"));
        assert!(!text.contains('✗'));
    }

    #[test]
    fn test_json_report_is_machine_readable() {
        let json = serde_json::to_string_pretty(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["total"], 3);
        assert_eq!(value["results"][1]["status"], "fail");
    }
}
