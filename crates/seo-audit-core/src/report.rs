use std::fmt::Write;

use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::aggregate::{ScoreBand, Summary};
use crate::schema::{AnalysisReport, ReportCategory, ReportItem, ReportItemStatus};

const BAR_WIDTH: usize = 20;
const LABEL_WIDTH: usize = 28;

/// Format styles supported by the dashboard renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// Options controlling how a report is presented.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub format: OutputFormat,
    /// URL shown in the heading; omitted when `None`.
    pub url: Option<String>,
    /// Expand every category instead of only the first.
    pub expand_all: bool,
}

/// Produce a dashboard string from an `AnalysisReport`.
///
/// Overall score and summary are derived from `report` on every call.
pub fn render_report(report: &AnalysisReport, options: &RenderOptions) -> anyhow::Result<String> {
    match options.format {
        OutputFormat::Human => render_human(report, options),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&JsonDashboard {
            url: options.url.as_deref(),
            overall_score: report.overall_score(),
            summary: report.summary(),
            report,
        })?),
    }
}

fn render_human(report: &AnalysisReport, options: &RenderOptions) -> anyhow::Result<String> {
    let mut out = String::new();
    if let Some(url) = &options.url {
        writeln!(out, "{} {}", "Analysis for:".bold(), url.cyan().underline())?;
        writeln!(out)?;
    }

    writeln!(out, "{}", "Report Overview".bold())?;
    for category in report.categories() {
        writeln!(out, "  {}", score_line(&category.title, category.score))?;
    }
    writeln!(out, "  {}", "─".repeat(LABEL_WIDTH + BAR_WIDTH + 8).dimmed())?;
    writeln!(out, "  {}", score_line("Overall Score", report.overall_score()))?;
    writeln!(out)?;

    writeln!(out, "{}", "Detailed Analysis".bold())?;
    for (idx, category) in report.categories().enumerate() {
        let open = options.expand_all || idx == 0;
        render_category(&mut out, category, open)?;
    }
    writeln!(out)?;

    writeln!(out, "{}", "Analysis Complete!".bold())?;
    writeln!(out, "  {}", summary_line(&report.summary()))?;
    Ok(out)
}

fn render_category(out: &mut String, category: &ReportCategory, open: bool) -> anyhow::Result<()> {
    let marker = if open { "▼" } else { "▶" };
    writeln!(
        out,
        "{marker} {} (Score: {}%)",
        category.title.bold(),
        category.score
    )?;
    if !open {
        return Ok(());
    }

    writeln!(out, "    {}", score_line("Category Score", category.score))?;
    if category.items.is_empty() {
        writeln!(out, "    No checks reported.")?;
    }
    for item in &category.items {
        render_item(out, item)?;
    }
    Ok(())
}

fn render_item(out: &mut String, item: &ReportItem) -> anyhow::Result<()> {
    writeln!(
        out,
        "    {} {} - {}",
        status_icon(item.status),
        item.name.bold(),
        single_line(&item.description)
    )?;
    if !item.value.trim().is_empty() {
        writeln!(out, "        Value: {}", single_line(&item.value))?;
    }
    if !item.guidance.trim().is_empty() {
        writeln!(out, "        Tip: {}", single_line(&item.guidance).dimmed())?;
    }
    Ok(())
}

fn score_line(label: &str, score: u8) -> String {
    format!(
        "{:<width$} [{}] {:>3}%",
        label,
        score_bar(score),
        score,
        width = LABEL_WIDTH
    )
}

fn score_bar(score: u8) -> String {
    let filled = (usize::from(score.min(100)) * BAR_WIDTH + 50) / 100;
    let bar = "#".repeat(filled);
    format!(
        "{}{}",
        paint(bar, ScoreBand::from_score(score)),
        "-".repeat(BAR_WIDTH - filled).dimmed()
    )
}

fn paint(text: String, band: ScoreBand) -> ColoredString {
    match band {
        ScoreBand::Good => text.green(),
        ScoreBand::Fair => text.yellow(),
        ScoreBand::Poor => text.red(),
    }
}

fn status_icon(status: ReportItemStatus) -> ColoredString {
    match status {
        ReportItemStatus::Pass => "✔".green(),
        ReportItemStatus::Warn => "⚠".yellow(),
        ReportItemStatus::Fail => "✖".red(),
    }
}

fn summary_line(summary: &Summary) -> String {
    format!(
        "{} Passed • {} Warnings • {} Errors",
        summary.passed, summary.warnings, summary.errors
    )
}

fn single_line(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\n' | '\r' => ' ',
            _ => c,
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct JsonDashboard<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    overall_score: u8,
    summary: Summary,
    report: &'a AnalysisReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validate;
    use insta::assert_snapshot;
    use serde_json::json;

    fn item(id: &str, name: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "status": status,
            "value": format!("{id} value"),
            "description": format!("{name} description"),
            "guidance": format!("Improve {name}")
        })
    }

    fn sample_report() -> AnalysisReport {
        colored::control::set_override(false);
        validate(&json!({
            "meta": { "title": "Meta Tags", "score": 80, "items": [
                item("title", "Title Tag", "pass"),
                item("description", "Meta Description", "warn")
            ]},
            "content": { "title": "Content", "score": 60, "items": [item("words", "Word Count", "fail")] },
            "structure": { "title": "Structure", "score": 100, "items": [item("h1", "Headings", "pass")] },
            "links": { "title": "Links", "score": 40, "items": [item("alt", "Image Alt Text", "fail")] },
            "mobile": { "title": "Mobile", "score": 90, "items": [] },
            "technical": { "title": "Technical", "score": 70, "items": [item("robots", "Robots.txt", "fail")] }
        }))
        .expect("sample report should validate")
    }

    fn options(expand_all: bool) -> RenderOptions {
        RenderOptions {
            format: OutputFormat::Human,
            url: Some("https://example.com".into()),
            expand_all,
        }
    }

    #[test]
    fn human_report_contains_dashboard_sections() {
        let output = render_report(&sample_report(), &options(false)).unwrap();
        assert!(output.contains("Analysis for: https://example.com"));
        assert!(output.contains("Report Overview"));
        assert!(output.contains("Overall Score"));
        assert!(output.contains(" 73%"));
        assert!(output.contains("Detailed Analysis"));
        assert!(output.contains("Analysis Complete!"));
        assert!(output.contains("2 Passed • 1 Warnings • 3 Errors"));
    }

    #[test]
    fn only_first_category_is_expanded_by_default() {
        let output = render_report(&sample_report(), &options(false)).unwrap();
        assert!(output.contains("▼ Meta Tags (Score: 80%)"));
        assert!(output.contains("Tip: Improve Title Tag"));
        assert!(output.contains("▶ Content (Score: 60%)"));
        assert!(!output.contains("Word Count"));
    }

    #[test]
    fn expand_all_lists_every_item() {
        let output = render_report(&sample_report(), &options(true)).unwrap();
        assert!(!output.contains('▶'));
        for name in ["Title Tag", "Word Count", "Headings", "Image Alt Text", "Robots.txt"] {
            assert!(output.contains(name), "missing {name}");
        }
        assert!(output.contains("No checks reported."));
    }

    #[test]
    fn score_bar_fills_proportionally() {
        colored::control::set_override(false);
        assert_snapshot!(score_line("Overall Score", 73), @"Overall Score                [###############-----]  73%");
        assert_eq!(score_bar(0), "-".repeat(BAR_WIDTH));
        assert_eq!(score_bar(100), "#".repeat(BAR_WIDTH));
    }

    #[test]
    fn json_report_recomputes_derived_values() {
        let report = sample_report();
        let output = render_report(
            &report,
            &RenderOptions {
                format: OutputFormat::Json,
                url: None,
                expand_all: false,
            },
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(value.get("url").is_none());
        assert_eq!(value["overall_score"], json!(73));
        assert_eq!(
            value["summary"],
            json!({ "passed": 2, "warnings": 1, "errors": 3 })
        );
        assert_eq!(value["report"], serde_json::to_value(&report).unwrap());
    }

    #[test]
    fn multi_line_text_is_flattened() {
        assert_eq!(single_line("a\nb\r\nc"), "a b  c");
    }
}
