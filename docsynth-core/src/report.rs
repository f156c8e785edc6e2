//! Report formatting utilities for docsynth outputs.

use std::fmt::Write;

use serde::Serialize;

use crate::analysis::{AnalysisStatus, FileAnalysis};
use crate::domain::{ComplianceIssue, ComplianceReport, CoverageReport};

/// Issues listed per file unless the caller asks for another limit.
pub const DEFAULT_ISSUE_LIMIT: usize = 5;

/// Render a list of file analyses as Markdown.
pub fn render_analysis_markdown(analyses: &[FileAnalysis], issue_limit: usize) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Docstring Synthesis & Validation Report\n");
    for analysis in analyses {
        let _ = writeln!(output, "## {}\n", analysis.source);
        let _ = writeln!(output, "- Style: {}", analysis.style);
        match analysis.status {
            AnalysisStatus::Analyzed => {
                let _ = writeln!(output, "- Status: analyzed\n");
            }
            AnalysisStatus::Pending => {
                let _ = writeln!(output, "- Status: pending\n");
                continue;
            }
            AnalysisStatus::Failed => {
                let error = analysis.error.as_deref().unwrap_or("unknown error");
                let _ = writeln!(output, "- Status: failed ({error})\n");
                continue;
            }
        }

        append_summary(
            &mut output,
            analysis.coverage.as_ref(),
            analysis.compliance.as_ref(),
            analysis.compliance_percent,
        );
        append_annotated_source(&mut output, analysis.annotated_source.as_deref());
        if analysis.validated {
            append_issues(
                &mut output,
                analysis.compliance.as_ref(),
                analysis.compliance_percent,
                issue_limit,
            );
        }
        let _ = writeln!(output, "---\n");
    }
    output
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

/// `[D103] L4: Missing docstring in public function`
pub fn format_issue(issue: &ComplianceIssue) -> String {
    format!("[{}] L{}: {}", issue.code, issue.line, issue.message)
}

/// One-line compliance verdict shown above the issue list.
pub fn compliance_headline(compliance: &ComplianceReport, percent: f64) -> String {
    if compliance.issue_count == 0 {
        "100% PEP 257 Compliant".to_string()
    } else {
        format!(
            "{} violations ({percent:.1}% compliance)",
            compliance.issue_count
        )
    }
}

fn append_summary(
    output: &mut String,
    coverage: Option<&CoverageReport>,
    compliance: Option<&ComplianceReport>,
    compliance_percent: Option<f64>,
) {
    let _ = writeln!(output, "### Compliance & Coverage");
    let Some(coverage) = coverage else {
        let _ = writeln!(output, "Coverage unavailable.\n");
        return;
    };
    let _ = writeln!(output, "- Total Functions: {}", coverage.total_functions);
    let _ = writeln!(output, "- Total Classes: {}", coverage.total_classes);
    let _ = writeln!(
        output,
        "- Documented: {} vs Undocumented: {}",
        coverage.documented_symbols,
        coverage.undocumented_symbols()
    );
    let _ = writeln!(output, "- Documentation %: {:.1}%", coverage.coverage_percent);
    if let Some(percent) = compliance_percent {
        let _ = writeln!(output, "- pydocstyle Compliance %: {percent:.1}%");
    }
    if let Some(compliance) = compliance {
        let _ = writeln!(output, "- Total Issues: {}", compliance.issue_count);
    }
    let _ = writeln!(output);
}

fn append_annotated_source(output: &mut String, source: Option<&str>) {
    let _ = writeln!(output, "### Complete Code with Generated Docstrings");
    match source {
        Some(source) => {
            let _ = writeln!(output, "```python\n{source}\n```\n");
        }
        None => {
            let _ = writeln!(output, "Annotated source unavailable.\n");
        }
    }
}

fn append_issues(
    output: &mut String,
    compliance: Option<&ComplianceReport>,
    percent: Option<f64>,
    limit: usize,
) {
    let _ = writeln!(output, "### pydocstyle Issues (PEP 257)");
    let Some(compliance) = compliance else {
        let _ = writeln!(output, "Compliance unavailable.\n");
        return;
    };
    let _ = writeln!(
        output,
        "{}",
        compliance_headline(compliance, percent.unwrap_or(0.0))
    );
    for issue in compliance.issues.iter().take(limit) {
        let _ = writeln!(output, "- {}", format_issue(issue));
    }
    let hidden = compliance.issues.len().saturating_sub(limit);
    if hidden > 0 {
        let _ = writeln!(output, "- ... {hidden} more");
    }
    let _ = writeln!(output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisOptions;

    fn issue(code: &str, line: usize) -> ComplianceIssue {
        ComplianceIssue {
            code: code.to_string(),
            line,
            message: format!("problem {code}"),
        }
    }

    fn sample_analysis() -> FileAnalysis {
        let mut analysis = FileAnalysis::new("mixed.py", &AnalysisOptions::default());
        analysis.status = AnalysisStatus::Analyzed;
        analysis.coverage = Some(CoverageReport {
            total_functions: 4,
            total_classes: 1,
            total_symbols: 5,
            documented_symbols: 3,
            coverage_percent: 60.0,
        });
        analysis.compliance = Some(ComplianceReport {
            issue_count: 2,
            issues: vec![issue("D103", 16), issue("D102", 24)],
        });
        analysis.compliance_percent = Some(86.7);
        analysis.annotated_source = Some("def add(a, b):\n    return a + b".to_string());
        analysis
    }

    #[test]
    fn renders_analysis_markdown() {
        let output = render_analysis_markdown(&[sample_analysis()], DEFAULT_ISSUE_LIMIT);
        assert!(output.contains("# Docstring Synthesis & Validation Report"));
        assert!(output.contains("## mixed.py"));
        assert!(output.contains("- Total Functions: 4"));
        assert!(output.contains("- Documented: 3 vs Undocumented: 2"));
        assert!(output.contains("- Documentation %: 60.0%"));
        assert!(output.contains("- pydocstyle Compliance %: 86.7%"));
        assert!(output.contains("```python\ndef add(a, b):"));
        assert!(output.contains("2 violations (86.7% compliance)"));
        assert!(output.contains("- [D103] L16: problem D103"));
    }

    #[test]
    fn markdown_skips_issues_without_validation_and_limits_list() {
        let mut analysis = sample_analysis();
        analysis.validated = false;
        let output = render_analysis_markdown(&[analysis], DEFAULT_ISSUE_LIMIT);
        assert!(!output.contains("pydocstyle Issues"));

        let output = render_analysis_markdown(&[sample_analysis()], 1);
        assert!(output.contains("[D103]"));
        assert!(!output.contains("[D102]"));
        assert!(output.contains("... 1 more"));
    }

    #[test]
    fn markdown_reports_failures() {
        let failed = FileAnalysis::failed("broken.py", &AnalysisOptions::default(), "parse error");
        let output = render_analysis_markdown(&[failed], DEFAULT_ISSUE_LIMIT);
        assert!(output.contains("Status: failed (parse error)"));
        assert!(!output.contains("Compliance & Coverage"));
    }

    #[test]
    fn headline_celebrates_clean_files() {
        let clean = ComplianceReport::default();
        assert_eq!(compliance_headline(&clean, 100.0), "100% PEP 257 Compliant");

        let flagged = ComplianceReport {
            issue_count: 3,
            issues: Vec::new(),
        };
        assert_eq!(
            compliance_headline(&flagged, 50.0),
            "3 violations (50.0% compliance)"
        );
    }

    #[test]
    fn renders_json_payload() {
        let json = render_json(&vec![sample_analysis()]).expect("json");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert!(parsed.is_array());
        assert_eq!(parsed[0]["status"], "analyzed");
        assert_eq!(parsed[0]["coverage"]["coveragePercent"], 60.0);
        assert_eq!(parsed[0]["compliance"]["issues"][0]["code"], "D103");
    }
}
