//! Per-file analysis: parse, report and annotate one source text.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ComplianceReport, CoverageReport, DocStyle};
use crate::error::Result;
use crate::inspector::{build_report, compliance_percent};
use crate::parser::parse_module;
use crate::splice::{AnnotateMode, annotate_source};
use crate::synthesizer::Synthesizer;

/// Knobs shared by every file in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Style used for synthesized docstrings.
    pub style: DocStyle,
    /// Whether compliance issues are surfaced in rendered reports.
    pub validate: bool,
    /// Which definitions receive synthesized docstrings.
    pub mode: AnnotateMode,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            style: DocStyle::Google,
            validate: true,
            mode: AnnotateMode::All,
        }
    }
}

/// Progress of a file analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Analysis has not run yet.
    Pending,
    /// Analysis completed.
    Analyzed,
    /// Analysis failed; see `error`.
    Failed,
}

/// Analysis results for a single source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysis {
    /// File name or path label.
    pub source: String,
    /// Analysis status.
    pub status: AnalysisStatus,
    /// Failure description when `status` is `failed`.
    pub error: Option<String>,
    /// Style used for synthesized docstrings.
    pub style: DocStyle,
    /// Whether compliance issues should be displayed.
    pub validated: bool,
    /// Docstring coverage counts.
    pub coverage: Option<CoverageReport>,
    /// Style compliance findings.
    pub compliance: Option<ComplianceReport>,
    /// Compliance percentage derived from the findings.
    pub compliance_percent: Option<f64>,
    /// Source with synthesized docstrings spliced in.
    pub annotated_source: Option<String>,
}

impl FileAnalysis {
    /// Create a pending analysis for a source label.
    pub fn new(source: impl Into<String>, options: &AnalysisOptions) -> Self {
        Self {
            source: source.into(),
            status: AnalysisStatus::Pending,
            error: None,
            style: options.style,
            validated: options.validate,
            coverage: None,
            compliance: None,
            compliance_percent: None,
            annotated_source: None,
        }
    }

    /// Create a failed analysis.
    pub fn failed(
        source: impl Into<String>,
        options: &AnalysisOptions,
        error: impl Into<String>,
    ) -> Self {
        let mut analysis = Self::new(source, options);
        analysis.status = AnalysisStatus::Failed;
        analysis.error = Some(error.into());
        analysis
    }
}

/// Analyze source text, returning the first failure as an error.
pub fn try_analyze_source<S: Synthesizer + ?Sized>(
    label: &str,
    source: &str,
    options: &AnalysisOptions,
    synthesizer: &S,
) -> Result<FileAnalysis> {
    let module = parse_module(source)?;
    let report = build_report(&module);
    let annotated = annotate_source(source, &module, options.style, synthesizer, options.mode)?;

    let mut analysis = FileAnalysis::new(label, options);
    analysis.status = AnalysisStatus::Analyzed;
    analysis.compliance_percent = Some(compliance_percent(&report.coverage, &report.compliance));
    analysis.coverage = Some(report.coverage);
    analysis.compliance = Some(report.compliance);
    analysis.annotated_source = Some(annotated);
    log::info!(
        "analyzed {label}: {} symbols, {} issues",
        analysis.coverage.as_ref().map_or(0, |c| c.total_symbols),
        analysis.compliance.as_ref().map_or(0, |c| c.issue_count)
    );
    Ok(analysis)
}

/// Analyze source text; failures are recorded on the returned analysis.
pub fn analyze_source<S: Synthesizer + ?Sized>(
    label: &str,
    source: &str,
    options: &AnalysisOptions,
    synthesizer: &S,
) -> FileAnalysis {
    match try_analyze_source(label, source, options, synthesizer) {
        Ok(analysis) => analysis,
        Err(err) => {
            log::warn!("analysis of {label} failed: {err}");
            FileAnalysis::failed(label, options, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocsynthError;
    use crate::synthesizer::{MockSynthesizer, TemplateSynthesizer};

    #[test]
    fn analyzes_and_annotates_source() {
        let options = AnalysisOptions {
            style: DocStyle::NumPy,
            ..AnalysisOptions::default()
        };
        let analysis = analyze_source(
            "calc.py",
            "def add(a, b):\n    return a + b\n",
            &options,
            &TemplateSynthesizer::new(),
        );

        assert_eq!(analysis.status, AnalysisStatus::Analyzed);
        assert_eq!(analysis.style, DocStyle::NumPy);
        let coverage = analysis.coverage.expect("coverage");
        assert_eq!(coverage.total_functions, 1);
        assert_eq!(coverage.documented_symbols, 0);
        assert_eq!(analysis.compliance.expect("compliance").issue_count, 2);
        assert_eq!(analysis.compliance_percent, Some(33.3));
        let annotated = analysis.annotated_source.expect("annotated");
        assert!(annotated.starts_with("def add(a, b):\n    \"\"\"\n    Add.\n"));
        assert!(annotated.contains("    Parameters\n    ----------"));
    }

    #[test]
    fn parse_failures_mark_analysis_failed() {
        let analysis = analyze_source(
            "broken.py",
            "def broken(:\n",
            &AnalysisOptions::default(),
            &TemplateSynthesizer::new(),
        );
        assert_eq!(analysis.status, AnalysisStatus::Failed);
        assert!(analysis.error.expect("error").starts_with("parse error"));
        assert!(analysis.coverage.is_none());
    }

    #[test]
    fn synthesizer_failures_surface_as_errors() {
        let mut synthesizer = MockSynthesizer::new();
        synthesizer
            .expect_function_doc()
            .returning(|_, _| Err(DocsynthError::Other("model offline".to_string())));
        let result = try_analyze_source(
            "calc.py",
            "def add(a, b):\n    return a + b\n",
            &AnalysisOptions::default(),
            &synthesizer,
        );
        match result {
            Err(DocsynthError::Other(message)) => assert_eq!(message, "model offline"),
            other => panic!("expected synthesizer error, got {other:?}"),
        }
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let analysis = FileAnalysis::failed("x.py", &AnalysisOptions::default(), "boom");
        let json = serde_json::to_value(&analysis).expect("json");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["style"], "Google");
        assert_eq!(json["error"], "boom");
        assert!(json["annotatedSource"].is_null());
    }
}
