//! Coverage and compliance reporting, plus file-level inspection.

use std::path::{Path, PathBuf};

use crate::domain::{ComplianceReport, CoverageReport, DocReport, ModuleInfo};
use crate::error::{DocsynthError, Result};
use crate::fs::{FileSystem, is_python_file};
use crate::parser;
use crate::synthesizer::{Synthesizer, TemplateSynthesizer};
use crate::validator::validate_module;
use crate::{AnalysisOptions, FileAnalysis, analyze_source};

/// Issues a single symbol may accumulate before compliance bottoms out.
pub const ISSUES_PER_SYMBOL_CAP: usize = 3;

/// Count documented functions and classes in a module.
pub fn compute_coverage(module: &ModuleInfo) -> CoverageReport {
    let total_functions = module.functions.len();
    let total_classes = module.classes.len();
    let total_symbols = total_functions + total_classes;
    let documented_symbols = module
        .functions
        .iter()
        .filter(|function| function.docstring.is_some())
        .count()
        + module
            .classes
            .iter()
            .filter(|class| class.docstring.is_some())
            .count();

    let coverage_percent = if total_symbols == 0 {
        0.0
    } else {
        round1(100.0 * documented_symbols as f64 / total_symbols as f64)
    };

    CoverageReport {
        total_functions,
        total_classes,
        total_symbols,
        documented_symbols,
        coverage_percent,
    }
}

/// Coverage and compliance findings for a parsed module.
pub fn build_report(module: &ModuleInfo) -> DocReport {
    let issues = validate_module(module);
    DocReport {
        coverage: compute_coverage(module),
        compliance: ComplianceReport {
            issue_count: issues.len(),
            issues,
        },
    }
}

/// Share of the per-symbol issue budget left unused, rounded to one decimal.
///
/// Returns `0.0` for modules without symbols.
pub fn compliance_percent(coverage: &CoverageReport, compliance: &ComplianceReport) -> f64 {
    if coverage.total_symbols == 0 {
        return 0.0;
    }
    let max_issues = (coverage.total_symbols * ISSUES_PER_SYMBOL_CAP) as f64;
    let percent = round1(100.0 * (1.0 - compliance.issue_count as f64 / max_issues));
    percent.max(0.0)
}

/// Round to one decimal place, ties to even.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Reads, parses and reports on Python files through a [`FileSystem`].
pub struct SourceInspector<F: FileSystem, S: Synthesizer = TemplateSynthesizer> {
    fs: F,
    synthesizer: S,
}

impl<F: FileSystem> SourceInspector<F> {
    /// Create an inspector using the template synthesizer.
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            synthesizer: TemplateSynthesizer::new(),
        }
    }
}

impl<F: FileSystem, S: Synthesizer> SourceInspector<F, S> {
    /// Create an inspector with a custom synthesizer.
    pub fn with_synthesizer(fs: F, synthesizer: S) -> Self {
        Self { fs, synthesizer }
    }

    /// Python files under `root`, sorted; a `.py` file path is returned as-is.
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !self.fs.is_dir(root) {
            if is_python_file(root) {
                return Ok(vec![root.to_path_buf()]);
            }
            return Err(DocsynthError::Other(format!(
                "not a python file or directory: {}",
                root.display()
            )));
        }
        let mut files: Vec<PathBuf> = self
            .fs
            .list_files(root)?
            .into_iter()
            .filter(|path| is_python_file(path))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Parse the module stored at `path`.
    pub fn parse_module(&self, path: &Path) -> Result<ModuleInfo> {
        let source = self.fs.read_to_string(path)?;
        parser::parse_module(&source)
    }

    /// Coverage and compliance for the module stored at `path`.
    pub fn analyze_file(&self, path: &Path) -> Result<DocReport> {
        let module = self.parse_module(path)?;
        Ok(build_report(&module))
    }

    /// Full analysis of one file; failures are captured in the result.
    pub fn analyze_path(&self, path: &Path, options: &AnalysisOptions) -> FileAnalysis {
        let label = path.display().to_string();
        match self.fs.read_to_string(path) {
            Ok(source) => analyze_source(&label, &source, options, &self.synthesizer),
            Err(err) => {
                log::warn!("failed to read {label}: {err}");
                FileAnalysis::failed(label, options, err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisStatus;
    use crate::domain::{ComplianceIssue, Docstring, FunctionInfo};
    use crate::fs::MockFileSystem;

    fn documented(name: &str) -> FunctionInfo {
        FunctionInfo {
            name: name.to_string(),
            docstring: Some(Docstring::from_literal("\"\"\"Doc.\"\"\"", 1, 1)),
            ..FunctionInfo::default()
        }
    }

    #[test]
    fn coverage_counts_documented_symbols() {
        let module = ModuleInfo {
            docstring: None,
            functions: vec![
                documented("a"),
                documented("b"),
                FunctionInfo::default(),
            ],
            classes: vec![Default::default()],
        };
        let coverage = compute_coverage(&module);
        assert_eq!(coverage.total_functions, 3);
        assert_eq!(coverage.total_classes, 1);
        assert_eq!(coverage.total_symbols, 4);
        assert_eq!(coverage.documented_symbols, 2);
        assert_eq!(coverage.coverage_percent, 50.0);
    }

    #[test]
    fn coverage_of_empty_module_is_zero() {
        let coverage = compute_coverage(&ModuleInfo::default());
        assert_eq!(coverage.total_symbols, 0);
        assert_eq!(coverage.coverage_percent, 0.0);
    }

    #[test]
    fn compliance_uses_three_issue_cap_per_symbol() {
        let coverage = CoverageReport {
            total_symbols: 5,
            ..CoverageReport::default()
        };
        let issue = ComplianceIssue {
            code: "D103".to_string(),
            line: 1,
            message: "Missing docstring in public function".to_string(),
        };
        let two = ComplianceReport {
            issue_count: 2,
            issues: vec![issue.clone(), issue.clone()],
        };
        assert_eq!(compliance_percent(&coverage, &two), 86.7);

        let flooded = ComplianceReport {
            issue_count: 40,
            issues: Vec::new(),
        };
        assert_eq!(compliance_percent(&coverage, &flooded), 0.0);

        let empty = CoverageReport::default();
        assert_eq!(compliance_percent(&empty, &two), 0.0);
    }

    #[test]
    fn rounding_sends_ties_to_even() {
        assert_eq!(round1(6.25), 6.2);
        assert_eq!(round1(81.25), 81.2);
        assert_eq!(round1(86.666), 86.7);

        let coverage = CoverageReport {
            total_symbols: 16,
            ..CoverageReport::default()
        };
        let compliance = ComplianceReport {
            issue_count: 9,
            issues: Vec::new(),
        };
        assert_eq!(compliance_percent(&coverage, &compliance), 81.2);
    }

    #[test]
    fn build_report_counts_issues() {
        let module = ModuleInfo {
            docstring: None,
            functions: vec![FunctionInfo {
                name: "run".to_string(),
                line: 1,
                ..FunctionInfo::default()
            }],
            classes: Vec::new(),
        };
        let report = build_report(&module);
        assert_eq!(report.compliance.issue_count, 2);
        assert_eq!(report.compliance.issues[0].code, "D100");
        assert_eq!(report.compliance.issues[1].code, "D103");
        assert_eq!(report.coverage.coverage_percent, 0.0);
    }

    #[test]
    fn discover_filters_and_sorts_python_files() {
        let mut fs = MockFileSystem::new();
        fs.expect_is_dir().returning(|_| true);
        fs.expect_list_files().returning(|_| {
            Ok(vec![
                PathBuf::from("/repo/pkg/b.py"),
                PathBuf::from("/repo/README.md"),
                PathBuf::from("/repo/a.py"),
            ])
        });

        let inspector = SourceInspector::new(fs);
        let files = inspector.discover(Path::new("/repo")).expect("discover");
        assert_eq!(
            files,
            vec![PathBuf::from("/repo/a.py"), PathBuf::from("/repo/pkg/b.py")]
        );
    }

    #[test]
    fn discover_accepts_single_file_and_rejects_others() {
        let mut fs = MockFileSystem::new();
        fs.expect_is_dir().returning(|_| false);

        let inspector = SourceInspector::new(fs);
        let files = inspector
            .discover(Path::new("/repo/calc.py"))
            .expect("single file");
        assert_eq!(files, vec![PathBuf::from("/repo/calc.py")]);
        assert!(inspector.discover(Path::new("/repo/notes.txt")).is_err());
    }

    #[test]
    fn analyze_file_reads_through_filesystem() {
        let mut fs = MockFileSystem::new();
        fs.expect_read_to_string()
            .withf(|path| path == Path::new("/repo/calc.py"))
            .returning(|_| Ok("def add(a, b):\n    return a + b\n".to_string()));

        let inspector = SourceInspector::new(fs);
        let report = inspector
            .analyze_file(Path::new("/repo/calc.py"))
            .expect("report");
        assert_eq!(report.coverage.total_functions, 1);
        assert_eq!(report.compliance.issue_count, 2);
    }

    #[test]
    fn analyze_path_captures_read_failures() {
        let mut fs = MockFileSystem::new();
        fs.expect_read_to_string().returning(|_| {
            Err(DocsynthError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "missing",
            )))
        });

        let inspector = SourceInspector::new(fs);
        let analysis =
            inspector.analyze_path(Path::new("/repo/gone.py"), &AnalysisOptions::default());
        assert_eq!(analysis.status, AnalysisStatus::Failed);
        assert_eq!(analysis.error.as_deref(), Some("io error: missing"));
        assert!(analysis.annotated_source.is_none());
    }
}
