#![deny(missing_docs)]
//! Docsynth core library.
//!
//! This crate parses Python modules, synthesizes docstrings in Google, NumPy
//! or reST style, splices them after `def`/`class` lines and reports
//! PEP 257 coverage and compliance.

pub mod analysis;
pub mod domain;
pub mod error;
pub mod fs;
pub mod inspector;
pub mod parser;
pub mod report;
pub mod splice;
pub mod synthesizer;
pub mod validator;

pub use analysis::{
    AnalysisOptions, AnalysisStatus, FileAnalysis, analyze_source, try_analyze_source,
};
pub use domain::{
    ClassInfo, ComplianceIssue, ComplianceReport, CoverageReport, DocReport, DocStyle, Docstring,
    FunctionInfo, ModuleInfo, Parameter, ParameterKind, Scope,
};
pub use error::{DocsynthError, Result};
pub use fs::{FileSystem, StdFileSystem, is_python_file};
pub use inspector::{SourceInspector, build_report, compliance_percent, compute_coverage};
pub use parser::parse_module;
pub use report::{
    DEFAULT_ISSUE_LIMIT, compliance_headline, format_issue, render_analysis_markdown, render_json,
};
pub use splice::{AnnotateMode, annotate_source, definition_sites, splice};
pub use synthesizer::{Synthesizer, TemplateSynthesizer};
pub use validator::validate_module;
