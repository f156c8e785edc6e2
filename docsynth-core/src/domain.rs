//! Domain entities for docsynth.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Docstring layout conventions supported by the synthesizer.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum DocStyle {
    /// Google style (`Args:` / `Returns:` sections).
    #[default]
    #[serde(alias = "google")]
    Google,
    /// NumPy style (underlined section headers).
    #[serde(alias = "numpy")]
    NumPy,
    /// reStructuredText field lists (`:param x:`).
    #[serde(rename = "reST", alias = "rest", alias = "rst")]
    Rest,
}

impl DocStyle {
    /// All styles in presentation order.
    pub const ALL: [DocStyle; 3] = [DocStyle::Google, DocStyle::NumPy, DocStyle::Rest];

    /// Display label for the style.
    pub fn label(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::NumPy => "NumPy",
            Self::Rest => "reST",
        }
    }
}

impl fmt::Display for DocStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "numpy" => Ok(Self::NumPy),
            "rest" | "rst" | "restructuredtext" => Ok(Self::Rest),
            other => Err(format!(
                "unknown docstring style: {other} (expected google, numpy or rest)"
            )),
        }
    }
}

/// A docstring literal as it appears in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Docstring {
    /// The literal exactly as written, prefix and quotes included.
    pub raw: String,
    /// The literal contents with prefix and quotes removed.
    pub text: String,
    /// 1-based line the literal starts on.
    pub line: usize,
    /// 1-based line the literal ends on.
    pub end_line: usize,
}

impl Docstring {
    /// Build a docstring from its raw literal, deriving the text.
    pub fn from_literal(raw: impl Into<String>, line: usize, end_line: usize) -> Self {
        let raw = raw.into();
        let text = strip_string_literal(&raw).to_string();
        Self {
            raw,
            text,
            line,
            end_line,
        }
    }

    /// Opening quote sequence of the literal, prefix excluded.
    pub fn quotes(&self) -> &str {
        let body = self.raw.trim_start_matches(is_prefix_char);
        if body.starts_with("\"\"\"") {
            "\"\"\""
        } else if body.starts_with("'''") {
            "'''"
        } else if body.starts_with('"') {
            "\""
        } else if body.starts_with('\'') {
            "'"
        } else {
            ""
        }
    }
}

fn is_prefix_char(ch: char) -> bool {
    matches!(ch, 'r' | 'R' | 'u' | 'U' | 'b' | 'B' | 'f' | 'F')
}

/// Strip a Python string prefix and its quotes, returning the contents.
pub fn strip_string_literal(raw: &str) -> &str {
    let body = raw.trim_start_matches(is_prefix_char);
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = body.strip_prefix(quote) {
            return inner.strip_suffix(quote).unwrap_or(inner);
        }
    }
    body
}

/// How a parameter binds its arguments.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ParameterKind {
    /// Positional-or-keyword parameter.
    Positional,
    /// `*args` collector.
    VarArgs,
    /// Keyword-only parameter following `*` or `*args`.
    KeywordOnly,
    /// `**kwargs` collector.
    VarKeyword,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Parameter name without `*` markers.
    pub name: String,
    /// Type annotation text, if any.
    pub annotation: Option<String>,
    /// Default value text, if any.
    pub default: Option<String>,
    /// Binding kind.
    pub kind: ParameterKind,
}

impl Parameter {
    /// Create a plain positional parameter.
    pub fn positional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            default: None,
            kind: ParameterKind::Positional,
        }
    }

    /// Name as written in a signature (`*args`, `**kwargs`).
    pub fn display_name(&self) -> String {
        match self.kind {
            ParameterKind::VarArgs => format!("*{}", self.name),
            ParameterKind::VarKeyword => format!("**{}", self.name),
            ParameterKind::Positional | ParameterKind::KeywordOnly => self.name.clone(),
        }
    }
}

/// Scope a definition is nested in.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    /// Top level of the module.
    #[default]
    Module,
    /// Directly inside a class body.
    Class,
    /// Inside a function body.
    Function,
}

/// A parsed function or method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInfo {
    /// Function name.
    pub name: String,
    /// 1-based line of the `def` keyword.
    pub line: usize,
    /// Enclosing scope.
    pub scope: Scope,
    /// Whether the enclosing class (if any) is private.
    pub in_private_class: bool,
    /// Declared with `async def`.
    pub is_async: bool,
    /// Decorator expressions without the leading `@`.
    pub decorators: Vec<String>,
    /// Parameters in declaration order.
    pub parameters: Vec<Parameter>,
    /// Return annotation text.
    pub returns: Option<String>,
    /// Whether the body returns a value.
    pub has_return_value: bool,
    /// Exception names raised in the body, first-seen order.
    pub raises: Vec<String>,
    /// Whether the body yields.
    pub yields: bool,
    /// Existing docstring.
    pub docstring: Option<Docstring>,
}

impl FunctionInfo {
    /// Whether this is a method defined directly in a class body.
    pub fn is_method(&self) -> bool {
        self.scope == Scope::Class
    }

    /// Whether the name is a `__dunder__`.
    pub fn is_magic(&self) -> bool {
        self.name.len() > 4 && self.name.starts_with("__") && self.name.ends_with("__")
    }

    /// Whether pydocstyle would consider this definition public.
    pub fn is_public(&self) -> bool {
        match self.scope {
            Scope::Function => false,
            Scope::Class if self.in_private_class => false,
            _ => self.is_magic() || !self.name.starts_with('_'),
        }
    }

    /// Whether the function carries the given decorator (e.g. `staticmethod`).
    pub fn has_decorator(&self, name: &str) -> bool {
        self.decorators.iter().any(|decorator| decorator == name)
    }
}

/// A parsed class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    /// Class name.
    pub name: String,
    /// 1-based line of the `class` keyword.
    pub line: usize,
    /// Enclosing scope.
    pub scope: Scope,
    /// Whether an enclosing class is private.
    pub in_private_class: bool,
    /// Base class expressions.
    pub bases: Vec<String>,
    /// Attribute names assigned in the class body or in `__init__`.
    pub attributes: Vec<String>,
    /// Names of methods defined directly in the body.
    pub methods: Vec<String>,
    /// Existing docstring.
    pub docstring: Option<Docstring>,
}

impl ClassInfo {
    /// Whether pydocstyle would consider this class public.
    pub fn is_public(&self) -> bool {
        self.scope != Scope::Function && !self.in_private_class && !self.name.starts_with('_')
    }
}

/// Parsed view of a Python module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    /// Module docstring.
    pub docstring: Option<Docstring>,
    /// All functions, methods included, ordered by line.
    pub functions: Vec<FunctionInfo>,
    /// All classes, ordered by line.
    pub classes: Vec<ClassInfo>,
}

/// Docstring coverage counts for a module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    /// Number of functions and methods.
    pub total_functions: usize,
    /// Number of classes.
    pub total_classes: usize,
    /// Functions plus classes.
    pub total_symbols: usize,
    /// Symbols carrying a docstring.
    pub documented_symbols: usize,
    /// Documented share, rounded to one decimal.
    pub coverage_percent: f64,
}

impl CoverageReport {
    /// Symbols without a docstring.
    pub fn undocumented_symbols(&self) -> usize {
        self.total_symbols.saturating_sub(self.documented_symbols)
    }
}

/// A single style-validator finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ComplianceIssue {
    /// pydocstyle error code, e.g. `D103`.
    pub code: String,
    /// 1-based line the issue is reported on.
    pub line: usize,
    /// Human-readable description.
    pub message: String,
}

/// Style compliance findings for a module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    /// Number of issues.
    pub issue_count: usize,
    /// Issues ordered by line, then code.
    pub issues: Vec<ComplianceIssue>,
}

/// Coverage and compliance for one module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocReport {
    /// Coverage counts.
    pub coverage: CoverageReport,
    /// Compliance findings.
    pub compliance: ComplianceReport,
}
