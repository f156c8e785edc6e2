//! Splicing synthesized docstrings back into original source text.
//!
//! Each `def`/`class` line whose 1-based number is a known definition site is
//! followed by a docstring block: an opening `"""` line, the synthesized text
//! line by line, and a closing `"""` line, all indented by a fixed four
//! spaces. Every other line passes through untouched. The fixed indentation
//! does not track nesting depth, so methods and nested functions receive the
//! same indentation as top-level definitions.
//!
//! Splicing is not idempotent: the site maps refer to original line numbers,
//! so splicing already-annotated text with the same maps inserts again.
//!
//! [`annotate_source`] normalizes `\r\n` line endings to `\n` before
//! splitting, so annotated output always uses `\n`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ClassInfo, DocStyle, FunctionInfo, ModuleInfo};
use crate::error::Result;
use crate::synthesizer::Synthesizer;

/// Indentation applied to every inserted docstring line.
pub const DOC_INDENT: &str = "    ";
/// Delimiter line opening and closing an inserted docstring.
pub const DOC_DELIMITER: &str = "\"\"\"";

/// Definition sites keyed by 1-based line number.
pub type FunctionSites<'a> = BTreeMap<usize, &'a FunctionInfo>;
/// Class definition sites keyed by 1-based line number.
pub type ClassSites<'a> = BTreeMap<usize, &'a ClassInfo>;

/// Which definitions receive a synthesized docstring.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum AnnotateMode {
    /// Every function and class.
    #[default]
    All,
    /// Only definitions without an existing docstring.
    MissingOnly,
}

/// Insert synthesized docstrings after each known definition line.
///
/// A line number present in both maps is treated as a function. Synthesizer
/// failures abort the splice and are returned unchanged.
pub fn splice<S: Synthesizer + ?Sized>(
    source_lines: &[&str],
    function_sites: &FunctionSites<'_>,
    class_sites: &ClassSites<'_>,
    style: DocStyle,
    synthesizer: &S,
) -> Result<Vec<String>> {
    for line in function_sites.keys().filter(|line| class_sites.contains_key(*line)) {
        log::warn!("line {line} is registered as both a function and a class; using the function");
    }

    let mut annotated = Vec::with_capacity(source_lines.len());
    for (index, line) in source_lines.iter().enumerate() {
        annotated.push(line.to_string());
        if !is_definition_line(line) {
            continue;
        }
        let lineno = index + 1;
        let doc = if let Some(function) = function_sites.get(&lineno) {
            synthesizer.function_doc(function, style)?
        } else if let Some(class) = class_sites.get(&lineno) {
            synthesizer.class_doc(class, style)?
        } else {
            continue;
        };
        push_docstring_block(&mut annotated, &doc);
    }
    Ok(annotated)
}

/// Whether a line opens a `def` or `class` block.
pub fn is_definition_line(line: &str) -> bool {
    let stripped = line.trim_start();
    stripped.starts_with("def ") || stripped.starts_with("class ")
}

fn push_docstring_block(out: &mut Vec<String>, doc: &str) {
    out.push(format!("{DOC_INDENT}{DOC_DELIMITER}"));
    for doc_line in doc.split('\n') {
        out.push(format!("{DOC_INDENT}{doc_line}"));
    }
    out.push(format!("{DOC_INDENT}{DOC_DELIMITER}"));
}

/// Build the definition-site maps for a parsed module.
pub fn definition_sites(
    module: &ModuleInfo,
    mode: AnnotateMode,
) -> (FunctionSites<'_>, ClassSites<'_>) {
    let wanted = |has_doc: bool| mode == AnnotateMode::All || !has_doc;
    let functions = module
        .functions
        .iter()
        .filter(|function| wanted(function.docstring.is_some()))
        .map(|function| (function.line, function))
        .collect();
    let classes = module
        .classes
        .iter()
        .filter(|class| wanted(class.docstring.is_some()))
        .map(|class| (class.line, class))
        .collect();
    (functions, classes)
}

/// Splice docstrings for a parsed module into its source text.
pub fn annotate_source<S: Synthesizer + ?Sized>(
    source: &str,
    module: &ModuleInfo,
    style: DocStyle,
    synthesizer: &S,
    mode: AnnotateMode,
) -> Result<String> {
    let normalized = source.replace("\r\n", "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();
    let (functions, classes) = definition_sites(module, mode);
    let annotated = splice(&lines, &functions, &classes, style, synthesizer)?;
    Ok(annotated.join("\n"))
}
