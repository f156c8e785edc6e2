//! PEP 257 docstring checks in the manner of pydocstyle.
//!
//! Missing-docstring checks (`D1xx`) only apply to public definitions; the
//! content checks apply to every docstring that is present.

use crate::domain::{ComplianceIssue, Docstring, ModuleInfo};

/// Run every check over a parsed module, ordered by line then code.
pub fn validate_module(module: &ModuleInfo) -> Vec<ComplianceIssue> {
    let mut issues = Vec::new();

    match &module.docstring {
        Some(doc) => check_docstring(doc, 1, false, &mut issues),
        None => issues.push(issue("D100", 1, "Missing docstring in public module")),
    }

    for class in &module.classes {
        match &class.docstring {
            Some(doc) => check_docstring(doc, class.line, false, &mut issues),
            None if class.is_public() => issues.push(issue(
                "D101",
                class.line,
                "Missing docstring in public class",
            )),
            None => {}
        }
    }

    for function in &module.functions {
        match &function.docstring {
            Some(doc) => check_docstring(doc, function.line, true, &mut issues),
            None if function.is_public() => {
                let (code, message) = if function.is_method() && function.name == "__init__" {
                    ("D107", "Missing docstring in __init__")
                } else if function.is_method() && function.is_magic() {
                    ("D105", "Missing docstring in magic method")
                } else if function.is_method() {
                    ("D102", "Missing docstring in public method")
                } else {
                    ("D103", "Missing docstring in public function")
                };
                issues.push(issue(code, function.line, message));
            }
            None => {}
        }
    }

    issues.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.code.cmp(&b.code)));
    issues
}

fn issue(code: &str, line: usize, message: impl Into<String>) -> ComplianceIssue {
    ComplianceIssue {
        code: code.to_string(),
        line,
        message: message.into(),
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn check_docstring(
    doc: &Docstring,
    line: usize,
    is_function: bool,
    issues: &mut Vec<ComplianceIssue>,
) {
    let text = doc.text.as_str();
    let stripped = text.trim();
    if stripped.is_empty() {
        issues.push(issue("D419", line, "Docstring is empty"));
        return;
    }

    let raw_lines: Vec<&str> = text.split('\n').collect();
    let non_empty = raw_lines.iter().filter(|l| !is_blank(l)).count();
    if raw_lines.len() > 1 && non_empty == 1 {
        issues.push(issue(
            "D200",
            line,
            format!(
                "One-line docstring should fit on one line with quotes (found {})",
                raw_lines.len()
            ),
        ));
    }

    let lines: Vec<&str> = stripped.split('\n').collect();
    if lines.len() > 1 {
        let blanks = lines[1..].iter().take_while(|l| is_blank(l)).count();
        if blanks != 1 {
            issues.push(issue(
                "D205",
                line,
                format!("1 blank line required between summary line and description (found {blanks})"),
            ));
        }
    }

    let first = raw_lines[0];
    if first.starts_with(' ') || (raw_lines.len() == 1 && first.ends_with(' ')) {
        issues.push(issue(
            "D210",
            line,
            "No whitespaces allowed surrounding docstring text",
        ));
    }

    let quotes = doc.quotes();
    if quotes != "\"\"\"" && !text.contains("\"\"\"") {
        issues.push(issue(
            "D300",
            line,
            format!("Use \"\"\"triple double quotes\"\"\" (found {quotes}-quotes)"),
        ));
    }

    let summary = lines[0].trim();
    if let Some(last) = summary.chars().last() {
        if last != '.' {
            issues.push(issue(
                "D400",
                line,
                format!("First line should end with a period (not '{last}')"),
            ));
        }
    }

    if is_function {
        if let Some(expected) = capitalization_fix(summary) {
            let first_word = summary.split_whitespace().next().unwrap_or_default();
            issues.push(issue(
                "D403",
                line,
                format!(
                    "First word of the first line should be properly capitalized ('{expected}', not '{first_word}')"
                ),
            ));
        }
    }
}

/// Capitalized form of the first word when it needs fixing.
fn capitalization_fix(summary: &str) -> Option<String> {
    let word = summary.split_whitespace().next()?;
    if word == word.to_uppercase() {
        return None;
    }
    if !word.chars().all(|c| c.is_ascii_alphabetic() || c == '\'') {
        return None;
    }
    let mut chars = word.chars();
    let first = chars.next()?;
    let capitalized = format!("{}{}", first.to_uppercase(), chars.as_str().to_lowercase());
    (capitalized != word).then_some(capitalized)
}
