//! Docstring synthesis from parsed descriptors.

use crate::domain::{ClassInfo, DocStyle, FunctionInfo, Parameter, ParameterKind};
use crate::error::Result;

/// Produces docstring body text (without quote delimiters) for definitions.
#[cfg_attr(test, mockall::automock)]
pub trait Synthesizer {
    /// Synthesize a docstring for a function or method.
    fn function_doc(&self, function: &FunctionInfo, style: DocStyle) -> Result<String>;
    /// Synthesize a docstring for a class.
    fn class_doc(&self, class: &ClassInfo, style: DocStyle) -> Result<String>;
}

/// Template-driven synthesizer that derives text from names and signatures.
#[derive(Debug, Default, Clone)]
pub struct TemplateSynthesizer;

impl TemplateSynthesizer {
    /// Create a new template synthesizer.
    pub fn new() -> Self {
        Self
    }
}

impl Synthesizer for TemplateSynthesizer {
    fn function_doc(&self, function: &FunctionInfo, style: DocStyle) -> Result<String> {
        let summary = function_summary(&function.name);
        let params = documented_parameters(function);
        let mut sections = vec![summary];

        let return_type = function
            .returns
            .as_deref()
            .filter(|annotation| *annotation != "None");
        let yields = function.yields;
        let returns = !yields && (return_type.is_some() || function.has_return_value);

        match style {
            DocStyle::Google => {
                if !params.is_empty() {
                    let mut lines = vec!["Args:".to_string()];
                    for param in &params {
                        let label = match &param.annotation {
                            Some(annotation) => format!("{} ({annotation})", param.display_name()),
                            None => param.display_name(),
                        };
                        lines.push(format!("    {label}: {}", describe_parameter(param)));
                    }
                    sections.push(lines.join("\n"));
                }
                if returns {
                    sections.push(google_value_section("Returns", return_type, "return value"));
                }
                if yields {
                    sections.push(google_value_section(
                        "Yields",
                        yield_type(return_type),
                        "yielded value",
                    ));
                }
                if !function.raises.is_empty() {
                    let mut lines = vec!["Raises:".to_string()];
                    for exc in &function.raises {
                        lines.push(format!("    {exc}: {}", describe_raise(exc)));
                    }
                    sections.push(lines.join("\n"));
                }
            }
            DocStyle::NumPy => {
                if !params.is_empty() {
                    let mut lines = numpy_header("Parameters");
                    for param in &params {
                        match &param.annotation {
                            Some(annotation) => {
                                lines.push(format!("{} : {annotation}", param.display_name()))
                            }
                            None => lines.push(param.display_name()),
                        }
                        lines.push(format!("    {}", describe_parameter(param)));
                    }
                    sections.push(lines.join("\n"));
                }
                if returns {
                    sections.push(numpy_value_section("Returns", return_type, "return value"));
                }
                if yields {
                    sections.push(numpy_value_section(
                        "Yields",
                        yield_type(return_type),
                        "yielded value",
                    ));
                }
                if !function.raises.is_empty() {
                    let mut lines = numpy_header("Raises");
                    for exc in &function.raises {
                        lines.push(exc.clone());
                        lines.push(format!("    {}", describe_raise(exc)));
                    }
                    sections.push(lines.join("\n"));
                }
            }
            DocStyle::Rest => {
                let mut fields = Vec::new();
                for param in &params {
                    fields.push(format!(
                        ":param {}: {}",
                        param.name,
                        describe_parameter(param)
                    ));
                    if let Some(annotation) = &param.annotation {
                        fields.push(format!(":type {}: {annotation}", param.name));
                    }
                }
                if returns {
                    fields.push(":returns: Description of return value.".to_string());
                    if let Some(annotation) = return_type {
                        fields.push(format!(":rtype: {annotation}"));
                    }
                }
                if yields {
                    fields.push(":yields: Description of yielded value.".to_string());
                }
                for exc in &function.raises {
                    fields.push(format!(":raises {exc}: {}", describe_raise(exc)));
                }
                if !fields.is_empty() {
                    sections.push(fields.join("\n"));
                }
            }
        }

        Ok(sections.join("\n\n"))
    }

    fn class_doc(&self, class: &ClassInfo, style: DocStyle) -> Result<String> {
        let mut sections = vec![class_summary(&class.name)];
        if !class.attributes.is_empty() {
            match style {
                DocStyle::Google => {
                    let mut lines = vec!["Attributes:".to_string()];
                    for attribute in &class.attributes {
                        lines.push(format!("    {attribute}: Description of {attribute}."));
                    }
                    sections.push(lines.join("\n"));
                }
                DocStyle::NumPy => {
                    let mut lines = numpy_header("Attributes");
                    for attribute in &class.attributes {
                        lines.push(attribute.clone());
                        lines.push(format!("    Description of {attribute}."));
                    }
                    sections.push(lines.join("\n"));
                }
                DocStyle::Rest => {
                    let fields: Vec<String> = class
                        .attributes
                        .iter()
                        .map(|attribute| format!(":ivar {attribute}: Description of {attribute}."))
                        .collect();
                    sections.push(fields.join("\n"));
                }
            }
        }
        Ok(sections.join("\n\n"))
    }
}

/// Parameters worth documenting: implicit receivers are dropped for methods.
fn documented_parameters(function: &FunctionInfo) -> Vec<&Parameter> {
    let skip_receiver = function.is_method() && !function.has_decorator("staticmethod");
    function
        .parameters
        .iter()
        .enumerate()
        .filter(|(index, param)| {
            !(skip_receiver
                && *index == 0
                && param.kind == ParameterKind::Positional
                && (param.name == "self" || param.name == "cls"))
        })
        .map(|(_, param)| param)
        .collect()
}

fn describe_parameter(param: &Parameter) -> String {
    let base = match param.kind {
        ParameterKind::VarArgs => "Additional positional arguments.".to_string(),
        ParameterKind::VarKeyword => "Additional keyword arguments.".to_string(),
        ParameterKind::Positional | ParameterKind::KeywordOnly => {
            format!("Description of {}.", param.name)
        }
    };
    match &param.default {
        Some(default) => format!("{base} Defaults to {default}."),
        None => base,
    }
}

fn describe_raise(exc: &str) -> String {
    format!("If {} is raised.", exc.rsplit('.').next().unwrap_or(exc))
}

/// Element type of `Iterator[T]`/`Generator[T, ...]` style annotations.
fn yield_type(annotation: Option<&str>) -> Option<&str> {
    let annotation = annotation?;
    let (_, inner) = annotation.split_once('[')?;
    let inner = inner.strip_suffix(']').unwrap_or(inner);
    inner.split(',').next().map(str::trim).filter(|ty| !ty.is_empty())
}

fn google_value_section(title: &str, annotation: Option<&str>, what: &str) -> String {
    match annotation {
        Some(annotation) => format!("{title}:\n    {annotation}: Description of {what}."),
        None => format!("{title}:\n    Description of {what}."),
    }
}

fn numpy_header(title: &str) -> Vec<String> {
    vec![title.to_string(), "-".repeat(title.len())]
}

fn numpy_value_section(title: &str, annotation: Option<&str>, what: &str) -> String {
    let mut lines = numpy_header(title);
    lines.push(annotation.unwrap_or("object").to_string());
    lines.push(format!("    Description of {what}."));
    lines.join("\n")
}

/// `documented_add` → `Documented add.`
fn function_summary(name: &str) -> String {
    if name == "__init__" {
        return "Initialize the instance.".to_string();
    }
    let words: Vec<&str> = name
        .trim_matches('_')
        .split('_')
        .filter(|word| !word.is_empty())
        .collect();
    sentence(&words.join(" "))
}

/// `DataProcessor` → `Data processor.`
fn class_summary(name: &str) -> String {
    let trimmed = name.trim_matches('_');
    let mut words: Vec<String> = Vec::new();
    let chars: Vec<char> = trimmed.chars().collect();
    let mut current = String::new();
    for (index, ch) in chars.iter().enumerate() {
        let next_lower = chars.get(index + 1).is_some_and(|next| next.is_lowercase());
        let prev_lower = index > 0 && chars[index - 1].is_lowercase();
        if ch.is_uppercase() && !current.is_empty() && (prev_lower || next_lower) {
            words.push(std::mem::take(&mut current));
        }
        if *ch == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(*ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    let words: Vec<String> = words
        .into_iter()
        .enumerate()
        .map(|(index, word)| {
            let is_acronym = word.chars().count() > 1 && word.chars().all(|c| !c.is_lowercase());
            if index == 0 || is_acronym {
                word
            } else {
                word.to_lowercase()
            }
        })
        .collect();
    sentence(&words.join(" "))
}

fn sentence(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => "Undocumented symbol.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Scope;

    fn add() -> FunctionInfo {
        FunctionInfo {
            name: "add".to_string(),
            line: 1,
            parameters: vec![Parameter::positional("a"), Parameter::positional("b")],
            has_return_value: true,
            ..FunctionInfo::default()
        }
    }

    #[test]
    fn google_function_doc_lists_args_and_returns() {
        let doc = TemplateSynthesizer::new()
            .function_doc(&add(), DocStyle::Google)
            .expect("doc");
        assert_eq!(
            doc,
            "Add.\n\nArgs:\n    a: Description of a.\n    b: Description of b.\n\nReturns:\n    Description of return value."
        );
    }

    #[test]
    fn numpy_function_doc_underlines_sections() {
        let mut function = add();
        function.parameters[0].annotation = Some("int".to_string());
        function.returns = Some("int".to_string());
        function.raises = vec!["ValueError".to_string()];
        let doc = TemplateSynthesizer::new()
            .function_doc(&function, DocStyle::NumPy)
            .expect("doc");
        assert_eq!(
            doc,
            [
                "Add.",
                "",
                "Parameters",
                "----------",
                "a : int",
                "    Description of a.",
                "b",
                "    Description of b.",
                "",
                "Returns",
                "-------",
                "int",
                "    Description of return value.",
                "",
                "Raises",
                "------",
                "ValueError",
                "    If ValueError is raised.",
            ]
            .join("\n")
        );
    }

    #[test]
    fn rest_function_doc_uses_field_lists() {
        let mut function = add();
        function.parameters[1].annotation = Some("float".to_string());
        function.parameters[1].default = Some("0.0".to_string());
        function.returns = Some("float".to_string());
        let doc = TemplateSynthesizer::new()
            .function_doc(&function, DocStyle::Rest)
            .expect("doc");
        assert_eq!(
            doc,
            [
                "Add.",
                "",
                ":param a: Description of a.",
                ":param b: Description of b. Defaults to 0.0.",
                ":type b: float",
                ":returns: Description of return value.",
                ":rtype: float",
            ]
            .join("\n")
        );
    }

    #[test]
    fn methods_drop_receiver_and_generators_yield() {
        let method = FunctionInfo {
            name: "iter_rows".to_string(),
            scope: Scope::Class,
            parameters: vec![Parameter::positional("self"), Parameter::positional("limit")],
            returns: Some("Iterator[int]".to_string()),
            yields: true,
            ..FunctionInfo::default()
        };
        let doc = TemplateSynthesizer::new()
            .function_doc(&method, DocStyle::Google)
            .expect("doc");
        assert_eq!(
            doc,
            "Iter rows.\n\nArgs:\n    limit: Description of limit.\n\nYields:\n    int: Description of yielded value."
        );
    }

    #[test]
    fn static_methods_keep_first_parameter() {
        let method = FunctionInfo {
            name: "build".to_string(),
            scope: Scope::Class,
            decorators: vec!["staticmethod".to_string()],
            parameters: vec![Parameter::positional("self")],
            ..FunctionInfo::default()
        };
        let doc = TemplateSynthesizer::new()
            .function_doc(&method, DocStyle::Rest)
            .expect("doc");
        assert!(doc.contains(":param self:"));
    }

    #[test]
    fn bare_function_is_summary_only() {
        let function = FunctionInfo {
            name: "_reset_state_".to_string(),
            ..FunctionInfo::default()
        };
        let doc = TemplateSynthesizer::new()
            .function_doc(&function, DocStyle::NumPy)
            .expect("doc");
        assert_eq!(doc, "Reset state.");
    }

    #[test]
    fn class_doc_describes_attributes_per_style() {
        let class = ClassInfo {
            name: "DataProcessor".to_string(),
            attributes: vec!["rows".to_string()],
            ..ClassInfo::default()
        };
        let synthesizer = TemplateSynthesizer::new();
        assert_eq!(
            synthesizer.class_doc(&class, DocStyle::Google).expect("doc"),
            "Data processor.\n\nAttributes:\n    rows: Description of rows."
        );
        assert_eq!(
            synthesizer.class_doc(&class, DocStyle::NumPy).expect("doc"),
            "Data processor.\n\nAttributes\n----------\nrows\n    Description of rows."
        );
        assert_eq!(
            synthesizer.class_doc(&class, DocStyle::Rest).expect("doc"),
            "Data processor.\n\n:ivar rows: Description of rows."
        );
    }

    #[test]
    fn class_summary_keeps_acronyms() {
        assert_eq!(class_summary("HTTPServer"), "HTTP server.");
        assert_eq!(class_summary("JSONParser"), "JSON parser.");
        assert_eq!(class_summary("Account"), "Account.");
        assert_eq!(class_summary("_private_base"), "Private base.");
    }

    #[test]
    fn init_gets_fixed_summary() {
        assert_eq!(function_summary("__init__"), "Initialize the instance.");
        assert_eq!(function_summary("documented_add"), "Documented add.");
    }
}
