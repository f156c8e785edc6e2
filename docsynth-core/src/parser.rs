//! Python source parsing backed by `tree-sitter`.
//!
//! The parser produces a [`ModuleInfo`]: every function (methods and nested
//! functions included) and every class with its 1-based definition line, its
//! existing docstring, and the signature details the synthesizer needs.

use tree_sitter::{Node, Parser};

use crate::domain::{
    ClassInfo, Docstring, FunctionInfo, ModuleInfo, Parameter, ParameterKind, Scope,
};
use crate::error::{DocsynthError, Result};

/// Parse Python source text into a module model.
pub fn parse_module(source: &str) -> Result<ModuleInfo> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|err| DocsynthError::Parse(format!("failed to load python grammar: {err}")))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| DocsynthError::Parse("parser produced no syntax tree".to_string()))?;
    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(root).unwrap_or(1);
        return Err(DocsynthError::Parse(format!("syntax error near line {line}")));
    }

    let mut collector = Collector {
        source: source.as_bytes(),
        module: ModuleInfo::default(),
    };
    collector.module.docstring = collector.block_docstring(root);
    collector.visit_children(root, Context::module());
    log::debug!(
        "parsed module: {} functions, {} classes",
        collector.module.functions.len(),
        collector.module.classes.len()
    );
    Ok(collector.module)
}

fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(line) = first_error_line(child) {
                return Some(line);
            }
        }
    }
    None
}

#[derive(Debug, Clone, Copy)]
struct Context {
    scope: Scope,
    in_private_class: bool,
    class_index: Option<usize>,
}

impl Context {
    fn module() -> Self {
        Self {
            scope: Scope::Module,
            in_private_class: false,
            class_index: None,
        }
    }
}

struct Collector<'src> {
    source: &'src [u8],
    module: ModuleInfo,
}

#[derive(Default)]
struct BodyFacts {
    has_return_value: bool,
    yields: bool,
    raises: Vec<String>,
    self_attributes: Vec<String>,
}

impl<'src> Collector<'src> {
    fn text(&self, node: Node) -> &'src str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn field_text(&self, node: Node, field: &str) -> Option<String> {
        node.child_by_field_name(field)
            .map(|child| self.text(child).to_string())
    }

    fn visit_children(&mut self, node: Node, ctx: Context) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(child, ctx);
        }
    }

    fn visit(&mut self, node: Node, ctx: Context) {
        match node.kind() {
            "function_definition" => self.visit_function(node, Vec::new(), ctx),
            "class_definition" => self.visit_class(node, ctx),
            "decorated_definition" => {
                let decorators = self.decorators(node);
                match node.child_by_field_name("definition") {
                    Some(def) if def.kind() == "function_definition" => {
                        self.visit_function(def, decorators, ctx)
                    }
                    Some(def) if def.kind() == "class_definition" => self.visit_class(def, ctx),
                    _ => self.visit_children(node, ctx),
                }
            }
            "lambda" | "comment" | "string" => {}
            _ => self.visit_children(node, ctx),
        }
    }

    fn decorators(&self, node: Node) -> Vec<String> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|child| child.kind() == "decorator")
            .map(|child| self.text(child).trim_start_matches('@').trim().to_string())
            .collect()
    }

    fn visit_function(&mut self, node: Node, decorators: Vec<String>, ctx: Context) {
        let name = self.field_text(node, "name").unwrap_or_default();
        let body = node.child_by_field_name("body");
        let parameters = node
            .child_by_field_name("parameters")
            .map(|params| self.parameters(params))
            .unwrap_or_default();
        let facts = body.map(|body| self.body_facts(body)).unwrap_or_default();

        let function = FunctionInfo {
            name: name.clone(),
            line: node.start_position().row + 1,
            scope: ctx.scope,
            in_private_class: ctx.in_private_class,
            is_async: self.text(node).starts_with("async"),
            decorators,
            parameters,
            returns: self.field_text(node, "return_type"),
            has_return_value: facts.has_return_value,
            raises: facts.raises,
            yields: facts.yields,
            docstring: body.and_then(|body| self.block_docstring(body)),
        };
        self.module.functions.push(function);

        if let (Scope::Class, Some(index)) = (ctx.scope, ctx.class_index) {
            let class = &mut self.module.classes[index];
            class.methods.push(name.clone());
            if name == "__init__" {
                for attribute in facts.self_attributes {
                    push_unique(&mut class.attributes, attribute);
                }
            }
        }

        if let Some(body) = body {
            let inner = Context {
                scope: Scope::Function,
                in_private_class: ctx.in_private_class,
                class_index: None,
            };
            self.visit_children(body, inner);
        }
    }

    fn visit_class(&mut self, node: Node, ctx: Context) {
        let name = self.field_text(node, "name").unwrap_or_default();
        let body = node.child_by_field_name("body");
        let bases = node
            .child_by_field_name("superclasses")
            .map(|args| {
                let mut cursor = args.walk();
                args.named_children(&mut cursor)
                    .filter(|arg| arg.kind() != "keyword_argument" && arg.kind() != "comment")
                    .map(|arg| self.text(arg).to_string())
                    .collect()
            })
            .unwrap_or_default();
        let attributes = body
            .map(|body| self.class_attributes(body))
            .unwrap_or_default();

        let private = ctx.in_private_class || name.starts_with('_');
        self.module.classes.push(ClassInfo {
            name,
            line: node.start_position().row + 1,
            scope: ctx.scope,
            in_private_class: ctx.in_private_class,
            bases,
            attributes,
            methods: Vec::new(),
            docstring: body.and_then(|body| self.block_docstring(body)),
        });

        if let Some(body) = body {
            let inner = Context {
                scope: Scope::Class,
                in_private_class: private,
                class_index: Some(self.module.classes.len() - 1),
            };
            self.visit_children(body, inner);
        }
    }

    /// First statement of a block, when it is a lone string literal.
    fn block_docstring(&self, block: Node) -> Option<Docstring> {
        let mut cursor = block.walk();
        let first = block
            .named_children(&mut cursor)
            .find(|child| child.kind() != "comment")?;
        if first.kind() != "expression_statement" || first.named_child_count() != 1 {
            return None;
        }
        let literal = first.named_child(0)?;
        if literal.kind() != "string" {
            return None;
        }
        Some(Docstring::from_literal(
            self.text(literal),
            literal.start_position().row + 1,
            literal.end_position().row + 1,
        ))
    }

    fn parameters(&self, node: Node) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        let mut keyword_only = false;
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let positional_kind = if keyword_only {
                ParameterKind::KeywordOnly
            } else {
                ParameterKind::Positional
            };
            match child.kind() {
                "identifier" => parameters.push(Parameter {
                    name: self.text(child).to_string(),
                    annotation: None,
                    default: None,
                    kind: positional_kind,
                }),
                "default_parameter" | "typed_default_parameter" => parameters.push(Parameter {
                    name: self.field_text(child, "name").unwrap_or_default(),
                    annotation: self.field_text(child, "type"),
                    default: self.field_text(child, "value"),
                    kind: positional_kind,
                }),
                "typed_parameter" => {
                    let Some(target) = child.named_child(0) else {
                        continue;
                    };
                    let kind = match target.kind() {
                        "list_splat_pattern" => {
                            keyword_only = true;
                            ParameterKind::VarArgs
                        }
                        "dictionary_splat_pattern" => ParameterKind::VarKeyword,
                        _ => positional_kind,
                    };
                    parameters.push(Parameter {
                        name: self.text(target).trim_start_matches('*').to_string(),
                        annotation: self.field_text(child, "type"),
                        default: None,
                        kind,
                    });
                }
                "list_splat_pattern" => {
                    keyword_only = true;
                    parameters.push(Parameter {
                        name: self.text(child).trim_start_matches('*').to_string(),
                        annotation: None,
                        default: None,
                        kind: ParameterKind::VarArgs,
                    });
                }
                "dictionary_splat_pattern" => parameters.push(Parameter {
                    name: self.text(child).trim_start_matches('*').to_string(),
                    annotation: None,
                    default: None,
                    kind: ParameterKind::VarKeyword,
                }),
                "keyword_separator" => keyword_only = true,
                _ => {}
            }
        }
        parameters
    }

    /// Facts about a function's own body; nested definitions are skipped.
    fn body_facts(&self, body: Node) -> BodyFacts {
        let mut facts = BodyFacts::default();
        let mut pending = vec![body];
        while let Some(node) = pending.pop() {
            match node.kind() {
                "function_definition" | "class_definition" | "lambda" => continue,
                "return_statement" => {
                    let value = node.named_child(0).map(|value| self.text(value));
                    if value.is_some_and(|value| value != "None") {
                        facts.has_return_value = true;
                    }
                }
                "yield" => facts.yields = true,
                "raise_statement" => {
                    if let Some(name) = node.named_child(0).map(|exc| self.exception_name(exc)) {
                        push_unique(&mut facts.raises, name);
                    }
                }
                "assignment" => {
                    if let Some(attribute) = self.self_attribute(node) {
                        push_unique(&mut facts.self_attributes, attribute);
                    }
                }
                _ => {}
            }
            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            // Reverse so the stack pops in document order.
            pending.extend(children.into_iter().rev());
        }
        facts
    }

    fn exception_name(&self, node: Node) -> String {
        let target = if node.kind() == "call" {
            node.child_by_field_name("function").unwrap_or(node)
        } else {
            node
        };
        self.text(target).trim().to_string()
    }

    fn self_attribute(&self, assignment: Node) -> Option<String> {
        let left = assignment.child_by_field_name("left")?;
        if left.kind() != "attribute" {
            return None;
        }
        let object = left.child_by_field_name("object")?;
        if self.text(object) != "self" {
            return None;
        }
        self.field_text(left, "attribute")
    }

    fn class_attributes(&self, body: Node) -> Vec<String> {
        let mut attributes = Vec::new();
        let mut cursor = body.walk();
        for statement in body.named_children(&mut cursor) {
            if statement.kind() != "expression_statement" {
                continue;
            }
            let Some(assignment) = statement.named_child(0) else {
                continue;
            };
            if assignment.kind() != "assignment" {
                continue;
            }
            if let Some(left) = assignment.child_by_field_name("left") {
                if left.kind() == "identifier" {
                    push_unique(&mut attributes, self.text(left).to_string());
                }
            }
        }
        attributes
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::parse_module;
    use crate::domain::{ParameterKind, Scope};
    use crate::error::DocsynthError;

    const MIXED: &str = r#""""Module for testing mixed documentation coverage and compliance."""

def documented_add(a, b):
    """
    Add two numbers together.
    """
    return a + b

def undocumented_multiply(a, b):
    # This function has no docstring.
    return a * b

class DataProcessor:
    """A class that processes data strings."""

    def process(self, data):
        # This method is missing a docstring.
        return data.strip()

def documented_generator(n):
    """Generate a sequence of numbers."""
    for i in range(n):
        yield i
"#;

    #[test]
    fn parses_functions_classes_and_docstrings() {
        let module = parse_module(MIXED).expect("parse");

        let module_doc = module.docstring.expect("module docstring");
        assert_eq!(
            module_doc.text,
            "Module for testing mixed documentation coverage and compliance."
        );
        assert_eq!(module_doc.line, 1);

        let names: Vec<(&str, usize)> = module
            .functions
            .iter()
            .map(|f| (f.name.as_str(), f.line))
            .collect();
        assert_eq!(
            names,
            vec![
                ("documented_add", 3),
                ("undocumented_multiply", 9),
                ("process", 16),
                ("documented_generator", 20),
            ]
        );
        assert!(module.functions[0].docstring.is_some());
        assert!(module.functions[1].docstring.is_none());
        assert!(module.functions[2].docstring.is_none());
        assert_eq!(module.functions[2].scope, Scope::Class);
        assert!(module.functions[3].yields);
        assert!(module.functions[0].has_return_value);

        assert_eq!(module.classes.len(), 1);
        let class = &module.classes[0];
        assert_eq!(class.name, "DataProcessor");
        assert_eq!(class.line, 13);
        assert_eq!(class.methods, vec!["process".to_string()]);
        assert_eq!(
            class.docstring.as_ref().map(|doc| doc.text.as_str()),
            Some("A class that processes data strings.")
        );
    }

    #[test]
    fn parses_parameter_shapes() {
        let source = "def f(a, b: int, c=1, d: str = 'x', /, *args, e, f: bool = False, **kwargs) -> dict:\n    pass\n";
        let module = parse_module(source).expect("parse");
        let function = &module.functions[0];
        let params: Vec<(&str, ParameterKind)> = function
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.kind))
            .collect();
        assert_eq!(
            params,
            vec![
                ("a", ParameterKind::Positional),
                ("b", ParameterKind::Positional),
                ("c", ParameterKind::Positional),
                ("d", ParameterKind::Positional),
                ("args", ParameterKind::VarArgs),
                ("e", ParameterKind::KeywordOnly),
                ("f", ParameterKind::KeywordOnly),
                ("kwargs", ParameterKind::VarKeyword),
            ]
        );
        assert_eq!(function.parameters[1].annotation.as_deref(), Some("int"));
        assert_eq!(function.parameters[2].default.as_deref(), Some("1"));
        assert_eq!(function.parameters[3].annotation.as_deref(), Some("str"));
        assert_eq!(function.parameters[3].default.as_deref(), Some("'x'"));
        assert_eq!(function.returns.as_deref(), Some("dict"));
    }

    #[test]
    fn bare_star_marks_keyword_only() {
        let module = parse_module("def g(a, *, key=None):\n    return a\n").expect("parse");
        let kinds: Vec<ParameterKind> = module.functions[0]
            .parameters
            .iter()
            .map(|p| p.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![ParameterKind::Positional, ParameterKind::KeywordOnly]
        );
    }

    #[test]
    fn collects_raises_decorators_and_async() {
        let source = r#"
@staticmethod
def divide(a, b):
    if b == 0:
        raise ValueError("Division by zero")
    if a is None:
        raise TypeError
    return a / b

async def fetch():
    return None
"#;
        let module = parse_module(source).expect("parse");
        let divide = &module.functions[0];
        assert_eq!(divide.line, 3);
        assert_eq!(divide.decorators, vec!["staticmethod".to_string()]);
        assert_eq!(
            divide.raises,
            vec!["ValueError".to_string(), "TypeError".to_string()]
        );
        assert!(divide.has_decorator("staticmethod"));

        let fetch = &module.functions[1];
        assert!(fetch.is_async);
        assert!(!fetch.has_return_value);
    }

    #[test]
    fn nested_definitions_do_not_leak_facts() {
        let source = r#"
def outer():
    def inner():
        yield 1
        raise KeyError("x")
    return inner
"#;
        let module = parse_module(source).expect("parse");
        let outer = &module.functions[0];
        assert!(!outer.yields);
        assert!(outer.raises.is_empty());
        assert!(outer.has_return_value);

        let inner = &module.functions[1];
        assert_eq!(inner.scope, Scope::Function);
        assert!(inner.yields);
        assert_eq!(inner.raises, vec!["KeyError".to_string()]);
    }

    #[test]
    fn collects_class_attributes_and_bases() {
        let source = r#"
class Account(Base, metaclass=Meta):
    currency = "EUR"
    limit: int = 10

    def __init__(self, owner):
        self.owner = owner
        self.balance = 0
        self.owner = owner.strip()

class _Hidden:
    def method(self):
        pass
"#;
        let module = parse_module(source).expect("parse");
        let account = &module.classes[0];
        assert_eq!(account.bases, vec!["Base".to_string()]);
        assert_eq!(
            account.attributes,
            vec![
                "currency".to_string(),
                "limit".to_string(),
                "owner".to_string(),
                "balance".to_string(),
            ]
        );
        assert_eq!(account.methods, vec!["__init__".to_string()]);

        let hidden_method = module
            .functions
            .iter()
            .find(|f| f.name == "method")
            .expect("method");
        assert!(hidden_method.in_private_class);
        assert!(!hidden_method.is_public());
    }

    #[test]
    fn comment_before_string_still_finds_docstring() {
        let module = parse_module("def f():\n    # note\n    'Doc.'\n").expect("parse");
        let doc = module.functions[0].docstring.as_ref().expect("docstring");
        assert_eq!(doc.text, "Doc.");
        assert_eq!(doc.line, 3);
    }

    #[test]
    fn syntax_errors_are_rejected() {
        let error = parse_module("def broken(:\n    pass\n").expect_err("syntax error");
        assert!(matches!(error, DocsynthError::Parse(_)));
        assert!(format!("{error}").contains("line 1"));
    }

    #[test]
    fn empty_source_is_an_empty_module() {
        let module = parse_module("").expect("parse");
        assert!(module.docstring.is_none());
        assert!(module.functions.is_empty());
        assert!(module.classes.is_empty());
    }
}
