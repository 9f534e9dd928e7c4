//! Source generation from the tree.
//!
//! The editor treats compilation as an opaque service behind [`Compiler`]. [`JsPrinter`]
//! is the default implementation: it walks the whole tree from the root on every call
//! and prints JavaScript, inserting parentheses wherever operator precedence needs them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::{format_number, node_kind, Fields, Value};
use crate::parser::{binary_precedence, is_logical_operator};

/// Options handed to the compiler on every recompile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Spaces per indentation level
    pub indent_width: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { indent_width: 2 }
    }
}

/// Result of compiling a tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOutput {
    pub code: String,
}

/// Reasons a tree cannot be turned back into source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Unsupported node type '{kind}'")]
    UnsupportedNode { kind: String },

    #[error("{kind} is missing required field '{field}'")]
    MissingField { kind: String, field: String },

    #[error("{kind}.{field} must be {expected}, got {found}")]
    InvalidField {
        kind: String,
        field: String,
        expected: String,
        found: String,
    },

    #[error("{kind} does not support operator '{operator}'")]
    UnknownOperator { kind: String, operator: String },
}

/// Trait for services that regenerate program text from a tree root
pub trait Compiler {
    fn compile(&self, root: &Fields, options: &CompileOptions)
        -> Result<CompileOutput, CompileError>;
}

/// Prints the JavaScript subset produced by [`crate::parser::JsParser`]
#[derive(Debug, Default, Clone, Copy)]
pub struct JsPrinter;

impl JsPrinter {
    pub fn new() -> Self {
        Self
    }
}

impl Compiler for JsPrinter {
    fn compile(
        &self,
        root: &Fields,
        options: &CompileOptions,
    ) -> Result<CompileOutput, CompileError> {
        let printer = Printer { options };
        let code = match node_kind(root) {
            "File" => printer.program(child(root, "program")?)?,
            "Program" => printer.program(root)?,
            _ => printer.statement(root, 0)?,
        };
        Ok(CompileOutput { code })
    }
}

const UNARY_OPERATORS: &[&str] = &["-", "+", "!", "~", "typeof", "void", "delete"];
const UPDATE_OPERATORS: &[&str] = &["++", "--"];
const ASSIGNMENT_OPERATORS: &[&str] = &["=", "+=", "-=", "*=", "/=", "%="];
const DECLARATION_KINDS: &[&str] = &["var", "let", "const"];

// Expression levels used for parenthesisation; higher binds tighter.
const LEVEL_SEQUENCE: u8 = 0;
const LEVEL_ASSIGNMENT: u8 = 1;
const LEVEL_CONDITIONAL: u8 = 2;
const LEVEL_UNARY: u8 = 14;
const LEVEL_POSTFIX: u8 = 15;
const LEVEL_MEMBER: u8 = 16;
const LEVEL_PRIMARY: u8 = 17;

/// Level of a binary or logical operator; `,` shares the sequence level.
fn operator_level(operator: &str) -> Option<u8> {
    binary_precedence(operator).map(|p| if p == 0 { LEVEL_SEQUENCE } else { p + 2 })
}

fn missing(node: &Fields, field: &str) -> CompileError {
    CompileError::MissingField {
        kind: node_kind(node).to_string(),
        field: field.to_string(),
    }
}

fn invalid(node: &Fields, field: &str, expected: &str, found: &Value) -> CompileError {
    CompileError::InvalidField {
        kind: node_kind(node).to_string(),
        field: field.to_string(),
        expected: expected.to_string(),
        found: found.shape().to_string(),
    }
}

fn child<'a>(node: &'a Fields, field: &str) -> Result<&'a Fields, CompileError> {
    match node.get(field) {
        None | Some(Value::Null) => Err(missing(node, field)),
        Some(value) => value
            .as_node()
            .ok_or_else(|| invalid(node, field, "a node", value)),
    }
}

fn optional_child<'a>(node: &'a Fields, field: &str) -> Result<Option<&'a Fields>, CompileError> {
    match node.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => child(node, field).map(Some),
    }
}

fn children<'a>(node: &'a Fields, field: &str) -> Result<Vec<&'a Fields>, CompileError> {
    let value = node.get(field).ok_or_else(|| missing(node, field))?;
    let items = value
        .as_list()
        .ok_or_else(|| invalid(node, field, "a list of nodes", value))?;
    items
        .iter()
        .map(|item| {
            item.as_node()
                .ok_or_else(|| invalid(node, field, "a list of nodes", item))
        })
        .collect()
}

fn string_field<'a>(node: &'a Fields, field: &str) -> Result<&'a str, CompileError> {
    let value = node.get(field).ok_or_else(|| missing(node, field))?;
    value
        .as_str()
        .ok_or_else(|| invalid(node, field, "a string", value))
}

fn flag_field(node: &Fields, field: &str) -> Result<bool, CompileError> {
    match node.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| invalid(node, field, "a boolean", value)),
    }
}

fn operator_field<'a>(
    node: &'a Fields,
    allowed: impl Fn(&str) -> bool,
) -> Result<&'a str, CompileError> {
    let operator = string_field(node, "operator")?;
    if allowed(operator) {
        Ok(operator)
    } else {
        Err(CompileError::UnknownOperator {
            kind: node_kind(node).to_string(),
            operator: operator.to_string(),
        })
    }
}

/// Source line recorded in a node's `loc`, if the parser left one.
fn line_of(node: &Fields, edge: &str) -> Option<f64> {
    match node.get("loc")? {
        Value::Object(loc) => match loc.get(edge)? {
            Value::Object(point) => point.get("line")?.as_f64(),
            _ => None,
        },
        _ => None,
    }
}

/// The literal's source spelling, while it still describes the current value.
fn raw_spelling<'a>(node: &'a Fields, value: &Value) -> Option<&'a str> {
    match node.get("extra")? {
        Value::Object(extra) if extra.get("rawValue") == Some(value) => {
            extra.get("raw")?.as_str()
        }
        _ => None,
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

struct Printer<'o> {
    options: &'o CompileOptions,
}

impl Printer<'_> {
    fn indent(&self, depth: usize) -> String {
        " ".repeat(self.options.indent_width * depth)
    }

    fn program(&self, program: &Fields) -> Result<String, CompileError> {
        self.statement_list(&children(program, "body")?, 0)
    }

    /// Statements at `depth`, keeping single blank lines that separated them in the source.
    fn statement_list(&self, statements: &[&Fields], depth: usize) -> Result<String, CompileError> {
        let mut out = String::new();
        let mut previous: Option<&Fields> = None;
        for statement in statements {
            if let Some(previous) = previous {
                out.push('\n');
                let gap = line_of(statement, "start")
                    .zip(line_of(previous, "end"))
                    .is_some_and(|(start, end)| start > end + 1.0);
                if gap {
                    out.push('\n');
                }
            }
            out.push_str(&self.indent(depth));
            out.push_str(&self.statement(statement, depth)?);
            previous = Some(statement);
        }
        Ok(out)
    }

    fn statement(&self, node: &Fields, depth: usize) -> Result<String, CompileError> {
        match node_kind(node) {
            "VariableDeclaration" => Ok(format!("{};", self.variable_declaration(node)?)),
            "FunctionDeclaration" => self.function_declaration(node, depth),
            "BlockStatement" => self.block(node, depth),
            "ReturnStatement" => match optional_child(node, "argument")? {
                Some(argument) => Ok(format!("return {};", self.expression(argument, LEVEL_SEQUENCE)?)),
                None => Ok("return;".to_string()),
            },
            "ExpressionStatement" => {
                let expression = self.expression(child(node, "expression")?, LEVEL_SEQUENCE)?;
                if expression.starts_with('{') || expression.starts_with("function") {
                    Ok(format!("({expression});"))
                } else {
                    Ok(format!("{expression};"))
                }
            }
            "IfStatement" => {
                let test = self.expression(child(node, "test")?, LEVEL_SEQUENCE)?;
                let consequent = self.statement(child(node, "consequent")?, depth)?;
                let mut out = format!("if ({test}) {consequent}");
                if let Some(alternate) = optional_child(node, "alternate")? {
                    out.push_str(" else ");
                    out.push_str(&self.statement(alternate, depth)?);
                }
                Ok(out)
            }
            "EmptyStatement" => Ok(";".to_string()),
            kind => Err(CompileError::UnsupportedNode {
                kind: kind.to_string(),
            }),
        }
    }

    fn variable_declaration(&self, node: &Fields) -> Result<String, CompileError> {
        let kind = string_field(node, "kind")?;
        if !DECLARATION_KINDS.contains(&kind) {
            return Err(CompileError::InvalidField {
                kind: node_kind(node).to_string(),
                field: "kind".to_string(),
                expected: "one of var, let, const".to_string(),
                found: format!("'{kind}'"),
            });
        }
        let declarations = children(node, "declarations")?;
        if declarations.is_empty() {
            return Err(missing(node, "declarations"));
        }
        let declarations = declarations
            .iter()
            .map(|declarator| self.declarator(declarator))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("{kind} {}", declarations.join(", ")))
    }

    fn declarator(&self, node: &Fields) -> Result<String, CompileError> {
        if node_kind(node) != "VariableDeclarator" {
            return Err(CompileError::UnsupportedNode {
                kind: node_kind(node).to_string(),
            });
        }
        let id = self.expression(child(node, "id")?, LEVEL_PRIMARY)?;
        match optional_child(node, "init")? {
            Some(init) => Ok(format!("{id} = {}", self.expression(init, LEVEL_ASSIGNMENT)?)),
            None => Ok(id),
        }
    }

    fn function_declaration(&self, node: &Fields, depth: usize) -> Result<String, CompileError> {
        let mut out = String::new();
        if flag_field(node, "async")? {
            out.push_str("async ");
        }
        out.push_str("function");
        if flag_field(node, "generator")? {
            out.push('*');
        }
        out.push(' ');
        out.push_str(&self.expression(child(node, "id")?, LEVEL_PRIMARY)?);
        let params = children(node, "params")?
            .iter()
            .map(|param| self.expression(param, LEVEL_ASSIGNMENT))
            .collect::<Result<Vec<_>, _>>()?;
        out.push_str(&format!("({}) ", params.join(", ")));
        out.push_str(&self.block(child(node, "body")?, depth)?);
        Ok(out)
    }

    fn block(&self, node: &Fields, depth: usize) -> Result<String, CompileError> {
        if node_kind(node) != "BlockStatement" {
            return Err(invalid(node, "body", "a block", &Value::Object(node.clone())));
        }
        let body = children(node, "body")?;
        if body.is_empty() {
            return Ok("{}".to_string());
        }
        Ok(format!(
            "{{\n{}\n{}}}",
            self.statement_list(&body, depth + 1)?,
            self.indent(depth)
        ))
    }

    /// Prints `node`, parenthesised when it binds looser than `min_level`.
    fn expression(&self, node: &Fields, min_level: u8) -> Result<String, CompileError> {
        let (text, level) = self.expression_with_level(node)?;
        if level < min_level {
            Ok(format!("({text})"))
        } else {
            Ok(text)
        }
    }

    fn expression_with_level(&self, node: &Fields) -> Result<(String, u8), CompileError> {
        match node_kind(node) {
            "Identifier" => Ok((string_field(node, "name")?.to_string(), LEVEL_PRIMARY)),
            "NumericLiteral" => {
                let value = node.get("value").ok_or_else(|| missing(node, "value"))?;
                let number = value
                    .as_f64()
                    .ok_or_else(|| invalid(node, "value", "a number", value))?;
                let text = raw_spelling(node, value)
                    .map(str::to_string)
                    .unwrap_or_else(|| format_number(number));
                let level = if text.starts_with('-') {
                    LEVEL_UNARY
                } else {
                    LEVEL_PRIMARY
                };
                Ok((text, level))
            }
            "StringLiteral" => {
                let value = node.get("value").ok_or_else(|| missing(node, "value"))?;
                let text = value
                    .as_str()
                    .ok_or_else(|| invalid(node, "value", "a string", value))?;
                let text = raw_spelling(node, value)
                    .map(str::to_string)
                    .unwrap_or_else(|| quote(text));
                Ok((text, LEVEL_PRIMARY))
            }
            "BooleanLiteral" => {
                let value = node.get("value").ok_or_else(|| missing(node, "value"))?;
                let flag = value
                    .as_bool()
                    .ok_or_else(|| invalid(node, "value", "a boolean", value))?;
                Ok((flag.to_string(), LEVEL_PRIMARY))
            }
            "NullLiteral" => Ok(("null".to_string(), LEVEL_PRIMARY)),
            "BinaryExpression" | "LogicalExpression" => {
                let logical = node_kind(node) == "LogicalExpression";
                let operator = operator_field(node, |op| {
                    binary_precedence(op).is_some() && is_logical_operator(op) == logical
                })?;
                let level = operator_level(operator).unwrap_or(LEVEL_SEQUENCE);
                let (left_min, right_min) = if operator == "**" {
                    (LEVEL_POSTFIX, level)
                } else {
                    (level, level + 1)
                };
                let left = self.expression(child(node, "left")?, left_min)?;
                let right = self.expression(child(node, "right")?, right_min)?;
                let text = if operator == "," {
                    format!("{left}, {right}")
                } else {
                    format!("{left} {operator} {right}")
                };
                Ok((text, level))
            }
            "UnaryExpression" => {
                let operator = operator_field(node, |op| UNARY_OPERATORS.contains(&op))?;
                let argument = self.expression(child(node, "argument")?, LEVEL_UNARY)?;
                let spaced = operator.chars().all(char::is_alphabetic)
                    || (matches!(operator, "-" | "+") && argument.starts_with(operator));
                let text = if spaced {
                    format!("{operator} {argument}")
                } else {
                    format!("{operator}{argument}")
                };
                Ok((text, LEVEL_UNARY))
            }
            "UpdateExpression" => {
                let operator = operator_field(node, |op| UPDATE_OPERATORS.contains(&op))?;
                let argument = self.expression(child(node, "argument")?, LEVEL_MEMBER)?;
                if flag_field(node, "prefix")? {
                    Ok((format!("{operator}{argument}"), LEVEL_UNARY))
                } else {
                    Ok((format!("{argument}{operator}"), LEVEL_POSTFIX))
                }
            }
            "AssignmentExpression" => {
                let operator = operator_field(node, |op| ASSIGNMENT_OPERATORS.contains(&op))?;
                let left = self.expression(child(node, "left")?, LEVEL_MEMBER)?;
                let right = self.expression(child(node, "right")?, LEVEL_ASSIGNMENT)?;
                Ok((format!("{left} {operator} {right}"), LEVEL_ASSIGNMENT))
            }
            "ConditionalExpression" => {
                let test = self.expression(child(node, "test")?, LEVEL_CONDITIONAL + 1)?;
                let consequent = self.expression(child(node, "consequent")?, LEVEL_ASSIGNMENT)?;
                let alternate = self.expression(child(node, "alternate")?, LEVEL_ASSIGNMENT)?;
                Ok((
                    format!("{test} ? {consequent} : {alternate}"),
                    LEVEL_CONDITIONAL,
                ))
            }
            "SequenceExpression" => {
                let expressions = children(node, "expressions")?
                    .iter()
                    .map(|expression| self.expression(expression, LEVEL_ASSIGNMENT))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((expressions.join(", "), LEVEL_SEQUENCE))
            }
            "CallExpression" => {
                let callee = self.expression(child(node, "callee")?, LEVEL_MEMBER)?;
                let arguments = children(node, "arguments")?
                    .iter()
                    .map(|argument| self.expression(argument, LEVEL_ASSIGNMENT))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((format!("{callee}({})", arguments.join(", ")), LEVEL_MEMBER))
            }
            "MemberExpression" => {
                let object = self.expression(child(node, "object")?, LEVEL_MEMBER)?;
                let property = child(node, "property")?;
                let text = if flag_field(node, "computed")? {
                    format!("{object}[{}]", self.expression(property, LEVEL_SEQUENCE)?)
                } else {
                    // `10.x` would lex as the number `10.`, and `-1.x` negates the member
                    let object = if node_kind(child(node, "object")?) == "NumericLiteral"
                        && (object.starts_with('-') || object.chars().all(|c| c.is_ascii_digit()))
                    {
                        format!("({object})")
                    } else {
                        object
                    };
                    format!("{object}.{}", self.expression(property, LEVEL_PRIMARY)?)
                };
                Ok((text, LEVEL_MEMBER))
            }
            "ArrayExpression" => {
                let value = node.get("elements").ok_or_else(|| missing(node, "elements"))?;
                let items = value
                    .as_list()
                    .ok_or_else(|| invalid(node, "elements", "a list", value))?;
                let elements = items
                    .iter()
                    .map(|item| match item {
                        Value::Null => Ok(String::new()),
                        other => match other.as_node() {
                            Some(element) => self.expression(element, LEVEL_ASSIGNMENT),
                            None => Err(invalid(node, "elements", "a list of nodes", other)),
                        },
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((format!("[{}]", elements.join(", ")), LEVEL_PRIMARY))
            }
            kind => Err(CompileError::UnsupportedNode {
                kind: kind.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::{JsParser, Parser};
    use crate::DEFAULT_SOURCE;

    fn compile(source: &str) -> String {
        let program = JsParser::new().parse_program(source).unwrap();
        JsPrinter::new()
            .compile(&program, &CompileOptions::default())
            .unwrap()
            .code
    }

    #[test]
    fn test_default_source_round_trips() {
        assert_eq!(compile(DEFAULT_SOURCE), DEFAULT_SOURCE);
    }

    #[test]
    fn test_file_root_compiles_its_program() {
        let file = JsParser::new().parse("let x = 1;").unwrap();
        let output = JsPrinter::new()
            .compile(&file, &CompileOptions::default())
            .unwrap();
        assert_eq!(output.code, "let x = 1;");
    }

    #[test]
    fn test_indent_width_option() {
        let program = JsParser::new()
            .parse_program("function f() { return 1; }")
            .unwrap();
        let output = JsPrinter::new()
            .compile(&program, &CompileOptions { indent_width: 4 })
            .unwrap();
        assert_eq!(output.code, "function f() {\n    return 1;\n}");
    }

    #[test]
    fn test_parentheses_follow_precedence() {
        assert_eq!(compile("x = (a + b) * c;"), "x = (a + b) * c;");
        assert_eq!(compile("x = a + b * c;"), "x = a + b * c;");
        assert_eq!(compile("x = a - (b - c);"), "x = a - (b - c);");
        assert_eq!(compile("x = (2 ** 3) ** 2;"), "x = (2 ** 3) ** 2;");
        assert_eq!(compile("x = -(a + b);"), "x = -(a + b);");
        assert_eq!(compile("x = - -a;"), "x = - -a;");
        assert_eq!(compile("x = (a, b);"), "x = (a, b);");
    }

    #[test]
    fn test_integer_member_object_keeps_parentheses() {
        assert_eq!(compile("x = (10).toFixed(2);"), "x = (10).toFixed(2);");
        assert_eq!(compile("x = 1.5.toFixed(2);"), "x = 1.5.toFixed(2);");
        assert_eq!(compile("x = (10)[0];"), "x = 10[0];");
    }

    #[test]
    fn test_statements_and_expressions() {
        let source = "if (!ready) {\n  log(\"wait\", items[0].name);\n} else return typeof x;";
        assert_eq!(compile(source), source);
        assert_eq!(compile("async function* g() {}"), "async function* g() {}");
        assert_eq!(compile("let a = [1, 'two', null], b;"), "let a = [1, 'two', null], b;");
        assert_eq!(compile("i++;\n--j;"), "i++;\n--j;");
        assert_eq!(compile("x = a ? b : c || d;"), "x = a ? b : c || d;");
    }

    #[test]
    fn test_raw_spelling_used_only_while_value_matches() {
        let mut program = JsParser::new().parse_program("x = 0x10;").unwrap();
        let options = CompileOptions::default();
        assert_eq!(JsPrinter.compile(&program, &options).unwrap().code, "x = 0x10;");

        let literal = crate::path::NodePath::root()
            .element("body", 0)
            .child("expression")
            .child("right")
            .resolve_mut(&mut program)
            .unwrap();
        literal.insert("value".to_string(), Value::Number(17.0));
        assert_eq!(JsPrinter.compile(&program, &options).unwrap().code, "x = 17;");
    }

    #[test]
    fn test_edited_member_object_stays_valid() {
        let mut program = JsParser::new().parse_program("x = 1.5.toFixed(2);").unwrap();
        let literal = crate::path::NodePath::root()
            .element("body", 0)
            .child("expression")
            .child("right")
            .child("callee")
            .child("object")
            .resolve_mut(&mut program)
            .unwrap();
        literal.insert("value".to_string(), Value::Number(-3.0));
        let output = JsPrinter.compile(&program, &CompileOptions::default()).unwrap();
        assert_eq!(output.code, "x = (-3).toFixed(2);");
    }

    #[test]
    fn test_operator_changes_are_reparenthesised() {
        let mut program = JsParser::new().parse_program("x = a * b + c;").unwrap();
        let sum = crate::path::NodePath::root()
            .element("body", 0)
            .child("expression")
            .child("right")
            .resolve_mut(&mut program)
            .unwrap();
        sum.insert("operator".to_string(), Value::from("**"));
        let output = JsPrinter.compile(&program, &CompileOptions::default()).unwrap();
        assert_eq!(output.code, "x = (a * b) ** c;");
    }

    #[test]
    fn test_rejects_invalid_trees() {
        let options = CompileOptions::default();
        let mut program = JsParser::new().parse_program("var a = 1;").unwrap();
        let declaration = crate::path::NodePath::root()
            .element("body", 0)
            .resolve_mut(&mut program)
            .unwrap();
        declaration.insert("kind".to_string(), Value::from("static"));
        assert!(matches!(
            JsPrinter.compile(&program, &options),
            Err(CompileError::InvalidField { ref field, .. }) if field == "kind"
        ));

        let mut program = JsParser::new().parse_program("a + b;").unwrap();
        let binary = crate::path::NodePath::root()
            .element("body", 0)
            .child("expression")
            .resolve_mut(&mut program)
            .unwrap();
        binary.insert("operator".to_string(), Value::from("&&"));
        assert_eq!(
            JsPrinter.compile(&program, &options),
            Err(CompileError::UnknownOperator {
                kind: "BinaryExpression".to_string(),
                operator: "&&".to_string(),
            })
        );

        let mut program = crate::node::new_node("Program");
        program.insert(
            "body".to_string(),
            Value::List(vec![Value::Object(crate::node::new_node("WithStatement"))]),
        );
        assert_eq!(
            JsPrinter.compile(&program, &options),
            Err(CompileError::UnsupportedNode {
                kind: "WithStatement".to_string()
            })
        );
    }
}
