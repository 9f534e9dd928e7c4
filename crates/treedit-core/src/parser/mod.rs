// Parser module - turns JavaScript source into a Babel-shaped node tree
use thiserror::Error;

use crate::node::{new_node, Fields, Value};

pub mod lexer;

use lexer::{tokenize, LineIndex, Token, TokenKind};

/// Errors produced while turning source text into a tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{message} ({line}:{column})")]
    Lex {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Expected {expected}, found {found} ({line}:{column})")]
    Unexpected {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },
}

/// Trait for source parsers that produce trees for the editor
pub trait Parser {
    /// Parse source code into a `File` node
    fn parse(&self, source: &str) -> Result<Fields, ParseError>;

    /// Parse source code and return only its `Program` node
    fn parse_program(&self, source: &str) -> Result<Fields, ParseError> {
        let mut file = self.parse(source)?;
        match file.shift_remove("program") {
            Some(Value::Object(program)) => Ok(program),
            _ => Err(ParseError::Unexpected {
                expected: "a program".to_string(),
                found: "a file without one".to_string(),
                line: 1,
                column: 0,
            }),
        }
    }
}

/// Parser for the JavaScript subset the editor understands
#[derive(Debug, Default, Clone, Copy)]
pub struct JsParser;

impl JsParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for JsParser {
    fn parse(&self, source: &str) -> Result<Fields, ParseError> {
        let tokens = tokenize(source)?;
        let mut state = ParserState {
            tokens,
            pos: 0,
            lines: LineIndex::new(source),
        };
        state.parse_file(source.len())
    }
}

/// Words that can never be used as identifiers.
const RESERVED: &[&str] = &[
    "var",
    "let",
    "const",
    "function",
    "return",
    "if",
    "else",
    "true",
    "false",
    "null",
    "typeof",
    "void",
    "delete",
    "in",
    "instanceof",
];

const ASSIGNMENT_OPERATORS: &[&str] = &["=", "+=", "-=", "*=", "/=", "%="];

/// Binding power of binary and logical operators; higher binds tighter.
pub fn binary_precedence(operator: &str) -> Option<u8> {
    let precedence = match operator {
        "," => 0,
        "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" | "===" | "!==" => 6,
        "<" | ">" | "<=" | ">=" | "in" | "instanceof" => 7,
        "<<" | ">>" | ">>>" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        "**" => 11,
        _ => return None,
    };
    Some(precedence)
}

pub fn is_logical_operator(operator: &str) -> bool {
    matches!(operator, "||" | "&&")
}

struct ParserState {
    tokens: Vec<Token>,
    pos: usize,
    lines: LineIndex,
}

impl ParserState {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, ahead: usize) -> &Token {
        &self.tokens[(self.pos + ahead).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].end
        }
    }

    fn is_punct(&self, p: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Punct(q) if *q == p)
    }

    fn is_word(&self, word: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(name) if name == word)
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if self.is_punct(p) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.is_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        let (line, column) = self.lines.position(token.start);
        ParseError::Unexpected {
            expected: expected.to_string(),
            found: token.kind.describe(),
            line,
            column,
        }
    }

    fn expect_punct(&mut self, p: &str) -> Result<(), ParseError> {
        if self.eat_punct(p) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{p}'")))
        }
    }

    /// Statement terminator with the usual automatic-semicolon leniency.
    fn consume_semicolon(&mut self) -> Result<(), ParseError> {
        if self.eat_punct(";") {
            return Ok(());
        }
        let token = self.peek();
        if token.newline_before || token.kind == TokenKind::Eof || self.is_punct("}") {
            Ok(())
        } else {
            Err(self.unexpected("';'"))
        }
    }

    /// Starts a node whose position fields are filled in by [`Self::finish`].
    fn start(&self, kind: &str) -> Fields {
        let mut node = new_node(kind);
        node.insert("start".to_string(), Value::Null);
        node.insert("end".to_string(), Value::Null);
        node.insert("loc".to_string(), Value::Null);
        node
    }

    fn finish(&self, mut node: Fields, start: usize) -> Value {
        let end = self.prev_end().max(start);
        self.finish_at(&mut node, start, end);
        Value::Object(node)
    }

    fn finish_at(&self, node: &mut Fields, start: usize, end: usize) {
        node.insert("start".to_string(), Value::Number(start as f64));
        node.insert("end".to_string(), Value::Number(end as f64));
        node.insert("loc".to_string(), self.location(start, end));
    }

    fn location(&self, start: usize, end: usize) -> Value {
        let point = |offset: usize| {
            let (line, column) = self.lines.position(offset);
            let mut point = Fields::new();
            point.insert("line".to_string(), Value::Number(line as f64));
            point.insert("column".to_string(), Value::Number(column as f64));
            point.insert("index".to_string(), Value::Number(offset as f64));
            Value::Object(point)
        };
        let mut loc = Fields::new();
        loc.insert("start".to_string(), point(start));
        loc.insert("end".to_string(), point(end));
        Value::Object(loc)
    }

    fn parse_file(&mut self, source_len: usize) -> Result<Fields, ParseError> {
        let mut program = self.start("Program");
        program.insert("sourceType".to_string(), Value::from("script"));
        program.insert("interpreter".to_string(), Value::Null);

        let mut body = Vec::new();
        while self.peek().kind != TokenKind::Eof {
            body.push(self.parse_statement()?);
        }
        program.insert("body".to_string(), Value::List(body));
        program.insert("directives".to_string(), Value::List(Vec::new()));
        self.finish_at(&mut program, 0, source_len);

        let mut file = self.start("File");
        file.insert("program".to_string(), Value::Object(program));
        file.insert("comments".to_string(), Value::List(Vec::new()));
        self.finish_at(&mut file, 0, source_len);
        Ok(file)
    }

    fn parse_statement(&mut self) -> Result<Value, ParseError> {
        let start = self.peek().start;

        if self.is_word("var") || self.is_word("let") || self.is_word("const") {
            return self.parse_variable_declaration();
        }
        if self.is_word("function")
            || (self.is_word("async")
                && matches!(&self.peek_at(1).kind, TokenKind::Ident(n) if n == "function")
                && !self.peek_at(1).newline_before)
        {
            return self.parse_function_declaration();
        }
        if self.eat_word("return") {
            let mut node = self.start("ReturnStatement");
            let has_argument = !self.is_punct(";")
                && !self.is_punct("}")
                && !self.peek().newline_before
                && self.peek().kind != TokenKind::Eof;
            let argument = if has_argument {
                self.parse_expression()?
            } else {
                Value::Null
            };
            node.insert("argument".to_string(), argument);
            self.consume_semicolon()?;
            return Ok(self.finish(node, start));
        }
        if self.eat_word("if") {
            let mut node = self.start("IfStatement");
            self.expect_punct("(")?;
            node.insert("test".to_string(), self.parse_expression()?);
            self.expect_punct(")")?;
            node.insert("consequent".to_string(), self.parse_statement()?);
            let alternate = if self.eat_word("else") {
                self.parse_statement()?
            } else {
                Value::Null
            };
            node.insert("alternate".to_string(), alternate);
            return Ok(self.finish(node, start));
        }
        if self.is_punct("{") {
            return self.parse_block();
        }
        if self.eat_punct(";") {
            return Ok(self.finish(self.start("EmptyStatement"), start));
        }

        let mut node = self.start("ExpressionStatement");
        node.insert("expression".to_string(), self.parse_expression()?);
        self.consume_semicolon()?;
        Ok(self.finish(node, start))
    }

    fn parse_variable_declaration(&mut self) -> Result<Value, ParseError> {
        let start = self.peek().start;
        let kind = match self.advance().kind {
            TokenKind::Ident(word) => word,
            _ => return Err(self.unexpected("a declaration keyword")),
        };
        let mut node = self.start("VariableDeclaration");

        let mut declarations = Vec::new();
        loop {
            let declarator_start = self.peek().start;
            let mut declarator = self.start("VariableDeclarator");
            declarator.insert("id".to_string(), self.parse_identifier()?);
            let init = if self.eat_punct("=") {
                self.parse_assignment()?
            } else {
                Value::Null
            };
            declarator.insert("init".to_string(), init);
            declarations.push(self.finish(declarator, declarator_start));
            if !self.eat_punct(",") {
                break;
            }
        }
        node.insert("declarations".to_string(), Value::List(declarations));
        node.insert("kind".to_string(), Value::from(kind));
        self.consume_semicolon()?;
        Ok(self.finish(node, start))
    }

    fn parse_function_declaration(&mut self) -> Result<Value, ParseError> {
        let start = self.peek().start;
        let is_async = self.eat_word("async");
        if !self.eat_word("function") {
            return Err(self.unexpected("'function'"));
        }
        let generator = self.eat_punct("*");

        let mut node = self.start("FunctionDeclaration");
        node.insert("id".to_string(), self.parse_identifier()?);
        node.insert("generator".to_string(), Value::Bool(generator));
        node.insert("async".to_string(), Value::Bool(is_async));

        self.expect_punct("(")?;
        let mut params = Vec::new();
        while !self.is_punct(")") {
            params.push(self.parse_identifier()?);
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        node.insert("params".to_string(), Value::List(params));
        node.insert("body".to_string(), self.parse_block()?);
        Ok(self.finish(node, start))
    }

    fn parse_block(&mut self) -> Result<Value, ParseError> {
        let start = self.peek().start;
        self.expect_punct("{")?;
        let mut node = self.start("BlockStatement");
        let mut body = Vec::new();
        while !self.is_punct("}") {
            if self.peek().kind == TokenKind::Eof {
                return Err(self.unexpected("'}'"));
            }
            body.push(self.parse_statement()?);
        }
        self.expect_punct("}")?;
        node.insert("body".to_string(), Value::List(body));
        node.insert("directives".to_string(), Value::List(Vec::new()));
        Ok(self.finish(node, start))
    }

    fn parse_identifier(&mut self) -> Result<Value, ParseError> {
        let start = self.peek().start;
        match &self.peek().kind {
            TokenKind::Ident(name) if !RESERVED.contains(&name.as_str()) => {
                let name = name.clone();
                self.advance();
                let mut node = self.start("Identifier");
                node.insert("name".to_string(), Value::from(name));
                Ok(self.finish(node, start))
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn parse_expression(&mut self) -> Result<Value, ParseError> {
        let start = self.peek().start;
        let first = self.parse_assignment()?;
        if !self.is_punct(",") {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat_punct(",") {
            expressions.push(self.parse_assignment()?);
        }
        let mut node = self.start("SequenceExpression");
        node.insert("expressions".to_string(), Value::List(expressions));
        Ok(self.finish(node, start))
    }

    fn parse_assignment(&mut self) -> Result<Value, ParseError> {
        let start = self.peek().start;
        let left = self.parse_conditional()?;
        let operator = match &self.peek().kind {
            TokenKind::Punct(p) if ASSIGNMENT_OPERATORS.contains(p) => *p,
            _ => return Ok(left),
        };
        let target_kind = left.as_node().map(crate::node::node_kind);
        if !matches!(target_kind, Some("Identifier" | "MemberExpression")) {
            return Err(self.unexpected("an assignable target before the operator"));
        }
        self.advance();
        let mut node = self.start("AssignmentExpression");
        node.insert("operator".to_string(), Value::from(operator));
        node.insert("left".to_string(), left);
        node.insert("right".to_string(), self.parse_assignment()?);
        Ok(self.finish(node, start))
    }

    fn parse_conditional(&mut self) -> Result<Value, ParseError> {
        let start = self.peek().start;
        let test = self.parse_binary(1)?;
        if !self.eat_punct("?") {
            return Ok(test);
        }
        let mut node = self.start("ConditionalExpression");
        node.insert("test".to_string(), test);
        node.insert("consequent".to_string(), self.parse_assignment()?);
        self.expect_punct(":")?;
        node.insert("alternate".to_string(), self.parse_assignment()?);
        Ok(self.finish(node, start))
    }

    fn peek_binary_operator(&self) -> Option<(&'static str, u8)> {
        let operator: &'static str = match &self.peek().kind {
            TokenKind::Punct(p) => *p,
            TokenKind::Ident(word) if word == "in" => "in",
            TokenKind::Ident(word) if word == "instanceof" => "instanceof",
            _ => return None,
        };
        // `,` is handled by sequence expressions
        if operator == "," {
            return None;
        }
        binary_precedence(operator).map(|precedence| (operator, precedence))
    }

    /// Precedence climbing over binary and logical operators.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Value, ParseError> {
        let start = self.peek().start;
        let mut left = self.parse_unary()?;

        while let Some((operator, precedence)) = self.peek_binary_operator() {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let next_min = if operator == "**" {
                precedence
            } else {
                precedence + 1
            };
            let right = self.parse_binary(next_min)?;
            let kind = if is_logical_operator(operator) {
                "LogicalExpression"
            } else {
                "BinaryExpression"
            };
            let mut node = self.start(kind);
            node.insert("left".to_string(), left);
            node.insert("operator".to_string(), Value::from(operator));
            node.insert("right".to_string(), right);
            left = self.finish(node, start);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Value, ParseError> {
        let start = self.peek().start;
        let operator = match &self.peek().kind {
            TokenKind::Punct(p @ ("!" | "-" | "+" | "~")) => Some(*p),
            TokenKind::Ident(word) if matches!(word.as_str(), "typeof" | "void" | "delete") => {
                Some(match word.as_str() {
                    "typeof" => "typeof",
                    "void" => "void",
                    _ => "delete",
                })
            }
            _ => None,
        };
        if let Some(operator) = operator {
            self.advance();
            let mut node = self.start("UnaryExpression");
            node.insert("operator".to_string(), Value::from(operator));
            node.insert("prefix".to_string(), Value::Bool(true));
            node.insert("argument".to_string(), self.parse_unary()?);
            return Ok(self.finish(node, start));
        }

        if let Some(operator) = self.peek_update_operator() {
            self.advance();
            let mut node = self.start("UpdateExpression");
            node.insert("operator".to_string(), Value::from(operator));
            node.insert("prefix".to_string(), Value::Bool(true));
            node.insert("argument".to_string(), self.parse_unary()?);
            return Ok(self.finish(node, start));
        }

        let expression = self.parse_call_member()?;
        let postfix = self
            .peek_update_operator()
            .filter(|_| !self.peek().newline_before);
        if let Some(operator) = postfix {
            self.advance();
            let mut node = self.start("UpdateExpression");
            node.insert("operator".to_string(), Value::from(operator));
            node.insert("prefix".to_string(), Value::Bool(false));
            node.insert("argument".to_string(), expression);
            return Ok(self.finish(node, start));
        }
        Ok(expression)
    }

    fn peek_update_operator(&self) -> Option<&'static str> {
        match &self.peek().kind {
            TokenKind::Punct(p @ ("++" | "--")) => Some(*p),
            _ => None,
        }
    }

    fn parse_call_member(&mut self) -> Result<Value, ParseError> {
        let start = self.peek().start;
        let mut expression = self.parse_primary()?;
        loop {
            if self.eat_punct(".") {
                let mut node = self.start("MemberExpression");
                node.insert("object".to_string(), expression);
                node.insert("computed".to_string(), Value::Bool(false));
                let property_start = self.peek().start;
                let name = match &self.peek().kind {
                    TokenKind::Ident(name) => name.clone(),
                    _ => return Err(self.unexpected("a property name")),
                };
                self.advance();
                let mut property = self.start("Identifier");
                property.insert("name".to_string(), Value::from(name));
                node.insert("property".to_string(), self.finish(property, property_start));
                expression = self.finish(node, start);
            } else if self.eat_punct("[") {
                let mut node = self.start("MemberExpression");
                node.insert("object".to_string(), expression);
                node.insert("computed".to_string(), Value::Bool(true));
                node.insert("property".to_string(), self.parse_expression()?);
                self.expect_punct("]")?;
                expression = self.finish(node, start);
            } else if self.eat_punct("(") {
                let mut node = self.start("CallExpression");
                node.insert("callee".to_string(), expression);
                let mut arguments = Vec::new();
                while !self.is_punct(")") {
                    arguments.push(self.parse_assignment()?);
                    if !self.eat_punct(",") {
                        break;
                    }
                }
                self.expect_punct(")")?;
                node.insert("arguments".to_string(), Value::List(arguments));
                expression = self.finish(node, start);
            } else {
                return Ok(expression);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Value, ParseError> {
        let start = self.peek().start;
        match self.peek().kind.clone() {
            TokenKind::Number { value, raw } => {
                self.advance();
                let mut node = self.start("NumericLiteral");
                node.insert("extra".to_string(), raw_extra(Value::Number(value), raw));
                node.insert("value".to_string(), Value::Number(value));
                Ok(self.finish(node, start))
            }
            TokenKind::Str { value, raw } => {
                self.advance();
                let mut node = self.start("StringLiteral");
                node.insert("extra".to_string(), raw_extra(Value::from(value.clone()), raw));
                node.insert("value".to_string(), Value::from(value));
                Ok(self.finish(node, start))
            }
            TokenKind::Ident(word) if word == "true" || word == "false" => {
                self.advance();
                let mut node = self.start("BooleanLiteral");
                node.insert("value".to_string(), Value::Bool(word == "true"));
                Ok(self.finish(node, start))
            }
            TokenKind::Ident(word) if word == "null" => {
                self.advance();
                Ok(self.finish(self.start("NullLiteral"), start))
            }
            TokenKind::Ident(_) => self.parse_identifier(),
            TokenKind::Punct("(") => {
                self.advance();
                let mut inner = self.parse_expression()?;
                self.expect_punct(")")?;
                if let Some(node) = inner.as_node_mut() {
                    let extra = node
                        .entry("extra".to_string())
                        .or_insert_with(|| Value::Object(Fields::new()));
                    if let Value::Object(extra) = extra {
                        extra.insert("parenthesized".to_string(), Value::Bool(true));
                        extra.insert("parenStart".to_string(), Value::Number(start as f64));
                    }
                }
                Ok(inner)
            }
            TokenKind::Punct("[") => {
                self.advance();
                let mut node = self.start("ArrayExpression");
                let mut elements = Vec::new();
                while !self.is_punct("]") {
                    elements.push(self.parse_assignment()?);
                    if !self.eat_punct(",") {
                        break;
                    }
                }
                self.expect_punct("]")?;
                node.insert("elements".to_string(), Value::List(elements));
                Ok(self.finish(node, start))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }
}

/// Literal metadata recording the source spelling of a value.
fn raw_extra(raw_value: Value, raw: String) -> Value {
    let mut extra = Fields::new();
    extra.insert("rawValue".to_string(), raw_value);
    extra.insert("raw".to_string(), Value::from(raw));
    Value::Object(extra)
}
