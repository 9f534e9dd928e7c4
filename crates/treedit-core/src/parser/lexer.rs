//! Tokenizer for the JavaScript subset, built from nom combinators.
//!
//! # Token grammar
//!
//! ```ebnf
//! token      = number | string | identifier | punctuator;
//! number     = ("0x" | "0X"), hex_digit, {hex_digit}
//!            | digit, {digit}, [".", {digit}], [exponent]
//!            | ".", digit, {digit}, [exponent];
//! exponent   = ("e" | "E"), ["+" | "-"], digit, {digit};
//! string     = '"', {char | escape}, '"' | "'", {char | escape}, "'";
//! identifier = (letter | "_" | "$"), {letter | digit | "_" | "$"};
//! trivia     = whitespace | "//", {any}, newline | "/*", {any}, "*/";
//! ```

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case, take_until},
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, hex_digit1, one_of},
    combinator::{map, opt, recognize, value},
    multi::many0_count,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use super::ParseError;

/// Punctuators, longest first so that prefixes never shadow longer operators.
const PUNCTUATORS: &[&str] = &[
    ">>>", "===", "!==", "**", "==", "!=", "<=", ">=", "<<", ">>", "&&", "||", "+=", "-=",
    "*=", "/=", "%=", "++", "--", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "<",
    ">", "=", "(", ")", "{", "}", "[", "]", ";", ",", ".", "?", ":",
];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number { value: f64, raw: String },
    Str { value: String, raw: String },
    Punct(&'static str),
    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("'{name}'"),
            TokenKind::Number { raw, .. } => format!("number {raw}"),
            TokenKind::Str { raw, .. } => format!("string {raw}"),
            TokenKind::Punct(p) => format!("'{p}'"),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    /// A line break appeared between the previous token and this one.
    pub newline_before: bool,
}

/// Maps byte offsets to 1-based lines and 0-based columns.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { line_starts }
    }

    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.line_starts[line])
    }
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("//"), opt(is_not("\n"))))(input)
}

fn block_comment(input: &str) -> IResult<&str, &str> {
    recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

fn exponent(input: &str) -> IResult<&str, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

fn number(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(pair(tag_no_case("0x"), hex_digit1)),
        recognize(tuple((digit1, opt(pair(char('.'), digit0)), opt(exponent)))),
        recognize(tuple((char('.'), digit1, opt(exponent)))),
    ))(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"), tag("$"))),
        many0_count(alt((alphanumeric1, tag("_"), tag("$")))),
    ))(input)
}

fn escape(input: &str) -> IResult<&str, char> {
    preceded(
        char('\\'),
        alt((
            value('\n', char('n')),
            value('\t', char('t')),
            value('\r', char('r')),
            value('\0', char('0')),
            value('\\', char('\\')),
            value('\'', char('\'')),
            value('"', char('"')),
        )),
    )(input)
}

fn string_body(quote: char) -> impl FnMut(&str) -> IResult<&str, String> {
    move |mut input: &str| {
        let mut out = String::new();
        loop {
            if input.starts_with(quote) || input.is_empty() || input.starts_with('\n') {
                return Ok((input, out));
            }
            if input.starts_with('\\') {
                let (rest, c) = escape(input)?;
                out.push(c);
                input = rest;
            } else {
                let c = input.chars().next().unwrap_or_default();
                out.push(c);
                input = &input[c.len_utf8()..];
            }
        }
    }
}

fn string(input: &str) -> IResult<&str, String> {
    alt((
        delimited(char('"'), string_body('"'), char('"')),
        delimited(char('\''), string_body('\''), char('\'')),
    ))(input)
}

fn punctuator(input: &str) -> IResult<&str, &'static str> {
    for p in PUNCTUATORS {
        if let Some(rest) = input.strip_prefix(p) {
            return Ok((rest, p));
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Tag,
    )))
}

fn parse_number_value(raw: &str) -> f64 {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map(|n| n as f64).unwrap_or(f64::NAN);
    }
    raw.parse::<f64>().unwrap_or(f64::NAN)
}

fn token(input: &str) -> IResult<&str, TokenKind> {
    alt((
        map(number, |raw: &str| TokenKind::Number {
            value: parse_number_value(raw),
            raw: raw.to_string(),
        }),
        map(identifier, |name: &str| TokenKind::Ident(name.to_string())),
        map(punctuator, TokenKind::Punct),
    ))(input)
}

/// Splits `source` into tokens, always ending with [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let lines = LineIndex::new(source);
    let offset = |rest: &str| source.len() - rest.len();
    let error_at = |at: usize, message: String| {
        let (line, column) = lines.position(at);
        ParseError::Lex {
            message,
            line,
            column,
        }
    };

    let mut tokens = Vec::new();
    let mut input = source;
    let mut newline_before = false;

    loop {
        let trimmed = input.trim_start();
        newline_before |= input[..input.len() - trimmed.len()].contains('\n');
        input = trimmed;

        if input.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                start: source.len(),
                end: source.len(),
                newline_before,
            });
            return Ok(tokens);
        }

        if input.starts_with("//") {
            if let Ok((rest, _)) = line_comment(input) {
                input = rest;
                continue;
            }
        }
        if input.starts_with("/*") {
            match block_comment(input) {
                Ok((rest, comment)) => {
                    newline_before |= comment.contains('\n');
                    input = rest;
                    continue;
                }
                Err(_) => {
                    return Err(error_at(offset(input), "unterminated comment".to_string()));
                }
            }
        }

        let start = offset(input);
        if input.starts_with('"') || input.starts_with('\'') {
            match string(input) {
                Ok((rest, text)) => {
                    let end = offset(rest);
                    tokens.push(Token {
                        kind: TokenKind::Str {
                            value: text,
                            raw: source[start..end].to_string(),
                        },
                        start,
                        end,
                        newline_before,
                    });
                    newline_before = false;
                    input = rest;
                    continue;
                }
                Err(_) => return Err(error_at(start, "unterminated string".to_string())),
            }
        }

        match token(input) {
            Ok((rest, kind)) => {
                tokens.push(Token {
                    kind,
                    start,
                    end: offset(rest),
                    newline_before,
                });
                newline_before = false;
                input = rest;
            }
            Err(_) => {
                let ch = input.chars().next().unwrap_or_default();
                return Err(error_at(start, format!("unexpected character '{ch}'")));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_declaration() {
        assert_eq!(
            kinds("var a = 10;"),
            vec![
                TokenKind::Ident("var".to_string()),
                TokenKind::Ident("a".to_string()),
                TokenKind::Punct("="),
                TokenKind::Number {
                    value: 10.0,
                    raw: "10".to_string()
                },
                TokenKind::Punct(";"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_longest_punctuator_wins() {
        assert_eq!(
            kinds("a >>> b !== c ** d"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Punct(">>>"),
                TokenKind::Ident("b".to_string()),
                TokenKind::Punct("!=="),
                TokenKind::Ident("c".to_string()),
                TokenKind::Punct("**"),
                TokenKind::Ident("d".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers_keep_raw_text() {
        assert_eq!(
            kinds("0x1F 1.50 .5 2e3"),
            vec![
                TokenKind::Number {
                    value: 31.0,
                    raw: "0x1F".to_string()
                },
                TokenKind::Number {
                    value: 1.5,
                    raw: "1.50".to_string()
                },
                TokenKind::Number {
                    value: 0.5,
                    raw: ".5".to_string()
                },
                TokenKind::Number {
                    value: 2000.0,
                    raw: "2e3".to_string()
                },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "" "a\nb""#),
            vec![
                TokenKind::Str {
                    value: "it's".to_string(),
                    raw: r"'it\'s'".to_string()
                },
                TokenKind::Str {
                    value: String::new(),
                    raw: r#""""#.to_string()
                },
                TokenKind::Str {
                    value: "a\nb".to_string(),
                    raw: r#""a\nb""#.to_string()
                },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped_and_newlines_tracked() {
        let tokens = tokenize("a // note\n/* block */ b").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(!tokens[0].newline_before);
        assert!(tokens[1].newline_before);
        assert_eq!(tokens[1].kind, TokenKind::Ident("b".to_string()));
    }

    #[test]
    fn test_lex_errors_report_position() {
        match tokenize("a = 1;\n  #") {
            Err(ParseError::Lex { line, column, .. }) => {
                assert_eq!((line, column), (2, 2));
            }
            other => panic!("expected lex error, got {other:?}"),
        }
        assert!(tokenize("'open").is_err());
        assert!(tokenize("/* open").is_err());
    }

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("ab\ncd\n");
        assert_eq!(index.position(0), (1, 0));
        assert_eq!(index.position(3), (2, 0));
        assert_eq!(index.position(4), (2, 1));
    }
}
