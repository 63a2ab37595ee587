use std::fmt;

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Eof,
    Def,
    Extern,
    Ident(String),
    Number(f64),
    /// any single character not covered by the other kinds, e.g. `(` or `+`
    Char(char),
}

impl Token {
    pub fn is_char(&self, c: char) -> bool {
        *self == Token::Char(c)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "end of input"),
            Token::Def => write!(f, "'def'"),
            Token::Extern => write!(f, "'extern'"),
            Token::Ident(name) => write!(f, "identifier '{}'", name),
            Token::Number(value) => write!(f, "number {}", value),
            Token::Char(c) => write!(f, "'{}'", c.escape_debug()),
        }
    }
}

lazy_static! {
    // longest prefix strtod would accept from a run of digits and dots
    static ref NUMBER_PREFIX_RE: Regex = Regex::new(r"^(?:\d+(?:\.\d*)?|\.\d+)").unwrap();
}

/// converts the leading numeric prefix of `text`, ignoring whatever follows it.
///
/// this is deliberately lenient: `1.2.3` becomes `1.2` and a lone `.` becomes `0`
fn parse_number_prefix(text: &str) -> f64 {
    NUMBER_PREFIX_RE
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

// C isspace, which also counts vertical tab
fn is_space(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0b'
}

/// a lexing session over a character source, producing one token per call
pub struct Lexer<I: Iterator<Item = char>> {
    input: I,
    last_char: Option<char>,
}

impl<I: Iterator<Item = char>> Lexer<I> {
    pub fn new(input: I) -> Self {
        Self {
            input,
            last_char: Some(' '),
        }
    }

    fn bump(&mut self) {
        self.last_char = self.input.next();
    }

    pub fn next_token(&mut self) -> Token {
        let token = self.lex_token();
        trace!("lexed {}", token);
        token
    }

    fn lex_token(&mut self) -> Token {
        loop {
            while self.last_char.map_or(false, is_space) {
                self.bump();
            }

            let c = match self.last_char {
                Some(c) => c,
                None => return Token::Eof,
            };

            if c.is_ascii_alphabetic() {
                let mut ident = String::new();
                while let Some(c) = self.last_char.filter(char::is_ascii_alphanumeric) {
                    ident.push(c);
                    self.bump();
                }
                return match ident.as_str() {
                    "def" => Token::Def,
                    "extern" => Token::Extern,
                    _ => Token::Ident(ident),
                };
            }

            if c.is_ascii_digit() || c == '.' {
                let mut digits = String::new();
                while let Some(c) = self.last_char.filter(|c| c.is_ascii_digit() || *c == '.') {
                    digits.push(c);
                    self.bump();
                }
                return Token::Number(parse_number_prefix(&digits));
            }

            if c == '#' {
                while let Some(c) = self.last_char {
                    if c == '\n' || c == '\r' {
                        break;
                    }
                    self.bump();
                }
                continue;
            }

            self.bump();
            return Token::Char(c);
        }
    }
}

impl<I: Iterator<Item = char>> Iterator for Lexer<I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        match self.next_token() {
            Token::Eof => None,
            tok => Some(tok),
        }
    }
}

/// lex the whole input string, stopping before the end-of-input token
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input.chars()).collect()
}
