use std::io::{self, Write};

use log::info;

use crate::ast::ASTNode;
use crate::diagnostic::Reporter;
use crate::lexer::{Lexer, Token};
use crate::parser::{ParseResult, Parser};

pub const PROMPT: &str = "ready> ";

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub prompt: bool,
    pub dump_ast: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub parsed: usize,
    pub errors: usize,
}

/// the interactive read loop: prompts, dispatches on the current token and
/// skips one token after every failed item so the loop always makes progress
pub struct Driver<I: Iterator<Item = char>, O: Write, E: Write> {
    parser: Parser<I>,
    out: O,
    diagnostics: Reporter<E>,
    options: Options,
    parsed: usize,
}

impl<I: Iterator<Item = char>, O: Write, E: Write> Driver<I, O, E> {
    pub fn new(parser: Parser<I>, out: O, err: E, options: Options) -> Self {
        Self {
            parser,
            out,
            diagnostics: Reporter::new(err),
            options,
            parsed: 0,
        }
    }

    fn prompt(&mut self) -> io::Result<()> {
        if self.options.prompt {
            let err = self.diagnostics.get_mut();
            write!(err, "{}", PROMPT)?;
            err.flush()?;
        }
        Ok(())
    }

    fn handle(&mut self, result: ParseResult<ASTNode>) -> io::Result<()> {
        match result {
            Ok(node) => {
                self.parsed += 1;
                let description = match &node {
                    ASTNode::Extern(_) => "Parsed an extern.",
                    ASTNode::Function(func) if func.is_anonymous() => {
                        "Parsed a top-level expression."
                    }
                    ASTNode::Function(_) => "Parsed a function definition.",
                };
                writeln!(self.out, "{}", description)?;
                if self.options.dump_ast {
                    writeln!(self.out, "{}", node)?;
                }
            }
            Err(err) => {
                self.diagnostics.report(&err)?;
                // skip the offending token
                self.parser.advance_token();
            }
        }
        Ok(())
    }

    pub fn run(mut self) -> io::Result<Summary> {
        info!("starting read loop");
        self.prompt()?;
        self.parser.advance_token();

        loop {
            let result = match self.parser.current_token() {
                Token::Eof => break,
                Token::Char(';') => {
                    self.parser.advance_token();
                    self.prompt()?;
                    continue;
                }
                Token::Def => self.parser.parse_definition().map(ASTNode::Function),
                Token::Extern => self.parser.parse_extern().map(ASTNode::Extern),
                _ => self.parser.parse_top_level_expr().map(ASTNode::Function),
            };
            self.handle(result)?;
            self.prompt()?;
        }

        let summary = Summary {
            parsed: self.parsed,
            errors: self.diagnostics.reported(),
        };
        info!(
            "end of input: {} items parsed, {} errors",
            summary.parsed, summary.errors
        );
        self.out.flush()?;
        Ok(summary)
    }
}

/// writes one token per line and returns how many were written
pub fn print_tokens<I: Iterator<Item = char>, O: Write>(input: I, mut out: O) -> io::Result<usize> {
    let mut count = 0;
    for token in Lexer::new(input) {
        writeln!(out, "{}", token)?;
        count += 1;
    }
    writeln!(out, "{}", Token::Eof)?;
    Ok(count)
}
