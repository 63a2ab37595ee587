//! lexer and parser front end for the kaleidoscope toy language

pub mod ast;
pub mod diagnostic;
pub mod driver;
pub mod lexer;
pub mod parser;
pub mod precedence;
