//! The Go-subset syntax layer: tree model, lexer, parser and printer.
mod lexer;
mod node;
mod parser;
mod pos;
mod printer;
mod token;

pub use lexer::{scan, RawComment, Scanned, Token};
pub use node::{Class, FieldDef, FieldType, Kind, Node, Value, Width};
pub use parser::{Fragment, FragmentBody, ParseOption, Parser};
pub use pos::{Lines, Pos, Region, SourceFile};
pub use printer::{print_file, print_value, PrintOption};
pub use token::{lookup_keyword, Tok};

use std::fmt;

/// A lexing or parsing failure at a position of the parsed text.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntaxError {
    pub pos: Pos,
    pub message: String,
}

impl SyntaxError {
    pub fn new(pos: Pos, message: impl Into<String>) -> Self {
        Self {
            pos,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SyntaxError {}
