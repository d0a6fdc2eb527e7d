// SPDX-License-Identifier: GPL-2.0-only

//
// Compiler diagnostics
//

use std::fmt::{Display,Formatter};
use std::path::PathBuf;
use std::process::ExitStatus;
use std::rc::Rc;
use thiserror::Error;

/// Line and column of a character in the source file (both start at 1)
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(line: usize, col: usize) -> Pos {
        Pos {
            line: line,
            col: col,
        }
    }
}

impl Display for Pos {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}:{}", self.line, self.col)
    }
}

// Quote a source byte, leaving out the glyph of non-ASCII ones
fn show_byte(byte: u8) -> String {
    if byte.is_ascii() {
        format!("'{}' (ASCII #{})", char::from(byte), byte)
    } else {
        format!("(ASCII #{})", byte)
    }
}

//
// Every way a compilation can fail
//

#[derive(Clone,Debug,Error,PartialEq,Eq)]
pub enum ErrorKind {
    // Lexical errors
    #[error("illegal character {}", show_byte(*.0))]
    IllegalCharacter(u8),
    #[error("identifier too long")]
    IdentifierTooLong,
    #[error("number too large")]
    NumberTooLarge,
    #[error("string not closed")]
    StringNotClosed,
    #[error("illegal escape code '\\{}' in string", char::from(*.0))]
    IllegalEscape(u8),
    #[error("non-printable character (ASCII #{0}) in string")]
    NonPrintable(u8),
    #[error("comment not closed")]
    CommentNotClosed,

    // Syntax errors
    #[error("expected {expected}, but found {found}")]
    Expected { expected: &'static str, found: String },

    // Semantic errors
    #[error("multiple definition of '{0}'")]
    MultipleDefinition(Rc<str>),
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(Rc<str>),
    #[error("'{0}' is not a function")]
    NotAFunction(Rc<str>),
    #[error("'{0}' is not a procedure")]
    NotAProcedure(Rc<str>),
    #[error("'{0}' is not a variable")]
    NotAVariable(Rc<str>),
    #[error("'{0}' is not an array")]
    NotAnArray(Rc<str>),
    #[error("expected scalar variable instead of '{0}'")]
    ScalarExpected(Rc<str>),
    #[error("too few arguments for call to '{0}'")]
    TooFewArguments(Rc<str>),
    #[error("too many arguments for call to '{0}'")]
    TooManyArguments(Rc<str>),
    #[error("{0} is an illegal array operation")]
    IllegalArrayOperation(String),
    #[error("incompatible types (expected {expected}, found {found}) {context}")]
    IncompatibleTypes { expected: String, found: String, context: String },
    #[error("a return expression is not allowed for a procedure")]
    ReturnNotAllowed,
    #[error("missing return expression for a function")]
    MissingReturn,
}

/// A fatal diagnostic tied to the source position where it was detected
#[derive(Clone,Debug,Error,PartialEq,Eq)]
#[error("{pos}: {kind}")]
pub struct Error {
    pub pos: Pos,
    pub kind: ErrorKind,
}

impl Error {
    pub fn new(pos: Pos, kind: ErrorKind) -> Error {
        Error {
            pos: pos,
            kind: kind,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//
// Failures of the environment around a compilation
//

#[derive(Debug,Error)]
pub enum DriverError {
    #[error("file '{}' could not be opened: {source}", .path.display())]
    Open { path: PathBuf, source: std::io::Error },
    #[error("file '{}' could not be written: {source}", .path.display())]
    Write { path: PathBuf, source: std::io::Error },
    #[error("no Jasmin jar given (use --jasmin or set JASMIN_JAR)")]
    MissingJasmin,
    #[error("could not run the assembler: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("assembler failed ({0})")]
    Assembler(ExitStatus),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{file}:{err}")]
    Compile { file: String, err: Error },
}
