// SPDX-License-Identifier: GPL-2.0-only

//
// Lexical analyzer
//

use crate::error::{Error,ErrorKind,Pos,Result};
use std::fmt::{Display,Formatter};
use std::rc::Rc;

/// Longest identifier accepted by the scanner
pub const MAX_ID_LENGTH: usize = 32;

/// Initial capacity of a string literal buffer
const INITIAL_STRING_LEN: usize = 1024;

#[derive(Clone,Debug,PartialEq,Eq)]
pub enum Tok {
    // Reserved words
    And,
    Array,
    Begin,
    Boolean,
    Call,
    Do,
    Else,
    Elsif,
    End,
    False,
    Function,
    Get,
    If,
    Integer,
    Leave,
    Not,
    Or,
    Put,
    Relax,
    Rem,
    Source,
    Then,
    To,
    True,
    While,

    // Operators
    Eq,        // =
    Ge,        // >=
    Gt,        // >
    Le,        // <=
    Lt,        // <
    Ne,        // <>
    Minus,     // -
    Plus,      // +
    Div,       // /
    Mul,       // *
    Gets,      // :=
    Concat,    // .

    // Punctuation
    LSq,       // [
    RSq,       // ]
    LParen,    // (
    RParen,    // )
    Comma,     // ,
    Semicolon, // ;

    // Values
    Ident(Rc<str>),
    Number(i32),
    Str(Rc<str>),

    Eof,
}

// Sorted for binary search
const RESERVED: [(&str, Tok); 25] = [
    ("and",         Tok::And),
    ("array",       Tok::Array),
    ("begin",       Tok::Begin),
    ("boolean",     Tok::Boolean),
    ("call",        Tok::Call),
    ("do",          Tok::Do),
    ("else",        Tok::Else),
    ("elsif",       Tok::Elsif),
    ("end",         Tok::End),
    ("false",       Tok::False),
    ("function",    Tok::Function),
    ("get",         Tok::Get),
    ("if",          Tok::If),
    ("integer",     Tok::Integer),
    ("leave",       Tok::Leave),
    ("not",         Tok::Not),
    ("or",          Tok::Or),
    ("put",         Tok::Put),
    ("relax",       Tok::Relax),
    ("rem",         Tok::Rem),
    ("source",      Tok::Source),
    ("then",        Tok::Then),
    ("to",          Tok::To),
    ("true",        Tok::True),
    ("while",       Tok::While),
];

impl Tok {
    /// Human readable description used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            Tok::Ident(_) => "identifier".to_string(),
            Tok::Number(_) => "number".to_string(),
            Tok::Str(_) => "string".to_string(),
            Tok::Eof => "end-of-file".to_string(),
            tok => format!("'{}'", tok),
        }
    }

    /// Like describe, but spelling out the value of literals and names
    pub fn describe_value(&self) -> String {
        match self {
            Tok::Ident(_) | Tok::Number(_) | Tok::Str(_) => format!("{} {}", self.describe(), self),
            Tok::Eof => self.describe(),
            tok => tok.to_string(),
        }
    }
}

impl Display for Tok {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some((word, _)) = RESERVED.iter().find(|(_, tok)| tok == self) {
            return write!(fmt, "{}", word);
        }
        match self {
            Tok::Eq => write!(fmt, "="),
            Tok::Ge => write!(fmt, ">="),
            Tok::Gt => write!(fmt, ">"),
            Tok::Le => write!(fmt, "<="),
            Tok::Lt => write!(fmt, "<"),
            Tok::Ne => write!(fmt, "<>"),
            Tok::Minus => write!(fmt, "-"),
            Tok::Plus => write!(fmt, "+"),
            Tok::Div => write!(fmt, "/"),
            Tok::Mul => write!(fmt, "*"),
            Tok::Gets => write!(fmt, ":="),
            Tok::Concat => write!(fmt, "."),
            Tok::LSq => write!(fmt, "["),
            Tok::RSq => write!(fmt, "]"),
            Tok::LParen => write!(fmt, "("),
            Tok::RParen => write!(fmt, ")"),
            Tok::Comma => write!(fmt, ","),
            Tok::Semicolon => write!(fmt, ";"),
            Tok::Ident(s) => write!(fmt, "{}", s),
            Tok::Number(val) => write!(fmt, "{}", val),
            Tok::Str(s) => write!(fmt, "{:?}", s),
            Tok::Eof => write!(fmt, "<eof>"),
            _ => unreachable!(),
        }
    }
}

#[derive(Clone,Debug,PartialEq,Eq)]
pub struct Token {
    pub tok: Tok,
    pub pos: Pos,
}

pub struct Lexer<'a> {
    data: &'a [u8],
    // Position of data[0]
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a str) -> Lexer<'a> {
        Lexer {
            data: data.as_bytes(),
            line: 1,
            col: 1,
        }
    }

    /// Position of the next unconsumed character
    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }

    fn look(&self, i: usize) -> Option<u8> {
        self.data.get(i).cloned()
    }

    fn eat(&mut self, n: usize) {
        for &byte in &self.data[..n] {
            if byte == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        self.data = &self.data[n..]
    }

    fn skip_comment(&mut self) -> Result<()> {
        // Opening positions of the comments still open
        let mut open = vec![self.pos()];
        self.eat(1);
        while let Some(&start) = open.last() {
            match self.look(0) {
                Some(b'{') => {
                    open.push(self.pos());
                    self.eat(1);
                },
                Some(b'}') => {
                    open.pop();
                    self.eat(1);
                },
                Some(_) => self.eat(1),
                None => return Err(Error::new(start, ErrorKind::CommentNotClosed)),
            }
        }
        Ok(())
    }

    fn word(&mut self, start: Pos) -> Result<Tok> {
        let mut len = 0;
        while let Some(b'_' | b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9') = self.look(len) {
            len += 1;
            if len > MAX_ID_LENGTH {
                return Err(Error::new(start, ErrorKind::IdentifierTooLong));
            }
        }

        // Only ASCII bytes were matched above
        let lexeme = String::from_utf8_lossy(&self.data[..len]).into_owned();
        self.eat(len);

        match RESERVED.binary_search_by(|(word, _)| (*word).cmp(lexeme.as_str())) {
            Ok(i) => Ok(RESERVED[i].1.clone()),
            Err(_) => Ok(Tok::Ident(lexeme.into())),
        }
    }

    fn number(&mut self, start: Pos) -> Result<Tok> {
        let mut val: i32 = 0;
        while let Some(byte @ b'0'..=b'9') = self.look(0) {
            let digit = (byte - b'0') as i32;
            // Reject before the multiply-add would overflow
            if val > (i32::MAX - digit) / 10 {
                return Err(Error::new(start, ErrorKind::NumberTooLarge));
            }
            val = val * 10 + digit;
            self.eat(1);
        }
        Ok(Tok::Number(val))
    }

    fn string(&mut self, start: Pos) -> Result<Tok> {
        let mut buf = String::with_capacity(INITIAL_STRING_LEN);
        self.eat(1);
        loop {
            // Double the buffer before it fills up
            if buf.len() + 1 >= buf.capacity() {
                buf.reserve_exact(buf.capacity());
            }
            match self.look(0) {
                None => return Err(Error::new(start, ErrorKind::StringNotClosed)),
                Some(b'"') => {
                    self.eat(1);
                    break;
                },
                Some(b'\\') => {
                    let pos = self.pos();
                    let ch = match self.look(1) {
                        Some(b'n') => '\n',
                        Some(b't') => '\t',
                        Some(b'"') => '"',
                        Some(b'\\') => '\\',
                        Some(byte) => return Err(Error::new(pos, ErrorKind::IllegalEscape(byte))),
                        None => return Err(Error::new(start, ErrorKind::StringNotClosed)),
                    };
                    buf.push(ch);
                    self.eat(2);
                },
                Some(byte @ b' '..=b'~') => {
                    buf.push(char::from(byte));
                    self.eat(1);
                },
                Some(byte) => return Err(Error::new(self.pos(), ErrorKind::NonPrintable(byte))),
            }
        }
        Ok(Tok::Str(buf.into()))
    }

    /// Scan the next token, or fail on the first lexical error
    pub fn next_token(&mut self) -> Result<Token> {
        let tok = loop {
            let start = self.pos();
            let tok = match self.look(0) {
                None => Tok::Eof,
                // Whitespace
                Some(b' ' | b'\n' | b'\r' | b'\t' | b'\x0b' | b'\x0c') => { self.eat(1); continue },
                // Comments
                Some(b'{') => { self.skip_comment()?; continue },
                Some(b'_' | b'a'..=b'z' | b'A'..=b'Z') => self.word(start)?,
                Some(b'0'..=b'9') => self.number(start)?,
                Some(b'"') => self.string(start)?,
                Some(b'>') => match self.look(1) {
                    Some(b'=') => { self.eat(2); Tok::Ge },
                    _          => { self.eat(1); Tok::Gt },
                },
                Some(b'<') => match self.look(1) {
                    Some(b'=') => { self.eat(2); Tok::Le },
                    Some(b'>') => { self.eat(2); Tok::Ne },
                    _          => { self.eat(1); Tok::Lt },
                },
                Some(b':') => match self.look(1) {
                    Some(b'=') => { self.eat(2); Tok::Gets },
                    _          => return Err(Error::new(start, ErrorKind::IllegalCharacter(b':'))),
                },
                Some(b'=') => { self.eat(1); Tok::Eq },
                Some(b'-') => { self.eat(1); Tok::Minus },
                Some(b'+') => { self.eat(1); Tok::Plus },
                Some(b'/') => { self.eat(1); Tok::Div },
                Some(b'*') => { self.eat(1); Tok::Mul },
                Some(b'.') => { self.eat(1); Tok::Concat },
                Some(b'[') => { self.eat(1); Tok::LSq },
                Some(b']') => { self.eat(1); Tok::RSq },
                Some(b'(') => { self.eat(1); Tok::LParen },
                Some(b')') => { self.eat(1); Tok::RParen },
                Some(b',') => { self.eat(1); Tok::Comma },
                Some(b';') => { self.eat(1); Tok::Semicolon },
                Some(byte) => return Err(Error::new(start, ErrorKind::IllegalCharacter(byte))),
            };
            break Token {
                tok: tok,
                pos: start,
            };
        };
        Ok(tok)
    }

    /// Scan the whole input, including the final end-of-file token
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let eof = token.tok == Tok::Eof;
            tokens.push(token);
            if eof {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(data: &str) -> Vec<Tok> {
        Lexer::new(data).tokenize().unwrap()
            .into_iter()
            .map(|token| token.tok)
            .collect()
    }

    fn fails(data: &str) -> Error {
        Lexer::new(data).tokenize().unwrap_err()
    }

    #[test]
    fn reserved_table_is_sorted() {
        for pair in RESERVED.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} >= {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn words() {
        assert_eq!(toks("source begin While while_ _x1 end"), vec![
            Tok::Source, Tok::Begin, Tok::Ident("While".into()),
            Tok::Ident("while_".into()), Tok::Ident("_x1".into()), Tok::End, Tok::Eof,
        ]);
        for (word, tok) in RESERVED.iter() {
            assert_eq!(toks(word), vec![tok.clone(), Tok::Eof]);
        }
    }

    #[test]
    fn identifier_length() {
        let longest = "a".repeat(MAX_ID_LENGTH);
        assert_eq!(toks(&longest), vec![Tok::Ident(longest.as_str().into()), Tok::Eof]);

        let err = fails(&format!("  {}", "b".repeat(MAX_ID_LENGTH + 1)));
        assert_eq!(err.kind, ErrorKind::IdentifierTooLong);
        assert_eq!(err.pos, Pos::new(1, 3));
    }

    #[test]
    fn operators() {
        assert_eq!(toks(">= > <= < <> = := - + / * . [ ] ( ) , ;"), vec![
            Tok::Ge, Tok::Gt, Tok::Le, Tok::Lt, Tok::Ne, Tok::Eq, Tok::Gets,
            Tok::Minus, Tok::Plus, Tok::Div, Tok::Mul, Tok::Concat, Tok::LSq,
            Tok::RSq, Tok::LParen, Tok::RParen, Tok::Comma, Tok::Semicolon, Tok::Eof,
        ]);
        assert_eq!(toks("a<>b<c"), vec![
            Tok::Ident("a".into()), Tok::Ne, Tok::Ident("b".into()), Tok::Lt,
            Tok::Ident("c".into()), Tok::Eof,
        ]);
    }

    #[test]
    fn lone_colon() {
        let err = fails("x : 1");
        assert_eq!(err.kind, ErrorKind::IllegalCharacter(b':'));
        assert_eq!(err.pos, Pos::new(1, 3));
    }

    #[test]
    fn illegal_characters() {
        for data in ["#", "}", "!", "$", "%", "&", "@", "|", "~", "`", "?", "é"].iter() {
            let err = fails(data);
            assert!(matches!(err.kind, ErrorKind::IllegalCharacter(_)), "{}", data);
        }
    }

    #[test]
    fn numbers() {
        assert_eq!(toks("0 42 007"), vec![
            Tok::Number(0), Tok::Number(42), Tok::Number(7), Tok::Eof,
        ]);
        assert_eq!(toks("2147483647"), vec![Tok::Number(i32::MAX), Tok::Eof]);

        assert_eq!(fails("2147483648").kind, ErrorKind::NumberTooLarge);
        let err = fails("x 21474836470");
        assert_eq!(err.kind, ErrorKind::NumberTooLarge);
        assert_eq!(err.pos, Pos::new(1, 3));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(toks(r#""a\tb\n\"c\\d""#), vec![
            Tok::Str("a\tb\n\"c\\d".into()), Tok::Eof,
        ]);
        assert_eq!(toks(r#""""#), vec![Tok::Str("".into()), Tok::Eof]);

        let err = fails(r#"  "ab\q""#);
        assert_eq!(err.kind, ErrorKind::IllegalEscape(b'q'));
        assert_eq!(err.pos, Pos::new(1, 6));
    }

    #[test]
    fn long_string_grows() {
        let body = "x".repeat(5000);
        assert_eq!(toks(&format!("\"{}\"", body)), vec![Tok::Str(body.as_str().into()), Tok::Eof]);
    }

    #[test]
    fn bad_strings() {
        let err = fails("\n  \"abc");
        assert_eq!(err.kind, ErrorKind::StringNotClosed);
        assert_eq!(err.pos, Pos::new(2, 3));

        assert_eq!(fails("\"ab\ncd\"").kind, ErrorKind::NonPrintable(b'\n'));
        assert_eq!(fails("\"a\x07\"").kind, ErrorKind::NonPrintable(7));
        assert_eq!(fails("\"a\\").kind, ErrorKind::StringNotClosed);
    }

    #[test]
    fn nested_comments() {
        assert_eq!(toks("{ outer { inner } still-outer } relax"), vec![Tok::Relax, Tok::Eof]);
        assert_eq!(toks("{}{{}}x"), vec![Tok::Ident("x".into()), Tok::Eof]);

        let err = fails("relax\n  { unterminated");
        assert_eq!(err.kind, ErrorKind::CommentNotClosed);
        assert_eq!(err.pos, Pos::new(2, 3));

        let err = fails("{ a { b } c { d ");
        assert_eq!(err.kind, ErrorKind::CommentNotClosed);
        assert_eq!(err.pos, Pos::new(1, 13));
    }

    #[test]
    fn positions() {
        let tokens = Lexer::new("source x\n  begin\n\tput 1 end").tokenize().unwrap();
        let pos: Vec<Pos> = tokens.iter().map(|token| token.pos).collect();
        assert_eq!(pos, vec![
            Pos::new(1, 1), Pos::new(1, 8), Pos::new(2, 3), Pos::new(3, 2),
            Pos::new(3, 6), Pos::new(3, 8), Pos::new(3, 11),
        ]);
    }

    #[test]
    fn eof_repeats() {
        let mut lex = Lexer::new("  ");
        assert_eq!(lex.next_token().unwrap().tok, Tok::Eof);
        assert_eq!(lex.next_token().unwrap().tok, Tok::Eof);
    }
}
