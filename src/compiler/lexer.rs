//! Tokenizer for schema files
//!
//! `///` lines are doc comments and become tokens; `//` and `#` start
//! ordinary comments that run to the end of the line.

use crate::error::{Position, SchemaError};
use crate::value::unescape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tok {
    /// Letters, digits, `_`, `-` and inner `.`, starting with a letter or `_`
    Ident(String),
    /// Numeric literal text, sign included
    Number(String),
    /// Unescaped contents of a `"..."` literal
    Str(String),
    Doc(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Semi,
    Comma,
    Eq,
    DotDot,
    Question,
    Star,
    Plus,
    Eof,
}

impl Tok {
    pub fn describe(&self) -> String {
        match self {
            Tok::Ident(s) => format!("`{}`", s),
            Tok::Number(s) => format!("number `{}`", s),
            Tok::Str(s) => format!("string {:?}", s),
            Tok::Doc(_) => "doc comment".to_string(),
            Tok::LBrace => "`{`".to_string(),
            Tok::RBrace => "`}`".to_string(),
            Tok::LBracket => "`[`".to_string(),
            Tok::RBracket => "`]`".to_string(),
            Tok::LParen => "`(`".to_string(),
            Tok::RParen => "`)`".to_string(),
            Tok::Colon => "`:`".to_string(),
            Tok::Semi => "`;`".to_string(),
            Tok::Comma => "`,`".to_string(),
            Tok::Eq => "`=`".to_string(),
            Tok::DotDot => "`..`".to_string(),
            Tok::Question => "`?`".to_string(),
            Tok::Star => "`*`".to_string(),
            Tok::Plus => "`+`".to_string(),
            Tok::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub tok: Tok,
    pub position: Position,
}

/// Tokenize a whole schema source
pub fn tokenize(src: &str) -> Result<Vec<Spanned>, SchemaError> {
    let mut lexer = SchemaLexer {
        chars: src.chars().collect(),
        index: 0,
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.tok == Tok::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct SchemaLexer {
    chars: Vec<char>,
    index: usize,
    line: u32,
    column: u32,
}

impl SchemaLexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.index + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn syntax(message: impl Into<String>, position: Position) -> SchemaError {
        SchemaError::Syntax {
            message: message.into(),
            position,
        }
    }

    fn rest_of_line(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.bump();
        }
        text
    }

    fn next_token(&mut self) -> Result<Spanned, SchemaError> {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            }
            let position = self.position();

            let Some(c) = self.peek() else {
                return Ok(Spanned { tok: Tok::Eof, position });
            };

            let tok = match c {
                '/' if self.peek_at(1) == Some('/') => {
                    self.bump();
                    self.bump();
                    if self.peek() == Some('/') && self.peek_at(1) != Some('/') {
                        self.bump();
                        let text = self.rest_of_line();
                        Tok::Doc(text.strip_prefix(' ').unwrap_or(&text).trim_end().to_string())
                    } else {
                        self.rest_of_line();
                        continue;
                    }
                }
                '#' => {
                    self.rest_of_line();
                    continue;
                }
                '"' => self.string(position)?,
                '.' if self.peek_at(1) == Some('.') => {
                    self.bump();
                    self.bump();
                    Tok::DotDot
                }
                '-' | '+' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => self.number(),
                '-' | '+' if self.at_signed_inf() => {
                    let text: String = (0..4).filter_map(|_| self.bump()).collect();
                    Tok::Number(text)
                }
                c if c.is_ascii_digit() => self.number(),
                c if c.is_alphabetic() || c == '_' => self.ident(),
                _ => {
                    self.bump();
                    match c {
                        '{' => Tok::LBrace,
                        '}' => Tok::RBrace,
                        '[' => Tok::LBracket,
                        ']' => Tok::RBracket,
                        '(' => Tok::LParen,
                        ')' => Tok::RParen,
                        ':' => Tok::Colon,
                        ';' => Tok::Semi,
                        ',' => Tok::Comma,
                        '=' => Tok::Eq,
                        '?' => Tok::Question,
                        '*' => Tok::Star,
                        '+' => Tok::Plus,
                        other => {
                            return Err(Self::syntax(format!("unexpected character `{}`", other), position));
                        }
                    }
                }
            };
            return Ok(Spanned { tok, position });
        }
    }

    fn at_signed_inf(&self) -> bool {
        self.peek_at(1) == Some('i')
            && self.peek_at(2) == Some('n')
            && self.peek_at(3) == Some('f')
            && !self.peek_at(4).is_some_and(is_ident_char)
    }

    fn ident(&mut self) -> Tok {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            // `.` only between name characters, so `inf..` still lexes as a range
            let dotted = c == '.' && self.peek_at(1).is_some_and(|n| n.is_alphanumeric() || n == '_');
            if is_ident_char(c) || dotted {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Tok::Ident(text)
    }

    fn number(&mut self) -> Tok {
        let mut text = String::new();
        if let Some(sign @ ('-' | '+')) = self.peek() {
            text.push(sign);
            self.bump();
        }
        self.digits(&mut text);
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
            text.push('.');
            self.bump();
            self.digits(&mut text);
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('-' | '+'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|d| d.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(c) = self.bump() {
                        text.push(c);
                    }
                }
                self.digits(&mut text);
            }
        }
        Tok::Number(text)
    }

    fn digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                if c != '_' {
                    text.push(c);
                }
                self.bump();
            } else {
                break;
            }
        }
    }

    fn string(&mut self, start: Position) -> Result<Tok, SchemaError> {
        self.bump();
        let mut text = String::new();
        loop {
            let here = self.position();
            match self.bump() {
                None | Some('\n') => return Err(Self::syntax("unterminated string literal", start)),
                Some('"') => return Ok(Tok::Str(text)),
                Some('\\') => {
                    let escaped = self
                        .bump()
                        .ok_or_else(|| Self::syntax("unterminated string literal", start))?;
                    let c = unescape(escaped).ok_or_else(|| {
                        Self::syntax(format!("invalid escape sequence `\\{}`", escaped), here)
                    })?;
                    text.push(c);
                }
                Some(c) => text.push(c),
            }
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}
