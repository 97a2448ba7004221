//! Tokenizer for the tag format
//!
//! Comments are `|| ...` to the end of the line and `|# ... #|` across lines.
//! They are only recognized at the start of a token. The [`Iterator`]
//! implementation drops them; [`Lexer::next_raw`] keeps them.
//!
//! After an error the lexer has already moved past the offending text, so
//! pulling the next token resumes scanning from there.

use crate::error::{FormatError, FormatErrorKind, Position};
use crate::tree::is_identifier;
use crate::value::unescape;

/// Token kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Open,
    Close,
    Identifier(String),
    /// Unescaped contents of a `"..."` string
    QuotedString(String),
    BareToken(String),
    Comment(String),
    EndOfInput,
}

impl TokenKind {
    /// Text of a token usable as a scalar value
    pub fn scalar_text(&self) -> Option<&str> {
        match self {
            TokenKind::Identifier(s) | TokenKind::QuotedString(s) | TokenKind::BareToken(s) => {
                Some(s)
            }
            _ => None,
        }
    }

    /// Description for error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Open => "`{`".to_string(),
            TokenKind::Close => "`}`".to_string(),
            TokenKind::Identifier(s) | TokenKind::BareToken(s) => format!("`{}`", s),
            TokenKind::QuotedString(s) => format!("string {:?}", s),
            TokenKind::Comment(_) => "comment".to_string(),
            TokenKind::EndOfInput => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

/// Lazy tokenizer over a source string
pub struct Lexer<'a> {
    src: &'a str,
    offset: usize,
    line: u32,
    column: u32,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            offset: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Current location in the source
    pub fn location(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(kind: FormatErrorKind, position: Position) -> FormatError {
        FormatError::new(kind, position)
    }

    /// Next token, comments included. Returns `EndOfInput` repeatedly once
    /// the source is exhausted.
    pub fn next_raw(&mut self) -> Result<Token, FormatError> {
        self.skip_whitespace();
        let position = self.location();
        let rest = self.rest();

        let kind = if rest.is_empty() {
            TokenKind::EndOfInput
        } else if rest.starts_with("||") {
            self.line_comment()
        } else if rest.starts_with("|#") {
            self.block_comment(position)?
        } else {
            match self.peek() {
                Some('{') => {
                    self.bump();
                    TokenKind::Open
                }
                Some('}') => {
                    self.bump();
                    TokenKind::Close
                }
                Some('"') => self.quoted(position)?,
                _ => self.bare(),
            }
        };

        Ok(Token { kind, position })
    }

    /// Next token the parser cares about
    pub fn next_token(&mut self) -> Result<Token, FormatError> {
        loop {
            let token = self.next_raw()?;
            if !matches!(token.kind, TokenKind::Comment(_)) {
                return Ok(token);
            }
        }
    }

    fn line_comment(&mut self) -> TokenKind {
        self.bump();
        self.bump();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.bump();
        }
        TokenKind::Comment(text.trim().to_string())
    }

    fn block_comment(&mut self, start: Position) -> Result<TokenKind, FormatError> {
        self.bump();
        self.bump();
        let mut text = String::new();
        loop {
            if self.rest().starts_with("#|") {
                self.bump();
                self.bump();
                return Ok(TokenKind::Comment(text.trim().to_string()));
            }
            match self.bump() {
                Some(c) => text.push(c),
                None => return Err(Self::error(FormatErrorKind::UnterminatedComment, start)),
            }
        }
    }

    fn quoted(&mut self, start: Position) -> Result<TokenKind, FormatError> {
        self.bump();
        let mut text = String::new();
        let mut first_error = None;

        loop {
            let here = self.location();
            match self.bump() {
                None | Some('\n') => {
                    return Err(Self::error(FormatErrorKind::UnterminatedQuote, start));
                }
                Some('"') => break,
                Some('\\') => match self.bump() {
                    None | Some('\n') => {
                        return Err(Self::error(FormatErrorKind::UnterminatedQuote, start));
                    }
                    Some(escaped) => match unescape(escaped) {
                        Some(c) => text.push(c),
                        None => {
                            // keep scanning to the closing quote so the
                            // next token starts after this string
                            first_error.get_or_insert_with(|| {
                                Self::error(FormatErrorKind::InvalidEscape(escaped), here)
                            });
                        }
                    },
                },
                Some(c) => text.push(c),
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(TokenKind::QuotedString(text)),
        }
    }

    fn bare(&mut self) -> TokenKind {
        let start = self.offset;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | '"') {
                break;
            }
            self.bump();
        }
        let text = self.src[start..self.offset].to_string();
        if is_identifier(&text) {
            TokenKind::Identifier(text)
        } else {
            TokenKind::BareToken(text)
        }
    }
}

/// Significant tokens, ending with a single `EndOfInput`
impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        if matches!(&result, Ok(Token { kind: TokenKind::EndOfInput, .. })) {
            self.finished = true;
        }
        Some(result)
    }
}

/// Tokenize a whole source, stopping at the first error
pub fn tokenize(src: &str) -> Result<Vec<Token>, FormatError> {
    Lexer::new(src).collect()
}

/// Comments in a source. Formatting a document drops them.
pub fn comments(src: &str) -> Result<Vec<Token>, FormatError> {
    let mut lexer = Lexer::new(src);
    let mut found = Vec::new();
    loop {
        let token = lexer.next_raw()?;
        match token.kind {
            TokenKind::EndOfInput => return Ok(found),
            TokenKind::Comment(_) => found.push(token),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("{server {port 8080} \"local host\"}"),
            vec![
                TokenKind::Open,
                TokenKind::Identifier("server".to_string()),
                TokenKind::Open,
                TokenKind::Identifier("port".to_string()),
                TokenKind::BareToken("8080".to_string()),
                TokenKind::Close,
                TokenKind::QuotedString("local host".to_string()),
                TokenKind::Close,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let src = "|| leading comment\n{a |# block\n comment #| 1} || trailing";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Open,
                TokenKind::Identifier("a".to_string()),
                TokenKind::BareToken("1".to_string()),
                TokenKind::Close,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_next_raw_keeps_comments() {
        let mut lexer = Lexer::new("|| note\n{");
        assert_eq!(lexer.next_raw().unwrap().kind, TokenKind::Comment("note".to_string()));
        assert_eq!(lexer.next_raw().unwrap().kind, TokenKind::Open);
    }

    #[test]
    fn test_comments_collects_only_comments() {
        let found = comments("|| one\n{a \"|| quoted\" |# two #|}").unwrap();
        let texts: Vec<&TokenKind> = found.iter().map(|t| &t.kind).collect();
        assert_eq!(
            texts,
            vec![&TokenKind::Comment("one".to_string()), &TokenKind::Comment("two".to_string())]
        );
        assert_eq!(found[1].position, Position::new(2, 16));
        assert!(comments("{a b}").unwrap().is_empty());
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("{a\n  {b}}").unwrap();
        assert_eq!(tokens[0].position, Position::new(1, 1));
        assert_eq!(tokens[2].position, Position::new(2, 3));
        assert_eq!(tokens[3].position, Position::new(2, 4));

        let mut lexer = Lexer::new("{a\n b");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        assert_eq!(lexer.location(), Position::new(1, 3));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(
            kinds(r#""a\"b\\c\nd""#)[0],
            TokenKind::QuotedString("a\"b\\c\nd".to_string())
        );
    }

    #[test]
    fn test_quote_ends_bare_token() {
        assert_eq!(
            kinds("abc\"def\""),
            vec![
                TokenKind::Identifier("abc".to_string()),
                TokenKind::QuotedString("def".to_string()),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_unterminated_quote() {
        let err = tokenize("{a \"open\n}").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::UnterminatedQuote);
        assert_eq!(err.position, Some(Position::new(1, 4)));

        let err = tokenize("|# never closed").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::UnterminatedComment);
    }

    #[test]
    fn test_restart_after_error() {
        let mut lexer = Lexer::new("\"bad \\q escape\" next");
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::InvalidEscape('q'));
        assert_eq!(
            lexer.next_token().unwrap().kind,
            TokenKind::Identifier("next".to_string())
        );
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EndOfInput);
    }

    #[test]
    fn test_iterator_ends_after_end_of_input() {
        let mut lexer = Lexer::new("x");
        assert!(lexer.next().is_some());
        assert!(matches!(lexer.next(), Some(Ok(Token { kind: TokenKind::EndOfInput, .. }))));
        assert!(lexer.next().is_none());
    }
}
