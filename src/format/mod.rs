//! The tag text format
//!
//! - [`lexer`]: tokens, comments, quoted strings
//! - [`parser`]: text to [`TagNode`](crate::TagNode)
//! - [`writer`]: [`TagNode`](crate::TagNode) to text
//!
//! For every tree the parser produces, `parse(write(tree)) == tree`.

pub mod lexer;
pub mod parser;
pub mod writer;

pub use lexer::{comments, Lexer, Token, TokenKind};
pub use parser::{parse_document, parse_document_with, parse_file, parse_reader, ParserConfig};
pub use writer::{write_document, write_document_with, write_file, write_to, IndentStyle, WriterConfig};
