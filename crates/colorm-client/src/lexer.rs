//! Lexer for the statement subset understood by [`MemoryStore`](crate::MemoryStore).

use std::ops::Range;

use logos::Logos;

use crate::error::ParseError;

/// Token types for statement text.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // Statement keywords
    #[token("select", ignore(ascii_case))]
    Select,
    #[token("insert", ignore(ascii_case))]
    Insert,
    #[token("update", ignore(ascii_case))]
    Update,
    #[token("delete", ignore(ascii_case))]
    Delete,
    #[token("use", ignore(ascii_case))]
    Use,

    // Clause keywords
    #[token("into", ignore(ascii_case))]
    Into,
    #[token("values", ignore(ascii_case))]
    Values,
    #[token("from", ignore(ascii_case))]
    From,
    #[token("set", ignore(ascii_case))]
    Set,
    #[token("where", ignore(ascii_case))]
    Where,
    #[token("and", ignore(ascii_case))]
    And,
    #[token("limit", ignore(ascii_case))]
    Limit,
    #[token("allow", ignore(ascii_case))]
    Allow,
    #[token("filtering", ignore(ascii_case))]
    Filtering,
    #[token("count", ignore(ascii_case))]
    Count,

    // Identifier
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Integer literal
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    Int(u64),

    // Punctuation
    #[token("?")]
    Marker,
    #[token("*")]
    Star,
    #[token("=")]
    Eq,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semicolon,
}

impl Token {
    /// Keywords double as identifiers in column and table positions.
    pub fn is_keyword(&self) -> bool {
        !matches!(
            self,
            Token::Ident(_)
                | Token::Int(_)
                | Token::Marker
                | Token::Star
                | Token::Eq
                | Token::Dot
                | Token::Comma
                | Token::LParen
                | Token::RParen
                | Token::Semicolon
        )
    }
}

/// A token with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Range<usize>,
}

/// Tokenize statement text. Unrecognized input is an error.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ParseError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(SpannedToken {
                token,
                span: lexer.span(),
            }),
            Err(()) => {
                return Err(ParseError::new(
                    format!("unexpected input '{}'", lexer.slice()),
                    lexer.span(),
                ))
            }
        }
    }

    Ok(tokens)
}
