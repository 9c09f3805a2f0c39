//! Recursive descent parser for statement text.

use crate::error::ParseError;
use crate::lexer::{tokenize, SpannedToken, Token};

/// What a `SELECT` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// `SELECT *`
    All,
    /// `SELECT COUNT(*)`
    Count,
}

/// A parsed statement. Every value position is a `?` marker; the listed
/// columns are bound to parameters in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `USE keyspace`
    Use { keyspace: String },
    /// `INSERT INTO t (a, b) VALUES (?, ?)`
    Insert { table: String, columns: Vec<String> },
    /// `SELECT * | COUNT(*) FROM t [WHERE ...] [LIMIT n] [ALLOW FILTERING]`
    Select {
        table: String,
        projection: Projection,
        filter: Vec<String>,
        limit: Option<usize>,
        allow_filtering: bool,
    },
    /// `UPDATE t SET a = ?, b = ? WHERE ...`
    Update {
        table: String,
        set: Vec<String>,
        filter: Vec<String>,
    },
    /// `DELETE FROM t WHERE ...`
    Delete { table: String, filter: Vec<String> },
}

impl Command {
    /// Number of `?` markers the statement expects.
    pub fn markers(&self) -> usize {
        match self {
            Command::Use { .. } => 0,
            Command::Insert { columns, .. } => columns.len(),
            Command::Select { filter, .. } | Command::Delete { filter, .. } => filter.len(),
            Command::Update { set, filter, .. } => set.len() + filter.len(),
        }
    }
}

/// Parse one statement.
pub fn parse(source: &str) -> Result<Command, ParseError> {
    Parser::new(source)?.parse_statement()
}

/// Parser over a token buffer.
struct Parser<'source> {
    source: &'source str,
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl<'source> Parser<'source> {
    fn new(source: &'source str) -> Result<Self, ParseError> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    fn parse_statement(&mut self) -> Result<Command, ParseError> {
        let tok = self.next_token()?;
        let command = match tok.token {
            Token::Use => Command::Use {
                keyspace: self.expect_ident()?,
            },
            Token::Insert => self.parse_insert()?,
            Token::Select => self.parse_select()?,
            Token::Update => self.parse_update()?,
            Token::Delete => self.parse_delete()?,
            other => {
                return Err(ParseError::new(
                    format!("expected a statement, found {:?}", other),
                    tok.span,
                ))
            }
        };

        self.eat(&Token::Semicolon);
        if let Some(extra) = self.peek() {
            return Err(ParseError::new(
                format!("unexpected trailing {:?}", extra.token),
                extra.span.clone(),
            ));
        }
        Ok(command)
    }

    fn parse_insert(&mut self) -> Result<Command, ParseError> {
        self.expect_token(Token::Into)?;
        let table = self.parse_table()?;

        self.expect_token(Token::LParen)?;
        let mut columns = vec![self.expect_ident()?];
        while self.eat(&Token::Comma) {
            columns.push(self.expect_ident()?);
        }
        self.expect_token(Token::RParen)?;

        self.expect_token(Token::Values)?;
        let open = self.expect_token(Token::LParen)?;
        let mut markers = 1;
        self.expect_token(Token::Marker)?;
        while self.eat(&Token::Comma) {
            self.expect_token(Token::Marker)?;
            markers += 1;
        }
        self.expect_token(Token::RParen)?;

        if markers != columns.len() {
            return Err(ParseError::new(
                format!("{} columns but {} values", columns.len(), markers),
                open.span,
            ));
        }
        Ok(Command::Insert { table, columns })
    }

    fn parse_select(&mut self) -> Result<Command, ParseError> {
        let projection = if self.eat(&Token::Star) {
            Projection::All
        } else {
            self.expect_token(Token::Count)?;
            self.expect_token(Token::LParen)?;
            self.expect_token(Token::Star)?;
            self.expect_token(Token::RParen)?;
            Projection::Count
        };

        self.expect_token(Token::From)?;
        let table = self.parse_table()?;
        let filter = self.parse_where(false)?;

        let limit = if self.eat(&Token::Limit) {
            let tok = self.next_token()?;
            match tok.token {
                Token::Int(n) => Some(usize::try_from(n).map_err(|_| {
                    ParseError::new("limit is too large", tok.span.clone())
                })?),
                other => {
                    return Err(ParseError::new(
                        format!("expected integer, found {:?}", other),
                        tok.span,
                    ))
                }
            }
        } else {
            None
        };

        let allow_filtering = if self.eat(&Token::Allow) {
            self.expect_token(Token::Filtering)?;
            true
        } else {
            false
        };

        Ok(Command::Select {
            table,
            projection,
            filter,
            limit,
            allow_filtering,
        })
    }

    fn parse_update(&mut self) -> Result<Command, ParseError> {
        let table = self.parse_table()?;
        self.expect_token(Token::Set)?;

        let mut set = vec![self.parse_assignment()?];
        while self.eat(&Token::Comma) {
            set.push(self.parse_assignment()?);
        }

        let filter = self.parse_where(true)?;
        Ok(Command::Update { table, set, filter })
    }

    fn parse_delete(&mut self) -> Result<Command, ParseError> {
        self.expect_token(Token::From)?;
        let table = self.parse_table()?;
        let filter = self.parse_where(true)?;
        Ok(Command::Delete { table, filter })
    }

    /// `[WHERE col = ? (AND col = ?)*]`
    fn parse_where(&mut self, required: bool) -> Result<Vec<String>, ParseError> {
        if !self.eat(&Token::Where) {
            if required {
                let span = self.peek_span();
                return Err(ParseError::new("expected WHERE clause", span));
            }
            return Ok(Vec::new());
        }

        let mut filter = vec![self.parse_assignment()?];
        while self.eat(&Token::And) {
            filter.push(self.parse_assignment()?);
        }
        Ok(filter)
    }

    /// `col = ?`
    fn parse_assignment(&mut self) -> Result<String, ParseError> {
        let column = self.expect_ident()?;
        self.expect_token(Token::Eq)?;
        self.expect_token(Token::Marker)?;
        Ok(column)
    }

    /// `table` or `keyspace.table`
    fn parse_table(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_ident()?;
        if self.eat(&Token::Dot) {
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Ok(name)
    }

    /// Expect an identifier; keywords are accepted by their source text.
    fn expect_ident(&mut self) -> Result<String, ParseError> {
        let tok = self.next_token()?;
        match tok.token {
            Token::Ident(name) => Ok(name),
            ref keyword if keyword.is_keyword() => Ok(self.source[tok.span].to_string()),
            other => Err(ParseError::new(
                format!("expected identifier, found {:?}", other),
                tok.span,
            )),
        }
    }

    /// Expect and consume a specific token.
    fn expect_token(&mut self, expected: Token) -> Result<SpannedToken, ParseError> {
        let tok = self.next_token()?;
        if std::mem::discriminant(&tok.token) == std::mem::discriminant(&expected) {
            Ok(tok)
        } else {
            Err(ParseError::new(
                format!("expected {:?}, found {:?}", expected, tok.token),
                tok.span,
            ))
        }
    }

    /// Consume the next token if it matches.
    fn eat(&mut self, expected: &Token) -> bool {
        match self.peek() {
            Some(tok) if &tok.token == expected => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn peek_span(&self) -> std::ops::Range<usize> {
        self.peek()
            .map(|tok| tok.span.clone())
            .unwrap_or(self.source.len()..self.source.len())
    }

    /// Get the next token or error if EOF.
    fn next_token(&mut self) -> Result<SpannedToken, ParseError> {
        let tok = self.tokens.get(self.pos).cloned().ok_or_else(|| {
            ParseError::new(
                "unexpected end of input",
                self.source.len()..self.source.len(),
            )
        })?;
        self.pos += 1;
        Ok(tok)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_insert() {
        let cmd = parse("INSERT INTO app.users (id, email) VALUES (?, ?)").unwrap();
        assert_eq!(
            cmd,
            Command::Insert {
                table: "app.users".into(),
                columns: vec!["id".into(), "email".into()],
            }
        );
        assert_eq!(cmd.markers(), 2);
    }

    #[test]
    fn test_parse_select() {
        let cmd = parse("SELECT * FROM users WHERE email = ? AND name = ? LIMIT 1 ALLOW FILTERING")
            .unwrap();
        assert_eq!(
            cmd,
            Command::Select {
                table: "users".into(),
                projection: Projection::All,
                filter: vec!["email".into(), "name".into()],
                limit: Some(1),
                allow_filtering: true,
            }
        );

        let count = parse("SELECT COUNT(*) FROM users;").unwrap();
        assert_eq!(
            count,
            Command::Select {
                table: "users".into(),
                projection: Projection::Count,
                filter: vec![],
                limit: None,
                allow_filtering: false,
            }
        );
    }

    #[test]
    fn test_parse_update_and_delete() {
        let cmd = parse("UPDATE users SET name = ?, count = ? WHERE id = ?").unwrap();
        assert_eq!(
            cmd,
            Command::Update {
                table: "users".into(),
                set: vec!["name".into(), "count".into()],
                filter: vec!["id".into()],
            }
        );
        assert_eq!(cmd.markers(), 3);

        let cmd = parse("DELETE FROM users WHERE id = ?").unwrap();
        assert_eq!(
            cmd,
            Command::Delete {
                table: "users".into(),
                filter: vec!["id".into()],
            }
        );
    }

    #[test]
    fn test_parse_use() {
        assert_eq!(
            parse("USE app").unwrap(),
            Command::Use {
                keyspace: "app".into()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("INSERT INTO t (a, b) VALUES (?)").is_err());
        assert!(parse("DELETE FROM t").is_err());
        assert!(parse("UPDATE t SET a = 1 WHERE id = ?").is_err());
        assert!(parse("SELECT * FROM t LIMIT 1 extra").is_err());

        let err = parse("SELECT * users").unwrap_err();
        assert_eq!(err.span, 9..14);
    }
}
