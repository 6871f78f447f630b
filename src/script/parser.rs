//! Script parser
//!
//! Recursive descent over the token stream produced by [`Lexer`]. Statements
//! are separated by newlines or `;`; blank lines are skipped.
//!
//! ```text
//! statement := IDENT '=' ( 'add' expr | 'freeze' )
//!            | 'add' expr | 'set' IDENT expr | 'get' IDENT | 'remove' IDENT
//!            | 'pin' IDENT | 'unpin' IDENT | 'push' expr | 'pop'
//!            | 'freeze' | 'rollback' | 'restore' IDENT | 'gc' | 'clear'
//! expr      := INT | STRING | 'null' | IDENT | '[' ( expr ( ',' expr )* )? ']'
//! ```

use super::ast::*;
use super::lexer::{LexError, Lexer, Token};
use thiserror::Error;

/// Parser error type
#[derive(Debug, Error)]
#[error("Parse error at line {}, column {}: {message}", .location.line, .location.column)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Recursive descent parser for memory scripts
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse the entire script
    pub fn parse_script(&mut self) -> Result<Script, ParseError> {
        let mut script = Script::new();

        loop {
            self.skip_separators();
            if self.is_at_end() {
                break;
            }
            let statement = self.parse_statement()?;
            script.statements.push(statement);
            self.expect_statement_end()?;
        }

        Ok(script)
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.current_location();
        let token = self.peek().clone();

        let kind = match token {
            Token::Ident(name, _) => {
                self.advance();
                self.expect_token(&Token::Eq(location), "Expected '=' after binding name")?;
                match self.peek() {
                    Token::Add(_) => {
                        self.advance();
                        StatementKind::Add {
                            target: Some(name),
                            value: self.parse_expr()?,
                        }
                    }
                    Token::Freeze(_) => {
                        self.advance();
                        StatementKind::Freeze { target: Some(name) }
                    }
                    other => {
                        return Err(ParseError {
                            message: format!("Expected 'add' or 'freeze' after '=', found {}", other),
                            location: self.current_location(),
                        })
                    }
                }
            }
            Token::Add(_) => {
                self.advance();
                StatementKind::Add {
                    target: None,
                    value: self.parse_expr()?,
                }
            }
            Token::Set(_) => {
                self.advance();
                let reference = self.expect_identifier()?;
                let value = self.parse_expr()?;
                StatementKind::Set { reference, value }
            }
            Token::Get(_) => {
                self.advance();
                StatementKind::Get {
                    reference: self.expect_identifier()?,
                }
            }
            Token::Remove(_) => {
                self.advance();
                StatementKind::Remove {
                    reference: self.expect_identifier()?,
                }
            }
            Token::Pin(_) => {
                self.advance();
                StatementKind::Pin {
                    reference: self.expect_identifier()?,
                }
            }
            Token::Unpin(_) => {
                self.advance();
                StatementKind::Unpin {
                    reference: self.expect_identifier()?,
                }
            }
            Token::Push(_) => {
                self.advance();
                StatementKind::Push {
                    value: self.parse_expr()?,
                }
            }
            Token::Pop(_) => {
                self.advance();
                StatementKind::Pop
            }
            Token::Freeze(_) => {
                self.advance();
                StatementKind::Freeze { target: None }
            }
            Token::Rollback(_) => {
                self.advance();
                StatementKind::Rollback
            }
            Token::Restore(_) => {
                self.advance();
                StatementKind::Restore {
                    snapshot: self.expect_identifier()?,
                }
            }
            Token::Gc(_) => {
                self.advance();
                StatementKind::Collect
            }
            Token::Clear(_) => {
                self.advance();
                StatementKind::Clear
            }
            other => {
                return Err(ParseError {
                    message: format!("Expected statement, found {}", other),
                    location,
                })
            }
        };

        Ok(Statement::new(kind, location))
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        match self.peek().clone() {
            Token::IntLiteral(n, _) => {
                self.advance();
                Ok(Expr::Int(n))
            }
            Token::StringLiteral(s, _) => {
                self.advance();
                Ok(Expr::Text(s))
            }
            Token::Null(_) => {
                self.advance();
                Ok(Expr::Null)
            }
            Token::Ident(name, _) => {
                self.advance();
                Ok(Expr::Var(name, location))
            }
            Token::LBracket(_) => {
                self.advance();
                let mut items = Vec::new();
                if !self.check(&Token::RBracket(location)) {
                    loop {
                        items.push(self.parse_expr()?);
                        if !self.match_token(&Token::Comma(location)) {
                            break;
                        }
                    }
                }
                self.expect_token(&Token::RBracket(location), "Expected ']' to close list")?;
                Ok(Expr::List(items))
            }
            other => Err(ParseError {
                message: format!("Expected value, found {}", other),
                location,
            }),
        }
    }

    // ===== Helper methods =====

    fn skip_separators(&mut self) {
        while matches!(self.peek(), Token::Newline(_) | Token::Semicolon(_)) {
            self.advance();
        }
    }

    fn expect_statement_end(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            Token::Newline(_) | Token::Semicolon(_) | Token::Eof(_) => Ok(()),
            other => Err(ParseError {
                message: format!("Expected end of statement, found {}", other),
                location: self.current_location(),
            }),
        }
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        &self.tokens[self.position - 1]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    fn expect_token(&mut self, token: &Token, message: &str) -> Result<(), ParseError> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError {
                message: format!("{}, found {}", message, self.peek()),
                location: self.current_location(),
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let Token::Ident(name, _) = self.peek().clone() {
            self.advance();
            Ok(name)
        } else {
            Err(ParseError {
                message: format!("Expected identifier, found {}", self.peek()),
                location: self.current_location(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Script {
        Parser::new(source)
            .expect("Parser creation failed")
            .parse_script()
            .expect("Parsing failed")
    }

    #[test]
    fn test_bindings_and_lists() {
        let script = parse("a = add 1\nb = add [a, \"x\", null]\ns = freeze");
        assert_eq!(script.statements.len(), 3);
        assert_eq!(
            script.statements[0].kind,
            StatementKind::Add {
                target: Some("a".to_string()),
                value: Expr::Int(1)
            }
        );
        match &script.statements[1].kind {
            StatementKind::Add {
                target: Some(name),
                value: Expr::List(items),
            } => {
                assert_eq!(name, "b");
                assert_eq!(items.len(), 3);
                assert!(matches!(&items[0], Expr::Var(v, loc) if v == "a" && loc.column == 10));
                assert_eq!(items[1], Expr::Text("x".to_string()));
                assert_eq!(items[2], Expr::Null);
            }
            other => panic!("Expected add of a list, got {:?}", other),
        }
        assert_eq!(
            script.statements[2].kind,
            StatementKind::Freeze {
                target: Some("s".to_string())
            }
        );
        assert_eq!(script.statements[2].location, SourceLocation::new(3, 1));
    }

    #[test]
    fn test_semicolons_and_blank_lines() {
        let script = parse("\n\npush 1; push 2;;pop\n\n  gc  \nrollback; clear");
        let kinds: Vec<_> = script.statements.iter().map(|s| &s.kind).collect();
        assert_eq!(kinds.len(), 6);
        assert!(matches!(kinds[2], StatementKind::Pop));
        assert!(matches!(kinds[3], StatementKind::Collect));
        assert!(matches!(kinds[4], StatementKind::Rollback));
        assert!(matches!(kinds[5], StatementKind::Clear));
    }

    #[test]
    fn test_empty_list() {
        let script = parse("push []");
        assert_eq!(
            script.statements[0].kind,
            StatementKind::Push {
                value: Expr::List(vec![])
            }
        );
    }

    #[test]
    fn test_missing_statement_end() {
        let err = Parser::new("pop pop").unwrap().parse_script().unwrap_err();
        assert_eq!(err.location, SourceLocation::new(1, 5));
    }

    #[test]
    fn test_binding_requires_add_or_freeze() {
        let err = Parser::new("a = pop").unwrap().parse_script().unwrap_err();
        assert!(err.message.contains("'add' or 'freeze'"));
    }

    #[test]
    fn test_unclosed_list() {
        assert!(Parser::new("push [1, 2").unwrap().parse_script().is_err());
    }
}
