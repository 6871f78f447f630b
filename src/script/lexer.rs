//! Lexer (tokenizer) for memory scripts
//!
//! Converts raw script text into a flat [`Token`] stream consumed by the parser.
//! Newlines are significant (they end statements), so they are emitted as
//! tokens; `#` and `//` comments run to the end of the line.

use super::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    IntLiteral(i64, SourceLocation),
    StringLiteral(String, SourceLocation),

    // Identifiers
    Ident(String, SourceLocation),

    // Keywords
    Add(SourceLocation),
    Set(SourceLocation),
    Get(SourceLocation),
    Remove(SourceLocation),
    Pin(SourceLocation),
    Unpin(SourceLocation),
    Push(SourceLocation),
    Pop(SourceLocation),
    Freeze(SourceLocation),
    Rollback(SourceLocation),
    Restore(SourceLocation),
    Gc(SourceLocation),
    Clear(SourceLocation),
    Null(SourceLocation),

    // Punctuation
    Eq(SourceLocation),        // =
    LBracket(SourceLocation),  // [
    RBracket(SourceLocation),  // ]
    Comma(SourceLocation),     // ,
    Semicolon(SourceLocation), // ;
    Newline(SourceLocation),

    // End of file
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::IntLiteral(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::Ident(_, loc)
            | Token::Add(loc)
            | Token::Set(loc)
            | Token::Get(loc)
            | Token::Remove(loc)
            | Token::Pin(loc)
            | Token::Unpin(loc)
            | Token::Push(loc)
            | Token::Pop(loc)
            | Token::Freeze(loc)
            | Token::Rollback(loc)
            | Token::Restore(loc)
            | Token::Gc(loc)
            | Token::Clear(loc)
            | Token::Null(loc)
            | Token::Eq(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::Comma(loc)
            | Token::Semicolon(loc)
            | Token::Newline(loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLiteral(n, _) => write!(f, "int literal {}", n),
            Token::StringLiteral(s, _) => write!(f, "string literal \"{}\"", s),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::Add(_) => write!(f, "'add'"),
            Token::Set(_) => write!(f, "'set'"),
            Token::Get(_) => write!(f, "'get'"),
            Token::Remove(_) => write!(f, "'remove'"),
            Token::Pin(_) => write!(f, "'pin'"),
            Token::Unpin(_) => write!(f, "'unpin'"),
            Token::Push(_) => write!(f, "'push'"),
            Token::Pop(_) => write!(f, "'pop'"),
            Token::Freeze(_) => write!(f, "'freeze'"),
            Token::Rollback(_) => write!(f, "'rollback'"),
            Token::Restore(_) => write!(f, "'restore'"),
            Token::Gc(_) => write!(f, "'gc'"),
            Token::Clear(_) => write!(f, "'clear'"),
            Token::Null(_) => write!(f, "'null'"),
            Token::Eq(_) => write!(f, "'='"),
            Token::LBracket(_) => write!(f, "'['"),
            Token::RBracket(_) => write!(f, "']'"),
            Token::Comma(_) => write!(f, "','"),
            Token::Semicolon(_) => write!(f, "';'"),
            Token::Newline(_) => write!(f, "end of line"),
            Token::Eof(_) => write!(f, "end of file"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Error)]
#[error("Lexer error at line {}, column {}: {message}", .location.line, .location.column)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Lexer for memory scripts
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_blanks_and_comments();

            if self.is_at_end() {
                tokens.push(Token::Eof(self.current_location()));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        match ch {
            '\n' => Ok(Token::Newline(loc)),
            '"' => self.string_literal(loc),
            '0'..='9' => self.number_literal(ch, false, loc),
            '-' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                let first = self.advance().unwrap_or('0');
                self.number_literal(first, true, loc)
            }
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.identifier_or_keyword(ch, loc)),
            '=' => Ok(Token::Eq(loc)),
            '[' => Ok(Token::LBracket(loc)),
            ']' => Ok(Token::RBracket(loc)),
            ',' => Ok(Token::Comma(loc)),
            ';' => Ok(Token::Semicolon(loc)),
            _ => Err(LexError {
                message: format!("Unexpected character: '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Parse string literal
    fn string_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut string = String::new();

        while let Some(ch) = self.peek() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(Token::StringLiteral(string, loc));
                }
                '\n' => break,
                '\\' => {
                    self.advance();
                    let escaped = self.advance().ok_or_else(|| LexError {
                        message: "Unexpected end of file in string literal".to_string(),
                        location: self.current_location(),
                    })?;
                    let unescaped = match escaped {
                        'n' => '\n',
                        't' => '\t',
                        '\\' => '\\',
                        '"' => '"',
                        _ => {
                            return Err(LexError {
                                message: format!("Unknown escape sequence: \\{}", escaped),
                                location: self.current_location(),
                            });
                        }
                    };
                    string.push(unescaped);
                }
                _ => {
                    string.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError {
            message: "Unterminated string literal".to_string(),
            location: loc,
        })
    }

    /// Parse integer literal
    fn number_literal(
        &mut self,
        first: char,
        negative: bool,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        let mut digits = String::new();
        if negative {
            digits.push('-');
        }
        digits.push(first);
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else if ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        digits
            .parse::<i64>()
            .map(|n| Token::IntLiteral(n, loc))
            .map_err(|_| LexError {
                message: format!("Integer literal out of range: {}", digits),
                location: loc,
            })
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first);
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "add" => Token::Add(loc),
            "set" => Token::Set(loc),
            "get" => Token::Get(loc),
            "remove" => Token::Remove(loc),
            "pin" => Token::Pin(loc),
            "unpin" => Token::Unpin(loc),
            "push" => Token::Push(loc),
            "pop" => Token::Pop(loc),
            "freeze" => Token::Freeze(loc),
            "rollback" => Token::Rollback(loc),
            "restore" => Token::Restore(loc),
            "gc" => Token::Gc(loc),
            "clear" => Token::Clear(loc),
            "null" => Token::Null(loc),
            _ => Token::Ident(ident, loc),
        }
    }

    /// Skip spaces, tabs, carriage returns and comments (but not newlines)
    fn skip_blanks_and_comments(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '#' => self.skip_to_line_end(),
                '/' if self.peek_next() == Some('/') => self.skip_to_line_end(),
                _ => break,
            }
        }
    }

    fn skip_to_line_end(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_tokens() {
        let mut lexer = Lexer::new("a = add [b, -3, \"x\"]");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::Ident(ref s, _) if s == "a"));
        assert!(matches!(tokens[1], Token::Eq(_)));
        assert!(matches!(tokens[2], Token::Add(_)));
        assert!(matches!(tokens[3], Token::LBracket(_)));
        assert!(matches!(tokens[4], Token::Ident(ref s, _) if s == "b"));
        assert!(matches!(tokens[5], Token::Comma(_)));
        assert!(matches!(tokens[6], Token::IntLiteral(-3, _)));
        assert!(matches!(tokens[7], Token::Comma(_)));
        assert!(matches!(tokens[8], Token::StringLiteral(ref s, _) if s == "x"));
        assert!(matches!(tokens[9], Token::RBracket(_)));
        assert!(matches!(tokens[10], Token::Eof(_)));
    }

    #[test]
    fn test_comments_and_newlines() {
        let mut lexer = Lexer::new("push 1 # first\n// whole line\npop");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::Push(_)));
        assert!(matches!(tokens[1], Token::IntLiteral(1, _)));
        assert!(matches!(tokens[2], Token::Newline(_)));
        assert!(matches!(tokens[3], Token::Newline(_)));
        assert!(matches!(tokens[4], Token::Pop(loc) if loc.line == 3 && loc.column == 1));
        assert!(matches!(tokens[5], Token::Eof(_)));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("push \"abc\npop");
        let err = lexer.tokenize().unwrap_err();
        assert_eq!(err.location, SourceLocation::new(1, 6));
        assert!(err.message.contains("Unterminated"));
    }

    #[test]
    fn test_unexpected_character() {
        let mut lexer = Lexer::new("push 1 + 2");
        assert!(lexer.tokenize().is_err());
    }
}
