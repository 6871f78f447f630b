//! Memory script front end
//!
//! - [`lexer`]: Tokens with source locations
//! - [`ast`]: Statements and value expressions
//! - [`parser`]: Recursive descent parser producing a [`Script`]
//!
//! [`Script`]: ast::Script

pub mod ast;
pub mod lexer;
pub mod parser;
