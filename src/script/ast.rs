// AST definitions for memory scripts

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Value expressions. Bare identifiers name bound references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Null,
    Int(i64),
    Text(String),
    Var(String, SourceLocation),
    List(Vec<Expr>),
}

/// One script statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// `add v` or `name = add v`
    Add { target: Option<String>, value: Expr },
    /// `set name v`
    Set { reference: String, value: Expr },
    /// `get name`
    Get { reference: String },
    /// `remove name`
    Remove { reference: String },
    /// `pin name` (increase reference count)
    Pin { reference: String },
    /// `unpin name` (decrease reference count)
    Unpin { reference: String },
    /// `push v`
    Push { value: Expr },
    /// `pop`
    Pop,
    /// `freeze` or `name = freeze`
    Freeze { target: Option<String> },
    /// `rollback`
    Rollback,
    /// `restore name`
    Restore { snapshot: String },
    /// `gc`
    Collect,
    /// `clear`
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub location: SourceLocation,
}

impl Statement {
    pub fn new(kind: StatementKind, location: SourceLocation) -> Self {
        Statement { kind, location }
    }
}

/// A parsed script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    pub statements: Vec<Statement>,
}

impl Script {
    pub fn new() -> Self {
        Script {
            statements: Vec::new(),
        }
    }
}
