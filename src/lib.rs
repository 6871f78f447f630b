//! # Introduction
//!
//! strata is a versioned memory manager: a persistent, copy-on-write heap and
//! evaluation stack that lets a backtracking analyzer take O(1) snapshots,
//! keep evaluating with full read/write semantics, and later roll back or
//! restore arbitrarily far while live snapshots share most of their data.
//!
//! ## Layers
//!
//! ```text
//! Script → Lexer → Parser → Session → MemoryManager → Snapshots → TUI
//! ```
//!
//! 1. [`memory`]: the generation chain, copy-on-write cells, reference
//!    counting and the generation-scoped collector. This is the library core;
//!    everything else drives or displays it.
//! 2. [`script`]: a small line-oriented language (`a = add 42`, `s = freeze`,
//!    `restore s`, ...) for exercising the manager.
//! 3. [`driver`]: runs a parsed script and records a transcript plus a
//!    [`snapshot::Snapshot`] after every statement.
//! 4. [`snapshot`]: the bounded snapshot history and transcript.
//! 5. [`ui`]: ratatui-based inspector; not part of the stable library API.

pub mod driver;
pub mod memory;
pub mod script;
pub mod snapshot;
pub mod ui;
