//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Script source with highlighting and current line indicator
//! - [`transcript`]: One line per executed statement
//! - [`generations`]: The generation chain and the snapshot names bound to it
//! - [`stack`]: Evaluation stack, inherited entries muted
//! - [`heap`]: Every visible cell with owner, reference count and free links
//! - [`status`]: Status bar with step position and keybindings
//! - `utils`: Shared block, scroll and value formatting helpers
//!
//! Each pane module exports a `render_*_pane()` function plus whatever scroll
//! or render-data types it needs.

mod utils;

pub mod generations;
pub mod heap;
pub mod source;
pub mod stack;
pub mod status;
pub mod transcript;

pub use generations::render_generations_pane;
pub use heap::{render_heap_pane, HeapRenderData, HeapScrollState};
pub use source::{render_source_pane, SourceScrollState};
pub use stack::{render_stack_pane, StackRenderData, StackScrollState};
pub use status::{render_status_bar, StatusRenderData};
pub use transcript::render_transcript_pane;
