//! Heap pane rendering
//!
//! Lists every position of the visible heap. Each row shows the generation
//! that owns the cell, its reference count and value, or for freed slots the
//! next link of the free list. Names the script bound to a position are shown
//! on the right.
//!
//! # Markers
//!
//! - `*` the cell is owned by the current generation
//! - `→` the slot is the head of the free list

use super::utils::{clamp_scroll, format_value_styled, pane_block};
use crate::driver::Binding;
use crate::memory::{CellState, CellView, Position, Value};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Scroll state for the heap pane
pub struct HeapScrollState {
    pub offset: usize,
    pub prev_item_count: usize,
}

/// Data needed to render the heap pane
pub struct HeapRenderData<'a> {
    pub cells: &'a [CellView<Value>],
    pub current_depth: usize,
    pub free_head: Option<Position>,
    pub used_cells: usize,
    pub bindings: &'a [(String, Binding)],
}

/// Render the heap pane
pub fn render_heap_pane(
    frame: &mut Frame,
    area: Rect,
    data: HeapRenderData,
    is_focused: bool,
    scroll_state: &mut HeapScrollState,
) {
    let title = format!(" Heap ({} live / {} slots) ", data.used_cells, data.cells.len());
    let block = pane_block(&title, is_focused);
    let content_width = area.width.saturating_sub(2) as usize;
    let mut all_items = Vec::new();

    if data.cells.is_empty() {
        all_items.push(
            ListItem::new("(no allocations)").style(Style::default().fg(DEFAULT_THEME.comment)),
        );
    }

    for cell in data.cells {
        let is_local = cell.owner_depth == data.current_depth;
        let is_free_head = data.free_head == Some(cell.position);

        let position_style = if is_free_head {
            Style::default()
                .fg(DEFAULT_THEME.error)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DEFAULT_THEME.reference)
        };
        let owner_style = if is_local {
            Style::default().fg(DEFAULT_THEME.secondary)
        } else {
            Style::default().fg(DEFAULT_THEME.inherited)
        };

        let mut spans = vec![
            Span::styled(
                if is_free_head { "→" } else { " " },
                Style::default().fg(DEFAULT_THEME.error),
            ),
            Span::styled(format!("#{:<4}", cell.position), position_style),
            Span::styled(
                format!("g{}{} ", cell.owner_depth, if is_local { "*" } else { " " }),
                owner_style,
            ),
            Span::styled("│ ", Style::default().fg(DEFAULT_THEME.comment)),
        ];
        let mut left_width = 1 + 5 + 4 + 2;

        match &cell.state {
            CellState::Live {
                value,
                reference_count,
            } => {
                let count = format!("rc {:<2} ", reference_count);
                left_width += count.len();
                spans.push(Span::styled(count, Style::default().fg(DEFAULT_THEME.primary)));
                let value_spans = format_value_styled(value, 2);
                left_width += value_spans.iter().map(|s| s.content.chars().count()).sum::<usize>();
                spans.extend(value_spans);
            }
            CellState::Freed { next_free } => {
                let text = match next_free {
                    Some(next) => format!("freed → #{}", next),
                    None => "freed → end".to_string(),
                };
                left_width += text.chars().count();
                spans.push(Span::styled(
                    text,
                    Style::default()
                        .fg(DEFAULT_THEME.comment)
                        .add_modifier(Modifier::ITALIC),
                ));
            }
        }

        let names: Vec<&str> = data
            .bindings
            .iter()
            .filter_map(|(name, binding)| match binding {
                Binding::Reference(r) if r.position() == cell.position => Some(name.as_str()),
                _ => None,
            })
            .collect();
        if !names.is_empty() {
            let label = names.join(", ");
            let padding = content_width.saturating_sub(left_width + label.len()).max(1);
            spans.push(Span::raw(" ".repeat(padding)));
            spans.push(Span::styled(label, Style::default().fg(DEFAULT_THEME.binding)));
        }

        all_items.push(ListItem::new(Line::from(spans)));
    }

    // Follow new allocations at the bottom
    if all_items.len() > scroll_state.prev_item_count {
        scroll_state.offset = usize::MAX;
    }
    scroll_state.prev_item_count = all_items.len();

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let offset = clamp_scroll(&mut scroll_state.offset, all_items.len(), visible_height);
    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
