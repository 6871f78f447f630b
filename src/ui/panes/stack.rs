//! Evaluation stack pane
//!
//! Shows the stack visible from the current generation, top first. Entries
//! below the generation's own segment are read through from an ancestor and
//! are drawn muted.

use super::utils::{clamp_scroll, format_value_styled, pane_block};
use crate::memory::Value;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Scroll state for the stack pane
pub struct StackScrollState {
    pub offset: usize,
    pub prev_item_count: usize,
}

/// Data needed to render the stack pane
pub struct StackRenderData<'a> {
    /// Bottom to top
    pub stack: &'a [Value],
    pub inherited_len: usize,
}

/// Render the stack pane
pub fn render_stack_pane(
    frame: &mut Frame,
    area: Rect,
    data: StackRenderData,
    is_focused: bool,
    scroll_state: &mut StackScrollState,
) {
    let title = format!(
        " Stack ({} own, {} inherited) ",
        data.stack.len().saturating_sub(data.inherited_len),
        data.inherited_len
    );
    let block = pane_block(&title, is_focused);
    let mut all_items = Vec::new();

    if data.stack.is_empty() {
        all_items.push(ListItem::new("(empty)").style(Style::default().fg(DEFAULT_THEME.comment)));
    }

    for (index, value) in data.stack.iter().enumerate().rev() {
        let inherited = index < data.inherited_len;
        let index_style = if inherited {
            Style::default().fg(DEFAULT_THEME.inherited)
        } else {
            Style::default()
                .fg(DEFAULT_THEME.secondary)
                .add_modifier(Modifier::BOLD)
        };

        let mut spans = vec![
            Span::styled(format!("[{:>3}] ", index), index_style),
            Span::styled(
                if inherited { "↑ " } else { "  " },
                Style::default().fg(DEFAULT_THEME.inherited),
            ),
        ];
        let mut value_spans = format_value_styled(value, 3);
        if inherited {
            for span in &mut value_spans {
                span.style = span.style.add_modifier(Modifier::DIM);
            }
        }
        spans.extend(value_spans);
        all_items.push(ListItem::new(Line::from(spans)));
    }

    // Jump back to the top when the stack grows
    if all_items.len() > scroll_state.prev_item_count {
        scroll_state.offset = 0;
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
