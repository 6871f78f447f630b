//! Generation chain pane
//!
//! Lists the chain from the current generation down to the root, with the
//! cells and stack entries each generation owns, followed by the snapshot
//! names the script bound to them.

use super::utils::{clamp_scroll, pane_block};
use crate::driver::Binding;
use crate::memory::GenerationSummary;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Render the generations pane
pub fn render_generations_pane(
    frame: &mut Frame,
    area: Rect,
    generations: &[GenerationSummary],
    bindings: &[(String, Binding)],
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(" Generations ", is_focused);
    let current_depth = generations.len().saturating_sub(1);
    let mut all_items = Vec::new();

    for summary in generations.iter().rev() {
        let is_current = summary.depth == current_depth;
        let marker = if is_current { "▸ " } else { "  " };
        let name_style = if is_current {
            Style::default()
                .fg(DEFAULT_THEME.secondary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DEFAULT_THEME.inherited)
        };

        let snapshot_names: Vec<&str> = bindings
            .iter()
            .filter_map(|(name, binding)| match binding {
                Binding::Snapshot(handle)
                    if handle.depth() == summary.depth && handle.serial() == summary.serial =>
                {
                    Some(name.as_str())
                }
                _ => None,
            })
            .collect();

        let mut spans = vec![
            Span::styled(marker, Style::default().fg(DEFAULT_THEME.secondary)),
            Span::styled(format!("gen {}", summary.depth), name_style),
            Span::styled(
                format!(" (serial {}) ", summary.serial),
                Style::default().fg(DEFAULT_THEME.comment),
            ),
            Span::styled("│ ", Style::default().fg(DEFAULT_THEME.comment)),
            Span::styled(
                format!(
                    "cells {} · stack {}+{} · used {}/{}",
                    summary.owned_cells,
                    summary.inherited_stack,
                    summary.own_stack,
                    summary.used_cells,
                    summary.heap_size
                ),
                Style::default().fg(DEFAULT_THEME.fg),
            ),
        ];
        if !snapshot_names.is_empty() {
            spans.push(Span::styled(
                format!("  ← {}", snapshot_names.join(", ")),
                Style::default().fg(DEFAULT_THEME.binding),
            ));
        }
        all_items.push(ListItem::new(Line::from(spans)));
    }

    // Snapshot names whose generation has been discarded
    for (name, binding) in bindings {
        if let Binding::Snapshot(handle) = binding {
            let alive = generations
                .get(handle.depth())
                .is_some_and(|g| g.serial == handle.serial());
            if !alive {
                all_items.push(ListItem::new(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(name.clone(), Style::default().fg(DEFAULT_THEME.binding)),
                    Span::styled(
                        format!(" → gen {} (discarded)", handle.depth()),
                        Style::default().fg(DEFAULT_THEME.comment),
                    ),
                ])));
            }
        }
    }

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let offset = clamp_scroll(scroll_offset, all_items.len(), visible_height);
    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
