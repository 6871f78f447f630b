//! Shared helpers for pane rendering

use crate::memory::Value;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders},
};

/// Bordered block with the focus-dependent border style
pub(crate) fn pane_block(title: &str, is_focused: bool) -> Block<'_> {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Clamp a scroll offset so the last page stays full, then return it
pub(crate) fn clamp_scroll(offset: &mut usize, total_items: usize, visible_height: usize) -> usize {
    if total_items > visible_height {
        *offset = (*offset).min(total_items - visible_height);
    } else {
        *offset = 0;
    }
    *offset
}

/// Format a value with styled spans. Lists nested deeper than `max_depth` collapse to `[...]`.
pub(crate) fn format_value_styled(value: &Value, max_depth: usize) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    push_value_spans(&mut spans, value, max_depth);
    spans
}

fn push_value_spans(spans: &mut Vec<Span<'static>>, value: &Value, depth: usize) {
    match value {
        Value::Null => spans.push(Span::styled(
            "null",
            Style::default().fg(DEFAULT_THEME.comment),
        )),
        Value::Int(n) => spans.push(Span::styled(
            n.to_string(),
            Style::default().fg(DEFAULT_THEME.number),
        )),
        Value::Text(s) => spans.push(Span::styled(
            format!("{:?}", s),
            Style::default().fg(DEFAULT_THEME.string),
        )),
        Value::Ref(r) => spans.push(Span::styled(
            r.to_string(),
            Style::default()
                .fg(DEFAULT_THEME.reference)
                .add_modifier(Modifier::BOLD),
        )),
        Value::List(items) => {
            if depth == 0 {
                spans.push(Span::styled(
                    "[...]",
                    Style::default().fg(DEFAULT_THEME.comment),
                ));
                return;
            }
            let punct = Style::default().fg(DEFAULT_THEME.fg);
            spans.push(Span::styled("[", punct));
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled(", ", punct));
                }
                push_value_spans(spans, item, depth - 1);
            }
            spans.push(Span::styled("]", punct));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Reference;

    fn plain(spans: &[Span<'static>]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_nested_list_collapses() {
        let value = Value::List(vec![
            Value::Ref(Reference::new(3)),
            Value::List(vec![Value::Int(1), Value::List(vec![Value::Null])]),
        ]);
        assert_eq!(plain(&format_value_styled(&value, 2)), "[#3, [1, [...]]]");
        assert_eq!(plain(&format_value_styled(&value, 3)), "[#3, [1, [null]]]");
    }

    #[test]
    fn test_clamp_scroll() {
        let mut offset = 50;
        assert_eq!(clamp_scroll(&mut offset, 20, 5), 15);
        assert_eq!(clamp_scroll(&mut offset, 3, 5), 0);
    }
}
