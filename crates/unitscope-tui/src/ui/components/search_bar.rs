use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::AppState;
use crate::ui::Theme;

/// Search input for the main log
pub struct SearchBar;

impl SearchBar {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let ui = &state.ui_state;
        let mut spans = vec![
            Span::styled(
                " /",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(ui.search_input.clone(), Theme::text_highlight()),
            Span::styled(
                "█",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
        ];

        if let Some(err) = &ui.search_error {
            spans.push(Span::styled(format!("  ⚠ {}", err), Theme::error()));
        }

        let case_text = if state.filter.case_insensitive {
            "  [i] case-insensitive"
        } else {
            "  [i] case-sensitive"
        };
        spans.push(Span::styled(case_text, Theme::text_dim()));
        spans.push(Span::styled(
            "  [Enter] Apply  [Esc] Cancel",
            Theme::text_dim(),
        ));

        let border = if ui.search_error.is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow)
        };

        let bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(Span::styled(" Search ", Theme::title())),
        );

        frame.render_widget(bar, area);
    }
}
