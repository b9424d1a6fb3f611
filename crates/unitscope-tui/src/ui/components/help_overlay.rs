use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::Layout;

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let popup_area = Layout::popup(frame.area(), 50, 30);
        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Self::section("Units"),
            Self::key_line("j/↓ k/↑", "Select (switches the log)"),
            Self::key_line("Tab", "Focus log"),
            Self::key_line("a/F1", "Toggle active units only"),
            Self::key_line("s", "Start unit"),
            Self::key_line("S", "Stop unit"),
            Self::key_line("r", "Refresh units"),
            Line::from(""),
            Self::section("Log"),
            Self::key_line("j/↓ k/↑", "Scroll"),
            Self::key_line("PgUp/PgDn", "Page"),
            Self::key_line("g/G", "Top/bottom"),
            Self::key_line("f", "Toggle follow"),
            Self::key_line("Tab/Esc", "Back to units"),
            Line::from(""),
            Self::section("Filter"),
            Self::key_line("/", "Search"),
            Self::key_line("n", "Clear search"),
            Self::key_line("i", "Toggle case sensitivity"),
            Self::key_line("l/F2", "Log level"),
            Line::from(""),
            Self::key_line("?", "Toggle this help"),
            Self::key_line("q", "Quit"),
        ];

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn section(name: &str) -> Line<'_> {
        Line::from(Span::styled(name, Style::default().fg(Color::Yellow)))
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {:>10}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}
