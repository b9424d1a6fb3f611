use ratatui::{
    Frame,
    layout::{Constraint, Margin, Rect},
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState,
        Table,
    },
};

use crate::app::{AppState, Focus};
use crate::ui::{
    Layout, Theme, ansi_line,
    components::{ListSelector, SearchBar, StatusBar, monitor_hints},
};
use unitscope_logs::LogView;

/// The single screen: unit list, unit info, main log and error log
pub struct MonitorScreen;

impl MonitorScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, main: &LogView, errors: &LogView) {
        let areas = Layout::monitor(frame.area(), state.ui_state.search_active);

        Self::render_header(frame, areas.header, state, main);
        Self::render_units(frame, areas.units, state);
        Self::render_info(frame, areas.info, state);
        Self::render_log(frame, areas.log, state, main);
        Self::render_errors(frame, areas.errors, errors);
        if let Some(search) = areas.search {
            SearchBar::render(frame, search, state);
        }
        Self::render_status_bar(frame, areas.status, state, main);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState, main: &LogView) {
        let title = main.title();
        let threshold = state.filter.threshold.priority();

        let mut spans = vec![
            Span::styled("unitscope", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(
                if title.is_empty() { "-".to_string() } else { title },
                Theme::text_highlight(),
            ),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(threshold.description(), Theme::priority(threshold)),
        ];
        if state.active_only {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled("active units only", Theme::text()));
        }
        if !state.filter.search.is_empty() && state.filter.case_insensitive {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled("case-insensitive", Theme::text_dim()));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );
        frame.render_widget(header, area);
    }

    fn render_units(frame: &mut Frame, area: Rect, state: &mut AppState) {
        let title = format!(" Units ({}) ", state.units.iter().filter(|u| u.is_service()).count());
        let selector = ListSelector::new(title)
            .items(&state.selections, &state.units)
            .focused(state.ui_state.focus == Focus::Units);

        frame.render_stateful_widget(selector, area, &mut state.ui_state.list_state);
    }

    fn render_info(frame: &mut Frame, area: Rect, state: &AppState) {
        let mut rows = Vec::new();
        if let Some(item) = state.selected_item() {
            rows.push(Self::info_row("Name", Span::styled(item.name.clone(), Theme::text())));
            rows.push(Self::info_row(
                "Description",
                Span::styled(item.description.clone(), Theme::text()),
            ));
            if let Some(unit) = state.selected_unit() {
                rows.push(Self::info_row(
                    "Loaded",
                    Span::styled(unit.load_state.clone(), Theme::text()),
                ));
                rows.push(Self::info_row(
                    "Active",
                    Span::styled(
                        format!("{} ({})", unit.active_state, unit.sub_state),
                        Theme::unit_state(unit),
                    ),
                ));
            } else {
                let matches = item
                    .matches
                    .clauses()
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                rows.push(Self::info_row(
                    "Matches",
                    Span::styled(
                        if matches.is_empty() { "everything".to_string() } else { matches },
                        Theme::text_dim(),
                    ),
                ));
            }
        }

        let table = Table::new(rows, [Constraint::Length(12), Constraint::Min(1)]).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(" Info ", Theme::title())),
        );
        frame.render_widget(table, area);
    }

    fn info_row(label: &'static str, value: Span<'static>) -> Row<'static> {
        Row::new(vec![
            Cell::from(Span::styled(label, Theme::text_dim())),
            Cell::from(value),
        ])
    }

    fn render_log(frame: &mut Frame, area: Rect, state: &mut AppState, main: &LogView) {
        let total = main.len();
        let inner_height = area.height.saturating_sub(2) as usize;
        state.ui_state.log_page = inner_height.max(1);

        let max_scroll = total.saturating_sub(inner_height);
        if main.follow() || state.ui_state.log_scroll > max_scroll {
            state.ui_state.log_scroll = max_scroll;
        }

        let lines: Vec<Line> = main
            .range(state.ui_state.log_scroll, inner_height)
            .iter()
            .map(|l| ansi_line(l))
            .collect();

        let title = format!(
            " {} ({}){} ",
            main.title(),
            total,
            if main.follow() { " ▼" } else { "" }
        );

        let logs = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border_for(state.ui_state.focus == Focus::Log))
                .title(Span::styled(title, Theme::title())),
        );
        frame.render_widget(logs, area);

        if total > inner_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_scroll)
                .position(state.ui_state.log_scroll);

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    fn render_errors(frame: &mut Frame, area: Rect, errors: &LogView) {
        let inner_height = area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = errors
            .tail(inner_height)
            .iter()
            .map(|l| ansi_line(l))
            .collect();

        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(format!(" {} ", errors.title()), Theme::error())),
        );
        frame.render_widget(widget, area);
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, main: &LogView) {
        if let Some(err) = &state.ui_state.error_message {
            let line = Line::from(vec![
                Span::styled(format!(" ⚠ {}", err), Theme::error()),
                Span::styled("  [Esc] Dismiss", Theme::text_dim()),
            ]);
            frame.render_widget(Paragraph::new(line).style(Theme::status_bar()), area);
            return;
        }

        let right = format!(
            "{} lines {}",
            main.len(),
            if main.follow() { "▼" } else { " " }
        );
        let status = StatusBar::new()
            .hints(monitor_hints(state.ui_state.focus))
            .right(right);
        frame.render_widget(status, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};
    use unitscope_logs::{DisplaySink, FilterContext};
    use unitscope_types::UnitInfo;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_renders_panes() {
        let mut state = AppState::new(FilterContext::default(), false);
        state.set_units(vec![
            UnitInfo::new("web.service", "Web").with_states("loaded", "active", "running"),
        ]);

        let mut main = LogView::new(100);
        main.set_title("All");
        main.write(b"\x1b[34mNov 14 22:13:20 \x1b[32mweb \x1b[39mstarted\x1b[0m\n")
            .unwrap();
        let mut errors = LogView::new(100);
        errors.set_title("Errors");

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal
            .draw(|f| MonitorScreen::render(f, &mut state, &main, &errors))
            .unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Units (1)"));
        assert!(text.contains("web.service"));
        assert!(text.contains("Kernel"));
        assert!(text.contains("web started"));
        assert!(text.contains("Errors"));
        assert!(text.contains("1 lines"));
    }

    #[test]
    fn test_follow_pins_scroll_to_bottom() {
        let mut state = AppState::new(FilterContext::default(), false);
        let mut main = LogView::new(1000);
        for i in 0..200 {
            main.write(format!("line {}\n", i).as_bytes()).unwrap();
        }
        let errors = LogView::new(10);

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal
            .draw(|f| MonitorScreen::render(f, &mut state, &main, &errors))
            .unwrap();

        let visible = state.ui_state.log_page;
        assert_eq!(state.ui_state.log_scroll, 200 - visible);
        assert!(screen_text(&terminal).contains("line 199"));
    }

    #[test]
    fn test_error_message_replaces_hints() {
        let mut state = AppState::new(FilterContext::default(), false);
        state.show_error("journal expired".to_string());
        let main = LogView::new(10);
        let errors = LogView::new(10);

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal
            .draw(|f| MonitorScreen::render(f, &mut state, &main, &errors))
            .unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("journal expired"));
        assert!(!text.contains("[Tab]"));
    }
}
