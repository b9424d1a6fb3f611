use ratatui::{
    Frame,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
};

use crate::app::AppState;
use crate::ui::{Layout, Theme};
use unitscope_types::Priority;

/// Popup for choosing the severity threshold
pub struct LevelPicker;

impl LevelPicker {
    pub fn render(frame: &mut Frame, state: &AppState) {
        let area = Layout::popup(frame.area(), 40, Priority::ALL.len() as u16 + 2);
        frame.render_widget(Clear, area);

        let current = state.filter.threshold.level() as usize;
        let items: Vec<ListItem> = Priority::ALL
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let marker = if i == current { "● " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Theme::text_highlight()),
                    Span::styled(p.description(), Theme::priority(*p)),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::border_focused())
                    .title(Span::styled(" Log Level ", Theme::title())),
            )
            .highlight_style(Theme::list_item_selected());

        let mut list_state = ListState::default();
        list_state.select(Some(state.ui_state.level_picker_index));
        frame.render_stateful_widget(list, area, &mut list_state);
    }
}
