use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget},
};

use crate::ui::Theme;
use unitscope_types::{SelectionItem, UnitInfo};

/// The selection list: synthetic rows first, then one row per unit
pub struct ListSelector<'a> {
    items: Vec<ListItem<'a>>,
    title: String,
    focused: bool,
}

impl<'a> ListSelector<'a> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            title: title.into(),
            focused: true,
        }
    }

    /// Build rows from selections, looking up unit state for unit rows
    pub fn items(mut self, selections: &'a [SelectionItem], units: &'a [UnitInfo]) -> Self {
        self.items = selections
            .iter()
            .map(|item| {
                let unit = item
                    .unit
                    .as_deref()
                    .and_then(|name| units.iter().find(|u| u.name == name));

                let line = match unit {
                    Some(unit) => Line::from(vec![
                        Span::styled("● ", Theme::unit_state(unit)),
                        Span::styled(item.name.as_str(), Theme::list_item()),
                    ]),
                    None => Line::from(Span::styled(
                        item.name.as_str(),
                        Theme::list_item_synthetic(),
                    )),
                };
                ListItem::new(line)
            })
            .collect();
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl StatefulWidget for ListSelector<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_for(self.focused))
            .title(Span::styled(self.title, Theme::title()));

        let list = List::new(self.items)
            .block(block)
            .highlight_style(Theme::list_item_selected())
            .highlight_symbol("▶ ");

        StatefulWidget::render(list, area, buf, state);
    }
}
