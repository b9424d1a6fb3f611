use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Areas of the monitor screen
pub struct MonitorAreas {
    pub header: Rect,
    pub units: Rect,
    pub info: Rect,
    pub log: Rect,
    pub errors: Rect,
    pub search: Option<Rect>,
    pub status: Rect,
}

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Header, unit list beside info + log, error log, optional search bar,
    /// status bar
    pub fn monitor(area: Rect, show_search: bool) -> MonitorAreas {
        let mut constraints = vec![
            Constraint::Length(3),      // Header
            Constraint::Min(8),         // Units + main log
            Constraint::Percentage(25), // Error log
        ];
        if show_search {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Length(1)); // Status bar

        let rows = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let body = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(36), Constraint::Min(1)])
            .split(rows[1]);

        let right = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(1)])
            .split(body[1]);

        MonitorAreas {
            header: rows[0],
            units: body[0],
            info: right[0],
            log: right[1],
            errors: rows[2],
            search: show_search.then(|| rows[3]),
            status: rows[rows.len() - 1],
        }
    }

    /// A centered popup of at most `width` x `height`
    pub fn popup(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(4));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_areas() {
        let area = Rect::new(0, 0, 120, 40);
        let areas = Layout::monitor(area, false);

        assert_eq!(areas.header.height, 3);
        assert_eq!(areas.status.y, 39);
        assert_eq!(areas.units.width, 36);
        assert!(areas.search.is_none());
        assert_eq!(areas.log.x, areas.info.x);

        let with_search = Layout::monitor(area, true);
        assert_eq!(with_search.search.map(|r| r.height), Some(3));
    }

    #[test]
    fn test_popup_fits() {
        let area = Rect::new(0, 0, 30, 10);
        let popup = Layout::popup(area, 50, 24);
        assert_eq!((popup.width, popup.height), (26, 6));
        assert_eq!((popup.x, popup.y), (2, 2));
    }
}
