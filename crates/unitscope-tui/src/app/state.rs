use ratatui::widgets::ListState;

use unitscope_logs::FilterContext;
use unitscope_types::{Priority, SelectionItem, SeverityThreshold, UnitInfo};

/// Which pane receives navigation keys
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Units,
    Log,
}

/// UI-specific transient state
pub struct UiState {
    pub focus: Focus,

    /// Is search bar active?
    pub search_active: bool,

    /// Current search input text
    pub search_input: String,

    /// Search input error message
    pub search_error: Option<String>,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Is the log-level picker open?
    pub level_picker_open: bool,

    /// Highlighted row in the level picker
    pub level_picker_index: usize,

    /// Unit list selection
    pub list_state: ListState,

    /// Error message to display (if any)
    pub error_message: Option<String>,

    /// First visible line of the main log
    pub log_scroll: usize,

    /// Lines visible in the main log at the last render
    pub log_page: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: Focus::default(),
            search_active: false,
            search_input: String::new(),
            search_error: None,
            help_visible: false,
            level_picker_open: false,
            level_picker_index: SeverityThreshold::default().level() as usize,
            list_state: ListState::default(),
            error_message: None,
            log_scroll: 0,
            log_page: 20,
        }
    }
}

/// Global application state
pub struct AppState {
    /// Units reported by the last inventory load
    pub units: Vec<UnitInfo>,

    /// Rows shown in the unit list
    pub selections: Vec<SelectionItem>,

    /// Filter applied to the next main-view switch
    pub filter: FilterContext,

    /// Hide inactive units from the list
    pub active_only: bool,

    /// UI state
    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,
}

impl AppState {
    pub fn new(filter: FilterContext, active_only: bool) -> Self {
        let mut ui_state = UiState {
            level_picker_index: filter.threshold.level() as usize,
            ..Default::default()
        };
        ui_state.list_state.select(Some(0));

        Self {
            units: Vec::new(),
            selections: SelectionItem::listing(&[], active_only),
            filter,
            active_only,
            ui_state,
            should_quit: false,
        }
    }

    /// Currently highlighted selection
    pub fn selected_item(&self) -> Option<&SelectionItem> {
        self.ui_state
            .list_state
            .selected()
            .and_then(|i| self.selections.get(i))
    }

    /// Unit behind the current selection, if it is one
    pub fn selected_unit(&self) -> Option<&UnitInfo> {
        let name = self.selected_item()?.unit.as_deref()?;
        self.units.iter().find(|u| u.name == name)
    }

    /// Replace the inventory.
    ///
    /// Keeps the highlighted row by name when it survives; returns whether
    /// the selection changed.
    pub fn set_units(&mut self, units: Vec<UnitInfo>) -> bool {
        self.units = units;
        self.rebuild_selections()
    }

    /// Flip the active-only toggle; returns whether the selection changed
    pub fn toggle_active_only(&mut self) -> bool {
        self.active_only = !self.active_only;
        self.rebuild_selections()
    }

    fn rebuild_selections(&mut self) -> bool {
        let previous = self.selected_item().cloned();
        self.selections = SelectionItem::listing(&self.units, self.active_only);

        let index = previous
            .as_ref()
            .and_then(|p| self.selections.iter().position(|s| s.name == p.name))
            .unwrap_or(0);
        self.ui_state.list_state.select(Some(index));

        previous.as_ref() != self.selected_item()
    }

    /// Move selection up, wrapping
    pub fn list_up(&mut self) -> bool {
        let len = self.selections.len();
        if len == 0 {
            return false;
        }

        let i = match self.ui_state.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.select(i)
    }

    /// Move selection down, wrapping
    pub fn list_down(&mut self) -> bool {
        let len = self.selections.len();
        if len == 0 {
            return false;
        }

        let i = match self.ui_state.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.select(i)
    }

    /// Select a row; returns whether it differs from the current one
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.selections.len() || self.ui_state.list_state.selected() == Some(index) {
            return false;
        }
        self.ui_state.list_state.select(Some(index));
        true
    }

    /// Show an error message
    pub fn show_error(&mut self, msg: String) {
        self.ui_state.error_message = Some(msg);
    }

    /// Dismiss the error message
    pub fn dismiss_error(&mut self) {
        self.ui_state.error_message = None;
    }

    /// Start search input, seeded with the active term
    pub fn start_search(&mut self) {
        self.ui_state.search_active = true;
        self.ui_state.search_input = self.filter.search.clone();
        self.ui_state.search_error = None;
    }

    /// Close the search bar without touching the active term
    pub fn cancel_search(&mut self) {
        self.ui_state.search_active = false;
        self.ui_state.search_input.clear();
        self.ui_state.search_error = None;
    }

    /// Commit the search input; returns whether the filter changed
    pub fn apply_search(&mut self) -> bool {
        let candidate = FilterContext {
            search: self.ui_state.search_input.clone(),
            ..self.filter.clone()
        };

        if let Err(e) = candidate.search_filter() {
            self.ui_state.search_error = Some(format!("Invalid search: {}", e));
            return false;
        }

        self.ui_state.search_active = false;
        self.ui_state.search_error = None;
        self.replace_filter(candidate)
    }

    /// Drop the active search term; returns whether the filter changed
    pub fn clear_search(&mut self) -> bool {
        self.ui_state.search_input.clear();
        let candidate = FilterContext {
            search: String::new(),
            ..self.filter.clone()
        };
        self.replace_filter(candidate)
    }

    /// Returns whether the active term is affected
    pub fn toggle_case_sensitive(&mut self) -> bool {
        self.filter.case_insensitive = !self.filter.case_insensitive;
        !self.filter.search.is_empty()
    }

    pub fn search_input_char(&mut self, c: char) {
        self.ui_state.search_input.push(c);
    }

    pub fn search_input_backspace(&mut self) {
        self.ui_state.search_input.pop();
    }

    pub fn open_level_picker(&mut self) {
        self.ui_state.level_picker_open = true;
        self.ui_state.level_picker_index = self.filter.threshold.level() as usize;
    }

    pub fn close_level_picker(&mut self) {
        self.ui_state.level_picker_open = false;
    }

    pub fn level_up(&mut self) {
        self.ui_state.level_picker_index = self.ui_state.level_picker_index.saturating_sub(1);
    }

    pub fn level_down(&mut self) {
        let max = Priority::ALL.len() - 1;
        self.ui_state.level_picker_index = (self.ui_state.level_picker_index + 1).min(max);
    }

    /// Apply the highlighted level; returns whether the filter changed
    pub fn select_level(&mut self) -> bool {
        self.ui_state.level_picker_open = false;
        let candidate = FilterContext {
            threshold: SeverityThreshold::new(self.ui_state.level_picker_index as u8),
            ..self.filter.clone()
        };
        self.replace_filter(candidate)
    }

    fn replace_filter(&mut self, filter: FilterContext) -> bool {
        if filter == self.filter {
            return false;
        }
        self.filter = filter;
        true
    }
}
