use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    UnitList,
    LogViewer,
    SearchInput,
    LevelPicker,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenSearch);
        global.insert(KeyBinding::new(KeyCode::Char('n')), Action::ClearSearch);
        global.insert(KeyBinding::new(KeyCode::Char('i')), Action::ToggleCaseSensitive);
        global.insert(KeyBinding::new(KeyCode::Char('l')), Action::OpenLevelPicker);
        global.insert(KeyBinding::new(KeyCode::F(2)), Action::OpenLevelPicker);
        global.insert(KeyBinding::new(KeyCode::Char('a')), Action::ToggleActiveOnly);
        global.insert(KeyBinding::new(KeyCode::F(1)), Action::ToggleActiveOnly);
        global.insert(KeyBinding::new(KeyCode::Char('r')), Action::RefreshUnits);
        global.insert(KeyBinding::new(KeyCode::Esc), Action::DismissError);
        bindings.insert(KeyContext::Global, global);

        // Unit list bindings
        let mut units = HashMap::new();
        units.insert(KeyBinding::new(KeyCode::Char('j')), Action::ListDown);
        units.insert(KeyBinding::new(KeyCode::Down), Action::ListDown);
        units.insert(KeyBinding::new(KeyCode::Char('k')), Action::ListUp);
        units.insert(KeyBinding::new(KeyCode::Up), Action::ListUp);
        units.insert(KeyBinding::new(KeyCode::Home), Action::ListTop);
        units.insert(KeyBinding::new(KeyCode::End), Action::ListBottom);
        units.insert(KeyBinding::new(KeyCode::Tab), Action::FocusLog);
        units.insert(KeyBinding::new(KeyCode::Enter), Action::FocusLog);
        units.insert(KeyBinding::new(KeyCode::Char('s')), Action::StartUnit);
        units.insert(KeyBinding::shift(KeyCode::Char('S')), Action::StopUnit);
        bindings.insert(KeyContext::UnitList, units);

        // Log viewer bindings - less-like navigation
        let mut log_viewer = HashMap::new();
        log_viewer.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        log_viewer.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        log_viewer.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('f')), Action::ToggleFollow);
        log_viewer.insert(KeyBinding::new(KeyCode::Tab), Action::FocusUnits);
        log_viewer.insert(KeyBinding::new(KeyCode::Esc), Action::FocusUnits);
        bindings.insert(KeyContext::LogViewer, log_viewer);

        // Search input bindings (when search bar is active)
        let mut search_input = HashMap::new();
        search_input.insert(KeyBinding::new(KeyCode::Enter), Action::ApplySearch);
        search_input.insert(KeyBinding::new(KeyCode::Esc), Action::CloseSearch);
        search_input.insert(KeyBinding::new(KeyCode::Backspace), Action::SearchBackspace);
        search_input.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::SearchClear);
        search_input.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::CloseSearch);
        bindings.insert(KeyContext::SearchInput, search_input);

        // Level picker bindings
        let mut picker = HashMap::new();
        picker.insert(KeyBinding::new(KeyCode::Up), Action::LevelUp);
        picker.insert(KeyBinding::new(KeyCode::Down), Action::LevelDown);
        picker.insert(KeyBinding::new(KeyCode::Char('k')), Action::LevelUp);
        picker.insert(KeyBinding::new(KeyCode::Char('j')), Action::LevelDown);
        picker.insert(KeyBinding::new(KeyCode::Enter), Action::LevelSelect);
        picker.insert(KeyBinding::new(KeyCode::Esc), Action::CloseLevelPicker);
        picker.insert(KeyBinding::new(KeyCode::Char('l')), Action::CloseLevelPicker);
        picker.insert(KeyBinding::new(KeyCode::F(2)), Action::CloseLevelPicker);
        bindings.insert(KeyContext::LevelPicker, picker);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|context_bindings| context_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Overlays swallow everything else
        if context == KeyContext::LevelPicker {
            return None;
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event in search input mode.
    /// Returns Some(Action) for special keys, None for regular character input
    pub fn get_search_input_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self
            .bindings
            .get(&KeyContext::SearchInput)
            .and_then(|search_bindings| search_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // For regular characters, return SearchInput action
        if let KeyCode::Char(c) = key.code {
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                return Some(Action::SearchInput(c));
            }
        }

        None
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_context_specific_keys() {
        let kb = KeyBindings::new();
        let j = key(KeyCode::Char('j'));

        assert_eq!(kb.get_action(KeyContext::UnitList, &j), Some(Action::ListDown));
        assert_eq!(kb.get_action(KeyContext::LogViewer, &j), Some(Action::ScrollDown(1)));
        assert_eq!(kb.get_action(KeyContext::LevelPicker, &j), Some(Action::LevelDown));
    }

    #[test]
    fn test_global_fallback() {
        let kb = KeyBindings::new();
        for context in [KeyContext::UnitList, KeyContext::LogViewer] {
            assert_eq!(
                kb.get_action(context.clone(), &key(KeyCode::F(2))),
                Some(Action::OpenLevelPicker)
            );
            assert_eq!(
                kb.get_action(context, &key(KeyCode::F(1))),
                Some(Action::ToggleActiveOnly)
            );
        }
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(kb.get_action(KeyContext::UnitList, &ctrl_c), Some(Action::Quit));
    }

    #[test]
    fn test_level_picker_swallows_globals() {
        let kb = KeyBindings::new();
        assert_eq!(kb.get_action(KeyContext::LevelPicker, &key(KeyCode::Char('q'))), None);
    }

    #[test]
    fn test_shifted_letters() {
        let kb = KeyBindings::new();
        let stop = KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT);
        let bottom = KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT);

        assert_eq!(kb.get_action(KeyContext::UnitList, &stop), Some(Action::StopUnit));
        assert_eq!(
            kb.get_action(KeyContext::LogViewer, &bottom),
            Some(Action::ScrollToBottom)
        );
    }

    #[test]
    fn test_search_input_captures_chars() {
        let kb = KeyBindings::new();
        assert_eq!(
            kb.get_search_input_action(&key(KeyCode::Char('q'))),
            Some(Action::SearchInput('q'))
        );
        assert_eq!(
            kb.get_search_input_action(&key(KeyCode::Enter)),
            Some(Action::ApplySearch)
        );
        assert_eq!(kb.get_search_input_action(&key(KeyCode::Left)), None);
    }
}
