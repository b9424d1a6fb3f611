mod help_overlay;
mod level_picker;
mod list_selector;
mod search_bar;
mod status_bar;

pub use help_overlay::HelpOverlay;
pub use level_picker::LevelPicker;
pub use list_selector::ListSelector;
pub use search_bar::SearchBar;
pub use status_bar::{StatusBar, monitor_hints};
