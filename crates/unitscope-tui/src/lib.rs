//! TUI components for unitscope
//!
//! This crate provides the terminal user interface for unitscope,
//! including state management, keybindings, event handling, and UI components.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, Focus, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{
    HelpOverlay, LevelPicker, ListSelector, SearchBar, StatusBar, monitor_hints,
};
pub use ui::screens::MonitorScreen;
pub use ui::{Layout, Theme, ansi_line};
