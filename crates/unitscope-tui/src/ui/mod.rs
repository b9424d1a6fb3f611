mod ansi;
pub mod components;
mod layout;
pub mod screens;
mod theme;

pub use ansi::ansi_line;
pub use layout::{Layout, MonitorAreas};
pub use theme::Theme;
