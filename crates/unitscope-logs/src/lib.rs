//! Log streaming for unitscope
//!
//! This crate provides the follow pipelines, the display pump, the
//! scrollback view and the switcher that ties them to a selection.

mod filter;
mod format;
mod lines;
mod pipe;
mod pump;
mod switcher;
mod view;

pub use filter::{FilterContext, SearchFilter};
pub use format::{LogPalette, format_record, sgr, strip_ansi};
pub use lines::LineAssembler;
pub use pipe::{
    DEFAULT_CAPACITY, DEFAULT_PUMP_INTERVAL, DEFAULT_SINCE, LogPipe, PipeError, PipeFault,
    PipeOptions,
};
pub use pump::{DisplaySink, SinkError, pump};
pub use switcher::StreamSwitcher;
pub use view::{DEFAULT_VIEW_CAPACITY, LogView};

// Re-export types used in our public API
pub use unitscope_types::{SelectionItem, SeverityThreshold};
