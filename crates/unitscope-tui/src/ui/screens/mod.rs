mod monitor;

pub use monitor::MonitorScreen;
