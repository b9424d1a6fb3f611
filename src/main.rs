mod config;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use config::Config;
use unitscope_journal::{JournalCtl, LogSource, SystemCtl, UnitInventory};
use unitscope_logs::{FilterContext, LogView, PipeFault, PipeOptions, StreamSwitcher};
use unitscope_tui::{
    Action, AppState, Event, EventHandler, Focus, HelpOverlay, KeyBindings, KeyContext,
    LevelPicker, MonitorScreen, Tui,
};
use unitscope_types::{MatchSpec, Priority, SelectionItem, SeverityThreshold, UnitInfo};

/// Unitscope - A terminal UI for following systemd unit logs
#[derive(Parser, Debug)]
#[command(name = "unitscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log color theme (terminal, ice)
    #[arg(long)]
    theme: Option<String>,

    /// Hours of history to show before following
    #[arg(long)]
    since_hours: Option<u64>,

    /// Lines kept in each log view
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Initial log level, 0 (emergency) to 7 (debug)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=7))]
    threshold: Option<u8>,

    /// Only list active units
    #[arg(long)]
    active_only: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Config file (default: <config dir>/unitscope/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    apply_args(&mut config, &args);
    config.validate()?;

    init_tracing(config.log_file.as_deref())?;

    // Run the application
    let result = run_app(config).await;

    // Handle any errors
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

/// Command-line flags win over the config file
fn apply_args(config: &mut Config, args: &Args) {
    if let Some(theme) = &args.theme {
        config.theme = theme.clone();
    }
    if let Some(hours) = args.since_hours {
        config.since_hours = hours;
    }
    if let Some(size) = args.buffer_size {
        config.buffer_size = size;
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if args.active_only {
        config.active_only = true;
    }
    if args.log_file.is_some() {
        config.log_file = args.log_file.clone();
    }
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Internal actions for async operations
enum InternalAction {
    LoadUnits,
    UnitsLoaded(Vec<UnitInfo>),
    SwitchMain,
    StartUnit(String),
    StopUnit(String),
    Error(String),
}

/// Source for the global error panel
fn errors_selection() -> SelectionItem {
    SelectionItem::new("Errors", "All errors in the log", MatchSpec::default())
}

async fn run_app(config: Config) -> Result<()> {
    // Create action channels
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (internal_tx, mut internal_rx) = mpsc::unbounded_channel::<InternalAction>();
    let (fault_tx, mut fault_rx) = mpsc::unbounded_channel::<PipeFault>();

    let journal: Arc<dyn LogSource> = Arc::new(JournalCtl::new());
    let inventory: Arc<dyn UnitInventory> = Arc::new(SystemCtl::new());

    let options = PipeOptions {
        view: "main".to_string(),
        capacity: config.channel_capacity,
        since: config.since(),
        pump_interval: config.pump_interval(),
        palette: config.palette(),
        faults: Some(fault_tx),
        generation: 0,
    };

    // One view per pane, each fed by its own switcher
    let main_view = LogView::new(config.buffer_size);
    let error_view = LogView::new(config.buffer_size);
    let mut main_switcher =
        StreamSwitcher::new(journal.clone(), main_view.clone(), options.clone());
    let mut error_switcher = StreamSwitcher::new(
        journal,
        error_view.clone(),
        PipeOptions {
            view: "errors".to_string(),
            ..options
        },
    );

    let mut state = AppState::new(
        FilterContext::new(config.threshold(), ""),
        config.active_only,
    );

    let error_filter = FilterContext::new(SeverityThreshold::from(Priority::Error), "");
    if let Err(e) = error_switcher.switch_to(&errors_selection(), &error_filter).await {
        state.show_error(format!("Error log unavailable: {}", e));
    }
    let _ = internal_tx.send(InternalAction::SwitchMain);
    let _ = internal_tx.send(InternalAction::LoadUnits);

    // Initialize TUI
    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    let keybindings = KeyBindings::new();

    render(&mut tui, &mut state, &main_view, &error_view)?;

    // Main event loop
    loop {
        tokio::select! {
            // Handle terminal events
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        let action = if state.ui_state.search_active {
                            keybindings.get_search_input_action(&key)
                        } else if state.ui_state.level_picker_open {
                            keybindings.get_action(KeyContext::LevelPicker, &key)
                        } else {
                            let context = match state.ui_state.focus {
                                Focus::Units => KeyContext::UnitList,
                                Focus::Log => KeyContext::LogViewer,
                            };
                            keybindings.get_action(context, &key)
                        };

                        if let Some(action) = action {
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Tick | Event::Resize(_, _) => {
                        // Views are redrawn below
                    }
                    Event::Error(e) => {
                        state.show_error(e);
                    }
                }
            }

            // Handle user actions
            Some(action) = action_rx.recv() => {
                handle_action(&mut state, &main_view, &internal_tx, action);
            }

            // Fatal pipeline exits are shown, never retried
            Some(fault) = fault_rx.recv() => {
                let current = main_switcher.is_current_fault(&fault)
                    || error_switcher.is_current_fault(&fault);
                if current {
                    state.show_error(format!("{} log stopped: {}", fault.view, fault.message));
                } else {
                    tracing::debug!(
                        view = %fault.view,
                        generation = fault.generation,
                        "ignoring fault from a replaced pipeline"
                    );
                }
            }

            // Handle internal async actions
            Some(internal) = internal_rx.recv() => {
                match internal {
                    InternalAction::LoadUnits => {
                        let inventory = inventory.clone();
                        let internal_tx = internal_tx.clone();
                        tokio::spawn(async move {
                            let msg = match inventory.list_units().await {
                                Ok(units) => InternalAction::UnitsLoaded(units),
                                Err(e) => InternalAction::Error(format!("Failed to list units: {}", e)),
                            };
                            let _ = internal_tx.send(msg);
                        });
                    }

                    InternalAction::UnitsLoaded(units) => {
                        if state.set_units(units) {
                            let _ = internal_tx.send(InternalAction::SwitchMain);
                        }
                    }

                    InternalAction::SwitchMain => {
                        if let Some(selection) = state.selected_item().cloned() {
                            state.ui_state.log_scroll = 0;
                            if let Err(e) = main_switcher.switch_to(&selection, &state.filter).await {
                                state.show_error(format!("Failed to follow {}: {}", selection.name, e));
                            }
                        }
                    }

                    InternalAction::StartUnit(name) => {
                        spawn_unit_command(&inventory, &internal_tx, name, true);
                    }

                    InternalAction::StopUnit(name) => {
                        spawn_unit_command(&inventory, &internal_tx, name, false);
                    }

                    InternalAction::Error(msg) => {
                        state.show_error(msg);
                    }
                }
            }
        }

        if state.should_quit {
            break;
        }

        render(&mut tui, &mut state, &main_view, &error_view)?;
    }

    // Cleanup: every pipeline is fully down before the terminal is restored
    main_switcher.stop().await;
    error_switcher.stop().await;
    events.shutdown().await;
    tui.restore()?;

    Ok(())
}

/// Start or stop a unit in the background, then reload the inventory
fn spawn_unit_command(
    inventory: &Arc<dyn UnitInventory>,
    internal_tx: &mpsc::UnboundedSender<InternalAction>,
    name: String,
    start: bool,
) {
    let inventory = inventory.clone();
    let internal_tx = internal_tx.clone();
    tokio::spawn(async move {
        let result = if start {
            inventory.start_unit(&name).await
        } else {
            inventory.stop_unit(&name).await
        };

        if let Err(e) = result {
            let verb = if start { "start" } else { "stop" };
            tracing::warn!(unit = %name, error = %e, "unit command failed");
            let _ = internal_tx.send(InternalAction::Error(format!(
                "Failed to {} {}: {}",
                verb, name, e
            )));
        }
        let _ = internal_tx.send(InternalAction::LoadUnits);
    });
}

fn handle_action(
    state: &mut AppState,
    main_view: &LogView,
    internal_tx: &mpsc::UnboundedSender<InternalAction>,
    action: Action,
) {
    let switch = match action {
        Action::Quit => {
            state.should_quit = true;
            false
        }
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
            false
        }
        Action::FocusLog => {
            state.ui_state.focus = Focus::Log;
            false
        }
        Action::FocusUnits => {
            state.ui_state.focus = Focus::Units;
            false
        }

        // Every selection change follows the new selection
        Action::ListUp => state.list_up(),
        Action::ListDown => state.list_down(),
        Action::ListTop => state.select(0),
        Action::ListBottom => state.select(state.selections.len().saturating_sub(1)),

        // Search
        Action::OpenSearch => {
            state.start_search();
            false
        }
        Action::CloseSearch => {
            state.cancel_search();
            false
        }
        Action::SearchInput(c) => {
            state.search_input_char(c);
            false
        }
        Action::SearchBackspace => {
            state.search_input_backspace();
            false
        }
        Action::SearchClear => {
            state.ui_state.search_input.clear();
            false
        }
        Action::ApplySearch => state.apply_search(),
        Action::ClearSearch => state.clear_search(),
        Action::ToggleCaseSensitive => state.toggle_case_sensitive(),

        // Level picker
        Action::OpenLevelPicker => {
            state.open_level_picker();
            false
        }
        Action::CloseLevelPicker => {
            state.close_level_picker();
            false
        }
        Action::LevelUp => {
            state.level_up();
            false
        }
        Action::LevelDown => {
            state.level_down();
            false
        }
        Action::LevelSelect => state.select_level(),

        // Units
        Action::ToggleActiveOnly => state.toggle_active_only(),
        Action::RefreshUnits => {
            let _ = internal_tx.send(InternalAction::LoadUnits);
            false
        }
        Action::StartUnit | Action::StopUnit => {
            match state.selected_item().and_then(|s| s.unit.clone()) {
                Some(name) if action == Action::StartUnit => {
                    let _ = internal_tx.send(InternalAction::StartUnit(name));
                }
                Some(name) => {
                    let _ = internal_tx.send(InternalAction::StopUnit(name));
                }
                None => state.show_error("Select a unit first".to_string()),
            }
            false
        }

        // Log viewer actions
        Action::ScrollUp(n) => {
            main_view.set_follow(false);
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_sub(n);
            false
        }
        Action::ScrollDown(n) => {
            main_view.set_follow(false);
            // Clamped to the actual bottom at render time
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_add(n);
            false
        }
        Action::PageUp => {
            main_view.set_follow(false);
            let page = state.ui_state.log_page;
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_sub(page);
            false
        }
        Action::PageDown => {
            main_view.set_follow(false);
            let page = state.ui_state.log_page;
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_add(page);
            false
        }
        Action::ScrollToTop => {
            main_view.set_follow(false);
            state.ui_state.log_scroll = 0;
            false
        }
        Action::ScrollToBottom => {
            main_view.set_follow(true);
            false
        }
        Action::ToggleFollow => {
            main_view.set_follow(!main_view.follow());
            false
        }

        Action::ShowError(msg) => {
            state.show_error(msg);
            false
        }
        Action::DismissError => {
            state.dismiss_error();
            false
        }
        Action::Render => false,
    };

    if switch {
        let _ = internal_tx.send(InternalAction::SwitchMain);
    }
}

fn render(
    tui: &mut Tui,
    state: &mut AppState,
    main_view: &LogView,
    error_view: &LogView,
) -> Result<()> {
    tui.draw(|frame| {
        MonitorScreen::render(frame, state, main_view, error_view);

        if state.ui_state.level_picker_open {
            LevelPicker::render(frame, state);
        }

        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<InternalAction>) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        while let Ok(action) = rx.try_recv() {
            kinds.push(match action {
                InternalAction::LoadUnits => "load",
                InternalAction::UnitsLoaded(_) => "loaded",
                InternalAction::SwitchMain => "switch",
                InternalAction::StartUnit(_) => "start",
                InternalAction::StopUnit(_) => "stop",
                InternalAction::Error(_) => "error",
            });
        }
        kinds
    }

    fn state() -> AppState {
        let mut state = AppState::new(FilterContext::default(), false);
        state.set_units(vec![UnitInfo::new("web.service", "Web")]);
        state
    }

    #[test]
    fn test_selection_change_requests_switch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = state();
        let view = LogView::new(10);

        handle_action(&mut state, &view, &tx, Action::ListDown);
        handle_action(&mut state, &view, &tx, Action::ListTop);
        handle_action(&mut state, &view, &tx, Action::ListTop);
        assert_eq!(drain(&mut rx), vec!["switch", "switch"]);
    }

    #[test]
    fn test_filter_changes_request_switch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = state();
        let view = LogView::new(10);

        handle_action(&mut state, &view, &tx, Action::OpenLevelPicker);
        handle_action(&mut state, &view, &tx, Action::LevelUp);
        handle_action(&mut state, &view, &tx, Action::LevelSelect);
        handle_action(&mut state, &view, &tx, Action::OpenSearch);
        handle_action(&mut state, &view, &tx, Action::SearchInput('x'));
        handle_action(&mut state, &view, &tx, Action::ApplySearch);
        handle_action(&mut state, &view, &tx, Action::ToggleCaseSensitive);
        assert_eq!(drain(&mut rx), vec!["switch", "switch", "switch"]);
        assert_eq!(state.filter.threshold.level(), 5);
    }

    #[test]
    fn test_unit_commands_need_a_unit() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = state();
        let view = LogView::new(10);

        handle_action(&mut state, &view, &tx, Action::StartUnit);
        assert!(state.ui_state.error_message.is_some());
        assert!(drain(&mut rx).is_empty());

        handle_action(&mut state, &view, &tx, Action::ListBottom);
        handle_action(&mut state, &view, &tx, Action::StopUnit);
        assert_eq!(drain(&mut rx), vec!["switch", "stop"]);
    }

    #[test]
    fn test_scrolling_leaves_follow_mode() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut state = state();
        let view = LogView::new(10);

        handle_action(&mut state, &view, &tx, Action::ScrollUp(3));
        assert!(!view.follow());
        handle_action(&mut state, &view, &tx, Action::ScrollToBottom);
        assert!(view.follow());
    }

    #[test]
    fn test_errors_view_follows_all_errors() {
        let filter = FilterContext::new(SeverityThreshold::from(Priority::Error), "");
        let spec = filter.match_spec(&errors_selection());

        assert_eq!(spec.len(), 4);
        assert!(spec.clauses().iter().all(|c| c.field == "PRIORITY"));
        assert_eq!(filter.title(&errors_selection()), "Errors");
    }

    #[test]
    fn test_oversized_since_hours_rejected() {
        let args = Args::parse_from(["unitscope", "--since-hours", "36000000000000"]);
        let mut config = Config::default();
        apply_args(&mut config, &args);

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "unitscope",
            "--theme",
            "ice",
            "--threshold",
            "3",
            "--active-only",
        ]);
        let mut config = Config::default();
        apply_args(&mut config, &args);

        assert_eq!(config.theme, "ice");
        assert_eq!(config.threshold, 3);
        assert!(config.active_only);
        assert_eq!(config.since_hours, 24);
    }
}
