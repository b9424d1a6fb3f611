/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHelp,

    // Focus
    FocusLog,
    FocusUnits,

    // Unit list navigation (every move switches the main view)
    ListUp,
    ListDown,
    ListTop,
    ListBottom,

    // Search in the main view
    OpenSearch,
    CloseSearch,
    SearchInput(char),
    SearchBackspace,
    SearchClear,
    ApplySearch,
    ClearSearch,
    ToggleCaseSensitive,

    // Log-level picker
    OpenLevelPicker,
    CloseLevelPicker,
    LevelUp,
    LevelDown,
    LevelSelect,

    // Unit list content
    ToggleActiveOnly,
    RefreshUnits,
    StartUnit,
    StopUnit,

    // Log viewer actions
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollToTop,
    ScrollToBottom,
    PageUp,
    PageDown,
    ToggleFollow,

    // Error handling
    ShowError(String),
    DismissError,

    // Render request
    Render,
}
