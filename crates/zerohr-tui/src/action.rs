/// Actions that the TUI can process, mapped from keyboard input or internal events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Submit,
    Cancel,
    ClearInput,
    Copy,
    ResetSession,
    ToggleFocus,
    ToggleHelp,
    Back,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Home,
    End,
    PageUp,
    PageDown,
    Insert(char),
    Paste(String),
    Newline,
    Backspace,
    Delete,
    Tick,
    Resize(u16, u16),
    None,
}
