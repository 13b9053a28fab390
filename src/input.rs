use crate::app::View;
use crate::dispatch::FormAction;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Back,
    Select,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
    Refresh,
    RerunFailed,
    RerunAll,
    ReloadLog,
    OpenDispatch,
    OpenBrowser,
    CopyLog,
    ToggleAutoScroll,
    StartFilter,
    FilterChar(char),
    FilterBackspace,
    FilterClear,
    FilterCancel,
    FilterCommit,
    Form(FormAction),
    None,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Copy)]
pub struct InputContext {
    pub view: View,
    /// A `/` filter bar (runs list or log view) is taking text input.
    pub filter_mode: bool,
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Ctrl+C always quits
    if ctrl && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    if ctx.view == View::DispatchForm {
        return Action::Form(match key.code {
            KeyCode::Esc => FormAction::Cancel,
            KeyCode::Tab => FormAction::Next,
            KeyCode::BackTab => FormAction::Prev,
            KeyCode::Enter => FormAction::Enter,
            KeyCode::Left => FormAction::Left,
            KeyCode::Right => FormAction::Right,
            KeyCode::Up => FormAction::Up,
            KeyCode::Down => FormAction::Down,
            KeyCode::Backspace => FormAction::Backspace,
            KeyCode::Char('u') if ctrl => FormAction::ClearLine,
            KeyCode::Char(c) if !ctrl => FormAction::Char(c),
            _ => return Action::None,
        });
    }

    if ctx.filter_mode {
        return match key.code {
            KeyCode::Esc => Action::FilterCancel,
            KeyCode::Enter => Action::FilterCommit,
            KeyCode::Backspace => Action::FilterBackspace,
            KeyCode::Char('u') if ctrl => Action::FilterClear,
            KeyCode::Up => Action::MoveUp,
            KeyCode::Down => Action::MoveDown,
            KeyCode::Char(c) if !ctrl => Action::FilterChar(c),
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('r') if ctrl => Action::Refresh,
        KeyCode::Tab => Action::Refresh,
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc | KeyCode::Char('b') => Action::Back,
        KeyCode::Enter => Action::Select,
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Char('g') => Action::Top,
        KeyCode::Char('G') => Action::Bottom,
        KeyCode::Char('r') => match ctx.view {
            View::Runs | View::Jobs => Action::RerunFailed,
            View::Logs => Action::ReloadLog,
            View::PullRequests => Action::Refresh,
            _ => Action::None,
        },
        KeyCode::Char('R') => Action::RerunAll,
        KeyCode::Char('d') => Action::OpenDispatch,
        KeyCode::Char('o') => Action::OpenBrowser,
        KeyCode::Char('c') => Action::CopyLog,
        KeyCode::Char('a') => Action::ToggleAutoScroll,
        KeyCode::Char('/') => Action::StartFilter,
        _ => Action::None,
    }
}
