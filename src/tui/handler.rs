use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    MoveToTop,
    MoveToBottom,
    Select,
    Back,
    Refresh,
    Retry,
    ToggleFavorite,
    OpenInBrowser,
    OpenHdInBrowser,
    ShowList,
    ShowFavorites,
    ShowSettings,
    CycleTheme,
    ClearCache,
    // Jump-to-date input actions
    JumpToDateStart,
    DateInputChar(char),
    DateInputBackspace,
    DateInputConfirm,
    DateInputCancel,
    ShowHelp,
    HideHelp,
}

pub fn handle_key_event(
    key: KeyEvent,
    date_input_active: bool,
    error_screen_active: bool,
    show_help: bool,
) -> Option<AppAction> {
    // If help is showing, any key closes it
    if show_help {
        return Some(AppAction::HideHelp);
    }

    // Date input mode
    if date_input_active {
        return match key.code {
            KeyCode::Enter => Some(AppAction::DateInputConfirm),
            KeyCode::Esc => Some(AppAction::DateInputCancel),
            KeyCode::Backspace => Some(AppAction::DateInputBackspace),
            KeyCode::Char(c) => Some(AppAction::DateInputChar(c)),
            _ => None,
        };
    }

    // A full-screen error only offers retry and quit
    if error_screen_active {
        return match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) => Some(AppAction::Quit),
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppAction::Quit),
            (KeyCode::Char('r'), _) | (KeyCode::Enter, _) => Some(AppAction::Retry),
            (KeyCode::Char('?'), _) => Some(AppAction::ShowHelp),
            _ => None,
        };
    }

    // Normal mode
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => Some(AppAction::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppAction::Quit),

        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(AppAction::MoveDown),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(AppAction::MoveUp),
        (KeyCode::Char('<'), _) => Some(AppAction::MoveToTop),
        (KeyCode::Char('>'), _) => Some(AppAction::MoveToBottom),

        (KeyCode::Enter, _) => Some(AppAction::Select),
        (KeyCode::Esc, _) => Some(AppAction::Back),

        (KeyCode::Char('r'), _) => Some(AppAction::Refresh),
        (KeyCode::Char('f'), _) => Some(AppAction::ToggleFavorite),
        (KeyCode::Char('o'), KeyModifiers::NONE) => Some(AppAction::OpenInBrowser),
        (KeyCode::Char('O'), KeyModifiers::SHIFT) => Some(AppAction::OpenHdInBrowser),
        (KeyCode::Char('g'), _) => Some(AppAction::JumpToDateStart),

        (KeyCode::Char('1'), _) => Some(AppAction::ShowList),
        (KeyCode::Char('2'), _) => Some(AppAction::ShowFavorites),
        (KeyCode::Char('3'), _) => Some(AppAction::ShowSettings),

        (KeyCode::Char('t'), _) => Some(AppAction::CycleTheme),
        (KeyCode::Char('c'), KeyModifiers::NONE) => Some(AppAction::ClearCache),

        (KeyCode::Char('?'), _) => Some(AppAction::ShowHelp),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn any_key_closes_help() {
        let action = handle_key_event(key(KeyCode::Char('x')), false, false, true);
        assert!(matches!(action, Some(AppAction::HideHelp)));
    }

    #[test]
    fn date_input_captures_characters() {
        let action = handle_key_event(key(KeyCode::Char('2')), true, false, false);
        assert!(matches!(action, Some(AppAction::DateInputChar('2'))));

        let action = handle_key_event(key(KeyCode::Esc), true, false, false);
        assert!(matches!(action, Some(AppAction::DateInputCancel)));
    }

    #[test]
    fn error_screen_only_retries_or_quits() {
        let action = handle_key_event(key(KeyCode::Char('r')), false, true, false);
        assert!(matches!(action, Some(AppAction::Retry)));

        let action = handle_key_event(key(KeyCode::Char('f')), false, true, false);
        assert!(action.is_none());
    }

    #[test]
    fn normal_mode_maps_navigation() {
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('j')), false, false, false),
            Some(AppAction::MoveDown)
        ));
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('f')), false, false, false),
            Some(AppAction::ToggleFavorite)
        ));
    }
}
