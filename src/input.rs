use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use tui_textarea::Input;

use crate::app::AppState;
use crate::session::{Intent, Transition};

/// Handle a mouse event
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) -> Transition {
    if state.is_searching() || state.show_help {
        return Transition::Continue;
    }
    match mouse.kind {
        MouseEventKind::ScrollUp => state.intent(Intent::PrevPage),
        MouseEventKind::ScrollDown => state.intent(Intent::NextPage),
        _ => Transition::Continue,
    }
}

/// Handle a key event and update app state accordingly
pub fn handle_key(state: &mut AppState, key: KeyEvent) -> Transition {
    // Help overlay takes priority
    if state.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
            state.show_help = false;
        }
        return Transition::Continue;
    }

    if state.is_searching() {
        handle_search_mode(state, key)
    } else {
        handle_normal_mode(state, key)
    }
}

fn handle_normal_mode(state: &mut AppState, key: KeyEvent) -> Transition {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        // Quit
        KeyCode::Char('q') => state.intent(Intent::Quit),
        KeyCode::Char('c') if ctrl => state.intent(Intent::Quit),

        // Help
        KeyCode::Char('?') => {
            state.show_help = true;
            Transition::Continue
        }

        // Search
        KeyCode::Char('s') if ctrl => state.start_search(),
        KeyCode::Char('/') => state.start_search(),

        // Pages
        KeyCode::Enter
        | KeyCode::Down
        | KeyCode::PageDown
        | KeyCode::Char('j')
        | KeyCode::Char(' ') => state.intent(Intent::NextPage),
        KeyCode::Up | KeyCode::PageUp | KeyCode::Char('k') => state.intent(Intent::PrevPage),
        KeyCode::Home | KeyCode::Char('g') => state.intent(Intent::Home),
        KeyCode::End | KeyCode::Char('G') => state.intent(Intent::End),

        // Toggle line wrap
        KeyCode::Char('w') => {
            state.toggle_line_wrap();
            Transition::Continue
        }

        _ => Transition::Continue,
    }
}

fn handle_search_mode(state: &mut AppState, key: KeyEvent) -> Transition {
    match key.code {
        KeyCode::Enter => state.commit_search(),
        KeyCode::Esc => state.cancel_search(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.intent(Intent::Quit)
        }
        _ => {
            // Forward all other keys to the textarea
            state.search_textarea.input(Input::from(key));
            Transition::Continue
        }
    }
}
