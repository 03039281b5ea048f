use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Route, View};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Works everywhere, including mid-request.
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if matches!(app.view, View::Login(_)) {
        handle_login_key(app, key);
    } else {
        handle_chat_key(app, key);
    }
}

fn handle_login_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Enter {
        app.submit_login();
        return;
    }

    let View::Login(state) = &mut app.view else {
        return;
    };

    match key.code {
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => state.toggle_tab(),
        KeyCode::Tab | KeyCode::Up | KeyCode::Down => state.toggle_focus(),
        KeyCode::Backspace => state.focused_field().backspace(),
        KeyCode::Delete => state.focused_field().delete(),
        KeyCode::Left => state.focused_field().left(),
        KeyCode::Right => state.focused_field().right(),
        KeyCode::Home => state.focused_field().home(),
        KeyCode::End => state.focused_field().end(),
        KeyCode::Char(c) => state.focused_field().insert(c),
        _ => {}
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        // Log out: back to the login view, discarding this one.
        app.navigate(Route::Login);
        return;
    }

    let loading = matches!(&app.view, View::Chat(state) if state.loading);

    if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
        if !loading {
            app.submit_report();
        }
        return;
    }

    if key.code == KeyCode::Enter {
        if !loading {
            app.submit_message();
        }
        return;
    }

    let View::Chat(state) = &mut app.view else {
        return;
    };

    match key.code {
        KeyCode::Up => state.scroll_up(),
        KeyCode::Down => state.scroll_down(),
        // The input is disabled while a request is in flight.
        _ if state.loading => {}
        KeyCode::Backspace => state.input.backspace(),
        KeyCode::Delete => state.input.delete(),
        KeyCode::Left => state.input.left(),
        KeyCode::Right => state.input.right(),
        KeyCode::Home => state.input.home(),
        KeyCode::End => state.input.end(),
        KeyCode::Char(c) => state.input.insert(c),
        _ => {}
    }
}
