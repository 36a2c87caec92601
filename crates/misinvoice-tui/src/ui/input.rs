//! Keyboard and mouse input handling for the TUI.
//!
//! Every event counts as user activity for the idle watchdog before it is
//! interpreted.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};

use misinvoice_core::auth::ActivitySignal;
use misinvoice_core::routes::Route;

use crate::app::{App, AppState, Focus, PAGE_SCROLL_SIZE};
use crate::forms::FormFocus;

/// Map a mouse event to the activity it represents.
pub fn mouse_activity(event: &MouseEvent) -> ActivitySignal {
    match event.kind {
        MouseEventKind::Down(_) | MouseEventKind::Up(_) => ActivitySignal::Click,
        _ => ActivitySignal::PointerMove,
    }
}

pub fn handle_mouse(app: &mut App, event: MouseEvent) {
    app.record_activity(mouse_activity(&event));
}

/// Public page reached by a function key, if any.
fn public_shortcut(code: KeyCode) -> Option<Route> {
    match code {
        KeyCode::F(2) => Some(Route::Login),
        KeyCode::F(3) => Some(Route::Register),
        KeyCode::F(4) => Some(Route::ForgotPassword),
        KeyCode::F(5) => Some(Route::ResetPassword),
        KeyCode::F(6) => Some(Route::VerifyEmail),
        KeyCode::F(7) => Some(Route::ResendVerification),
        _ => None,
    }
}

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    app.record_activity(ActivitySignal::KeyPress);

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::F(1)) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    if key.code == KeyCode::F(1) {
        app.state = AppState::ShowingHelp;
        return Ok(false);
    }
    if let Some(route) = public_shortcut(key.code) {
        app.navigate(route.path());
        return Ok(false);
    }

    if app.form.is_some() {
        handle_form_input(app, key).await;
        return Ok(false);
    }

    // Global keys on protected pages
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('l') => {
            app.logout();
        }
        KeyCode::Char('p') => {
            app.navigate(Route::ForgotPassword.path());
        }
        KeyCode::Char('r') => {
            app.refresh_current();
        }
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            app.open_nav_entry(index);
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.focus = match app.focus {
                Focus::Drawer => Focus::Content,
                Focus::Content => Focus::Drawer,
            };
        }
        KeyCode::Esc => {
            app.focus = Focus::Content;
        }
        _ => match app.focus {
            Focus::Drawer => handle_drawer_input(app, key),
            Focus::Content => handle_content_input(app, key),
        },
    }

    Ok(false)
}

fn handle_drawer_input(app: &mut App, key: KeyEvent) {
    let max_index = app.nav_entries().len().saturating_sub(1);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.drawer_selection = (app.drawer_selection + 1).min(max_index);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.drawer_selection = app.drawer_selection.saturating_sub(1);
        }
        KeyCode::Home => {
            app.drawer_selection = 0;
        }
        KeyCode::End => {
            app.drawer_selection = max_index;
        }
        KeyCode::Enter => {
            app.open_nav_entry(app.drawer_selection);
            app.focus = Focus::Content;
        }
        _ => {}
    }
}

fn handle_content_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.select_row(1),
        KeyCode::Char('k') | KeyCode::Up => app.select_row(-1),
        KeyCode::PageDown => app.select_row(PAGE_SCROLL_SIZE as isize),
        KeyCode::PageUp => app.select_row(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::Home => app.select_row(isize::MIN),
        KeyCode::End => app.select_row(isize::MAX),
        _ => {}
    }
}

async fn handle_form_input(app: &mut App, key: KeyEvent) {
    let on_login = app.current_route == Route::Login;
    let Some(form) = app.form.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Esc => {
            if on_login {
                app.state = AppState::ConfirmingQuit;
            } else {
                app.navigate(Route::Login.path());
            }
        }
        KeyCode::Down | KeyCode::Tab => form.next_focus(),
        KeyCode::Up | KeyCode::BackTab => form.prev_focus(),
        KeyCode::Left | KeyCode::Right if form.focus == FormFocus::Role => form.cycle_role(),
        KeyCode::Char(' ') if form.focus == FormFocus::Role => form.cycle_role(),
        KeyCode::Enter => {
            if form.focus == FormFocus::Button {
                app.submit_form().await;
            } else {
                form.next_focus();
            }
        }
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
}
