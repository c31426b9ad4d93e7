//! Input dispatch: overlays, then chart text entry, then editor shortcuts, then app keys.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use chartdesk_core::domain::Point;
use chartdesk_core::drawing::Tool;
use chartdesk_core::indicators::{search, IndicatorKey};
use chartdesk_core::interaction::{resolve_shortcut, ContainerRect, InputFocus, Key, KeyChord, PointerEvent, PointerKind};

use crate::app::{AlertAction, AlertForm, AppState, Overlay, PromptKind};

/// Translate a crossterm key into the editor's chord.
pub fn chord(key: &KeyEvent) -> KeyChord {
    let k = match key.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Delete => Key::Delete,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Esc => Key::Escape,
        KeyCode::Enter => Key::Enter,
        _ => Key::Other,
    };
    KeyChord {
        key: k,
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        meta: key.modifiers.contains(KeyModifiers::SUPER),
        shift: key.modifiers.contains(KeyModifiers::SHIFT),
    }
}

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        app.running = false;
        return;
    }

    // 1. Overlays consume input first.
    let overlay = std::mem::replace(&mut app.overlay, Overlay::None);
    if overlay != Overlay::None {
        let next = handle_overlay(app, overlay, key);
        // A handler may itself have opened another overlay.
        if app.overlay == Overlay::None {
            app.overlay = next;
        }
        return;
    }

    // 2. An open text annotation takes every key.
    if app.session.router().focus() == InputFocus::TextField {
        handle_text_entry(app, key);
        return;
    }

    // 3. Editor shortcuts.
    if let Some(shortcut) = resolve_shortcut(chord(&key), InputFocus::Chart) {
        app.apply_shortcut(shortcut);
        return;
    }

    // 4. App keys.
    if ctrl {
        match key.code {
            KeyCode::Char('t') => app.new_tab(),
            KeyCode::Char('w') => app.close_active_tab(),
            _ => {}
        }
        return;
    }
    match key.code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('v') => app.select_tool(Tool::Select),
        KeyCode::Char('t') => app.select_tool(Tool::Trendline),
        KeyCode::Char('r') => app.select_tool(Tool::Rectangle),
        KeyCode::Char('w') => app.select_tool(Tool::Arrow),
        KeyCode::Char('f') => app.select_tool(Tool::Fib),
        KeyCode::Char('h') => app.select_tool(Tool::Hline),
        KeyCode::Char('n') => app.select_tool(Tool::Text),
        KeyCode::Char('E') => app.select_tool(Tool::Erase),
        KeyCode::Char(c @ '1'..='5') => {
            let i = c as usize - '1' as usize;
            app.toggle_indicator(IndicatorKey::ALL[i]);
        }
        KeyCode::Char('i') => {
            app.overlay = Overlay::IndicatorSearch {
                query: String::new(),
                cursor: 0,
            }
        }
        KeyCode::Char('A') => app.overlay = Overlay::AlertForm(AlertForm::new(app.session.last_close())),
        KeyCode::Char('L') => app.overlay = Overlay::AlertList { cursor: 0 },
        KeyCode::Char('/') => prompt(app, PromptKind::Symbol, String::new()),
        KeyCode::Char('R') => {
            let label = app.session.label().to_string();
            prompt(app, PromptKind::RenameTab, label);
        }
        KeyCode::Char('I') => prompt(app, PromptKind::ImportPath, String::new()),
        KeyCode::Char('X') => app.export_active(),
        KeyCode::Char('[') => app.cycle_timeframe(false),
        KeyCode::Char(']') => app.cycle_timeframe(true),
        KeyCode::Tab => app.next_tab(),
        KeyCode::BackTab => app.prev_tab(),
        KeyCode::Char('b') => app.show_sidebar = !app.show_sidebar,
        KeyCode::Char('g') | KeyCode::F(5) => app.refresh_feed(),
        KeyCode::Char('?') => app.overlay = Overlay::Help,
        KeyCode::Char('e') => {
            app.error_scroll = 0;
            app.overlay = Overlay::ErrorHistory;
        }
        _ => {}
    }
}

fn prompt(app: &mut AppState, kind: PromptKind, input: String) {
    app.overlay = Overlay::Prompt { kind, input };
}

fn handle_text_entry(app: &mut AppState, key: KeyEvent) {
    let outcome = match key.code {
        KeyCode::Enter => app.session.interact(|router, store| router.confirm_text(store)),
        KeyCode::Esc => app.session.interact(|router, _| router.cancel_text()),
        KeyCode::Backspace => {
            app.session.interact(|router, _| router.text_backspace());
            return;
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.session.interact(|router, _| router.text_input(c));
            return;
        }
        _ => return,
    };
    app.describe(outcome);
}

/// Returns the overlay to show after this key.
fn handle_overlay(app: &mut AppState, overlay: Overlay, key: KeyEvent) -> Overlay {
    match overlay {
        Overlay::None => Overlay::None,
        Overlay::Help => {
            app.welcome_dismissed = true;
            Overlay::None
        }
        Overlay::ErrorHistory => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => Overlay::None,
            KeyCode::Char('j') | KeyCode::Down => {
                if app.error_scroll + 1 < app.error_history.len() {
                    app.error_scroll += 1;
                }
                Overlay::ErrorHistory
            }
            KeyCode::Char('k') | KeyCode::Up => {
                app.error_scroll = app.error_scroll.saturating_sub(1);
                Overlay::ErrorHistory
            }
            _ => Overlay::ErrorHistory,
        },
        Overlay::IndicatorSearch { mut query, mut cursor } => {
            let matches = search(&query);
            match key.code {
                KeyCode::Esc => return Overlay::None,
                KeyCode::Enter => {
                    if let Some(k) = matches.get(cursor) {
                        app.toggle_indicator(*k);
                    }
                }
                KeyCode::Down => cursor = (cursor + 1).min(matches.len().saturating_sub(1)),
                KeyCode::Up => cursor = cursor.saturating_sub(1),
                KeyCode::Backspace => {
                    query.pop();
                    cursor = 0;
                }
                KeyCode::Char(c) => {
                    query.push(c);
                    cursor = 0;
                }
                _ => {}
            }
            Overlay::IndicatorSearch { query, cursor }
        }
        Overlay::AlertForm(mut form) => {
            match key.code {
                KeyCode::Esc => return Overlay::None,
                KeyCode::Enter => match app.create_alert(&form) {
                    Ok(_) => return Overlay::None,
                    Err(e) => form.error = Some(e.to_string()),
                },
                KeyCode::Tab => form.cycle_condition(true),
                KeyCode::BackTab => form.cycle_condition(false),
                KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => form.repeat = !form.repeat,
                KeyCode::Backspace => {
                    form.threshold.pop();
                    form.error = None;
                }
                KeyCode::Char(c) => {
                    form.threshold.push(c);
                    form.error = None;
                }
                _ => {}
            }
            Overlay::AlertForm(form)
        }
        Overlay::AlertList { mut cursor } => {
            let action = match key.code {
                KeyCode::Esc | KeyCode::Char('L') | KeyCode::Char('q') => return Overlay::None,
                KeyCode::Char('j') | KeyCode::Down => {
                    cursor = (cursor + 1).min(app.alert_rules.len().saturating_sub(1));
                    None
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    cursor = cursor.saturating_sub(1);
                    None
                }
                KeyCode::Char(' ') => Some(AlertAction::ToggleActive),
                KeyCode::Char('r') => Some(AlertAction::Reset),
                KeyCode::Char('s') => Some(AlertAction::Snooze),
                KeyCode::Char('d') | KeyCode::Delete => Some(AlertAction::Delete),
                _ => None,
            };
            if let Some(action) = action {
                app.alert_action(cursor, action);
                cursor = cursor.min(app.alert_rules.len().saturating_sub(1));
            }
            Overlay::AlertList { cursor }
        }
        Overlay::Prompt { kind, mut input } => {
            match key.code {
                KeyCode::Esc => return Overlay::None,
                KeyCode::Enter => {
                    match kind {
                        PromptKind::Symbol => app.set_symbol(&input),
                        PromptKind::RenameTab => app.rename_active_tab(&input),
                        PromptKind::ImportPath => app.request_import(&input),
                    }
                    return Overlay::None;
                }
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            }
            Overlay::Prompt { kind, input }
        }
    }
}

/// Left-button gestures on the plot become pointer events in chart space.
pub fn handle_mouse(app: &mut AppState, mouse: MouseEvent) {
    if app.overlay != Overlay::None {
        return;
    }
    let plot = app.layout.plot;
    let container = ContainerRect::new(plot.x as f64, plot.y as f64, plot.width as f64, plot.height as f64);
    let client = Point::new(mouse.column as f64, mouse.row as f64);
    let kind = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let text_open = app.session.router().text_entry().is_some();
            if !container.contains(client) && !text_open {
                return;
            }
            PointerKind::Down
        }
        MouseEventKind::Drag(MouseButton::Left) => PointerKind::Move,
        MouseEventKind::Up(MouseButton::Left) => PointerKind::Up,
        _ => return,
    };
    app.handle_pointer(PointerEvent {
        kind,
        at: container.to_local(client),
    });
}
