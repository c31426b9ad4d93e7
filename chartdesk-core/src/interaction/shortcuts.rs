//! Keyboard shortcut resolution.
//!
//! Front ends translate their native key events into a `KeyChord`; the
//! mapping to editor commands lives here so every surface agrees on it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Delete,
    Backspace,
    Escape,
    Enter,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    /// Cmd on macOS.
    pub meta: bool,
    pub shift: bool,
}

impl KeyChord {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
        }
    }

    pub fn ctrl(c: char) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(Key::Char(c))
        }
    }

    pub fn ctrl_shift(c: char) -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::plain(Key::Char(c))
        }
    }

    fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Where keyboard focus currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFocus {
    #[default]
    Chart,
    TextField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
    DeleteSelected,
    Cancel,
}

/// Map a chord to an editor command. Nothing resolves while a text field has focus.
pub fn resolve_shortcut(chord: KeyChord, focus: InputFocus) -> Option<Shortcut> {
    if focus == InputFocus::TextField {
        return None;
    }
    match chord.key {
        Key::Char(c) if chord.command() => match c.to_ascii_lowercase() {
            'z' if chord.shift => Some(Shortcut::Redo),
            'z' => Some(Shortcut::Undo),
            'y' => Some(Shortcut::Redo),
            _ => None,
        },
        Key::Delete | Key::Backspace if !chord.command() => Some(Shortcut::DeleteSelected),
        Key::Escape => Some(Shortcut::Cancel),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_and_redo_chords() {
        let chart = InputFocus::Chart;
        assert_eq!(resolve_shortcut(KeyChord::ctrl('z'), chart), Some(Shortcut::Undo));
        assert_eq!(resolve_shortcut(KeyChord::ctrl_shift('Z'), chart), Some(Shortcut::Redo));
        assert_eq!(resolve_shortcut(KeyChord::ctrl('y'), chart), Some(Shortcut::Redo));

        let cmd_z = KeyChord {
            meta: true,
            ..KeyChord::plain(Key::Char('z'))
        };
        assert_eq!(resolve_shortcut(cmd_z, chart), Some(Shortcut::Undo));
    }

    #[test]
    fn bare_letters_do_nothing() {
        assert_eq!(resolve_shortcut(KeyChord::plain(Key::Char('z')), InputFocus::Chart), None);
    }

    #[test]
    fn delete_and_escape() {
        assert_eq!(
            resolve_shortcut(KeyChord::plain(Key::Delete), InputFocus::Chart),
            Some(Shortcut::DeleteSelected)
        );
        assert_eq!(
            resolve_shortcut(KeyChord::plain(Key::Escape), InputFocus::Chart),
            Some(Shortcut::Cancel)
        );
    }

    #[test]
    fn text_field_swallows_everything() {
        for chord in [KeyChord::ctrl('z'), KeyChord::ctrl('y'), KeyChord::plain(Key::Delete)] {
            assert_eq!(resolve_shortcut(chord, InputFocus::TextField), None);
        }
    }
}
