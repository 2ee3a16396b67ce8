//! Editor keyboard shortcuts, independent of any windowing toolkit.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Tab,
    Delete,
    Backspace,
    Escape,
}

/// A key press with its modifiers. `command` is Ctrl on Linux/Windows and
/// Cmd on macOS; either one triggers the command bindings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyChord {
    pub fn plain(key: Key) -> Self {
        Self { key, ctrl: false, meta: false, shift: false }
    }

    pub fn command(key: Key) -> Self {
        Self { key, ctrl: true, meta: false, shift: false }
    }

    pub fn with_shift(self) -> Self { Self { shift: true, ..self } }

    fn has_command(&self) -> bool { self.ctrl || self.meta }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorCommand {
    AddNode,
    AddImageNode,
    AddChild,
    DeleteSelection,
    ClearSelection,
    Undo,
    Redo,
    Save,
}

/// Resolve a key press. Nothing fires while a text field has focus, so typing
/// into a label never deletes or adds nodes.
pub fn command_for(chord: &KeyChord, text_input_focused: bool) -> Option<EditorCommand> {
    if text_input_focused {
        return None;
    }
    let key = match chord.key {
        Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
        other => other,
    };
    if chord.has_command() {
        return match key {
            Key::Char('z') if chord.shift => Some(EditorCommand::Redo),
            Key::Char('z') => Some(EditorCommand::Undo),
            Key::Char('s') => Some(EditorCommand::Save),
            _ => None,
        };
    }
    match key {
        Key::Char('n') => Some(EditorCommand::AddNode),
        Key::Char('i') => Some(EditorCommand::AddImageNode),
        Key::Tab => Some(EditorCommand::AddChild),
        Key::Delete | Key::Backspace => Some(EditorCommand::DeleteSelection),
        Key::Escape => Some(EditorCommand::ClearSelection),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings() {
        assert_eq!(command_for(&KeyChord::plain(Key::Char('N')), false), Some(EditorCommand::AddNode));
        assert_eq!(command_for(&KeyChord::plain(Key::Char('i')), false), Some(EditorCommand::AddImageNode));
        assert_eq!(command_for(&KeyChord::plain(Key::Tab), false), Some(EditorCommand::AddChild));
        assert_eq!(command_for(&KeyChord::plain(Key::Backspace), false), Some(EditorCommand::DeleteSelection));
        assert_eq!(command_for(&KeyChord::plain(Key::Escape), false), Some(EditorCommand::ClearSelection));
        assert_eq!(command_for(&KeyChord::command(Key::Char('z')), false), Some(EditorCommand::Undo));
        assert_eq!(command_for(&KeyChord::command(Key::Char('Z')).with_shift(), false), Some(EditorCommand::Redo));
        let cmd_s = KeyChord { key: Key::Char('s'), ctrl: false, meta: true, shift: false };
        assert_eq!(command_for(&cmd_s, false), Some(EditorCommand::Save));
        assert_eq!(command_for(&KeyChord::plain(Key::Char('z')), false), None);
        assert_eq!(command_for(&KeyChord::command(Key::Char('n')), false), None);
    }

    #[test]
    fn text_focus_suppresses_everything() {
        for chord in [
            KeyChord::plain(Key::Delete),
            KeyChord::plain(Key::Tab),
            KeyChord::command(Key::Char('z')),
            KeyChord::command(Key::Char('s')),
        ] {
            assert_eq!(command_for(&chord, true), None);
        }
    }
}
