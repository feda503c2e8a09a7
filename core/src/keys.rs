/// Keys the search input reacts to. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    /// Command on macOS, Windows key elsewhere
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        KeyEvent {
            key,
            modifiers: Modifiers::default(),
        }
    }

    pub fn ctrl(key: Key) -> Self {
        KeyEvent {
            key,
            modifiers: Modifiers {
                ctrl: true,
                ..Modifiers::default()
            },
        }
    }

    pub fn meta(key: Key) -> Self {
        KeyEvent {
            key,
            modifiers: Modifiers {
                meta: true,
                ..Modifiers::default()
            },
        }
    }

    /// Ctrl/Cmd + K or F, the application-wide "go to search" chord.
    pub fn is_focus_chord(&self) -> bool {
        (self.modifiers.ctrl || self.modifiers.meta)
            && matches!(self.key, Key::Char(c) if c.eq_ignore_ascii_case(&'k') || c.eq_ignore_ascii_case(&'f'))
    }
}
