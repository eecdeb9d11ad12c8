//! Keyboard shortcut mapping.
//!
//! "Mod" is Ctrl on Windows/Linux and Cmd on macOS; either is accepted.

use serde::{Deserialize, Serialize};

/// A key press as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_mod(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    fn has_mod(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Host focus state that suppresses shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyContext {
    pub text_input_focused: bool,
    pub preview: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorCommand {
    Undo,
    Redo,
    DeleteSelection,
    DuplicateSelection,
    Save,
    ClearSelection,
}

/// Map a key press to an editor command
pub fn command_for(event: &KeyEvent, ctx: KeyContext) -> Option<EditorCommand> {
    if ctx.text_input_focused || ctx.preview {
        return None;
    }

    let key = event.key.to_lowercase();
    if event.has_mod() && !event.alt {
        return match key.as_str() {
            "z" if event.shift => Some(EditorCommand::Redo),
            "z" => Some(EditorCommand::Undo),
            "y" => Some(EditorCommand::Redo),
            "d" => Some(EditorCommand::DuplicateSelection),
            "s" => Some(EditorCommand::Save),
            _ => None,
        };
    }

    match key.as_str() {
        "delete" | "backspace" => Some(EditorCommand::DeleteSelection),
        "escape" => Some(EditorCommand::ClearSelection),
        _ => None,
    }
}
