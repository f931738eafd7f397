//! Keyboard mapping
//!
//! Key names are normalized DOM-style names (`ArrowRight`, `PageDown`,
//! `Escape`); legacy `Left`/`Right` names are accepted as well.

use crate::panels::ReadingDirection;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn has_modifiers(&self) -> bool {
        self.ctrl || self.alt || self.meta || self.shift
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    PanelForward,
    PanelBack,
    Close,
}

const LTR_FORWARD: &[&str] = &["ArrowRight", "Right", "PageDown"];
const LTR_BACK: &[&str] = &["ArrowLeft", "Left", "PageUp"];
const RTL_FORWARD: &[&str] = &["ArrowLeft", "Left", "PageDown"];
const RTL_BACK: &[&str] = &["ArrowRight", "Right", "PageUp"];

/// Map a key press to a reader command
///
/// Panel keys only apply while panel mode is on; otherwise the carousel's
/// own key handling is left alone.
pub fn map_key(event: &KeyEvent, panel_mode: bool, direction: ReadingDirection) -> Option<KeyCommand> {
    if event.has_modifiers() {
        return None;
    }

    let key = event.key.as_str();

    if panel_mode {
        let (forward, back) = match direction {
            ReadingDirection::Ltr => (LTR_FORWARD, LTR_BACK),
            ReadingDirection::Rtl => (RTL_FORWARD, RTL_BACK),
        };
        if forward.contains(&key) {
            return Some(KeyCommand::PanelForward);
        }
        if back.contains(&key) {
            return Some(KeyCommand::PanelBack);
        }
    }

    (key == "Escape").then_some(KeyCommand::Close)
}
