//! Key bindings of the review session
//!
//! Four logical actions, each bound to a fixed set of key identifiers. The
//! table is immutable and checked at compile time: every action has at least
//! one key and no key belongs to two actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Cancel,
    Accept,
    ToggleEdit,
    OpenEditor,
}

/// Keys identified by logical name, independent of the terminal encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyId {
    Escape,
    Enter,
    Space,
    Interrupt,
    Editor,
}

impl KeyId {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Escape => "escape",
            Self::Enter => "enter",
            Self::Space => "space",
            Self::Interrupt => "interrupt",
            Self::Editor => "editor",
        }
    }

    /// Label shown in the help legend
    pub const fn label(self) -> &'static str {
        match self {
            Self::Escape => "esc",
            Self::Enter => "enter",
            Self::Space => "space",
            Self::Interrupt => "ctrl+c",
            Self::Editor => "ctrl+e",
        }
    }

    const fn ordinal(self) -> u8 {
        match self {
            Self::Escape => 0,
            Self::Enter => 1,
            Self::Space => 2,
            Self::Interrupt => 3,
            Self::Editor => 4,
        }
    }

    pub fn from_event(key: &KeyEvent) -> Option<Self> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Esc => Some(Self::Escape),
            KeyCode::Enter => Some(Self::Enter),
            KeyCode::Char(' ') if !ctrl && !alt => Some(Self::Space),
            KeyCode::Char('c') if ctrl => Some(Self::Interrupt),
            KeyCode::Char('e') if ctrl => Some(Self::Editor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub action: Action,
    pub keys: &'static [KeyId],
    pub help: &'static str,
}

pub const BINDINGS: [Binding; 4] = [
    Binding {
        action: Action::Cancel,
        keys: &[KeyId::Escape, KeyId::Interrupt],
        help: "Cancel",
    },
    Binding {
        action: Action::ToggleEdit,
        keys: &[KeyId::Space],
        help: "Edit",
    },
    Binding {
        action: Action::Accept,
        keys: &[KeyId::Enter],
        help: "Accept",
    },
    Binding {
        action: Action::OpenEditor,
        keys: &[KeyId::Editor],
        help: "Editor",
    },
];

const fn bindings_are_valid(bindings: &[Binding]) -> bool {
    let mut i = 0;
    while i < bindings.len() {
        if bindings[i].keys.is_empty() {
            return false;
        }
        let mut k = 0;
        while k < bindings[i].keys.len() {
            let key = bindings[i].keys[k].ordinal();
            let mut j = i;
            while j < bindings.len() {
                let start = if j == i { k + 1 } else { 0 };
                let mut m = start;
                while m < bindings[j].keys.len() {
                    if bindings[j].keys[m].ordinal() == key {
                        return false;
                    }
                    m += 1;
                }
                j += 1;
            }
            k += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    bindings_are_valid(&BINDINGS),
    "every action needs a key and keys may not be shared"
);

/// Resolve a key event to the action it is bound to
pub fn action_for(key: &KeyEvent) -> Option<Action> {
    let id = KeyId::from_event(key)?;
    let action = BINDINGS
        .iter()
        .find(|binding| binding.keys.contains(&id))
        .map(|binding| binding.action);
    debug!("Key {} resolved to {action:?}", id.name());
    action
}

/// `(keys, description)` pairs for the help legend
pub fn help_entries() -> Vec<(String, &'static str)> {
    BINDINGS
        .iter()
        .map(|binding| {
            let keys = binding
                .keys
                .iter()
                .map(|key| key.label())
                .collect::<Vec<_>>()
                .join("/");
            (keys, binding.help)
        })
        .collect()
}
