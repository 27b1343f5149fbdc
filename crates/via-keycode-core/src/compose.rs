//! Modifier wrapping
//!
//! Turns a base keycode plus a [`ModifierSelection`] into a wrapped keycode
//! string such as `LSFT(LCTL(KC_A))`. Modifiers are tested in the fixed order
//! shift, ctrl, alt, gui and the first selected one ends up outermost.

use crate::basic::is_sentinel;
use crate::model::ModifierSelection;

/// Modifier kind, independent of hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Shift,
    Ctrl,
    Alt,
    Gui,
}

impl Modifier {
    /// Wrapping order, outermost first
    pub const ORDER: [Modifier; 4] = [
        Modifier::Shift,
        Modifier::Ctrl,
        Modifier::Alt,
        Modifier::Gui,
    ];

    /// Name of the wrapping function for this modifier
    pub fn function_name(self, use_right: bool) -> &'static str {
        match (self, use_right) {
            (Modifier::Shift, false) => "LSFT",
            (Modifier::Ctrl, false) => "LCTL",
            (Modifier::Alt, false) => "LALT",
            (Modifier::Gui, false) => "LGUI",
            (Modifier::Shift, true) => "RSFT",
            (Modifier::Ctrl, true) => "RCTL",
            (Modifier::Alt, true) => "RALT",
            (Modifier::Gui, true) => "RGUI",
        }
    }

    fn is_selected(self, mods: &ModifierSelection) -> bool {
        match self {
            Modifier::Shift => mods.shift,
            Modifier::Ctrl => mods.ctrl,
            Modifier::Alt => mods.alt,
            Modifier::Gui => mods.gui,
        }
    }
}

/// Wrap `base` with the selected modifier functions.
///
/// Returns `base` unchanged when wrapping is disabled, nothing is selected,
/// `base` is empty, or `base` is `KC_NO`/`KC_TRNS`.
pub fn compose(base: &str, mods: &ModifierSelection) -> String {
    if !mods.enabled || base.is_empty() || is_sentinel(base) {
        return base.to_string();
    }

    let functions: Vec<&str> = Modifier::ORDER
        .iter()
        .filter(|m| m.is_selected(mods))
        .map(|m| m.function_name(mods.use_right))
        .collect();

    if functions.is_empty() {
        return base.to_string();
    }

    let mut out = String::with_capacity(base.len() + functions.len() * 6);
    for function in &functions {
        out.push_str(function);
        out.push('(');
    }
    out.push_str(base);
    out.push_str(&")".repeat(functions.len()));
    out
}
