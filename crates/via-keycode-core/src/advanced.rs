//! Advanced keycodes
//!
//! Keycodes that are not listed in the basic dictionary but are built from a
//! function-call syntax: modifier wrappers (`LCTL(KC_A)`), layer functions
//! (`MO(1)`, `LT(2, KC_SPC)`), mod-tap (`MT(MOD_LCTL | MOD_LSFT, KC_A)`),
//! one-shot mods, macros and keyboard-specific custom keycodes.
//!
//! Values follow the VIA protocol v12 keycode ranges:
//!
//! ```text
//! 0x0100..=0x1FFF  modifier wrappers      (mods << 8) | kc
//! 0x2000..=0x3FFF  MT(mod, kc)            0x2000 | (mods << 8) | kc
//! 0x4000..=0x4FFF  LT(layer, kc)          0x4000 | (layer << 8) | kc
//! 0x5000..=0x51FF  LM(layer, mod)         0x5000 | (layer << 5) | mods
//! 0x5200..=0x52DF  TO MO DF TG OSL OSM TT 0x5200 + 0x20 * fn | arg
//! 0x7700..=0x777F  MACRO(n)
//! 0x7E00..=0x7E3F  CUSTOM(n)
//! 0x7E40..=0x7FFF  USER(n)
//! ```
//!
//! Modifier bits are the 5-bit QMK mask: ctrl 0x01, shift 0x02, alt 0x04,
//! gui 0x08, with 0x10 marking right-hand modifiers.

use crate::compose::compose;
use crate::model::{BasicKeyDictionary, ModifierSelection};

const QK_MODS: u16 = 0x0100;
const QK_MODS_MAX: u16 = 0x1FFF;
const QK_MOD_TAP: u16 = 0x2000;
const QK_MOD_TAP_MAX: u16 = 0x3FFF;
const QK_LAYER_TAP: u16 = 0x4000;
const QK_LAYER_TAP_MAX: u16 = 0x4FFF;
const QK_LAYER_MOD: u16 = 0x5000;
const QK_LAYER_MOD_MAX: u16 = 0x51FF;
const QK_TO: u16 = 0x5200;
const QK_MOMENTARY: u16 = 0x5220;
const QK_DEF_LAYER: u16 = 0x5240;
const QK_TOGGLE_LAYER: u16 = 0x5260;
const QK_ONE_SHOT_LAYER: u16 = 0x5280;
const QK_ONE_SHOT_MOD: u16 = 0x52A0;
const QK_LAYER_TAP_TOGGLE: u16 = 0x52C0;
const QK_MACRO: u16 = 0x7700;
const QK_MACRO_MAX: u16 = 0x777F;
const QK_KB: u16 = 0x7E00;
const QK_KB_MAX: u16 = 0x7E3F;
const QK_USER: u16 = 0x7E40;
const QK_USER_MAX: u16 = 0x7FFF;

const MOD_CTRL: u8 = 0x01;
const MOD_SHIFT: u8 = 0x02;
const MOD_ALT: u8 = 0x04;
const MOD_GUI: u8 = 0x08;
const MOD_RIGHT: u8 = 0x10;
const MOD_MASK: u8 = 0x1F;

/// Single-argument layer functions and their range bases
const LAYER_FUNCTIONS: [(&str, u16); 6] = [
    ("TO", QK_TO),
    ("MO", QK_MOMENTARY),
    ("DF", QK_DEF_LAYER),
    ("TG", QK_TOGGLE_LAYER),
    ("OSL", QK_ONE_SHOT_LAYER),
    ("TT", QK_LAYER_TAP_TOGGLE),
];

/// Resolves keycodes that need more than a flat dictionary lookup.
///
/// `token` is already trimmed and uppercased. A return value of `0` means the
/// token was not recognized.
pub trait AdvancedResolver {
    fn resolve(&self, token: &str, dict: &BasicKeyDictionary) -> u16;
}

/// Recognizes nothing; restricts resolution to basic keys and hex literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdvanced;

impl AdvancedResolver for NoAdvanced {
    fn resolve(&self, _token: &str, _dict: &BasicKeyDictionary) -> u16 {
        0
    }
}

/// QMK/VIA function-call keycodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct QmkResolver;

impl AdvancedResolver for QmkResolver {
    fn resolve(&self, token: &str, dict: &BasicKeyDictionary) -> u16 {
        parse_advanced(token, dict).unwrap_or(0)
    }
}

fn parse_advanced(token: &str, dict: &BasicKeyDictionary) -> Option<u16> {
    let (name, args) = split_call(token)?;

    if let Some(bits) = wrapper_mods(name) {
        return parse_wrapped(bits, &args, dict);
    }

    if let Some(&(_, base)) = LAYER_FUNCTIONS.iter().find(|(f, _)| *f == name) {
        let [layer] = args.as_slice() else {
            return None;
        };
        return Some(base | u16::from(parse_number(layer, 31)?));
    }

    match (name, args.as_slice()) {
        ("LT", [layer, kc]) => {
            let layer = parse_number(layer, 15)?;
            let kc = basic_byte(kc, dict)?;
            Some(QK_LAYER_TAP | (layer << 8) | kc)
        }
        ("LM", [layer, mods]) => {
            let layer = parse_number(layer, 15)?;
            let mods = parse_mod_mask(mods)?;
            Some(QK_LAYER_MOD | (layer << 5) | u16::from(mods))
        }
        ("MT", [mods, kc]) => {
            let mods = parse_mod_mask(mods)?;
            let kc = basic_byte(kc, dict)?;
            Some(QK_MOD_TAP | (u16::from(mods) << 8) | kc)
        }
        ("OSM", [mods]) => Some(QK_ONE_SHOT_MOD | u16::from(parse_mod_mask(mods)?)),
        ("MACRO" | "M", [n]) => Some(QK_MACRO + parse_number(n, QK_MACRO_MAX - QK_MACRO)?),
        ("CUSTOM", [n]) => Some(QK_KB + parse_number(n, QK_KB_MAX - QK_KB)?),
        ("USER", [n]) => Some(QK_USER + parse_number(n, QK_USER_MAX - QK_USER)?),
        (name, [kc]) => {
            // Named mod-tap: LCTL_T(kc), MEH_T(kc), ALL_T(kc)
            let prefix = name.strip_suffix("_T")?;
            let mods = if prefix == "ALL" {
                MOD_CTRL | MOD_SHIFT | MOD_ALT | MOD_GUI
            } else {
                wrapper_mods(prefix)?
            };
            let kc = basic_byte(kc, dict)?;
            Some(QK_MOD_TAP | (u16::from(mods) << 8) | kc)
        }
        _ => None,
    }
}

/// `LSFT(LCTL(KC_A))`: masks OR together; the innermost argument must be a basic key.
///
/// Nested wrappers are peeled one level per iteration, so arbitrarily deep
/// tokens resolve in linear time without recursion.
fn parse_wrapped(bits: u8, args: &[&str], dict: &BasicKeyDictionary) -> Option<u16> {
    let [inner] = args else {
        return None;
    };

    let mut mods = bits;
    let mut inner = *inner;
    while let Some((name, rest)) = inner.split_once('(') {
        mods |= wrapper_mods(name.trim())?;
        inner = rest.strip_suffix(')')?.trim();
    }

    let kc = basic_byte(inner, dict)?;
    Some((u16::from(mods & MOD_MASK) << 8) | kc)
}

/// Split `NAME(a, b)` into its name and top-level arguments.
fn split_call(token: &str) -> Option<(&str, Vec<&str>)> {
    let open = token.find('(')?;
    let inner = token.strip_suffix(')')?.get(open + 1..)?;
    let name = token[..open].trim();
    if name.is_empty() {
        return None;
    }

    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in inner.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                args.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    args.push(inner[start..].trim());

    if args.iter().any(|a| a.is_empty()) {
        return None;
    }
    Some((name, args))
}

/// Modifier bits for wrapper names (`LCTL`, `C`, `MEH`, ...)
fn wrapper_mods(name: &str) -> Option<u8> {
    let bits = match name {
        "LCTL" | "C" => MOD_CTRL,
        "LSFT" | "S" => MOD_SHIFT,
        "LALT" | "A" | "LOPT" => MOD_ALT,
        "LGUI" | "G" | "LCMD" | "LWIN" => MOD_GUI,
        "RCTL" => MOD_RIGHT | MOD_CTRL,
        "RSFT" => MOD_RIGHT | MOD_SHIFT,
        "RALT" | "ALGR" | "ROPT" => MOD_RIGHT | MOD_ALT,
        "RGUI" | "RCMD" | "RWIN" => MOD_RIGHT | MOD_GUI,
        "MEH" => MOD_CTRL | MOD_SHIFT | MOD_ALT,
        "HYPR" => MOD_CTRL | MOD_SHIFT | MOD_ALT | MOD_GUI,
        _ => return None,
    };
    Some(bits)
}

/// `MOD_LCTL | MOD_LSFT` style masks
fn parse_mod_mask(arg: &str) -> Option<u8> {
    let mut mask = 0u8;
    for part in arg.split('|') {
        let bits = match part.trim() {
            "MOD_LCTL" => MOD_CTRL,
            "MOD_LSFT" => MOD_SHIFT,
            "MOD_LALT" => MOD_ALT,
            "MOD_LGUI" => MOD_GUI,
            "MOD_RCTL" => MOD_RIGHT | MOD_CTRL,
            "MOD_RSFT" => MOD_RIGHT | MOD_SHIFT,
            "MOD_RALT" => MOD_RIGHT | MOD_ALT,
            "MOD_RGUI" => MOD_RIGHT | MOD_GUI,
            "MOD_MEH" => MOD_CTRL | MOD_SHIFT | MOD_ALT,
            "MOD_HYPR" => MOD_CTRL | MOD_SHIFT | MOD_ALT | MOD_GUI,
            _ => return None,
        };
        mask |= bits;
    }
    Some(mask)
}

fn parse_number(arg: &str, max: u16) -> Option<u16> {
    arg.parse::<u16>().ok().filter(|n| *n <= max)
}

/// A basic key that fits in the low byte of a composite keycode
fn basic_byte(name: &str, dict: &BasicKeyDictionary) -> Option<u16> {
    dict.get(name).filter(|kc| *kc <= 0x00FF)
}

fn render_mod_mask(mods: u8) -> String {
    let side = if mods & MOD_RIGHT != 0 { 'R' } else { 'L' };
    [
        (MOD_CTRL, "CTL"),
        (MOD_SHIFT, "SFT"),
        (MOD_ALT, "ALT"),
        (MOD_GUI, "GUI"),
    ]
    .iter()
    .filter(|(bit, _)| mods & bit != 0)
    .map(|(_, name)| format!("MOD_{}{}", side, name))
    .collect::<Vec<_>>()
    .join(" | ")
}

/// Render a keycode value as an advanced keycode string, if it falls in a known range.
pub fn advanced_keycode_to_string(value: u16, dict: &BasicKeyDictionary) -> Option<String> {
    let kc_name = || dict.name_for(value & 0x00FF);

    match value {
        QK_MODS..=QK_MODS_MAX => {
            let mods = ((value >> 8) as u8) & MOD_MASK;
            let name = kc_name()?;
            let selection = ModifierSelection {
                enabled: true,
                shift: mods & MOD_SHIFT != 0,
                ctrl: mods & MOD_CTRL != 0,
                alt: mods & MOD_ALT != 0,
                gui: mods & MOD_GUI != 0,
                use_right: mods & MOD_RIGHT != 0,
            };
            let wrapped = compose(name, &selection);
            // Sentinel bases are never wrapped; fall back to hex for those.
            (wrapped != name).then_some(wrapped)
        }
        QK_MOD_TAP..=QK_MOD_TAP_MAX => {
            let mods = ((value >> 8) as u8) & MOD_MASK;
            if mods & !MOD_RIGHT == 0 {
                return None;
            }
            Some(format!("MT({}, {})", render_mod_mask(mods), kc_name()?))
        }
        QK_LAYER_TAP..=QK_LAYER_TAP_MAX => {
            Some(format!("LT({}, {})", (value >> 8) & 0x0F, kc_name()?))
        }
        QK_LAYER_MOD..=QK_LAYER_MOD_MAX => {
            let mods = (value as u8) & MOD_MASK;
            if mods & !MOD_RIGHT == 0 {
                return None;
            }
            Some(format!("LM({}, {})", (value >> 5) & 0x0F, render_mod_mask(mods)))
        }
        QK_ONE_SHOT_MOD..=0x52BF => {
            let mods = (value as u8) & MOD_MASK;
            if mods & !MOD_RIGHT == 0 {
                return None;
            }
            Some(format!("OSM({})", render_mod_mask(mods)))
        }
        QK_TO..=0x52DF => {
            let base = value & !0x001F;
            let (name, _) = LAYER_FUNCTIONS.iter().find(|(_, b)| *b == base)?;
            Some(format!("{}({})", name, value & 0x001F))
        }
        QK_MACRO..=QK_MACRO_MAX => Some(format!("MACRO({})", value - QK_MACRO)),
        QK_KB..=QK_KB_MAX => Some(format!("CUSTOM({})", value - QK_KB)),
        QK_USER..=QK_USER_MAX => Some(format!("USER({})", value - QK_USER)),
        _ => None,
    }
}

/// Render any keycode value: basic name, advanced form, or `0xXXXX`.
pub fn keycode_to_string(value: u16, dict: &BasicKeyDictionary) -> String {
    if let Some(name) = dict.name_for(value) {
        return name.to_string();
    }
    advanced_keycode_to_string(value, dict).unwrap_or_else(|| crate::resolve::format_hex(value))
}
