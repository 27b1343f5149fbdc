//! Keycode string resolution
//!
//! Resolution order, first match wins:
//!
//! 1. exact basic-key name
//! 2. advanced keycode (a zero result counts as "not advanced")
//! 3. hex literal `0x` + 1 to 4 hex digits
//!
//! Anything else is unresolved (`None`).

use std::fmt;

use crate::advanced::{AdvancedResolver, QmkResolver};
use crate::basic::KC_NO;
use crate::compose::compose;
use crate::model::{BasicKeyDictionary, ModifierSelection};

/// Trim and uppercase raw user input
pub fn normalize(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Resolve `raw` using the built-in QMK advanced resolver.
pub fn resolve(raw: &str, dict: &BasicKeyDictionary) -> Option<u16> {
    resolve_with(raw, dict, &QmkResolver)
}

/// Resolve `raw` with a caller-supplied advanced resolver.
pub fn resolve_with<R>(raw: &str, dict: &BasicKeyDictionary, advanced: &R) -> Option<u16>
where
    R: AdvancedResolver + ?Sized,
{
    let token = normalize(raw);

    if let Some(value) = dict.get(&token) {
        tracing::trace!(token = %token, value, "basic keycode");
        return Some(value);
    }

    match advanced.resolve(&token, dict) {
        0 => {}
        value => {
            tracing::trace!(token = %token, value, "advanced keycode");
            return Some(value);
        }
    }

    let value = parse_hex_literal(&token);
    if value.is_none() {
        tracing::debug!(token = %token, "unresolved keycode");
    }
    value
}

/// Parse `0x` followed by 1 to 4 hex digits (case-insensitive).
pub fn parse_hex_literal(input: &str) -> Option<u16> {
    let input = input.trim();
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))?;

    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

/// `0x` + 4 uppercase hex digits
pub fn format_hex(value: u16) -> String {
    format!("0x{:04X}", value)
}

/// The keycode string that will actually be resolved for `input`.
///
/// Empty input stands for `KC_NO`; otherwise the normalized input is wrapped
/// with the selected modifiers.
pub fn final_keycode(input: &str, mods: &ModifierSelection) -> String {
    let token = normalize(input);
    if token.is_empty() {
        return KC_NO.to_string();
    }
    compose(&token, mods)
}

/// Display form of a resolution result: `0x0004` or `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexPreview {
    Valid(u16),
    Invalid,
}

impl HexPreview {
    pub fn value(&self) -> Option<u16> {
        match self {
            HexPreview::Valid(value) => Some(*value),
            HexPreview::Invalid => None,
        }
    }
}

impl From<Option<u16>> for HexPreview {
    fn from(value: Option<u16>) -> Self {
        value.map_or(HexPreview::Invalid, HexPreview::Valid)
    }
}

impl fmt::Display for HexPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HexPreview::Valid(value) => f.write_str(&format_hex(*value)),
            HexPreview::Invalid => f.write_str("Invalid"),
        }
    }
}

/// Compose `input` with `mods`, resolve it, and wrap the result for display.
pub fn hex_preview(input: &str, mods: &ModifierSelection, dict: &BasicKeyDictionary) -> HexPreview {
    resolve(&final_keycode(input, mods), dict).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advanced::NoAdvanced;

    fn dict() -> BasicKeyDictionary {
        [("KC_NO", 0), ("KC_TRNS", 1), ("KC_A", 4), ("KC_B", 5)]
            .into_iter()
            .collect()
    }

    /// Advanced resolver that knows exactly one token.
    struct Fixed(&'static str, u16);

    impl AdvancedResolver for Fixed {
        fn resolve(&self, token: &str, _dict: &BasicKeyDictionary) -> u16 {
            if token == self.0 {
                self.1
            } else {
                0
            }
        }
    }

    #[test]
    fn test_resolve_trims_and_ignores_case() {
        assert_eq!(resolve(" kc_a ", &dict()), Some(4));
        assert_eq!(resolve("KC_B", &dict()), Some(5));
    }

    #[test]
    fn test_resolve_hex_literal() {
        assert_eq!(resolve("0x1F", &dict()), Some(31));
        assert_eq!(resolve("0X1f", &dict()), Some(31));
        assert_eq!(resolve("0xFFFF", &dict()), Some(0xFFFF));
        assert_eq!(resolve("0x0", &dict()), Some(0));
    }

    #[test]
    fn test_resolve_rejects_bad_hex() {
        assert_eq!(resolve("0x", &dict()), None);
        assert_eq!(resolve("0x12345", &dict()), None);
        assert_eq!(resolve("0xG1", &dict()), None);
        assert_eq!(resolve("1F", &dict()), None);
        assert_eq!(resolve("0x+1", &dict()), None);
    }

    #[test]
    fn test_resolve_unknown_is_unresolved() {
        assert_eq!(resolve("not_a_key", &dict()), None);
        assert_eq!(resolve("", &dict()), None);
    }

    #[test]
    fn test_basic_lookup_wins_over_advanced_and_hex() {
        let mut dict = dict();
        dict.insert("0x10", 0x77);
        let advanced = Fixed("KC_A", 0x1234);

        assert_eq!(resolve_with("kc_a", &dict, &advanced), Some(4));
        assert_eq!(resolve_with("0x10", &dict, &advanced), Some(0x77));
    }

    #[test]
    fn test_advanced_wins_over_hex() {
        let advanced = Fixed("0X10", 0x5221);
        assert_eq!(resolve_with("0x10", &dict(), &advanced), Some(0x5221));
    }

    #[test]
    fn test_advanced_zero_means_not_advanced() {
        // A legitimately zero advanced value is indistinguishable from "unknown"
        // and falls through to the hex check.
        let advanced = Fixed("MAGIC(0)", 0);
        assert_eq!(resolve_with("MAGIC(0)", &dict(), &advanced), None);
        assert_eq!(resolve_with("0x0", &dict(), &Fixed("0X0", 0)), Some(0));
    }

    #[test]
    fn test_no_advanced_resolver() {
        assert_eq!(resolve_with("LCTL(KC_A)", &dict(), &NoAdvanced), None);
        assert_eq!(resolve("LCTL(KC_A)", &dict()), Some(0x0104));
    }

    #[test]
    fn test_dictionary_round_trip() {
        let dict = BasicKeyDictionary::qmk_default();
        for (name, value) in dict.iter() {
            let canonical = dict.name_for(value).unwrap();
            assert_eq!(resolve(canonical, &dict), Some(value), "{}", name);
        }
    }

    #[test]
    fn test_final_keycode() {
        let mods = ModifierSelection {
            enabled: true,
            ctrl: true,
            ..Default::default()
        };
        assert_eq!(final_keycode("  kc_a", &mods), "LCTL(KC_A)");
        assert_eq!(final_keycode("   ", &mods), "KC_NO");
        assert_eq!(final_keycode("kc_trns", &mods), "KC_TRNS");
    }

    #[test]
    fn test_hex_preview() {
        let dict = BasicKeyDictionary::qmk_default();
        let none = ModifierSelection::default();
        let shift = ModifierSelection {
            enabled: true,
            shift: true,
            ..Default::default()
        };

        assert_eq!(hex_preview("kc_a", &none, &dict).to_string(), "0x0004");
        assert_eq!(hex_preview("kc_a", &shift, &dict).to_string(), "0x0204");
        assert_eq!(hex_preview("", &shift, &dict).to_string(), "0x0000");
        assert_eq!(hex_preview("0xab", &none, &dict).to_string(), "0x00AB");
        assert_eq!(hex_preview("bogus", &none, &dict).to_string(), "Invalid");
        assert_eq!(hex_preview("bogus", &none, &dict), HexPreview::Invalid);
    }

    #[test]
    fn test_hex_preview_of_wrapped_hex_is_invalid() {
        // Modifier wrappers only accept named basic keys.
        let dict = BasicKeyDictionary::qmk_default();
        let shift = ModifierSelection {
            enabled: true,
            shift: true,
            ..Default::default()
        };
        assert_eq!(hex_preview("0x04", &shift, &dict), HexPreview::Invalid);
    }
}
