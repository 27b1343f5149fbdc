//! Data model

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    pub keyboards: Vec<KeyboardDefinition>,
}

impl Config {
    /// Look up a keyboard by name (case-insensitive), or the first one when no name is given.
    pub fn keyboard(&self, name: Option<&str>) -> Option<&KeyboardDefinition> {
        match name {
            Some(name) => self
                .keyboards
                .iter()
                .find(|k| k.name.eq_ignore_ascii_case(name)),
            None => self.keyboards.first(),
        }
    }
}

/// Global settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalConfig {
    /// Upper bound on autocomplete candidates
    pub suggestion_limit: usize,
    /// Initial left/right choice for modifier wrapping
    pub use_right_modifiers: bool,
}

pub const DEFAULT_SUGGESTION_LIMIT: usize = 100;

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            use_right_modifiers: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// A keyboard definition: extra basic keys plus keyboard-specific keycodes
#[derive(Debug, Clone, Default)]
pub struct KeyboardDefinition {
    pub name: String,
    /// Vendor:Product ID (e.g., "3434:0361")
    pub vendor_product: Option<String>,
    /// Basic keys added on top of (or overriding) the built-in dictionary
    pub basic_keys: BasicKeyDictionary,
    /// Keyboard-specific keycodes offered for autocomplete
    pub keycodes: Vec<DeviceKey>,
}

impl KeyboardDefinition {
    /// Built-in dictionary merged with this keyboard's own basic keys.
    pub fn dictionary(&self) -> BasicKeyDictionary {
        let mut dict = BasicKeyDictionary::qmk_default();
        dict.extend(&self.basic_keys);
        dict
    }
}

/// A keyboard-specific keycode entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceKey {
    pub code: String,
    pub name: String,
    pub title: Option<String>,
}

impl DeviceKey {
    /// Display label: title, falling back to name
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// One autocomplete candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub code: String,
    pub label: String,
}

/// Modifier keys to wrap around the base keycode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierSelection {
    pub enabled: bool,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub gui: bool,
    pub use_right: bool,
}

/// A single toggleable flag of [`ModifierSelection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierFlag {
    Enabled,
    Shift,
    Ctrl,
    Alt,
    Gui,
    UseRight,
}

impl ModifierSelection {
    pub fn toggle(&mut self, flag: ModifierFlag) {
        let slot = match flag {
            ModifierFlag::Enabled => &mut self.enabled,
            ModifierFlag::Shift => &mut self.shift,
            ModifierFlag::Ctrl => &mut self.ctrl,
            ModifierFlag::Alt => &mut self.alt,
            ModifierFlag::Gui => &mut self.gui,
            ModifierFlag::UseRight => &mut self.use_right,
        };
        *slot = !*slot;
    }

    pub fn set_use_right(&mut self, use_right: bool) {
        self.use_right = use_right;
    }
}

/// Canonical basic-key names mapped to their keycode values.
///
/// Names are stored uppercase. Iteration follows insertion order; overriding
/// an existing name keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct BasicKeyDictionary {
    entries: Vec<(String, u16)>,
    by_name: HashMap<String, usize>,
    by_value: HashMap<u16, usize>,
}

impl BasicKeyDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or override a key. Returns the previous value, if any.
    pub fn insert(&mut self, name: &str, value: u16) -> Option<u16> {
        let name = name.trim().to_uppercase();

        if let Some(&idx) = self.by_name.get(&name) {
            let previous = std::mem::replace(&mut self.entries[idx].1, value);
            if previous != value {
                self.rebuild_inverse();
            }
            return Some(previous);
        }

        let idx = self.entries.len();
        self.entries.push((name.clone(), value));
        self.by_name.insert(name, idx);
        self.by_value.entry(value).or_insert(idx);
        None
    }

    /// Exact lookup of an already-normalized (trimmed, uppercase) name
    pub fn get(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).map(|&idx| self.entries[idx].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Inverse lookup: first name inserted for `value`
    pub fn name_for(&self, value: u16) -> Option<&str> {
        self.by_value
            .get(&value)
            .map(|&idx| self.entries[idx].0.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u16)> + '_ {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge `other` into `self`; `other` wins on name collisions.
    pub fn extend(&mut self, other: &BasicKeyDictionary) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }

    fn rebuild_inverse(&mut self) {
        self.by_value.clear();
        for (idx, (_, value)) in self.entries.iter().enumerate() {
            self.by_value.entry(*value).or_insert(idx);
        }
    }
}

impl<S: AsRef<str>> FromIterator<(S, u16)> for BasicKeyDictionary {
    fn from_iter<I: IntoIterator<Item = (S, u16)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (name, value) in iter {
            dict.insert(name.as_ref(), value);
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_normalizes_names() {
        let dict: BasicKeyDictionary = [(" kc_a ", 4)].into_iter().collect();
        assert_eq!(dict.get("KC_A"), Some(4));
        assert!(dict.get("kc_a").is_none());
    }

    #[test]
    fn test_dictionary_override_keeps_position() {
        let mut dict: BasicKeyDictionary =
            [("KC_A", 4), ("KC_B", 5), ("KC_C", 6)].into_iter().collect();
        assert_eq!(dict.insert("KC_B", 0x50), Some(5));

        let names: Vec<&str> = dict.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["KC_A", "KC_B", "KC_C"]);
        assert_eq!(dict.get("KC_B"), Some(0x50));
        assert_eq!(dict.name_for(5), None);
        assert_eq!(dict.name_for(0x50), Some("KC_B"));
    }

    #[test]
    fn test_inverse_prefers_first_name() {
        let dict: BasicKeyDictionary =
            [("KC_TRNS", 1), ("KC_TRANSPARENT", 1)].into_iter().collect();
        assert_eq!(dict.name_for(1), Some("KC_TRNS"));
    }

    #[test]
    fn test_modifier_toggle() {
        let mut mods = ModifierSelection::default();
        mods.toggle(ModifierFlag::Enabled);
        mods.toggle(ModifierFlag::Ctrl);
        mods.toggle(ModifierFlag::Ctrl);
        mods.toggle(ModifierFlag::Gui);
        mods.set_use_right(true);

        assert!(mods.enabled);
        assert!(!mods.ctrl);
        assert!(mods.gui);
        assert!(mods.use_right);
    }

    #[test]
    fn test_device_key_label_fallback() {
        let titled = DeviceKey {
            code: "CUSTOM(0)".to_string(),
            name: "RGB_TOG".to_string(),
            title: Some("Toggle RGB".to_string()),
        };
        let untitled = DeviceKey {
            title: None,
            ..titled.clone()
        };
        assert_eq!(titled.label(), "Toggle RGB");
        assert_eq!(untitled.label(), "RGB_TOG");
    }

    #[test]
    fn test_config_keyboard_lookup() {
        let config = Config {
            global: GlobalConfig::default(),
            keyboards: vec![
                KeyboardDefinition {
                    name: "First".to_string(),
                    ..Default::default()
                },
                KeyboardDefinition {
                    name: "Second".to_string(),
                    ..Default::default()
                },
            ],
        };

        assert_eq!(config.keyboard(None).map(|k| k.name.as_str()), Some("First"));
        assert_eq!(
            config.keyboard(Some("second")).map(|k| k.name.as_str()),
            Some("Second")
        );
        assert!(config.keyboard(Some("third")).is_none());
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
