//! Keycode composition and resolution for QMK/VIA keyboards
//!
//! This crate turns free-form keycode text (optionally wrapped with modifier
//! keys) into keycode values, renders hex previews, filters autocomplete
//! candidates, and loads keyboard definitions from KDL files.

mod advanced;
mod autocomplete;
mod basic;
mod catalog;
mod compose;
mod editor;
mod error;
mod model;
mod parser;
mod resolve;

pub use advanced::{
    advanced_keycode_to_string, keycode_to_string, AdvancedResolver, NoAdvanced, QmkResolver,
};
pub use autocomplete::{Autocomplete, MenuEvent, MenuState};
pub use basic::{is_sentinel, KC_NO, KC_TRNS};
pub use catalog::Catalog;
pub use compose::{compose, Modifier};
pub use editor::KeycodeEditor;
pub use error::{ConfigError, InvalidKeyInfo, KeyPosition, SourceLocation};
pub use model::*;
pub use parser::{parse_config, parse_config_str};
pub use resolve::{
    final_keycode, format_hex, hex_preview, normalize, parse_hex_literal, resolve, resolve_with,
    HexPreview,
};
