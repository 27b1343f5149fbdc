//! KDL keyboard definition parser
//!
//! ```kdl
//! global {
//!     suggestion-limit 100
//!     use-right-modifiers false
//! }
//!
//! keyboard "Lily58" {
//!     vendor-product "04D8:EB2D"
//!     basic-keys {
//!         key "KC_LNG1" 0x0090
//!     }
//!     keycodes {
//!         key "CUSTOM(0)" name="RGB_TOG" title="Toggle RGB"
//!     }
//! }
//! ```

use std::path::Path;

use crate::error::{ConfigError, InvalidKeyInfo, KeyPosition, SourceLocation};
use crate::model::*;

/// Extract source location from a KDL node's name span
fn get_node_location(node: &kdl::KdlNode, source: &str) -> SourceLocation {
    let span = node.name().span();
    let offset = span.offset();
    let len = span.len();

    let (line, column) = offset_to_line_col(source, offset);

    SourceLocation::new(line, column, offset, len)
}

/// Extract source location from a KDL entry
fn get_entry_location(entry: &kdl::KdlEntry, source: &str) -> SourceLocation {
    let span = entry.span();
    let offset = span.offset();
    let len = span.len();

    let (line, column) = offset_to_line_col(source, offset);

    SourceLocation::new(line, column, offset, len)
}

/// Convert byte offset to line and column (1-indexed)
fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Positional (unnamed) arguments of a node
fn arguments(node: &kdl::KdlNode) -> impl Iterator<Item = &kdl::KdlEntry> {
    node.entries().iter().filter(|e| e.name().is_none())
}

/// Named property of a node
fn property<'a>(node: &'a kdl::KdlNode, name: &str) -> Option<&'a kdl::KdlEntry> {
    node.entries()
        .iter()
        .find(|e| e.name().map(|n| n.value() == name).unwrap_or(false))
}

/// Parse keyboard definitions from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    tracing::debug!("Parsing keyboard definitions from {}", path.display());
    parse_config_str(&content)
}

/// Parse keyboard definitions from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl carries its own miette version; rebuild the span for ours
        let offset = e.span.offset();
        let len = e.span.len();
        let span = miette::SourceSpan::from((offset, len));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();
    let mut invalid_keys = Vec::new();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => {
                config.global = parse_global(node)?;
            }
            "keyboard" => {
                let keyboard = parse_keyboard(node, content, &mut invalid_keys)?;
                if config.keyboard(Some(keyboard.name.as_str())).is_some() {
                    return Err(ConfigError::Invalid {
                        message: format!("Keyboard '{}' is defined more than once", keyboard.name),
                    });
                }
                config.keyboards.push(keyboard);
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    // Report every invalid key at once, with source context
    if !invalid_keys.is_empty() {
        return Err(ConfigError::invalid_keys(content, invalid_keys));
    }

    Ok(config)
}

fn parse_global(node: &kdl::KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let value = child.entries().first().map(|e| e.value());
            match child.name().value() {
                "suggestion-limit" => {
                    global.suggestion_limit = value
                        .and_then(|v| v.as_i64())
                        .filter(|n| *n > 0)
                        .and_then(|n| usize::try_from(n).ok())
                        .ok_or_else(|| ConfigError::Invalid {
                            message: "suggestion-limit must be a positive integer".to_string(),
                        })?;
                }
                "use-right-modifiers" => {
                    global.use_right_modifiers =
                        value.and_then(|v| v.as_bool()).ok_or_else(|| ConfigError::Invalid {
                            message: "use-right-modifiers must be true or false".to_string(),
                        })?;
                }
                name => {
                    tracing::warn!("Unknown global config option: {}", name);
                }
            }
        }
    }

    Ok(global)
}

fn parse_keyboard(
    node: &kdl::KdlNode,
    source: &str,
    invalid_keys: &mut Vec<InvalidKeyInfo>,
) -> Result<KeyboardDefinition, ConfigError> {
    let name = arguments(node)
        .next()
        .and_then(|e| e.value().as_string())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingField {
            field: "keyboard name (e.g., `keyboard \"My Keyboard\" { ... }`)".to_string(),
        })?;

    let mut keyboard = KeyboardDefinition {
        name,
        ..Default::default()
    };

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "vendor-product" => {
                    keyboard.vendor_product = arguments(child)
                        .next()
                        .and_then(|e| e.value().as_string())
                        .map(|s| s.to_string());
                }
                "basic-keys" => {
                    parse_basic_keys(child, source, &mut keyboard.basic_keys, invalid_keys);
                }
                "keycodes" => {
                    parse_keycodes(child, source, &mut keyboard.keycodes, invalid_keys);
                }
                name => {
                    tracing::warn!("Unknown keyboard option: {}", name);
                }
            }
        }
    }

    tracing::debug!(
        keyboard = %keyboard.name,
        basic_keys = keyboard.basic_keys.len(),
        keycodes = keyboard.keycodes.len(),
        "parsed keyboard definition"
    );

    Ok(keyboard)
}

/// `key "NAME" VALUE` entries
fn parse_basic_keys(
    node: &kdl::KdlNode,
    source: &str,
    dict: &mut BasicKeyDictionary,
    invalid_keys: &mut Vec<InvalidKeyInfo>,
) {
    let Some(children) = node.children() else {
        return;
    };

    for child in children.nodes() {
        if child.name().value() != "key" {
            tracing::warn!("Unknown basic-keys entry: {}", child.name().value());
            continue;
        }

        let mut args = arguments(child);
        let name_entry = args.next();
        let value_entry = args.next();

        let Some(name) = name_entry
            .and_then(|e| e.value().as_string())
            .filter(|s| !s.trim().is_empty())
        else {
            invalid_keys.push(InvalidKeyInfo {
                key: child.name().value().to_string(),
                position: KeyPosition::Name,
                context: "basic-keys".to_string(),
                reason: "expected a non-empty key name".to_string(),
                location: name_entry
                    .map(|e| get_entry_location(e, source))
                    .unwrap_or_else(|| get_node_location(child, source)),
            });
            continue;
        };

        let value = value_entry
            .and_then(|e| e.value().as_i64())
            .and_then(|v| u16::try_from(v).ok());

        match value {
            Some(value) => {
                if let Some(previous) = dict.insert(name, value) {
                    tracing::warn!(
                        "Basic key {} redefined ({:#06X} -> {:#06X})",
                        name,
                        previous,
                        value
                    );
                }
            }
            None => invalid_keys.push(InvalidKeyInfo {
                key: name.to_string(),
                position: KeyPosition::Value,
                context: "basic-keys".to_string(),
                reason: "expected a value in 0x0000..=0xFFFF".to_string(),
                location: value_entry
                    .map(|e| get_entry_location(e, source))
                    .unwrap_or_else(|| get_node_location(child, source)),
            }),
        }
    }
}

/// `key "CODE" name="NAME" title="TITLE"` entries
fn parse_keycodes(
    node: &kdl::KdlNode,
    source: &str,
    keycodes: &mut Vec<DeviceKey>,
    invalid_keys: &mut Vec<InvalidKeyInfo>,
) {
    let Some(children) = node.children() else {
        return;
    };

    for child in children.nodes() {
        if child.name().value() != "key" {
            tracing::warn!("Unknown keycodes entry: {}", child.name().value());
            continue;
        }

        let code_entry = arguments(child).next();
        let Some(code) = code_entry
            .and_then(|e| e.value().as_string())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        else {
            invalid_keys.push(InvalidKeyInfo {
                key: child.name().value().to_string(),
                position: KeyPosition::Name,
                context: "keycodes".to_string(),
                reason: "expected a non-empty keycode".to_string(),
                location: code_entry
                    .map(|e| get_entry_location(e, source))
                    .unwrap_or_else(|| get_node_location(child, source)),
            });
            continue;
        };

        let name = property(child, "name")
            .and_then(|e| e.value().as_string())
            .map(|s| s.to_string())
            .unwrap_or_else(|| code.clone());
        let title = property(child, "title")
            .and_then(|e| e.value().as_string())
            .map(|s| s.to_string());

        keycodes.push(DeviceKey { code, name, title });
    }
}
