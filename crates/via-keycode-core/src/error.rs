use miette::{Diagnostic, LabeledSpan, SourceSpan};
use thiserror::Error;

/// Position of a key entry inside a keyboard definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// 1-indexed line
    pub line: usize,
    /// 1-indexed column
    pub column: usize,
    /// Byte offset into the document
    pub offset: usize,
    /// Length of the offending token in bytes
    pub len: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize, offset: usize, len: usize) -> Self {
        Self {
            line,
            column,
            offset,
            len,
        }
    }

    pub fn span(&self) -> SourceSpan {
        SourceSpan::from((self.offset, self.len))
    }
}

/// Which half of a `key "NAME" VALUE` entry was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPosition {
    Name,
    Value,
}

#[derive(Debug, Clone)]
pub struct InvalidKeyInfo {
    pub key: String,
    pub position: KeyPosition,
    /// Enclosing block (`basic-keys` or `keycodes`)
    pub context: String,
    pub reason: String,
    pub location: SourceLocation,
}

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to parse KDL")]
    #[diagnostic(code(via_keycode::config::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: SourceSpan,
        #[source]
        source: kdl::KdlError,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(via_keycode::config::invalid))]
    Invalid { message: String },

    #[error("Missing required field: {field}")]
    #[diagnostic(code(via_keycode::config::missing_field))]
    MissingField { field: String },

    #[error("{} invalid key(s) in keyboard definition", .invalid_keys.len())]
    #[diagnostic(
        code(via_keycode::config::invalid_keys),
        help("key names must be non-empty and values must fit in 0x0000..=0xFFFF")
    )]
    InvalidKeys {
        #[source_code]
        src: String,
        #[label(collection)]
        labels: Vec<LabeledSpan>,
        invalid_keys: Vec<InvalidKeyInfo>,
    },

    #[error("Unknown keyboard: {name}")]
    #[diagnostic(code(via_keycode::config::unknown_keyboard))]
    UnknownKeyboard { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Build an `InvalidKeys` error with one label per rejected entry.
    pub fn invalid_keys(src: &str, invalid_keys: Vec<InvalidKeyInfo>) -> Self {
        let labels = invalid_keys
            .iter()
            .map(|info| LabeledSpan::new_with_span(Some(info.reason.clone()), info.location.span()))
            .collect();

        ConfigError::InvalidKeys {
            src: src.to_string(),
            labels,
            invalid_keys,
        }
    }
}
