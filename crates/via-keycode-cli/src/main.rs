//! via-keycode CLI
//!
//! Compose, resolve and search QMK/VIA keycodes from the command line.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use via_keycode_core::{
    keycode_to_string, parse_hex_literal, BasicKeyDictionary, CandidateEntry, Catalog, Config,
    DeviceKey, GlobalConfig, KeycodeEditor, LogLevel, ModifierFlag, ModifierSelection,
};

const DEFAULT_DEFINITION_PATH: &str = "~/.config/via-keycode/keyboards.kdl";

#[derive(Parser, Debug)]
#[command(name = "via-keycode")]
#[command(about = "Keycode composer for QMK/VIA keyboards")]
#[command(version)]
struct Cli {
    /// Path to keyboard definition file
    #[arg(short, long)]
    definition: Option<String>,

    /// Keyboard to use from the definition file (defaults to the first one)
    #[arg(short, long)]
    keyboard: Option<String>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the keyboard definition file
    Validate,

    /// Resolve a keycode, optionally wrapped with modifiers
    Resolve {
        /// Keycode name, advanced keycode or hex literal
        input: String,

        #[command(flatten)]
        modifiers: ModifierArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Search the keycode catalog
    Search {
        /// Substring to match against codes and labels
        #[arg(default_value = "")]
        query: String,

        /// Maximum number of results (overrides suggestion-limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Render a keycode value (hex or decimal) as a keycode string
    Describe {
        value: String,
    },
}

#[derive(Args, Debug, Default)]
struct ModifierArgs {
    /// Wrap with Shift
    #[arg(long)]
    shift: bool,

    /// Wrap with Ctrl
    #[arg(long)]
    ctrl: bool,

    /// Wrap with Alt
    #[arg(long)]
    alt: bool,

    /// Wrap with GUI
    #[arg(long)]
    gui: bool,

    /// Use right-hand modifiers
    #[arg(long)]
    right: bool,
}

/// Everything a command needs from the definition file
struct Context {
    global: GlobalConfig,
    dict: BasicKeyDictionary,
    device_keys: Vec<DeviceKey>,
}

impl Context {
    fn catalog(&self) -> Catalog {
        Catalog::build(&self.dict, &self.device_keys)
    }
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    input: &'a str,
    keycode: String,
    value: Option<u16>,
    hex: String,
    modifiers: ModifierSelection,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_str())),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate => cmd_validate(&definition_path(cli.definition.as_deref())),
        Commands::Resolve {
            ref input,
            ref modifiers,
            json,
        } => {
            let ctx = load_context(cli.definition.as_deref(), cli.keyboard.as_deref())?;
            cmd_resolve(&ctx, input, modifiers, json)
        }
        Commands::Search {
            ref query,
            limit,
            json,
        } => {
            let ctx = load_context(cli.definition.as_deref(), cli.keyboard.as_deref())?;
            cmd_search(&ctx, query, limit, json)
        }
        Commands::Describe { ref value } => {
            let ctx = load_context(cli.definition.as_deref(), cli.keyboard.as_deref())?;
            cmd_describe(&ctx, value)
        }
    }
}

fn definition_path(definition: Option<&str>) -> PathBuf {
    // Expand tilde in definition path
    shellexpand::tilde(definition.unwrap_or(DEFAULT_DEFINITION_PATH))
        .into_owned()
        .into()
}

/// Load the definition file, falling back to the built-in keycodes when the
/// default file does not exist.
fn load_context(definition: Option<&str>, keyboard: Option<&str>) -> miette::Result<Context> {
    let path = definition_path(definition);

    let config = if definition.is_none() && !path.exists() {
        tracing::debug!(
            "No definition file at {}, using built-in keycodes",
            path.display()
        );
        Config::default()
    } else {
        tracing::info!("Loading keyboard definitions from {}", path.display());
        via_keycode_core::parse_config(&path)?
    };

    let (dict, device_keys) = match config.keyboard(keyboard) {
        Some(kb) => {
            tracing::info!("Using keyboard {}", kb.name);
            (kb.dictionary(), kb.keycodes.clone())
        }
        None => {
            if let Some(name) = keyboard {
                return Err(via_keycode_core::ConfigError::UnknownKeyboard {
                    name: name.to_string(),
                }
                .into());
            }
            (BasicKeyDictionary::qmk_default(), Vec::new())
        }
    };

    Ok(Context {
        global: config.global,
        dict,
        device_keys,
    })
}

fn cmd_validate(path: &PathBuf) -> miette::Result<()> {
    println!("Validating keyboard definitions: {}", path.display());

    let config = via_keycode_core::parse_config(path)?;

    println!("Definitions are valid!");
    println!("  Suggestion limit: {}", config.global.suggestion_limit);
    println!("  Keyboards: {}", config.keyboards.len());
    for keyboard in &config.keyboards {
        println!(
            "    - {} [{}] ({} basic key(s), {} keycode(s))",
            keyboard.name,
            keyboard.vendor_product.as_deref().unwrap_or("no vendor-product"),
            keyboard.basic_keys.len(),
            keyboard.keycodes.len()
        );
    }
    Ok(())
}

fn cmd_resolve(ctx: &Context, input: &str, mods: &ModifierArgs, json: bool) -> miette::Result<()> {
    let catalog = ctx.catalog();
    let mut editor = KeycodeEditor::new(&ctx.dict, &catalog, None);
    editor.apply_settings(&ctx.global);
    editor.set_input(input);

    let flags = [
        (mods.shift, ModifierFlag::Shift),
        (mods.ctrl, ModifierFlag::Ctrl),
        (mods.alt, ModifierFlag::Alt),
        (mods.gui, ModifierFlag::Gui),
    ];
    for (_, flag) in flags.iter().filter(|(set, _)| *set) {
        editor.toggle_modifier(*flag);
    }
    if flags.iter().any(|(set, _)| *set) {
        editor.toggle_modifier(ModifierFlag::Enabled);
    }
    if mods.right {
        editor.set_use_right(true);
    }

    let keycode = editor.final_keycode();
    let preview = editor.hex_preview();

    if json {
        let output = ResolveOutput {
            input,
            keycode: keycode.clone(),
            value: preview.value(),
            hex: preview.to_string(),
            modifiers: *editor.modifiers(),
        };
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    } else {
        println!("Keycode:  {}", keycode);
        println!("Hex code: {}", preview);
    }

    if !editor.is_valid() {
        return Err(miette::miette!("'{}' is not a valid keycode", keycode));
    }
    Ok(())
}

fn cmd_search(ctx: &Context, query: &str, limit: Option<usize>, json: bool) -> miette::Result<()> {
    let catalog = ctx.catalog();
    let limit = limit.unwrap_or(ctx.global.suggestion_limit);
    let results: Vec<CandidateEntry> = catalog.filter(query, limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&results).into_diagnostic()?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No keycodes match '{}'", query);
        return Ok(());
    }

    for entry in &results {
        let value = via_keycode_core::resolve(&entry.code, &ctx.dict)
            .map(via_keycode_core::format_hex)
            .unwrap_or_else(|| "------".to_string());
        if entry.label == entry.code {
            println!("  {}  {}", value, entry.code);
        } else {
            println!("  {}  {} ({})", value, entry.code, entry.label);
        }
    }
    Ok(())
}

fn cmd_describe(ctx: &Context, value: &str) -> miette::Result<()> {
    let parsed = parse_hex_literal(value)
        .or_else(|| value.trim().parse::<u16>().ok())
        .ok_or_else(|| miette::miette!("'{}' is not a hex or decimal keycode value", value))?;

    println!("{}", keycode_to_string(parsed, &ctx.dict));
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve_with_modifiers() {
        let cli = Cli::parse_from(["via-keycode", "resolve", "kc_a", "--shift", "--right"]);
        match cli.command {
            Commands::Resolve {
                input, modifiers, ..
            } => {
                assert_eq!(input, "kc_a");
                assert!(modifiers.shift);
                assert!(modifiers.right);
                assert!(!modifiers.ctrl);
            }
            other => panic!("Expected Resolve, got: {:?}", other),
        }
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_parse_log_level() {
        let cli = Cli::parse_from(["via-keycode", "--log-level", "debug", "validate"]);
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(Cli::try_parse_from(["via-keycode", "--log-level", "loud", "validate"]).is_err());
    }

    #[test]
    fn test_definition_path_expands_tilde() {
        let path = definition_path(None);
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with(".config/via-keycode/keyboards.kdl"));

        assert_eq!(
            definition_path(Some("/etc/via-keycode.kdl")),
            PathBuf::from("/etc/via-keycode.kdl")
        );
    }

    #[test]
    fn test_builtin_context_when_no_file() {
        let ctx = load_context(Some("/nonexistent/keyboards.kdl"), None);
        assert!(ctx.is_err());

        let ctx = Context {
            global: GlobalConfig::default(),
            dict: BasicKeyDictionary::qmk_default(),
            device_keys: Vec::new(),
        };
        assert_eq!(ctx.catalog().len(), ctx.dict.len());
        assert!(cmd_resolve(&ctx, "kc_a", &ModifierArgs::default(), false).is_ok());
        assert!(cmd_resolve(&ctx, "kc_nope", &ModifierArgs::default(), false).is_err());
        assert!(cmd_describe(&ctx, "0x5221").is_ok());
        assert!(cmd_describe(&ctx, "banana").is_err());
    }
}
