//! Keycode editor session
//!
//! Holds the state a keycode entry dialog needs: raw input text, the
//! modifier selection and the suggestion menu. Everything shown to the user
//! (wrapped keycode, hex preview, validity) is derived from that state on
//! each call.

use crate::advanced::{keycode_to_string, AdvancedResolver, QmkResolver};
use crate::autocomplete::{Autocomplete, MenuEvent};
use crate::catalog::Catalog;
use crate::model::{
    BasicKeyDictionary, CandidateEntry, GlobalConfig, ModifierFlag, ModifierSelection,
};
use crate::resolve::{final_keycode, resolve_with, HexPreview};

const PLACEHOLDER: &str = "KC_NO, 0xFF, etc.";

pub struct KeycodeEditor<'a, R = QmkResolver> {
    dict: &'a BasicKeyDictionary,
    catalog: &'a Catalog,
    advanced: R,
    default_input: String,
    input: String,
    modifiers: ModifierSelection,
    menu: Autocomplete,
}

impl<'a> KeycodeEditor<'a> {
    /// Open an editor seeded with `default_value`, rendered as a keycode string.
    pub fn new(
        dict: &'a BasicKeyDictionary,
        catalog: &'a Catalog,
        default_value: Option<u16>,
    ) -> Self {
        Self::with_resolver(dict, catalog, default_value, QmkResolver)
    }
}

impl<'a, R: AdvancedResolver> KeycodeEditor<'a, R> {
    pub fn with_resolver(
        dict: &'a BasicKeyDictionary,
        catalog: &'a Catalog,
        default_value: Option<u16>,
        advanced: R,
    ) -> Self {
        let default_input = default_value
            .map(|value| keycode_to_string(value, dict))
            .unwrap_or_default();

        let mut menu = Autocomplete::default();
        menu.refresh(catalog, "");

        Self {
            dict,
            catalog,
            advanced,
            input: default_input.clone(),
            default_input,
            modifiers: ModifierSelection::default(),
            menu,
        }
    }

    /// Apply suggestion limit and default modifier side.
    pub fn apply_settings(&mut self, global: &GlobalConfig) {
        self.modifiers.use_right = global.use_right_modifiers;
        self.menu = Autocomplete::new(global.suggestion_limit);
        self.menu.refresh(self.catalog, "");
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Placeholder shown in the empty input field
    pub fn placeholder(&self) -> &str {
        if self.default_input.is_empty() {
            PLACEHOLDER
        } else {
            &self.default_input
        }
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        self.menu
            .handle(MenuEvent::InputChanged(self.input.clone()), self.catalog);
    }

    pub fn menu(&self) -> &Autocomplete {
        &self.menu
    }

    /// Forward focus/blur/navigation to the suggestion menu.
    pub fn handle_menu(&mut self, event: MenuEvent) {
        if let MenuEvent::InputChanged(text) = &event {
            self.input = text.clone();
        }
        self.menu.handle(event, self.catalog);
    }

    /// Replace the input with the highlighted suggestion.
    pub fn accept_suggestion(&mut self) -> Option<CandidateEntry> {
        let selected = self.menu.select()?;
        self.input = selected.code.clone();
        Some(selected)
    }

    pub fn modifiers(&self) -> &ModifierSelection {
        &self.modifiers
    }

    pub fn toggle_modifier(&mut self, flag: ModifierFlag) {
        self.modifiers.toggle(flag);
    }

    pub fn set_use_right(&mut self, use_right: bool) {
        self.modifiers.set_use_right(use_right);
    }

    /// Input wrapped with the selected modifiers
    pub fn final_keycode(&self) -> String {
        final_keycode(&self.input, &self.modifiers)
    }

    pub fn resolved(&self) -> Option<u16> {
        resolve_with(&self.final_keycode(), self.dict, &self.advanced)
    }

    pub fn is_valid(&self) -> bool {
        self.resolved().is_some()
    }

    pub fn hex_preview(&self) -> HexPreview {
        self.resolved().into()
    }

    /// Hand the resolved value to `on_confirm`. Does nothing and returns
    /// `false` while the input is invalid.
    pub fn confirm<F: FnOnce(u16)>(&self, on_confirm: F) -> bool {
        match self.resolved() {
            Some(value) => {
                tracing::debug!(keycode = %self.final_keycode(), value, "keycode confirmed");
                on_confirm(value);
                true
            }
            None => false,
        }
    }

    /// Close the editor without a result.
    pub fn cancel<F: FnOnce()>(self, on_exit: F) {
        on_exit();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::advanced::NoAdvanced;
    use crate::autocomplete::MenuState;
    use crate::model::DeviceKey;

    fn fixture() -> (BasicKeyDictionary, Catalog) {
        let dict = BasicKeyDictionary::qmk_default();
        let keys = vec![DeviceKey {
            code: "CUSTOM(0)".to_string(),
            name: "RGB_TOG".to_string(),
            title: Some("Toggle RGB".to_string()),
        }];
        let catalog = Catalog::build(&dict, &keys);
        (dict, catalog)
    }

    #[test]
    fn test_default_value_seeds_input() {
        let (dict, catalog) = fixture();

        let editor = KeycodeEditor::new(&dict, &catalog, Some(0x0104));
        assert_eq!(editor.input(), "LCTL(KC_A)");
        assert_eq!(editor.placeholder(), "LCTL(KC_A)");
        assert_eq!(editor.resolved(), Some(0x0104));

        let empty = KeycodeEditor::new(&dict, &catalog, None);
        assert_eq!(empty.input(), "");
        assert_eq!(empty.placeholder(), "KC_NO, 0xFF, etc.");
        // Empty input stands for KC_NO
        assert_eq!(empty.hex_preview().to_string(), "0x0000");
    }

    #[test]
    fn test_modifiers_change_preview() {
        let (dict, catalog) = fixture();
        let mut editor = KeycodeEditor::new(&dict, &catalog, None);
        editor.set_input("kc_a");

        editor.toggle_modifier(ModifierFlag::Shift);
        assert_eq!(editor.final_keycode(), "KC_A");

        editor.toggle_modifier(ModifierFlag::Enabled);
        assert_eq!(editor.final_keycode(), "LSFT(KC_A)");
        assert_eq!(editor.hex_preview().to_string(), "0x0204");

        editor.set_use_right(true);
        editor.toggle_modifier(ModifierFlag::Gui);
        assert_eq!(editor.final_keycode(), "RSFT(RGUI(KC_A))");
        assert_eq!(editor.hex_preview(), HexPreview::Valid(0x1A04));
    }

    #[test]
    fn test_confirm_only_when_valid() {
        let (dict, catalog) = fixture();
        let mut editor = KeycodeEditor::new(&dict, &catalog, None);
        let confirmed = Cell::new(None);

        editor.set_input("definitely not a key");
        assert!(!editor.is_valid());
        assert_eq!(editor.hex_preview().to_string(), "Invalid");
        assert!(!editor.confirm(|v| confirmed.set(Some(v))));
        assert_eq!(confirmed.get(), None);

        editor.set_input("mo(2)");
        assert!(editor.confirm(|v| confirmed.set(Some(v))));
        assert_eq!(confirmed.get(), Some(0x5222));
    }

    #[test]
    fn test_cancel_invokes_exit() {
        let (dict, catalog) = fixture();
        let editor = KeycodeEditor::new(&dict, &catalog, Some(4));
        let exited = Cell::new(false);
        editor.cancel(|| exited.set(true));
        assert!(exited.get());
    }

    #[test]
    fn test_suggestions_follow_input() {
        let (dict, catalog) = fixture();
        let mut editor = KeycodeEditor::new(&dict, &catalog, None);

        editor.set_input("rgb");
        assert_eq!(editor.menu().state(), MenuState::Open);
        assert_eq!(editor.menu().items().len(), 1);

        editor.handle_menu(MenuEvent::HighlightNext);
        let picked = editor.accept_suggestion();
        assert_eq!(picked.map(|e| e.label), Some("Toggle RGB".to_string()));
        assert_eq!(editor.input(), "CUSTOM(0)");
        assert_eq!(editor.resolved(), Some(0x7E00));
        assert_eq!(editor.menu().state(), MenuState::Closed);
    }

    #[test]
    fn test_custom_resolver() {
        let (dict, catalog) = fixture();
        let mut editor = KeycodeEditor::with_resolver(&dict, &catalog, None, NoAdvanced);
        editor.set_input("MO(1)");
        assert!(!editor.is_valid());
        editor.set_input("0x5221");
        assert_eq!(editor.resolved(), Some(0x5221));
    }

    #[test]
    fn test_apply_settings() {
        let (dict, catalog) = fixture();
        let mut editor = KeycodeEditor::new(&dict, &catalog, None);
        editor.apply_settings(&GlobalConfig {
            suggestion_limit: 5,
            use_right_modifiers: true,
        });

        assert!(editor.modifiers().use_right);
        editor.set_input("kc_");
        assert_eq!(editor.menu().items().len(), 5);
    }
}
