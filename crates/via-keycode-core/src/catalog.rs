//! Autocomplete candidate catalog

use std::collections::HashMap;

use crate::model::{BasicKeyDictionary, CandidateEntry, DeviceKey, DEFAULT_SUGGESTION_LIMIT};

/// Deduplicated, ordered list of every keycode offered for autocomplete.
///
/// Built once per change of the underlying dictionaries, then filtered on
/// every keystroke.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CandidateEntry>,
}

impl Catalog {
    /// Basic keys first, then keyboard-specific keys.
    ///
    /// Entries are keyed by `code`. A later entry with a code already present
    /// replaces the earlier one in place, so keyboard-specific labels win.
    pub fn build(dict: &BasicKeyDictionary, device_keys: &[DeviceKey]) -> Self {
        let basic = dict.iter().map(|(name, _)| CandidateEntry {
            code: name.to_string(),
            label: name.to_string(),
        });
        let device = device_keys.iter().map(|key| CandidateEntry {
            code: key.code.clone(),
            label: key.label().to_string(),
        });

        let catalog: Catalog = basic.chain(device).collect();
        tracing::debug!(
            basic = dict.len(),
            device = device_keys.len(),
            total = catalog.len(),
            "built keycode catalog"
        );
        catalog
    }

    /// Case-insensitive substring match on label or code, in catalog order,
    /// truncated to `limit`. An empty query matches everything.
    pub fn filter(&self, query: &str, limit: usize) -> Vec<CandidateEntry> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| {
                needle.is_empty()
                    || entry.label.to_lowercase().contains(&needle)
                    || entry.code.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect()
    }

    /// [`Catalog::filter`] with the default bound of 100 entries
    pub fn search(&self, query: &str) -> Vec<CandidateEntry> {
        self.filter(query, DEFAULT_SUGGESTION_LIMIT)
    }

    pub fn entries(&self) -> &[CandidateEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CandidateEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = CandidateEntry>>(iter: I) -> Self {
        let mut entries: Vec<CandidateEntry> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for entry in iter {
            match index.get(&entry.code) {
                Some(&idx) => entries[idx] = entry,
                None => {
                    index.insert(entry.code.clone(), entries.len());
                    entries.push(entry);
                }
            }
        }

        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_key(code: &str, name: &str, title: Option<&str>) -> DeviceKey {
        DeviceKey {
            code: code.to_string(),
            name: name.to_string(),
            title: title.map(str::to_string),
        }
    }

    fn codes(entries: &[CandidateEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.code.as_str()).collect()
    }

    #[test]
    fn test_build_basic_then_device() {
        let dict: BasicKeyDictionary = [("KC_A", 4), ("KC_B", 5)].into_iter().collect();
        let keys = vec![
            device_key("CUSTOM(0)", "RGB_TOG", Some("Toggle RGB")),
            device_key("CUSTOM(1)", "RGB_MOD", None),
        ];
        let catalog = Catalog::build(&dict, &keys);

        assert_eq!(codes(catalog.entries()), vec!["KC_A", "KC_B", "CUSTOM(0)", "CUSTOM(1)"]);
        assert_eq!(catalog.entries()[0].label, "KC_A");
        assert_eq!(catalog.entries()[2].label, "Toggle RGB");
        assert_eq!(catalog.entries()[3].label, "RGB_MOD");
    }

    #[test]
    fn test_device_entry_overrides_basic_in_place() {
        let dict: BasicKeyDictionary =
            [("KC_A", 4), ("KC_MUTE", 0xA8), ("KC_B", 5)].into_iter().collect();
        let keys = vec![device_key("KC_MUTE", "KC_MUTE", Some("Mute"))];
        let catalog = Catalog::build(&dict, &keys);

        assert_eq!(catalog.len(), 3);
        assert_eq!(codes(catalog.entries()), vec!["KC_A", "KC_MUTE", "KC_B"]);
        let mute: Vec<_> = catalog
            .entries()
            .iter()
            .filter(|e| e.code == "KC_MUTE")
            .collect();
        assert_eq!(mute.len(), 1);
        assert_eq!(mute[0].label, "Mute");
    }

    #[test]
    fn test_empty_query_returns_first_entries_in_order() {
        let dict = BasicKeyDictionary::qmk_default();
        let catalog = Catalog::build(&dict, &[]);
        assert!(catalog.len() > 100);

        let result = catalog.filter("", 100);
        assert_eq!(result.len(), 100);
        assert_eq!(result.as_slice(), &catalog.entries()[..100]);
    }

    #[test]
    fn test_filter_matches_label_or_code_case_insensitive() {
        let dict: BasicKeyDictionary =
            [("KC_LSFT", 0xE1), ("KC_A", 4), ("KC_RSFT", 0xE5)].into_iter().collect();
        let keys = vec![
            device_key("CUSTOM(0)", "SHIFT_LOCK", Some("Shift Lock")),
            device_key("CUSTOM(1)", "FN", None),
        ];
        let catalog = Catalog::build(&dict, &keys);

        assert_eq!(codes(&catalog.filter("shift", 100)), vec!["CUSTOM(0)"]);
        assert_eq!(codes(&catalog.filter("SFT", 100)), vec!["KC_LSFT", "KC_RSFT"]);
        assert_eq!(codes(&catalog.filter("custom(", 100)), vec!["CUSTOM(0)", "CUSTOM(1)"]);
        assert!(catalog.filter("nothing-matches", 100).is_empty());
    }

    #[test]
    fn test_filter_respects_limit() {
        let dict = BasicKeyDictionary::qmk_default();
        let catalog = Catalog::build(&dict, &[]);

        let result = catalog.filter("kc_f", 3);
        assert_eq!(codes(&result), vec!["KC_F", "KC_F1", "KC_F2"]);
        assert!(catalog.filter("kc_", 0).is_empty());
        assert_eq!(catalog.search("").len(), DEFAULT_SUGGESTION_LIMIT);
    }

    #[test]
    fn test_filter_is_stateless() {
        let dict = BasicKeyDictionary::qmk_default();
        let catalog = Catalog::build(&dict, &[]);

        let first = catalog.filter("kc_p", 100);
        let _ = catalog.filter("zzz", 100);
        assert_eq!(catalog.filter("kc_p", 100), first);
    }
}
