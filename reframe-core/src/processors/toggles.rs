//! Thread-safe processor toggle map.
//!
//! A UI (or any other controller) flips processors on and off while the
//! registry re-reads the map every time it is asked for the active set.
//! Entries keep their insertion order so toggled-on processors are appended
//! in the order they were first switched.

use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Default)]
pub struct ToggleStore {
    entries: Arc<RwLock<Vec<(String, bool)>>>,
}

impl ToggleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the toggle for `name`, keeping its original position if present.
    pub fn set(&self, name: impl Into<String>, enabled: bool) {
        let name = name.into();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = enabled,
            None => entries.push((name, enabled)),
        }
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, enabled)| *enabled)
    }

    /// Removes the toggle entirely; the processor is then left as it is.
    pub fn clear(&self, name: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(existing, _)| existing != name);
    }

    /// Copy of the current entries in insertion order.
    pub fn snapshot(&self) -> Vec<(String, bool)> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for ToggleStore {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        let store = ToggleStore::new();
        for (name, enabled) in iter {
            store.set(name, enabled);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_insertion_order() {
        let toggles = ToggleStore::new();
        toggles.set("face_enhancer", true);
        toggles.set("color_invert", false);
        toggles.set("face_enhancer", false);

        assert_eq!(
            toggles.snapshot(),
            vec![
                ("face_enhancer".to_string(), false),
                ("color_invert".to_string(), false)
            ]
        );
        assert_eq!(toggles.get("color_invert"), Some(false));
        assert_eq!(toggles.get("missing"), None);
    }

    #[test]
    fn test_clones_share_state() {
        let toggles: ToggleStore = [("color_invert", true)].into_iter().collect();
        let ui_side = toggles.clone();
        ui_side.set("color_invert", false);
        ui_side.clear("never_set");
        assert_eq!(toggles.get("color_invert"), Some(false));
        toggles.clear("color_invert");
        assert!(ui_side.snapshot().is_empty());
    }
}
