//! Hover highlighting and legend-driven category filtering.

use std::collections::BTreeSet;

use crate::{Category, Entry};

/// Fill opacity of the bars sharing the hovered entry's pretty name.
pub const HIGHLIGHT_OPACITY: f64 = 1.0;
/// Fill opacity of every other bar.
pub const RESTING_OPACITY: f64 = 0.3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionController {
    hidden: BTreeSet<Category>,
    sticky: Option<String>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins `entry`'s pretty name. Returns whether the highlight changed.
    pub fn hover(&mut self, entry: &Entry) -> bool {
        if self.sticky.as_deref() == Some(entry.pretty_name.as_str()) {
            return false;
        }
        self.sticky = Some(entry.pretty_name.clone());
        true
    }

    /// Clears the highlight. Returns whether one was set.
    pub fn unhover(&mut self) -> bool {
        self.sticky.take().is_some()
    }

    pub fn sticky(&self) -> Option<&str> {
        self.sticky.as_deref()
    }

    pub fn fill_opacity(&self, entry: &Entry) -> f64 {
        match self.sticky.as_deref() {
            Some(name) if name == entry.pretty_name => HIGHLIGHT_OPACITY,
            _ => RESTING_OPACITY,
        }
    }

    /// Flips whether `category` is hidden. Returns `true` when it is now hidden.
    pub fn toggle_category(&mut self, category: Category) -> bool {
        if self.hidden.remove(&category) {
            false
        } else {
            self.hidden.insert(category);
            true
        }
    }

    pub fn is_hidden(&self, category: Category) -> bool {
        self.hidden.contains(&category)
    }

    pub fn hidden_categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.hidden.iter().copied()
    }

    pub fn is_visible(&self, entry: &Entry) -> bool {
        !self.is_hidden(entry.category)
    }

    pub fn visible_entries<'a>(&self, entries: &'a [Entry]) -> Vec<&'a Entry> {
        entries.iter().filter(|entry| self.is_visible(entry)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(pretty_name: &str, category: Category) -> Entry {
        let start = Utc.with_ymd_and_hms(2024, 2, 5, 9, 0, 0).unwrap();
        Entry {
            name: pretty_name.to_string(),
            pretty_name: pretty_name.to_string(),
            start,
            end: start + chrono::Duration::hours(1),
            tags: Vec::new(),
            path: String::new(),
            filename: String::new(),
            category,
        }
    }

    fn sample() -> Vec<Entry> {
        vec![
            entry("standup", Category::Calendar),
            entry("deploy", Category::Ops),
            entry("standup", Category::Calendar),
            entry("gym", Category::Personal),
        ]
    }

    #[test]
    fn everything_rests_until_hovered() {
        let interaction = InteractionController::new();
        assert!(sample()
            .iter()
            .all(|e| interaction.fill_opacity(e) == RESTING_OPACITY));
    }

    #[test]
    fn hover_highlights_every_bar_with_the_same_name() {
        let entries = sample();
        let mut interaction = InteractionController::new();
        assert!(interaction.hover(&entries[0]));
        let opacities: Vec<f64> = entries.iter().map(|e| interaction.fill_opacity(e)).collect();
        assert_eq!(opacities, vec![1.0, 0.3, 1.0, 0.3]);

        assert!(!interaction.hover(&entries[2]));
        assert_eq!(interaction.sticky(), Some("standup"));
    }

    #[test]
    fn unhover_restores_resting_opacity() {
        let entries = sample();
        let mut interaction = InteractionController::new();
        interaction.hover(&entries[1]);
        assert!(interaction.unhover());
        assert!(!interaction.unhover());
        assert!(entries.iter().all(|e| interaction.fill_opacity(e) == 0.3));
    }

    #[test]
    fn toggling_twice_restores_visible_set() {
        let entries = sample();
        let mut interaction = InteractionController::new();
        let before = interaction.visible_entries(&entries);
        assert_eq!(before.len(), 4);

        assert!(interaction.toggle_category(Category::Calendar));
        let filtered = interaction.visible_entries(&entries);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|e| e.category != Category::Calendar));

        assert!(!interaction.toggle_category(Category::Calendar));
        assert_eq!(interaction.visible_entries(&entries), before);
        assert_eq!(interaction.hidden_categories().count(), 0);
    }
}
