use std::collections::HashMap;

use crate::{default_fill_palette, Color};

/// Fill colors keyed by pretty name, handed out in first-seen order.
///
/// Mappings are never removed. Once more distinct names than palette colors
/// have been seen, the palette wraps and later names share colors with
/// earlier ones.
#[derive(Debug, Clone)]
pub struct ColorAssigner {
    palette: Vec<Color>,
    assigned: HashMap<String, usize>,
    next: usize,
}

impl Default for ColorAssigner {
    fn default() -> Self {
        Self::new(default_fill_palette())
    }
}

impl ColorAssigner {
    /// An empty `palette` falls back to the default one.
    pub fn new(palette: Vec<Color>) -> Self {
        let palette = if palette.is_empty() {
            default_fill_palette()
        } else {
            palette
        };
        Self {
            palette,
            assigned: HashMap::new(),
            next: 0,
        }
    }

    pub fn color_for(&mut self, pretty_name: &str) -> &Color {
        let index = match self.assigned.get(pretty_name).copied() {
            Some(index) => index,
            None => {
                let index = self.next;
                self.assigned.insert(pretty_name.to_string(), index);
                self.next = (self.next + 1) % self.palette.len();
                index
            }
        };
        &self.palette[index]
    }

    /// Color already given to `pretty_name`, without assigning a new one.
    pub fn assigned(&self, pretty_name: &str) -> Option<&Color> {
        self.assigned
            .get(pretty_name)
            .map(|index| &self.palette[*index])
    }

    /// Number of distinct names seen so far.
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}
