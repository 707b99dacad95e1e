//! Stable label colors.
//!
//! A label gets the next palette slot the first time it is seen and keeps it
//! for the lifetime of the assigner. Once the palette is exhausted slots are
//! reused in order. The session creates a fresh assigner per dataset.

use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_PALETTE: [&str; 10] = [
    "#2563eb", "#f97316", "#16a34a", "#dc2626", "#9333ea", "#0891b2", "#ca8a04", "#db2777",
    "#4b5563", "#65a30d",
];

#[derive(Debug, Clone)]
pub struct ColorAssigner {
    palette: Vec<String>,
    assigned: HashMap<String, usize>,
}

impl Default for ColorAssigner {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect())
    }
}

impl ColorAssigner {
    /// An empty palette falls back to [`DEFAULT_PALETTE`].
    pub fn new(palette: Vec<String>) -> Self {
        let palette = if palette.is_empty() {
            DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
        } else {
            palette
        };
        Self {
            palette,
            assigned: HashMap::new(),
        }
    }

    pub fn color_for(&mut self, label: &str) -> &str {
        let next = self.assigned.len() % self.palette.len();
        let slot = *self.assigned.entry(label.to_string()).or_insert(next);
        &self.palette[slot]
    }

    /// Colors for `labels`, assigning any that are new.
    pub fn legend<'a, I>(&mut self, labels: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        labels
            .into_iter()
            .map(|label| (label.to_string(), self.color_for(label).to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_label_keeps_its_color() {
        let mut colors = ColorAssigner::default();
        let first = colors.color_for("Regular").to_string();
        colors.color_for("Trancado");
        assert_eq!(colors.color_for("Regular"), first);
        assert_eq!(colors.len(), 2);
    }

    #[test]
    fn distinct_labels_get_distinct_colors_until_palette_cycles() {
        let mut colors = ColorAssigner::new(vec!["red".into(), "blue".into()]);
        assert_eq!(colors.color_for("a"), "red");
        assert_eq!(colors.color_for("b"), "blue");
        assert_eq!(colors.color_for("c"), "red");
        assert_eq!(colors.color_for("b"), "blue");
    }

    #[test]
    fn legend_assigns_in_encounter_order() {
        let mut colors = ColorAssigner::default();
        let legend = colors.legend(["M", "F"]);
        assert_eq!(legend["M"], DEFAULT_PALETTE[0]);
        assert_eq!(legend["F"], DEFAULT_PALETTE[1]);
        let again = colors.legend(["F", "N/A"]);
        assert_eq!(again["F"], DEFAULT_PALETTE[1]);
        assert_eq!(again["N/A"], DEFAULT_PALETTE[2]);
    }
}
