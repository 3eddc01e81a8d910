use crate::hex::HexColor;
use crate::pal::RGB;
use std::collections::HashMap;

/// Colors for object-detection labels, one per distinct label
///
/// Keep one of these per analysis session. The color of a label is derived from a hash of its
/// text, so it's stable across sessions and runs, and no state is shared between maps.
#[derive(Debug, Clone, Default)]
pub struct LabelColors {
    assigned: HashMap<String, HexColor>,
}

impl LabelColors {
    /// Empty map, for a new session
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Color of the label, assigning one on first use
    pub fn color_for(&mut self, label: &str) -> HexColor {
        if let Some(&color) = self.assigned.get(label) {
            return color;
        }
        let color = label_color(label);
        self.assigned.insert(label.to_owned(), color);
        color
    }

    /// Color of the label, if it has been assigned already
    #[inline]
    #[must_use]
    pub fn get(&self, label: &str) -> Option<HexColor> {
        self.assigned.get(label).copied()
    }

    /// Number of labels seen
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// No labels yet
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Labels and their colors, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, HexColor)> + '_ {
        self.assigned.iter().map(|(label, &color)| (label.as_str(), color))
    }
}

/// Top 24 bits of an Fx-style hash of the label
fn label_color(label: &str) -> HexColor {
    let hash = label.bytes().fold(0u64, |h, b| (h.rotate_left(5) ^ u64::from(b)).wrapping_mul(0x517cc1b727220a95));
    let [_, _, _, _, _, r, g, b] = (hash >> 40).to_be_bytes();
    HexColor::from(RGB::new(r, g, b))
}

#[test]
fn stable_per_label() {
    let mut a = LabelColors::new();
    let cat = a.color_for("cat");
    let dog = a.color_for("dog");
    assert_eq!(cat, a.color_for("cat"));
    assert_ne!(cat, dog);
    assert_eq!(2, a.len());
    assert_eq!(Some(dog), a.get("dog"));
    assert_eq!(None, a.get("person"));

    let mut b = LabelColors::new();
    assert!(b.is_empty());
    assert_eq!(dog, b.color_for("dog"));
    assert_eq!(cat, b.color_for("cat"));
}

#[test]
fn iterates_assignments() {
    let mut colors = LabelColors::new();
    for label in ["person", "bicycle", "person", "car"] {
        colors.color_for(label);
    }
    let mut labels: Vec<_> = colors.iter().map(|(l, c)| (l, c.to_string().len())).collect();
    labels.sort();
    assert_eq!(vec![("bicycle", 7), ("car", 7), ("person", 7)], labels);
}
