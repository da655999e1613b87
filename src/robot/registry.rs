//! Breakable-text registry.
//!
//! Finds the text fragments a page marks as breakable, corrupts one of them
//! on request (a single glyph swapped for a glitch symbol) and restores it
//! exactly once the robot has done its repair.

use rand::Rng;

use crate::dom::{NodeId, RenderTree};
use crate::render::Point;

/// Symbols a corrupted character is replaced with
pub const GLITCH_SYMBOLS: &[char] = &['!', '@', '#', '$', '%', '^', '&', '*', '~', '?', '±', '§'];

/// Section tag for fragments outside any named section
pub const UNKNOWN_SECTION: &str = "unknown";

/// Attribute holding the corrupted text while a fragment is broken
const GLITCH_ATTR: &str = "data-glitch";
const BROKEN_CLASS: &str = "broken";

#[derive(Debug, Clone, PartialEq)]
pub struct BreakableFragment {
    pub id: String,
    /// Non-owning handle into the render tree
    pub node: NodeId,
    pub section_id: String,
    /// Text as the scan observed it
    pub scanned_text: String,
    /// Copy taken at corruption time; `Some` exactly while broken
    pub original_text: Option<String>,
}

impl BreakableFragment {
    pub fn is_broken(&self) -> bool {
        self.original_text.is_some()
    }
}

#[derive(Debug, Default)]
pub struct BreakableRegistry {
    fragments: Vec<BreakableFragment>,
    current_broken: Option<String>,
}

impl BreakableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fragments(&self) -> &[BreakableFragment] {
        &self.fragments
    }

    pub fn fragment(&self, id: &str) -> Option<&BreakableFragment> {
        self.fragments.iter().find(|f| f.id == id)
    }

    pub fn current_broken(&self) -> Option<&str> {
        self.current_broken.as_deref()
    }

    /// Whether `id` names a tracked fragment that is currently broken.
    pub fn is_tracked_broken(&self, id: &str) -> bool {
        self.fragment(id).map(|f| f.is_broken()).unwrap_or(false)
    }

    /// Record every element carrying `marker`. Replaces any previous scan.
    pub fn scan<T: RenderTree + ?Sized>(&mut self, tree: &T, marker: &str) -> usize {
        let nodes = tree.marked_nodes(marker);
        log::debug!("Scanning for breakable elements, found {}", nodes.len());

        self.fragments.clear();
        self.current_broken = None;

        for (index, node) in nodes.into_iter().enumerate() {
            let text = match tree.text_content(node) {
                Some(t) if !t.is_empty() => t,
                _ => continue,
            };
            let section_id = tree
                .enclosing_section(node)
                .unwrap_or_else(|| UNKNOWN_SECTION.to_string());

            log::debug!(
                "Fragment {}: {:?} in section {:?}",
                index,
                text.chars().take(20).collect::<String>(),
                section_id
            );

            self.fragments.push(BreakableFragment {
                id: format!("breakable-{}-{}", section_id, index),
                node,
                section_id,
                scanned_text: text,
                original_text: None,
            });
        }

        log::info!("Registered {} breakable fragments", self.fragments.len());
        self.fragments.len()
    }

    /// Corrupt one random eligible fragment of `section_id`.
    ///
    /// Returns the fragment id, or `None` when nothing in the section can be
    /// broken; callers skip the cycle in that case.
    pub fn break_random_in_section<T, R>(
        &mut self,
        tree: &mut T,
        section_id: &str,
        rng: &mut R,
    ) -> Option<String>
    where
        T: RenderTree + ?Sized,
        R: Rng,
    {
        let current = self.current_broken.as_deref();
        let eligible: Vec<usize> = self
            .fragments
            .iter()
            .enumerate()
            .filter(|(_, f)| {
                f.section_id == section_id && !f.is_broken() && Some(f.id.as_str()) != current
            })
            .map(|(i, _)| i)
            .collect();

        if eligible.is_empty() {
            log::debug!("No fragment available to break in section {:?}", section_id);
            return None;
        }

        let idx = eligible[rng.random_range(0..eligible.len())];
        let original = self.fragments[idx].scanned_text.clone();
        let broken = corrupt_text(&original, rng)?;

        let fragment = &mut self.fragments[idx];
        if !tree.set_text_content(fragment.node, &broken) {
            // Node is gone from the render tree
            return None;
        }
        let class = add_class(tree, fragment.node);
        tree.set_attribute(fragment.node, GLITCH_ATTR, &broken);
        tree.set_attribute(fragment.node, "class", &class);
        fragment.original_text = Some(original);

        log::debug!("Broke {} -> {:?}", fragment.id, broken);
        self.current_broken = Some(fragment.id.clone());
        Some(fragment.id.clone())
    }

    /// Restore a broken fragment to its exact original text.
    ///
    /// Unknown ids and fragments that are not broken are ignored.
    pub fn repair_element<T: RenderTree + ?Sized>(&mut self, tree: &mut T, element_id: &str) {
        let Some(fragment) = self.fragments.iter_mut().find(|f| f.id == element_id) else {
            return;
        };
        let Some(original) = fragment.original_text.take() else {
            return;
        };

        tree.set_text_content(fragment.node, &original);
        tree.remove_attribute(fragment.node, GLITCH_ATTR);
        let class = remove_class(tree, fragment.node);
        if class.is_empty() {
            tree.remove_attribute(fragment.node, "class");
        } else {
            tree.set_attribute(fragment.node, "class", &class);
        }

        if self.current_broken.as_deref() == Some(element_id) {
            self.current_broken = None;
        }
        log::debug!("Repaired {}", element_id);
    }

    /// Page-absolute center of a fragment, or `None` once its node is gone.
    pub fn element_position<T: RenderTree + ?Sized>(
        &self,
        tree: &T,
        element_id: &str,
    ) -> Option<Point> {
        let fragment = self.fragment(element_id)?;
        let rect = tree.bounding_rect(fragment.node)?;
        let scroll = tree.scroll_offset();
        let center = rect.center();
        Some(Point::new(center.x + scroll.x, center.y + scroll.y))
    }

    /// Drop every fragment reference (page unmount).
    pub fn clear(&mut self) {
        self.fragments.clear();
        self.current_broken = None;
    }
}

/// Swap one random non-whitespace char of `text` for a glitch symbol that
/// differs from it. Length in chars and every other char are preserved.
pub fn corrupt_text<R: Rng>(text: &str, rng: &mut R) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let positions: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .collect();
    if positions.is_empty() {
        return None;
    }

    let pos = positions[rng.random_range(0..positions.len())];
    let choices: Vec<char> = GLITCH_SYMBOLS
        .iter()
        .copied()
        .filter(|s| *s != chars[pos])
        .collect();
    let symbol = choices[rng.random_range(0..choices.len())];

    Some(
        chars
            .iter()
            .enumerate()
            .map(|(i, c)| if i == pos { symbol } else { *c })
            .collect(),
    )
}

fn current_class<T: RenderTree + ?Sized>(tree: &T, node: NodeId) -> Vec<String> {
    tree.attribute(node, "class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn add_class<T: RenderTree + ?Sized>(tree: &T, node: NodeId) -> String {
    let mut classes = current_class(tree, node);
    if !classes.iter().any(|c| c == BROKEN_CLASS) {
        classes.push(BROKEN_CLASS.to_string());
    }
    classes.join(" ")
}

fn remove_class<T: RenderTree + ?Sized>(tree: &T, node: NodeId) -> String {
    current_class(tree, node)
        .into_iter()
        .filter(|c| c != BROKEN_CLASS)
        .collect::<Vec<_>>()
        .join(" ")
}
