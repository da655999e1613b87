//! Section catalogue and scroll tracking.
//!
//! The page is a fixed sequence of named sections. The one crossing the
//! vertical middle of the viewport is "active": it is highlighted in the
//! navigation header and, with section triggers on, gets glitched.

pub mod projects;

use crate::dom::PageTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Home,
    About,
    Skills,
    Projects,
    Certifications,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Home,
        Section::About,
        Section::Skills,
        Section::Projects,
        Section::Certifications,
    ];

    /// `id` of the `<section>` element
    pub fn id(self) -> &'static str {
        match self {
            Section::Home => "home",
            Section::About => "about",
            Section::Skills => "skills",
            Section::Projects => "projects",
            Section::Certifications => "certifications",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Section::Home => "Home",
            Section::About => "About",
            Section::Skills => "Skills",
            Section::Projects => "Projects",
            Section::Certifications => "Certifications",
        }
    }

    pub fn from_id(id: &str) -> Option<Section> {
        Section::ALL.into_iter().find(|s| s.id() == id)
    }
}

/// Section whose box crosses the middle of the viewport.
pub fn active_section(tree: &PageTree) -> Option<Section> {
    let middle = tree.viewport.scroll_y + tree.viewport.height / 2.0;
    Section::ALL.into_iter().find(|section| {
        tree.element_by_id(section.id())
            .and_then(|id| tree.get(id))
            .and_then(|node| node.bounds)
            .map(|b| b.contains_y(middle))
            .unwrap_or(false)
    })
}

/// Page Y to scroll to so `section` starts at the top of the viewport.
pub fn scroll_target(tree: &PageTree, section: Section) -> Option<f32> {
    let node = tree.get(tree.element_by_id(section.id())?)?;
    node.bounds.map(|b| b.y)
}

/// Reports the active section only when it changes.
#[derive(Debug, Default)]
pub struct SectionTracker {
    active: Option<Section>,
}

impl SectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<Section> {
        self.active
    }

    /// Re-evaluate after a scroll; `Some` when a new section took over.
    pub fn update(&mut self, tree: &PageTree) -> Option<Section> {
        let now = active_section(tree);
        if now == self.active {
            return None;
        }
        self.active = now;
        if let Some(section) = now {
            log::debug!("Active section: {}", section.id());
        }
        now
    }
}
