pub mod parser;

use std::collections::HashMap;

use crate::render::{LayoutBox, Point, Viewport};

/// Stable handle to a node in a [`PageTree`].
///
/// Handles are plain indices: they do not keep the node alive, and a handle
/// to a removed node simply resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element,
    Text,
}

/// One laid-out line fragment of a text node.
///
/// `start..end` is a char range into the node's text, so a same-length
/// rewrite of the text keeps its runs valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRun {
    pub bounds: LayoutBox,
    pub start: usize,
    pub end: usize,
}

/// Internal DOM node representation.
#[derive(Debug, Clone)]
pub struct DomNode {
    pub tag: String,
    pub attributes: HashMap<String, String>,
    pub text: String,
    pub node_type: NodeType,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Page-absolute bounds, filled in by layout
    pub bounds: Option<LayoutBox>,
    /// Line fragments (text nodes only), filled in by layout
    pub runs: Vec<TextRun>,
    pub font_size: f32,
}

impl DomNode {
    pub fn document() -> Self {
        Self::with_type("#document", NodeType::Document)
    }

    pub fn element(tag: impl Into<String>, attrs: HashMap<String, String>) -> Self {
        let mut node = Self::with_type(tag, NodeType::Element);
        node.attributes = attrs;
        node
    }

    pub fn text(content: impl Into<String>) -> Self {
        let mut node = Self::with_type("", NodeType::Text);
        node.text = content.into();
        node
    }

    fn with_type(tag: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            tag: tag.into(),
            attributes: HashMap::new(),
            text: String::new(),
            node_type,
            parent: None,
            children: Vec::new(),
            bounds: None,
            runs: Vec::new(),
            font_size: 16.0,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

/// Arena-backed DOM for one loaded page, plus the viewport looking at it.
#[derive(Debug, Clone)]
pub struct PageTree {
    nodes: Vec<Option<DomNode>>,
    root: NodeId,
    pub title: String,
    pub viewport: Viewport,
    /// Total laid-out height of the page
    pub page_height: f32,
}

impl Default for PageTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PageTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(DomNode::document())],
            root: NodeId(0),
            title: String::new(),
            viewport: Viewport::default(),
            page_height: 0.0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id.0).and_then(|n| n.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut DomNode> {
        self.nodes.get_mut(id.0).and_then(|n| n.as_mut())
    }

    /// Append `node` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, mut node: DomNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(Some(node));
        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    /// Detach `id` from its parent and drop its whole subtree.
    /// Returns false if the node was already gone.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }
        let parent = match self.get(id) {
            Some(node) => node.parent,
            None => return false,
        };
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|c| *c != id);
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(next.0).and_then(|n| n.take()) {
                stack.extend(node.children);
            }
        }
        true
    }

    /// Live node ids in document order.
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.get(id) {
                out.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Elements carrying attribute `name`, in document order.
    pub fn select_by_attr(&self, name: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| {
                self.get(*id)
                    .map(|n| n.node_type == NodeType::Element && n.attributes.contains_key(name))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Element whose `id` attribute equals `element_id`.
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.get(*id).and_then(|n| n.attr("id")) == Some(element_id))
    }

    /// Nearest ancestor-or-self element with tag `tag`.
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            let node = self.get(cur)?;
            if node.node_type == NodeType::Element && node.tag == tag {
                return Some(cur);
            }
            cursor = node.parent;
        }
        None
    }

    /// Concatenated text of all descendant text nodes, untrimmed.
    pub fn text_content(&self, id: NodeId) -> Option<String> {
        self.get(id)?;
        let mut buf = String::new();
        for d in self.descendants(id) {
            if let Some(node) = self.get(d) {
                if node.node_type == NodeType::Text {
                    buf.push_str(&node.text);
                }
            }
        }
        Some(buf)
    }

    /// Replace the text under `id`.
    ///
    /// An element holding a single text child keeps that child (and its
    /// layout runs); anything else has its children replaced by one text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> bool {
        let (node_type, children, bounds, font_size) = match self.get(id) {
            Some(n) => (n.node_type, n.children.clone(), n.bounds, n.font_size),
            None => return false,
        };
        if node_type == NodeType::Text {
            if let Some(n) = self.get_mut(id) {
                n.text = text.to_string();
            }
            return true;
        }
        if let [only] = children.as_slice() {
            if let Some(child) = self.get_mut(*only) {
                if child.node_type == NodeType::Text {
                    child.text = text.to_string();
                    return true;
                }
            }
        }
        for child in children {
            self.remove(child);
        }
        let mut node = DomNode::text(text);
        node.font_size = font_size;
        if let Some(b) = bounds {
            node.bounds = Some(b);
            node.runs = vec![TextRun {
                bounds: b,
                start: 0,
                end: text.chars().count(),
            }];
        }
        self.append(id, node);
        true
    }

    /// Collect trimmed text content recursively, space-separated
    pub fn collect_text(&self, id: NodeId) -> String {
        let mut buf = String::new();
        for d in self.descendants(id) {
            if let Some(node) = self.get(d) {
                if node.node_type == NodeType::Text && !node.text.trim().is_empty() {
                    if !buf.is_empty() {
                        buf.push(' ');
                    }
                    buf.push_str(node.text.trim());
                }
            }
        }
        buf
    }

    /// Nearest ancestor-or-self carrying attribute `name`.
    pub fn closest_with_attr(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            let node = self.get(cur)?;
            if node.attributes.contains_key(name) {
                return Some(cur);
            }
            cursor = node.parent;
        }
        None
    }
}

/// What the repair engine needs from whatever renders the page.
///
/// Node handles are non-owning: once the render tree drops a node, every
/// query about it answers `None`.
pub trait RenderTree {
    /// Elements carrying `marker`, in document order.
    fn marked_nodes(&self, marker: &str) -> Vec<NodeId>;
    fn text_content(&self, node: NodeId) -> Option<String>;
    fn set_text_content(&mut self, node: NodeId, text: &str) -> bool;
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    fn remove_attribute(&mut self, node: NodeId, name: &str);
    /// `id` of the nearest enclosing `<section>`, if it has one.
    fn enclosing_section(&self, node: NodeId) -> Option<String>;
    /// Bounds relative to the viewport, like a client rect.
    fn bounding_rect(&self, node: NodeId) -> Option<LayoutBox>;
    fn scroll_offset(&self) -> Point;
}

impl RenderTree for PageTree {
    fn marked_nodes(&self, marker: &str) -> Vec<NodeId> {
        self.select_by_attr(marker)
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        PageTree::text_content(self, node)
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) -> bool {
        PageTree::set_text_content(self, node, text)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.get(node)?.attr(name).map(str::to_string)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.get_mut(node) {
            n.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(n) = self.get_mut(node) {
            n.attributes.remove(name);
        }
    }

    fn enclosing_section(&self, node: NodeId) -> Option<String> {
        let section = self.closest(node, "section")?;
        self.get(section)?
            .attr("id")
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    fn bounding_rect(&self, node: NodeId) -> Option<LayoutBox> {
        let bounds = self.get(node)?.bounds?;
        Some(bounds.translate(-self.viewport.scroll_x, -self.viewport.scroll_y))
    }

    fn scroll_offset(&self) -> Point {
        self.viewport.scroll_offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (PageTree, NodeId, NodeId) {
        let mut tree = PageTree::new();
        let mut attrs = HashMap::new();
        attrs.insert("id".to_string(), "about".to_string());
        let section = tree.append(tree.root(), DomNode::element("section", attrs));
        let mut marked = HashMap::new();
        marked.insert("data-breakable".to_string(), String::new());
        let span = tree.append(section, DomNode::element("span", marked));
        tree.append(span, DomNode::text("Graduate"));
        (tree, section, span)
    }

    #[test]
    fn finds_marked_and_section() {
        let (tree, _, span) = sample();
        assert_eq!(tree.marked_nodes("data-breakable"), vec![span]);
        assert_eq!(tree.enclosing_section(span).as_deref(), Some("about"));
        assert_eq!(PageTree::text_content(&tree, span).as_deref(), Some("Graduate"));
    }

    #[test]
    fn removed_nodes_resolve_to_none() {
        let (mut tree, section, span) = sample();
        assert!(tree.remove(section));
        assert!(tree.get(span).is_none());
        assert!(PageTree::text_content(&tree, span).is_none());
        assert!(tree.marked_nodes("data-breakable").is_empty());
        assert!(!tree.remove(section));
    }

    #[test]
    fn set_text_keeps_single_text_child() {
        let (mut tree, _, span) = sample();
        let child = tree.get(span).unwrap().children[0];
        assert!(PageTree::set_text_content(&mut tree, span, "Gr@duate"));
        assert_eq!(tree.get(span).unwrap().children, vec![child]);
        assert_eq!(tree.get(child).unwrap().text, "Gr@duate");
    }
}
