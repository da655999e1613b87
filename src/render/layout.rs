use crate::dom::{NodeId, NodeType, PageTree, TextRun};
use crate::render::LayoutBox;

const BLOCK_TAGS: &[&str] = &[
    "html",
    "body",
    "div",
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
    "table",
    "tr",
    "td",
    "th",
    "form",
    "section",
    "article",
    "aside",
    "main",
    "header",
    "footer",
    "nav",
    "blockquote",
    "pre",
    "figure",
    "figcaption",
    "details",
    "summary",
    "hr",
];

/// Tags that never produce boxes
const HIDDEN_TAGS: &[&str] = &["head", "title", "script", "style", "noscript", "svg"];

/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH: f32 = 0.55;
const LINE_HEIGHT: f32 = 1.4;

/// Per-tag vertical margins (top, bottom) in pixels.
fn tag_margins(tag: &str) -> (f32, f32) {
    match tag {
        "h1" => (24.0, 16.0),
        "h2" => (20.0, 12.0),
        "h3" | "h4" => (16.0, 10.0),
        "h5" | "h6" => (12.0, 8.0),
        "p" => (4.0, 10.0),
        "ul" | "ol" => (8.0, 8.0),
        "li" => (2.0, 2.0),
        "section" | "article" | "main" => (16.0, 16.0),
        "nav" | "header" | "footer" => (12.0, 12.0),
        "blockquote" => (12.0, 12.0),
        "pre" => (8.0, 8.0),
        "hr" => (8.0, 8.0),
        _ => (0.0, 0.0),
    }
}

/// Per-tag padding in pixels.
fn tag_padding(tag: &str, is_block: bool) -> f32 {
    match tag {
        "section" | "article" | "main" | "aside" => 24.0,
        "nav" | "header" | "footer" => 12.0,
        "blockquote" => 20.0,
        _ if is_block => 4.0,
        _ => 0.0,
    }
}

fn tag_font_size(tag: &str, parent: f32) -> f32 {
    match tag {
        "h1" => 40.0,
        "h2" => 30.0,
        "h3" => 22.0,
        "h4" => 18.0,
        "h5" | "h6" => 16.0,
        "small" => 12.0,
        _ => parent,
    }
}

/// Minimum height of a `<section>`; the site reads as one screen per section.
const SECTION_MIN_HEIGHT: f32 = 480.0;

/// Inline formatting state: the line being filled inside the current block.
struct Flow {
    cursor_y: f32,
    line_x: f32,
    line_height: f32,
    left: f32,
    right: f32,
}

impl Flow {
    fn break_line(&mut self) {
        self.cursor_y += self.line_height;
        self.line_x = self.left;
        self.line_height = 0.0;
    }

    fn at_line_start(&self) -> bool {
        self.line_x <= self.left
    }
}

/// Compute page-absolute layout for the whole tree (block model with inline
/// word flow). Writes `bounds`, `runs` and `font_size` into every visible node
/// and returns the page height.
pub fn compute_layout(tree: &mut PageTree, viewport_width: f32) -> f32 {
    let mut flow = Flow {
        cursor_y: 0.0,
        line_x: 0.0,
        line_height: 0.0,
        left: 0.0,
        right: viewport_width,
    };
    let root = tree.root();
    layout_node(tree, root, &mut flow, 16.0);
    flow.break_line();

    tree.viewport.width = viewport_width;
    tree.page_height = flow.cursor_y;
    flow.cursor_y
}

fn layout_node(
    tree: &mut PageTree,
    id: NodeId,
    flow: &mut Flow,
    parent_font_size: f32,
) -> Option<LayoutBox> {
    let (tag, node_type, children) = match tree.get(id) {
        Some(n) => (n.tag.clone(), n.node_type, n.children.clone()),
        None => return None,
    };

    if HIDDEN_TAGS.contains(&tag.as_str()) {
        return None;
    }

    if node_type == NodeType::Text {
        return layout_text(tree, id, flow, parent_font_size);
    }

    let font_size = tag_font_size(&tag, parent_font_size);
    let is_block = node_type == NodeType::Document || BLOCK_TAGS.contains(&tag.as_str());

    let bounds = if is_block {
        let (margin_top, margin_bottom) = tag_margins(&tag);
        let padding = tag_padding(&tag, is_block);

        if !flow.at_line_start() || flow.line_height > 0.0 {
            flow.break_line();
        }
        flow.cursor_y += margin_top;
        let start_y = flow.cursor_y;
        let (outer_left, outer_right) = (flow.left, flow.right);

        flow.cursor_y += padding;
        flow.left = outer_left + padding;
        flow.right = (outer_right - padding).max(flow.left);
        flow.line_x = flow.left;

        for child in children {
            layout_node(tree, child, flow, font_size);
        }
        if flow.line_height > 0.0 {
            flow.break_line();
        }
        flow.cursor_y += padding;

        if tag == "section" {
            flow.cursor_y = flow.cursor_y.max(start_y + SECTION_MIN_HEIGHT);
        }

        let bounds = LayoutBox {
            x: outer_left,
            y: start_y,
            width: outer_right - outer_left,
            height: flow.cursor_y - start_y,
        };

        flow.left = outer_left;
        flow.right = outer_right;
        flow.line_x = outer_left;
        flow.cursor_y += margin_bottom;
        bounds
    } else if tag == "br" {
        let line_height = font_size * LINE_HEIGHT;
        let bounds = LayoutBox {
            x: flow.line_x,
            y: flow.cursor_y,
            width: 0.0,
            height: flow.line_height.max(line_height),
        };
        flow.line_height = flow.line_height.max(line_height);
        flow.break_line();
        bounds
    } else {
        // Inline element: the union of whatever its children placed
        let anchor = LayoutBox {
            x: flow.line_x,
            y: flow.cursor_y,
            width: 0.0,
            height: 0.0,
        };
        let mut union: Option<LayoutBox> = None;
        for child in children {
            if let Some(b) = layout_node(tree, child, flow, font_size) {
                union = Some(match union {
                    Some(u) => u.union(&b),
                    None => b,
                });
            }
        }
        union.unwrap_or(anchor)
    };

    if let Some(node) = tree.get_mut(id) {
        node.bounds = Some(bounds);
        node.font_size = font_size;
    }
    Some(bounds)
}

fn layout_text(
    tree: &mut PageTree,
    id: NodeId,
    flow: &mut Flow,
    font_size: f32,
) -> Option<LayoutBox> {
    let text = tree.get(id)?.text.clone();
    let advance = font_size * CHAR_WIDTH;
    let line_height = font_size * LINE_HEIGHT;

    let mut runs: Vec<TextRun> = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            // Leading spaces vanish at the start of a line
            if !flow.at_line_start() {
                flow.line_x += advance;
            }
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }
        let width = (i - start) as f32 * advance;

        if !flow.at_line_start() && flow.line_x + width > flow.right {
            flow.break_line();
        }
        flow.line_height = flow.line_height.max(line_height);

        let word = LayoutBox {
            x: flow.line_x,
            y: flow.cursor_y,
            width,
            height: line_height,
        };
        flow.line_x += width;

        match runs.last_mut() {
            Some(run) if run.bounds.y == word.y => {
                run.bounds = run.bounds.union(&word);
                run.end = i;
            }
            _ => runs.push(TextRun {
                bounds: word,
                start,
                end: i,
            }),
        }
    }

    let bounds = runs
        .iter()
        .map(|r| r.bounds)
        .reduce(|a, b| a.union(&b));

    let node = tree.get_mut(id)?;
    node.runs = runs;
    node.bounds = bounds;
    node.font_size = font_size;
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parser::parse_html;
    use crate::dom::RenderTree;

    #[test]
    fn inline_spans_share_a_line() {
        let mut tree = parse_html(
            r#"<html><body><section id="home"><h1>
                <span data-breakable>Jane</span> <span data-breakable>Doe</span>
            </h1></section></body></html>"#,
        );
        compute_layout(&mut tree, 800.0);

        let marked = tree.marked_nodes("data-breakable");
        let a = tree.get(marked[0]).unwrap().bounds.unwrap();
        let b = tree.get(marked[1]).unwrap().bounds.unwrap();
        assert_eq!(a.y, b.y);
        assert!(b.x > a.x + a.width);
        assert!((a.width - 4.0 * 40.0 * CHAR_WIDTH).abs() < 0.01);
    }

    #[test]
    fn long_text_wraps_into_runs() {
        let mut tree = parse_html(
            "<html><body><p>alpha beta gamma delta epsilon zeta eta theta</p></body></html>",
        );
        compute_layout(&mut tree, 120.0);

        let text_node = tree
            .descendants(tree.root())
            .into_iter()
            .find(|id| tree.get(*id).unwrap().node_type == NodeType::Text)
            .unwrap();
        let node = tree.get(text_node).unwrap();
        assert!(node.runs.len() > 1);
        // Runs cover the words in order without overlapping
        for pair in node.runs.windows(2) {
            assert!(pair[0].end <= pair[1].start);
            assert!(pair[0].bounds.y < pair[1].bounds.y);
        }
    }

    #[test]
    fn sections_stack_vertically() {
        let mut tree = parse_html(
            r#"<html><body>
                <section id="home"><p>one</p></section>
                <section id="about"><p>two</p></section>
            </body></html>"#,
        );
        let height = compute_layout(&mut tree, 800.0);

        let home = tree.element_by_id("home").unwrap();
        let about = tree.element_by_id("about").unwrap();
        let hb = tree.get(home).unwrap().bounds.unwrap();
        let ab = tree.get(about).unwrap().bounds.unwrap();
        assert!(hb.height >= SECTION_MIN_HEIGHT);
        assert!(ab.y >= hb.bottom());
        assert!(height >= ab.bottom());
    }
}
