use crate::dom::{DomNode, NodeId, PageTree};
use scraper::{ElementRef, Html, Node};
use std::collections::HashMap;

/// Tags whose children should be stripped (invisible/script content)
const SKIP_CHILDREN: &[&str] = &["script", "style", "noscript", "svg", "head"];

/// Parse raw HTML string into a PageTree
pub fn parse_html(html: &str) -> PageTree {
    let document = Html::parse_document(html);

    // Extract <title>
    let title = scraper::Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default();

    let mut tree = PageTree::new();
    tree.title = title.trim().to_string();
    let root = tree.root();
    convert_element(document.root_element(), &mut tree, root);
    tree
}

fn convert_element(el: ElementRef<'_>, tree: &mut PageTree, parent: NodeId) {
    let tag = el.value().name.local.as_ref().to_string();
    let attributes: HashMap<String, String> = el
        .value()
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let id = tree.append(parent, DomNode::element(tag.as_str(), attributes));

    // Skip children of invisible elements
    if SKIP_CHILDREN.contains(&tag.as_str()) {
        return;
    }

    for child_ref in el.children() {
        match child_ref.value() {
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child_ref) {
                    convert_element(child_el, tree, id);
                }
            }
            Node::Text(t) => {
                let collapsed = collapse_whitespace(&t.text);
                if !collapsed.is_empty() {
                    tree.append(id, DomNode::text(collapsed));
                }
            }
            _ => {}
        }
    }
}

/// Collapse whitespace runs to a single space, the way normal flow renders text.
fn collapse_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_space = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::RenderTree;

    #[test]
    fn parse_simple_html() {
        let html = r#"
        <html>
            <head><title>Test Page</title></head>
            <body>
                <h1>Hello, robot</h1>
                <p>Content paragraph</p>
            </body>
        </html>
        "#;

        let tree = parse_html(html);
        assert_eq!(tree.title, "Test Page");
        assert!(tree.node_count() > 0);
    }

    #[test]
    fn strips_script_children() {
        let html = r#"
        <html><body>
            <p>Visible</p>
            <script>alert("hidden");</script>
        </body></html>
        "#;

        let tree = parse_html(html);
        let text = tree.collect_text(tree.root());
        assert!(text.contains("Visible"));
        assert!(!text.contains("alert"));
    }

    #[test]
    fn keeps_inter_span_spaces() {
        let html = r#"<html><body><section id="home"><h1>
            <span data-breakable>Jane</span> <span data-breakable>Doe</span>
        </h1></section></body></html>"#;

        let tree = parse_html(html);
        let marked = tree.marked_nodes("data-breakable");
        assert_eq!(marked.len(), 2);
        let h1 = tree.closest(marked[0], "h1").unwrap();
        assert_eq!(tree.text_content(h1).unwrap().trim(), "Jane Doe");
        assert_eq!(tree.enclosing_section(marked[1]).as_deref(), Some("home"));
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), " a b ");
        assert_eq!(collapse_whitespace("\n   \n"), " ");
    }
}
