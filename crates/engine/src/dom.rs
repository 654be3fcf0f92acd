//! Arena-backed in-memory document for the simulated page host.
//!
//! Parsing goes through `scraper` (html5ever); after that the tree is owned
//! here so it can be mutated: outerHTML replacement, inline styles, injected
//! surface nodes. Node ids are arena indices and stay valid after a node is
//! detached, which mirrors a live node reference outliving its removal.

use std::collections::{BTreeMap, HashMap};

use pinpoint_core::{css_property_name, Rect};
use scraper::{ElementRef, Html, Node as HtmlNode};

use crate::event::{ElementSnapshot, NodeHandle, PathSegment};
use crate::query::{QueryError, SelectorList};

pub type NodeId = usize;

const ROOT: NodeId = 0;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "button", "code", "em", "i", "img", "input", "label", "select", "small",
    "span", "strong", "sub", "sup", "textarea",
];

/// Properties a child inherits from its nearest ancestor that sets them.
const INHERITED: &[&str] = &[
    "color",
    "font-family",
    "font-size",
    "font-weight",
    "line-height",
    "text-align",
    "visibility",
];

// Vertical pitch of the block layout used when no explicit rect was set.
const ROW_HEIGHT: f64 = 24.0;
const INDENT: f64 = 8.0;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element {
        tag: String,
        /// Sorted by name; serialisation order is therefore deterministic.
        attrs: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    rects: HashMap<NodeId, Rect>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            rects: HashMap::new(),
        }
    }
}

impl Document {
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Self::default();
        doc.import_element(ROOT, parsed.root_element());
        doc
    }

    fn push(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    fn import_element(&mut self, parent: NodeId, element: ElementRef<'_>) -> NodeId {
        let value = element.value();
        let attrs = value
            .attrs()
            .map(|(name, v)| (name.to_ascii_lowercase(), v.to_string()))
            .collect();
        let id = self.push(
            Some(parent),
            NodeKind::Element {
                tag: value.name().to_ascii_lowercase(),
                attrs,
            },
        );
        self.import_children(id, element);
        id
    }

    fn import_children(&mut self, parent: NodeId, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                HtmlNode::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        self.import_element(parent, el);
                    }
                }
                HtmlNode::Text(text) => {
                    let text: &str = text;
                    self.push(Some(parent), NodeKind::Text(text.to_string()));
                }
                _ => {}
            }
        }
    }

    // ── Tree access ────────────────────────────────────────────────────────

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id).map(|n| &n.kind)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element { .. }))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(Node {
            kind: NodeKind::Element { attrs, .. },
            ..
        }) = self.nodes.get_mut(id)
        {
            attrs.insert(name.to_ascii_lowercase(), value.to_string());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(Node {
            kind: NodeKind::Element { attrs, .. },
            ..
        }) = self.nodes.get_mut(id)
        {
            attrs.remove(name);
        }
    }

    pub fn classes(&self, id: NodeId) -> Vec<String> {
        self.attr(id, "class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(id)
            .map(|n| n.children.iter().copied().filter(|c| self.is_element(*c)).collect())
            .unwrap_or_default()
    }

    /// 1-based position among the parent's element children, and their count.
    pub fn child_position(&self, id: NodeId) -> Option<(usize, usize)> {
        let siblings = self.element_children(self.parent(id)?);
        let index = siblings.iter().position(|s| *s == id)?;
        Some((index + 1, siblings.len()))
    }

    /// 1-based position among the parent's element children sharing this tag,
    /// and their count.
    pub fn same_tag_position(&self, id: NodeId) -> (usize, usize) {
        let tag = self.tag(id).unwrap_or_default();
        let siblings: Vec<NodeId> = match self.parent(id) {
            Some(parent) => self
                .element_children(parent)
                .into_iter()
                .filter(|s| self.tag(*s) == Some(tag))
                .collect(),
            None => vec![id],
        };
        let index = siblings.iter().position(|s| *s == id).unwrap_or(0);
        (index + 1, siblings.len().max(1))
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ROOT {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// True when `node` is `ancestor` or lies beneath it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(ROOT).into_iter().next()
    }

    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.element_children(html)
            .into_iter()
            .find(|c| self.tag(*c) == Some("body"))
    }

    /// Attached elements in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            if self.is_element(id) {
                out.push(id);
            }
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    // ── Queries ────────────────────────────────────────────────────────────

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, QueryError> {
        let list = SelectorList::parse(selector)?;
        Ok(self.elements().into_iter().find(|id| list.matches(self, *id)))
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, QueryError> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .elements()
            .into_iter()
            .filter(|id| list.matches(self, *id))
            .collect())
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.elements()
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(id))
    }

    // ── Mutation ───────────────────────────────────────────────────────────

    pub fn create_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect();
        self.push(
            None,
            NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
                attrs,
            },
        )
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// Remove a node from its parent. The id stays valid but unattached.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.nodes[parent].children.retain(|c| *c != id);
            self.nodes[id].parent = None;
        }
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if id >= self.nodes.len() {
            return;
        }
        for child in std::mem::take(&mut self.nodes[id].children) {
            self.nodes[child].parent = None;
        }
        if !text.is_empty() {
            self.push(Some(id), NodeKind::Text(text.to_string()));
        }
    }

    /// Replace `id` in its parent with the nodes parsed from `html`. Returns
    /// the inserted element ids; a detached node or the document element
    /// cannot be replaced and yields `None`.
    pub fn replace_outer_html(&mut self, id: NodeId, html: &str) -> Option<Vec<NodeId>> {
        let parent = self.parent(id)?;
        if parent == ROOT {
            return None;
        }
        let fragment = Html::parse_fragment(html);
        let holder = self.push(None, NodeKind::Document);
        self.import_children(holder, fragment.root_element());

        let inserted = std::mem::take(&mut self.nodes[holder].children);
        for child in &inserted {
            self.nodes[*child].parent = Some(parent);
        }
        let position = self.nodes[parent].children.iter().position(|c| *c == id)?;
        let siblings = &mut self.nodes[parent].children;
        siblings.remove(position);
        for (offset, child) in inserted.iter().enumerate() {
            siblings.insert(position + offset, *child);
        }
        self.nodes[id].parent = None;

        Some(inserted.into_iter().filter(|c| self.is_element(*c)).collect())
    }

    // ── Serialisation ──────────────────────────────────────────────────────

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let node = match self.nodes.get(id) {
            Some(node) => node,
            None => return,
        };
        match &node.kind {
            NodeKind::Document => {
                for child in &node.children {
                    self.write_node(*child, out);
                }
            }
            NodeKind::Text(text) => {
                let raw = self
                    .tag(node.parent.unwrap_or(ROOT))
                    .map(|t| RAW_TEXT_ELEMENTS.contains(&t))
                    .unwrap_or(false);
                if raw {
                    out.push_str(text);
                } else {
                    escape_into(text, false, out);
                }
            }
            NodeKind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in &node.children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(node) = self.nodes.get(id) {
            match &node.kind {
                NodeKind::Text(text) => out.push_str(text),
                _ => {
                    for child in &node.children {
                        self.collect_text(*child, out);
                    }
                }
            }
        }
    }

    // ── Geometry ───────────────────────────────────────────────────────────

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) {
        self.rects.insert(id, rect);
    }

    /// Viewport-relative box. Explicit rects win; otherwise a block layout:
    /// each element is one row in document order, indented by depth and as
    /// tall as its element subtree.
    pub fn rect(&self, id: NodeId, viewport_width: f64) -> Rect {
        if let Some(rect) = self.rects.get(&id) {
            return *rect;
        }
        let order = self.elements();
        let row = order.iter().position(|e| *e == id).unwrap_or(0);
        let mut depth = 0usize;
        let mut current = self.parent_element(id);
        while let Some(p) = current {
            depth += 1;
            current = self.parent_element(p);
        }
        let subtree = order.iter().filter(|e| self.contains(id, **e)).count().max(1);
        let indent = INDENT * depth as f64;
        Rect::new(
            indent,
            ROW_HEIGHT * row as f64,
            (viewport_width - 2.0 * indent).max(0.0),
            ROW_HEIGHT * subtree as f64,
        )
    }

    /// Event-time facts about an element, as a host reports them to the engine.
    pub fn snapshot(&self, id: NodeId, viewport_width: f64) -> Option<ElementSnapshot> {
        let tag = self.tag(id)?.to_string();
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let (same_tag_index, same_tag_count) = self.same_tag_position(node);
            path.push(PathSegment {
                handle: node as NodeHandle,
                tag: self.tag(node).unwrap_or_default().to_string(),
                same_tag_index,
                same_tag_count,
            });
            current = self.parent_element(node);
        }
        Some(ElementSnapshot {
            handle: id as NodeHandle,
            tag,
            id: self.attr(id, "id").map(str::to_string),
            classes: self.classes(id),
            text: self
                .text_content(id)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
            rect: self.rect(id, viewport_width),
            path,
        })
    }

    // ── Styles ─────────────────────────────────────────────────────────────

    /// Declarations of the `style` attribute, in source order.
    pub fn inline_style(&self, id: NodeId) -> Vec<(String, String)> {
        self.attr(id, "style")
            .map(parse_declarations)
            .unwrap_or_default()
    }

    pub fn style_property(&self, id: NodeId, name: &str) -> Option<String> {
        let name = css_property_name(name);
        self.inline_style(id)
            .into_iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    pub fn set_style_property(&mut self, id: NodeId, name: &str, value: &str) {
        let name = css_property_name(name);
        let mut declarations = self.inline_style(id);
        let value = value.trim().to_string();
        match declarations.iter_mut().find(|(k, _)| *k == name) {
            Some(existing) if value.is_empty() => existing.1.clear(),
            Some(existing) => existing.1 = value,
            None if value.is_empty() => {}
            None => declarations.push((name, value)),
        }
        declarations.retain(|(_, v)| !v.is_empty());
        let serialised = declarations
            .iter()
            .map(|(k, v)| format!("{}: {};", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        if serialised.is_empty() {
            self.remove_attr(id, "style");
        } else {
            self.set_attr(id, "style", &serialised);
        }
    }

    /// Resolved style: user-agent defaults, inherited ancestor declarations,
    /// then the element's own inline style. `props` empty returns every
    /// property known for the element.
    pub fn computed_style(
        &self,
        id: NodeId,
        props: &[String],
        viewport_width: f64,
    ) -> BTreeMap<String, String> {
        let mut resolved = self.default_style(id, viewport_width);

        let mut ancestors = Vec::new();
        let mut current = self.parent_element(id);
        while let Some(p) = current {
            ancestors.push(p);
            current = self.parent_element(p);
        }
        for ancestor in ancestors.into_iter().rev() {
            for (k, v) in self.inline_style(ancestor) {
                if INHERITED.contains(&k.as_str()) {
                    resolved.insert(k, v);
                }
            }
        }
        for (k, v) in self.inline_style(id) {
            resolved.insert(k, v);
        }

        if props.is_empty() {
            return resolved;
        }
        props
            .iter()
            .map(|p| {
                let name = css_property_name(p);
                let value = resolved.get(&name).cloned().unwrap_or_default();
                (name, value)
            })
            .collect()
    }

    fn default_style(&self, id: NodeId, viewport_width: f64) -> BTreeMap<String, String> {
        let tag = self.tag(id).unwrap_or_default();
        let rect = self.rect(id, viewport_width);
        let display = if tag == "head" || RAW_TEXT_ELEMENTS.contains(&tag) {
            "none"
        } else if INLINE_ELEMENTS.contains(&tag) {
            "inline"
        } else {
            "block"
        };
        let (font_size, font_weight) = match tag {
            "h1" => ("32px", "700"),
            "h2" => ("24px", "700"),
            "h3" => ("18.72px", "700"),
            "b" | "strong" | "th" => ("16px", "700"),
            _ => ("16px", "400"),
        };
        let color = if tag == "a" { "rgb(0, 0, 238)" } else { "rgb(0, 0, 0)" };
        [
            ("display", display.to_string()),
            ("position", "static".to_string()),
            ("width", px(rect.width)),
            ("height", px(rect.height)),
            ("margin", if tag == "body" { "8px" } else { "0px" }.to_string()),
            ("padding", "0px".to_string()),
            ("color", color.to_string()),
            ("background-color", "rgba(0, 0, 0, 0)".to_string()),
            ("font-family", "Times New Roman".to_string()),
            ("font-size", font_size.to_string()),
            ("font-weight", font_weight.to_string()),
            ("line-height", "normal".to_string()),
            ("text-align", "start".to_string()),
            ("border", "0px none rgb(0, 0, 0)".to_string()),
            ("border-radius", "0px".to_string()),
            ("box-shadow", "none".to_string()),
            ("opacity", "1".to_string()),
            ("visibility", "visible".to_string()),
            ("z-index", "auto".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

fn px(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}px", value as i64)
    } else {
        format!("{}px", value)
    }
}

fn parse_declarations(style: &str) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    for declaration in style.split(';') {
        if let Some((name, value)) = declaration.split_once(':') {
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            if name.is_empty() || value.is_empty() {
                continue;
            }
            match out.iter_mut().find(|(k, _)| *k == name) {
                Some(existing) => existing.1 = value,
                None => out.push((name, value)),
            }
        }
    }
    out
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html><html><head><title>t</title></head><body>
        <div id="app" style="color: blue">
          <button id="go" class="btn primary">Go <span>now</span></button>
          <ul><li>a</li><li>b</li></ul>
          <img src="x.png" alt="x">
        </div>
    </body></html>"#;

    #[test]
    fn test_parse_and_lookup() {
        let doc = Document::parse(PAGE);
        let go = doc.get_element_by_id("go").unwrap();
        assert_eq!(doc.tag(go), Some("button"));
        assert_eq!(doc.classes(go), vec!["btn", "primary"]);
        assert_eq!(doc.text_content(go), "Go now");
        assert!(doc.body().is_some());
        assert_eq!(doc.query_selector("#go").unwrap(), Some(go));
    }

    #[test]
    fn test_outer_html_serialisation() {
        let doc = Document::parse(PAGE);
        let go = doc.get_element_by_id("go").unwrap();
        assert_eq!(
            doc.outer_html(go),
            r#"<button class="btn primary" id="go">Go <span>now</span></button>"#
        );
        let img = doc.query_selector("img").unwrap().unwrap();
        assert_eq!(doc.outer_html(img), r#"<img alt="x" src="x.png">"#);
    }

    #[test]
    fn test_escaping() {
        let doc = Document::parse(r#"<html><body><p title="a&quot;b">1 &lt; 2 &amp; 3</p></body></html>"#);
        let p = doc.query_selector("p").unwrap().unwrap();
        assert_eq!(doc.outer_html(p), r#"<p title="a&quot;b">1 &lt; 2 &amp; 3</p>"#);
    }

    #[test]
    fn test_replace_outer_html_keeps_position() {
        let mut doc = Document::parse(PAGE);
        let go = doc.get_element_by_id("go").unwrap();
        let inserted = doc
            .replace_outer_html(go, r#"<a id="go" href="/next">Next</a>"#)
            .unwrap();
        assert_eq!(inserted.len(), 1);
        assert!(!doc.is_attached(go));

        let replacement = doc.get_element_by_id("go").unwrap();
        assert_eq!(doc.tag(replacement), Some("a"));
        let app = doc.get_element_by_id("app").unwrap();
        assert_eq!(doc.element_children(app)[0], replacement);
    }

    #[test]
    fn test_document_element_cannot_be_replaced() {
        let mut doc = Document::parse(PAGE);
        let html = doc.document_element().unwrap();
        assert_eq!(doc.replace_outer_html(html, "<p>x</p>"), None);
    }

    #[test]
    fn test_inline_style_round_trip() {
        let mut doc = Document::parse(PAGE);
        let go = doc.get_element_by_id("go").unwrap();
        doc.set_style_property(go, "backgroundColor", "yellow");
        doc.set_style_property(go, "color", "red");
        doc.set_style_property(go, "color", "green");
        assert_eq!(
            doc.attr(go, "style"),
            Some("background-color: yellow; color: green;")
        );
        doc.set_style_property(go, "background-color", "");
        assert_eq!(doc.attr(go, "style"), Some("color: green;"));
    }

    #[test]
    fn test_computed_style_inherits_and_overrides() {
        let mut doc = Document::parse(PAGE);
        let go = doc.get_element_by_id("go").unwrap();
        let props = vec!["color".to_string(), "display".to_string(), "fontWeight".to_string()];

        let style = doc.computed_style(go, &props, 1280.0);
        assert_eq!(style["color"], "blue");
        assert_eq!(style["display"], "inline");
        assert_eq!(style["font-weight"], "400");

        doc.set_style_property(go, "color", "red");
        assert_eq!(doc.computed_style(go, &props, 1280.0)["color"], "red");
        assert!(doc.computed_style(go, &[], 1280.0).contains_key("z-index"));
    }

    #[test]
    fn test_snapshot_path_and_same_tag_index() {
        let doc = Document::parse(PAGE);
        let second_li = doc.query_selector_all("li").unwrap()[1];
        let snap = doc.snapshot(second_li, 1280.0).unwrap();
        assert_eq!(snap.text, "b");
        assert_eq!(snap.path[0].same_tag_index, 2);
        assert_eq!(snap.path[0].same_tag_count, 2);
        assert_eq!(snap.path.last().map(|s| s.tag.as_str()), Some("html"));
        assert!(snap.is_within(doc.get_element_by_id("app").unwrap() as NodeHandle));
    }

    #[test]
    fn test_explicit_rect_wins() {
        let mut doc = Document::parse(PAGE);
        let go = doc.get_element_by_id("go").unwrap();
        doc.set_rect(go, Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(doc.rect(go, 800.0), Rect::new(1.0, 2.0, 3.0, 4.0));
        let app = doc.get_element_by_id("app").unwrap();
        assert!(doc.rect(app, 800.0).height > ROW_HEIGHT);
    }
}
