//! Virtual node tree and incremental patches.
//!
//! The render pipeline produces a fresh [`VNode`] forest for every content
//! change and [`diff`]s it against what the live pane currently shows. Only
//! the resulting [`Patch`] list is applied, so unchanged subtrees are never
//! touched.

use std::fmt::Write as _;

/// HTML elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VNode {
    Element(Element),
    /// Text content; escaped when serialised.
    Text(String),
    /// Trusted HTML passed through verbatim.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<VNode>,
}

impl VNode {
    pub fn element(tag: &str, children: Vec<Self>) -> Self {
        Self::Element(Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children,
        })
    }

    pub fn element_with_attrs(tag: &str, attrs: Vec<(String, String)>, children: Vec<Self>) -> Self {
        Self::Element(Element {
            tag: tag.to_string(),
            attrs,
            children,
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_html(self, &mut out);
        out
    }
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

fn collect_text(node: &VNode, out: &mut String) {
    match node {
        VNode::Text(text) => out.push_str(text),
        VNode::Raw(_) => {}
        VNode::Element(el) => {
            for child in &el.children {
                collect_text(child, out);
            }
        }
    }
}

/// Serialise a forest to HTML.
pub fn to_html(nodes: &[VNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_html(node, &mut out);
    }
    out
}

fn write_html(node: &VNode, out: &mut String) {
    match node {
        VNode::Text(text) => escape_into(text, out),
        VNode::Raw(html) => out.push_str(html),
        VNode::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in &el.attrs {
                let _ = write!(out, " {name}=\"");
                escape_into(value, out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                return;
            }
            for child in &el.children {
                write_html(child, out);
            }
            let _ = write!(out, "</{}>", el.tag);
        }
    }
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

/// Child-index path from the pane root to a node.
pub type NodePath = Vec<usize>;

/// One DOM mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    /// Swap the node at `path` for `node`.
    Replace { path: NodePath, node: VNode },
    /// Change the text of the text node at `path`.
    SetText { path: NodePath, text: String },
    SetAttr {
        path: NodePath,
        name: String,
        value: String,
    },
    RemoveAttr { path: NodePath, name: String },
    /// Append `node` to the children of `parent` (empty path is the root).
    Append { parent: NodePath, node: VNode },
    /// Drop children of `parent` from index `len` onward.
    Truncate { parent: NodePath, len: usize },
}

/// Minimal patch list turning `old` into `new`.
///
/// Children are matched by position. Elements with the same tag are patched
/// in place; anything else at a position is replaced whole.
pub fn diff(old: &[VNode], new: &[VNode]) -> Vec<Patch> {
    let mut patches = Vec::new();
    diff_children(&mut Vec::new(), old, new, &mut patches);
    patches
}

fn diff_children(path: &mut NodePath, old: &[VNode], new: &[VNode], out: &mut Vec<Patch>) {
    for (index, (before, after)) in old.iter().zip(new).enumerate() {
        path.push(index);
        diff_node(path, before, after, out);
        path.pop();
    }
    if new.len() > old.len() {
        for node in &new[old.len()..] {
            out.push(Patch::Append {
                parent: path.clone(),
                node: node.clone(),
            });
        }
    } else if new.len() < old.len() {
        out.push(Patch::Truncate {
            parent: path.clone(),
            len: new.len(),
        });
    }
}

fn diff_node(path: &mut NodePath, old: &VNode, new: &VNode, out: &mut Vec<Patch>) {
    match (old, new) {
        (VNode::Text(before), VNode::Text(after)) => {
            if before != after {
                out.push(Patch::SetText {
                    path: path.clone(),
                    text: after.clone(),
                });
            }
        }
        (VNode::Element(before), VNode::Element(after)) if before.tag == after.tag => {
            diff_attrs(path, before, after, out);
            diff_children(path, &before.children, &after.children, out);
        }
        _ => {
            if old != new {
                out.push(Patch::Replace {
                    path: path.clone(),
                    node: new.clone(),
                });
            }
        }
    }
}

fn diff_attrs(path: &NodePath, old: &Element, new: &Element, out: &mut Vec<Patch>) {
    for (name, value) in &new.attrs {
        if old.attr(name) != Some(value.as_str()) {
            out.push(Patch::SetAttr {
                path: path.clone(),
                name: name.clone(),
                value: value.clone(),
            });
        }
    }
    for (name, _) in &old.attrs {
        if new.attr(name).is_none() {
            out.push(Patch::RemoveAttr {
                path: path.clone(),
                name: name.clone(),
            });
        }
    }
}

/// Something a patch list can be applied to, typically the live rendered
/// pane.
pub trait PatchTarget {
    /// Nodes currently shown, used as the diff baseline.
    fn nodes(&self) -> &[VNode];

    /// Apply `patches` in order.
    fn apply(&mut self, patches: &[Patch]);

    /// Bring the target in line with `tree`, returning the number of patches
    /// applied.
    fn patch_to(&mut self, tree: &[VNode]) -> usize {
        let patches = diff(self.nodes(), tree);
        if !patches.is_empty() {
            self.apply(&patches);
        }
        patches.len()
    }
}
