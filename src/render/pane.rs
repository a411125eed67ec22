//! In-memory live pane: the patch target the pipeline mutates.

use super::vdom::{NodePath, Patch, PatchTarget, VNode};

/// Rendered-pane subtree plus a running count of applied mutations.
#[derive(Debug, Clone, Default)]
pub struct RenderedPane {
    nodes: Vec<VNode>,
    mutations: usize,
}

impl RenderedPane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total mutations applied since creation.
    pub const fn mutation_count(&self) -> usize {
        self.mutations
    }

    pub fn to_html(&self) -> String {
        super::vdom::to_html(&self.nodes)
    }

    /// First element with `tag` in document order.
    pub fn find(&self, tag: &str) -> Option<&VNode> {
        self.nodes.iter().find_map(|node| find_in(node, tag))
    }

    fn children_mut(&mut self, path: &[usize]) -> Option<&mut Vec<VNode>> {
        let mut children = &mut self.nodes;
        for &index in path {
            match children.get_mut(index)? {
                VNode::Element(el) => children = &mut el.children,
                _ => return None,
            }
        }
        Some(children)
    }

    fn node_mut(&mut self, path: &[usize]) -> Option<&mut VNode> {
        let (last, parent) = path.split_last()?;
        self.children_mut(parent)?.get_mut(*last)
    }

    fn apply_one(&mut self, patch: &Patch) -> bool {
        match patch {
            Patch::Replace { path, node } => self.node_mut(path).map(|slot| *slot = node.clone()).is_some(),
            Patch::SetText { path, text } => match self.node_mut(path) {
                Some(VNode::Text(current)) => {
                    current.clone_from(text);
                    true
                }
                _ => false,
            },
            Patch::SetAttr { path, name, value } => match self.node_mut(path) {
                Some(VNode::Element(el)) => {
                    if let Some(slot) = el.attrs.iter_mut().find(|(key, _)| key == name) {
                        slot.1.clone_from(value);
                    } else {
                        el.attrs.push((name.clone(), value.clone()));
                    }
                    true
                }
                _ => false,
            },
            Patch::RemoveAttr { path, name } => match self.node_mut(path) {
                Some(VNode::Element(el)) => {
                    el.attrs.retain(|(key, _)| key != name);
                    true
                }
                _ => false,
            },
            Patch::Append { parent, node } => self
                .children_mut(parent)
                .map(|children| children.push(node.clone()))
                .is_some(),
            Patch::Truncate { parent, len } => self
                .children_mut(parent)
                .map(|children| children.truncate(*len))
                .is_some(),
        }
    }
}

fn find_in<'a>(node: &'a VNode, tag: &str) -> Option<&'a VNode> {
    let VNode::Element(el) = node else {
        return None;
    };
    if el.tag == tag {
        return Some(node);
    }
    el.children.iter().find_map(|child| find_in(child, tag))
}

fn describe(path: &NodePath) -> String {
    path.iter().map(ToString::to_string).collect::<Vec<_>>().join("/")
}

impl PatchTarget for RenderedPane {
    fn nodes(&self) -> &[VNode] {
        &self.nodes
    }

    fn apply(&mut self, patches: &[Patch]) {
        for patch in patches {
            if self.apply_one(patch) {
                self.mutations += 1;
            } else {
                let path = match patch {
                    Patch::Replace { path, .. }
                    | Patch::SetText { path, .. }
                    | Patch::SetAttr { path, .. }
                    | Patch::RemoveAttr { path, .. } => path,
                    Patch::Append { parent, .. } | Patch::Truncate { parent, .. } => parent,
                };
                tracing::warn!(path = %describe(path), "patch does not address a live node, skipped");
            }
        }
    }
}
