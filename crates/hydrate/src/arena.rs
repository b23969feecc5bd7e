//! Index-keyed DOM arena that hydration runs against.
//!
//! Nodes are never freed: detaching only unlinks a node from its parent, the
//! same way a detached DOM node stays usable by whoever still holds it.
//! Parents own their child lists; children only keep a `parent` back
//! reference, so there are no ownership cycles.

use crate::dom_patch::DomPatch;
use crate::types::{ClaimOrder, EndChild, Namespace, NodeKey, NodeKind};
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub enum DomError {
    MissingKey(NodeKey),
    WrongNodeKind(NodeKey),
    InvalidParent(NodeKey),
    InvalidSibling { parent: NodeKey, before: NodeKey },
    CycleDetected { parent: NodeKey, child: NodeKey },
    InvalidSplit { key: NodeKey, offset: usize },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::MissingKey(key) => write!(f, "no node with key {key}"),
            DomError::WrongNodeKind(key) => write!(f, "node {key} has the wrong kind"),
            DomError::InvalidParent(key) => write!(f, "node {key} cannot have children"),
            DomError::InvalidSibling { parent, before } => {
                write!(f, "node {before} is not a child of {parent}")
            }
            DomError::CycleDetected { parent, child } => {
                write!(f, "inserting {child} into {parent} would create a cycle")
            }
            DomError::InvalidSplit { key, offset } => {
                write!(f, "cannot split text node {key} at byte {offset}")
            }
        }
    }
}

impl std::error::Error for DomError {}

#[derive(Debug)]
struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    claim_order: Option<ClaimOrder>,
    hydrate_init: bool,
    actual_end_child: EndChild,
}

impl NodeRecord {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            claim_order: None,
            hydrate_init: false,
            actual_end_child: EndChild::Unset,
        }
    }

    fn allows_children(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }
}

#[derive(Debug, Default)]
pub struct DomArena {
    nodes: Vec<NodeRecord>,
    patches: Vec<DomPatch>,
}

impl DomArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        key.index().is_some_and(|index| index < self.nodes.len())
    }

    pub fn create_element(&mut self, name: &str) -> NodeKey {
        self.insert_element(Arc::from(name.to_ascii_lowercase()), Namespace::Html)
    }

    /// SVG names are case-sensitive (`foreignObject`), so they are stored as given.
    pub fn create_svg_element(&mut self, name: &str) -> NodeKey {
        self.insert_element(Arc::from(name), Namespace::Svg)
    }

    pub fn create_text(&mut self, text: &str) -> NodeKey {
        let key = self.push(NodeKind::Text {
            text: text.to_string(),
        });
        self.patches.push(DomPatch::CreateText {
            key,
            text: text.to_string(),
        });
        key
    }

    pub fn create_comment(&mut self, text: &str) -> NodeKey {
        let key = self.push(NodeKind::Comment {
            text: text.to_string(),
        });
        self.patches.push(DomPatch::CreateComment {
            key,
            text: text.to_string(),
        });
        key
    }

    fn insert_element(&mut self, name: Arc<str>, namespace: Namespace) -> NodeKey {
        let key = self.push(NodeKind::Element {
            name: Arc::clone(&name),
            namespace,
            attributes: Vec::new(),
        });
        self.patches.push(DomPatch::CreateElement {
            key,
            name,
            namespace,
        });
        key
    }

    fn push(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey::from_index(self.nodes.len());
        self.nodes.push(NodeRecord::new(kind));
        key
    }

    fn record(&self, key: NodeKey) -> Result<&NodeRecord, DomError> {
        match key.index().and_then(|index| self.nodes.get(index)) {
            Some(record) => Ok(record),
            None => {
                debug_assert!(false, "missing node key {key}");
                Err(DomError::MissingKey(key))
            }
        }
    }

    fn record_mut(&mut self, key: NodeKey) -> Result<&mut NodeRecord, DomError> {
        match key.index().and_then(|index| self.nodes.get_mut(index)) {
            Some(record) => Ok(record),
            None => {
                debug_assert!(false, "missing node key {key}");
                Err(DomError::MissingKey(key))
            }
        }
    }

    pub fn kind(&self, key: NodeKey) -> Result<&NodeKind, DomError> {
        Ok(&self.record(key)?.kind)
    }

    pub fn parent(&self, key: NodeKey) -> Result<Option<NodeKey>, DomError> {
        Ok(self.record(key)?.parent)
    }

    pub fn children(&self, key: NodeKey) -> Result<&[NodeKey], DomError> {
        Ok(&self.record(key)?.children)
    }

    pub fn first_child(&self, key: NodeKey) -> Result<Option<NodeKey>, DomError> {
        Ok(self.record(key)?.children.first().copied())
    }

    pub fn next_sibling(&self, key: NodeKey) -> Result<Option<NodeKey>, DomError> {
        let Some(parent) = self.record(key)?.parent else {
            return Ok(None);
        };
        let siblings = &self.record(parent)?.children;
        let pos = self.position_in(parent, key)?;
        Ok(siblings.get(pos + 1).copied())
    }

    pub fn claim_order(&self, key: NodeKey) -> Result<Option<ClaimOrder>, DomError> {
        Ok(self.record(key)?.claim_order)
    }

    pub fn set_claim_order(&mut self, key: NodeKey, order: ClaimOrder) -> Result<(), DomError> {
        self.record_mut(key)?.claim_order = Some(order);
        Ok(())
    }

    pub(crate) fn hydrate_init(&self, key: NodeKey) -> Result<bool, DomError> {
        Ok(self.record(key)?.hydrate_init)
    }

    pub(crate) fn set_hydrate_init(&mut self, key: NodeKey) -> Result<(), DomError> {
        self.record_mut(key)?.hydrate_init = true;
        Ok(())
    }

    pub(crate) fn actual_end_child(&self, key: NodeKey) -> Result<EndChild, DomError> {
        Ok(self.record(key)?.actual_end_child)
    }

    pub(crate) fn set_actual_end_child(
        &mut self,
        key: NodeKey,
        end: EndChild,
    ) -> Result<(), DomError> {
        self.record_mut(key)?.actual_end_child = end;
        Ok(())
    }

    /// Forget per-container hydration markers so a later pass can reconcile again.
    pub(crate) fn reset_hydration_markers(&mut self) {
        for record in &mut self.nodes {
            record.hydrate_init = false;
            record.actual_end_child = EndChild::Unset;
        }
    }

    /// Drop every claim order. Orders only mean something within the pass
    /// that handed them out.
    pub(crate) fn clear_claim_orders(&mut self) {
        for record in &mut self.nodes {
            record.claim_order = None;
        }
    }

    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `before`, or at the end when `before` is `None`.
    ///
    /// An attached `child` is moved: it is unlinked from its current parent first.
    pub fn insert_before(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        before: Option<NodeKey>,
    ) -> Result<(), DomError> {
        if parent == child || self.is_descendant(child, parent)? {
            debug_assert!(false, "cannot create cycle");
            return Err(DomError::CycleDetected { parent, child });
        }
        if !self.record(parent)?.allows_children() {
            debug_assert!(false, "parent node cannot have children");
            return Err(DomError::InvalidParent(parent));
        }
        self.record(child)?;
        // Inserting a node before itself keeps it where it is.
        let before = match before {
            Some(anchor) if anchor == child => self.next_sibling(child)?,
            other => other,
        };
        if let Some(anchor) = before {
            if self.record(anchor)?.parent != Some(parent) {
                debug_assert!(false, "before is not a child of parent");
                return Err(DomError::InvalidSibling {
                    parent,
                    before: anchor,
                });
            }
        }

        self.unlink(child)?;
        let pos = match before {
            Some(anchor) => self.position_in(parent, anchor)?,
            None => self.record(parent)?.children.len(),
        };
        self.record_mut(parent)?.children.insert(pos, child);
        self.record_mut(child)?.parent = Some(parent);

        self.patches.push(match before {
            Some(before) => DomPatch::InsertBefore {
                parent,
                child,
                before,
            },
            None => DomPatch::AppendChild { parent, child },
        });
        Ok(())
    }

    /// Remove `key` from its parent, if it has one.
    pub fn detach(&mut self, key: NodeKey) -> Result<(), DomError> {
        if self.unlink(key)? {
            self.patches.push(DomPatch::Detach { key });
        }
        Ok(())
    }

    fn unlink(&mut self, key: NodeKey) -> Result<bool, DomError> {
        let Some(parent) = self.record_mut(key)?.parent.take() else {
            return Ok(false);
        };
        self.record_mut(parent)?.children.retain(|k| *k != key);
        Ok(true)
    }

    fn position_in(&self, parent: NodeKey, child: NodeKey) -> Result<usize, DomError> {
        self.record(parent)?
            .children
            .iter()
            .position(|k| *k == child)
            .ok_or(DomError::InvalidSibling {
                parent,
                before: child,
            })
    }

    /// Split a text node at byte `offset`; the tail becomes a new text node
    /// placed right after `key`, which keeps the head.
    pub fn split_text(&mut self, key: NodeKey, offset: usize) -> Result<NodeKey, DomError> {
        let tail = match &mut self.record_mut(key)?.kind {
            NodeKind::Text { text } => {
                if offset > text.len() || !text.is_char_boundary(offset) {
                    return Err(DomError::InvalidSplit { key, offset });
                }
                text.split_off(offset)
            }
            _ => return Err(DomError::WrongNodeKind(key)),
        };
        let new_key = self.push(NodeKind::Text { text: tail });
        if let Some(parent) = self.record(key)?.parent {
            let pos = self.position_in(parent, key)?;
            self.record_mut(parent)?.children.insert(pos + 1, new_key);
            self.record_mut(new_key)?.parent = Some(parent);
        }
        self.patches.push(DomPatch::SplitText {
            key,
            offset,
            new_key,
        });
        Ok(new_key)
    }

    /// Replace the character data of a text or comment node.
    pub fn set_text(&mut self, key: NodeKey, value: &str) -> Result<(), DomError> {
        match &mut self.record_mut(key)?.kind {
            NodeKind::Text { text } | NodeKind::Comment { text } => {
                text.clear();
                text.push_str(value);
            }
            NodeKind::Element { .. } => return Err(DomError::WrongNodeKind(key)),
        }
        self.patches.push(DomPatch::SetText {
            key,
            text: value.to_string(),
        });
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        key: NodeKey,
        name: &str,
        value: Option<String>,
    ) -> Result<(), DomError> {
        let name: Arc<str> = Arc::from(name);
        match &mut self.record_mut(key)?.kind {
            NodeKind::Element { attributes, .. } => {
                match attributes
                    .iter_mut()
                    .find(|(k, _)| k.eq_ignore_ascii_case(&name))
                {
                    Some((_, existing)) => *existing = value.clone(),
                    None => attributes.push((Arc::clone(&name), value.clone())),
                }
            }
            _ => return Err(DomError::WrongNodeKind(key)),
        }
        self.patches.push(DomPatch::SetAttribute { key, name, value });
        Ok(())
    }

    pub fn remove_attribute(&mut self, key: NodeKey, name: &str) -> Result<(), DomError> {
        let removed = match &mut self.record_mut(key)?.kind {
            NodeKind::Element { attributes, .. } => {
                let before = attributes.len();
                attributes.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
                before != attributes.len()
            }
            _ => return Err(DomError::WrongNodeKind(key)),
        };
        if removed {
            self.patches.push(DomPatch::RemoveAttribute {
                key,
                name: Arc::from(name),
            });
        }
        Ok(())
    }

    pub fn patches(&self) -> &[DomPatch] {
        &self.patches
    }

    pub fn take_patches(&mut self) -> Vec<DomPatch> {
        std::mem::take(&mut self.patches)
    }

    fn is_descendant(
        &self,
        ancestor: NodeKey,
        maybe_descendant: NodeKey,
    ) -> Result<bool, DomError> {
        let mut current = self.record(maybe_descendant)?.parent;
        while let Some(key) = current {
            if key == ancestor {
                return Ok(true);
            }
            current = self.record(key)?.parent;
        }
        Ok(false)
    }
}
