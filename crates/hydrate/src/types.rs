use std::fmt;
use std::sync::Arc;

/// Stable handle for a node inside a [`crate::DomArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u32);

impl NodeKey {
    /// Reserved sentinel; the arena never hands this out.
    pub const INVALID: NodeKey = NodeKey(0);

    pub(crate) fn from_index(index: usize) -> Self {
        NodeKey(index as u32 + 1)
    }

    pub(crate) fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position a node was claimed at during a hydration pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClaimOrder(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    Html,
    Svg,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        name: Arc<str>,
        namespace: Namespace,
        attributes: Vec<(Arc<str>, Option<String>)>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl NodeKind {
    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text { .. })
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, NodeKind::Comment { .. })
    }

    pub fn element_name(&self) -> Option<&str> {
        match self {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .and_then(|(_, v)| v.as_deref()),
            _ => None,
        }
    }
}

/// Where `append_hydration` should place the next node of a container.
///
/// `Unset` means no append has happened yet this session, `End` means every
/// remaining child has been consumed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EndChild {
    #[default]
    Unset,
    End,
    At(NodeKey),
}

impl EndChild {
    pub(crate) fn from_option(key: Option<NodeKey>) -> Self {
        match key {
            Some(key) => EndChild::At(key),
            None => EndChild::End,
        }
    }
}
