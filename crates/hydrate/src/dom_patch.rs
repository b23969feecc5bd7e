//! Patch log for arena mutations.
//!
//! Every structural or content change made through [`crate::DomArena`] is
//! recorded as a `DomPatch`, so a hydration pass can be replayed against a
//! real DOM (or inspected in tests) without diffing trees afterwards.
//!
//! Invariants:
//! - Patches are recorded in the order the mutations happened.
//! - `AppendChild`/`InsertBefore` on a node that already has a parent is a
//!   move; appliers must detach it from its old position first.
//! - `InsertBefore::before` is always a current child of `parent`.
//! - `SplitText` creates `new_key` holding the text after `offset` and places
//!   it right after `key` when `key` has a parent.
//! - Keys are never `NodeKey::INVALID`.

use crate::types::{Namespace, NodeKey};
use std::sync::Arc;

#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomPatch {
    CreateElement {
        key: NodeKey,
        name: Arc<str>,
        namespace: Namespace,
    },
    CreateText {
        key: NodeKey,
        text: String,
    },
    CreateComment {
        key: NodeKey,
        text: String,
    },
    /// Append a child to the end of a parent's children list.
    AppendChild { parent: NodeKey, child: NodeKey },
    /// Insert a child before an existing sibling.
    InsertBefore {
        parent: NodeKey,
        child: NodeKey,
        before: NodeKey,
    },
    /// Remove a node from its parent. The node and its subtree stay alive.
    Detach { key: NodeKey },
    /// Replace the character data of a text or comment node.
    SetText { key: NodeKey, text: String },
    SplitText {
        key: NodeKey,
        offset: usize,
        new_key: NodeKey,
    },
    SetAttribute {
        key: NodeKey,
        name: Arc<str>,
        value: Option<String>,
    },
    RemoveAttribute { key: NodeKey, name: Arc<str> },
}

impl DomPatch {
    /// True for patches that reposition an existing node inside a parent.
    pub fn is_insertion(&self) -> bool {
        matches!(
            self,
            DomPatch::AppendChild { .. } | DomPatch::InsertBefore { .. }
        )
    }
}
