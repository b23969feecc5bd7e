//! Claiming existing nodes for a render pass.
//!
//! A claim list is a snapshot of a container's children. Each claim looks for
//! a matching node, preferring the nearest one at or after the position of
//! the previous claim so claimed nodes tend to form long in-order runs, which
//! keeps the later reorder cheap. Every claimed (or freshly created) node is
//! stamped with the next claim order of the list.

use crate::arena::{DomArena, DomError};
use crate::config::HydrationConfig;
use crate::session::HydrationSession;
use crate::types::{ClaimOrder, Namespace, NodeKey, NodeKind};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClaimInfo {
    /// Position of the last claim that moved the cursor; searches start here.
    pub last_index: usize,
    /// Next claim order to hand out.
    pub total_claimed: u32,
}

#[derive(Clone, Debug, Default)]
pub struct ClaimNodes {
    nodes: Vec<NodeKey>,
    info: Option<ClaimInfo>,
}

impl ClaimNodes {
    pub fn new(nodes: Vec<NodeKey>) -> Self {
        Self { nodes, info: None }
    }

    /// Snapshot the current children of `parent`.
    pub fn children(arena: &DomArena, parent: NodeKey) -> Result<Self, DomError> {
        Ok(Self::new(arena.children(parent)?.to_vec()))
    }

    /// Nodes not claimed yet, in snapshot order.
    pub fn nodes(&self) -> &[NodeKey] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `None` until the first claim touches the list.
    pub fn info(&self) -> Option<ClaimInfo> {
        self.info
    }

    fn info_mut(&mut self) -> &mut ClaimInfo {
        self.info.get_or_insert_with(ClaimInfo::default)
    }

    fn next_order(&mut self) -> ClaimOrder {
        let info = self.info_mut();
        let order = ClaimOrder(info.total_claimed);
        info.total_claimed += 1;
        order
    }

    /// Claim the first node matching `predicate`, searching forward from the
    /// cursor and then backward from just before it, or `create` one.
    ///
    /// `process` runs on a found node and returns what should take its slot
    /// in the list: `None` removes the slot, `Some(node)` replaces it.
    pub fn claim_node<P, F, C>(
        &mut self,
        arena: &mut DomArena,
        mut predicate: P,
        mut process: F,
        create: C,
        update_cursor: bool,
    ) -> Result<NodeKey, DomError>
    where
        P: FnMut(&NodeKind) -> bool,
        F: FnMut(&mut DomArena, NodeKey) -> Result<Option<NodeKey>, DomError>,
        C: FnOnce(&mut DomArena) -> NodeKey,
    {
        let last_index = self.info_mut().last_index.min(self.nodes.len());

        let mut hit = None;
        for i in last_index..self.nodes.len() {
            if predicate(arena.kind(self.nodes[i])?) {
                hit = Some(i);
                break;
            }
        }
        if hit.is_none() {
            // Walk backward so the search stays close to the cursor.
            for i in (0..last_index).rev() {
                if predicate(arena.kind(self.nodes[i])?) {
                    hit = Some(i);
                    break;
                }
            }
        }

        let node = match hit {
            Some(i) => {
                let node = self.nodes[i];
                let removed = match process(arena, node)? {
                    Some(replacement) => {
                        self.nodes[i] = replacement;
                        false
                    }
                    None => {
                        self.nodes.remove(i);
                        true
                    }
                };
                let info = self.info_mut();
                if update_cursor {
                    info.last_index = i;
                } else if removed && i < last_index {
                    info.last_index = last_index - 1;
                }
                log::trace!(target: "hydrate.claim", "claimed {node} at {i}");
                node
            }
            None => {
                let node = create(arena);
                log::trace!(target: "hydrate.claim", "created {node}");
                node
            }
        };

        let order = self.next_order();
        arena.set_claim_order(node, order)?;
        Ok(node)
    }

    /// Claim an HTML element by name, dropping attributes not in `attributes`.
    pub fn claim_element(
        &mut self,
        arena: &mut DomArena,
        name: &str,
        attributes: &[&str],
    ) -> Result<NodeKey, DomError> {
        self.claim_element_in(arena, name, attributes, Namespace::Html)
    }

    pub fn claim_svg_element(
        &mut self,
        arena: &mut DomArena,
        name: &str,
        attributes: &[&str],
    ) -> Result<NodeKey, DomError> {
        self.claim_element_in(arena, name, attributes, Namespace::Svg)
    }

    fn claim_element_in(
        &mut self,
        arena: &mut DomArena,
        name: &str,
        attributes: &[&str],
        namespace: Namespace,
    ) -> Result<NodeKey, DomError> {
        self.claim_node(
            arena,
            |kind| kind.element_name().is_some_and(|n| n.eq_ignore_ascii_case(name)),
            |arena, node| {
                let stale: Vec<Arc<str>> = match arena.kind(node)? {
                    NodeKind::Element { attributes: existing, .. } => existing
                        .iter()
                        .filter(|(k, _)| !attributes.iter().any(|a| a.eq_ignore_ascii_case(k)))
                        .map(|(k, _)| Arc::clone(k))
                        .collect(),
                    _ => Vec::new(),
                };
                for attr in stale {
                    arena.remove_attribute(node, &attr)?;
                }
                Ok(None)
            },
            |arena| match namespace {
                Namespace::Html => arena.create_element(name),
                Namespace::Svg => arena.create_svg_element(name),
            },
            true,
        )
    }

    /// Claim a text node holding `data`.
    ///
    /// A node whose text merely starts with `data` is split, and the tail
    /// stays in the list for the next claim. Text claims never move the
    /// cursor: text is everywhere and would break up runs of elements.
    pub fn claim_text(&mut self, arena: &mut DomArena, data: &str) -> Result<NodeKey, DomError> {
        self.claim_node(
            arena,
            NodeKind::is_text,
            |arena, node| {
                let (has_prefix, exact) = match arena.kind(node)? {
                    NodeKind::Text { text } => (text.starts_with(data), text.len() == data.len()),
                    _ => return Err(DomError::WrongNodeKind(node)),
                };
                if !has_prefix {
                    arena.set_text(node, data)?;
                } else if !exact {
                    return arena.split_text(node, data.len()).map(Some);
                }
                Ok(None)
            },
            |arena| arena.create_text(data),
            false,
        )
    }

    pub fn claim_space(&mut self, arena: &mut DomArena) -> Result<NodeKey, DomError> {
        self.claim_text(arena, " ")
    }

    pub fn claim_comment(
        &mut self,
        arena: &mut DomArena,
        data: &str,
    ) -> Result<NodeKey, DomError> {
        self.claim_node(
            arena,
            NodeKind::is_comment,
            |arena, node| {
                arena.set_text(node, data)?;
                Ok(None)
            },
            |arena| arena.create_comment(data),
            false,
        )
    }

    /// Claim the nodes of a raw HTML block delimited by marker comments.
    ///
    /// The markers are detached and the nodes between them are stamped in
    /// document order. Without a complete marker pair nothing is claimed.
    pub fn claim_html_tag(
        &mut self,
        arena: &mut DomArena,
        config: &HydrationConfig,
        is_svg: bool,
    ) -> Result<HtmlTagHydration, DomError> {
        let Some(start) = self.find_comment(arena, &config.html_tag_start, 0)? else {
            return Ok(HtmlTagHydration::unclaimed(is_svg));
        };
        let Some(end) = self.find_comment(arena, &config.html_tag_end, start + 1)? else {
            return Ok(HtmlTagHydration::unclaimed(is_svg));
        };

        let block: Vec<NodeKey> = self.nodes.drain(start..=end).collect();
        let info = self.info_mut();
        if info.last_index > end {
            info.last_index -= block.len();
        } else if info.last_index > start {
            info.last_index = start;
        }

        arena.detach(block[0])?;
        arena.detach(block[block.len() - 1])?;
        let nodes = block[1..block.len() - 1].to_vec();
        for &node in &nodes {
            let order = self.next_order();
            arena.set_claim_order(node, order)?;
        }
        log::trace!(
            target: "hydrate.claim",
            "claimed raw html block of {} nodes at {start}",
            nodes.len()
        );
        Ok(HtmlTagHydration {
            nodes: Some(nodes),
            is_svg,
        })
    }

    fn find_comment(
        &self,
        arena: &DomArena,
        marker: &str,
        start: usize,
    ) -> Result<Option<usize>, DomError> {
        for (i, &node) in self.nodes.iter().enumerate().skip(start) {
            if let NodeKind::Comment { text } = arena.kind(node)? {
                if text.trim() == marker {
                    return Ok(Some(i));
                }
            }
        }
        Ok(None)
    }

    /// Detach every node nobody claimed. Returns how many were detached.
    pub fn detach_unclaimed(self, arena: &mut DomArena) -> Result<usize, DomError> {
        for &node in &self.nodes {
            arena.detach(node)?;
        }
        if !self.nodes.is_empty() {
            log::trace!(
                target: "hydrate.claim",
                "detached {} unclaimed nodes",
                self.nodes.len()
            );
        }
        Ok(self.nodes.len())
    }
}

/// Nodes of a raw HTML block claimed from server markup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtmlTagHydration {
    nodes: Option<Vec<NodeKey>>,
    is_svg: bool,
}

impl HtmlTagHydration {
    fn unclaimed(is_svg: bool) -> Self {
        Self {
            nodes: None,
            is_svg,
        }
    }

    /// `None` when no marker pair was found and the block must be rendered fresh.
    pub fn nodes(&self) -> Option<&[NodeKey]> {
        self.nodes.as_deref()
    }

    pub fn is_svg(&self) -> bool {
        self.is_svg
    }

    /// Mount the claimed nodes into `target` before `anchor`.
    pub fn mount(
        &self,
        session: &mut HydrationSession,
        arena: &mut DomArena,
        target: NodeKey,
        anchor: Option<NodeKey>,
    ) -> Result<(), DomError> {
        for &node in self.nodes().unwrap_or_default() {
            session.insert(arena, target, node, anchor)?;
        }
        Ok(())
    }
}

/// Collect the children of `head` between `HEAD_<id>_START` and
/// `HEAD_<id>_END` comments, markers included. Ranges may nest.
pub fn head_selector(
    arena: &DomArena,
    head: NodeKey,
    id: &str,
) -> Result<Vec<NodeKey>, DomError> {
    let start_marker = format!("HEAD_{id}_START");
    let end_marker = format!("HEAD_{id}_END");
    let mut result = Vec::new();
    let mut depth = 0usize;
    for &node in arena.children(head)? {
        match arena.kind(node)? {
            NodeKind::Comment { text } => {
                let text = text.trim();
                if text == end_marker {
                    depth = depth.saturating_sub(1);
                    result.push(node);
                } else if text == start_marker {
                    depth += 1;
                    result.push(node);
                }
            }
            _ if depth > 0 => result.push(node),
            _ => {}
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_children(arena: &mut DomArena, names: &[&str]) -> (NodeKey, Vec<NodeKey>) {
        let parent = arena.create_element("body");
        let mut children = Vec::new();
        for name in names {
            let child = match *name {
                text if text.starts_with('"') => arena.create_text(text.trim_matches('"')),
                comment if comment.starts_with("<!--") => {
                    arena.create_comment(comment.trim_start_matches("<!--").trim_end_matches("-->"))
                }
                element => arena.create_element(element),
            };
            arena.append_child(parent, child).unwrap();
            children.push(child);
        }
        arena.take_patches();
        (parent, children)
    }

    fn text_of(arena: &DomArena, key: NodeKey) -> String {
        match arena.kind(key).unwrap() {
            NodeKind::Text { text } | NodeKind::Comment { text } => text.clone(),
            other => panic!("not character data: {other:?}"),
        }
    }

    #[test]
    fn prefers_nearest_forward_match() {
        let mut arena = DomArena::new();
        let (_, kids) = server_children(&mut arena, &["div", "p", "div", "p"]);
        let mut nodes = ClaimNodes::new(kids.clone());

        assert_eq!(nodes.claim_element(&mut arena, "p", &[]).unwrap(), kids[1]);
        assert_eq!(nodes.info().unwrap().last_index, 1);
        // kids[0] also matches, but kids[2] is at or after the cursor.
        assert_eq!(nodes.claim_element(&mut arena, "div", &[]).unwrap(), kids[2]);
        // Nothing left after the cursor, so the search walks backward.
        assert_eq!(nodes.claim_element(&mut arena, "div", &[]).unwrap(), kids[0]);
        assert_eq!(nodes.nodes(), &[kids[3]]);
    }

    #[test]
    fn claim_orders_count_up_including_created_nodes() {
        let mut arena = DomArena::new();
        let (_, kids) = server_children(&mut arena, &["h1", "p"]);
        let mut nodes = ClaimNodes::new(kids.clone());

        let p = nodes.claim_element(&mut arena, "p", &[]).unwrap();
        let created = nodes.claim_element(&mut arena, "section", &[]).unwrap();
        let h1 = nodes.claim_element(&mut arena, "h1", &[]).unwrap();

        assert!(!kids.contains(&created));
        assert_eq!(arena.parent(created).unwrap(), None);
        assert_eq!(arena.claim_order(p).unwrap(), Some(ClaimOrder(0)));
        assert_eq!(arena.claim_order(created).unwrap(), Some(ClaimOrder(1)));
        assert_eq!(arena.claim_order(h1).unwrap(), Some(ClaimOrder(2)));
        assert_eq!(nodes.info().unwrap().total_claimed, 3);
        assert!(nodes.is_empty());
    }

    #[test]
    fn element_claim_prunes_unknown_attributes() {
        let mut arena = DomArena::new();
        let (_, kids) = server_children(&mut arena, &["a"]);
        arena.set_attribute(kids[0], "href", Some("/x".into())).unwrap();
        arena.set_attribute(kids[0], "data-stale", None).unwrap();
        arena.take_patches();

        let mut nodes = ClaimNodes::new(kids.clone());
        nodes.claim_element(&mut arena, "A", &["href"]).unwrap();

        let kind = arena.kind(kids[0]).unwrap();
        assert_eq!(kind.attr("href"), Some("/x"));
        assert!(matches!(
            kind,
            NodeKind::Element { attributes, .. } if attributes.len() == 1
        ));
    }

    #[test]
    fn svg_claim_creates_svg_namespace() {
        let mut arena = DomArena::new();
        let mut nodes = ClaimNodes::default();
        let node = nodes.claim_svg_element(&mut arena, "foreignObject", &[]).unwrap();
        assert!(matches!(
            arena.kind(node).unwrap(),
            NodeKind::Element { namespace: Namespace::Svg, name, .. } if &**name == "foreignObject"
        ));
    }

    #[test]
    fn text_claim_splits_merged_server_text() {
        let mut arena = DomArena::new();
        let (parent, kids) = server_children(&mut arena, &["\"hello world\""]);
        let mut nodes = ClaimNodes::new(kids.clone());

        let hello = nodes.claim_text(&mut arena, "hello").unwrap();
        assert_eq!(hello, kids[0]);
        assert_eq!(text_of(&arena, hello), "hello");
        assert_eq!(nodes.len(), 1);

        let world = nodes.claim_text(&mut arena, " world").unwrap();
        assert_ne!(world, hello);
        assert_eq!(text_of(&arena, world), " world");
        assert!(nodes.is_empty());
        assert_eq!(arena.children(parent).unwrap(), &[hello, world]);
    }

    #[test]
    fn text_claim_overwrites_mismatched_text() {
        let mut arena = DomArena::new();
        let (_, kids) = server_children(&mut arena, &["\"stale\""]);
        let mut nodes = ClaimNodes::new(kids.clone());
        let node = nodes.claim_text(&mut arena, "fresh").unwrap();
        assert_eq!(node, kids[0]);
        assert_eq!(text_of(&arena, node), "fresh");
    }

    #[test]
    fn text_claim_behind_cursor_shifts_it_back() {
        let mut arena = DomArena::new();
        let (_, kids) = server_children(&mut arena, &["\"t\"", "div", "div"]);
        let mut nodes = ClaimNodes::new(kids.clone());

        nodes.claim_element(&mut arena, "div", &[]).unwrap();
        nodes.claim_element(&mut arena, "div", &[]).unwrap();
        assert_eq!(nodes.info().unwrap().last_index, 1);

        nodes.claim_space(&mut arena).unwrap();
        assert_eq!(nodes.info().unwrap().last_index, 0);
        assert_eq!(text_of(&arena, kids[0]), " ");
    }

    #[test]
    fn text_claim_does_not_move_cursor() {
        let mut arena = DomArena::new();
        let (_, kids) = server_children(&mut arena, &["p", "\"a\"", "p"]);
        let mut nodes = ClaimNodes::new(kids.clone());
        nodes.claim_text(&mut arena, "a").unwrap();
        assert_eq!(nodes.info().unwrap().last_index, 0);
        assert_eq!(nodes.claim_element(&mut arena, "p", &[]).unwrap(), kids[0]);
    }

    #[test]
    fn comment_claim_rewrites_data() {
        let mut arena = DomArena::new();
        let (_, kids) = server_children(&mut arena, &["<!--old-->"]);
        let mut nodes = ClaimNodes::new(kids.clone());
        let node = nodes.claim_comment(&mut arena, "new").unwrap();
        assert_eq!(node, kids[0]);
        assert_eq!(text_of(&arena, node), "new");
    }

    #[test]
    fn html_tag_claims_nodes_between_markers() {
        let mut arena = DomArena::new();
        let (parent, kids) = server_children(
            &mut arena,
            &["p", "<!-- HTML_TAG_START -->", "span", "em", "<!-- HTML_TAG_END -->", "div"],
        );
        let mut nodes = ClaimNodes::new(kids.clone());
        nodes.claim_element(&mut arena, "p", &[]).unwrap();

        let html = nodes
            .claim_html_tag(&mut arena, &HydrationConfig::default(), false)
            .unwrap();

        assert_eq!(html.nodes(), Some(&[kids[2], kids[3]][..]));
        assert_eq!(arena.claim_order(kids[2]).unwrap(), Some(ClaimOrder(1)));
        assert_eq!(arena.claim_order(kids[3]).unwrap(), Some(ClaimOrder(2)));
        assert_eq!(arena.parent(kids[1]).unwrap(), None);
        assert_eq!(arena.parent(kids[4]).unwrap(), None);
        assert_eq!(nodes.nodes(), &[kids[5]]);
        assert_eq!(arena.children(parent).unwrap(), &[kids[0], kids[2], kids[3], kids[5]]);
    }

    #[test]
    fn html_tag_without_end_marker_claims_nothing() {
        let mut arena = DomArena::new();
        let (_, kids) = server_children(&mut arena, &["<!--HTML_TAG_START-->", "span"]);
        let mut nodes = ClaimNodes::new(kids.clone());
        let html = nodes
            .claim_html_tag(&mut arena, &HydrationConfig::default(), true)
            .unwrap();
        assert_eq!(html.nodes(), None);
        assert!(html.is_svg());
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn html_tag_shifts_cursor_past_removed_block() {
        let mut arena = DomArena::new();
        let (_, kids) = server_children(
            &mut arena,
            &["p", "<!--HTML_TAG_START-->", "b", "<!--HTML_TAG_END-->", "span", "div"],
        );
        let mut nodes = ClaimNodes::new(kids.clone());
        nodes.claim_element(&mut arena, "span", &[]).unwrap();
        assert_eq!(nodes.info().unwrap().last_index, 4);

        nodes
            .claim_html_tag(&mut arena, &HydrationConfig::default(), false)
            .unwrap();

        assert_eq!(nodes.nodes(), &[kids[0], kids[5]]);
        assert_eq!(nodes.info().unwrap().last_index, 1);
        let div = nodes.claim_element(&mut arena, "div", &[]).unwrap();
        assert_eq!(div, kids[5]);
        assert_eq!(nodes.info().unwrap().last_index, 1);
    }

    #[test]
    fn html_tag_clamps_cursor_inside_block_to_its_start() {
        let mut arena = DomArena::new();
        let (_, kids) = server_children(
            &mut arena,
            &["p", "<!--HTML_TAG_START-->", "b", "<!--HTML_TAG_END-->", "i"],
        );
        let mut nodes = ClaimNodes::new(kids.clone());
        nodes.claim_element(&mut arena, "b", &[]).unwrap();
        assert_eq!(nodes.info().unwrap().last_index, 2);

        let html = nodes
            .claim_html_tag(&mut arena, &HydrationConfig::default(), false)
            .unwrap();

        assert_eq!(html.nodes(), Some(&[][..]));
        assert_eq!(nodes.nodes(), &[kids[0], kids[4]]);
        assert_eq!(nodes.info().unwrap().last_index, 1);
    }

    #[test]
    fn head_selector_collects_marked_range() {
        let mut arena = DomArena::new();
        let (head, kids) = server_children(
            &mut arena,
            &["meta", "<!--HEAD_app_START-->", "title", "link", "<!--HEAD_app_END-->", "style"],
        );
        assert_eq!(head_selector(&arena, head, "app").unwrap(), kids[1..5].to_vec());
        assert!(head_selector(&arena, head, "other").unwrap().is_empty());
    }

    #[test]
    fn detach_unclaimed_removes_leftovers() {
        let mut arena = DomArena::new();
        let (parent, kids) = server_children(&mut arena, &["p", "aside", "p"]);
        let mut nodes = ClaimNodes::children(&arena, parent).unwrap();
        nodes.claim_element(&mut arena, "p", &[]).unwrap();
        nodes.claim_element(&mut arena, "p", &[]).unwrap();
        assert_eq!(nodes.detach_unclaimed(&mut arena).unwrap(), 1);
        assert_eq!(arena.children(parent).unwrap(), &[kids[0], kids[2]]);
    }
}
