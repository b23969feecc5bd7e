use crate::arena::{DomArena, DomError};
use crate::config::HydrationConfig;
use crate::reorder::{ReorderStats, init_hydrate};
use crate::types::{EndChild, NodeKey};

/// State of one hydration pass over a document.
///
/// While hydrating, mounting a node into a container first reorders that
/// container's claimed children (once), then walks an insertion cursor over
/// them so nodes that are already in place are not touched again.
#[derive(Debug, Default)]
pub struct HydrationSession {
    config: HydrationConfig,
    hydrating: bool,
    stats: ReorderStats,
}

impl HydrationSession {
    pub fn new(config: HydrationConfig) -> Self {
        Self {
            config,
            hydrating: false,
            stats: ReorderStats::default(),
        }
    }

    pub fn config(&self) -> &HydrationConfig {
        &self.config
    }

    pub fn is_hydrating(&self) -> bool {
        self.hydrating
    }

    /// Reorder totals of every container reconciled since `start`.
    pub fn stats(&self) -> ReorderStats {
        self.stats
    }

    /// Enter hydration mode. Claim orders and cursors left over from an
    /// earlier pass are cleared, so claims must come after this call.
    pub fn start(&mut self, arena: &mut DomArena) {
        log::debug!(target: "hydrate.session", "start");
        self.hydrating = true;
        self.stats = ReorderStats::default();
        arena.clear_claim_orders();
        arena.reset_hydration_markers();
    }

    /// Leave hydration mode and forget per-container cursors. Claim orders
    /// stay readable until the next `start`.
    pub fn end(&mut self, arena: &mut DomArena) {
        log::debug!(
            target: "hydrate.session",
            "end: children={} kept={} moved={}",
            self.stats.children,
            self.stats.kept,
            self.stats.moved
        );
        self.hydrating = false;
        arena.reset_hydration_markers();
    }

    /// Mount `node` as the next child of `target`.
    pub fn append(
        &mut self,
        arena: &mut DomArena,
        target: NodeKey,
        node: NodeKey,
    ) -> Result<(), DomError> {
        if !self.hydrating {
            if arena.parent(node)? != Some(target) || arena.next_sibling(node)?.is_some() {
                arena.append_child(target, node)?;
            }
            return Ok(());
        }

        if let Some(stats) = init_hydrate(arena, target, &self.config)? {
            self.stats += stats;
        }

        let mut end = match arena.actual_end_child(target)? {
            EndChild::At(key) if arena.parent(key)? == Some(target) => Some(key),
            EndChild::End => None,
            EndChild::Unset | EndChild::At(_) => arena.first_child(target)?,
        };
        // Children nobody claimed (shared containers) are stepped over.
        while let Some(key) = end {
            if arena.claim_order(key)?.is_some() {
                break;
            }
            end = arena.next_sibling(key)?;
        }

        if end == Some(node) {
            end = arena.next_sibling(node)?;
        } else if arena.claim_order(node)?.is_some() || arena.parent(node)? != Some(target) {
            arena.insert_before(target, node, end)?;
        }
        arena.set_actual_end_child(target, EndChild::from_option(end))
    }

    /// Mount `node` into `target` before `anchor`, or as the next child when
    /// there is no anchor.
    pub fn insert(
        &mut self,
        arena: &mut DomArena,
        target: NodeKey,
        node: NodeKey,
        anchor: Option<NodeKey>,
    ) -> Result<(), DomError> {
        if self.hydrating && anchor.is_none() {
            return self.append(arena, target, node);
        }
        if arena.parent(node)? != Some(target) || arena.next_sibling(node)? != anchor {
            arena.insert_before(target, node, anchor)?;
        }
        Ok(())
    }

    pub fn detach(&self, arena: &mut DomArena, node: NodeKey) -> Result<(), DomError> {
        arena.detach(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::ClaimNodes;
    use crate::dom_patch::DomPatch;
    use crate::types::ClaimOrder;

    fn container_with(
        arena: &mut DomArena,
        container: &str,
        names: &[&str],
    ) -> (NodeKey, Vec<NodeKey>) {
        let body = arena.create_element(container);
        let kids = names
            .iter()
            .map(|name| {
                let child = arena.create_element(name);
                arena.append_child(body, child).unwrap();
                child
            })
            .collect();
        arena.take_patches();
        (body, kids)
    }

    #[test]
    fn append_outside_hydration_skips_existing_tail() {
        let mut arena = DomArena::new();
        let (body, kids) = container_with(&mut arena, "body", &["p", "div"]);
        let mut session = HydrationSession::default();

        session.append(&mut arena, body, kids[1]).unwrap();
        assert!(arena.take_patches().is_empty());

        session.append(&mut arena, body, kids[0]).unwrap();
        assert_eq!(arena.children(body).unwrap(), &[kids[1], kids[0]]);
    }

    #[test]
    fn hydrating_append_reorders_once_then_walks_cursor() {
        let mut arena = DomArena::new();
        let (body, kids) = container_with(&mut arena, "body", &["p", "div"]);
        let mut nodes = ClaimNodes::children(&arena, body).unwrap();
        let mut session = HydrationSession::default();
        session.start(&mut arena);

        let div = nodes.claim_element(&mut arena, "div", &[]).unwrap();
        let p = nodes.claim_element(&mut arena, "p", &[]).unwrap();
        nodes.detach_unclaimed(&mut arena).unwrap();

        session.append(&mut arena, body, div).unwrap();
        session.append(&mut arena, body, p).unwrap();
        session.end(&mut arena);

        assert_eq!(arena.children(body).unwrap(), &[kids[1], kids[0]]);
        assert_eq!(session.stats().moved, 1);
        assert_eq!(
            arena.take_patches(),
            vec![DomPatch::AppendChild {
                parent: body,
                child: kids[0]
            }]
        );
    }

    #[test]
    fn created_node_is_inserted_at_cursor() {
        let mut arena = DomArena::new();
        let (body, kids) = container_with(&mut arena, "body", &["h1", "p"]);
        let mut nodes = ClaimNodes::children(&arena, body).unwrap();
        let mut session = HydrationSession::default();
        session.start(&mut arena);

        let h1 = nodes.claim_element(&mut arena, "h1", &[]).unwrap();
        let fresh = nodes.claim_element(&mut arena, "nav", &[]).unwrap();
        let p = nodes.claim_element(&mut arena, "p", &[]).unwrap();
        arena.take_patches();

        for node in [h1, fresh, p] {
            session.append(&mut arena, body, node).unwrap();
        }

        assert_eq!(arena.children(body).unwrap(), &[kids[0], fresh, kids[1]]);
        assert_eq!(session.stats().moved, 0);
        assert_eq!(
            arena.take_patches(),
            vec![DomPatch::InsertBefore {
                parent: body,
                child: fresh,
                before: kids[1]
            }]
        );
    }

    #[test]
    fn shared_container_cursor_skips_foreign_children() {
        let mut arena = DomArena::new();
        let (head, kids) = container_with(&mut arena, "head", &["meta", "title", "link"]);
        let mut session = HydrationSession::default();
        session.start(&mut arena);

        // Only the title belongs to this component; meta and link came from the host page.
        let mut nodes = ClaimNodes::new(vec![kids[1]]);
        let title = nodes.claim_element(&mut arena, "title", &[]).unwrap();

        session.append(&mut arena, head, title).unwrap();
        assert!(arena.take_patches().is_empty());
        assert_eq!(arena.children(head).unwrap(), &kids[..]);
        assert_eq!(arena.actual_end_child(head).unwrap(), EndChild::At(kids[2]));
    }

    #[test]
    fn insert_with_anchor_bypasses_cursor() {
        let mut arena = DomArena::new();
        let (body, kids) = container_with(&mut arena, "body", &["a", "b"]);
        let mut session = HydrationSession::default();
        session.start(&mut arena);
        let extra = arena.create_element("c");
        arena.take_patches();

        session.insert(&mut arena, body, extra, Some(kids[1])).unwrap();
        session.insert(&mut arena, body, extra, Some(kids[1])).unwrap();
        assert_eq!(arena.children(body).unwrap(), &[kids[0], extra, kids[1]]);
        assert_eq!(arena.take_patches().len(), 1);
    }

    #[test]
    fn end_allows_a_later_session_to_reconcile_again() {
        let mut arena = DomArena::new();
        let (body, kids) = container_with(&mut arena, "body", &["a", "b"]);
        let mut session = HydrationSession::default();

        for (round, script) in [["b", "a"], ["a", "b"]].iter().enumerate() {
            session.start(&mut arena);
            let mut nodes = ClaimNodes::children(&arena, body).unwrap();
            let first = nodes.claim_element(&mut arena, script[0], &[]).unwrap();
            let second = nodes.claim_element(&mut arena, script[1], &[]).unwrap();
            session.append(&mut arena, body, first).unwrap();
            session.append(&mut arena, body, second).unwrap();
            session.end(&mut arena);

            assert!(!session.is_hydrating());
            assert_eq!(session.stats().moved, 1, "round {round}");
            assert_eq!(arena.children(body).unwrap(), &[first, second], "round {round}");
        }
        assert_eq!(arena.children(body).unwrap(), &kids[..]);
    }

    #[test]
    fn start_forgets_claims_from_an_earlier_session() {
        let mut arena = DomArena::new();
        let (head, kids) = container_with(&mut arena, "head", &["meta", "link", "title"]);
        let mut session = HydrationSession::default();

        session.start(&mut arena);
        let mut nodes = ClaimNodes::new(vec![kids[2]]);
        let title = nodes.claim_element(&mut arena, "title", &[]).unwrap();
        session.append(&mut arena, head, title).unwrap();
        session.end(&mut arena);
        assert_eq!(arena.claim_order(title).unwrap(), Some(ClaimOrder(0)));

        session.start(&mut arena);
        assert_eq!(arena.claim_order(title).unwrap(), None);
        let mut nodes = ClaimNodes::new(vec![kids[0], kids[1]]);
        let meta = nodes.claim_element(&mut arena, "meta", &[]).unwrap();
        let link = nodes.claim_element(&mut arena, "link", &[]).unwrap();
        arena.take_patches();
        session.append(&mut arena, head, meta).unwrap();
        session.append(&mut arena, head, link).unwrap();
        session.end(&mut arena);

        assert_eq!(session.stats().moved, 0);
        assert!(arena.take_patches().is_empty());
        assert_eq!(arena.children(head).unwrap(), &kids[..]);
    }
}
