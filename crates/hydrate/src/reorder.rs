//! Reordering of claimed children into claim order.
//!
//! Contract:
//! - Children with a claim order end up non-decreasing by claim order.
//! - The longest non-decreasing run of the current order stays in place;
//!   every other claimed child is moved exactly once, which is minimal.
//! - A moved child is inserted before the first kept child whose claim order
//!   is `>=` its own, or appended when there is none. Moved children with
//!   equal claim orders keep their document order.
//! - Children without a claim order are only expected in shared containers
//!   (see `HydrationConfig::shared_containers`); they are never moved.

use crate::arena::{DomArena, DomError};
use crate::config::HydrationConfig;
use crate::lis::longest_non_decreasing;
use crate::types::{ClaimOrder, NodeKey};
use std::ops::AddAssign;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReorderStats {
    /// Children that took part in the reorder (those with a claim order).
    pub children: usize,
    pub kept: usize,
    pub moved: usize,
}

impl AddAssign for ReorderStats {
    fn add_assign(&mut self, other: Self) {
        self.children += other.children;
        self.kept += other.kept;
        self.moved += other.moved;
    }
}

/// Reorder the claimed children of `container` once per hydration session.
///
/// Returns `None` when the container was already reconciled this session.
pub fn init_hydrate(
    arena: &mut DomArena,
    container: NodeKey,
    config: &HydrationConfig,
) -> Result<Option<ReorderStats>, DomError> {
    if arena.hydrate_init(container)? {
        return Ok(None);
    }
    arena.set_hydrate_init(container)?;
    reconcile_children(arena, container, config).map(Some)
}

/// Move the claimed children of `container` into claim order.
pub fn reconcile_children(
    arena: &mut DomArena,
    container: NodeKey,
    config: &HydrationConfig,
) -> Result<ReorderStats, DomError> {
    let shared = arena
        .kind(container)?
        .element_name()
        .is_some_and(|name| config.is_shared_container(name));

    let mut claimed: Vec<(NodeKey, ClaimOrder)> = Vec::new();
    for &child in arena.children(container)? {
        match arena.claim_order(child)? {
            Some(order) => claimed.push((child, order)),
            None => debug_assert!(
                shared,
                "unclaimed child {child} in non-shared container {container}"
            ),
        }
    }

    let orders: Vec<ClaimOrder> = claimed.iter().map(|&(_, order)| order).collect();
    let run = longest_non_decreasing(&orders);
    let mut in_run = vec![false; claimed.len()];
    for &index in &run.indices {
        in_run[index] = true;
    }

    let mut kept = Vec::with_capacity(run.len());
    let mut to_move = Vec::with_capacity(claimed.len() - run.len());
    for (entry, keep) in claimed.iter().zip(&in_run) {
        if *keep {
            kept.push(*entry);
        } else {
            to_move.push(*entry);
        }
    }
    // Stable, so equal claim orders keep document order.
    to_move.sort_by_key(|&(_, order)| order);

    let mut next_kept = 0;
    for &(node, order) in &to_move {
        while next_kept < kept.len() && kept[next_kept].1 < order {
            next_kept += 1;
        }
        let anchor = kept.get(next_kept).map(|&(key, _)| key);
        arena.insert_before(container, node, anchor)?;
    }

    let stats = ReorderStats {
        children: claimed.len(),
        kept: kept.len(),
        moved: to_move.len(),
    };
    log::debug!(
        target: "hydrate.reorder",
        "container {container}: children={} kept={} moved={}",
        stats.children,
        stats.kept,
        stats.moved
    );
    Ok(stats)
}
