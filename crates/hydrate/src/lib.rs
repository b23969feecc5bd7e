pub mod claim;
pub mod debug;
pub mod lis;
pub mod reorder;

mod arena;
mod config;
mod dom_patch;
mod session;
mod types;

pub use crate::arena::{DomArena, DomError};
pub use crate::claim::{ClaimInfo, ClaimNodes, HtmlTagHydration, head_selector};
pub use crate::config::HydrationConfig;
pub use crate::dom_patch::DomPatch;
pub use crate::lis::{Subsequence, longest_non_decreasing, upper_bound};
pub use crate::reorder::{ReorderStats, init_hydrate, reconcile_children};
pub use crate::session::HydrationSession;
pub use crate::types::{ClaimOrder, EndChild, Namespace, NodeKey, NodeKind};
