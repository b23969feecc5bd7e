#![no_main]

use hydrate::{ClaimOrder, DomArena, HydrationConfig, longest_non_decreasing, reconcile_children};
use libfuzzer_sys::fuzz_target;

const MAX_CHILDREN: usize = 512;

fuzz_target!(|data: &[u8]| {
    let orders: Vec<u32> = data.iter().take(MAX_CHILDREN).map(|&b| u32::from(b)).collect();

    let mut arena = DomArena::new();
    let parent = arena.create_element("div");
    for &order in &orders {
        let child = arena.create_element("span");
        arena.append_child(parent, child).unwrap();
        arena.set_claim_order(child, ClaimOrder(order)).unwrap();
    }

    let stats = reconcile_children(&mut arena, parent, &HydrationConfig::default()).unwrap();
    let run = longest_non_decreasing(&orders);
    assert_eq!(stats.moved, orders.len() - run.len());

    let after: Vec<u32> = arena
        .children(parent)
        .unwrap()
        .iter()
        .map(|&child| arena.claim_order(child).unwrap().unwrap().0)
        .collect();
    assert!(after.windows(2).all(|w| w[0] <= w[1]), "{after:?}");
});
