#![no_main]

use hydrate::{ClaimNodes, DomArena, HydrationSession, NodeKey};
use libfuzzer_sys::fuzz_target;

const NAMES: [&str; 4] = ["p", "div", "span", "li"];
const TEXTS: [&str; 4] = ["a", "ab", "b", " "];
const MAX_STEPS: usize = 64;

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = usize::from(split).min(rest.len()).min(MAX_STEPS);
    let (server, script) = rest.split_at(split);

    let mut arena = DomArena::new();
    let parent = arena.create_element("body");
    for &byte in server {
        let child = build_node(&mut arena, byte);
        arena.append_child(parent, child).unwrap();
    }

    let mut session = HydrationSession::default();
    session.start(&mut arena);
    let mut nodes = ClaimNodes::children(&arena, parent).unwrap();
    let mut claimed = Vec::new();
    for &byte in script.iter().take(MAX_STEPS) {
        let node = match byte % 3 {
            0 => nodes.claim_element(&mut arena, NAMES[usize::from(byte >> 2) % 4], &[]),
            1 => nodes.claim_text(&mut arena, TEXTS[usize::from(byte >> 2) % 4]),
            _ => nodes.claim_comment(&mut arena, "c"),
        }
        .unwrap();
        claimed.push(node);
    }
    nodes.detach_unclaimed(&mut arena).unwrap();

    for &node in &claimed {
        session.append(&mut arena, parent, node).unwrap();
    }
    session.end(&mut arena);

    assert_eq!(arena.children(parent).unwrap(), claimed.as_slice());
});

fn build_node(arena: &mut DomArena, byte: u8) -> NodeKey {
    match byte % 3 {
        0 => arena.create_element(NAMES[usize::from(byte >> 2) % 4]),
        1 => arena.create_text(TEXTS[usize::from(byte >> 2) % 4]),
        _ => arena.create_comment("c"),
    }
}
