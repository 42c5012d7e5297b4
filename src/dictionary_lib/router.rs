//! UTF-16 cursor decoding and slot dispatch.

use crate::utils::{combine_surrogates, is_high_surrogate, is_low_surrogate};

use super::node::Node;
use super::packed_store::PackedStore;

/// The node governing one code point and the number of units it spans.
#[derive(Debug, Clone)]
pub struct Routed {
    pub node: Node,
    pub width: usize,
}

impl Routed {
    #[inline(always)]
    fn unknown() -> Self {
        Routed {
            node: Node::Unknown,
            width: 1,
        }
    }
}

#[inline(always)]
fn lookup(store: &PackedStore, code_point: u32, width: usize) -> Routed {
    match store.slot(code_point) {
        Some(slot) => Routed {
            node: slot.load(),
            width,
        },
        None => Routed {
            node: Node::Unknown,
            width,
        },
    }
}

/// Routes the code point at `pos`, reading `text[pos + 1]` when `text[pos]`
/// is a high surrogate.
///
/// Callers guarantee `pos + 1 < text.len()`; use [`route_single`] for the
/// last unit.
#[inline]
pub fn route(store: &PackedStore, text: &[u16], pos: usize) -> Routed {
    let unit = text[pos];
    if unit < 0x80 {
        return Routed::unknown();
    }
    if is_high_surrogate(unit) {
        let low = text[pos + 1];
        if is_low_surrogate(low) {
            return lookup(store, combine_surrogates(unit, low), 2);
        }
        return Routed::unknown();
    }
    if is_low_surrogate(unit) {
        return Routed::unknown();
    }
    lookup(store, unit as u32, 1)
}

/// Routes the unit at `pos` without looking past it.
#[inline]
pub fn route_single(store: &PackedStore, text: &[u16], pos: usize) -> Routed {
    let unit = text[pos];
    if unit < 0x80 || is_high_surrogate(unit) || is_low_surrogate(unit) {
        return Routed::unknown();
    }
    lookup(store, unit as u32, 1)
}
