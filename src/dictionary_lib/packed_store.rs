//! Packed per-block dictionary arrays plus sparse overflow maps.
//!
//! Each block of [`BLOCKS`] owns one slot per code point, decoded from a blob
//! of big-endian `u16` template ids. Slots are `RwLock<Node>` so the lazy
//! loader and runtime overrides can swap a node with a single write.

use std::ops::Deref;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::errors::{PinyinError, Result};

use super::asset_bundle::{be_u16, be_u32, check_records, names, AssetBundle};
use super::node::{LazyNode, Node};
use super::template_table::TemplateTable;

/// U+3007 IDEOGRAPHIC NUMBER ZERO, stored in the basic block's reserved slot.
pub const IDEOGRAPHIC_ZERO: u32 = 0x3007;

/// A contiguous Unicode range backed by one packed array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpec {
    pub name: &'static str,
    /// Asset file holding `len()` big-endian template ids.
    pub asset: &'static str,
    pub start: u32,
    /// Inclusive.
    pub end: u32,
    /// Slots appended after `end` for remapped code points.
    pub reserved: u32,
    /// Whether every slot starts as a lazy placeholder. In other blocks only
    /// the code points leading a stored word get one.
    pub lexical: bool,
}

impl BlockSpec {
    /// Number of slots, reserved ones included.
    #[inline]
    pub const fn len(&self) -> usize {
        (self.end - self.start + 1 + self.reserved) as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub const fn contains(&self, code_point: u32) -> bool {
        code_point >= self.start && code_point <= self.end
    }

    /// Slot index of `code_point` inside this block.
    #[inline]
    pub fn slot_of(&self, code_point: u32) -> Option<usize> {
        if self.contains(code_point) {
            Some((code_point - self.start) as usize)
        } else if code_point == IDEOGRAPHIC_ZERO && self.reserved > 0 {
            Some((self.end - self.start + 1) as usize)
        } else {
            None
        }
    }

    /// Code point stored at slot `index`.
    #[inline]
    pub fn code_point_of(&self, index: usize) -> u32 {
        let span = (self.end - self.start + 1) as usize;
        if index < span {
            self.start + index as u32
        } else {
            IDEOGRAPHIC_ZERO
        }
    }
}

/// Index of the basic CJK block in [`BLOCKS`].
pub const BASIC_BLOCK: usize = 0;

/// Declared blocks, most frequently hit first.
pub const BLOCKS: [BlockSpec; 11] = [
    BlockSpec { name: "basic", asset: "block_basic.bin", start: 0x4E00, end: 0x9FFF, reserved: 1, lexical: true },
    BlockSpec { name: "ext_a", asset: "block_ext_a.bin", start: 0x3400, end: 0x4DBF, reserved: 0, lexical: true },
    BlockSpec { name: "compat", asset: "block_compat.bin", start: 0xF900, end: 0xFAFF, reserved: 0, lexical: true },
    BlockSpec { name: "radicals", asset: "block_radicals.bin", start: 0x2E80, end: 0x2FDF, reserved: 0, lexical: false },
    BlockSpec { name: "ext_b", asset: "block_ext_b.bin", start: 0x20000, end: 0x2A6DF, reserved: 0, lexical: true },
    BlockSpec { name: "ext_c", asset: "block_ext_c.bin", start: 0x2A700, end: 0x2B73F, reserved: 0, lexical: false },
    BlockSpec { name: "ext_d", asset: "block_ext_d.bin", start: 0x2B740, end: 0x2B81F, reserved: 0, lexical: false },
    BlockSpec { name: "ext_e", asset: "block_ext_e.bin", start: 0x2B820, end: 0x2CEAF, reserved: 0, lexical: false },
    BlockSpec { name: "ext_f", asset: "block_ext_f.bin", start: 0x2CEB0, end: 0x2EBEF, reserved: 0, lexical: false },
    BlockSpec { name: "ext_g", asset: "block_ext_g.bin", start: 0x30000, end: 0x3134F, reserved: 0, lexical: false },
    BlockSpec { name: "compat_sup", asset: "block_compat_sup.bin", start: 0x2F800, end: 0x2FA1F, reserved: 0, lexical: false },
];

/// Finds the block and slot index for `code_point`.
///
/// # Example
/// ```
/// use fast_pinyin::dictionary_lib::{locate, BLOCKS, BASIC_BLOCK};
///
/// assert_eq!(locate('中' as u32), Some((BASIC_BLOCK, 0x4E2D - 0x4E00)));
/// // '〇' lives in the basic block's reserved slot.
/// assert_eq!(locate(0x3007), Some((BASIC_BLOCK, BLOCKS[BASIC_BLOCK].len() - 1)));
/// assert_eq!(locate('a' as u32), None);
/// ```
#[inline]
pub fn locate(code_point: u32) -> Option<(usize, usize)> {
    if code_point == IDEOGRAPHIC_ZERO {
        return BLOCKS[BASIC_BLOCK]
            .slot_of(code_point)
            .map(|index| (BASIC_BLOCK, index));
    }
    BLOCKS
        .iter()
        .position(|spec| spec.contains(code_point))
        .map(|block| (block, (code_point - BLOCKS[block].start) as usize))
}

/// One dictionary slot.
#[derive(Debug)]
pub struct Slot(RwLock<Node>);

impl Slot {
    pub fn new(node: Node) -> Self {
        Slot(RwLock::new(node))
    }

    /// Snapshot of the current node.
    #[inline]
    pub fn load(&self) -> Node {
        self.read().clone()
    }

    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Node> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Node> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the node only while it is still the placeholder `lazy`.
    pub fn replace_lazy(&self, lazy: &Arc<LazyNode>, built: Node) -> bool {
        let mut guard = self.write();
        match &*guard {
            Node::Lazy(current) if Arc::ptr_eq(current, lazy) => {
                *guard = built;
                true
            }
            _ => false,
        }
    }
}

/// Borrowed block slot or shared overflow slot.
pub enum SlotRef<'a> {
    Block(&'a Slot),
    Overflow(Arc<Slot>),
}

impl Deref for SlotRef<'_> {
    type Target = Slot;

    fn deref(&self) -> &Slot {
        match self {
            SlotRef::Block(slot) => slot,
            SlotRef::Overflow(slot) => slot,
        }
    }
}

struct Block {
    slots: Box<[Slot]>,
}

/// All packed blocks plus the 16-bit and 32-bit overflow maps.
pub struct PackedStore {
    blocks: Vec<Block>,
    overflow16: RwLock<FxHashMap<u16, Arc<Slot>>>,
    overflow32: RwLock<FxHashMap<u32, Arc<Slot>>>,
}

fn initial_node(code_point: u32, reading: Option<super::Syllable>, lexical: bool) -> Node {
    let base = Node::from_reading(reading);
    if lexical {
        Node::Lazy(Arc::new(LazyNode::new(code_point, base)))
    } else {
        base
    }
}

impl PackedStore {
    /// Decodes every block blob (in parallel) and the optional overflow maps.
    ///
    /// A missing block blob, a blob whose size differs from the block size,
    /// or an id past the template table is a fatal asset error.
    pub fn load(bundle: &AssetBundle, templates: &TemplateTable) -> Result<Self> {
        let blocks = BLOCKS
            .par_iter()
            .map(|spec| Self::load_block(spec, bundle, templates))
            .collect::<Result<Vec<Block>>>()?;

        let overflow16 = match bundle.get(names::OVERFLOW_16) {
            Some(bytes) => Self::load_overflow16(bytes, templates)?,
            None => FxHashMap::default(),
        };
        let overflow32 = match bundle.get(names::OVERFLOW_32) {
            Some(bytes) => Self::load_overflow32(bytes, templates)?,
            None => FxHashMap::default(),
        };

        debug!(
            "packed store loaded: {} blocks, {} slots, {} + {} overflow entries",
            blocks.len(),
            blocks.iter().map(|b| b.slots.len()).sum::<usize>(),
            overflow16.len(),
            overflow32.len()
        );

        Ok(Self {
            blocks,
            overflow16: RwLock::new(overflow16),
            overflow32: RwLock::new(overflow32),
        })
    }

    fn load_block(spec: &BlockSpec, bundle: &AssetBundle, templates: &TemplateTable) -> Result<Block> {
        let bytes = bundle.require(spec.asset)?;
        if bytes.len() != spec.len() * 2 {
            return Err(PinyinError::asset(
                spec.asset,
                format!("expected {} bytes for block {}, found {}", spec.len() * 2, spec.name, bytes.len()),
            ));
        }
        let mut slots = Vec::with_capacity(spec.len());
        for index in 0..spec.len() {
            let reading = templates.resolve(be_u16(bytes, index), spec.asset)?;
            let code_point = spec.code_point_of(index);
            slots.push(Slot::new(initial_node(code_point, reading, spec.lexical)));
        }
        Ok(Block {
            slots: slots.into_boxed_slice(),
        })
    }

    fn load_overflow16(bytes: &[u8], templates: &TemplateTable) -> Result<FxHashMap<u16, Arc<Slot>>> {
        let count = check_records(names::OVERFLOW_16, bytes, 4)?;
        let mut map = FxHashMap::default();
        map.reserve(count);
        for record in 0..count {
            let unit = be_u16(bytes, record * 2);
            let reading = templates.resolve(be_u16(bytes, record * 2 + 1), names::OVERFLOW_16)?;
            map.insert(unit, Arc::new(Slot::new(initial_node(unit as u32, reading, true))));
        }
        Ok(map)
    }

    fn load_overflow32(bytes: &[u8], templates: &TemplateTable) -> Result<FxHashMap<u32, Arc<Slot>>> {
        let count = check_records(names::OVERFLOW_32, bytes, 6)?;
        let mut map = FxHashMap::default();
        map.reserve(count);
        for record in 0..count {
            let at = record * 6;
            let code_point = be_u32(bytes, at);
            let reading = templates.resolve(be_u16(bytes, at / 2 + 2), names::OVERFLOW_32)?;
            map.insert(code_point, Arc::new(Slot::new(initial_node(code_point, reading, true))));
        }
        Ok(map)
    }

    /// Slot of a code point inside a declared block.
    #[inline]
    pub fn block_slot(&self, code_point: u32) -> Option<&Slot> {
        let (block, index) = locate(code_point)?;
        self.blocks[block].slots.get(index)
    }

    /// Overflow slot of a code point outside the blocks.
    #[inline]
    pub fn overflow_slot(&self, code_point: u32) -> Option<Arc<Slot>> {
        if code_point <= 0xFFFF {
            let map = self.overflow16.read().unwrap_or_else(PoisonError::into_inner);
            map.get(&(code_point as u16)).cloned()
        } else {
            let map = self.overflow32.read().unwrap_or_else(PoisonError::into_inner);
            map.get(&code_point).cloned()
        }
    }

    /// Block slot, then overflow slot.
    pub fn slot(&self, code_point: u32) -> Option<SlotRef<'_>> {
        match self.block_slot(code_point) {
            Some(slot) => Some(SlotRef::Block(slot)),
            None => self.overflow_slot(code_point).map(SlotRef::Overflow),
        }
    }

    /// Like [`slot`](Self::slot) but creates an overflow slot holding
    /// [`Node::Unknown`] for code points outside every block.
    pub fn slot_or_insert(&self, code_point: u32) -> SlotRef<'_> {
        if let Some(slot) = self.block_slot(code_point) {
            return SlotRef::Block(slot);
        }
        let slot = if code_point <= 0xFFFF {
            let mut map = self.overflow16.write().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                map.entry(code_point as u16)
                    .or_insert_with(|| Arc::new(Slot::new(Node::Unknown))),
            )
        } else {
            let mut map = self.overflow32.write().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                map.entry(code_point)
                    .or_insert_with(|| Arc::new(Slot::new(Node::Unknown))),
            )
        };
        SlotRef::Overflow(slot)
    }

    /// Wraps the node of `code_point` in a lazy placeholder so the words it
    /// leads get indexed on first use. Creates an overflow slot for code
    /// points outside every block. Returns `false` if the slot already was a
    /// placeholder or a bucket.
    pub fn promote(&self, code_point: u32) -> bool {
        let slot = self.slot_or_insert(code_point);
        let mut guard = slot.write();
        if matches!(*guard, Node::Lazy(_) | Node::Bucket(_)) {
            return false;
        }
        let base = (*guard).clone();
        *guard = Node::Lazy(Arc::new(LazyNode::new(code_point, base)));
        true
    }

    /// Current node of a code point, if it has a slot.
    pub fn node(&self, code_point: u32) -> Option<Node> {
        self.slot(code_point).map(|slot| slot.load())
    }

    /// Number of overflow entries (16-bit, 32-bit).
    pub fn overflow_len(&self) -> (usize, usize) {
        let small = self.overflow16.read().unwrap_or_else(PoisonError::into_inner).len();
        let large = self.overflow32.read().unwrap_or_else(PoisonError::into_inner).len();
        (small, large)
    }
}
