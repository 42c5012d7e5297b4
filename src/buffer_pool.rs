//! Reusable scan buffers shared across calls.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, TryLockError};

/// Default number of pooled buffer slots.
pub const DEFAULT_POOL_SIZE: usize = 8;

/// Capacity (in elements) above which a returned buffer is shrunk.
pub const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// UTF-16 staging for the input plus the output text.
#[derive(Debug, Default)]
pub struct ScanBuffers {
    pub units: Vec<u16>,
    pub text: String,
}

impl ScanBuffers {
    fn reset(&mut self) {
        self.units.clear();
        self.text.clear();
        if self.units.capacity() > MAX_RETAINED_CAPACITY {
            self.units.shrink_to(MAX_RETAINED_CAPACITY);
        }
        if self.text.capacity() > MAX_RETAINED_CAPACITY {
            self.text.shrink_to(MAX_RETAINED_CAPACITY);
        }
    }
}

/// Fixed set of buffer slots; acquiring never blocks.
#[derive(Debug)]
pub struct BufferPool {
    slots: Box<[Mutex<ScanBuffers>]>,
}

impl BufferPool {
    pub fn new(size: usize) -> Self {
        Self {
            slots: (0..size).map(|_| Mutex::new(ScanBuffers::default())).collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Takes the first free slot, or a fresh unpooled buffer if all are busy.
    pub fn acquire(&self) -> PooledBuffers<'_> {
        for slot in self.slots.iter() {
            match slot.try_lock() {
                Ok(guard) => return PooledBuffers::Pooled(guard),
                Err(TryLockError::Poisoned(poisoned)) => {
                    let mut guard = poisoned.into_inner();
                    guard.reset();
                    return PooledBuffers::Pooled(guard);
                }
                Err(TryLockError::WouldBlock) => continue,
            }
        }
        PooledBuffers::Fresh(ScanBuffers::default())
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

/// Buffers borrowed from a [`BufferPool`]; cleared when dropped.
pub enum PooledBuffers<'a> {
    Pooled(MutexGuard<'a, ScanBuffers>),
    Fresh(ScanBuffers),
}

impl PooledBuffers<'_> {
    pub fn is_pooled(&self) -> bool {
        matches!(self, PooledBuffers::Pooled(_))
    }
}

impl Deref for PooledBuffers<'_> {
    type Target = ScanBuffers;

    fn deref(&self) -> &ScanBuffers {
        match self {
            PooledBuffers::Pooled(guard) => guard,
            PooledBuffers::Fresh(buffers) => buffers,
        }
    }
}

impl DerefMut for PooledBuffers<'_> {
    fn deref_mut(&mut self) -> &mut ScanBuffers {
        match self {
            PooledBuffers::Pooled(guard) => guard,
            PooledBuffers::Fresh(buffers) => buffers,
        }
    }
}

impl Drop for PooledBuffers<'_> {
    fn drop(&mut self) {
        if let PooledBuffers::Pooled(guard) = self {
            guard.reset();
        }
    }
}
